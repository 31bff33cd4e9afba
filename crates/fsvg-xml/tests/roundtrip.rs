//! Integration tests for fsvg-xml
//!
//! Reads markup, writes it back and checks that the second read sees the
//! same document.

use fsvg_dom::{Color, NodeKind, Rect, SrcMask, SvgTree};
use fsvg_xml::{read_svg, write_svg, ReadOptions, WriteOptions};

fn read(text: &str) -> (SvgTree, fsvg_dom::NodeId) {
    read_svg(text, &ReadOptions::default()).unwrap()
}

fn write(tree: &SvgTree, root: fsvg_dom::NodeId) -> String {
    write_svg(tree, root, &WriteOptions::default())
}

/// Writing, reading and writing again yields the same markup
fn assert_stable(text: &str) -> String {
    let (tree, root) = read(text);
    let first = write(&tree, root);
    let (tree2, root2) = read(&first);
    let second = write(&tree2, root2);
    assert_eq!(first, second);
    first
}

const ICON: &str = r##"<?xml version="1.0"?>
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="64" height="64" viewBox="0 0 32 32">
  <style>
    .accent { fill: orange }
    g > .accent { stroke: black; stroke-width: 2 }
  </style>
  <defs>
    <linearGradient id="sky" x2="0" y2="1">
      <stop offset="0" stop-color="#def"/>
      <stop offset="1" stop-color="navy" stop-opacity="0.5"/>
    </linearGradient>
  </defs>
  <!-- background -->
  <rect width="32" height="32" fill="url(#sky)"/>
  <g id="shapes" transform="translate(4 4)">
    <circle class="accent" cx="8" cy="8" r="6"/>
    <path d="M0 20 L24 20 L12 2 Z" fill="none" stroke="white"/>
  </g>
  <use xlink:href="#shapes" x="2"/>
  <text x="16" y="30" font-size="4" text-anchor="middle">Sky <tspan font-weight="bold">line</tspan></text>
</svg>"##;

// ============================================================================
// Reading
// ============================================================================

#[test]
fn test_read_icon() {
    let (tree, root) = read(ICON);
    let shapes = tree.named_node(root, "shapes").unwrap();
    let circle = tree.children(shapes)[0];

    assert_eq!(tree.color_attr(circle, "fill", Color::NONE), Color::rgba(255, 165, 0, 255));
    assert_eq!(tree.float_attr(circle, "stroke-width", 0.0), 2.0);
    assert!(tree.attr(circle, "fill", SrcMask::CSS).is_some());

    let use_node = tree.select_first(root, "use").unwrap();
    assert_eq!(tree.use_target(use_node), Some(shapes));

    let sky = tree.named_node(root, "sky").unwrap();
    let stops = tree.gradient_stops(sky);
    assert_eq!(stops.len(), 2);
    assert_eq!(stops[1].color.a, 128);

    let text = tree.select_first(root, "text").unwrap();
    assert_eq!(tree.text(text), "Sky line");
}

#[test]
fn test_read_bounds() {
    let (tree, root) = read(ICON);
    let shapes = tree.named_node(root, "shapes").unwrap();
    let circle = tree.children(shapes)[0];
    // circle r=6 at (8,8), stroke 2, group translated by (4,4), document scaled 2x
    let b = tree.bounds(circle);
    assert!((b.left - 2.0 * (4.0 + 8.0 - 7.0)).abs() < 0.01);
    assert!((b.right - 2.0 * (4.0 + 8.0 + 7.0)).abs() < 0.01);
    assert_eq!(tree.bounds(root), Rect::ltwh(0.0, 0.0, 64.0, 64.0));
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_icon_round_trip_is_stable() {
    let out = assert_stable(ICON);
    assert!(out.starts_with("<svg "));
    assert!(out.contains(r#"<!-- background -->"#));
    assert!(out.contains(r#"<g id="shapes" transform="translate(4,4)">"#));
    assert!(out.contains(r#"<circle class="accent" cx="8" cy="8" r="6"/>"#));
    assert!(out.contains(r##"fill="url(#sky)""##));
    assert!(out.contains(r##"<use xlink:href="#shapes" x="2"/>"##) || out.contains(r##"<use x="2" xlink:href="#shapes"/>"##));
    // the stylesheet survives only as the verbatim <style> element
    assert!(out.contains(".accent { fill: orange }"));
}

#[test]
fn test_inline_style_round_trip() {
    let out = assert_stable(r#"<svg><rect width="1" height="2" style="fill:red; stroke-width : 3"/></svg>"#);
    assert!(out.contains(r##"style="fill:#FF0000;stroke-width:3""##));
}

#[test]
fn test_debug_css_output() {
    let (tree, root) = read(r#"<svg><style>rect { opacity: 0.5 }</style><rect/></svg>"#);
    let options = WriteOptions { debug_css_style: true, ..WriteOptions::default() };
    let out = write_svg(&tree, root, &options);
    assert!(out.contains(r#"debug:css="opacity:0.5""#));
    assert!(!write(&tree, root).contains("debug:css"));
}

#[test]
fn test_font_round_trip() {
    let text = r#"<svg><defs><font horiz-adv-x="600"><font-face font-family="Mono" units-per-em="1000"/><glyph unicode="x" d="M0 0 L10 0"/><hkern u1="x" u2="x" k="5"/></font></defs></svg>"#;
    let out = assert_stable(text);
    assert!(out.contains(r#"<font horiz-adv-x="600"><font-face font-family="Mono" units-per-em="1000"/><glyph unicode="x" d="M0 0 l10 0"/><hkern u1="x" u2="x" k="5"/></font>"#));
    let (tree, root) = read(&out);
    assert!(tree.svg_font(root, "Mono").is_some());
}

#[test]
fn test_text_line_breaks_round_trip() {
    let out = assert_stable(r#"<svg><text>one<tbreak/>two</text></svg>"#);
    assert!(out.contains("<text>one<tbreak/>two</text>"));
}

#[test]
fn test_nested_document_round_trip() {
    let out = assert_stable(r#"<svg width="10cm"><svg x="5" width="50%" viewBox="0 0 1 1" preserveAspectRatio="none"><g/></svg></svg>"#);
    let (tree, root) = read(&out);
    let inner = tree.children(root)[0];
    assert!(matches!(tree.node(inner).unwrap().kind(), NodeKind::Document(d) if !d.preserve_aspect_ratio));
    assert!(out.contains(r#"<svg x="5" y="0" width="50%" viewBox="0 0 1 1" preserveAspectRatio="none">"#));
}
