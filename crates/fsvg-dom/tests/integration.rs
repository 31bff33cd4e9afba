//! Integration tests for fsvg-dom
//!
//! Exercises the public API end to end: tree building, the cascade, the
//! bounds cache and repaint bookkeeping.

use fsvg_dom::{
    parse_path_data, parse_svg_stylesheet, AttrSource, Color, DirtyFlag, DocumentData, Length, NodeId,
    NodeKind, NodeOperations, PathData, PathShape, Rect, RectData, SrcMask, SvgTree,
};
use tiny_skia::Transform;

const RED: Color = Color::rgba(255, 0, 0, 255);
const GREEN: Color = Color::rgba(0, 128, 0, 255);
const BLUE: Color = Color::rgba(0, 0, 255, 255);

fn document(tree: &mut SvgTree, css: Option<&str>) -> NodeId {
    let doc = tree.create(NodeKind::Document(DocumentData::new(0.0, 0.0, Length::px(200.0), Length::px(200.0))));
    if let Some(css) = css {
        tree.set_stylesheet(doc, Some(parse_svg_stylesheet(css)));
    }
    doc
}

fn group(tree: &mut SvgTree, parent: NodeId, class: &str) -> NodeId {
    let g = tree.create(NodeKind::Group { anchor: false });
    tree.set_xml_class(g, class);
    tree.add_child(parent, g, None).unwrap();
    g
}

fn rect(tree: &mut SvgTree, parent: NodeId, r: Rect) -> NodeId {
    let node = tree.create(NodeKind::Rect(RectData::new(r, 0.0, 0.0)));
    tree.add_child(parent, node, None).unwrap();
    node
}

// ============================================================================
// Cascade
// ============================================================================

#[test]
fn test_id_beats_class_beats_tag() {
    let mut tree = SvgTree::new();
    let doc = document(&mut tree, Some("rect { fill: red } .c { fill: blue } #r { fill: green }"));
    let r = rect(&mut tree, doc, Rect::wh(10.0, 10.0));
    assert_eq!(tree.color_attr(r, "fill", Color::NONE), RED);

    tree.set_xml_class(r, "c");
    assert_eq!(tree.color_attr(r, "fill", Color::NONE), BLUE);

    tree.set_xml_id(r, "r");
    assert_eq!(tree.color_attr(r, "fill", Color::NONE), GREEN);
}

#[test]
fn test_equal_specificity_later_wins() {
    let mut tree = SvgTree::new();
    let doc = document(&mut tree, Some(".a { color: red } .a { color: blue }"));
    let g = group(&mut tree, doc, "a");
    assert_eq!(tree.color_attr(g, "color", Color::NONE), BLUE);
}

#[test]
fn test_descendant_selector_follows_moves() {
    let mut tree = SvgTree::new();
    let doc = document(&mut tree, Some(".outer rect { stroke: blue }"));
    let outer = group(&mut tree, doc, "outer");
    let plain = group(&mut tree, doc, "");
    let r = rect(&mut tree, plain, Rect::wh(10.0, 10.0));
    assert!(tree.attr(r, "stroke", SrcMask::ANY).is_none());

    tree.remove_child(plain, r).unwrap();
    tree.add_child(outer, r, None).unwrap();
    assert_eq!(tree.color_attr(r, "stroke", Color::NONE), BLUE);
}

#[test]
fn test_cascade_idempotent() {
    let mut tree = SvgTree::new();
    let doc = document(&mut tree, Some("g { --w: 2 } .a { stroke-width: var(--w); fill: red } g .a { opacity: 0.5 }"));
    let g = group(&mut tree, doc, "");
    let inner = group(&mut tree, g, "a");
    let snapshot = |tree: &SvgTree| tree.node(inner).unwrap().attrs().clone();
    let first = snapshot(&tree);

    tree.restyle(doc);
    assert_eq!(snapshot(&tree), first);
    tree.restyle(doc);
    assert_eq!(snapshot(&tree), first);
    assert_eq!(tree.float_attr(inner, "stroke-width", 0.0), 2.0);
}

#[test]
fn test_variable_set_and_used_on_same_node() {
    let mut tree = SvgTree::new();
    let doc = document(&mut tree, Some(".a { --x: 5; stroke-width: var(--x) }"));
    let g = group(&mut tree, doc, "a");
    assert_eq!(tree.float_attr(g, "stroke-width", 0.0), 5.0);
}

#[test]
fn test_inline_style_blocks_css() {
    let mut tree = SvgTree::new();
    let doc = document(&mut tree, Some(".a { fill: red }"));
    let g = group(&mut tree, doc, "a");
    tree.set_style(g, "fill: green");
    assert_eq!(tree.color_attr(g, "fill", Color::NONE), GREEN);
    assert!(tree.attr(g, "fill", SrcMask::CSS).is_none());

    // removing the inline value does not restyle on its own
    tree.remove_attr(g, "fill", SrcMask::INLINE);
    assert!(tree.attr(g, "fill", SrcMask::ANY).is_none());
    tree.restyle(g);
    assert_eq!(tree.color_attr(g, "fill", Color::NONE), RED);
}

#[test]
fn test_xml_inline_css_precedence() {
    let mut tree = SvgTree::new();
    let doc = document(&mut tree, Some(".a { fill: green }"));
    let g = group(&mut tree, doc, "a");
    tree.set_attribute(g, "fill", "red", AttrSource::Xml);
    assert_eq!(tree.color_attr(g, "fill", Color::NONE), GREEN);

    tree.set_style(g, "fill: blue");
    assert_eq!(tree.color_attr(g, "fill", Color::NONE), BLUE);

    tree.remove_attr(g, "fill", SrcMask::INLINE);
    tree.restyle(g);
    assert_eq!(tree.color_attr(g, "fill", Color::NONE), GREEN);

    tree.set_xml_class(g, "");
    assert!(tree.attr(g, "fill", SrcMask::CSS).is_none());
    assert_eq!(tree.color_attr(g, "fill", Color::NONE), RED);
}

#[test]
fn test_attribute_selectors_on_class_and_id() {
    let mut tree = SvgTree::new();
    let doc = document(&mut tree, Some("[class^=ab] { fill: red } [id] { stroke: blue } [id$=x] { opacity: 0.5 }"));
    let g = group(&mut tree, doc, "abc");
    tree.set_xml_id(g, "box");
    assert_eq!(tree.color_attr(g, "fill", Color::NONE), RED);
    assert_eq!(tree.color_attr(g, "stroke", Color::NONE), BLUE);
    assert_eq!(tree.float_attr(g, "opacity", 1.0), 0.5);

    let other = group(&mut tree, doc, "xabc");
    assert!(tree.attr(other, "fill", SrcMask::CSS).is_none());
    assert!(tree.attr(other, "stroke", SrcMask::CSS).is_none());

    tree.set_xml_id(g, "boy");
    assert!(tree.attr(g, "opacity", SrcMask::CSS).is_none());
    assert_eq!(tree.color_attr(g, "stroke", Color::NONE), BLUE);
}

#[test]
fn test_css_to_inline_style() {
    let mut tree = SvgTree::new();
    let doc = document(&mut tree, Some(".a { fill: red }"));
    let g = group(&mut tree, doc, "a");
    tree.css_to_inline_style(g);
    assert_eq!(tree.attr(g, "fill", SrcMask::INLINE).map(|a| a.src), Some(AttrSource::InlineStyle));

    tree.set_xml_class(g, "");
    assert_eq!(tree.color_attr(g, "fill", Color::NONE), RED);
}

// ============================================================================
// Bounds and invalidation
// ============================================================================

#[test]
fn test_bounds_recomputed_after_invalidation() {
    let mut tree = SvgTree::new();
    let doc = document(&mut tree, None);
    let g = group(&mut tree, doc, "");
    let a = rect(&mut tree, g, Rect::ltwh(0.0, 0.0, 10.0, 10.0));
    let b = rect(&mut tree, g, Rect::ltwh(20.0, 0.0, 10.0, 10.0));
    assert_eq!(tree.bounds(g), Rect::ltrb(0.0, 0.0, 30.0, 10.0));

    tree.set_transform(b, Transform::from_translate(0.0, 40.0));
    assert!(!tree.node(g).unwrap().cached_bounds().is_valid());
    assert_eq!(tree.bounds(g), Rect::ltrb(0.0, 0.0, 30.0, 50.0));

    tree.set_transform(g, Transform::from_scale(2.0, 2.0));
    assert_eq!(tree.bounds(a), Rect::ltrb(0.0, 0.0, 20.0, 20.0));
    assert_eq!(tree.bounds(g), tree.compute_bounds(g));
}

#[test]
fn test_valid_parent_bounds_imply_valid_children() {
    let mut tree = SvgTree::new();
    let doc = document(&mut tree, None);
    let g = group(&mut tree, doc, "");
    let inner = group(&mut tree, g, "");
    let r = rect(&mut tree, inner, Rect::wh(5.0, 5.0));
    tree.bounds(doc);
    tree.set_attribute(g, "stroke-width", "3", AttrSource::Xml);
    for n in [doc, g, inner, r] {
        let node = tree.node(n).unwrap();
        if node.cached_bounds().is_valid() {
            assert!(node.children().iter().all(|c| tree.node(*c).unwrap().cached_bounds().is_valid()));
        }
    }
}

#[test]
fn test_dirty_reaches_root() {
    let mut tree = SvgTree::new();
    let doc = document(&mut tree, None);
    let g = group(&mut tree, doc, "");
    let path = parse_path_data("M0 0 L10 10").unwrap();
    let p = tree.create(NodeKind::Path(PathData::new(PathShape::Path, Some(path))));
    tree.add_child(g, p, None).unwrap();
    tree.clear_dirty(doc);

    tree.set_attribute(p, "stroke", "red", AttrSource::Xml);
    assert_eq!(tree.node(p).unwrap().dirty(), DirtyFlag::BoundsDirty);
    assert_eq!(tree.node(g).unwrap().dirty(), DirtyFlag::ChildDirty);
    assert_eq!(tree.node(doc).unwrap().dirty(), DirtyFlag::ChildDirty);

    // stroke width 1 pads by half a unit
    assert_eq!(tree.dirty_rect(doc), Rect::ltrb(-0.5, -0.5, 10.5, 10.5).intersect(&tree.bounds(doc)));
    tree.clear_dirty(doc);
    assert!(!tree.dirty_rect(doc).is_valid());
}

#[test]
fn test_removed_child_area_is_dirty() {
    let mut tree = SvgTree::new();
    let doc = document(&mut tree, None);
    let r = rect(&mut tree, doc, Rect::ltwh(50.0, 50.0, 20.0, 20.0));
    tree.clear_dirty(doc);

    tree.destroy(r).unwrap();
    assert!(!tree.contains(r));
    assert_eq!(tree.dirty_rect(doc), Rect::ltwh(50.0, 50.0, 20.0, 20.0));
}

// ============================================================================
// Documents and references
// ============================================================================

#[test]
fn test_named_node_falls_back_to_parent_document() {
    let mut tree = SvgTree::new();
    let doc = document(&mut tree, None);
    let outer_target = rect(&mut tree, doc, Rect::wh(1.0, 1.0));
    tree.set_xml_id(outer_target, "shared");

    let inner = tree.create(NodeKind::Document(DocumentData::default()));
    tree.add_child(doc, inner, None).unwrap();
    let inner_node = group(&mut tree, inner, "");
    assert_eq!(tree.named_node(inner, "shared"), Some(outer_target));
    assert_eq!(tree.ref_target(inner_node, "#shared"), Some(outer_target));

    let local = rect(&mut tree, inner, Rect::wh(1.0, 1.0));
    tree.set_xml_id(local, "shared");
    assert_eq!(tree.named_node(inner, "shared"), Some(local));
    assert_eq!(tree.named_node(doc, "shared"), Some(outer_target));

    // dropping the local id leaves the outer entry in place
    tree.set_xml_id(local, "");
    assert_eq!(tree.named_node(doc, "shared"), Some(outer_target));
    assert_eq!(tree.named_node(inner, "shared"), Some(outer_target));

    tree.set_xml_id(local, "shared");
    tree.destroy(local).unwrap();
    assert_eq!(tree.named_node(inner, "shared"), Some(outer_target));
}

#[test]
fn test_clone_rebuilds_registry() {
    let mut tree = SvgTree::new();
    let doc = document(&mut tree, Some(".a { fill: red }"));
    let r = rect(&mut tree, doc, Rect::wh(1.0, 1.0));
    tree.set_xml_id(r, "r");

    let copy = tree.clone_subtree(doc).unwrap();
    let copied_rect = tree.named_node(copy, "r").unwrap();
    assert_ne!(copied_rect, r);
    assert_eq!(tree.parent(copied_rect), Some(copy));
    assert!(tree.stylesheet(copy).is_none());
    assert_eq!(tree.node(copy).unwrap().dirty(), DirtyFlag::NotDirty);
}

#[test]
fn test_select_and_hit_test() {
    let mut tree = SvgTree::new();
    let doc = document(&mut tree, None);
    let g = group(&mut tree, doc, "layer");
    let r = rect(&mut tree, g, Rect::ltwh(10.0, 10.0, 10.0, 10.0));
    tree.set_xml_id(r, "box");

    assert_eq!(tree.select_first(doc, ".layer"), Some(g));
    assert_eq!(tree.select_first(doc, "#box"), Some(r));
    assert_eq!(tree.select(doc, "rect", 10), vec![r]);
    assert_eq!(tree.node_at(doc, 15.0, 15.0, true), Some(r));
    assert_eq!(tree.node_at(doc, 150.0, 150.0, true), None);
}
