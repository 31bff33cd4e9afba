//! SVG Writer
//!
//! Serializes a tree back to markup. Attributes are written band by band:
//! XML attributes as-is, inline style as one `style` attribute and, for
//! debugging, the CSS band as `debug:css`.

use fsvg_dom::values::{format_number, format_numbers, format_transform};
use fsvg_dom::{
    format_attr_value, format_path_data, path_points, Attr, AttrSource, GradientKind, Node, NodeId, NodeKind,
    PathShape, SvgTree, Units,
};

use crate::{SVG_NS, XLINK_NS};

/// Writer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Maximum decimals for numbers
    pub precision: usize,
    /// Also write CSS-sourced attributes, as `debug:css`
    pub debug_css_style: bool,
    /// Indent nested elements
    pub pretty: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            precision: 3,
            debug_css_style: false,
            pretty: false,
        }
    }
}

/// Serialize `node` and its subtree. A parentless document gets the
/// namespace declarations.
pub fn write_svg(tree: &SvgTree, node: NodeId, options: &WriteOptions) -> String {
    let mut writer = Writer {
        tree,
        options,
        out: String::new(),
        depth: 0,
        inline: 0,
    };
    writer.write_node(node);
    writer.out
}

struct Writer<'a> {
    tree: &'a SvgTree,
    options: &'a WriteOptions,
    out: String,
    depth: usize,
    /// Nesting inside text content, where whitespace is significant
    inline: usize,
}

impl<'a> Writer<'a> {
    fn indent(&mut self) {
        if self.options.pretty && self.inline == 0 && !self.out.is_empty() {
            self.out.push('\n');
            for _ in 0..self.depth {
                self.out.push_str("  ");
            }
        }
    }

    fn start(&mut self, tag: &str) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
    }

    fn attr(&mut self, name: &str, value: &str) {
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        escape_attribute(value, &mut self.out);
        self.out.push('"');
    }

    fn num(&mut self, name: &str, value: f32) {
        let value = format_number(value, self.options.precision);
        self.attr(name, &value);
    }

    fn nums(&mut self, name: &str, values: &[f32]) {
        let value = format_numbers(values, " ", self.options.precision);
        self.attr(name, &value);
    }

    /// Close the start tag, write `children` and the end tag
    fn finish(&mut self, tag: &str, children: &[NodeId]) {
        if children.is_empty() {
            self.out.push_str("/>");
            return;
        }
        self.out.push('>');
        self.depth += 1;
        for child in children {
            self.write_node(*child);
        }
        self.depth -= 1;
        self.indent();
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }

    fn write_node(&mut self, id: NodeId) {
        let tree = self.tree;
        let Some(node) = tree.get(id) else { return };
        let tag = node.tag_name();
        match node.kind() {
            NodeKind::Document(doc) => {
                self.start(tag);
                self.node_attrs(node);
                if doc.x != 0.0 || doc.y != 0.0 {
                    self.num("x", doc.x);
                    self.num("y", doc.y);
                }
                for (name, len) in [("width", doc.width()), ("height", doc.height())] {
                    if !len.is_percent() || len.value != 100.0 {
                        let value = format!("{}{}", format_number(len.value, self.options.precision), len.unit.suffix());
                        self.attr(name, &value);
                    }
                }
                let vb = doc.view_box();
                if vb.is_valid() && vb.width() > 0.0 && vb.height() > 0.0 {
                    self.nums("viewBox", &[vb.left, vb.top, vb.width(), vb.height()]);
                }
                if !doc.preserve_aspect_ratio {
                    self.attr("preserveAspectRatio", "none");
                }
                if node.parent().is_none() {
                    self.attr("xmlns", SVG_NS);
                    self.attr("xmlns:xlink", XLINK_NS);
                }
                self.finish(tag, node.children());
            }
            NodeKind::Group { .. } | NodeKind::Defs | NodeKind::Symbol => {
                self.start(tag);
                self.node_attrs(node);
                self.finish(tag, node.children());
            }
            NodeKind::Pattern(pattern) => {
                self.start(tag);
                self.node_attrs(node);
                let cell = pattern.cell;
                self.num("x", cell.left);
                self.num("y", cell.top);
                self.num("width", cell.width());
                self.num("height", cell.height());
                if pattern.units == Units::UserSpaceOnUse {
                    self.attr("patternUnits", "userSpaceOnUse");
                }
                if pattern.content_units == Units::ObjectBoundingBox {
                    self.attr("patternContentUnits", "objectBoundingBox");
                }
                self.finish(tag, node.children());
            }
            NodeKind::Gradient(grad) => {
                self.start(tag);
                self.node_attrs(node);
                let units = match grad.units {
                    Units::ObjectBoundingBox => "objectBoundingBox",
                    Units::UserSpaceOnUse => "userSpaceOnUse",
                };
                self.attr("gradientUnits", units);
                match grad.kind {
                    GradientKind::Linear { x1, y1, x2, y2 } => {
                        self.num("x1", x1);
                        self.num("y1", y1);
                        self.num("x2", x2);
                        self.num("y2", y2);
                    }
                    GradientKind::Radial { cx, cy, r, fx, fy } => {
                        self.num("cx", cx);
                        self.num("cy", cy);
                        self.num("r", r);
                        self.num("fx", fx);
                        self.num("fy", fy);
                    }
                }
                if grad.spread != Default::default() {
                    self.attr("spreadMethod", grad.spread.name());
                }
                if !grad.href.is_empty() {
                    self.attr("xlink:href", &grad.href);
                }
                self.finish(tag, node.children());
            }
            NodeKind::Stop => {
                // offset, stop-color and stop-opacity are ordinary attributes
                self.start(tag);
                self.node_attrs(node);
                self.out.push_str("/>");
            }
            NodeKind::Font(font) => {
                self.start(tag);
                self.node_attrs(node);
                self.num("horiz-adv-x", font.horiz_adv_x);
                self.out.push('>');
                self.depth += 1;
                self.start("font-face");
                self.attr("font-family", &font.family);
                self.num("units-per-em", font.units_per_em);
                self.out.push_str("/>");
                for glyph in node.children() {
                    self.write_node(*glyph);
                }
                for k in &font.kerning {
                    self.start("hkern");
                    for (name, value) in [("g1", &k.g1), ("g2", &k.g2), ("u1", &k.u1), ("u2", &k.u2)] {
                        if !value.is_empty() {
                            self.attr(name, value);
                        }
                    }
                    self.num("k", k.k);
                    self.out.push_str("/>");
                }
                self.depth -= 1;
                self.indent();
                self.out.push_str("</font>");
            }
            NodeKind::Glyph(glyph) => {
                self.start(tag);
                if !glyph.name.is_empty() {
                    self.attr("glyph-name", &glyph.name);
                }
                if !glyph.unicode.is_empty() {
                    self.attr("unicode", &glyph.unicode);
                }
                if let Some(adv) = glyph.horiz_adv_x {
                    self.num("horiz-adv-x", adv);
                }
                self.node_attrs(node);
                let d = glyph
                    .path
                    .as_ref()
                    .map(|p| format_path_data(p, self.options.precision))
                    .unwrap_or_default();
                self.attr("d", &d);
                self.out.push_str("/>");
            }
            NodeKind::Path(data) => {
                self.start(tag);
                self.node_attrs(node);
                self.shape_attrs(data.shape, data.path.as_ref());
                self.out.push_str("/>");
            }
            NodeKind::Rect(data) => {
                self.start(tag);
                self.node_attrs(node);
                self.num("x", data.rect.left);
                self.num("y", data.rect.top);
                self.num("width", data.rect.width());
                self.num("height", data.rect.height());
                if data.rx > 0.0 || data.ry > 0.0 {
                    self.num("rx", data.rx);
                    self.num("ry", data.ry);
                }
                self.out.push_str("/>");
            }
            NodeKind::Image(img) => {
                self.start(tag);
                self.node_attrs(node);
                self.num("x", img.bounds.left);
                self.num("y", img.bounds.top);
                if img.bounds.width() > 0.0 {
                    self.num("width", img.bounds.width());
                }
                if img.bounds.height() > 0.0 {
                    self.num("height", img.bounds.height());
                }
                self.attr("xlink:href", &img.href);
                self.out.push_str("/>");
            }
            NodeKind::Text(span) | NodeKind::Tspan(span) if span.is_tspan => {
                self.start(tag);
                self.node_attrs(node);
                if !span.x.is_empty() {
                    self.nums("x", &span.x);
                }
                if !span.y.is_empty() {
                    self.nums("y", &span.y);
                }
                self.out.push('>');
                self.inline += 1;
                if node.children().is_empty() {
                    escape_text(&span.text, &mut self.out);
                }
                for child in node.children() {
                    self.write_node(*child);
                }
                self.inline -= 1;
                self.out.push_str("</");
                self.out.push_str(tag);
                self.out.push('>');
            }
            NodeKind::Text(span) | NodeKind::Tspan(span) => {
                if span.is_line_break() {
                    self.out.push_str("<tbreak/>");
                } else {
                    escape_text(&span.text, &mut self.out);
                }
            }
            NodeKind::Use(data) => {
                self.start(tag);
                self.node_attrs(node);
                let vp = data.viewport;
                if vp.left != 0.0 {
                    self.num("x", vp.left);
                }
                if vp.top != 0.0 {
                    self.num("y", vp.top);
                }
                if vp.width() > 0.0 {
                    self.num("width", vp.width());
                }
                if vp.height() > 0.0 {
                    self.num("height", vp.height());
                }
                let href = match data.target.and_then(|t| tree.get(t)) {
                    Some(target) if data.href.is_empty() && !target.xml_id().is_empty() => {
                        format!("#{}", target.xml_id())
                    }
                    _ => data.href.clone(),
                };
                self.attr("xlink:href", &href);
                self.out.push_str("/>");
            }
            NodeKind::Fragment(frag) => {
                self.indent();
                self.out.push_str(&frag.xml);
            }
            NodeKind::Custom(_) => {
                self.start("foreignObject");
                self.node_attrs(node);
                self.finish("foreignObject", node.children());
            }
        }
    }

    /// Geometry of a path-backed shape
    fn shape_attrs(&mut self, shape: PathShape, path: Option<&tiny_skia::Path>) {
        let points = path.map(path_points).unwrap_or_default();
        let bounds = path.and_then(|p| p.compute_tight_bounds());
        match shape {
            PathShape::Line => {
                let pt = |i: usize| points.get(i).copied().unwrap_or(0.0);
                self.num("x1", pt(0));
                self.num("y1", pt(1));
                self.num("x2", pt(2));
                self.num("y2", pt(3));
            }
            PathShape::Circle => {
                let (cx, cy, r) = bounds.map_or((0.0, 0.0, 0.0), |b| {
                    (b.left() + b.width() / 2.0, b.top() + b.height() / 2.0, b.width() / 2.0)
                });
                self.num("cx", cx);
                self.num("cy", cy);
                self.num("r", r);
            }
            PathShape::Ellipse => {
                let (cx, cy, rx, ry) = bounds.map_or((0.0, 0.0, 0.0, 0.0), |b| {
                    let (rx, ry) = (b.width() / 2.0, b.height() / 2.0);
                    (b.left() + rx, b.top() + ry, rx, ry)
                });
                self.num("cx", cx);
                self.num("cy", cy);
                self.num("rx", rx);
                self.num("ry", ry);
            }
            PathShape::Polygon | PathShape::Polyline => self.nums("points", &points),
            PathShape::Path => {
                let d = path
                    .map(|p| format_path_data(p, self.options.precision))
                    .unwrap_or_default();
                self.attr("d", &d);
            }
        }
    }

    /// id, class, transform and the attribute bands
    fn node_attrs(&mut self, node: &Node) {
        if !node.xml_id().is_empty() {
            self.attr("id", node.xml_id());
        }
        if !node.xml_class().is_empty() {
            self.attr("class", node.xml_class());
        }
        if let Some(ts) = node.transform() {
            let value = format_transform(ts, self.options.precision);
            if !value.is_empty() {
                let name = match node.kind() {
                    NodeKind::Gradient(_) => "gradientTransform",
                    NodeKind::Pattern(_) => "patternTransform",
                    _ => "transform",
                };
                self.attr(name, &value);
            }
        }

        let attrs = node.attrs();
        let precision = self.options.precision;
        for attr in attrs.from_source(AttrSource::Xml).filter(|a| !a.no_serialize) {
            let value = format_attr_value(attr, precision);
            self.attr(&attr.name, &value);
        }
        let style = style_string(attrs.from_source(AttrSource::InlineStyle), precision);
        if !style.is_empty() {
            self.attr("style", &style);
        }
        if self.options.debug_css_style {
            let css = style_string(attrs.from_source(AttrSource::Css), precision);
            if !css.is_empty() {
                self.attr("debug:css", &css);
            }
        }
    }
}

/// `name:value` pairs joined by `;`
fn style_string<'a>(attrs: impl Iterator<Item = &'a Attr>, precision: usize) -> String {
    attrs
        .filter(|a| !a.no_serialize)
        .map(|a| format!("{}:{}", a.name, format_attr_value(a, precision)))
        .collect::<Vec<_>>()
        .join(";")
}

fn escape_text(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(c),
        }
    }
}

fn escape_attribute(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(c),
        }
    }
}
