//! SVG Reader
//!
//! Element factory over a `roxmltree` document. Geometry attributes are
//! consumed by the element they describe; every other attribute becomes an
//! XML-sourced attribute, with `style` applied last as inline style.
//! `<style>` contents are collected into one stylesheet that is installed
//! on the root document and applied once the tree is complete.

use fsvg_dom::values::{parse_length, parse_number, parse_numbers_list, parse_transform, DEFAULT_DPI};
use fsvg_dom::{
    circle_path, ellipse_path, line_path, parse_path_data, poly_path, AttrSource, DocumentData, DomResult,
    FontData, FragmentData, GlyphData, GradientData, ImageData, Kerning, Length, LengthUnit, NodeId, NodeKind,
    NodeOperations, PathData, PathShape, PatternData, Rect, RectData, Spread, SvgStylesheet, SvgTree, TspanData,
    Units, UseData,
};
use roxmltree::{Node as XmlNode, ParsingOptions};

use crate::{XmlError, XmlResult, SVG_NS};

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Font size assumed for `em` lengths until an element sets one
const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Reader settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadOptions {
    /// Resolution for absolute units (`pt`, `in`, `mm`, ...)
    pub dpi: f32,
    /// Apply collected `<style>` rules once the tree is built
    pub restyle: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { dpi: DEFAULT_DPI, restyle: true }
    }
}

/// Parse markup into a new tree, returning it with its root document
pub fn read_svg(text: &str, options: &ReadOptions) -> XmlResult<(SvgTree, NodeId)> {
    let mut tree = SvgTree::new();
    let root = read_svg_into(&mut tree, text, options)?;
    Ok((tree, root))
}

/// Parse markup into an existing tree. The returned document is detached;
/// attach it with `add_child` to nest it.
pub fn read_svg_into(tree: &mut SvgTree, text: &str, options: &ReadOptions) -> XmlResult<NodeId> {
    let parse_opts = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let xml = roxmltree::Document::parse_with_options(text, parse_opts)?;
    let root_el = xml.root().first_element_child().ok_or(XmlError::MissingRoot)?;
    let name = root_el.tag_name().name();
    if name != "svg" || !is_svg_element(root_el) {
        return Err(XmlError::UnexpectedRoot { name: name.to_string() });
    }

    let mut reader = Reader {
        tree,
        source: text,
        dpi: options.dpi,
        sheet: SvgStylesheet::new(),
    };
    let state = State {
        em: DEFAULT_FONT_SIZE,
        preserve_space: false,
    };
    let root = reader.read_root(root_el, state);
    reader.finish(root, options.restyle);
    Ok(root)
}

fn is_svg_element(el: XmlNode) -> bool {
    matches!(el.tag_name().namespace(), None | Some(SVG_NS))
}

/// Prefixed name as written in the source
fn qualified_name(el: XmlNode, namespace: Option<&str>, local: &str) -> String {
    match namespace {
        None | Some(SVG_NS) => local.to_string(),
        Some(XML_NS) => format!("xml:{}", local),
        Some(ns) => match el.lookup_prefix(ns) {
            Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
            _ => local.to_string(),
        },
    }
}

/// Character data with default `xml:space` handling: newlines dropped,
/// tabs turned into spaces and runs of spaces collapsed. Indentation-only
/// runs are skipped entirely.
fn collapse_text(text: &str, preserve: bool) -> Option<String> {
    if preserve {
        return Some(text.replace(['\n', '\r', '\t'], " "));
    }
    if text.trim().is_empty() && text.contains('\n') {
        return None;
    }
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' | '\r' => {}
            c if c.is_whitespace() => {
                if !out.ends_with(' ') {
                    out.push(' ');
                }
            }
            c => out.push(c),
        }
    }
    (!out.is_empty()).then_some(out)
}

/// Attributes of one element; factory code consumes the ones it handles
struct XmlAttrs {
    attrs: Vec<(String, String)>,
    used: Vec<bool>,
}

impl XmlAttrs {
    fn new(el: XmlNode) -> Self {
        let attrs: Vec<(String, String)> = el
            .attributes()
            .map(|a| (qualified_name(el, a.namespace(), a.name()), a.value().to_string()))
            .collect();
        let used = vec![false; attrs.len()];
        Self { attrs, used }
    }

    fn peek(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    fn take(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(n, _)| n == name)?;
        self.used[idx] = true;
        Some(self.attrs[idx].1.clone())
    }

    fn take_numbers(&mut self, name: &str) -> Vec<f32> {
        self.take(name).map(|s| parse_numbers_list(&s)).unwrap_or_default()
    }

    fn take_number(&mut self, name: &str) -> Option<f32> {
        self.take(name).and_then(|s| parse_number(&s))
    }

    /// `xlink:href`, else plain `href`
    fn take_href(&mut self) -> String {
        let xlink = self.take("xlink:href");
        let plain = self.take("href");
        xlink.or(plain).unwrap_or_default()
    }

    fn remaining(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs
            .iter()
            .zip(&self.used)
            .filter(|(_, used)| !**used)
            .map(|((n, v), _)| (n.as_str(), v.as_str()))
    }
}

/// Inherited parse state
#[derive(Debug, Clone, Copy)]
struct State {
    em: f32,
    preserve_space: bool,
}

/// What a parent node accepts as element children
enum Slot {
    Text,
    Gradient,
    Font,
    Container,
    Leaf,
}

struct Reader<'t, 's> {
    tree: &'t mut SvgTree,
    source: &'s str,
    dpi: f32,
    sheet: SvgStylesheet,
}

impl Reader<'_, '_> {
    fn to_px(&self, len: Length, em: f32) -> f32 {
        match len.unit {
            LengthUnit::Em => len.value * em,
            LengthUnit::Ex => len.value * em * 0.5,
            LengthUnit::Percent => len.value * 0.01,
            _ => len.to_px(self.dpi),
        }
    }

    fn take_px(&self, attrs: &mut XmlAttrs, name: &str, dflt: f32, em: f32) -> f32 {
        attrs
            .take(name)
            .and_then(|s| parse_length(&s))
            .map_or(dflt, |len| self.to_px(len, em))
    }

    fn element_state(&self, attrs: &XmlAttrs, parent: State) -> State {
        let em = attrs
            .peek("font-size")
            .and_then(parse_length)
            .map(|len| match len.unit {
                LengthUnit::Percent => parent.em * len.value / 100.0,
                _ => self.to_px(len, parent.em),
            })
            .filter(|v| *v > 0.0)
            .unwrap_or(parent.em);
        let preserve_space = match attrs.peek("xml:space") {
            Some(v) => v == "preserve",
            None => parent.preserve_space,
        };
        State { em, preserve_space }
    }

    fn read_root(&mut self, el: XmlNode, state: State) -> NodeId {
        let mut attrs = XmlAttrs::new(el);
        let state = self.element_state(&attrs, state);
        let kind = self.document_kind(&mut attrs, state.em);
        let doc = self.tree.create(kind);
        self.finish_element(el, doc, attrs, state);
        doc
    }

    fn slot(&self, parent: NodeId) -> Slot {
        match self.tree.get(parent) {
            Some(node) => match node.kind() {
                NodeKind::Text(_) | NodeKind::Tspan(_) => Slot::Text,
                NodeKind::Gradient(_) => Slot::Gradient,
                NodeKind::Font(_) => Slot::Font,
                _ if node.is_container() => Slot::Container,
                _ => Slot::Leaf,
            },
            None => Slot::Leaf,
        }
    }

    fn read_element(&mut self, el: XmlNode, parent: NodeId, state: State) {
        if !is_svg_element(el) {
            self.add_fragment(el, parent);
            return;
        }
        let name = el.tag_name().name();
        if name == "style" {
            self.read_style(el, parent);
            return;
        }

        let mut attrs = XmlAttrs::new(el);
        let state = self.element_state(&attrs, state);
        let node = match self.slot(parent) {
            Slot::Text if name == "tbreak" => {
                if let Err(e) = self.tree.add_text(parent, "\n") {
                    tracing::debug!("Dropping <tbreak>: {}", e);
                }
                return;
            }
            Slot::Text if name == "tspan" => {
                let data = TspanData {
                    x: attrs.take_numbers("x"),
                    y: attrs.take_numbers("y"),
                    ..TspanData::new()
                };
                let tspan = self.tree.create(NodeKind::Tspan(data));
                let result = self.tree.add_tspan(parent, tspan);
                self.attached(tspan, result)
            }
            Slot::Gradient if name == "stop" => {
                let stop = self.tree.create(NodeKind::Stop);
                let result = self.tree.add_child(parent, stop, None);
                self.attached(stop, result)
            }
            Slot::Font => match name {
                "glyph" | "missing-glyph" => {
                    let glyph = self.tree.create(NodeKind::Glyph(GlyphData {
                        name: attrs.take("glyph-name").unwrap_or_default(),
                        unicode: attrs.take("unicode").unwrap_or_default(),
                        path: attrs.take("d").and_then(|d| parse_path_data(&d)),
                        horiz_adv_x: attrs.take_number("horiz-adv-x").filter(|v| *v >= 0.0),
                    }));
                    let result = self.tree.add_glyph(parent, glyph);
                    self.attached(glyph, result)
                }
                "font-face" => {
                    self.read_font_face(parent, &mut attrs);
                    return;
                }
                "hkern" => {
                    self.read_kerning(parent, &mut attrs);
                    return;
                }
                _ => None,
            },
            Slot::Container => match self.create_kind(name, &mut attrs, state.em) {
                Some(kind) => {
                    let node = self.tree.create(kind);
                    let result = self.tree.add_child(parent, node, None);
                    self.attached(node, result)
                }
                None => {
                    tracing::debug!("Keeping unknown element <{}> as a fragment", name);
                    self.add_fragment(el, parent);
                    return;
                }
            },
            _ => None,
        };

        match node {
            Some(node) => self.finish_element(el, node, attrs, state),
            None => tracing::debug!("Skipping <{}> in <{}>", name, self.tree.node_path(parent)),
        }
    }

    fn attached(&mut self, node: NodeId, result: DomResult<()>) -> Option<NodeId> {
        match result {
            Ok(()) => Some(node),
            Err(e) => {
                tracing::debug!("Cannot attach node: {}", e);
                if let Err(e) = self.tree.destroy(node) {
                    tracing::debug!("Cannot free detached node: {}", e);
                }
                None
            }
        }
    }

    /// Core attributes, remaining attributes, inline style, then children
    fn finish_element(&mut self, el: XmlNode, node: NodeId, mut attrs: XmlAttrs, state: State) {
        let id = attrs.take("id");
        let xml_id = attrs.take("xml:id");
        if let Some(id) = id.or(xml_id).filter(|s| !s.is_empty()) {
            self.tree.set_xml_id(node, &id);
        }
        if let Some(class) = attrs.take("class") {
            self.tree.set_xml_class(node, &class);
        }
        let ts_name = match self.tree.get(node).map(|n| n.kind()) {
            Some(NodeKind::Gradient(_)) => "gradientTransform",
            Some(NodeKind::Pattern(_)) => "patternTransform",
            _ => "transform",
        };
        if let Some(ts) = attrs.take(ts_name) {
            self.tree.set_transform(node, parse_transform(&ts));
        }

        let style = attrs.take("style");
        for (name, value) in attrs.remaining() {
            self.tree.set_attribute(node, name, value, AttrSource::Xml);
        }
        if let Some(style) = style {
            self.tree.set_style(node, &style);
        }

        self.read_children(el, node, state);
    }

    fn read_children(&mut self, el: XmlNode, node: NodeId, state: State) {
        let is_text = matches!(self.slot(node), Slot::Text);
        for child in el.children() {
            if child.is_element() {
                self.read_element(child, node, state);
            } else if child.is_text() {
                if !is_text {
                    continue;
                }
                let Some(text) = child.text().and_then(|t| collapse_text(t, state.preserve_space)) else {
                    continue;
                };
                if let Err(e) = self.tree.add_text(node, &text) {
                    tracing::debug!("Dropping character data: {}", e);
                }
            } else if child.is_comment() || child.is_pi() {
                self.add_fragment(child, node);
            }
        }
    }

    /// Keep markup verbatim under a container; elsewhere it is dropped
    fn add_fragment(&mut self, xml: XmlNode, parent: NodeId) {
        if !matches!(self.slot(parent), Slot::Container) {
            return;
        }
        let tag = if xml.is_element() {
            qualified_name(xml, xml.tag_name().namespace(), xml.tag_name().name())
        } else if xml.is_comment() {
            "#comment".to_string()
        } else {
            "#pi".to_string()
        };
        let Some(markup) = self.source.get(xml.range()) else { return };
        let frag = self.tree.create(NodeKind::Fragment(FragmentData {
            tag,
            xml: markup.to_string(),
        }));
        let result = self.tree.add_child(parent, frag, None);
        self.attached(frag, result);
    }

    fn read_style(&mut self, el: XmlNode, parent: NodeId) {
        let ty = el.attribute("type").unwrap_or("").trim();
        if ty.is_empty() || ty == "text/css" {
            let css: String = el
                .descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect();
            self.sheet.parse(&css);
        }
        self.add_fragment(el, parent);
    }

    fn read_font_face(&mut self, font: NodeId, attrs: &mut XmlAttrs) {
        let family = attrs.take("font-family").unwrap_or_default();
        let units_per_em = attrs.take_number("units-per-em").unwrap_or(1000.0);
        if let Some(NodeKind::Font(data)) = self.tree.get_mut(font).map(|n| n.kind_mut()) {
            data.family = family.trim().to_string();
            data.units_per_em = units_per_em;
            if data.family.is_empty() {
                return;
            }
        }
        if let Some(doc) = self.tree.document(font) {
            self.tree.add_font(doc, font);
        }
    }

    fn read_kerning(&mut self, font: NodeId, attrs: &mut XmlAttrs) {
        let names = |s: Option<String>| s.unwrap_or_default().split_whitespace().collect::<String>();
        let kerning = Kerning {
            g1: names(attrs.take("g1")),
            g2: names(attrs.take("g2")),
            u1: attrs.take("u1").unwrap_or_default(),
            u2: attrs.take("u2").unwrap_or_default(),
            k: attrs.take_number("k").unwrap_or(0.0),
        };
        if let Some(NodeKind::Font(data)) = self.tree.get_mut(font).map(|n| n.kind_mut()) {
            data.kerning.push(kerning);
        }
    }

    fn document_kind(&self, attrs: &mut XmlAttrs, em: f32) -> NodeKind {
        let x = self.take_px(attrs, "x", 0.0, em);
        let y = self.take_px(attrs, "y", 0.0, em);
        let length = |s: Option<String>| s.and_then(|s| parse_length(&s)).unwrap_or(Length::percent(100.0));
        let width = length(attrs.take("width"));
        let height = length(attrs.take("height"));
        let view_box = match attrs.take_numbers("viewBox").as_slice() {
            [x, y, w, h] => Rect::ltwh(*x, *y, *w, *h),
            _ => Rect::INVALID,
        };
        let mut data = DocumentData::new(x, y, width, height).with_view_box(view_box);
        // only xMidYMid and none are distinguished
        data.preserve_aspect_ratio = attrs.take("preserveAspectRatio").map_or(true, |p| p.trim() != "none");
        NodeKind::Document(data)
    }

    /// Node payload for an element under a container; `None` if unknown
    fn create_kind(&self, name: &str, attrs: &mut XmlAttrs, em: f32) -> Option<NodeKind> {
        let kind = match name {
            "svg" => self.document_kind(attrs, em),
            "g" => NodeKind::Group { anchor: false },
            "a" => NodeKind::Group { anchor: true },
            "defs" => NodeKind::Defs,
            "symbol" => NodeKind::Symbol,
            "pattern" => {
                let cell = Rect::ltwh(
                    self.take_px(attrs, "x", 0.0, em),
                    self.take_px(attrs, "y", 0.0, em),
                    self.take_px(attrs, "width", 0.0, em),
                    self.take_px(attrs, "height", 0.0, em),
                );
                let units = match attrs.take("patternUnits").as_deref() {
                    Some("userSpaceOnUse") => Units::UserSpaceOnUse,
                    _ => Units::ObjectBoundingBox,
                };
                let content_units = match attrs.take("patternContentUnits").as_deref() {
                    Some("objectBoundingBox") => Units::ObjectBoundingBox,
                    _ => Units::UserSpaceOnUse,
                };
                NodeKind::Pattern(PatternData { cell, units, content_units })
            }
            "linearGradient" => {
                let data = GradientData::linear(
                    self.take_px(attrs, "x1", 0.0, em),
                    self.take_px(attrs, "y1", 0.0, em),
                    self.take_px(attrs, "x2", 1.0, em),
                    self.take_px(attrs, "y2", 0.0, em),
                );
                NodeKind::Gradient(self.gradient_common(data, attrs))
            }
            "radialGradient" => {
                let cx = self.take_px(attrs, "cx", 0.5, em);
                let cy = self.take_px(attrs, "cy", 0.5, em);
                let r = self.take_px(attrs, "r", 0.5, em);
                let fx = self.take_px(attrs, "fx", cx, em);
                let fy = self.take_px(attrs, "fy", cy, em);
                NodeKind::Gradient(self.gradient_common(GradientData::radial(cx, cy, r, fx, fy), attrs))
            }
            "path" => {
                let path = attrs.take("d").and_then(|d| parse_path_data(&d));
                NodeKind::Path(PathData::new(PathShape::Path, path))
            }
            "rect" => {
                let rect = Rect::ltwh(
                    self.take_px(attrs, "x", 0.0, em),
                    self.take_px(attrs, "y", 0.0, em),
                    self.take_px(attrs, "width", 0.0, em),
                    self.take_px(attrs, "height", 0.0, em),
                );
                let has_rx = attrs.peek("rx").is_some();
                let has_ry = attrs.peek("ry").is_some();
                let mut rx = self.take_px(attrs, "rx", 0.0, em);
                let mut ry = self.take_px(attrs, "ry", 0.0, em);
                if !has_ry {
                    ry = rx;
                } else if !has_rx {
                    rx = ry;
                }
                NodeKind::Rect(RectData::new(rect, rx, ry))
            }
            "circle" => {
                let cx = self.take_px(attrs, "cx", 0.0, em);
                let cy = self.take_px(attrs, "cy", 0.0, em);
                let r = self.take_px(attrs, "r", 0.0, em);
                NodeKind::Path(PathData::new(PathShape::Circle, circle_path(cx, cy, r)))
            }
            "ellipse" => {
                let cx = self.take_px(attrs, "cx", 0.0, em);
                let cy = self.take_px(attrs, "cy", 0.0, em);
                let rx = self.take_px(attrs, "rx", 0.0, em);
                let ry = self.take_px(attrs, "ry", 0.0, em);
                NodeKind::Path(PathData::new(PathShape::Ellipse, ellipse_path(cx, cy, rx, ry)))
            }
            "line" => {
                let x1 = self.take_px(attrs, "x1", 0.0, em);
                let y1 = self.take_px(attrs, "y1", 0.0, em);
                let x2 = self.take_px(attrs, "x2", 0.0, em);
                let y2 = self.take_px(attrs, "y2", 0.0, em);
                NodeKind::Path(PathData::new(PathShape::Line, line_path(x1, y1, x2, y2)))
            }
            "polygon" | "polyline" => {
                let points = attrs.take_numbers("points");
                let (shape, close) = if name == "polygon" {
                    (PathShape::Polygon, true)
                } else {
                    (PathShape::Polyline, false)
                };
                NodeKind::Path(PathData::new(shape, poly_path(&points, close)))
            }
            "image" => {
                let href = attrs.take_href();
                let viewport = Rect::ltwh(
                    self.take_px(attrs, "x", 0.0, em),
                    self.take_px(attrs, "y", 0.0, em),
                    self.take_px(attrs, "width", 0.0, em),
                    self.take_px(attrs, "height", 0.0, em),
                );
                let target = href.trim();
                let is_svg = target.len() > 4
                    && target.get(target.len() - 4..).is_some_and(|ext| ext.eq_ignore_ascii_case(".svg"));
                if is_svg {
                    NodeKind::Use(UseData {
                        href: target.to_string(),
                        target: None,
                        viewport,
                    })
                } else {
                    NodeKind::Image(ImageData {
                        bounds: viewport,
                        href,
                        intrinsic_size: (0.0, 0.0),
                    })
                }
            }
            "text" => NodeKind::Text(TspanData {
                x: attrs.take_numbers("x"),
                y: attrs.take_numbers("y"),
                ..TspanData::new()
            }),
            "use" => {
                let href = attrs.take_href();
                let viewport = Rect::ltwh(
                    self.take_px(attrs, "x", 0.0, em),
                    self.take_px(attrs, "y", 0.0, em),
                    self.take_px(attrs, "width", 0.0, em),
                    self.take_px(attrs, "height", 0.0, em),
                );
                NodeKind::Use(UseData {
                    href: href.trim().to_string(),
                    target: None,
                    viewport,
                })
            }
            "font" => NodeKind::Font(FontData::new(attrs.take_number("horiz-adv-x").unwrap_or(0.0))),
            _ => return None,
        };
        Some(kind)
    }

    fn gradient_common(&self, mut data: GradientData, attrs: &mut XmlAttrs) -> GradientData {
        data.href = attrs.take_href().trim().to_string();
        data.spread = Spread::from_name(attrs.take("spreadMethod").as_deref().unwrap_or("pad"));
        data.units = match attrs.take("gradientUnits").as_deref() {
            Some("userSpaceOnUse") => Units::UserSpaceOnUse,
            _ => Units::ObjectBoundingBox,
        };
        data
    }

    /// Install collected rules on the root document and apply them
    fn finish(self, root: NodeId, restyle: bool) {
        let Reader { tree, mut sheet, .. } = self;
        tracing::debug!("Read SVG document with {} nodes", tree.len());
        if sheet.is_empty() {
            return;
        }
        sheet.sort_rules();
        tree.set_stylesheet(root, Some(sheet));
        if restyle {
            tree.restyle(root);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsvg_dom::{Color, DomError, SrcMask};

    fn read(text: &str) -> (SvgTree, NodeId) {
        read_svg(text, &ReadOptions::default()).unwrap()
    }

    fn only_child(tree: &SvgTree, node: NodeId) -> NodeId {
        assert_eq!(tree.children(node).len(), 1);
        tree.children(node)[0]
    }

    #[test]
    fn test_root_must_be_svg() {
        let err = read_svg("<html/>", &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, XmlError::UnexpectedRoot { ref name } if name == "html"));
        assert!(matches!(read_svg("<svg", &ReadOptions::default()), Err(XmlError::Parse(_))));
    }

    #[test]
    fn test_failed_attach_frees_node() {
        let mut tree = SvgTree::new();
        let node = tree.create(NodeKind::Defs);
        let mut reader = Reader {
            tree: &mut tree,
            source: "",
            dpi: DEFAULT_DPI,
            sheet: SvgStylesheet::new(),
        };
        assert_eq!(reader.attached(node, Err(DomError::HierarchyRequest)), None);
        // a second failure on the freed id is logged, not raised
        assert_eq!(reader.attached(node, Err(DomError::HierarchyRequest)), None);
        assert!(!tree.contains(node));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_document_attributes() {
        let (tree, doc) = read(r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="50%" viewBox="0 0 20 10" preserveAspectRatio="none"/>"#);
        let data = tree.node(doc).unwrap().as_document().unwrap();
        assert_eq!(data.width(), Length::px(200.0));
        assert_eq!(data.height(), Length::percent(50.0));
        assert_eq!(data.view_box(), Rect::ltwh(0.0, 0.0, 20.0, 10.0));
        assert!(!data.preserve_aspect_ratio);
        assert!(tree.node(doc).unwrap().attrs().is_empty());
    }

    #[test]
    fn test_rect_radius_mirroring() {
        let (tree, doc) = read(r#"<svg><rect width="10" height="5" rx="2"/><rect width="1" height="1" ry="3"/></svg>"#);
        let radii: Vec<(f32, f32)> = tree
            .children(doc)
            .iter()
            .map(|c| match tree.node(*c).unwrap().kind() {
                NodeKind::Rect(r) => (r.rx, r.ry),
                _ => panic!("expected rect"),
            })
            .collect();
        assert_eq!(radii, vec![(2.0, 2.0), (3.0, 3.0)]);
    }

    #[test]
    fn test_core_and_presentation_attributes() {
        let (tree, doc) = read(
            r#"<svg><g id="layer" class="a b" transform="translate(5,6)" fill="red" style="fill: blue; opacity: 0.5"/></svg>"#,
        );
        let g = only_child(&tree, doc);
        let node = tree.node(g).unwrap();
        assert_eq!(node.xml_id(), "layer");
        assert!(node.has_class("b"));
        assert_eq!(tree.transform(g).tx, 5.0);
        assert_eq!(tree.named_node(doc, "layer"), Some(g));
        // inline style outranks the XML attribute
        assert_eq!(tree.color_attr(g, "fill", Color::NONE), Color::rgba(0, 0, 255, 255));
        assert!(tree.attr(g, "fill", SrcMask::XML).is_some());
        assert_eq!(tree.float_attr(g, "opacity", 1.0), 0.5);
    }

    #[test]
    fn test_style_element_applies_rules() {
        let (tree, doc) = read(
            r#"<svg><style type="text/css"><![CDATA[ .a { fill: red } ]]></style><rect class="a" width="1" height="1"/></svg>"#,
        );
        assert!(tree.stylesheet(doc).is_some());
        let children = tree.children(doc);
        assert!(matches!(tree.node(children[0]).unwrap().kind(), NodeKind::Fragment(f) if f.tag == "style"));
        assert_eq!(tree.color_attr(children[1], "fill", Color::NONE), Color::rgba(255, 0, 0, 255));
        assert!(tree.attr(children[1], "fill", SrcMask::CSS).is_some());
    }

    #[test]
    fn test_style_without_restyle() {
        let options = ReadOptions { restyle: false, ..ReadOptions::default() };
        let (tree, doc) = read_svg(r#"<svg><style>rect { fill: red }</style><rect/></svg>"#, &options).unwrap();
        assert!(tree.stylesheet(doc).is_some());
        assert!(tree.attr(tree.children(doc)[1], "fill", SrcMask::ANY).is_none());
    }

    #[test]
    fn test_unknown_markup_kept_as_fragments() {
        let text = r#"<svg xmlns:foo="urn:foo"><!-- note --><foo:bar x="1"/><blink>hi</blink></svg>"#;
        let (tree, doc) = read(text);
        let frags: Vec<(String, String)> = tree
            .children(doc)
            .iter()
            .map(|c| match tree.node(*c).unwrap().kind() {
                NodeKind::Fragment(f) => (f.tag.clone(), f.xml.clone()),
                _ => panic!("expected fragment"),
            })
            .collect();
        assert_eq!(frags[0], ("#comment".to_string(), "<!-- note -->".to_string()));
        assert_eq!(frags[1], ("foo:bar".to_string(), r#"<foo:bar x="1"/>"#.to_string()));
        assert_eq!(frags[2], ("blink".to_string(), "<blink>hi</blink>".to_string()));
    }

    #[test]
    fn test_text_spans_and_breaks() {
        let (tree, doc) = read(
            "<svg><text x=\"1 2\" y=\"3\">\n  Hello <tspan>big</tspan><tbreak/>world\n</text></svg>",
        );
        let text = only_child(&tree, doc);
        let data = tree.node(text).unwrap().as_tspan().unwrap();
        assert_eq!(data.x, vec![1.0, 2.0]);
        assert_eq!(data.y, vec![3.0]);
        let spans = tree.children(text);
        assert_eq!(spans.len(), 4);
        assert!(tree.node(spans[1]).unwrap().as_tspan().unwrap().is_tspan);
        assert!(tree.is_line_break(spans[2]));
        assert_eq!(tree.text(text), " Hello big\nworld");
    }

    #[test]
    fn test_collapse_text() {
        assert_eq!(collapse_text("\n   ", false), None);
        assert_eq!(collapse_text("a \t b\n c", false).as_deref(), Some("a b c"));
        assert_eq!(collapse_text("a\tb", true).as_deref(), Some("a b"));
        assert_eq!(collapse_text("  ", false).as_deref(), Some(" "));
    }

    #[test]
    fn test_gradient_with_stops() {
        let (tree, doc) = read(
            r##"<svg><linearGradient id="g" x2="0" y2="1" gradientUnits="userSpaceOnUse" spreadMethod="reflect" gradientTransform="scale(2)" xlink:href="#base" xmlns:xlink="http://www.w3.org/1999/xlink"><stop offset="0.5" stop-color="red"/><rect/></linearGradient></svg>"##,
        );
        let grad = only_child(&tree, doc);
        let node = tree.node(grad).unwrap();
        let data = node.as_gradient().unwrap();
        assert_eq!(data.units, Units::UserSpaceOnUse);
        assert_eq!(data.spread, Spread::Reflect);
        assert_eq!(data.href, "#base");
        assert_eq!(tree.transform(grad).sx, 2.0);
        assert_eq!(node.children().len(), 1);
        let stops = tree.gradient_stops(grad);
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].offset, 0.5);
    }

    #[test]
    fn test_svg_image_becomes_use() {
        let (tree, doc) = read(r#"<svg><image href="icons/star.SVG" width="10"/><image href="a.png" x="1"/></svg>"#);
        let kids = tree.children(doc);
        let use_data = tree.node(kids[0]).unwrap().as_use().unwrap();
        assert_eq!(use_data.href, "icons/star.SVG");
        assert_eq!(use_data.viewport.width(), 10.0);
        assert!(matches!(tree.node(kids[1]).unwrap().kind(), NodeKind::Image(img) if img.href == "a.png"));
    }

    #[test]
    fn test_use_resolves_by_id() {
        let (tree, doc) = read(
            r##"<svg xmlns:xlink="http://www.w3.org/1999/xlink"><defs><path id="p" d="M0 0 L10 10"/></defs><use xlink:href="#p" x="5"/></svg>"##,
        );
        let use_node = tree.children(doc)[1];
        let path = tree.named_node(doc, "p").unwrap();
        assert_eq!(tree.use_target(use_node), Some(path));
    }

    #[test]
    fn test_font_parsing() {
        let (tree, doc) = read(
            r#"<svg><defs><font horiz-adv-x="500"><font-face font-family="Icons" units-per-em="2048"/><missing-glyph d="M0 0 L1 1"/><glyph unicode="a" glyph-name="a" horiz-adv-x="300" d="M0 0 L1 0"/><hkern g1="a, b" u2="c" k="20"/></font></defs></svg>"#,
        );
        let font = tree.svg_font(doc, "Icons").unwrap();
        let data = tree.node(font).unwrap().as_font().unwrap();
        assert_eq!(data.units_per_em, 2048.0);
        assert_eq!(data.horiz_adv_x, 500.0);
        assert_eq!(data.kerning[0].g1, "a,b");
        assert_eq!(data.kerning[0].u2, "c");
        assert_eq!(data.kerning[0].k, 20.0);
        assert_eq!(tree.children(font).len(), 2);
        let glyphs = tree.glyphs_for_text(font, "ab");
        assert_eq!(glyphs.len(), 2);
        assert_eq!(tree.horiz_adv_x(font, glyphs[0]), 300.0);
        assert_eq!(tree.horiz_adv_x(font, glyphs[1]), 500.0);
    }

    #[test]
    fn test_lengths_use_dpi_and_em() {
        let options = ReadOptions { dpi: 72.0, ..ReadOptions::default() };
        let (tree, doc) = read_svg(
            r#"<svg><g font-size="10"><rect width="1in" height="2em"/></g></svg>"#,
            &options,
        )
        .unwrap();
        let g = only_child(&tree, doc);
        let r = only_child(&tree, g);
        match tree.node(r).unwrap().kind() {
            NodeKind::Rect(data) => assert_eq!(data.rect, Rect::ltwh(0.0, 0.0, 72.0, 20.0)),
            _ => panic!("expected rect"),
        }
    }

    #[test]
    fn test_nested_document() {
        let (tree, doc) = read(r#"<svg><svg x="10" width="50" height="50"><rect id="inner" width="1" height="1"/></svg></svg>"#);
        let inner = only_child(&tree, doc);
        assert!(tree.node(inner).unwrap().is_document());
        let r = tree.named_node(inner, "inner").unwrap();
        assert_eq!(tree.document(r), Some(inner));
        assert_eq!(tree.node(inner).unwrap().as_document().unwrap().x, 10.0);
    }
}
