//! Document Services
//!
//! Per-document state: viewport and viewBox, the id registry, the SVG
//! font registry and the installed stylesheet. Nested documents fall back
//! to their enclosing document for id and font lookups.

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::rc::Rc;

use tiny_skia::Transform;

use crate::attributes::{AttrValue, StdAttr};
use crate::geometry::Rect;
use crate::node::{Node, NodeKind};
use crate::style::SvgStylesheet;
use crate::tree::SvgTree;
use crate::values::Length;
use crate::NodeId;

/// Payload of an `<svg>` node
#[derive(Debug, Clone)]
pub struct DocumentData {
    pub x: f32,
    pub y: f32,
    pub(crate) width: Length,
    pub(crate) height: Length,
    /// Size imposed by a referencing `<use>`
    pub(crate) use_size: Option<(f32, f32)>,
    pub(crate) view_box: Rect,
    pub preserve_aspect_ratio: bool,
    pub(crate) canvas_rect: Rect,
    pub(crate) named_nodes: HashMap<String, NodeId>,
    pub(crate) fonts: Vec<(String, NodeId)>,
    pub(crate) stylesheet: Option<Rc<SvgStylesheet>>,
}

impl Default for DocumentData {
    fn default() -> Self {
        Self::new(0.0, 0.0, Length::percent(100.0), Length::percent(100.0))
    }
}

impl DocumentData {
    pub fn new(x: f32, y: f32, width: Length, height: Length) -> Self {
        Self {
            x,
            y,
            width,
            height,
            use_size: None,
            view_box: Rect::INVALID,
            preserve_aspect_ratio: true,
            canvas_rect: Rect::INVALID,
            named_nodes: HashMap::new(),
            fonts: Vec::new(),
            stylesheet: None,
        }
    }

    pub fn with_view_box(mut self, view_box: Rect) -> Self {
        self.view_box = view_box;
        self
    }

    /// Effective width; a `<use>` size overrides the declared one
    pub fn width(&self) -> Length {
        self.size_with(self.use_size).0
    }

    pub fn height(&self) -> Length {
        self.size_with(self.use_size).1
    }

    /// Declared size with positive components of `use_size` substituted
    fn size_with(&self, use_size: Option<(f32, f32)>) -> (Length, Length) {
        let (w, h) = use_size.unwrap_or((0.0, 0.0));
        (
            if w > 0.0 { Length::px(w) } else { self.width },
            if h > 0.0 { Length::px(h) } else { self.height },
        )
    }

    pub fn view_box(&self) -> Rect {
        self.view_box
    }

    pub fn canvas_rect(&self) -> Rect {
        self.canvas_rect
    }

    pub fn stylesheet(&self) -> Option<&Rc<SvgStylesheet>> {
        self.stylesheet.as_ref()
    }

    pub fn named_nodes(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.named_nodes.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// `len` random ASCII letters and digits
fn random_str(len: usize) -> String {
    const CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut state = RandomState::new().hash_one(std::time::SystemTime::now()) | 1;
    (0..len)
        .map(|_| {
            // xorshift64
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            CHARS[(state % CHARS.len() as u64) as usize] as char
        })
        .collect()
}

impl SvgTree {
    fn doc_data(&self, doc: NodeId) -> Option<&DocumentData> {
        self.get(doc).and_then(Node::as_document)
    }

    fn doc_data_mut(&mut self, doc: NodeId) -> Option<&mut DocumentData> {
        self.get_mut(doc).and_then(Node::as_document_mut)
    }

    /// `doc` followed by each enclosing document
    pub(crate) fn document_chain(&self, doc: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(doc), move |d| self.parent_document(*d))
    }

    // ========================================================================
    // Named nodes
    // ========================================================================

    /// Resolve an id (with or without leading `#`), falling back to
    /// enclosing documents
    pub fn named_node(&self, doc: NodeId, id: &str) -> Option<NodeId> {
        let key = id.strip_prefix('#').unwrap_or(id);
        self.document_chain(doc)
            .find_map(|d| self.doc_data(d)?.named_nodes.get(key).copied())
            .filter(|n| self.contains(*n))
    }

    /// Register `node` under its current id; the last registration wins
    pub fn add_named_node(&mut self, doc: NodeId, node: NodeId) {
        let Some(key) = self.get(node).map(|n| n.id.clone()) else { return };
        if let Some(data) = self.doc_data_mut(doc) {
            data.named_nodes.insert(key, node);
        }
    }

    /// Unregister `node`'s id, unless another node has taken it over
    pub fn remove_named_node(&mut self, doc: NodeId, node: NodeId) {
        let Some(key) = self.get(node).map(|n| n.id.clone()) else { return };
        if let Some(data) = self.doc_data_mut(doc) {
            if data.named_nodes.get(&key) == Some(&node) {
                data.named_nodes.remove(&key);
            }
        }
    }

    /// Resolve an id reference from `node`'s document
    pub fn ref_target(&self, node: NodeId, id: &str) -> Option<NodeId> {
        self.document(node).and_then(|doc| self.named_node(doc, id))
    }

    // ========================================================================
    // Fonts
    // ========================================================================

    pub fn add_font(&mut self, doc: NodeId, font: NodeId) {
        let Some(family) = self.get(font).and_then(Node::as_font).map(|f| f.family.clone()) else {
            return;
        };
        if let Some(data) = self.doc_data_mut(doc) {
            data.fonts.push((family, font));
        }
    }

    /// First font registered for `family`, here or in an enclosing document
    pub fn svg_font(&self, doc: NodeId, family: &str) -> Option<NodeId> {
        self.document_chain(doc).find_map(|d| {
            self.doc_data(d)?
                .fonts
                .iter()
                .find(|(name, _)| name == family)
                .map(|(_, font)| *font)
        })
    }

    // ========================================================================
    // Viewport
    // ========================================================================

    /// Viewport size at the origin, with percentages resolved against the
    /// enclosing document (its viewBox, else its viewport) or, for the root,
    /// the canvas rect and then the viewBox
    pub fn viewport_rect(&self, doc: NodeId) -> Rect {
        self.viewport_rect_sized(doc, None)
    }

    /// `viewport_rect` as if displayed by a `<use>` of the given size
    pub(crate) fn viewport_rect_sized(&self, doc: NodeId, use_size: Option<(f32, f32)>) -> Rect {
        let Some(data) = self.doc_data(doc) else { return Rect::INVALID };
        let (width, height) = data.size_with(use_size.or(data.use_size));
        let (mut w, mut h) = (width.value, height.value);
        if width.is_percent() || height.is_percent() {
            let mut canvas = match self.parent_document(doc) {
                Some(parent) => match self.doc_data(parent) {
                    Some(p) if p.view_box.is_valid() => p.view_box,
                    _ => self.viewport_rect(parent),
                },
                None => data.canvas_rect,
            };
            if !canvas.is_valid() {
                canvas = data.view_box;
            }
            if width.is_percent() {
                w *= canvas.width() / 100.0;
            }
            if height.is_percent() {
                h *= canvas.height() / 100.0;
            }
        }
        Rect::wh(w, h)
    }

    /// Map from viewBox coordinates to the document's parent coordinates
    pub fn view_box_transform(&self, doc: NodeId) -> Transform {
        self.view_box_transform_sized(doc, None)
    }

    pub(crate) fn view_box_transform_sized(&self, doc: NodeId, use_size: Option<(f32, f32)>) -> Transform {
        let Some(data) = self.doc_data(doc) else { return Transform::identity() };
        let source = data.view_box;
        if source.is_valid() && source.width() > 0.0 && source.height() > 0.0 {
            let target = self.viewport_rect_sized(doc, use_size);
            if source != target {
                let mut sx = target.width() / source.width();
                let mut sy = target.height() / source.height();
                if data.preserve_aspect_ratio {
                    sx = sx.min(sy);
                    sy = sx;
                }
                let (scx, scy) = source.center();
                let (tcx, tcy) = target.center();
                return Transform::from_translate(-scx, -scy)
                    .post_scale(sx, sy)
                    .post_translate(tcx + data.x, tcy + data.y);
            }
        }
        Transform::from_translate(data.x, data.y)
    }

    pub fn set_width(&mut self, doc: NodeId, width: Length) {
        let Some(data) = self.doc_data_mut(doc) else { return };
        let changed = data.width != width;
        let has_view_box = data.view_box.is_valid();
        data.width = width;
        if changed {
            self.invalidate(doc, has_view_box);
        }
    }

    pub fn set_height(&mut self, doc: NodeId, height: Length) {
        let Some(data) = self.doc_data_mut(doc) else { return };
        let changed = data.height != height;
        let has_view_box = data.view_box.is_valid();
        data.height = height;
        if changed {
            self.invalidate(doc, has_view_box);
        }
    }

    /// Size imposed by a `<use>`; clears cached bounds without marking dirty
    pub fn set_use_size(&mut self, doc: NodeId, size: Option<(f32, f32)>) {
        let Some(data) = self.doc_data_mut(doc) else { return };
        let old = (data.width(), data.height());
        data.use_size = size;
        if (data.width(), data.height()) != old {
            self.invalidate_bounds(doc, true);
        }
    }

    pub fn set_view_box(&mut self, doc: NodeId, view_box: Rect) {
        let Some(data) = self.doc_data_mut(doc) else { return };
        if data.view_box != view_box {
            data.view_box = view_box;
            self.invalidate(doc, true);
        }
    }

    /// Canvas the root document is displayed in; resolves percentage sizes
    pub fn set_canvas_rect(&mut self, doc: NodeId, canvas: Rect) {
        let Some(data) = self.doc_data_mut(doc) else { return };
        if data.canvas_rect != canvas {
            data.canvas_rect = canvas;
            self.invalidate(doc, true);
        }
    }

    // ========================================================================
    // Stylesheet
    // ========================================================================

    /// Install a stylesheet (rules already sorted). The caller restyles.
    pub fn set_stylesheet(&mut self, doc: NodeId, sheet: Option<SvgStylesheet>) {
        if let Some(data) = self.doc_data_mut(doc) {
            data.stylesheet = sheet.map(Rc::new);
        }
    }

    pub fn stylesheet(&self, doc: NodeId) -> Option<Rc<SvgStylesheet>> {
        self.doc_data(doc)?.stylesheet.clone()
    }

    /// Whether this document or an enclosing one has rules to apply
    pub fn can_restyle(&self, doc: NodeId) -> bool {
        self.document_chain(doc)
            .any(|d| self.doc_data(d).and_then(|data| data.stylesheet.as_ref()).is_some_and(|s| !s.is_empty()))
    }

    // ========================================================================
    // References
    // ========================================================================

    /// Node a `<use>` renders: the explicit target, else its href resolved
    /// now through the id registry
    pub fn use_target(&self, use_node: NodeId) -> Option<NodeId> {
        let data = self.get(use_node)?.as_use()?;
        if let Some(target) = data.target.filter(|t| self.contains(*t)) {
            return Some(target);
        }
        if data.href.is_empty() {
            return None;
        }
        self.ref_target(use_node, &data.href)
    }

    pub fn set_use_href(&mut self, use_node: NodeId, href: &str) {
        if let Some(Node { kind: NodeKind::Use(data), .. }) = self.get_mut(use_node) {
            data.href = href.to_string();
            data.target = None;
            self.invalidate(use_node, false);
        }
    }

    /// Point a `<use>` at a node directly; the href no longer applies
    pub fn set_use_target(&mut self, use_node: NodeId, target: Option<NodeId>) {
        if let Some(Node { kind: NodeKind::Use(data), .. }) = self.get_mut(use_node) {
            if data.target != target {
                data.href.clear();
                data.target = target;
                self.invalidate(use_node, false);
            }
        }
    }

    // ========================================================================
    // Id renaming
    // ========================================================================

    /// Give registered ids fresh random names (`x-` + 10 characters) and
    /// rewrite references to them. With `conflicts_with`, only ids that
    /// also resolve in that document are renamed.
    pub fn replace_ids(&mut self, doc: NodeId, conflicts_with: Option<NodeId>) {
        let Some(data) = self.doc_data(doc) else { return };
        let nodes: Vec<NodeId> = data
            .named_nodes
            .iter()
            .filter(|(key, _)| conflicts_with.map_or(true, |other| self.named_node(other, key).is_some()))
            .map(|(_, node)| *node)
            .collect();

        for node in nodes {
            let Some(old_id) = self.get(node).map(|n| n.id.clone()) else { continue };
            let new_id = format!("x-{}", random_str(10));
            tracing::debug!("Renaming id '{}' to '{}'", old_id, new_id);
            self.replace_id_refs(doc, &old_id, &new_id);
            self.set_xml_id(node, &new_id);
        }
    }

    fn replace_id_refs(&mut self, root: NodeId, old_id: &str, new_id: &str) {
        let old_ref = format!("#{}", old_id);
        let new_ref = format!("#{}", new_id);
        for n in self.descendants(root) {
            let Some(node) = self.get_mut(n) else { continue };
            let mut changed = Vec::new();
            for attr in node.attrs.iter_mut() {
                let is_ref = matches!(attr.std, StdAttr::Fill | StdAttr::Stroke)
                    || attr.name == "xlink:href"
                    || attr.name == "href";
                if is_ref && attr.value.as_str() == Some(old_ref.as_str()) {
                    attr.value = AttrValue::Str(new_ref.clone());
                    changed.push((attr.name.clone(), attr.std));
                }
            }
            match &mut node.kind {
                NodeKind::Use(data) if data.href == old_ref => data.href = new_ref.clone(),
                NodeKind::Gradient(data) if data.href == old_ref => data.href = new_ref.clone(),
                _ => {}
            }
            for (name, std) in changed {
                self.on_attr_change(n, &name, std);
            }
        }
    }
}
