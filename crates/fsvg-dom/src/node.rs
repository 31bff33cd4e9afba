//! Node Types
//!
//! The node record stored in the arena and the closed set of node kinds.
//! Kind-specific payloads for documents, paths, text, fonts and gradients
//! live in their own modules; the small ones are defined here.

use std::cell::Cell;
use std::fmt;

use tiny_skia::Transform;

use crate::attributes::AttrList;
use crate::document::DocumentData;
use crate::font::{FontData, GlyphData};
use crate::geometry::Rect;
use crate::gradient::GradientData;
use crate::path::{PathData, RectData};
use crate::text::TspanData;
use crate::NodeId;

/// What a node needs re-derived before the next paint; ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum DirtyFlag {
    #[default]
    NotDirty,
    /// Some descendant is dirty
    ChildDirty,
    /// Needs repaint, bounds unchanged
    PixelsDirty,
    /// Needs repaint and new bounds
    BoundsDirty,
}

/// Value of the `display` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    None = 0,
    Block = 1,
    /// Positioned outside normal flow; excluded from parent bounds
    Absolute = 2,
}

impl DisplayMode {
    pub fn from_i32(value: i32) -> DisplayMode {
        match value {
            0 => DisplayMode::None,
            2 => DisplayMode::Absolute,
            _ => DisplayMode::Block,
        }
    }
}

/// Coordinate system for pattern and gradient geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Units {
    UserSpaceOnUse,
    #[default]
    ObjectBoundingBox,
}

/// Application-defined node
pub trait CustomNode: fmt::Debug {
    fn tag_name(&self) -> &str;

    /// Bounds in the node's own coordinate system
    fn local_bounds(&self) -> Rect {
        Rect::INVALID
    }

    /// Called after an attribute of the owning node changed
    fn on_attr_change(&mut self, _name: &str) {}

    fn clone_box(&self) -> Box<dyn CustomNode>;
}

impl Clone for Box<dyn CustomNode> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternData {
    pub cell: Rect,
    pub units: Units,
    pub content_units: Units,
}

/// Raster image; pixels are not decoded, only the reference is kept
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub bounds: Rect,
    pub href: String,
    /// Natural size of the image when known
    pub intrinsic_size: (f32, f32),
}

impl ImageData {
    /// Placement rectangle, filling a missing width or height from the
    /// intrinsic aspect ratio
    pub fn viewport(&self) -> Rect {
        let (w, h) = (self.bounds.width(), self.bounds.height());
        let (img_w, img_h) = self.intrinsic_size;
        let (left, top) = (self.bounds.left, self.bounds.top);
        if w > 0.0 && h > 0.0 {
            self.bounds
        } else if w <= 0.0 && h <= 0.0 {
            Rect::ltwh(left, top, img_w, img_h)
        } else if w > 0.0 {
            let h = if img_w > 0.0 { img_h * w / img_w } else { 0.0 };
            Rect::ltwh(left, top, w, h)
        } else {
            let w = if img_h > 0.0 { img_w * h / img_h } else { 0.0 };
            Rect::ltwh(left, top, w, h)
        }
    }
}

/// `<use>` reference; `target` overrides `href` when set explicitly
#[derive(Debug, Clone, PartialEq)]
pub struct UseData {
    pub href: String,
    pub target: Option<NodeId>,
    pub viewport: Rect,
}

/// Markup kept verbatim (unknown elements, `<style>`, comments)
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentData {
    pub tag: String,
    pub xml: String,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Document(DocumentData),
    Group { anchor: bool },
    Defs,
    Symbol,
    Pattern(PatternData),
    /// Stops are the node's children
    Gradient(GradientData),
    Stop,
    /// Glyphs are the node's children
    Font(FontData),
    Glyph(GlyphData),
    Path(PathData),
    Rect(RectData),
    Image(ImageData),
    Text(TspanData),
    Tspan(TspanData),
    Use(UseData),
    Fragment(FragmentData),
    Custom(Box<dyn CustomNode>),
}

/// A tree node
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) attrs: AttrList,
    pub(crate) transform: Option<Transform>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) cached_bounds: Cell<Rect>,
    pub(crate) rendered_bounds: Rect,
    pub(crate) removed_bounds: Rect,
    pub(crate) dirty: DirtyFlag,
    pub(crate) visible: bool,
    pub(crate) id: String,
    pub(crate) class: String,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: AttrList::new(),
            transform: None,
            parent: None,
            children: Vec::new(),
            cached_bounds: Cell::new(Rect::INVALID),
            rendered_bounds: Rect::INVALID,
            removed_bounds: Rect::INVALID,
            dirty: DirtyFlag::NotDirty,
            visible: true,
            id: String::new(),
            class: String::new(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn attrs(&self) -> &AttrList {
        &self.attrs
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn dirty(&self) -> DirtyFlag {
        self.dirty
    }

    pub fn cached_bounds(&self) -> Rect {
        self.cached_bounds.get()
    }

    pub fn rendered_bounds(&self) -> Rect {
        self.rendered_bounds
    }

    pub fn removed_bounds(&self) -> Rect {
        self.removed_bounds
    }

    pub fn xml_id(&self) -> &str {
        &self.id
    }

    pub fn xml_class(&self) -> &str {
        &self.class
    }

    pub fn has_class(&self, class: &str) -> bool {
        !class.is_empty() && self.class.split_whitespace().any(|c| c == class)
    }

    /// Element name used for markup and CSS tag selectors
    pub fn tag_name(&self) -> &str {
        match &self.kind {
            NodeKind::Document(_) => "svg",
            NodeKind::Group { anchor: true } => "a",
            NodeKind::Group { anchor: false } => "g",
            NodeKind::Defs => "defs",
            NodeKind::Symbol => "symbol",
            NodeKind::Pattern(_) => "pattern",
            NodeKind::Gradient(g) => g.tag_name(),
            NodeKind::Stop => "stop",
            NodeKind::Font(_) => "font",
            NodeKind::Glyph(g) if g.is_missing_glyph() => "missing-glyph",
            NodeKind::Glyph(_) => "glyph",
            NodeKind::Path(p) => p.shape.tag_name(),
            NodeKind::Rect(_) => "rect",
            NodeKind::Image(_) => "image",
            NodeKind::Text(_) => "text",
            NodeKind::Tspan(_) => "tspan",
            NodeKind::Use(_) => "use",
            NodeKind::Fragment(f) => &f.tag,
            NodeKind::Custom(ext) => ext.tag_name(),
        }
    }

    /// Generic kind name; differs from the tag only for gradients
    pub fn kind_name(&self) -> &str {
        match &self.kind {
            NodeKind::Gradient(_) => "gradient",
            _ => self.tag_name(),
        }
    }

    /// Kinds that accept children through `add_child`
    pub fn is_container(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Document(_) | NodeKind::Group { .. } | NodeKind::Defs | NodeKind::Symbol | NodeKind::Pattern(_)
        )
    }

    /// Whether `add_child` may attach `child` here. Gradients own stops,
    /// fonts own glyphs and text owns spans; containers take anything.
    pub fn accepts_child(&self, child: &Node) -> bool {
        match (&self.kind, &child.kind) {
            (NodeKind::Gradient(_), NodeKind::Stop) => true,
            (NodeKind::Font(_), NodeKind::Glyph(_)) => true,
            (NodeKind::Text(_) | NodeKind::Tspan(_), NodeKind::Tspan(_)) => true,
            _ => self.is_container(),
        }
    }

    pub fn is_paintable(&self) -> bool {
        !matches!(
            self.kind,
            NodeKind::Defs
                | NodeKind::Symbol
                | NodeKind::Pattern(_)
                | NodeKind::Gradient(_)
                | NodeKind::Stop
                | NodeKind::Fragment(_)
                | NodeKind::Font(_)
                | NodeKind::Glyph(_)
        )
    }

    pub fn is_visible(&self) -> bool {
        self.visible && self.is_paintable()
    }

    pub fn is_document(&self) -> bool {
        matches!(self.kind, NodeKind::Document(_))
    }

    pub fn as_document(&self) -> Option<&DocumentData> {
        match &self.kind {
            NodeKind::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_document_mut(&mut self) -> Option<&mut DocumentData> {
        match &mut self.kind {
            NodeKind::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_tspan(&self) -> Option<&TspanData> {
        match &self.kind {
            NodeKind::Text(t) | NodeKind::Tspan(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_tspan_mut(&mut self) -> Option<&mut TspanData> {
        match &mut self.kind {
            NodeKind::Text(t) | NodeKind::Tspan(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_font(&self) -> Option<&FontData> {
        match &self.kind {
            NodeKind::Font(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_gradient(&self) -> Option<&GradientData> {
        match &self.kind {
            NodeKind::Gradient(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_use(&self) -> Option<&UseData> {
        match &self.kind {
            NodeKind::Use(u) => Some(u),
            _ => None,
        }
    }
}
