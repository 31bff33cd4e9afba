//! SVG Tree
//!
//! Arena-backed node tree. Nodes reference each other through [`NodeId`]
//! handles; a handle to a destroyed node stops resolving instead of
//! pointing at whatever reuses the slot.
//!
//! Attribute changes feed the invalidation protocol: geometry-affecting
//! attributes clear cached bounds, others only mark the node for repaint,
//! and every change to a clean node marks its ancestors `ChildDirty`.

use tiny_skia::Transform;

use crate::arena::GenArena;
use crate::attributes::{Attr, AttrSource, SrcMask, StdAttr};
use crate::geometry::Rect;
use crate::node::{DirtyFlag, DisplayMode, Node, NodeKind};
use crate::operations::{DomError, DomResult};
use crate::style::{process_attribute, process_style_string};
use crate::values::Color;
use crate::NodeId;

/// Owner of every node of one or more trees
#[derive(Debug, Default)]
pub struct SvgTree {
    nodes: GenArena<Node>,
}

/// Walk from a node's parent to the root
pub struct Ancestors<'a> {
    tree: &'a SvgTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

impl SvgTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached node
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        NodeId(self.nodes.insert(Node::new(kind)))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::StaleNode)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::StaleNode)
    }

    pub(crate) fn insert_node(&mut self, node: Node) -> NodeId {
        NodeId(self.nodes.insert(node))
    }

    pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(id.0)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id.0)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Parent, grandparent, ... up to the root
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors { tree: self, next: self.parent(id) }
    }

    /// `id` and everything below it, in document order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Nearest document at or above `id`
    pub fn document(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|n| self.get(*n).is_some_and(Node::is_document))
    }

    /// Document enclosing the document `doc`
    pub fn parent_document(&self, doc: NodeId) -> Option<NodeId> {
        self.parent(doc).and_then(|p| self.document(p))
    }

    /// The root of `id`'s tree, if it is a document
    pub fn root_document(&self, id: NodeId) -> Option<NodeId> {
        let root = self.ancestors(id).last().unwrap_or(id);
        self.get(root).filter(|n| n.is_document()).map(|_| root)
    }

    /// Debug path such as `svg > g#layer > path.a.b`
    pub fn node_path(&self, id: NodeId) -> String {
        let mut path: Vec<NodeId> = std::iter::once(id).chain(self.ancestors(id)).collect();
        path.reverse();
        let parts: Vec<String> = path
            .iter()
            .filter_map(|n| self.get(*n))
            .map(|node| {
                let mut part = node.kind_name().to_string();
                if !node.id.is_empty() {
                    part.push('#');
                    part.push_str(&node.id);
                } else if !node.class.is_empty() {
                    part.push('.');
                    part.push_str(&node.class.split_whitespace().collect::<Vec<_>>().join("."));
                }
                part
            })
            .collect();
        parts.join(" > ")
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Insert `attr` per source precedence and run change handling if the
    /// visible value changed
    pub fn set_attr(&mut self, id: NodeId, attr: Attr) {
        let Some(node) = self.get_mut(id) else { return };
        let name = attr.name.clone();
        let std = attr.std;
        if node.attrs.insert(attr) {
            self.on_attr_change(id, &name, std);
        }
    }

    /// Parse and set an attribute; false if it was ignored
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str, src: AttrSource) -> bool {
        match process_attribute(src, name, value) {
            Some(attr) => {
                self.set_attr(id, attr);
                true
            }
            None => false,
        }
    }

    /// Apply a `style=""` string as inline-style attributes
    pub fn set_style(&mut self, id: NodeId, style: &str) {
        for attr in process_style_string(style) {
            self.set_attr(id, attr);
        }
    }

    /// Remove every `name` attribute from the sources in `mask`. Does not
    /// restyle, so a CSS value unblocked by removing an inline one only
    /// appears after the next restyle.
    pub fn remove_attr(&mut self, id: NodeId, name: &str, mask: SrcMask) {
        let Some(node) = self.get_mut(id) else { return };
        if node.attrs.remove(name, mask) > 0 {
            self.on_attr_change(id, name, StdAttr::from_name(name));
        }
    }

    pub fn attr(&self, id: NodeId, name: &str, mask: SrcMask) -> Option<&Attr> {
        self.get(id)?.attrs.get(name, mask)
    }

    pub fn int_attr(&self, id: NodeId, name: &str, dflt: i32) -> i32 {
        self.attr(id, name, SrcMask::ANY).and_then(|a| a.value.as_int()).unwrap_or(dflt)
    }

    pub fn float_attr(&self, id: NodeId, name: &str, dflt: f32) -> f32 {
        self.attr(id, name, SrcMask::ANY).and_then(|a| a.value.as_float()).unwrap_or(dflt)
    }

    pub fn color_attr(&self, id: NodeId, name: &str, dflt: Color) -> Color {
        self.attr(id, name, SrcMask::ANY).and_then(|a| a.value.as_color()).unwrap_or(dflt)
    }

    pub fn string_attr<'a>(&'a self, id: NodeId, name: &str) -> Option<&'a str> {
        self.attr(id, name, SrcMask::ANY).and_then(|a| a.value.as_str())
    }

    /// Turn CSS-sourced attributes into inline style for the whole subtree,
    /// e.g. before moving it into another document
    pub fn css_to_inline_style(&mut self, id: NodeId) {
        for n in self.descendants(id) {
            if let Some(node) = self.get_mut(n) {
                node.attrs.css_to_inline();
            }
        }
    }

    pub(crate) fn on_attr_change(&mut self, id: NodeId, name: &str, std: StdAttr) {
        let Some(node) = self.get(id) else { return };
        let parent = node.parent;

        if matches!(node.kind, NodeKind::Stop) {
            if let Some(parent) = parent {
                self.set_dirty(parent, DirtyFlag::PixelsDirty);
            }
        } else if std.affects_geometry() {
            self.invalidate(id, true);
        } else if matches!(std, StdAttr::Display | StdAttr::Visibility) {
            let display = DisplayMode::from_i32(self.int_attr(id, "display", DisplayMode::Block as i32));
            let was_visible = node.visible;
            let rendered = node.rendered_bounds;
            // repaint the area a node leaves behind when it moves out of flow
            if std == StdAttr::Display && display == DisplayMode::Absolute && was_visible {
                if let Some(p) = parent.and_then(|p| self.get_mut(p)).filter(|p| p.is_container()) {
                    p.removed_bounds = p.removed_bounds.union(&rendered);
                }
            }
            let visible = display != DisplayMode::None && self.int_attr(id, "visibility", 1) != 0;
            if visible != was_visible {
                self.invalidate(id, false);
                if let Some(node) = self.get_mut(id) {
                    node.visible = visible;
                }
            }
            self.invalidate(id, false);
        } else if std != StdAttr::Unknown {
            self.set_dirty(id, DirtyFlag::PixelsDirty);
        }

        if let Some(Node { kind: NodeKind::Custom(ext), .. }) = self.get_mut(id) {
            ext.on_attr_change(name);
        }
    }

    // ========================================================================
    // Dirty state and bounds cache
    // ========================================================================

    /// Raise the node's dirty level; the first change away from `NotDirty`
    /// marks the ancestors `ChildDirty`
    pub fn set_dirty(&mut self, id: NodeId, flag: DirtyFlag) {
        let mut current = id;
        let mut level = flag;
        loop {
            let Some(node) = self.get_mut(current) else { return };
            // hidden leaves need no repaint; hidden containers may still hold visible children
            if !node.visible && node.is_paintable() && !node.is_container() {
                return;
            }
            let was_clean = node.dirty == DirtyFlag::NotDirty;
            node.dirty = node.dirty.max(level);
            match node.parent {
                Some(parent) if was_clean => {
                    current = parent;
                    level = DirtyFlag::ChildDirty;
                }
                _ => return,
            }
        }
    }

    /// Clear cached bounds and mark `BoundsDirty`
    pub fn invalidate(&mut self, id: NodeId, children: bool) {
        self.invalidate_bounds(id, children);
        self.set_dirty(id, DirtyFlag::BoundsDirty);
    }

    /// Clear cached bounds of the node (and its subtree when `children`),
    /// then of each visible ancestor
    pub fn invalidate_bounds(&mut self, id: NodeId, children: bool) {
        if children {
            for n in self.descendants(id).into_iter().skip(1) {
                if let Some(node) = self.get(n) {
                    node.cached_bounds.set(Rect::INVALID);
                }
            }
        }
        let mut current = id;
        while let Some(node) = self.get(current) {
            node.cached_bounds.set(Rect::INVALID);
            match node.parent {
                Some(parent) if node.is_visible() => current = parent,
                _ => break,
            }
        }
    }

    // ========================================================================
    // Transform and display
    // ========================================================================

    pub fn set_transform(&mut self, id: NodeId, transform: Transform) {
        if let Some(node) = self.get_mut(id) {
            node.transform = Some(transform);
            self.invalidate(id, true);
        }
    }

    pub fn transform(&self, id: NodeId) -> Transform {
        self.get(id).and_then(|n| n.transform).unwrap_or_default()
    }

    /// Ancestor transforms, own transform and document viewBox transforms
    /// composed into user-to-canvas space
    pub fn total_transform(&self, id: NodeId) -> Transform {
        let mut chain: Vec<NodeId> = std::iter::once(id).chain(self.ancestors(id)).collect();
        chain.reverse();
        let mut ts = Transform::identity();
        for n in chain {
            let Some(node) = self.get(n) else { continue };
            if let Some(own) = node.transform {
                ts = ts.pre_concat(own);
            }
            if node.is_document() {
                ts = ts.pre_concat(self.view_box_transform(n));
            }
        }
        ts
    }

    /// Set `display` in the XML band; `Block` removes the attribute
    pub fn set_display_mode(&mut self, id: NodeId, mode: DisplayMode) {
        let current = self.attr(id, "display", SrcMask::XML).map(|a| a.value.as_int());
        if mode != DisplayMode::Block {
            if current != Some(Some(mode as i32)) {
                self.set_attr(id, Attr::int("display", mode as i32, AttrSource::Xml));
            }
        } else if current.is_some() {
            self.remove_attr(id, "display", SrcMask::XML);
        }
    }

    pub fn display_mode(&self, id: NodeId) -> DisplayMode {
        self.attr(id, "display", SrcMask::XML)
            .and_then(|a| a.value.as_int())
            .map_or(DisplayMode::Block, DisplayMode::from_i32)
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_visible)
    }

    // ========================================================================
    // Id and class
    // ========================================================================

    /// Change the xml id, re-registering it in the enclosing document
    pub fn set_xml_id(&mut self, id: NodeId, xml_id: &str) {
        let Some(node) = self.get(id) else { return };
        if node.id == xml_id {
            return;
        }
        // a nested <svg> registers in the document that contains it
        let doc = match node.parent {
            Some(parent) => self.document(parent),
            None => self.document(id),
        };
        if let Some(doc) = doc {
            self.remove_named_node(doc, id);
        }
        if let Some(node) = self.get_mut(id) {
            node.id = xml_id.to_string();
        }
        if let Some(doc) = doc {
            if !xml_id.is_empty() {
                self.add_named_node(doc, id);
            }
        }
        self.restyle(id);
    }

    pub fn set_xml_class(&mut self, id: NodeId, class: &str) {
        let Some(node) = self.get_mut(id) else { return };
        if node.class != class {
            node.class = class.to_string();
            self.restyle(id);
        }
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        let Some(node) = self.get(id) else { return };
        if class.is_empty() || node.has_class(class) {
            return;
        }
        let mut classes = node.class.clone();
        if !classes.is_empty() {
            classes.push(' ');
        }
        classes.push_str(class);
        self.set_xml_class(id, &classes);
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let Some(node) = self.get(id) else { return };
        let classes = node
            .class
            .split_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_xml_class(id, &classes);
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.get(id).is_some_and(|n| n.has_class(class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Color;

    fn group(tree: &mut SvgTree) -> NodeId {
        tree.create(NodeKind::Group { anchor: false })
    }

    #[test]
    fn test_create_and_stale_handle() {
        let mut tree = SvgTree::new();
        let g = group(&mut tree);
        assert!(tree.contains(g));
        tree.remove_node(g);
        assert!(!tree.contains(g));
        assert_eq!(tree.node(g).err(), Some(DomError::StaleNode));
        assert!(tree.children(g).is_empty());
    }

    #[test]
    fn test_set_attribute_typed_getters() {
        let mut tree = SvgTree::new();
        let g = group(&mut tree);
        tree.set_attribute(g, "fill", "red", AttrSource::Xml);
        tree.set_attribute(g, "stroke-width", "2.5", AttrSource::Xml);
        tree.set_attribute(g, "fill-rule", "evenodd", AttrSource::Xml);
        tree.set_attribute(g, "data-x", "hello", AttrSource::Xml);
        assert!(!tree.set_attribute(g, "fill", "inherit", AttrSource::Xml));

        assert_eq!(tree.color_attr(g, "fill", Color::NONE), Color::rgba(255, 0, 0, 255));
        assert_eq!(tree.float_attr(g, "stroke-width", 1.0), 2.5);
        assert_eq!(tree.int_attr(g, "fill-rule", 0), 1);
        assert_eq!(tree.string_attr(g, "data-x"), Some("hello"));
        // wrong value kind falls back to the default
        assert_eq!(tree.float_attr(g, "fill", -1.0), -1.0);
    }

    #[test]
    fn test_style_string_beats_xml() {
        let mut tree = SvgTree::new();
        let g = group(&mut tree);
        tree.set_attribute(g, "fill", "red", AttrSource::Xml);
        tree.set_style(g, "fill: blue");
        assert_eq!(tree.color_attr(g, "fill", Color::NONE), Color::rgba(0, 0, 255, 255));
        tree.remove_attr(g, "fill", SrcMask::INLINE);
        assert_eq!(tree.color_attr(g, "fill", Color::NONE), Color::rgba(255, 0, 0, 255));
    }

    #[test]
    fn test_pixels_dirty_on_paint_change() {
        let mut tree = SvgTree::new();
        let g = group(&mut tree);
        tree.set_attribute(g, "fill", "red", AttrSource::Xml);
        assert_eq!(tree.node(g).unwrap().dirty(), DirtyFlag::PixelsDirty);
    }

    #[test]
    fn test_unknown_attr_not_dirty() {
        let mut tree = SvgTree::new();
        let g = group(&mut tree);
        tree.set_attribute(g, "data-foo", "1", AttrSource::Xml);
        assert_eq!(tree.node(g).unwrap().dirty(), DirtyFlag::NotDirty);
    }

    #[test]
    fn test_display_none_hides() {
        let mut tree = SvgTree::new();
        let g = group(&mut tree);
        tree.set_display_mode(g, DisplayMode::None);
        assert!(!tree.is_visible(g));
        assert_eq!(tree.display_mode(g), DisplayMode::None);

        tree.set_display_mode(g, DisplayMode::Block);
        assert!(tree.is_visible(g));
        assert!(tree.attr(g, "display", SrcMask::ANY).is_none());
    }

    #[test]
    fn test_visibility_hidden() {
        let mut tree = SvgTree::new();
        let g = group(&mut tree);
        tree.set_attribute(g, "visibility", "hidden", AttrSource::Xml);
        assert!(!tree.is_visible(g));
        tree.set_attribute(g, "visibility", "visible", AttrSource::Xml);
        assert!(tree.is_visible(g));
    }

    #[test]
    fn test_class_editing() {
        let mut tree = SvgTree::new();
        let g = group(&mut tree);
        tree.add_class(g, "a");
        tree.add_class(g, "b");
        tree.add_class(g, "a");
        assert_eq!(tree.node(g).unwrap().xml_class(), "a b");
        tree.remove_class(g, "a");
        assert_eq!(tree.node(g).unwrap().xml_class(), "b");
        assert!(tree.has_class(g, "b"));
    }

    #[test]
    fn test_transform_set_invalidate() {
        let mut tree = SvgTree::new();
        let g = group(&mut tree);
        tree.set_transform(g, Transform::from_translate(3.0, 4.0));
        assert_eq!(tree.transform(g).tx, 3.0);
        assert_eq!(tree.total_transform(g).ty, 4.0);
        assert_eq!(tree.node(g).unwrap().dirty(), DirtyFlag::BoundsDirty);
    }
}
