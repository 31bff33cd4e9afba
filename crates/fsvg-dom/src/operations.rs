//! Tree Operations
//!
//! Structural mutation: add_child, remove_child, destroy, clone_subtree.
//! Attaching a node invalidates its bounds, marks it dirty, restyles it
//! and registers its ids in the enclosing document; detaching records
//! the area it leaves behind for repaint and unregisters the ids.

use crate::geometry::Rect;
use crate::node::{DirtyFlag, Node, NodeKind};
use crate::tree::SvgTree;
use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Node not found")]
    NotFound,

    /// e.g. inserting a node under its own descendant, or a node that already has a parent
    #[error("Hierarchy request error")]
    HierarchyRequest,

    #[error("Node is not a child")]
    NotAChild,

    /// e.g. adding a child to a leaf
    #[error("Invalid node type")]
    InvalidNodeType,

    #[error("Node handle refers to a destroyed node")]
    StaleNode,
}

/// Structural tree mutation
pub trait NodeOperations {
    /// Attach a detached `child` under `parent`, before `before` or at the end
    fn add_child(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) -> DomResult<()>;

    /// Detach `child`, returning the sibling that followed it. The child
    /// stays alive until destroyed.
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<Option<NodeId>>;

    /// Detach if attached and free the whole subtree
    fn destroy(&mut self, node: NodeId) -> DomResult<()>;

    /// Deep copy with no parent and clear caches
    fn clone_subtree(&mut self, node: NodeId) -> DomResult<NodeId>;
}

impl NodeOperations for SvgTree {
    fn add_child(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) -> DomResult<()> {
        let parent_node = self.node(parent)?;
        if !parent_node.accepts_child(self.node(child)?) {
            return Err(DomError::InvalidNodeType);
        }
        if let Some(before) = before {
            if !parent_node.children.contains(&before) {
                return Err(DomError::NotAChild);
            }
        }
        if self.node(child)?.parent.is_some()
            || child == parent
            || self.ancestors(parent).any(|a| a == child)
        {
            return Err(DomError::HierarchyRequest);
        }

        self.invalidate_bounds(child, true);
        let child_node = self.node_mut(child)?;
        child_node.rendered_bounds = Rect::INVALID;
        child_node.parent = Some(parent);
        // so that the ancestors get marked ChildDirty
        child_node.dirty = DirtyFlag::NotDirty;
        self.set_dirty(child, DirtyFlag::BoundsDirty);

        let parent_node = self.node_mut(parent)?;
        let pos = before.and_then(|b| parent_node.children.iter().position(|c| *c == b));
        match pos {
            Some(pos) => parent_node.children.insert(pos, child),
            None => parent_node.children.push(child),
        }

        let cached = self.node(parent)?.cached_bounds();
        if cached.is_valid() && !cached.contains(&self.bounds(child)) {
            self.invalidate_bounds(parent, false);
        }

        if let Some(doc) = self.document(parent) {
            self.restyle(child);
            self.add_ids(doc, child);
        }
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<Option<NodeId>> {
        let parent_node = self.node(parent)?;
        let pos = parent_node
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or(DomError::NotAChild)?;

        let child_rendered = self.node(child)?.rendered_bounds;
        let parent_node = self.node_mut(parent)?;
        if parent_node.rendered_bounds.is_valid() {
            parent_node.removed_bounds = parent_node.removed_bounds.union(&child_rendered);
        }
        self.set_dirty(parent, DirtyFlag::ChildDirty);

        let cached = self.node(parent)?.cached_bounds();
        if cached.is_valid() {
            let bbox = self.bounds(child);
            // child touched the parent's edge, so the parent may shrink
            if cached.left >= bbox.left
                || cached.top >= bbox.top
                || cached.right <= bbox.right
                || cached.bottom <= bbox.bottom
            {
                self.invalidate_bounds(parent, false);
            }
        }

        if let Some(doc) = self.document(parent) {
            self.remove_ids(doc, child);
        }
        self.node_mut(child)?.parent = None;
        let parent_node = self.node_mut(parent)?;
        parent_node.children.remove(pos);
        Ok(parent_node.children.get(pos).copied())
    }

    fn destroy(&mut self, node: NodeId) -> DomResult<()> {
        if let Some(parent) = self.node(node)?.parent {
            self.remove_child(parent, node)?;
        }
        for n in self.descendants(node) {
            self.remove_node(n);
        }
        Ok(())
    }

    fn clone_subtree(&mut self, node: NodeId) -> DomResult<NodeId> {
        let copy = self.clone_node(node, None)?;
        for n in self.descendants(copy) {
            match self.get(n).map(Node::kind) {
                Some(NodeKind::Document(_)) => {
                    if let Some(doc) = self.get_mut(n).and_then(Node::as_document_mut) {
                        doc.named_nodes.clear();
                        doc.fonts.clear();
                        doc.stylesheet = None;
                    }
                    self.register_ids(n, n);
                }
                Some(NodeKind::Font(_)) => self.rebuild_glyph_map(n),
                _ => {}
            }
        }
        tracing::trace!("Cloned {} as {}", self.node_path(node), copy);
        Ok(copy)
    }
}

impl SvgTree {
    fn clone_node(&mut self, id: NodeId, parent: Option<NodeId>) -> DomResult<NodeId> {
        let source = self.node(id)?;
        let children = source.children.clone();
        let mut copy: Node = source.clone();
        copy.parent = parent;
        copy.children = Vec::with_capacity(children.len());
        copy.cached_bounds.set(Rect::INVALID);
        copy.rendered_bounds = Rect::INVALID;
        copy.removed_bounds = Rect::INVALID;
        copy.dirty = DirtyFlag::NotDirty;

        let copy_id = self.insert_node(copy);
        for child in children {
            let child_copy = self.clone_node(child, Some(copy_id))?;
            self.node_mut(copy_id)?.children.push(child_copy);
        }
        Ok(copy_id)
    }

    /// Register ids under `root` in `doc`; documents register themselves
    /// but keep their contents in their own registry
    pub(crate) fn add_ids(&mut self, doc: NodeId, root: NodeId) {
        let mut stack = vec![root];
        while let Some(n) = stack.pop() {
            let Some(node) = self.get(n) else { continue };
            let has_id = !node.id.is_empty();
            if node.is_document() {
                if has_id {
                    self.add_named_node(doc, n);
                }
                continue;
            }
            stack.extend(node.children.iter().copied());
            if has_id {
                self.add_named_node(doc, n);
            }
        }
    }

    /// Like `add_ids`, but when `root` is itself a document its own id is
    /// registered too
    fn register_ids(&mut self, doc: NodeId, root: NodeId) {
        if self.get(root).is_some_and(|n| !n.id.is_empty()) {
            self.add_named_node(doc, root);
        }
        for child in self.children(root).to_vec() {
            self.add_ids(doc, child);
        }
    }

    pub(crate) fn remove_ids(&mut self, doc: NodeId, root: NodeId) {
        let mut stack = vec![root];
        while let Some(n) = stack.pop() {
            let Some(node) = self.get(n) else { continue };
            if !node.is_document() {
                stack.extend(node.children.iter().copied());
            }
            self.remove_named_node(doc, n);
        }
    }
}
