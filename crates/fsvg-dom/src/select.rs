//! Queries
//!
//! Lightweight lookups over a container: `*`, `#id`, `.class` and bare
//! element names, plus point hit testing against cached bounds.

use crate::node::{Node, NodeKind};
use crate::tree::SvgTree;
use crate::NodeId;

fn is_single_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '-' || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn matches_kind(node: &Node, name: &str) -> bool {
    match &node.kind {
        NodeKind::Group { .. } if name == "g" => true,
        NodeKind::Path(_) if name == "path" => true,
        _ => node.kind_name() == name,
    }
}

impl SvgTree {
    /// Nodes under `container` matching a simple selector, at most `limit`.
    /// `*` yields the direct children; `.class` and element names search the
    /// whole subtree in document order, including `container` itself.
    pub fn select(&self, container: NodeId, selector: &str, limit: usize) -> Vec<NodeId> {
        if selector.is_empty() || limit == 0 {
            return Vec::new();
        }
        if selector == "*" {
            return self.children(container).iter().take(limit).copied().collect();
        }
        if let Some(id) = selector.strip_prefix('#').filter(|s| is_single_ident(s)) {
            return self
                .ref_target(container, id)
                .filter(|n| *n == container || self.ancestors(*n).any(|a| a == container))
                .into_iter()
                .collect();
        }
        if let Some(class) = selector.strip_prefix('.').filter(|s| is_single_ident(s)) {
            return self.search(container, limit, |n| n.has_class(class));
        }
        if is_single_ident(selector) {
            return self.search(container, limit, |n| matches_kind(n, selector));
        }
        tracing::warn!("Unsupported selector in select(): '{}'", selector);
        Vec::new()
    }

    pub fn select_first(&self, container: NodeId, selector: &str) -> Option<NodeId> {
        self.select(container, selector, 1).into_iter().next()
    }

    /// Preorder search that only descends into containers
    fn search(&self, root: NodeId, limit: usize, pred: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        let mut hits = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if hits.len() >= limit {
                break;
            }
            let Some(node) = self.get(id) else { continue };
            if pred(node) {
                hits.push(id);
            }
            if node.is_container() {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        hits
    }

    /// Topmost visible leaf whose bounds contain the point. With
    /// `visual_only` false, a container containing the point is returned
    /// when none of its children is hit.
    pub fn node_at(&self, container: NodeId, x: f32, y: f32, visual_only: bool) -> Option<NodeId> {
        for child in self.children(container).iter().rev() {
            let Some(node) = self.get(*child) else { continue };
            if !node.is_visible() || !self.bounds(*child).contains_point(x, y) {
                continue;
            }
            if !node.is_container() {
                return Some(*child);
            }
            if let Some(hit) = self.node_at(*child, x, y, visual_only) {
                return Some(hit);
            }
        }
        (!visual_only && self.bounds(container).contains_point(x, y)).then_some(container)
    }
}
