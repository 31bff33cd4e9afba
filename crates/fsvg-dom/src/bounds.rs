//! Bounds
//!
//! Node bounds in root canvas coordinates, including stroke. Results are
//! cached per node until an invalidation clears them; debug builds
//! recompute on every cache hit and log a mismatch.
//!
//! Also the repaint bookkeeping a renderer needs: the dirty rect for the
//! next frame and clearing dirty state once it is drawn.

use tiny_skia::{Path, Transform};

use crate::attributes::{AttrValue, StdAttr};
use crate::geometry::{avg_scale, Rect};
use crate::node::{DirtyFlag, DisplayMode, Node, NodeKind};
use crate::tree::SvgTree;
use crate::values::Color;
use crate::NodeId;

/// Nested `<use>` expansion limit
const MAX_USE_DEPTH: u32 = 16;
/// `vector-effect: non-scaling-stroke`
const NON_SCALING_STROKE: i32 = 1;

/// Inherited state that affects bounds
#[derive(Debug, Clone)]
pub(crate) struct BoundsStyle {
    pub ts: Transform,
    pub stroke: bool,
    pub stroke_width: f32,
    pub non_scaling_stroke: bool,
    pub font_size: f32,
    pub font_family: String,
    pub text_anchor: i32,
    pub letter_spacing: f32,
    use_depth: u32,
}

impl Default for BoundsStyle {
    fn default() -> Self {
        Self {
            ts: Transform::identity(),
            stroke: false,
            stroke_width: 1.0,
            non_scaling_stroke: false,
            font_size: 12.0,
            font_family: String::new(),
            text_anchor: 0,
            letter_spacing: 0.0,
            use_depth: 0,
        }
    }
}

impl BoundsStyle {
    /// Style inside `id`: its transform and presentation attributes applied
    pub fn with_node(&self, tree: &SvgTree, id: NodeId) -> Self {
        self.with_node_sized(tree, id, None)
    }

    fn with_node_sized(&self, tree: &SvgTree, id: NodeId, use_size: Option<(f32, f32)>) -> Self {
        let mut style = self.clone();
        let Some(node) = tree.get(id) else { return style };
        if let Some(own) = node.transform {
            style.ts = style.ts.pre_concat(own);
        }
        if node.is_document() {
            style.ts = style.ts.pre_concat(tree.view_box_transform_sized(id, use_size));
        }
        // later entries take precedence
        for attr in node.attrs.iter() {
            match (attr.std, &attr.value) {
                (StdAttr::Stroke, AttrValue::Color(c)) => style.stroke = *c != Color::NONE,
                (StdAttr::Stroke, _) => style.stroke = true,
                (StdAttr::StrokeWidth, AttrValue::Float(w)) => style.stroke_width = *w,
                (StdAttr::VectorEffect, AttrValue::Int(v)) => style.non_scaling_stroke = *v == NON_SCALING_STROKE,
                (StdAttr::FontSize, AttrValue::Float(fs)) => style.font_size = *fs,
                (StdAttr::FontFamily, AttrValue::Str(family)) => style.font_family = family.clone(),
                (StdAttr::TextAnchor, AttrValue::Int(anchor)) => style.text_anchor = *anchor,
                (StdAttr::LetterSpacing, AttrValue::Float(ls)) => style.letter_spacing = *ls,
                _ => {}
            }
        }
        style
    }

    /// Candidate families from a `font-family` list, unquoted
    pub fn font_families(&self) -> impl Iterator<Item = &str> {
        self.font_family
            .split(',')
            .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|f| !f.is_empty())
    }

    /// Half the stroke width in canvas units, or 0 without a stroke
    fn stroke_pad(&self) -> f32 {
        if !self.stroke {
            return 0.0;
        }
        let width = if self.non_scaling_stroke {
            self.stroke_width
        } else {
            self.stroke_width * avg_scale(&self.ts)
        };
        width / 2.0
    }
}

fn path_bounds(path: Option<&Path>, style: &BoundsStyle) -> Rect {
    let Some(mapped) = path.and_then(|p| p.clone().transform(style.ts)) else {
        return Rect::INVALID;
    };
    let tight = mapped.compute_tight_bounds().unwrap_or(mapped.bounds());
    Rect::from_skia(tight).pad(style.stroke_pad())
}

fn approx_eq(a: &Rect, b: &Rect) -> bool {
    let close = |x: f32, y: f32| (x - y).abs() <= 1e-3 * x.abs().max(y.abs()).max(1.0);
    close(a.left, b.left) && close(a.top, b.top) && close(a.right, b.right) && close(a.bottom, b.bottom)
}

impl SvgTree {
    /// Style in effect for `id`'s parent content
    fn parent_style(&self, id: NodeId) -> BoundsStyle {
        let mut chain: Vec<NodeId> = self.ancestors(id).collect();
        chain.reverse();
        chain
            .into_iter()
            .fold(BoundsStyle::default(), |style, n| style.with_node(self, n))
    }

    /// Cached bounds in canvas coordinates; `Rect::INVALID` when empty
    pub fn bounds(&self, id: NodeId) -> Rect {
        match self.get(id) {
            Some(node) if node.cached_bounds.get().is_valid() => self.checked_cache(id, node),
            Some(_) => {
                let style = self.parent_style(id).with_node(self, id);
                self.bounds_with(id, &style, true)
            }
            None => Rect::INVALID,
        }
    }

    /// Bounds recomputed from scratch without touching the cache
    pub fn compute_bounds(&self, id: NodeId) -> Rect {
        let style = self.parent_style(id).with_node(self, id);
        self.bounds_with(id, &style, false)
    }

    fn checked_cache(&self, id: NodeId, node: &Node) -> Rect {
        let cached = node.cached_bounds.get();
        if cfg!(debug_assertions) {
            let fresh = self.compute_bounds(id);
            debug_assert!(
                approx_eq(&fresh, &cached),
                "Cached bounds are wrong for node {}: {:?} != {:?}",
                self.node_path(id),
                cached,
                fresh
            );
        }
        cached
    }

    /// Bounds of `id` given the style inside it. With `use_cache`, cached
    /// values are read and written; `<use>` content never is, since its
    /// bounds depend on the referencing node.
    fn bounds_with(&self, id: NodeId, style: &BoundsStyle, use_cache: bool) -> Rect {
        let Some(node) = self.get(id) else { return Rect::INVALID };
        if use_cache && node.cached_bounds.get().is_valid() {
            return self.checked_cache(id, node);
        }

        let bounds = match &node.kind {
            NodeKind::Path(data) => path_bounds(data.path.as_ref(), style),
            // a zero-sized rect has no path but still has bounds
            NodeKind::Rect(data) => data.rect.map(&style.ts).pad(style.stroke_pad()),
            NodeKind::Group { .. } | NodeKind::Symbol => self.children_bounds(id, style, use_cache),
            NodeKind::Document(data) => {
                let (width, height) = (data.width(), data.height());
                if data.view_box.is_valid() {
                    data.view_box.map(&style.ts)
                } else if (width.is_percent() || height.is_percent()) && !data.canvas_rect.is_valid() {
                    self.children_bounds(id, style, use_cache)
                } else {
                    self.viewport_rect(id).map(&style.ts)
                }
            }
            NodeKind::Image(data) => data.viewport().map(&style.ts),
            NodeKind::Use(data) => self.use_bounds(id, data.viewport, style),
            NodeKind::Text(_) | NodeKind::Tspan(_) => {
                let extent = self.text_extent(id, style);
                if extent.is_valid() { extent.map(&style.ts) } else { Rect::INVALID }
            }
            NodeKind::Custom(ext) => {
                let local = ext.local_bounds();
                if local.is_valid() { local.map(&style.ts) } else { Rect::INVALID }
            }
            NodeKind::Defs
            | NodeKind::Pattern(_)
            | NodeKind::Gradient(_)
            | NodeKind::Stop
            | NodeKind::Font(_)
            | NodeKind::Glyph(_)
            | NodeKind::Fragment(_) => Rect::INVALID,
        };

        if use_cache {
            node.cached_bounds.set(bounds);
        }
        bounds
    }

    /// Union over visible, in-flow children
    fn children_bounds(&self, id: NodeId, style: &BoundsStyle, use_cache: bool) -> Rect {
        self.children(id)
            .iter()
            .filter(|c| self.is_visible(**c) && self.display_mode(**c) != DisplayMode::Absolute)
            .fold(Rect::INVALID, |acc, c| {
                let child_style = style.with_node(self, *c);
                acc.union(&self.bounds_with(*c, &child_style, use_cache))
            })
    }

    /// Target bounds placed at the `<use>` origin. The target is resolved
    /// per call, but the result is cached on the `<use>` like any other
    /// node: edits inside the target do not reach it. After changing a
    /// referenced subtree, call `invalidate(use_node, false)` on each
    /// `<use>` pointing at it; retargeting through `set_use_href` or
    /// `set_use_target` already does.
    fn use_bounds(&self, id: NodeId, viewport: Rect, style: &BoundsStyle) -> Rect {
        let Some(target) = self.use_target(id) else { return Rect::INVALID };
        // a <use> inside its own target would expand forever
        if target == id || self.ancestors(id).any(|a| a == target) || style.use_depth >= MAX_USE_DEPTH {
            return Rect::INVALID;
        }
        let (left, top) = if viewport.is_valid() { viewport.origin() } else { (0.0, 0.0) };
        let mut base = style.clone();
        base.ts = style.ts.pre_translate(left, top);
        base.use_depth += 1;
        let use_size = viewport.is_valid().then(|| (viewport.width(), viewport.height()));
        let target_style = base.with_node_sized(self, target, use_size);
        self.bounds_with(target, &target_style, false)
    }

    // ========================================================================
    // Repaint bookkeeping
    // ========================================================================

    /// Record where a node was last painted
    pub fn mark_rendered(&mut self, id: NodeId, rect: Rect) {
        if let Some(node) = self.get_mut(id) {
            node.rendered_bounds = rect;
        }
    }

    /// Area to repaint: bounds and last-rendered bounds of dirty nodes plus
    /// the areas vacated by removed children
    pub fn dirty_rect(&self, id: NodeId) -> Rect {
        let Some(node) = self.get(id) else { return Rect::INVALID };
        let mut dirty = Rect::INVALID;
        let text_child_dirty = node.dirty == DirtyFlag::ChildDirty && node.as_tspan().is_some();
        if node.dirty > DirtyFlag::ChildDirty || text_child_dirty {
            dirty = if node.is_visible() {
                self.bounds(id).union(&node.rendered_bounds)
            } else {
                node.rendered_bounds
            };
        }

        if node.is_container() && node.dirty == DirtyFlag::ChildDirty && !dirty.is_valid() {
            dirty = node.removed_bounds;
            if matches!(node.kind, NodeKind::Pattern(_)) {
                dirty = dirty.union(&node.rendered_bounds);
            } else {
                for child in &node.children {
                    let Some(c) = self.get(*child) else { continue };
                    if c.dirty != DirtyFlag::NotDirty && self.display_mode(*child) != DisplayMode::Absolute {
                        dirty = dirty.union(&self.dirty_rect(*child));
                    }
                }
                if node.is_document() {
                    dirty = dirty.intersect(&self.bounds(id));
                }
            }
        }
        dirty
    }

    /// Reset dirty state after a repaint, recording the painted bounds and
    /// dropping accumulated removed bounds
    pub fn clear_dirty(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let Some(node) = self.get(n) else { continue };
            if node.dirty == DirtyFlag::NotDirty {
                continue;
            }
            let painted = if node.is_visible() { self.bounds(n) } else { Rect::INVALID };
            let Some(node) = self.get_mut(n) else { continue };
            node.dirty = DirtyFlag::NotDirty;
            node.rendered_bounds = painted;
            node.removed_bounds = Rect::INVALID;
            stack.extend(node.children.iter().copied());
        }
    }
}
