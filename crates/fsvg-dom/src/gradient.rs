//! Gradients
//!
//! Gradient geometry lives on the node; the color ramp comes from its
//! `<stop>` children or, when it has none, from the gradient named by its
//! href. The link is resolved whenever stops are requested, so edits to
//! the linked gradient show through.

use crate::node::{Node, NodeKind, Units};
use crate::tree::SvgTree;
use crate::values::Color;
use crate::NodeId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradientKind {
    Linear { x1: f32, y1: f32, x2: f32, y2: f32 },
    Radial { cx: f32, cy: f32, r: f32, fx: f32, fy: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Spread {
    #[default]
    Pad,
    Reflect,
    Repeat,
}

impl Spread {
    pub fn from_name(name: &str) -> Spread {
        match name {
            "reflect" => Spread::Reflect,
            "repeat" => Spread::Repeat,
            _ => Spread::Pad,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Spread::Pad => "pad",
            Spread::Reflect => "reflect",
            Spread::Repeat => "repeat",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradientData {
    pub kind: GradientKind,
    pub spread: Spread,
    pub units: Units,
    /// `#id` of a gradient to take stops from when this one has none
    pub href: String,
}

impl GradientData {
    pub fn linear(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(GradientKind::Linear { x1, y1, x2, y2 })
    }

    pub fn radial(cx: f32, cy: f32, r: f32, fx: f32, fy: f32) -> Self {
        Self::new(GradientKind::Radial { cx, cy, r, fx, fy })
    }

    fn new(kind: GradientKind) -> Self {
        Self {
            kind,
            spread: Spread::Pad,
            units: Units::ObjectBoundingBox,
            href: String::new(),
        }
    }

    pub fn tag_name(&self) -> &'static str {
        match self.kind {
            GradientKind::Linear { .. } => "linearGradient",
            GradientKind::Radial { .. } => "radialGradient",
        }
    }
}

/// Resolved color stop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Color,
}

impl SvgTree {
    /// Color ramp of a gradient. Offsets never decrease and stay within
    /// [0, 1]; `stop-opacity` scales the stop color's alpha.
    pub fn gradient_stops(&self, gradient: NodeId) -> Vec<GradientStop> {
        let mut source = gradient;
        let mut visited = vec![gradient];
        loop {
            let stops: Vec<NodeId> = self
                .children(source)
                .iter()
                .copied()
                .filter(|c| matches!(self.get(*c).map(Node::kind), Some(NodeKind::Stop)))
                .collect();
            if !stops.is_empty() {
                return self.resolve_stops(&stops);
            }
            let link = self
                .get(source)
                .and_then(Node::as_gradient)
                .filter(|g| !g.href.is_empty())
                .and_then(|g| self.ref_target(source, &g.href))
                .filter(|t| self.get(*t).and_then(Node::as_gradient).is_some());
            match link {
                Some(next) if !visited.contains(&next) => {
                    visited.push(next);
                    source = next;
                }
                _ => return Vec::new(),
            }
        }
    }

    fn resolve_stops(&self, stops: &[NodeId]) -> Vec<GradientStop> {
        let mut offset = 0.0f32;
        stops
            .iter()
            .map(|stop| {
                offset = self.float_attr(*stop, "offset", 0.0).max(offset).min(1.0);
                let color = self.color_attr(*stop, "stop-color", Color::BLACK);
                let opacity = self.float_attr(*stop, "stop-opacity", 1.0);
                GradientStop { offset, color: color.with_alpha_f(color.alpha_f() * opacity) }
            })
            .collect()
    }
}
