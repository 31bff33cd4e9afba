//! fSVG DOM - SVG Document Model
//!
//! Arena-backed SVG node tree with a typed attribute model, a dirty/bounds
//! invalidation protocol for incremental repaint, and a CSS cascade driven
//! by the `fsvg-css` selector engine.

mod arena;
mod attributes;
mod bounds;
mod cascade;
mod document;
mod font;
mod geometry;
mod gradient;
mod node;
mod operations;
mod path;
mod select;
mod style;
mod text;
mod tree;
pub mod values;

use std::fmt;

pub use attributes::{Attr, AttrList, AttrSource, AttrValue, SrcMask, StdAttr};
pub use cascade::ElementRef;
pub use document::DocumentData;
pub use font::{FontData, GlyphData, Kerning};
pub use geometry::{avg_scale, Rect};
pub use gradient::{GradientData, GradientKind, GradientStop, Spread};
pub use node::{
    CustomNode, DirtyFlag, DisplayMode, FragmentData, ImageData, Node, NodeKind, PatternData, Units, UseData,
};
pub use operations::{DomError, DomResult, NodeOperations};
pub use path::{
    circle_path, ellipse_path, format_path_data, line_path, parse_path_data, path_points, poly_path, rect_path,
    PathData, PathShape, RectData,
};
pub use style::{
    enum_table, format_attr_value, id_from_paint_url, parse_svg_stylesheet, process_attribute,
    process_style_string, SvgDecls, SvgStylesheet,
};
pub use text::TspanData;
pub use tree::{Ancestors, SvgTree};
pub use values::{Color, Length, LengthUnit};

/// Handle to a node in an [`SvgTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) arena::GenIndex);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.0.index, self.0.generation)
    }
}
