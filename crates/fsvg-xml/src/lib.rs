//! fSVG XML - SVG markup reader and writer
//!
//! Builds an [`SvgTree`](fsvg_dom::SvgTree) from SVG markup using `roxmltree`
//! and serializes a tree back to canonical markup.

mod reader;
mod writer;

pub use reader::{read_svg, read_svg_into, ReadOptions};
pub use writer::{write_svg, WriteOptions};

use thiserror::Error;

pub(crate) const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub(crate) const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Errors that abort reading a document
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML parse error: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("Document has no root element")]
    MissingRoot,

    #[error("Root element is <{name}>, expected <svg>")]
    UnexpectedRoot { name: String },
}

pub type XmlResult<T> = Result<T, XmlError>;
