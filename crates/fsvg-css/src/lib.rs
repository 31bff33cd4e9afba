//! fSVG CSS Selector Engine
//!
//! Selector parsing, specificity and matching, plus a small stylesheet
//! parser for `selector { name: value; ... }` blocks.
//!
//! The engine never sees a concrete tree type. Matching goes through the
//! [`Element`] capability trait and parsed declarations are handed to a
//! [`Declarations`] implementation supplied by the embedding crate.

mod matching;
mod parser;
mod selectors;
mod stylesheet;

pub use matching::{matches, Element};
pub use parser::split_string;
pub use selectors::{
    AttrOp, AttributeSelector, Combinator, ElementSelector, Selector, Specificity,
};
pub use stylesheet::{Declaration, DeclarationList, Declarations, Rule, Stylesheet};

/// Parse a stylesheet whose declaration blocks are kept as plain name/value pairs
pub fn parse_stylesheet(css: &str) -> Stylesheet<DeclarationList> {
    let mut sheet = Stylesheet::new();
    sheet.parse(css);
    sheet.sort_rules();
    sheet
}

/// CSS parsing error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CssError {
    #[error("Empty selector")]
    EmptySelector,

    #[error("Selector '{text}' has an empty compound selector")]
    EmptyCompound { text: String },
}

/// Result type for selector parsing
pub type CssResult<T> = Result<T, CssError>;
