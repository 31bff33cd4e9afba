//! CSS Selectors
//!
//! Parsed selector representation and specificity.

use std::fmt;
use std::str::FromStr;

use crate::parser;
use crate::{CssError, CssResult};

/// Attribute constraint operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    /// `[attr]`
    Exists,
    /// `[attr=value]`, `.class`, `#id`
    Equals,
    /// `[attr~=value]`, `[attr*=value]`
    Contains,
    /// `[attr|=value]`, `[attr^=value]`
    StartsWith,
    /// `[attr$=value]`
    EndsWith,
    /// `:hover`, `:first-child`, ...
    PseudoClass,
    /// `::first-line`, `:before`, `:after`
    PseudoElement,
}

/// One constraint of a compound selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    /// Attribute name (lowercase); `class` / `id` for the shorthands,
    /// `pseudo` / `pseudo-el` for pseudo constraints
    pub name: String,
    pub value: String,
    pub op: AttrOp,
}

impl AttributeSelector {
    pub fn new(name: &str, op: AttrOp, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            op,
        }
    }

    /// Test an already lowercased attribute value against this constraint
    pub fn test_value(&self, value: &str) -> bool {
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => value == self.value,
            AttrOp::Contains => value.contains(self.value.as_str()),
            AttrOp::StartsWith => value.starts_with(self.value.as_str()),
            AttrOp::EndsWith => value.ends_with(self.value.as_str()),
            AttrOp::PseudoClass | AttrOp::PseudoElement => false,
        }
    }

    /// Whether this constraint is a pseudo-class or pseudo-element
    pub fn is_pseudo(&self) -> bool {
        matches!(self.op, AttrOp::PseudoClass | AttrOp::PseudoElement)
    }
}

/// Compound selector: optional tag plus constraints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSelector {
    /// Lowercase tag; empty or `*` matches any element
    pub tag: String,
    pub attrs: Vec<AttributeSelector>,
}

impl ElementSelector {
    /// Parse a compound selector such as `rect.a[fill]`
    pub fn parse(text: &str) -> Self {
        parser::parse_compound(text)
    }

    /// Whether the tag part places no constraint on the element
    pub fn is_universal(&self) -> bool {
        self.tag.is_empty() || self.tag == "*"
    }

    pub fn specificity(&self) -> Specificity {
        let mut value = 0u32;
        for attr in &self.attrs {
            if attr.name == "id" {
                value += 0x10000;
            } else {
                value += 0x100;
            }
        }
        if !self.is_universal() {
            value += 1;
        }
        Specificity(value)
    }
}

/// Relation between a compound selector and the selector to its left
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    #[default]
    Descendant,
    /// `a > b`
    Child,
    /// `a + b`
    AdjacentSibling,
    /// `a ~ b`
    GeneralSibling,
}

/// Complex selector, stored right to left
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// The compound the subject element must match
    pub right: ElementSelector,
    /// Selector the related element must match, if any
    pub left: Option<Box<Selector>>,
    pub combinator: Combinator,
}

impl Selector {
    /// Parse a single complex selector (no commas)
    pub fn parse(text: &str) -> CssResult<Self> {
        let text = parser::trim(text);
        if text.is_empty() {
            return Err(CssError::EmptySelector);
        }
        parser::parse_selector(text)
    }

    /// Sum of the compound specificities along the chain
    pub fn specificity(&self) -> Specificity {
        let mut total = 0;
        let mut current = Some(self);
        while let Some(sel) = current {
            total += sel.right.specificity().0;
            current = sel.left.as_deref();
        }
        Specificity(total)
    }
}

impl FromStr for Selector {
    type Err = CssError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

/// Specificity packed as `0xIIAATT`: ids, other constraints, tags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity(pub u32);

impl Specificity {
    pub fn ids(&self) -> u32 {
        self.0 >> 16
    }

    pub fn classes(&self) -> u32 {
        (self.0 >> 8) & 0xff
    }

    pub fn tags(&self) -> u32 {
        self.0 & 0xff
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.ids(), self.classes(), self.tags())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_selectors() {
        let sel: Selector = "div".parse().unwrap();
        assert_eq!(sel.right.tag, "div");
        assert!(sel.right.attrs.is_empty());
        assert!(sel.left.is_none());

        let sel: Selector = ".foo".parse().unwrap();
        assert_eq!(sel.right.tag, "");
        assert_eq!(sel.right.attrs[0], AttributeSelector::new("class", AttrOp::Equals, "foo"));

        let sel: Selector = "#main".parse().unwrap();
        assert_eq!(sel.right.attrs[0], AttributeSelector::new("id", AttrOp::Equals, "main"));
    }

    #[test]
    fn test_parse_compound_classes() {
        let sel = Selector::parse("div.cls1.cls2").unwrap();
        assert_eq!(sel.right.tag, "div");
        assert_eq!(sel.right.attrs.len(), 2);
        assert_eq!(sel.right.attrs[0].value, "cls1");
        assert_eq!(sel.right.attrs[1].value, "cls2");
    }

    #[test]
    fn test_parse_child_selector() {
        let sel = Selector::parse("#id1 > span").unwrap();
        assert_eq!(sel.combinator, Combinator::Child);
        assert_eq!(sel.right.tag, "span");
        let left = sel.left.as_deref().unwrap();
        assert_eq!(left.right.attrs[0].name, "id");
        assert_eq!(left.right.attrs[0].value, "id1");
    }

    #[test]
    fn test_parse_chain_right_to_left() {
        let sel = Selector::parse("svg g > rect.a").unwrap();
        assert_eq!(sel.right.tag, "rect");
        assert_eq!(sel.combinator, Combinator::Child);
        let g = sel.left.as_deref().unwrap();
        assert_eq!(g.right.tag, "g");
        assert_eq!(g.combinator, Combinator::Descendant);
        let svg = g.left.as_deref().unwrap();
        assert_eq!(svg.right.tag, "svg");
        assert!(svg.left.is_none());
    }

    #[test]
    fn test_tag_is_lowercased() {
        let sel = Selector::parse("RECT").unwrap();
        assert_eq!(sel.right.tag, "rect");
    }

    #[test]
    fn test_specificity() {
        let weight = |s: &str| Selector::parse(s).unwrap().specificity();
        assert_eq!(weight("*"), Specificity(0));
        assert_eq!(weight("rect"), Specificity(1));
        assert_eq!(weight(".a"), Specificity(0x100));
        assert_eq!(weight("#a"), Specificity(0x10000));
        assert_eq!(weight("g rect.a"), Specificity(0x102));
        assert_eq!(weight("#x > .a.b"), Specificity(0x10200));
        assert_eq!(weight("a[href]:hover"), Specificity(0x201));
    }

    #[test]
    fn test_specificity_order() {
        let weight = |s: &str| Selector::parse(s).unwrap().specificity();
        assert!(weight("#a") > weight(".a.b.c"));
        assert!(weight(".a") > weight("svg g rect"));
        assert!(weight("rect") > weight("*"));
    }

    #[test]
    fn test_specificity_display() {
        assert_eq!(Specificity(0x10203).to_string(), "(1,2,3)");
    }

    #[test]
    fn test_empty_selector() {
        assert_eq!(Selector::parse("   "), Err(CssError::EmptySelector));
    }

    #[test]
    fn test_test_value() {
        let sel = AttributeSelector::new("href", AttrOp::StartsWith, "http");
        assert!(sel.test_value("https://example.com"));
        assert!(!sel.test_value("ftp://example.com"));

        let sel = AttributeSelector::new("pseudo", AttrOp::PseudoClass, "hover");
        assert!(!sel.test_value("hover"));
    }
}
