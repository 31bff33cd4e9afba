//! Selector Matching
//!
//! Matches parsed selectors against any tree that implements [`Element`].

use crate::selectors::{AttrOp, AttributeSelector, Combinator, ElementSelector, Selector};

/// Capabilities a tree node must expose to be matched against selectors
pub trait Element: Sized {
    /// Case-insensitive tag name comparison; `tag` is already lowercase
    fn has_tag(&self, tag: &str) -> bool;

    /// Whether the whitespace separated class list contains `class`
    fn has_class(&self, class: &str) -> bool;

    fn has_id(&self, id: &str) -> bool;

    /// String form of an attribute value
    fn attribute(&self, name: &str) -> Option<String>;

    fn parent(&self) -> Option<Self>;

    /// Previous element sibling. Trees that do not track sibling order can
    /// leave this out, in which case sibling combinators never match.
    fn prev_sibling(&self) -> Option<Self> {
        None
    }
}

/// Test whether `element` is matched by `selector`
pub fn matches<E: Element>(selector: &Selector, element: &E) -> bool {
    if !matches_compound(&selector.right, element) {
        return false;
    }
    let Some(left) = selector.left.as_deref() else {
        return true;
    };

    match selector.combinator {
        Combinator::Descendant => {
            let mut ancestor = element.parent();
            while let Some(node) = ancestor {
                if matches(left, &node) {
                    return true;
                }
                ancestor = node.parent();
            }
            false
        }
        Combinator::Child => element.parent().is_some_and(|p| matches(left, &p)),
        Combinator::AdjacentSibling => element.prev_sibling().is_some_and(|s| matches(left, &s)),
        Combinator::GeneralSibling => {
            let mut sibling = element.prev_sibling();
            while let Some(node) = sibling {
                if matches(left, &node) {
                    return true;
                }
                sibling = node.prev_sibling();
            }
            false
        }
    }
}

fn matches_compound<E: Element>(compound: &ElementSelector, element: &E) -> bool {
    if !compound.is_universal() && !element.has_tag(&compound.tag) {
        return false;
    }
    compound.attrs.iter().all(|attr| matches_attribute(attr, element))
}

fn matches_attribute<E: Element>(attr: &AttributeSelector, element: &E) -> bool {
    if attr.is_pseudo() {
        return false;
    }
    // class and id equality go through the dedicated lookups; other
    // operators test the raw attribute text
    match attr.name.as_str() {
        "class" if attr.op == AttrOp::Equals => element.has_class(&attr.value),
        "id" if attr.op == AttrOp::Equals => element.has_id(&attr.value),
        name => match element.attribute(name) {
            Some(value) => attr.test_value(&value.to_lowercase()),
            None => false,
        },
    }
}
