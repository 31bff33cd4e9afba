//! Stylesheet
//!
//! Rules parsed from `selector, selector { name: value; ... }` text.

use crate::matching::{matches, Element};
use crate::parser;
use crate::selectors::{Selector, Specificity};

/// Receiver for the declarations of one rule block.
///
/// The embedding crate decides how values are interpreted; the stylesheet
/// only splits the block into trimmed name/value pairs.
pub trait Declarations: Default {
    fn parse_decl(&mut self, name: &str, value: &str);
}

/// A raw `name: value` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

/// Declarations kept as plain strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationList(pub Vec<Declaration>);

impl DeclarationList {
    pub fn get(&self, property: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|d| d.property == property)
            .map(|d| d.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.0.iter()
    }
}

impl Declarations for DeclarationList {
    fn parse_decl(&mut self, name: &str, value: &str) {
        self.0.push(Declaration {
            property: name.to_string(),
            value: value.to_string(),
        });
    }
}

/// One selector with its declaration block
#[derive(Debug, Clone)]
pub struct Rule<D> {
    pub selector: Selector,
    pub decls: D,
    pub specificity: Specificity,
    /// Position of the rule in the sheet at parse time
    pub order: usize,
}

impl<D> Rule<D> {
    pub fn matches<E: Element>(&self, element: &E) -> bool {
        matches(&self.selector, element)
    }
}

/// Ordered collection of rules
#[derive(Debug, Clone)]
pub struct Stylesheet<D> {
    rules: Vec<Rule<D>>,
}

impl<D> Default for Stylesheet<D> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<D: Declarations + Clone> Stylesheet<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse stylesheet text, appending rules. Selectors that fail to parse
    /// are skipped. Call [`sort_rules`](Self::sort_rules) before applying.
    pub fn parse(&mut self, text: &str) {
        let text = parser::strip_comments(text);
        for (selectors, block) in parser::rule_blocks(&text) {
            let mut decls = D::default();
            for (name, value) in parser::parse_declarations(block) {
                decls.parse_decl(name, value);
            }

            for sel_text in parser::split_string(parser::trim(selectors), ",", "", "\"") {
                let sel_text = parser::trim(&sel_text);
                match Selector::parse(sel_text) {
                    Ok(selector) => {
                        let specificity = selector.specificity();
                        let order = self.rules.len();
                        self.rules.push(Rule {
                            selector,
                            decls: decls.clone(),
                            specificity,
                            order,
                        });
                    }
                    Err(e) => tracing::debug!("Skipping selector '{}': {}", sel_text, e),
                }
            }
        }
        tracing::debug!("Stylesheet has {} rules", self.rules.len());
    }
}

impl<D> Stylesheet<D> {
    /// Sort by decreasing specificity, later rules first among equals
    pub fn sort_rules(&mut self) {
        self.rules
            .sort_by(|a, b| b.specificity.cmp(&a.specificity).then(b.order.cmp(&a.order)));
    }

    pub fn rules(&self) -> &[Rule<D>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules matching `element`, in sheet order
    pub fn matching_rules<'a, E: Element>(&'a self, element: &'a E) -> impl Iterator<Item = &'a Rule<D>> + 'a {
        self.rules.iter().filter(move |rule| rule.matches(element))
    }
}
