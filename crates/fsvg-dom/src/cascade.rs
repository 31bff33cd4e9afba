//! Style Cascade
//!
//! Re-applies document stylesheets to nodes:
//! 1. Mark the node's CSS band stale
//! 2. Apply matching rules of each stylesheet, outermost document first
//! 3. Resolve `var()` references against the node and its ancestors
//! 4. Drop CSS attributes no rule reconfirmed
//!
//! Rules arrive sorted highest priority first, so the first value written
//! for a name wins and later, lower priority values are discarded by the
//! attribute list.

use std::rc::Rc;

use fsvg_css::Element;

use crate::attributes::{Attr, AttrSource, SrcMask};
use crate::node::{Node, NodeKind};
use crate::style::{format_attr_value, SvgStylesheet};
use crate::tree::SvgTree;
use crate::NodeId;

/// Precision used when attribute selectors compare typed values
const SELECTOR_PRECISION: usize = 6;

/// A node viewed through the selector engine's element interface
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    tree: &'a SvgTree,
    id: NodeId,
}

impl<'a> ElementRef<'a> {
    pub fn new(tree: &'a SvgTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    fn node(&self) -> Option<&'a Node> {
        self.tree.get(self.id)
    }
}

impl Element for ElementRef<'_> {
    fn has_tag(&self, tag: &str) -> bool {
        self.node()
            .is_some_and(|n| n.tag_name().eq_ignore_ascii_case(tag) || n.kind_name().eq_ignore_ascii_case(tag))
    }

    fn has_class(&self, class: &str) -> bool {
        self.node().is_some_and(|n| n.has_class(class))
    }

    fn has_id(&self, id: &str) -> bool {
        self.node().is_some_and(|n| !n.id.is_empty() && n.id == id)
    }

    /// Markup attributes only; CSS-sourced values never feed back into matching
    fn attribute(&self, name: &str) -> Option<String> {
        let node = self.node()?;
        match name {
            "id" if !node.id.is_empty() => Some(node.id.clone()),
            "class" if !node.class.is_empty() => Some(node.class.clone()),
            _ => node
                .attrs
                .get(name, SrcMask::XML | SrcMask::INLINE)
                .map(|a| format_attr_value(a, SELECTOR_PRECISION)),
        }
    }

    fn parent(&self) -> Option<Self> {
        self.tree.parent(self.id).map(|p| ElementRef::new(self.tree, p))
    }

    fn prev_sibling(&self) -> Option<Self> {
        let siblings = self.tree.children(self.tree.parent(self.id)?);
        let pos = siblings.iter().position(|c| *c == self.id)?;
        let prev = *siblings.get(pos.checked_sub(1)?)?;
        Some(ElementRef::new(self.tree, prev))
    }
}

impl SvgTree {
    /// Re-run the cascade for `id` and everything below it. A no-op outside
    /// a document or when no enclosing document has rules.
    pub fn restyle(&mut self, id: NodeId) {
        let Some(doc) = self.document(id) else { return };
        if !self.can_restyle(doc) {
            return;
        }
        let mut count = 0;
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let Some(node) = self.get(n) else { continue };
            // glyph outlines take no part in styling
            if !matches!(node.kind, NodeKind::Font(_)) {
                stack.extend(node.children.iter().rev().copied());
            }
            self.restyle_node(n);
            count += 1;
        }
        tracing::trace!("Restyled {} nodes under {}", count, self.node_path(id));
    }

    fn restyle_node(&mut self, id: NodeId) {
        let Some(doc) = self.document(id) else { return };
        let mut sheets: Vec<Rc<SvgStylesheet>> = self.document_chain(doc).filter_map(|d| self.stylesheet(d)).collect();
        sheets.reverse();

        let Some(node) = self.get_mut(id) else { return };
        node.attrs.mark_css_stale();
        for sheet in &sheets {
            self.apply_stylesheet(sheet, id);
        }
        let Some(node) = self.get_mut(id) else { return };
        for (name, std) in node.attrs.remove_stale_css() {
            self.on_attr_change(id, &name, std);
        }
    }

    fn apply_stylesheet(&mut self, sheet: &SvgStylesheet, id: NodeId) {
        let matched: Vec<usize> = {
            let element = ElementRef::new(self, id);
            sheet
                .rules()
                .iter()
                .enumerate()
                .filter(|(_, rule)| rule.matches(&element))
                .map(|(i, _)| i)
                .collect()
        };

        let mut var_attrs: Vec<&Attr> = Vec::new();
        for attr in matched.iter().flat_map(|i| sheet.rules()[*i].decls.attrs.iter()) {
            if !attr.variable {
                self.set_attr(id, attr.clone());
                continue;
            }
            let Some(node) = self.get_mut(id) else { return };
            match node.attrs.get_mut(&attr.name, SrcMask::CSS) {
                Some(current) => {
                    if current.stale {
                        var_attrs.push(attr);
                    }
                    // hold the slot against lower priority rules
                    current.stale = false;
                }
                None => {
                    var_attrs.push(attr);
                    self.set_attr(id, attr.clone());
                }
            }
        }

        // separate pass so a variable set and referenced on the same node resolves
        for attr in var_attrs {
            if let Some(current) = self.get_mut(id).and_then(|n| n.attrs.get_mut(&attr.name, SrcMask::CSS)) {
                current.stale = true;
            }
            let Some(var_name) = attr.value.as_str() else { continue };
            let value = std::iter::once(id)
                .chain(self.ancestors(id))
                .find_map(|n| self.attr(n, var_name, SrcMask::CSS).filter(|a| !a.stale))
                .and_then(|a| a.value.as_str())
                .map(str::to_string);
            match value {
                Some(value) => {
                    self.set_attribute(id, &attr.name, &value, AttrSource::Css);
                }
                None => tracing::debug!("Unresolved variable {} for {}", var_name, attr.name),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttrValue, StdAttr};
    use crate::document::DocumentData;
    use crate::node::DirtyFlag;
    use crate::operations::NodeOperations;
    use crate::style::parse_svg_stylesheet;
    use crate::values::Color;

    const RED: Color = Color::rgba(255, 0, 0, 255);
    const BLUE: Color = Color::rgba(0, 0, 255, 255);
    const GREEN: Color = Color::rgba(0, 128, 0, 255);

    fn styled_doc(css: &str) -> (SvgTree, NodeId) {
        let mut tree = SvgTree::new();
        let doc = tree.create(NodeKind::Document(DocumentData::default()));
        tree.set_stylesheet(doc, Some(parse_svg_stylesheet(css)));
        (tree, doc)
    }

    fn add_group(tree: &mut SvgTree, parent: NodeId, id: &str, class: &str) -> NodeId {
        let g = tree.create(NodeKind::Group { anchor: false });
        tree.set_xml_id(g, id);
        tree.set_xml_class(g, class);
        tree.add_child(parent, g, None).unwrap();
        g
    }

    fn css_band(tree: &SvgTree, id: NodeId) -> Vec<Attr> {
        tree.node(id).unwrap().attrs().from_source(AttrSource::Css).cloned().collect()
    }

    #[test]
    fn test_specificity_precedence() {
        let (mut tree, doc) = styled_doc("g { fill: red } #x { fill: green } .c { fill: blue }");
        let g = add_group(&mut tree, doc, "x", "c");
        assert_eq!(tree.color_attr(g, "fill", Color::NONE), GREEN);

        tree.set_xml_id(g, "");
        assert_eq!(tree.color_attr(g, "fill", Color::NONE), BLUE);

        tree.remove_class(g, "c");
        assert_eq!(tree.color_attr(g, "fill", Color::NONE), RED);
    }

    #[test]
    fn test_later_rule_wins_on_tie() {
        let (mut tree, doc) = styled_doc(".a { color: red } .a { color: blue }");
        let g = add_group(&mut tree, doc, "", "a");
        assert_eq!(tree.color_attr(g, "color", Color::NONE), BLUE);
        assert_eq!(css_band(&tree, g).len(), 1);
    }

    #[test]
    fn test_xml_and_inline_precedence() {
        let (mut tree, doc) = styled_doc(".a { fill: red; stroke: blue }");
        let g = tree.create(NodeKind::Group { anchor: false });
        tree.set_attribute(g, "fill", "green", AttrSource::Xml);
        tree.set_style(g, "stroke: green");
        tree.set_xml_class(g, "a");
        tree.add_child(doc, g, None).unwrap();

        // CSS beats presentation attributes, inline style beats CSS
        assert_eq!(tree.color_attr(g, "fill", Color::NONE), RED);
        assert_eq!(tree.color_attr(g, "stroke", Color::NONE), GREEN);
        assert_eq!(tree.attr(g, "fill", SrcMask::XML).unwrap().value, AttrValue::Color(GREEN));
    }

    #[test]
    fn test_restyle_is_idempotent() {
        let (mut tree, doc) = styled_doc(".a { fill: red; --w: 3 } g > .a { stroke-width: var(--w) }");
        let g = add_group(&mut tree, doc, "", "");
        let inner = add_group(&mut tree, g, "", "a");
        let before = css_band(&tree, inner);

        tree.clear_dirty(doc);
        tree.restyle(doc);
        tree.restyle(doc);
        assert_eq!(css_band(&tree, inner), before);
        assert_eq!(tree.node(inner).unwrap().dirty(), DirtyFlag::NotDirty);
    }

    #[test]
    fn test_stale_css_removed() {
        let (mut tree, doc) = styled_doc(".a { stroke-width: 4 }");
        let g = add_group(&mut tree, doc, "", "a");
        assert_eq!(tree.float_attr(g, "stroke-width", 1.0), 4.0);

        tree.clear_dirty(doc);
        tree.set_xml_class(g, "");
        assert!(tree.attr(g, "stroke-width", SrcMask::ANY).is_none());
        assert_eq!(tree.node(g).unwrap().dirty(), DirtyFlag::BoundsDirty);
    }

    #[test]
    fn test_variable_same_node() {
        let (mut tree, doc) = styled_doc(".a { --w: 5; stroke-width: var(--w) }");
        let g = add_group(&mut tree, doc, "", "a");
        assert_eq!(tree.float_attr(g, "stroke-width", 0.0), 5.0);
        let attr = tree.attr(g, "stroke-width", SrcMask::CSS).unwrap();
        assert!(!attr.variable);
        assert_eq!(attr.std, StdAttr::StrokeWidth);
    }

    #[test]
    fn test_variable_from_ancestor_and_unresolved() {
        let (mut tree, doc) = styled_doc("#p { --c: blue } .a { fill: var(--c) }");
        let p = add_group(&mut tree, doc, "p", "");
        let child = add_group(&mut tree, p, "", "a");
        assert_eq!(tree.color_attr(child, "fill", Color::NONE), BLUE);

        // orphaned reference is dropped rather than left unresolved
        tree.set_xml_id(p, "q");
        assert!(tree.attr(child, "fill", SrcMask::ANY).is_none());
    }

    #[test]
    fn test_outer_document_rules_apply() {
        let (mut tree, doc) = styled_doc("rect { fill: red } .b { fill: blue }");
        let inner = tree.create(NodeKind::Document(DocumentData::default()));
        tree.add_child(doc, inner, None).unwrap();
        tree.set_stylesheet(inner, Some(parse_svg_stylesheet(".b { fill: green }")));
        let g = add_group(&mut tree, inner, "", "b");
        // outer sheet is applied first and holds the slot
        assert_eq!(tree.color_attr(g, "fill", Color::NONE), BLUE);
    }

    #[test]
    fn test_sibling_and_attribute_selectors() {
        let (mut tree, doc) = styled_doc("g + g { fill: red } [data-k=v] { stroke: blue }");
        let first = add_group(&mut tree, doc, "", "");
        let second = add_group(&mut tree, doc, "", "");
        assert!(tree.attr(first, "fill", SrcMask::ANY).is_none());
        assert_eq!(tree.color_attr(second, "fill", Color::NONE), RED);

        tree.set_attribute(first, "data-k", "v", AttrSource::Xml);
        tree.restyle(first);
        assert_eq!(tree.color_attr(first, "stroke", Color::NONE), BLUE);
    }

    #[test]
    fn test_no_stylesheet_is_noop() {
        let mut tree = SvgTree::new();
        let doc = tree.create(NodeKind::Document(DocumentData::default()));
        let g = add_group(&mut tree, doc, "", "a");
        tree.restyle(doc);
        assert!(css_band(&tree, g).is_empty());
    }
}
