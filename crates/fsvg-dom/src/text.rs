//! Text
//!
//! `<text>` and `<tspan>` nodes hold either character data or child spans,
//! never both. Character data added to a node that already has spans is
//! wrapped in anonymous spans; newlines become line-break spans.
//!
//! Layout is an estimate used for bounds: glyph advances from a
//! registered SVG font when the family resolves to one, else half an em
//! per character.

use crate::bounds::BoundsStyle;
use crate::geometry::Rect;
use crate::node::{Node, NodeKind};
use crate::operations::{DomResult, NodeOperations};
use crate::tree::SvgTree;
use crate::NodeId;

/// Payload shared by `<text>` and `<tspan>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TspanData {
    pub text: String,
    /// Absolute glyph positions
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    /// False for runs of character data between elements
    pub is_tspan: bool,
}

impl TspanData {
    pub fn new() -> Self {
        Self { is_tspan: true, ..Default::default() }
    }

    /// Character data run
    pub fn anonymous(text: &str) -> Self {
        Self { text: text.to_string(), ..Default::default() }
    }

    pub fn is_line_break(&self) -> bool {
        self.text == "\n"
    }

    /// Text with control whitespace turned into spaces; runs of spaces are kept
    pub fn display_text(&self) -> String {
        self.text
            .chars()
            .map(|c| if matches!(c, '\n' | '\r' | '\t' | '\x0b' | '\x0c') { ' ' } else { c })
            .collect()
    }
}

/// Ascent and descent as fractions of the font size
const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;
const LINE_HEIGHT: f32 = 1.2;
const ANCHOR_MIDDLE: i32 = 1;
const ANCHOR_END: i32 = 2;

/// Span boxes of one anchored chunk, shifted together once its width is known
#[derive(Default)]
struct Chunk {
    start_x: f32,
    anchor: i32,
    bounds: Rect,
}

struct Layout {
    pos: (f32, f32),
    line_start: f32,
    line_height: f32,
    chunk: Option<Chunk>,
    bounds: Rect,
}

impl Layout {
    fn finish_chunk(&mut self) {
        let Some(chunk) = self.chunk.take() else { return };
        let width = self.pos.0 - chunk.start_x;
        let shift = match chunk.anchor {
            ANCHOR_MIDDLE => -width / 2.0,
            ANCHOR_END => -width,
            _ => 0.0,
        };
        if chunk.bounds.is_valid() {
            self.bounds = self.bounds.union(&chunk.bounds.translate(shift, 0.0));
        }
    }
}

impl SvgTree {
    fn tspan_data(&self, id: NodeId) -> Option<&TspanData> {
        self.get(id).and_then(Node::as_tspan)
    }

    /// Append a span. Existing character data moves into an anonymous span first.
    pub fn add_tspan(&mut self, parent: NodeId, tspan: NodeId) -> DomResult<()> {
        let moved = match self.node_mut(parent)?.as_tspan_mut() {
            Some(data) if !data.text.is_empty() => std::mem::take(&mut data.text),
            _ => String::new(),
        };
        if !moved.is_empty() {
            let run = self.create(NodeKind::Tspan(TspanData::anonymous(&moved)));
            self.add_child(parent, run, None)?;
        }
        self.add_child(parent, tspan, None)?;
        self.invalidate(parent, false);
        Ok(())
    }

    /// Append character data; each newline becomes a line-break span
    pub fn add_text(&mut self, node: NodeId, text: &str) -> DomResult<()> {
        let has_spans = !self.node(node)?.children.is_empty();
        if !has_spans && !text.contains('\n') {
            if let Some(data) = self.node_mut(node)?.as_tspan_mut() {
                data.text.push_str(text);
            }
            self.invalidate(node, false);
            return Ok(());
        }
        let mut lines = text.split('\n').peekable();
        while let Some(line) = lines.next() {
            if !line.is_empty() {
                let run = self.create(NodeKind::Tspan(TspanData::anonymous(line)));
                self.add_tspan(node, run)?;
            }
            if lines.peek().is_some() {
                let br = self.create(NodeKind::Tspan(TspanData::anonymous("\n")));
                self.add_tspan(node, br)?;
            }
        }
        Ok(())
    }

    /// Concatenated character data of the node and its spans
    pub fn text(&self, node: NodeId) -> String {
        self.descendants(node)
            .into_iter()
            .filter_map(|n| self.tspan_data(n))
            .map(|t| t.text.as_str())
            .collect()
    }

    pub fn display_text(&self, node: NodeId) -> String {
        self.tspan_data(node).map(TspanData::display_text).unwrap_or_default()
    }

    pub fn is_line_break(&self, node: NodeId) -> bool {
        self.tspan_data(node).is_some_and(TspanData::is_line_break)
    }

    /// Remove all character data and spans
    pub fn clear_text(&mut self, node: NodeId) -> DomResult<()> {
        if let Some(data) = self.node_mut(node)?.as_tspan_mut() {
            data.text.clear();
        }
        for child in self.children(node).to_vec() {
            self.destroy(child)?;
        }
        self.invalidate(node, false);
        Ok(())
    }

    // ========================================================================
    // Layout estimate
    // ========================================================================

    /// Untransformed extent of a text node's laid-out spans
    pub(crate) fn text_extent(&self, text: NodeId, style: &BoundsStyle) -> Rect {
        let mut layout = Layout {
            pos: (0.0, 0.0),
            line_start: 0.0,
            line_height: 0.0,
            chunk: None,
            bounds: Rect::INVALID,
        };
        if let Some(data) = self.tspan_data(text) {
            layout.line_start = data.x.first().copied().unwrap_or(0.0);
        }
        self.layout_span(text, style, &mut layout);
        layout.finish_chunk();
        layout.bounds
    }

    fn layout_span(&self, id: NodeId, style: &BoundsStyle, layout: &mut Layout) {
        let Some(data) = self.tspan_data(id) else { return };

        if data.is_line_break() {
            layout.finish_chunk();
            layout.pos.0 = layout.line_start;
            layout.pos.1 += if layout.line_height > 0.0 {
                layout.line_height
            } else {
                LINE_HEIGHT * style.font_size
            };
            layout.line_height = 0.0;
            return;
        }
        // absolute coordinates start a new anchored chunk
        if !data.x.is_empty() || !data.y.is_empty() {
            layout.finish_chunk();
        }
        if let Some(x) = data.x.first() {
            layout.pos.0 = *x;
        }
        if let Some(y) = data.y.first() {
            layout.pos.1 = *y;
        }

        if !data.text.is_empty() {
            let chunk = layout.chunk.get_or_insert_with(|| Chunk {
                start_x: layout.pos.0,
                anchor: style.text_anchor,
                bounds: Rect::INVALID,
            });
            let advance = self.text_advance(id, &data.display_text(), style);
            let (x, y) = layout.pos;
            let fs = style.font_size;
            let run = Rect::ltrb(x, y - ASCENT * fs, x + advance, y + DESCENT * fs);
            chunk.bounds = chunk.bounds.union(&run);
            layout.pos.0 += advance;
            layout.line_height = layout.line_height.max(LINE_HEIGHT * fs);
        }

        for child in self.children(id) {
            if self.get(*child).is_some_and(|c| c.visible || c.as_tspan().is_some_and(TspanData::is_line_break)) {
                let child_style = style.with_node(self, *child);
                self.layout_span(*child, &child_style, layout);
            }
        }
    }

    /// Horizontal advance of `text` rendered in `style`
    fn text_advance(&self, node: NodeId, text: &str, style: &BoundsStyle) -> f32 {
        let font = self
            .document(node)
            .and_then(|doc| style.font_families().find_map(|family| self.svg_font(doc, family)));
        let Some(font) = font else {
            let chars = text.chars().count() as f32;
            return chars * (0.5 * style.font_size + style.letter_spacing);
        };
        let Some(data) = self.get(font).and_then(Node::as_font) else { return 0.0 };
        let scale = if data.units_per_em > 0.0 { style.font_size / data.units_per_em } else { 0.0 };
        let glyphs = self.glyphs_for_text(font, text);
        glyphs
            .iter()
            .enumerate()
            .map(|(i, g)| {
                let kerning = glyphs.get(i + 1).map_or(0.0, |next| self.kerning_for_pair(font, *g, *next));
                scale * (kerning + self.horiz_adv_x(font, *g)) + style.letter_spacing
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_node(tree: &mut SvgTree) -> NodeId {
        tree.create(NodeKind::Text(TspanData::default()))
    }

    #[test]
    fn test_add_plain_text() {
        let mut tree = SvgTree::new();
        let t = text_node(&mut tree);
        tree.add_text(t, "Hello").unwrap();
        tree.add_text(t, " world").unwrap();
        assert_eq!(tree.text(t), "Hello world");
        assert!(tree.children(t).is_empty());
    }

    #[test]
    fn test_newlines_split_into_spans() {
        let mut tree = SvgTree::new();
        let t = text_node(&mut tree);
        tree.add_text(t, "ab").unwrap();
        tree.add_text(t, "c\nd").unwrap();
        let kids = tree.children(t).to_vec();
        assert_eq!(kids.len(), 4);
        assert_eq!(tree.text(kids[0]), "ab");
        assert_eq!(tree.text(kids[1]), "c");
        assert!(tree.is_line_break(kids[2]));
        assert_eq!(tree.text(kids[3]), "d");
        assert_eq!(tree.text(t), "abc\nd");
        assert!(!tree.node(kids[0]).unwrap().as_tspan().unwrap().is_tspan);
    }

    #[test]
    fn test_add_tspan_moves_text() {
        let mut tree = SvgTree::new();
        let t = text_node(&mut tree);
        tree.add_text(t, "A").unwrap();
        let span = tree.create(NodeKind::Tspan(TspanData::new()));
        tree.add_text(span, "B").unwrap();
        tree.add_tspan(t, span).unwrap();
        assert_eq!(tree.children(t).len(), 2);
        assert_eq!(tree.node(t).unwrap().as_tspan().unwrap().text, "");
        assert_eq!(tree.text(t), "AB");
    }

    #[test]
    fn test_display_text_and_clear() {
        let mut tree = SvgTree::new();
        let t = text_node(&mut tree);
        tree.add_text(t, "a\tb  c").unwrap();
        assert_eq!(tree.display_text(t), "a b  c");

        tree.add_text(t, "\nmore").unwrap();
        let spans = tree.children(t).to_vec();
        tree.clear_text(t).unwrap();
        assert_eq!(tree.text(t), "");
        assert!(tree.children(t).is_empty());
        assert!(spans.iter().all(|s| !tree.contains(*s)));
    }
}
