//! SVG Fonts
//!
//! `<font>` nodes own their `<glyph>` children. Glyphs may map to
//! multi-character strings (ligatures), so text is matched greedily
//! against the longest unicode sequence a glyph is registered for.

use std::collections::HashMap;

use tiny_skia::Path;

use crate::node::{Node, NodeKind};
use crate::operations::{DomResult, NodeOperations};
use crate::tree::SvgTree;
use crate::NodeId;

/// One `<hkern>` entry; glyph names and unicode strings are comma lists
#[derive(Debug, Clone, PartialEq)]
pub struct Kerning {
    pub g1: String,
    pub g2: String,
    pub u1: String,
    pub u2: String,
    pub k: f32,
}

#[derive(Debug, Clone, Default)]
pub struct FontData {
    pub family: String,
    pub units_per_em: f32,
    /// Advance for glyphs without their own
    pub horiz_adv_x: f32,
    pub kerning: Vec<Kerning>,
    pub(crate) glyph_map: HashMap<String, NodeId>,
    pub(crate) max_unicode_len: usize,
}

impl FontData {
    pub fn new(horiz_adv_x: f32) -> Self {
        Self {
            units_per_em: 1000.0,
            horiz_adv_x,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GlyphData {
    pub name: String,
    /// Empty for `<missing-glyph>`
    pub unicode: String,
    pub path: Option<Path>,
    pub horiz_adv_x: Option<f32>,
}

impl GlyphData {
    pub fn is_missing_glyph(&self) -> bool {
        self.unicode.is_empty()
    }
}

fn contains_word(list: &str, word: &str) -> bool {
    !word.is_empty() && list.split(',').any(|w| w == word)
}

impl SvgTree {
    fn glyph_data(&self, glyph: NodeId) -> Option<&GlyphData> {
        match self.get(glyph).map(Node::kind) {
            Some(NodeKind::Glyph(g)) => Some(g),
            _ => None,
        }
    }

    /// Attach a glyph to a font; the first glyph for a unicode string wins
    pub fn add_glyph(&mut self, font: NodeId, glyph: NodeId) -> DomResult<()> {
        self.add_child(font, glyph, None)?;
        let Some(unicode) = self.glyph_data(glyph).map(|g| g.unicode.clone()) else {
            return Ok(());
        };
        if let Some(Node { kind: NodeKind::Font(data), .. }) = self.get_mut(font) {
            data.max_unicode_len = data.max_unicode_len.max(unicode.len());
            data.glyph_map.entry(unicode).or_insert(glyph);
        }
        Ok(())
    }

    /// Rebuild the unicode index from the font's children, e.g. after cloning
    pub(crate) fn rebuild_glyph_map(&mut self, font: NodeId) {
        let mut glyphs: HashMap<String, NodeId> = HashMap::new();
        for g in self.children(font) {
            if let Some(glyph) = self.glyph_data(*g) {
                glyphs.entry(glyph.unicode.clone()).or_insert(*g);
            }
        }
        if let Some(Node { kind: NodeKind::Font(data), .. }) = self.get_mut(font) {
            data.max_unicode_len = glyphs.keys().map(String::len).max().unwrap_or(0);
            data.glyph_map = glyphs;
        }
    }

    /// Glyph sequence for `text`, preferring the longest registered match at
    /// each position. Unmatched characters use the missing glyph, if any.
    pub fn glyphs_for_text(&self, font: NodeId, text: &str) -> Vec<NodeId> {
        let Some(data) = self.get(font).and_then(Node::as_font) else {
            return Vec::new();
        };
        let missing = data.glyph_map.get("").copied();
        let mut glyphs = Vec::new();
        let mut pos = 0;
        while pos < text.len() {
            let mut found = missing;
            let max_len = data.max_unicode_len.min(text.len() - pos);
            for len in 1..=max_len {
                if let Some(g) = text.get(pos..pos + len).and_then(|s| data.glyph_map.get(s)) {
                    found = Some(*g);
                }
            }
            let char_len = text[pos..].chars().next().map_or(1, char::len_utf8);
            let advance = match found.and_then(|g| self.glyph_data(g)) {
                Some(glyph) if !glyph.unicode.is_empty() => glyph.unicode.len(),
                _ => char_len,
            };
            if let Some(g) = found {
                glyphs.push(g);
            }
            pos += advance;
        }
        glyphs
    }

    /// Glyph advance, falling back to the font default
    pub fn horiz_adv_x(&self, font: NodeId, glyph: NodeId) -> f32 {
        let own = self.glyph_data(glyph).and_then(|g| g.horiz_adv_x).filter(|adv| *adv >= 0.0);
        own.or_else(|| self.get(font).and_then(Node::as_font).map(|f| f.horiz_adv_x))
            .unwrap_or(0.0)
    }

    /// Kerning adjustment for an adjacent glyph pair; first matching entry wins
    pub fn kerning_for_pair(&self, font: NodeId, g1: NodeId, g2: NodeId) -> f32 {
        let (Some(data), Some(a), Some(b)) =
            (self.get(font).and_then(Node::as_font), self.glyph_data(g1), self.glyph_data(g2))
        else {
            return 0.0;
        };
        data.kerning
            .iter()
            .find(|k| {
                (contains_word(&k.g1, &a.name) || contains_word(&k.u1, &a.unicode))
                    && (contains_word(&k.g2, &b.name) || contains_word(&k.u2, &b.unicode))
            })
            .map_or(0.0, |k| k.k)
    }
}
