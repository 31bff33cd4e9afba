//! Attribute Model
//!
//! Each node keeps its attributes in one ordered list split into three
//! contiguous bands: XML attributes, then inline `style=""` declarations,
//! then CSS rule declarations. Lookups scan from the end, so a CSS value
//! shadows an inline value which shadows an XML value, and the insertion
//! rules below keep an inline declaration from ever being shadowed by CSS.

use std::ops::BitOr;

use crate::values::Color;

/// Where an attribute value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrSource {
    Xml,
    InlineStyle,
    Css,
}

impl AttrSource {
    pub fn mask(self) -> SrcMask {
        match self {
            AttrSource::Xml => SrcMask::XML,
            AttrSource::InlineStyle => SrcMask::INLINE,
            AttrSource::Css => SrcMask::CSS,
        }
    }
}

/// Set of sources accepted by a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SrcMask(u8);

impl SrcMask {
    pub const XML: SrcMask = SrcMask(1);
    pub const INLINE: SrcMask = SrcMask(2);
    pub const CSS: SrcMask = SrcMask(4);
    pub const ANY: SrcMask = SrcMask(7);

    pub fn contains(self, src: AttrSource) -> bool {
        self.0 & src.mask().0 != 0
    }
}

impl BitOr for SrcMask {
    type Output = SrcMask;

    fn bitor(self, rhs: SrcMask) -> SrcMask {
        SrcMask(self.0 | rhs.0)
    }
}

/// Standard presentation attributes with typed values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StdAttr {
    Unknown,
    Color,
    CompOp,
    Display,
    Fill,
    FillOpacity,
    FillRule,
    FontFamily,
    FontSize,
    FontStyle,
    FontVariant,
    FontWeight,
    Offset,
    Opacity,
    ShapeRendering,
    StopColor,
    StopOpacity,
    Stroke,
    StrokeDasharray,
    StrokeDashoffset,
    StrokeLinecap,
    StrokeLinejoin,
    StrokeMiterlimit,
    StrokeOpacity,
    StrokeWidth,
    TextAnchor,
    VectorEffect,
    Visibility,
    LetterSpacing,
}

const STD_ATTR_NAMES: &[(&str, StdAttr)] = &[
    ("color", StdAttr::Color),
    ("comp-op", StdAttr::CompOp),
    ("display", StdAttr::Display),
    ("fill", StdAttr::Fill),
    ("fill-opacity", StdAttr::FillOpacity),
    ("fill-rule", StdAttr::FillRule),
    ("font-family", StdAttr::FontFamily),
    ("font-size", StdAttr::FontSize),
    ("font-style", StdAttr::FontStyle),
    ("font-variant", StdAttr::FontVariant),
    ("font-weight", StdAttr::FontWeight),
    ("letter-spacing", StdAttr::LetterSpacing),
    ("offset", StdAttr::Offset),
    ("opacity", StdAttr::Opacity),
    ("shape-rendering", StdAttr::ShapeRendering),
    ("stop-color", StdAttr::StopColor),
    ("stop-opacity", StdAttr::StopOpacity),
    ("stroke", StdAttr::Stroke),
    ("stroke-dasharray", StdAttr::StrokeDasharray),
    ("stroke-dashoffset", StdAttr::StrokeDashoffset),
    ("stroke-linecap", StdAttr::StrokeLinecap),
    ("stroke-linejoin", StdAttr::StrokeLinejoin),
    ("stroke-miterlimit", StdAttr::StrokeMiterlimit),
    ("stroke-opacity", StdAttr::StrokeOpacity),
    ("stroke-width", StdAttr::StrokeWidth),
    ("text-anchor", StdAttr::TextAnchor),
    ("vector-effect", StdAttr::VectorEffect),
    ("visibility", StdAttr::Visibility),
];

impl StdAttr {
    pub fn from_name(name: &str) -> StdAttr {
        STD_ATTR_NAMES
            .binary_search_by(|(n, _)| n.cmp(&name))
            .map(|i| STD_ATTR_NAMES[i].1)
            .unwrap_or(StdAttr::Unknown)
    }

    /// Canonical attribute name; `None` for `Unknown`
    pub fn name(self) -> Option<&'static str> {
        STD_ATTR_NAMES.iter().find(|(_, a)| *a == self).map(|(n, _)| *n)
    }

    /// Changes that can move the node's bounds, not just its pixels
    pub fn affects_geometry(self) -> bool {
        matches!(
            self,
            StdAttr::FontFamily
                | StdAttr::FontSize
                | StdAttr::FontStyle
                | StdAttr::FontVariant
                | StdAttr::FontWeight
                | StdAttr::Stroke
                | StdAttr::StrokeLinecap
                | StdAttr::StrokeLinejoin
                | StdAttr::StrokeMiterlimit
                | StdAttr::StrokeWidth
                | StdAttr::TextAnchor
        )
    }
}

/// Typed attribute payload
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i32),
    Color(Color),
    Float(f32),
    Str(String),
}

impl AttrValue {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            AttrValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            AttrValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// One attribute with its source and flags
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub name: String,
    pub value: AttrValue,
    pub src: AttrSource,
    pub std: StdAttr,
    /// CSS value awaiting reconfirmation by the current restyle pass
    pub stale: bool,
    /// Skipped by the writer
    pub no_serialize: bool,
    /// CSS declaration holding an unresolved `var()` reference
    pub variable: bool,
}

impl Attr {
    pub fn new(name: &str, value: AttrValue, src: AttrSource) -> Self {
        Self {
            name: name.to_string(),
            value,
            src,
            std: StdAttr::from_name(name),
            stale: false,
            no_serialize: false,
            variable: false,
        }
    }

    pub fn int(name: &str, value: i32, src: AttrSource) -> Self {
        Self::new(name, AttrValue::Int(value), src)
    }

    pub fn color(name: &str, value: Color, src: AttrSource) -> Self {
        Self::new(name, AttrValue::Color(value), src)
    }

    pub fn float(name: &str, value: f32, src: AttrSource) -> Self {
        Self::new(name, AttrValue::Float(value), src)
    }

    pub fn string(name: &str, value: &str, src: AttrSource) -> Self {
        Self::new(name, AttrValue::Str(value.to_string()), src)
    }

    /// CSS variable reference to be resolved against `var_name`
    pub fn variable(name: &str, var_name: &str) -> Self {
        Self {
            std: StdAttr::Unknown,
            variable: true,
            ..Self::string(name, var_name, AttrSource::Css)
        }
    }

    pub fn with_no_serialize(mut self) -> Self {
        self.no_serialize = true;
        self
    }
}

/// Clear `dest`'s stale flag and overwrite it with `src`; true if the value changed
fn replace_attr(dest: &mut Attr, src: Attr) -> bool {
    dest.stale = false;
    if *dest == src {
        return false;
    }
    *dest = src;
    true
}

/// Banded attribute list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrList(Vec<Attr>);

impl AttrList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert honoring band order and source precedence. Returns true when
    /// the visible set of attributes changed.
    pub fn insert(&mut self, attr: Attr) -> bool {
        match attr.src {
            AttrSource::Xml => {
                for i in 0..self.0.len() {
                    if self.0[i].src != AttrSource::Xml {
                        self.0.insert(i, attr);
                        return true;
                    }
                    if self.0[i].name == attr.name {
                        return replace_attr(&mut self.0[i], attr);
                    }
                }
                self.0.push(attr);
                true
            }
            AttrSource::Css => {
                // rules arrive highest priority first, so only a stale value may be replaced
                for i in (0..self.0.len()).rev() {
                    let existing = &mut self.0[i];
                    if existing.src == AttrSource::Xml {
                        break;
                    }
                    if existing.name == attr.name {
                        if existing.src == AttrSource::Css && existing.stale {
                            return replace_attr(existing, attr);
                        }
                        return false;
                    }
                }
                self.0.push(attr);
                true
            }
            AttrSource::InlineStyle => {
                let mut pos = 0;
                while pos < self.0.len() && self.0[pos].src != AttrSource::Css {
                    if self.0[pos].src == AttrSource::InlineStyle && self.0[pos].name == attr.name {
                        return replace_attr(&mut self.0[pos], attr);
                    }
                    pos += 1;
                }
                let name = attr.name.clone();
                self.0.insert(pos, attr);
                if let Some(offset) = self.0[pos + 1..].iter().position(|a| a.name == name && a.src == AttrSource::Css) {
                    self.0.remove(pos + 1 + offset);
                }
                true
            }
        }
    }

    /// Highest-precedence attribute named `name` among the sources in `mask`
    pub fn get(&self, name: &str, mask: SrcMask) -> Option<&Attr> {
        self.0.iter().rev().find(|a| a.name == name && mask.contains(a.src))
    }

    pub fn get_mut(&mut self, name: &str, mask: SrcMask) -> Option<&mut Attr> {
        self.0.iter_mut().rev().find(|a| a.name == name && mask.contains(a.src))
    }

    /// Remove every attribute named `name` from the sources in `mask`
    pub fn remove(&mut self, name: &str, mask: SrcMask) -> usize {
        let before = self.0.len();
        self.0.retain(|a| !(a.name == name && mask.contains(a.src)));
        before - self.0.len()
    }

    /// Mark the whole CSS band stale
    pub fn mark_css_stale(&mut self) {
        for attr in self.0.iter_mut().rev().take_while(|a| a.src == AttrSource::Css) {
            attr.stale = true;
        }
    }

    /// Drop CSS attributes that were not reconfirmed, returning their names
    pub fn remove_stale_css(&mut self) -> Vec<(String, StdAttr)> {
        let band_start = self.css_band_start();
        let mut removed = Vec::new();
        let mut i = band_start;
        while i < self.0.len() {
            if self.0[i].stale {
                let attr = self.0.remove(i);
                removed.push((attr.name, attr.std));
            } else {
                i += 1;
            }
        }
        removed
    }

    /// Re-tag the CSS band as inline style
    pub fn css_to_inline(&mut self) {
        let band_start = self.css_band_start();
        for attr in &mut self.0[band_start..] {
            attr.src = AttrSource::InlineStyle;
            attr.stale = false;
        }
    }

    fn css_band_start(&self) -> usize {
        self.0
            .iter()
            .rposition(|a| a.src != AttrSource::Css)
            .map_or(0, |i| i + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.0.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Attr> {
        self.0.iter_mut()
    }

    /// Attributes of one source, in list order
    pub fn from_source(&self, src: AttrSource) -> impl Iterator<Item = &Attr> {
        self.0.iter().filter(move |a| a.src == src)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
