//! Style Parsing
//!
//! Turns `name`/`value` strings from XML attributes, `style=""` strings and
//! stylesheet declarations into typed [`Attr`]s.

use fsvg_css::{Declarations, Stylesheet};

use crate::attributes::{Attr, AttrSource, AttrValue, StdAttr};
use crate::node::DisplayMode;
use crate::values::{
    self, parse_color, parse_enum, parse_length, parse_number, parse_numbers_list, Color, LengthUnit,
    CURRENT_COLOR, DEFAULT_DPI, FONT_SIZE_KEYWORDS, INVALID_ENUM,
};

/// Extract `#id` from `url(#id)`, tolerating quotes and whitespace
pub fn id_from_paint_url(value: &str) -> String {
    let rest = value.get(3..).unwrap_or("");
    let Some(start) = rest.find('#') else {
        return String::new();
    };
    rest[start..]
        .trim_end_matches(|c: char| !(c.is_ascii_alphanumeric() || "-_:.".contains(c)))
        .to_string()
}

fn parse_paint(name: &str, value: &str, fallback: Color, src: AttrSource) -> Attr {
    if value.starts_with("url") {
        Attr::string(name, &id_from_paint_url(value), src)
    } else if value == "currentColor" {
        Attr::int(name, CURRENT_COLOR, src)
    } else {
        Attr::color(name, parse_color(value).unwrap_or(fallback), src)
    }
}

fn parse_font_size(value: &str) -> f32 {
    if let Some(len) = parse_length(value) {
        return len.to_px(DEFAULT_DPI);
    }
    FONT_SIZE_KEYWORDS
        .iter()
        .find(|(name, _)| *name == value)
        .map_or(0.0, |(_, size)| *size)
}

fn opacity(value: &str) -> f32 {
    parse_number(value).unwrap_or(1.0).clamp(0.0, 1.0)
}

fn float_or_zero(value: &str) -> f32 {
    parse_number(value).unwrap_or(0.0)
}

fn enum_or(value: &str, table: values::EnumTable, dflt: i32) -> i32 {
    parse_enum(value, table).unwrap_or(dflt)
}

/// Build a typed attribute. Empty names and `inherit` values yield `None`.
pub fn process_attribute(src: AttrSource, name: &str, value: &str) -> Option<Attr> {
    if name.is_empty() || value == "inherit" {
        return None;
    }
    let std = StdAttr::from_name(name);
    let attr = match std {
        StdAttr::Unknown => Attr::string(name, value, src),
        StdAttr::Color => Attr::color(name, parse_color(value).unwrap_or(Color::BLACK), src),
        StdAttr::Fill | StdAttr::StopColor => parse_paint(name, value, Color::BLACK, src),
        StdAttr::Stroke => parse_paint(name, value, Color::NONE, src),
        StdAttr::CompOp => Attr::int(name, enum_or(value, values::COMP_OP, INVALID_ENUM), src),
        StdAttr::Display => {
            let mode = if value == "none" { DisplayMode::None } else { DisplayMode::Block };
            Attr::int(name, mode as i32, src)
        }
        StdAttr::FillRule => Attr::int(name, enum_or(value, values::FILL_RULE, INVALID_ENUM), src),
        StdAttr::FillOpacity | StdAttr::Opacity | StdAttr::StopOpacity | StdAttr::StrokeOpacity => {
            Attr::float(name, opacity(value), src)
        }
        StdAttr::FontFamily => Attr::string(name, value, src),
        StdAttr::FontSize => Attr::float(name, parse_font_size(value), src),
        StdAttr::FontStyle => Attr::int(name, enum_or(value, values::FONT_STYLE, INVALID_ENUM), src),
        StdAttr::FontVariant => Attr::int(name, enum_or(value, values::FONT_VARIANT, INVALID_ENUM), src),
        StdAttr::FontWeight => match parse_number(value) {
            Some(weight) => Attr::int(name, weight as i32, src),
            None => Attr::int(name, enum_or(value, values::FONT_WEIGHT, INVALID_ENUM), src),
        },
        StdAttr::Offset => {
            let offset = match parse_length(value) {
                Some(len) if len.unit == LengthUnit::Percent => len.value / 100.0,
                Some(len) => len.value,
                None => 0.0,
            };
            Attr::float(name, offset.clamp(0.0, 1.0), src)
        }
        StdAttr::ShapeRendering => Attr::int(name, enum_or(value, values::SHAPE_RENDERING, 0), src),
        StdAttr::StrokeDasharray => {
            let dashes = parse_numbers_list(value);
            Attr::string(name, &values::format_numbers(&dashes, " ", 6), src)
        }
        StdAttr::StrokeDashoffset
        | StdAttr::StrokeMiterlimit
        | StdAttr::StrokeWidth
        | StdAttr::LetterSpacing => Attr::float(name, float_or_zero(value), src),
        StdAttr::StrokeLinecap => Attr::int(name, enum_or(value, values::LINE_CAP, INVALID_ENUM), src),
        StdAttr::StrokeLinejoin => Attr::int(name, enum_or(value, values::LINE_JOIN, INVALID_ENUM), src),
        StdAttr::TextAnchor => Attr::int(name, enum_or(value, values::TEXT_ANCHOR, INVALID_ENUM), src),
        StdAttr::VectorEffect => Attr::int(name, enum_or(value, values::VECTOR_EFFECT, INVALID_ENUM), src),
        StdAttr::Visibility => Attr::int(name, enum_or(value, values::VISIBILITY, 1), src),
    };
    Some(attr)
}

/// Keyword table used to read and write an enum-valued attribute
pub fn enum_table(std: StdAttr) -> Option<values::EnumTable> {
    match std {
        StdAttr::CompOp => Some(values::COMP_OP),
        StdAttr::Display => Some(values::DISPLAY),
        StdAttr::FillRule => Some(values::FILL_RULE),
        StdAttr::FontStyle => Some(values::FONT_STYLE),
        StdAttr::FontVariant => Some(values::FONT_VARIANT),
        StdAttr::FontWeight => Some(values::FONT_WEIGHT),
        StdAttr::ShapeRendering => Some(values::SHAPE_RENDERING),
        StdAttr::StrokeLinecap => Some(values::LINE_CAP),
        StdAttr::StrokeLinejoin => Some(values::LINE_JOIN),
        StdAttr::TextAnchor => Some(values::TEXT_ANCHOR),
        StdAttr::VectorEffect => Some(values::VECTOR_EFFECT),
        StdAttr::Visibility => Some(values::VISIBILITY),
        _ => None,
    }
}

/// Attribute value as it would appear in markup
pub fn format_attr_value(attr: &Attr, precision: usize) -> String {
    match &attr.value {
        AttrValue::Int(v) => {
            let is_paint = matches!(attr.std, StdAttr::Fill | StdAttr::Stroke | StdAttr::StopColor);
            if is_paint && *v == CURRENT_COLOR {
                return "currentColor".to_string();
            }
            enum_table(attr.std)
                .and_then(|table| values::enum_to_str(*v, table))
                .map_or_else(|| v.to_string(), str::to_string)
        }
        AttrValue::Color(c) => values::format_color(*c, precision),
        AttrValue::Float(f) => values::format_number(*f, precision),
        AttrValue::Str(s) if matches!(attr.std, StdAttr::Fill | StdAttr::Stroke | StdAttr::StopColor) => {
            format!("url({})", s)
        }
        AttrValue::Str(s) if attr.variable => format!("var({})", s),
        AttrValue::Str(s) => s.clone(),
    }
}

/// Split a `style=""` value into inline-style attributes
pub fn process_style_string(style: &str) -> Vec<Attr> {
    let mut attrs = Vec::new();
    for decl in style.split(';') {
        let parts: Vec<&str> = decl.split(':').collect();
        if let [name, value] = parts.as_slice() {
            if let Some(attr) = process_attribute(AttrSource::InlineStyle, name.trim(), value.trim()) {
                attrs.push(attr);
            }
        } else if !decl.trim().is_empty() {
            tracing::debug!("Invalid declaration in style attribute: '{}'", decl.trim());
        }
    }
    attrs
}

/// Name of the variable in `var(name)`, if `value` has that form
fn var_reference(value: &str) -> Option<&str> {
    let inner = value.strip_prefix("var")?.trim_start().strip_prefix('(')?;
    let inner = inner.strip_suffix(')')?;
    Some(inner.trim())
}

/// Declarations of one stylesheet rule, pre-parsed into CSS-sourced attributes
#[derive(Debug, Clone, Default)]
pub struct SvgDecls {
    pub attrs: Vec<Attr>,
}

impl Declarations for SvgDecls {
    fn parse_decl(&mut self, name: &str, value: &str) {
        if let Some(var_name) = var_reference(value) {
            self.attrs.push(Attr::variable(name, var_name));
        } else if let Some(attr) = process_attribute(AttrSource::Css, name, value) {
            self.attrs.push(attr);
        }
    }
}

/// Stylesheet whose rules carry typed SVG attributes
pub type SvgStylesheet = Stylesheet<SvgDecls>;

/// Parse and sort a stylesheet ready for installation on a document
pub fn parse_svg_stylesheet(css: &str) -> SvgStylesheet {
    let mut sheet = SvgStylesheet::new();
    sheet.parse(css);
    sheet.sort_rules();
    sheet
}
