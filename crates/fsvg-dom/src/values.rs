//! Attribute Values
//!
//! Parsers for the scalar value syntaxes used by SVG presentation
//! attributes: numbers, number lists, lengths, colors, transform lists and
//! keyword enums. Parsers return `None` on malformed input; callers pick
//! the fallback.

use tiny_skia::Transform;

/// RGBA color, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Paint value `none`
    pub const NONE: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from `0xRRGGBB`
    pub const fn from_rgb(rgb: u32) -> Self {
        Self::rgba((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 255)
    }

    /// Color from `0xAARRGGBB`
    pub const fn from_argb(argb: u32) -> Self {
        Self::rgba((argb >> 16) as u8, (argb >> 8) as u8, argb as u8, (argb >> 24) as u8)
    }

    pub fn is_none(&self) -> bool {
        *self == Color::NONE
    }

    pub fn alpha_f(&self) -> f32 {
        self.a as f32 / 255.0
    }

    pub fn with_alpha_f(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Length units kept after parsing; absolute units are folded into `Pt`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthUnit {
    Px,
    Pt,
    Em,
    Ex,
    Percent,
}

impl LengthUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            LengthUnit::Px => "px",
            LengthUnit::Pt => "pt",
            LengthUnit::Em => "em",
            LengthUnit::Ex => "ex",
            LengthUnit::Percent => "%",
        }
    }
}

/// Number with unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f32,
    pub unit: LengthUnit,
}

impl Length {
    pub const fn new(value: f32, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    pub const fn px(value: f32) -> Self {
        Self::new(value, LengthUnit::Px)
    }

    pub const fn percent(value: f32) -> Self {
        Self::new(value, LengthUnit::Percent)
    }

    pub fn is_percent(&self) -> bool {
        self.unit == LengthUnit::Percent
    }

    /// Pixel value; only `pt` is converted, relative units pass through
    pub fn to_px(&self, dpi: f32) -> f32 {
        match self.unit {
            LengthUnit::Pt => self.value * dpi / 72.0,
            _ => self.value,
        }
    }
}

/// Default resolution for `pt` conversion
pub const DEFAULT_DPI: f32 = 96.0;

/// Parse a leading number, returning it and the number of bytes consumed
/// (including leading whitespace)
pub fn parse_number_prefix(s: &str) -> Option<(f32, usize)> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let start = i;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let mut digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }
    // exponent only if followed by digits, so "1em" stays a length
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    s[start..i].parse::<f32>().ok().map(|v| (v, i))
}

/// Parse a number, ignoring trailing text
pub fn parse_number(s: &str) -> Option<f32> {
    parse_number_prefix(s).map(|(v, _)| v)
}

/// Parse numbers separated by whitespace and/or commas, stopping at the
/// first thing that is not a number
pub fn parse_numbers_list(s: &str) -> Vec<f32> {
    let mut out = Vec::new();
    let mut rest = s;
    loop {
        rest = rest.trim_start();
        let Some((value, used)) = parse_number_prefix(rest) else { break };
        out.push(value);
        rest = rest[used..].trim_start();
        if let Some(r) = rest.strip_prefix(',') {
            rest = r;
        }
    }
    out
}

/// Parse a length such as `12`, `1.5em`, `50%` or `2cm`
pub fn parse_length(s: &str) -> Option<Length> {
    let (value, used) = parse_number_prefix(s)?;
    let units = s[used..].trim_start();
    let length = if units.is_empty() || units.starts_with("px") {
        Length::px(value)
    } else if units.starts_with('%') {
        Length::percent(value)
    } else if units.starts_with("pt") {
        Length::new(value, LengthUnit::Pt)
    } else if units.starts_with("in") {
        Length::new(value * 72.0, LengthUnit::Pt)
    } else if units.starts_with("mm") {
        Length::new(value * 72.0 / 25.4, LengthUnit::Pt)
    } else if units.starts_with("cm") {
        Length::new(value * 72.0 / 2.54, LengthUnit::Pt)
    } else if units.starts_with("pc") {
        Length::new(value * 12.0, LengthUnit::Pt)
    } else if units.starts_with("em") {
        Length::new(value, LengthUnit::Em)
    } else if units.starts_with("ex") {
        Length::new(value, LengthUnit::Ex)
    } else {
        Length::px(value)
    };
    Some(length)
}

/// Parse a color. `inherit` and malformed input yield `None`.
pub fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(hex) = s.strip_prefix('#') {
        if !matches!(hex.len(), 3 | 6 | 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let num = u32::from_str_radix(hex, 16).ok()?;
        return Some(match hex.len() {
            8 => Color::from_argb(num),
            6 => Color::from_rgb(num),
            _ => {
                let (r, g, b) = ((num >> 8) & 0xF, (num >> 4) & 0xF, num & 0xF);
                Color::rgba((r * 17) as u8, (g * 17) as u8, (b * 17) as u8, 255)
            }
        });
    }

    let lower = s.to_ascii_lowercase();
    if let Some(args) = lower.strip_prefix("rgba(").or_else(|| lower.strip_prefix("rgb(")) {
        return parse_rgb_args(args);
    }
    match lower.as_str() {
        "none" => Some(Color::NONE),
        "inherit" => None,
        name => NAMED_COLORS
            .binary_search_by(|(n, _)| n.cmp(&name))
            .ok()
            .map(|i| Color::from_rgb(NAMED_COLORS[i].1)),
    }
}

/// `r, g, b[, a])` with optional `%` components and alpha in 0..1
fn parse_rgb_args(args: &str) -> Option<Color> {
    let mut rest = args;
    let mut component = |required: bool| -> Option<f32> {
        let parsed = parse_number_prefix(rest);
        let value = match parsed {
            Some((v, used)) => {
                rest = rest[used..].trim_start();
                v
            }
            None if required => return None,
            None => return Some(f32::NAN),
        };
        let value = match rest.strip_prefix('%') {
            Some(r) => {
                rest = r.trim_start();
                value * 2.55
            }
            None => value,
        };
        if let Some(r) = rest.strip_prefix(',') {
            rest = r.trim_start();
        }
        Some(value)
    };
    let r = component(false).filter(|v| !v.is_nan()).unwrap_or(0.0);
    let g = component(false).filter(|v| !v.is_nan()).unwrap_or(0.0);
    let b = component(true)?;
    let a = component(false).filter(|v| !v.is_nan()).unwrap_or(1.0);
    let channel = |v: f32| v.clamp(0.0, 255.0) as u8;
    Some(Color::rgba(channel(r), channel(g), channel(b), channel(a * 255.0)))
}

/// Parse an SVG transform list
pub fn parse_transform(s: &str) -> Transform {
    let mut matrix = Transform::identity();
    let mut rest = s;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == ',');
        let name_len = rest.bytes().take_while(|b| b.is_ascii_alphabetic()).count();
        if name_len == 0 {
            break;
        }
        let name = &rest[..name_len];
        let after = rest[name_len..].trim_start();
        let Some(body) = after.strip_prefix('(') else { break };
        let Some(close) = body.find(')') else { break };
        let args = parse_numbers_list(&body[..close]);
        rest = &body[close + 1..];

        let step = match (name, args.as_slice()) {
            ("matrix", [a, b, c, d, e, f]) => Transform::from_row(*a, *b, *c, *d, *e, *f),
            ("translate", [tx]) => Transform::from_translate(*tx, 0.0),
            ("translate", [tx, ty]) => Transform::from_translate(*tx, *ty),
            ("rotate", [angle]) => Transform::from_rotate(*angle),
            ("rotate", [angle, cx, cy]) => Transform::from_rotate_at(*angle, *cx, *cy),
            ("scale", [s]) => Transform::from_scale(*s, *s),
            ("scale", [sx, sy]) => Transform::from_scale(*sx, *sy),
            ("skewX", [angle]) => Transform::from_skew(angle.to_radians().tan(), 0.0),
            ("skewY", [angle]) => Transform::from_skew(0.0, angle.to_radians().tan()),
            _ => {
                tracing::debug!("Unsupported transform '{}' with {} arguments", name, args.len());
                break;
            }
        };
        matrix = matrix.pre_concat(step);
    }
    matrix
}

/// Keyword table mapping tokens to integer attribute values
pub type EnumTable = &'static [(&'static str, i32)];

pub fn parse_enum(value: &str, table: EnumTable) -> Option<i32> {
    table.iter().find(|(name, _)| *name == value).map(|(_, v)| *v)
}

pub fn enum_to_str(value: i32, table: EnumTable) -> Option<&'static str> {
    table.iter().find(|(_, v)| *v == value).map(|(name, _)| *name)
}

/// Stored for enum attributes whose keyword was not recognised
pub const INVALID_ENUM: i32 = i32::MIN;

/// `fill`/`stroke`/`stop-color` value `currentColor`
pub const CURRENT_COLOR: i32 = 1;

pub const FILL_RULE: EnumTable = &[("nonzero", 0), ("evenodd", 1)];
pub const VECTOR_EFFECT: EnumTable = &[("none", 0), ("non-scaling-stroke", 1)];
pub const FONT_STYLE: EnumTable = &[("normal", 0), ("italic", 1), ("oblique", 2)];
pub const FONT_VARIANT: EnumTable = &[("normal", 0), ("small-caps", 1)];
pub const FONT_WEIGHT: EnumTable = &[("normal", 400), ("bold", 700), ("bolder", 1), ("lighter", -1)];
pub const LINE_CAP: EnumTable = &[("butt", 0), ("round", 1), ("square", 2)];
pub const LINE_JOIN: EnumTable = &[("miter", 0), ("round", 1), ("bevel", 2)];
pub const TEXT_ANCHOR: EnumTable = &[("start", 0), ("middle", 1), ("end", 2)];
pub const SHAPE_RENDERING: EnumTable = &[("auto", 0), ("crispEdges", 1), ("optimizeSpeed", 1)];
pub const VISIBILITY: EnumTable = &[("hidden", 0), ("collapse", 0), ("visible", 1)];
pub const DISPLAY: EnumTable = &[("none", 0), ("block", 1)];
pub const COMP_OP: EnumTable = &[
    ("clear", 0),
    ("src", 1),
    ("dst", 2),
    ("src-over", 3),
    ("dst-over", 4),
    ("src-in", 5),
    ("dst-in", 6),
    ("src-out", 7),
    ("dst-out", 8),
    ("src-atop", 9),
    ("dst-atop", 10),
    ("xor", 11),
    ("plus", 12),
    ("multiply", 13),
    ("screen", 14),
    ("overlay", 15),
    ("darken", 16),
    ("lighten", 17),
    ("color-dodge", 18),
    ("color-burn", 19),
    ("hard-light", 20),
    ("soft-light", 21),
    ("difference", 22),
    ("exclusion", 23),
];

/// `font-size` keywords and their sizes in px
pub const FONT_SIZE_KEYWORDS: &[(&str, f32)] = &[
    ("xx-small", 6.9),
    ("x-small", 8.3),
    ("small", 10.0),
    ("medium", 12.0),
    ("large", 14.4),
    ("x-large", 17.3),
    ("xx-large", 20.7),
];

/// Format a float with at most `precision` decimals, trailing zeros trimmed
pub fn format_number(value: f32, precision: usize) -> String {
    let mut s = format!("{:.*}", precision, value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/// Format numbers joined by `sep`
pub fn format_numbers(values: &[f32], sep: &str, precision: usize) -> String {
    values
        .iter()
        .map(|v| format_number(*v, precision))
        .collect::<Vec<_>>()
        .join(sep)
}

/// CSS/SVG serialization of a color: `none`, `#RRGGBB` or `rgba(...)`
pub fn format_color(color: Color, precision: usize) -> String {
    if color.is_none() {
        "none".to_string()
    } else if color.a < 255 {
        format!(
            "rgba({},{},{},{})",
            color.r,
            color.g,
            color.b,
            format_number(color.alpha_f(), precision)
        )
    } else {
        format!("#{:02X}{:02X}{:02X}", color.r, color.g, color.b)
    }
}

/// Serialization of a transform: empty for identity, `translate(x,y)` for
/// pure translations, `matrix(...)` otherwise
pub fn format_transform(ts: &Transform, precision: usize) -> String {
    let near = |a: f32, b: f32| (a - b).abs() < 1e-4;
    let translate_only = near(ts.sx, 1.0) && near(ts.sy, 1.0) && near(ts.kx, 0.0) && near(ts.ky, 0.0);
    if translate_only && near(ts.tx, 0.0) && near(ts.ty, 0.0) {
        String::new()
    } else if translate_only {
        format!("translate({},{})", format_number(ts.tx, precision), format_number(ts.ty, precision))
    } else {
        format!(
            "matrix({})",
            format_numbers(&[ts.sx, ts.ky, ts.kx, ts.sy, ts.tx, ts.ty], " ", precision)
        )
    }
}

/// Named colors, sorted for binary search; includes the `grey` alias
pub const NAMED_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xF0F8FF), ("antiquewhite", 0xFAEBD7), ("aqua", 0x00FFFF), ("aquamarine", 0x7FFFD4),
    ("azure", 0xF0FFFF), ("beige", 0xF5F5DC), ("bisque", 0xFFE4C4), ("black", 0x000000),
    ("blanchedalmond", 0xFFEBCD), ("blue", 0x0000FF), ("blueviolet", 0x8A2BE2), ("brown", 0xA52A2A),
    ("burlywood", 0xDEB887), ("cadetblue", 0x5F9EA0), ("chartreuse", 0x7FFF00), ("chocolate", 0xD2691E),
    ("coral", 0xFF7F50), ("cornflowerblue", 0x6495ED), ("cornsilk", 0xFFF8DC), ("crimson", 0xDC143C),
    ("cyan", 0x00FFFF), ("darkblue", 0x00008B), ("darkcyan", 0x008B8B), ("darkgoldenrod", 0xB8860B),
    ("darkgray", 0xA9A9A9), ("darkgreen", 0x006400), ("darkgrey", 0xA9A9A9), ("darkkhaki", 0xBDB76B),
    ("darkmagenta", 0x8B008B), ("darkolivegreen", 0x556B2F), ("darkorange", 0xFF8C00), ("darkorchid", 0x9932CC),
    ("darkred", 0x8B0000), ("darksalmon", 0xE9967A), ("darkseagreen", 0x8FBC8F), ("darkslateblue", 0x483D8B),
    ("darkslategray", 0x2F4F4F), ("darkslategrey", 0x2F4F4F), ("darkturquoise", 0x00CED1),
    ("darkviolet", 0x9400D3), ("deeppink", 0xFF1493), ("deepskyblue", 0x00BFFF), ("dimgray", 0x696969),
    ("dimgrey", 0x696969), ("dodgerblue", 0x1E90FF), ("firebrick", 0xB22222), ("floralwhite", 0xFFFAF0),
    ("forestgreen", 0x228B22), ("fuchsia", 0xFF00FF), ("gainsboro", 0xDCDCDC), ("ghostwhite", 0xF8F8FF),
    ("gold", 0xFFD700), ("goldenrod", 0xDAA520), ("gray", 0x808080), ("green", 0x008000),
    ("greenyellow", 0xADFF2F), ("grey", 0x808080), ("honeydew", 0xF0FFF0), ("hotpink", 0xFF69B4),
    ("indianred", 0xCD5C5C), ("indigo", 0x4B0082), ("ivory", 0xFFFFF0), ("khaki", 0xF0E68C),
    ("lavender", 0xE6E6FA), ("lavenderblush", 0xFFF0F5), ("lawngreen", 0x7CFC00), ("lemonchiffon", 0xFFFACD),
    ("lightblue", 0xADD8E6), ("lightcoral", 0xF08080), ("lightcyan", 0xE0FFFF),
    ("lightgoldenrodyellow", 0xFAFAD2), ("lightgray", 0xD3D3D3), ("lightgreen", 0x90EE90),
    ("lightgrey", 0xD3D3D3), ("lightpink", 0xFFB6C1), ("lightsalmon", 0xFFA07A), ("lightseagreen", 0x20B2AA),
    ("lightskyblue", 0x87CEFA), ("lightslategray", 0x778899), ("lightslategrey", 0x778899),
    ("lightsteelblue", 0xB0C4DE), ("lightyellow", 0xFFFFE0), ("lime", 0x00FF00), ("limegreen", 0x32CD32),
    ("linen", 0xFAF0E6), ("magenta", 0xFF00FF), ("maroon", 0x800000), ("mediumaquamarine", 0x66CDAA),
    ("mediumblue", 0x0000CD), ("mediumorchid", 0xBA55D3), ("mediumpurple", 0x9370DB),
    ("mediumseagreen", 0x3CB371), ("mediumslateblue", 0x7B68EE), ("mediumspringgreen", 0x00FA9A),
    ("mediumturquoise", 0x48D1CC), ("mediumvioletred", 0xC71585), ("midnightblue", 0x191970),
    ("mintcream", 0xF5FFFA), ("mistyrose", 0xFFE4E1), ("moccasin", 0xFFE4B5), ("navajowhite", 0xFFDEAD),
    ("navy", 0x000080), ("oldlace", 0xFDF5E6), ("olive", 0x808000), ("olivedrab", 0x6B8E23),
    ("orange", 0xFFA500), ("orangered", 0xFF4500), ("orchid", 0xDA70D6), ("palegoldenrod", 0xEEE8AA),
    ("palegreen", 0x98FB98), ("paleturquoise", 0xAFEEEE), ("palevioletred", 0xDB7093),
    ("papayawhip", 0xFFEFD5), ("peachpuff", 0xFFDAB9), ("peru", 0xCD853F), ("pink", 0xFFC0CB),
    ("plum", 0xDDA0DD), ("powderblue", 0xB0E0E6), ("purple", 0x800080), ("rebeccapurple", 0x663399),
    ("red", 0xFF0000), ("rosybrown", 0xBC8F8F), ("royalblue", 0x4169E1), ("saddlebrown", 0x8B4513),
    ("salmon", 0xFA8072), ("sandybrown", 0xF4A460), ("seagreen", 0x2E8B57), ("seashell", 0xFFF5EE),
    ("sienna", 0xA0522D), ("silver", 0xC0C0C0), ("skyblue", 0x87CEEB), ("slateblue", 0x6A5ACD),
    ("slategray", 0x708090), ("slategrey", 0x708090), ("snow", 0xFFFAFA), ("springgreen", 0x00FF7F),
    ("steelblue", 0x4682B4), ("tan", 0xD2B48C), ("teal", 0x008080), ("thistle", 0xD8BFD8),
    ("tomato", 0xFF6347), ("turquoise", 0x40E0D0), ("violet", 0xEE82EE), ("wheat", 0xF5DEB3),
    ("white", 0xFFFFFF), ("whitesmoke", 0xF5F5F5), ("yellow", 0xFFFF00), ("yellowgreen", 0x9ACD32),
];
