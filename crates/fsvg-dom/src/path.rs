//! Path Geometry
//!
//! Shapes are stored as `tiny_skia::Path`. This module builds them from
//! SVG path data and from the basic shape elements.

use tiny_skia::{Path, PathBuilder, PathSegment, Point};

use crate::geometry::Rect;
use crate::values::{format_number, parse_number_prefix};

/// Element a path node was created from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathShape {
    Path,
    Circle,
    Ellipse,
    Line,
    Polygon,
    Polyline,
}

impl PathShape {
    pub fn tag_name(&self) -> &'static str {
        match self {
            PathShape::Path => "path",
            PathShape::Circle => "circle",
            PathShape::Ellipse => "ellipse",
            PathShape::Line => "line",
            PathShape::Polygon => "polygon",
            PathShape::Polyline => "polyline",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathData {
    /// `None` for empty or degenerate geometry
    pub path: Option<Path>,
    pub shape: PathShape,
}

impl PathData {
    pub fn new(shape: PathShape, path: Option<Path>) -> Self {
        Self { path, shape }
    }
}

/// `<rect>` geometry; the path is rebuilt whenever the rect changes
#[derive(Debug, Clone)]
pub struct RectData {
    pub rect: Rect,
    pub rx: f32,
    pub ry: f32,
    pub path: Option<Path>,
}

impl RectData {
    pub fn new(rect: Rect, rx: f32, ry: f32) -> Self {
        let path = rect_path(&rect, rx, ry);
        Self { rect, rx, ry, path }
    }
}

/// Rounded or plain rectangle; zero width or height disables rendering
pub fn rect_path(rect: &Rect, rx: f32, ry: f32) -> Option<Path> {
    if !rect.is_valid() || rect.width() <= 0.0 || rect.height() <= 0.0 {
        return None;
    }
    if rx <= 0.0 && ry <= 0.0 {
        return rect.to_skia().map(PathBuilder::from_rect);
    }
    let (x, y, w, h) = (rect.left, rect.top, rect.width(), rect.height());
    let rx = rx.max(0.0).min(w / 2.0);
    let ry = ry.max(0.0).min(h / 2.0);
    // cubic approximation of a quarter ellipse
    let kx = rx * 0.552_284_8;
    let ky = ry * 0.552_284_8;

    let mut pb = PathBuilder::new();
    pb.move_to(x + rx, y);
    pb.line_to(x + w - rx, y);
    pb.cubic_to(x + w - rx + kx, y, x + w, y + ry - ky, x + w, y + ry);
    pb.line_to(x + w, y + h - ry);
    pb.cubic_to(x + w, y + h - ry + ky, x + w - rx + kx, y + h, x + w - rx, y + h);
    pb.line_to(x + rx, y + h);
    pb.cubic_to(x + rx - kx, y + h, x, y + h - ry + ky, x, y + h - ry);
    pb.line_to(x, y + ry);
    pb.cubic_to(x, y + ry - ky, x + rx - kx, y, x + rx, y);
    pb.close();
    pb.finish()
}

pub fn ellipse_path(cx: f32, cy: f32, rx: f32, ry: f32) -> Option<Path> {
    if rx <= 0.0 || ry <= 0.0 {
        return None;
    }
    let oval = tiny_skia::Rect::from_ltrb(cx - rx, cy - ry, cx + rx, cy + ry)?;
    PathBuilder::from_oval(oval)
}

pub fn circle_path(cx: f32, cy: f32, r: f32) -> Option<Path> {
    ellipse_path(cx, cy, r, r)
}

pub fn line_path(x1: f32, y1: f32, x2: f32, y2: f32) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(x1, y1);
    pb.line_to(x2, y2);
    pb.finish()
}

/// Polyline through `points` (x, y pairs); closed for polygons
pub fn poly_path(points: &[f32], close: bool) -> Option<Path> {
    let mut pairs = points.chunks_exact(2);
    let first = pairs.next()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first[0], first[1]);
    for p in pairs {
        pb.line_to(p[0], p[1]);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

struct PathLexer<'a> {
    s: &'a str,
    pos: usize,
}

impl<'a> PathLexer<'a> {
    fn skip_separators(&mut self) {
        let bytes = self.s.as_bytes();
        while self.pos < bytes.len() && (bytes[self.pos].is_ascii_whitespace() || bytes[self.pos] == b',') {
            self.pos += 1;
        }
    }

    fn command(&mut self) -> Option<u8> {
        self.skip_separators();
        let c = *self.s.as_bytes().get(self.pos)?;
        if c.is_ascii_alphabetic() {
            self.pos += 1;
            Some(c)
        } else {
            None
        }
    }

    fn at_number(&mut self) -> bool {
        self.skip_separators();
        self.s
            .as_bytes()
            .get(self.pos)
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, b'-' | b'+' | b'.'))
    }

    fn number(&mut self) -> Option<f32> {
        self.skip_separators();
        let (v, used) = parse_number_prefix(&self.s[self.pos..])?;
        self.pos += used;
        Some(v)
    }

    /// Arc flags may be written without separators, e.g. `a1 1 0 013 4`
    fn flag(&mut self) -> Option<bool> {
        self.skip_separators();
        let c = *self.s.as_bytes().get(self.pos)?;
        match c {
            b'0' | b'1' => {
                self.pos += 1;
                Some(c == b'1')
            }
            _ => None,
        }
    }
}

/// Parse SVG path data. Parsing stops at the first malformed segment and
/// keeps what was built so far. Elliptical arcs become straight segments
/// to their end point.
pub fn parse_path_data(d: &str) -> Option<Path> {
    let mut lex = PathLexer { s: d, pos: 0 };
    let mut pb = PathBuilder::new();
    let (mut cx, mut cy) = (0.0f32, 0.0f32);
    let (mut sx, mut sy) = (0.0f32, 0.0f32);
    // reflected control point for S/T
    let mut last_ctrl: Option<(u8, f32, f32)> = None;
    let mut cmd = match lex.command() {
        Some(c @ (b'M' | b'm')) => c,
        _ => return None,
    };

    'segments: loop {
        let rel = cmd.is_ascii_lowercase();
        let (ox, oy) = if rel { (cx, cy) } else { (0.0, 0.0) };
        let mut ctrl = None;
        match cmd.to_ascii_uppercase() {
            b'M' => {
                let (Some(x), Some(y)) = (lex.number(), lex.number()) else { break };
                cx = ox + x;
                cy = oy + y;
                sx = cx;
                sy = cy;
                pb.move_to(cx, cy);
                // further pairs are implicit line-tos
                cmd = if rel { b'l' } else { b'L' };
                if !lex.at_number() {
                    match lex.command() {
                        Some(c) => cmd = c,
                        None => break,
                    }
                }
                last_ctrl = None;
                continue 'segments;
            }
            b'L' => {
                let (Some(x), Some(y)) = (lex.number(), lex.number()) else { break };
                cx = ox + x;
                cy = oy + y;
                pb.line_to(cx, cy);
            }
            b'H' => {
                let Some(x) = lex.number() else { break };
                cx = ox + x;
                pb.line_to(cx, cy);
            }
            b'V' => {
                let Some(y) = lex.number() else { break };
                cy = oy + y;
                pb.line_to(cx, cy);
            }
            b'C' => {
                let mut v = [0.0f32; 6];
                for slot in &mut v {
                    let Some(n) = lex.number() else { break 'segments };
                    *slot = n;
                }
                let (x1, y1, x2, y2) = (ox + v[0], oy + v[1], ox + v[2], oy + v[3]);
                cx = ox + v[4];
                cy = oy + v[5];
                pb.cubic_to(x1, y1, x2, y2, cx, cy);
                ctrl = Some((b'C', x2, y2));
            }
            b'S' => {
                let mut v = [0.0f32; 4];
                for slot in &mut v {
                    let Some(n) = lex.number() else { break 'segments };
                    *slot = n;
                }
                let (x1, y1) = match last_ctrl {
                    Some((b'C', px, py)) => (2.0 * cx - px, 2.0 * cy - py),
                    _ => (cx, cy),
                };
                let (x2, y2) = (ox + v[0], oy + v[1]);
                cx = ox + v[2];
                cy = oy + v[3];
                pb.cubic_to(x1, y1, x2, y2, cx, cy);
                ctrl = Some((b'C', x2, y2));
            }
            b'Q' => {
                let mut v = [0.0f32; 4];
                for slot in &mut v {
                    let Some(n) = lex.number() else { break 'segments };
                    *slot = n;
                }
                let (x1, y1) = (ox + v[0], oy + v[1]);
                cx = ox + v[2];
                cy = oy + v[3];
                pb.quad_to(x1, y1, cx, cy);
                ctrl = Some((b'Q', x1, y1));
            }
            b'T' => {
                let (Some(x), Some(y)) = (lex.number(), lex.number()) else { break };
                let (x1, y1) = match last_ctrl {
                    Some((b'Q', px, py)) => (2.0 * cx - px, 2.0 * cy - py),
                    _ => (cx, cy),
                };
                cx = ox + x;
                cy = oy + y;
                pb.quad_to(x1, y1, cx, cy);
                ctrl = Some((b'Q', x1, y1));
            }
            b'A' => {
                let (Some(_rx), Some(_ry), Some(_rot)) = (lex.number(), lex.number(), lex.number()) else {
                    break;
                };
                let (Some(_large), Some(_sweep)) = (lex.flag(), lex.flag()) else { break };
                let (Some(x), Some(y)) = (lex.number(), lex.number()) else { break };
                cx = ox + x;
                cy = oy + y;
                pb.line_to(cx, cy);
            }
            b'Z' => {
                pb.close();
                cx = sx;
                cy = sy;
                last_ctrl = None;
                match lex.command() {
                    Some(c) => {
                        cmd = c;
                        continue 'segments;
                    }
                    None => break,
                }
            }
            _ => {
                tracing::debug!("Unknown path command '{}'", cmd as char);
                break;
            }
        }
        last_ctrl = ctrl;
        if !lex.at_number() {
            match lex.command() {
                Some(c) => cmd = c,
                None => break,
            }
        }
    }
    pb.finish()
}

/// Serialize as path data with relative commands after the initial `M`.
/// A command letter is only repeated when it changes.
pub fn format_path_data(path: &Path, precision: usize) -> String {
    let mut out = String::new();
    let mut prev_cmd = 0u8;
    let mut prev = Point::zero();
    let mut start = Point::zero();
    for (i, seg) in path.segments().enumerate() {
        let (cmd, pts) = match seg {
            PathSegment::MoveTo(p) => (b'm', vec![p]),
            PathSegment::LineTo(p) => (b'l', vec![p]),
            PathSegment::QuadTo(p1, p) => (b'q', vec![p1, p]),
            PathSegment::CubicTo(p1, p2, p) => (b'c', vec![p1, p2, p]),
            PathSegment::Close => (b'z', Vec::new()),
        };
        if i > 0 {
            out.push(' ');
        }
        if i == 0 {
            out.push('M');
        } else if cmd != prev_cmd || cmd == b'm' || cmd == b'z' {
            out.push(cmd as char);
        }
        let coords: Vec<String> = pts
            .iter()
            .map(|p| {
                format!(
                    "{} {}",
                    format_number(p.x - prev.x, precision),
                    format_number(p.y - prev.y, precision)
                )
            })
            .collect();
        out.push_str(&coords.join(" "));
        match pts.last() {
            Some(last) => prev = *last,
            None => prev = start,
        }
        if cmd == b'm' {
            start = prev;
        }
        prev_cmd = cmd;
    }
    out
}

/// End points of the move and line segments, flattened to `x y` pairs
pub fn path_points(path: &Path) -> Vec<f32> {
    path.segments()
        .filter_map(|seg| match seg {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => Some([p.x, p.y]),
            _ => None,
        })
        .flatten()
        .collect()
}
