//! CSS Text Parsing
//!
//! Bracket-aware tokenizer, compound/complex selector parsing and the
//! rule-block scanner used by [`Stylesheet::parse`](crate::Stylesheet::parse).
//!
//! All delimiters are ASCII, so byte offsets found here are always valid
//! char boundaries for slicing.

use crate::selectors::{AttrOp, AttributeSelector, Combinator, ElementSelector, Selector};
use crate::{CssError, CssResult};

/// Whitespace set used for trimming selector and declaration text
const WHITESPACE: &[u8] = b" \n\r\t";

/// Markers that start a constraint inside a compound selector
const COMPOUND_MARKERS: &[u8] = b".#[:";

/// Split `s` on any byte in `delims` or `delims_preserve`.
///
/// Delimiters from `delims_preserve` are emitted as their own one-byte
/// tokens. A byte from `quote` opens a protected region: `(`, `[` and `{`
/// run to their balanced closing bracket, anything else runs to the next
/// occurrence of the same byte. Empty tokens are dropped.
pub fn split_string(s: &str, delims: &str, delims_preserve: &str, quote: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    if s.is_empty() || (delims.is_empty() && delims_preserve.is_empty()) {
        return tokens;
    }

    let bytes = s.as_bytes();
    let len = bytes.len();
    let (delims, preserve, quote) = (delims.as_bytes(), delims_preserve.as_bytes(), quote.as_bytes());
    let is_delim = |b: u8| delims.contains(&b) || preserve.contains(&b) || quote.contains(&b);
    let find_delim = |from: usize| (from..len).find(|&i| is_delim(bytes[i]));

    let mut start = 0;
    let mut end = find_delim(0);
    loop {
        // skip over quoted / bracketed regions
        while let Some(e) = end {
            let b = bytes[e];
            if !quote.contains(&b) {
                break;
            }
            let close = match b {
                b'(' => find_close_bracket(bytes, e, b'(', b')'),
                b'[' => find_close_bracket(bytes, e, b'[', b']'),
                b'{' => find_close_bracket(bytes, e, b'{', b'}'),
                _ => (e + 1..len).find(|&i| bytes[i] == b),
            };
            end = close.and_then(|c| find_delim(c + 1));
        }

        let token = match end {
            Some(e) => &s[start..e],
            None => &s[start..],
        };
        if !token.is_empty() {
            tokens.push(token.to_string());
        }

        let Some(e) = end else { break };
        if preserve.contains(&bytes[e]) {
            tokens.push(s[e..e + 1].to_string());
        }
        start = e + 1;
        if start == len {
            break;
        }
        end = find_delim(start);
    }
    tokens
}

/// Index of the bracket closing the one at `off`
fn find_close_bracket(bytes: &[u8], off: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate().skip(off) {
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn find_first_of(s: &str, set: &[u8], from: usize) -> Option<usize> {
    s.as_bytes()
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, b)| set.contains(b))
        .map(|(i, _)| i)
}

pub(crate) fn trim(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_ascii() && WHITESPACE.contains(&(c as u8)))
}

/// Parse a compound selector such as `rect.a#b[fill^="url"]:hover`
pub(crate) fn parse_compound(txt: &str) -> ElementSelector {
    let bytes = txt.as_bytes();
    let len = bytes.len();
    let mut el_end = find_first_of(txt, COMPOUND_MARKERS, 0);
    let tag = txt[..el_end.unwrap_or(len)].to_ascii_lowercase();
    let mut attrs = Vec::new();

    while let Some(at) = el_end {
        let next = match bytes[at] {
            b'.' => {
                let pos = find_first_of(txt, COMPOUND_MARKERS, at + 1);
                let value = &txt[at + 1..pos.unwrap_or(len)];
                attrs.push(AttributeSelector::new("class", AttrOp::Equals, value));
                pos
            }
            b'#' => {
                let pos = find_first_of(txt, COMPOUND_MARKERS, at + 1);
                let value = &txt[at + 1..pos.unwrap_or(len)];
                attrs.push(AttributeSelector::new("id", AttrOp::Equals, value));
                pos
            }
            b':' if bytes.get(at + 1) == Some(&b':') => {
                let pos = find_first_of(txt, COMPOUND_MARKERS, at + 2);
                let value = txt[at + 2..pos.unwrap_or(len)].to_ascii_lowercase();
                attrs.push(AttributeSelector::new("pseudo-el", AttrOp::PseudoElement, &value));
                pos
            }
            b':' => {
                let mut pos = find_first_of(txt, b".#[:(", at + 1);
                if let Some(p) = pos.filter(|&p| bytes[p] == b'(') {
                    pos = find_close_bracket(bytes, p, b'(', b')').map(|c| c + 1);
                }
                let value = txt[at + 1..pos.unwrap_or(len)].to_ascii_lowercase();
                let op = if value == "after" || value == "before" {
                    AttrOp::PseudoElement
                } else {
                    AttrOp::PseudoClass
                };
                attrs.push(AttributeSelector::new("pseudo", op, &value));
                pos
            }
            _ => {
                let (selector, pos) = parse_attribute_constraint(txt, at);
                attrs.push(selector);
                pos
            }
        };
        el_end = next.and_then(|p| find_first_of(txt, COMPOUND_MARKERS, p));
    }

    ElementSelector { tag, attrs }
}

/// Parse `[name op value]` starting at the `[` at `at`; returns the
/// constraint and the offset to resume scanning from
fn parse_attribute_constraint(txt: &str, at: usize) -> (AttributeSelector, Option<usize>) {
    let bytes = txt.as_bytes();
    let len = bytes.len();
    let op_pos = find_first_of(txt, b"]~=|$*^", at + 1);
    let name = trim(&txt[at + 1..op_pos.unwrap_or(len)]).to_ascii_lowercase();

    let Some(p) = op_pos else {
        return (AttributeSelector::new(&name, AttrOp::Exists, ""), None);
    };
    if bytes[p] == b']' {
        return (AttributeSelector::new(&name, AttrOp::Exists, ""), Some(p + 1));
    }

    let rest = &txt[p..];
    let op = if bytes[p] == b'=' {
        AttrOp::Equals
    } else if rest.starts_with("~=") || rest.starts_with("*=") {
        AttrOp::Contains
    } else if rest.starts_with("|=") || rest.starts_with("^=") {
        AttrOp::StartsWith
    } else if rest.starts_with("$=") {
        AttrOp::EndsWith
    } else {
        AttrOp::Exists
    };

    let mut q = p + 1;
    if bytes.get(q) == Some(&b'=') {
        q += 1;
    }
    let Some(q) = (q..len).find(|&i| bytes[i] != b' ' && bytes[i] != b'\t') else {
        return (AttributeSelector::new(&name, op, ""), None);
    };

    match bytes[q] {
        quote @ (b'"' | b'\'') => {
            let close = (q + 1..len).find(|&i| bytes[i] == quote);
            let value = &txt[q + 1..close.unwrap_or(len)];
            (AttributeSelector::new(&name, op, value), close.map(|c| c + 1))
        }
        b']' => (AttributeSelector::new(&name, op, ""), Some(q + 1)),
        _ => {
            let close = find_first_of(txt, b"]", q + 1);
            let value = trim(&txt[q..close.unwrap_or(len)]);
            (AttributeSelector::new(&name, op, value), close.map(|c| c + 1))
        }
    }
}

/// Parse a complex selector: rightmost compound plus an optional
/// combinator-linked left part, parsed recursively
pub(crate) fn parse_selector(text: &str) -> CssResult<Selector> {
    if text.is_empty() {
        return Err(CssError::EmptySelector);
    }
    let mut tokens = split_string(text, "", " \t>+~", "([");
    let Some(right) = tokens.pop() else {
        return Err(CssError::EmptySelector);
    };

    let mut combinator = None;
    while let Some(last) = tokens.last() {
        let c = match last.as_str() {
            " " | "\t" | "+" | "~" | ">" => last.as_bytes()[0],
            _ => break,
        };
        if matches!(combinator, None | Some(b' ') | Some(b'\t')) {
            combinator = Some(c);
        }
        tokens.pop();
    }

    let left = tokens.concat();
    let left = trim(&left);
    let right = trim(&right);
    if right.is_empty() {
        return Err(CssError::EmptyCompound { text: text.to_string() });
    }

    let combinator = match combinator {
        Some(b'>') => Combinator::Child,
        Some(b'+') => Combinator::AdjacentSibling,
        Some(b'~') => Combinator::GeneralSibling,
        _ => Combinator::Descendant,
    };
    let left = if left.is_empty() {
        None
    } else {
        Some(Box::new(parse_selector(left)?))
    };

    Ok(Selector {
        right: parse_compound(right),
        left,
        combinator,
    })
}

/// Remove `/* ... */` comments with a blind scan. An unterminated comment
/// swallows the rest of the text.
pub(crate) fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Split comment-free stylesheet text into `(selector list, declaration block)`
/// pairs. Braces are matched blindly: the first `}` closes the block.
pub(crate) fn rule_blocks(text: &str) -> Vec<(&str, &str)> {
    let mut blocks = Vec::new();
    let is_space = |c: char| c.is_ascii() && WHITESPACE.contains(&(c as u8));
    let mut pos = text.find(|c: char| !is_space(c));

    while let Some(p) = pos {
        let (Some(open), Some(close)) = (text[p..].find('{'), text[p..].find('}')) else {
            break;
        };
        let (open, close) = (p + open, p + close);
        if close > open {
            blocks.push((&text[p..open], &text[open + 1..close]));
        } else {
            tracing::debug!("Skipping stray '}}' in stylesheet at offset {}", close);
        }
        pos = text[close + 1..]
            .find(|c: char| !is_space(c))
            .map(|i| close + 1 + i);
    }
    blocks
}

/// Split a declaration block into trimmed `(name, value)` pairs
pub(crate) fn parse_declarations(block: &str) -> Vec<(&str, &str)> {
    let mut decls = Vec::new();
    for piece in split_ranges(block, b';') {
        if let Some(colon) = piece.find(':') {
            decls.push((trim(&piece[..colon]), trim(&piece[colon + 1..])));
        }
    }
    decls
}

/// Like `split_string(s, ";", "", "\"")` but borrowing from `s`
fn split_ranges(s: &str, delim: u8) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => match (i + 1..bytes.len()).find(|&j| bytes[j] == b'"') {
                Some(j) => i = j,
                None => break,
            },
            b if b == delim => {
                if i > start {
                    pieces.push(&s[start..i]);
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < bytes.len() {
        pieces.push(&s[start..]);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_string_preserves_delims() {
        let tokens = split_string("a > b", "", " \t>+~", "([");
        assert_eq!(tokens, vec!["a", " ", ">", " ", "b"]);
    }

    #[test]
    fn test_split_string_respects_brackets() {
        let tokens = split_string("a[title='x y'] b", "", " ", "([");
        assert_eq!(tokens, vec!["a[title='x y']", " ", "b"]);

        let tokens = split_string(":not(.a .b) c", "", " ", "([");
        assert_eq!(tokens, vec![":not(.a .b)", " ", "c"]);
    }

    #[test]
    fn test_split_string_quotes() {
        let tokens = split_string(r#"a, b[x="1,2"], c"#, ",", "", "\"");
        assert_eq!(tokens, vec!["a", r#" b[x="1,2"]"#, " c"]);
    }

    #[test]
    fn test_split_string_unclosed_bracket() {
        let tokens = split_string("a[href b", "", " ", "([");
        assert_eq!(tokens, vec!["a[href b"]);
    }

    #[test]
    fn test_parse_compound_pseudo() {
        let sel = parse_compound("a:HOVER::First-Line");
        assert_eq!(sel.tag, "a");
        assert_eq!(sel.attrs[0].op, AttrOp::PseudoClass);
        assert_eq!(sel.attrs[0].value, "hover");
        assert_eq!(sel.attrs[1].op, AttrOp::PseudoElement);
        assert_eq!(sel.attrs[1].value, "first-line");

        let sel = parse_compound("p:before");
        assert_eq!(sel.attrs[0].op, AttrOp::PseudoElement);

        let sel = parse_compound("li:nth-child(2n+1).x");
        assert_eq!(sel.attrs[0].value, "nth-child(2n+1)");
        assert_eq!(sel.attrs[1].name, "class");
    }

    #[test]
    fn test_parse_attribute_operators() {
        let ops = [
            ("[a]", AttrOp::Exists),
            ("[a=x]", AttrOp::Equals),
            ("[a~=x]", AttrOp::Contains),
            ("[a*=x]", AttrOp::Contains),
            ("[a|=x]", AttrOp::StartsWith),
            ("[a^=x]", AttrOp::StartsWith),
            ("[a$=x]", AttrOp::EndsWith),
        ];
        for (text, op) in ops {
            let sel = parse_compound(text);
            assert_eq!(sel.attrs.len(), 1, "{}", text);
            assert_eq!(sel.attrs[0].op, op, "{}", text);
            assert_eq!(sel.attrs[0].name, "a");
        }
    }

    #[test]
    fn test_parse_attribute_values() {
        let sel = parse_compound(r#"a[ HREF ^= "http" ]"#);
        assert_eq!(sel.attrs[0].name, "href");
        assert_eq!(sel.attrs[0].value, "http");

        let sel = parse_compound("a[rel= nofollow ]");
        assert_eq!(sel.attrs[0].value, "nofollow");

        let sel = parse_compound("a[href].ext");
        assert_eq!(sel.attrs.len(), 2);
        assert_eq!(sel.attrs[1].name, "class");
        assert_eq!(sel.attrs[1].value, "ext");
    }

    #[test]
    fn test_parse_attribute_unclosed() {
        let sel = parse_compound("a[href^=http");
        assert_eq!(sel.attrs[0].op, AttrOp::StartsWith);
        assert_eq!(sel.attrs[0].value, "http");
    }

    #[test]
    fn test_parse_selector_combinators() {
        let sel = parse_selector("a > b").unwrap();
        assert_eq!(sel.combinator, Combinator::Child);
        let sel = parse_selector("a+b").unwrap();
        assert_eq!(sel.combinator, Combinator::AdjacentSibling);
        let sel = parse_selector("a ~ b").unwrap();
        assert_eq!(sel.combinator, Combinator::GeneralSibling);
        let sel = parse_selector("a \t b").unwrap();
        assert_eq!(sel.combinator, Combinator::Descendant);
    }

    #[test]
    fn test_parse_selector_failures() {
        assert_eq!(parse_selector(""), Err(CssError::EmptySelector));
        assert!(parse_selector("a ").is_err());
    }

    #[test]
    fn test_strip_comments() {
        assert_eq!(strip_comments("a/* x */b"), "ab");
        assert_eq!(strip_comments("a/* x */b/* y"), "ab");
        // blind scan: comment markers inside strings are still removed
        assert_eq!(strip_comments(r#"x { content: "/*"; } */y"#), "x { content: \"y");
    }

    #[test]
    fn test_rule_blocks() {
        let blocks = rule_blocks(" .a { fill: red } \n g,rect{stroke:blue;} ");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], (".a ", " fill: red "));
        assert_eq!(blocks[1], ("g,rect", "stroke:blue;"));
    }

    #[test]
    fn test_parse_declarations() {
        let decls = parse_declarations(r#" fill : red ; font-family: "a;b"; bogus ; stroke:url(#g)"#);
        assert_eq!(decls, vec![("fill", "red"), ("font-family", "\"a;b\""), ("stroke", "url(#g)")]);
    }
}
