//! Locating a named region in a document and enumerating the elements inside it.

use tracing::*;

use crate::error::{PatchError, Result};
use crate::scanner::{self, Delimiters, Token, TokenKind, Tokens};
use crate::span::Span;

/// Human readable name of the region described by `anchors`, used in error messages.
pub fn describe(anchors: &[String]) -> String {
    format!("`{}`", anchors.join("` ... `"))
}

/// Find the region introduced by `anchors`. Each anchor is searched for after the previous one;
/// from the start of the last anchor we look for the first `=` and then take the first balanced
/// `delims` pair after it. The returned span includes both delimiters.
pub fn locate(src: &str, anchors: &[String], delims: Delimiters) -> Result<Span> {
    let what = describe(anchors);
    let not_found = || PatchError::RegionNotFound {
        marker: what.clone(),
    };

    let mut cursor = 0;
    let mut last_start = None;
    for anchor in anchors {
        let found = src[cursor..].find(anchor.as_str()).ok_or_else(not_found)?;
        last_start = Some(cursor + found);
        cursor += found + anchor.len();
    }
    let last_start = last_start.ok_or_else(not_found)?;

    let eq = src[last_start..].find('=').ok_or_else(not_found)? + last_start;
    let span = scanner::balanced_region(src, eq, delims)
        .map_err(|e| PatchError::from_scan(e, &what))?;

    debug!(region = %what, ?span, "located region");
    Ok(span)
}

/// Something that sits directly inside a region, not nested in anything else.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Item {
    Group { open: char, span: Span },
    Literal { span: Span },
    Comment { span: Span },
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::Group { span, .. } | Item::Literal { span } | Item::Comment { span } => *span,
        }
    }
}

/// All depth-zero items of `within`. Delimiters must be properly nested and matched (`{` with
/// `}`, `[` with `]`) and every literal must be terminated.
pub fn top_level(src: &str, within: Span) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    let mut stack: Vec<Token> = Vec::new();

    for token in Tokens::new(src, within) {
        let token = token.map_err(|e| PatchError::from_scan(e, "region"))?;
        match token.kind {
            TokenKind::Literal(_) => {
                if stack.is_empty() {
                    items.push(Item::Literal { span: token.span });
                }
            }
            TokenKind::Comment => {
                if stack.is_empty() {
                    items.push(Item::Comment { span: token.span });
                }
            }
            TokenKind::Open(_) => stack.push(token),
            TokenKind::Close(close) => {
                let Some(open) = stack.pop() else {
                    return Err(PatchError::malformed(
                        format!("unexpected `{close}` without a matching opening delimiter"),
                        token.span,
                    ));
                };
                let TokenKind::Open(open_char) = open.kind else {
                    unreachable!("only opening delimiters are pushed");
                };
                if matching_close(open_char) != close {
                    return Err(PatchError::malformed(
                        format!("`{open_char}` is closed by `{close}`"),
                        Span::new(open.span.lo, token.span.hi),
                    ));
                }
                if stack.is_empty() {
                    items.push(Item::Group {
                        open: open_char,
                        span: Span::new(open.span.lo, token.span.hi),
                    });
                }
            }
        }
    }

    if let Some(open) = stack.first() {
        return Err(PatchError::malformed(
            "delimiter is never closed",
            Span::new(open.span.lo, within.hi),
        ));
    }

    trace!(?within, items = items.len());
    Ok(items)
}

fn matching_close(open: char) -> char {
    match open {
        '{' => '}',
        '[' => ']',
        _ => unreachable!("not an opening delimiter: {open}"),
    }
}

/// Part of a [`Member`]. `Code` is a run of plain text (identifiers, colons, operators) with the
/// surrounding whitespace trimmed off.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Piece {
    Group { open: char, span: Span },
    Literal(Span),
    Code(Span),
}

impl Piece {
    pub fn span(&self) -> Span {
        match self {
            Piece::Group { span, .. } | Piece::Literal(span) | Piece::Code(span) => *span,
        }
    }
}

/// The text between two depth-zero commas of a region, comments left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// From the start of the first piece to the end of the last one.
    pub span: Span,
    pub pieces: Vec<Piece>,
}

impl Member {
    fn new(pieces: Vec<Piece>) -> Option<Member> {
        let lo = pieces.first()?.span().lo;
        let hi = pieces.last()?.span().hi;
        Some(Member {
            span: Span::new(lo, hi),
            pieces,
        })
    }
}

/// Split the inside of `region` on its depth-zero commas. A single trailing comma is allowed;
/// any other empty member is an error.
pub fn members(src: &str, region: Span) -> Result<Vec<Member>> {
    let within = region.interior();
    let items = top_level(src, within)?;
    let mut members = Vec::new();
    let mut pieces = Vec::new();
    let mut pos = within.lo;

    for item in items.iter().copied().map(Some).chain([None]) {
        let gap_hi = item.map_or(within.hi, |item| item.span().lo);
        let mut lo = pos;
        for (offset, _) in src[pos..gap_hi].match_indices(',') {
            let comma = pos + offset;
            push_code(src, &mut pieces, Span::new(lo, comma));
            let Some(member) = Member::new(std::mem::take(&mut pieces)) else {
                return Err(PatchError::malformed(
                    "empty element before this separator",
                    Span::new(comma, comma + 1),
                ));
            };
            members.push(member);
            lo = comma + 1;
        }
        push_code(src, &mut pieces, Span::new(lo, gap_hi));

        if let Some(item) = item {
            match item {
                Item::Group { open, span } => pieces.push(Piece::Group { open, span }),
                Item::Literal { span } => pieces.push(Piece::Literal(span)),
                Item::Comment { .. } => {}
            }
            pos = item.span().hi;
        }
    }
    members.extend(Member::new(pieces));

    Ok(members)
}

fn push_code(src: &str, pieces: &mut Vec<Piece>, span: Span) {
    let text = span.slice(src);
    let lo = span.lo + (text.len() - text.trim_start().len());
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        pieces.push(Piece::Code(Span::new(lo, lo + trimmed.len())));
    }
}

fn unexpected(expected: &str, member: &Member) -> PatchError {
    PatchError::malformed(format!("expected {expected} here"), member.span)
}

/// The `{ ... }` elements of an array region. Any other element is an error.
pub fn object_elements(src: &str, region: Span) -> Result<Vec<Span>> {
    members(src, region)?
        .iter()
        .map(|member| match member.pieces.as_slice() {
            [Piece::Group { open: '{', span }] => Ok(*span),
            _ => Err(unexpected("an object literal", member)),
        })
        .collect()
}

/// The string literal elements of an array region, with their decoded values. Any other element
/// is an error.
pub fn literal_elements(src: &str, region: Span) -> Result<Vec<(String, Span)>> {
    members(src, region)?
        .iter()
        .map(|member| match member.pieces.as_slice() {
            [Piece::Literal(span)] => Ok((scanner::literal_value(src, *span), *span)),
            _ => Err(unexpected("a string literal", member)),
        })
        .collect()
}

/// One `key: { ... }` member of a mapping region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedElement {
    pub key: String,
    /// From the first character of the key through the value's closing brace.
    pub span: Span,
}

/// The `'key': { ... }` members of a mapping region. Bare identifier keys are accepted too; any
/// other member is an error.
pub fn keyed_elements(src: &str, region: Span) -> Result<Vec<KeyedElement>> {
    members(src, region)?
        .iter()
        .map(|member| {
            let key = match member.pieces.as_slice() {
                [Piece::Literal(key), Piece::Code(colon), Piece::Group { open: '{', .. }]
                    if colon.slice(src) == ":" =>
                {
                    Some(scanner::literal_value(src, *key))
                }
                [Piece::Code(key), Piece::Group { open: '{', .. }] => {
                    bare_key(key.slice(src)).map(str::to_string)
                }
                _ => None,
            };
            match key {
                Some(key) => Ok(KeyedElement {
                    key,
                    span: member.span,
                }),
                None => Err(unexpected("a `key: { ... }` member", member)),
            }
        })
        .collect()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// `code` is exactly `ident:` (optionally with whitespace before the colon).
fn bare_key(code: &str) -> Option<&str> {
    let key = code.strip_suffix(':')?.trim_end();
    (!key.is_empty() && key.chars().all(is_ident_char)).then_some(key)
}

/// The decoded string value of the member named exactly `field` directly inside the object
/// literal `object`, if there is one. `oldslug: "x"` does not count as a `slug` field.
pub fn field_value(src: &str, object: Span, field: &str) -> Result<Option<String>> {
    for member in members(src, object)? {
        let (named, value) = match member.pieces.as_slice() {
            [Piece::Code(key), Piece::Literal(value)] => {
                (bare_key(key.slice(src)) == Some(field), *value)
            }
            [Piece::Literal(key), Piece::Code(colon), Piece::Literal(value)]
                if colon.slice(src) == ":" =>
            {
                (scanner::literal_value(src, *key) == field, *value)
            }
            _ => continue,
        };
        if named {
            return Ok(Some(scanner::literal_value(src, value)));
        }
    }

    Ok(None)
}
