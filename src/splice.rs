//! Separator-preserving insertion and removal of one element of a region.
//!
//! A region is the span of a delimited collection (both delimiters included) and its elements are
//! the spans of its top-level members in order. Both operations keep the invariant that adjacent
//! elements are separated by exactly one comma, with no leading comma before the first element
//! and no trailing comma after the last one.

use crate::error::{PatchError, Result};
use crate::span::Span;

/// Start of the line `at` is on.
fn line_start(src: &str, at: usize) -> usize {
    src[..at].rfind('\n').map_or(0, |i| i + 1)
}

/// Leading whitespace of the line `at` is on, up to `at`.
fn line_indent(src: &str, at: usize) -> &str {
    let line = &src[line_start(src, at)..at];
    &line[..line.len() - line.trim_start_matches([' ', '\t']).len()]
}

fn begins_line(src: &str, at: usize) -> bool {
    src[line_start(src, at)..at].trim().is_empty()
}

/// `span` is about to be dropped, so it may only hold whitespace and commas. Comments are the
/// only other thing that can sit between elements.
fn ensure_separators(src: &str, span: Span) -> Result<()> {
    if span
        .slice(src)
        .chars()
        .all(|c| c.is_whitespace() || c == ',')
    {
        Ok(())
    } else {
        Err(PatchError::malformed(
            "this text sits where a separator is rewritten and would be lost",
            span,
        ))
    }
}

/// Append `entry` as the new last element of `region`, on its own line.
pub fn append(
    src: &str,
    region: Span,
    elements: &[Span],
    entry: &str,
    unit: &str,
) -> Result<String> {
    let close = region.hi - 1;
    let close_indent = line_indent(src, close);

    let (head, indent) = match elements.last() {
        Some(last) => {
            ensure_separators(src, Span::new(last.hi, close))?;
            let indent = if begins_line(src, last.lo) {
                line_indent(src, last.lo).to_string()
            } else {
                format!("{close_indent}{unit}")
            };
            (format!("{},\n", &src[..last.hi]), indent)
        }
        None => {
            ensure_separators(src, region.interior())?;
            (
                format!("{}\n", &src[..region.lo + 1]),
                format!("{close_indent}{unit}"),
            )
        }
    };

    Ok(format!("{head}{indent}{entry}\n{close_indent}{}", &src[close..]))
}

/// Remove `elements[index]` from `region` together with exactly one adjacent separator. A
/// trailing comma after the last element is dropped as well.
pub fn remove(src: &str, region: Span, elements: &[Span], index: usize) -> Result<String> {
    let target = elements[index];
    let last = elements.len() - 1;
    let close = region.hi - 1;
    let trailing = |after: Span| Span::new(after.hi, past_trailing_comma(src, after.hi, close));

    let cuts = if elements.len() == 1 {
        vec![region.interior()]
    } else if index == 0 {
        vec![Span::new(target.lo, elements[1].lo), trailing(elements[last])]
    } else if index == last {
        let prev = elements[index - 1];
        vec![Span::new(prev.hi, trailing(target).hi)]
    } else {
        let prev = elements[index - 1];
        vec![Span::new(prev.hi, target.hi), trailing(elements[last])]
    };

    for cut in &cuts {
        if cut.lo <= target.lo && target.hi <= cut.hi {
            ensure_separators(src, Span::new(cut.lo, target.lo))?;
            ensure_separators(src, Span::new(target.hi, cut.hi))?;
        } else {
            ensure_separators(src, *cut)?;
        }
    }

    let mut out = String::with_capacity(src.len());
    let mut pos = 0;
    for cut in cuts {
        out.push_str(&src[pos..cut.lo]);
        pos = cut.hi;
    }
    out.push_str(&src[pos..]);
    Ok(out)
}

/// If the text from `from` up to `limit` starts with (optional whitespace and) a comma, the
/// offset just past that comma; otherwise `from`.
fn past_trailing_comma(src: &str, from: usize, limit: usize) -> usize {
    let rest = &src[from..limit];
    let trimmed = rest.trim_start();
    if trimmed.starts_with(',') {
        from + (rest.len() - trimmed.len()) + 1
    } else {
        from
    }
}
