//! Entries of a top-level array of object literals, identified by one of their fields:
//!
//! ```text
//! export const posts: BlogPost[] = [
//!     { title: "...", slug: "first" },
//!     { title: "...", slug: "second" }
//! ];
//! ```

use tracing::*;

use crate::error::{PatchError, Result};
use crate::region;
use crate::scanner::{self, BRACES, BRACKETS};
use crate::span::Span;
use crate::splice;

#[derive(Debug, Clone)]
pub struct ListTarget {
    pub anchors: Vec<String>,
    /// Name of the field holding the slug.
    pub key_field: String,
    pub indent: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub slug: String,
    pub span: Span,
}

struct Scanned {
    region: Span,
    elements: Vec<Span>,
    slugs: Vec<Option<String>>,
}

impl ListTarget {
    fn scan(&self, doc: &str) -> Result<Scanned> {
        let region = region::locate(doc, &self.anchors, BRACKETS)?;
        let elements = region::object_elements(doc, region)?;
        let slugs = elements
            .iter()
            .map(|span| region::field_value(doc, *span, &self.key_field))
            .collect::<Result<Vec<_>>>()?;
        Ok(Scanned {
            region,
            elements,
            slugs,
        })
    }

    /// Entries that carry the key field, in document order.
    pub fn entries(&self, doc: &str) -> Result<Vec<ListEntry>> {
        let Scanned {
            elements, slugs, ..
        } = self.scan(doc)?;
        Ok(elements
            .into_iter()
            .zip(slugs)
            .filter_map(|(span, slug)| slug.map(|slug| ListEntry { slug, span }))
            .collect())
    }

    /// Decoded value of another field of `entry`, e.g. its title.
    pub fn field(&self, doc: &str, entry: &ListEntry, field: &str) -> Result<Option<String>> {
        region::field_value(doc, entry.span, field)
    }

    /// Append `entry`, the text of one object literal, as the last element of the array.
    pub fn insert_entry(&self, doc: &str, entry: &str, slug: &str) -> Result<String> {
        let scanned = self.scan(doc)?;

        if let Some(i) = scanned.slugs.iter().position(|s| s.as_deref() == Some(slug)) {
            return Err(PatchError::DuplicateEntry {
                slug: slug.to_string(),
                span: scanned.elements[i],
            });
        }

        let entry = entry.trim();
        ensure_single_object(entry, scanned.region)?;

        debug!(slug, existing = scanned.elements.len(), "inserting list entry");
        splice::append(
            doc,
            scanned.region,
            &scanned.elements,
            entry,
            &self.indent,
        )
    }

    pub fn remove_entry(&self, doc: &str, slug: &str) -> Result<String> {
        let scanned = self.scan(doc)?;

        let Some(i) = scanned.slugs.iter().position(|s| s.as_deref() == Some(slug)) else {
            return Err(PatchError::EntryNotFound {
                slug: slug.to_string(),
            });
        };

        debug!(slug, index = i, "removing list entry");
        splice::remove(doc, scanned.region, &scanned.elements, i)
    }
}

/// `text` must be exactly one balanced `{ ... }`. Failures are reported at `region`, since
/// `text` is not part of the document yet.
pub(crate) fn ensure_single_object(text: &str, region: Span) -> Result<()> {
    let at = Span::new(region.lo, region.lo + 1);
    match scanner::balanced_region(text, 0, BRACES) {
        Ok(span) if span == Span::new(0, text.len()) => Ok(()),
        Ok(_) => Err(PatchError::malformed(
            "the new entry is not a single object literal",
            at,
        )),
        Err(e) => Err(PatchError::malformed(format!("the new entry is malformed: {e}"), at)),
    }
}
