//! Entries of a mapping object whose keys are the slugs:
//!
//! ```text
//! const posts: Record<string, { title: string }> = {
//!     'first': { title: '...' },
//!     'second': { title: '...' }
//! };
//! ```

use tracing::*;

use crate::error::{PatchError, Result};
use crate::list::ensure_single_object;
use crate::region::{self, KeyedElement};
use crate::scanner::{self, Quote, BRACES};
use crate::span::Span;
use crate::splice;

#[derive(Debug, Clone)]
pub struct KeyedTarget {
    pub anchors: Vec<String>,
    pub indent: String,
}

impl KeyedTarget {
    fn scan(&self, doc: &str) -> Result<(Span, Vec<KeyedElement>)> {
        let region = region::locate(doc, &self.anchors, BRACES)?;
        let elements = region::keyed_elements(doc, region)?;
        Ok((region, elements))
    }

    pub fn keys(&self, doc: &str) -> Result<Vec<String>> {
        Ok(self.scan(doc)?.1.into_iter().map(|e| e.key).collect())
    }

    /// Add `'slug': value` as the last member of the mapping; `value` is the text of one object
    /// literal.
    pub fn insert_entry(&self, doc: &str, slug: &str, value: &str) -> Result<String> {
        let (region, elements) = self.scan(doc)?;

        if let Some(existing) = elements.iter().find(|e| e.key == slug) {
            return Err(PatchError::DuplicateEntry {
                slug: slug.to_string(),
                span: existing.span,
            });
        }

        let value = value.trim();
        ensure_single_object(value, region)?;

        let entry = format!("'{}': {value}", scanner::escape(slug, Quote::Single));
        let spans: Vec<Span> = elements.iter().map(|e| e.span).collect();

        debug!(slug, existing = spans.len(), "inserting keyed entry");
        splice::append(doc, region, &spans, &entry, &self.indent)
    }

    pub fn remove_entry(&self, doc: &str, slug: &str) -> Result<String> {
        let (region, elements) = self.scan(doc)?;

        let Some(i) = elements.iter().position(|e| e.key == slug) else {
            return Err(PatchError::EntryNotFound {
                slug: slug.to_string(),
            });
        };
        let spans: Vec<Span> = elements.iter().map(|e| e.span).collect();

        debug!(slug, index = i, "removing keyed entry");
        splice::remove(doc, region, &spans, i)
    }
}
