//! The slug array the route template hands to `getStaticPaths()`:
//!
//! ```text
//! export async function getStaticPaths() {
//!     const posts = [
//!         'first',
//!         'second'
//!     ];
//!     return posts.map((slug) => ({ params: { slug } }));
//! }
//! ```

use tracing::*;

use crate::error::{PatchError, Result};
use crate::region;
use crate::scanner::{self, Quote, BRACKETS};
use crate::span::Span;
use crate::splice;

#[derive(Debug, Clone)]
pub struct PathsTarget {
    pub anchors: Vec<String>,
    pub indent: String,
}

impl PathsTarget {
    fn scan(&self, doc: &str) -> Result<(Span, Vec<(String, Span)>)> {
        let region = region::locate(doc, &self.anchors, BRACKETS)?;
        Ok((region, region::literal_elements(doc, region)?))
    }

    pub fn slugs(&self, doc: &str) -> Result<Vec<String>> {
        Ok(self.scan(doc)?.1.into_iter().map(|(slug, _)| slug).collect())
    }

    pub fn insert_slug(&self, doc: &str, slug: &str) -> Result<String> {
        let (region, elements) = self.scan(doc)?;

        if let Some((_, span)) = elements.iter().find(|(s, _)| s == slug) {
            return Err(PatchError::DuplicateEntry {
                slug: slug.to_string(),
                span: *span,
            });
        }

        let entry = format!("'{}'", scanner::escape(slug, Quote::Single));
        let spans: Vec<Span> = elements.iter().map(|(_, span)| *span).collect();

        debug!(slug, existing = spans.len(), "inserting static path");
        splice::append(doc, region, &spans, &entry, &self.indent)
    }

    pub fn remove_slug(&self, doc: &str, slug: &str) -> Result<String> {
        let (region, elements) = self.scan(doc)?;

        let Some(i) = elements.iter().position(|(s, _)| s == slug) else {
            return Err(PatchError::EntryNotFound {
                slug: slug.to_string(),
            });
        };
        let spans: Vec<Span> = elements.iter().map(|(_, span)| *span).collect();

        debug!(slug, index = i, "removing static path");
        splice::remove(doc, region, &spans, i)
    }
}
