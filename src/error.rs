use thiserror::Error;

use crate::scanner::ScanError;
use crate::span::Span;

pub type Result<T> = std::result::Result<T, PatchError>;

/// Why a patch could not be applied. A patch either produces a whole new document or one of
/// these, never a partially edited document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// The declaration marker for the region is missing, e.g. the file was restructured.
    #[error("could not find {marker}")]
    RegionNotFound { marker: String },

    #[error("an entry with slug \"{slug}\" already exists")]
    DuplicateEntry { slug: String, span: Span },

    #[error("no entry with slug \"{slug}\" was found")]
    EntryNotFound { slug: String },

    /// Brace or literal imbalance, reported at the offending location.
    #[error("{reason}")]
    MalformedRegion { reason: String, span: Span },
}

impl PatchError {
    pub fn span(&self) -> Option<Span> {
        match self {
            PatchError::RegionNotFound { .. } | PatchError::EntryNotFound { .. } => None,
            PatchError::DuplicateEntry { span, .. } | PatchError::MalformedRegion { span, .. } => {
                Some(*span)
            }
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>, span: Span) -> Self {
        PatchError::MalformedRegion {
            reason: reason.into(),
            span,
        }
    }

    /// Lift a scanner failure that happened while looking at `what`.
    pub(crate) fn from_scan(err: ScanError, what: &str) -> Self {
        match err.span() {
            Some(span) => PatchError::malformed(format!("malformed {what}: {err}"), span),
            None => PatchError::RegionNotFound {
                marker: what.to_string(),
            },
        }
    }
}
