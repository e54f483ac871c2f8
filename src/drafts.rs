//! JSON drafts waiting to be published.

use std::path::{Path, PathBuf};

use anyhow::Context;
use indexmap::IndexSet;
use tracing::*;

use crate::post::{BlogPost, Draft};

const DRAFT_EXTENSION: &str = "json";

#[derive(Debug)]
pub enum DraftStatus {
    Ready(BlogPost),
    /// Already present in one of the documents.
    Published(BlogPost),
    Invalid(String),
}

#[derive(Debug)]
pub struct DraftFile {
    pub path: PathBuf,
    pub file_name: String,
    /// The draft's title, or its file stem when it has none.
    pub title: String,
    pub status: DraftStatus,
}

/// Read and validate one draft.
pub fn load(path: &Path) -> anyhow::Result<BlogPost> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read draft `{}`", path.display()))?;
    let draft: Draft = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse draft `{}`", path.display()))?;
    let post = draft
        .validate()
        .with_context(|| format!("draft `{}` is incomplete", path.display()))?;
    Ok(post)
}

/// Every `*.json` draft in `dir`, sorted by file name. `published` holds the slugs already
/// present in the documents.
pub fn scan(dir: &Path, published: &IndexSet<String>) -> anyhow::Result<Vec<DraftFile>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read drafts directory `{}`", dir.display()))?;

    let mut drafts = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(DRAFT_EXTENSION) {
            continue;
        }
        drafts.push(classify(path, published));
    }
    drafts.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    debug!(dir = %dir.display(), count = drafts.len(), "scanned drafts");
    Ok(drafts)
}

fn classify(path: PathBuf, published: &IndexSet<String>) -> DraftFile {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let draft = std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|text| serde_json::from_str::<Draft>(&text).map_err(|e| e.to_string()));

    let (title, status) = match draft {
        Err(e) => (stem, DraftStatus::Invalid(e)),
        Ok(draft) => {
            let title = draft.title.clone().unwrap_or(stem);
            let status = match draft.validate() {
                Err(e) => DraftStatus::Invalid(e.to_string()),
                Ok(post) if published.contains(&post.slug) => DraftStatus::Published(post),
                Ok(post) => DraftStatus::Ready(post),
            };
            (title, status)
        }
    };

    trace!(file = %file_name, ?status);
    DraftFile {
        path,
        file_name,
        title,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETE: &str = r#"{
        "title": "Hello",
        "date": "2025-01-01",
        "slug": "hello",
        "excerpt": "e",
        "content": "c",
        "tags": [],
        "readTime": "1 min read"
    }"#;

    #[test]
    fn test_scan_classifies_drafts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b-ready.json"), COMPLETE.replace("hello", "fresh")).unwrap();
        std::fs::write(dir.path().join("a-published.json"), COMPLETE).unwrap();
        std::fs::write(dir.path().join("c-broken.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("d-partial.json"), r#"{ "title": "Partial" }"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), COMPLETE).unwrap();

        let published = IndexSet::from(["hello".to_string()]);
        let drafts = scan(dir.path(), &published).unwrap();

        let names: Vec<_> = drafts.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["a-published.json", "b-ready.json", "c-broken.json", "d-partial.json"]
        );
        assert!(matches!(drafts[0].status, DraftStatus::Published(_)));
        assert!(matches!(&drafts[1].status, DraftStatus::Ready(p) if p.slug == "fresh"));
        assert!(matches!(drafts[2].status, DraftStatus::Invalid(_)));
        assert_eq!(drafts[2].title, "c-broken");
        assert!(matches!(drafts[3].status, DraftStatus::Invalid(_)));
        assert_eq!(drafts[3].title, "Partial");
    }

    #[test]
    fn test_load_rejects_incomplete_draft() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.json");
        std::fs::write(&path, r#"{ "title": "T" }"#).unwrap();
        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("missing required field(s): date"));
    }

    #[test]
    fn test_load_complete_draft() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.json");
        std::fs::write(&path, COMPLETE).unwrap();
        assert_eq!(load(&path).unwrap().slug, "hello");
    }
}
