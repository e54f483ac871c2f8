use std::path::{Path, PathBuf};

use confique::Config as DeriveConfig;

use crate::keyed::KeyedTarget;
use crate::list::ListTarget;
use crate::paths::PathsTarget;

#[derive(Debug, DeriveConfig)]
pub struct Config {
    /// The TypeScript module whose `posts` array lists every post's metadata.
    #[config(default = "src/data/blog-posts.ts", env = "BLOGSPLICE_POSTS_FILE")]
    pub posts_file: PathBuf,

    /// The dynamic route template holding the slug list and the per-post content.
    #[config(default = "src/pages/blog/[slug].astro", env = "BLOGSPLICE_ROUTE_FILE")]
    pub route_file: PathBuf,

    /// Where JSON drafts are picked up from by `add` when no draft is given.
    #[config(default = "blog-tools", env = "BLOGSPLICE_DRAFTS_DIR")]
    pub drafts_dir: PathBuf,

    /// Text preceding the metadata array declaration, searched in order. The array starts at the
    /// first `[` after the first `=` following the last anchor.
    #[config(default = ["export const posts: BlogPost[] ="])]
    pub posts_anchors: Vec<String>,

    /// The field of a metadata entry that holds its slug.
    #[config(default = "slug")]
    pub key_field: String,

    /// Anchors of the slug array returned by `getStaticPaths()`. Set to `[]` if the route
    /// template has no such array.
    #[config(default = ["export async function getStaticPaths()", "const posts ="])]
    pub static_paths_anchors: Vec<String>,

    /// Anchors of the object mapping each slug to its post data.
    #[config(default = ["const posts: Record<string, {"])]
    pub post_data_anchors: Vec<String>,

    /// One level of indentation in both documents.
    #[config(default = "\t")]
    pub indent: String,

    /// Author recorded for drafts that do not name one.
    #[config(env = "BLOGSPLICE_DEFAULT_AUTHOR")]
    pub default_author: Option<String>,
}

impl Config {
    /// Load from the environment and then `path`, if it exists.
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let mut builder = Config::builder().env();
        if path.exists() {
            builder = builder.file(path);
        }
        Ok(builder.load()?)
    }

    pub fn list_target(&self) -> ListTarget {
        ListTarget {
            anchors: self.posts_anchors.clone(),
            key_field: self.key_field.clone(),
            indent: self.indent.clone(),
        }
    }

    pub fn keyed_target(&self) -> KeyedTarget {
        KeyedTarget {
            anchors: self.post_data_anchors.clone(),
            indent: self.indent.clone(),
        }
    }

    pub fn paths_target(&self) -> Option<PathsTarget> {
        if self.static_paths_anchors.is_empty() {
            return None;
        }
        Some(PathsTarget {
            anchors: self.static_paths_anchors.clone(),
            indent: self.indent.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blogsplice.toml");
        std::fs::write(
            &path,
            "posts_file = \"posts.ts\"\nstatic_paths_anchors = []\nindent = \"  \"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.posts_file, PathBuf::from("posts.ts"));
        assert_eq!(config.route_file, PathBuf::from("src/pages/blog/[slug].astro"));
        assert!(config.paths_target().is_none());
        assert_eq!(config.list_target().indent, "  ");
        assert_eq!(config.keyed_target().anchors, vec!["const posts: Record<string, {"]);
    }
}
