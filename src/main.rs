use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser as ClapParser, Subcommand};
use indexmap::IndexSet;
use tracing::*;

use crate::config::Config;
use crate::drafts::DraftStatus;
use crate::error::PatchError;
use crate::keyed::KeyedTarget;
use crate::list::ListTarget;
use crate::paths::PathsTarget;
use crate::post::BlogPost;

mod config;
mod diagnostics;
mod drafts;
mod error;
mod keyed;
mod list;
mod logging;
mod paths;
mod post;
mod region;
mod scanner;
mod span;
mod splice;

#[derive(Debug, ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Project root; configured paths are relative to it.
    #[arg(short = 'C', long, default_value = ".", global = true)]
    root: PathBuf,

    /// Configuration file, relative to the project root.
    #[arg(long, default_value = "blogsplice.toml", global = true)]
    config: PathBuf,

    /// Compute every patch but do not write anything.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Publish a post from a JSON draft. Without a draft, choose one from the drafts directory.
    Add {
        /// Path to the draft, or its file name inside the drafts directory.
        draft: Option<PathBuf>,
    },
    /// Remove a published post. Without a slug, choose one from the list of posts.
    Remove {
        slug: Option<String>,
        /// Do not ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },
    /// List published posts.
    List,
    /// Print a template of the configuration file.
    ConfigTemplate,
}

struct Site {
    root: PathBuf,
    config: Config,
    list: ListTarget,
    keyed: KeyedTarget,
    paths: Option<PathsTarget>,
    dry_run: bool,
}

/// One document read from disk, to be patched in memory and written back at most once.
struct Document {
    path: PathBuf,
    display: String,
    text: String,
}

impl Document {
    fn read(path: PathBuf) -> anyhow::Result<Document> {
        let shown = path.display().to_string();
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                error!(path = %shown, "failed to read document");
                return Err(e).with_context(|| format!("failed to read file `{shown}`"));
            }
        };
        Ok(Document {
            path,
            display: shown,
            text,
        })
    }

    /// Replace the text with the result of `patch`, or report why it could not be applied.
    fn apply(
        &mut self,
        patch: impl FnOnce(&str) -> Result<String, PatchError>,
    ) -> anyhow::Result<()> {
        match patch(&self.text) {
            Ok(text) => {
                self.text = text;
                Ok(())
            }
            Err(e) => {
                if let Err(report_err) = diagnostics::report(&e, &self.display, &self.text) {
                    warn!(path = %self.display, "failed to print diagnostic: {report_err}");
                }
                Err(e).with_context(|| format!("failed to update `{}`", self.display))
            }
        }
    }

    fn write(&self, dry_run: bool) -> anyhow::Result<()> {
        if dry_run {
            info!(path = %self.display, "dry run, not writing");
            return Ok(());
        }
        std::fs::write(&self.path, &self.text)
            .with_context(|| format!("failed to write file `{}`", self.display))
    }
}

fn main() -> anyhow::Result<()> {
    logging::setup_logging();

    let cli = Args::parse();

    debug!(?cli);

    if let Command::ConfigTemplate = cli.command {
        print!(
            "{}",
            confique::toml::template::<Config>(confique::toml::FormatOptions::default())
        );
        return Ok(());
    }

    let config_path = cli.root.join(&cli.config);
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config `{}`", config_path.display()))?;
    debug!(?config);

    let site = Site {
        root: cli.root,
        list: config.list_target(),
        keyed: config.keyed_target(),
        paths: config.paths_target(),
        config,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Command::Add { draft } => add(&site, draft),
        Command::Remove { slug, yes } => remove(&site, slug, yes),
        Command::List => list(&site),
        Command::ConfigTemplate => unreachable!("handled before loading the config"),
    }
}

impl Site {
    fn posts(&self) -> anyhow::Result<Document> {
        Document::read(self.root.join(&self.config.posts_file))
    }

    fn route(&self) -> anyhow::Result<Document> {
        Document::read(self.root.join(&self.config.route_file))
    }

    fn drafts_dir(&self) -> PathBuf {
        self.root.join(&self.config.drafts_dir)
    }

    /// Slugs present in any of the three regions. Regions that cannot be read count as empty.
    fn published_slugs(&self) -> anyhow::Result<IndexSet<String>> {
        let posts = self.posts()?;
        let route = self.route()?;
        let mut slugs = IndexSet::new();

        match self.list.entries(&posts.text) {
            Ok(entries) => slugs.extend(entries.into_iter().map(|e| e.slug)),
            Err(e) => warn!(path = %posts.display, "{e}"),
        }
        if let Some(paths) = &self.paths {
            match paths.slugs(&route.text) {
                Ok(found) => slugs.extend(found),
                Err(e) => warn!(path = %route.display, "{e}"),
            }
        }
        match self.keyed.keys(&route.text) {
            Ok(keys) => slugs.extend(keys),
            Err(e) => warn!(path = %route.display, "{e}"),
        }

        trace!(?slugs);
        Ok(slugs)
    }
}

fn prompt(question: &str) -> anyhow::Result<String> {
    print!("{question}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .context("failed to read answer")?;
    Ok(answer.trim().to_string())
}

/// Ask for a 1-based choice among `count` options.
fn choose(question: &str, count: usize) -> anyhow::Result<usize> {
    let answer = prompt(question)?;
    match answer.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Ok(n - 1),
        _ => bail!("invalid selection `{answer}`"),
    }
}

fn resolve_draft(site: &Site, draft: &Path) -> PathBuf {
    if draft.is_absolute() || draft.exists() {
        draft.to_path_buf()
    } else {
        site.drafts_dir().join(draft)
    }
}

fn pick_draft(site: &Site) -> anyhow::Result<Option<PathBuf>> {
    let published = site.published_slugs()?;
    let drafts = drafts::scan(&site.drafts_dir(), &published)?;

    let (ready, others): (Vec<_>, Vec<_>) = drafts
        .into_iter()
        .partition(|d| matches!(d.status, DraftStatus::Ready(_)));

    if ready.is_empty() {
        println!("\nNo drafts available to add.\n");
        for draft in &others {
            match &draft.status {
                DraftStatus::Invalid(reason) => {
                    println!("  invalid: {} ({reason})", draft.file_name)
                }
                DraftStatus::Published(post) => {
                    println!("  already added: {} (slug {})", draft.file_name, post.slug)
                }
                DraftStatus::Ready(_) => {}
            }
        }
        return Ok(None);
    }

    println!("\nDrafts available to add:\n");
    for (i, draft) in ready.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, draft.title, draft.file_name);
        if let DraftStatus::Ready(post) = &draft.status {
            println!("     Slug: {}", post.slug);
        }
    }
    println!();

    let index = choose(
        "Enter the number of the draft to add (or press Ctrl+C to cancel): ",
        ready.len(),
    )?;
    Ok(ready.into_iter().nth(index).map(|d| d.path))
}

fn add(site: &Site, draft: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match draft {
        Some(draft) => resolve_draft(site, &draft),
        None => match pick_draft(site)? {
            Some(path) => path,
            None => return Ok(()),
        },
    };

    let post: BlogPost =
        drafts::load(&path)?.with_default_author(site.config.default_author.as_deref());
    let unit = &site.config.indent;
    info!(slug = %post.slug, draft = %path.display(), "adding post");

    // Read fresh, right before patching.
    let mut posts = site.posts()?;
    let mut route = site.route()?;

    posts.apply(|doc| site.list.insert_entry(doc, &post.list_entry(unit), &post.slug))?;
    if let Some(paths) = &site.paths {
        route.apply(|doc| paths.insert_slug(doc, &post.slug))?;
    }
    route.apply(|doc| site.keyed.insert_entry(doc, &post.slug, &post.keyed_value(unit)))?;

    posts.write(site.dry_run)?;
    println!("Updated {}", posts.display);
    route.write(site.dry_run)?;
    println!("Updated {}", route.display);

    println!("\nAdded \"{}\" at /blog/{}", post.title, post.slug);
    Ok(())
}

fn pick_post(site: &Site) -> anyhow::Result<String> {
    let posts = site.posts()?;
    let entries = site
        .list
        .entries(&posts.text)
        .with_context(|| format!("failed to read posts from `{}`", posts.display))?;
    if entries.is_empty() {
        bail!("no posts found in `{}`", posts.display);
    }

    println!("\nPublished posts:\n");
    for (i, entry) in entries.iter().enumerate() {
        let title = site.list.field(&posts.text, entry, "title")?;
        println!(
            "  {}. {} ({})",
            i + 1,
            title.as_deref().unwrap_or(&entry.slug),
            entry.slug
        );
    }
    println!();

    let index = choose(
        "Enter the number of the post to remove (or press Ctrl+C to cancel): ",
        entries.len(),
    )?;
    Ok(entries[index].slug.clone())
}

fn remove(site: &Site, slug: Option<String>, yes: bool) -> anyhow::Result<()> {
    let slug = match slug {
        Some(slug) => slug,
        None => pick_post(site)?,
    };

    if !yes {
        let answer = prompt(&format!(
            "\nAre you sure you want to remove the post with slug \"{slug}\"? (yes/no): "
        ))?;
        if !matches!(answer.to_lowercase().as_str(), "yes" | "y") {
            println!("Cancelled.");
            return Ok(());
        }
    }
    info!(%slug, "removing post");

    let mut posts = site.posts()?;
    let mut route = site.route()?;

    posts.apply(|doc| site.list.remove_entry(doc, &slug))?;
    if let Some(paths) = &site.paths {
        route.apply(|doc| paths.remove_slug(doc, &slug))?;
    }
    route.apply(|doc| site.keyed.remove_entry(doc, &slug))?;

    posts.write(site.dry_run)?;
    println!("Removed from {}", posts.display);
    route.write(site.dry_run)?;
    println!("Removed from {}", route.display);

    println!("\nRemoved post \"{slug}\"");
    Ok(())
}

fn list(site: &Site) -> anyhow::Result<()> {
    let posts = site.posts()?;
    let entries = site
        .list
        .entries(&posts.text)
        .with_context(|| format!("failed to read posts from `{}`", posts.display))?;

    for (i, entry) in entries.iter().enumerate() {
        let title = site.list.field(&posts.text, entry, "title")?;
        let date = site.list.field(&posts.text, entry, "date")?;
        println!(
            "{:>3}. {} ({}){}",
            i + 1,
            title.as_deref().unwrap_or(&entry.slug),
            entry.slug,
            date.map(|d| format!(" {d}")).unwrap_or_default()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSTS: &str = r#"export interface BlogPost {
	title: string;
	slug: string;
}

export const posts: BlogPost[] = [
	{
		title: "First",
		slug: "first"
	}
];
"#;

    const ROUTE: &str = r#"---
import Layout from '../../layouts/Layout.astro';

export async function getStaticPaths() {
	const posts = [
		'first'
	];
	return posts.map((slug) => ({ params: { slug } }));
}

const { slug } = Astro.params;

const posts: Record<string, {
	title: string;
	content: string;
}> = {
	'first': {
		title: 'First',
		content: `
			<p>Hello { world }, it's me</p>
		`
	}
};

const post = posts[slug as string];
---
<Layout title={post.title}>
	<article set:html={post.content} />
</Layout>
"#;

    const DRAFT: &str = r#"{
        "title": "Second",
        "date": "2025-02-01",
        "slug": "second",
        "excerpt": "More",
        "content": "<p>Two</p>",
        "tags": ["Rust"],
        "readTime": "1 min read"
    }"#;

    fn site(root: &Path) -> Site {
        std::fs::create_dir_all(root.join("src/data")).unwrap();
        std::fs::create_dir_all(root.join("src/pages/blog")).unwrap();
        std::fs::create_dir_all(root.join("blog-tools")).unwrap();
        std::fs::write(root.join("src/data/blog-posts.ts"), POSTS).unwrap();
        std::fs::write(root.join("src/pages/blog/[slug].astro"), ROUTE).unwrap();
        std::fs::write(root.join("blog-tools/second.json"), DRAFT).unwrap();

        let config = Config::load(&root.join("blogsplice.toml")).unwrap();
        Site {
            root: root.to_path_buf(),
            list: config.list_target(),
            keyed: config.keyed_target(),
            paths: config.paths_target(),
            config,
            dry_run: false,
        }
    }

    fn read(site: &Site) -> (String, String) {
        (site.posts().unwrap().text, site.route().unwrap().text)
    }

    #[test]
    fn test_global_options_after_subcommand() {
        use clap::CommandFactory;
        Args::command().debug_assert();

        let args =
            Args::try_parse_from(["blogsplice", "add", "-C", "site", "--config", "b.toml"]).unwrap();
        assert_eq!(args.root, PathBuf::from("site"));
        assert_eq!(args.config, PathBuf::from("b.toml"));
        assert!(matches!(args.command, Command::Add { draft: None }));

        let args = Args::try_parse_from(["blogsplice", "remove", "a", "--dry-run", "-y"]).unwrap();
        assert!(args.dry_run);
        assert_eq!(args.root, PathBuf::from("."));
    }

    #[test]
    fn test_read_missing_document_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.ts");
        let err = Document::read(path.clone()).err().unwrap();
        assert!(format!("{err:#}").contains(&path.display().to_string()));
    }

    #[test]
    fn test_rejected_patch_keeps_its_error() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(dir.path());
        let mut posts = site.posts().unwrap();

        let err = posts
            .apply(|doc| site.list.remove_entry(doc, "nope"))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<PatchError>(),
            Some(&PatchError::EntryNotFound {
                slug: "nope".to_string()
            })
        );
        assert_eq!(posts.text, POSTS);
    }

    #[test]
    fn test_add_then_remove_restores_documents() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(dir.path());

        add(&site, Some(PathBuf::from("second.json"))).unwrap();
        let (posts, route) = read(&site);
        assert!(posts.contains("\t},\n\t{\n\t\ttitle: \"Second\","));
        assert!(route.contains("\t\t'first',\n\t\t'second'\n\t];"));
        assert!(route.contains("\t'second': {\n\t\ttitle: 'Second',"));
        assert_eq!(
            site.published_slugs().unwrap(),
            IndexSet::from(["first".to_string(), "second".to_string()])
        );

        remove(&site, Some("second".to_string()), true).unwrap();
        assert_eq!(read(&site), (POSTS.to_string(), ROUTE.to_string()));
    }

    #[test]
    fn test_failed_patch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(dir.path());
        let route = ROUTE.replace("\t\t'first'\n", "\t\t'first',\n\t\t'second'\n");
        std::fs::write(dir.path().join("src/pages/blog/[slug].astro"), &route).unwrap();

        let err = add(&site, Some(PathBuf::from("second.json"))).unwrap_err();
        assert!(format!("{err:#}").contains("already exists"));
        assert_eq!(read(&site), (POSTS.to_string(), route));
    }

    #[test]
    fn test_remove_unknown_slug_fails() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(dir.path());

        let err = remove(&site, Some("nope".to_string()), true).unwrap_err();
        assert!(format!("{err:#}").contains("no entry with slug \"nope\""));
        assert_eq!(read(&site), (POSTS.to_string(), ROUTE.to_string()));
    }

    #[test]
    fn test_dry_run_leaves_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site {
            dry_run: true,
            ..site(dir.path())
        };

        add(&site, Some(PathBuf::from("second.json"))).unwrap();
        assert_eq!(read(&site), (POSTS.to_string(), ROUTE.to_string()));
    }
}
