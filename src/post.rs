use serde::Deserialize;
use thiserror::Error;

use crate::scanner::{escape, Quote};

/// A post as written in a JSON draft. Everything is optional here so that a draft with missing
/// fields can still be read and reported on.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub title: Option<String>,
    pub date: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub read_time: Option<String>,
    pub pinned: Option<bool>,
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required field(s): {}", .missing.join(", "))]
pub struct MissingFields {
    pub missing: Vec<&'static str>,
}

/// A post with every required field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogPost {
    pub title: String,
    pub date: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub tags: Vec<String>,
    pub read_time: String,
    pub pinned: Option<bool>,
    pub author: Option<String>,
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

impl Draft {
    /// Required fields (by their JSON name) that are absent or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let strings = [
            ("title", &self.title),
            ("date", &self.date),
            ("slug", &self.slug),
            ("excerpt", &self.excerpt),
            ("content", &self.content),
        ];
        for (name, value) in strings {
            if !present(value) {
                missing.push(name);
            }
        }
        if self.tags.is_none() {
            missing.push("tags");
        }
        if !present(&self.read_time) {
            missing.push("readTime");
        }
        missing
    }

    pub fn validate(self) -> Result<BlogPost, MissingFields> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(MissingFields { missing });
        }

        // All required fields are present past this point.
        Ok(BlogPost {
            title: self.title.unwrap_or_default(),
            date: self.date.unwrap_or_default(),
            slug: self.slug.unwrap_or_default().trim().to_string(),
            excerpt: self.excerpt.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            read_time: self.read_time.unwrap_or_default(),
            pinned: self.pinned,
            author: self.author.filter(|a| !a.trim().is_empty()),
        })
    }
}

fn quoted(value: &str, quote: Quote) -> String {
    let q = quote.as_char();
    format!("{q}{}{q}", escape(value, quote))
}

fn quoted_list(values: &[String], quote: Quote) -> String {
    let items: Vec<String> = values.iter().map(|v| quoted(v, quote)).collect();
    format!("[{}]", items.join(", "))
}

/// Lay out `fields` one per line at two levels of `unit`, closing brace at one level.
fn object_literal(fields: &[String], unit: &str) -> String {
    let body: Vec<String> = fields.iter().map(|f| format!("{unit}{unit}{f}")).collect();
    format!("{{\n{}\n{unit}}}", body.join(",\n"))
}

impl BlogPost {
    pub fn with_default_author(mut self, author: Option<&str>) -> Self {
        if self.author.is_none() {
            self.author = author.map(ToString::to_string);
        }
        self
    }

    /// The entry for the `posts` metadata array, with double-quoted strings.
    pub fn list_entry(&self, unit: &str) -> String {
        let q = |v: &str| quoted(v, Quote::Double);
        let mut fields = vec![
            format!("title: {}", q(&self.title)),
            format!("excerpt: {}", q(&self.excerpt)),
            format!("date: {}", q(&self.date)),
            format!("slug: {}", q(&self.slug)),
            format!("tags: {}", quoted_list(&self.tags, Quote::Double)),
            format!("readTime: {}", q(&self.read_time)),
        ];
        if let Some(pinned) = self.pinned {
            fields.push(format!("pinned: {pinned}"));
        }
        if let Some(author) = &self.author {
            fields.push(format!("author: {}", q(author)));
        }
        object_literal(&fields, unit)
    }

    /// The value stored under the post's slug in the route template's `posts` object. The body
    /// goes into a template literal, indented one level deeper than the fields.
    pub fn keyed_value(&self, unit: &str) -> String {
        let q = |v: &str| quoted(v, Quote::Single);
        let content: Vec<String> = self
            .content
            .trim_matches(|c: char| c == '\n' || c == '\r')
            .lines()
            .map(|line| {
                if line.trim().is_empty() {
                    String::new()
                } else {
                    format!("{unit}{unit}{unit}{}", escape(line, Quote::Backtick))
                }
            })
            .collect();
        let fields = vec![
            format!("title: {}", q(&self.title)),
            format!("date: {}", q(&self.date)),
            format!("readTime: {}", q(&self.read_time)),
            format!("tags: {}", quoted_list(&self.tags, Quote::Single)),
            format!("content: `\n{}\n{unit}{unit}`", content.join("\n")),
        ];
        object_literal(&fields, unit)
    }
}
