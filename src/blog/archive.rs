//! The site's own long-form posts: markdown files with a `---` delimited
//! YAML header, the layout the content folder of the site already uses.
//!
//! ```text
//! ---
//! title: Signals in practice
//! order: 7
//! datePublished: 03.11.2024
//! tags: angular, signals
//! readTime: 6
//! ---
//! Body in markdown...
//! ```

use std::{
    cmp::Reverse,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// How many tags a blog card shows.
pub const CARD_TAG_LIMIT: usize = 4;

const FRONTMATTER_FENCE: &str = "---";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostAttributes {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub order: u32,
    /// `DD.MM.YYYY`
    pub date_published: String,
    #[serde(default)]
    pub seo_title: String,
    #[serde(default)]
    pub seo_description: String,
    /// Comma separated, as authored.
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub read_time: u32,
    #[serde(default)]
    pub cover_image: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArchivePost {
    pub slug: String,
    pub attributes: PostAttributes,
    pub tags: Vec<String>,
    pub content: String,
}

impl ArchivePost {
    /// Parses one markdown file. `fallback_slug` is used when the header
    /// does not name a slug (normally the file stem).
    pub fn parse(source: &str, fallback_slug: &str) -> Result<Self> {
        let (header, content) = split_frontmatter(source)
            .ok_or_else(|| anyhow!("missing {FRONTMATTER_FENCE} frontmatter block"))?;
        let attributes: PostAttributes =
            serde_yaml::from_str(header).context("invalid frontmatter")?;

        let slug = attributes
            .slug
            .clone()
            .filter(|slug| !slug.trim().is_empty())
            .unwrap_or_else(|| fallback_slug.to_string());
        let tags = split_tags(&attributes.tags);

        Ok(Self {
            slug,
            attributes,
            tags,
            content: content.to_string(),
        })
    }

    pub fn card_tags(&self) -> &[String] {
        &self.tags[..self.tags.len().min(CARD_TAG_LIMIT)]
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlogArchive {
    posts: Vec<ArchivePost>,
}

impl BlogArchive {
    /// Highest `order` first; equal orders fall back to slug so the listing
    /// does not depend on directory iteration order.
    pub fn from_posts(mut posts: Vec<ArchivePost>) -> Self {
        posts.sort_by(|a, b| {
            Reverse(a.attributes.order)
                .cmp(&Reverse(b.attributes.order))
                .then_with(|| a.slug.cmp(&b.slug))
        });
        Self { posts }
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("failed to read blog directory {}", dir.display()))?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to list {}", dir.display()))?
                .path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("md") {
                paths.push(path);
            }
        }

        let mut posts = Vec::with_capacity(paths.len());
        for path in paths {
            let source = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let stem = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default();
            let post = ArchivePost::parse(&source, stem)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            posts.push(post);
        }

        Ok(Self::from_posts(posts))
    }

    pub fn posts(&self) -> &[ArchivePost] {
        &self.posts
    }

    pub fn latest(&self, count: usize) -> &[ArchivePost] {
        &self.posts[..self.posts.len().min(count)]
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<&ArchivePost> {
        self.posts.iter().find(|post| post.slug == slug)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

fn split_frontmatter(source: &str) -> Option<(&str, &str)> {
    let rest = source.trim_start_matches('\u{feff}').strip_prefix(FRONTMATTER_FENCE)?;
    let rest = strip_line_break(rest)?;

    let (header, after) = if let Some(after) = rest.strip_prefix(FRONTMATTER_FENCE) {
        ("", after)
    } else {
        let end = rest.find(&format!("\n{FRONTMATTER_FENCE}"))?;
        (
            rest[..end].trim_end_matches('\r'),
            &rest[end + 1 + FRONTMATTER_FENCE.len()..],
        )
    };

    Some((header, strip_line_break(after).unwrap_or(after)))
}

fn strip_line_break(text: &str) -> Option<&str> {
    text.strip_prefix("\r\n").or_else(|| text.strip_prefix('\n'))
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
