//! Category directory.
//!
//! Categories are not created by the content engine. The directory is a
//! read-only lookup, seeded at startup from a TOML file, used to check that
//! submitted content names a real category and to denormalize its name and
//! description onto the item.
//!
//! ```toml
//! [[category]]
//! slug = "slang-vocab"
//! name = "Slang & Vocabulary"
//! description = "Everyday words and phrases"
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::content::error::{ContentError, ContentResult};
use crate::models::CategoryRef;

#[derive(Debug, Deserialize)]
struct CategoryFile {
    #[serde(default)]
    category: Vec<CategoryEntry>,
}

#[derive(Debug, Deserialize)]
struct CategoryEntry {
    slug: String,
    name: String,
    #[serde(default)]
    description: String,
}

/// Known categories keyed by slug.
#[derive(Debug, Clone, Default)]
pub struct CategoryRegistry {
    by_slug: HashMap<String, CategoryRef>,
    order: Vec<String>,
}

impl CategoryRegistry {
    /// Build a registry from category references. Later duplicates of a slug
    /// are ignored.
    pub fn new(categories: impl IntoIterator<Item = CategoryRef>) -> Self {
        let mut registry = Self::default();
        for category in categories {
            if registry.by_slug.contains_key(&category.slug) {
                continue;
            }
            registry.order.push(category.slug.clone());
            registry.by_slug.insert(category.slug.clone(), category);
        }
        registry
    }

    /// Parse a TOML category file.
    pub fn from_toml(source: &str) -> Result<Self> {
        let file: CategoryFile = toml::from_str(source).context("failed to parse category file")?;
        for entry in &file.category {
            if !is_valid_slug(&entry.slug) {
                anyhow::bail!(
                    "invalid category slug {:?}: use lowercase letters, digits, and hyphens",
                    entry.slug
                );
            }
        }
        Ok(Self::new(file.category.into_iter().map(|e| CategoryRef {
            slug: e.slug,
            name: e.name,
            description: e.description,
        })))
    }

    /// Load a TOML category file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read category file {}", path.display()))?;
        let registry = Self::from_toml(&source)?;
        info!(path = %path.display(), categories = registry.len(), "category directory loaded");
        Ok(registry)
    }

    /// Look up a category by slug.
    pub fn get(&self, slug: &str) -> Option<&CategoryRef> {
        self.by_slug.get(slug)
    }

    /// Resolve a contributor-supplied slug.
    ///
    /// A blank slug resolves to no category. A non-blank slug that names no
    /// known category is a schema error.
    pub fn resolve(&self, slug: &str) -> ContentResult<Option<CategoryRef>> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Ok(None);
        }
        self.get(slug)
            .cloned()
            .map(Some)
            .ok_or_else(|| ContentError::schema("categorySlug", format!("unknown category {slug:?}")))
    }

    /// All categories in file order.
    pub fn all(&self) -> Vec<&CategoryRef> {
        self.order.iter().filter_map(|s| self.by_slug.get(s)).collect()
    }

    pub fn len(&self) -> usize {
        self.by_slug.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slug.is_empty()
    }
}

/// Slugs are lowercase ASCII letters, digits, and single hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 64
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
