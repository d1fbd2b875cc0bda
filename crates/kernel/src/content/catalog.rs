//! Catalog projection.
//!
//! The learner-facing catalog is derived on every read from the store's
//! items: approved items only, grouped by category. Nothing is cached.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{CategoryRef, ContentItem, ContentStatus};

/// Approved items sharing a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGroup {
    /// Metadata from the first item seen in this category.
    pub category: CategoryRef,
    pub items: Vec<ContentItem>,
}

/// Group approved items by category slug.
///
/// Groups appear in the order their category is first seen, and items keep
/// the order they had in `items`. Items with any other status are dropped.
pub fn project_catalog<'a>(items: impl IntoIterator<Item = &'a ContentItem>) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in items {
        if item.status != ContentStatus::Approved {
            continue;
        }
        match index.get(item.category_slug.as_str()) {
            Some(&i) => groups[i].items.push(item.clone()),
            None => {
                // Approved items always carry a category.
                let Some(category) = item.category() else {
                    continue;
                };
                index.insert(item.category_slug.as_str(), groups.len());
                groups.push(CategoryGroup {
                    category,
                    items: vec![item.clone()],
                });
            }
        }
    }

    groups
}
