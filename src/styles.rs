//! Per-page asset policy.
//!
//! Maps a [`PageType`] to the stylesheets it requires and the behavior script
//! that drives it. The mapping is static; only the base path and the
//! cache-busting token vary.

use crate::classify::PageType;

/// Stylesheets shared by every page, in load order.
const COMMON_SHEETS: [&str; 2] = ["style", "constellation"];

/// Resolves asset URLs for a page type.
#[derive(Debug, Clone)]
pub struct StylePolicy {
    base_path: String,
}

impl StylePolicy {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// The ordered stylesheet set a page type requires, each suffixed with
    /// the cache-busting token for this load pass.
    pub fn stylesheets_for(&self, page: PageType, token: u64) -> Vec<String> {
        let mut names: Vec<&str> = COMMON_SHEETS.to_vec();
        match page {
            PageType::Books => names.push("books"),
            PageType::BookDetails => names.push("book-details"),
            PageType::Other => {}
        }

        names
            .iter()
            .map(|name| format!("{}/css/{}.css?v={}", self.base_path, name, token))
            .collect()
    }

    /// The behavior script for a page type, without a cache token (the
    /// loader stamps scripts at injection time).
    pub fn behavior_script_for(&self, page: PageType) -> Option<String> {
        let name = match page {
            PageType::Books => "books",
            PageType::BookDetails => "book-details",
            PageType::Other => return None,
        };
        Some(format!("{}/js/{}.js", self.base_path, name))
    }
}
