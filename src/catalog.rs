//! Catalog collaborator contract.
//!
//! The engine never builds or sorts the catalog itself; the rendering
//! collaborator owns the data and the grid. What used to be ambient
//! capability probing (checking for optional globals before calling them) is
//! an explicit trait the collaborator registers with the session at startup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single catalog entry, keyed externally by an opaque id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    pub cover_image: String,
    pub date_read: String,
    pub description: String,
    pub pages: u32,
    pub publish_date: String,
    pub genre: String,
}

impl BookRecord {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Default::default()
        }
    }

    pub fn with_cover(mut self, cover_image: impl Into<String>) -> Self {
        self.cover_image = cover_image.into();
        self
    }

    pub fn with_date_read(mut self, date_read: impl Into<String>) -> Self {
        self.date_read = date_read.into();
        self
    }
}

/// The id → record mapping supplied by the data collaborator.
///
/// Read-only from the engine's point of view: records are looked up by the id
/// in the current URL's query string, never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookCatalog {
    books: HashMap<String, BookRecord>,
}

impl BookCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog out of the JSON shape the data collaborator publishes.
    pub fn from_json(json: &str) -> Result<Self> {
        let books = serde_json::from_str(json)?;
        Ok(Self { books })
    }

    pub fn insert(&mut self, id: impl Into<String>, record: BookRecord) {
        self.books.insert(id.into(), record);
    }

    pub fn get(&self, id: &str) -> Option<&BookRecord> {
        self.books.get(id)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

/// Optional behaviors the rendering collaborator can provide.
///
/// Every method defaults to "not provided" (`false`); the engine then falls
/// back to its own handling or skips the step. Collaborators implement only
/// what they support.
pub trait CatalogHooks {
    /// Re-sort the rendered grid by the given key. `true` when handled.
    fn sort_books(&mut self, _sort_key: &str) -> bool {
        false
    }

    /// (Re)build the grid after a swap. `true` when handled.
    fn initialize_books_grid(&mut self) -> bool {
        false
    }

    /// Render the whole detail view. `true` when handled; `false` lets the
    /// engine populate the detail fields from the registered catalog.
    fn display_book_details(&mut self) -> bool {
        false
    }
}

/// Default hooks for hosts with no rendering collaborator.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl CatalogHooks for NoHooks {}
