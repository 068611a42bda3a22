//! Persisted UI preferences.
//!
//! Two small flags survive across visits: whether cover images are shown and
//! the chosen sort order. Reads happen at handler initialization, writes on
//! user interaction, last write wins.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use log::warn;

use crate::error::Result;

/// Key for the cover-visibility flag (`"true"`/`"false"`).
pub const SHOW_COVERS: &str = "showCovers";

/// Key for the sort-order string.
pub const BOOK_SORT: &str = "bookSort";

/// Durable key-value storage for UI preferences.
///
/// In a browser host this is localStorage; natively it's a JSON file; tests
/// use the in-memory store.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// Whether covers should be shown. Anything but a stored `"false"` means yes.
pub fn show_covers(store: &dyn PreferenceStore) -> bool {
    store.get(SHOW_COVERS).as_deref() != Some("false")
}

pub fn set_show_covers(store: &mut dyn PreferenceStore, value: bool) {
    store.set(SHOW_COVERS, if value { "true" } else { "false" });
}

/// The saved sort order, if the user ever picked one.
pub fn book_sort(store: &dyn PreferenceStore) -> Option<String> {
    store.get(BOOK_SORT)
}

pub fn set_book_sort(store: &mut dyn PreferenceStore, value: &str) {
    store.set(BOOK_SORT, value);
}

/// Volatile store for tests and hosts that bring their own persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// JSON-file-backed store, write-through on every set.
///
/// A missing file means no preferences yet. Write failures are logged and
/// otherwise ignored; preference persistence is best-effort by design.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, values })
    }

    fn flush(&self) {
        let rendered = match serde_json::to_string_pretty(&self.values) {
            Ok(r) => r,
            Err(e) => {
                warn!("failed to serialize preferences: {e}");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, rendered) {
            warn!("failed to persist preferences to {}: {e}", self.path.display());
        }
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        self.flush();
    }
}
