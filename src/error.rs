//! Error types for pageturn operations.

use thiserror::Error;

/// Errors that can occur while driving a navigation session.
#[derive(Error, Debug)]
pub enum Error {
    /// A document that should participate in a content swap has no `<main>`
    /// region. Treated like a fetch failure: the session falls back to a
    /// native navigation.
    #[error("document has no <main> content region")]
    MissingContentRegion,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
