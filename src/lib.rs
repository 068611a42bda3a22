//! # pageturn
//!
//! A single-page-application style navigation engine for static book-catalog
//! sites.
//!
//! ## Features
//!
//! - Intercepts in-site link clicks and back/forward navigation, swapping the
//!   `<main>` content region instead of reloading the document
//! - Lazily loads per-page stylesheets and behavior scripts, with a
//!   join-before-advance barrier over concurrently loading sheets
//! - Persists small UI preferences (cover visibility, sort order) across
//!   visits
//! - Normalizes cover-image sizing after every content swap
//!
//! The engine is host-agnostic: the embedding environment (a browser shell,
//! WASM glue, or a test harness) performs the actual network loads and feeds
//! completion events back into the [`NavigationSession`], executing the
//! [`Effect`]s it emits in return.
//!
//! ## Quick Start
//!
//! ```
//! use pageturn::{Effect, NavigationSession, SessionConfig, parse_html};
//!
//! let doc = parse_html(
//!     "<html><head><title>Home</title></head><body><main></main></body></html>",
//! );
//! let mut session = NavigationSession::new(
//!     doc,
//!     SessionConfig {
//!         origin: "https://example.com".to_string(),
//!         location: "https://example.com/index.html".to_string(),
//!     },
//! );
//! session.initialize_handlers();
//!
//! // A link is activated; the session asks the host to fetch the markup.
//! session.handle_click("https://example.com/books.html");
//! for effect in session.take_effects() {
//!     match effect {
//!         Effect::FetchMarkup { url } => {
//!             // fetch `url`, then call session.markup_loaded(&url, &bytes)
//!             // (or session.markup_failed(&url) on error)
//!         }
//!         _ => {}
//!     }
//! }
//! ```

pub mod catalog;
pub mod classify;
pub mod dom;
pub mod error;
pub mod images;
pub mod loader;
pub mod prefs;
pub mod session;
pub mod styles;
pub mod url;
pub mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use catalog::{BookCatalog, BookRecord, CatalogHooks, NoHooks};
pub use classify::{PageType, classify};
pub use dom::{Document, NodeId, parse_bytes, parse_html};
pub use error::{Error, Result};
pub use images::{ImageWatch, normalize_images};
pub use prefs::{JsonFileStore, MemoryStore, PreferenceStore};
pub use session::{BUSY_CLASS, ClickDisposition, Effect, NavOrigin, NavigationSession, SessionConfig};
pub use styles::StylePolicy;
pub use util::{Clock, SystemClock};
