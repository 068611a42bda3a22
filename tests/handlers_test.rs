//! Page handler tests.
//!
//! Boot-time dispatch: cover-toggle restore and persistence, sort-order
//! restore and collaborator delegation, and detail-page population against a
//! registered catalog.

use std::cell::RefCell;
use std::rc::Rc;

use pageturn::{
    BookCatalog, BookRecord, CatalogHooks, Clock, Effect, JsonFileStore, MemoryStore,
    NavigationSession, PreferenceStore, SessionConfig, parse_html, prefs,
};

struct FixedClock(u64);

impl Clock for FixedClock {
    fn now_millis(&mut self) -> u64 {
        self.0
    }
}

const BOOKS_PAGE: &str = r#"<html>
<head><title>My Books</title></head>
<body><main>
  <div class="books-grid" id="booksGrid">
    <img class="book-cover" src="images/dune.jpg">
  </div>
  <label class="switch"><input type="checkbox" id="coverToggle"></label>
  <select class="sort-select"></select>
</main></body>
</html>"#;

const DETAILS_PAGE: &str = r#"<html>
<head><title>Book</title></head>
<body><main>
  <div class="book-details">
    <img class="book-cover" id="bookCover">
    <h1 id="bookTitle"></h1>
    <p id="bookAuthor"></p>
    <p id="dateRead"></p>
    <p id="bookDescription"></p>
    <span id="pageCount"></span>
    <span id="publishDate"></span>
    <span id="genre"></span>
  </div>
</main></body>
</html>"#;

fn books_session(store: impl PreferenceStore + 'static) -> NavigationSession {
    NavigationSession::new(
        parse_html(BOOKS_PAGE),
        SessionConfig {
            origin: "https://example.com".to_string(),
            location: "https://example.com/books.html".to_string(),
        },
    )
    .with_clock(FixedClock(500))
    .with_store(store)
}

fn details_session(location: &str) -> NavigationSession {
    NavigationSession::new(
        parse_html(DETAILS_PAGE),
        SessionConfig {
            origin: "https://example.com".to_string(),
            location: location.to_string(),
        },
    )
    .with_clock(FixedClock(500))
}

fn complete_books_styles(session: &mut NavigationSession) {
    session.style_loaded("/css/style.css?v=500");
    session.style_loaded("/css/constellation.css?v=500");
    session.style_loaded("/css/books.css?v=500");
}

fn complete_details_styles(session: &mut NavigationSession) {
    session.style_loaded("/css/style.css?v=500");
    session.style_loaded("/css/constellation.css?v=500");
    session.style_loaded("/css/book-details.css?v=500");
}

fn dune_catalog() -> BookCatalog {
    let mut catalog = BookCatalog::new();
    catalog.insert(
        "42",
        BookRecord::new("Dune", "Herbert")
            .with_cover("images/dune.jpg")
            .with_date_read("March 2024"),
    );
    catalog
}

/// Hooks that record every delegation for later assertions.
#[derive(Clone, Default)]
struct RecordingHooks {
    sorts: Rc<RefCell<Vec<String>>>,
    grid_inits: Rc<RefCell<usize>>,
    details_renders: Rc<RefCell<usize>>,
    handles_details: bool,
}

impl CatalogHooks for RecordingHooks {
    fn sort_books(&mut self, sort_key: &str) -> bool {
        self.sorts.borrow_mut().push(sort_key.to_string());
        true
    }

    fn initialize_books_grid(&mut self) -> bool {
        *self.grid_inits.borrow_mut() += 1;
        true
    }

    fn display_book_details(&mut self) -> bool {
        *self.details_renders.borrow_mut() += 1;
        self.handles_details
    }
}

// ============================================================================
// Cover Toggle
// ============================================================================

#[test]
fn test_toggle_defaults_to_showing_covers() {
    let mut session = books_session(MemoryStore::new());
    session.initialize_handlers();
    complete_books_styles(&mut session);

    let doc = session.document();
    let toggle = doc.get_by_id("coverToggle").unwrap();
    let grid = doc.get_by_id("booksGrid").unwrap();
    assert!(doc.has_attr(toggle, "checked"));
    assert!(!doc.has_class(grid, "hide-covers"));
}

#[test]
fn test_toggle_flips_class_and_persists() {
    let mut session = books_session(MemoryStore::new());
    session.initialize_handlers();
    complete_books_styles(&mut session);

    session.toggle_covers();

    let doc = session.document();
    let toggle = doc.get_by_id("coverToggle").unwrap();
    let grid = doc.get_by_id("booksGrid").unwrap();
    assert!(!doc.has_attr(toggle, "checked"));
    assert!(doc.has_class(grid, "hide-covers"));

    // The stored value is restored as the initial state on the next
    // handler initialization
    session.initialize_handlers();
    let doc = session.document();
    let toggle = doc.get_by_id("coverToggle").unwrap();
    assert!(!doc.has_attr(toggle, "checked"));
    assert!(doc.has_class(doc.get_by_id("booksGrid").unwrap(), "hide-covers"));
}

#[test]
fn test_toggle_survives_across_sessions() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("prefs.json");

    {
        let mut session = books_session(JsonFileStore::open(&path).unwrap());
        session.initialize_handlers();
        complete_books_styles(&mut session);
        session.toggle_covers();
    }

    // A brand new session (fresh document, fresh registry) restores the flag
    let mut session = books_session(JsonFileStore::open(&path).unwrap());
    session.initialize_handlers();
    complete_books_styles(&mut session);

    let doc = session.document();
    assert!(!doc.has_attr(doc.get_by_id("coverToggle").unwrap(), "checked"));
    assert!(doc.has_class(doc.get_by_id("booksGrid").unwrap(), "hide-covers"));
}

#[test]
fn test_toggle_ignored_without_bound_controls() {
    // A page with no toggle markup: the event is a silent no-op
    let mut session = details_session("https://example.com/book-details.html?id=42");
    session.register_catalog(dune_catalog());
    session.initialize_handlers();
    complete_details_styles(&mut session);

    session.toggle_covers();
    assert!(session.take_effects().is_empty());
}

// ============================================================================
// Sort Order
// ============================================================================

#[test]
fn test_sort_restore_and_delegation() {
    let mut store = MemoryStore::new();
    prefs::set_book_sort(&mut store, "author");

    let hooks = RecordingHooks::default();
    let sorts = hooks.sorts.clone();
    let grid_inits = hooks.grid_inits.clone();

    let mut session = books_session(store).with_hooks(hooks);
    session.initialize_handlers();
    complete_books_styles(&mut session);

    // Saved order restored into the selector, grid initialized once bound
    let doc = session.document();
    let select = doc.query_selector(".sort-select").unwrap();
    assert_eq!(doc.attr(select, "value"), Some("author"));
    assert!(*grid_inits.borrow() >= 1);

    // A change persists and delegates to the collaborator
    session.sort_changed("dateRead");
    assert_eq!(sorts.borrow().as_slice(), ["dateRead".to_string()]);
    let doc = session.document();
    let select = doc.query_selector(".sort-select").unwrap();
    assert_eq!(doc.attr(select, "value"), Some("dateRead"));

    // And is restored on the next initialization
    session.initialize_handlers();
    let doc = session.document();
    let select = doc.query_selector(".sort-select").unwrap();
    assert_eq!(doc.attr(select, "value"), Some("dateRead"));
}

// ============================================================================
// Detail Population
// ============================================================================

#[test]
fn test_detail_population_fills_fields() {
    let mut session = details_session("https://example.com/book-details.html?id=42");
    session.register_catalog(dune_catalog());
    session.initialize_handlers();
    complete_details_styles(&mut session);

    let doc = session.document();
    assert_eq!(doc.text_content(doc.get_by_id("bookTitle").unwrap()), "Dune");
    assert_eq!(
        doc.text_content(doc.get_by_id("bookAuthor").unwrap()),
        "By Herbert"
    );
    assert_eq!(
        doc.text_content(doc.get_by_id("dateRead").unwrap()),
        "Finished reading: March 2024"
    );
    let cover = doc.get_by_id("bookCover").unwrap();
    assert_eq!(doc.attr(cover, "src"), Some("images/dune.jpg"));
    assert_eq!(doc.attr(cover, "alt"), Some("Dune"));
}

#[test]
fn test_missing_record_redirects_to_listing() {
    let mut session = details_session("https://example.com/book-details.html?id=999");
    session.register_catalog(dune_catalog());
    session.initialize_handlers();
    complete_details_styles(&mut session);

    assert_eq!(
        session.take_effects(),
        vec![Effect::Navigate {
            url: "books.html".to_string()
        }]
    );
    // No partial population happened
    let doc = session.document();
    assert_eq!(doc.text_content(doc.get_by_id("bookTitle").unwrap()), "");
}

#[test]
fn test_missing_id_redirects_to_listing() {
    let mut session = details_session("https://example.com/book-details.html");
    session.register_catalog(dune_catalog());
    session.initialize_handlers();
    complete_details_styles(&mut session);

    assert_eq!(
        session.take_effects(),
        vec![Effect::Navigate {
            url: "books.html".to_string()
        }]
    );
}

#[test]
fn test_detail_fetches_collaborator_script_when_catalog_missing() {
    let mut session = details_session("https://example.com/book-details.html?id=42");
    session.initialize_handlers();
    complete_details_styles(&mut session);

    // No catalog yet: the engine injected the collaborator script and waits
    let doc = session.document();
    let scripts = doc.query_selector_all("script");
    assert!(
        scripts
            .iter()
            .any(|&s| doc.attr(s, "src") == Some("/js/book-details.js?v=500"))
    );
    assert_eq!(doc.text_content(doc.get_by_id("bookTitle").unwrap()), "");

    // The script's arrival brings the catalog with it
    session.register_catalog(dune_catalog());
    session.script_loaded("/js/book-details.js?v=500");

    let doc = session.document();
    assert_eq!(doc.text_content(doc.get_by_id("bookTitle").unwrap()), "Dune");
}

#[test]
fn test_collaborator_renderer_preempts_direct_population() {
    let hooks = RecordingHooks {
        handles_details: true,
        ..Default::default()
    };
    let renders = hooks.details_renders.clone();

    let mut session =
        details_session("https://example.com/book-details.html?id=42").with_hooks(hooks);
    session.register_catalog(dune_catalog());
    session.initialize_handlers();
    complete_details_styles(&mut session);

    assert_eq!(*renders.borrow(), 1);
    // The collaborator rendered; the engine left the fields alone
    let doc = session.document();
    assert_eq!(doc.text_content(doc.get_by_id("bookTitle").unwrap()), "");
}

#[test]
fn test_detail_image_pass_is_deferred_one_turn() {
    let mut session = details_session("https://example.com/book-details.html?id=42");
    session.register_catalog(dune_catalog());
    session.initialize_handlers();
    complete_details_styles(&mut session);

    // Population ran, but the image pass waits one host-pumped turn
    let doc = session.document();
    let cover = doc.get_by_id("bookCover").unwrap();
    assert!(!doc.has_attr(cover, "data-sized"));

    session.run_deferred();

    let doc = session.document();
    let cover = doc.get_by_id("bookCover").unwrap();
    assert_eq!(doc.attr(cover, "data-sized"), Some("true"));
    assert_eq!(doc.style_property(cover, "width").as_deref(), Some("300px"));
    assert!(doc.has_class(cover, "detail-view"));
}

// ============================================================================
// Pages Without Markers
// ============================================================================

#[test]
fn test_plain_page_boot_is_a_no_op() {
    let mut session = NavigationSession::new(
        parse_html("<html><head><title>About</title></head><body><main></main></body></html>"),
        SessionConfig {
            origin: "https://example.com".to_string(),
            location: "https://example.com/about.html".to_string(),
        },
    )
    .with_clock(FixedClock(500));

    session.initialize_handlers();

    // No page markers: no stylesheet loads requested, nothing pending
    let doc = session.document();
    assert!(doc.query_selector_all(r#"link[rel="stylesheet"]"#).is_empty());
    assert!(!session.is_busy());
    assert!(session.take_effects().is_empty());
}
