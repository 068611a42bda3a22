//! Navigation session: the controller driving page transitions.
//!
//! The session owns the live document and every piece of cross-navigation
//! state (loaded-styles registry, base path, preference store, registered
//! catalog collaborators). The host feeds it user intent (`handle_click`,
//! `handle_pop`, `toggle_covers`, ...) and I/O completions (`markup_loaded`,
//! `style_loaded`, ...), and executes the [`Effect`]s the session emits in
//! return.
//!
//! A navigation is an explicit state machine held in a single [`Stage`]
//! field: Idle → awaiting markup → awaiting stylesheets (a join over every
//! sheet injected this pass) → swap → awaiting the page's behavior script →
//! handler dispatch → Idle. Per-resource failures count as completion and
//! never stall the machine; only the markup fetch itself can abort a
//! navigation, falling back to native browser navigation.

use std::collections::{BTreeSet, VecDeque};

use log::{debug, error, info, warn};

use crate::catalog::{BookCatalog, CatalogHooks, NoHooks};
use crate::classify::{PageType, classify};
use crate::dom::{Document, NodeId, parse_bytes};
use crate::error::{Error, Result};
use crate::images::{self, ImageWatch};
use crate::loader::{self, Injection};
use crate::prefs::{self, MemoryStore, PreferenceStore};
use crate::styles::StylePolicy;
use crate::url;
use crate::util::{Clock, SystemClock};

/// Body class marking an in-flight navigation (blocks interaction via CSS).
pub const BUSY_CLASS: &str = "page-loading";

const BUSY_STYLE_ID: &str = "page-loading-style";

const BUSY_RULES: &str = "
.page-loading {
    cursor: progress;
    opacity: 0.8;
    transition: opacity 0.3s ease;
}
.page-loading * {
    pointer-events: none;
}
";

/// Where the listing lives, for the missing-record redirect.
const LISTING_PAGE: &str = "books.html";

/// What triggered a navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavOrigin {
    /// An intercepted link activation; fallback is full native navigation.
    Click,
    /// A browser back/forward event; fallback is a full reload.
    Pop,
}

/// A command the session needs the host to execute.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Effect {
    /// GET the markup at `url` and report back via `markup_loaded` /
    /// `markup_failed`.
    FetchMarkup { url: String },
    /// Push a history entry for `url` (the document is already swapped).
    PushHistory { url: String },
    /// Perform a full, native navigation to `url`.
    Navigate { url: String },
    /// Reload the current document.
    Reload,
}

/// Whether a link activation was taken over by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickDisposition {
    /// The session is handling it; the host must suppress the default
    /// navigation and execute the emitted effects.
    Intercepted,
    /// Out-of-origin (or otherwise uninteresting): let the browser navigate.
    NotIntercepted,
}

/// Page-marker branches dispatched by `initialize_handlers`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PageBranch {
    Books,
    BookDetails,
}

impl PageBranch {
    fn page_type(self) -> PageType {
        match self {
            PageBranch::Books => PageType::Books,
            PageBranch::BookDetails => PageType::BookDetails,
        }
    }
}

/// Work postponed by one host-pumped turn (the macrotask analogue).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    NormalizeImages,
}

/// What to do once the current style join completes.
enum AfterStyles {
    /// Navigation flow: swap in the fetched document, then dispatch.
    Swap {
        origin: NavOrigin,
        url: String,
        fetched: Document,
        page: PageType,
    },
    /// Boot flow: run a handler branch, then continue with the rest.
    Branch {
        branch: PageBranch,
        rest: VecDeque<PageBranch>,
    },
}

/// What to do once the awaited script signals.
enum AfterScript {
    /// Navigation dispatch for a books page.
    BooksDispatch,
    /// Navigation dispatch for a detail page.
    DetailsDispatch,
    /// The detail-population script fetched because no catalog was
    /// registered; populate and continue with the remaining boot branches.
    DetailsPopulate { rest: VecDeque<PageBranch> },
}

/// The single stage field of the navigation state machine.
enum Stage {
    Idle,
    AwaitingMarkup {
        origin: NavOrigin,
        url: String,
    },
    AwaitingStyles {
        /// The join barrier: stylesheet URLs injected this pass whose
        /// load/error signal is still outstanding.
        pending: BTreeSet<String>,
        next: AfterStyles,
    },
    AwaitingScript {
        url: String,
        next: AfterScript,
    },
}

/// Controls the session binds to after handler initialization. Bindings die
/// with the content swap, exactly like the listeners they model.
#[derive(Debug, Default)]
struct Bindings {
    cover_toggle: Option<NodeId>,
    books_grid: Option<NodeId>,
    sort_select: Option<NodeId>,
}

/// Everything the session needs to know about where it woke up.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The document origin, e.g. `https://example.com`. Only same-origin
    /// links are intercepted.
    pub origin: String,
    /// The full URL of the initially loaded page.
    pub location: String,
}

/// A navigation session over one live document.
///
/// Created once per full page load; in-place navigations reuse it, a real
/// reload discards it (which is what resets the loaded-styles registry).
pub struct NavigationSession {
    document: Document,
    origin: String,
    current_url: String,
    policy: StylePolicy,
    loaded_styles: BTreeSet<String>,
    stage: Stage,
    effects: Vec<Effect>,
    deferred: VecDeque<Deferred>,
    watch: ImageWatch,
    bindings: Bindings,
    store: Box<dyn PreferenceStore>,
    hooks: Box<dyn CatalogHooks>,
    catalog: Option<BookCatalog>,
    clock: Box<dyn Clock>,
}

impl NavigationSession {
    /// Create a session over the initially loaded document.
    ///
    /// Defaults: in-memory preferences, no catalog collaborator, wall-clock
    /// cache tokens. Use the `with_*` builders to replace them.
    pub fn new(mut document: Document, config: SessionConfig) -> Self {
        let base_path = url::base_path(&config.location);
        loader::ensure_style_block(&mut document, BUSY_STYLE_ID, BUSY_RULES);
        info!("navigation session initialized with base path {base_path:?}");

        Self {
            document,
            origin: config.origin,
            current_url: config.location,
            policy: StylePolicy::new(base_path),
            loaded_styles: BTreeSet::new(),
            stage: Stage::Idle,
            effects: Vec::new(),
            deferred: VecDeque::new(),
            watch: ImageWatch::new(),
            bindings: Bindings::default(),
            store: Box::new(MemoryStore::new()),
            hooks: Box::new(NoHooks),
            catalog: None,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_store(mut self, store: impl PreferenceStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn with_hooks(mut self, hooks: impl CatalogHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Register the data collaborator's catalog. Usually called at startup,
    /// or by the host's script-load handling once `book-details.js` arrives.
    pub fn register_catalog(&mut self, catalog: BookCatalog) {
        self.catalog = Some(catalog);
    }

    /// The live document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The live document, mutably (host-side event plumbing may need it).
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// The URL the session currently considers displayed.
    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    /// Whether the busy indicator is up.
    pub fn is_busy(&self) -> bool {
        self.document
            .body()
            .is_some_and(|b| self.document.has_class(b, BUSY_CLASS))
    }

    /// Cache-busted stylesheet URLs confirmed loaded this document session.
    pub fn loaded_styles(&self) -> &BTreeSet<String> {
        &self.loaded_styles
    }

    /// Drain the effects queued since the last drain. Hosts call this after
    /// every event method and execute the commands in order.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    // ── boot ────────────────────────────────────────────────────────────

    /// Boot entry point (the DOMContentLoaded analogue): inspect the live
    /// document for page markers and run the matching handler branches, each
    /// behind its stylesheet join.
    pub fn initialize_handlers(&mut self) {
        let mut branches = VecDeque::new();
        if self.document.query_selector(".books-grid").is_some() {
            branches.push_back(PageBranch::Books);
        }
        if self.document.query_selector(".book-details").is_some() {
            branches.push_back(PageBranch::BookDetails);
        }

        if branches.is_empty() {
            self.finish_pass();
            return;
        }
        self.next_branch(branches);
    }

    fn next_branch(&mut self, mut rest: VecDeque<PageBranch>) {
        match rest.pop_front() {
            Some(branch) => {
                self.begin_style_pass(branch.page_type(), AfterStyles::Branch { branch, rest });
            }
            None => self.finish_pass(),
        }
    }

    fn run_branch(&mut self, branch: PageBranch, rest: VecDeque<PageBranch>) {
        match branch {
            PageBranch::Books => {
                self.books_handlers();
                images::normalize_images(&mut self.document, &mut self.watch);
                self.next_branch(rest);
            }
            PageBranch::BookDetails => self.details_population(rest),
        }
    }

    // ── navigation ──────────────────────────────────────────────────────

    /// A link was activated. Same-origin links are intercepted and fetched
    /// out-of-band; everything else proceeds as native navigation.
    pub fn handle_click(&mut self, href: &str) -> ClickDisposition {
        if !url::same_origin(href, &self.origin) {
            return ClickDisposition::NotIntercepted;
        }
        self.start_navigation(NavOrigin::Click, href);
        ClickDisposition::Intercepted
    }

    /// The browser moved through history; `url` is the location it restored.
    pub fn handle_pop(&mut self, url: &str) {
        self.current_url = url.to_string();
        self.start_navigation(NavOrigin::Pop, url);
    }

    fn start_navigation(&mut self, origin: NavOrigin, target: &str) {
        // An in-flight navigation is simply replaced: overlapping
        // navigations are last-write-wins, not queued.
        if !matches!(self.stage, Stage::Idle) {
            warn!("navigation to {target} replaces one already in flight");
        }
        self.set_busy(true);
        self.stage = Stage::AwaitingMarkup {
            origin,
            url: target.to_string(),
        };
        self.effects.push(Effect::FetchMarkup {
            url: target.to_string(),
        });
    }

    /// The host fetched the navigation target's markup.
    pub fn markup_loaded(&mut self, target: &str, bytes: &[u8]) {
        let stage = std::mem::replace(&mut self.stage, Stage::Idle);
        let (origin, url) = match stage {
            Stage::AwaitingMarkup { origin, url } if url == target => (origin, url),
            other => {
                debug!("markup for {target} arrived with no navigation awaiting it");
                self.stage = other;
                return;
            }
        };

        let fetched = parse_bytes(bytes);
        let page = classify(&url, &fetched);
        debug!("navigation to {url} classified as {page:?}");

        self.begin_style_pass(
            page,
            AfterStyles::Swap {
                origin,
                url,
                fetched,
                page,
            },
        );
    }

    /// The navigation fetch failed; fall back to a native load.
    pub fn markup_failed(&mut self, target: &str) {
        let stage = std::mem::replace(&mut self.stage, Stage::Idle);
        let (origin, url) = match stage {
            Stage::AwaitingMarkup { origin, url } if url == target => (origin, url),
            other => {
                debug!("fetch failure for {target} with no navigation awaiting it");
                self.stage = other;
                return;
            }
        };
        error!("navigation fetch failed for {url}, falling back");
        self.set_busy(false);
        self.push_fallback(origin, url);
    }

    fn push_fallback(&mut self, origin: NavOrigin, url: String) {
        match origin {
            NavOrigin::Click => self.effects.push(Effect::Navigate { url }),
            NavOrigin::Pop => self.effects.push(Effect::Reload),
        }
    }

    // ── stylesheet join ─────────────────────────────────────────────────

    fn begin_style_pass(&mut self, page: PageType, next: AfterStyles) {
        let token = self.clock.now_millis();
        let mut pending = BTreeSet::new();

        for sheet in self.policy.stylesheets_for(page, token) {
            if self.loaded_styles.contains(&sheet) {
                continue;
            }
            match loader::inject_stylesheet(&mut self.document, &sheet) {
                // A matching element already exists, so completion is
                // immediate; record the stamped URL like any other pass.
                Injection::AlreadyPresent => {
                    self.loaded_styles.insert(sheet);
                }
                Injection::Injected(url) => {
                    pending.insert(url);
                }
            }
        }

        if pending.is_empty() {
            self.advance_after_styles(next);
        } else {
            self.stage = Stage::AwaitingStyles { pending, next };
        }
    }

    /// The host finished loading an injected stylesheet.
    pub fn style_loaded(&mut self, sheet: &str) {
        self.style_done(sheet, true);
    }

    /// An injected stylesheet failed to load. Logged and treated as loaded:
    /// a broken stylesheet never blocks the chain.
    pub fn style_failed(&mut self, sheet: &str) {
        warn!("failed to load stylesheet: {sheet}");
        self.style_done(sheet, false);
    }

    fn style_done(&mut self, sheet: &str, _ok: bool) {
        let stage = std::mem::replace(&mut self.stage, Stage::Idle);
        let (mut pending, next) = match stage {
            Stage::AwaitingStyles { pending, next } => (pending, next),
            other => {
                debug!("style signal for {sheet} outside a style pass");
                self.stage = other;
                return;
            }
        };

        if !pending.remove(sheet) {
            debug!("style signal for {sheet} not part of the current join");
            self.stage = Stage::AwaitingStyles { pending, next };
            return;
        }
        self.loaded_styles.insert(sheet.to_string());

        // Join barrier: the pass only advances once every sheet injected for
        // it has signaled, success or not.
        if pending.is_empty() {
            self.advance_after_styles(next);
        } else {
            self.stage = Stage::AwaitingStyles { pending, next };
        }
    }

    fn advance_after_styles(&mut self, next: AfterStyles) {
        match next {
            AfterStyles::Swap {
                origin,
                url,
                fetched,
                page,
            } => self.swap_and_dispatch(origin, url, fetched, page),
            AfterStyles::Branch { branch, rest } => self.run_branch(branch, rest),
        }
    }

    // ── swap + dispatch ─────────────────────────────────────────────────

    fn swap_and_dispatch(
        &mut self,
        origin: NavOrigin,
        target: String,
        fetched: Document,
        page: PageType,
    ) {
        if let Err(e) = self.swap_content(&fetched) {
            error!("content swap failed for {target}: {e}");
            self.finish_pass();
            self.push_fallback(origin, target);
            return;
        }

        if origin == NavOrigin::Click {
            self.effects.push(Effect::PushHistory {
                url: target.clone(),
            });
            self.current_url = target.clone();
        }

        match page {
            PageType::Books => {
                self.await_script(page, AfterScript::BooksDispatch);
            }
            PageType::BookDetails => {
                self.await_script(page, AfterScript::DetailsDispatch);
            }
            PageType::Other => {
                // No behavior script; re-inspect the swapped content like a
                // fresh boot (a no-op when no markers are present).
                self.initialize_handlers();
            }
        }
    }

    /// Replace the live `<main>` region with the fetched document's and copy
    /// the title over. Old bindings die with the old content, exactly like
    /// the listeners they model.
    fn swap_content(&mut self, fetched: &Document) -> Result<()> {
        let live_main = self.document.main().ok_or(Error::MissingContentRegion)?;
        let fetched_main = fetched.main().ok_or(Error::MissingContentRegion)?;

        self.bindings = Bindings::default();
        self.document.detach_children(live_main);
        for child in fetched.children(fetched_main) {
            if let Some(imported) = self.document.import_node(fetched, child) {
                self.document.append(live_main, imported);
            }
        }
        self.document.set_title(&fetched.title());
        Ok(())
    }

    fn await_script(&mut self, page: PageType, next: AfterScript) {
        let Some(script) = self.policy.behavior_script_for(page) else {
            self.run_after_script(next);
            return;
        };
        let token = self.clock.now_millis();
        match loader::inject_script(&mut self.document, &script, token) {
            Injection::AlreadyPresent => self.run_after_script(next),
            Injection::Injected(url) => {
                self.stage = Stage::AwaitingScript { url, next };
            }
        }
    }

    /// The host finished loading an injected script.
    pub fn script_loaded(&mut self, script: &str) {
        debug!("script loaded: {script}");
        self.script_done(script);
    }

    /// An injected script failed to load. Logged and treated as loaded.
    pub fn script_failed(&mut self, script: &str) {
        error!("failed to load script: {script}");
        self.script_done(script);
    }

    fn script_done(&mut self, script: &str) {
        let stage = std::mem::replace(&mut self.stage, Stage::Idle);
        let next = match stage {
            Stage::AwaitingScript { url, next } if url == script => next,
            other => {
                debug!("script signal for {script} outside a script wait");
                self.stage = other;
                return;
            }
        };
        self.run_after_script(next);
    }

    fn run_after_script(&mut self, next: AfterScript) {
        match next {
            AfterScript::BooksDispatch => {
                self.hooks.initialize_books_grid();
                self.books_handlers();
                images::normalize_images(&mut self.document, &mut self.watch);
                self.finish_pass();
            }
            AfterScript::DetailsDispatch => {
                self.details_population(VecDeque::new());
            }
            AfterScript::DetailsPopulate { rest } => {
                self.populate_book_details();
                self.deferred.push_back(Deferred::NormalizeImages);
                self.next_branch(rest);
            }
        }
    }

    fn finish_pass(&mut self) {
        self.stage = Stage::Idle;
        self.set_busy(false);
    }

    fn set_busy(&mut self, busy: bool) {
        let Some(body) = self.document.body() else {
            return;
        };
        if busy {
            self.document.add_class(body, BUSY_CLASS);
        } else {
            self.document.remove_class(body, BUSY_CLASS);
        }
    }

    // ── books handlers ──────────────────────────────────────────────────

    /// Restore the cover toggle and sort selector from preferences and bind
    /// them for UI events.
    fn books_handlers(&mut self) {
        let checkbox = self.document.get_by_id("coverToggle");
        let grid = self.document.get_by_id("booksGrid");
        let switch_label = self.document.query_selector(".switch");

        if let (Some(checkbox), Some(grid), Some(_)) = (checkbox, grid, switch_label) {
            let show = prefs::show_covers(self.store.as_ref());
            set_checked(&mut self.document, checkbox, show);
            if !show {
                self.document.add_class(grid, "hide-covers");
            }
            self.bindings.cover_toggle = Some(checkbox);
            self.bindings.books_grid = Some(grid);
        }

        if let Some(select) = self.document.query_selector(".sort-select") {
            if let Some(saved) = prefs::book_sort(self.store.as_ref()) {
                self.document.set_attr(select, "value", &saved);
            }
            self.bindings.sort_select = Some(select);
            self.hooks.initialize_books_grid();
        }
    }

    /// UI event: the cover-visibility switch was activated.
    ///
    /// Ignored unless a books page bound the toggle.
    pub fn toggle_covers(&mut self) {
        let (Some(checkbox), Some(grid)) = (self.bindings.cover_toggle, self.bindings.books_grid)
        else {
            return;
        };

        let now_checked = !is_checked(&self.document, checkbox);
        set_checked(&mut self.document, checkbox, now_checked);
        if now_checked {
            self.document.remove_class(grid, "hide-covers");
        } else {
            self.document.add_class(grid, "hide-covers");
        }
        prefs::set_show_covers(self.store.as_mut(), now_checked);
    }

    /// UI event: the sort selector changed.
    ///
    /// Persists the choice and delegates the actual re-sort to the
    /// collaborator when it provides one.
    pub fn sort_changed(&mut self, sort_key: &str) {
        let Some(select) = self.bindings.sort_select else {
            return;
        };
        self.document.set_attr(select, "value", sort_key);
        prefs::set_book_sort(self.store.as_mut(), sort_key);
        if !self.hooks.sort_books(sort_key) {
            debug!("no collaborator sort for {sort_key:?}, grid order unchanged");
        }
    }

    // ── detail handlers ─────────────────────────────────────────────────

    fn details_population(&mut self, rest: VecDeque<PageBranch>) {
        // Catalog data arrives with the detail-rendering collaborator
        // script; fetch it before populating.
        if self.catalog.is_none()
            && let Some(script) = self.policy.behavior_script_for(PageType::BookDetails)
        {
            let token = self.clock.now_millis();
            if let Injection::Injected(url) =
                loader::inject_script(&mut self.document, &script, token)
            {
                self.stage = Stage::AwaitingScript {
                    url,
                    next: AfterScript::DetailsPopulate { rest },
                };
                return;
            }
        }

        self.populate_book_details();
        self.deferred.push_back(Deferred::NormalizeImages);
        self.next_branch(rest);
    }

    /// Fill the detail fields for the book named by the current URL.
    fn populate_book_details(&mut self) {
        if self.hooks.display_book_details() {
            return;
        }

        let Some(catalog) = &self.catalog else {
            warn!("no catalog registered, detail fields left as-is");
            return;
        };

        let record = url::query_param(&self.current_url, "id")
            .and_then(|id| catalog.get(&id))
            .cloned();
        let Some(record) = record else {
            // Unknown id: show the listing instead of an empty shell
            self.effects.push(Effect::Navigate {
                url: LISTING_PAGE.to_string(),
            });
            return;
        };

        let doc = &mut self.document;
        if let Some(cover) = doc.get_by_id("bookCover") {
            doc.set_attr(cover, "src", &record.cover_image);
            doc.set_attr(cover, "alt", &record.title);
        }
        if let Some(title) = doc.get_by_id("bookTitle") {
            doc.set_text(title, &record.title);
        }
        if let Some(author) = doc.get_by_id("bookAuthor") {
            doc.set_text(author, &format!("By {}", record.author));
        }
        if let Some(date_read) = doc.get_by_id("dateRead") {
            doc.set_text(date_read, &format!("Finished reading: {}", record.date_read));
        }
        if let Some(description) = doc.get_by_id("bookDescription") {
            doc.set_text(description, &record.description);
        }
        if let Some(pages) = doc.get_by_id("pageCount") {
            doc.set_text(pages, &record.pages.to_string());
        }
        if let Some(publish_date) = doc.get_by_id("publishDate") {
            doc.set_text(publish_date, &record.publish_date);
        }
        if let Some(genre) = doc.get_by_id("genre") {
            doc.set_text(genre, &record.genre);
        }
    }

    // ── host-pumped turns ───────────────────────────────────────────────

    /// Run work deferred by one turn (the detail branch's image pass).
    /// Hosts pump this after executing the current batch of effects.
    pub fn run_deferred(&mut self) {
        while let Some(task) = self.deferred.pop_front() {
            match task {
                Deferred::NormalizeImages => {
                    images::normalize_images(&mut self.document, &mut self.watch);
                }
            }
        }
    }

    /// Host signal: an `<img>` element finished loading.
    pub fn image_loaded(&mut self, image: NodeId) {
        self.document.mark_image_complete(image);
        images::image_loaded(&mut self.document, &self.watch, image);
    }
}

fn is_checked(doc: &Document, checkbox: NodeId) -> bool {
    doc.has_attr(checkbox, "checked")
}

fn set_checked(doc: &mut Document, checkbox: NodeId, checked: bool) {
    if checked {
        doc.set_attr(checkbox, "checked", "");
    } else {
        doc.remove_attr(checkbox, "checked");
    }
}
