//! WASM bindings for running the navigation engine in a browser shell.
//!
//! This module exposes the session to JavaScript via wasm-bindgen. The glue
//! on the JS side performs the real fetches and load events, forwards them
//! here, executes the effects JSON, and syncs the swapped document back into
//! the page.

use wasm_bindgen::prelude::*;

use crate::catalog::BookCatalog;
use crate::dom::parse_html;
use crate::session::{ClickDisposition, NavigationSession, SessionConfig};

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

/// A navigation session driven from JavaScript.
#[wasm_bindgen]
pub struct WasmSession {
    inner: NavigationSession,
}

#[wasm_bindgen]
impl WasmSession {
    /// Create a session over the initially loaded page's markup.
    #[wasm_bindgen(constructor)]
    pub fn new(html: &str, origin: &str, location: &str) -> WasmSession {
        let doc = parse_html(html);
        WasmSession {
            inner: NavigationSession::new(
                doc,
                SessionConfig {
                    origin: origin.to_string(),
                    location: location.to_string(),
                },
            ),
        }
    }

    /// Register the catalog published by the data collaborator, as JSON.
    pub fn register_catalog(&mut self, json: &str) -> Result<(), JsValue> {
        let catalog = BookCatalog::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.inner.register_catalog(catalog);
        Ok(())
    }

    /// Boot entry point; call once the initial DOM is ready.
    pub fn initialize_handlers(&mut self) {
        self.inner.initialize_handlers();
    }

    /// A link was activated. Returns `true` when the session intercepted it
    /// (the caller must then prevent the default navigation).
    pub fn handle_click(&mut self, href: &str) -> bool {
        self.inner.handle_click(href) == ClickDisposition::Intercepted
    }

    /// A popstate event fired; `url` is the restored location.
    pub fn handle_pop(&mut self, url: &str) {
        self.inner.handle_pop(url);
    }

    pub fn markup_loaded(&mut self, url: &str, bytes: &[u8]) {
        self.inner.markup_loaded(url, bytes);
    }

    pub fn markup_failed(&mut self, url: &str) {
        self.inner.markup_failed(url);
    }

    pub fn style_loaded(&mut self, url: &str) {
        self.inner.style_loaded(url);
    }

    pub fn style_failed(&mut self, url: &str) {
        self.inner.style_failed(url);
    }

    pub fn script_loaded(&mut self, url: &str) {
        self.inner.script_loaded(url);
    }

    pub fn script_failed(&mut self, url: &str) {
        self.inner.script_failed(url);
    }

    pub fn toggle_covers(&mut self) {
        self.inner.toggle_covers();
    }

    pub fn sort_changed(&mut self, sort_key: &str) {
        self.inner.sort_changed(sort_key);
    }

    /// Run work the engine deferred by one turn.
    pub fn run_deferred(&mut self) {
        self.inner.run_deferred();
    }

    /// Drain queued effects as a JSON array the JS glue executes in order.
    pub fn take_effects(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.inner.take_effects())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn is_busy(&self) -> bool {
        self.inner.is_busy()
    }

    pub fn title(&self) -> String {
        self.inner.document().title()
    }

    pub fn current_url(&self) -> String {
        self.inner.current_url().to_string()
    }

    /// Serialize the live document so the glue can sync swapped content.
    pub fn document_html(&self) -> String {
        self.inner.document().document_html()
    }
}
