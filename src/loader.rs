//! Resource loader: stylesheet and script injection.
//!
//! Injection is idempotent against the document head and best-effort: the
//! host performs the actual network load and reports completion back to the
//! session, and a load error counts as completion so a broken asset can never
//! wedge a navigation.

use log::{debug, warn};

use crate::dom::{Document, NodeId};
use crate::url::strip_cache_token;

/// Outcome of asking the loader for a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injection {
    /// A matching element already exists; completion is immediate.
    AlreadyPresent,
    /// A new element was appended to head; the host will signal load/error
    /// for this URL.
    Injected(String),
}

impl Injection {
    /// The URL whose load signal is still outstanding, if any.
    pub fn pending_url(&self) -> Option<&str> {
        match self {
            Injection::AlreadyPresent => None,
            Injection::Injected(url) => Some(url),
        }
    }
}

/// Inject a `<link rel="stylesheet">` for `url` unless one is already there.
///
/// Existing links are matched by URL ignoring cache-busting query
/// parameters, so a re-stamped URL never duplicates the element.
pub fn inject_stylesheet(doc: &mut Document, url: &str) -> Injection {
    let bare = strip_cache_token(url);
    for link in doc.query_selector_all(r#"link[rel="stylesheet"]"#) {
        if let Some(href) = doc.attr(link, "href")
            && href.contains(bare)
        {
            return Injection::AlreadyPresent;
        }
    }

    let Some(head) = doc.head() else {
        // A parsed HTML document always has a head; a hand-built fragment
        // might not. Nothing to load into, so report complete.
        warn!("no <head> to inject stylesheet {url} into");
        return Injection::AlreadyPresent;
    };

    let link = doc.create_element("link", vec![("rel", "stylesheet"), ("href", url)]);
    doc.append(head, link);
    debug!("stylesheet injected: {url}");
    Injection::Injected(url.to_string())
}

/// Inject a `<script>` for `url` unless one is already there, stamping the
/// src with a cache-busting token.
///
/// Existing scripts are matched by substring against the unstamped URL, so
/// both statically-present tags and previously injected stamped tags count.
pub fn inject_script(doc: &mut Document, url: &str, token: u64) -> Injection {
    for script in doc.query_selector_all("script") {
        if let Some(src) = doc.attr(script, "src")
            && src.contains(url)
        {
            return Injection::AlreadyPresent;
        }
    }

    let Some(head) = doc.head() else {
        warn!("no <head> to inject script {url} into");
        return Injection::AlreadyPresent;
    };

    let stamped = format!("{}?v={}", url, token);
    let script = doc.create_element("script", vec![("src", stamped.as_str())]);
    doc.append(head, script);
    debug!("script injected: {stamped}");
    Injection::Injected(stamped)
}

/// Ensure a one-time `<style>` block with the given id exists in head.
///
/// Returns the element either way; repeated calls never duplicate it.
pub fn ensure_style_block(doc: &mut Document, id: &str, css: &str) -> Option<NodeId> {
    if let Some(existing) = doc.get_by_id(id) {
        return Some(existing);
    }
    let head = doc.head()?;
    let style = doc.create_element("style", vec![("id", id)]);
    doc.append(head, style);
    doc.set_text(style, css);
    Some(style)
}
