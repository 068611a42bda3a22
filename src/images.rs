//! Cover image normalization.
//!
//! Content swaps leave cover images with whatever sizing the fetched markup
//! carried; this pass forces the catalog's sizing rules back on, idempotently,
//! and keeps watching images that are still loading so late layout shifts get
//! corrected too.

use std::collections::HashSet;

use log::debug;

use crate::dom::{Document, NodeId};
use crate::loader::ensure_style_block;

/// Marker attribute guarding one-time watch registration per image.
pub const SIZED_MARKER: &str = "data-sized";

/// Id of the one-time injected responsive style block.
pub const STYLE_BLOCK_ID: &str = "dynamic-book-styles";

const RESPONSIVE_RULES: &str = "
.book-cover {
    width: 100% !important;
    max-width: 100% !important;
    height: auto !important;
    transition: all 0.3s ease;
}

.book-details .book-cover.detail-view {
    width: 300px !important;
    max-width: 100% !important;
    height: auto !important;
}

.book-card {
    min-height: 200px;
}

@media (max-width: 768px) {
    .book-details .book-cover.detail-view {
        width: 100% !important;
        max-width: 300px !important;
        margin: 0 auto;
    }
}
";

/// Images whose load completion should re-trigger sizing.
///
/// The watch is session-owned render state, not document content; the
/// `data-sized` marker on the element is what makes registration one-time.
#[derive(Debug, Default)]
pub struct ImageWatch {
    watched: HashSet<NodeId>,
}

impl ImageWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_watched(&self, id: NodeId) -> bool {
        self.watched.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.watched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }
}

/// Apply the catalog's sizing rules to every cover image.
///
/// Safe to call any number of times per page: re-invocation never duplicates
/// the style block and never registers a second watch for the same image.
pub fn normalize_images(doc: &mut Document, watch: &mut ImageWatch) {
    for cover in doc.query_selector_all(".book-cover") {
        apply_grid_sizing(doc, cover);

        if !doc.has_attr(cover, SIZED_MARKER) {
            doc.set_attr(cover, SIZED_MARKER, "true");
            watch.watched.insert(cover);

            // Slow-loading images shift layout when they finish; reapply once
            // the host reports them complete. Already-complete images get the
            // fix synchronously.
            if doc.image_complete(cover) {
                apply_load_sizing(doc, cover);
            }
        }
    }

    if let Some(details_cover) = doc.query_selector(".book-details .book-cover") {
        doc.set_style_property(details_cover, "width", "300px");
        doc.set_style_property(details_cover, "max-width", "100%");
        doc.set_style_property(details_cover, "height", "auto");
        doc.add_class(details_cover, "detail-view");
    }

    if let Some(grid) = doc.get_by_id("booksGrid") {
        doc.add_class(grid, "initialized");
    }

    ensure_style_block(doc, STYLE_BLOCK_ID, RESPONSIVE_RULES);
}

/// Host signal: an image element finished loading.
///
/// Reapplies sizing for watched covers; unknown elements are ignored.
pub fn image_loaded(doc: &mut Document, watch: &ImageWatch, id: NodeId) {
    if !watch.is_watched(id) {
        return;
    }
    debug!("re-sizing cover after load");
    apply_load_sizing(doc, id);
}

fn apply_grid_sizing(doc: &mut Document, id: NodeId) {
    doc.set_style_property(id, "width", "100%");
    doc.set_style_property(id, "max-width", "100%");
    doc.set_style_property(id, "height", "auto");
}

fn apply_load_sizing(doc: &mut Document, id: NodeId) {
    doc.set_style_property(id, "width", "100%");
    doc.set_style_property(id, "height", "auto");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn grid_page() -> Document {
        parse_html(
            r#"<html><head></head><body>
                <div class="books-grid" id="booksGrid">
                    <img class="book-cover" src="a.jpg">
                    <img class="book-cover" src="b.jpg">
                </div>
            </body></html>"#,
        )
    }

    #[test]
    fn test_grid_covers_sized() {
        let mut doc = grid_page();
        let mut watch = ImageWatch::new();
        normalize_images(&mut doc, &mut watch);

        for cover in doc.query_selector_all(".book-cover") {
            assert_eq!(doc.style_property(cover, "width").as_deref(), Some("100%"));
            assert_eq!(doc.style_property(cover, "height").as_deref(), Some("auto"));
            assert_eq!(doc.attr(cover, SIZED_MARKER), Some("true"));
        }
        assert!(doc.has_class(doc.get_by_id("booksGrid").unwrap(), "initialized"));
    }

    #[test]
    fn test_idempotent_watch_and_style_block() {
        let mut doc = grid_page();
        let mut watch = ImageWatch::new();

        normalize_images(&mut doc, &mut watch);
        let watched_after_first = watch.len();
        normalize_images(&mut doc, &mut watch);
        normalize_images(&mut doc, &mut watch);

        assert_eq!(watch.len(), watched_after_first);
        assert_eq!(watch.len(), 2);

        // Exactly one injected style block no matter how many passes ran
        let blocks: Vec<_> = doc
            .query_selector_all("style")
            .into_iter()
            .filter(|&s| doc.element_id(s) == Some(STYLE_BLOCK_ID))
            .collect();
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_details_cover_gets_fixed_width() {
        let mut doc = parse_html(
            r#"<html><head></head><body>
                <div class="book-details"><img class="book-cover" id="bookCover"></div>
            </body></html>"#,
        );
        let mut watch = ImageWatch::new();
        normalize_images(&mut doc, &mut watch);

        let cover = doc.get_by_id("bookCover").unwrap();
        assert_eq!(doc.style_property(cover, "width").as_deref(), Some("300px"));
        assert_eq!(doc.style_property(cover, "max-width").as_deref(), Some("100%"));
        assert!(doc.has_class(cover, "detail-view"));
    }

    #[test]
    fn test_load_signal_reapplies_sizing() {
        let mut doc = grid_page();
        let mut watch = ImageWatch::new();
        normalize_images(&mut doc, &mut watch);

        let cover = doc.query_selector(".book-cover").unwrap();
        // Something (another script, the browser) clobbers the inline width
        doc.set_style_property(cover, "width", "50px");

        image_loaded(&mut doc, &watch, cover);
        assert_eq!(doc.style_property(cover, "width").as_deref(), Some("100%"));
    }

    #[test]
    fn test_complete_image_sized_synchronously() {
        let mut doc = grid_page();
        let cover = doc.query_selector(".book-cover").unwrap();
        doc.mark_image_complete(cover);

        let mut watch = ImageWatch::new();
        normalize_images(&mut doc, &mut watch);
        assert_eq!(doc.style_property(cover, "width").as_deref(), Some("100%"));
        assert!(watch.is_watched(cover));
    }
}
