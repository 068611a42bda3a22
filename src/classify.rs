//! Page classification.
//!
//! A page's type decides which stylesheets, behavior script, and handlers
//! apply to it.

use crate::dom::Document;

/// The kind of catalog page being displayed or navigated to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PageType {
    /// The book listing grid.
    Books,
    /// A single book's detail view.
    BookDetails,
    /// Anything else (home page, about page, ...).
    Other,
}

/// Classify a page from its URL and parsed markup.
///
/// URL checks take precedence over content checks so that ambiguous or
/// partially-rendered fetched markup cannot misclassify a page whose URL is
/// unambiguous.
pub fn classify(url: &str, doc: &Document) -> PageType {
    if url.contains("book-details.html") {
        PageType::BookDetails
    } else if url.contains("books.html") {
        PageType::Books
    } else if doc.query_selector(".book-details").is_some() {
        PageType::BookDetails
    } else if doc.query_selector(".books-grid").is_some() {
        PageType::Books
    } else {
        PageType::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn test_classify_by_url() {
        let empty = parse_html("<html><body></body></html>");
        assert_eq!(
            classify("https://example.com/book-details.html?id=1", &empty),
            PageType::BookDetails
        );
        assert_eq!(
            classify("https://example.com/books.html", &empty),
            PageType::Books
        );
        assert_eq!(
            classify("https://example.com/about.html", &empty),
            PageType::Other
        );
    }

    #[test]
    fn test_classify_by_content() {
        let grid = parse_html(r#"<div class="books-grid"></div>"#);
        assert_eq!(classify("https://example.com/index.html", &grid), PageType::Books);

        let details = parse_html(r#"<div class="book-details"></div>"#);
        assert_eq!(
            classify("https://example.com/index.html", &details),
            PageType::BookDetails
        );
    }

    #[test]
    fn test_url_precedence_over_content() {
        // A document carrying both markers, fetched from a books.html URL,
        // is a books page
        let both = parse_html(
            r#"<div class="book-details"></div><div class="books-grid"></div>"#,
        );
        assert_eq!(
            classify("https://example.com/books.html", &both),
            PageType::Books
        );
        // Content order breaks the tie only when the URL says nothing
        assert_eq!(
            classify("https://example.com/index.html", &both),
            PageType::BookDetails
        );
    }
}
