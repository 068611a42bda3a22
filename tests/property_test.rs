//! Property tests for the pure pieces: asset policy, URL helpers, and
//! classifier precedence.

use proptest::prelude::*;

use pageturn::{PageType, StylePolicy, classify, parse_html};
use pageturn::url::{base_path, query_param, strip_cache_token};

proptest! {
    #[test]
    fn prop_every_sheet_carries_the_pass_token(token in any::<u64>()) {
        let policy = StylePolicy::new("");
        for page in [PageType::Books, PageType::BookDetails, PageType::Other] {
            for sheet in policy.stylesheets_for(page, token) {
                prop_assert!(sheet.ends_with(&format!("?v={}", token)), "sheet must end with ?v={}", token);
                prop_assert!(sheet.starts_with("/css/"));
            }
        }
    }

    #[test]
    fn prop_common_sheets_lead_every_set(token in any::<u64>()) {
        let policy = StylePolicy::new("/shelf");
        for page in [PageType::Books, PageType::BookDetails, PageType::Other] {
            let sheets = policy.stylesheets_for(page, token);
            prop_assert!(sheets[0].starts_with("/shelf/css/style.css"));
            prop_assert!(sheets[1].starts_with("/shelf/css/constellation.css"));
        }
    }

    #[test]
    fn prop_query_param_roundtrip(id in "[A-Za-z0-9_-]{1,16}") {
        let url = format!("https://example.com/book-details.html?id={}", id);
        prop_assert_eq!(query_param(&url, "id"), Some(id));
    }

    #[test]
    fn prop_strip_cache_token_drops_any_query(path in "/[a-z]{1,8}/[a-z]{1,8}\\.css", token in any::<u64>()) {
        let stamped = format!("{}?v={}", path, token);
        prop_assert_eq!(strip_cache_token(&stamped), path.as_str());
        prop_assert_eq!(strip_cache_token(&path), path.as_str());
    }

    #[test]
    fn prop_base_path_ignores_page_names(folder in "[a-z]{1,8}", page in "[a-z]{1,8}") {
        let url = format!("https://example.com/{}/{}.html", folder, page);
        prop_assert_eq!(base_path(&url), format!("/{}", folder));
    }

    #[test]
    fn prop_books_url_always_classifies_books(folder in "[a-z]{0,8}") {
        // Whatever markup came back, a books.html URL is a books page
        let doc = parse_html(
            r#"<div class="book-details"></div><div class="books-grid"></div>"#,
        );
        let url = format!("https://example.com/{}/books.html", folder);
        prop_assert_eq!(classify(&url, &doc), PageType::Books);
    }
}
