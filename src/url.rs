//! URL helpers: base-path derivation, origin checks, query parameters.

use percent_encoding::percent_decode_str;

/// Extract the path component of a URL (no scheme/host, no query/fragment).
///
/// Accepts both absolute URLs and bare paths.
pub fn pathname(url: &str) -> &str {
    let after_host = match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "",
            }
        }
        None => url,
    };
    let end = after_host
        .find(['?', '#'])
        .unwrap_or(after_host.len());
    &after_host[..end]
}

/// Derive the site's base path from the current location.
///
/// When the site is served from a subfolder on a domain, that folder's name
/// becomes the prefix for every asset request. Page file names (`*.html`)
/// never count as folders.
pub fn base_path(location: &str) -> String {
    let path = pathname(location);
    let folder_parts: Vec<&str> = path
        .split('/')
        .filter(|part| !part.is_empty() && !part.ends_with(".html"))
        .collect();

    match folder_parts.first() {
        Some(first) => format!("/{}", first),
        None => String::new(),
    }
}

/// Whether an absolute href belongs to the given origin.
///
/// Hosts resolve anchors to absolute URLs before asking; anything outside the
/// origin is left to native browser navigation.
pub fn same_origin(href: &str, origin: &str) -> bool {
    !origin.is_empty() && href.starts_with(origin)
}

/// Extract a query parameter from a URL, percent-decoded.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let query_start = url.find('?')? + 1;
    let query = &url[query_start..];
    let query = query.split('#').next().unwrap_or(query);

    for pair in query.split('&') {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next()?;
        if key != name {
            continue;
        }
        let raw = parts.next().unwrap_or("");
        // Form encoding uses '+' for spaces
        let raw = raw.replace('+', " ");
        return Some(percent_decode_str(&raw).decode_utf8_lossy().into_owned());
    }
    None
}

/// Strip a cache-busting query suffix from an asset URL.
pub fn strip_cache_token(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pathname() {
        assert_eq!(pathname("https://example.com/books.html?id=1"), "/books.html");
        assert_eq!(pathname("https://example.com"), "");
        assert_eq!(pathname("/shelf/books.html"), "/shelf/books.html");
        assert_eq!(pathname("/books.html#top"), "/books.html");
    }

    #[test]
    fn test_base_path_at_domain_root() {
        assert_eq!(base_path("https://example.com/books.html"), "");
        assert_eq!(base_path("https://example.com/"), "");
    }

    #[test]
    fn test_base_path_in_subfolder() {
        assert_eq!(base_path("https://example.com/shelf/books.html"), "/shelf");
        assert_eq!(base_path("https://example.com/shelf/"), "/shelf");
        // Only the first folder names the site prefix
        assert_eq!(base_path("/shelf/archive/index.html"), "/shelf");
    }

    #[test]
    fn test_same_origin() {
        assert!(same_origin(
            "https://example.com/books.html",
            "https://example.com"
        ));
        assert!(!same_origin("https://other.com/books.html", "https://example.com"));
        assert!(!same_origin("https://example.com/x", ""));
    }

    #[test]
    fn test_query_param() {
        assert_eq!(
            query_param("book-details.html?id=42", "id").as_deref(),
            Some("42")
        );
        assert_eq!(
            query_param("details.html?a=1&id=dune%2042&b=2", "id").as_deref(),
            Some("dune 42")
        );
        assert_eq!(query_param("details.html?id=a+b", "id").as_deref(), Some("a b"));
        assert_eq!(query_param("details.html?id=1#frag", "id").as_deref(), Some("1"));
        assert_eq!(query_param("details.html", "id"), None);
        assert_eq!(query_param("details.html?other=1", "id"), None);
    }

    #[test]
    fn test_strip_cache_token() {
        assert_eq!(strip_cache_token("/css/books.css?v=123"), "/css/books.css");
        assert_eq!(strip_cache_token("/css/books.css"), "/css/books.css");
    }
}
