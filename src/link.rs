// src/link.rs
// =============================================================================
// URL normalization and internal/external classification.
//
// Every href found on a page goes through normalize() before it is used
// anywhere else. The normalized form is what the rest of the pipeline
// dedups on, queues, and probes.
// =============================================================================

use url::Url;

/// A normalized hyperlink reference.
///
/// `target` is the fragment-stripped absolute URL used as the verification
/// and deduplication key. `display` is what reports show; it differs from
/// `target` only for fragment-only hrefs (`#section`), where the fragment
/// is kept for display but the link is probed as its own page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedLink {
    pub display: String,
    pub target: String,
}

/// Normalizes an href relative to the URL of the page it appeared on.
///
/// - `#section` resolves to the page itself (always valid, never probed
///   separately); the fragment survives in `display` only.
/// - Relative hrefs are resolved with standard RFC 3986 join rules.
/// - Absolute hrefs are used as-is.
/// - Fragments are stripped from `target`; query strings are preserved.
///
/// Returns `None` for hrefs that cannot be parsed as a URL at all.
/// Idempotent: normalizing an already-normalized URL returns it unchanged.
pub fn normalize(href: &str, page_url: &Url) -> Option<NormalizedLink> {
    let href = href.trim();

    if let Some(fragment) = href.strip_prefix('#') {
        let mut page = page_url.clone();
        page.set_fragment(None);
        let target = page.to_string();
        return Some(NormalizedLink {
            display: format!("{}#{}", target, fragment),
            target,
        });
    }

    // Absolute hrefs parse directly; anything else is resolved against
    // the page URL.
    let resolved = match Url::parse(href) {
        Ok(url) => url,
        Err(_) => page_url.join(href).ok()?,
    };

    let mut stripped = resolved;
    stripped.set_fragment(None);
    let target = stripped.to_string();

    Some(NormalizedLink {
        display: target.clone(),
        target,
    })
}

/// Whether a URL belongs to the same site as the base URL.
///
/// Matches on host plus explicit port, so `example.com:8080` is external
/// to `example.com` but `http://` and `https://` variants of the same
/// host are both internal.
pub fn is_internal(url: &str, base: &Url) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.host_str() == base.host_str() && parsed.port() == base.port(),
        Err(_) => false,
    }
}

/// Whether two URLs point at the same path.
///
/// Used during discovery to avoid re-queueing fragment or query variants
/// of a page that is already being visited.
pub fn same_path(url: &str, other: &Url) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.path() == other.path(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn test_relative_href_resolves_against_page() {
        let link = normalize("/docs", &page("https://example.com/guide")).unwrap();
        assert_eq!(link.target, "https://example.com/docs");
        assert_eq!(link.display, link.target);
    }

    #[test]
    fn test_parent_relative_href() {
        let link = normalize("../about", &page("https://example.com/a/b/")).unwrap();
        assert_eq!(link.target, "https://example.com/a/about");
    }

    #[test]
    fn test_absolute_href_used_as_is() {
        let link = normalize("https://other.org/page", &page("https://example.com/")).unwrap();
        assert_eq!(link.target, "https://other.org/page");
    }

    #[test]
    fn test_fragment_only_keeps_display_strips_target() {
        let link = normalize("#install", &page("https://example.com/docs")).unwrap();
        assert_eq!(link.display, "https://example.com/docs#install");
        assert_eq!(link.target, "https://example.com/docs");
    }

    #[test]
    fn test_fragment_stripped_query_preserved() {
        let link = normalize(
            "https://example.com/search?q=rust#results",
            &page("https://example.com/"),
        )
        .unwrap();
        assert_eq!(link.target, "https://example.com/search?q=rust");
        assert_eq!(link.display, link.target);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let base = page("https://example.com/docs/");
        for href in ["/a/b?x=1", "relative", "https://other.org/p#frag"] {
            let once = normalize(href, &base).unwrap();
            let twice = normalize(&once.target, &base).unwrap();
            assert_eq!(once.target, twice.target);
            assert_eq!(twice.display, twice.target);
        }
    }

    #[test]
    fn test_internal_same_host() {
        let base = page("https://example.com/");
        assert!(is_internal("https://example.com/docs", &base));
        assert!(is_internal("http://example.com/docs", &base));
    }

    #[test]
    fn test_external_host_or_port() {
        let base = page("https://example.com/");
        assert!(!is_internal("https://other.org/", &base));
        assert!(!is_internal("https://example.com:8080/", &base));
        assert!(!is_internal("not a url", &base));
    }

    #[test]
    fn test_same_path_ignores_query() {
        let current = page("https://example.com/docs");
        assert!(same_path("https://example.com/docs?v=2", &current));
        assert!(!same_path("https://example.com/blog", &current));
    }
}
