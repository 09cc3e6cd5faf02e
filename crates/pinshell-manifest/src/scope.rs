use url::Url;

/// Determine whether a URL is within a navigation scope.
///
/// False when the origins differ; otherwise true iff the URL's path starts
/// with the scope's path. Scope URLs carry no query or fragment (stripped
/// during manifest processing), so a plain path-prefix test is sufficient.
///
/// This is the single source of truth for scope containment, used both when
/// normalizing the `scope` member and when matching windows to pinned apps.
pub fn is_within_scope(url: &Url, scope: &Url) -> bool {
    if url.origin() != scope.origin() {
        return false;
    }
    url.path().starts_with(scope.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn same_origin_prefix_matches() {
        assert!(is_within_scope(
            &u("https://x.test/app/page.html"),
            &u("https://x.test/app/")
        ));
    }

    #[test]
    fn scope_equals_url() {
        assert!(is_within_scope(&u("https://x.test/app/"), &u("https://x.test/app/")));
    }

    #[test]
    fn cross_origin_never_matches() {
        assert!(!is_within_scope(
            &u("https://other.test/app/page.html"),
            &u("https://x.test/app/")
        ));
        // Scheme and port are part of the origin.
        assert!(!is_within_scope(&u("http://x.test/app/"), &u("https://x.test/app/")));
        assert!(!is_within_scope(
            &u("https://x.test:8443/app/"),
            &u("https://x.test/app/")
        ));
    }

    #[test]
    fn sibling_path_does_not_match() {
        assert!(!is_within_scope(
            &u("https://x.test/blog/post"),
            &u("https://x.test/app/")
        ));
    }

    #[test]
    fn prefix_is_on_path_not_string() {
        // Query strings on the tested URL are irrelevant to containment.
        assert!(is_within_scope(
            &u("https://x.test/app/page?x=1#frag"),
            &u("https://x.test/app/")
        ));
    }

    #[test]
    fn root_scope_contains_everything_same_origin() {
        assert!(is_within_scope(&u("https://x.test/blog/post"), &u("https://x.test/")));
    }
}
