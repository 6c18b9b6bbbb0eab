//! Path-prefix protection check.
//!
//! Plain string-prefix matching: a URI is protected when it starts with the
//! protected prefix and does not start with any excluded prefix. The check
//! runs on the URI string as supplied by the reverse proxy; it does not
//! normalise or decode it.

/// Returns `true` iff `uri` falls under `protected_prefix` and under none of
/// the `excluded` prefixes.
pub fn is_protected(uri: &str, protected_prefix: &str, excluded: &[String]) -> bool {
    uri.starts_with(protected_prefix) && !excluded.iter().any(|p| uri.starts_with(p.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn excluded(prefixes: &[&str]) -> Vec<String> {
        prefixes.iter().map(|p| (*p).to_owned()).collect()
    }

    #[test]
    fn everything_protected_under_root_prefix() {
        assert!(is_protected("/api/media", "/", &[]));
        assert!(is_protected("/", "/", &[]));
    }

    #[test]
    fn path_outside_protected_prefix_is_open() {
        assert!(!is_protected("/public/index.html", "/api/", &[]));
    }

    #[test]
    fn excluded_prefix_wins_over_protected() {
        let ex = excluded(&["/api/health"]);
        assert!(!is_protected("/api/health", "/api/", &ex));
        assert!(!is_protected("/api/healthz", "/api/", &ex));
        assert!(is_protected("/api/media", "/api/", &ex));
    }

    #[test]
    fn multiple_excluded_prefixes() {
        let ex = excluded(&["/static/", "/favicon.ico"]);
        assert!(!is_protected("/static/app.js", "/", &ex));
        assert!(!is_protected("/favicon.ico", "/", &ex));
        assert!(is_protected("/app", "/", &ex));
    }

    #[test]
    fn query_string_does_not_defeat_prefix_match() {
        assert!(is_protected("/api/media?id=7", "/api/", &[]));
    }
}
