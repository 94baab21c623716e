use url::Url;

/// Extracts the lowercase host from a URL
///
/// The port is not part of the returned value, so `127.0.0.1:8080` and
/// `127.0.0.1:9090` share one allow-list entry.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_harvest::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Superside.com/blog").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.superside.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks if a host is covered by one allow-list entry
///
/// An entry covers its own domain and every subdomain below it, so
/// `superside.com` admits `www.superside.com`. The `*.superside.com`
/// spelling is accepted and means the same thing.
///
/// # Examples
///
/// ```
/// use site_harvest::url::matches_allowed;
///
/// assert!(matches_allowed("superside.com", "superside.com"));
/// assert!(matches_allowed("superside.com", "www.superside.com"));
/// assert!(matches_allowed("*.superside.com", "blog.superside.com"));
/// assert!(!matches_allowed("superside.com", "notsuperside.com"));
/// ```
pub fn matches_allowed(pattern: &str, host: &str) -> bool {
    let base = pattern.strip_prefix("*.").unwrap_or(pattern);
    if base.is_empty() || host.is_empty() {
        return false;
    }

    let base = base.to_ascii_lowercase();
    let host = host.to_ascii_lowercase();

    host == base || host.ends_with(&format!(".{}", base))
}

/// Checks a host against the whole allow-list
pub fn is_domain_allowed(host: &str, allowed_domains: &[String]) -> bool {
    allowed_domains
        .iter()
        .any(|pattern| matches_allowed(pattern, host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_drops_port() {
        let url = Url::parse("http://127.0.0.1:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_extract_lowercases() {
        let url = Url::parse("https://Example.COM/Page").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_exact_match() {
        assert!(matches_allowed("example.com", "example.com"));
    }

    #[test]
    fn test_subdomains_are_allowed() {
        assert!(matches_allowed("example.com", "www.example.com"));
        assert!(matches_allowed("example.com", "api.v2.example.com"));
    }

    #[test]
    fn test_wildcard_spelling() {
        assert!(matches_allowed("*.example.com", "example.com"));
        assert!(matches_allowed("*.example.com", "blog.example.com"));
    }

    #[test]
    fn test_no_partial_match() {
        assert!(!matches_allowed("example.com", "myexample.com"));
        assert!(!matches_allowed("example.com", "example.com.org"));
        assert!(!matches_allowed("www.example.com", "example.com"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(matches_allowed("Example.com", "EXAMPLE.COM"));
    }

    #[test]
    fn test_empty_strings_never_match() {
        assert!(!matches_allowed("", "example.com"));
        assert!(!matches_allowed("example.com", ""));
        assert!(!matches_allowed("*.", "example.com"));
    }

    #[test]
    fn test_is_domain_allowed() {
        let allowed = vec!["superside.com".to_string(), "acme.test".to_string()];
        assert!(is_domain_allowed("www.superside.com", &allowed));
        assert!(is_domain_allowed("acme.test", &allowed));
        assert!(!is_domain_allowed("twitter.com", &allowed));
        assert!(!is_domain_allowed("superside.com", &[]));
    }
}
