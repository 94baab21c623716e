//! Object keys for Page Captures
//!
//! A capture key is derived from the fetched URL alone, so re-fetching the
//! same URL overwrites the same object.

/// Character substituted for path separators and non-ASCII characters
pub const FILLER: char = '-';

/// Turns a URL into a flat, ASCII-only object name
///
/// Everything up to and including the first `://` is dropped, every `/`
/// becomes `-`, and every non-ASCII character becomes one `-`.
///
/// # Examples
///
/// ```
/// use site_harvest::url::sanitize_page_name;
///
/// assert_eq!(
///     sanitize_page_name("https://www.superside.com/blog/design"),
///     "www.superside.com-blog-design"
/// );
/// ```
pub fn sanitize_page_name(url: &str) -> String {
    let without_scheme = match url.split_once("://") {
        Some((_, rest)) => rest,
        None => url,
    };

    without_scheme
        .chars()
        .map(|c| if c == '/' || !c.is_ascii() { FILLER } else { c })
        .collect()
}

/// Namespace prefix holding all captures of one site
pub fn site_prefix(site: &str) -> String {
    format!("pages/{}", site)
}

/// Full object key of the capture for `url`
///
/// # Examples
///
/// ```
/// use site_harvest::url::page_capture_key;
///
/// assert_eq!(
///     page_capture_key("Superside", "https://www.superside.com/"),
///     "pages/Superside/www.superside.com-.json"
/// );
/// ```
pub fn page_capture_key(site: &str, url: &str) -> String {
    format!("{}/{}.json", site_prefix(site), sanitize_page_name(url))
}
