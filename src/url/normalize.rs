use crate::UrlError;
use url::Url;

/// Normalizes a URL for visited-set and frontier comparisons
///
/// # Normalization Steps
///
/// 1. Remove fragment (everything after #)
/// 2. Remove trailing slashes from the path
/// 3. Empty path becomes /
///
/// Scheme, host, port and query are preserved as parsed. The function is
/// idempotent: normalizing a normalized URL returns it unchanged.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use image_crawler::url::normalize;
///
/// let url = Url::parse("https://example.com/gallery/#top").unwrap();
/// assert_eq!(normalize(&url).as_str(), "https://example.com/gallery");
/// ```
pub fn normalize(url: &Url) -> Url {
    let mut normalized = url.clone();

    // Step 1: Remove fragment
    normalized.set_fragment(None);

    // Step 2 & 3: Trailing slashes, empty path
    let path = normalize_path(normalized.path());
    if path != normalized.path() {
        normalized.set_path(&path);
    }

    normalized
}

/// Parses and normalizes a user-supplied start URL
///
/// # Returns
///
/// * `Ok(Url)` - Normalized http(s) URL with a host
/// * `Err(UrlError)` - Malformed, non-HTTP(S), or host-less URL
pub fn parse_base_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    Ok(normalize(&url))
}

/// Strips trailing slashes; an empty result becomes the root path
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
