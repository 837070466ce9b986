use crate::UrlError;
use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use image_crawler::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// The host a crawl is bounded to
///
/// Two URLs are on the same domain when their hosts match case-insensitively
/// and their effective ports (explicit or scheme default) are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseHost {
    host: String,
    port: Option<u16>,
}

impl BaseHost {
    /// Captures the host and effective port of the crawl root
    pub fn from_url(url: &Url) -> Result<Self, UrlError> {
        let host = extract_domain(url).ok_or(UrlError::MissingDomain)?;
        Ok(Self {
            host,
            port: url.port_or_known_default(),
        })
    }

    /// The lowercase host name
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The effective port, if the scheme has one
    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

/// Checks whether a URL belongs to the crawl's base host
///
/// Relative references must be resolved against their page before calling
/// this; a resolved URL inherits the page's host and therefore matches.
pub fn same_domain(url: &Url, base: &BaseHost) -> bool {
    match extract_domain(url) {
        Some(host) => host == base.host && url.port_or_known_default() == base.port,
        None => false,
    }
}
