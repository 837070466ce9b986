//! File extension handling for image URLs and content types
use crate::config::FilterConfig;
use std::collections::HashSet;
use url::Url;

/// Extensions recognized inside CSS `url(...)` tokens
pub const CSS_IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "svg", "webp"];

/// Returns the lowercase extension of a URL's last path segment
///
/// The query string and fragment never contribute. A segment without a dot,
/// or ending in one, has no extension.
pub fn path_extension(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.last()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Returns the lowercase subtype of an `image/*` content type
///
/// `image/svg+xml; charset=utf-8` yields `svg+xml`. Non-image types yield None.
pub fn image_subtype(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    let subtype = essence.strip_prefix("image/")?;
    if subtype.is_empty() {
        return None;
    }
    Some(subtype.to_string())
}

/// The configured set of excluded image formats
///
/// One policy is shared by the extractor and the downloader so a format is
/// excluded the same way at every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionPolicy {
    excluded: HashSet<String>,
}

impl ExtensionPolicy {
    /// Creates a policy from extension names (case and leading dots ignored)
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let excluded = excluded
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { excluded }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(&config.excluded_extensions)
    }

    /// Returns true if the extension itself is excluded
    pub fn is_excluded_extension(&self, ext: &str) -> bool {
        self.excluded.contains(&ext.to_ascii_lowercase())
    }

    /// Returns true if the URL's path extension is excluded
    pub fn is_excluded_url(&self, url: &Url) -> bool {
        path_extension(url).is_some_and(|ext| self.excluded.contains(&ext))
    }

    /// Returns true if an `image/*` content type names an excluded format
    ///
    /// `image/x-webp` matches an excluded `webp` as well.
    pub fn is_excluded_content_type(&self, content_type: &str) -> bool {
        let Some(subtype) = image_subtype(content_type) else {
            return false;
        };
        let bare = subtype.strip_prefix("x-").unwrap_or(&subtype);
        self.excluded.contains(bare) || self.excluded.contains(subtype.as_str())
    }

    /// Returns true if a CSS `url(...)` target looks like an image worth fetching
    pub fn accepts_css_image(&self, url: &Url) -> bool {
        match path_extension(url) {
            Some(ext) => {
                CSS_IMAGE_EXTENSIONS.contains(&ext.as_str()) && !self.excluded.contains(&ext)
            }
            None => false,
        }
    }
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self::from_config(&FilterConfig::default())
    }
}
