//! Destination filename derivation
//!
//! Names come from the last URL path segment, percent-decoded and sanitized
//! so they are always a single plain path component inside the output
//! directory.

use crate::url::image_subtype;
use url::Url;

/// Longest filename kept, extension included
pub const MAX_FILENAME_LEN: usize = 200;

/// Extension used when nothing better is known
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Returns the percent-decoded last path segment of a URL, if non-empty
pub fn filename_from_url(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.last()?;
    if segment.is_empty() {
        return None;
    }

    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    Some(decoded)
}

/// Returns true when a filename carries a usable extension
pub fn has_extension(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) => !stem.is_empty() && !ext.is_empty(),
        None => false,
    }
}

/// Maps a Content-Type to a file extension
///
/// `image/jpeg` becomes `jpg`, `image/svg+xml` becomes `svg`, other image
/// subtypes are used as-is. Anything unrecognized falls back to `jpg`.
pub fn extension_for_content_type(content_type: Option<&str>) -> String {
    let Some(subtype) = content_type.and_then(image_subtype) else {
        return DEFAULT_EXTENSION.to_string();
    };

    let subtype = subtype.strip_prefix("x-").unwrap_or(&subtype);
    let ext = match subtype {
        "jpeg" | "pjpeg" | "jpg" => "jpg",
        "svg+xml" => "svg",
        "vnd.microsoft.icon" => "ico",
        other => other,
    };

    if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        ext.to_string()
    } else {
        DEFAULT_EXTENSION.to_string()
    }
}

/// Synthesized name for images whose URL yields no usable filename
pub fn synthesized_name(index: usize, ext: &str) -> String {
    format!("image_{}.{}", index, ext)
}

/// Makes a filename safe to create inside the output directory
///
/// `< > : " / \ | ? *` and control characters become `_`. Names that are
/// empty, `.` or `..` after sanitizing yield None so the caller can
/// synthesize one. Overlong names are shortened, keeping the extension.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return None;
    }

    Some(truncate_filename(trimmed))
}

fn truncate_filename(name: &str) -> String {
    if name.len() <= MAX_FILENAME_LEN {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(pos) if name.len() - pos <= 16 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    };

    let mut budget = MAX_FILENAME_LEN.saturating_sub(ext.len());
    while !stem.is_char_boundary(budget.min(stem.len())) {
        budget -= 1;
    }
    format!("{}{}", &stem[..budget.min(stem.len())], ext)
}
