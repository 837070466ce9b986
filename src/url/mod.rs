//! URL handling module
//!
//! This module provides URL normalization, start URL parsing, host extraction,
//! same-domain checks and the excluded-extension policy. Everything here is
//! pure; no network I/O happens.

mod domain;
mod extension;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, same_domain, BaseHost};
pub use extension::{image_subtype, path_extension, ExtensionPolicy, CSS_IMAGE_EXTENSIONS};
pub use normalize::{normalize, parse_base_url};
