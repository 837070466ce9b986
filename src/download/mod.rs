//! Image download module
//!
//! # Components
//!
//! - `Downloader`: stages image bytes in a temp file, filters, promotes atomically
//! - `FilterPipeline`: ordered acceptance stages over a staged image
//! - `filename`: destination name derivation and sanitizing

mod downloader;
pub mod filename;
pub mod filter;

pub use downloader::Downloader;
pub use filter::{ContentHashSet, FilterPipeline, FilterStage, Verdict};

use crate::crawler::FetchError;
use crate::state::SkipReason;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// An image URL found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    /// Absolute image URL
    pub source_url: Url,

    /// Page the image was found on
    pub page_url: Url,
}

/// Downloaded bytes waiting in a temp file for the filter stages
#[derive(Debug, Clone)]
pub struct StagedImage {
    pub url: Url,

    /// Temp file holding the payload
    pub path: PathBuf,

    /// Number of bytes staged
    pub byte_len: u64,

    /// Content-Type of the GET response
    pub content_type: Option<String>,
}

/// Errors that fail a single image download
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How one image attempt ended
#[derive(Debug)]
pub enum DownloadOutcome {
    /// Written to the output directory under this path
    Accepted(PathBuf),

    /// Not downloaded, for a countable reason
    Skipped(SkipReason),

    /// Network or I/O failure
    Failed(DownloadError),
}

impl DownloadOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Skipped(reason) => Some(*reason),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    /// Minimal PNG: signature plus an IHDR chunk, zero-padded to `total_len`
    ///
    /// Enough for header-based dimension decoding.
    pub fn png_bytes(width: u32, height: u32, total_len: usize) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 2, 0, 0, 0]);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        if bytes.len() < total_len {
            bytes.resize(total_len, 0);
        }
        bytes
    }
}
