//! Image acceptance filters
//!
//! A staged image runs through an ordered list of stages. The first stage
//! that rejects it decides the skip reason and later stages never run.

use crate::config::FilterConfig;
use crate::download::StagedImage;
use crate::state::SkipReason;
use crate::url::ExtensionPolicy;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Hex SHA-256 digests of accepted image prefixes, shared across workers
pub type ContentHashSet = Arc<Mutex<HashSet<String>>>;

/// Result of running one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Reject(SkipReason),
}

/// One acceptance predicate over a staged image
pub trait FilterStage: Send + Sync {
    /// Stage name for logs
    fn name(&self) -> &'static str;

    fn check(&self, image: &StagedImage) -> Verdict;

    /// Undoes any state `check` recorded for an image that was not saved
    fn release(&self, _image: &StagedImage) {}
}

/// Image width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u64,
    pub height: u64,
}

/// Reads image dimensions from the file header
///
/// Returns None when the header cannot be decoded; callers treat that as
/// "cannot verify" rather than a rejection.
pub fn read_dimensions(path: &Path) -> Option<Dimensions> {
    let size = imagesize::size(path).ok()?;
    Some(Dimensions {
        width: size.width as u64,
        height: size.height as u64,
    })
}

/// SHA-256 hex digest of the first `prefix_len` bytes of a file
///
/// Returns None if the file cannot be read.
pub fn prefix_hash(path: &Path, prefix_len: usize) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut buf = Vec::with_capacity(prefix_len.min(1024 * 1024));
    file.take(prefix_len as u64).read_to_end(&mut buf).ok()?;
    Some(hex::encode(Sha256::digest(&buf)))
}

/// Rejects excluded formats by URL extension or response content type
pub struct ExcludedFormatStage {
    policy: ExtensionPolicy,
}

impl ExcludedFormatStage {
    pub fn new(policy: ExtensionPolicy) -> Self {
        Self { policy }
    }
}

impl FilterStage for ExcludedFormatStage {
    fn name(&self) -> &'static str {
        "excluded-format"
    }

    fn check(&self, image: &StagedImage) -> Verdict {
        let by_type = image
            .content_type
            .as_deref()
            .is_some_and(|ct| self.policy.is_excluded_content_type(ct));

        if by_type || self.policy.is_excluded_url(&image.url) {
            Verdict::Reject(SkipReason::ExcludedFormat)
        } else {
            Verdict::Pass
        }
    }
}

/// Rejects payloads smaller than a byte threshold
pub struct MinSizeStage {
    min_bytes: u64,
}

impl MinSizeStage {
    pub fn new(min_bytes: u64) -> Self {
        Self { min_bytes }
    }
}

impl FilterStage for MinSizeStage {
    fn name(&self) -> &'static str {
        "min-size"
    }

    fn check(&self, image: &StagedImage) -> Verdict {
        if image.byte_len < self.min_bytes {
            Verdict::Reject(SkipReason::TooSmallSize)
        } else {
            Verdict::Pass
        }
    }
}

/// Rejects images whose decoded width or height is below a minimum
pub struct MinDimensionsStage {
    min_width: u32,
    min_height: u32,
}

impl MinDimensionsStage {
    pub fn new(min_width: u32, min_height: u32) -> Self {
        Self {
            min_width,
            min_height,
        }
    }
}

impl FilterStage for MinDimensionsStage {
    fn name(&self) -> &'static str {
        "min-dimensions"
    }

    fn check(&self, image: &StagedImage) -> Verdict {
        match read_dimensions(&image.path) {
            Some(dims)
                if dims.width < u64::from(self.min_width)
                    || dims.height < u64::from(self.min_height) =>
            {
                Verdict::Reject(SkipReason::TooSmallDimensions)
            }
            Some(_) => Verdict::Pass,
            None => {
                tracing::debug!("Could not decode dimensions of {}, accepting", image.url);
                Verdict::Pass
            }
        }
    }
}

/// Rejects images whose leading bytes match an earlier accepted image
///
/// The check and the insert happen under one lock, so two workers staging
/// identical bytes cannot both pass.
pub struct DuplicateStage {
    hashes: ContentHashSet,
    prefix_len: usize,
}

impl DuplicateStage {
    pub fn new(hashes: ContentHashSet, prefix_len: usize) -> Self {
        Self { hashes, prefix_len }
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.hashes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FilterStage for DuplicateStage {
    fn name(&self) -> &'static str {
        "duplicate"
    }

    fn check(&self, image: &StagedImage) -> Verdict {
        let Some(hash) = prefix_hash(&image.path, self.prefix_len) else {
            tracing::debug!("Could not hash {}, skipping duplicate check", image.url);
            return Verdict::Pass;
        };

        if self.lock().insert(hash) {
            Verdict::Pass
        } else {
            Verdict::Reject(SkipReason::Duplicate)
        }
    }

    fn release(&self, image: &StagedImage) {
        if let Some(hash) = prefix_hash(&image.path, self.prefix_len) {
            self.lock().remove(&hash);
        }
    }
}

/// Ordered chain of filter stages
pub struct FilterPipeline {
    stages: Vec<Box<dyn FilterStage>>,
}

impl FilterPipeline {
    pub fn new(stages: Vec<Box<dyn FilterStage>>) -> Self {
        Self { stages }
    }

    /// Builds the standard stage order from configuration
    ///
    /// Excluded format, minimum size, minimum dimensions, then duplicate
    /// detection when `no-duplicates` is on.
    pub fn from_config(config: &FilterConfig, hashes: ContentHashSet) -> Self {
        let mut stages: Vec<Box<dyn FilterStage>> = vec![
            Box::new(ExcludedFormatStage::new(ExtensionPolicy::from_config(config))),
            Box::new(MinSizeStage::new(config.min_size_bytes())),
            Box::new(MinDimensionsStage::new(config.min_width, config.min_height)),
        ];

        if config.no_duplicates {
            stages.push(Box::new(DuplicateStage::new(hashes, config.hash_prefix_bytes)));
        }

        Self::new(stages)
    }

    /// Runs the stages in order and returns the first rejection
    pub fn evaluate(&self, image: &StagedImage) -> Verdict {
        for stage in &self.stages {
            if let Verdict::Reject(reason) = stage.check(image) {
                tracing::debug!("{} rejected by {} stage ({})", image.url, stage.name(), reason);
                return Verdict::Reject(reason);
            }
        }
        Verdict::Pass
    }

    /// Forgets what the stages recorded for an image that passed but was not saved
    ///
    /// Must be called while the staged file still exists.
    pub fn release(&self, image: &StagedImage) {
        for stage in &self.stages {
            stage.release(image);
        }
    }

    /// Stage names in evaluation order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}
