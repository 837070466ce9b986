//! Image downloader
//!
//! Each attempt goes through these steps:
//! 1. Excluded URL extension: skip with no network access
//! 2. Derive the destination name, probing Content-Type with HEAD when the
//!    URL has no usable filename
//! 3. Destination already present: skip with no GET
//! 4. Stream the body into a temp file inside the output directory
//! 5. Run the filter pipeline against the staged file
//! 6. Promote it with a no-clobber rename
//!
//! The temp file is a `NamedTempFile`, so every early return and error path
//! deletes it when it drops. Steps 5 and 6 run on the blocking pool.

use super::filename::{
    extension_for_content_type, filename_from_url, has_extension, sanitize_filename,
    synthesized_name,
};
use super::filter::{ContentHashSet, FilterPipeline, Verdict};
use super::{DownloadError, DownloadOutcome, ImageCandidate, StagedImage};
use crate::config::Config;
use crate::crawler::{FetchError, Fetcher};
use crate::state::SkipReason;
use crate::url::ExtensionPolicy;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Longest destination-name fragment embedded in a temp file name
const TEMP_NAME_FRAGMENT_LEN: usize = 64;

/// Suffix of staged files; never a final image name
pub const PART_SUFFIX: &str = ".part";

/// Downloads candidate images into the output directory
pub struct Downloader {
    fetcher: Fetcher,
    output_dir: PathBuf,
    policy: ExtensionPolicy,
    pipeline: Arc<FilterPipeline>,

    /// Counter behind `image_<n>.<ext>` names
    name_counter: AtomicUsize,
}

impl Downloader {
    pub fn new(
        fetcher: Fetcher,
        output_dir: PathBuf,
        policy: ExtensionPolicy,
        pipeline: FilterPipeline,
    ) -> Self {
        Self {
            fetcher,
            output_dir,
            policy,
            pipeline: Arc::new(pipeline),
            name_counter: AtomicUsize::new(0),
        }
    }

    /// Creates a downloader using the standard filter stages
    pub fn from_config(config: &Config, fetcher: Fetcher, hashes: ContentHashSet) -> Self {
        Self::new(
            fetcher,
            config.output.directory.clone(),
            ExtensionPolicy::from_config(&config.filter),
            FilterPipeline::from_config(&config.filter, hashes),
        )
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Attempts one image and reports how it ended
    ///
    /// Never returns an error: failures become `DownloadOutcome::Failed`.
    pub async fn download(
        &self,
        candidate: &ImageCandidate,
        cancel: &CancellationToken,
    ) -> DownloadOutcome {
        match self.try_download(&candidate.source_url, cancel).await {
            Ok(outcome) => {
                match &outcome {
                    DownloadOutcome::Accepted(path) => {
                        tracing::info!("Saved {} -> {}", candidate.source_url, path.display())
                    }
                    DownloadOutcome::Skipped(reason) => {
                        tracing::debug!("Skipped {} ({})", candidate.source_url, reason)
                    }
                    DownloadOutcome::Failed(_) => {}
                }
                outcome
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to download {} (found on {}): {}",
                    candidate.source_url,
                    candidate.page_url,
                    e
                );
                DownloadOutcome::Failed(e)
            }
        }
    }

    async fn try_download(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome, DownloadError> {
        if self.policy.is_excluded_url(url) {
            return Ok(DownloadOutcome::Skipped(SkipReason::ExcludedFormat));
        }

        let Some(name) = self.destination_name(url, cancel).await? else {
            return Ok(DownloadOutcome::Skipped(SkipReason::ExcludedFormat));
        };

        let destination = self.output_dir.join(&name);
        if tokio::fs::try_exists(&destination).await? {
            return Ok(DownloadOutcome::Skipped(SkipReason::AlreadyExists));
        }

        let mut response = self.fetcher.fetch_bytes(url, cancel).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let staged = tempfile::Builder::new()
            .prefix(&format!(".{}.", temp_name_fragment(&name)))
            .suffix(PART_SUFFIX)
            .tempfile_in(&self.output_dir)?;
        let mut writer = tokio::fs::File::from_std(staged.as_file().try_clone()?);

        let mut byte_len: u64 = 0;
        loop {
            let chunk = tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled.into()),
                chunk = response.chunk() => chunk.map_err(|e| {
                    FetchError::from_reqwest(e, self.fetcher.request_timeout())
                })?,
            };
            let Some(chunk) = chunk else {
                break;
            };
            writer.write_all(&chunk).await?;
            byte_len += chunk.len() as u64;
        }
        writer.flush().await?;
        drop(writer);

        let image = StagedImage {
            url: url.clone(),
            path: staged.path().to_path_buf(),
            byte_len,
            content_type,
        };

        // Header decoding, hashing and the rename all touch the disk
        let pipeline = Arc::clone(&self.pipeline);
        tokio::task::spawn_blocking(move || admit(&pipeline, &image, staged, destination))
            .await
            .map_err(|e| DownloadError::Io(io::Error::new(ErrorKind::Other, e)))?
    }

    /// Picks the final filename, or None when a HEAD probe reveals an excluded format
    async fn destination_name(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, DownloadError> {
        if let Some(name) = filename_from_url(url).and_then(|n| sanitize_filename(&n)) {
            if has_extension(&name) {
                return Ok(Some(name));
            }
        }

        let content_type = match self.fetcher.head_content_type(url, cancel).await {
            Ok(content_type) => content_type,
            Err(FetchError::Cancelled) => return Err(FetchError::Cancelled.into()),
            Err(e) => {
                tracing::debug!("HEAD probe for {} failed ({}), assuming jpg", url, e);
                None
            }
        };

        if content_type
            .as_deref()
            .is_some_and(|ct| self.policy.is_excluded_content_type(ct))
        {
            return Ok(None);
        }

        let ext = extension_for_content_type(content_type.as_deref());
        let index = self.name_counter.fetch_add(1, Ordering::SeqCst);
        Ok(Some(synthesized_name(index, &ext)))
    }
}

/// Runs the filter pipeline on a staged file and publishes it on a pass
///
/// A lost no-clobber rename releases whatever the stages recorded, so the
/// duplicate set only ever holds hashes of images that were saved.
fn admit(
    pipeline: &FilterPipeline,
    image: &StagedImage,
    staged: NamedTempFile,
    destination: PathBuf,
) -> Result<DownloadOutcome, DownloadError> {
    if let Verdict::Reject(reason) = pipeline.evaluate(image) {
        return Ok(DownloadOutcome::Skipped(reason));
    }

    match staged.persist_noclobber(&destination) {
        Ok(_) => Ok(DownloadOutcome::Accepted(destination)),
        Err(e) => {
            pipeline.release(image);
            if e.error.kind() == ErrorKind::AlreadyExists {
                Ok(DownloadOutcome::Skipped(SkipReason::AlreadyExists))
            } else {
                Err(DownloadError::Io(e.error))
            }
        }
    }
}

fn temp_name_fragment(name: &str) -> &str {
    let mut end = name.len().min(TEMP_NAME_FRAGMENT_LEN);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}
