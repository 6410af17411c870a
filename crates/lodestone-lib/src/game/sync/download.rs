use crate::error::LauncherError;
use crate::game::pipeline::progress::ProgressReporter;
use crate::game::pipeline::state::PipelineState;
use crate::models::DownloadSet;
use crate::utils::hash::{hashes_match, EMPTY_MD5};
use crate::utils::paths::safe_join;
use futures::stream::{self, StreamExt};
use md5::{Digest, Md5};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::fs::{create_dir_all, File};
use tokio::io::AsyncWriteExt;
use url::Url;

/// Suffix of in-flight downloads, next to their destination
pub const PART_SUFFIX: &str = ".lodestone-part";

/// Transport-level failure of a single download. HTTP status failures and
/// empty bodies are treated exactly like connection errors.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP request failed for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status}: {url}")]
    Status { url: String, status: u16 },

    #[error("Empty response body: {url}")]
    EmptyBody { url: String },

    #[error("Hash mismatch for {url}: expected {expected}, got {actual}")]
    HashMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid download path or URL '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Download cancelled by user")]
    Cancelled,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> DownloadError + '_ {
    move |source| DownloadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Bytes written and digest of a streamed body
#[derive(Debug, Clone)]
pub struct StreamedBody {
    pub bytes: u64,
    pub md5: String,
}

/// GET `url` and stream the body into `file` in chunks, never buffering the
/// whole body. Byte progress goes to `reporter` when one is given.
pub async fn stream_to_file(
    client: &Client,
    url: &str,
    file: &mut File,
    file_path: &Path,
    reporter: Option<&dyn ProgressReporter>,
) -> Result<StreamedBody, DownloadError> {
    let transport = |source| DownloadError::Transport {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(transport)?;
    if !response.status().is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let total_size = response.content_length();
    let mut stream = response.bytes_stream();
    let mut hasher = Md5::new();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        if let Some(rep) = reporter {
            if rep.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }
        }

        let chunk = chunk.map_err(transport)?;
        file.write_all(&chunk).await.map_err(io_err(file_path))?;
        hasher.update(&chunk);
        downloaded += chunk.len() as u64;

        if let Some(rep) = reporter {
            rep.update_bytes(downloaded, total_size);
        }
    }

    file.flush().await.map_err(io_err(file_path))?;
    file.sync_all().await.map_err(io_err(file_path))?;

    Ok(StreamedBody {
        bytes: downloaded,
        md5: format!("{:x}", hasher.finalize()),
    })
}

/// Forwards cancellation only. Batch progress counts files, so per-file byte
/// updates are kept off the shared reporter.
struct CancelOnly<'a>(&'a dyn ProgressReporter);

impl ProgressReporter for CancelOnly<'_> {
    fn start_step(&self, _state: PipelineState, _message: &str) {}
    fn set_message(&self, _message: &str) {}
    fn set_step_count(&self, _current: u32, _total: Option<u32>) {}
    fn update_bytes(&self, _transferred: u64, _total: Option<u64>) {}
    fn done(&self, _success: bool, _message: Option<&str>) {}
    fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// Downloads synchronized client files from the content-delivery endpoint
#[derive(Debug, Clone)]
pub struct ClientDownloader {
    client: Client,
    base_url: Url,
    concurrency: usize,
}

impl ClientDownloader {
    pub fn new(client: Client, base_url: &str, concurrency: usize) -> Result<Self, DownloadError> {
        let base_url = Url::parse(base_url).map_err(|e| DownloadError::InvalidPath {
            path: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(DownloadError::InvalidPath {
                path: base_url.to_string(),
                reason: "URL cannot be a base".to_string(),
            });
        }

        Ok(Self {
            client,
            base_url,
            concurrency: concurrency.max(1),
        })
    }

    /// Remote URL for a manifest path: the CDN base with each path segment
    /// percent-encoded.
    pub fn file_url(&self, relative_path: &str) -> Result<Url, DownloadError> {
        let invalid = |reason: &str| DownloadError::InvalidPath {
            path: relative_path.to_string(),
            reason: reason.to_string(),
        };

        let segments: Vec<&str> = relative_path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(invalid("empty path"));
        }
        if segments.iter().any(|s| *s == "." || *s == "..") {
            return Err(invalid("dot segments are not allowed"));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| invalid("URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Download one file to `destination`, creating parent directories.
    ///
    /// The body is written to a hidden `.<name>.<random>.lodestone-part` file
    /// beside the destination and renamed into place only after it was fully
    /// received (and matched `expected_hash`, when given), so a failed
    /// transfer never leaves a file at the final path.
    pub async fn download_file(
        &self,
        relative_path: &str,
        destination: &Path,
        expected_hash: Option<&str>,
        reporter: &dyn ProgressReporter,
    ) -> Result<u64, DownloadError> {
        let url = self.file_url(relative_path)?;
        log::debug!("Downloading: {} -> {:?}", url, destination);

        let parent = destination.parent().unwrap_or_else(|| Path::new("."));
        create_dir_all(parent).await.map_err(io_err(parent))?;

        let name = destination
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("download");
        // Dropped (and deleted) on every early return
        let part = tempfile::Builder::new()
            .prefix(&format!(".{}.", name))
            .suffix(PART_SUFFIX)
            .tempfile_in(parent)
            .map_err(io_err(parent))?;

        let start = Instant::now();
        let body = self
            .download_to_part(url.as_str(), &part, expected_hash, reporter)
            .await?;

        // Atomic move into place
        part.persist(destination)
            .map_err(|e| io_err(destination)(e.error))?;

        log::debug!(
            "Download complete: {} ({} bytes in {:.2}s)",
            relative_path,
            body.bytes,
            start.elapsed().as_secs_f64()
        );
        Ok(body.bytes)
    }

    async fn download_to_part(
        &self,
        url: &str,
        part: &NamedTempFile,
        expected_hash: Option<&str>,
        reporter: &dyn ProgressReporter,
    ) -> Result<StreamedBody, DownloadError> {
        let part_path = part.path();
        let mut file = File::from_std(part.reopen().map_err(io_err(part_path))?);
        let cancel_only = CancelOnly(reporter);
        let cancel: &dyn ProgressReporter = &cancel_only;
        let body = stream_to_file(&self.client, url, &mut file, part_path, Some(cancel)).await;
        drop(file);
        let body = body?;

        if reporter.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }

        let empty_allowed = expected_hash.map_or(false, |h| hashes_match(h, EMPTY_MD5));
        if body.bytes == 0 && !empty_allowed {
            return Err(DownloadError::EmptyBody {
                url: url.to_string(),
            });
        }

        if let Some(expected) = expected_hash {
            if !hashes_match(&body.md5, expected) {
                return Err(DownloadError::HashMismatch {
                    url: url.to_string(),
                    expected: expected.to_string(),
                    actual: body.md5,
                });
            }
        }

        Ok(body)
    }

    /// Download every entry of `set` under `base_path`.
    ///
    /// Continue-on-error: every entry is attempted regardless of earlier
    /// failures, with bounded concurrency. Outcomes are collected first and
    /// the aggregate error is built only after the batch completes; files that
    /// succeeded stay on disk. Returns the number of files written.
    pub async fn download_all(
        &self,
        base_path: &Path,
        set: &DownloadSet,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Result<usize, LauncherError> {
        let total = set.len();
        if total == 0 {
            return Ok(0);
        }

        log::info!(
            "Starting batch download: {} files, concurrency={}",
            total,
            self.concurrency
        );
        reporter.set_step_count(0, Some(total as u32));

        let finished = Arc::new(AtomicUsize::new(0));

        let entries: Vec<(String, String)> = set.iter().map(|(relative, hash)| (relative.clone(), hash.clone())).collect();
        let outcomes: Vec<(String, Result<u64, DownloadError>)> = stream::iter(entries)
            .map(|(relative, hash)| {
                let reporter = reporter.clone();
                let finished = finished.clone();

                async move {
                    if reporter.is_cancelled() {
                        return (relative, Err(DownloadError::Cancelled));
                    }

                    reporter.set_message(&format!("Downloading {}", relative));

                    let result = match safe_join(base_path, &relative) {
                        Some(destination) => {
                            self.download_file(&relative, &destination, Some(hash.as_str()), &*reporter)
                                .await
                        }
                        None => Err(DownloadError::InvalidPath {
                            path: relative.clone(),
                            reason: "path escapes the client root".to_string(),
                        }),
                    };

                    let count = finished.fetch_add(1, Ordering::SeqCst) + 1;
                    reporter.set_step_count(count as u32, Some(total as u32));

                    (relative, result)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut succeeded = 0usize;
        let mut failed = 0usize;
        let mut cancelled = false;

        for (relative, outcome) in outcomes {
            match outcome {
                Ok(_) => succeeded += 1,
                Err(DownloadError::Cancelled) => cancelled = true,
                Err(e) => {
                    log::warn!("Failed to download {}: {}", relative, e);
                    failed += 1;
                }
            }
        }

        if cancelled {
            log::warn!(
                "Batch download cancelled after {} of {} files",
                succeeded,
                total
            );
            return Err(LauncherError::Cancelled);
        }

        if failed > 0 {
            log::error!(
                "Batch download finished with {} failures ({} succeeded)",
                failed,
                succeeded
            );
            return Err(LauncherError::AggregateDownload { failed, total });
        }

        log::info!("Batch download complete: {} files", succeeded);
        Ok(succeeded)
    }
}
