use crate::game::launcher::process::LaunchError;
use crate::game::pipeline::state::PipelineState;
use crate::game::runtime::RuntimeError;
use crate::game::sync::download::DownloadError;
use thiserror::Error;

/// Top-level error for the update/launch pipeline.
/// Component errors convert into this type; the orchestrator wraps it in a
/// [`PipelineError`] naming the stage that failed.
#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Continue-on-error batch finished with failures; successes stay on disk
    #[error("{failed} of {total} files failed to download")]
    AggregateDownload { failed: usize, total: usize },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error("Operation cancelled by user")]
    Cancelled,

    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for LauncherError {
    fn from(err: tokio::task::JoinError) -> Self {
        LauncherError::Task(err.to_string())
    }
}

/// Failure surfaced to the caller: the stage that failed and its cause
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct PipelineError {
    pub stage: PipelineState,
    #[source]
    pub source: LauncherError,
}

impl PipelineError {
    pub fn new(stage: PipelineState, source: impl Into<LauncherError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }

    /// Number of failed items, when the failure was an aggregate download error
    pub fn failed_items(&self) -> Option<usize> {
        match self.source {
            LauncherError::AggregateDownload { failed, .. } => Some(failed),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.source, LauncherError::Cancelled)
    }
}

pub type LauncherResult<T> = Result<T, LauncherError>;
