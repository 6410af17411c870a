use crate::game::pipeline::state::PipelineState;
use serde::Serialize;
use std::sync::Mutex;
use tokio::sync::{mpsc, watch};

/// Progress reporter trait for pipeline operations.
/// Implementations forward updates to whatever UI layer the caller runs;
/// methods are called from the pipeline worker, never from the caller's thread.
pub trait ProgressReporter: Send + Sync {
    /// Enter a new pipeline state with a human-readable status
    fn start_step(&self, state: PipelineState, message: &str);

    /// Set a short status message (e.g. the file about to be downloaded)
    fn set_message(&self, message: &str);

    /// Set a numeric step count for the current step (e.g. "3/12").
    /// `total` may be None when unknown.
    fn set_step_count(&self, current: u32, total: Option<u32>);

    /// Update bytes transferred for a single large download
    fn update_bytes(&self, transferred: u64, total: Option<u64>);

    /// Mark operation as complete
    fn done(&self, success: bool, message: Option<&str>);

    /// Check if operation has been cancelled
    fn is_cancelled(&self) -> bool;
}

/// A progress reporter that does nothing (silent).
/// Useful for background verification or tests.
pub struct SilentProgressReporter;

impl ProgressReporter for SilentProgressReporter {
    fn start_step(&self, _state: PipelineState, _message: &str) {}
    fn set_message(&self, _message: &str) {}
    fn set_step_count(&self, _current: u32, _total: Option<u32>) {}
    fn update_bytes(&self, _transferred: u64, _total: Option<u64>) {}
    fn done(&self, _success: bool, _message: Option<&str>) {}
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Fraction of work done for the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Progress {
    Indeterminate,
    Determinate { completed: u64, total: u64 },
}

impl Progress {
    /// Completed fraction in [0, 1], None while indeterminate
    pub fn fraction(&self) -> Option<f64> {
        match *self {
            Progress::Indeterminate => None,
            Progress::Determinate { total: 0, .. } => Some(1.0),
            Progress::Determinate { completed, total } => {
                Some((completed as f64 / total as f64).min(1.0))
            }
        }
    }
}

/// One update posted to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub state: PipelineState,
    pub message: String,
    pub progress: Progress,
}

/// Cancellation token wrapper
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Caller-side half of a [`CancelToken`]
#[derive(Clone)]
pub struct CancelHandle {
    tx: std::sync::Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a linked cancel handle / token pair
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (
        CancelHandle {
            tx: std::sync::Arc::new(tx),
        },
        CancelToken::new(rx),
    )
}

/// Reporter that posts [`ProgressEvent`]s onto a channel the caller drains
/// on a thread of its choosing.
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<ProgressEvent>,
    cancel: CancelToken,
    current: Mutex<(PipelineState, Progress)>,
}

impl ChannelReporter {
    pub fn new(cancel: CancelToken) -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                cancel,
                current: Mutex::new((PipelineState::Init, Progress::Indeterminate)),
            },
            rx,
        )
    }

    fn current(&self) -> (PipelineState, Progress) {
        self.current
            .lock()
            .map(|c| *c)
            .unwrap_or((PipelineState::Init, Progress::Indeterminate))
    }

    fn record(&self, state: PipelineState, progress: Progress) {
        if let Ok(mut current) = self.current.lock() {
            *current = (state, progress);
        }
    }

    fn emit(&self, state: PipelineState, message: impl Into<String>, progress: Progress) {
        // The receiver may be gone if the caller stopped listening
        let _ = self.tx.send(ProgressEvent {
            state,
            message: message.into(),
            progress,
        });
    }
}

impl ProgressReporter for ChannelReporter {
    fn start_step(&self, state: PipelineState, message: &str) {
        let progress = if state.is_determinate() {
            Progress::Determinate {
                completed: 0,
                total: 0,
            }
        } else {
            Progress::Indeterminate
        };
        self.record(state, progress);
        self.emit(state, message, progress);
    }

    fn set_message(&self, message: &str) {
        let (state, progress) = self.current();
        self.emit(state, message, progress);
    }

    fn set_step_count(&self, current: u32, total: Option<u32>) {
        let (state, _) = self.current();
        let progress = match total {
            Some(total) => Progress::Determinate {
                completed: current as u64,
                total: total as u64,
            },
            None => Progress::Indeterminate,
        };
        let message = match total {
            Some(total) => format!("{}/{}", current, total),
            None => current.to_string(),
        };
        self.record(state, progress);
        self.emit(state, message, progress);
    }

    fn update_bytes(&self, transferred: u64, total: Option<u64>) {
        let (state, _) = self.current();
        let progress = match total {
            Some(total) => Progress::Determinate {
                completed: transferred,
                total,
            },
            None => Progress::Indeterminate,
        };
        self.emit(state, "", progress);
    }

    fn done(&self, success: bool, message: Option<&str>) {
        let (state, progress) = if success {
            (
                PipelineState::Launched,
                Progress::Determinate {
                    completed: 1,
                    total: 1,
                },
            )
        } else {
            (PipelineState::Failed, Progress::Indeterminate)
        };
        self.record(state, progress);
        self.emit(state, message.unwrap_or_default(), progress);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_of_progress() {
        assert_eq!(Progress::Indeterminate.fraction(), None);
        assert_eq!(
            Progress::Determinate {
                completed: 1,
                total: 4
            }
            .fraction(),
            Some(0.25)
        );
        assert_eq!(
            Progress::Determinate {
                completed: 0,
                total: 0
            }
            .fraction(),
            Some(1.0)
        );
    }

    #[test]
    fn channel_reporter_tags_events_with_current_state() {
        let (_handle, token) = cancel_pair();
        let (reporter, mut rx) = ChannelReporter::new(token);

        reporter.start_step(PipelineState::Verifying, "Verifying files");
        reporter.start_step(PipelineState::Downloading, "Downloading files");
        reporter.set_step_count(2, Some(5));

        let verifying = rx.try_recv().unwrap();
        assert_eq!(verifying.state, PipelineState::Verifying);
        assert_eq!(verifying.progress, Progress::Indeterminate);

        let downloading = rx.try_recv().unwrap();
        assert_eq!(downloading.state, PipelineState::Downloading);

        let count = rx.try_recv().unwrap();
        assert_eq!(count.state, PipelineState::Downloading);
        assert_eq!(
            count.progress,
            Progress::Determinate {
                completed: 2,
                total: 5
            }
        );

        // Messages keep the last known fraction
        reporter.set_message("Downloading libraries/gson.jar");
        let message = rx.try_recv().unwrap();
        assert_eq!(message.message, "Downloading libraries/gson.jar");
        assert_eq!(message.progress, count.progress);
    }

    #[test]
    fn cancel_handle_flips_token() {
        let (handle, token) = cancel_pair();
        let (reporter, _rx) = ChannelReporter::new(token.clone());
        assert!(!reporter.is_cancelled());

        handle.cancel();
        assert!(token.is_cancelled());
        assert!(reporter.is_cancelled());
    }
}
