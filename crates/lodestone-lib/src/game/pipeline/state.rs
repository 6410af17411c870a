use serde::{Deserialize, Serialize};
use std::fmt;

/// Update/launch pipeline states. Transitions are strictly forward; there is
/// no retry in place, a caller retries by re-running the whole pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Init,
    Verifying,
    Downloading,
    ProvisioningRuntime,
    Launching,
    /// Terminal success
    Launched,
    /// Terminal failure; the failing stage travels with the error
    Failed,
}

impl PipelineState {
    fn ordinal(self) -> u8 {
        match self {
            PipelineState::Init => 0,
            PipelineState::Verifying => 1,
            PipelineState::Downloading => 2,
            PipelineState::ProvisioningRuntime => 3,
            PipelineState::Launching => 4,
            PipelineState::Launched => 5,
            PipelineState::Failed => 6,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Launched | PipelineState::Failed)
    }

    /// Whether progress in this state is reported as a completed/total fraction
    pub fn is_determinate(self) -> bool {
        matches!(self, PipelineState::Downloading | PipelineState::Launching)
    }

    /// Forward-only transition check. `Failed` is reachable from any
    /// non-terminal state; nothing leaves a terminal state.
    pub fn can_advance_to(self, next: PipelineState) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == PipelineState::Failed || next.ordinal() > self.ordinal()
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineState::Init => write!(f, "Init"),
            PipelineState::Verifying => write!(f, "Verifying"),
            PipelineState::Downloading => write!(f, "Downloading"),
            PipelineState::ProvisioningRuntime => write!(f, "Provisioning runtime"),
            PipelineState::Launching => write!(f, "Launching"),
            PipelineState::Launched => write!(f, "Launched"),
            PipelineState::Failed => write!(f, "Failed"),
        }
    }
}
