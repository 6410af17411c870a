pub mod launcher;
pub mod pipeline;
pub mod runtime;
pub mod sync;

// Re-export commonly used types
pub use launcher::{launch, LaunchSpec, ProcessHandle};
pub use pipeline::progress::{ProgressEvent, ProgressReporter, SilentProgressReporter};
pub use pipeline::state::PipelineState;
pub use pipeline::{LaunchRequest, PipelineJob, UpdatePipeline};
pub use runtime::RuntimeProvisioner;
pub use sync::ClientDownloader;
