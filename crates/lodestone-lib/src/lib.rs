//! Game-client updater and launcher.
//!
//! Keeps a server's client tree in sync with the server-declared manifest,
//! provisions the Java runtime the client version needs and starts the client.
pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod utils;

pub use config::{LauncherSettings, PipelineConfig};
pub use error::{LauncherError, LauncherResult, PipelineError};
pub use game::{LaunchRequest, PipelineJob, PipelineState, UpdatePipeline};
pub use models::{FileManifest, ServerProfile, SessionData};
