use crate::config::SETTINGS_FILENAME;
use std::path::{Path, PathBuf};

/// On-disk layout under the per-user data root
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the path to the persisted launch preferences
    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILENAME)
    }

    /// Get the directory holding every synchronized client
    pub fn clients_dir(&self) -> PathBuf {
        self.root.join("clients")
    }

    /// Get the synchronized client directory for one server
    pub fn client_dir(&self, server_id: &str) -> PathBuf {
        self.clients_dir().join(server_id)
    }

    /// Get the path to the cached runtimes directory
    pub fn runtimes_dir(&self) -> PathBuf {
        self.root.join("runtimes")
    }
}
