//! Java runtime provisioning.
//!
//! RESOLVE_VERSION -> LOCATE_CACHED -> (hit) DONE, or
//! (miss) DOWNLOAD -> UNPACK -> LOCATE_EXECUTABLE -> DONE / FAILED.
pub mod archive;
pub mod catalog;
pub mod platform;
pub mod version;

use crate::game::pipeline::progress::ProgressReporter;
use crate::game::sync::download::{stream_to_file, DownloadError};
use archive::{extract_archive, ArchiveError, ArchiveKind};
use catalog::RuntimeCatalog;
use platform::RuntimeDescriptor;
use reqwest::Client;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub use version::required_java_major;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Managed runtimes are not available for this operating system or architecture")]
    UnsupportedPlatform,

    /// Configuration error: no build exists for this host, retrying will not help
    #[error("No runtime build available for {descriptor}")]
    NoBuildAvailable { descriptor: RuntimeDescriptor },

    #[error("Failed to download runtime: {0}")]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Runtime task failed: {0}")]
    Task(String),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> RuntimeError + '_ {
    move |source| RuntimeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Find the runtime entry point in an unpacked tree: a file named
/// `executable` inside a `bin` directory, shallowest match first.
///
/// Common JRE structures:
/// - java-17-linux-x64/bin/java (direct extraction)
/// - java-17-linux-x64/jdk-17.0.9+9-jre/bin/java (nested)
/// - java-17-macos-x64/jdk-17.0.9+9-jre/Contents/Home/bin/java (macOS)
pub fn find_java_executable(dir: &Path, executable: &str) -> Option<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| !entry.file_type().is_dir())
        .filter(|entry| entry.file_name() == OsStr::new(executable))
        .filter(|entry| {
            entry
                .path()
                .parent()
                .and_then(|p| p.file_name())
                .map_or(false, |name| name == OsStr::new("bin"))
        })
        .min_by_key(|entry| entry.depth())
        .map(|entry| entry.into_path())
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<(), RuntimeError> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path).map_err(io_err(path))?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).map_err(io_err(path))
}

/// Resolves, caches and installs the Java runtime a client version needs
#[derive(Debug, Clone)]
pub struct RuntimeProvisioner {
    client: Client,
    runtimes_dir: PathBuf,
    catalog: RuntimeCatalog,
    custom_java_path: Option<PathBuf>,
}

impl RuntimeProvisioner {
    pub fn new(client: Client, runtimes_dir: impl Into<PathBuf>, catalog: RuntimeCatalog) -> Self {
        Self {
            client,
            runtimes_dir: runtimes_dir.into(),
            catalog,
            custom_java_path: None,
        }
    }

    /// Prefer a user-chosen Java executable over managed runtimes
    pub fn with_custom_java_path(mut self, path: Option<PathBuf>) -> Self {
        self.custom_java_path = path;
        self
    }

    /// Cache directory for one runtime build
    pub fn runtime_dir(&self, descriptor: &RuntimeDescriptor) -> PathBuf {
        self.runtimes_dir.join(descriptor.cache_key())
    }

    /// Return the Java executable for `client_version`, installing it first
    /// when it is not cached.
    pub async fn resolve_runtime(
        &self,
        client_version: &str,
        reporter: &dyn ProgressReporter,
    ) -> Result<PathBuf, RuntimeError> {
        if let Some(ref custom) = self.custom_java_path {
            if custom.is_file() {
                log::info!("Using custom Java executable: {:?}", custom);
                return Ok(custom.clone());
            }
            log::warn!(
                "Custom Java path {:?} does not exist, falling back to a managed runtime",
                custom
            );
        }

        let major = required_java_major(client_version);
        let descriptor =
            RuntimeDescriptor::for_host(major).ok_or(RuntimeError::UnsupportedPlatform)?;
        log::info!(
            "Client version {} requires {}",
            client_version,
            descriptor
        );

        self.resolve_descriptor(&descriptor, reporter).await
    }

    /// Locate the cached install for `descriptor` or download and unpack it
    pub async fn resolve_descriptor(
        &self,
        descriptor: &RuntimeDescriptor,
        reporter: &dyn ProgressReporter,
    ) -> Result<PathBuf, RuntimeError> {
        let install_dir = self.runtime_dir(descriptor);
        let executable = descriptor.os.java_executable();

        if let Some(java_path) = find_java_executable(&install_dir, executable) {
            log::info!("Found existing runtime installation: {:?}", java_path);
            return Ok(java_path);
        }

        let build = self
            .catalog
            .lookup(descriptor)
            .cloned()
            .ok_or(RuntimeError::NoBuildAvailable {
                descriptor: *descriptor,
            })?;

        std::fs::create_dir_all(&self.runtimes_dir).map_err(io_err(&self.runtimes_dir))?;

        // Download
        log::info!("Downloading {} from: {}", descriptor, build.url);
        reporter.set_message(&format!("Downloading {}", descriptor));

        let suffix = match build.archive {
            ArchiveKind::Zip => ".zip",
            ArchiveKind::TarGz => ".tar.gz",
        };
        let archive_file = tempfile::Builder::new()
            .prefix(".download-")
            .suffix(suffix)
            .tempfile_in(&self.runtimes_dir)
            .map_err(io_err(&self.runtimes_dir))?;
        let archive_path = archive_file.path().to_path_buf();

        let std_file = archive_file.reopen().map_err(io_err(&archive_path))?;
        let mut file = tokio::fs::File::from_std(std_file);
        let body = stream_to_file(&self.client, &build.url, &mut file, &archive_path, Some(reporter))
            .await?;
        drop(file);

        if body.bytes == 0 {
            return Err(DownloadError::EmptyBody { url: build.url }.into());
        }

        // Unpack into a staging directory so an interrupted unpack never
        // looks like a cache hit
        reporter.set_message(&format!("Extracting {}", descriptor));
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.runtimes_dir)
            .map_err(io_err(&self.runtimes_dir))?;

        let staging_path = staging.path().to_path_buf();
        let unpack_archive = archive_path.clone();
        let kind = build.archive;
        let count = tokio::task::spawn_blocking(move || {
            extract_archive(&unpack_archive, kind, &staging_path)
        })
        .await
        .map_err(|e| RuntimeError::Task(e.to_string()))??;
        log::debug!("Unpacked {} files for {}", count, descriptor);

        // Locate executable
        let staged_java = find_java_executable(staging.path(), executable).ok_or_else(|| {
            ArchiveError::MissingExecutable {
                name: executable.to_string(),
                dir: staging.path().to_path_buf(),
            }
        })?;
        let relative = staged_java
            .strip_prefix(staging.path())
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from("bin").join(executable));

        if install_dir.exists() {
            // Leftover without an executable; replace it
            std::fs::remove_dir_all(&install_dir).map_err(io_err(&install_dir))?;
        }

        if let Err(e) = std::fs::rename(staging.path(), &install_dir) {
            // Another launcher may have finished the same install first
            if let Some(java_path) = find_java_executable(&install_dir, executable) {
                log::info!("Runtime installed concurrently, using {:?}", java_path);
                return Ok(java_path);
            }
            return Err(io_err(&install_dir)(e));
        }

        let java_path = install_dir.join(relative);

        // Archives do not reliably preserve the executable bit
        #[cfg(unix)]
        mark_executable(&java_path)?;

        log::info!("Runtime installed successfully: {:?}", java_path);
        Ok(java_path)
    }
}
