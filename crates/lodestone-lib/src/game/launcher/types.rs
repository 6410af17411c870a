/// Core types for client launching
use crate::config::{
    LauncherSettings, ASSETS_DIR, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, LIBRARIES_DIR,
    MIN_HEAP_MB, NATIVES_DIR, PRIMARY_ARTIFACT,
};
use crate::models::{ServerProfile, SessionData};
use crate::utils::hardware::recommended_memory_mb;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Placeholder that replaces the access token in anything written to logs
pub const REDACTED_TOKEN: &str = "<access-token>";

/// How the client window starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    Windowed { width: u32, height: u32 },
    Fullscreen,
}

/// Server the client joins right after start-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

/// Everything needed to start one client process
#[derive(Clone)]
pub struct LaunchSpec {
    /// Java executable path
    pub java_path: PathBuf,

    /// Synchronized client directory; also the working directory
    pub client_root: PathBuf,

    pub username: String,
    pub uuid: String,
    pub access_token: String,
    pub user_type: String,

    /// Client version (e.g., "1.20.1")
    pub version: String,
    pub asset_index: String,

    /// Maximum heap in MB
    pub max_memory_mb: u32,

    /// Initial heap in MB, never above `max_memory_mb`
    pub min_memory_mb: u32,

    pub window: WindowMode,

    /// Set when the profile asks for auto-connect
    pub server: Option<ServerAddress>,
}

impl LaunchSpec {
    /// Combine the session, the target server and the user settings into a
    /// launch description. Memory defaults to a host-derived value.
    pub fn build(
        session: &SessionData,
        target: &ServerProfile,
        client_root: &Path,
        java_path: &Path,
        settings: &LauncherSettings,
    ) -> Self {
        let client_root =
            dunce::canonicalize(client_root).unwrap_or_else(|_| client_root.to_path_buf());

        let max_memory_mb = settings
            .max_memory_mb
            .filter(|mb| *mb > 0)
            .unwrap_or_else(recommended_memory_mb);

        let window = if settings.fullscreen {
            WindowMode::Fullscreen
        } else {
            WindowMode::Windowed {
                width: settings.window_width.unwrap_or(DEFAULT_WINDOW_WIDTH),
                height: settings.window_height.unwrap_or(DEFAULT_WINDOW_HEIGHT),
            }
        };

        let server = target.auto_connect.then(|| ServerAddress {
            host: target.address.clone(),
            port: target.port,
        });

        Self {
            java_path: java_path.to_path_buf(),
            client_root,
            username: session.username.clone(),
            uuid: session.uuid.clone(),
            access_token: session.access_token.clone(),
            user_type: session.user_type.clone(),
            version: target.version.clone(),
            asset_index: target.asset_index(),
            max_memory_mb,
            min_memory_mb: MIN_HEAP_MB.min(max_memory_mb),
            window,
            server,
        }
    }

    /// Get the path to the libraries directory
    pub fn libraries_dir(&self) -> PathBuf {
        self.client_root.join(LIBRARIES_DIR)
    }

    /// Get the path to the native libraries directory
    pub fn natives_dir(&self) -> PathBuf {
        self.client_root.join(NATIVES_DIR)
    }

    /// Get the path to the assets directory
    pub fn assets_dir(&self) -> PathBuf {
        self.client_root.join(ASSETS_DIR)
    }

    /// Get the path to the primary client artifact
    pub fn primary_artifact(&self) -> PathBuf {
        self.client_root.join(PRIMARY_ARTIFACT)
    }
}

impl fmt::Debug for LaunchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchSpec")
            .field("java_path", &self.java_path)
            .field("client_root", &self.client_root)
            .field("username", &self.username)
            .field("uuid", &self.uuid)
            .field("access_token", &REDACTED_TOKEN)
            .field("version", &self.version)
            .field("max_memory_mb", &self.max_memory_mb)
            .field("window", &self.window)
            .field("server", &self.server)
            .finish()
    }
}

/// A fully assembled process invocation
#[derive(Clone)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub current_dir: PathBuf,
    pub(crate) secret: String,
}

impl LaunchCommand {
    /// Human-readable command line with the access token replaced by
    /// [`REDACTED_TOKEN`]. This is the only form that may be logged.
    pub fn redacted(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(quote_arg(&self.program.to_string_lossy()));
        for arg in &self.args {
            let arg = if self.secret.is_empty() {
                arg.clone()
            } else {
                arg.replace(&self.secret, REDACTED_TOKEN)
            };
            parts.push(quote_arg(&arg));
        }
        parts.join(" ")
    }
}

impl fmt::Debug for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchCommand")
            .field("command", &self.redacted())
            .field("current_dir", &self.current_dir)
            .finish()
    }
}

/// Quote an argument for log output / shell copy
pub(crate) fn quote_arg(s: &str) -> String {
    if s.is_empty() {
        return "\"\"".to_string();
    }
    if s.chars().any(|c| c.is_whitespace() || c == '"') {
        let esc = s.replace('\\', "\\\\").replace('"', "\\\"");
        return format!("\"{}\"", esc);
    }
    s.to_string()
}

/// Which pipe a line of client output came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One line of merged client output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameOutput {
    pub stream: OutputStream,
    pub line: String,
}
