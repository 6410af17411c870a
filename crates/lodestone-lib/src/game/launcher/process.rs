/// Client process spawning and output capture
use crate::game::launcher::arguments::build_command;
use crate::game::launcher::types::{GameOutput, LaunchSpec, OutputStream};
use crate::utils::process::LaunchCommandExt;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Java executable not found: {0:?}")]
    JavaNotFound(PathBuf),

    #[error("Client directory {path:?} is unusable: {source}")]
    ClientDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Spawned process has no PID")]
    MissingPid,
}

/// A running client. Returned as soon as the process has started.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: u32,
    started_at: DateTime<Utc>,
    child: Child,
    output: mpsc::UnboundedReceiver<GameOutput>,
}

impl ProcessHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Next line of merged stdout/stderr; None once both pipes have closed
    pub async fn next_line(&mut self) -> Option<GameOutput> {
        self.output.recv().await
    }

    /// Wait for the client to exit
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Kill the client and reap it
    pub async fn kill(&mut self) -> std::io::Result<()> {
        log::info!("Killing client process (PID {})", self.pid);
        self.child.kill().await
    }
}

fn forward_lines<R>(reader: R, stream: OutputStream, tx: mpsc::UnboundedSender<GameOutput>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            // Keep draining after the handle is dropped so the child never
            // blocks on a full pipe
            let _ = tx.send(GameOutput { stream, line });
        }
    });
}

/// Spawn the client described by `spec`.
///
/// The child runs in the client directory with JVM override variables
/// removed, detached from the launcher, with stdout and stderr merged into
/// the handle's line channel.
pub async fn launch(spec: &LaunchSpec) -> Result<ProcessHandle, LaunchError> {
    log::info!(
        "Launching client {} for {} (max heap {} MB)",
        spec.version,
        spec.username,
        spec.max_memory_mb
    );

    if !spec.java_path.is_file() {
        return Err(LaunchError::JavaNotFound(spec.java_path.clone()));
    }

    let client_dir_err = |source| LaunchError::ClientDir {
        path: spec.client_root.clone(),
        source,
    };
    if !spec.client_root.exists() {
        std::fs::create_dir_all(&spec.client_root).map_err(client_dir_err)?;
    } else if !spec.client_root.is_dir() {
        return Err(client_dir_err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "path exists but is not a directory",
        )));
    }

    let command = build_command(spec);
    log::info!("Full command: {}", command.redacted());

    let mut cmd = tokio::process::Command::new(&command.program);
    cmd.args(&command.args)
        .current_dir(&command.current_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .strip_java_environment()
        .suppress_console()
        .detach();

    let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
        program: command.program.clone(),
        source,
    })?;
    let pid = child.id().ok_or(LaunchError::MissingPid)?;
    log::info!("Client process started with PID: {}", pid);

    let (tx, rx) = mpsc::unbounded_channel();
    if let Some(stdout) = child.stdout.take() {
        forward_lines(stdout, OutputStream::Stdout, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(stderr, OutputStream::Stderr, tx);
    }

    Ok(ProcessHandle {
        pid,
        started_at: Utc::now(),
        child,
        output: rx,
    })
}
