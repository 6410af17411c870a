//! Update/launch orchestration.
//!
//! `Init -> Verifying -> Downloading -> ProvisioningRuntime -> Launching ->
//! Launched`, or `Failed`; the error names the stage that broke. Stages run in order on
//! a tokio task; blocking work (hashing, unpacking) goes to the blocking pool.
pub mod progress;
pub mod state;

use crate::config::{LauncherSettings, PipelineConfig};
use crate::error::{LauncherError, PipelineError};
use crate::game::launcher::{launch, LaunchSpec, ProcessHandle};
use crate::game::runtime::catalog::RuntimeCatalog;
use crate::game::runtime::RuntimeProvisioner;
use crate::game::sync::{flatten, verify, ClientDownloader};
use crate::models::{FileManifest, ServerProfile, SessionData};
use crate::utils::layout::DataLayout;
use progress::{cancel_pair, CancelHandle, ChannelReporter, ProgressEvent, ProgressReporter};
use reqwest::Client;
use state::PipelineState;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Inputs for one update-and-launch run
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Server-declared file tree; None means nothing to synchronize
    pub manifest: Option<FileManifest>,
    pub session: SessionData,
    pub profile: ServerProfile,
}

/// Forward-only stage bookkeeping for one run
struct StageTracker {
    state: PipelineState,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            state: PipelineState::Init,
        }
    }

    fn enter(&mut self, next: PipelineState, message: &str, reporter: &dyn ProgressReporter) {
        if !self.state.can_advance_to(next) {
            log::error!("Ignoring backward pipeline transition {} -> {}", self.state, next);
            return;
        }
        log::info!("[pipeline] {} -> {}", self.state, next);
        self.state = next;
        reporter.start_step(next, message);
    }
}

fn ensure_not_cancelled(reporter: &dyn ProgressReporter) -> Result<(), LauncherError> {
    if reporter.is_cancelled() {
        return Err(LauncherError::Cancelled);
    }
    Ok(())
}

/// Verifies, repairs and launches a server's client
pub struct UpdatePipeline {
    settings: LauncherSettings,
    layout: DataLayout,
    client: Client,
    downloader: ClientDownloader,
    provisioner: RuntimeProvisioner,
}

impl UpdatePipeline {
    pub fn new(config: PipelineConfig, settings: LauncherSettings) -> Result<Self, LauncherError> {
        let client = config.http_client()?;
        let layout = DataLayout::new(&config.data_root);
        let downloader = ClientDownloader::new(
            client.clone(),
            &config.cdn_base_url,
            config.download_concurrency,
        )?;
        let provisioner =
            RuntimeProvisioner::new(client.clone(), layout.runtimes_dir(), RuntimeCatalog::default())
                .with_custom_java_path(settings.custom_java_path.clone());

        Ok(Self {
            settings,
            layout,
            client,
            downloader,
            provisioner,
        })
    }

    /// Replace the runtime catalog (e.g. with an internal mirror)
    pub fn with_catalog(mut self, catalog: RuntimeCatalog) -> Self {
        self.provisioner = RuntimeProvisioner::new(self.client.clone(), self.layout.runtimes_dir(), catalog)
            .with_custom_java_path(self.settings.custom_java_path.clone());
        self
    }

    /// Build a pipeline for `config`, reading launch preferences from the
    /// data root's `settings.json` (defaults when it does not exist yet)
    pub async fn from_data_root(config: PipelineConfig) -> anyhow::Result<Self> {
        let settings_path = DataLayout::new(&config.data_root).settings_file();
        let settings = LauncherSettings::load(&settings_path).await?;
        log::debug!("Loaded launcher settings from {:?}", settings_path);
        Ok(Self::new(config, settings)?)
    }

    /// Run every stage in order and return the live client process.
    /// On failure the reporter receives a `Failed` event and the error names
    /// the stage that failed.
    pub async fn run(
        &self,
        request: LaunchRequest,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Result<ProcessHandle, PipelineError> {
        let mut tracker = StageTracker::new();
        let started = std::time::Instant::now();

        match self.run_stages(&request, &reporter, &mut tracker).await {
            Ok(handle) => {
                log::info!(
                    "[pipeline] {} launched in {:.1}s (PID {})",
                    request.profile.name,
                    started.elapsed().as_secs_f64(),
                    handle.pid()
                );
                reporter.done(true, Some("Client started"));
                Ok(handle)
            }
            Err(source) => {
                let err = PipelineError::new(tracker.state, source);
                if err.is_cancelled() {
                    log::warn!("[pipeline] cancelled during {}", err.stage);
                } else {
                    log::error!("[pipeline] {}", err);
                }
                reporter.done(false, Some(&err.to_string()));
                Err(err)
            }
        }
    }

    async fn run_stages(
        &self,
        request: &LaunchRequest,
        reporter: &Arc<dyn ProgressReporter>,
        tracker: &mut StageTracker,
    ) -> Result<ProcessHandle, LauncherError> {
        let client_root = self.layout.client_dir(&request.profile.id);
        ensure_not_cancelled(reporter.as_ref())?;

        // Verify
        tracker.enter(
            PipelineState::Verifying,
            "Verifying client files",
            reporter.as_ref(),
        );
        let flat = flatten(request.manifest.as_ref());
        let verify_root = client_root.clone();
        let download_set = tokio::task::spawn_blocking(move || verify(&verify_root, &flat)).await?;
        ensure_not_cancelled(reporter.as_ref())?;

        // Download
        tracker.enter(
            PipelineState::Downloading,
            &format!("Downloading {} files", download_set.len()),
            reporter.as_ref(),
        );
        if !download_set.is_empty() {
            self.downloader
                .download_all(&client_root, &download_set, reporter.clone())
                .await?;
        }
        ensure_not_cancelled(reporter.as_ref())?;

        // Runtime
        tracker.enter(
            PipelineState::ProvisioningRuntime,
            "Preparing Java runtime",
            reporter.as_ref(),
        );
        let java_path = self
            .provisioner
            .resolve_runtime(&request.profile.version, reporter.as_ref())
            .await?;
        ensure_not_cancelled(reporter.as_ref())?;

        // Launch
        tracker.enter(PipelineState::Launching, "Starting client", reporter.as_ref());
        let spec = LaunchSpec::build(
            &request.session,
            &request.profile,
            &client_root,
            &java_path,
            &self.settings,
        );
        let handle = launch(&spec).await?;
        reporter.set_step_count(1, Some(1));

        Ok(handle)
    }

    /// Run the pipeline as a background job. Progress arrives on the job's
    /// channel; the caller drains it on a thread of its choosing.
    pub fn spawn(self, request: LaunchRequest) -> PipelineJob {
        let (cancel, token) = cancel_pair();
        let (reporter, progress) = ChannelReporter::new(token);
        let reporter: Arc<dyn ProgressReporter> = Arc::new(reporter);

        let handle = tokio::spawn(async move { self.run(request, reporter).await });

        PipelineJob {
            handle,
            progress,
            cancel,
        }
    }
}

/// A running pipeline: its task, its progress stream and its cancel switch
pub struct PipelineJob {
    pub handle: JoinHandle<Result<ProcessHandle, PipelineError>>,
    pub progress: mpsc::UnboundedReceiver<ProgressEvent>,
    pub cancel: CancelHandle,
}

impl PipelineJob {
    /// Request cancellation; observed between stages, between downloads and
    /// between streamed chunks
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the job, draining progress events into `on_event`
    pub async fn join_with<F>(mut self, mut on_event: F) -> Result<ProcessHandle, PipelineError>
    where
        F: FnMut(ProgressEvent),
    {
        let result = (&mut self.handle).await;
        while let Ok(event) = self.progress.try_recv() {
            on_event(event);
        }
        result.map_err(|e| PipelineError::new(PipelineState::Failed, LauncherError::from(e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileEntry;
    use progress::Progress;
    use std::collections::HashMap;

    fn request(manifest: Option<FileManifest>) -> LaunchRequest {
        LaunchRequest {
            manifest,
            session: SessionData::new("Steve", "0000-1111", "tok"),
            profile: ServerProfile {
                id: "hub".to_string(),
                name: "Hub".to_string(),
                address: "play.example.org".to_string(),
                port: 25565,
                version: "1.20.1".to_string(),
                asset_index: None,
                auto_connect: false,
            },
        }
    }

    #[tokio::test]
    async fn from_data_root_reads_saved_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = LauncherSettings {
            max_memory_mb: Some(3072),
            fullscreen: true,
            ..Default::default()
        };
        settings
            .save(&DataLayout::new(tmp.path()).settings_file())
            .await
            .unwrap();

        let pipeline = UpdatePipeline::from_data_root(PipelineConfig::new(tmp.path()))
            .await
            .unwrap();
        assert_eq!(pipeline.settings.max_memory_mb, Some(3072));
        assert!(pipeline.settings.fullscreen);

        let fresh = tempfile::tempdir().unwrap();
        let pipeline = UpdatePipeline::from_data_root(PipelineConfig::new(fresh.path()))
            .await
            .unwrap();
        assert_eq!(pipeline.settings.max_memory_mb, None);
    }

    #[test]
    fn tracker_refuses_backward_moves() {
        let reporter = progress::SilentProgressReporter;
        let mut tracker = StageTracker::new();
        tracker.enter(PipelineState::Downloading, "", &reporter);
        tracker.enter(PipelineState::Verifying, "", &reporter);
        assert_eq!(tracker.state, PipelineState::Downloading);
    }

    #[tokio::test]
    async fn fails_at_runtime_stage_without_catalog() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = UpdatePipeline::new(PipelineConfig::new(tmp.path()), LauncherSettings::default())
            .unwrap()
            .with_catalog(RuntimeCatalog::empty());

        let job = pipeline.spawn(request(None));
        let mut events = Vec::new();
        let err = job.join_with(|e| events.push(e)).await.unwrap_err();

        assert_eq!(err.stage, PipelineState::ProvisioningRuntime);
        assert!(matches!(err.source, LauncherError::Runtime(_)));

        let states: Vec<PipelineState> = events
            .iter()
            .map(|e| e.state)
            .fold(Vec::new(), |mut acc, s| {
                if acc.last() != Some(&s) {
                    acc.push(s);
                }
                acc
            });
        assert_eq!(
            states,
            vec![
                PipelineState::Verifying,
                PipelineState::Downloading,
                PipelineState::ProvisioningRuntime,
                PipelineState::Failed,
            ]
        );
        assert_eq!(events[0].progress, Progress::Indeterminate);
    }

    #[tokio::test]
    async fn cancelled_before_start_stops_at_init() {
        let tmp = tempfile::tempdir().unwrap();
        let mut files = HashMap::new();
        files.insert("minecraft.jar".to_string(), FileEntry::new("abc", 3));
        let manifest = FileManifest {
            directories: None,
            files: Some(files),
        };

        let pipeline = UpdatePipeline::new(PipelineConfig::new(tmp.path()), LauncherSettings::default())
            .unwrap();
        let (cancel, token) = cancel_pair();
        let (reporter, _rx) = ChannelReporter::new(token);
        cancel.cancel();

        let err = pipeline
            .run(request(Some(manifest)), Arc::new(reporter))
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.stage, PipelineState::Init);
        assert!(!tmp.path().join("clients/hub/minecraft.jar").exists());
    }
}
