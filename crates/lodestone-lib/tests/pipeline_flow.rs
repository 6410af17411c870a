#![cfg(unix)]

use lodestone_lib::game::launcher::OutputStream;
use lodestone_lib::game::pipeline::progress::ProgressEvent;
use lodestone_lib::game::runtime::catalog::RuntimeCatalog;
use lodestone_lib::models::FileManifest;
use lodestone_lib::{
    LaunchRequest, LauncherError, LauncherSettings, PipelineConfig, PipelineState, ServerProfile,
    SessionData, UpdatePipeline,
};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HELLO_MD5: &str = "5d41402abc4b2a76b9719d911017c592";

fn fake_java(dir: &Path) -> PathBuf {
    let java = dir.join("fake-java");
    std::fs::write(&java, "#!/bin/sh\necho \"started $*\"\necho \"stderr line\" 1>&2\n").unwrap();
    std::fs::set_permissions(&java, std::fs::Permissions::from_mode(0o755)).unwrap();
    java
}

fn request(manifest_json: &str) -> LaunchRequest {
    LaunchRequest {
        manifest: Some(serde_json::from_str::<FileManifest>(manifest_json).unwrap()),
        session: SessionData::new("Steve", "0000-1111", "secretTok"),
        profile: ServerProfile {
            id: "hub".to_string(),
            name: "Hub".to_string(),
            address: "play.example.org".to_string(),
            port: 25565,
            version: "1.20.1".to_string(),
            asset_index: None,
            auto_connect: true,
        },
    }
}

fn pipeline(data: &Path, server: &MockServer, java: PathBuf) -> UpdatePipeline {
    let config = PipelineConfig::new(data).with_cdn_base_url(format!("{}/clients", server.uri()));
    let settings = LauncherSettings {
        max_memory_mb: Some(1024),
        custom_java_path: Some(java),
        ..Default::default()
    };
    UpdatePipeline::new(config, settings)
        .unwrap()
        .with_catalog(RuntimeCatalog::empty())
}

fn stage_sequence(events: &[ProgressEvent]) -> Vec<PipelineState> {
    let mut states: Vec<PipelineState> = Vec::new();
    for event in events {
        if states.last() != Some(&event.state) {
            states.push(event.state);
        }
    }
    states
}

#[tokio::test]
async fn updates_then_launches_client() {
    let _ = env_logger::builder().is_test(true).try_init();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clients/minecraft.jar"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let java = fake_java(tmp.path());
    let job = pipeline(&tmp.path().join("data"), &server, java).spawn(request(&format!(
        r#"{{ "files": {{ "minecraft.jar": {{ "md5": "{}" }} }} }}"#,
        HELLO_MD5
    )));

    let mut events = Vec::new();
    let mut handle = job.join_with(|e| events.push(e)).await.unwrap();

    assert_eq!(
        stage_sequence(&events),
        vec![
            PipelineState::Verifying,
            PipelineState::Downloading,
            PipelineState::ProvisioningRuntime,
            PipelineState::Launching,
            PipelineState::Launched,
        ]
    );

    let client_root = tmp.path().join("data/clients/hub");
    assert_eq!(
        std::fs::read_to_string(client_root.join("minecraft.jar")).unwrap(),
        "hello"
    );

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    while let Some(output) = handle.next_line().await {
        match output.stream {
            OutputStream::Stdout => stdout.push(output.line),
            OutputStream::Stderr => stderr.push(output.line),
        }
    }
    assert!(handle.wait().await.unwrap().success());

    let started = stdout.iter().find(|l| l.starts_with("started")).unwrap();
    assert!(started.contains("--username Steve"));
    assert!(started.contains("--server play.example.org --port 25565"));
    assert!(started.contains("-Xmx1024M"));
    assert_eq!(stderr, vec!["stderr line".to_string()]);

    // A second run finds nothing to download (the mock expects one request)
    let java = tmp.path().join("fake-java");
    let job = pipeline(&tmp.path().join("data"), &server, java).spawn(request(&format!(
        r#"{{ "files": {{ "minecraft.jar": {{ "md5": "{}" }} }} }}"#,
        HELLO_MD5
    )));
    let mut handle = job.join_with(|_| {}).await.unwrap();
    handle.wait().await.unwrap();
}

#[tokio::test]
async fn download_failures_stop_before_launch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clients/minecraft.jar"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .mount(&server)
        .await;
    // libraries/missing.jar is not served

    let tmp = TempDir::new().unwrap();
    let java = fake_java(tmp.path());
    let job = pipeline(&tmp.path().join("data"), &server, java).spawn(request(&format!(
        r#"{{
            "files": {{ "minecraft.jar": {{ "md5": "{hash}" }} }},
            "directories": {{
                "libraries": {{ "files": {{ "missing.jar": {{ "md5": "{hash}" }} }} }}
            }}
        }}"#,
        hash = HELLO_MD5
    )));

    let mut events = Vec::new();
    let err = job.join_with(|e| events.push(e)).await.unwrap_err();

    assert_eq!(err.stage, PipelineState::Downloading);
    assert_eq!(err.failed_items(), Some(1));
    assert!(matches!(
        err.source,
        LauncherError::AggregateDownload { failed: 1, total: 2 }
    ));
    assert_eq!(events.last().unwrap().state, PipelineState::Failed);
    assert!(!stage_sequence(&events).contains(&PipelineState::Launching));

    // Partial success stays on disk
    assert!(tmp.path().join("data/clients/hub/minecraft.jar").is_file());
}
