use flate2::write::GzEncoder;
use flate2::Compression;
use lodestone_lib::game::pipeline::progress::SilentProgressReporter;
use lodestone_lib::game::runtime::archive::{ArchiveError, ArchiveKind};
use lodestone_lib::game::runtime::catalog::{RuntimeBuild, RuntimeCatalog};
use lodestone_lib::game::runtime::platform::RuntimeDescriptor;
use lodestone_lib::game::runtime::{RuntimeError, RuntimeProvisioner};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn jre_archive(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, data, mode) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(*mode);
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

fn provisioner_for(server: &MockServer, runtimes: &std::path::Path, descriptor: RuntimeDescriptor) -> RuntimeProvisioner {
    let mut catalog = RuntimeCatalog::empty();
    catalog.insert(
        descriptor,
        RuntimeBuild {
            url: format!("{}/jre.tar.gz", server.uri()),
            archive: ArchiveKind::TarGz,
        },
    );
    RuntimeProvisioner::new(reqwest::Client::new(), runtimes, catalog)
}

#[tokio::test]
async fn installs_once_then_hits_cache() {
    let _ = env_logger::builder().is_test(true).try_init();
    let Some(descriptor) = RuntimeDescriptor::for_host(17) else {
        return;
    };
    let executable = format!("jdk-17.0.9+9-jre/bin/{}", descriptor.os.java_executable());

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jre.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(jre_archive(&[
            (executable.as_str(), b"#!/bin/sh\n", 0o644),
            ("jdk-17.0.9+9-jre/release", b"JAVA_VERSION=\"17.0.9\"", 0o644),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let runtimes = tmp.path().join("runtimes");
    let provisioner = provisioner_for(&server, &runtimes, descriptor);

    let java = provisioner
        .resolve_runtime("1.20.1", &SilentProgressReporter)
        .await
        .unwrap();
    assert!(java.is_file());
    assert!(java.starts_with(runtimes.join(descriptor.cache_key())));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&java).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    // Only the cache directory remains; temp archive and staging are gone
    let names: Vec<String> = std::fs::read_dir(&runtimes)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec![descriptor.cache_key()]);

    let again = provisioner
        .resolve_runtime("1.20.1", &SilentProgressReporter)
        .await
        .unwrap();
    assert_eq!(again, java);
}

#[tokio::test]
async fn archive_without_executable_is_rejected() {
    let Some(descriptor) = RuntimeDescriptor::for_host(17) else {
        return;
    };

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jre.tar.gz"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(jre_archive(&[("jdk/release", b"JAVA_VERSION=17", 0o644)])),
        )
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let runtimes = tmp.path().join("runtimes");
    let err = provisioner_for(&server, &runtimes, descriptor)
        .resolve_descriptor(&descriptor, &SilentProgressReporter)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RuntimeError::Archive(ArchiveError::MissingExecutable { .. })
    ));
    assert!(!runtimes.join(descriptor.cache_key()).exists());
}

#[tokio::test]
async fn server_error_fails_provisioning() {
    let Some(descriptor) = RuntimeDescriptor::for_host(21) else {
        return;
    };

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jre.tar.gz"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let err = provisioner_for(&server, tmp.path(), descriptor)
        .resolve_descriptor(&descriptor, &SilentProgressReporter)
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Download(_)));
}
