/// JVM and client argument assembly
use crate::config::{LAUNCHER_BRAND, MAIN_CLASS};
use crate::game::launcher::classpath::build_classpath;
use crate::game::launcher::types::{LaunchCommand, LaunchSpec, WindowMode};

/// Garbage-collector and compatibility flags passed to every client
const TUNING_FLAGS: &[&str] = &[
    "-XX:+UseG1GC",
    "-XX:+UnlockExperimentalVMOptions",
    "-XX:G1NewSizePercent=20",
    "-XX:G1ReservePercent=20",
    "-XX:MaxGCPauseMillis=50",
    "-XX:G1HeapRegionSize=32M",
    "-Dfml.ignoreInvalidMinecraftCertificates=true",
    "-Dfml.ignorePatchDiscrepancies=true",
];

/// Memory flags, tuning flags, library path and classpath
pub fn build_jvm_arguments(spec: &LaunchSpec, classpath: &str) -> Vec<String> {
    let mut args = vec![
        format!("-Xmx{}M", spec.max_memory_mb),
        format!("-Xms{}M", spec.min_memory_mb),
    ];
    args.extend(TUNING_FLAGS.iter().map(|s| s.to_string()));
    args.push(format!(
        "-Djava.library.path={}",
        spec.natives_dir().to_string_lossy()
    ));
    args.push("-cp".to_string());
    args.push(classpath.to_string());
    args
}

/// Client arguments following the main class
pub fn build_game_arguments(spec: &LaunchSpec) -> Vec<String> {
    let mut args = vec![
        "--username".to_string(),
        spec.username.clone(),
        "--uuid".to_string(),
        spec.uuid.clone(),
        "--accessToken".to_string(),
        spec.access_token.clone(),
        "--userType".to_string(),
        spec.user_type.clone(),
        "--versionType".to_string(),
        LAUNCHER_BRAND.to_string(),
        "--version".to_string(),
        spec.version.clone(),
        "--gameDir".to_string(),
        spec.client_root.to_string_lossy().to_string(),
        "--assetsDir".to_string(),
        spec.assets_dir().to_string_lossy().to_string(),
        "--assetIndex".to_string(),
        spec.asset_index.clone(),
    ];

    match spec.window {
        WindowMode::Windowed { width, height } => {
            args.push("--width".to_string());
            args.push(width.to_string());
            args.push("--height".to_string());
            args.push(height.to_string());
        }
        WindowMode::Fullscreen => args.push("--fullscreen".to_string()),
    }

    if let Some(ref server) = spec.server {
        args.push("--server".to_string());
        args.push(server.host.clone());
        args.push("--port".to_string());
        args.push(server.port.to_string());
    }

    args
}

/// Assemble the full invocation: JVM arguments, main class, client arguments
pub fn build_command(spec: &LaunchSpec) -> LaunchCommand {
    let classpath = build_classpath(&spec.libraries_dir(), &spec.primary_artifact());

    let mut args = build_jvm_arguments(spec, &classpath);
    args.push(MAIN_CLASS.to_string());
    args.extend(build_game_arguments(spec));

    LaunchCommand {
        program: spec.java_path.clone(),
        args,
        current_dir: spec.client_root.clone(),
        secret: spec.access_token.clone(),
    }
}
