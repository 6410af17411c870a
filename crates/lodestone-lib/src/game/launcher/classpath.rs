/// Classpath construction for the synchronized client
use crate::game::runtime::platform::RuntimeOs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Get the classpath separator for the host OS
pub fn classpath_separator() -> &'static str {
    RuntimeOs::current()
        .map(|os| os.classpath_separator())
        .unwrap_or(":")
}

fn is_library_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// Every `.jar` / `.zip` below `libraries_dir`, sorted so the classpath is
/// stable between launches. A missing directory yields an empty list.
pub fn scan_libraries(libraries_dir: &Path) -> Vec<PathBuf> {
    let mut libraries: Vec<PathBuf> = WalkDir::new(libraries_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                if libraries_dir.exists() {
                    log::warn!("Skipping unreadable library entry: {}", e);
                }
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_library_archive(path))
        .collect();

    libraries.sort();
    libraries
}

/// Join the scanned libraries and the primary artifact into one classpath
pub fn build_classpath(libraries_dir: &Path, primary_artifact: &Path) -> String {
    let libraries = scan_libraries(libraries_dir);
    log::debug!("Classpath has {} libraries", libraries.len());

    libraries
        .iter()
        .chain(std::iter::once(&primary_artifact.to_path_buf()))
        .map(|p| p.to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join(classpath_separator())
}
