//! Integrity verification of a local client tree against its manifest.
//!
//! Verification never fails: any uncertainty (unreadable file, unsafe path)
//! degrades to "needs download".

use crate::models::{DownloadSet, FileStatus, FlatManifest};
use crate::utils::hash::{calculate_md5, hashes_match};
use crate::utils::paths::safe_join;
use anyhow::Result;
use rayon::prelude::*;
use std::path::Path;

/// Hex digest of a local file, in the format the server declares
pub fn calculate_hash(path: &Path) -> Result<String> {
    calculate_md5(path)
}

/// Classify one local file against its expected hash
pub fn check_file(path: &Path, expected_hash: &str) -> FileStatus {
    if !path.exists() {
        return FileStatus::Missing;
    }

    match calculate_hash(path) {
        Ok(actual) if hashes_match(&actual, expected_hash) => FileStatus::Valid,
        Ok(actual) => {
            log::debug!(
                "Hash mismatch ({} != {}): {:?}",
                actual,
                expected_hash,
                path
            );
            FileStatus::Mismatch
        }
        Err(e) => {
            log::warn!("Failed to hash {:?}, scheduling re-download: {:#}", path, e);
            FileStatus::Mismatch
        }
    }
}

/// Check every manifest entry under `base_path` and return those that need
/// downloading. Entries are checked in parallel; each check reads only its
/// own file.
pub fn verify(base_path: &Path, manifest: &FlatManifest) -> DownloadSet {
    let download_set: DownloadSet = manifest
        .par_iter()
        .filter_map(|(relative, entry)| {
            let status = match safe_join(base_path, relative) {
                Some(local) => check_file(&local, &entry.hash),
                None => {
                    log::warn!("Manifest path escapes the client root: {}", relative);
                    FileStatus::Mismatch
                }
            };
            (status != FileStatus::Valid).then(|| (relative.clone(), entry.hash.clone()))
        })
        .collect();

    log::info!(
        "Verified {} files under {:?}: {} need downloading",
        manifest.len(),
        base_path,
        download_set.len()
    );

    download_set
}
