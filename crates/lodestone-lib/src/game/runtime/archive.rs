//! Runtime archive extraction with a directory-traversal guard.
//!
//! Zip entries go through `enclosed_name`. Tar entries are unpacked with
//! `unpack_in`, after a lexical check of the entry name and link target and a
//! check that symlinks already on disk do not lead outside the destination.

use crate::utils::paths::safe_join;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Packaging of a runtime distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive entry escapes the destination directory: {entry}")]
    PathEscape { entry: String },

    #[error("Runtime executable '{name}' not found under {dir:?}")]
    MissingExecutable { name: String, dir: PathBuf },

    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ArchiveError + '_ {
    move |source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn escape(entry: impl std::fmt::Display) -> ArchiveError {
    ArchiveError::PathEscape {
        entry: entry.to_string(),
    }
}

fn resolve_entry(dest: &Path, entry: &Path) -> Result<PathBuf, ArchiveError> {
    safe_join(dest, entry).ok_or_else(|| escape(entry.display()))
}

/// The deepest part of `path` that already exists, with symlinks resolved,
/// must stay under `root` (itself canonical).
fn ensure_on_disk_within(root: &Path, path: &Path, entry: &Path) -> Result<(), ArchiveError> {
    let existing = path
        .ancestors()
        .find(|p| fs::symlink_metadata(p).is_ok())
        .unwrap_or(root);
    let resolved = dunce::canonicalize(existing).map_err(io_err(existing))?;
    if !resolved.starts_with(root) {
        return Err(escape(entry.display()));
    }
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), ArchiveError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o777)).map_err(io_err(path))
}

/// Extract an archive file into `dest`. Returns the number of files written.
pub fn extract_archive(archive: &Path, kind: ArchiveKind, dest: &Path) -> Result<usize, ArchiveError> {
    log::debug!("Extracting {:?} ({:?}) to: {:?}", archive, kind, dest);

    let file = fs::File::open(archive).map_err(io_err(archive))?;
    let reader = BufReader::new(file);

    let count = match kind {
        ArchiveKind::Zip => extract_zip(reader, dest)?,
        ArchiveKind::TarGz => extract_tar_gz(reader, dest)?,
    };

    log::debug!("Extraction complete: {} files", count);
    Ok(count)
}

/// Extract a zip archive entry by entry
pub fn extract_zip<R: Read + Seek>(reader: R, dest: &Path) -> Result<usize, ArchiveError> {
    fs::create_dir_all(dest).map_err(io_err(dest))?;
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut written = 0;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let Some(enclosed) = file.enclosed_name() else {
            return Err(escape(file.name()));
        };
        let outpath = dest.join(enclosed);

        if file.is_dir() {
            fs::create_dir_all(&outpath).map_err(io_err(&outpath))?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        let mut outfile = fs::File::create(&outpath).map_err(io_err(&outpath))?;
        std::io::copy(&mut file, &mut outfile).map_err(io_err(&outpath))?;
        written += 1;

        // Set permissions on Unix
        #[cfg(unix)]
        {
            if let Some(mode) = file.unix_mode() {
                set_mode(&outpath, mode)?;
            }
        }
    }

    Ok(written)
}

/// Extract a gzip-compressed tar archive entry by entry, propagating the
/// POSIX mode of regular files on unix.
pub fn extract_tar_gz<R: Read>(reader: R, dest: &Path) -> Result<usize, ArchiveError> {
    fs::create_dir_all(dest).map_err(io_err(dest))?;
    let root = dunce::canonicalize(dest).map_err(io_err(dest))?;

    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let mut written = 0;

    for entry in archive.entries().map_err(io_err(dest))? {
        let mut entry = entry.map_err(io_err(dest))?;
        let entry_path = entry.path().map_err(io_err(dest))?.into_owned();
        let outpath = resolve_entry(&root, &entry_path)?;
        let entry_type = entry.header().entry_type();

        if let Some(parent) = outpath.parent() {
            ensure_on_disk_within(&root, parent, &entry_path)?;
        }

        if entry_type.is_symlink() || entry_type.is_hard_link() {
            let target = entry
                .link_name()
                .map_err(io_err(&outpath))?
                .map(|t| t.into_owned())
                .unwrap_or_default();
            let link = format!("{} -> {}", entry_path.display(), target.display());

            // Hard link targets are relative to the archive root, symlink
            // targets to the link's own directory
            let resolved = if entry_type.is_hard_link() {
                safe_join(&root, &target)
            } else if target.is_absolute() {
                None
            } else {
                let link_dir = entry_path.parent().unwrap_or_else(|| Path::new(""));
                safe_join(&root, link_dir.join(&target))
            };
            let Some(resolved) = resolved else {
                return Err(escape(link));
            };

            // Catches chains such as `x -> .` followed by `y -> x/..`
            let unlexed = match outpath.parent() {
                Some(parent) if entry_type.is_symlink() => parent.join(&target),
                _ => resolved,
            };
            ensure_on_disk_within(&root, &unlexed, Path::new(&link))?;
        }

        if !entry.unpack_in(&root).map_err(io_err(&outpath))? {
            return Err(escape(entry_path.display()));
        }
        if entry_type.is_dir() {
            continue;
        }
        written += 1;

        #[cfg(unix)]
        {
            if entry_type.is_file() {
                if let Ok(mode) = entry.header().mode() {
                    set_mode(&outpath, mode)?;
                }
            }
        }
    }

    Ok(written)
}
