//! Client file synchronization: manifest flattening, integrity verification
//! and the continue-on-error download batch.
pub mod download;
pub mod flatten;
pub mod verify;

pub use download::{ClientDownloader, DownloadError, PART_SUFFIX};
pub use flatten::flatten;
pub use verify::{calculate_hash, check_file, verify};
