pub mod manifest;
pub mod session;

pub use manifest::{DownloadSet, FileEntry, FileManifest, FileStatus, FlatManifest, ManifestNode};
pub use session::{ServerProfile, SessionData};
