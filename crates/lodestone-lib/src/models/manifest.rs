use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Expected content of a single client file.
/// Identity is positional: the entry does not know its own path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Hex digest of the file contents (MD5 on the wire)
    #[serde(rename = "md5", alias = "hash", alias = "contentHash")]
    pub hash: String,

    /// Size in bytes
    #[serde(default)]
    pub size: u64,
}

impl FileEntry {
    pub fn new(hash: impl Into<String>, size: u64) -> Self {
        Self {
            hash: hash.into(),
            size,
        }
    }
}

/// Server-declared file tree as received from the authentication exchange.
/// Either map may be absent at any depth.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directories: Option<HashMap<String, FileManifest>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<HashMap<String, FileEntry>>,
}

/// Manifest tree as a tagged recursive variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestNode {
    Directory(BTreeMap<String, ManifestNode>),
    File(FileEntry),
}

impl FileManifest {
    /// Convert the wire shape into a [`ManifestNode`] tree.
    /// A file and a directory sharing a name cannot both exist on disk; the
    /// file wins.
    pub fn to_node(&self) -> ManifestNode {
        let mut children = BTreeMap::new();

        if let Some(ref directories) = self.directories {
            for (name, child) in directories {
                children.insert(name.clone(), child.to_node());
            }
        }

        if let Some(ref files) = self.files {
            for (name, entry) in files {
                if children
                    .insert(name.clone(), ManifestNode::File(entry.clone()))
                    .is_some()
                {
                    log::warn!("Manifest declares '{}' as both file and directory", name);
                }
            }
        }

        ManifestNode::Directory(children)
    }
}

/// Relative posix path -> expected entry
pub type FlatManifest = HashMap<String, FileEntry>;

/// Relative posix path -> expected hash, for every entry that needs downloading
pub type DownloadSet = BTreeMap<String, String>;

/// Classification of a local file against its expected hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStatus {
    Missing,
    Mismatch,
    Valid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_wire_manifest() {
        let json = r#"{
            "files": {"a.txt": {"md5": "X", "size": 3}},
            "directories": {"mods": {"files": {"b.jar": {"hash": "Y", "size": 10}}}}
        }"#;
        let manifest: FileManifest = serde_json::from_str(json).unwrap();

        let files = manifest.files.as_ref().unwrap();
        assert_eq!(files["a.txt"], FileEntry::new("X", 3));

        let mods = &manifest.directories.as_ref().unwrap()["mods"];
        assert!(mods.directories.is_none());
        assert_eq!(mods.files.as_ref().unwrap()["b.jar"].hash, "Y");
    }

    #[test]
    fn to_node_builds_nested_variants() {
        let json = r#"{"directories": {"config": {}}, "files": {"options.txt": {"md5": "abc"}}}"#;
        let manifest: FileManifest = serde_json::from_str(json).unwrap();

        let ManifestNode::Directory(children) = manifest.to_node() else {
            panic!("root must be a directory");
        };
        assert_eq!(children["config"], ManifestNode::Directory(BTreeMap::new()));
        assert_eq!(children["options.txt"], ManifestNode::File(FileEntry::new("abc", 0)));
    }
}
