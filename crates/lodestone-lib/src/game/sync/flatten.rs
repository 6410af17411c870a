use crate::models::{FileManifest, FlatManifest, ManifestNode};

/// Flatten a manifest tree into relative posix path -> entry.
/// An absent manifest yields an empty map.
pub fn flatten(manifest: Option<&FileManifest>) -> FlatManifest {
    let mut flat = FlatManifest::new();
    if let Some(manifest) = manifest {
        walk(&manifest.to_node(), "", &mut flat);
    }
    flat
}

/// Depth-first walk accumulating `/`-joined paths; the root starts empty
fn walk(node: &ManifestNode, prefix: &str, out: &mut FlatManifest) {
    match node {
        ManifestNode::File(entry) => {
            out.insert(prefix.to_string(), entry.clone());
        }
        ManifestNode::Directory(children) => {
            for (name, child) in children {
                let path = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{}/{}", prefix, name)
                };
                walk(child, &path, out);
            }
        }
    }
}
