use std::path::{Component, Path, PathBuf};

/// Join `relative` onto `root` lexically, refusing anything that would land
/// outside `root`: absolute paths, drive prefixes, and `..` climbing past the
/// root. Returns `None` for such paths.
pub fn safe_join(root: &Path, relative: impl AsRef<Path>) -> Option<PathBuf> {
    let mut out = root.to_path_buf();
    let mut depth = 0usize;

    for component in relative.as_ref().components() {
        match component {
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                out.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(out)
}
