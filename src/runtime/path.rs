//! Path utility functions for normalization, comparison and display.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by processing `.` and `..` components lexically.
/// This does not access the filesystem and does not follow symlinks.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Pop the last component if possible
                if !result.pop() {
                    result.push(component);
                }
            }
            _ => {
                result.push(component);
            }
        }
    }
    result
}

/// Check if a path is under a given directory by comparing normalized path components.
/// Returns true if `path` is under `dir` (i.e., `dir` is a prefix of `path`).
///
/// `/home/al` is not a prefix of `/home/alice`: comparison is per component,
/// never per character.
pub fn is_path_under(path: &Path, dir: &Path) -> bool {
    let normalized_path = normalize_path(path);
    let normalized_dir = normalize_path(dir);

    let path_components: Vec<_> = normalized_path.components().collect();
    let dir_components: Vec<_> = normalized_dir.components().collect();

    if path_components.len() < dir_components.len() {
        return false;
    }

    dir_components
        .iter()
        .zip(path_components.iter())
        .all(|(d, p)| d == p)
}

/// Rewrite `path` for display with the home directory shown as `~`.
///
/// `/home/user/src/tool` becomes `~/src/tool` and `/home/user` becomes `~`.
/// Relative paths, paths outside `home`, and anything when `home` is unknown
/// come back unchanged.
pub fn collapse_home(path: &str, home: Option<&Path>) -> String {
    let Some(home) = home else {
        return path.to_string();
    };

    let candidate = Path::new(path);
    if !candidate.is_absolute() || home.as_os_str().is_empty() || !is_path_under(candidate, home)
    {
        return path.to_string();
    }

    let normalized = normalize_path(candidate);
    match normalized.strip_prefix(normalize_path(home)) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => Path::new("~").join(rest).to_string_lossy().into_owned(),
        Err(_) => path.to_string(),
    }
}
