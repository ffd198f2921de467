//! Checkpoint discovery on the local filesystem.

use std::path::{Path, PathBuf};

/// Recursively lists files under `dir` carrying the given extension
/// (without the leading dot), sorted by path for a stable ordering.
///
/// A missing or unreadable directory yields an empty list rather than an
/// error, matching the behavior callers expect when a model directory has
/// not been populated yet.
pub fn list_checkpoints(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut found = Vec::new();
    collect(dir, extension, &mut found);
    found.sort();
    found
}

fn collect(dir: &Path, extension: &str, found: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, extension, found);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        {
            found.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_yields_empty_list() {
        let found = list_checkpoints(Path::new("/definitely/not/here"), "onnx");
        assert!(found.is_empty());
    }
}
