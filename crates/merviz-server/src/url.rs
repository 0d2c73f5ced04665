//! Public URL computation for served artifacts.

use std::path::{Component, Path};

use crate::{Error, Result};

/// Computes the request URL for an artifact under the output directory.
///
/// The URL is `{base_url}/files/{path relative to the output dir}` with
/// path separators normalized to forward slashes.
///
/// # Errors
///
/// Returns an error when the artifact does not live inside the output
/// directory; artifacts outside the served tree must never be linked.
pub fn file_url(base_url: &str, output_dir: &Path, artifact: &Path) -> Result<String> {
    let relative = match artifact.strip_prefix(output_dir) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => {
            // paths may differ in representation (relative vs absolute);
            // compare canonical forms before giving up
            let canonical_dir = output_dir.canonicalize()?;
            let canonical_artifact = artifact.canonicalize()?;
            canonical_artifact
                .strip_prefix(&canonical_dir)
                .map_err(|_| Error::OutsideOutputDir(artifact.to_path_buf()))?
                .to_path_buf()
        }
    };

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => {
                segments.push(segment.to_string_lossy().into_owned());
            }
            // a staged artifact never legitimately contains `..`
            _ => return Err(Error::OutsideOutputDir(artifact.to_path_buf())),
        }
    }

    Ok(format!(
        "{}/files/{}",
        base_url.trim_end_matches('/'),
        segments.join("/")
    ))
}

/// Checks that a client-supplied file name stays inside the output
/// directory when joined to it.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_url_joins_relative_path() {
        let url = file_url(
            "http://localhost:3000",
            Path::new("/srv/output"),
            Path::new("/srv/output/mermaid-1.png"),
        )
        .unwrap();
        assert_eq!(url, "http://localhost:3000/files/mermaid-1.png");
    }

    #[test]
    fn test_file_url_normalizes_nested_separators() {
        let url = file_url(
            "http://localhost:3000/",
            Path::new("/srv/output"),
            Path::new("/srv/output/nested/dir/chart.svg"),
        )
        .unwrap();
        assert_eq!(url, "http://localhost:3000/files/nested/dir/chart.svg");
    }

    #[test]
    fn test_file_url_rejects_outside_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output");
        std::fs::create_dir_all(&output).unwrap();
        let outside = dir.path().join("elsewhere.png");
        std::fs::write(&outside, b"x").unwrap();

        let result = file_url("http://localhost:3000", &output, &outside);
        assert!(result.is_err());
    }

    #[test]
    fn test_safe_file_name() {
        assert!(is_safe_file_name("mermaid-1.png"));
        assert!(!is_safe_file_name("../secrets.txt"));
        assert!(!is_safe_file_name("/etc/passwd"));
        assert!(!is_safe_file_name(""));
    }
}
