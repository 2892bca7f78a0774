/// Locates the benchmark results file to analyze.
///
/// The experiment runner writes timestamped files, so the newest match wins.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::errors::AnalysisError;

/// Find the most recently modified regular file matching `pattern` inside `dir`.
///
/// Ties on modification time go to the lexicographically greatest path.
pub fn find_latest_input(dir: &Path, pattern: &str) -> Result<PathBuf, AnalysisError> {
    let full_pattern = dir.join(pattern);
    let full_pattern = full_pattern.to_string_lossy();

    let mut candidates: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in glob::glob(&full_pattern)? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable path during discovery");
                continue;
            }
        };
        let meta = match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => meta,
            _ => continue,
        };
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        candidates.push((modified, path));
    }

    tracing::debug!(pattern = %full_pattern, matches = candidates.len(), "Discovery finished");

    candidates
        .into_iter()
        .max()
        .map(|(_, path)| path)
        .ok_or_else(|| AnalysisError::InputNotFound {
            pattern: full_pattern.into_owned(),
        })
}

/// Resolve the input file: an explicit path wins, otherwise discover by pattern.
pub fn resolve_input(
    explicit: Option<&Path>,
    dir: &Path,
    pattern: &str,
) -> Result<PathBuf, AnalysisError> {
    match explicit {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => Err(AnalysisError::InputNotFound {
            pattern: path.display().to_string(),
        }),
        None => find_latest_input(dir, pattern),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;

    const PATTERN: &str = "final_chase_rewriting_*.csv";

    fn touch(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
        path
    }

    #[test]
    fn test_picks_newest_match() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "final_chase_rewriting_20240101.csv", 300);
        let newest = touch(dir.path(), "final_chase_rewriting_20230101.csv", 10);
        touch(dir.path(), "unrelated.csv", 0);

        let found = find_latest_input(dir.path(), PATTERN).unwrap();
        assert_eq!(found, newest);
    }

    #[test]
    fn test_ignores_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("final_chase_rewriting_dir.csv")).unwrap();
        let err = find_latest_input(dir.path(), PATTERN).unwrap_err();
        assert!(matches!(err, AnalysisError::InputNotFound { .. }));
    }

    #[test]
    fn test_no_match_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_latest_input(dir.path(), PATTERN).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_explicit_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "custom.csv", 0);
        assert_eq!(resolve_input(Some(&path), dir.path(), PATTERN).unwrap(), path);

        let missing = dir.path().join("missing.csv");
        let err = resolve_input(Some(&missing), dir.path(), PATTERN).unwrap_err();
        assert!(matches!(err, AnalysisError::InputNotFound { .. }));
    }
}
