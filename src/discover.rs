//! Candidate discovery - locate result files under a root directory
//!
//! Discovery is pure path work: file contents are never opened here.
//!
//! - [`latest_per_directory`]: recursive walk, newest matching file per directory
//! - [`glob_fixed_depth`]: every file matching a fixed-depth relative glob

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{Error, Result};

/// A located candidate result file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFile {
    path: PathBuf,
    modified: Option<DateTime<Utc>>,
}

impl ResultFile {
    /// Create a candidate without a modification time.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            modified: None,
        }
    }

    /// Create a candidate, reading its modification time from the filesystem.
    ///
    /// # Errors
    ///
    /// Returns error if the file metadata cannot be read
    pub fn stat(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let modified = fs::metadata(&path)?.modified()?;
        Ok(Self {
            path,
            modified: Some(DateTime::<Utc>::from(modified)),
        })
    }

    /// Get the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the modification time, if it was read during discovery.
    #[must_use]
    pub const fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }
}

/// Fail fast unless `root` is an existing directory.
///
/// # Errors
///
/// Returns [`Error::RootNotFound`] if `root` is missing or not a directory
pub fn ensure_root(root: &Path) -> Result<()> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(Error::RootNotFound(root.to_path_buf()))
    }
}

/// Walk `root` recursively and keep, for every directory holding at least one
/// file whose name satisfies `matches`, only the most recently modified one.
///
/// Ties on modification time go to the lexically greatest path. The result
/// is ordered by path.
///
/// # Errors
///
/// Returns [`Error::RootNotFound`] if `root` is not a directory. Entries that
/// cannot be walked or stat'ed are logged and left out.
pub fn latest_per_directory<F>(root: &Path, matches: F) -> Result<Vec<ResultFile>>
where
    F: Fn(&str) -> bool,
{
    ensure_root(root)?;

    let mut latest: BTreeMap<PathBuf, ResultFile> = BTreeMap::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unwalkable entry");
                continue;
            }
        };
        let path = entry.path();
        let name_matches = entry.file_name().to_str().is_some_and(&matches);
        if !name_matches || !path.is_file() {
            continue;
        }

        let candidate = match ResultFile::stat(path) {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read modification time");
                continue;
            }
        };
        let dir = path.parent().unwrap_or(root).to_path_buf();
        let newer = latest.get(&dir).map_or(true, |current| {
            (candidate.modified, &candidate.path) > (current.modified, &current.path)
        });
        if newer {
            latest.insert(dir, candidate);
        }
    }

    let selected: Vec<ResultFile> = latest.into_values().collect();
    for file in &selected {
        debug!(path = %file.path.display(), "selected latest result file");
    }
    Ok(selected)
}

/// Match `pattern` (relative, `/`-separated glob) below `root` and return every
/// matching regular file, ordered by path. No deduplication is applied.
///
/// # Errors
///
/// - [`Error::RootNotFound`] if `root` is not a directory
/// - [`Error::InvalidPattern`] if `root` is not UTF-8 or the pattern is invalid
pub fn glob_fixed_depth(root: &Path, pattern: &str) -> Result<Vec<ResultFile>> {
    ensure_root(root)?;

    let root_str = root
        .to_str()
        .ok_or_else(|| Error::InvalidPattern(format!("non UTF-8 root {}", root.display())))?;
    let escaped = glob::Pattern::escape(root_str);
    let full = if escaped.ends_with('/') {
        format!("{escaped}{pattern}")
    } else {
        format!("{escaped}/{pattern}")
    };

    let paths = glob::glob(&full).map_err(|e| Error::InvalidPattern(e.to_string()))?;
    let mut matched = Vec::new();
    for path in paths {
        match path {
            Ok(path) if path.is_file() => {
                debug!(path = %path.display(), "matched result file");
                matched.push(ResultFile::new(path));
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "skipping unreadable glob match"),
        }
    }
    matched.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn touch(path: &Path, mtime: SystemTime) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let file = File::create(path).unwrap();
        file.set_modified(mtime).unwrap();
    }

    fn is_results(name: &str) -> bool {
        name.starts_with("results_") && name.ends_with(".json")
    }

    #[test]
    fn test_missing_root_fails_fast() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            latest_per_directory(&missing, is_results),
            Err(Error::RootNotFound(_))
        ));
        assert!(matches!(
            glob_fixed_depth(&missing, "*.json"),
            Err(Error::RootNotFound(_))
        ));
    }

    #[test]
    fn test_root_that_is_a_file_fails_fast() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.json");
        touch(&file, SystemTime::now());
        assert!(matches!(ensure_root(&file), Err(Error::RootNotFound(_))));
    }

    #[test]
    fn test_latest_per_directory_picks_newest() {
        let dir = TempDir::new().unwrap();
        let base = SystemTime::now() - Duration::from_secs(3600);
        let run = dir.path().join("m/step1");
        touch(&run.join("results_A.json"), base);
        touch(&run.join("results_B.json"), base + Duration::from_secs(60));
        touch(&run.join("notes.json"), base + Duration::from_secs(120));

        let files = latest_per_directory(dir.path(), is_results).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path(), run.join("results_B.json"));
        assert!(files[0].modified().is_some());
    }

    #[test]
    fn test_latest_per_directory_one_per_dir() {
        let dir = TempDir::new().unwrap();
        let now = SystemTime::now();
        touch(&dir.path().join("a/results_1.json"), now);
        touch(&dir.path().join("b/results_1.json"), now);
        touch(&dir.path().join("c/other.txt"), now);

        let files = latest_per_directory(dir.path(), is_results).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_latest_per_directory_tie_goes_to_greatest_path() {
        let dir = TempDir::new().unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(10);
        touch(&dir.path().join("results_1.json"), mtime);
        touch(&dir.path().join("results_2.json"), mtime);

        let files = latest_per_directory(dir.path(), is_results).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path(), dir.path().join("results_2.json"));
    }

    #[test]
    fn test_glob_fixed_depth_matches_all() {
        let dir = TempDir::new().unwrap();
        let now = SystemTime::now();
        touch(&dir.path().join("m/step1/math_eval1/t/a.json"), now);
        touch(&dir.path().join("m/step1/math_eval1/t/b.json"), now);
        touch(&dir.path().join("m/step1/other/t/c.json"), now);
        touch(&dir.path().join("m/step1/math_eval1/t/deeper/d.json"), now);

        let files = glob_fixed_depth(dir.path(), "*/*/math_eval*/*/*.json").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path().file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_empty_root_yields_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(latest_per_directory(dir.path(), is_results)
            .unwrap()
            .is_empty());
        assert!(glob_fixed_depth(dir.path(), "*/*.json").unwrap().is_empty());
    }
}
