//! Attachment discovery.
//!
//! Files for a case live under `<root>/<suite>/<name>/`; the suite segment is
//! empty when the case has no suite.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{ReportError, ReportResult};

/// File names written by operating systems that are never attachments.
pub const HOUSEKEEPING_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

/// Name of the file captured output is saved under.
pub const OUTPUT_FILE_NAME: &str = "output.log";

/// Lists the files below a directory.
pub trait FileLister {
    /// Every file below `dir`. A path that is not a directory yields nothing.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Recursive filesystem lister.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl FileLister for FsLister {
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

/// Directory holding the attachments of one case.
pub fn case_dir(root: &Path, suite: Option<&str>, name: &str) -> PathBuf {
    root.join(suite.unwrap_or_default()).join(name)
}

/// Attachments for a case; `None` when there are none.
///
/// Lister errors are logged and treated as "no files".
pub fn discover(
    lister: &dyn FileLister,
    root: Option<&Path>,
    suite: Option<&str>,
    name: &str,
) -> Option<Vec<PathBuf>> {
    let root = root?;
    let dir = case_dir(root, suite, name);
    let files = match lister.list_files(&dir) {
        Ok(files) => files,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "attachment discovery failed");
            return None;
        }
    };
    let files: Vec<PathBuf> = files
        .into_iter()
        .filter(|path| !is_housekeeping(path))
        .collect();
    debug!(dir = %dir.display(), count = files.len(), "discovered attachments");
    if files.is_empty() {
        None
    } else {
        Some(files)
    }
}

fn is_housekeeping(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| HOUSEKEEPING_FILES.contains(&n))
}

/// Write captured output into the case's attachment folder.
pub fn save_output(
    root: &Path,
    suite: Option<&str>,
    name: &str,
    output: &str,
) -> ReportResult<PathBuf> {
    let dir = case_dir(root, suite, name);
    std::fs::create_dir_all(&dir).map_err(|e| ReportError::io(&dir, e))?;
    let path = dir.join(OUTPUT_FILE_NAME);
    std::fs::write(&path, output).map_err(|e| ReportError::io(&path, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingLister;

    impl FileLister for FailingLister {
        fn list_files(&self, _dir: &Path) -> io::Result<Vec<PathBuf>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn finds_nested_files_and_skips_housekeeping() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("login").join("test_ok");
        std::fs::create_dir_all(dir.join("shots")).unwrap();
        std::fs::write(dir.join("log.txt"), "x").unwrap();
        std::fs::write(dir.join(".DS_Store"), "x").unwrap();
        std::fs::write(dir.join("shots").join("a.png"), "x").unwrap();

        let files = discover(&FsLister, Some(root.path()), Some("login"), "test_ok").unwrap();
        assert_eq!(files, vec![dir.join("log.txt"), dir.join("shots").join("a.png")]);
    }

    #[test]
    fn no_root_or_no_directory_means_no_files() {
        let root = tempfile::tempdir().unwrap();
        assert!(discover(&FsLister, None, None, "t").is_none());
        assert!(discover(&FsLister, Some(root.path()), None, "t").is_none());

        std::fs::write(root.path().join("t"), "not a dir").unwrap();
        assert!(discover(&FsLister, Some(root.path()), None, "t").is_none());
    }

    #[test]
    fn only_housekeeping_files_means_no_files() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("t");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Thumbs.db"), "x").unwrap();
        assert!(discover(&FsLister, Some(root.path()), None, "t").is_none());
    }

    #[test]
    fn lister_errors_are_swallowed() {
        assert!(discover(&FailingLister, Some(Path::new("/r")), None, "t").is_none());
    }

    #[test]
    fn saved_output_is_discoverable() {
        let root = tempfile::tempdir().unwrap();
        let path = save_output(root.path(), Some("suite"), "t", "hello\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");

        let files = discover(&FsLister, Some(root.path()), Some("suite"), "t").unwrap();
        assert_eq!(files, vec![path]);
    }
}
