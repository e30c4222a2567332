//! # File System Collector
//!
//! Discovers files beneath a path and searches them line by line for a
//! literal byte pattern.
//!
//! Symlinks below the root are neither followed nor reported, so a walk can
//! never loop. The root itself is resolved normally.

use memchr::memmem;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Errors that can occur during file discovery
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Path does not exist or cannot be stat'ed
    #[error("unable to open file: {}", .0.display())]
    NotFound(PathBuf, #[source] io::Error),

    /// Path is neither a file nor a directory
    #[error("invalid path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// An entry below the root could not be read
    #[error("failed to walk {}: {}", .0.display(), .1)]
    Walk(PathBuf, String),
}

/// Files found beneath a path, plus entries that could not be walked
#[derive(Debug, Default)]
pub struct Discovered {
    pub files: Vec<PathBuf>,
    pub errors: Vec<DiscoveryError>,
}

/// Discover all regular files from an input path
///
/// If the path is a file, returns just that file. If it is a directory,
/// returns every regular file transitively beneath it, sorted.
pub fn discover_files(input_path: &Path) -> Result<Discovered, DiscoveryError> {
    let metadata = std::fs::metadata(input_path)
        .map_err(|e| DiscoveryError::NotFound(input_path.to_path_buf(), e))?;

    if metadata.is_file() {
        return Ok(Discovered {
            files: vec![input_path.to_path_buf()],
            errors: Vec::new(),
        });
    }
    if !metadata.is_dir() {
        return Err(DiscoveryError::InvalidPath(input_path.to_path_buf()));
    }

    let mut discovered = Discovered::default();
    for entry in WalkDir::new(input_path).follow_links(false) {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                discovered.files.push(entry.into_path());
            }
            Ok(entry) => {
                if entry.path_is_symlink() {
                    log::debug!("skipping symlink {}", entry.path().display());
                }
            }
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| input_path.to_path_buf());
                log::debug!("skipping {}: {}", path.display(), e);
                discovered.errors.push(DiscoveryError::Walk(path, e.to_string()));
            }
        }
    }

    discovered.files.sort();
    Ok(discovered)
}

/// Find the first line of `path` containing `needle`
///
/// Returns the 1-based line number, or `None` when no line matches. Lines are
/// compared as raw bytes, so non-UTF-8 content is searched as well.
pub fn search_file(path: &Path, needle: &str) -> io::Result<Option<usize>> {
    let file = File::open(path)?;
    search_reader(BufReader::new(file), needle)
}

pub fn search_reader<R: BufRead>(mut reader: R, needle: &str) -> io::Result<Option<usize>> {
    let finder = memmem::Finder::new(needle.as_bytes());
    let mut line = Vec::new();
    let mut number = 0;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        number += 1;
        if finder.find(&line).is_some() {
            return Ok(Some(number));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_search_reader_first_match() {
        let text =
            "apiVersion: v1\nkind: Pod\n  path: /var/run/docker.sock\n  path: /run/docker.sock\n";
        assert_eq!(search_reader(text.as_bytes(), "docker.sock").unwrap(), Some(3));
    }

    #[test]
    fn test_search_reader_case_sensitive() {
        let text = "path: /run/DOCKER.SOCK\n";
        assert_eq!(search_reader(text.as_bytes(), "docker.sock").unwrap(), None);
    }

    #[test]
    fn test_search_reader_last_line_without_newline() {
        let text = "a\nb\nmount docker.sock";
        assert_eq!(search_reader(text.as_bytes(), "docker.sock").unwrap(), Some(3));
    }

    #[test]
    fn test_search_reader_binary_content() {
        let bytes: &[u8] = b"\xff\xfe\x00junk\n\x80docker.sock\x81\n";
        assert_eq!(search_reader(bytes, "docker.sock").unwrap(), Some(2));
    }

    #[test]
    fn test_discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pod.yaml");
        fs::write(&file, "kind: Pod\n").unwrap();

        let discovered = discover_files(&file).unwrap();
        assert_eq!(discovered.files, vec![file]);
        assert!(discovered.errors.is_empty());
    }

    #[test]
    fn test_discover_recursive_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/nested")).unwrap();
        fs::write(dir.path().join("b/nested/deep.yaml"), "x").unwrap();
        fs::write(dir.path().join("a.yaml"), "x").unwrap();
        fs::write(dir.path().join("c.json"), "x").unwrap();

        let discovered = discover_files(dir.path()).unwrap();
        assert_eq!(
            discovered.files,
            vec![
                dir.path().join("a.yaml"),
                dir.path().join("b/nested/deep.yaml"),
                dir.path().join("c.json"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_skips_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("real.yaml"), "docker.sock").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.yaml"), dir.path().join("link.yaml"))
            .unwrap();
        // A loop back to the root must not be walked
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        let discovered = discover_files(dir.path()).unwrap();
        assert_eq!(discovered.files, vec![dir.path().join("real.yaml")]);
    }

    #[test]
    fn test_discover_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_files(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, DiscoveryError::NotFound(..)));
        assert!(err.to_string().starts_with("unable to open file"));
    }
}
