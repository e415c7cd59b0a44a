//! Polling folder watcher.
//!
//! Scans the watched directory on a fixed interval and reports files that
//! were not present on the previous scan. Files already in the folder at
//! startup are treated as seen, so only new arrivals are processed.

use std::collections::HashSet;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default poll interval between directory scans.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Extensions accepted as batch-sheet scans.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// True when the path has one of the accepted image extensions.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

pub struct FolderWatcher {
    folder: PathBuf,
    interval: Duration,
    seen: HashSet<OsString>,
}

impl FolderWatcher {
    /// Start watching `folder`. The current directory listing becomes the
    /// initial seen set.
    pub fn new(folder: &Path, interval: Duration) -> io::Result<Self> {
        let seen = list_names(folder)?;
        Ok(Self {
            folder: folder.to_path_buf(),
            interval,
            seen,
        })
    }

    /// One scan: image files that appeared since the previous scan.
    pub fn poll_new(&mut self) -> io::Result<Vec<PathBuf>> {
        let current = list_names(&self.folder)?;
        let mut new_files: Vec<PathBuf> = current
            .difference(&self.seen)
            .map(|name| self.folder.join(name))
            .filter(|path| is_image_file(path))
            .collect();
        new_files.sort();
        self.seen = current;
        Ok(new_files)
    }

    /// Poll forever, invoking `handler` for each new image. Scan errors are
    /// logged and the loop keeps going.
    pub fn watch(mut self, mut handler: impl FnMut(&Path)) -> ! {
        loop {
            match self.poll_new() {
                Ok(paths) => {
                    for path in &paths {
                        handler(path);
                    }
                }
                Err(e) => {
                    tracing::warn!(folder = %self.folder.display(), error = %e, "Folder scan failed");
                }
            }
            std::thread::sleep(self.interval);
        }
    }
}

fn list_names(folder: &Path) -> io::Result<HashSet<OsString>> {
    Ok(std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn accepts_image_extensions_case_insensitively() {
        assert!(is_image_file(Path::new("scan.png")));
        assert!(is_image_file(Path::new("scan.JPG")));
        assert!(is_image_file(Path::new("scan.jpeg")));
        assert!(!is_image_file(Path::new("scan.pdf")));
        assert!(!is_image_file(Path::new("scan")));
    }

    #[test]
    fn preexisting_files_are_not_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old.png"), b"x").unwrap();

        let mut watcher = FolderWatcher::new(dir.path(), Duration::from_millis(1)).unwrap();
        assert!(watcher.poll_new().unwrap().is_empty());
    }

    #[test]
    fn new_image_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = FolderWatcher::new(dir.path(), Duration::from_millis(1)).unwrap();

        fs::write(dir.path().join("scan_001.png"), b"x").unwrap();
        let first = watcher.poll_new().unwrap();
        assert_eq!(first, vec![dir.path().join("scan_001.png")]);

        let second = watcher.poll_new().unwrap();
        assert!(second.is_empty(), "already-seen file reported again");
    }

    #[test]
    fn non_images_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = FolderWatcher::new(dir.path(), Duration::from_millis(1)).unwrap();

        fs::write(dir.path().join("partial.tmp"), b"x").unwrap();
        fs::write(dir.path().join("scan.jpeg"), b"x").unwrap();
        let new_files = watcher.poll_new().unwrap();
        assert_eq!(new_files, vec![dir.path().join("scan.jpeg")]);
    }
}
