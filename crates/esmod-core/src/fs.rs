//! Filesystem collaborator used by the conversion engine
//!
//! The engine itself never touches `std::fs` directly; all traversal and
//! file I/O goes through [`FileAccess`] so runs can be driven hermetically
//! in tests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Contract between the engine and the filesystem
pub trait FileAccess {
    /// Check whether a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check whether a path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Read a file as UTF-8 text
    fn read_text(&self, path: &Path) -> io::Result<String>;

    /// Write UTF-8 text, replacing any existing content
    fn write_text(&mut self, path: &Path, content: &str) -> io::Result<()>;

    /// Create a directory and every missing parent
    fn ensure_directory(&mut self, path: &Path) -> io::Result<()>;

    /// List the entries directly under a directory
    fn list_directory(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Collect every file under a path, recursing into directories.
    /// A plain file yields itself.
    fn walk(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if self.is_dir(path) {
            for entry in self.list_directory(path)? {
                files.extend(self.walk(&entry)?);
            }
        } else {
            files.push(path.to_path_buf());
        }
        Ok(files)
    }
}

/// [`FileAccess`] implementation backed by the real filesystem
#[derive(Debug, Default, Clone)]
pub struct DiskFs;

impl DiskFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileAccess for DiskFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write_text(&mut self, path: &Path, content: &str) -> io::Result<()> {
        fs::write(path, content)
    }

    fn ensure_directory(&mut self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn list_directory(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries: Vec<PathBuf> = fs::read_dir(path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        entries.sort();
        Ok(entries)
    }

    fn walk(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() {
                files.push(entry.path().to_path_buf());
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_walk_collects_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = DiskFs::new();

        let nested = dir.path().join("a/b");
        fs.ensure_directory(&nested).unwrap();
        fs.write_text(&nested.join("deep.js"), "1").unwrap();
        fs.write_text(&dir.path().join("top.js"), "2").unwrap();

        let files = fs.walk(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|p| p.ends_with("deep.js")));
        assert!(files.iter().any(|p| p.ends_with("top.js")));
    }

    #[test]
    fn disk_walk_on_plain_file_yields_itself() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = DiskFs::new();
        let file = dir.path().join("single.js");
        fs.write_text(&file, "x").unwrap();

        let files = fs.walk(&file).unwrap();
        assert_eq!(files, vec![file]);
    }
}
