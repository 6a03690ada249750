//! Test utilities shared by the esmod crates

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::fs::FileAccess;

/// In-memory [`FileAccess`] implementation for hermetic pipeline tests.
///
/// Directories exist implicitly: any path that is a strict prefix of a
/// stored file path is a directory. Listings are ordered, so runs over a
/// `MemoryFs` are deterministic.
#[derive(Debug, Default, Clone)]
pub struct MemoryFs {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating implicit parent directories
    pub fn insert<P: Into<PathBuf>, S: Into<String>>(&mut self, path: P, content: S) {
        self.files.insert(normalize(&path.into()), content.into());
    }

    /// Content of a previously written file, if any
    pub fn get(&self, path: &Path) -> Option<&String> {
        self.files.get(&normalize(path))
    }

    /// All stored file paths, in order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }
}

fn normalize(path: &Path) -> PathBuf {
    // Strips `.` components so lookups are representation-independent.
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

impl FileAccess for MemoryFs {
    fn exists(&self, path: &Path) -> bool {
        let path = normalize(path);
        self.files.contains_key(&path) || self.is_dir(&path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let path = normalize(path);
        self.files.keys().any(|p| p != &path && p.starts_with(&path))
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn write_text(&mut self, path: &Path, content: &str) -> io::Result<()> {
        self.files.insert(normalize(path), content.to_string());
        Ok(())
    }

    fn ensure_directory(&mut self, _path: &Path) -> io::Result<()> {
        // Directories are implicit.
        Ok(())
    }

    fn list_directory(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let path = normalize(path);
        let mut entries: Vec<PathBuf> = Vec::new();
        for file in self.files.keys() {
            if let Ok(rest) = file.strip_prefix(&path) {
                if let Some(first) = rest.components().next() {
                    let entry = path.join(first.as_os_str());
                    if !entries.contains(&entry) {
                        entries.push(entry);
                    }
                }
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listings_and_walk_are_ordered() {
        let mut fs = MemoryFs::new();
        fs.insert("root/b/second.js", "b");
        fs.insert("root/a/first.js", "a");
        fs.insert("root/top.js", "t");

        let entries = fs.list_directory(Path::new("root")).unwrap();
        assert_eq!(
            entries,
            vec![
                PathBuf::from("root/a"),
                PathBuf::from("root/b"),
                PathBuf::from("root/top.js"),
            ]
        );

        let files = fs.walk(Path::new("root")).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files[0].ends_with("first.js"));
    }

    #[test]
    fn implicit_directories_exist() {
        let mut fs = MemoryFs::new();
        fs.insert("root/sub/file.js", "x");

        assert!(fs.exists(Path::new("root/sub")));
        assert!(fs.is_dir(Path::new("root/sub")));
        assert!(!fs.is_dir(Path::new("root/sub/file.js")));
    }
}
