// src/fs/mock.rs

//! In-memory [`FileSystem`] for tests.
//!
//! Paths are normalised by dropping `.` components, so `./src/a.css` and
//! `src/a.css` name the same entry. The root of relative paths is `.`.

use super::FileSystem;
use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // List of child names
}

#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    read_only: Arc<Mutex<bool>>,
}

fn normalize(path: &Path) -> PathBuf {
    let cleaned: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}

fn parent_of(path: &Path) -> Option<PathBuf> {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Some(PathBuf::from(".")),
        Some(parent) => Some(parent.to_path_buf()),
        None => None,
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("not found: {}", path.display()))
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
            read_only: Arc::new(Mutex::new(false)),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every subsequent write fail with `PermissionDenied`.
    pub fn set_read_only(&self, read_only: bool) {
        *self.read_only.lock().unwrap_or_else(|p| p.into_inner()) = read_only;
    }

    fn check_writable(&self, path: &Path) -> io::Result<()> {
        if *self.read_only.lock().unwrap_or_else(|p| p.into_inner()) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("read-only filesystem: {}", path.display()),
            ));
        }
        Ok(())
    }

    /// Seed a file, creating its parent directories implicitly.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = normalize(path.as_ref());
        let mut files = self.entries();
        if let Some(parent) = parent_of(&path) {
            Self::ensure_dir_entry(&mut files, &parent);
        }
        Self::insert_entry(&mut files, &path, MockEntry::File(content.into()));
    }

    /// Contents of a file, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.entries().get(&normalize(path.as_ref())) {
            Some(MockEntry::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    /// All file paths currently stored, sorted.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .entries()
            .iter()
            .filter(|(_, entry)| matches!(entry, MockEntry::File(_)))
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }

    fn insert_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path, entry: MockEntry) {
        files.insert(path.to_path_buf(), entry);
        if let Some(parent) = parent_of(path) {
            if let (Some(MockEntry::Dir(children)), Some(name)) = (
                files.get_mut(&parent),
                path.file_name().and_then(|n| n.to_str()),
            ) {
                if !children.iter().any(|c| c == name) {
                    children.push(name.to_string());
                }
            }
        }
    }

    fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if files.contains_key(path) {
            return;
        }
        if let Some(parent) = parent_of(path) {
            if parent != path {
                Self::ensure_dir_entry(files, &parent);
            }
        }
        Self::insert_entry(files, path, MockEntry::Dir(Vec::new()));
    }
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let files = self.entries();
        match files.get(&normalize(path)) {
            Some(MockEntry::File(content)) => Ok(content.clone()),
            Some(MockEntry::Dir(_)) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("is a directory: {}", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.check_writable(path)?;
        let path = normalize(path);
        let mut files = self.entries();
        let parent = parent_of(&path).unwrap_or_else(|| PathBuf::from("."));
        match files.get(&parent) {
            Some(MockEntry::Dir(_)) => {}
            _ => return Err(not_found(&parent)),
        }
        if let Some(MockEntry::Dir(_)) = files.get(&path) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("is a directory: {}", path.display()),
            ));
        }
        Self::insert_entry(&mut files, &path, MockEntry::File(contents.to_vec()));
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        let files = self.entries();
        match files.get(&path) {
            Some(MockEntry::Dir(_)) => return Ok(()),
            Some(MockEntry::File(_)) => {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("file exists: {}", path.display()),
                ));
            }
            None => {}
        }
        drop(files);
        self.check_writable(&path)?;
        let mut files = self.entries();
        Self::ensure_dir_entry(&mut files, &path);
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        self.check_writable(path)?;
        let path = normalize(path);
        let mut files = self.entries();
        if !matches!(files.get(&path), Some(MockEntry::Dir(_))) {
            return Err(not_found(&path));
        }
        files.retain(|key, _| !key.starts_with(&path));
        if let Some(parent) = parent_of(&path) {
            if let (Some(MockEntry::Dir(children)), Some(name)) = (
                files.get_mut(&parent),
                path.file_name().and_then(|n| n.to_str()),
            ) {
                children.retain(|c| c != name);
            }
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries().contains_key(&normalize(path))
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.entries().get(&normalize(path)), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.entries().get(&normalize(path)), Some(MockEntry::Dir(_)))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let files = self.entries();
        match files.get(&normalize(path)) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(not_found(path)),
        }
    }
}
