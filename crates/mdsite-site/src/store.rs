//! In-memory artifact store.
//!
//! The store holds every published file for the lifetime of the process.
//! It is filled by the builder, then handed to the publisher as a read-only
//! [`StoreHandle`]. Directories exist implicitly for every written file and
//! can also be created explicitly with [`ArtifactStore::ensure_container`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Errors returned by store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid store path: {0}")]
    InvalidPath(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<String, Arc<[u8]>>,
    dirs: BTreeSet<String>,
}

/// Path-addressed, in-memory byte store.
#[derive(Debug, Default)]
pub struct ArtifactStore {
    inner: Arc<RwLock<Inner>>,
}

impl ArtifactStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make sure `path` and all of its ancestors exist as directories.
    pub fn ensure_container(&self, path: &str) -> Result<(), StoreError> {
        let path = normalize(path)?;
        let mut inner = self.write_lock();
        ensure_dirs(&mut inner, &path)
    }

    /// Create or overwrite the file at `path`.
    ///
    /// Parent directories are created as needed. The last write to a path
    /// wins.
    pub fn write(&self, path: &str, bytes: impl Into<Arc<[u8]>>) -> Result<(), StoreError> {
        let path = normalize(path)?;
        if path.is_empty() {
            return Err(StoreError::InvalidPath("/".to_string()));
        }

        let mut inner = self.write_lock();
        if inner.dirs.contains(&path) {
            return Err(StoreError::IsADirectory(path));
        }
        ensure_dirs(&mut inner, parent(&path))?;
        inner.files.insert(path, bytes.into());
        Ok(())
    }

    /// Contents of the file at `path`.
    pub fn read(&self, path: &str) -> Option<Arc<[u8]>> {
        self.read_lock().read(path)
    }

    /// Whether `path` is a directory. The root always is.
    pub fn is_dir(&self, path: &str) -> bool {
        self.read_lock().is_dir(path)
    }

    /// Sorted entries directly inside the directory at `path`.
    pub fn list_dir(&self, path: &str) -> Option<Vec<DirEntry>> {
        self.read_lock().list_dir(path)
    }

    /// All file paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.read_lock().files.keys().cloned().collect()
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.read_lock().files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_lock().files.is_empty()
    }

    /// Read-only view of the store for publishing.
    pub fn serve_root(&self) -> StoreHandle {
        StoreHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Cheaply clonable, read-only view of an [`ArtifactStore`].
#[derive(Debug, Clone)]
pub struct StoreHandle {
    inner: Arc<RwLock<Inner>>,
}

impl StoreHandle {
    fn read_lock(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn read(&self, path: &str) -> Option<Arc<[u8]>> {
        self.read_lock().read(path)
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.read_lock().is_dir(path)
    }

    pub fn list_dir(&self, path: &str) -> Option<Vec<DirEntry>> {
        self.read_lock().list_dir(path)
    }

    pub fn paths(&self) -> Vec<String> {
        self.read_lock().files.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read_lock().files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_lock().files.is_empty()
    }
}

impl Inner {
    fn read(&self, path: &str) -> Option<Arc<[u8]>> {
        let path = normalize(path).ok()?;
        self.files.get(&path).cloned()
    }

    fn is_dir(&self, path: &str) -> bool {
        match normalize(path) {
            Ok(path) => path.is_empty() || self.dirs.contains(&path),
            Err(_) => false,
        }
    }

    fn list_dir(&self, path: &str) -> Option<Vec<DirEntry>> {
        let path = normalize(path).ok()?;
        if !path.is_empty() && !self.dirs.contains(&path) {
            return None;
        }

        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        let direct_child = |candidate: &String| -> Option<String> {
            let rest = candidate.strip_prefix(&prefix)?;
            (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
        };

        let dirs = self
            .dirs
            .iter()
            .filter_map(|d| direct_child(d))
            .map(|name| DirEntry { name, is_dir: true });
        let files = self
            .files
            .keys()
            .filter_map(|f| direct_child(f))
            .map(|name| DirEntry {
                name,
                is_dir: false,
            });

        let mut entries: Vec<DirEntry> = dirs.chain(files).collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Some(entries)
    }
}

/// Canonical form of a store path: no leading or trailing slash, no `.`
/// segments, no empty segments. `..` is rejected.
pub fn normalize(path: &str) -> Result<String, StoreError> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(StoreError::InvalidPath(path.to_string())),
            s => segments.push(s),
        }
    }
    Ok(segments.join("/"))
}

fn parent(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

fn ensure_dirs(inner: &mut Inner, path: &str) -> Result<(), StoreError> {
    if path.is_empty() {
        return Ok(());
    }

    let mut end = 0;
    loop {
        end = path[end..].find('/').map(|i| end + i).unwrap_or(path.len());
        let ancestor = &path[..end];
        if inner.files.contains_key(ancestor) {
            return Err(StoreError::NotADirectory(ancestor.to_string()));
        }
        inner.dirs.insert(ancestor.to_string());
        if end == path.len() {
            return Ok(());
        }
        end += 1;
    }
}
