//! Read-only storage the content tree is served from.
//!
//! The [`Backend`] trait is the only way the engine touches storage: open a
//! file, list a directory. Nothing is ever written through it, and every
//! implementation must tolerate concurrent reads from many requests.
//!
//! Two implementations ship with the crate:
//!
//! - [`FsBackend`]: a directory on the local filesystem.
//! - [`MemoryBackend`]: an in-memory snapshot of a tree, built once and then
//!   frozen. Handy for embedding content and for tests.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::paths;

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub modified: Option<SystemTime>,
}

/// Read-only hierarchical file access.
///
/// Paths are logical (`/`-separated, rooted at `/`). A missing file or
/// directory must surface as an [`io::Error`] of kind
/// [`io::ErrorKind::NotFound`]; callers rely on that kind to tell "absent"
/// apart from real failures.
pub trait Backend: Send + Sync {
    /// Open a file for reading.
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send + '_>>;

    /// List the immediate children of a directory.
    fn list(&self, path: &str) -> io::Result<Vec<DirEntry>>;

    /// Read a whole file.
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.open(path)?.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// Serves a directory of the local filesystem.
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a logical path below the root. Cleaning first resolves `..`, so
    /// the result can never leave the root.
    fn resolve(&self, path: &str) -> PathBuf {
        let cleaned = paths::clean(path);
        let relative = cleaned.trim_start_matches('/');
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }
}

impl Backend for FsBackend {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send + '_>> {
        let file = fs::File::open(self.resolve(path))?;
        Ok(Box::new(file))
    }

    fn list(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        // A file named as a directory is as absent as a missing one.
        let dir = fs::read_dir(self.resolve(path)).map_err(|e| {
            if e.kind() == io::ErrorKind::NotADirectory {
                io::Error::new(io::ErrorKind::NotFound, e)
            } else {
                e
            }
        })?;

        let mut children = Vec::new();
        for entry in dir {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Follow symlinks so linked article directories still count.
            let child = match fs::metadata(entry.path()) {
                Ok(metadata) => DirEntry {
                    name,
                    is_dir: metadata.is_dir(),
                    modified: metadata.modified().ok(),
                },
                Err(e) => {
                    tracing::debug!(%name, error = %e, "unreadable child, treating as file");
                    DirEntry {
                        name,
                        is_dir: false,
                        modified: entry.metadata().ok().and_then(|m| m.modified().ok()),
                    }
                }
            };
            children.push(child);
        }
        Ok(children)
    }
}

#[derive(Debug, Clone)]
struct MemoryFile {
    contents: Vec<u8>,
    modified: Option<SystemTime>,
}

/// An in-memory content tree.
///
/// Directories are implied by the files below them; empty directories can
/// be added with [`MemoryBackend::with_dir`].
///
/// ```
/// use dirpage::backend::{Backend, MemoryBackend};
///
/// let backend = MemoryBackend::new()
///     .with_file("/menu1/meta.json", r#"{"Title": "Menu"}"#)
///     .with_dir("/empty");
///
/// let names: Vec<String> = backend.list("/").unwrap().into_iter().map(|e| e.name).collect();
/// assert_eq!(names, ["empty", "menu1"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    files: BTreeMap<String, MemoryFile>,
    dirs: BTreeMap<String, Option<SystemTime>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.insert_file(path, contents, None);
        self
    }

    pub fn with_dir(mut self, path: &str) -> Self {
        let path = paths::clean(path);
        self.register_dirs(&path);
        self
    }

    /// Add a file, creating its parent directories.
    pub fn insert_file(
        &mut self,
        path: &str,
        contents: impl Into<Vec<u8>>,
        modified: Option<SystemTime>,
    ) {
        let path = paths::clean(path);
        if let Some(parent) = paths::parent(&path) {
            self.register_dirs(parent);
        }
        self.files.insert(
            path,
            MemoryFile {
                contents: contents.into(),
                modified,
            },
        );
    }

    fn register_dirs(&mut self, dir: &str) {
        for ancestor in paths::ancestors(dir) {
            self.dirs.entry(ancestor.to_string()).or_insert(None);
        }
    }

    fn not_found(path: &str) -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, format!("{path}: no such file"))
    }
}

impl Backend for MemoryBackend {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send + '_>> {
        let path = paths::clean(path);
        let file = self.files.get(&path).ok_or_else(|| Self::not_found(&path))?;
        Ok(Box::new(file.contents.as_slice()))
    }

    fn list(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let path = paths::clean(path);
        if !self.dirs.contains_key(&path) {
            return Err(Self::not_found(&path));
        }
        let is_child = |candidate: &str| {
            candidate != path && paths::parent(candidate) == Some(path.as_str())
        };

        let mut children: Vec<DirEntry> = self
            .dirs
            .iter()
            .filter(|(dir, _)| is_child(dir))
            .map(|(dir, modified)| DirEntry {
                name: paths::file_name(dir).to_string(),
                is_dir: true,
                modified: *modified,
            })
            .collect();
        children.extend(
            self.files
                .iter()
                .filter(|(file, _)| is_child(file))
                .map(|(file, meta)| DirEntry {
                    name: paths::file_name(file).to_string(),
                    is_dir: false,
                    modified: meta.modified,
                }),
        );
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }
}
