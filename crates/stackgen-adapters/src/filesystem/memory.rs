//! In-memory filesystem adapter for testing.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Component, Path, PathBuf},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use stackgen_core::{
    application::{ApplicationError, ports::Filesystem},
    error::StackgenResult,
};

/// In-memory filesystem for testing.
///
/// Clones share state, so a test can keep a handle after boxing one into a
/// service.
#[derive(Debug, Clone)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: BTreeMap<PathBuf, Vec<u8>>,
    directories: BTreeSet<PathBuf>,
    executables: BTreeSet<PathBuf>,
}

impl MemoryFilesystemInner {
    fn add_dirs(&mut self, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            self.directories.insert(current.clone());
        }
    }
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryFilesystemInner::default())),
        }
    }

    /// Seed a file (testing helper).
    pub fn with_file(self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            let path = path.as_ref();
            if let Some(parent) = path.parent() {
                inner.add_dirs(parent);
            }
            inner.files.insert(path.to_path_buf(), content.as_ref().to_vec());
        }
        self
    }

    /// Seed an executable file (testing helper).
    pub fn with_executable(self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Self {
        let fs = self.with_file(path.as_ref(), content);
        if let Ok(mut inner) = fs.inner.write() {
            inner.executables.insert(path.as_ref().to_path_buf());
        }
        fs
    }

    /// Every file path currently stored, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.read()
            .map(|inner| inner.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn read(&self) -> StackgenResult<RwLockReadGuard<'_, MemoryFilesystemInner>> {
        Ok(self.inner.read().map_err(|_| ApplicationError::LockPoisoned {
            resource: "memory filesystem",
        })?)
    }

    fn write(&self) -> StackgenResult<RwLockWriteGuard<'_, MemoryFilesystemInner>> {
        Ok(self.inner.write().map_err(|_| ApplicationError::LockPoisoned {
            resource: "memory filesystem",
        })?)
    }
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(path: &Path) -> ApplicationError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: "No such file".into(),
    }
}

impl Filesystem for MemoryFilesystem {
    fn create_dir_all(&self, path: &Path) -> StackgenResult<()> {
        self.write()?.add_dirs(path);
        Ok(())
    }

    fn write_bytes(&self, path: &Path, content: &[u8]) -> StackgenResult<()> {
        let mut inner = self.write()?;
        if inner.directories.contains(path) {
            return Err(ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "Is a directory".into(),
            }
            .into());
        }
        if let Some(parent) = path.parent() {
            inner.add_dirs(parent);
        }
        inner.files.insert(path.to_path_buf(), content.to_vec());
        Ok(())
    }

    fn read_file(&self, path: &Path) -> StackgenResult<String> {
        let bytes = self.read_bytes(path)?;
        String::from_utf8(bytes).map_err(|_| {
            ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "File is not valid UTF-8".into(),
            }
            .into()
        })
    }

    fn read_bytes(&self, path: &Path) -> StackgenResult<Vec<u8>> {
        self.read()?
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path).into())
    }

    fn set_permissions(&self, path: &Path, executable: bool) -> StackgenResult<()> {
        let mut inner = self.write()?;
        if !inner.files.contains_key(path) {
            return Err(not_found(path).into());
        }
        if executable {
            inner.executables.insert(path.to_path_buf());
        } else {
            inner.executables.remove(path);
        }
        Ok(())
    }

    fn is_executable(&self, path: &Path) -> StackgenResult<bool> {
        let inner = self.read()?;
        if !inner.files.contains_key(path) {
            return Err(not_found(path).into());
        }
        Ok(inner.executables.contains(path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.read()
            .map(|inner| inner.files.contains_key(path) || inner.directories.contains(path))
            .unwrap_or(false)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.read()
            .map(|inner| inner.directories.contains(path))
            .unwrap_or(false)
    }

    fn remove_dir_all(&self, path: &Path) -> StackgenResult<()> {
        let mut inner = self.write()?;
        if !inner.directories.contains(path) {
            return Err(not_found(path).into());
        }
        inner.directories.retain(|p| !p.starts_with(path));
        inner.files.retain(|p, _| !p.starts_with(path));
        inner.executables.retain(|p| !p.starts_with(path));
        Ok(())
    }

    fn list_files(&self, root: &Path) -> StackgenResult<Vec<PathBuf>> {
        let inner = self.read()?;
        Ok(inner
            .files
            .keys()
            .filter_map(|p| p.strip_prefix(root).ok())
            .filter(|rel| !rel.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .collect())
    }

    /// Lexical only: the tree has no symlinks. Relative paths hang off `/`.
    fn canonicalize(&self, path: &Path) -> StackgenResult<PathBuf> {
        let mut resolved = PathBuf::from("/");
        for component in path.components() {
            match component {
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            }
        }
        Ok(resolved)
    }
}
