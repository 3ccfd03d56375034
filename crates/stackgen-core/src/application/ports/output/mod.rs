//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `stackgen-adapters` crate provides implementations.

use std::path::{Path, PathBuf};

use crate::domain::HashKind;
use crate::error::StackgenResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `stackgen_adapters::filesystem::LocalFilesystem` (production)
/// - `stackgen_adapters::filesystem::MemoryFilesystem` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> StackgenResult<()>;

    /// Write UTF-8 content to a file, creating parent directories.
    fn write_file(&self, path: &Path, content: &str) -> StackgenResult<()> {
        self.write_bytes(path, content.as_bytes())
    }

    /// Write raw bytes to a file, creating parent directories.
    fn write_bytes(&self, path: &Path, content: &[u8]) -> StackgenResult<()>;

    /// Read a file as UTF-8.
    fn read_file(&self, path: &Path) -> StackgenResult<String>;

    /// Read a file as raw bytes.
    fn read_bytes(&self, path: &Path) -> StackgenResult<Vec<u8>>;

    /// Set or clear the executable bit.
    fn set_permissions(&self, path: &Path, executable: bool) -> StackgenResult<()>;

    fn is_executable(&self, path: &Path) -> StackgenResult<bool>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Remove a directory and all contents.
    fn remove_dir_all(&self, path: &Path) -> StackgenResult<()>;

    /// Every regular file below `root`, relative to it, sorted.
    fn list_files(&self, root: &Path) -> StackgenResult<Vec<PathBuf>>;

    /// Absolute form of `path` with `.`, `..` and symlinks resolved.
    ///
    /// The path need not exist; a missing tail is appended to its nearest
    /// existing ancestor.
    fn canonicalize(&self, path: &Path) -> StackgenResult<PathBuf>;
}

/// Port for random material, keys and password hashes.
///
/// Implemented by `stackgen_adapters::toolkit::SystemToolkit`, which uses the
/// OS random source in-process and shells out for RSA keys and salted hashes.
#[cfg_attr(test, mockall::automock)]
pub trait SecretToolkit: Send + Sync {
    /// `bytes` random bytes, lowercase hex.
    fn random_hex(&self, bytes: usize) -> StackgenResult<String>;

    /// `bytes` random bytes, standard padded base64.
    fn random_base64(&self, bytes: usize) -> StackgenResult<String>;

    /// A fresh RSA private key in PEM form.
    fn rsa_private_key_pem(&self, bits: u32) -> StackgenResult<String>;

    /// Hash `plaintext` with the algorithm `kind` names.
    fn derive_hash(&self, kind: HashKind, plaintext: &str) -> StackgenResult<String>;
}

/// Port for querying the source tree's version control.
#[cfg_attr(test, mockall::automock)]
pub trait SourceControl: Send + Sync {
    /// Paths with uncommitted or untracked changes under `root`.
    fn dirty_paths(&self, root: &Path) -> StackgenResult<Vec<String>>;

    /// Current revision identifier, if `root` is under version control.
    fn revision(&self, root: &Path) -> StackgenResult<Option<String>>;
}
