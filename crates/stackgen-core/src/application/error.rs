//! Application layer errors.
//!
//! These errors represent failures in orchestration and I/O, not business
//! rules. Business rule violations are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// A template tree root does not exist.
    #[error("Template tree not found: {path}")]
    TemplateTreeMissing { path: PathBuf },

    /// A `.template` file is not valid UTF-8.
    #[error("Template is not valid UTF-8 text: {path}")]
    TemplateNotText { path: PathBuf },

    /// External tool exited non-zero or could not be started.
    #[error("External command '{command}' failed: {reason}")]
    ExternalTool { command: String, reason: String },

    /// External tool ran past its deadline and was killed.
    #[error("External command '{command}' timed out after {secs}s")]
    ToolTimeout { command: String, secs: u64 },

    /// Source tree has uncommitted or untracked changes.
    #[error("Source tree has {} uncommitted or untracked change(s)", paths.len())]
    DirtyWorkspace { paths: Vec<String> },

    /// Source control could not be queried.
    #[error("Source control error: {reason}")]
    SourceControl { reason: String },

    /// A backed-up file did not read back identically.
    #[error("Backup verification failed for {path}")]
    BackupVerificationFailed { path: PathBuf },

    /// Restoring preserved files failed; the staging copy is left in place.
    #[error("Restore from {staging} failed: {reason}")]
    RestoreFailed { staging: PathBuf, reason: String },

    /// The preserved variable file could not be parsed.
    #[error("Invalid variable file {path}: {reason}")]
    InvalidVariableFile { path: PathBuf, reason: String },

    /// Shared in-memory state was poisoned by a panicking writer.
    #[error("Lock poisoned: {resource}")]
    LockPoisoned { resource: &'static str },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::TemplateTreeMissing { .. } => vec![
                "Check the [layout] section of stackgen.toml".into(),
                "Relative paths are resolved against the configuration file's directory".into(),
            ],
            Self::ExternalTool { command, .. } => vec![
                format!("Run '{command}' by hand to see its full output"),
                "Check the [tools] section of stackgen.toml".into(),
            ],
            Self::ToolTimeout { .. } => vec![
                "Raise tools.timeout_secs in stackgen.toml".into(),
                "Check that the container runtime is responsive".into(),
            ],
            Self::DirtyWorkspace { paths } => {
                let mut hints: Vec<String> = paths
                    .iter()
                    .take(5)
                    .map(|p| format!("Uncommitted: {p}"))
                    .collect();
                hints.push("Commit or stash your changes first".into());
                hints.push("Or pass --force to build anyway".into());
                hints
            }
            Self::BackupVerificationFailed { .. } => vec![
                "Nothing was deleted; the output directory is untouched".into(),
                "Check free disk space next to the output directory".into(),
            ],
            Self::RestoreFailed { staging, .. } => vec![
                format!("Your previous files are still in {}", staging.display()),
                "Copy them back by hand before running build again".into(),
            ],
            Self::InvalidVariableFile { path, .. } => vec![
                format!("Fix or remove {}", path.display()),
                "Removing it regenerates every secret".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FilesystemError { .. }
            | Self::BackupVerificationFailed { .. }
            | Self::RestoreFailed { .. }
            | Self::LockPoisoned { .. } => ErrorCategory::Internal,
            Self::TemplateTreeMissing { .. } => ErrorCategory::NotFound,
            Self::TemplateNotText { .. } => ErrorCategory::Template,
            Self::ExternalTool { .. } | Self::ToolTimeout { .. } | Self::SourceControl { .. } => {
                ErrorCategory::ExternalTool
            }
            Self::DirtyWorkspace { .. } => ErrorCategory::DirtyWorkspace,
            Self::InvalidVariableFile { .. } => ErrorCategory::Validation,
        }
    }
}
