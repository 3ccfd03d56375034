//! Unified error handling for stackgen core.
//!
//! Wraps domain and application errors behind one type carrying a display
//! category and user-actionable suggestions.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Root error type for stackgen core operations.
#[derive(Debug, Error, Clone)]
pub enum StackgenError {
    /// Errors from the domain layer (validation, format checks, templates).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Errors from the application layer (I/O, tools, orchestration).
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// Configuration or setup errors.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl StackgenError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {message}"),
                "Run 'stackgen config list' to inspect the effective settings".into(),
            ],
        }
    }

    /// Get error category for display and exit-code purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::ExternalTool => ErrorCategory::ExternalTool,
                crate::domain::ErrorCategory::Template => ErrorCategory::Template,
                crate::domain::ErrorCategory::NotFound => ErrorCategory::NotFound,
            },
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    ExternalTool,
    DirtyWorkspace,
    NotFound,
    Configuration,
    Template,
    Internal,
}

impl ErrorCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::ExternalTool => "external tool",
            Self::DirtyWorkspace => "dirty workspace",
            Self::NotFound => "not found",
            Self::Configuration => "configuration",
            Self::Template => "template",
            Self::Internal => "internal",
        }
    }
}

/// Convenient result type alias.
pub type StackgenResult<T> = Result<T, StackgenError>;
