// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (collected into reports, re-raised by the orchestrator)
/// - Categorizable (for CLI display and exit codes)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Identity validation (aborts before any write)
    // ========================================================================
    #[error("invalid domain '{value}': {reason}")]
    InvalidDomain { value: String, reason: String },

    #[error("invalid email '{value}': {reason}")]
    InvalidEmail { value: String, reason: String },

    #[error("invalid username '{value}': {reason}")]
    InvalidUsername { value: String, reason: String },

    #[error("invalid path for {field} '{value}': {reason}")]
    InvalidPath {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid variable name '{0}': must match ^[A-Z_][A-Z0-9_]*$")]
    InvalidVariableName(String),

    // ========================================================================
    // Secret generation
    // ========================================================================
    #[error("generated value for '{name}' failed the {strategy} format check: {reason}")]
    MalformedSecret {
        name: String,
        strategy: &'static str,
        reason: String,
    },

    #[error("no plaintext available for '{name}' (expected '{plaintext}' in the secret table)")]
    MissingPlaintext { name: String, plaintext: String },

    // ========================================================================
    // Template processing
    // ========================================================================
    #[error("unknown placeholder '{{{{{name}}}}}' in {file}")]
    UnknownPlaceholder { name: String, file: String },

    #[error("required base fragment missing: {path}")]
    MissingBaseFragment { path: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidDomain { .. } => vec![
                "Use a lowercase DNS name with at least two labels, e.g. example.com".into(),
                "Labels may contain a-z, 0-9 and inner hyphens only".into(),
            ],
            Self::InvalidEmail { .. } => vec![
                "Use a plain address such as admin@example.com".into(),
                "Quoted local parts and comments are not accepted".into(),
            ],
            Self::InvalidUsername { .. } => vec![
                "Use 3-32 characters from A-Z, a-z, 0-9, '_' and '-'".into(),
            ],
            Self::InvalidPath { field, .. } => vec![
                format!("Set '{field}' to an absolute path without whitespace"),
            ],
            Self::MalformedSecret { name, .. } => vec![
                format!("The tool producing '{name}' returned unexpected output"),
                "Check that the hashing / key tools are the expected versions".into(),
            ],
            Self::MissingPlaintext { plaintext, .. } => vec![
                format!("Reference '{plaintext}' in a template or add it to the variable file"),
            ],
            Self::UnknownPlaceholder { name, .. } => vec![
                format!("Reference '{name}' from a template so it is discovered"),
                "Or set variables.strict = false to leave unknown placeholders in place".into(),
            ],
            Self::MissingBaseFragment { .. } => vec![
                "Check the [manifest] section of stackgen.toml".into(),
                "The base directory must hold the bootstrap, networks and volumes files".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidDomain { .. }
            | Self::InvalidEmail { .. }
            | Self::InvalidUsername { .. }
            | Self::InvalidPath { .. }
            | Self::InvalidVariableName(_) => ErrorCategory::Validation,
            Self::MalformedSecret { .. } => ErrorCategory::ExternalTool,
            Self::MissingBaseFragment { .. } => ErrorCategory::NotFound,
            Self::MissingPlaintext { .. } | Self::UnknownPlaceholder { .. } => {
                ErrorCategory::Template
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    ExternalTool,
    Template,
    NotFound,
}
