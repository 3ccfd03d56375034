//! CLI error type, exit codes and the stderr report.
//!
//! Core failures arrive as [`StackgenError`] and keep their own category;
//! the CLI adds configuration loading, local I/O and the compile step.

use std::error::Error;
use std::fmt::Write as _;

use owo_colors::{OwoColorize, Style};
use thiserror::Error;

use stackgen_core::error::{ErrorCategory as CoreCategory, StackgenError};

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// The configuration file or an override could not be read or written.
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },

    #[error(transparent)]
    Core(#[from] StackgenError),

    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// `tools.compile` ran before the build and failed.
    #[error("Compile step failed: {command}")]
    CompileFailed {
        command: String,
        #[source]
        source: StackgenError,
    },
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::IoError {
            message: err.to_string(),
            source: err,
        }
    }
}

/// Exit-code classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad identity values or templates.
    UserError,
    NotFound,
    Configuration,
    /// Uncommitted changes in the source tree.
    DirtyWorkspace,
    /// Everything else, external tool failures included.
    Internal,
}

impl CliError {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ConfigError { .. } => vec![
                "Create a default file with 'stackgen init'".into(),
                "Override single keys with STACKGEN__<SECTION>__<KEY> variables".into(),
            ],
            Self::Core(core) => core.suggestions(),
            Self::IoError { .. } => vec!["Check permissions on the target path".into()],
            Self::CompileFailed { command, .. } => vec![
                format!("Run '{command}' by hand to see its output"),
                "Fix the compile errors, or rerun with --skip-compile".into(),
            ],
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. } => ErrorCategory::Configuration,
            Self::Core(core) => match core.category() {
                CoreCategory::Validation | CoreCategory::Template => ErrorCategory::UserError,
                CoreCategory::DirtyWorkspace => ErrorCategory::DirtyWorkspace,
                CoreCategory::NotFound => ErrorCategory::NotFound,
                CoreCategory::Configuration => ErrorCategory::Configuration,
                CoreCategory::ExternalTool | CoreCategory::Internal => ErrorCategory::Internal,
            },
            Self::IoError { .. } | Self::CompileFailed { .. } => ErrorCategory::Internal,
        }
    }

    /// Short label printed next to the message.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ConfigError { .. } => "configuration",
            Self::Core(core) => core.category().as_str(),
            Self::IoError { .. } => "i/o",
            Self::CompileFailed { .. } => "external tool",
        }
    }

    /// | Category        | Code |
    /// |-----------------|------|
    /// | Internal        |  1   |
    /// | User error      |  2   |
    /// | Not found       |  3   |
    /// | Configuration   |  4   |
    /// | Dirty workspace |  5   |
    pub fn exit_code(&self) -> u8 {
        match self.category() {
            ErrorCategory::Internal => 1,
            ErrorCategory::UserError => 2,
            ErrorCategory::NotFound => 3,
            ErrorCategory::Configuration => 4,
            ErrorCategory::DirtyWorkspace => 5,
        }
    }

    /// The report printed on stderr: label, message, cause chain when
    /// verbose, then suggestions.
    pub fn render(&self, verbose: bool, color: bool) -> String {
        let paint = |text: &str, style: Style| {
            if color {
                text.style(style).to_string()
            } else {
                text.to_string()
            }
        };
        let red = Style::new().red().bold();
        let dim = Style::new().dimmed();

        let mut out = String::new();
        let _ = writeln!(
            out,
            "\n{} {}",
            paint(&format!("Error [{}]:", self.label()), red),
            self
        );

        if verbose {
            let mut cause = self.source();
            while let Some(err) = cause {
                let _ = writeln!(out, "  {}", paint(&format!("caused by: {err}"), dim));
                cause = err.source();
            }
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            let _ = writeln!(out, "\n{}", paint("Suggestions:", Style::new().yellow().bold()));
            for s in suggestions {
                let _ = writeln!(out, "  - {s}");
            }
        }

        if !verbose {
            let _ = writeln!(out, "\n{}", paint("Run with -v for the full cause chain.", dim));
        }
        out
    }

    pub fn log(&self) {
        match self.category() {
            ErrorCategory::Internal | ErrorCategory::Configuration => {
                tracing::error!(category = self.label(), "{self}")
            }
            _ => tracing::warn!(category = self.label(), "{self}"),
        }
        if let Some(source) = self.source() {
            tracing::debug!("caused by: {source}");
        }
    }
}

/// Attach a message when turning an [`std::io::Error`] into a [`CliError`].
pub trait IntoCli<T> {
    fn with_cli_context<F, S>(self, f: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IntoCli<T> for std::io::Result<T> {
    fn with_cli_context<F, S>(self, f: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| CliError::IoError {
            message: f().into(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    use stackgen_core::{application::ApplicationError, domain::DomainError};

    fn core(err: impl Into<StackgenError>) -> CliError {
        CliError::Core(err.into())
    }

    #[test]
    fn exit_codes_follow_core_categories() {
        let invalid = core(DomainError::InvalidDomain {
            value: "bad;domain".into(),
            reason: "illegal character ';'".into(),
        });
        assert_eq!(invalid.exit_code(), 2);

        let dirty = core(ApplicationError::DirtyWorkspace {
            paths: vec!["README.md".into()],
        });
        assert_eq!(dirty.exit_code(), 5);

        let tool = core(ApplicationError::ExternalTool {
            command: "openssl genrsa 4096".into(),
            reason: "exited with status 1".into(),
        });
        assert_eq!(tool.exit_code(), 1);

        let missing = core(DomainError::MissingBaseFragment {
            path: "_base/volume-init.yml".into(),
        });
        assert_eq!(missing.exit_code(), 3);

        let config = core(StackgenError::Configuration {
            message: "x".into(),
        });
        assert_eq!(config.exit_code(), 4);
    }

    #[test]
    fn local_failures_map_to_their_codes() {
        let config = CliError::ConfigError {
            message: "x".into(),
            source: None,
        };
        assert_eq!(config.exit_code(), 4);

        let io = CliError::from(io::Error::other("disk full"));
        assert_eq!(io.exit_code(), 1);
    }

    #[test]
    fn core_errors_display_unchanged() {
        let err = core(DomainError::InvalidDomain {
            value: "bad;domain".into(),
            reason: "label 'bad;domain' is not a valid DNS label".into(),
        });
        assert!(err.to_string().starts_with("invalid domain 'bad;domain'"));
    }

    #[test]
    fn plain_report_names_category_and_offender() {
        let err = core(ApplicationError::ExternalTool {
            command: "slappasswd -h {SSHA}".into(),
            reason: "could not start".into(),
        });
        let s = err.render(false, false);
        assert!(s.contains("Error [external tool]:"));
        assert!(s.contains("slappasswd"));
        assert!(s.contains("Suggestions:"));
        assert!(s.contains("-v"));
        assert!(!s.contains('\u{1b}'));
    }

    #[test]
    fn verbose_report_shows_cause_chain() {
        let err = CliError::CompileFailed {
            command: "make".into(),
            source: ApplicationError::ExternalTool {
                command: "make".into(),
                reason: "exited with status 2".into(),
            }
            .into(),
        };
        let s = err.render(true, false);
        assert!(s.contains("caused by:"));
        assert!(!s.contains("full cause chain"));
        assert!(err.suggestions().iter().any(|s| s.contains("--skip-compile")));
    }

    #[test]
    fn io_context_is_kept() {
        let result: io::Result<()> = Err(io::Error::new(io::ErrorKind::NotFound, "missing"));
        let err = result.with_cli_context(|| "reading config").unwrap_err();
        assert_eq!(err.to_string(), "I/O error: reading config");
    }
}
