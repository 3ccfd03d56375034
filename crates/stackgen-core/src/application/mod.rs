//! Application layer for stackgen.
//!
//! This layer contains:
//! - **Services**: Pipeline stages and the `BuildService` orchestrator
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer and performs all I/O
//! through ports. Business rules live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{BuildReport, BuildRequest, BuildService, EnvFileOutcome};

// Re-export port traits (for adapter implementation)
pub use ports::{Filesystem, SecretToolkit, SourceControl};

pub use error::ApplicationError;
