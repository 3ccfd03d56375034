// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for stackgen.
//!
//! Pure logic only: validation, classification, placeholder rewriting and the
//! textual manifest merge. Filesystem access, process execution and source
//! control are reached through the ports in the application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No I/O**: every function here is a transformation of values
//! - **Immutable inputs**: templates and discovered variables are never mutated
//! - **Deterministic**: identical inputs give byte-identical outputs
//!
pub mod env_file;
pub mod error;
pub mod identity;
pub mod manifest;
pub mod placeholder;
pub mod secrets;
pub mod template;
pub mod variable;

pub use env_file::{EnvFile, EnvSection};
pub use error::{DomainError, ErrorCategory};
pub use identity::{IdentityField, IdentitySection, RawIdentity, SanitizedConfig, sanitize};
pub use manifest::{ManifestFragment, ManifestInputs, ManifestLayout, MergedManifest};
pub use placeholder::Syntax;
pub use secrets::{HashKind, SecretTable};
pub use template::{FileKind, SpecialFiles, TemplateFile};
pub use variable::{
    Classifier, Origin, RuntimeVariables, Strategy, TemplateVariable, VariableName,
    VariablePolicy,
};
