//! stackgen core - hexagonal architecture implementation
//!
//! Domain and application layers of the stackgen configuration-bundle
//! provisioner, following hexagonal (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          stackgen-cli (CLI)             │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │  (BuildService, Discoverer, Processor)  │
//! │         Orchestrates Use Cases          │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (Filesystem, SecretToolkit, SourceCtl)  │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    stackgen-adapters (Infrastructure)   │
//! │ (LocalFilesystem, SystemToolkit, Git)   │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (Sanitizer, Classifier, Manifest merge) │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stackgen_core::prelude::*;
//!
//! let service = BuildService::new(filesystem, toolkit, source_control);
//! let report = service.build(&request)?;
//! println!("{} config files written", report.config_files);
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        BuildReport, BuildRequest, BuildService, EnvFileOutcome,
        ports::{Filesystem, SecretToolkit, SourceControl},
    };
    pub use crate::domain::{
        HashKind, ManifestLayout, RawIdentity, SanitizedConfig, SpecialFiles, Strategy,
        TemplateVariable, VariablePolicy,
    };
    pub use crate::error::{StackgenError, StackgenResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
