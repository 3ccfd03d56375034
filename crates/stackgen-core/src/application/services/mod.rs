//! Application services - orchestrate use cases.
//!
//! Each pipeline stage is a small service borrowing the ports it needs;
//! `BuildService` owns the adapters and runs the stages in order.

pub mod build_service;
pub mod config_processor;
pub mod discovery;
pub mod manifest_merger;
pub mod secret_generator;

pub use build_service::{
    BUILD_INFO, BuildReport, BuildRequest, BuildService, CONFIG_DIR, ENV_FILE, EnvFileOutcome,
};
pub use config_processor::{ConfigProcessor, ProcessContext, ProcessedFile};
pub use discovery::{Discoverer, Discovery};
pub use manifest_merger::{ManifestMerger, MergeOutcome};
pub use secret_generator::{GeneratedSecrets, SecretGenerator};
