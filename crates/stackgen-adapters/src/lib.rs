//! Infrastructure adapters for stackgen.
//!
//! This crate implements the ports defined in `stackgen-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod filesystem;
pub mod process;
pub mod source_control;
pub mod toolkit;

// Re-export commonly used adapters
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use source_control::{GitSourceControl, StaticSourceControl};
pub use toolkit::{SystemToolkit, ToolCommands};
