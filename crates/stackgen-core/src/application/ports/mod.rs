//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `stackgen-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: File operations
//!   - `SecretToolkit`: Random material, RSA keys, password hashes
//!   - `SourceControl`: Dirty-tree check and revision lookup
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{Filesystem, SecretToolkit, SourceControl};

#[cfg(test)]
pub use output::{MockFilesystem, MockSecretToolkit, MockSourceControl};
