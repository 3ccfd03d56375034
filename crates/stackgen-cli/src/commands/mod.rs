//! Command handlers, one module per subcommand.
//!
//! Handlers translate parsed arguments and configuration into core requests
//! and render the results. No business logic lives here.

pub mod build;
pub mod completions;
pub mod config;
pub mod init;
pub mod vars;
