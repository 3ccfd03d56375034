//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "stackgen",
    bin_name = "stackgen",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Provision a multi-service stack's configuration bundle",
    long_about = "stackgen turns a tree of config templates and compose fragments \
                  into a ready-to-deploy bundle: rendered configs, one merged \
                  docker-compose.yml, and a .env with freshly generated secrets.",
    after_help = "EXAMPLES:\n\
        \x20 stackgen init\n\
        \x20 stackgen vars --format table\n\
        \x20 stackgen build\n\
        \x20 stackgen build --skip-compile --force\n\
        \x20 stackgen completions bash > /usr/share/bash-completion/completions/stackgen",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate the configuration bundle.
    #[command(
        visible_alias = "b",
        about = "Generate the configuration bundle",
        after_help = "EXAMPLES:\n\
            \x20 stackgen build\n\
            \x20 stackgen build --skip-compile\n\
            \x20 stackgen build --force --output /srv/stack/generated"
    )]
    Build(BuildArgs),

    /// List the variables the templates reference.
    #[command(
        visible_alias = "ls",
        about = "List discovered template variables",
        after_help = "EXAMPLES:\n\
            \x20 stackgen vars\n\
            \x20 stackgen vars --format json\n\
            \x20 stackgen vars --format csv > variables.csv"
    )]
    Vars(VarsArgs),

    /// Initialise a stackgen configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 stackgen init                       # ./stackgen.toml\n\
            \x20 stackgen --config ops/stack.toml init\n\
            \x20 stackgen init --force               # overwrite"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 stackgen completions bash > ~/.local/share/bash-completion/completions/stackgen\n\
            \x20 stackgen completions zsh  > ~/.zfunc/_stackgen\n\
            \x20 stackgen completions fish > ~/.config/fish/completions/stackgen.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the stackgen configuration.
    #[command(
        about = "Configuration inspection",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 stackgen config get identity.domain\n\
            \x20 stackgen config list\n\
            \x20 stackgen config path"
    )]
    Config(ConfigCommands),
}

// ── build ─────────────────────────────────────────────────────────────────────

/// Arguments for `stackgen build`.
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Do not run the configured compile step before generating.
    #[arg(long = "skip-compile", help = "Skip the preceding compile step")]
    pub skip_compile: bool,

    /// Build even if the source tree has uncommitted changes.
    #[arg(
        short = 'f',
        long = "force",
        help = "Build from a dirty source tree"
    )]
    pub force: bool,

    /// Override `layout.output`; a relative path is anchored the same way.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        help = "Output directory (default: layout.output)"
    )]
    pub output: Option<PathBuf>,

    /// Fail on placeholders that are not runtime variables.
    #[arg(long = "strict", help = "Treat unknown placeholders as errors")]
    pub strict: bool,
}

// ── vars ──────────────────────────────────────────────────────────────────────

/// Arguments for `stackgen vars`.
#[derive(Debug, Args)]
pub struct VarsArgs {
    /// Only show variables that get a generated value.
    #[arg(long = "generated", help = "Show only generated variables")]
    pub generated: bool,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `vars` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One name per line.
    List,
    /// JSON array.
    Json,
    /// CSV rows.
    Csv,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `stackgen init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `stackgen completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `stackgen config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `identity.domain`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
