//! Flags accepted by every subcommand, flattened into [`super::Cli`].

use std::path::PathBuf;

use clap::Args;
use tracing::level_filters::LevelFilter;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// More log detail: -v pipeline steps, -vv per file and variable, -vvv everything
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors and warnings
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output (also honours NO_COLOR)
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Configuration file [default: ./stackgen.toml]
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// How results are printed on stdout
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub output_format: OutputFormat,
}

impl GlobalArgs {
    /// Log level for stackgen's own crates; `--quiet` wins over `-v`.
    pub fn level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human on a terminal, plain otherwise
    #[default]
    Auto,
    /// Colored, with progress spinners
    Human,
    /// No colors or spinners
    Plain,
    /// A single JSON document
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(verbose: u8, quiet: bool) -> GlobalArgs {
        GlobalArgs {
            verbose,
            quiet,
            no_color: false,
            config: None,
            output_format: OutputFormat::Auto,
        }
    }

    #[test]
    fn verbosity_steps() {
        assert_eq!(with(0, false).level(), LevelFilter::WARN);
        assert_eq!(with(1, false).level(), LevelFilter::INFO);
        assert_eq!(with(2, false).level(), LevelFilter::DEBUG);
        assert_eq!(with(7, false).level(), LevelFilter::TRACE);
    }

    #[test]
    fn quiet_wins() {
        assert_eq!(with(3, true).level(), LevelFilter::ERROR);
    }
}
