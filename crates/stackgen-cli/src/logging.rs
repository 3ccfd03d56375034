//! Tracing subscriber setup for the `stackgen` binary.
//!
//! Core and adapters emit events and `#[instrument]` spans; this module is
//! the one place a subscriber is installed. Events always go to stderr so a
//! JSON report on stdout stays parseable.
//!
//! `RUST_LOG` replaces the level derived from `-v`/`-q` when set.

use std::io::IsTerminal as _;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{GlobalArgs, OutputFormat};

/// Crates whose events are shown at the selected level.
const CRATES: [&str; 3] = ["stackgen_cli", "stackgen_core", "stackgen_adapters"];

/// How events are rendered on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogStyle {
    /// Single-line, optionally coloured.
    Compact { ansi: bool },
    /// One JSON object per event, for `--output-format json`.
    Json,
}

impl LogStyle {
    fn for_args(args: &GlobalArgs) -> Self {
        if args.output_format == OutputFormat::Json {
            Self::Json
        } else {
            Self::Compact {
                ansi: !args.no_color && std::io::stderr().is_terminal(),
            }
        }
    }
}

/// Install the global subscriber. Call once, before any event fires.
pub fn init_logging(args: &GlobalArgs) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(args.level())));

    let layer = match LogStyle::for_args(args) {
        LogStyle::Compact { ansi } => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_ansi(ansi)
            .with_writer(std::io::stderr)
            .boxed(),
        LogStyle::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing subscriber already installed: {e}"))
}

/// `stackgen_cli=<level>,stackgen_core=<level>,...`; third-party crates stay off.
fn directives(level: LevelFilter) -> String {
    let level = level.to_string().to_ascii_lowercase();
    CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(verbose: u8, quiet: bool, output_format: OutputFormat) -> GlobalArgs {
        GlobalArgs {
            verbose,
            quiet,
            no_color: true,
            config: None,
            output_format,
        }
    }

    #[test]
    fn directives_cover_every_crate() {
        assert_eq!(
            directives(LevelFilter::DEBUG),
            "stackgen_cli=debug,stackgen_core=debug,stackgen_adapters=debug"
        );
    }

    #[test]
    fn json_output_logs_json() {
        assert_eq!(
            LogStyle::for_args(&args(0, false, OutputFormat::Json)),
            LogStyle::Json
        );
    }

    #[test]
    fn no_color_disables_ansi() {
        assert_eq!(
            LogStyle::for_args(&args(2, false, OutputFormat::Human)),
            LogStyle::Compact { ansi: false }
        );
    }
}
