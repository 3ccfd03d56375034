//! `stackgen`: turns a stack's config templates and compose fragments into a
//! deployable bundle (variable file, merged manifest, processed configs).
//!
//! `main` reads a `.env` from the working directory into the process
//! environment first, so `STACKGEN__*` overrides and `RUST_LOG` may live
//! there. Arguments are parsed next; logging comes up before
//! `stackgen.toml` is read so that configuration errors are logged too.
//! Every failure ends in [`handle_error`], which prints the report and maps
//! it to an exit code:
//!
//! | Code | Meaning                                        |
//! |------|------------------------------------------------|
//! |  0   | Bundle written, possibly with warnings         |
//! |  1   | Internal, I/O or external tool failure         |
//! |  2   | Invalid identity value or template             |
//! |  3   | Template tree or base fragment missing         |
//! |  4   | Bad configuration or unsafe output directory   |
//! |  5   | Source tree has uncommitted changes            |

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info, instrument};

use crate::{
    cli::{Cli, Commands},
    config::AppConfig,
    error::{CliError, CliResult},
    logging::init_logging,
    output::OutputManager,
};

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;

fn main() -> ExitCode {
    // Optional; values already in the environment win.
    let _ = dotenvy::dotenv();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version arrive here too, with a success exit code.
            let _ = e.print();
            return ExitCode::from(e.exit_code().clamp(0, 255) as u8);
        }
    };

    if let Err(e) = init_logging(&cli.global) {
        eprintln!("Failed to initialise logging: {e}");
        return ExitCode::from(1);
    }

    debug!(
        verbose = cli.global.verbose,
        quiet = cli.global.quiet,
        no_color = cli.global.no_color,
        "CLI started"
    );

    // `--config`, else ./stackgen.toml, under STACKGEN__ overrides.
    let config = match AppConfig::load(cli.global.config.as_ref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            let err = CliError::ConfigError {
                message: format!("{e:#}"),
                source: None,
            };
            return handle_error(err, cli.global.verbose > 0, stderr_color(&cli));
        }
    };

    let output = OutputManager::new(&cli.global);
    let verbose = cli.global.verbose > 0;
    let color = stderr_color(&cli);

    match run(cli, config, output) {
        Ok(()) => {
            info!("stackgen completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => handle_error(e, verbose, color),
    }
}

#[instrument(skip_all)]
fn run(cli: Cli, config: AppConfig, output: OutputManager) -> CliResult<()> {
    match cli.command {
        Commands::Build(cmd) => commands::build::execute(cmd, cli.global, config, output),
        Commands::Vars(cmd) => commands::vars::execute(cmd, config, output),
        Commands::Init(cmd) => commands::init::execute(cmd, cli.global, output),
        Commands::Completions(cmd) => commands::completions::execute(cmd),
        Commands::Config(cmd) => commands::config::execute(cmd, cli.global, config, output),
    }
}

fn stderr_color(cli: &Cli) -> bool {
    !cli.global.no_color && std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Log `err`, print its report on stderr and return its exit code.
fn handle_error(err: CliError, verbose: bool, color: bool) -> ExitCode {
    err.log();

    eprint!("{}", err.render(verbose, color));

    ExitCode::from(err.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_version_matches_cargo() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_version(), Some(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn binary_is_named_stackgen() {
        assert_eq!(Cli::command().get_name(), "stackgen");
    }
}
