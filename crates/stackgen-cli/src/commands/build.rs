//! Implementation of the `stackgen build` command.
//!
//! Responsibility: run the optional compile step, translate configuration
//! and flags into a `BuildRequest`, call the core build service, and report
//! the result.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use stackgen_adapters::{
    GitSourceControl, LocalFilesystem, SystemToolkit,
    process::{self, ToolInvocation},
};
use stackgen_core::application::{BuildReport, BuildRequest, BuildService, EnvFileOutcome};

use crate::{
    cli::{BuildArgs, OutputFormat, global::GlobalArgs},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Execute the `stackgen build` command.
///
/// 1. Run the configured compile step unless `--skip-compile`
/// 2. Build the request from configuration plus flags
/// 3. Run the pipeline with the production adapters
/// 4. Print warnings, then the summary
#[instrument(skip_all, fields(force = args.force, skip_compile = args.skip_compile))]
pub fn execute(
    args: BuildArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let request = build_request(&args, &config, Utc::now());

    if args.skip_compile {
        info!("Compile step skipped");
    } else {
        compile(&config, &request.source_root, &output)?;
    }

    let tools = config.tool_commands();
    let service = BuildService::new(
        Box::new(LocalFilesystem::new()),
        Box::new(SystemToolkit::new(tools.clone())),
        Box::new(GitSourceControl::with_timeout(tools.timeout)),
    );

    let spinner = output.spinner("Generating configuration bundle...");
    let result = service.build(&request);
    spinner.finish_and_clear();
    let report = result?;

    for warning in &report.warnings {
        output.warning(warning)?;
    }

    if output.format() == OutputFormat::Json {
        output.json(&report)?;
        return Ok(());
    }

    show_report(&report, &output, global.verbose > 0)?;
    Ok(())
}

/// Merge configuration and flags into the core request.
fn build_request(args: &BuildArgs, config: &AppConfig, now: DateTime<Utc>) -> BuildRequest {
    let layout = &config.layout;
    let mut policy = config.policy();
    policy.strict |= args.strict;

    BuildRequest {
        identity: config.raw_identity(),
        source_root: config.resolve(&layout.source_root),
        config_templates: config.resolve(&layout.config_templates),
        manifest_fragments: config.resolve(&layout.manifest_fragments),
        output: config.resolve(args.output.as_deref().unwrap_or(&layout.output)),
        preserve: layout.preserve.clone(),
        policy,
        special_files: config.special_files(),
        manifest: config.manifest_layout(),
        force: args.force,
        timestamp: now,
    }
}

fn compile(config: &AppConfig, source_root: &Path, output: &OutputManager) -> CliResult<()> {
    let argv = &config.tools.compile;
    if argv.is_empty() {
        return Ok(());
    }

    let display_cmd = argv.join(" ");
    let spinner = output.spinner(&format!("Running {display_cmd}..."));
    let result = process::run_tool(&ToolInvocation {
        argv,
        display: &display_cmd,
        stdin: None,
        cwd: Some(source_root),
        timeout: Duration::from_secs(config.tools.compile_timeout_secs),
    });
    spinner.finish_and_clear();

    result.map_err(|source| CliError::CompileFailed {
        command: display_cmd.clone(),
        source,
    })?;
    info!(command = %display_cmd, "Compile step finished");
    Ok(())
}

fn show_report(report: &BuildReport, out: &OutputManager, verbose: bool) -> CliResult<()> {
    out.success(&format!("Bundle written to {}", report.output.display()))?;
    out.print(&format!("  Variables:     {}", report.variables))?;
    out.print(&format!(
        "  Secrets:       {} generated, {} reused",
        report.secrets_generated, report.secrets_reused
    ))?;
    out.print(&format!("  Config files:  {}", report.config_files))?;
    out.print(&format!("  Fragments:     {}", report.fragments))?;
    out.print(&format!(
        "  Variable file: {}",
        match report.env_file {
            EnvFileOutcome::Written => "written",
            EnvFileOutcome::Preserved => "preserved",
        }
    ))?;
    if verbose {
        out.print(&format!(
            "  Revision:      {}",
            report.revision.as_deref().unwrap_or("unknown")
        ))?;
    }
    if !report.warnings.is_empty() {
        out.info(&format!("{} warning(s), see above", report.warnings.len()))?;
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn args() -> BuildArgs {
        BuildArgs {
            skip_compile: true,
            force: false,
            output: None,
            strict: false,
        }
    }

    #[test]
    fn request_paths_are_anchored_at_the_config_file() {
        let config = AppConfig {
            source: Some(PathBuf::from("/srv/stack/stackgen.toml")),
            ..AppConfig::default()
        };
        let req = build_request(&args(), &config, Utc::now());

        assert_eq!(req.source_root, PathBuf::from("/srv/stack/."));
        assert_eq!(req.config_templates, PathBuf::from("/srv/stack/configs.templates"));
        assert_eq!(req.output, PathBuf::from("/srv/stack/dist"));
        assert_eq!(req.preserve, vec![PathBuf::from("secrets")]);
        assert!(!req.force);
    }

    #[test]
    fn flags_override_configuration() {
        let config = AppConfig::default();
        let req = build_request(
            &BuildArgs {
                force: true,
                strict: true,
                output: Some(PathBuf::from("/tmp/out")),
                ..args()
            },
            &config,
            Utc::now(),
        );
        assert!(req.force);
        assert!(req.policy.strict);
        assert_eq!(req.output, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn relative_output_flag_is_anchored_like_the_layout() {
        let config = AppConfig {
            source: Some(PathBuf::from("/srv/stack/stackgen.toml")),
            ..AppConfig::default()
        };
        let req = build_request(
            &BuildArgs {
                output: Some(PathBuf::from("../generated")),
                ..args()
            },
            &config,
            Utc::now(),
        );
        assert_eq!(req.output, PathBuf::from("/srv/stack/../generated"));
    }

    #[test]
    fn empty_compile_step_is_a_no_op() {
        let out = OutputManager::new(&GlobalArgs {
            verbose: 0,
            quiet: true,
            no_color: true,
            config: None,
            output_format: OutputFormat::Plain,
        });
        assert!(compile(&AppConfig::default(), Path::new("."), &out).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn failing_compile_step_is_reported() {
        let mut config = AppConfig::default();
        config.tools.compile = vec!["sh".into(), "-c".into(), "exit 4".into()];
        let out = OutputManager::new(&GlobalArgs {
            verbose: 0,
            quiet: true,
            no_color: true,
            config: None,
            output_format: OutputFormat::Plain,
        });
        let err = compile(&config, Path::new("."), &out).unwrap_err();
        assert!(matches!(err, CliError::CompileFailed { .. }));
        assert_eq!(err.exit_code(), 1);
    }
}
