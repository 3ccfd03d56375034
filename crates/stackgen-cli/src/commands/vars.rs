//! Implementation of the `stackgen vars` command.

use stackgen_adapters::{LocalFilesystem, StaticSourceControl, SystemToolkit};
use stackgen_core::{application::BuildService, domain::TemplateVariable};

use crate::{
    cli::{ListFormat, OutputFormat, VarsArgs},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(args: VarsArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    // Inspection never touches the toolkit or source control.
    let service = BuildService::new(
        Box::new(LocalFilesystem::new()),
        Box::new(SystemToolkit::default()),
        Box::new(StaticSourceControl::default()),
    );

    let mut variables = service.inspect(
        &config.resolve(&config.layout.config_templates),
        &config.resolve(&config.layout.manifest_fragments),
        &config.policy(),
    )?;
    if args.generated {
        variables.retain(|v| v.strategy.is_generated());
    }

    let format = if output.format() == OutputFormat::Json {
        ListFormat::Json
    } else {
        args.format
    };

    match format {
        ListFormat::Table => {
            output.header(&format!("Discovered variables ({}):", variables.len()))?;
            for line in table(&variables) {
                output.print(&line)?;
            }
        }
        ListFormat::List => {
            for v in &variables {
                output.print(v.name.as_str())?;
            }
        }
        ListFormat::Json => output.json(&variables)?,
        ListFormat::Csv => {
            for line in csv(&variables) {
                output.print(&line)?;
            }
        }
    }

    Ok(())
}

fn table(variables: &[TemplateVariable]) -> Vec<String> {
    let width = variables
        .iter()
        .map(|v| v.name.as_str().len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    std::iter::once(format!("  {:<width$}  {:<8}  STRATEGY", "NAME", "ORIGIN"))
        .chain(variables.iter().map(|v| {
            format!(
                "  {:<width$}  {:<8}  {}",
                v.name.as_str(),
                v.origin.as_str(),
                v.strategy.as_str()
            )
        }))
        .collect()
}

fn csv(variables: &[TemplateVariable]) -> Vec<String> {
    std::iter::once("name,origin,strategy".to_string())
        .chain(variables.iter().map(|v| {
            format!("{},{},{}", v.name, v.origin.as_str(), v.strategy.as_str())
        }))
        .collect()
}
