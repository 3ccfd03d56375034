//! Build Service - main application orchestrator.
//!
//! This service coordinates the entire provisioning workflow:
//! 1. Refuse a dirty source tree (unless forced)
//! 2. Sanitize identity fields
//! 3. Back up the variable file and preserved directories, verified by read-back
//! 4. Wipe and recreate the output directory
//! 5. Restore the backup and drop the staging copy
//! 6. Discover, generate, merge the manifest, process config templates
//! 7. Write the variable file only if absent; always write the build stamp

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    application::{
        ApplicationError,
        ports::{Filesystem, SecretToolkit, SourceControl},
        services::{
            config_processor::{ConfigProcessor, ProcessContext},
            discovery::Discoverer,
            manifest_merger::ManifestMerger,
            secret_generator::SecretGenerator,
        },
    },
    domain::{
        Classifier, EnvFile, EnvSection, IdentityField, IdentitySection, ManifestLayout,
        RawIdentity, SanitizedConfig, SecretTable, SpecialFiles, Strategy, TemplateFile,
        TemplateVariable, VariablePolicy, env_file, sanitize,
    },
    error::{StackgenError, StackgenResult},
};

/// Variable file name inside the output directory.
pub const ENV_FILE: &str = ".env";
/// Build stamp file name inside the output directory.
pub const BUILD_INFO: &str = ".build_info";
/// Processed config templates land below this directory.
pub const CONFIG_DIR: &str = "configs";

/// Everything one build needs.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub identity: RawIdentity,
    /// Version-controlled tree checked for uncommitted changes.
    pub source_root: PathBuf,
    pub config_templates: PathBuf,
    pub manifest_fragments: PathBuf,
    pub output: PathBuf,
    /// Directories below `output` that survive the wipe.
    pub preserve: Vec<PathBuf>,
    pub policy: VariablePolicy,
    pub special_files: SpecialFiles,
    pub manifest: ManifestLayout,
    /// Build even when the source tree is dirty.
    pub force: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvFileOutcome {
    Written,
    Preserved,
}

/// Summary of a finished build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub output: PathBuf,
    pub variables: usize,
    pub secrets_generated: usize,
    pub secrets_reused: usize,
    pub config_files: usize,
    pub fragments: usize,
    pub env_file: EnvFileOutcome,
    pub warnings: Vec<String>,
    pub revision: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One file copied out of the output directory before the wipe.
#[derive(Debug, Clone)]
struct BackedUpFile {
    rel: PathBuf,
    executable: bool,
}

#[derive(Debug, Clone)]
struct Backup {
    staging: PathBuf,
    files: Vec<BackedUpFile>,
}

/// Main provisioning service.
pub struct BuildService {
    filesystem: Box<dyn Filesystem>,
    toolkit: Box<dyn SecretToolkit>,
    source_control: Box<dyn SourceControl>,
}

impl BuildService {
    /// Create a new build service with the given adapters.
    pub fn new(
        filesystem: Box<dyn Filesystem>,
        toolkit: Box<dyn SecretToolkit>,
        source_control: Box<dyn SourceControl>,
    ) -> Self {
        Self {
            filesystem,
            toolkit,
            source_control,
        }
    }

    /// Discover and classify every variable without generating anything.
    #[instrument(skip_all)]
    pub fn inspect(
        &self,
        config_templates: &Path,
        manifest_fragments: &Path,
        policy: &VariablePolicy,
    ) -> StackgenResult<Vec<TemplateVariable>> {
        let discovery = Discoverer::new(self.filesystem.as_ref())
            .discover(config_templates, manifest_fragments)?;
        Ok(discovery.variables.classify(&Classifier::new(policy)))
    }

    /// Run the full pipeline.
    #[instrument(
        skip_all,
        fields(output = %request.output.display(), force = request.force)
    )]
    pub fn build(&self, request: &BuildRequest) -> StackgenResult<BuildReport> {
        let fs = self.filesystem.as_ref();
        let mut warnings = Vec::new();

        self.guard_output(request)?;
        self.check_workspace(request, &mut warnings)?;

        let identity = sanitize(&request.identity)?;
        info!(domain = identity.domain(), "Identity validated");

        let backup = self.backup(&request.output, &request.preserve)?;
        self.reset_output(&request.output)?;
        if let Some(backup) = backup {
            self.restore(&backup, &request.output)?;
        }

        let discovery = Discoverer::new(fs)
            .discover(&request.config_templates, &request.manifest_fragments)?;
        let classifier = Classifier::new(&request.policy);
        let variables = discovery.variables.classify(&classifier);
        info!(
            variables = variables.len(),
            templates = discovery.templates_scanned,
            fragments = discovery.fragments_scanned,
            "Variables discovered"
        );

        let env_path = request.output.join(ENV_FILE);
        let preserved = self.load_preserved(&env_path)?;
        let empty = BTreeMap::new();
        let secrets = SecretGenerator::new(self.toolkit.as_ref(), &request.policy)
            .generate(&variables, preserved.as_ref().unwrap_or(&empty))?;
        info!(
            generated = secrets.generated,
            reused = secrets.reused,
            "Secrets ready"
        );

        let merged = ManifestMerger::new(fs, &request.manifest).merge(&request.manifest_fragments)?;
        warnings.extend(merged.warnings);
        fs.write_file(
            &request.output.join(&request.manifest.output_name),
            &merged.manifest.text,
        )?;

        let timestamp = request.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);
        let ctx = ProcessContext {
            identity: &identity,
            variables: &discovery.variables,
            classifier: &classifier,
            secrets: &secrets.table,
            special: &request.special_files,
            timestamp: &timestamp,
            strict: request.policy.strict,
        };
        let config_files = self.process_configs(request, ctx, &mut warnings)?;

        let env = assemble_env(&identity, &variables, &secrets.table, &request.policy);
        let env_outcome = match &preserved {
            Some(existing) => {
                warnings.extend(compare_preserved(&env, existing));
                info!("Existing variable file preserved");
                EnvFileOutcome::Preserved
            }
            None => {
                fs.write_file(&env_path, &env.render(&env_header(&timestamp)))?;
                info!(entries = env.len(), "Variable file written");
                EnvFileOutcome::Written
            }
        };

        let revision = match self.source_control.revision(&request.source_root) {
            Ok(revision) => revision,
            Err(e) => {
                warn!(error = %e, "Could not determine source revision");
                None
            }
        };
        fs.write_file(
            &request.output.join(BUILD_INFO),
            &build_info(revision.as_deref(), &timestamp),
        )?;

        info!("Build completed successfully");
        Ok(BuildReport {
            output: request.output.clone(),
            variables: variables.len(),
            secrets_generated: secrets.generated,
            secrets_reused: secrets.reused,
            config_files,
            fragments: merged.manifest.merged,
            env_file: env_outcome,
            warnings,
            revision,
            timestamp: request.timestamp,
        })
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    /// The output directory is wiped; it must not contain any input.
    ///
    /// Paths are compared in canonical form, so relative inputs, `..`
    /// segments and symlinks cannot hide an input below the output.
    fn guard_output(&self, request: &BuildRequest) -> StackgenResult<()> {
        let fs = self.filesystem.as_ref();
        let out = &request.output;
        if out.as_os_str().is_empty() {
            return Err(StackgenError::Configuration {
                message: "output directory is empty".into(),
            });
        }

        let canonical_out = fs.canonicalize(out)?;
        for input in [
            &request.source_root,
            &request.config_templates,
            &request.manifest_fragments,
        ] {
            let canonical_input = fs.canonicalize(input)?;
            if canonical_input.starts_with(&canonical_out) {
                return Err(StackgenError::Configuration {
                    message: format!(
                        "output directory {} ({}) would contain input {} ({})",
                        out.display(),
                        canonical_out.display(),
                        input.display(),
                        canonical_input.display()
                    ),
                });
            }
        }
        debug!(output = %canonical_out.display(), "Output directory checked");
        Ok(())
    }

    fn check_workspace(&self, request: &BuildRequest, warnings: &mut Vec<String>) -> StackgenResult<()> {
        let dirty = self.source_control.dirty_paths(&request.source_root);
        match (dirty, request.force) {
            (Ok(paths), false) if !paths.is_empty() => {
                Err(ApplicationError::DirtyWorkspace { paths }.into())
            }
            (Err(e), false) => Err(e),
            (Ok(paths), true) if !paths.is_empty() => {
                warn!(changes = paths.len(), "Building from a dirty source tree (forced)");
                warnings.push(format!(
                    "source tree has {} uncommitted change(s); build forced",
                    paths.len()
                ));
                Ok(())
            }
            (Err(e), true) => {
                warn!(error = %e, "Skipping source tree check (forced)");
                warnings.push(format!("source tree not checked: {e}"));
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Copy the variable file and preserved directories next to `output`.
    ///
    /// Every copy is read back and compared before the caller may wipe.
    fn backup(&self, output: &Path, preserve: &[PathBuf]) -> StackgenResult<Option<Backup>> {
        let fs = self.filesystem.as_ref();
        if !fs.exists(output) {
            return Ok(None);
        }

        let mut wanted = Vec::new();
        if fs.exists(&output.join(ENV_FILE)) {
            wanted.push(PathBuf::from(ENV_FILE));
        }
        for dir in preserve {
            let abs = output.join(dir);
            if fs.is_dir(&abs) {
                wanted.extend(fs.list_files(&abs)?.into_iter().map(|f| dir.join(f)));
            } else if fs.exists(&abs) {
                wanted.push(dir.clone());
            }
        }
        if wanted.is_empty() {
            return Ok(None);
        }

        let staging = staging_dir(output);
        debug!(staging = %staging.display(), files = wanted.len(), "Backing up preserved files");

        let result = wanted
            .into_iter()
            .map(|rel| -> StackgenResult<BackedUpFile> {
                let src = output.join(&rel);
                let dest = staging.join(&rel);
                let bytes = fs.read_bytes(&src)?;
                let executable = fs.is_executable(&src)?;
                fs.write_bytes(&dest, &bytes)?;
                if fs.read_bytes(&dest)? != bytes {
                    return Err(ApplicationError::BackupVerificationFailed { path: dest }.into());
                }
                Ok(BackedUpFile { rel, executable })
            })
            .collect::<StackgenResult<Vec<_>>>();

        match result {
            Ok(files) => {
                info!(files = files.len(), "Backup verified");
                Ok(Some(Backup { staging, files }))
            }
            Err(e) => {
                if let Err(cleanup) = fs.remove_dir_all(&staging) {
                    warn!(error = %cleanup, "Failed to remove incomplete backup");
                }
                Err(e)
            }
        }
    }

    fn reset_output(&self, output: &Path) -> StackgenResult<()> {
        let fs = self.filesystem.as_ref();
        if fs.exists(output) {
            fs.remove_dir_all(output)?;
        }
        fs.create_dir_all(output)
    }

    fn restore(&self, backup: &Backup, output: &Path) -> StackgenResult<()> {
        let fs = self.filesystem.as_ref();
        let restore_failed = |e: StackgenError| ApplicationError::RestoreFailed {
            staging: backup.staging.clone(),
            reason: e.to_string(),
        };

        for file in &backup.files {
            let bytes = fs
                .read_bytes(&backup.staging.join(&file.rel))
                .map_err(restore_failed)?;
            let dest = output.join(&file.rel);
            fs.write_bytes(&dest, &bytes).map_err(restore_failed)?;
            if file.executable {
                fs.set_permissions(&dest, true).map_err(restore_failed)?;
            }
        }

        fs.remove_dir_all(&backup.staging)?;
        info!(files = backup.files.len(), "Preserved files restored");
        Ok(())
    }

    fn load_preserved(&self, env_path: &Path) -> StackgenResult<Option<BTreeMap<String, String>>> {
        let fs = self.filesystem.as_ref();
        if !fs.exists(env_path) {
            return Ok(None);
        }
        let content = fs.read_file(env_path)?;
        let values = env_file::parse(&content).map_err(|reason| ApplicationError::InvalidVariableFile {
            path: env_path.to_path_buf(),
            reason,
        })?;
        debug!(entries = values.len(), "Loaded preserved variable file");
        Ok(Some(values))
    }

    fn process_configs(
        &self,
        request: &BuildRequest,
        ctx: ProcessContext<'_>,
        warnings: &mut Vec<String>,
    ) -> StackgenResult<usize> {
        let fs = self.filesystem.as_ref();
        let processor = ConfigProcessor::new(self.toolkit.as_ref(), ctx);
        let root = &request.config_templates;
        let out_root = request.output.join(CONFIG_DIR);

        let mut written = 0;
        for rel in fs.list_files(root)? {
            let src = root.join(&rel);
            let file = TemplateFile::new(rel, fs.read_bytes(&src)?, fs.is_executable(&src)?);
            let processed = processor.process(&file)?;

            let dest = out_root.join(&processed.output);
            fs.write_bytes(&dest, &processed.content)?;
            if processed.executable {
                fs.set_permissions(&dest, true)?;
            }
            warnings.extend(processed.warnings);
            written += 1;
        }

        info!(files = written, "Config files written");
        Ok(written)
    }
}

/// `<parent>/.<name>.backup-<uuid>`, a sibling of the output directory.
fn staging_dir(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    let parent = output.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!(".{name}.backup-{}", Uuid::new_v4().simple()))
}

/// The variable file a fresh build would write.
pub fn assemble_env(
    identity: &SanitizedConfig,
    variables: &[TemplateVariable],
    secrets: &SecretTable,
    policy: &VariablePolicy,
) -> EnvFile {
    let mut env = EnvFile::new();

    for field in IdentityField::ALL {
        let section = match field.section() {
            IdentitySection::Paths => EnvSection::Paths,
            IdentitySection::Identity => EnvSection::Identity,
            IdentitySection::Derived => EnvSection::Derived,
        };
        env.push(section, field.name(), identity.value_of(field));
    }

    for (name, value) in secrets.values() {
        env.push(EnvSection::Secrets, name.as_str(), value);
    }

    for var in variables {
        match var.strategy {
            Strategy::FixedConstant => {
                let value = policy.constants.get(var.name.as_str()).cloned().unwrap_or_default();
                env.push(EnvSection::Constants, var.name.as_str(), value);
            }
            Strategy::UserProvidedEmpty => {
                env.push(EnvSection::Constants, var.name.as_str(), "");
            }
            _ => {}
        }
    }

    env
}

/// Warnings for a preserved variable file that no longer matches the build.
fn compare_preserved(fresh: &EnvFile, existing: &BTreeMap<String, String>) -> Vec<String> {
    let mut warnings = Vec::new();
    for (key, value) in fresh.entries() {
        match existing.get(key) {
            None => {
                warn!(%key, "Variable missing from preserved variable file");
                warnings.push(format!("{key} is missing from the preserved {ENV_FILE}"));
            }
            Some(old) if IdentityField::from_name(key).is_some() && old != value => {
                warn!(%key, "Identity value differs from preserved variable file");
                warnings.push(format!(
                    "{key} in the preserved {ENV_FILE} is '{old}', configuration says '{value}'"
                ));
            }
            _ => {}
        }
    }
    warnings
}

fn env_header(timestamp: &str) -> String {
    format!(
        "stackgen variable file, generated {timestamp}\n\
         Later builds keep this file. Delete it to regenerate every secret."
    )
}

fn build_info(revision: Option<&str>, timestamp: &str) -> String {
    format!(
        "revision={}\ntimestamp={timestamp}\ngenerator=stackgen {}\n",
        revision.unwrap_or("unknown"),
        crate::VERSION
    )
}
