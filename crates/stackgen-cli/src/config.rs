//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate only sees the request types built
//! from it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables, `STACKGEN__<SECTION>__<KEY>`
//! 3. Config file (`--config`, default `./stackgen.toml`)
//! 4. Built-in defaults (always present)
//!
//! Relative paths in `[layout]` are resolved against the directory of the
//! config file.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use stackgen_adapters::ToolCommands;
use stackgen_core::domain::{ManifestLayout, RawIdentity, SpecialFiles, VariablePolicy};

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "stackgen.toml";

const ENV_PREFIX: &str = "STACKGEN";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub identity: IdentityConfig,
    pub layout: LayoutConfig,
    pub manifest: ManifestConfig,
    pub variables: VariablesConfig,
    pub special_files: SpecialFilesConfig,
    pub tools: ToolsConfig,

    /// File this configuration was read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Operator identity, validated by the sanitizer before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub domain: String,
    pub admin_email: String,
    pub admin_user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ldap_domain: Option<String>,
    pub volumes_root: PathBuf,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            domain: "example.com".into(),
            admin_email: "admin@example.com".into(),
            admin_user: "admin".into(),
            mail_domain: None,
            ldap_domain: None,
            volumes_root: PathBuf::from("/srv/stack/volumes"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Version-controlled tree checked for uncommitted changes.
    pub source_root: PathBuf,
    pub config_templates: PathBuf,
    pub manifest_fragments: PathBuf,
    pub output: PathBuf,
    /// Directories below `output` that survive a rebuild.
    pub preserve: Vec<PathBuf>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("."),
            config_templates: PathBuf::from("configs.templates"),
            manifest_fragments: PathBuf::from("compose.templates"),
            output: PathBuf::from("dist"),
            preserve: vec![PathBuf::from("secrets")],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    pub categories: Vec<String>,
    pub base_dir: String,
    pub bootstrap: String,
    pub networks: String,
    pub volumes: String,
    pub output_name: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        let layout = ManifestLayout::default();
        Self {
            categories: layout.categories,
            base_dir: layout.base_dir,
            bootstrap: layout.bootstrap,
            networks: layout.networks,
            volumes: layout.volumes,
            output_name: layout.output_name,
        }
    }
}

/// A fixed value for one variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VariablesConfig {
    /// Unknown placeholders fail the build instead of warning.
    pub strict: bool,
    /// Written empty; filled in by a human after generation.
    pub user_provided: Vec<String>,
    // A list rather than a table: config keys are not case-preserving.
    pub constants: Vec<Constant>,
}

impl Default for VariablesConfig {
    fn default() -> Self {
        Self {
            strict: false,
            user_provided: vec!["HUGGINGFACE_TOKEN".into(), "SMTP_RELAY_PASSWORD".into()],
            constants: vec![Constant {
                name: "DEFAULT_TIMEZONE".into(),
                value: "UTC".into(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialFilesConfig {
    pub ldap_bootstrap: PathBuf,
    pub analytics_users: PathBuf,
    pub mail_bind: PathBuf,
    pub mail_bind_baked: String,
}

impl Default for SpecialFilesConfig {
    fn default() -> Self {
        let special = SpecialFiles::default();
        Self {
            ldap_bootstrap: special.ldap_bootstrap,
            analytics_users: special.analytics_users,
            mail_bind: special.mail_bind,
            mail_bind_baked: special.mail_bind_baked,
        }
    }
}

/// External commands, as argv lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Per-invocation deadline for hashing and key generation.
    pub timeout_secs: u64,
    /// Run in `source_root` before building; empty means no compile step.
    pub compile: Vec<String>,
    pub compile_timeout_secs: u64,
    pub rsa: Vec<String>,
    pub ssha: Vec<String>,
    pub argon2: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        let commands = ToolCommands::default();
        Self {
            timeout_secs: commands.timeout.as_secs(),
            compile: Vec::new(),
            compile_timeout_secs: 600,
            rsa: commands.rsa,
            ssha: commands.ssha,
            argon2: commands.argon2,
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then the file, then the environment.
    ///
    /// A missing file is an error only when it was named explicitly.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let path = config_file
            .cloned()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let defaults =
            Config::try_from(&Self::default()).context("Failed to seed default configuration")?;

        let settings = Config::builder()
            .add_source(defaults)
            .add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(config_file.is_some()),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("layout.preserve")
                    .with_list_parse_key("manifest.categories")
                    .with_list_parse_key("variables.user_provided")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        let mut config: Self = settings
            .try_deserialize()
            .context("Configuration has an unexpected shape")?;
        config.source = path.is_file().then_some(path);
        Ok(config)
    }

    /// Path `init` writes to and `config path` reports.
    pub fn config_path(config_file: Option<&PathBuf>) -> PathBuf {
        config_file
            .cloned()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Directory relative layout paths are resolved against.
    pub fn base_dir(&self) -> PathBuf {
        self.source
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir().join(path)
        }
    }

    pub fn raw_identity(&self) -> RawIdentity {
        let id = &self.identity;
        RawIdentity {
            domain: id.domain.clone(),
            admin_email: id.admin_email.clone(),
            admin_user: id.admin_user.clone(),
            mail_domain: id.mail_domain.clone().filter(|d| !d.is_empty()),
            ldap_domain: id.ldap_domain.clone().filter(|d| !d.is_empty()),
            volumes_root: id.volumes_root.clone(),
        }
    }

    pub fn policy(&self) -> VariablePolicy {
        VariablePolicy {
            user_provided: self.variables.user_provided.iter().cloned().collect::<BTreeSet<_>>(),
            constants: self
                .variables
                .constants
                .iter()
                .map(|c| (c.name.clone(), c.value.clone()))
                .collect(),
            strict: self.variables.strict,
        }
    }

    pub fn manifest_layout(&self) -> ManifestLayout {
        let m = &self.manifest;
        ManifestLayout {
            categories: m.categories.clone(),
            base_dir: m.base_dir.clone(),
            bootstrap: m.bootstrap.clone(),
            networks: m.networks.clone(),
            volumes: m.volumes.clone(),
            output_name: m.output_name.clone(),
        }
    }

    pub fn special_files(&self) -> SpecialFiles {
        let s = &self.special_files;
        SpecialFiles {
            ldap_bootstrap: s.ldap_bootstrap.clone(),
            analytics_users: s.analytics_users.clone(),
            mail_bind: s.mail_bind.clone(),
            mail_bind_baked: s.mail_bind_baked.clone(),
        }
    }

    pub fn tool_commands(&self) -> ToolCommands {
        ToolCommands {
            rsa: self.tools.rsa.clone(),
            ssha: self.tools.ssha.clone(),
            argon2: self.tools.argon2.clone(),
            timeout: Duration::from_secs(self.tools.timeout_secs),
        }
    }

    /// Value of a dotted key such as `identity.domain`, rendered as text.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = serde_json::to_value(self).ok()?;
        let found = key
            .split('.')
            .try_fold(&value, |node, part| node.get(part))?;
        Some(match found {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}
