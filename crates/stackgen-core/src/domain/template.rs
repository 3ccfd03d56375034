//! Config template files and the handful of files that get special treatment.

use std::path::{Path, PathBuf};

/// Suffix marking a file as a template; stripped from the output name.
pub const TEMPLATE_MARKER: &str = ".template";

/// A file read from the config template tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Path relative to the template root.
    pub source: PathBuf,
    /// Path relative to the output config root, marker stripped.
    pub output: PathBuf,
    pub content: Vec<u8>,
    pub executable: bool,
}

impl TemplateFile {
    pub fn new(source: PathBuf, content: Vec<u8>, executable: bool) -> Self {
        let output = output_path(&source);
        Self {
            source,
            output,
            content,
            executable,
        }
    }

    /// True when the source name carries the template marker.
    pub fn is_template(&self) -> bool {
        self.source != self.output
    }

    /// Content as text, when it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// `caddy/Caddyfile.template` -> `caddy/Caddyfile`; other names unchanged.
pub fn output_path(source: &Path) -> PathBuf {
    match source.file_name().and_then(|n| n.to_str()) {
        Some(name) if name.len() > TEMPLATE_MARKER.len() && name.ends_with(TEMPLATE_MARKER) => {
            source.with_file_name(&name[..name.len() - TEMPLATE_MARKER.len()])
        }
        _ => source.to_path_buf(),
    }
}

/// Output paths (relative to the config root) that need format-specific steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialFiles {
    /// Directory-service bootstrap data; `{{X_SSHA_PASSWORD}}` is hashed here.
    pub ldap_bootstrap: PathBuf,
    /// Analytics engine user file; `{{X_PASSWORD_SHA256}}` is hashed here.
    pub analytics_users: PathBuf,
    /// Mail relay bind file; only `mail_bind_baked` is written in plaintext.
    pub mail_bind: PathBuf,
    pub mail_bind_baked: String,
}

impl Default for SpecialFiles {
    fn default() -> Self {
        Self {
            ldap_bootstrap: PathBuf::from("ldap/bootstrap_ldap.ldif"),
            analytics_users: PathBuf::from("clickhouse/users.xml"),
            mail_bind: PathBuf::from("mailserver/dovecot-ldap.conf.ext"),
            mail_bind_baked: "LDAP_ADMIN_PASSWORD".into(),
        }
    }
}

/// Which processing path a file takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    LdapBootstrap,
    AnalyticsUsers,
    MailBind,
    Regular,
}

impl SpecialFiles {
    pub fn kind_of(&self, output: &Path) -> FileKind {
        if output == self.ldap_bootstrap {
            FileKind::LdapBootstrap
        } else if output == self.analytics_users {
            FileKind::AnalyticsUsers
        } else if output == self.mail_bind {
            FileKind::MailBind
        } else {
            FileKind::Regular
        }
    }
}
