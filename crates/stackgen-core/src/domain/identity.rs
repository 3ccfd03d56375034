//! Identity fields: raw operator input and its sanitized form.
//!
//! Every value here ends up interpolated into shell scripts, LDIF bootstrap
//! data and service configs, so validation is strict and happens once, before
//! any file is touched.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::error::DomainError;

static DNS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").expect("valid regex"));

static EMAIL_LOCAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._%+-]{1,64}$").expect("valid regex"));

static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{3,32}$").expect("valid regex"));

const MAX_DOMAIN_LEN: usize = 253;

/// Identity fields as supplied by the operator, unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawIdentity {
    pub domain: String,
    pub admin_email: String,
    pub admin_user: String,
    /// Defaults to `domain` when absent.
    pub mail_domain: Option<String>,
    /// Defaults to `domain` when absent.
    pub ldap_domain: Option<String>,
    pub volumes_root: PathBuf,
}

/// Validated identity fields plus the values derived from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedConfig {
    domain: String,
    mail_domain: String,
    ldap_domain: String,
    ldap_base_dn: String,
    admin_email: String,
    admin_user: String,
    volumes_root: String,
}

impl SanitizedConfig {
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn mail_domain(&self) -> &str {
        &self.mail_domain
    }

    pub fn ldap_domain(&self) -> &str {
        &self.ldap_domain
    }

    pub fn ldap_base_dn(&self) -> &str {
        &self.ldap_base_dn
    }

    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    pub fn admin_user(&self) -> &str {
        &self.admin_user
    }

    pub fn volumes_root(&self) -> &str {
        &self.volumes_root
    }

    /// Look up a sanitized field by the placeholder name templates use for it.
    pub fn field(&self, name: &str) -> Option<&str> {
        IdentityField::from_name(name).map(|f| self.value_of(f))
    }

    pub fn value_of(&self, field: IdentityField) -> &str {
        match field {
            IdentityField::Domain => &self.domain,
            IdentityField::MailDomain => &self.mail_domain,
            IdentityField::LdapDomain => &self.ldap_domain,
            IdentityField::LdapBaseDn => &self.ldap_base_dn,
            IdentityField::AdminEmail => &self.admin_email,
            IdentityField::AdminUser => &self.admin_user,
            IdentityField::VolumesRoot => &self.volumes_root,
        }
    }
}

/// Placeholder names that resolve to sanitized identity values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityField {
    Domain,
    MailDomain,
    LdapDomain,
    LdapBaseDn,
    AdminEmail,
    AdminUser,
    VolumesRoot,
}

impl IdentityField {
    pub const ALL: [IdentityField; 7] = [
        Self::VolumesRoot,
        Self::Domain,
        Self::AdminEmail,
        Self::AdminUser,
        Self::MailDomain,
        Self::LdapDomain,
        Self::LdapBaseDn,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Domain => "DOMAIN",
            Self::MailDomain => "MAIL_DOMAIN",
            Self::LdapDomain => "LDAP_DOMAIN",
            Self::LdapBaseDn => "LDAP_BASE_DN",
            Self::AdminEmail => "STACK_ADMIN_EMAIL",
            Self::AdminUser => "STACK_ADMIN_USER",
            Self::VolumesRoot => "VOLUMES_ROOT",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Section of the variable file this field is written under.
    pub const fn section(self) -> IdentitySection {
        match self {
            Self::VolumesRoot => IdentitySection::Paths,
            Self::Domain | Self::AdminEmail | Self::AdminUser => IdentitySection::Identity,
            Self::MailDomain | Self::LdapDomain | Self::LdapBaseDn => IdentitySection::Derived,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySection {
    Paths,
    Identity,
    Derived,
}

/// Validate raw identity fields and derive the directory base DN.
///
/// Pure; nothing is written anywhere.
pub fn sanitize(raw: &RawIdentity) -> Result<SanitizedConfig, DomainError> {
    let domain = validate_domain(&raw.domain)?;
    let mail_domain = match &raw.mail_domain {
        Some(d) => validate_domain(d)?,
        None => domain.clone(),
    };
    let ldap_domain = match &raw.ldap_domain {
        Some(d) => validate_domain(d)?,
        None => domain.clone(),
    };
    let admin_email = validate_email(&raw.admin_email)?;
    let admin_user = validate_username(&raw.admin_user)?;
    let volumes_root = validate_volumes_root(&raw.volumes_root)?;

    Ok(SanitizedConfig {
        ldap_base_dn: base_dn(&ldap_domain),
        domain,
        mail_domain,
        ldap_domain,
        admin_email,
        admin_user,
        volumes_root,
    })
}

/// `example.com` -> `dc=example,dc=com`.
pub fn base_dn(domain: &str) -> String {
    domain
        .split('.')
        .map(|label| format!("dc={label}"))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn validate_domain(value: &str) -> Result<String, DomainError> {
    let fail = |reason: &str| DomainError::InvalidDomain {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let domain = value.to_ascii_lowercase();
    if domain.is_empty() {
        return Err(fail("must not be empty"));
    }
    if domain.len() > MAX_DOMAIN_LEN {
        return Err(fail("longer than 253 characters"));
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(fail("needs at least two labels"));
    }
    if let Some(bad) = labels.iter().find(|l| !DNS_LABEL.is_match(l)) {
        return Err(fail(&format!("label '{bad}' is not a valid DNS label")));
    }

    Ok(domain)
}

pub fn validate_email(value: &str) -> Result<String, DomainError> {
    let fail = |reason: &str| DomainError::InvalidEmail {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let email = value;
    let (local, host) = email
        .split_once('@')
        .ok_or_else(|| fail("missing '@'"))?;

    if !EMAIL_LOCAL.is_match(local) {
        return Err(fail("local part contains unsupported characters"));
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return Err(fail("local part has a misplaced '.'"));
    }
    validate_domain(host).map_err(|_| fail("host part is not a valid domain"))?;

    Ok(email.to_string())
}

pub fn validate_username(value: &str) -> Result<String, DomainError> {
    if USERNAME.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(DomainError::InvalidUsername {
            value: value.to_string(),
            reason: "must be 3-32 characters of [A-Za-z0-9_-]".into(),
        })
    }
}

fn validate_volumes_root(path: &Path) -> Result<String, DomainError> {
    let value = path.to_string_lossy().into_owned();
    let fail = |reason: &str| DomainError::InvalidPath {
        field: "volumes_root",
        value: value.clone(),
        reason: reason.to_string(),
    };

    if !path.is_absolute() {
        return Err(fail("must be absolute"));
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(fail("must not contain whitespace or control characters"));
    }

    Ok(value)
}
