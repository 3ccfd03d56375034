//! Template variables and their naming-convention classification.
//!
//! # Classification
//!
//! A variable's generation strategy is decided purely from its name. The
//! decision is an ordered list of [`ClassificationRule`]s evaluated
//! top-to-bottom; the first matching rule wins and [`Strategy::RandomHexSecret`]
//! is the fallback. New suffix conventions are added by inserting a rule.

use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::domain::error::DomainError;
use crate::domain::identity::IdentityField;

static VARIABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z_][A-Z0-9_]*$").expect("valid regex"));

/// Placeholder substituted with the build time by the config processor.
pub const GENERATION_TIMESTAMP: &str = "GENERATION_TIMESTAMP";

pub const OAUTH_HASH_SUFFIX: &str = "_OAUTH_SECRET_HASH";
pub const SSHA_SUFFIX: &str = "_SSHA_PASSWORD";
pub const SHA256_SUFFIX: &str = "_PASSWORD_SHA256";
pub const APP_KEY_SUFFIX: &str = "_APP_KEY";
pub const ISSUER_KEY_SUFFIX: &str = "_ISSUER_PRIVATE_KEY";

// ── VariableName ──────────────────────────────────────────────────────────────

/// A validated placeholder name (`^[A-Z_][A-Z0-9_]*$`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct VariableName(String);

impl VariableName {
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if VARIABLE_NAME.is_match(&name) {
            Ok(Self(name))
        } else {
            Err(DomainError::InvalidVariableName(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the plaintext a hash-only variable is derived from.
    ///
    /// `X_OAUTH_SECRET_HASH` -> `X_OAUTH_SECRET`, `X_SSHA_PASSWORD` and
    /// `X_PASSWORD_SHA256` -> `X_PASSWORD`.
    pub fn plaintext_sibling(&self) -> Option<VariableName> {
        let name = self.as_str();
        let sibling = if let Some(stem) = name.strip_suffix("_HASH") {
            stem.ends_with("_OAUTH_SECRET").then(|| stem.to_string())
        } else if let Some(stem) = name.strip_suffix(SSHA_SUFFIX) {
            Some(format!("{stem}_PASSWORD"))
        } else {
            name.strip_suffix(SHA256_SUFFIX)
                .map(|stem| format!("{stem}_PASSWORD"))
        }?;
        VariableName::new(sibling).ok()
    }
}

impl fmt::Display for VariableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Ord/Hash are derived from the inner String, so borrowed lookups agree.
impl Borrow<str> for VariableName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for VariableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ── Origin ────────────────────────────────────────────────────────────────────

/// Which template tree a variable was discovered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// `{{NAME}}` in a config template.
    ConfigTemplate,
    /// `${NAME}` in a manifest fragment.
    ManifestFragment,
    Both,
}

impl Origin {
    pub fn merge(self, other: Origin) -> Origin {
        if self == other { self } else { Origin::Both }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigTemplate => "config",
            Self::ManifestFragment => "manifest",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Strategy ──────────────────────────────────────────────────────────────────

/// How a variable's value is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    RandomHexSecret,
    DerivedAppKey,
    DerivedRsaKeyB64,
    OAuthHashOnly,
    LdapShaHashOnly,
    UserProvidedEmpty,
    FixedConstant,
    SanitizedField,
    HandledElsewhereSkip,
}

impl Strategy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RandomHexSecret => "random-hex",
            Self::DerivedAppKey => "app-key",
            Self::DerivedRsaKeyB64 => "rsa-key-b64",
            Self::OAuthHashOnly => "oauth-hash",
            Self::LdapShaHashOnly => "ldap-ssha",
            Self::UserProvidedEmpty => "user-provided",
            Self::FixedConstant => "constant",
            Self::SanitizedField => "sanitized",
            Self::HandledElsewhereSkip => "skip",
        }
    }

    /// Strategies whose own name never appears in the variable file.
    pub const fn is_hash_only(&self) -> bool {
        matches!(self, Self::OAuthHashOnly | Self::LdapShaHashOnly)
    }

    /// Strategies that need the secret toolkit.
    pub const fn is_generated(&self) -> bool {
        matches!(
            self,
            Self::RandomHexSecret
                | Self::DerivedAppKey
                | Self::DerivedRsaKeyB64
                | Self::OAuthHashOnly
        )
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Rules ─────────────────────────────────────────────────────────────────────

/// Operator-configured names that are not generated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariablePolicy {
    /// Emitted empty; a human fills them in after generation.
    pub user_provided: BTreeSet<String>,
    /// Emitted with a fixed value.
    pub constants: BTreeMap<String, String>,
    /// Treat placeholders outside the discovered set as fatal.
    pub strict: bool,
}

/// One `(predicate, strategy)` pair.
#[derive(Debug, Clone)]
pub enum ClassificationRule {
    Suffix(&'static str, Strategy),
    Exact(String, Strategy),
    Identity,
}

impl ClassificationRule {
    fn apply(&self, name: &str) -> Option<Strategy> {
        match self {
            Self::Suffix(suffix, strategy) => name.ends_with(suffix).then_some(*strategy),
            Self::Exact(exact, strategy) => (exact == name).then_some(*strategy),
            Self::Identity => {
                IdentityField::from_name(name).map(|_| Strategy::SanitizedField)
            }
        }
    }
}

/// Ordered rule list; first match wins.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<ClassificationRule>,
}

impl Classifier {
    pub fn new(policy: &VariablePolicy) -> Self {
        let mut rules = vec![
            ClassificationRule::Exact(GENERATION_TIMESTAMP.into(), Strategy::HandledElsewhereSkip),
            ClassificationRule::Suffix(OAUTH_HASH_SUFFIX, Strategy::OAuthHashOnly),
            ClassificationRule::Suffix(SSHA_SUFFIX, Strategy::LdapShaHashOnly),
            ClassificationRule::Suffix(SHA256_SUFFIX, Strategy::HandledElsewhereSkip),
            ClassificationRule::Suffix(APP_KEY_SUFFIX, Strategy::DerivedAppKey),
            ClassificationRule::Suffix(ISSUER_KEY_SUFFIX, Strategy::DerivedRsaKeyB64),
            ClassificationRule::Identity,
        ];
        rules.extend(
            policy
                .user_provided
                .iter()
                .map(|n| ClassificationRule::Exact(n.clone(), Strategy::UserProvidedEmpty)),
        );
        rules.extend(
            policy
                .constants
                .keys()
                .map(|n| ClassificationRule::Exact(n.clone(), Strategy::FixedConstant)),
        );
        Self { rules }
    }

    pub fn classify(&self, name: &VariableName) -> Strategy {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(name.as_str()))
            .unwrap_or(Strategy::RandomHexSecret)
    }
}

// ── Discovered set ────────────────────────────────────────────────────────────

/// A discovered, classified variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateVariable {
    pub name: VariableName,
    pub origin: Origin,
    pub strategy: Strategy,
}

/// The set of placeholder names discovered in both template trees.
///
/// Built once per run and passed by reference to every stage that needs to
/// know whether a placeholder is a runtime variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeVariables {
    names: BTreeMap<VariableName, Origin>,
}

impl RuntimeVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: VariableName, origin: Origin) {
        self.names
            .entry(name)
            .and_modify(|o| *o = o.merge(origin))
            .or_insert(origin);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VariableName, Origin)> {
        self.names.iter().map(|(n, o)| (n, *o))
    }

    pub fn classify(&self, classifier: &Classifier) -> Vec<TemplateVariable> {
        self.iter()
            .map(|(name, origin)| TemplateVariable {
                name: name.clone(),
                origin,
                strategy: classifier.classify(name),
            })
            .collect()
    }
}
