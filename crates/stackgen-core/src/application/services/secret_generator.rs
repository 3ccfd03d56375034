//! Secret generation through the [`SecretToolkit`] port.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, instrument};

use crate::{
    application::ports::SecretToolkit,
    domain::{
        DomainError, HashKind, SecretTable, Strategy, TemplateVariable, VariableName,
        VariablePolicy,
        secrets::{self, APP_KEY_PREFIX, RSA_BITS, SECRET_BYTES},
    },
    error::StackgenResult,
};

/// A populated secret table plus bookkeeping for the build report.
#[derive(Debug, Clone, Default)]
pub struct GeneratedSecrets {
    pub table: SecretTable,
    /// Values produced fresh in this run.
    pub generated: usize,
    /// Values taken over from a preserved variable file.
    pub reused: usize,
}

pub struct SecretGenerator<'a> {
    toolkit: &'a dyn SecretToolkit,
    policy: &'a VariablePolicy,
}

impl<'a> SecretGenerator<'a> {
    pub fn new(toolkit: &'a dyn SecretToolkit, policy: &'a VariablePolicy) -> Self {
        Self { toolkit, policy }
    }

    /// Produce a value for every generated strategy in `variables`.
    ///
    /// Values present in `preserved` are reused as-is. Hash-only variables
    /// get their plaintext sibling generated (or reused) first; the OAuth
    /// argon2 hash is derived here, the directory and analytics hashes are
    /// derived when their files are processed.
    #[instrument(skip_all, fields(variables = variables.len(), preserved = preserved.len()))]
    pub fn generate(
        &self,
        variables: &[TemplateVariable],
        preserved: &BTreeMap<String, String>,
    ) -> StackgenResult<GeneratedSecrets> {
        let mut out = GeneratedSecrets::default();

        // Direct values first so a sibling discovered on its own is produced once.
        for var in variables {
            match var.strategy {
                Strategy::RandomHexSecret | Strategy::DerivedAppKey | Strategy::DerivedRsaKeyB64 => {
                    self.ensure(&mut out, &var.name, var.strategy, preserved)?;
                }
                _ => {}
            }
        }

        for var in variables {
            let needs_sibling = matches!(
                var.strategy,
                Strategy::OAuthHashOnly | Strategy::LdapShaHashOnly
            ) || (var.strategy == Strategy::HandledElsewhereSkip
                && var.name.plaintext_sibling().is_some());
            if !needs_sibling {
                continue;
            }

            let Some(sibling) = var.name.plaintext_sibling() else {
                continue;
            };
            let plaintext = self.plaintext(&mut out, &sibling, preserved)?;

            if var.strategy == Strategy::OAuthHashOnly {
                let hash = self.toolkit.derive_hash(HashKind::Argon2, &plaintext)?;
                HashKind::Argon2.check(var.name.as_str(), &hash)?;
                out.table.insert_hash(var.name.clone(), hash);
                debug!(name = %var.name, "Derived OAuth client hash");
            }
        }

        Ok(out)
    }

    /// Fill `name` unless it is already in the table.
    fn ensure(
        &self,
        out: &mut GeneratedSecrets,
        name: &VariableName,
        strategy: Strategy,
        preserved: &BTreeMap<String, String>,
    ) -> StackgenResult<()> {
        if out.table.contains(name.as_str()) {
            return Ok(());
        }
        if let Some(value) = preserved.get(name.as_str()) {
            out.table.insert(name.clone(), value.clone());
            out.reused += 1;
            return Ok(());
        }

        let value = self.fresh(strategy)?;
        secrets::check_generated(name.as_str(), strategy, &value)?;
        out.table.insert(name.clone(), value);
        out.generated += 1;
        debug!(%name, strategy = %strategy, "Generated value");
        Ok(())
    }

    fn fresh(&self, strategy: Strategy) -> StackgenResult<String> {
        match strategy {
            Strategy::DerivedAppKey => Ok(format!(
                "{APP_KEY_PREFIX}{}",
                self.toolkit.random_base64(SECRET_BYTES)?
            )),
            Strategy::DerivedRsaKeyB64 => {
                let pem = self.toolkit.rsa_private_key_pem(RSA_BITS)?;
                Ok(STANDARD.encode(pem.as_bytes()))
            }
            _ => self.toolkit.random_hex(SECRET_BYTES),
        }
    }

    /// Plaintext a hash is derived from.
    ///
    /// Configured constants and user-provided values are honoured; an empty
    /// configured plaintext cannot be hashed.
    fn plaintext(
        &self,
        out: &mut GeneratedSecrets,
        sibling: &VariableName,
        preserved: &BTreeMap<String, String>,
    ) -> StackgenResult<String> {
        if let Some(value) = out.table.get(sibling.as_str()) {
            return Ok(value.to_string());
        }

        let configured = self
            .policy
            .constants
            .get(sibling.as_str())
            .cloned()
            .or_else(|| {
                self.policy
                    .user_provided
                    .contains(sibling.as_str())
                    .then(|| preserved.get(sibling.as_str()).cloned().unwrap_or_default())
            });
        if let Some(value) = configured {
            if value.is_empty() {
                return Err(DomainError::MissingPlaintext {
                    name: sibling.to_string(),
                    plaintext: sibling.to_string(),
                }
                .into());
            }
            return Ok(value);
        }

        self.ensure(out, sibling, Strategy::RandomHexSecret, preserved)?;
        Ok(out
            .table
            .get(sibling.as_str())
            .unwrap_or_default()
            .to_string())
    }
}
