//! Secret toolkit backed by the OS random source and external tools.
//!
//! Random hex and base64 material never leaves the process. RSA keys and the
//! salted password hashes come from external commands configured as argv
//! templates:
//!
//! - `{bits}` is replaced with the key size
//! - `{password}` is replaced with the plaintext; without it the plaintext is
//!   written to the command's stdin instead

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;
use stackgen_core::{
    application::ports::SecretToolkit,
    domain::{HashKind, secrets::sha256_hex},
    error::StackgenResult,
};
use tracing::instrument;

use crate::process::{self, DEFAULT_TIMEOUT, ToolInvocation};

const PASSWORD_TOKEN: &str = "{password}";
const BITS_TOKEN: &str = "{bits}";

/// Argv templates for the external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommands {
    pub rsa: Vec<String>,
    pub ssha: Vec<String>,
    pub argon2: Vec<String>,
    pub timeout: Duration,
}

impl Default for ToolCommands {
    fn default() -> Self {
        let argv = |parts: &[&str]| -> Vec<String> {
            parts.iter().map(|s| s.to_string()).collect()
        };
        Self {
            rsa: argv(&["openssl", "genrsa", BITS_TOKEN]),
            ssha: argv(&["slappasswd", "-h", "{SSHA}", "-T", "/dev/stdin"]),
            argon2: argv(&[
                "docker",
                "run",
                "--rm",
                "authelia/authelia:latest",
                "authelia",
                "crypto",
                "hash",
                "generate",
                "argon2",
                "--password",
                PASSWORD_TOKEN,
            ]),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Production [`SecretToolkit`].
#[derive(Debug, Clone, Default)]
pub struct SystemToolkit {
    commands: ToolCommands,
}

impl SystemToolkit {
    pub fn new(commands: ToolCommands) -> Self {
        Self { commands }
    }

    fn random_bytes(bytes: usize) -> Vec<u8> {
        let mut buf = vec![0u8; bytes];
        OsRng.fill_bytes(&mut buf);
        buf
    }

    fn hash_with(&self, template: &[String], plaintext: &str) -> StackgenResult<String> {
        let display = template.join(" ");
        let uses_arg = template.iter().any(|a| a.contains(PASSWORD_TOKEN));
        let argv = if uses_arg {
            process::expand(template, &[(PASSWORD_TOKEN, plaintext)])
        } else {
            template.to_vec()
        };

        let output = process::run_tool(&ToolInvocation {
            argv: &argv,
            display: &display,
            stdin: (!uses_arg).then_some(plaintext.as_bytes()),
            cwd: None,
            timeout: self.commands.timeout,
        })?;
        Ok(parse_digest(&output.stdout))
    }
}

/// Last non-empty output line, minus a `Digest:` label if the tool prints one.
fn parse_digest(stdout: &str) -> String {
    let line = stdout
        .lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .unwrap_or_default();
    line.strip_prefix("Digest:").unwrap_or(line).trim().to_string()
}

impl SecretToolkit for SystemToolkit {
    fn random_hex(&self, bytes: usize) -> StackgenResult<String> {
        Ok(hex::encode(Self::random_bytes(bytes)))
    }

    fn random_base64(&self, bytes: usize) -> StackgenResult<String> {
        Ok(STANDARD.encode(Self::random_bytes(bytes)))
    }

    #[instrument(skip(self))]
    fn rsa_private_key_pem(&self, bits: u32) -> StackgenResult<String> {
        let bits = bits.to_string();
        let argv = process::expand(&self.commands.rsa, &[(BITS_TOKEN, bits.as_str())]);
        let display = argv.join(" ");
        let output = process::run_tool(&ToolInvocation {
            argv: &argv,
            display: &display,
            stdin: None,
            cwd: None,
            timeout: self.commands.timeout,
        })?;
        Ok(output.stdout)
    }

    #[instrument(skip(self, plaintext))]
    fn derive_hash(&self, kind: HashKind, plaintext: &str) -> StackgenResult<String> {
        match kind {
            HashKind::Sha256Hex => Ok(sha256_hex(plaintext)),
            HashKind::Ssha => self.hash_with(&self.commands.ssha, plaintext),
            HashKind::Argon2 => self.hash_with(&self.commands.argon2, plaintext),
        }
    }
}
