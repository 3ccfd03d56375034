//! Source control adapters.

use std::path::Path;
use std::time::Duration;

use stackgen_core::{
    application::{ApplicationError, ports::SourceControl},
    error::{StackgenError, StackgenResult},
};

use crate::process::{self, DEFAULT_TIMEOUT, ToolInvocation};

/// Queries a git work tree through the `git` binary.
#[derive(Debug, Clone)]
pub struct GitSourceControl {
    timeout: Duration,
}

impl GitSourceControl {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn run(&self, root: &Path, args: &[&str]) -> StackgenResult<String> {
        let argv: Vec<String> = std::iter::once("git")
            .chain(args.iter().copied())
            .map(String::from)
            .collect();
        let display = argv.join(" ");
        let output = process::run_tool(&ToolInvocation {
            argv: &argv,
            display: &display,
            stdin: None,
            cwd: Some(root),
            timeout: self.timeout,
        })
        .map_err(|e| match e {
            StackgenError::Application(ApplicationError::ExternalTool { command, reason }) => {
                ApplicationError::SourceControl {
                    reason: format!("{command}: {reason}"),
                }
                .into()
            }
            other => other,
        })?;
        Ok(output.stdout)
    }
}

impl Default for GitSourceControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceControl for GitSourceControl {
    fn dirty_paths(&self, root: &Path) -> StackgenResult<Vec<String>> {
        let status = self.run(root, &["status", "--porcelain", "--untracked-files=normal"])?;
        Ok(parse_porcelain(&status))
    }

    fn revision(&self, root: &Path) -> StackgenResult<Option<String>> {
        let inside = self.run(root, &["rev-parse", "--is-inside-work-tree"]);
        if !matches!(inside.as_deref().map(str::trim), Ok("true")) {
            return Ok(None);
        }
        let sha = self.run(root, &["rev-parse", "HEAD"])?;
        let sha = sha.trim();
        Ok((!sha.is_empty()).then(|| sha.to_string()))
    }
}

/// Paths from `git status --porcelain` output.
fn parse_porcelain(status: &str) -> Vec<String> {
    status
        .lines()
        .filter(|line| line.len() > 3)
        .map(|line| {
            let path = &line[3..];
            path.rsplit_once(" -> ")
                .map_or(path, |(_, to)| to)
                .to_string()
        })
        .collect()
}

/// Fixed answers, for tests and for trees outside version control.
#[derive(Debug, Clone, Default)]
pub struct StaticSourceControl {
    dirty: Vec<String>,
    revision: Option<String>,
}

impl StaticSourceControl {
    pub fn clean(revision: impl Into<String>) -> Self {
        Self {
            dirty: Vec::new(),
            revision: Some(revision.into()),
        }
    }

    pub fn dirty(paths: &[&str]) -> Self {
        Self {
            dirty: paths.iter().map(|p| p.to_string()).collect(),
            revision: None,
        }
    }
}

impl SourceControl for StaticSourceControl {
    fn dirty_paths(&self, _root: &Path) -> StackgenResult<Vec<String>> {
        Ok(self.dirty.clone())
    }

    fn revision(&self, _root: &Path) -> StackgenResult<Option<String>> {
        Ok(self.revision.clone())
    }
}
