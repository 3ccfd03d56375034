//! Running external commands with a deadline.

use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use stackgen_core::{application::ApplicationError, error::StackgenResult};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Default deadline for any single external invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// One external invocation.
#[derive(Debug, Clone)]
pub struct ToolInvocation<'a> {
    pub argv: &'a [String],
    /// Shown in logs and errors instead of `argv`, which may carry a secret.
    pub display: &'a str,
    pub stdin: Option<&'a [u8]>,
    pub cwd: Option<&'a Path>,
    pub timeout: Duration,
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn feed<W: Write + Send + 'static>(
    pipe: Option<W>,
    input: Option<&[u8]>,
) -> Option<JoinHandle<io::Result<()>>> {
    let (mut pipe, input) = (pipe?, input?.to_vec());
    Some(thread::spawn(move || pipe.write_all(&input)))
}

/// Outcome of the stdin writer. A child that exits without reading all of
/// its input closes the pipe early; that is not an error.
fn fed(handle: Option<JoinHandle<io::Result<()>>>) -> Result<(), String> {
    match handle.map(JoinHandle::join) {
        None | Some(Ok(Ok(()))) => Ok(()),
        Some(Ok(Err(e))) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("External command closed stdin before reading all input");
            Ok(())
        }
        Some(Ok(Err(e))) => Err(format!("could not write stdin: {e}")),
        Some(Err(_)) => Err("stdin writer panicked".into()),
    }
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Run a command, failing on spawn error, non-zero exit or timeout.
///
/// Pipes are drained on their own threads so a chatty child cannot block on
/// a full pipe while we wait.
pub fn run_tool(invocation: &ToolInvocation<'_>) -> StackgenResult<ToolOutput> {
    let failed = |reason: String| ApplicationError::ExternalTool {
        command: invocation.display.to_string(),
        reason,
    };

    let (program, args) = invocation
        .argv
        .split_first()
        .ok_or_else(|| failed("empty command".into()))?;

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(cwd) = invocation.cwd {
        command.current_dir(cwd);
    }

    debug!(command = invocation.display, "Running external command");
    let mut child = command
        .spawn()
        .map_err(|e| failed(format!("could not start: {e}")))?;

    let stdin = feed(child.stdin.take(), invocation.stdin);
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match child.wait_timeout(invocation.timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            warn!(command = invocation.display, "External command timed out, killing");
            let _ = child.kill();
            let _ = child.wait();
            return Err(ApplicationError::ToolTimeout {
                command: invocation.display.to_string(),
                secs: invocation.timeout.as_secs(),
            }
            .into());
        }
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(failed(format!("failed to wait: {e}")).into());
        }
    };

    let written = fed(stdin);
    let output = ToolOutput {
        stdout: collect(stdout),
        stderr: collect(stderr),
    };

    if !status.success() {
        let detail = output.stderr.trim();
        return Err(failed(match status.code() {
            Some(code) if detail.is_empty() => format!("exited with status {code}"),
            Some(code) => format!("exited with status {code}: {detail}"),
            None => "terminated by signal".into(),
        })
        .into());
    }
    written.map_err(failed)?;

    Ok(output)
}

/// Replace `{name}` tokens in an argv template.
pub fn expand(argv: &[String], replacements: &[(&str, &str)]) -> Vec<String> {
    argv.iter()
        .map(|arg| {
            replacements
                .iter()
                .fold(arg.clone(), |acc, (token, value)| acc.replace(token, value))
        })
        .collect()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use stackgen_core::error::StackgenError;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn invoke<'a>(argv: &'a [String], stdin: Option<&'a [u8]>, timeout: Duration) -> ToolInvocation<'a> {
        ToolInvocation {
            argv,
            display: "test",
            stdin,
            cwd: None,
            timeout,
        }
    }

    #[test]
    fn captures_stdout_and_feeds_stdin() {
        let cmd = argv(&["cat"]);
        let out = run_tool(&invoke(&cmd, Some(b"hello"), DEFAULT_TIMEOUT)).unwrap();
        assert_eq!(out.stdout, "hello");
    }

    #[test]
    fn large_stdin_is_delivered_in_full() {
        let cmd = argv(&["wc", "-c"]);
        let input = vec![b'x'; 256 * 1024];
        let out = run_tool(&invoke(&cmd, Some(&input), DEFAULT_TIMEOUT)).unwrap();
        assert_eq!(out.stdout.trim(), "262144");
    }

    #[test]
    fn child_ignoring_stdin_is_not_an_error() {
        let cmd = argv(&["sh", "-c", "echo done"]);
        let input = vec![b'x'; 1024 * 1024];
        let out = run_tool(&invoke(&cmd, Some(&input), DEFAULT_TIMEOUT)).unwrap();
        assert_eq!(out.stdout, "done\n");
    }

    #[test]
    fn stdin_write_failure_is_reported() {
        let handle = thread::spawn(|| Err(io::Error::other("disk on fire")));
        let reason = fed(Some(handle)).unwrap_err();
        assert!(reason.contains("disk on fire"));

        let handle = thread::spawn(|| Err(io::Error::from(io::ErrorKind::BrokenPipe)));
        assert!(fed(Some(handle)).is_ok());
        assert!(fed(None).is_ok());
    }

    #[test]
    fn non_zero_exit_is_an_error() {
        let cmd = argv(&["sh", "-c", "echo boom >&2; exit 3"]);
        let err = run_tool(&invoke(&cmd, None, DEFAULT_TIMEOUT)).unwrap_err();
        match err {
            StackgenError::Application(ApplicationError::ExternalTool { reason, .. }) => {
                assert!(reason.contains("status 3"));
                assert!(reason.contains("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn slow_command_times_out() {
        let cmd = argv(&["sleep", "5"]);
        let err = run_tool(&invoke(&cmd, None, Duration::from_millis(200))).unwrap_err();
        assert!(matches!(
            err,
            StackgenError::Application(ApplicationError::ToolTimeout { .. })
        ));
    }

    #[test]
    fn missing_program_is_reported() {
        let cmd = argv(&["stackgen-definitely-not-installed"]);
        assert!(run_tool(&invoke(&cmd, None, DEFAULT_TIMEOUT)).is_err());
    }

    #[test]
    fn expand_replaces_tokens() {
        let out = expand(&argv(&["openssl", "genrsa", "{bits}"]), &[("{bits}", "4096")]);
        assert_eq!(out, argv(&["openssl", "genrsa", "4096"]));
    }
}
