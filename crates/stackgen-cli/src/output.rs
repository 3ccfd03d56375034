//! Output management and formatting.

use std::io::{self, IsTerminal};
use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::{OwoColorize, Style};
use serde::Serialize;

use crate::cli::global::{GlobalArgs, OutputFormat};

/// Manages CLI output based on the global flags.
pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    term: Term,
}

impl OutputManager {
    /// Build an `OutputManager` from parsed CLI flags.
    pub fn new(args: &GlobalArgs) -> Self {
        // Resolve Auto → Human (TTY) or Plain (piped/redirected).
        let resolved_format = if args.output_format == OutputFormat::Auto {
            if io::stdout().is_terminal() {
                OutputFormat::Human
            } else {
                OutputFormat::Plain
            }
        } else {
            args.output_format
        };

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color: args.no_color || resolved_format != OutputFormat::Human,
            term: Term::stdout(),
        }
    }

    /// Plain line on stdout; suppressed in quiet mode.
    pub fn print(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(msg)
    }

    /// `✓ <msg>`
    pub fn success(&self, msg: &str) -> io::Result<()> {
        self.marked('\u{2713}', msg, Style::new().green())
    }

    /// `ℹ <msg>`
    pub fn info(&self, msg: &str) -> io::Result<()> {
        self.marked('\u{2139}', msg, Style::new().blue())
    }

    /// `⚠ <msg>` on stderr. Shown even with `--quiet`; never affects the exit code.
    pub fn warning(&self, msg: &str) -> io::Result<()> {
        self.paint_line(&Term::stderr(), &format!("\u{26a0} {msg}"), Style::new().yellow())
    }

    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.paint_line(&self.term, text, Style::new().cyan().bold())
    }

    fn marked(&self, marker: char, msg: &str, style: Style) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.paint_line(&self.term, &format!("{marker} {msg}"), style)
    }

    fn paint_line(&self, term: &Term, line: &str, style: Style) -> io::Result<()> {
        if self.no_color {
            term.write_line(line)
        } else {
            term.write_line(&line.style(style).to_string())
        }
    }

    /// Pretty JSON on stdout, printed even with `--quiet`.
    pub fn json<T: Serialize>(&self, value: &T) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.term.write_line(&text)
    }

    /// Spinner for a long step; hidden unless output is human-facing.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.quiet || self.resolved_format != OutputFormat::Human {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(msg.to_owned());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    /// `true` if ANSI colours are enabled.
    pub fn supports_color(&self) -> bool {
        !self.no_color
    }

    /// The resolved (non-Auto) output format.
    pub fn format(&self) -> OutputFormat {
        self.resolved_format
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
