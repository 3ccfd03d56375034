//! Placeholder syntaxes, comment-aware scanning, and text substitution.
//!
//! Two syntaxes are in play:
//!
//! | Syntax        | Form              | Used in                |
//! |---------------|-------------------|------------------------|
//! | `DoubleBrace` | `{{NAME}}`        | config templates       |
//! | `DollarBrace` | `${NAME}`, `${NAME:-x}` | manifest fragments, deferred output |
//!
//! Substitution never re-scans replaced text, so a secret that happens to
//! contain `{{` cannot inject a placeholder.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::domain::variable::VariableName;

static DOUBLE_BRACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Z_][A-Z0-9_]*)\}\}").expect("valid regex"));

static DOLLAR_BRACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?:(?::?[-?+=])[^}]*)?\}").expect("valid regex")
});

/// Placeholder syntax of a template tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    DoubleBrace,
    DollarBrace,
}

impl Syntax {
    fn regex(self) -> &'static Regex {
        match self {
            Self::DoubleBrace => &DOUBLE_BRACE,
            Self::DollarBrace => &DOLLAR_BRACE,
        }
    }
}

/// Comment markers for a file, chosen by the extension of its output name.
pub fn comment_markers(path: &Path) -> &'static [&'static str] {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("xml" | "html" | "htm" | "xsd") => &["<!--"],
        Some("sql") => &["--"],
        Some("js" | "mjs" | "cjs" | "ts" | "json5" | "jsonc" | "php") => &["//"],
        Some("ini" | "cnf") => &[";", "#"],
        Some("lua") => &["--"],
        _ => &["#"],
    }
}

/// True when the trimmed line starts with one of `markers`.
pub fn is_comment_line(line: &str, markers: &[&str]) -> bool {
    let trimmed = line.trim_start();
    markers.iter().any(|m| trimmed.starts_with(m))
}

/// Distinct placeholder names referenced in non-comment lines of `text`.
pub fn scan(text: &str, syntax: Syntax, markers: &[&str]) -> BTreeSet<VariableName> {
    text.lines()
        .filter(|line| !is_comment_line(line, markers))
        .flat_map(|line| syntax.regex().captures_iter(line))
        .filter_map(|caps| VariableName::new(&caps[1]).ok())
        .collect()
}

/// Every `{{NAME}}` still present in non-comment lines of `text`.
pub fn remaining(text: &str, markers: &[&str]) -> BTreeSet<String> {
    text.lines()
        .filter(|line| !is_comment_line(line, markers))
        .flat_map(|line| DOUBLE_BRACE.captures_iter(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Single pass over `{{NAME}}` placeholders.
///
/// `resolve` returns the replacement for a name, or `None` to leave the
/// placeholder untouched.
pub fn substitute<F>(text: &str, mut resolve: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    DOUBLE_BRACE
        .replace_all(text, |caps: &Captures<'_>| {
            resolve(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// [`substitute`] on non-comment lines; comment lines are copied verbatim.
pub fn substitute_active<F>(text: &str, markers: &[&str], mut resolve: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    text.split_inclusive('\n')
        .map(|line| {
            if is_comment_line(line, markers) {
                line.to_string()
            } else {
                substitute(line, &mut resolve)
            }
        })
        .collect()
}

/// `${NAME}` form of a placeholder, resolved by the orchestrator at start time.
pub fn deferred(name: &str) -> String {
    format!("${{{name}}}")
}

/// Replace `{{name}}` with a multi-line `value`, keeping indentation.
///
/// The first value line takes the placeholder's place. Every later non-blank
/// line is prefixed with the leading whitespace of the line the placeholder
/// sits on; blank lines are emitted empty. Comment lines are left alone.
pub fn embed_multiline(text: &str, markers: &[&str], name: &str, value: &str) -> String {
    let placeholder = format!("{{{{{name}}}}}");
    let mut out = String::with_capacity(text.len() + value.len());

    for line in text.split_inclusive('\n') {
        if !line.contains(&placeholder) || is_comment_line(line, markers) {
            out.push_str(line);
            continue;
        }

        let indent: String = line
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        let reindented = value
            .trim_end_matches('\n')
            .lines()
            .enumerate()
            .map(|(j, l)| match (j, l.trim().is_empty()) {
                (0, _) => l.to_string(),
                (_, true) => String::new(),
                (_, false) => format!("{indent}{l}"),
            })
            .collect::<Vec<_>>()
            .join("\n");
        out.push_str(&line.replace(&placeholder, &reindented));
    }

    out
}
