//! The generated variable file (`.env`).

use std::collections::BTreeMap;

/// Sections of the variable file, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnvSection {
    Paths,
    Identity,
    Derived,
    Secrets,
    Constants,
}

impl EnvSection {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Paths => "paths",
            Self::Identity => "identity",
            Self::Derived => "derived config",
            Self::Secrets => "generated secrets",
            Self::Constants => "constants",
        }
    }
}

/// Flat `KEY=value` file grouped into titled sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    sections: BTreeMap<EnvSection, Vec<(String, String)>>,
}

impl EnvFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, section: EnvSection, key: impl Into<String>, value: impl Into<String>) {
        self.sections
            .entry(section)
            .or_default()
            .push((key.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Every entry in output order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections
            .values()
            .flatten()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render with `header` as the leading comment. Keys keep insertion order
    /// within a section.
    pub fn render(&self, header: &str) -> String {
        let mut out = String::new();
        for line in header.lines() {
            out.push_str("# ");
            out.push_str(line);
            out.push('\n');
        }

        for (section, entries) in &self.sections {
            if entries.is_empty() {
                continue;
            }
            out.push_str(&format!("\n# ==== {} ====\n", section.title()));
            for (key, value) in entries {
                out.push_str(key);
                out.push('=');
                out.push_str(&quote(value));
                out.push('\n');
            }
        }
        out
    }
}

fn quote(value: &str) -> String {
    let plain = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "_-.,:/@+=%".contains(c));
    if plain {
        value.to_string()
    } else if !value.contains('\'') {
        format!("'{value}'")
    } else {
        let escaped = value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('$', "\\$");
        format!("\"{escaped}\"")
    }
}

/// Parse an existing variable file into a key/value map.
pub fn parse(content: &str) -> Result<BTreeMap<String, String>, String> {
    dotenvy::from_read_iter(content.as_bytes())
        .map(|item| item.map_err(|e| e.to_string()))
        .collect()
}
