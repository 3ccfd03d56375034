//! Textual merge of orchestration-manifest fragments.
//!
//! Fragments are not parsed as YAML. Only the indented body under a
//! column-zero `services:` key is taken from each one; the body ends at the
//! first column-zero line that is neither blank nor a comment.

use std::path::PathBuf;

/// Where fragments live and in which order they are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLayout {
    /// Category directories, merged in this order.
    pub categories: Vec<String>,
    /// Directory holding the bootstrap, networks and volumes files.
    pub base_dir: String,
    pub bootstrap: String,
    pub networks: String,
    pub volumes: String,
    /// File name of the merged manifest in the output directory.
    pub output_name: String,
}

impl Default for ManifestLayout {
    fn default() -> Self {
        Self {
            categories: ["core", "databases", "applications", "ai", "observability", "testing"]
                .into_iter()
                .map(String::from)
                .collect(),
            base_dir: "_base".into(),
            bootstrap: "volume-init.yml".into(),
            networks: "networks.yml".into(),
            volumes: "volumes.yml".into(),
            output_name: "docker-compose.yml".into(),
        }
    }
}

impl ManifestLayout {
    pub fn bootstrap_path(&self) -> PathBuf {
        PathBuf::from(&self.base_dir).join(&self.bootstrap)
    }

    pub fn networks_path(&self) -> PathBuf {
        PathBuf::from(&self.base_dir).join(&self.networks)
    }

    pub fn volumes_path(&self) -> PathBuf {
        PathBuf::from(&self.base_dir).join(&self.volumes)
    }
}

/// One fragment, keyed by its path relative to the fragment root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFragment {
    pub path: String,
    pub text: String,
}

/// Everything the merge consumes, already in merge order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestInputs {
    pub bootstrap: ManifestFragment,
    pub fragments: Vec<ManifestFragment>,
    pub networks: String,
    pub volumes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedManifest {
    pub text: String,
    /// Fragments that contributed a services body, bootstrap included.
    pub merged: usize,
    /// Fragments without a `services:` key.
    pub empty: Vec<String>,
}

const HEADER: &str = "# Generated by stackgen. Edit the fragments, not this file.\n";

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_services_key(line: &str) -> bool {
    match line.strip_prefix("services:") {
        Some(rest) => {
            let rest = rest.trim();
            rest.is_empty() || rest.starts_with('#')
        }
        None => false,
    }
}

/// Indented body under the top-level `services:` key, trailing blanks trimmed.
///
/// Returns `None` when the fragment has no such key.
pub fn extract_services_body(text: &str) -> Option<String> {
    let mut lines = text.lines();
    lines.by_ref().find(|line| is_services_key(line))?;

    let mut body: Vec<&str> = lines
        .take_while(|line| {
            is_blank(line) || is_comment(line) || line.starts_with([' ', '\t'])
        })
        .collect();

    while body.last().is_some_and(|l| is_blank(l)) {
        body.pop();
    }
    while body.first().is_some_and(|l| is_blank(l)) {
        body.remove(0);
    }

    let mut out = body.join("\n");
    out.push('\n');
    Some(out)
}

/// Drop leading comment and blank lines; the rest is kept verbatim.
pub fn strip_leading_comments(text: &str) -> String {
    let kept: Vec<&str> = text
        .lines()
        .skip_while(|l| is_blank(l) || is_comment(l))
        .collect();
    if kept.is_empty() {
        return String::new();
    }
    let mut out = kept.join("\n");
    out.push('\n');
    out
}

/// Concatenate service bodies under one `services:` key, then append the
/// shared networks and volumes sections. Deterministic in its inputs.
pub fn merge(inputs: &ManifestInputs) -> MergedManifest {
    let mut text = String::from(HEADER);
    text.push_str("\nservices:\n");

    let mut merged = 0;
    let mut empty = Vec::new();

    for fragment in std::iter::once(&inputs.bootstrap).chain(inputs.fragments.iter()) {
        match extract_services_body(&fragment.text) {
            Some(body) => {
                if merged > 0 {
                    text.push('\n');
                }
                text.push_str(&format!("  # --- {} ---\n", fragment.path));
                text.push_str(&body);
                merged += 1;
            }
            None => empty.push(fragment.path.clone()),
        }
    }

    for section in [&inputs.networks, &inputs.volumes] {
        let section = strip_leading_comments(section);
        if !section.is_empty() {
            text.push('\n');
            text.push_str(&section);
        }
    }

    MergedManifest { text, merged, empty }
}
