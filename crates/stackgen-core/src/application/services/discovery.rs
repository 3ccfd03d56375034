//! Variable discovery over the two template trees.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::{
    application::{ApplicationError, ports::Filesystem},
    domain::{
        Origin, RuntimeVariables, Syntax, TemplateFile,
        placeholder::{self, comment_markers},
    },
    error::StackgenResult,
};

/// Manifest fragments are YAML; nothing else in that tree is scanned.
pub fn is_fragment(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml" | "yaml")
    )
}

/// What discovery found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub variables: RuntimeVariables,
    /// Config templates scanned (files carrying the template marker).
    pub templates_scanned: usize,
    pub fragments_scanned: usize,
}

pub struct Discoverer<'a> {
    fs: &'a dyn Filesystem,
}

impl<'a> Discoverer<'a> {
    pub fn new(fs: &'a dyn Filesystem) -> Self {
        Self { fs }
    }

    /// Union of `{{NAME}}` placeholders in config templates and `${NAME}`
    /// references in manifest fragments, comment lines excluded.
    #[instrument(skip(self), fields(config = %config_root.display(), manifest = %manifest_root.display()))]
    pub fn discover(&self, config_root: &Path, manifest_root: &Path) -> StackgenResult<Discovery> {
        let mut discovery = Discovery::default();

        for rel in self.tree(config_root)? {
            let file = TemplateFile::new(rel, Vec::new(), false);
            if !file.is_template() {
                continue;
            }
            let path = config_root.join(&file.source);
            let bytes = self.fs.read_bytes(&path)?;
            let text = String::from_utf8(bytes)
                .map_err(|_| ApplicationError::TemplateNotText { path: path.clone() })?;

            let found = placeholder::scan(&text, Syntax::DoubleBrace, comment_markers(&file.output));
            debug!(file = %file.source.display(), count = found.len(), "Scanned config template");
            for name in found {
                discovery.variables.insert(name, Origin::ConfigTemplate);
            }
            discovery.templates_scanned += 1;
        }

        for rel in self.tree(manifest_root)? {
            if !is_fragment(&rel) {
                continue;
            }
            let text = self.fs.read_file(&manifest_root.join(&rel))?;
            let found = placeholder::scan(&text, Syntax::DollarBrace, &["#"]);
            debug!(file = %rel.display(), count = found.len(), "Scanned manifest fragment");
            for name in found {
                discovery.variables.insert(name, Origin::ManifestFragment);
            }
            discovery.fragments_scanned += 1;
        }

        Ok(discovery)
    }

    fn tree(&self, root: &Path) -> StackgenResult<Vec<PathBuf>> {
        if !self.fs.is_dir(root) {
            return Err(ApplicationError::TemplateTreeMissing {
                path: root.to_path_buf(),
            }
            .into());
        }
        self.fs.list_files(root)
    }
}
