//! Reads manifest fragments from disk and hands them to the textual merge.

use std::path::Path;

use tracing::{info, instrument, warn};

use crate::{
    application::{ports::Filesystem, services::discovery::is_fragment},
    domain::{
        DomainError, ManifestFragment, ManifestInputs, ManifestLayout, MergedManifest,
        manifest,
    },
    error::StackgenResult,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub manifest: MergedManifest,
    pub warnings: Vec<String>,
}

pub struct ManifestMerger<'a> {
    fs: &'a dyn Filesystem,
    layout: &'a ManifestLayout,
}

impl<'a> ManifestMerger<'a> {
    pub fn new(fs: &'a dyn Filesystem, layout: &'a ManifestLayout) -> Self {
        Self { fs, layout }
    }

    #[instrument(skip(self), fields(root = %root.display()))]
    pub fn merge(&self, root: &Path) -> StackgenResult<MergeOutcome> {
        let mut warnings = Vec::new();

        let bootstrap = self.base_file(root, &self.layout.bootstrap_path())?;
        let networks = self.base_file(root, &self.layout.networks_path())?;
        let volumes = self.base_file(root, &self.layout.volumes_path())?;

        let mut fragments = Vec::new();
        for category in &self.layout.categories {
            let dir = root.join(category);
            if !self.fs.is_dir(&dir) {
                warn!(%category, "Fragment category directory missing, skipping");
                warnings.push(format!("fragment category '{category}' not found"));
                continue;
            }
            for rel in self.fs.list_files(&dir)? {
                if !is_fragment(&rel) {
                    continue;
                }
                let text = self.fs.read_file(&dir.join(&rel))?;
                fragments.push(ManifestFragment {
                    path: format!("{category}/{}", rel.display()),
                    text,
                });
            }
        }

        let merged = manifest::merge(&ManifestInputs {
            bootstrap,
            fragments,
            networks: networks.text,
            volumes: volumes.text,
        });

        for path in &merged.empty {
            warn!(%path, "Fragment has no services key");
            warnings.push(format!("fragment {path} has no services: key"));
        }
        info!(fragments = merged.merged, "Merged manifest fragments");

        Ok(MergeOutcome {
            manifest: merged,
            warnings,
        })
    }

    fn base_file(&self, root: &Path, rel: &Path) -> StackgenResult<ManifestFragment> {
        let path = root.join(rel);
        if !self.fs.exists(&path) {
            return Err(DomainError::MissingBaseFragment {
                path: path.display().to_string(),
            }
            .into());
        }
        Ok(ManifestFragment {
            path: rel.display().to_string(),
            text: self.fs.read_file(&path)?,
        })
    }
}
