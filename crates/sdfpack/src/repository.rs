//! Resolves asset handles into ready-to-decode packs, hiding the difference
//! between bare pack names and explicit directories from the rest of the
//! daemon. CLI and config code hand it `AssetHandle`s, while it consults
//! `PathResolver` and `LocalPack` to load manifests and confirm layer
//! textures exist before the compositor ever touches them.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use crate::pack::{ensure_layer_sources, LocalPack, PackError};
use crate::AssetHandle;

#[derive(Debug)]
pub struct AssetRepository {
    roots: Vec<PathBuf>,
}

impl AssetRepository {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn with_defaults() -> Self {
        Self::new(vec![PathBuf::from("packs")])
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn resolve(&self, handle: &AssetHandle) -> Result<LocalPack> {
        match handle {
            AssetHandle::Named(name) => self.load_named(name),
            AssetHandle::PackDir(path) => self.load_dir(path),
        }
    }

    fn load_named(&self, name: &str) -> Result<LocalPack> {
        if name.is_empty() {
            return Err(anyhow!("asset pack name must not be empty"));
        }

        debug!(requested = name, roots = ?self.roots, "resolving named asset pack");
        for root in &self.roots {
            let candidate = root.join(name);
            if candidate.exists() {
                return self.load_dir(&candidate);
            }
        }

        warn!(requested = name, roots = ?self.roots, "asset pack missing");
        Err(anyhow!(
            "unable to locate asset pack '{}'. searched roots: {:?}",
            name,
            self.roots
        ))
    }

    fn load_dir(&self, path: &Path) -> Result<LocalPack> {
        if path.as_os_str().is_empty() {
            return Err(anyhow!("asset pack path must not be empty"));
        }

        match LocalPack::load(path) {
            Ok(pack) => {
                ensure_layer_sources(&pack).map_err(|err| match err {
                    PackError::ManifestValidation(items) => anyhow!(
                        "asset pack '{}' failed validation: {:?}",
                        path.display(),
                        items
                    ),
                    other => anyhow!(other),
                })?;
                debug!(path = %path.display(), layers = pack.layer_count(), "loaded asset pack");
                Ok(pack)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to load asset pack");
                Err(anyhow!(err))
            }
        }
    }
}
