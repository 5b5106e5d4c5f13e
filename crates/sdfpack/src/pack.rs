//! Wraps an asset pack directory so `repository` callers can load manifests
//! and locate layer textures consistently. Filesystem validation stays
//! centralized here while higher layers decide how the pack's bytes reach the
//! decoder.
//!
//! Types:
//!
//! - `PackError` classifies manifest parsing, validation, and I/O failures.
//! - `LocalPack` stores the resolved root directory and parsed `PackManifest`
//!   for later traversal by the repository and the daemon's asset bindings.
//!
//! Functions:
//!
//! - `LocalPack::load` reads `pack.toml`, validates it, and returns a
//!   filesystem-backed handle.
//! - `LocalPack::layer_path` resolves one layer's texture file.
//! - `ensure_layer_sources` confirms every declared layer has a file on disk
//!   so later decode errors point at texture data, not missing assets.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::manifest::PackManifest;

pub const MANIFEST_FILE: &str = "pack.toml";

#[derive(Debug, Error)]
pub enum PackError {
    #[error("manifest not found at {0}")]
    ManifestMissing(PathBuf),

    #[error("failed to parse manifest: {0}")]
    ManifestParse(#[from] toml::de::Error),

    #[error("manifest validation failed: {0:?}")]
    ManifestValidation(Vec<String>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct LocalPack {
    root: PathBuf,
    manifest: PackManifest,
}

impl LocalPack {
    pub fn load(root: impl AsRef<Path>) -> Result<Self, PackError> {
        let root = root.as_ref().to_path_buf();
        let manifest_path = root.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(PackError::ManifestMissing(manifest_path));
        }

        let manifest_raw = fs::read_to_string(&manifest_path)?;
        let manifest: PackManifest = toml::from_str(&manifest_raw)?;
        let issues = manifest.validate();
        if !issues.is_empty() {
            return Err(PackError::ManifestValidation(issues));
        }

        Ok(Self { root, manifest })
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    pub fn manifest(&self) -> &PackManifest {
        &self.manifest
    }

    /// Resolves the texture file backing layer `index`, if declared.
    pub fn layer_path(&self, index: usize) -> Option<PathBuf> {
        self.manifest
            .layers
            .get(index)
            .map(|layer| self.root.join(&layer.file))
    }

    pub fn layer_count(&self) -> usize {
        self.manifest.layers.len()
    }
}

/// Confirms every declared layer texture exists on disk, returning the
/// resolved paths in layer order.
pub fn ensure_layer_sources(pack: &LocalPack) -> Result<Vec<PathBuf>, PackError> {
    let mut missing = Vec::new();
    let mut resolved = Vec::new();
    for layer in &pack.manifest().layers {
        let path = pack.root().join(&layer.file);
        if !path.exists() {
            missing.push(path);
        } else {
            resolved.push(path);
        }
    }
    if !missing.is_empty() {
        return Err(PackError::ManifestValidation(
            missing
                .into_iter()
                .map(|p| format!("missing layer texture: {}", p.display()))
                .collect(),
        ));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{LayerEntry, OrientationTag};

    fn write_pack(dir: &Path, layer_count: usize, with_textures: bool) {
        let manifest = PackManifest {
            name: Some("demo".into()),
            width: 240,
            height: 320,
            scale: 1.0,
            focus: [0.5, 0.5],
            orientation: OrientationTag::Identity,
            inverted: false,
            alpha_mask: false,
            mapped_memory: false,
            description: None,
            layers: (0..layer_count)
                .map(|i| LayerEntry {
                    file: PathBuf::from(format!("layer{i:02}.jpg")),
                    shade: (i * 8) as u8,
                })
                .collect(),
        };
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join(MANIFEST_FILE),
            toml::to_string(&manifest).unwrap(),
        )
        .unwrap();
        if with_textures {
            for i in 0..layer_count {
                fs::write(dir.join(format!("layer{i:02}.jpg")), b"fake").unwrap();
            }
        }
    }

    #[test]
    fn loads_valid_pack() {
        let temp = tempfile::tempdir().unwrap();
        write_pack(temp.path(), 16, true);
        let pack = LocalPack::load(temp.path()).unwrap();
        assert_eq!(pack.layer_count(), 16);
        assert!(pack.layer_path(0).unwrap().ends_with("layer00.jpg"));
        assert!(pack.layer_path(16).is_none());
    }

    #[test]
    fn missing_manifest_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        let err = LocalPack::load(temp.path()).unwrap_err();
        assert!(matches!(err, PackError::ManifestMissing(_)));
    }

    #[test]
    fn invalid_layer_count_fails_validation() {
        let temp = tempfile::tempdir().unwrap();
        write_pack(temp.path(), 3, true);
        let err = LocalPack::load(temp.path()).unwrap_err();
        assert!(matches!(err, PackError::ManifestValidation(_)));
    }

    #[test]
    fn missing_textures_are_listed() {
        let temp = tempfile::tempdir().unwrap();
        write_pack(temp.path(), 16, false);
        let pack = LocalPack::load(temp.path()).unwrap();
        let err = ensure_layer_sources(&pack).unwrap_err();
        match err {
            PackError::ManifestValidation(issues) => assert_eq!(issues.len(), 16),
            other => panic!("unexpected error: {other}"),
        }
    }
}
