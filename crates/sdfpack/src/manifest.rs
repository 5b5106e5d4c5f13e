//! Defines the manifest schema for on-disk SDF asset packs so `repository`
//! lookups and the daemon's asset bindings agree on pack metadata. A pack is a
//! directory holding `pack.toml` plus one JPEG-compressed distance-field
//! texture per layer; the manifest orders those layers and carries the
//! presentation parameters the compositor needs to build an asset descriptor.
//!
//! Types:
//!
//! - `PackManifest` captures output dimensions, scale/focus, the shading
//!   variant tags, and the ordered layer list consumed by `LocalPack`.
//! - `LayerEntry` pairs one compressed texture file with its target shade.
//! - `OrientationTag` encodes the four fixed 90°-rotation/mirroring remaps a
//!   pack may request.
//!
//! Functions:
//!
//! - `PackManifest::validate` returns human-readable issues so pack loaders
//!   can surface misconfigurations without panicking.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Layer counts supported by the compositing pipeline.
pub const SUPPORTED_LAYER_COUNTS: [usize; 2] = [16, 32];

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PackManifest {
    pub name: Option<String>,
    /// Output pixel dimensions of the rendered composite.
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Normalized focus point as an (x, y) fraction of width/height.
    #[serde(default = "default_focus")]
    pub focus: [f32; 2],
    #[serde(default)]
    pub orientation: OrientationTag,
    #[serde(default)]
    pub inverted: bool,
    /// Layer 0 is reserved as an alpha-mask source instead of a color slice.
    #[serde(default)]
    pub alpha_mask: bool,
    /// Layer bytes live in external mapped memory and the decoder must wait
    /// for the region's read mapping before starting.
    #[serde(default)]
    pub mapped_memory: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub layers: Vec<LayerEntry>,
}

fn default_scale() -> f32 {
    1.0
}

fn default_focus() -> [f32; 2] {
    [0.5, 0.5]
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LayerEntry {
    pub file: PathBuf,
    /// 8-bit shade this layer blends the composite toward.
    pub shade: u8,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrientationTag {
    Identity,
    Cw,
    Ccw,
    Flip,
}

impl Default for OrientationTag {
    fn default() -> Self {
        Self::Identity
    }
}

impl PackManifest {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.width == 0 || self.height == 0 {
            issues.push(format!(
                "pack dimensions must be nonzero, got {}x{}",
                self.width, self.height
            ));
        }
        if !SUPPORTED_LAYER_COUNTS.contains(&self.layers.len()) {
            issues.push(format!(
                "pack must declare 16 or 32 layers, got {}",
                self.layers.len()
            ));
        }
        if !(self.scale > 0.0) {
            issues.push(format!("scale must be positive, got {}", self.scale));
        }
        for (axis, value) in ["x", "y"].iter().zip(self.focus) {
            if !(0.0..=1.0).contains(&value) {
                issues.push(format!("focus {axis} must lie in [0, 1], got {value}"));
            }
        }
        for (index, layer) in self.layers.iter().enumerate() {
            if layer.file.as_os_str().is_empty() {
                issues.push(format!("layer {index} has an empty file path"));
            }
        }
        if self.alpha_mask && self.layers.len() < 2 {
            issues.push("alpha-mask packs need at least one layer beyond the mask".to_string());
        }
        issues
    }
}
