//! Binds on-disk asset packs to the compositor's descriptor model.

use anyhow::{Context, Result};
use compositor::{AssetSpec, Orientation, RasterVariant, SdfAsset, SdfLayer};
use sdfpack::{ensure_layer_sources, LocalPack, OrientationTag};

/// Reads a pack's layer textures and builds the immutable asset descriptor.
///
/// Layer bytes are leaked to `'static`: assets are constructed once at
/// startup and live for the program's duration, the same ownership shape the
/// firmware gets from flash-resident layer data.
pub fn bind_pack(pack: &LocalPack) -> Result<SdfAsset> {
    let manifest = pack.manifest();
    let layer_paths = ensure_layer_sources(pack)
        .with_context(|| format!("asset pack {} is incomplete", pack.root().display()))?;

    let mut layers = Vec::with_capacity(layer_paths.len());
    let mut shades = Vec::with_capacity(layer_paths.len());
    for (path, entry) in layer_paths.iter().zip(&manifest.layers) {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read layer texture {}", path.display()))?;
        layers.push(SdfLayer::new(Box::leak(bytes.into_boxed_slice())));
        shades.push(entry.shade);
    }

    let asset = SdfAsset::new(AssetSpec {
        layers,
        shades,
        width: manifest.width,
        height: manifest.height,
        scale: manifest.scale,
        focus: (manifest.focus[0], manifest.focus[1]),
        variant: RasterVariant {
            orientation: map_orientation(manifest.orientation),
            inverted: manifest.inverted,
        },
        mapped_memory: manifest.mapped_memory,
        alpha_mask: manifest.alpha_mask,
    })
    .with_context(|| format!("asset pack {} is not renderable", pack.root().display()))?;
    Ok(asset)
}

fn map_orientation(tag: OrientationTag) -> Orientation {
    match tag {
        OrientationTag::Identity => Orientation::Identity,
        OrientationTag::Cw => Orientation::Rot90Cw,
        OrientationTag::Ccw => Orientation::Rot90Ccw,
        OrientationTag::Flip => Orientation::Rot180,
    }
}
