use thiserror::Error;

/// Layer counts the pipeline accepts.
pub const SUPPORTED_LAYER_COUNTS: [usize; 2] = [16, 32];

/// Immutable reference to one JPEG-compressed distance-field texture.
///
/// Layer bytes are borrowed from storage (baked firmware data, or pack
/// buffers loaded once at startup) for the program's lifetime and are never
/// copied; the decoder reads them in place.
#[derive(Debug, Clone, Copy)]
pub struct SdfLayer {
    bytes: &'static [u8],
}

impl SdfLayer {
    pub const fn new(bytes: &'static [u8]) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &'static [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The four fixed 90°-rotation/mirroring remaps a layer can be sampled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Identity,
    Rot90Cw,
    Rot90Ccw,
    Rot180,
}

/// Shading variant selected once at asset construction.
///
/// The closed set of orientation × inversion combinations replaces per-asset
/// function pointers: the rasterizer switches on the tag and the compiler
/// specializes each arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterVariant {
    pub orientation: Orientation,
    pub inverted: bool,
}

impl Default for RasterVariant {
    fn default() -> Self {
        Self {
            orientation: Orientation::Identity,
            inverted: false,
        }
    }
}

/// Everything needed to construct an [`SdfAsset`].
#[derive(Debug, Clone)]
pub struct AssetSpec {
    pub layers: Vec<SdfLayer>,
    /// Target shade per layer, parallel to `layers`.
    pub shades: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub scale: f32,
    /// Normalized focus point as an (x, y) fraction of width/height.
    pub focus: (f32, f32),
    pub variant: RasterVariant,
    /// Layer bytes live in external mapped memory; decodes must wait for the
    /// region's read mapping.
    pub mapped_memory: bool,
    /// Layer 0 is reserved as an alpha-mask source rather than a color slice.
    pub alpha_mask: bool,
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset declares {layers} layers but {shades} shades")]
    ShadeMismatch { layers: usize, shades: usize },

    #[error("asset must hold 16 or 32 layers, got {0}")]
    UnsupportedLayerCount(usize),

    #[error("asset dimensions must be nonzero, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("asset scale must be positive, got {0}")]
    InvalidScale(f32),

    #[error("focus point {0:?} lies outside [0, 1]")]
    FocusOutOfRange((f32, f32)),

    #[error("layer {0} holds no compressed bytes")]
    EmptyLayer(usize),
}

/// Immutable description of one multi-layer SDF art asset.
///
/// Constructed once at startup and shared by every render instance; all
/// per-pass mutability lives in [`RenderState`](crate::RenderState).
#[derive(Debug, Clone)]
pub struct SdfAsset {
    layers: Vec<SdfLayer>,
    shades: Vec<u8>,
    width: u32,
    height: u32,
    scale: f32,
    focus: (f32, f32),
    variant: RasterVariant,
    mapped_memory: bool,
    alpha_mask: bool,
}

impl SdfAsset {
    pub fn new(spec: AssetSpec) -> Result<Self, AssetError> {
        if spec.layers.len() != spec.shades.len() {
            return Err(AssetError::ShadeMismatch {
                layers: spec.layers.len(),
                shades: spec.shades.len(),
            });
        }
        if !SUPPORTED_LAYER_COUNTS.contains(&spec.layers.len()) {
            return Err(AssetError::UnsupportedLayerCount(spec.layers.len()));
        }
        if spec.width == 0 || spec.height == 0 {
            return Err(AssetError::ZeroDimension {
                width: spec.width,
                height: spec.height,
            });
        }
        if !(spec.scale > 0.0) {
            return Err(AssetError::InvalidScale(spec.scale));
        }
        let (fx, fy) = spec.focus;
        if !(0.0..=1.0).contains(&fx) || !(0.0..=1.0).contains(&fy) {
            return Err(AssetError::FocusOutOfRange(spec.focus));
        }
        if let Some(index) = spec.layers.iter().position(SdfLayer::is_empty) {
            return Err(AssetError::EmptyLayer(index));
        }

        Ok(Self {
            layers: spec.layers,
            shades: spec.shades,
            width: spec.width,
            height: spec.height,
            scale: spec.scale,
            focus: spec.focus,
            variant: spec.variant,
            mapped_memory: spec.mapped_memory,
            alpha_mask: spec.alpha_mask,
        })
    }

    pub fn layer(&self, index: usize) -> SdfLayer {
        self.layers[index]
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Target shade layer `index` blends the composite toward.
    pub fn shade(&self, index: usize) -> u8 {
        self.shades[index]
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn focus(&self) -> (f32, f32) {
        self.focus
    }

    pub fn variant(&self) -> RasterVariant {
        self.variant
    }

    pub fn mapped_memory(&self) -> bool {
        self.mapped_memory
    }

    pub fn alpha_mask(&self) -> bool {
        self.alpha_mask
    }

    /// Index of the first color layer: 1 when layer 0 is a reserved mask.
    pub fn first_color_layer(&self) -> usize {
        usize::from(self.alpha_mask)
    }
}
