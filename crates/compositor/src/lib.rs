//! Compositing core for the fieldframe art display.
//!
//! The crate turns multi-layer signed-distance-field assets into smoothly
//! presented 8bpp frames while a single shared JPEG decoder feeds it one
//! layer at a time. The overall flow is:
//!
//! ```text
//!   fieldframe daemon
//!          │ PresenterConfig + SdfAssets
//!          ▼
//!   Presenter::tick ──▶ RenderState::advance ──▶ DecodeService ──▶ backend
//!          │                     │
//!          │                     └─▶ rasterize_layer() ─▶ working Frame
//!          └─▶ FrameSet rotation + blend ─▶ PresentSink
//! ```
//!
//! Everything is single-threaded and poll-driven: each [`Presenter::tick`]
//! performs at most one state-machine step, every step that cannot progress
//! returns to the caller for a retry on the next tick, and nothing in the
//! render path blocks. A full composite takes one tick per layer; the
//! presenter hides that latency by cross-fading between the last two
//! completed composites while the next one renders.

pub mod asset;
pub mod clock;
pub mod decode;
pub mod layers;
pub mod present;
pub mod raster;
pub mod types;

#[cfg(test)]
mod testutil;

pub use asset::{
    AssetError, AssetSpec, Orientation, RasterVariant, SdfAsset, SdfLayer, SUPPORTED_LAYER_COUNTS,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use decode::{
    AlwaysMapped, BackendError, BackendPoll, DecodeBackend, DecodePoll, DecodeService, MapPoll,
    MappedMemory, SessionId, SoftwareJpegBackend, DECODE_TIMEOUT_MS,
};
pub use layers::{MaskPolicy, RenderState, RenderStatus, StepOutcome};
pub use present::{
    CamMode, Camera, CameraConfig, CameraEvent, FrameSet, NullSink, PresentError, PresentSink,
    Presenter, PresenterConfig, TickReport,
};
pub use raster::{
    accumulate_mask, composite_masked, dist_val, dist_val_inverted, rasterize_layer, smooth_step,
    DistanceField, LayerParams, FIELD_SIZE, FIELD_TEXELS, SDF_RANGE,
};
pub use types::{blend_frames, Frame, RasterRect};
