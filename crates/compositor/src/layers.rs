//! Per-asset render state machine.
//!
//! One [`RenderState`] advances an asset through "decode layer N, rasterize
//! layer N, move on" until every layer has landed in the working frame. Each
//! [`advance`](RenderState::advance) call is one tick's worth of progress and
//! never blocks: a busy decoder or an unfinished transfer simply returns
//! [`StepOutcome::InProgress`] and the caller tries again next tick.
//!
//! When a poll observes the decode buffer ready, the machine rasterizes in
//! the same call instead of deferring to the next tick: the shared buffer
//! belongs to the next session the moment this call returns. For the same
//! reason the next layer's decode is issued immediately after rasterization,
//! overlapping hardware latency with the wait for the next tick.

use tracing::{debug, trace};

use crate::asset::SdfAsset;
use crate::clock::Clock;
use crate::decode::{DecodePoll, DecodeService, SessionId};
use crate::raster::{self, LayerParams};
use crate::types::{Frame, RasterRect};

/// Outer pass status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// No pass in flight; the next advance starts one from layer zero.
    Unloaded,
    /// A pass is consuming layers.
    Pending,
    /// The working frame holds a finished composite; stable until the caller
    /// forces [`Unloaded`](RenderStatus::Unloaded) through
    /// [`RenderState::reset`].
    Rendered,
}

/// Sub-status of the layer currently being consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayerPhase {
    CompressedUnloaded,
    CompressedPending,
    UncompressedLoaded,
}

/// What one tick of advancement produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    InProgress,
    /// The pass finished this tick; reported exactly once per pass.
    Completed,
    /// The current layer's decode died; the layer restarts from its
    /// compressed bytes on a later tick.
    Failed,
}

/// Whether a reserved alpha-mask layer participates in the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskPolicy {
    /// Skip the reserved layer entirely; color layers start at index 1.
    Skip,
    /// Decode the reserved layer into an opacity plane and scale the
    /// finished composite by it.
    Composite,
}

/// Mutable per-instance state for compositing one asset.
#[derive(Debug)]
pub struct RenderState {
    status: RenderStatus,
    phase: LayerPhase,
    layer_index: usize,
    session: Option<SessionId>,
    last_shade: u8,
    params: Vec<LayerParams>,
    rect: RasterRect,
    mask_policy: MaskPolicy,
}

impl RenderState {
    pub fn new(asset: &SdfAsset, rect: RasterRect) -> Self {
        Self {
            status: RenderStatus::Unloaded,
            phase: LayerPhase::CompressedUnloaded,
            layer_index: 0,
            session: None,
            last_shade: 0,
            params: vec![LayerParams::default(); asset.layer_count()],
            rect,
            mask_policy: MaskPolicy::Skip,
        }
    }

    /// Opts the state into alpha-mask compositing for reserved-mask assets.
    pub fn with_mask_compositing(mut self) -> Self {
        self.mask_policy = MaskPolicy::Composite;
        self
    }

    pub fn set_mask_policy(&mut self, policy: MaskPolicy) {
        self.mask_policy = policy;
    }

    pub fn status(&self) -> RenderStatus {
        self.status
    }

    pub fn is_rendered(&self) -> bool {
        self.status == RenderStatus::Rendered
    }

    /// Index of the next layer to consume; equals the asset's layer count
    /// once a pass has completed.
    pub fn layer_index(&self) -> usize {
        self.layer_index
    }

    pub fn last_shade(&self) -> u8 {
        self.last_shade
    }

    pub fn rect(&self) -> &RasterRect {
        &self.rect
    }

    /// Per-layer parallax/fade parameters applied at rasterization time.
    pub fn params_mut(&mut self) -> &mut [LayerParams] {
        &mut self.params
    }

    /// Forces the next advance to start a fresh pass with a new output
    /// rectangle. Also the reconfiguration entry point for zoom, viewport,
    /// and asset changes.
    pub fn reset(&mut self, rect: RasterRect) {
        self.status = RenderStatus::Unloaded;
        self.phase = LayerPhase::CompressedUnloaded;
        self.layer_index = 0;
        self.session = None;
        self.last_shade = 0;
        self.rect = rect;
    }

    /// Re-sizes the parameter table when the state is re-targeted at a
    /// different asset.
    pub fn retarget(&mut self, asset: &SdfAsset, rect: RasterRect) {
        self.params = vec![LayerParams::default(); asset.layer_count()];
        self.reset(rect);
    }

    /// Advances the pass by one tick.
    ///
    /// `color` is the working frame this pass composites into; `mask` is the
    /// opacity plane used by reserved-alpha-mask assets. Both are owned by
    /// the presentation layer and must keep their sizes across a pass.
    pub fn advance(
        &mut self,
        asset: &SdfAsset,
        decoder: &mut DecodeService,
        clock: &dyn Clock,
        color: &mut Frame,
        mask: &mut Frame,
    ) -> StepOutcome {
        match self.status {
            RenderStatus::Rendered => return StepOutcome::InProgress,
            RenderStatus::Unloaded => {
                self.layer_index = self.initial_layer(asset);
                self.last_shade = 0;
                self.session = None;
                color.clear();
                if asset.alpha_mask() {
                    mask.clear();
                }
                self.status = RenderStatus::Pending;
                self.phase = LayerPhase::CompressedUnloaded;
                trace!(first_layer = self.layer_index, "pass started");
            }
            RenderStatus::Pending => {}
        }

        // Sub-transitions chain within one call where the shared decode
        // buffer forces it; every exit from the loop is a return.
        loop {
            match self.phase {
                LayerPhase::CompressedUnloaded => {
                    let layer = asset.layer(self.layer_index);
                    match decoder.start_decode(layer.bytes(), asset.mapped_memory(), clock) {
                        Some(session) => {
                            self.session = Some(session);
                            self.phase = LayerPhase::CompressedPending;
                        }
                        None => return StepOutcome::InProgress,
                    }
                }
                LayerPhase::CompressedPending => {
                    let Some(session) = self.session else {
                        self.phase = LayerPhase::CompressedUnloaded;
                        continue;
                    };
                    match decoder.poll(session, clock) {
                        DecodePoll::NotReady => return StepOutcome::InProgress,
                        DecodePoll::TimedOut => {
                            debug!(layer = self.layer_index, "layer decode died, will retry");
                            self.session = None;
                            self.phase = LayerPhase::CompressedUnloaded;
                            return StepOutcome::Failed;
                        }
                        DecodePoll::Ready => {
                            self.session = None;
                            self.phase = LayerPhase::UncompressedLoaded;
                        }
                    }
                }
                LayerPhase::UncompressedLoaded => {
                    self.consume_decoded(asset, decoder, color, mask);
                    self.layer_index += 1;

                    if self.layer_index >= asset.layer_count() {
                        if self.applies_mask(asset) {
                            raster::composite_masked(color, mask);
                        }
                        self.status = RenderStatus::Rendered;
                        self.phase = LayerPhase::CompressedUnloaded;
                        debug!(layers = self.layer_index, "pass complete");
                        return StepOutcome::Completed;
                    }

                    self.phase = LayerPhase::CompressedUnloaded;
                    // Issue the next layer's decode now; its completion is
                    // observed on the next tick.
                    let layer = asset.layer(self.layer_index);
                    if let Some(session) =
                        decoder.start_decode(layer.bytes(), asset.mapped_memory(), clock)
                    {
                        self.session = Some(session);
                        self.phase = LayerPhase::CompressedPending;
                    }
                    return StepOutcome::InProgress;
                }
            }
        }
    }

    fn consume_decoded(
        &mut self,
        asset: &SdfAsset,
        decoder: &DecodeService,
        color: &mut Frame,
        mask: &mut Frame,
    ) {
        let field = decoder.decoded();
        if asset.alpha_mask() && self.layer_index == 0 {
            raster::accumulate_mask(field, &self.rect, asset.variant(), mask);
            return;
        }
        let target = asset.shade(self.layer_index);
        raster::rasterize_layer(
            field,
            &self.rect,
            asset.variant(),
            self.params[self.layer_index],
            self.last_shade,
            target,
            color,
        );
        self.last_shade = target;
    }

    fn initial_layer(&self, asset: &SdfAsset) -> usize {
        match self.mask_policy {
            MaskPolicy::Skip => asset.first_color_layer(),
            MaskPolicy::Composite => 0,
        }
    }

    fn applies_mask(&self, asset: &SdfAsset) -> bool {
        asset.alpha_mask() && self.mask_policy == MaskPolicy::Composite
    }
}
