//! Scripted collaborators shared by the pipeline's unit tests.

use std::collections::VecDeque;

use crate::asset::{AssetSpec, RasterVariant, SdfAsset, SdfLayer};
use crate::decode::{BackendError, BackendPoll, DecodeBackend, MapPoll, MappedMemory};
use crate::raster::DistanceField;

pub(crate) const TEST_LAYER_BYTES: &[u8] = &[0xAA, 0xBB, 0xCC, 0xDD];

/// One scripted response to a backend poll.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PollStep {
    Busy,
    /// Complete the job, filling the field plane with the given texel.
    Done(u8),
    Failed,
}

/// Decode backend that replays a scripted poll sequence, then repeats a
/// fallback response forever.
pub(crate) struct ScriptedBackend {
    steps: VecDeque<PollStep>,
    fallback: PollStep,
    job_open: bool,
}

impl ScriptedBackend {
    pub(crate) fn new(steps: impl IntoIterator<Item = PollStep>, fallback: PollStep) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            fallback,
            job_open: false,
        }
    }

    pub(crate) fn always_done(fill: u8) -> Self {
        Self::new([], PollStep::Done(fill))
    }

    pub(crate) fn always_busy() -> Self {
        Self::new([], PollStep::Busy)
    }

    pub(crate) fn always_failed() -> Self {
        Self::new([], PollStep::Failed)
    }
}

impl DecodeBackend for ScriptedBackend {
    fn start(&mut self, _bytes: &'static [u8]) -> Result<(), BackendError> {
        self.job_open = true;
        Ok(())
    }

    fn poll(&mut self, out: &mut DistanceField) -> BackendPoll {
        if !self.job_open {
            return BackendPoll::Busy;
        }
        let step = self.steps.pop_front().unwrap_or(self.fallback);
        match step {
            PollStep::Busy => BackendPoll::Busy,
            PollStep::Done(fill) => {
                out.fill(fill);
                self.job_open = false;
                BackendPoll::Done
            }
            PollStep::Failed => {
                self.job_open = false;
                BackendPoll::Failed
            }
        }
    }

    fn abort(&mut self) {
        self.job_open = false;
    }
}

/// Mapped region replaying a scripted readiness sequence, then `Ready`.
pub(crate) struct ScriptedMapped {
    steps: VecDeque<MapPoll>,
}

impl ScriptedMapped {
    pub(crate) fn new(steps: impl IntoIterator<Item = MapPoll>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }
}

impl MappedMemory for ScriptedMapped {
    fn ensure_mapped(&mut self) -> MapPoll {
        self.steps.pop_front().unwrap_or(MapPoll::Ready)
    }
}

/// Builds a small asset whose layer bytes only matter to scripted backends.
pub(crate) fn test_asset(layer_count: usize, alpha_mask: bool) -> SdfAsset {
    SdfAsset::new(AssetSpec {
        layers: vec![SdfLayer::new(TEST_LAYER_BYTES); layer_count],
        shades: (0..layer_count)
            .map(|i| (i * 255 / layer_count.max(1)) as u8)
            .collect(),
        width: 16,
        height: 16,
        scale: 1.0,
        focus: (0.5, 0.5),
        variant: RasterVariant::default(),
        mapped_memory: false,
        alpha_mask,
    })
    .expect("test asset spec is valid")
}
