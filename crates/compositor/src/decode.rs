//! JPEG decode service owning the single shared decoder.
//!
//! One session may be open system-wide: callers claim the decoder with
//! [`DecodeService::start_decode`], poll it once per tick, and must consume
//! the shared decompression buffer in the same call that observes
//! [`DecodePoll::Ready`], since the buffer is overwritten by the next
//! accepted start. Timeouts abort the hardware operation and release
//! ownership;
//! recovery is the caller restarting the layer from scratch.

use std::num::NonZeroU32;

use thiserror::Error;
use tracing::{trace, warn};

use crate::clock::Clock;
use crate::raster::{DistanceField, FIELD_SIZE};

/// How long one decode may run before it is aborted.
pub const DECODE_TIMEOUT_MS: u64 = 30_000;

/// Identifies one open decode session. Absent whenever the decoder is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(NonZeroU32);

impl SessionId {
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// Resolution of one [`DecodeService::poll`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePoll {
    /// No resolution yet, or the session id is stale; retry next tick.
    NotReady,
    /// The shared buffer holds the decoded field; ownership is released.
    Ready,
    /// The operation was aborted; the session is gone and the layer must be
    /// restarted from its compressed bytes.
    TimedOut,
}

/// Progress report from the decoder hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendPoll {
    Busy,
    Done,
    Failed,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("decoder accepted no job: {0}")]
    Rejected(String),
}

/// Hardware decoder abstraction.
///
/// `start` latches a job; a later `poll` writes the decoded 128×128 field
/// into `out` when the transfer completes. Layer bytes are `'static` because
/// the hardware reads the storage region in place for the whole transfer.
pub trait DecodeBackend {
    fn start(&mut self, bytes: &'static [u8]) -> Result<(), BackendError>;
    fn poll(&mut self, out: &mut DistanceField) -> BackendPoll;
    fn abort(&mut self);
}

/// Readiness of an externally mapped storage region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapPoll {
    Ready,
    Busy,
    Failed,
}

/// Byte-addressable storage region that must be switched into its read
/// mapping before the decoder may stream from it.
pub trait MappedMemory {
    fn ensure_mapped(&mut self) -> MapPoll;
}

/// Region that is always readable: on-chip storage, or host memory in the
/// simulator.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysMapped;

impl MappedMemory for AlwaysMapped {
    fn ensure_mapped(&mut self) -> MapPoll {
        MapPoll::Ready
    }
}

/// Software decode backend for host-side runs.
///
/// Decoding happens on the poll after `start`, modeling the one-tick latency
/// of the DMA transfer the firmware sees.
#[derive(Debug, Default)]
pub struct SoftwareJpegBackend {
    job: Option<&'static [u8]>,
}

impl SoftwareJpegBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DecodeBackend for SoftwareJpegBackend {
    fn start(&mut self, bytes: &'static [u8]) -> Result<(), BackendError> {
        if self.job.is_some() {
            return Err(BackendError::Rejected("job already latched".into()));
        }
        self.job = Some(bytes);
        Ok(())
    }

    fn poll(&mut self, out: &mut DistanceField) -> BackendPoll {
        let Some(bytes) = self.job.take() else {
            return BackendPoll::Busy;
        };
        let decoded = match image::load_from_memory_with_format(bytes, image::ImageFormat::Jpeg) {
            Ok(decoded) => decoded.to_luma8(),
            Err(err) => {
                warn!(error = %err, "jpeg decode failed");
                return BackendPoll::Failed;
            }
        };
        if decoded.dimensions() != (FIELD_SIZE as u32, FIELD_SIZE as u32) {
            warn!(
                width = decoded.width(),
                height = decoded.height(),
                "layer texture is not {FIELD_SIZE}x{FIELD_SIZE}"
            );
            return BackendPoll::Failed;
        }
        out.fill_from(decoded.as_raw());
        BackendPoll::Done
    }

    fn abort(&mut self) {
        self.job = None;
    }
}

/// Owns the decoder hardware and the single shared decompression buffer.
pub struct DecodeService {
    backend: Box<dyn DecodeBackend>,
    mapped: Box<dyn MappedMemory>,
    owner: Option<SessionId>,
    started_at_ms: u64,
    next_id: u32,
    field: DistanceField,
}

impl DecodeService {
    pub fn new(
        backend: impl DecodeBackend + 'static,
        mapped: impl MappedMemory + 'static,
    ) -> Self {
        Self {
            backend: Box::new(backend),
            mapped: Box::new(mapped),
            owner: None,
            started_at_ms: 0,
            next_id: 0,
            field: DistanceField::new(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.owner.is_none()
    }

    /// The shared decompression buffer.
    ///
    /// Valid only in the call frame that observed [`DecodePoll::Ready`]; the
    /// next accepted [`start_decode`](Self::start_decode) overwrites it.
    pub fn decoded(&self) -> &DistanceField {
        &self.field
    }

    /// Claims the decoder for one layer's compressed bytes.
    ///
    /// Returns `None` when the decoder is owned by a live session, the
    /// mapped region is not readable yet, or the hardware rejects the job;
    /// callers retry on a later tick.
    pub fn start_decode(
        &mut self,
        bytes: &'static [u8],
        mapped_memory: bool,
        clock: &dyn Clock,
    ) -> Option<SessionId> {
        let now = clock.now_ms();
        if let Some(owner) = self.owner {
            // An abandoned session would otherwise pin the decoder forever;
            // expire it once its timeout window has passed.
            if now.saturating_sub(self.started_at_ms) < DECODE_TIMEOUT_MS {
                trace!(owner = owner.get(), "decoder busy");
                return None;
            }
            warn!(owner = owner.get(), "expiring stale decode session");
            self.backend.abort();
            self.owner = None;
        }

        if mapped_memory {
            match self.mapped.ensure_mapped() {
                MapPoll::Ready => {}
                MapPoll::Busy => {
                    trace!("mapped region busy, decode deferred");
                    return None;
                }
                MapPoll::Failed => {
                    warn!("mapped region failed to activate");
                    return None;
                }
            }
        }

        if let Err(err) = self.backend.start(bytes) {
            warn!(error = %err, "decoder rejected job");
            return None;
        }

        let session = self.allocate_session();
        self.owner = Some(session);
        self.started_at_ms = now;
        trace!(session = session.get(), len = bytes.len(), "decode started");
        Some(session)
    }

    /// Polls the session for completion.
    ///
    /// `Ready` and `TimedOut` both release ownership; `Ready` is returned
    /// exactly once per session and leaves the decoded field in
    /// [`decoded`](Self::decoded).
    pub fn poll(&mut self, session: SessionId, clock: &dyn Clock) -> DecodePoll {
        if self.owner != Some(session) {
            return DecodePoll::NotReady;
        }

        let now = clock.now_ms();
        if now.saturating_sub(self.started_at_ms) >= DECODE_TIMEOUT_MS {
            warn!(session = session.get(), "decode timed out, aborting");
            self.backend.abort();
            self.owner = None;
            return DecodePoll::TimedOut;
        }

        match self.backend.poll(&mut self.field) {
            BackendPoll::Busy => DecodePoll::NotReady,
            BackendPoll::Done => {
                trace!(session = session.get(), "decode complete");
                self.owner = None;
                DecodePoll::Ready
            }
            BackendPoll::Failed => {
                // Hard hardware errors surface exactly like a timeout: the
                // session dies and the layer restarts from compressed bytes.
                warn!(session = session.get(), "decode failed, releasing session");
                self.backend.abort();
                self.owner = None;
                DecodePoll::TimedOut
            }
        }
    }

    fn allocate_session(&mut self) -> SessionId {
        self.next_id = self.next_id.wrapping_add(1);
        if self.next_id == 0 {
            self.next_id = 1;
        }
        SessionId(NonZeroU32::new(self.next_id).unwrap_or(NonZeroU32::MIN))
    }
}

impl std::fmt::Debug for DecodeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeService")
            .field("owner", &self.owner)
            .field("started_at_ms", &self.started_at_ms)
            .field("next_id", &self.next_id)
            .finish()
    }
}
