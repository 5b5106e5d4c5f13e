//! Presentation scheduling over the layer state machine.
//!
//! A [`Presenter`] is ticked at a fixed rate by the caller and hides the
//! multi-tick latency of a compositing pass behind three rotating frames:
//! the pass rasterizes into `working`, the freshest finished composite sits
//! in `next`, and `current` holds the one before it. Every tick presents a
//! linear blend from `current` toward `next`, paced by how long the previous
//! pass actually took, so the display keeps moving even though a full
//! composite only lands every several ticks. When a pass completes the roles
//! rotate and the blend starts over toward the new composite.
//!
//! A camera drives what each pass renders: it pans the viewport vertically
//! across the asset, then zooms the output rectangle out and back in, and
//! asks for the next asset each time the zoom returns to its minimum.

use thiserror::Error;
use tracing::{debug, info, warn};

use scheduler::AssetRota;

use crate::asset::SdfAsset;
use crate::clock::Clock;
use crate::decode::DecodeService;
use crate::layers::{MaskPolicy, RenderState, RenderStatus, StepOutcome};
use crate::raster::smooth_step;
use crate::types::{Frame, RasterRect};

/// Receives the pipeline's presentable output once per tick.
///
/// `present` delivers a settled frame; `present_blend` delivers a pair of
/// frames plus a factor in [0, 1], 0 showing `from` and 1 showing `to`.
pub trait PresentSink {
    fn present(&mut self, frame: &Frame);
    fn present_blend(&mut self, from: &Frame, to: &Frame, t: f32);
}

/// Sink that drops every frame, for headless runs and benchmarks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PresentSink for NullSink {
    fn present(&mut self, _frame: &Frame) {}
    fn present_blend(&mut self, _from: &Frame, _to: &Frame, _t: f32) {}
}

/// Three equally sized frames cycling through the working/next/current roles.
///
/// Role reassignment is a single 3-cycle applied at pass completion; the
/// underlying buffers never move or alias.
#[derive(Debug)]
pub struct FrameSet {
    frames: [Frame; 3],
    working: usize,
    next: usize,
    current: usize,
}

impl FrameSet {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frames: [
                Frame::new(width, height),
                Frame::new(width, height),
                Frame::new(width, height),
            ],
            working: 0,
            next: 1,
            current: 2,
        }
    }

    /// Frame the in-flight pass rasterizes into.
    pub fn working(&self) -> &Frame {
        &self.frames[self.working]
    }

    pub fn working_mut(&mut self) -> &mut Frame {
        &mut self.frames[self.working]
    }

    /// Most recently completed composite; the blend target.
    pub fn next(&self) -> &Frame {
        &self.frames[self.next]
    }

    /// Composite completed before [`next`](Self::next); the blend source.
    pub fn current(&self) -> &Frame {
        &self.frames[self.current]
    }

    /// Role indices, for asserting the permutation invariant.
    pub fn roles(&self) -> (usize, usize, usize) {
        (self.working, self.next, self.current)
    }

    /// Rotates roles at pass completion: the finished `working` frame becomes
    /// `next`, the old `next` settles into `current`, and the retired
    /// `current` is recycled as the new `working` target.
    pub fn rotate(&mut self) {
        let retired = self.current;
        self.current = self.next;
        self.next = self.working;
        self.working = retired;
    }
}

/// What the camera is currently animating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CamMode {
    Panning,
    Zooming,
}

/// Timing of the camera's pan and zoom sweeps.
#[derive(Debug, Clone, Copy)]
pub struct CameraConfig {
    /// Duration of the upward pan sweep.
    pub pan_up_ms: u64,
    /// Duration of the downward pan sweep; shorter than up by default.
    pub pan_down_ms: u64,
    /// Duration of one zoom half-sweep (min to max, or back).
    pub zoom_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            pan_up_ms: 8_000,
            pan_down_ms: 3_000,
            zoom_ms: 5_000,
        }
    }
}

/// Raised by [`Camera::advance`] when a sweep boundary was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraEvent {
    /// The zoom returned to minimum width; time to rotate assets.
    SelectNextAsset,
}

/// Pan/zoom state shaping the output rectangle of each pass.
///
/// Panning eases a vertical offset down across the content and back up,
/// flipping to zooming when it returns to the top. Zooming eases the output
/// width from the viewport width out to double and back, emitting
/// [`CameraEvent::SelectNextAsset`] at minimum width before panning resumes.
#[derive(Debug)]
pub struct Camera {
    viewport: (u32, u32),
    config: CameraConfig,
    mode: CamMode,
    pan_phase: f32,
    pan_descending: bool,
    zoom_phase: f32,
    zoom_expanding: bool,
}

impl Camera {
    pub fn new(viewport: (u32, u32), config: CameraConfig) -> Self {
        Self {
            viewport,
            config,
            mode: CamMode::Panning,
            pan_phase: 0.0,
            pan_descending: true,
            zoom_phase: 0.0,
            zoom_expanding: true,
        }
    }

    pub fn mode(&self) -> CamMode {
        self.mode
    }

    /// Advances the active sweep by `dt_ms`.
    pub fn advance(&mut self, dt_ms: u64) -> Option<CameraEvent> {
        if dt_ms == 0 {
            return None;
        }
        match self.mode {
            CamMode::Panning => {
                if self.pan_descending {
                    self.pan_phase += phase_step(dt_ms, self.config.pan_down_ms);
                    if self.pan_phase >= 1.0 {
                        self.pan_phase = 1.0;
                        self.pan_descending = false;
                    }
                } else {
                    self.pan_phase -= phase_step(dt_ms, self.config.pan_up_ms);
                    if self.pan_phase <= 0.0 {
                        self.pan_phase = 0.0;
                        self.pan_descending = true;
                        self.mode = CamMode::Zooming;
                        self.zoom_expanding = true;
                    }
                }
                None
            }
            CamMode::Zooming => {
                if self.zoom_expanding {
                    self.zoom_phase += phase_step(dt_ms, self.config.zoom_ms);
                    if self.zoom_phase >= 1.0 {
                        self.zoom_phase = 1.0;
                        self.zoom_expanding = false;
                    }
                    None
                } else {
                    self.zoom_phase -= phase_step(dt_ms, self.config.zoom_ms);
                    if self.zoom_phase <= 0.0 {
                        self.zoom_phase = 0.0;
                        self.zoom_expanding = true;
                        self.mode = CamMode::Panning;
                        Some(CameraEvent::SelectNextAsset)
                    } else {
                        None
                    }
                }
            }
        }
    }

    /// Output rectangle for a pass over `asset`, sampled from the current
    /// sweep positions.
    ///
    /// The zoom widens the content from viewport width up to double; the
    /// asset's focus point keeps the widened content anchored horizontally.
    /// The pan slides the viewport down the content when it is taller than
    /// the screen; shorter content is centered instead.
    pub fn rect(&self, asset: &SdfAsset) -> RasterRect {
        let (vw, vh) = (self.viewport.0 as f32, self.viewport.1 as f32);
        let zoom = 1.0 + smooth_step(0.0, 1.0, self.zoom_phase);
        let content_w = (vw * zoom * asset.scale()).max(1.0);
        let content_h = (content_w * asset.height() as f32 / asset.width() as f32).max(1.0);
        let (fx, _) = asset.focus();

        let x = if content_w > vw {
            -(fx * (content_w - vw))
        } else {
            (vw - content_w) * 0.5
        };

        let pan_range = (content_h - vh).max(0.0);
        let y = if pan_range > 0.0 {
            -(smooth_step(0.0, 1.0, self.pan_phase) * pan_range)
        } else {
            (vh - content_h) * 0.5
        };

        RasterRect::new(
            x.round() as i32,
            y.round() as i32,
            content_w.round() as u32,
            content_h.round() as u32,
        )
    }
}

fn phase_step(dt_ms: u64, sweep_ms: u64) -> f32 {
    dt_ms as f32 / sweep_ms.max(1) as f32
}

#[derive(Debug, Error)]
pub enum PresentError {
    #[error("presenter needs at least one asset")]
    NoAssets,
}

/// Static configuration of a [`Presenter`].
#[derive(Debug, Clone, Copy)]
pub struct PresenterConfig {
    /// Display width in pixels.
    pub width: u32,
    /// Display height in pixels.
    pub height: u32,
    pub camera: CameraConfig,
    /// Seed for the asset rotation policy.
    pub rotation_seed: u64,
    /// How reserved alpha-mask layers participate in passes.
    pub mask_policy: MaskPolicy,
}

impl PresenterConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            camera: CameraConfig::default(),
            rotation_seed: 0,
            mask_policy: MaskPolicy::Skip,
        }
    }
}

/// What one presenter tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub outcome: StepOutcome,
    /// Index of the asset the pipeline is compositing after this tick.
    pub active_asset: usize,
    /// The tick moved the pipeline onto a different rotation pick.
    pub asset_switched: bool,
    /// Blend factor of the presented output; 1.0 means fully settled on the
    /// freshest composite.
    pub blend: f32,
}

/// Owns the full compositing pipeline for one display.
///
/// Construct once at startup and call [`tick`](Self::tick) from a single
/// fixed-rate caller; every call performs at most one state-machine step and
/// exactly one presentation, and never blocks.
pub struct Presenter {
    assets: Vec<SdfAsset>,
    active: usize,
    rota: AssetRota,
    camera: Camera,
    frames: FrameSet,
    mask: Frame,
    state: RenderState,
    decoder: DecodeService,
    mask_policy: MaskPolicy,
    /// The camera asked for a new asset mid-pass; applied at the next pass
    /// boundary so an open decode session is never orphaned (the decode
    /// service has no cancel, only its timeout).
    pending_switch: bool,
    last_tick_ms: Option<u64>,
    pass_started_ms: Option<u64>,
    /// Measured duration of the last completed pass, the pacing estimate for
    /// the presentation blend.
    delta_render_total: u64,
    lerp_accumulated: u64,
}

impl Presenter {
    pub fn new(
        config: PresenterConfig,
        assets: Vec<SdfAsset>,
        decoder: DecodeService,
    ) -> Result<Self, PresentError> {
        let mut rota = AssetRota::new(assets.len(), config.rotation_seed)
            .map_err(|_| PresentError::NoAssets)?;
        let active = rota.next(0);
        let camera = Camera::new((config.width, config.height), config.camera);
        let rect = camera.rect(&assets[active]);
        let mut state = RenderState::new(&assets[active], rect);
        state.set_mask_policy(config.mask_policy);
        info!(
            assets = assets.len(),
            width = config.width,
            height = config.height,
            first = active,
            "presenter ready"
        );
        Ok(Self {
            assets,
            active,
            rota,
            camera,
            frames: FrameSet::new(config.width, config.height),
            mask: Frame::new(config.width, config.height),
            state,
            decoder,
            mask_policy: config.mask_policy,
            pending_switch: false,
            last_tick_ms: None,
            pass_started_ms: None,
            delta_render_total: 0,
            lerp_accumulated: 0,
        })
    }

    pub fn frames(&self) -> &FrameSet {
        &self.frames
    }

    pub fn active_asset(&self) -> usize {
        self.active
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn render_status(&self) -> RenderStatus {
        self.state.status()
    }

    /// Runs one tick: advances the camera, steps the layer state machine at
    /// most once, and presents through `sink`.
    ///
    /// A completed pass rotates the frame roles, presents the settled
    /// composite, and re-arms the next pass with a fresh camera-derived
    /// rectangle. A failed pass keeps presenting the stale blend and restarts
    /// on the next asset in the rotation. In-progress ticks present the paced
    /// blend from `current` toward `next`, clamped to fully-next when the
    /// pass overruns its estimate.
    pub fn tick(&mut self, clock: &dyn Clock, sink: &mut dyn PresentSink) -> TickReport {
        let now = clock.now_ms();
        let dt = self
            .last_tick_ms
            .map(|last| now.saturating_sub(last))
            .unwrap_or(0);
        self.last_tick_ms = Some(now);
        self.pass_started_ms.get_or_insert(now);

        if self.camera.advance(dt) == Some(CameraEvent::SelectNextAsset) {
            self.pending_switch = true;
        }

        let outcome = self.state.advance(
            &self.assets[self.active],
            &mut self.decoder,
            clock,
            &mut self.frames.frames[self.frames.working],
            &mut self.mask,
        );

        let mut switched = false;
        let blend = match outcome {
            StepOutcome::Completed => {
                let started = self.pass_started_ms.unwrap_or(now);
                self.delta_render_total = now.saturating_sub(started).max(1);
                self.frames.rotate();
                self.lerp_accumulated = 0;
                sink.present(self.frames.current());
                debug!(
                    asset = self.active,
                    pass_ms = self.delta_render_total,
                    "pass complete, rotated frames"
                );

                if self.pending_switch {
                    self.switch_asset(now);
                    switched = true;
                } else {
                    let rect = self.camera.rect(&self.assets[self.active]);
                    self.state.reset(rect);
                }
                self.pass_started_ms = Some(now);
                0.0
            }
            StepOutcome::Failed => {
                // The stale composite keeps showing; the pipeline moves on to
                // a different asset rather than hammering the dead layer.
                warn!(asset = self.active, "pass failed, rotating to next asset");
                self.switch_asset(now);
                switched = true;
                self.pass_started_ms = Some(now);
                let blend = self.current_blend();
                sink.present_blend(self.frames.current(), self.frames.next(), blend);
                blend
            }
            StepOutcome::InProgress => {
                self.lerp_accumulated += dt;
                let blend = self.current_blend();
                sink.present_blend(self.frames.current(), self.frames.next(), blend);
                blend
            }
        };

        TickReport {
            outcome,
            active_asset: self.active,
            asset_switched: switched,
            blend,
        }
    }

    /// Presentation blend factor, paced by the previous pass's measured
    /// duration and clamped so an overrunning pass settles on `next` instead
    /// of extrapolating past it.
    fn current_blend(&self) -> f32 {
        if self.delta_render_total == 0 {
            return 1.0;
        }
        (self.lerp_accumulated as f32 / self.delta_render_total as f32).clamp(0.0, 1.0)
    }

    fn switch_asset(&mut self, now_ms: u64) {
        let pick = self.rota.next(now_ms);
        let rect = self.camera.rect(&self.assets[pick]);
        debug!(from = self.active, to = pick, "asset rotation");
        self.active = pick;
        self.state.retarget(&self.assets[pick], rect);
        self.state.set_mask_policy(self.mask_policy);
        self.pending_switch = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::decode::{AlwaysMapped, DecodeService};
    use crate::testutil::{test_asset, PollStep, ScriptedBackend};
    use crate::types::blend_frames;

    const TICK_MS: u64 = 10;

    /// Sink that replays the blend on the side so tests can inspect the
    /// exact bytes a display would have received.
    #[derive(Debug)]
    struct CaptureSink {
        last: Frame,
        presents: usize,
        blends: usize,
        last_t: f32,
    }

    impl CaptureSink {
        fn new(width: u32, height: u32) -> Self {
            Self {
                last: Frame::new(width, height),
                presents: 0,
                blends: 0,
                last_t: 0.0,
            }
        }
    }

    impl PresentSink for CaptureSink {
        fn present(&mut self, frame: &Frame) {
            self.last = frame.clone();
            self.presents += 1;
        }

        fn present_blend(&mut self, from: &Frame, to: &Frame, t: f32) {
            let mut out = Frame::new(from.width(), from.height());
            blend_frames(from, to, t, &mut out);
            self.last = out;
            self.blends += 1;
            self.last_t = t;
        }
    }

    fn presenter(assets: Vec<crate::asset::SdfAsset>, backend: ScriptedBackend) -> Presenter {
        Presenter::new(
            PresenterConfig::new(16, 16),
            assets,
            DecodeService::new(backend, AlwaysMapped),
        )
        .expect("assets provided")
    }

    fn run_one_pass(
        presenter: &mut Presenter,
        clock: &ManualClock,
        sink: &mut CaptureSink,
    ) -> TickReport {
        for _ in 0..64 {
            clock.advance(TICK_MS);
            let report = presenter.tick(clock, sink);
            if report.outcome == StepOutcome::Completed {
                return report;
            }
        }
        panic!("pass never completed");
    }

    #[test]
    fn rotation_is_a_three_cycle_permutation() {
        let mut frames = FrameSet::new(4, 4);
        let mut seen_roles = Vec::new();
        for _ in 0..6 {
            let (w, n, c) = frames.roles();
            assert_ne!(w, n);
            assert_ne!(n, c);
            assert_ne!(w, c);
            let mut set = [w, n, c];
            set.sort_unstable();
            assert_eq!(set, [0, 1, 2], "roles must cover all three buffers");
            seen_roles.push((w, n, c));
            frames.rotate();
        }
        // A 3-cycle returns to the initial assignment after three rotations.
        assert_eq!(seen_roles[0], seen_roles[3]);
    }

    #[test]
    fn completed_pass_rotates_and_presents() {
        let clock = ManualClock::new();
        let mut sink = CaptureSink::new(16, 16);
        let mut p = presenter(vec![test_asset(16, false)], ScriptedBackend::always_done(200));

        let report = run_one_pass(&mut p, &clock, &mut sink);
        assert_eq!(report.outcome, StepOutcome::Completed);
        assert_eq!(sink.presents, 1);
        assert!(sink.blends >= 15, "in-progress ticks present blends");
        // The finished composite sits in `next`; `current` is still blank.
        assert!(p.frames().next().as_bytes().iter().any(|&b| b > 0));
        assert!(p.frames().current().as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn blend_paces_by_measured_pass_duration() {
        let clock = ManualClock::new();
        let mut sink = CaptureSink::new(16, 16);
        let mut p = presenter(vec![test_asset(16, false)], ScriptedBackend::always_done(200));

        run_one_pass(&mut p, &clock, &mut sink);
        // 16 ticks of 10ms, measured from the first tick: 150ms.
        assert_eq!(p.delta_render_total, 150);

        // 75ms into a 150ms estimate the blend is exactly halfway.
        for _ in 0..7 {
            clock.advance(TICK_MS);
            p.tick(&clock, &mut sink);
        }
        clock.advance(5);
        let report = p.tick(&clock, &mut sink);
        assert_eq!(report.outcome, StepOutcome::InProgress);
        assert!((report.blend - 0.5).abs() < 1e-6, "blend {}", report.blend);
    }

    #[test]
    fn overrun_clamps_to_fully_next() {
        let clock = ManualClock::new();
        let mut sink = CaptureSink::new(16, 16);
        // Second pass decodes stall forever, so presentation time overruns
        // the 150ms estimate from the first pass.
        let mut p = presenter(
            vec![test_asset(16, false)],
            ScriptedBackend::new(
                (0..16).map(|_| PollStep::Done(200)).collect::<Vec<_>>(),
                PollStep::Busy,
            ),
        );

        run_one_pass(&mut p, &clock, &mut sink);
        let settled = p.frames().next().clone();

        // 250ms of stalled ticks against a 150ms estimate.
        let mut last = None;
        for _ in 0..25 {
            clock.advance(TICK_MS);
            last = Some(p.tick(&clock, &mut sink));
        }
        let last = last.unwrap();
        assert_eq!(last.outcome, StepOutcome::InProgress);
        assert_eq!(last.blend, 1.0, "overrun must clamp, never extrapolate");
        assert_eq!(sink.last_t, 1.0);
        assert_eq!(sink.last.as_bytes(), settled.as_bytes());
    }

    #[test]
    fn failed_pass_keeps_stale_output_and_switches_asset() {
        let clock = ManualClock::new();
        let mut sink = CaptureSink::new(16, 16);
        // First pass succeeds; the next pass stays busy long enough for the
        // blend to settle, then its decode dies outright.
        let mut steps: Vec<PollStep> = (0..16).map(|_| PollStep::Done(200)).collect();
        steps.extend((0..15).map(|_| PollStep::Busy));
        let mut p = presenter(
            vec![test_asset(16, false), test_asset(16, false)],
            ScriptedBackend::new(steps, PollStep::Failed),
        );

        run_one_pass(&mut p, &clock, &mut sink);
        let before = p.active_asset();
        let settled = p.frames().next().clone();

        let mut failed_report = None;
        for _ in 0..30 {
            clock.advance(TICK_MS);
            let report = p.tick(&clock, &mut sink);
            if report.outcome == StepOutcome::Failed {
                failed_report = Some(report);
                break;
            }
        }
        let report = failed_report.expect("a decode failure must surface");
        assert!(report.asset_switched);
        assert_ne!(report.active_asset, before);
        // The display still shows the last good composite.
        assert_eq!(report.blend, 1.0);
        assert_eq!(sink.last.as_bytes(), settled.as_bytes());
    }

    #[test]
    fn camera_sweeps_pan_then_zoom_then_rotates_assets() {
        let config = CameraConfig {
            pan_up_ms: 400,
            pan_down_ms: 200,
            zoom_ms: 300,
        };
        let mut camera = Camera::new((100, 100), config);
        assert_eq!(camera.mode(), CamMode::Panning);

        // Down in one 200ms sweep, back up across two 200ms steps.
        assert_eq!(camera.advance(200), None);
        assert!(!camera.pan_descending);
        assert_eq!(camera.advance(200), None);
        assert_eq!(camera.mode(), CamMode::Panning);
        assert_eq!(camera.advance(200), None);
        assert_eq!(camera.mode(), CamMode::Zooming);

        // Out in 300ms, back in over two 150ms steps, then the rotation.
        assert_eq!(camera.advance(300), None);
        assert!(!camera.zoom_expanding);
        assert_eq!(camera.advance(150), None);
        assert_eq!(camera.advance(150), Some(CameraEvent::SelectNextAsset));
        assert_eq!(camera.mode(), CamMode::Panning);
    }

    #[test]
    fn camera_rect_tracks_pan_and_zoom() {
        let asset = crate::asset::SdfAsset::new(crate::asset::AssetSpec {
            layers: vec![crate::asset::SdfLayer::new(&[1, 2, 3, 4]); 16],
            shades: vec![128; 16],
            width: 100,
            height: 200,
            scale: 1.0,
            focus: (0.5, 0.5),
            variant: crate::asset::RasterVariant::default(),
            mapped_memory: false,
            alpha_mask: false,
        })
        .unwrap();
        let config = CameraConfig {
            pan_up_ms: 400,
            pan_down_ms: 200,
            zoom_ms: 300,
        };
        let mut camera = Camera::new((100, 100), config);

        // At rest: content at viewport width, panned to the top.
        let rect = camera.rect(&asset);
        assert_eq!((rect.x, rect.y), (0, 0));
        assert_eq!((rect.width, rect.height), (100, 200));

        // Fully panned down: offset equals content minus viewport height.
        camera.advance(200);
        let rect = camera.rect(&asset);
        assert_eq!(rect.y, -100);

        // Fully zoomed out: double width, anchored by the focus point.
        camera.advance(400);
        assert_eq!(camera.mode(), CamMode::Zooming);
        camera.advance(300);
        let rect = camera.rect(&asset);
        assert_eq!(rect.width, 200);
        assert_eq!(rect.x, -50);
    }

    #[test]
    fn single_asset_rotation_restarts_same_asset() {
        let clock = ManualClock::new();
        let mut sink = CaptureSink::new(16, 16);
        let mut p = presenter(vec![test_asset(16, false)], ScriptedBackend::always_done(180));

        run_one_pass(&mut p, &clock, &mut sink);
        assert_eq!(p.active_asset(), 0);
        // Passes keep cycling on the lone asset without panicking.
        run_one_pass(&mut p, &clock, &mut sink);
        assert_eq!(p.active_asset(), 0);
    }

    #[test]
    fn camera_switch_request_waits_for_the_pass_boundary() {
        let clock = ManualClock::new();
        let mut sink = CaptureSink::new(16, 16);
        let mut p = presenter(
            vec![test_asset(16, false), test_asset(16, false)],
            ScriptedBackend::always_done(200),
        );

        let before = p.active_asset();
        clock.advance(TICK_MS);
        p.tick(&clock, &mut sink);

        // Park the camera just shy of minimum zoom so the next tick's step
        // fires the rotation request while the pass is mid-flight.
        p.camera.mode = CamMode::Zooming;
        p.camera.zoom_expanding = false;
        p.camera.zoom_phase = 0.001;

        clock.advance(TICK_MS);
        let report = p.tick(&clock, &mut sink);
        assert!(p.pending_switch, "switch request must be queued");
        assert!(!report.asset_switched, "no switch while a pass is in flight");
        assert_eq!(p.active_asset(), before);

        // The switch lands on the tick that completes the pass.
        let report = run_one_pass(&mut p, &clock, &mut sink);
        assert!(report.asset_switched);
        assert_ne!(report.active_asset, before);
        assert!(!p.pending_switch);
    }
}
