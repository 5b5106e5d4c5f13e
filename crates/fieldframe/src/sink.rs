//! Presentation sink for the host-side simulator.

use std::path::Path;

use anyhow::{Context, Result};
use compositor::{blend_frames, Frame, PresentSink};

/// Keeps the most recently presented output so the daemon can export it.
#[derive(Debug)]
pub struct CaptureSink {
    frame: Frame,
}

impl CaptureSink {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: Frame::new(width, height),
        }
    }

    /// Writes the last presented frame as an 8-bit grayscale PNG.
    pub fn export_png(&self, path: &Path) -> Result<()> {
        image::save_buffer(
            path,
            self.frame.as_bytes(),
            self.frame.width(),
            self.frame.height(),
            image::ColorType::L8,
        )
        .with_context(|| format!("failed to export frame to {}", path.display()))
    }
}

impl PresentSink for CaptureSink {
    fn present(&mut self, frame: &Frame) {
        self.frame.as_bytes_mut().copy_from_slice(frame.as_bytes());
    }

    fn present_blend(&mut self, from: &Frame, to: &Frame, t: f32) {
        blend_frames(from, to, t, &mut self.frame);
    }
}
