use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;

/// A still RGB frame handed to the vision pipeline. Immutable once produced.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Packed RGB, length `width * height * 3`.
    pub pixels: Vec<u8>,
    pub captured_at_millis: i64,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("frame dimensions must be non-zero ({width}x{height})");
        }
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            bail!(
                "frame buffer length {} does not match {}x{} RGB ({expected})",
                pixels.len(),
                width,
                height
            );
        }
        Ok(Self {
            width,
            height,
            pixels,
            captured_at_millis: Utc::now().timestamp_millis(),
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Camera boundary. The orchestrator only ever asks for one still frame at a
/// time; real integrations sit behind this trait.
pub trait FrameSource: Send + Sync {
    fn capture_frame(&self) -> Result<Frame>;
}

/// Placeholder sensor: a solid-black 1920x1080 frame, matching the shape the
/// platform camera delivers. Vision analysis of it finds nothing, which is
/// the correct answer for an empty scene.
pub struct StubCamera {
    width: u32,
    height: u32,
}

impl StubCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for StubCamera {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl FrameSource for StubCamera {
    fn capture_frame(&self) -> Result<Frame> {
        let len = self.width as usize * self.height as usize * 3;
        Frame::new(self.width, self.height, vec![0; len])
    }
}

/// Decodes a photo from disk into an RGB frame. Used to run the vision
/// stages against real pictures without a live camera.
pub struct StillImageCamera {
    path: PathBuf,
}

impl StillImageCamera {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl FrameSource for StillImageCamera {
    fn capture_frame(&self) -> Result<Frame> {
        let decoded = image::open(&self.path)
            .with_context(|| format!("failed to decode image {}", self.path.display()))?
            .to_rgb8();
        let (width, height) = decoded.dimensions();
        Frame::new(width, height, decoded.into_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_camera_produces_black_frame() {
        let frame = StubCamera::new(8, 6).capture_frame().unwrap();
        assert_eq!(frame.width, 8);
        assert_eq!(frame.height, 6);
        assert_eq!(frame.pixels.len(), 8 * 6 * 3);
        assert!(frame.pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn frame_rejects_mismatched_buffer() {
        assert!(Frame::new(4, 4, vec![0; 10]).is_err());
        assert!(Frame::new(0, 4, vec![]).is_err());
    }
}
