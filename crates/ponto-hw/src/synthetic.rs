//! Synthetic camera that presents a fixed frame.
//!
//! Used for diagnostics without hardware and as the preview source in tests.

use crate::camera::{CameraDevice, CameraError, PreviewStream};
use crate::frame::Frame;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    frame: Frame,
    available: bool,
    ready: bool,
    live: Arc<AtomicUsize>,
}

impl SyntheticCamera {
    /// Camera that always presents `frame`.
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            available: true,
            ready: true,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Left-to-right red ramp, top-to-bottom green ramp. No two columns match,
    /// so a mirrored copy is always distinguishable.
    pub fn test_pattern(width: u32, height: u32) -> Self {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let r = (x * 255 / width.max(2).saturating_sub(1)).min(255) as u8;
                let g = (y * 255 / height.max(2).saturating_sub(1)).min(255) as u8;
                data.extend_from_slice(&[r, g, 64]);
            }
        }
        let frame = Frame {
            data,
            width,
            height,
            timestamp: std::time::Instant::now(),
            sequence: 0,
        };
        Self::new(frame)
    }

    /// Camera whose every open fails as if access were denied.
    pub fn unavailable() -> Self {
        let mut cam = Self::test_pattern(2, 2);
        cam.available = false;
        cam
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// When not ready, opened streams report zero dimensions.
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Streams opened by this camera that have not been stopped yet.
    pub fn open_streams(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl CameraDevice for SyntheticCamera {
    type Stream = SyntheticStream;

    fn open_stream(&mut self) -> Result<SyntheticStream, CameraError> {
        if !self.available {
            return Err(CameraError::PermissionDenied("synthetic camera disabled".into()));
        }
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(SyntheticStream {
            frame: self.frame.clone(),
            ready: self.ready,
            stopped: false,
            live: Arc::clone(&self.live),
        })
    }

    fn describe(&self) -> String {
        format!("synthetic:{}x{}", self.frame.width, self.frame.height)
    }
}

pub struct SyntheticStream {
    frame: Frame,
    ready: bool,
    stopped: bool,
    live: Arc<AtomicUsize>,
}

impl PreviewStream for SyntheticStream {
    fn natural_size(&self) -> (u32, u32) {
        if self.ready && !self.stopped {
            (self.frame.width, self.frame.height)
        } else {
            (0, 0)
        }
    }

    fn current_frame(&mut self) -> Result<Frame, CameraError> {
        if self.stopped {
            return Err(CameraError::Stopped);
        }
        self.frame.sequence = self.frame.sequence.wrapping_add(1);
        Ok(self.frame.clone())
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for SyntheticStream {
    fn drop(&mut self) {
        self.stop();
    }
}
