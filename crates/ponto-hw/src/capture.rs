//! Frame capturer: turns the presented preview frame into a mirrored JPEG still.

use crate::camera::{CameraError, PreviewStream};
use crate::frame::Frame;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use thiserror::Error;

pub const JPEG_MIME: &str = "image/jpeg";

/// Default lossy encoding quality (0–100).
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("preview not ready")]
    NotReady,
    #[error("frame grab failed: {0}")]
    Grab(#[from] CameraError),
    #[error("jpeg encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// An encoded still. Immutable once produced; a new capture replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    bytes: Vec<u8>,
    mime: &'static str,
    width: u32,
    height: u32,
}

impl CapturedImage {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FrameCapturer {
    quality: u8,
}

impl Default for FrameCapturer {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl FrameCapturer {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Mirrored copy of the frame the preview is presenting, at its natural size.
    pub fn snapshot<S: PreviewStream + ?Sized>(&self, preview: &mut S) -> Result<Frame, CaptureError> {
        let (width, height) = preview.natural_size();
        if width == 0 || height == 0 {
            return Err(CaptureError::NotReady);
        }

        let frame = preview.current_frame()?;
        if frame.width != width || frame.height != height {
            tracing::debug!(
                natural_width = width,
                natural_height = height,
                frame_width = frame.width,
                frame_height = frame.height,
                "frame size differs from natural size"
            );
        }
        Ok(frame.mirrored())
    }

    /// Snapshot the preview and encode it as JPEG.
    pub fn capture<S: PreviewStream + ?Sized>(
        &self,
        preview: &mut S,
    ) -> Result<CapturedImage, CaptureError> {
        let frame = self.snapshot(preview)?;
        let image = self.encode(&frame)?;
        tracing::debug!(
            width = frame.width,
            height = frame.height,
            bytes = image.len(),
            seq = frame.sequence,
            "frame captured"
        );
        Ok(image)
    }

    pub fn encode(&self, frame: &Frame) -> Result<CapturedImage, CaptureError> {
        let mut bytes = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, self.quality);
        encoder.encode(&frame.data, frame.width, frame.height, ExtendedColorType::Rgb8)?;
        Ok(CapturedImage {
            bytes,
            mime: JPEG_MIME,
            width: frame.width,
            height: frame.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraDevice;
    use crate::synthetic::SyntheticCamera;

    /// 16x8 frame: left half red, right half blue.
    fn split_frame() -> Frame {
        let (w, h) = (16u32, 8u32);
        let mut data = Vec::new();
        for _ in 0..h {
            for x in 0..w {
                if x < w / 2 {
                    data.extend_from_slice(&[230, 20, 20]);
                } else {
                    data.extend_from_slice(&[20, 20, 230]);
                }
            }
        }
        Frame::from_rgb(data, w, h).unwrap()
    }

    #[test]
    fn test_snapshot_is_exact_mirror() {
        let mut cam = SyntheticCamera::test_pattern(6, 3);
        let original = cam.frame().clone();
        let mut stream = cam.open_stream().unwrap();

        let snap = FrameCapturer::default().snapshot(&mut stream).unwrap();
        for y in 0..3 {
            for x in 0..6 {
                assert_eq!(snap.pixel(x, y), original.pixel(5 - x, y));
            }
        }
    }

    #[test]
    fn test_capture_encodes_mirrored_jpeg() {
        let mut cam = SyntheticCamera::new(split_frame());
        let mut stream = cam.open_stream().unwrap();

        let still = FrameCapturer::default().capture(&mut stream).unwrap();
        assert_eq!(still.mime(), "image/jpeg");
        assert_eq!(still.dimensions(), (16, 8));
        assert_eq!(&still.bytes()[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory_with_format(still.bytes(), image::ImageFormat::Jpeg)
            .unwrap()
            .to_rgb8();
        let left = decoded.get_pixel(2, 4);
        let right = decoded.get_pixel(13, 4);
        // Preview shows red on the left; the still must show blue there.
        assert!(left[2] > 150 && left[0] < 100, "left = {left:?}");
        assert!(right[0] > 150 && right[2] < 100, "right = {right:?}");
    }

    #[test]
    fn test_capture_not_ready() {
        let mut cam = SyntheticCamera::test_pattern(4, 4);
        cam.set_ready(false);
        let mut stream = cam.open_stream().unwrap();
        let err = FrameCapturer::default().capture(&mut stream).unwrap_err();
        assert!(matches!(err, CaptureError::NotReady));
    }

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(FrameCapturer::new(0).quality(), 1);
        assert_eq!(FrameCapturer::new(200).quality(), 100);
    }
}
