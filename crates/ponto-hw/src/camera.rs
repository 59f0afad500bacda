//! Camera devices: the `CameraDevice`/`PreviewStream` seam and its V4L2 backend.

use crate::frame::{self, Frame};
use std::path::Path;
use thiserror::Error;
use v4l::buffer::Type as BufType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("device busy")]
    DeviceBusy,
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error("format negotiation failed: {0}")]
    FormatNegotiationFailed(String),
    #[error("streaming not supported")]
    StreamingNotSupported,
    #[error("stream already stopped")]
    Stopped,
}

/// A live video stream bound to a preview surface.
pub trait PreviewStream {
    /// Natural dimensions of the video; `(0, 0)` while no frame can be produced.
    fn natural_size(&self) -> (u32, u32);

    /// The frame currently presented on the preview.
    fn current_frame(&mut self) -> Result<Frame, CameraError>;

    /// Stop every underlying track. Calling it twice is harmless.
    fn stop(&mut self);
}

/// Something that can hand out a video-only preview stream.
pub trait CameraDevice {
    type Stream: PreviewStream;

    fn open_stream(&mut self) -> Result<Self::Stream, CameraError>;

    /// Human-readable identifier for logs.
    fn describe(&self) -> String;
}

/// Info about a discovered V4L2 device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
    pub bus: String,
}

/// Negotiated pixel format for the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// YUYV 4:2:2 packed (2 bytes/pixel).
    Yuyv,
    /// 8-bit grayscale (1 byte/pixel).
    Grey,
}

/// V4L2 camera opened lazily on each `open_stream`.
#[derive(Debug, Clone)]
pub struct V4l2Camera {
    pub device_path: String,
    pub width: u32,
    pub height: u32,
    /// Frames discarded right after opening, for AGC/AE stabilization.
    pub warmup_frames: usize,
}

impl V4l2Camera {
    pub fn new(device_path: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            device_path: device_path.into(),
            width,
            height,
            warmup_frames: 0,
        }
    }

    pub fn with_warmup(mut self, frames: usize) -> Self {
        self.warmup_frames = frames;
        self
    }
}

impl CameraDevice for V4l2Camera {
    type Stream = V4l2Stream;

    fn open_stream(&mut self) -> Result<V4l2Stream, CameraError> {
        let mut stream = V4l2Stream::open(&self.device_path, self.width, self.height)?;
        stream.warmup_frames = self.warmup_frames;
        // A device that opens but cannot stream must fail acquisition.
        let first = stream.current_frame()?;
        tracing::debug!(sequence = first.sequence, "camera streaming");
        Ok(stream)
    }

    fn describe(&self) -> String {
        self.device_path.clone()
    }
}

/// Open V4L2 device handle. Dropping the handle closes the device.
pub struct V4l2Stream {
    device: Option<Device>,
    width: u32,
    height: u32,
    pub fourcc: FourCC,
    pixel_format: PixelFormat,
    /// Buffers dequeued and dropped before each presented frame.
    warmup_frames: usize,
}

impl V4l2Stream {
    /// Open a V4L2 camera device by path (e.g., "/dev/video0").
    pub fn open(device_path: &str, width: u32, height: u32) -> Result<Self, CameraError> {
        if !Path::new(device_path).exists() {
            return Err(CameraError::DeviceNotFound(device_path.to_string()));
        }

        let device = Device::with_path(device_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                CameraError::PermissionDenied(device_path.to_string())
            } else if e.to_string().contains("busy") || e.to_string().contains("EBUSY") {
                CameraError::DeviceBusy
            } else {
                CameraError::DeviceNotFound(format!("{device_path}: {e}"))
            }
        })?;

        let caps = device.query_caps().map_err(|e| {
            CameraError::CaptureFailed(format!("failed to query capabilities: {e}"))
        })?;

        tracing::info!(
            device = device_path,
            driver = %caps.driver,
            card = %caps.card,
            "opened camera"
        );

        if !caps
            .capabilities
            .contains(v4l::capability::Flags::VIDEO_CAPTURE)
        {
            return Err(CameraError::StreamingNotSupported);
        }

        // Ask for YUYV; accept GREY if that is all the driver offers.
        let mut fmt = device.format().map_err(|e| {
            CameraError::FormatNegotiationFailed(format!("failed to get format: {e}"))
        })?;
        fmt.fourcc = FourCC::new(b"YUYV");
        fmt.width = width;
        fmt.height = height;

        let negotiated = device.set_format(&fmt).map_err(|e| {
            CameraError::FormatNegotiationFailed(format!("failed to set format: {e}"))
        })?;

        let fourcc = negotiated.fourcc;
        let pixel_format = if fourcc == FourCC::new(b"YUYV") {
            PixelFormat::Yuyv
        } else if fourcc == FourCC::new(b"GREY") {
            PixelFormat::Grey
        } else {
            return Err(CameraError::FormatNegotiationFailed(format!(
                "unsupported pixel format: {fourcc:?} (need YUYV or GREY)"
            )));
        };

        tracing::info!(
            width = negotiated.width,
            height = negotiated.height,
            fourcc = ?fourcc,
            "negotiated format"
        );

        Ok(Self {
            device: Some(device),
            width: negotiated.width,
            height: negotiated.height,
            fourcc,
            pixel_format,
            warmup_frames: 0,
        })
    }

    fn buf_to_rgb(&self, buf: &[u8]) -> Result<Vec<u8>, CameraError> {
        let converted = match self.pixel_format {
            PixelFormat::Yuyv => frame::yuyv_to_rgb(buf, self.width, self.height),
            PixelFormat::Grey => frame::grey_to_rgb(buf, self.width, self.height),
        };
        converted.map_err(|e| CameraError::CaptureFailed(format!("pixel conversion failed: {e}")))
    }
}

impl PreviewStream for V4l2Stream {
    fn natural_size(&self) -> (u32, u32) {
        match self.device {
            Some(_) => (self.width, self.height),
            None => (0, 0),
        }
    }

    fn current_frame(&mut self) -> Result<Frame, CameraError> {
        let device = self.device.as_ref().ok_or(CameraError::Stopped)?;
        let mut stream = MmapStream::with_buffers(device, BufType::VideoCapture, 4).map_err(|e| {
            CameraError::CaptureFailed(format!("failed to create mmap stream: {e}"))
        })?;

        discard_buffers(self.warmup_frames, || {
            stream.next().map(|_| ()).map_err(|e| {
                CameraError::CaptureFailed(format!("failed to dequeue warmup buffer: {e}"))
            })
        })?;

        let (buf, meta) = stream
            .next()
            .map_err(|e| CameraError::CaptureFailed(format!("failed to dequeue buffer: {e}")))?;
        let sequence = meta.sequence;
        let data = self.buf_to_rgb(buf)?;

        Ok(Frame {
            data,
            width: self.width,
            height: self.height,
            timestamp: std::time::Instant::now(),
            sequence,
        })
    }

    fn stop(&mut self) {
        if self.device.take().is_some() {
            tracing::debug!("v4l2 device closed");
        }
    }
}

/// Dequeue and drop `count` buffers so AGC/AE settles on the running stream.
fn discard_buffers<E>(count: usize, mut dequeue: impl FnMut() -> Result<(), E>) -> Result<(), E> {
    if count > 0 {
        tracing::debug!(count, "discarding warmup frames");
    }
    for _ in 0..count {
        dequeue()?;
    }
    Ok(())
}

/// List available V4L2 video capture devices.
pub fn list_devices() -> Vec<DeviceInfo> {
    let mut devices = Vec::new();

    for i in 0..16 {
        let path = format!("/dev/video{i}");
        if !Path::new(&path).exists() {
            continue;
        }
        let Ok(dev) = Device::with_path(&path) else {
            continue;
        };
        let Ok(caps) = dev.query_caps() else {
            continue;
        };
        if !caps
            .capabilities
            .contains(v4l::capability::Flags::VIDEO_CAPTURE)
        {
            continue;
        }
        devices.push(DeviceInfo {
            path,
            name: caps.card.clone(),
            driver: caps.driver.clone(),
            bus: caps.bus.clone(),
        });
    }

    devices
}
