//! ponto-hw: Camera sessions and still capture for the attendance kiosk.
//!
//! Provides the `CameraDevice` seam with a V4L2 backend and a synthetic
//! backend, the single-stream `CameraSession`, and the mirrored JPEG
//! `FrameCapturer`.

pub mod camera;
pub mod capture;
pub mod frame;
pub mod session;
pub mod synthetic;

pub use camera::{CameraDevice, CameraError, PreviewStream, V4l2Camera};
pub use capture::{CaptureError, CapturedImage, FrameCapturer};
pub use frame::Frame;
pub use session::CameraSession;
pub use synthetic::SyntheticCamera;
