//! Camera session: owns at most one live preview stream.

use crate::camera::{CameraDevice, CameraError, PreviewStream};

/// Owner of the (single) live stream of one wizard instance.
///
/// `acquire` always releases the previous stream first, so two device
/// handles are never open for the same session.
pub struct CameraSession<D: CameraDevice> {
    device: D,
    active: Option<D::Stream>,
    acquisitions: u64,
    releases: u64,
}

impl<D: CameraDevice> CameraSession<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            active: None,
            acquisitions: 0,
            releases: 0,
        }
    }

    /// Request a video stream and bind it as the live preview.
    pub fn acquire(&mut self) -> Result<(), CameraError> {
        self.release();

        match self.device.open_stream() {
            Ok(stream) => {
                let (width, height) = stream.natural_size();
                tracing::info!(
                    device = %self.device.describe(),
                    width,
                    height,
                    "camera session acquired"
                );
                self.active = Some(stream);
                self.acquisitions += 1;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(device = %self.device.describe(), error = %e, "camera unavailable");
                Err(e)
            }
        }
    }

    /// Stop and detach the live stream, if any.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.active.take() {
            stream.stop();
            self.releases += 1;
            tracing::info!(device = %self.device.describe(), "camera session released");
        }
    }

    pub fn is_live(&self) -> bool {
        self.active.is_some()
    }

    /// The preview surface; `None` while no session is active.
    pub fn preview(&mut self) -> Option<&mut D::Stream> {
        self.active.as_mut()
    }

    /// Number of successful acquisitions so far.
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions
    }

    /// Number of streams released so far.
    pub fn releases(&self) -> u64 {
        self.releases
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: CameraDevice> Drop for CameraSession<D> {
    fn drop(&mut self) {
        self.release();
    }
}
