use ponto_hw::{CameraError, CaptureError};
use thiserror::Error;

use crate::messages;
use crate::types::{EnrollmentField, StatusMessage};

/// Every way a kiosk action can fail.
#[derive(Error, Debug)]
pub enum PontoError {
    #[error("camera unavailable: {0}")]
    Device(#[from] CameraError),
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rejected by service: {0}")]
    Rejected(String),
    #[error("missing required fields: {missing:?} (image present: {has_image})")]
    Validation {
        missing: Vec<EnrollmentField>,
        has_image: bool,
    },
    #[error(transparent)]
    InvalidField(#[from] FormError),
    #[error(transparent)]
    InvalidTransition(#[from] WizardError),
}

impl PontoError {
    /// The message the kiosk shows for this failure.
    pub fn status(&self) -> StatusMessage {
        match self {
            PontoError::Device(_) => StatusMessage::error(messages::CAMERA_UNAVAILABLE),
            PontoError::Capture(CaptureError::NotReady) => {
                StatusMessage::error(messages::CAMERA_NOT_READY)
            }
            PontoError::Capture(_) => StatusMessage::error(messages::CAPTURE_FAILED),
            PontoError::Transport(msg) | PontoError::Rejected(msg) => StatusMessage::error(msg),
            PontoError::Validation { .. } => StatusMessage::error(messages::ENROLLMENT_INCOMPLETE),
            PontoError::InvalidField(e) => StatusMessage::error(e.to_string()),
            PontoError::InvalidTransition(e) => StatusMessage::error(e.to_string()),
        }
    }
}

/// Illegal wizard moves.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WizardError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: String,
    },
}

/// Roster data could not be fetched.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(reqwest::StatusCode),
}

impl LoadError {
    pub fn status(&self) -> StatusMessage {
        StatusMessage::error(messages::ROSTER_LOAD_FAILED)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error("unknown department: {0}")]
    UnknownDepartment(String),
}
