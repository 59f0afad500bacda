//! ponto-core: Attendance kiosk workflows.
//!
//! Drives the check-in and enrollment wizards over the camera primitives
//! from `ponto-hw`, and talks to the remote recognition/roster service
//! through [`AttendanceService`].

pub mod banner;
pub mod client;
pub mod clock;
pub mod error;
pub mod messages;
pub mod roster;
pub mod types;
pub mod wizard;

pub use banner::StatusBanner;
pub use client::{AttendanceService, Endpoints, FailureKind, ServiceClient, Verdict};
pub use error::{LoadError, PontoError, WizardError};
pub use roster::{RefreshOutcome, Roster};
pub use types::{Department, Employee, EnrollmentField, EnrollmentForm, Severity, Stats, StatusMessage};
pub use wizard::{CheckInWizard, EnrollmentWizard};
