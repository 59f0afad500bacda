//! Three-step enrollment wizard: personal data ⇄ capture ⇄ confirm.

use std::fmt;
use std::time::Instant;

use ponto_hw::{CameraDevice, CameraSession, CaptureError, CapturedImage, FrameCapturer};

use super::{Generation, Ticket, AUTO_CLOSE_DELAY};
use crate::client::{AttendanceService, FailureKind, Verdict};
use crate::error::{PontoError, WizardError};
use crate::messages;
use crate::types::{Department, EnrollmentField, EnrollmentForm, StatusMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentStep {
    PersonalData,
    Capture,
    Confirm,
    Submitting,
    Completed {
        message: String,
        generated_id: Option<String>,
    },
}

impl EnrollmentStep {
    /// Step number shown to the user (1–3).
    pub fn number(&self) -> u8 {
        match self {
            EnrollmentStep::PersonalData => 1,
            EnrollmentStep::Capture => 2,
            _ => 3,
        }
    }
}

impl fmt::Display for EnrollmentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnrollmentStep::PersonalData => "on personal data",
            EnrollmentStep::Capture => "capturing",
            EnrollmentStep::Confirm => "confirming",
            EnrollmentStep::Submitting => "submitting",
            EnrollmentStep::Completed { .. } => "completed",
        };
        f.write_str(name)
    }
}

/// Snapshot of what is being submitted, tagged with its ticket.
#[derive(Debug, Clone)]
pub struct PendingEnrollment {
    pub ticket: Ticket,
    pub form: EnrollmentForm,
    pub image: CapturedImage,
}

#[derive(Debug)]
pub enum EnrollmentUpdate {
    Discarded,
    Enrolled {
        message: String,
        generated_id: Option<String>,
    },
    /// Back on the confirm step with form and image untouched.
    Retry { error: PontoError },
}

pub struct EnrollmentWizard<D: CameraDevice> {
    session: CameraSession<D>,
    capturer: FrameCapturer,
    step: EnrollmentStep,
    form: EnrollmentForm,
    image: Option<CapturedImage>,
    status: Option<StatusMessage>,
    generation: Generation,
    return_at: Option<Instant>,
    closed: bool,
}

impl<D: CameraDevice> EnrollmentWizard<D> {
    pub fn new(device: D, capturer: FrameCapturer) -> Self {
        Self {
            session: CameraSession::new(device),
            capturer,
            step: EnrollmentStep::PersonalData,
            form: EnrollmentForm::default(),
            image: None,
            status: None,
            generation: Generation::default(),
            return_at: None,
            closed: false,
        }
    }

    pub fn step(&self) -> &EnrollmentStep {
        &self.step
    }

    pub fn form(&self) -> &EnrollmentForm {
        &self.form
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn camera_live(&self) -> bool {
        self.session.is_live()
    }

    pub fn session(&self) -> &CameraSession<D> {
        &self.session
    }

    /// True once the wizard has handed control back to the roster.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// When the roster view takes over after the success delay.
    pub fn return_deadline(&self) -> Option<Instant> {
        self.return_at
    }

    /// A closed wizard is terminal; every transition is refused.
    fn ensure_open(&self, action: &'static str) -> Result<(), PontoError> {
        if self.closed {
            return Err(WizardError::InvalidTransition {
                action,
                state: "closed".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> PontoError {
        WizardError::InvalidTransition {
            action,
            state: self.step.to_string(),
        }
        .into()
    }

    fn fail(&mut self, err: PontoError) -> PontoError {
        self.status = Some(err.status());
        err
    }

    /// Edit one personal-data field from raw input.
    pub fn set_field(&mut self, field: EnrollmentField, value: &str) -> Result<(), PontoError> {
        self.ensure_open("edit personal data")?;
        if self.step != EnrollmentStep::PersonalData {
            return Err(self.invalid("edit personal data"));
        }
        self.form.set(field, value).map_err(PontoError::from)
    }

    pub fn select_department(&mut self, department: Department) -> Result<(), PontoError> {
        self.ensure_open("edit personal data")?;
        if self.step != EnrollmentStep::PersonalData {
            return Err(self.invalid("edit personal data"));
        }
        self.form.departamento = Some(department);
        Ok(())
    }

    /// Step 1 → 2. Fields are not validated here.
    pub fn next(&mut self) -> Result<(), PontoError> {
        self.ensure_open("advance")?;
        if self.step != EnrollmentStep::PersonalData {
            return Err(self.invalid("advance"));
        }
        self.enter_capture()
    }

    /// Step 2 → 1 or step 3 → 2.
    pub fn back(&mut self) -> Result<(), PontoError> {
        self.ensure_open("go back")?;
        match self.step {
            EnrollmentStep::Capture => {
                self.session.release();
                self.step = EnrollmentStep::PersonalData;
                self.status = None;
                Ok(())
            }
            EnrollmentStep::Confirm => self.recapture(),
            _ => Err(self.invalid("go back")),
        }
    }

    /// Discard the held image and return to the camera.
    pub fn recapture(&mut self) -> Result<(), PontoError> {
        self.ensure_open("recapture")?;
        if self.step != EnrollmentStep::Confirm {
            return Err(self.invalid("recapture"));
        }
        self.image = None;
        self.enter_capture()
    }

    fn enter_capture(&mut self) -> Result<(), PontoError> {
        self.step = EnrollmentStep::Capture;
        self.status = None;
        tracing::debug!("enrollment entering capture step");
        self.session
            .acquire()
            .map_err(|e| self.fail(PontoError::Device(e)))
    }

    /// Take the reference photo and advance to confirmation.
    pub fn capture(&mut self) -> Result<(), PontoError> {
        self.ensure_open("capture")?;
        if self.step != EnrollmentStep::Capture {
            return Err(self.invalid("capture"));
        }

        let captured = match self.session.preview() {
            Some(preview) => self.capturer.capture(preview),
            None => Err(CaptureError::NotReady),
        };

        match captured {
            Ok(image) => {
                tracing::info!(bytes = image.len(), "enrollment photo captured");
                self.image = Some(image);
                self.session.release();
                self.step = EnrollmentStep::Confirm;
                self.status = None;
                Ok(())
            }
            Err(e) => Err(self.fail(PontoError::Capture(e))),
        }
    }

    /// Validate and move to `Submitting`. Nothing is sent when data is missing.
    pub fn begin_submit(&mut self) -> Result<PendingEnrollment, PontoError> {
        self.ensure_open("submit")?;
        if self.step != EnrollmentStep::Confirm {
            return Err(self.invalid("submit"));
        }

        let missing = self.form.missing();
        let has_image = self.image.is_some();
        let image = match self.image.clone() {
            Some(image) if missing.is_empty() => image,
            _ => {
                tracing::info!(?missing, has_image, "enrollment incomplete");
                return Err(self.fail(PontoError::Validation { missing, has_image }));
            }
        };

        self.step = EnrollmentStep::Submitting;
        self.status = Some(StatusMessage::info(messages::ENROLLMENT_SENDING));
        Ok(PendingEnrollment {
            ticket: self.generation.ticket(),
            form: self.form.clone(),
            image,
        })
    }

    /// Apply the verdict for `ticket`. Stale tickets change nothing.
    pub fn finish(&mut self, ticket: Ticket, verdict: Verdict, now: Instant) -> EnrollmentUpdate {
        if self.closed
            || !self.generation.is_current(ticket)
            || self.step != EnrollmentStep::Submitting
        {
            tracing::debug!(step = %self.step, "discarding late enrollment verdict");
            return EnrollmentUpdate::Discarded;
        }

        match verdict {
            Verdict::Success {
                message,
                generated_id,
            } => {
                tracing::info!(%message, id = ?generated_id, "employee enrolled");
                let text = match &generated_id {
                    Some(id) => format!("{message} Novo ID: {id}"),
                    None => message.clone(),
                };
                self.status = Some(StatusMessage::success(text));
                self.step = EnrollmentStep::Completed {
                    message: message.clone(),
                    generated_id: generated_id.clone(),
                };
                self.return_at = Some(now + AUTO_CLOSE_DELAY);
                EnrollmentUpdate::Enrolled {
                    message,
                    generated_id,
                }
            }
            Verdict::Failure { kind, message } => {
                tracing::info!(?kind, %message, "enrollment failed");
                self.step = EnrollmentStep::Confirm;
                self.status = Some(StatusMessage::error(message.clone()));
                let error = match kind {
                    FailureKind::Rejected => PontoError::Rejected(message),
                    FailureKind::Transport => PontoError::Transport(message),
                };
                EnrollmentUpdate::Retry { error }
            }
        }
    }

    /// Validate, submit and apply the verdict in one go.
    pub async fn submit<S: AttendanceService>(
        &mut self,
        service: &S,
    ) -> Result<EnrollmentUpdate, PontoError> {
        let pending = self.begin_submit()?;
        let verdict = service
            .submit_enrollment(&pending.form, &pending.image)
            .await;
        Ok(self.finish(pending.ticket, verdict, Instant::now()))
    }

    /// Hand control back to the roster once the success delay has passed.
    pub fn poll_timers(&mut self, now: Instant) -> bool {
        match self.return_at {
            Some(deadline) if now >= deadline && !self.closed => {
                self.closed = true;
                self.return_at = None;
                tracing::info!("enrollment complete, returning to roster");
                true
            }
            _ => false,
        }
    }

    /// Abandon the wizard from any step.
    pub fn cancel(&mut self) {
        self.session.release();
        self.generation.advance();
        self.return_at = None;
        self.closed = true;
        tracing::info!(step = %self.step, "enrollment cancelled");
    }
}
