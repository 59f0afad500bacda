//! Single-step check-in wizard: open → preview → capture → submit → result.

use std::fmt;
use std::time::Instant;

use ponto_hw::{CameraDevice, CameraSession, CaptureError, CapturedImage, FrameCapturer};

use super::{Generation, Ticket, AUTO_CLOSE_DELAY};
use crate::client::{AttendanceService, FailureKind, Verdict};
use crate::error::{PontoError, WizardError};
use crate::messages;
use crate::types::StatusMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInState {
    Idle,
    AwaitingCamera,
    Ready,
    Capturing,
    Submitting,
    Result(Outcome),
}

impl CheckInState {
    /// Whether a capture may start from here. A failed attempt keeps the
    /// camera live and allows an immediate retry.
    pub fn can_capture(&self) -> bool {
        matches!(
            self,
            CheckInState::Ready | CheckInState::Result(Outcome::Failure(_))
        )
    }
}

impl fmt::Display for CheckInState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckInState::Idle => "idle",
            CheckInState::AwaitingCamera => "awaiting camera",
            CheckInState::Ready => "ready",
            CheckInState::Capturing => "capturing",
            CheckInState::Submitting => "submitting",
            CheckInState::Result(Outcome::Success(_)) => "showing success",
            CheckInState::Result(Outcome::Failure(_)) => "showing failure",
        };
        f.write_str(name)
    }
}

/// A captured still waiting for its verdict.
#[derive(Debug, Clone)]
pub struct PendingCheckIn {
    pub ticket: Ticket,
    pub image: CapturedImage,
}

#[derive(Debug)]
pub enum CheckInUpdate {
    /// The wizard was closed or reopened before the verdict arrived.
    Discarded,
    /// Attendance recorded; the parent screen shows `message` as a banner.
    CheckedIn { message: String },
    /// Rejected or unreachable; the camera is still live for another try.
    Retry { error: PontoError },
}

pub struct CheckInWizard<D: CameraDevice> {
    session: CameraSession<D>,
    capturer: FrameCapturer,
    state: CheckInState,
    status: StatusMessage,
    open: bool,
    generation: Generation,
    close_at: Option<Instant>,
}

impl<D: CameraDevice> CheckInWizard<D> {
    pub fn new(device: D, capturer: FrameCapturer) -> Self {
        Self {
            session: CameraSession::new(device),
            capturer,
            state: CheckInState::Idle,
            status: StatusMessage::info(messages::CHECKIN_PROMPT),
            open: false,
            generation: Generation::default(),
            close_at: None,
        }
    }

    pub fn state(&self) -> &CheckInState {
        &self.state
    }

    pub fn status(&self) -> &StatusMessage {
        &self.status
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn camera_live(&self) -> bool {
        self.session.is_live()
    }

    pub fn session(&self) -> &CameraSession<D> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut CameraSession<D> {
        &mut self.session
    }

    pub fn close_deadline(&self) -> Option<Instant> {
        self.close_at
    }

    /// Open the wizard and start the camera.
    ///
    /// On camera failure the wizard stays open in `Idle` with the error
    /// shown; closing and reopening retries.
    pub fn open(&mut self) -> Result<(), PontoError> {
        self.generation.advance();
        self.open = true;
        self.close_at = None;
        self.status = StatusMessage::info(messages::CHECKIN_PROMPT);
        self.state = CheckInState::AwaitingCamera;
        tracing::info!("check-in opened");

        match self.session.acquire() {
            Ok(()) => {
                self.state = CheckInState::Ready;
                Ok(())
            }
            Err(e) => {
                let err = PontoError::Device(e);
                self.state = CheckInState::Idle;
                self.status = err.status();
                Err(err)
            }
        }
    }

    /// Capture the presented frame and move to `Submitting`.
    pub fn begin_capture(&mut self) -> Result<PendingCheckIn, PontoError> {
        match self.state {
            ref s if s.can_capture() => {}
            CheckInState::Idle | CheckInState::AwaitingCamera => {
                let err = PontoError::Capture(CaptureError::NotReady);
                self.status = err.status();
                return Err(err);
            }
            ref other => {
                return Err(WizardError::InvalidTransition {
                    action: "capture",
                    state: other.to_string(),
                }
                .into());
            }
        }

        self.state = CheckInState::Capturing;
        let captured = match self.session.preview() {
            Some(preview) => self.capturer.capture(preview),
            None => Err(CaptureError::NotReady),
        };

        match captured {
            Ok(image) => {
                self.state = CheckInState::Submitting;
                self.status = StatusMessage::info(messages::CHECKIN_PROCESSING);
                Ok(PendingCheckIn {
                    ticket: self.generation.ticket(),
                    image,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "check-in capture failed");
                let err = PontoError::Capture(e);
                self.state = CheckInState::Ready;
                self.status = err.status();
                Err(err)
            }
        }
    }

    /// Apply the verdict for `ticket`. Stale tickets change nothing.
    pub fn finish(&mut self, ticket: Ticket, verdict: Verdict, now: Instant) -> CheckInUpdate {
        if !self.generation.is_current(ticket) || self.state != CheckInState::Submitting {
            tracing::debug!(state = %self.state, "discarding late check-in verdict");
            return CheckInUpdate::Discarded;
        }

        match verdict {
            Verdict::Success { message, .. } => {
                tracing::info!(%message, "check-in recorded");
                self.state = CheckInState::Result(Outcome::Success(message.clone()));
                self.status = StatusMessage::success(message.clone());
                self.close_at = Some(now + AUTO_CLOSE_DELAY);
                CheckInUpdate::CheckedIn { message }
            }
            Verdict::Failure { kind, message } => {
                tracing::info!(?kind, %message, "check-in failed");
                self.state = CheckInState::Result(Outcome::Failure(message.clone()));
                self.status = StatusMessage::error(message.clone());
                let error = match kind {
                    FailureKind::Rejected => PontoError::Rejected(message),
                    FailureKind::Transport => PontoError::Transport(message),
                };
                CheckInUpdate::Retry { error }
            }
        }
    }

    /// Capture, submit and apply the verdict in one go.
    pub async fn capture_and_submit<S: AttendanceService>(
        &mut self,
        service: &S,
    ) -> Result<CheckInUpdate, PontoError> {
        let pending = self.begin_capture()?;
        let verdict = service.submit_check_in(&pending.image).await;
        Ok(self.finish(pending.ticket, verdict, Instant::now()))
    }

    /// Close once the auto-close deadline has passed. Returns true if it closed.
    pub fn poll_timers(&mut self, now: Instant) -> bool {
        match self.close_at {
            Some(deadline) if now >= deadline => {
                self.close();
                true
            }
            _ => false,
        }
    }

    /// Close from any state; the camera is released even mid-submission.
    pub fn close(&mut self) {
        self.session.release();
        self.generation.advance();
        self.state = CheckInState::Idle;
        self.open = false;
        self.close_at = None;
        tracing::info!("check-in closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ponto_hw::SyntheticCamera;
    use std::time::Duration;

    fn wizard() -> CheckInWizard<SyntheticCamera> {
        CheckInWizard::new(SyntheticCamera::test_pattern(8, 6), FrameCapturer::default())
    }

    #[test]
    fn test_open_reaches_ready() {
        let mut wiz = wizard();
        wiz.open().unwrap();
        assert_eq!(wiz.state(), &CheckInState::Ready);
        assert!(wiz.camera_live());
        assert_eq!(wiz.status().text, messages::CHECKIN_PROMPT);
    }

    #[test]
    fn test_open_without_camera_stays_open_idle() {
        let mut wiz = CheckInWizard::new(SyntheticCamera::unavailable(), FrameCapturer::default());
        let err = wiz.open().unwrap_err();
        assert!(matches!(err, PontoError::Device(_)));
        assert_eq!(wiz.state(), &CheckInState::Idle);
        assert!(wiz.is_open());
        assert!(!wiz.camera_live());
        assert_eq!(wiz.status().text, messages::CAMERA_UNAVAILABLE);
    }

    #[test]
    fn test_capture_before_ready_fails() {
        let mut wiz = wizard();
        let err = wiz.begin_capture().unwrap_err();
        assert!(matches!(err, PontoError::Capture(CaptureError::NotReady)));
        assert_eq!(wiz.state(), &CheckInState::Idle);
    }

    #[test]
    fn test_capture_with_zero_sized_preview_returns_to_ready() {
        let mut cam = SyntheticCamera::test_pattern(8, 6);
        cam.set_ready(false);
        let mut wiz = CheckInWizard::new(cam, FrameCapturer::default());
        wiz.open().unwrap();

        let err = wiz.begin_capture().unwrap_err();
        assert!(matches!(err, PontoError::Capture(CaptureError::NotReady)));
        assert_eq!(wiz.state(), &CheckInState::Ready);
        assert!(wiz.status().is_error());
    }

    #[test]
    fn test_success_schedules_auto_close() {
        let mut wiz = wizard();
        wiz.open().unwrap();
        let pending = wiz.begin_capture().unwrap();
        assert_eq!(wiz.state(), &CheckInState::Submitting);

        let now = Instant::now();
        let update = wiz.finish(pending.ticket, Verdict::success("OK"), now);
        assert!(matches!(update, CheckInUpdate::CheckedIn { ref message } if message == "OK"));
        assert_eq!(
            wiz.state(),
            &CheckInState::Result(Outcome::Success("OK".into()))
        );

        assert!(!wiz.poll_timers(now + Duration::from_millis(1999)));
        assert!(wiz.is_open());
        assert!(wiz.poll_timers(now + AUTO_CLOSE_DELAY));
        assert!(!wiz.is_open());
        assert!(!wiz.camera_live());
    }

    #[test]
    fn test_rejection_keeps_camera_for_retry() {
        let mut wiz = wizard();
        wiz.open().unwrap();
        let pending = wiz.begin_capture().unwrap();

        let update = wiz.finish(
            pending.ticket,
            Verdict::rejected("rosto não reconhecido"),
            Instant::now(),
        );
        assert!(matches!(
            update,
            CheckInUpdate::Retry { error: PontoError::Rejected(_) }
        ));
        assert!(wiz.camera_live());
        assert!(wiz.state().can_capture());
        assert_eq!(wiz.close_deadline(), None);

        // Retry without reopening.
        assert!(wiz.begin_capture().is_ok());
        assert_eq!(wiz.session().acquisitions(), 1);
    }

    #[test]
    fn test_late_verdict_after_close_is_discarded() {
        let mut wiz = wizard();
        wiz.open().unwrap();
        let pending = wiz.begin_capture().unwrap();
        wiz.close();

        let update = wiz.finish(pending.ticket, Verdict::success("tarde"), Instant::now());
        assert!(matches!(update, CheckInUpdate::Discarded));
        assert_eq!(wiz.state(), &CheckInState::Idle);
        assert_eq!(wiz.close_deadline(), None);
    }

    #[test]
    fn test_late_verdict_after_reopen_is_discarded() {
        let mut wiz = wizard();
        wiz.open().unwrap();
        let stale = wiz.begin_capture().unwrap();
        wiz.close();
        wiz.open().unwrap();

        let update = wiz.finish(stale.ticket, Verdict::rejected("velho"), Instant::now());
        assert!(matches!(update, CheckInUpdate::Discarded));
        assert_eq!(wiz.state(), &CheckInState::Ready);
    }

    #[test]
    fn test_capture_while_submitting_is_rejected() {
        let mut wiz = wizard();
        wiz.open().unwrap();
        wiz.begin_capture().unwrap();
        let err = wiz.begin_capture().unwrap_err();
        assert!(matches!(err, PontoError::InvalidTransition(_)));
    }

    #[test]
    fn test_open_close_cycles_balance_camera_handles() {
        let mut wiz = wizard();
        for _ in 0..5 {
            wiz.open().unwrap();
            wiz.close();
        }
        wiz.open().unwrap();
        wiz.open().unwrap();
        wiz.close();
        wiz.close();

        let session = wiz.session();
        assert_eq!(session.acquisitions(), session.releases());
        assert_eq!(session.device().open_streams(), 0);
    }
}
