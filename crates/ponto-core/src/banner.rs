//! Main-screen confirmation banner.

use std::time::{Duration, Instant};

use crate::types::StatusMessage;

/// How long a check-in confirmation stays on the main screen.
pub const BANNER_CLEAR_DELAY: Duration = Duration::from_secs(4);

#[derive(Debug, Default)]
pub struct StatusBanner {
    message: Option<StatusMessage>,
    clear_at: Option<Instant>,
}

impl StatusBanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a success message that clears itself after [`BANNER_CLEAR_DELAY`].
    pub fn show_success(&mut self, text: impl Into<String>, now: Instant) {
        self.message = Some(StatusMessage::success(text));
        self.clear_at = Some(now + BANNER_CLEAR_DELAY);
    }

    /// Show a message until something replaces it.
    pub fn show(&mut self, message: StatusMessage) {
        self.message = Some(message);
        self.clear_at = None;
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.message.as_ref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.clear_at
    }

    /// Clear the banner if its time is up. Returns true if it cleared.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.clear_at {
            Some(at) if now >= at => {
                self.message = None;
                self.clear_at = None;
                true
            }
            _ => false,
        }
    }
}
