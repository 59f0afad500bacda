//! Capture-and-submit wizards.
//!
//! Both wizards own their [`CameraSession`](ponto_hw::CameraSession) and
//! split submission into `begin_*` (capture, hand out a [`Ticket`]) and
//! `finish` (apply the verdict). Closing or cancelling a wizard advances
//! its generation, so a verdict that arrives afterwards carries a stale
//! ticket and is dropped without touching state.

pub mod checkin;
pub mod enrollment;

use std::time::Duration;

pub use checkin::{CheckInState, CheckInUpdate, CheckInWizard, Outcome, PendingCheckIn};
pub use enrollment::{EnrollmentStep, EnrollmentUpdate, EnrollmentWizard, PendingEnrollment};

/// Delay before a successful wizard closes itself.
pub const AUTO_CLOSE_DELAY: Duration = Duration::from_secs(2);

/// Proof that a verdict belongs to the wizard run that requested it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Generation(u64);

impl Generation {
    pub(crate) fn ticket(&self) -> Ticket {
        Ticket {
            generation: self.0,
        }
    }

    pub(crate) fn advance(&mut self) {
        self.0 += 1;
    }

    pub(crate) fn is_current(&self, ticket: Ticket) -> bool {
        ticket.generation == self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_invalidates_tickets() {
        let mut generation = Generation::default();
        let ticket = generation.ticket();
        assert!(generation.is_current(ticket));
        generation.advance();
        assert!(!generation.is_current(ticket));
        assert!(generation.is_current(generation.ticket()));
    }
}
