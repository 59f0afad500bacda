//! Cached roster with token-guarded refreshes.
//!
//! The refresh token moves forward whenever the roster is known to be out
//! of date (a removal or a completed enrollment). Each fetch is tagged with
//! the token current when it started; a result whose token has since moved
//! on is ignored, so a slow stale fetch never overwrites a newer one.

use crate::client::{AttendanceService, Verdict};
use crate::error::LoadError;
use crate::types::{Employee, Stats, StatusMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    token: u64,
}

impl RefreshTicket {
    pub fn token(&self) -> u64 {
        self.token
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// A newer refresh token was set while this fetch was in flight.
    Stale,
    /// Prior data kept; the message explains why.
    Failed(StatusMessage),
}

#[derive(Debug, Default)]
pub struct Roster {
    employees: Vec<Employee>,
    stats: Stats,
    token: u64,
    loaded: bool,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    /// Whether at least one refresh has been applied.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Mark the cached data as out of date.
    pub fn invalidate(&mut self) -> u64 {
        self.token += 1;
        tracing::debug!(token = self.token, "roster invalidated");
        self.token
    }

    pub fn begin_refresh(&self) -> RefreshTicket {
        RefreshTicket { token: self.token }
    }

    pub fn apply(
        &mut self,
        ticket: RefreshTicket,
        result: Result<(Vec<Employee>, Stats), LoadError>,
    ) -> RefreshOutcome {
        if ticket.token != self.token {
            tracing::debug!(
                started = ticket.token,
                current = self.token,
                "ignoring stale roster fetch"
            );
            return RefreshOutcome::Stale;
        }

        match result {
            Ok((employees, stats)) => {
                tracing::info!(count = employees.len(), token = self.token, "roster refreshed");
                self.employees = employees;
                self.stats = stats;
                self.loaded = true;
                RefreshOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(error = %e, "roster refresh failed");
                RefreshOutcome::Failed(e.status())
            }
        }
    }

    /// Fetch employees and stats together and apply them.
    pub async fn refresh<S: AttendanceService>(&mut self, service: &S) -> RefreshOutcome {
        let ticket = self.begin_refresh();
        let (employees, stats) = tokio::join!(service.list_employees(), service.fetch_stats());
        let result = employees.and_then(|e| stats.map(|s| (e, s)));
        self.apply(ticket, result)
    }

    /// Remove an employee; a successful removal invalidates the roster.
    pub async fn remove<S: AttendanceService>(&mut self, service: &S, id: i64) -> Verdict {
        let verdict = service.remove_employee(id).await;
        if verdict.is_success() {
            self.invalidate();
        }
        verdict
    }

    /// Employees matching `term` (all of them for an empty term).
    pub fn filter(&self, term: &str) -> Vec<&Employee> {
        let term = term.trim();
        self.employees
            .iter()
            .filter(|e| term.is_empty() || e.matches(term))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(id: i64, nome: &str) -> Employee {
        Employee {
            id,
            nome: nome.into(),
            departamento: Some("Operações".into()),
            cargo: Some("Técnico".into()),
            status: Some("Inativo".into()),
            admissao: Some("10/01/2025".into()),
        }
    }

    fn stats(total: u64) -> Stats {
        Stats {
            total,
            ativos: 0,
            inativos: total,
            departamentos: 1,
        }
    }

    #[test]
    fn test_apply_current_ticket() {
        let mut roster = Roster::new();
        let ticket = roster.begin_refresh();
        let outcome = roster.apply(ticket, Ok((vec![employee(1, "Ana")], stats(1))));
        assert_eq!(outcome, RefreshOutcome::Applied);
        assert!(roster.is_loaded());
        assert_eq!(roster.stats().total, 1);
    }

    #[test]
    fn test_stale_fetch_does_not_overwrite_newer() {
        let mut roster = Roster::new();
        let old = roster.begin_refresh();
        assert_eq!(old.token(), 0);

        assert_eq!(roster.invalidate(), 1);
        let new = roster.begin_refresh();
        roster.apply(new, Ok((vec![employee(2, "Bruno")], stats(1))));

        // The older fetch resolves last.
        let outcome = roster.apply(old, Ok((vec![employee(1, "Ana"), employee(2, "Bruno")], stats(2))));
        assert_eq!(outcome, RefreshOutcome::Stale);
        assert_eq!(roster.employees().len(), 1);
        assert_eq!(roster.employees()[0].nome, "Bruno");
    }

    #[test]
    fn test_failed_refresh_keeps_cached_data() {
        let mut roster = Roster::new();
        let t = roster.begin_refresh();
        roster.apply(t, Ok((vec![employee(1, "Ana")], stats(1))));

        let t = roster.begin_refresh();
        let outcome = roster.apply(
            t,
            Err(LoadError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)),
        );
        assert!(matches!(outcome, RefreshOutcome::Failed(ref m) if m.is_error()));
        assert_eq!(roster.employees().len(), 1);
    }

    #[test]
    fn test_filter() {
        let mut roster = Roster::new();
        let t = roster.begin_refresh();
        roster.apply(
            t,
            Ok((vec![employee(1, "Ana Lima"), employee(23, "Bruno Reis")], stats(2))),
        );
        assert_eq!(roster.filter("").len(), 2);
        assert_eq!(roster.filter("bruno").len(), 1);
        assert_eq!(roster.filter("23")[0].nome, "Bruno Reis");
        assert!(roster.filter("zzz").is_empty());
    }
}
