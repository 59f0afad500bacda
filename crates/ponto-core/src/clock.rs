//! Main-screen clock: pt-BR formatting and a cancellable one-second ticker.

use std::time::Duration;

use chrono::{DateTime, Datelike, Local, TimeZone};
use tokio::task::JoinHandle;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

const WEEKDAYS: [&str; 7] = [
    "domingo",
    "segunda-feira",
    "terça-feira",
    "quarta-feira",
    "quinta-feira",
    "sexta-feira",
    "sábado",
];

const MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// `HH:MM:SS`, 24-hour.
pub fn format_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%H:%M:%S").to_string()
}

/// Long pt-BR date, e.g. "segunda-feira, 19 de outubro de 2026".
pub fn format_date<D: Datelike>(date: &D) -> String {
    let weekday = WEEKDAYS[date.weekday().num_days_from_sunday() as usize];
    let month = MONTHS[date.month0() as usize];
    format!("{weekday}, {} de {month} de {}", date.day(), date.year())
}

/// Background task calling `on_tick` every [`TICK_PERIOD`]. Dropping the
/// ticker cancels the task.
pub struct ClockTicker {
    task: JoinHandle<()>,
}

impl ClockTicker {
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(mut on_tick: F) -> Self
    where
        F: FnMut(DateTime<Local>) + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_PERIOD);
            loop {
                interval.tick().await;
                on_tick(Local::now());
            }
        });
        tracing::debug!("clock ticker started");
        Self { task }
    }

    /// Cancel the ticker; same as dropping it.
    pub fn stop(self) {
        drop(self);
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for ClockTicker {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!("clock ticker stopped");
    }
}
