//! Main kiosk screen: clock, check-in loop and the success banner.

use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Local;
use ponto_core::clock::{format_date, format_time, ClockTicker};
use ponto_core::wizard::checkin::CheckInUpdate;
use ponto_core::{AttendanceService, CheckInWizard, StatusBanner};
use ponto_hw::CameraDevice;

use crate::prompt::Prompt;

pub struct CheckInOptions {
    /// Capture immediately instead of waiting for Enter.
    pub auto: bool,
    /// Return to the main screen after each session instead of exiting.
    pub repeat: bool,
}

pub async fn run_check_in<S, D>(
    service: &S,
    mut wizard: CheckInWizard<D>,
    prompt: &mut Prompt,
    options: CheckInOptions,
) -> Result<()>
where
    S: AttendanceService,
    D: CameraDevice,
{
    let mut banner = StatusBanner::new();

    loop {
        main_screen(&mut banner);
        if options.repeat {
            match prompt.ask("[Enter] registrar ponto, [q] sair: ").await? {
                None => break,
                Some(answer) if answer.eq_ignore_ascii_case("q") => break,
                Some(_) => {}
            }
        }

        let recorded = check_in_session(service, &mut wizard, prompt, &options).await?;
        if let Some(message) = recorded {
            banner.show_success(message, crate::now());
        }
        if !options.repeat {
            if let Some(current) = banner.current() {
                println!("✔ {}", current.text);
            }
            break;
        }
    }

    wizard.close();
    Ok(())
}

fn main_screen(banner: &mut StatusBanner) {
    banner.poll(crate::now());
    let now = Local::now();
    println!();
    println!("{}  {}", format_time(&now), format_date(&now.date_naive()));
    if let Some(current) = banner.current() {
        println!("✔ {}", current.text);
    }
}

/// One open/capture/submit cycle. Returns the success message, if any.
///
/// In repeat mode a camera failure sends the operator back to the main
/// screen, where the next check-in reopens the camera.
async fn check_in_session<S, D>(
    service: &S,
    wizard: &mut CheckInWizard<D>,
    prompt: &mut Prompt,
    options: &CheckInOptions,
) -> Result<Option<String>>
where
    S: AttendanceService,
    D: CameraDevice,
{
    let auto = options.auto;
    if let Err(e) = wizard.open() {
        println!("✖ {}", wizard.status().text);
        wizard.close();
        if options.repeat {
            tracing::warn!(error = %e, "check-in camera unavailable");
            return Ok(None);
        }
        return Err(e.into());
    }

    loop {
        println!("{}", wizard.status().text);
        if !auto {
            match prompt.ask("[Enter] capturar, [c] cancelar: ").await? {
                None => break,
                Some(answer) if answer.eq_ignore_ascii_case("c") => break,
                Some(_) => {}
            }
        }

        let pending = match wizard.begin_capture() {
            Ok(pending) => pending,
            Err(e) if auto => {
                wizard.close();
                return Err(e.into());
            }
            Err(e) => {
                tracing::debug!(error = %e, "capture refused");
                continue;
            }
        };
        println!("{}", wizard.status().text);

        let update = tokio::select! {
            verdict = service.submit_check_in(&pending.image) => {
                wizard.finish(pending.ticket, verdict, crate::now())
            }
            _ = tokio::signal::ctrl_c() => {
                wizard.close();
                println!("Cancelado.");
                return Ok(None);
            }
        };

        match update {
            CheckInUpdate::CheckedIn { message } => {
                println!("{}", wizard.status().text);
                if let Some(deadline) = wizard.close_deadline() {
                    tokio::time::sleep_until(deadline.into()).await;
                }
                wizard.poll_timers(crate::now());
                return Ok(Some(message));
            }
            CheckInUpdate::Retry { error } => {
                println!("✖ {}", wizard.status().text);
                if auto {
                    wizard.close();
                    bail!(error);
                }
            }
            CheckInUpdate::Discarded => return Ok(None),
        }
    }

    wizard.close();
    Ok(None)
}

/// Print the ticking clock for `seconds`, or until Ctrl-C when `None`.
pub async fn run_clock(seconds: Option<u64>) -> Result<()> {
    println!("{}", format_date(&Local::now().date_naive()));
    let ticker = ClockTicker::spawn(|now| {
        print!("\r{}", format_time(&now));
        let _ = std::io::Write::flush(&mut std::io::stdout());
    });

    match seconds {
        Some(secs) => {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
                _ = tokio::signal::ctrl_c() => {}
            }
        }
        None => tokio::signal::ctrl_c().await?,
    }

    ticker.stop();
    println!();
    Ok(())
}

pub fn run_devices() {
    let devices = ponto_hw::camera::list_devices();
    if devices.is_empty() {
        println!("Nenhuma câmera encontrada.");
        return;
    }
    for dev in devices {
        println!("{}  {} ({}, {})", dev.path, dev.name, dev.driver, dev.bus);
    }
}
