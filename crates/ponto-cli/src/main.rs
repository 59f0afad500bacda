mod config;
mod kiosk;
mod prompt;
mod rh;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ponto_core::{CheckInWizard, EnrollmentWizard, ServiceClient};
use ponto_hw::{FrameCapturer, SyntheticCamera, V4l2Camera};

use crate::config::Config;
use crate::kiosk::CheckInOptions;
use crate::prompt::Prompt;
use crate::rh::EnrollArgs;

#[derive(Parser)]
#[command(name = "ponto", about = "Face-recognition attendance kiosk")]
struct Cli {
    /// Use a generated test pattern instead of the V4L2 camera
    #[arg(long, global = true)]
    synthetic: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register attendance by face
    Checkin {
        /// Capture as soon as the camera is ready
        #[arg(long)]
        auto: bool,
        /// Stay on the main screen after each check-in
        #[arg(long)]
        repeat: bool,
    },
    /// Enroll a new employee (three-step wizard)
    Enroll {
        #[arg(long)]
        nome: Option<String>,
        /// Department name or its number from `ponto departments`
        #[arg(long)]
        departamento: Option<String>,
        #[arg(long)]
        cargo: Option<String>,
    },
    /// List employees
    Employees {
        /// Filter by name, department or id
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show roster counters
    Stats,
    /// Remove an employee
    Remove {
        /// Employee id
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List the departments accepted at enrollment
    Departments,
    /// List V4L2 capture devices
    Devices,
    /// Show the kiosk clock
    Clock {
        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("failed to load configuration")?;
    tracing::debug!(
        checkin = %config.checkin_url,
        roster = %config.roster_url,
        device = %config.camera_device,
        "configuration loaded"
    );

    let client = ServiceClient::new(config.endpoints(), config.request_timeout())
        .context("failed to build HTTP client")?;
    let capturer = FrameCapturer::new(config.jpeg_quality);
    let mut prompt = Prompt::new();

    match cli.command {
        Commands::Checkin { auto, repeat } => {
            let options = CheckInOptions { auto, repeat };
            if cli.synthetic {
                let camera = SyntheticCamera::test_pattern(config.capture_width, config.capture_height);
                kiosk::run_check_in(&client, CheckInWizard::new(camera, capturer), &mut prompt, options)
                    .await?;
            } else {
                let wizard = CheckInWizard::new(v4l2_camera(&config), capturer);
                kiosk::run_check_in(&client, wizard, &mut prompt, options).await?;
            }
        }
        Commands::Enroll {
            nome,
            departamento,
            cargo,
        } => {
            let args = EnrollArgs {
                nome,
                departamento,
                cargo,
            };
            if cli.synthetic {
                let camera = SyntheticCamera::test_pattern(config.capture_width, config.capture_height);
                rh::run_enroll(&client, EnrollmentWizard::new(camera, capturer), &mut prompt, args)
                    .await?;
            } else {
                let wizard = EnrollmentWizard::new(v4l2_camera(&config), capturer);
                rh::run_enroll(&client, wizard, &mut prompt, args).await?;
            }
        }
        Commands::Employees { search } => rh::run_employees(&client, search.as_deref()).await?,
        Commands::Stats => rh::run_stats(&client).await?,
        Commands::Remove { id, yes } => rh::run_remove(&client, &mut prompt, id, yes).await?,
        Commands::Departments => rh::run_departments(),
        Commands::Devices => kiosk::run_devices(),
        Commands::Clock { seconds } => kiosk::run_clock(seconds).await?,
    }

    Ok(())
}

/// Wizard deadlines follow tokio's clock so paused-time tests can drive them.
pub(crate) fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

fn v4l2_camera(config: &Config) -> V4l2Camera {
    V4l2Camera::new(
        config.camera_device.clone(),
        config.capture_width,
        config.capture_height,
    )
    .with_warmup(config.warmup_frames)
}
