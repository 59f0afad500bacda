use std::path::{Path, PathBuf};
use std::time::Duration;

use ponto_core::Endpoints;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Kiosk configuration: optional TOML file, then `PONTO_*` environment overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the recognition service handling check-ins.
    pub checkin_url: String,
    /// Base URL of the enrollment/roster API.
    pub roster_url: String,
    /// V4L2 device path.
    pub camera_device: String,
    pub capture_width: u32,
    pub capture_height: u32,
    /// JPEG quality for captured stills (1–100).
    pub jpeg_quality: u8,
    pub request_timeout_secs: u64,
    /// Frames discarded after the camera opens (AGC/AE stabilization).
    pub warmup_frames: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            checkin_url: "http://127.0.0.1:5000".to_string(),
            roster_url: "http://127.0.0.1:5000/api".to_string(),
            camera_device: "/dev/video0".to_string(),
            capture_width: 640,
            capture_height: 480,
            jpeg_quality: ponto_hw::capture::DEFAULT_JPEG_QUALITY,
            request_timeout_secs: 15,
            warmup_frames: 4,
        }
    }
}

impl Config {
    /// Load from `PONTO_CONFIG` (if set) and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("PONTO_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Override fields from `PONTO_*` variables; unparsable values are ignored.
    pub fn apply_env<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = get("PONTO_CHECKIN_URL") {
            self.checkin_url = v;
        }
        if let Some(v) = get("PONTO_ROSTER_URL") {
            self.roster_url = v;
        }
        if let Some(v) = get("PONTO_CAMERA_DEVICE") {
            self.camera_device = v;
        }
        override_parsed(&get, "PONTO_CAPTURE_WIDTH", &mut self.capture_width);
        override_parsed(&get, "PONTO_CAPTURE_HEIGHT", &mut self.capture_height);
        override_parsed(&get, "PONTO_JPEG_QUALITY", &mut self.jpeg_quality);
        override_parsed(&get, "PONTO_REQUEST_TIMEOUT_SECS", &mut self.request_timeout_secs);
        override_parsed(&get, "PONTO_WARMUP_FRAMES", &mut self.warmup_frames);
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&self.checkin_url, &self.roster_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn override_parsed<F, T>(get: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(raw) = get(key) {
        match raw.parse() {
            Ok(v) => *slot = v,
            Err(_) => tracing::warn!(key, value = %raw, "ignoring unparsable override"),
        }
    }
}
