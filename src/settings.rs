//! Runtime settings
//!
//! Defaults, optionally overridden by a JSON file and then by command-line
//! arguments.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{FRAME_RATE, SERIAL_BAUD_RATE};

/// Settings loading and validation failures
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Controller transport: a serial device path or `tcp:<host>:<port>`
    pub port: Option<String>,
    /// Serial line speed
    pub baud_rate: u32,
    /// Bytes requested per transport read
    pub read_chunk: usize,
    /// Read timeout for transports that support one
    pub read_timeout_ms: u64,
    /// Undelivered events held before the reader waits
    pub mailbox_capacity: usize,
    /// Target frames per second
    pub frame_rate: u32,
    /// Pipe RNG seed, random when unset
    pub seed: Option<u64>,
    /// Start with test mode enabled
    pub test_mode: bool,
    /// Print JSON snapshots instead of drawing the terminal HUD
    pub headless: bool,
}

/// Command-line options
#[derive(Debug, Parser)]
#[command(name = "flapic")]
#[command(about = "Flappy-style arcade game for a button or sensor controller board")]
pub struct Cli {
    /// Serial device path or `tcp:<host>:<port>` of the controller board
    pub port: Option<String>,
    /// JSON settings file, applied before the other options
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Serial line speed
    #[arg(long)]
    pub baud: Option<u32>,
    /// Pipe RNG seed
    #[arg(long)]
    pub seed: Option<u64>,
    /// Start with test mode enabled (collisions never end the round)
    #[arg(long)]
    pub test_mode: bool,
    /// Print JSON snapshots instead of drawing the terminal HUD
    #[arg(long)]
    pub headless: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: SERIAL_BAUD_RATE,
            read_chunk: 64,
            read_timeout_ms: 100,
            mailbox_capacity: 256,
            frame_rate: FRAME_RATE,
            seed: None,
            test_mode: false,
            headless: false,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file; missing fields keep their defaults
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Build settings from parsed command-line arguments.
    ///
    /// `--config FILE` is applied first; other options override it.
    pub fn from_cli(cli: Cli) -> Result<Self, SettingsError> {
        let mut settings = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(port) = cli.port {
            settings.port = Some(port);
        }
        if let Some(baud_rate) = cli.baud {
            settings.baud_rate = baud_rate;
        }
        if let Some(seed) = cli.seed {
            settings.seed = Some(seed);
        }
        settings.test_mode |= cli.test_mode;
        settings.headless |= cli.headless;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the runtime cannot work with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.baud_rate == 0 {
            return Err(SettingsError::Invalid("baud_rate must be positive".into()));
        }
        if self.read_chunk == 0 {
            return Err(SettingsError::Invalid("read_chunk must be positive".into()));
        }
        if self.mailbox_capacity == 0 {
            return Err(SettingsError::Invalid(
                "mailbox_capacity must be positive".into(),
            ));
        }
        if self.frame_rate == 0 {
            return Err(SettingsError::Invalid("frame_rate must be positive".into()));
        }
        Ok(())
    }
}
