//! # Configuration Module
//!
//! Runtime knobs for a simulation run: the subscription price split among
//! artists, the length of an ad break, the width of "top" projections, and the
//! recommendation limits.
//!
//! ## Lookup order
//!
//! 1. An explicit path passed with `--config`
//! 2. The platform config directory:
//!    - Linux: `~/.config/encore/config.json`
//!    - macOS: `~/Library/Application Support/encore/config.json`
//!    - Windows: `%APPDATA%\encore\config.json`
//! 3. Built-in defaults
//!
//! Fields missing from a config file keep their default values.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tunable parameters for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Money one premium listener pays out across the artists they played.
    pub subscription_price: f64,
    /// Seconds an inserted ad plays before the collection resumes.
    pub ad_duration: u32,
    /// Width of every "top" projection (wrapped, top fans).
    pub top_limit: usize,
    /// Seconds of the current song that must have played before a random song
    /// is recommended.
    pub min_listen_seconds: u32,
    /// How many genres a random playlist draws from.
    pub playlist_genres: usize,
    /// Songs taken per genre (random playlist) or per fan (fan club playlist).
    pub songs_per_bucket: usize,
    /// How many top fans a fan club playlist draws from.
    pub fans_per_playlist: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            subscription_price: 1_000_000.0,
            ad_duration: 10,
            top_limit: 5,
            min_listen_seconds: 30,
            playlist_genres: 3,
            songs_per_bucket: 5,
            fans_per_playlist: 5,
        }
    }
}

impl SimulationConfig {
    /// Reads a config file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid JSON for this type.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Resolves the configuration using the lookup order described above.
    ///
    /// # Errors
    ///
    /// Fails if an explicit path is given and cannot be loaded, or if the
    /// default config file exists but is malformed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            debug!("Loading config from {}", path.display());
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(path) if path.is_file() => {
                debug!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Platform-appropriate location of the optional config file.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("encore").join("config.json"))
}
