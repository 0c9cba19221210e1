mod config;

pub use config::{
    Co2Config, Config, O2Config, OneBreathConfig, SessionConfig, SpeechConfig,
};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/freedive[-dev]/` based on FREEDIVE_ENV.
///
/// Set FREEDIVE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FREEDIVE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("freedive-dev")
    } else {
        base_dir.join("freedive")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
