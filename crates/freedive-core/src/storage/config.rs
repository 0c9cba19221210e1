//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Starting parameters and round count for each table
//! - Tick length of the session timer
//! - Whether speech cues are enabled
//!
//! Configuration is stored at `~/.config/freedive/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use super::data_dir;
use crate::controller::{
    Co2Controller, Co2Params, O2Controller, O2Params, OneBreathController, OneBreathParams,
    DEFAULT_ROUNDS,
};
use crate::error::{ConfigError, CoreError, Result};

/// CO2 table defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Co2Config {
    #[serde(default = "default_co2_min_recovery")]
    pub min_recovery_ms: u64,
    #[serde(default = "default_hold")]
    pub hold_ms: u64,
    #[serde(default = "default_rounds")]
    pub rounds: usize,
}

/// O2 table defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct O2Config {
    #[serde(default = "default_o2_recovery")]
    pub recovery_ms: u64,
    #[serde(default = "default_o2_target_hold")]
    pub target_hold_ms: u64,
    #[serde(default = "default_rounds")]
    pub rounds: usize,
}

/// One-breath table defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneBreathConfig {
    #[serde(default = "default_hold")]
    pub hold_ms: u64,
    #[serde(default = "default_one_breath")]
    pub one_breath_ms: u64,
    #[serde(default = "default_rounds")]
    pub rounds: usize,
}

/// Session timer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Wall-clock length of one countdown second.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

/// Speech configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/freedive/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub co2: Co2Config,
    #[serde(default)]
    pub o2: O2Config,
    #[serde(default)]
    pub one_breath: OneBreathConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

// Default functions
fn default_co2_min_recovery() -> u64 {
    Co2Params::default().min_recovery_ms
}
fn default_hold() -> u64 {
    60_000
}
fn default_o2_recovery() -> u64 {
    O2Params::default().recovery_ms
}
fn default_o2_target_hold() -> u64 {
    O2Params::default().target_hold_ms
}
fn default_one_breath() -> u64 {
    OneBreathParams::default().one_breath_ms
}
fn default_rounds() -> usize {
    DEFAULT_ROUNDS
}
fn default_tick_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}

impl Default for Co2Config {
    fn default() -> Self {
        Self {
            min_recovery_ms: default_co2_min_recovery(),
            hold_ms: default_hold(),
            rounds: default_rounds(),
        }
    }
}

impl Default for O2Config {
    fn default() -> Self {
        Self {
            recovery_ms: default_o2_recovery(),
            target_hold_ms: default_o2_target_hold(),
            rounds: default_rounds(),
        }
    }
}

impl Default for OneBreathConfig {
    fn default() -> Self {
        Self {
            hold_ms: default_hold(),
            one_breath_ms: default_one_breath(),
            rounds: default_rounds(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<()> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown().into());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) => return Err(unknown().into()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown().into())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults there if the file
    /// does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Same as [`Config::load`] for an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                CoreError::from(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value has the wrong type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        Ok(())
    }

    /// Every leaf key with its value, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.session.tick_ms.max(1))
    }

    pub fn co2_params(&self) -> Co2Params {
        Co2Params {
            min_recovery_ms: self.co2.min_recovery_ms,
            hold_ms: self.co2.hold_ms,
        }
    }

    pub fn o2_params(&self) -> O2Params {
        O2Params {
            recovery_ms: self.o2.recovery_ms,
            target_hold_ms: self.o2.target_hold_ms,
        }
    }

    pub fn one_breath_params(&self) -> OneBreathParams {
        OneBreathParams {
            hold_ms: self.one_breath.hold_ms,
            one_breath_ms: self.one_breath.one_breath_ms,
        }
    }

    pub fn co2_controller(&self, runtime: Handle) -> Co2Controller {
        Co2Controller::with_params(self.co2_params(), self.co2.rounds, runtime, self.tick())
    }

    pub fn o2_controller(&self, runtime: Handle) -> O2Controller {
        O2Controller::with_params(self.o2_params(), self.o2.rounds, runtime, self.tick())
    }

    pub fn one_breath_controller(&self, runtime: Handle) -> OneBreathController {
        OneBreathController::with_params(
            self.one_breath_params(),
            self.one_breath.rounds,
            runtime,
            self.tick(),
        )
    }
}
