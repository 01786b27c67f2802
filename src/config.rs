//! Configuration loading for studygate.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.studygate/config.toml`)
//! 3. User config (`~/.studygate/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. The engine runs with the stock free-tier
//! limits and the device-local calendar when no config exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{Limits, TimezonePolicy, DAILY_CAP, FREE_COURSE_LIMIT};
use crate::error::{Result, StudyGateError};

/// Main configuration struct for studygate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Free-tier limits.
    pub limits: Limits,
    /// Day-boundary policy.
    pub clock: ClockConfig,
    /// Log filter configuration.
    pub logging: LoggingConfig,
}

/// Day-boundary configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClockConfig {
    /// Timezone used to compute "today": "local", "utc", or a fixed
    /// offset such as "+05:30".
    pub timezone: String,
}

impl ClockConfig {
    /// Resolve the configured timezone into a policy.
    ///
    /// Unparseable values fall back to the device-local calendar.
    pub fn policy(&self) -> TimezonePolicy {
        TimezonePolicy::parse(&self.timezone).unwrap_or_else(|| {
            tracing::warn!(
                timezone = %self.timezone,
                "unrecognized clock.timezone, using local"
            );
            TimezonePolicy::Local
        })
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            timezone: "local".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive, e.g. "warn" or "studygate=debug".
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

/// Minimum valid value for either limit.
pub const MIN_LIMIT: u32 = 1;

/// Env var holding the `tracing` filter directive; overrides `logging.filter`.
pub const LOG_ENV: &str = "STUDYGATE_LOG";

/// One config file as written. Unset keys stay `None` so a layer can set a
/// value equal to the default and still override the layer below it.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
struct ConfigLayer {
    limits: LimitsLayer,
    clock: ClockLayer,
    logging: LoggingLayer,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
struct LimitsLayer {
    daily_cap: Option<u32>,
    free_course_limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
struct ClockLayer {
    timezone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
struct LoggingLayer {
    filter: Option<String>,
}

impl Config {
    /// Load configuration with full precedence chain.
    pub fn load() -> Self {
        let cwd = env::current_dir().ok();
        Self::load_layers(cwd.as_deref())
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        Self::load_layers(Some(cwd))
    }

    /// Defaults, then user config, then project config (if `cwd` is known),
    /// then env vars. Out-of-range limits are reset with a warning on stderr.
    fn load_layers(cwd: Option<&Path>) -> Self {
        let mut config = Config::default();

        if let Some(layer) =
            studygate_home().and_then(|home| read_layer_if_present(&home.join("config.toml")))
        {
            config = config.merge(layer);
        }

        if let Some(layer) = cwd
            .and_then(project_dir)
            .and_then(|dir| read_layer_if_present(&dir.join("config.toml")))
        {
            config = config.merge(layer);
        }

        config.apply_env_overrides();

        for warning in config.sanitize() {
            eprintln!("Warning: {}", warning);
        }

        config
    }

    /// Load config from a specific file path, on top of the defaults.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        Ok(Config::default().merge(read_layer(path)?))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Some(n) = env_limit("STUDYGATE_DAILY_CAP", self.limits.daily_cap) {
            self.limits.daily_cap = n;
        }

        if let Some(n) = env_limit("STUDYGATE_FREE_COURSE_LIMIT", self.limits.free_course_limit) {
            self.limits.free_course_limit = n;
        }

        if let Ok(val) = env::var("STUDYGATE_TIMEZONE") {
            if TimezonePolicy::parse(&val).is_some() {
                self.clock.timezone = val;
            } else {
                eprintln!(
                    "Warning: Invalid STUDYGATE_TIMEZONE value '{}'. \
                    Expected \"local\", \"utc\" or \"+HH:MM\". Using '{}'.",
                    val, self.clock.timezone
                );
            }
        }

        if let Ok(val) = env::var(LOG_ENV) {
            if !val.trim().is_empty() {
                self.logging.filter = val;
            }
        }
    }

    /// Reset limits below the minimum to their defaults.
    ///
    /// Returns one message per reset field.
    fn sanitize(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.limits.daily_cap < MIN_LIMIT {
            warnings.push(format!(
                "limits.daily_cap = {} is below {}. Using {}.",
                self.limits.daily_cap, MIN_LIMIT, DAILY_CAP
            ));
            self.limits.daily_cap = DAILY_CAP;
        }
        if self.limits.free_course_limit < MIN_LIMIT {
            warnings.push(format!(
                "limits.free_course_limit = {} is below {}. Using {}.",
                self.limits.free_course_limit, MIN_LIMIT, FREE_COURSE_LIMIT
            ));
            self.limits.free_course_limit = FREE_COURSE_LIMIT;
        }
        warnings
    }

    /// Merge a config file layer into this one, field by field.
    fn merge(mut self, layer: ConfigLayer) -> Self {
        if let Some(n) = layer.limits.daily_cap {
            self.limits.daily_cap = n;
        }
        if let Some(n) = layer.limits.free_course_limit {
            self.limits.free_course_limit = n;
        }
        if let Some(timezone) = layer.clock.timezone {
            self.clock.timezone = timezone;
        }
        if let Some(filter) = layer.logging.filter {
            self.logging.filter = filter;
        }
        self
    }
}

fn read_layer(path: &Path) -> Result<ConfigLayer> {
    let content = fs::read_to_string(path).map_err(|e| StudyGateError::storage(path, e))?;
    toml::from_str(&content).map_err(|e| StudyGateError::config(e.to_string()))
}

/// A missing file is no layer; a broken one is skipped with a warning.
fn read_layer_if_present(path: &Path) -> Option<ConfigLayer> {
    if !path.is_file() {
        return None;
    }
    match read_layer(path) {
        Ok(layer) => Some(layer),
        Err(err) => {
            eprintln!("Warning: Ignoring {}: {}", path.display(), err);
            None
        }
    }
}

/// Parse a positive limit from an environment variable.
fn env_limit(name: &str, current: u32) -> Option<u32> {
    let val = env::var(name).ok()?;
    match val.parse::<u32>() {
        Ok(n) if n >= MIN_LIMIT => Some(n),
        _ => {
            eprintln!(
                "Warning: Invalid {} value '{}'. \
                Expected an integer >= {}. Using '{}'.",
                name, val, MIN_LIMIT, current
            );
            None
        }
    }
}

/// Get the studygate home directory.
///
/// Checks `STUDYGATE_HOME` first, then falls back to `~/.studygate`.
pub fn studygate_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("STUDYGATE_HOME") {
        if home.is_empty() {
            tracing::warn!("STUDYGATE_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("STUDYGATE_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".studygate"));
    }

    let fallback_path = env::temp_dir().join("studygate");
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback_path.display()
    );
    Some(fallback_path)
}

/// Get the profiles directory (`<home>/profiles/`).
pub fn profiles_dir() -> Option<PathBuf> {
    studygate_home().map(|h| h.join("profiles"))
}

/// Find the nearest `.studygate/` directory at or above `cwd`.
pub fn project_dir(cwd: &Path) -> Option<PathBuf> {
    cwd.ancestors()
        .map(|ancestor| ancestor.join(".studygate"))
        .find(|dir| dir.is_dir())
}
