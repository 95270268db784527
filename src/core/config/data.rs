use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::constants::{DEFAULT_SERVER_URL, DEFAULT_TYPEWRITER_INTERVAL_MS, WELCOME_MESSAGE};

/// Settings persisted in `config.toml`. Unset keys fall back to built-in defaults.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the conversation service; the socket URL is derived from it
    pub server_url: Option<String>,
    /// Assistant greeting shown on startup and after clearing
    pub greeting: Option<String>,
    /// Delay between revealed characters of assistant replies (0 disables the effect)
    pub typewriter_interval_ms: Option<u64>,
    /// Draw the animated backdrop
    pub background: Option<bool>,
    /// Number of orbiting particles in the backdrop
    pub particle_count: Option<usize>,
}

/// Keys accepted by `weai set` / `weai unset`.
pub const CONFIG_KEYS: &[&str] = &[
    "server-url",
    "greeting",
    "typewriter-interval-ms",
    "background",
    "particle-count",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigKeyError {
    UnknownKey(String),
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl fmt::Display for ConfigKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKeyError::UnknownKey(key) => write!(
                f,
                "Unknown config key: {key} (expected one of: {})",
                CONFIG_KEYS.join(", ")
            ),
            ConfigKeyError::InvalidValue {
                key,
                value,
                expected,
            } => write!(f, "Invalid value for {key}: {value:?} (expected {expected})"),
        }
    }
}

impl StdError for ConfigKeyError {}

impl Config {
    pub fn server_url(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn greeting(&self) -> &str {
        self.greeting.as_deref().unwrap_or(WELCOME_MESSAGE)
    }

    pub fn typewriter_interval(&self) -> Duration {
        Duration::from_millis(
            self.typewriter_interval_ms
                .unwrap_or(DEFAULT_TYPEWRITER_INTERVAL_MS),
        )
    }

    pub fn background_enabled(&self) -> bool {
        self.background.unwrap_or(true)
    }

    pub fn particle_count(&self) -> Option<usize> {
        self.particle_count
    }

    pub fn set_key(&mut self, key: &str, value: &str) -> Result<(), ConfigKeyError> {
        let value = value.trim();
        match key {
            "server-url" => {
                if value.is_empty() {
                    return Err(ConfigKeyError::InvalidValue {
                        key: "server-url",
                        value: value.to_string(),
                        expected: "a URL such as http://localhost:8000",
                    });
                }
                self.server_url = Some(value.to_string());
            }
            "greeting" => self.greeting = Some(value.to_string()),
            "typewriter-interval-ms" => {
                let ms = value
                    .parse::<u64>()
                    .map_err(|_| ConfigKeyError::InvalidValue {
                        key: "typewriter-interval-ms",
                        value: value.to_string(),
                        expected: "a whole number of milliseconds",
                    })?;
                self.typewriter_interval_ms = Some(ms);
            }
            "background" => {
                self.background = Some(parse_switch(value).ok_or_else(|| {
                    ConfigKeyError::InvalidValue {
                        key: "background",
                        value: value.to_string(),
                        expected: "on or off",
                    }
                })?);
            }
            "particle-count" => {
                let count = value
                    .parse::<usize>()
                    .map_err(|_| ConfigKeyError::InvalidValue {
                        key: "particle-count",
                        value: value.to_string(),
                        expected: "a non-negative integer",
                    })?;
                self.particle_count = Some(count);
            }
            other => return Err(ConfigKeyError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    pub fn unset_key(&mut self, key: &str) -> Result<(), ConfigKeyError> {
        match key {
            "server-url" => self.server_url = None,
            "greeting" => self.greeting = None,
            "typewriter-interval-ms" => self.typewriter_interval_ms = None,
            "background" => self.background = None,
            "particle-count" => self.particle_count = None,
            other => return Err(ConfigKeyError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
