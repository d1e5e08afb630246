//! Logging setup for applications embedding the exporter.
//!
//! The library only emits `tracing` events; it never installs a subscriber
//! on its own. Call [`init_logging`] once at startup to get either
//! human-readable lines or JSON lines on stderr.
//!
//! Configuration sources, lowest to highest precedence:
//! - built-in defaults (`info`, human format)
//! - `RUST_LOG`, consulted only when `SUITCASE_LOG` is unset
//! - `SUITCASE_LOG`
//! - `SUITCASE_LOG_FORMAT`
//! - explicit overrides passed to [`LogConfig::from_env`]
//!
//! A bare level keyword in `RUST_LOG` is applied to the exporter crates like
//! `SUITCASE_LOG`. A full `RUST_LOG` directive (`sc_json_metadata=trace,...`)
//! is installed as given, unless `SUITCASE_LOG` or an explicit level decided.

use std::io::IsTerminal;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Level env var.
pub const LOG_ENV: &str = "SUITCASE_LOG";
/// Format env var.
pub const LOG_FORMAT_ENV: &str = "SUITCASE_LOG_FORMAT";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per event.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

/// Verbosity applied to the exporter crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::Off,
        ]
        .into_iter()
        .find(|level| level.as_str() == lowered)
        .ok_or_else(|| format!("unknown log level: {}", s))
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Include timestamps in human output.
    pub timestamps: bool,
    /// Full `RUST_LOG` directive installed instead of the per-crate filter.
    pub env_directive: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            timestamps: true,
            env_directive: None,
        }
    }
}

impl LogConfig {
    /// Create config from the process environment and explicit overrides.
    pub fn from_env(level: Option<LogLevel>, format: Option<LogFormat>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), level, format)
    }

    /// Same as [`LogConfig::from_env`] with a custom variable lookup.
    pub fn from_lookup<F>(lookup: F, level: Option<LogLevel>, format: Option<LogFormat>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LogConfig::default();

        if let Some(val) = lookup(LOG_ENV) {
            if let Ok(parsed) = val.parse::<LogLevel>() {
                config.level = parsed;
            }
        } else if let Some(val) = lookup("RUST_LOG") {
            match val.trim().parse::<LogLevel>() {
                Ok(parsed) => config.level = parsed,
                Err(_) if !val.trim().is_empty() => {
                    config.env_directive = Some(val.trim().to_string())
                }
                Err(_) => {}
            }
        }

        if let Some(val) = lookup(LOG_FORMAT_ENV) {
            if let Ok(parsed) = val.parse::<LogFormat>() {
                config.format = parsed;
            }
        }

        if let Some(level) = level {
            config.level = level;
            config.env_directive = None;
        }
        if let Some(format) = format {
            config.format = format;
        }
        config
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the level, dropping any `RUST_LOG` directive.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self.env_directive = None;
        self
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    /// Default filter directive covering the exporter crates.
    pub fn filter_directive(&self) -> String {
        format!(
            "sc_json_metadata={level},sc_event_model={level}",
            level = self.level
        )
    }

    /// Filter installed by [`init_logging`].
    ///
    /// An unparseable `RUST_LOG` directive falls back to the per-crate filter.
    pub fn env_filter(&self) -> EnvFilter {
        self.env_directive
            .as_deref()
            .and_then(|directive| EnvFilter::try_new(directive).ok())
            .unwrap_or_else(|| EnvFilter::new(self.filter_directive()))
    }
}

/// Install a global subscriber writing to stderr.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = config.env_filter();

    match config.format {
        LogFormat::Human => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer)
                    .try_init()
                    .is_ok()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer.without_time())
                    .try_init()
                    .is_ok()
            }
        }
        LogFormat::Jsonl => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            )
            .try_init()
            .is_ok(),
    }
}
