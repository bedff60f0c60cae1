// Configuration types and structures for apuctl
use serde::{Deserialize, Serialize};

/// Bounds applied by the CLI before a TDP target reaches the controller.
/// The controller itself performs no range validation.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TdpLimits {
    #[serde(default = "default_min_tdp_watts")]
    pub min_watts: u32,
    #[serde(default = "default_max_tdp_watts")]
    pub max_watts: u32,
}

// Envelope observed in practice on handheld and thin-and-light APUs.
pub const DEFAULT_MIN_TDP_WATTS: u32 = 4;
pub const DEFAULT_MAX_TDP_WATTS: u32 = 60;

const fn default_min_tdp_watts() -> u32 {
    DEFAULT_MIN_TDP_WATTS
}
const fn default_max_tdp_watts() -> u32 {
    DEFAULT_MAX_TDP_WATTS
}

impl TdpLimits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_watts == 0 {
            return Err(ConfigError::Validation(
                "min_watts must be at least 1 W".to_string(),
            ));
        }
        if self.min_watts >= self.max_watts {
            return Err(ConfigError::Validation(format!(
                "min_watts ({}) must be less than max_watts ({})",
                self.min_watts, self.max_watts
            )));
        }
        Ok(())
    }

    /// Clamp a requested TDP into the configured envelope.
    pub fn clamp(&self, watts: u32) -> u32 {
        watts.clamp(self.min_watts, self.max_watts)
    }
}

impl Default for TdpLimits {
    fn default() -> Self {
        Self {
            min_watts: DEFAULT_MIN_TDP_WATTS,
            max_watts: DEFAULT_MAX_TDP_WATTS,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct WatchConfig {
    #[serde(default = "default_poll_interval_sec")]
    pub poll_interval_sec: u64,
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
    #[serde(default = "default_stats_file_path")]
    pub stats_file_path: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    pub const fn to_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warning => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
        }
    }
}

const fn default_poll_interval_sec() -> u64 {
    1
}

const fn default_log_level() -> LogLevel {
    LogLevel::Info
}

const fn default_stats_file_path() -> Option<String> {
    None
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_sec: default_poll_interval_sec(),
            log_level: default_log_level(),
            stats_file_path: default_stats_file_path(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub tdp: TdpLimits,
    #[serde(default)]
    pub watch: WatchConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tdp.validate()
    }
}

// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.tdp.min_watts, 4);
        assert_eq!(config.tdp.max_watts, 60);
        assert_eq!(config.watch.poll_interval_sec, 1);
        assert_eq!(config.watch.log_level, LogLevel::Info);
    }

    #[test]
    fn partial_sections_keep_per_field_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [tdp]
            max_watts = 28

            [watch]
            poll_interval_sec = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.tdp.min_watts, 4);
        assert_eq!(config.tdp.max_watts, 28);
        assert_eq!(config.watch.poll_interval_sec, 5);
    }

    #[test]
    fn inverted_bounds_fail_validation() {
        let limits = TdpLimits {
            min_watts: 30,
            max_watts: 15,
        };
        assert!(matches!(
            limits.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn clamp_pins_requests_into_the_envelope() {
        let limits = TdpLimits::default();
        assert_eq!(limits.clamp(2), 4);
        assert_eq!(limits.clamp(15), 15);
        assert_eq!(limits.clamp(95), 60);
    }
}
