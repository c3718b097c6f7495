//! Configuration using Figment
//!
//! Configuration is layered, highest precedence last:
//! 1. Built-in defaults
//! 2. `bh1730.toml` (or the file given with `--config`)
//! 3. Environment variables prefixed with `BH1730_`, nested keys split on `__`
//!
//! ```text
//! BH1730_SENSOR__ADDRESS=35
//! BH1730_SENSOR__RELEASE_POLICY=on_drop
//! BH1730_SCRIPT__MAX_OPERATIONS=50000
//! BH1730_LOGGING__LEVEL=debug
//! ```
//!
//! # Example file
//!
//! ```toml
//! [sensor]
//! address = 0x29
//! release_policy = "explicit"
//!
//! [script]
//! max_operations = 10000
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::scripting::DEFAULT_MAX_OPERATIONS;
use crate::sensor::{ReleasePolicy, DEFAULT_ADDRESS};

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "bh1730.toml";

/// Highest 7-bit I2C address
pub const MAX_I2C_ADDRESS: u8 = 0x7F;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A provider failed or a value has the wrong type
    #[error("Configuration load error: {0}")]
    Load(#[from] figment::Error),
    /// Values parsed but are not usable
    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Sensor settings
    pub sensor: SensorSettings,
    /// Script host settings
    pub script: ScriptSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Sensor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    /// I2C address probed by the CLI and exposed to scripts as `SENSOR_ADDR`
    pub address: u8,
    /// What dropping an unclosed sensor does
    pub release_policy: ReleasePolicy,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            release_policy: ReleasePolicy::default(),
        }
    }
}

/// Script host settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    /// Operation budget per script execution
    pub max_operations: u64,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            max_operations: DEFAULT_MAX_OPERATIONS,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Level used when `RUST_LOG` is not set (trace, debug, info, warn, error)
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Load from [`DEFAULT_CONFIG_FILE`] and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from a specific file path and the environment
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings: Self = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("BH1730_").split("__"))
            .extract()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor.address > MAX_I2C_ADDRESS {
            return Err(ConfigError::Validation(format!(
                "Invalid sensor address {:#04x}. Must be a 7-bit I2C address (0x00-0x7f)",
                self.sensor.address
            )));
        }

        if self.script.max_operations == 0 {
            return Err(ConfigError::Validation(
                "script.max_operations must be > 0".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Parse an I2C address given as decimal (`41`) or hex (`0x29`)
pub fn parse_address(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    match parsed {
        Ok(addr) if addr <= MAX_I2C_ADDRESS => Ok(addr),
        Ok(addr) => Err(format!("{:#04x} is not a 7-bit I2C address", addr)),
        Err(e) => Err(format!("invalid I2C address '{}': {}", s, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let settings = Settings::load().map_err(|e| e.to_string())?;
            assert_eq!(settings, Settings::default());
            assert_eq!(settings.sensor.address, 0x29);
            assert_eq!(settings.sensor.release_policy, ReleasePolicy::Explicit);
            assert_eq!(settings.script.max_operations, 10_000);
            Ok(())
        });
    }

    #[test]
    fn test_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                [sensor]
                address = 0x23
                release_policy = "on_drop"

                [logging]
                json = true
                "#,
            )?;
            let settings = Settings::load().map_err(|e| e.to_string())?;
            assert_eq!(settings.sensor.address, 0x23);
            assert_eq!(settings.sensor.release_policy, ReleasePolicy::OnDrop);
            assert!(settings.logging.json);
            assert_eq!(settings.logging.level, "info");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_FILE, "[script]\nmax_operations = 500\n")?;
            jail.set_env("BH1730_SCRIPT__MAX_OPERATIONS", "750");
            jail.set_env("BH1730_LOGGING__LEVEL", "debug");
            let settings = Settings::load().map_err(|e| e.to_string())?;
            assert_eq!(settings.script.max_operations, 750);
            assert_eq!(settings.logging.level, "debug");
            Ok(())
        });
    }

    #[test]
    fn test_validation_rejects_out_of_range_address() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_FILE, "[sensor]\naddress = 200\n")?;
            let err = Settings::load().unwrap_err();
            assert!(matches!(err, ConfigError::Validation(_)));
            Ok(())
        });
    }

    #[test]
    fn test_validation_rejects_zero_budget() {
        let mut settings = Settings::default();
        settings.script.max_operations = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_level() {
        let mut settings = Settings::default();
        settings.logging.level = "verbose".to_string();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("verbose"));
    }

    #[test]
    fn test_to_toml_round_trips_policy() {
        let text = Settings::default().to_toml().unwrap();
        assert!(text.contains("release_policy = \"explicit\""));
        assert!(text.contains("address = 41"));
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x29"), Ok(0x29));
        assert_eq!(parse_address("41"), Ok(0x29));
        assert!(parse_address("0x80").is_err());
        assert!(parse_address("sensor").is_err());
    }
}
