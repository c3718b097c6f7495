//! Custom error types for the binding.
//!
//! The native driver reports failure only through sentinels: a null handle from
//! the probe and `-1` from a read. The sentinel surface of
//! [`crate::sensor::SensorInstance`] keeps that contract. The `try_*` methods
//! translate the same sentinels into [`SensorError`] so Rust callers can use `?`.
//!
//! ## Error Hierarchy
//!
//! - **`SensorError`**: the explicit result layer over the native sentinels.
//! - **`ConfigError`** (in [`crate::config`]): figment load and validation failures.
//! - **`ScriptError`** (in [`crate::scripting`]): compilation and runtime failures
//!   of a Rhai script.
//! - **`AppError`**: consolidates the above for the command line front end.
//!
//! No variant carries a failure cause beyond what the native layer reveals.
//! A bus error, an absent sensor and a transient fault all look the same.

use crate::config::ConfigError;
use crate::native::RawHandle;
use crate::scripting::ScriptError;
use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Failures of a single sensor operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// The native probe returned a null handle.
    #[error("no BH1730 sensor initialized at address {addr:#04x}")]
    InitFailed {
        /// I2C address passed to the probe.
        addr: i32,
    },

    /// The native read returned the failure sentinel.
    #[error("lux read failed for sensor handle {handle}")]
    ReadFailed {
        /// Handle the read was issued against.
        handle: RawHandle,
    },

    /// The sensor handle was already released.
    #[error("sensor handle is closed")]
    Closed,

    /// The native library registration hook reported failure.
    #[error("native BH1730 library failed to initialize")]
    LibraryInit,
}

/// Top-level error for the command line front end.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    #[error("Logging setup error: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SensorError::InitFailed { addr: 0x29 };
        assert_eq!(err.to_string(), "no BH1730 sensor initialized at address 0x29");

        let err = SensorError::ReadFailed {
            handle: RawHandle::from_raw(0x1000),
        };
        assert_eq!(err.to_string(), "lux read failed for sensor handle 0x1000");
    }

    #[test]
    fn test_app_error_from_sensor() {
        let err: AppError = SensorError::Closed.into();
        assert_eq!(err.to_string(), "Sensor error: sensor handle is closed");
    }
}
