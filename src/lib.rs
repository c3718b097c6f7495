//! Rhai scripting bindings for the native BH1730 ambient light sensor driver.
//!
//! The native library (I2C traffic, register programming, lux computation) is
//! an external collaborator with a fixed three-function C contract. This crate
//! wraps that contract behind [`native::NativeDriver`], exposes it to Rust as
//! [`sensor::Bh1730`] / [`sensor::SensorInstance`], and to scripts as the
//! `BH1730` Rhai module.
//!
//! Without the `native_driver` feature only [`mock::MockDriver`] is available.

pub mod config;
pub mod error;
#[cfg(feature = "native_driver")]
#[allow(unsafe_code)]
pub mod ffi;
pub mod logging;
pub mod mock;
pub mod native;
pub mod scripting;
pub mod sensor;

pub use error::{AppError, AppResult, SensorError};
pub use native::{NativeDriver, RawHandle, READ_FAILED};
pub use sensor::{Bh1730, ReleasePolicy, SensorInstance, DEFAULT_ADDRESS};
