//! Rhai scripting host for BH1730 sensors.
//!
//! # Architecture
//!
//! ```text
//! ScriptEngine trait
//!     └── RhaiEngine (blocking execution on tokio's blocking pool)
//!
//! Sensor Bindings
//!     └── BH1730 module, Bh1730 object (SensorHandle)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use bh1730_script::scripting::{RhaiEngine, ScriptEngine};
//!
//! let mut engine = RhaiEngine::with_sensor(factory, 10_000);
//! let script = r#"
//!     let sensor = BH1730::create(0x29);
//!     if type_of(sensor) == "()" { throw "no sensor"; }
//!     print(`lux: ${sensor.read_lux()}`);
//!     sensor.close();
//! "#;
//! engine.execute_script(script).await?;
//! ```

pub mod bindings;
pub mod rhai_engine;
pub mod script_engine;

pub use bindings::{create_sensor, register_bh1730, SensorHandle};
pub use rhai_engine::{RhaiEngine, DEFAULT_MAX_OPERATIONS};
pub use script_engine::{ScriptEngine, ScriptError, ScriptValue};
