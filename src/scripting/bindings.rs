//! Rhai bindings for the BH1730 sensor.
//!
//! Registers a static `BH1730` module and a `Bh1730` object type:
//!
//! ```text
//! let sensor = BH1730::create(BH1730::DEFAULT_ADDR);   // sensor or ()
//! if type_of(sensor) != "()" {
//!     let lux = sensor.read_lux();                     // lux or -1.0
//!     sensor.close();
//! }
//! ```
//!
//! | Script surface | Behaviour |
//! |---|---|
//! | `BH1730::create(addr)` | sensor object, or `()` when the probe fails |
//! | `BH1730::DEFAULT_ADDR` | `0x29` |
//! | `BH1730::READ_FAILED` | `-1.0` |
//! | `sensor.read_lux()` | lux, or `-1.0` on failure or after close |
//! | `sensor.try_read_lux()` | lux, throws on failure |
//! | `sensor.close()` | `true` if this call released the handle |
//! | `sensor.is_open` / `sensor.handle` / `sensor.address` | read-only properties |
//!
//! Script objects are clones sharing one [`SensorInstance`]; closing through any
//! clone closes it for all of them.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rhai::{Dynamic, Engine, EvalAltResult, Module, FLOAT, INT};
use tracing::warn;

use crate::native::READ_FAILED;
use crate::sensor::{Bh1730, SensorInstance, DEFAULT_ADDRESS};

/// Script-side handle to a [`SensorInstance`].
#[derive(Clone)]
pub struct SensorHandle {
    inner: Arc<Mutex<SensorInstance>>,
}

impl SensorHandle {
    /// Wrap an instance for use from scripts.
    pub fn new(instance: SensorInstance) -> Self {
        Self {
            inner: Arc::new(Mutex::new(instance)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SensorInstance> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// See [`SensorInstance::read_lux`].
    pub fn read_lux(&mut self) -> FLOAT {
        self.lock().read_lux()
    }

    /// See [`SensorInstance::try_read_lux`]; failures become script errors.
    pub fn try_read_lux(&mut self) -> Result<FLOAT, Box<EvalAltResult>> {
        self.lock().try_read_lux().map_err(|e| e.to_string().into())
    }

    /// See [`SensorInstance::close`].
    pub fn close(&mut self) -> bool {
        self.lock().close()
    }

    /// See [`SensorInstance::is_open`].
    pub fn is_open(&mut self) -> bool {
        self.lock().is_open()
    }

    /// Raw native handle value.
    pub fn handle(&mut self) -> INT {
        // Native handles are pointers; scripts see the same bits as an int.
        self.lock().handle().as_raw() as INT
    }

    /// I2C address the sensor was created with.
    pub fn address(&mut self) -> INT {
        INT::from(self.lock().address())
    }
}

impl fmt::Display for SensorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sensor = self.lock();
        let state = if sensor.is_open() { "open" } else { "closed" };
        write!(
            f,
            "BH1730(addr={:#04x}, handle={}, {})",
            sensor.address(),
            sensor.handle(),
            state
        )
    }
}

impl fmt::Debug for SensorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SensorHandle").field(&*self.lock()).finish()
    }
}

/// `BH1730::create` semantics: a sensor object, or `()` on a null handle.
///
/// Addresses that do not fit a C `int` cannot reach the native probe and are
/// answered with `()` as well.
pub fn create_sensor(factory: &Bh1730, addr: INT) -> Dynamic {
    let Ok(addr) = i32::try_from(addr) else {
        warn!(addr, "BH1730 address does not fit a C int");
        return Dynamic::UNIT;
    };
    match factory.create(addr) {
        Some(instance) => Dynamic::from(SensorHandle::new(instance)),
        None => Dynamic::UNIT,
    }
}

/// Register the `BH1730` module and the `Bh1730` type in `engine`.
pub fn register_bh1730(engine: &mut Engine, factory: Bh1730) {
    engine
        .register_type_with_name::<SensorHandle>("Bh1730")
        .register_fn("read_lux", SensorHandle::read_lux)
        .register_fn("try_read_lux", SensorHandle::try_read_lux)
        .register_fn("close", SensorHandle::close)
        .register_get("is_open", SensorHandle::is_open)
        .register_get("handle", SensorHandle::handle)
        .register_get("address", SensorHandle::address)
        .register_fn("to_string", |s: &mut SensorHandle| s.to_string())
        .register_fn("to_debug", |s: &mut SensorHandle| format!("{:?}", s));

    let mut module = Module::new();
    module.set_var("DEFAULT_ADDR", INT::from(DEFAULT_ADDRESS));
    module.set_var("READ_FAILED", READ_FAILED);
    module.set_native_fn("create", move |addr: INT| {
        Ok::<_, Box<EvalAltResult>>(create_sensor(&factory, addr))
    });

    engine.register_static_module("BH1730", module.into());
}
