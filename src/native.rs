//! Seam between the safe binding and the native BH1730 driver.
//!
//! The native library exposes exactly three operations: probe a sensor and
//! allocate a driver instance, read the ambient light level, and release the
//! instance. [`NativeDriver`] mirrors that contract one-to-one so the binding
//! can run against the real library ([`crate::ffi::FfiDriver`], behind the
//! `native_driver` feature) or a software stub ([`crate::mock::MockDriver`]).
//!
//! Failures never surface as errors at this level. A failed probe yields
//! [`RawHandle::NULL`] and a failed read yields [`READ_FAILED`].

use std::fmt;

/// Lux value the native driver returns when an I2C transaction fails.
pub const READ_FAILED: f64 = -1.0;

/// Opaque handle to a native driver instance. Zero is the null handle.
///
/// A `RawHandle` carries no ownership. Only a [`crate::sensor::SensorInstance`]
/// owns a live handle and decides when it is released.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawHandle(usize);

impl RawHandle {
    /// The null handle returned by a failed probe.
    pub const NULL: RawHandle = RawHandle(0);

    /// Wrap a raw handle value.
    pub const fn from_raw(value: usize) -> Self {
        Self(value)
    }

    /// The raw handle value.
    pub const fn as_raw(self) -> usize {
        self.0
    }

    /// True for the null handle.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl From<usize> for RawHandle {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawHandle({:#x})", self.0)
    }
}

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// The native BH1730 driver contract.
///
/// Implementations are called synchronously and may block for the duration of
/// an I2C transaction. The read width of the underlying library is an ABI
/// detail; implementations widen it to `f64`.
pub trait NativeDriver: Send + Sync {
    /// Probe the sensor at `addr` and allocate a driver instance.
    ///
    /// Returns [`RawHandle::NULL`] if the sensor does not answer.
    fn init(&self, addr: i32) -> RawHandle;

    /// Release a driver instance previously returned by [`NativeDriver::init`].
    ///
    /// Callers never pass the same handle twice.
    fn free(&self, handle: RawHandle);

    /// Ambient light level in lux, or [`READ_FAILED`].
    fn read_lux(&self, handle: RawHandle) -> f64;

    /// Human readable driver name for logs.
    fn name(&self) -> &str;
}
