//! Mock Native Driver
//!
//! Software stand-in for the native BH1730 library, for tests and for running
//! scripts on machines without the sensor.
//!
//! - Probes answer only for addresses registered with
//!   [`MockDriver::set_init_result`]; every other address gets the null handle.
//! - Reads return the value registered with [`MockDriver::set_reading`], or the
//!   `-1` sentinel for unknown handles.
//! - Every call is recorded in order so tests can assert exactly what reached
//!   the native layer.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::native::{NativeDriver, RawHandle, READ_FAILED};

/// One call that reached the mock native layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriverCall {
    /// `bh1730_init(addr)`
    Init(i32),
    /// `bh1730_free(handle)`
    Free(RawHandle),
    /// `bh1730_read_lux(handle)`
    ReadLux(RawHandle),
}

#[derive(Debug, Default)]
struct MockState {
    handles: HashMap<i32, RawHandle>,
    readings: HashMap<RawHandle, f64>,
    calls: Vec<DriverCall>,
}

/// Programmable stub of the native driver.
///
/// # Example
///
/// ```rust
/// use bh1730_script::mock::MockDriver;
/// use bh1730_script::native::NativeDriver;
///
/// let driver = MockDriver::new().with_sensor(0x29, 0x1000, 123.4);
/// let handle = driver.init(0x29);
/// assert_eq!(handle.as_raw(), 0x1000);
/// assert_eq!(driver.read_lux(handle), 123.4);
/// ```
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    /// Create a mock where no address answers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set_init_result`](Self::set_init_result) plus
    /// [`set_reading`](Self::set_reading).
    pub fn with_sensor(self, addr: i32, handle: usize, lux: f64) -> Self {
        let handle = RawHandle::from_raw(handle);
        self.set_init_result(addr, handle);
        self.set_reading(handle, lux);
        self
    }

    /// Make a probe of `addr` return `handle`. Pass [`RawHandle::NULL`] to make
    /// it fail.
    pub fn set_init_result(&self, addr: i32, handle: RawHandle) {
        self.lock().handles.insert(addr, handle);
    }

    /// Make reads against `handle` return `lux`.
    pub fn set_reading(&self, handle: RawHandle, lux: f64) {
        self.lock().readings.insert(handle, lux);
    }

    /// All calls so far, oldest first.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.lock().calls.clone()
    }

    /// Forget the recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Number of times `handle` was passed to `free`.
    pub fn free_count(&self, handle: RawHandle) -> usize {
        self.count(DriverCall::Free(handle))
    }

    /// Number of times `handle` was passed to `read_lux`.
    pub fn read_count(&self, handle: RawHandle) -> usize {
        self.count(DriverCall::ReadLux(handle))
    }

    fn count(&self, call: DriverCall) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NativeDriver for MockDriver {
    fn init(&self, addr: i32) -> RawHandle {
        let mut state = self.lock();
        state.calls.push(DriverCall::Init(addr));
        state.handles.get(&addr).copied().unwrap_or(RawHandle::NULL)
    }

    fn free(&self, handle: RawHandle) {
        self.lock().calls.push(DriverCall::Free(handle));
    }

    fn read_lux(&self, handle: RawHandle) -> f64 {
        let mut state = self.lock();
        state.calls.push(DriverCall::ReadLux(handle));
        state.readings.get(&handle).copied().unwrap_or(READ_FAILED)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_address_is_null() {
        let driver = MockDriver::new();
        assert!(driver.init(0x23).is_null());
        assert_eq!(driver.calls(), vec![DriverCall::Init(0x23)]);
    }

    #[test]
    fn test_unknown_handle_reads_sentinel() {
        let driver = MockDriver::new();
        assert_eq!(driver.read_lux(RawHandle::from_raw(0x2000)), READ_FAILED);
    }

    #[test]
    fn test_records_calls_in_order() {
        let driver = MockDriver::new().with_sensor(0x29, 0x1000, 50.0);
        let handle = driver.init(0x29);
        driver.read_lux(handle);
        driver.free(handle);

        assert_eq!(
            driver.calls(),
            vec![
                DriverCall::Init(0x29),
                DriverCall::ReadLux(handle),
                DriverCall::Free(handle),
            ]
        );
        assert_eq!(driver.free_count(handle), 1);
        assert_eq!(driver.read_count(handle), 1);

        driver.clear_calls();
        assert!(driver.calls().is_empty());
    }

    #[test]
    fn test_reprogram_init_to_fail() {
        let driver = MockDriver::new().with_sensor(0x29, 0x1000, 50.0);
        driver.set_init_result(0x29, RawHandle::NULL);
        assert!(driver.init(0x29).is_null());
    }
}
