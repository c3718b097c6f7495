//! The sensor handle binding.
//!
//! [`Bh1730`] is the factory: it holds the native driver and hands out
//! [`SensorInstance`]s. Each instance exclusively owns one non-null native
//! handle from creation until it is closed.
//!
//! Two calling conventions are offered side by side:
//!
//! - [`Bh1730::create`] / [`SensorInstance::read_lux`] keep the native sentinel
//!   contract: `None` for a failed probe, `-1` for a failed read.
//! - [`Bh1730::try_create`] / [`SensorInstance::try_read_lux`] return
//!   [`SensorError`] for the same conditions.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SensorError;
use crate::native::{NativeDriver, RawHandle, READ_FAILED};

/// Factory-default I2C address of the BH1730.
pub const DEFAULT_ADDRESS: u8 = 0x29;

/// What dropping a still-open [`SensorInstance`] does with its native handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleasePolicy {
    /// Only [`SensorInstance::close`] releases the handle. Dropping an open
    /// instance leaks it and logs a warning.
    #[default]
    Explicit,
    /// Dropping an open instance releases the handle.
    OnDrop,
}

impl fmt::Display for ReleasePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleasePolicy::Explicit => f.write_str("explicit"),
            ReleasePolicy::OnDrop => f.write_str("on_drop"),
        }
    }
}

/// Creates sensor instances against one native driver.
#[derive(Clone)]
pub struct Bh1730 {
    driver: Arc<dyn NativeDriver>,
    release: ReleasePolicy,
}

impl Bh1730 {
    /// Factory using the [`ReleasePolicy::Explicit`] policy.
    pub fn new(driver: Arc<dyn NativeDriver>) -> Self {
        Self {
            driver,
            release: ReleasePolicy::default(),
        }
    }

    /// Set the release policy given to instances created from now on.
    pub fn with_release_policy(mut self, release: ReleasePolicy) -> Self {
        self.release = release;
        self
    }

    /// Release policy given to new instances.
    pub fn release_policy(&self) -> ReleasePolicy {
        self.release
    }

    /// Name of the underlying native driver.
    pub fn driver_name(&self) -> &str {
        self.driver.name()
    }

    /// Probe the sensor at `addr`.
    ///
    /// The address is passed to the native driver unchecked. Returns `None`
    /// when the driver hands back a null handle.
    pub fn create(&self, addr: i32) -> Option<SensorInstance> {
        let handle = self.driver.init(addr);
        if handle.is_null() {
            warn!(addr, driver = self.driver.name(), "BH1730 init returned a null handle");
            return None;
        }

        debug!(addr, %handle, "BH1730 sensor created");
        Some(SensorInstance {
            driver: Arc::clone(&self.driver),
            addr,
            handle,
            open: true,
            release: self.release,
        })
    }

    /// As [`create`](Self::create), reporting a null handle as
    /// [`SensorError::InitFailed`].
    pub fn try_create(&self, addr: i32) -> Result<SensorInstance, SensorError> {
        self.create(addr).ok_or(SensorError::InitFailed { addr })
    }
}

impl fmt::Debug for Bh1730 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bh1730")
            .field("driver", &self.driver.name())
            .field("release", &self.release)
            .finish()
    }
}

/// One initialized BH1730 and the native handle it owns.
pub struct SensorInstance {
    driver: Arc<dyn NativeDriver>,
    addr: i32,
    handle: RawHandle,
    open: bool,
    release: ReleasePolicy,
}

impl SensorInstance {
    /// The native handle. Stays the same for the life of the instance, including
    /// after [`close`](Self::close).
    pub fn handle(&self) -> RawHandle {
        self.handle
    }

    /// I2C address the instance was created with.
    pub fn address(&self) -> i32 {
        self.addr
    }

    /// False once the native handle has been released.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Policy applied if the instance is dropped while open.
    pub fn release_policy(&self) -> ReleasePolicy {
        self.release
    }

    /// Ambient light level in lux, or `-1` on failure.
    ///
    /// The native result is returned unchanged. A closed instance returns `-1`
    /// without calling the driver.
    pub fn read_lux(&self) -> f64 {
        if !self.open {
            debug!(handle = %self.handle, "read_lux on closed sensor");
            return READ_FAILED;
        }

        let lux = self.driver.read_lux(self.handle);
        if lux == READ_FAILED {
            warn!(addr = self.addr, handle = %self.handle, "BH1730 lux read failed");
        } else {
            debug!(handle = %self.handle, lux, "BH1730 lux read");
        }
        lux
    }

    /// As [`read_lux`](Self::read_lux), reporting the sentinel as an error.
    pub fn try_read_lux(&self) -> Result<f64, SensorError> {
        if !self.open {
            return Err(SensorError::Closed);
        }
        let lux = self.read_lux();
        if lux == READ_FAILED {
            return Err(SensorError::ReadFailed {
                handle: self.handle,
            });
        }
        Ok(lux)
    }

    /// Release the native handle.
    ///
    /// Returns `true` if this call released it and `false` if it was already
    /// closed. The native free is never called twice for one handle.
    pub fn close(&mut self) -> bool {
        if !self.open {
            return false;
        }
        self.driver.free(self.handle);
        self.open = false;
        debug!(handle = %self.handle, "BH1730 sensor closed");
        true
    }
}

impl Drop for SensorInstance {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        match self.release {
            ReleasePolicy::OnDrop => {
                self.close();
            }
            ReleasePolicy::Explicit => {
                warn!(
                    addr = self.addr,
                    handle = %self.handle,
                    "BH1730 sensor dropped without close(); native handle leaked"
                );
            }
        }
    }
}

impl fmt::Debug for SensorInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorInstance")
            .field("driver", &self.driver.name())
            .field("addr", &format_args!("{:#04x}", self.addr))
            .field("handle", &self.handle)
            .field("open", &self.open)
            .field("release", &self.release)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{DriverCall, MockDriver};
    use tracing_test::traced_test;

    fn factory(lux: f64) -> (Arc<MockDriver>, Bh1730) {
        let mock = Arc::new(MockDriver::new().with_sensor(0x29, 0x1000, lux));
        let bh1730 = Bh1730::new(mock.clone());
        (mock, bh1730)
    }

    #[test]
    fn test_create_stores_native_handle() {
        let (_mock, bh1730) = factory(10.0);
        let mut sensor = bh1730.create(0x29).unwrap();
        assert_eq!(sensor.handle(), RawHandle::from_raw(0x1000));
        assert_eq!(sensor.address(), 0x29);
        assert!(sensor.is_open());
        sensor.close();
    }

    #[test]
    fn test_create_null_handle_is_none() {
        let (mock, bh1730) = factory(10.0);
        assert!(bh1730.create(0x23).is_none());
        // No instance means nothing to free
        assert_eq!(mock.calls(), vec![DriverCall::Init(0x23)]);
    }

    #[test]
    fn test_try_create_reports_address() {
        let (_mock, bh1730) = factory(10.0);
        let err = bh1730.try_create(0x23).unwrap_err();
        assert_eq!(err, SensorError::InitFailed { addr: 0x23 });
    }

    #[test]
    fn test_try_read_lux_sentinel_is_error() {
        let (_mock, bh1730) = factory(READ_FAILED);
        let mut sensor = bh1730.create(0x29).unwrap();
        assert_eq!(
            sensor.try_read_lux(),
            Err(SensorError::ReadFailed {
                handle: RawHandle::from_raw(0x1000)
            })
        );
        sensor.close();
    }

    #[test]
    fn test_close_frees_once() {
        let (mock, bh1730) = factory(10.0);
        let mut sensor = bh1730.create(0x29).unwrap();
        assert!(sensor.close());
        assert!(!sensor.close());
        assert!(!sensor.is_open());
        assert_eq!(sensor.handle(), RawHandle::from_raw(0x1000));
        drop(sensor);
        assert_eq!(mock.free_count(RawHandle::from_raw(0x1000)), 1);
    }

    #[test]
    fn test_read_after_close_skips_driver() {
        let (mock, bh1730) = factory(10.0);
        let mut sensor = bh1730.create(0x29).unwrap();
        sensor.close();
        assert_eq!(sensor.read_lux(), READ_FAILED);
        assert_eq!(sensor.try_read_lux(), Err(SensorError::Closed));
        assert_eq!(mock.read_count(RawHandle::from_raw(0x1000)), 0);
    }

    #[test]
    #[traced_test]
    fn test_explicit_drop_leaks_and_warns() {
        let (mock, bh1730) = factory(10.0);
        let sensor = bh1730.create(0x29).unwrap();
        drop(sensor);
        assert_eq!(mock.free_count(RawHandle::from_raw(0x1000)), 0);
        assert!(logs_contain("native handle leaked"));
    }

    #[test]
    fn test_on_drop_policy_frees() {
        let (mock, bh1730) = factory(10.0);
        let bh1730 = bh1730.with_release_policy(ReleasePolicy::OnDrop);
        let sensor = bh1730.create(0x29).unwrap();
        assert_eq!(sensor.release_policy(), ReleasePolicy::OnDrop);
        drop(sensor);
        assert_eq!(mock.free_count(RawHandle::from_raw(0x1000)), 1);
    }

    #[test]
    fn test_on_drop_after_close_does_not_free_again() {
        let (mock, bh1730) = factory(10.0);
        let bh1730 = bh1730.with_release_policy(ReleasePolicy::OnDrop);
        let mut sensor = bh1730.create(0x29).unwrap();
        sensor.close();
        drop(sensor);
        assert_eq!(mock.free_count(RawHandle::from_raw(0x1000)), 1);
    }

    #[test]
    #[traced_test]
    fn test_null_handle_logged() {
        let (_mock, bh1730) = factory(10.0);
        assert!(bh1730.create(0x23).is_none());
        assert!(logs_contain("null handle"));
    }

    #[test]
    fn test_release_policy_serde_names() {
        let policy: ReleasePolicy = serde_json::from_str("\"on_drop\"").unwrap();
        assert_eq!(policy, ReleasePolicy::OnDrop);
        assert_eq!(ReleasePolicy::Explicit.to_string(), "explicit");
    }
}
