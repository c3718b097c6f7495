//! Native driver backed by the linked BH1730 library.

use bh1730_sys as sys;
use tracing::info;

use crate::error::SensorError;
use crate::native::{NativeDriver, RawHandle, READ_FAILED};

/// [`NativeDriver`] calling into `libbh1730`.
#[derive(Debug)]
pub struct FfiDriver {
    _private: (),
}

impl FfiDriver {
    /// Run the library registration hook and return the driver.
    pub fn new() -> Result<Self, SensorError> {
        // SAFETY: the hook takes no arguments and touches no caller memory.
        let registered = unsafe { sys::mgos_bh1730_init() };
        if !registered {
            return Err(SensorError::LibraryInit);
        }
        info!("native BH1730 library initialized");
        Ok(Self { _private: () })
    }

    fn ptr(handle: RawHandle) -> *mut sys::bh1730_t {
        handle.as_raw() as *mut sys::bh1730_t
    }
}

impl NativeDriver for FfiDriver {
    fn init(&self, addr: i32) -> RawHandle {
        // SAFETY: plain integer argument; the library owns the returned memory.
        let ptr = unsafe { sys::bh1730_init(addr) };
        RawHandle::from_raw(ptr as usize)
    }

    fn free(&self, handle: RawHandle) {
        if handle.is_null() {
            return;
        }
        // SAFETY: the handle came from bh1730_init and SensorInstance frees it
        // at most once.
        unsafe { sys::bh1730_free(Self::ptr(handle)) }
    }

    fn read_lux(&self, handle: RawHandle) -> f64 {
        if handle.is_null() {
            return READ_FAILED;
        }
        // The library returns a C float; widening to f64 is exact, so the -1
        // sentinel survives.
        // SAFETY: the handle came from bh1730_init and has not been freed.
        f64::from(unsafe { sys::bh1730_read_lux(Self::ptr(handle)) })
    }

    fn name(&self) -> &str {
        "libbh1730"
    }
}
