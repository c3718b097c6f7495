//! Raw bindings to the native BH1730 driver.
//!
//! The declarations are generated from `include/bh1730.h` by the build script
//! when the `native-driver` feature is enabled. Without it this crate is empty
//! so that dependents can build and test on machines without the library.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
