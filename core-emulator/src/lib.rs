//! Execution engine for the bfCPU: ROM/RAM model, fetch-decode-execute loop, input devices and
//! trace output.

mod common;
pub use common::*;

mod core;
pub use self::core::*;

pub mod device;

mod error;
pub use error::*;

pub mod trace;
