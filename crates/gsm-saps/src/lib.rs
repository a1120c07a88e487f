#![allow(dead_code)]

/// Transceiver bursts and clock
pub mod trx;
/// Data and traffic primitives toward L2 and the PCU
pub mod ph;
/// Channel management from the radio resource layer
pub mod mph;
/// Cell broadcast commands
pub mod cb;

pub mod sapmsg;

pub use sapmsg::*;
