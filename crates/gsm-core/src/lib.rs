//! Core utilities for the GSM BTS scheduler
//!
//! This crate provides fundamental types and utilities used across the stack:
//! - FrameNumber for TDMA frame arithmetic modulo the hyperframe
//! - Bit packing helpers for soft and hard bit arrays
//! - PHY constants (burst layouts, training sequences)
//! - Physical channel configuration of a timeslot
//! - Common macros and debug utilities

pub mod bits;
pub mod debug;
pub mod frame_number;
pub mod gsm_common;
pub mod gsm_entities;
pub mod pchan;
pub mod phy_types;

// Re-export commonly used items
pub use bits::{Sbit, Ubit};
pub use frame_number::FrameNumber;
pub use gsm_common::*;
pub use pchan::Pchan;
pub use phy_types::*;

/// Stack version, including the git revision the binary was built from
pub const STACK_VERSION: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"),
    "-",
    git_version::git_version!(args = ["--always", "--dirty=-modified"], fallback = "unknown")
);

/// Timeslot number on a transceiver, 0..7
pub type Timeslot = u8;

/// Number of timeslots per TDMA frame
pub const NUM_TIMESLOTS: usize = 8;
