//! TDMA multiframe scheduler
//!
//! Maps each (timeslot, frame number) to the logical channel active in both
//! directions, reassembles uplink blocks from bursts, and cuts downlink blocks
//! into bursts. The per channel family handlers live in the `lchan_*` modules.

pub mod amr;
pub mod chan_desc;
pub mod chan_state;
pub mod dl_queue;
pub mod lchan_pdtch;
pub mod lchan_rach;
pub mod lchan_sync;
pub mod lchan_tchf;
pub mod lchan_xcch;
pub mod multiframe;
pub mod sched_bs;
pub mod trx_sched;

use gsm_core::{FrameNumber, ModType, Pchan, Timeslot, Ubit};
use gsm_saps::mph::MphErrorInd;
use gsm_saps::ph::{PhDataInd, PhRachInd, PhTchInd};
use thiserror::Error;

use chan_state::ChanState;
use dl_queue::DlQueue;

pub use sched_bs::SchedBs;
pub use trx_sched::TrxScheduler;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedErr {
    #[error("no multiframe layout for {pchan:?} on timeslot {tn}")]
    UnsupportedMapping { pchan: Pchan, tn: Timeslot },
    #[error("invalid timeslot")]
    InvalidTimeslot,
    #[error("no matching logical channel")]
    NoMatchingChannel,
    #[error("unsupported cipher algorithm")]
    UnsupportedCipher,
    #[error("out of memory for burst buffers")]
    NoMemory,
    #[error("invalid frame")]
    InvalidFrame,
    #[error("invalid AMR codec set")]
    InvalidCodecSet,
    #[error("invalid cipher key length {len}")]
    InvalidKey { len: usize },
}

/// Indication produced by the scheduler for the upper layers
#[derive(Debug, Clone)]
pub enum UpInd {
    Data(PhDataInd),
    Tch(PhTchInd),
    Rach(PhRachInd),
    Error(MphErrorInd),
}

/// One downlink burst produced by a channel handler
#[derive(Debug, Clone)]
pub struct TxBurst {
    pub mod_type: ModType,
    pub bits: Vec<Ubit>,
}

impl TxBurst {
    pub fn gmsk(bits: Vec<Ubit>) -> Self {
        Self { mod_type: ModType::Gmsk, bits }
    }
}

/// Everything a downlink handler may touch for one burst
pub struct TxCtx<'a> {
    pub fn_: FrameNumber,
    pub tn: Timeslot,
    pub bsic: u8,
    pub tsc: u8,
    pub bfi_injection: bool,
    pub cs: &'a mut ChanState,
    pub queue: &'a mut DlQueue,
    /// Indications generated on the downlink path (bad-frame injection)
    pub ups: &'a mut Vec<UpInd>,
}

/// Everything an uplink handler may touch for one burst
pub struct RxCtx<'a> {
    pub tn: Timeslot,
    pub bsic: u8,
    pub cs: &'a mut ChanState,
    pub ups: &'a mut Vec<UpInd>,
}
