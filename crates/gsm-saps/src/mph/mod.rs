pub mod enums;

use gsm_core::{ChanNr, FrameNumber, LinkId, Pchan, Timeslot};

use crate::mph::enums::{CipherAlgo, RslCmode, TchMode};

/// Activate or deactivate the logical channel(s) matching a channel number and link identity
#[derive(Debug, Clone)]
pub struct MphActivateReq {
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
    pub active: bool,
}

/// Set the channel mode of all logical channels sharing a channel number
#[derive(Debug, Clone)]
pub struct MphModeReq {
    pub chan_nr: ChanNr,
    pub rsl_cmode: RslCmode,
    pub tch_mode: TchMode,
    /// AMR active codec set, each entry a codec mode 0 (4.75) ..= 7 (12.2), at most 4
    pub codecs: Vec<u8>,
    /// Index into `codecs` used until the first in-band mode change
    pub initial_id: u8,
}

/// Set the cipher of one direction of a dedicated channel
#[derive(Debug, Clone)]
pub struct MphCipherReq {
    pub chan_nr: ChanNr,
    pub downlink: bool,
    pub algo: CipherAlgo,
    pub key: Vec<u8>,
}

/// Change the physical channel configuration of a timeslot
#[derive(Debug, Clone)]
pub struct MphSetPchanReq {
    pub tn: Timeslot,
    pub pchan: Pchan,
}

/// Which request an MphConf answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MphOp {
    Activate,
    Deactivate,
    Mode,
    Cipher,
    SetPchan,
}

/// Result of a channel management request
#[derive(Debug, Clone)]
pub struct MphConf {
    pub op: MphOp,
    pub chan_nr: ChanNr,
    /// None on success, the rejection cause otherwise
    pub cause: Option<String>,
}

/// Failure on an active channel that the scheduler worked around locally,
/// e.g. a downlink frame that could not be encoded and was replaced by fill
#[derive(Debug, Clone)]
pub struct MphErrorInd {
    pub fn_: FrameNumber,
    pub chan_nr: ChanNr,
    pub cause: String,
}
