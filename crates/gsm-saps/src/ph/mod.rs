use gsm_core::{ChanNr, FrameNumber, LinkId, Timeslot};

/// Which kind of primitive a ready-to-send indication asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtsKind {
    /// Signalling or packet block (PH-DATA)
    Data,
    /// Speech frame (TCH)
    Tch,
}

/// Ready-to-send: the upper layer may now supply the block transmitted at `fn_`
#[derive(Debug, Clone)]
pub struct PhRtsInd {
    pub fn_: FrameNumber,
    pub tn: Timeslot,
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
    pub kind: RtsKind,
}

/// Block to transmit on a signalling or packet channel
#[derive(Debug, Clone)]
pub struct PhDataReq {
    /// First frame of the block this data is meant for
    pub fn_: FrameNumber,
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
    pub data: Vec<u8>,
}

/// Speech frame to transmit on a traffic channel
#[derive(Debug, Clone)]
pub struct PhTchReq {
    pub fn_: FrameNumber,
    pub chan_nr: ChanNr,
    pub data: Vec<u8>,
}

/// Uplink measurements averaged over the bursts of one block
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UlMeas {
    /// Average received signal strength in dBm
    pub rssi: i8,
    /// Average timing of arrival in 1/256 symbol periods
    pub toa256: i16,
    /// Average link quality (C/I) in centiBels
    pub lqual_cb: i16,
    /// Bit errors per 10000 coded bits
    pub ber10k: u16,
    /// Number of bits compared to obtain ber10k
    pub n_bits_total: u16,
    pub n_errors: u16,
}

/// Decoded block from a signalling or packet channel
#[derive(Debug, Clone)]
pub struct PhDataInd {
    /// First frame of the received block
    pub fn_: FrameNumber,
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
    pub data: Vec<u8>,
    pub meas: UlMeas,
}

/// Decoded speech frame. An empty `data` is a bad-frame indication.
#[derive(Debug, Clone)]
pub struct PhTchInd {
    pub fn_: FrameNumber,
    pub chan_nr: ChanNr,
    pub data: Vec<u8>,
    pub meas: UlMeas,
}

/// Decoded access burst
#[derive(Debug, Clone)]
pub struct PhRachInd {
    pub fn_: FrameNumber,
    pub chan_nr: ChanNr,
    /// 8-bit random access reference
    pub ra: u8,
    /// Access delay in whole symbols
    pub acc_delay: u8,
    pub meas: UlMeas,
}
