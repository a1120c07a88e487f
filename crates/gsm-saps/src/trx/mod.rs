use gsm_core::{FrameNumber, ModType, Sbit, Timeslot, Ubit};

/// One received radio burst, as delivered by the transceiver
#[derive(Debug, Clone)]
pub struct TrxBurstInd {
    pub fn_: FrameNumber,
    pub tn: Timeslot,
    /// Timing of arrival in 1/256 symbol periods
    pub toa256: i16,
    /// Received signal strength in dBm
    pub rssi: i8,
    /// Carrier-to-interference ratio in centiBels, if measured
    pub ci_cb: Option<i16>,
    /// Training sequence detected by the demodulator, if reported
    pub tsc: Option<u8>,
    pub mod_type: ModType,
    /// 148 soft bits for GMSK, 444 for 8PSK.
    /// Empty when the scheduler substitutes a burst that was never received.
    pub burst: Vec<Sbit>,
}

impl TrxBurstInd {
    /// Placeholder for a burst that the transceiver did not deliver
    pub fn nope(fn_: FrameNumber, tn: Timeslot) -> Self {
        Self {
            fn_,
            tn,
            toa256: 0,
            rssi: 0,
            ci_cb: None,
            tsc: None,
            mod_type: ModType::Gmsk,
            burst: Vec::new(),
        }
    }

    pub fn is_nope(&self) -> bool {
        self.burst.is_empty()
    }
}

/// One burst to be transmitted by the transceiver
#[derive(Debug, Clone)]
pub struct TrxBurstReq {
    pub fn_: FrameNumber,
    pub tn: Timeslot,
    /// Power attenuation in dB
    pub att: u8,
    pub mod_type: ModType,
    /// Hard bits, 148 for GMSK, 444 for 8PSK
    pub burst: Vec<Ubit>,
}
