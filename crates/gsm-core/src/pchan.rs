use serde::Deserialize;

/// Physical channel configuration of one timeslot, selects its multiframe layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Pchan {
    /// Timeslot not in use, transmits dummy bursts
    #[default]
    None,
    /// FCCH + SCH + BCCH + CCCH (non-combined)
    Ccch,
    /// FCCH + SCH + BCCH + CCCH + SDCCH/4 (combined)
    CcchSdcch4,
    /// Combined CCCH with the CBCH replacing SDCCH/4 subchannel 2
    CcchSdcch4Cbch,
    /// Eight standalone dedicated control channels
    Sdcch8,
    /// SDCCH/8 with the CBCH replacing subchannel 2
    Sdcch8Cbch,
    /// Full-rate traffic channel
    TchF,
    /// Packet data channel
    Pdch,
}

impl Pchan {
    /// True for configurations carrying the broadcast and common control channels
    pub fn has_ccch(self) -> bool {
        matches!(self, Pchan::Ccch | Pchan::CcchSdcch4 | Pchan::CcchSdcch4Cbch)
    }
}
