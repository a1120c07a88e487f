// SAPs between the entities of the BTS stack
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Sap {
    /// Phy/Sched, bursts and clock
    TrxSap,
    /// Sched/L2 and Sched/Pcu, data and traffic primitives
    PhSap,
    /// Sched/Rsl, channel management
    MphSap,
    /// Sched/Cbc, cell broadcast commands
    CbSap,
}

/// RSL channel number: channel-type bits in the upper five bits, timeslot in the lower three
pub type ChanNr = u8;

/// RSL link identifier, 0x00 for the main channel, 0x40 for the associated SACCH
pub type LinkId = u8;

pub const LID_DEDIC: LinkId = 0x00;
pub const LID_SACCH: LinkId = 0x40;

/// Mask selecting the channel-type bits of a ChanNr
pub const CHAN_NR_TYPE_MASK: ChanNr = 0xf8;

/// Extracts the timeslot number from a channel number
#[inline(always)]
pub fn chan_nr_tn(chan_nr: ChanNr) -> u8 {
    chan_nr & 0x07
}
