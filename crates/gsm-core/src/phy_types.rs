//! PHY-layer types and constants that are used across multiple layers
//!
//! Burst layouts and training sequences per 3GPP TS 45.002 clause 5.2.

/// Length of a GMSK burst in bits, excluding guard period
pub const GSM_BURST_LEN: usize = 148;
/// Length of an 8PSK burst in bits (3 bits per symbol)
pub const EGPRS_BURST_LEN: usize = 444;
/// Encrypted bits carried by one normal burst, two halves of 58 incl. stealing flags
pub const NB_PAYLOAD_BITS: usize = 116;
/// Length of the normal burst training sequence
pub const TSC_LEN: usize = 26;
/// Number of tail bits at each end of a GMSK burst
pub const TAIL_BITS: usize = 3;

/// Modulation of a burst
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum ModType {
    #[default]
    Gmsk,
    Psk8,
}

impl ModType {
    /// Modulation implied by the burst length
    pub fn from_burst_len(len: usize) -> Option<ModType> {
        match len {
            GSM_BURST_LEN => Some(ModType::Gmsk),
            EGPRS_BURST_LEN => Some(ModType::Psk8),
            _ => None,
        }
    }
}

/// Normal burst training sequence codes TSC0..TSC7
pub static GSM_TSC: [[u8; TSC_LEN]; 8] = [
    [0, 0, 1, 0, 0, 1, 0, 1, 1, 1, 0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 1, 0, 1, 1, 1],
    [0, 0, 1, 0, 1, 1, 0, 1, 1, 1, 0, 1, 1, 1, 1, 0, 0, 0, 1, 0, 1, 1, 0, 1, 1, 1],
    [0, 1, 0, 0, 0, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 0, 0, 1, 0, 0, 0, 0, 1, 1, 1, 0],
    [0, 1, 0, 0, 0, 1, 1, 1, 1, 0, 1, 1, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 1, 1, 1, 0],
    [0, 0, 0, 1, 1, 0, 1, 0, 1, 1, 1, 0, 0, 1, 0, 0, 0, 0, 0, 1, 1, 0, 1, 0, 1, 1],
    [0, 1, 0, 0, 1, 1, 1, 0, 1, 0, 1, 1, 0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 1, 0, 1, 0],
    [1, 0, 1, 0, 0, 1, 1, 1, 1, 1, 0, 1, 1, 0, 0, 0, 1, 0, 1, 0, 0, 1, 1, 1, 1, 1],
    [1, 1, 1, 0, 1, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1, 0, 1, 1, 1, 0, 1, 1, 1, 1, 0, 0],
];

/// Extended training sequence of the synchronization burst
pub static SCH_TRAIN: [u8; 64] = [
    1, 0, 1, 1, 1, 0, 0, 1, 0, 1, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 0, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 0, 0, 1, 0, 1, 0, 1, 1, 1, 0, 1, 1, 0, 0, 0, 0, 1, 1, 0, 1, 1
];

/// Extended tail bits at the start of an access burst
pub static RACH_EXT_TAIL: [u8; 8] = [0, 0, 1, 1, 1, 0, 1, 0];

/// Synchronization sequence TS0 of the access burst
pub static RACH_SYNCH_SEQ: [u8; 41] = [
    0, 1, 0, 0, 1, 0, 1, 1, 0, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 1, 0, 1, 0, 0, 0, 1, 1, 1, 1, 0, 0, 0
];

/// Dummy burst, transmitted on timeslots and frames without any data (45.002 5.2.6)
pub static DUMMY_BURST: [u8; GSM_BURST_LEN] = [
    0, 0, 0,
    1, 1, 1, 1, 1, 0, 1, 1, 0, 1, 1, 1, 0, 1, 1, 0, 0, 0, 0, 0, 1, 0, 1, 0, 0, 1, 0, 0, 1, 1, 1, 0,
    0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 0, 0, 0, 1, 1, 1, 0, 0,
    0, 1, 0, 1, 1, 1, 0, 0, 0, 1, 0, 1, 1, 1, 0, 0, 0, 1, 0, 1, 0, 1, 1, 1, 0, 1, 0, 0, 1, 0, 1, 0,
    0, 0, 1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 1, 0, 0, 1, 1, 1, 1, 0, 1, 0, 0, 1, 1, 1, 1, 1, 0, 0, 0, 1,
    0, 0, 1, 0, 1, 1, 1, 1, 1, 0, 1, 0, 1, 0,
    0, 0, 0,
];
