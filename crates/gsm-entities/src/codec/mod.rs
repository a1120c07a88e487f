//! GSM 05.03 channel coding
//!
//! Pure functions converting between upper-layer blocks and per-burst bit arrays.
//! Encoders produce hard bits (`Ubit`), decoders consume soft bits (`Sbit`).
//! Multi-burst buffers hold 116 payload bits per burst: the two 57-bit data
//! fields and the two stealing flags, in on-air order.

pub mod a5;
pub mod burst_map;
pub mod conv;
pub mod crc;
pub mod interleaver;
pub mod pdtch;
pub mod rach;
pub mod sch;
pub mod tables;
pub mod tch_afs;
pub mod tch_fr;
pub mod viterbi;
pub mod xcch;

use gsm_core::bits::hard_to_soft;
use gsm_core::{Sbit, Ubit};
use thiserror::Error;

/// Length of a LAPDm / CS-1 block in bytes
pub const GSM_MACBLOCK_LEN: usize = 23;
/// Padding octet of LAPDm frames
pub const GSM_MACBLOCK_PADDING: u8 = 0x2b;
/// GSM 06.10 full rate frame length, including the signature nibble
pub const GSM_FR_BYTES: usize = 33;
/// GSM 06.60 enhanced full rate frame length, including the signature nibble
pub const GSM_EFR_BYTES: usize = 31;

/// Coded bits of one 4-burst block (xCCH, PDTCH)
pub const BLOCK4_BITS: usize = 4 * gsm_core::NB_PAYLOAD_BITS;
/// Coded bits of the 8-burst diagonal interleaving window (TCH/F)
pub const BLOCK8_BITS: usize = 8 * gsm_core::NB_PAYLOAD_BITS;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecErr {
    #[error("checksum mismatch")]
    BadCrc,
    #[error("invalid payload length {len}")]
    InvalidLength { len: usize },
    #[error("AMR mode id {id} outside of the configured codec set")]
    AmrIdOutOfRange { id: u8 },
    #[error("unsupported codec {codec}")]
    UnsupportedCodec { codec: u8 },
    #[error("unsupported burst length {len}")]
    UnsupportedBurst { len: usize },
}

/// Bit error count of a decoded block, obtained by re-encoding the decision
/// and comparing with the received soft bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitErrors {
    pub n_errors: u32,
    pub n_bits_total: u32,
}

impl BitErrors {
    pub fn add(&mut self, other: BitErrors) {
        self.n_errors += other.n_errors;
        self.n_bits_total += other.n_bits_total;
    }

    /// Bit error rate in units of 1/10000
    pub fn ber10k(&self) -> u16 {
        if self.n_bits_total == 0 {
            return 0;
        }
        (10000 * self.n_errors as u64 / self.n_bits_total as u64) as u16
    }
}

/// Decoded traffic channel block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TchBlock {
    /// Stolen block carrying a FACCH frame
    Facch([u8; GSM_MACBLOCK_LEN]),
    /// Speech frame, in the format of the active codec
    Speech(Vec<u8>),
}

/// Index of the reference pattern closest to the received soft bits.
/// Ties go to the lower index.
pub(crate) fn nearest_pattern<const N: usize>(patterns: &[[Ubit; N]], rx: &[Sbit]) -> usize {
    let mut best = i32::MAX;
    let mut best_idx = 0;
    for (idx, pattern) in patterns.iter().enumerate() {
        let dist: i32 = pattern
            .iter()
            .zip(rx)
            .map(|(p, r)| (hard_to_soft(*p) as i32 - *r as i32).abs())
            .sum();
        if dist < best {
            best = dist;
            best_idx = idx;
        }
    }
    best_idx
}
