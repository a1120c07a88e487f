//! PDTCH coding schemes CS-1 to CS-4.
//!
//! The scheme is not signalled out of band: the receiver picks it from the
//! stealing flag pattern, then recovers the USF by nearest match against its
//! precoded form before checking the CRC.

use gsm_core::bits::{hard_to_soft_buf, pack_lsb, soft_to_hard, unpack_lsb};
use gsm_core::{Sbit, Ubit};

use super::conv::{CONV_CS2, CONV_CS3, CONV_XCCH, ConvCode};
use super::crc::{CRC_CS234, CRC_FIRE40};
use super::tables::{PDTCH_HL_HU, USF_TO_SIX, USF_TO_TWELVE};
use super::viterbi::ViterbiDecoder;
use super::xcch::{map_block4, unmap_block4};
use super::{BLOCK4_BITS, BitErrors, CodecErr, nearest_pattern};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodingScheme {
    Cs1,
    Cs2,
    Cs3,
    Cs4,
}

impl CodingScheme {
    /// RLC/MAC block length in bytes
    pub const fn block_len(self) -> usize {
        match self {
            CodingScheme::Cs1 => 23,
            CodingScheme::Cs2 => 34,
            CodingScheme::Cs3 => 40,
            CodingScheme::Cs4 => 54,
        }
    }

    /// Number of meaningful bits in the block, the last byte may be partial
    pub const fn payload_bits(self) -> usize {
        match self {
            CodingScheme::Cs1 => 184,
            CodingScheme::Cs2 => 271,
            CodingScheme::Cs3 => 315,
            CodingScheme::Cs4 => 431,
        }
    }

    pub fn from_block_len(len: usize) -> Option<Self> {
        match len {
            23 => Some(CodingScheme::Cs1),
            34 => Some(CodingScheme::Cs2),
            40 => Some(CodingScheme::Cs3),
            54 => Some(CodingScheme::Cs4),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn from_index(idx: usize) -> Self {
        match idx {
            0 => CodingScheme::Cs1,
            1 => CodingScheme::Cs2,
            2 => CodingScheme::Cs3,
            _ => CodingScheme::Cs4,
        }
    }
}

/// Successfully decoded uplink or downlink radio block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdtchBlock {
    pub cs: CodingScheme,
    pub data: Vec<u8>,
    pub usf: u8,
    pub errors: BitErrors,
}

/// Offset of the first payload bit in the encoder input
const fn payload_offset(cs: CodingScheme) -> usize {
    match cs {
        CodingScheme::Cs1 => 0,
        CodingScheme::Cs2 | CodingScheme::Cs3 => 3,
        CodingScheme::Cs4 => 9,
    }
}

fn conv_code(cs: CodingScheme) -> Option<&'static ConvCode> {
    match cs {
        CodingScheme::Cs1 => Some(&CONV_XCCH),
        CodingScheme::Cs2 => Some(&CONV_CS2),
        CodingScheme::Cs3 => Some(&CONV_CS3),
        CodingScheme::Cs4 => None,
    }
}

/// Payload with CRC and USF precoding, as fed to the convolutional encoder.
/// CS-4 has no convolutional code, so this already is the 456 bit coded block.
fn build_conv(cs: CodingScheme, l2: &[u8]) -> Vec<Ubit> {
    let usf = (l2[0] & 0x7) as usize;
    let n = cs.payload_bits();
    let off = payload_offset(cs);
    let len = conv_code(cs).map_or(456, |c| c.len);

    let mut conv = vec![0u8; len];
    unpack_lsb(l2, &mut conv[off..], n);
    let (data, parity) = conv[off..].split_at_mut(n);
    match cs {
        CodingScheme::Cs1 => CRC_FIRE40.set_bits(data, parity),
        _ => CRC_CS234.set_bits(data, parity),
    }
    match cs {
        CodingScheme::Cs1 => {}
        CodingScheme::Cs2 | CodingScheme::Cs3 => conv[..6].copy_from_slice(&USF_TO_SIX[usf]),
        CodingScheme::Cs4 => conv[..12].copy_from_slice(&USF_TO_TWELVE[usf]),
    }
    conv
}

fn encode_conv(cs: CodingScheme, conv: &[Ubit], bursts: &mut [Ubit]) {
    let mut cb = [0u8; 456];
    match conv_code(cs) {
        Some(code) => code.encode(conv, &mut cb),
        None => cb.copy_from_slice(&conv[..456]),
    }
    map_block4(&cb, &PDTCH_HL_HU[cs.index()], bursts);
}

/// Encodes an RLC/MAC block; the coding scheme follows from its length.
/// The USF is taken from the three low bits of the first byte.
pub fn pdtch_encode(l2: &[u8], bursts: &mut [Ubit]) -> Result<CodingScheme, CodecErr> {
    let cs = CodingScheme::from_block_len(l2.len()).ok_or(CodecErr::InvalidLength { len: l2.len() })?;
    if bursts.len() < BLOCK4_BITS {
        return Err(CodecErr::InvalidLength { len: bursts.len() });
    }
    let conv = build_conv(cs, l2);
    encode_conv(cs, &conv, bursts);
    tracing::trace!("pdtch_encode: {:?} usf={} len={}", cs, l2[0] & 0x7, l2.len());
    Ok(cs)
}

/// Decodes 4 bursts of 116 soft bits, detecting the coding scheme and USF
pub fn pdtch_decode(bursts: &[Sbit]) -> Result<PdtchBlock, CodecErr> {
    if bursts.len() < BLOCK4_BITS {
        return Err(CodecErr::InvalidLength { len: bursts.len() });
    }
    let mut cb = [0i8; 456];
    let flags = unmap_block4(bursts, &mut cb);
    let cs = CodingScheme::from_index(nearest_pattern(&PDTCH_HL_HU, &flags));

    let n = cs.payload_bits();
    let mut data = vec![0u8; cs.block_len()];
    let (usf, errors) = match cs {
        CodingScheme::Cs1 => {
            let mut conv = [0u8; 224];
            let errors = ViterbiDecoder::new(&CONV_XCCH).decode(&cb, &mut conv);
            if !CRC_FIRE40.check_bits(&conv[..184], &conv[184..]) {
                return Err(CodecErr::BadCrc);
            }
            pack_lsb(&conv, &mut data, n);
            (conv[0] | (conv[1] << 1) | (conv[2] << 2), errors)
        }
        CodingScheme::Cs2 | CodingScheme::Cs3 => {
            let code: &'static ConvCode = if cs == CodingScheme::Cs2 { &CONV_CS2 } else { &CONV_CS3 };
            let mut conv = vec![0u8; code.len];
            let errors = ViterbiDecoder::new(code).decode(&cb, &mut conv);

            let mut precoded = [0i8; 6];
            hard_to_soft_buf(&conv[..6], &mut precoded);
            let usf = nearest_pattern(&USF_TO_SIX, &precoded) as u8;
            set_usf_bits(&mut conv[3..6], usf);

            if !CRC_CS234.check_bits(&conv[3..3 + n], &conv[3 + n..]) {
                return Err(CodecErr::BadCrc);
            }
            pack_lsb(&conv[3..], &mut data, n);
            (usf, errors)
        }
        CodingScheme::Cs4 => {
            let mut bits = [0u8; 456];
            for (b, s) in bits.iter_mut().zip(cb.iter()).skip(12) {
                *b = soft_to_hard(*s);
            }
            let usf = nearest_pattern(&USF_TO_TWELVE, &cb[..12]) as u8;
            set_usf_bits(&mut bits[9..12], usf);

            if !CRC_CS234.check_bits(&bits[9..9 + n], &bits[9 + n..]) {
                return Err(CodecErr::BadCrc);
            }
            pack_lsb(&bits[9..], &mut data, n);
            // Uncoded scheme, only erasures are known
            let received = cb.iter().filter(|s| **s != 0).count() as u32;
            (usf, BitErrors { n_errors: 0, n_bits_total: received })
        }
    };

    tracing::trace!("pdtch_decode: {:?} usf={} {:?}", cs, usf, errors);
    Ok(PdtchBlock { cs, data, usf, errors })
}

fn set_usf_bits(bits: &mut [Ubit], usf: u8) {
    bits[0] = usf & 1;
    bits[1] = (usf >> 1) & 1;
    bits[2] = (usf >> 2) & 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_soft(bits: &[Ubit]) -> Vec<Sbit> {
        let mut soft = vec![0i8; bits.len()];
        hard_to_soft_buf(bits, &mut soft);
        soft
    }

    fn random_block(cs: CodingScheme, usf: u8) -> Vec<u8> {
        let mut block: Vec<u8> = (0..cs.block_len()).map(|_| rand::random::<u8>()).collect();
        block[0] = (block[0] & !0x7) | usf;
        // Clear the unused trailing bits of the last byte
        let used = cs.payload_bits() % 8;
        if used != 0 {
            let last = block.len() - 1;
            block[last] &= (1u8 << used) - 1;
        }
        block
    }

    #[test]
    fn test_all_schemes_and_usf() {
        for cs in [CodingScheme::Cs1, CodingScheme::Cs2, CodingScheme::Cs3, CodingScheme::Cs4] {
            for usf in 0..8u8 {
                let block = random_block(cs, usf);
                let mut bursts = [0u8; BLOCK4_BITS];
                assert_eq!(pdtch_encode(&block, &mut bursts), Ok(cs));

                let decoded = pdtch_decode(&to_soft(&bursts)).unwrap();
                assert_eq!(decoded.cs, cs);
                assert_eq!(decoded.usf, usf);
                assert_eq!(decoded.data, block, "{:?} usf={}", cs, usf);
            }
        }
    }

    #[test]
    fn test_crc_rejects_flipped_bit() {
        for cs in [CodingScheme::Cs1, CodingScheme::Cs2, CodingScheme::Cs3, CodingScheme::Cs4] {
            let block = random_block(cs, 3);
            let mut conv = build_conv(cs, &block);
            // A payload bit past the USF, CRC left as computed
            conv[payload_offset(cs) + 100] ^= 1;
            let mut bursts = [0u8; BLOCK4_BITS];
            encode_conv(cs, &conv, &mut bursts);

            assert_eq!(pdtch_decode(&to_soft(&bursts)).err(), Some(CodecErr::BadCrc), "{:?}", cs);
        }
    }

    #[test]
    fn test_rejects_unknown_length() {
        let mut bursts = [0u8; BLOCK4_BITS];
        assert_eq!(pdtch_encode(&[0u8; 30], &mut bursts), Err(CodecErr::InvalidLength { len: 30 }));
    }

    #[test]
    fn test_cs4_known_bursts() {
        // USF 5, all other bits zero: only the USF code, the inverted CRC and the flags are set
        let mut block = [0u8; 54];
        block[0] = 0x05;
        let mut bursts = [0u8; BLOCK4_BITS];
        assert_eq!(pdtch_encode(&block, &mut bursts), Ok(CodingScheme::Cs4));

        let ones: Vec<usize> = bursts.iter().enumerate().filter(|(_, b)| **b == 1).map(|(i, _)| i).collect();
        assert_eq!(ones, vec![0, 14, 28, 51, 128, 151, 174, 181, 202, 216, 230, 265, 290, 302, 330, 344, 351, 365, 379, 405, 416]);
    }

    #[test]
    fn test_cs1_matches_xcch() {
        let block: Vec<u8> = (0..23).map(|i| (i * 37 + 11) as u8 & !0x7).collect();
        let mut pdtch = [0u8; BLOCK4_BITS];
        let mut xcch = [0u8; BLOCK4_BITS];
        pdtch_encode(&block, &mut pdtch).unwrap();
        crate::codec::xcch::xcch_encode(&block, &mut xcch).unwrap();
        assert_eq!(pdtch, xcch);
    }
}
