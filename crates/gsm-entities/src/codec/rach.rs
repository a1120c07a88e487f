//! Random access burst coding

use gsm_core::bits::{pack_lsb, unpack_lsb};
use gsm_core::{GSM_BURST_LEN, RACH_EXT_TAIL, RACH_SYNCH_SEQ, Sbit, Ubit};

use super::conv::CONV_RACH;
use super::crc::CRC_RACH;
use super::viterbi::ViterbiDecoder;
use super::{BitErrors, CodecErr};

pub const RACH_CODED_BITS: usize = 36;

/// Offset of the coded bits within an access burst, after extended tail and synch sequence
pub const RACH_DATA_OFFSET: usize = RACH_EXT_TAIL.len() + RACH_SYNCH_SEQ.len();

/// XORs the BSIC onto the parity: p(j) ^= b(j), b(0) being the PLMN colour code MSB
fn apply_bsic(conv: &mut [Ubit], bsic: u8) {
    for i in 0..6 {
        conv[8 + i] ^= (bsic >> (5 - i)) & 1;
    }
}

pub fn rach_encode(ra: u8, bsic: u8) -> [Ubit; RACH_CODED_BITS] {
    let mut conv = [0u8; 14];
    unpack_lsb(&[ra], &mut conv, 8);
    let (data, parity) = conv.split_at_mut(8);
    CRC_RACH.set_bits(data, parity);
    apply_bsic(&mut conv, bsic);

    let mut coded = [0u8; RACH_CODED_BITS];
    CONV_RACH.encode(&conv, &mut coded);
    coded
}

/// Decodes the 36 coded bits of an access burst sent towards a cell with `bsic`
pub fn rach_decode(coded: &[Sbit], bsic: u8) -> Result<(u8, BitErrors), CodecErr> {
    if coded.len() < RACH_CODED_BITS {
        return Err(CodecErr::InvalidLength { len: coded.len() });
    }
    let mut conv = [0u8; 14];
    let errors = ViterbiDecoder::new(&CONV_RACH).decode(coded, &mut conv);
    apply_bsic(&mut conv, bsic);
    if !CRC_RACH.check_bits(&conv[..8], &conv[8..]) {
        return Err(CodecErr::BadCrc);
    }
    let mut ra = [0u8; 1];
    pack_lsb(&conv, &mut ra, 8);
    Ok((ra[0], errors))
}

/// Builds a full access burst: extended tail, synch sequence, data, tail, guard
pub fn build_access_burst(coded: &[Ubit; RACH_CODED_BITS]) -> Vec<Ubit> {
    let mut burst = vec![0u8; GSM_BURST_LEN];
    burst[..RACH_EXT_TAIL.len()].copy_from_slice(&RACH_EXT_TAIL);
    burst[RACH_EXT_TAIL.len()..RACH_DATA_OFFSET].copy_from_slice(&RACH_SYNCH_SEQ);
    burst[RACH_DATA_OFFSET..RACH_DATA_OFFSET + RACH_CODED_BITS].copy_from_slice(coded);
    burst
}

#[cfg(test)]
mod tests {
    use gsm_core::bits::{hard_to_soft, ubits_to_string};

    use super::*;

    fn soft(coded: &[Ubit]) -> Vec<Sbit> {
        coded.iter().map(|b| hard_to_soft(*b)).collect()
    }

    #[test]
    fn test_all_ra_all_bsic() {
        for bsic in 0..64u8 {
            for ra in 0..=255u8 {
                let coded = rach_encode(ra, bsic);
                let (decoded, errors) = rach_decode(&soft(&coded), bsic).unwrap();
                assert_eq!(decoded, ra);
                assert_eq!(errors.n_errors, 0);
            }
        }
    }

    #[test]
    fn test_wrong_bsic_mostly_rejected() {
        let mut rejected = 0;
        for ra in 0..=255u8 {
            let coded = rach_encode(ra, 0x25);
            if rach_decode(&soft(&coded), 0x1a).is_err() {
                rejected += 1;
            }
        }
        // Parity is fully masked by the BSIC, a different BSIC can never pass
        assert_eq!(rejected, 256);
    }

    #[test]
    fn test_crc_rejects_flipped_payload_bit() {
        let mut conv = [0u8; 14];
        unpack_lsb(&[0x42], &mut conv, 8);
        let (data, parity) = conv.split_at_mut(8);
        CRC_RACH.set_bits(data, parity);
        apply_bsic(&mut conv, 7);
        conv[3] ^= 1;
        let mut coded = [0u8; RACH_CODED_BITS];
        CONV_RACH.encode(&conv, &mut coded);
        assert_eq!(rach_decode(&soft(&coded), 7).err(), Some(CodecErr::BadCrc));
    }

    #[test]
    fn test_access_burst_layout() {
        let coded = rach_encode(0x11, 3);
        let burst = build_access_burst(&coded);
        assert_eq!(RACH_DATA_OFFSET, 49);
        assert_eq!(&burst[49..85], &coded[..]);
        assert!(burst[85..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_known_coded_bits() {
        // ra 0 towards BSIC 0: only the inverted parity reaches the encoder
        assert_eq!(ubits_to_string(&rach_encode(0, 0)), "000000000000000011101001101001000011");
        assert_eq!(ubits_to_string(&rach_encode(0x7f, 0x3c)), "111010011010100111010001100001111111");
    }
}
