//! Synchronisation burst coding

use gsm_core::bits::{pack_lsb, unpack_lsb};
use gsm_core::{FrameNumber, GSM_BURST_LEN, SCH_TRAIN, Sbit, TAIL_BITS, Ubit};

use super::conv::CONV_SCH;
use super::crc::CRC_SCH;
use super::viterbi::ViterbiDecoder;
use super::{BitErrors, CodecErr};

pub const SCH_CODED_BITS: usize = 78;
const SCH_HALF: usize = SCH_CODED_BITS / 2;

/// Packs the 25 bit SB information: BSIC, T1, T2 and the reduced T3'
pub fn sch_info(bsic: u8, fn_: FrameNumber) -> [u8; 4] {
    let t1 = fn_.t1();
    let t2 = fn_.t2();
    let t3p = fn_.t3().saturating_sub(1) / 10;
    [
        (((bsic as u32 & 0x3f) << 2) | ((t1 & 0x600) >> 9)) as u8,
        ((t1 & 0x1fe) >> 1) as u8,
        (((t1 & 0x001) << 7) | ((t2 & 0x1f) << 2) | ((t3p & 0x6) >> 1)) as u8,
        (t3p & 0x1) as u8,
    ]
}

/// Counterpart of `sch_info`, returns (bsic, t1, t2, t3')
pub fn sch_info_parse(sb: &[u8; 4]) -> (u8, u16, u8, u8) {
    let bsic = sb[0] >> 2;
    let t1 = (((sb[0] & 0x3) as u16) << 9) | ((sb[1] as u16) << 1) | ((sb[2] >> 7) as u16);
    let t2 = (sb[2] >> 2) & 0x1f;
    let t3p = ((sb[2] & 0x3) << 1) | (sb[3] & 0x1);
    (bsic, t1, t2, t3p)
}

pub fn sch_encode(sb_info: &[u8; 4]) -> [Ubit; SCH_CODED_BITS] {
    let mut conv = [0u8; 35];
    unpack_lsb(sb_info, &mut conv, 25);
    let (data, parity) = conv.split_at_mut(25);
    CRC_SCH.set_bits(data, parity);

    let mut coded = [0u8; SCH_CODED_BITS];
    CONV_SCH.encode(&conv, &mut coded);
    coded
}

pub fn sch_decode(coded: &[Sbit]) -> Result<([u8; 4], BitErrors), CodecErr> {
    if coded.len() < SCH_CODED_BITS {
        return Err(CodecErr::InvalidLength { len: coded.len() });
    }
    let mut conv = [0u8; 35];
    let errors = ViterbiDecoder::new(&CONV_SCH).decode(coded, &mut conv);
    if !CRC_SCH.check_bits(&conv[..25], &conv[25..]) {
        return Err(CodecErr::BadCrc);
    }
    let mut sb = [0u8; 4];
    pack_lsb(&conv, &mut sb, 25);
    Ok((sb, errors))
}

/// Builds a synchronisation burst: tail, 39 data bits, extended training sequence, 39 data bits, tail
pub fn build_sync_burst(coded: &[Ubit; SCH_CODED_BITS]) -> Vec<Ubit> {
    let mut burst = vec![0u8; GSM_BURST_LEN];
    let mid = TAIL_BITS + SCH_HALF;
    burst[TAIL_BITS..mid].copy_from_slice(&coded[..SCH_HALF]);
    burst[mid..mid + SCH_TRAIN.len()].copy_from_slice(&SCH_TRAIN);
    burst[mid + SCH_TRAIN.len()..mid + SCH_TRAIN.len() + SCH_HALF].copy_from_slice(&coded[SCH_HALF..]);
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
    fn test_sch_info_fields() {
        // t1 = 5, t3 = 41
        let fn_ = FrameNumber::new(51 * 26 * 5 + 41);
        let sb = sch_info(0x2a, fn_);
        let (bsic, t1, t2, t3p) = sch_info_parse(&sb);
        assert_eq!(bsic, 0x2a);
        assert_eq!(t1, fn_.t1() as u16);
        assert_eq!(t2, fn_.t2() as u8);
        assert_eq!(t3p, 4);
    }

    #[test]
    fn test_sch_roundtrip() {
        for v in [0u32, 1, 51 * 26 - 1, 2_715_647, 1_000_001] {
            let sb = sch_info(63, FrameNumber::new(v));
            let coded = sch_encode(&sb);
            let (decoded, errors) = sch_decode(&soft(&coded)).unwrap();
            assert_eq!(decoded, sb);
            assert_eq!(errors.n_errors, 0);
        }
    }

    #[test]
    fn test_crc_rejects_flipped_payload_bit() {
        let sb = sch_info(12, FrameNumber::new(777));
        let mut conv = [0u8; 35];
        unpack_lsb(&sb, &mut conv, 25);
        let (data, parity) = conv.split_at_mut(25);
        CRC_SCH.set_bits(data, parity);
        conv[20] ^= 1;
        let mut coded = [0u8; SCH_CODED_BITS];
        CONV_SCH.encode(&conv, &mut coded);
        assert_eq!(sch_decode(&soft(&coded)).err(), Some(CodecErr::BadCrc));
    }

    #[test]
    fn test_sync_burst_layout() {
        let coded = sch_encode(&sch_info(1, FrameNumber::new(0)));
        let burst = build_sync_burst(&coded);
        assert_eq!(&burst[3..42], &coded[..39]);
        assert_eq!(&burst[42..106], &SCH_TRAIN[..]);
        assert_eq!(&burst[106..145], &coded[39..]);
    }

    #[test]
    fn test_known_coded_bits() {
        let coded = sch_encode(&[0xa5, 0x3c, 0x81, 0x01]);
        assert_eq!(
            ubits_to_string(&coded),
            "110111101100101110110001100101001110001111000011101001101010011101001011111100"
        );
    }
}
