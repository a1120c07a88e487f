//! TCH/F full rate and enhanced full rate speech coding, with FACCH stealing

use gsm_core::bits::{pack_msb, soft_to_hard, unpack_msb};
use gsm_core::{NB_PAYLOAD_BITS, Sbit, Ubit};

use super::burst_map::{tch_burst_map, tch_burst_unmap};
use super::conv::CONV_TCH_FR;
use super::crc::{CRC_TCH_EFR, CRC_TCH_FR};
use super::interleaver::{BURST_DATA_BITS, tch_fr_deinterleave, tch_fr_interleave};
use super::tables::{EFR_BIT_ORDER, EFR_PROTECTED, EFR_REPEATED, FR_BIT_ORDER};
use super::viterbi::ViterbiDecoder;
use super::{BLOCK8_BITS, BitErrors, CodecErr, GSM_EFR_BYTES, GSM_FR_BYTES, GSM_MACBLOCK_LEN, TchBlock, xcch};

/// Signature nibble in the first byte of a GSM 06.10 frame
pub const FR_MAGIC: u8 = 0xd;
/// Signature nibble in the first byte of a GSM 06.60 frame
pub const EFR_MAGIC: u8 = 0xc;

const EFR_SPEECH_BITS: usize = 244;

/// Interleaves 456 coded bits into the 8 burst window. Only this block's half
/// of each burst is written, the other half keeps the neighbouring block.
pub(crate) fn map_block8(cb: &[Ubit], steal: Ubit, bursts: &mut [Ubit]) {
    let mut ib = [0u8; 8 * BURST_DATA_BITS];
    tch_fr_interleave(cb, &mut ib);
    for b in 0..8 {
        tch_burst_map(
            &ib[b * BURST_DATA_BITS..(b + 1) * BURST_DATA_BITS],
            &mut bursts[b * NB_PAYLOAD_BITS..(b + 1) * NB_PAYLOAD_BITS],
            steal,
            b >> 2,
        );
    }
}

/// Collects this block's half of the 8 burst window.
/// Returns true when the stealing flags mark the block as FACCH.
pub(crate) fn unmap_block8(bursts: &[Sbit], cb: &mut [Sbit]) -> bool {
    let mut ib = [0i8; 8 * BURST_DATA_BITS];
    let mut steal: i32 = 0;
    for b in 0..8 {
        let h = tch_burst_unmap(
            &bursts[b * NB_PAYLOAD_BITS..(b + 1) * NB_PAYLOAD_BITS],
            &mut ib[b * BURST_DATA_BITS..(b + 1) * BURST_DATA_BITS],
            b >> 2,
        );
        steal -= h as i32;
    }
    tch_fr_deinterleave(&ib, cb);
    steal > 0
}

fn efr_reorder(s: &[Ubit], p: &[Ubit], w: &mut [Ubit]) {
    w[..71].copy_from_slice(&s[..71]);
    w[71] = s[69];
    w[72] = s[69];
    w[73..123].copy_from_slice(&s[71..121]);
    w[123] = s[119];
    w[124] = s[119];
    w[125..178].copy_from_slice(&s[121..174]);
    w[178] = s[172];
    w[179] = s[172];
    w[180..230].copy_from_slice(&s[174..224]);
    w[230] = s[222];
    w[231] = s[222];
    w[232..252].copy_from_slice(&s[224..244]);
    w[252..260].copy_from_slice(&p[..8]);
}

fn efr_unreorder(w: &[Ubit], s: &mut [Ubit], p: &mut [Ubit]) {
    s[..71].copy_from_slice(&w[..71]);
    s[71..121].copy_from_slice(&w[73..123]);
    s[121..174].copy_from_slice(&w[125..178]);
    s[174..224].copy_from_slice(&w[180..230]);
    s[224..244].copy_from_slice(&w[232..252]);
    p[..8].copy_from_slice(&w[252..260]);

    // Majority of three for the repeated bits
    let copies = [(71, 72), (123, 124), (178, 179), (230, 231)];
    for (bit, (c1, c2)) in EFR_REPEATED.iter().zip(copies) {
        let sum = s[*bit] + w[c1] + w[c2];
        s[*bit] = (sum >= 2) as Ubit;
    }
}

fn efr_protected_bits(s: &[Ubit]) -> [Ubit; 65] {
    let mut b = [0u8; 65];
    for (dst, idx) in b.iter_mut().zip(EFR_PROTECTED.iter()) {
        *dst = s[*idx as usize];
    }
    b
}

/// Class ordered d bits -> coded bits: CRC over class 1a, reorder, convolutional code,
/// class 2 appended uncoded
fn encode_d(d: &[Ubit; 260], cb: &mut [Ubit; 456]) {
    let mut p = [0u8; 3];
    CRC_TCH_FR.set_bits(&d[..50], &mut p);

    let mut u = [0u8; 185];
    for i in 0..91 {
        u[i] = d[2 * i];
        u[184 - i] = d[2 * i + 1];
    }
    u[91..94].copy_from_slice(&p);

    CONV_TCH_FR.encode(&u, &mut cb[..378]);
    cb[378..].copy_from_slice(&d[182..]);
}

/// Encodes one TCH/F block into the 8 burst window.
/// Accepts a FACCH frame (23 bytes), an FR frame (33 bytes) or an EFR frame (31 bytes).
pub fn tch_fr_encode(payload: &[u8], bursts: &mut [Ubit]) -> Result<(), CodecErr> {
    if bursts.len() < BLOCK8_BITS {
        return Err(CodecErr::InvalidLength { len: bursts.len() });
    }
    let mut cb = [0u8; 456];
    let steal = match payload.len() {
        GSM_MACBLOCK_LEN => {
            xcch::encode_cb(payload, &mut cb);
            1
        }
        GSM_FR_BYTES => {
            let mut w = [0u8; 260];
            unpack_msb(payload, 4, &mut w, 260);
            let mut d = [0u8; 260];
            for (k, pos) in FR_BIT_ORDER.iter().enumerate() {
                d[k] = w[*pos as usize];
            }
            encode_d(&d, &mut cb);
            0
        }
        GSM_EFR_BYTES => {
            let mut s = [0u8; EFR_SPEECH_BITS];
            unpack_msb(payload, 4, &mut s, EFR_SPEECH_BITS);
            let mut p = [0u8; 8];
            CRC_TCH_EFR.set_bits(&efr_protected_bits(&s), &mut p);
            let mut w = [0u8; 260];
            efr_reorder(&s, &p, &mut w);
            let mut d = [0u8; 260];
            for (k, pos) in EFR_BIT_ORDER.iter().enumerate() {
                d[k] = w[*pos as usize];
            }
            encode_d(&d, &mut cb);
            0
        }
        len => return Err(CodecErr::InvalidLength { len }),
    };
    map_block8(&cb, steal, bursts);
    Ok(())
}

/// Decodes one TCH/F block from the 8 burst window.
/// Stolen blocks are returned as FACCH regardless of `efr`.
pub fn tch_fr_decode(bursts: &[Sbit], efr: bool) -> Result<(TchBlock, BitErrors), CodecErr> {
    if bursts.len() < BLOCK8_BITS {
        return Err(CodecErr::InvalidLength { len: bursts.len() });
    }
    let mut cb = [0i8; 456];
    if unmap_block8(bursts, &mut cb) {
        let (l2, errors) = xcch::decode_cb(&cb)?;
        return Ok((TchBlock::Facch(l2), errors));
    }

    let mut u = [0u8; 185];
    let errors = ViterbiDecoder::new(&CONV_TCH_FR).decode(&cb[..378], &mut u);

    let mut d = [0u8; 260];
    for i in 0..91 {
        d[2 * i] = u[i];
        d[2 * i + 1] = u[184 - i];
    }
    for (dst, s) in d[182..].iter_mut().zip(cb[378..].iter()) {
        *dst = soft_to_hard(*s);
    }
    if !CRC_TCH_FR.check_bits(&d[..50], &u[91..94]) {
        return Err(CodecErr::BadCrc);
    }

    let mut w = [0u8; 260];
    if efr {
        for (k, pos) in EFR_BIT_ORDER.iter().enumerate() {
            w[*pos as usize] = d[k];
        }
        let mut s = [0u8; EFR_SPEECH_BITS];
        let mut p = [0u8; 8];
        efr_unreorder(&w, &mut s, &mut p);
        if !CRC_TCH_EFR.check_bits(&efr_protected_bits(&s), &p) {
            return Err(CodecErr::BadCrc);
        }
        let mut frame = vec![0u8; GSM_EFR_BYTES];
        frame[0] = EFR_MAGIC << 4;
        pack_msb(&s, &mut frame, 4, EFR_SPEECH_BITS);
        Ok((TchBlock::Speech(frame), errors))
    } else {
        for (k, pos) in FR_BIT_ORDER.iter().enumerate() {
            w[*pos as usize] = d[k];
        }
        let mut frame = vec![0u8; GSM_FR_BYTES];
        frame[0] = FR_MAGIC << 4;
        pack_msb(&w, &mut frame, 4, 260);
        Ok((TchBlock::Speech(frame), errors))
    }
}

#[cfg(test)]
mod tests {
    use gsm_core::bits::hard_to_soft_buf;

    use super::*;

    fn to_soft(bits: &[Ubit]) -> Vec<Sbit> {
        let mut soft = vec![0i8; bits.len()];
        hard_to_soft_buf(bits, &mut soft);
        soft
    }

    fn random_frame(len: usize, magic: u8) -> Vec<u8> {
        let mut frame: Vec<u8> = (0..len).map(|_| rand::random::<u8>()).collect();
        frame[0] = (magic << 4) | (frame[0] & 0x0f);
        if magic == EFR_MAGIC {
            // 4 + 244 bits fill the frame exactly
            assert_eq!(len * 8, 248);
        }
        frame
    }

    #[test]
    fn test_fr_roundtrip() {
        let frame = random_frame(GSM_FR_BYTES, FR_MAGIC);
        let mut bursts = [0u8; BLOCK8_BITS];
        tch_fr_encode(&frame, &mut bursts).unwrap();

        let (block, errors) = tch_fr_decode(&to_soft(&bursts), false).unwrap();
        assert_eq!(block, TchBlock::Speech(frame));
        assert_eq!(errors.n_errors, 0);
    }

    #[test]
    fn test_efr_roundtrip() {
        let frame = random_frame(GSM_EFR_BYTES, EFR_MAGIC);
        let mut bursts = [0u8; BLOCK8_BITS];
        tch_fr_encode(&frame, &mut bursts).unwrap();

        let (block, _) = tch_fr_decode(&to_soft(&bursts), true).unwrap();
        assert_eq!(block, TchBlock::Speech(frame));
    }

    #[test]
    fn test_efr_repetition_corrects_one_copy() {
        let frame = random_frame(GSM_EFR_BYTES, EFR_MAGIC);
        let mut s = [0u8; EFR_SPEECH_BITS];
        unpack_msb(&frame, 4, &mut s, EFR_SPEECH_BITS);
        let mut p = [0u8; 8];
        CRC_TCH_EFR.set_bits(&efr_protected_bits(&s), &mut p);
        let mut w = [0u8; 260];
        efr_reorder(&s, &p, &mut w);

        w[72] ^= 1;
        let mut s2 = [0u8; EFR_SPEECH_BITS];
        let mut p2 = [0u8; 8];
        efr_unreorder(&w, &mut s2, &mut p2);
        assert_eq!(s2, s);
        assert_eq!(p2, p);
    }

    #[test]
    fn test_facch_stealing() {
        let l2 = [0x01u8, 0x3f, 0x01, 0x2b, 0x2b, 0x2b, 0x2b, 0x2b, 0x2b, 0x2b, 0x2b, 0x2b,
                  0x2b, 0x2b, 0x2b, 0x2b, 0x2b, 0x2b, 0x2b, 0x2b, 0x2b, 0x2b, 0x2b];
        let mut bursts = [0u8; BLOCK8_BITS];
        tch_fr_encode(&l2, &mut bursts).unwrap();

        for efr in [false, true] {
            let (block, _) = tch_fr_decode(&to_soft(&bursts), efr).unwrap();
            assert_eq!(block, TchBlock::Facch(l2));
        }
    }

    #[test]
    fn test_neighbour_block_survives() {
        // The second half of block A shares bursts with the first half of block B
        let a = random_frame(GSM_FR_BYTES, FR_MAGIC);
        let b = random_frame(GSM_FR_BYTES, FR_MAGIC);
        let mut window = vec![0u8; 12 * NB_PAYLOAD_BITS];
        tch_fr_encode(&a, &mut window[..BLOCK8_BITS]).unwrap();
        tch_fr_encode(&b, &mut window[4 * NB_PAYLOAD_BITS..]).unwrap();

        let soft = to_soft(&window);
        let (block_a, _) = tch_fr_decode(&soft[..BLOCK8_BITS], false).unwrap();
        let (block_b, _) = tch_fr_decode(&soft[4 * NB_PAYLOAD_BITS..], false).unwrap();
        assert_eq!(block_a, TchBlock::Speech(a));
        assert_eq!(block_b, TchBlock::Speech(b));
    }

    #[test]
    fn test_crc_rejects_flipped_class1a_bit() {
        let frame = random_frame(GSM_FR_BYTES, FR_MAGIC);
        let mut w = [0u8; 260];
        unpack_msb(&frame, 4, &mut w, 260);
        let mut d = [0u8; 260];
        for (k, pos) in FR_BIT_ORDER.iter().enumerate() {
            d[k] = w[*pos as usize];
        }
        let mut p = [0u8; 3];
        CRC_TCH_FR.set_bits(&d[..50], &mut p);
        d[10] ^= 1;

        let mut u = [0u8; 185];
        for i in 0..91 {
            u[i] = d[2 * i];
            u[184 - i] = d[2 * i + 1];
        }
        u[91..94].copy_from_slice(&p);
        let mut cb = [0u8; 456];
        CONV_TCH_FR.encode(&u, &mut cb[..378]);
        cb[378..].copy_from_slice(&d[182..]);
        let mut bursts = [0u8; BLOCK8_BITS];
        map_block8(&cb, 0, &mut bursts);

        assert_eq!(tch_fr_decode(&to_soft(&bursts), false).err(), Some(CodecErr::BadCrc));
    }

    #[test]
    fn test_efr_crc_rejects_flipped_protected_bit() {
        let frame = random_frame(GSM_EFR_BYTES, EFR_MAGIC);
        let mut s = [0u8; EFR_SPEECH_BITS];
        unpack_msb(&frame, 4, &mut s, EFR_SPEECH_BITS);
        let mut p = [0u8; 8];
        CRC_TCH_EFR.set_bits(&efr_protected_bits(&s), &mut p);
        s[EFR_PROTECTED[3] as usize] ^= 1;
        let mut w = [0u8; 260];
        efr_reorder(&s, &p, &mut w);
        let mut d = [0u8; 260];
        for (k, pos) in EFR_BIT_ORDER.iter().enumerate() {
            d[k] = w[*pos as usize];
        }
        let mut cb = [0u8; 456];
        encode_d(&d, &mut cb);
        let mut bursts = [0u8; BLOCK8_BITS];
        map_block8(&cb, 0, &mut bursts);

        assert_eq!(tch_fr_decode(&to_soft(&bursts), true).err(), Some(CodecErr::BadCrc));
    }

    #[test]
    fn test_fr_known_bursts() {
        // Only the LAR1 MSB set: d[0], the inverted class 1a parity and their code bits
        let mut frame = [0u8; GSM_FR_BYTES];
        frame[0] = (FR_MAGIC << 4) | 0x08;
        let mut bursts = [0u8; BLOCK8_BITS];
        tch_fr_encode(&frame, &mut bursts).unwrap();

        let ones: Vec<usize> = bursts.iter().enumerate().filter(|(_, b)| **b == 1).map(|(i, _)| i).collect();
        assert_eq!(ones, vec![0, 102, 120, 202, 216, 416, 537, 635, 715, 735, 749, 815, 835, 849]);
    }
}
