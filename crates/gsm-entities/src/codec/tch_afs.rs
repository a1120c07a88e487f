//! TCH/AFS adaptive multi-rate speech coding on a full rate channel.
//!
//! Each block carries a 2 bit in-band id which alternates between the mode
//! indication (index of the codec used for this frame) and the mode request
//! (index of the codec wanted in the other direction). Ids index into the
//! active codec set of up to four AMR modes.

use gsm_core::bits::{pack_msb, unpack_msb};
use gsm_core::{Sbit, Ubit};

use super::conv::CONV_AFS;
use super::crc::CRC_AMR;
use super::tables::{AFS_IC, AMR_MODES};
use super::tch_fr::{map_block8, unmap_block8};
use super::viterbi::ViterbiDecoder;
use super::{BLOCK8_BITS, BitErrors, CodecErr, GSM_MACBLOCK_LEN, TchBlock, nearest_pattern, xcch};

/// Number of AMR codec modes, 4.75 (0) up to 12.2 (7)
pub const AMR_NUM_MODES: u8 = 8;

fn mode_of(codecs: &[u8], id: u8) -> Result<usize, CodecErr> {
    let codec = *codecs.get(id as usize).ok_or(CodecErr::AmrIdOutOfRange { id })?;
    if codec >= AMR_NUM_MODES {
        return Err(CodecErr::UnsupportedCodec { codec });
    }
    Ok(codec as usize)
}

/// Encodes one TCH/AFS block into the 8 burst window.
///
/// A 23 byte payload is sent as FACCH. Otherwise the payload is the speech
/// frame of codec `codecs[ft]`, and the in-band id is `cmr` when
/// `codec_mode_req` is set, `ft` otherwise.
pub fn tch_afs_encode(
    payload: &[u8],
    bursts: &mut [Ubit],
    codec_mode_req: bool,
    codecs: &[u8],
    ft: u8,
    cmr: u8,
) -> Result<(), CodecErr> {
    if bursts.len() < BLOCK8_BITS {
        return Err(CodecErr::InvalidLength { len: bursts.len() });
    }
    let mut cb = [0u8; 456];

    if payload.len() == GSM_MACBLOCK_LEN {
        xcch::encode_cb(payload, &mut cb);
        map_block8(&cb, 1, bursts);
        return Ok(());
    }

    let id = if codec_mode_req { cmr } else { ft };
    if id as usize >= codecs.len() {
        return Err(CodecErr::AmrIdOutOfRange { id });
    }
    let mode = mode_of(codecs, ft)?;
    let info = AMR_MODES[mode];
    if payload.len() != info.bytes {
        return Err(CodecErr::InvalidLength { len: payload.len() });
    }

    let mut d = [0u8; 244];
    unpack_msb(payload, 0, &mut d, info.bits);
    let mut p = [0u8; 6];
    CRC_AMR.set_bits(&d[..info.prot], &mut p);

    let code = &CONV_AFS[mode];
    let mut u = vec![0u8; code.len];
    u[..info.prot].copy_from_slice(&d[..info.prot]);
    u[info.prot..info.prot + 6].copy_from_slice(&p);
    u[info.prot + 6..].copy_from_slice(&d[info.prot..info.bits]);

    cb[..8].copy_from_slice(&AFS_IC[id as usize]);
    code.encode(&u, &mut cb[8..]);
    map_block8(&cb, 0, bursts);
    Ok(())
}

/// Decodes one TCH/AFS block from the 8 burst window.
///
/// When `codec_mode_req` is set the block carries a mode request: the speech
/// is decoded with the last known `ft` and the received id is stored in `cmr`.
/// Otherwise the received id selects the codec and is stored in `ft`.
/// An id outside the codec set yields `AmrIdOutOfRange` and leaves both untouched.
pub fn tch_afs_decode(
    bursts: &[Sbit],
    codec_mode_req: bool,
    codecs: &[u8],
    ft: &mut u8,
    cmr: &mut u8,
) -> Result<(TchBlock, BitErrors), CodecErr> {
    if bursts.len() < BLOCK8_BITS {
        return Err(CodecErr::InvalidLength { len: bursts.len() });
    }
    let mut cb = [0i8; 456];
    if unmap_block8(bursts, &mut cb) {
        let (l2, errors) = xcch::decode_cb(&cb)?;
        return Ok((TchBlock::Facch(l2), errors));
    }

    let id = nearest_pattern(&AFS_IC, &cb[..8]) as u8;
    if id as usize >= codecs.len() {
        return Err(CodecErr::AmrIdOutOfRange { id });
    }
    let mode = mode_of(codecs, if codec_mode_req { *ft } else { id })?;
    let info = AMR_MODES[mode];
    let code = &CONV_AFS[mode];

    let mut u = vec![0u8; code.len];
    let errors = ViterbiDecoder::new(code).decode(&cb[8..], &mut u);

    let mut d = [0u8; 244];
    d[..info.prot].copy_from_slice(&u[..info.prot]);
    d[info.prot..info.bits].copy_from_slice(&u[info.prot + 6..]);
    if !CRC_AMR.check_bits(&d[..info.prot], &u[info.prot..info.prot + 6]) {
        return Err(CodecErr::BadCrc);
    }

    let mut frame = vec![0u8; info.bytes];
    pack_msb(&d, &mut frame, 0, info.bits);

    if codec_mode_req {
        *cmr = id;
    } else {
        *ft = id;
    }
    tracing::trace!("tch_afs_decode: mode={} id={} cmr_phase={} {:?}", mode, id, codec_mode_req, errors);
    Ok((TchBlock::Speech(frame), errors))
}

#[cfg(test)]
mod tests {
    use gsm_core::bits::{hard_to_soft_buf, soft_to_hard_buf, ubits_to_string};

    use super::*;

    fn to_soft(bits: &[Ubit]) -> Vec<Sbit> {
        let mut soft = vec![0i8; bits.len()];
        hard_to_soft_buf(bits, &mut soft);
        soft
    }

    fn random_speech(mode: usize) -> Vec<u8> {
        let info = AMR_MODES[mode];
        let mut frame: Vec<u8> = (0..info.bytes).map(|_| rand::random::<u8>()).collect();
        let spare = info.bytes * 8 - info.bits;
        let last = frame.len() - 1;
        frame[last] &= !((1u16 << spare) - 1) as u8;
        frame
    }

    #[test]
    fn test_all_modes_roundtrip() {
        for mode in 0..8u8 {
            // Put the mode at every id position of a four codec set
            for id in 0..4u8 {
                let mut codecs = vec![0u8, 2, 4, 6];
                codecs[id as usize] = mode;
                let speech = random_speech(mode as usize);
                let mut bursts = [0u8; BLOCK8_BITS];
                tch_afs_encode(&speech, &mut bursts, false, &codecs, id, 0).unwrap();

                let (mut ft, mut cmr) = (0xff, 0xff);
                let (block, errors) = tch_afs_decode(&to_soft(&bursts), false, &codecs, &mut ft, &mut cmr).unwrap();
                assert_eq!(block, TchBlock::Speech(speech), "mode {} id {}", mode, id);
                assert_eq!(ft, id);
                assert_eq!(cmr, 0xff);
                assert_eq!(errors.n_errors, 0);
                assert_eq!(errors.n_bits_total, 448);
            }
        }
    }

    #[test]
    fn test_mode_request_phase() {
        let codecs = [1u8, 7];
        let speech = random_speech(7);
        let mut bursts = [0u8; BLOCK8_BITS];
        // Speech uses codec 7 (ft=1) while requesting id 0 from the peer
        tch_afs_encode(&speech, &mut bursts, true, &codecs, 1, 0).unwrap();

        let (mut ft, mut cmr) = (1, 1);
        let (block, _) = tch_afs_decode(&to_soft(&bursts), true, &codecs, &mut ft, &mut cmr).unwrap();
        assert_eq!(block, TchBlock::Speech(speech));
        assert_eq!(ft, 1);
        assert_eq!(cmr, 0);
    }

    #[test]
    fn test_id_outside_codec_set() {
        let speech = random_speech(5);
        let mut bursts = [0u8; BLOCK8_BITS];
        tch_afs_encode(&speech, &mut bursts, false, &[0, 1, 2, 5], 3, 0).unwrap();

        // Receiver only knows two codecs
        let (mut ft, mut cmr) = (0, 0);
        let res = tch_afs_decode(&to_soft(&bursts), false, &[0, 1], &mut ft, &mut cmr);
        assert_eq!(res.err(), Some(CodecErr::AmrIdOutOfRange { id: 3 }));
        assert_eq!(ft, 0);

        assert_eq!(
            tch_afs_encode(&speech, &mut bursts, false, &[5], 2, 0),
            Err(CodecErr::AmrIdOutOfRange { id: 2 })
        );
    }

    #[test]
    fn test_wrong_payload_length() {
        let mut bursts = [0u8; BLOCK8_BITS];
        assert_eq!(
            tch_afs_encode(&[0u8; 20], &mut bursts, false, &[7], 0, 0),
            Err(CodecErr::InvalidLength { len: 20 })
        );
    }

    #[test]
    fn test_facch_regardless_of_mode() {
        let l2 = [0x2bu8; 23];
        let mut bursts = [0u8; BLOCK8_BITS];
        tch_afs_encode(&l2, &mut bursts, false, &[7], 0, 0).unwrap();
        for codecs in [&[0u8][..], &[7u8, 5][..]] {
            let (mut ft, mut cmr) = (0, 0);
            let (block, _) = tch_afs_decode(&to_soft(&bursts), true, codecs, &mut ft, &mut cmr).unwrap();
            assert_eq!(block, TchBlock::Facch(l2));
        }
    }

    #[test]
    fn test_crc_rejects_flipped_class1a_bit() {
        for mode in 0..8usize {
            let info = AMR_MODES[mode];
            let speech = random_speech(mode);
            let mut d = [0u8; 244];
            unpack_msb(&speech, 0, &mut d, info.bits);
            let mut p = [0u8; 6];
            CRC_AMR.set_bits(&d[..info.prot], &mut p);
            d[info.prot / 2] ^= 1;

            let code = &CONV_AFS[mode];
            let mut u = vec![0u8; code.len];
            u[..info.prot].copy_from_slice(&d[..info.prot]);
            u[info.prot..info.prot + 6].copy_from_slice(&p);
            u[info.prot + 6..].copy_from_slice(&d[info.prot..info.bits]);
            let mut cb = [0u8; 456];
            code.encode(&u, &mut cb[8..]);
            let mut bursts = [0u8; BLOCK8_BITS];
            map_block8(&cb, 0, &mut bursts);

            let (mut ft, mut cmr) = (0, 0);
            let res = tch_afs_decode(&to_soft(&bursts), false, &[mode as u8], &mut ft, &mut cmr);
            assert_eq!(res.err(), Some(CodecErr::BadCrc), "mode {}", mode);
        }
    }

    #[test]
    fn test_12_2_known_coded_block() {
        // First speech bit only, codec 12.2 signalled with id 3
        let mut speech = [0u8; 31];
        speech[0] = 0x80;
        let mut bursts = [0u8; BLOCK8_BITS];
        tch_afs_encode(&speech, &mut bursts, false, &[0, 2, 5, 7], 3, 0).unwrap();

        let mut soft = [0i8; 456];
        assert!(!unmap_block8(&to_soft(&bursts), &mut soft));
        let mut cb = [0u8; 456];
        soft_to_hard_buf(&soft, &mut cb);
        assert_eq!(&cb[..8], &AFS_IC[3]);
        assert_eq!(
            ubits_to_string(&cb[..64]),
            "1100111111010000010100010001010101000000010000010100010001010101"
        );
        assert_eq!(ubits_to_string(&cb[424..]), "00001000000000010000010000001110");
        assert_eq!(cb.iter().filter(|b| **b == 1).count(), 114);
    }
}
