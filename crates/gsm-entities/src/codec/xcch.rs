//! xCCH block coding (BCCH, CCCH, SDCCH, SACCH, CBCH, FACCH payload)

use gsm_core::bits::{pack_lsb, unpack_lsb};
use gsm_core::{NB_PAYLOAD_BITS, Sbit, Ubit};

use super::burst_map::{xcch_burst_map, xcch_burst_unmap};
use super::conv::CONV_XCCH;
use super::crc::CRC_FIRE40;
use super::interleaver::{BURST_DATA_BITS, xcch_deinterleave, xcch_interleave};
use super::viterbi::ViterbiDecoder;
use super::{BLOCK4_BITS, BitErrors, CodecErr, GSM_MACBLOCK_LEN};

const XCCH_FLAGS: [Ubit; 8] = [1; 8];

/// Encodes a 23 byte L2 frame into 456 coded bits
pub(crate) fn encode_cb(l2: &[u8], cb: &mut [Ubit]) {
    let mut conv = [0u8; 224];
    unpack_lsb(l2, &mut conv, 184);
    let (data, parity) = conv.split_at_mut(184);
    CRC_FIRE40.set_bits(data, parity);
    CONV_XCCH.encode(&conv, cb);
}

/// Decodes 456 coded soft bits into a 23 byte L2 frame
pub(crate) fn decode_cb(cb: &[Sbit]) -> Result<([u8; GSM_MACBLOCK_LEN], BitErrors), CodecErr> {
    let mut conv = [0u8; 224];
    let errors = ViterbiDecoder::new(&CONV_XCCH).decode(cb, &mut conv);
    if !CRC_FIRE40.check_bits(&conv[..184], &conv[184..]) {
        return Err(CodecErr::BadCrc);
    }
    let mut l2 = [0u8; GSM_MACBLOCK_LEN];
    pack_lsb(&conv, &mut l2, 184);
    Ok((l2, errors))
}

/// Interleaves 456 coded bits over 4 bursts and sets the stealing flags (hl, hu per burst)
pub(crate) fn map_block4(cb: &[Ubit], flags: &[Ubit; 8], bursts: &mut [Ubit]) {
    let mut ib = [0u8; 4 * BURST_DATA_BITS];
    xcch_interleave(cb, &mut ib);
    for b in 0..4 {
        xcch_burst_map(
            &ib[b * BURST_DATA_BITS..],
            &mut bursts[b * NB_PAYLOAD_BITS..(b + 1) * NB_PAYLOAD_BITS],
            Some(flags[2 * b]),
            Some(flags[2 * b + 1]),
        );
    }
}

/// Counterpart of `map_block4`, returning the received stealing flags
pub(crate) fn unmap_block4(bursts: &[Sbit], cb: &mut [Sbit]) -> [Sbit; 8] {
    let mut ib = [0i8; 4 * BURST_DATA_BITS];
    let mut flags = [0i8; 8];
    for b in 0..4 {
        let (hl, hu) = xcch_burst_unmap(
            &bursts[b * NB_PAYLOAD_BITS..(b + 1) * NB_PAYLOAD_BITS],
            &mut ib[b * BURST_DATA_BITS..(b + 1) * BURST_DATA_BITS],
        );
        flags[2 * b] = hl;
        flags[2 * b + 1] = hu;
    }
    xcch_deinterleave(&ib, cb);
    flags
}

/// Encodes a 23 byte L2 frame into 4 bursts of 116 payload bits
pub fn xcch_encode(l2: &[u8], bursts: &mut [Ubit]) -> Result<(), CodecErr> {
    if l2.len() != GSM_MACBLOCK_LEN {
        return Err(CodecErr::InvalidLength { len: l2.len() });
    }
    if bursts.len() < BLOCK4_BITS {
        return Err(CodecErr::InvalidLength { len: bursts.len() });
    }
    let mut cb = [0u8; 456];
    encode_cb(l2, &mut cb);
    map_block4(&cb, &XCCH_FLAGS, bursts);
    tracing::trace!("xcch_encode: {:02x?}", l2);
    Ok(())
}

/// Decodes 4 bursts of 116 soft bits into a 23 byte L2 frame
pub fn xcch_decode(bursts: &[Sbit]) -> Result<([u8; GSM_MACBLOCK_LEN], BitErrors), CodecErr> {
    if bursts.len() < BLOCK4_BITS {
        return Err(CodecErr::InvalidLength { len: bursts.len() });
    }
    let mut cb = [0i8; 456];
    unmap_block4(bursts, &mut cb);
    decode_cb(&cb)
}
