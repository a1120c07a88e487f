//! AMR payload framing toward the upper layer and in-band signalling phase.
//!
//! Speech frames are exchanged as a two byte header followed by the speech bits:
//! byte 0 carries the codec mode request in the high nibble, byte 1 the frame
//! type in bits 7..3 and the quality bit in bit 2.

use gsm_core::FrameNumber;

pub const AMR_HDR_LEN: usize = 2;

/// Builds the header. `bfi` clears the quality bit.
pub fn amr_compose_payload(cmr: u8, ft: u8, bfi: bool) -> [u8; AMR_HDR_LEN] {
    [(cmr & 0xf) << 4, ((ft & 0x1f) << 3) | ((!bfi as u8) << 2)]
}

/// Splits a framed payload into (cmr, ft, bfi, speech)
pub fn amr_decompose_payload(payload: &[u8]) -> Option<(u8, u8, bool, &[u8])> {
    if payload.len() < AMR_HDR_LEN {
        return None;
    }
    let cmr = payload[0] >> 4;
    let ft = payload[1] >> 3;
    let bfi = payload[1] & 0x04 == 0;
    Some((cmr, ft, bfi, &payload[AMR_HDR_LEN..]))
}

/// True if the downlink block starting at `fn_` carries the mode request
pub fn dl_amr_is_cmr(fn_: FrameNumber) -> bool {
    (((fn_.value() + 4) % 26) >> 2) & 1 != 0
}

/// True if the uplink block that started at `first_fn` carries the mode request.
/// Uplink alternates in opposite phase to downlink.
pub fn ul_amr_is_cmr(first_fn: FrameNumber) -> bool {
    !dl_amr_is_cmr(first_fn)
}
