//! Mapping of interleaved bits onto the 116 payload positions of a normal burst,
//! and placement of those payload bits in the full 148 bit burst.
//!
//! Payload layout: e[0..57] data, e[57] = hl, e[58] = hu, e[59..116] data.

use gsm_core::{GSM_BURST_LEN, NB_PAYLOAD_BITS, TAIL_BITS, TSC_LEN, Ubit};

use super::interleaver::BURST_DATA_BITS;

const HALF: usize = 57;

pub fn xcch_burst_map<T: Copy>(i: &[T], e: &mut [T], hl: Option<T>, hu: Option<T>) {
    e[..HALF].copy_from_slice(&i[..HALF]);
    e[HALF + 2..NB_PAYLOAD_BITS].copy_from_slice(&i[HALF..BURST_DATA_BITS]);
    if let Some(hl) = hl {
        e[HALF] = hl;
    }
    if let Some(hu) = hu {
        e[HALF + 1] = hu;
    }
}

/// Returns the (hl, hu) stealing flags of the burst
pub fn xcch_burst_unmap<T: Copy>(e: &[T], i: &mut [T]) -> (T, T) {
    i[..HALF].copy_from_slice(&e[..HALF]);
    i[HALF..BURST_DATA_BITS].copy_from_slice(&e[HALF + 2..NB_PAYLOAD_BITS]);
    (e[HALF], e[HALF + 1])
}

/// Payload index of interleaved position `j`
#[inline(always)]
fn payload_pos(j: usize) -> usize {
    if j < HALF { j } else { j + 2 }
}

/// Maps one TCH/F burst. Only positions of parity `odd` belong to this block;
/// the even half is flagged by hu, the odd half by hl.
pub fn tch_burst_map<T: Copy>(i: &[T], e: &mut [T], h: T, odd: usize) {
    for j in (odd..BURST_DATA_BITS).step_by(2) {
        e[payload_pos(j)] = i[j];
    }
    if odd == 0 {
        e[HALF + 1] = h;
    } else {
        e[HALF] = h;
    }
}

/// Counterpart of `tch_burst_map`; returns the stealing flag of this block's half
pub fn tch_burst_unmap<T: Copy>(e: &[T], i: &mut [T], odd: usize) -> T {
    for j in (odd..BURST_DATA_BITS).step_by(2) {
        i[j] = e[payload_pos(j)];
    }
    if odd == 0 { e[HALF + 1] } else { e[HALF] }
}

/// Builds a normal burst: tail, first payload half, training sequence, second half, tail
pub fn build_normal_burst(payload: &[Ubit], tsc: &[Ubit; TSC_LEN]) -> Vec<Ubit> {
    let mut burst = vec![0u8; GSM_BURST_LEN];
    let first = TAIL_BITS;
    let mid = first + NB_PAYLOAD_BITS / 2;
    burst[first..mid].copy_from_slice(&payload[..NB_PAYLOAD_BITS / 2]);
    burst[mid..mid + TSC_LEN].copy_from_slice(tsc);
    burst[mid + TSC_LEN..mid + TSC_LEN + NB_PAYLOAD_BITS / 2].copy_from_slice(&payload[NB_PAYLOAD_BITS / 2..NB_PAYLOAD_BITS]);
    burst
}

/// Extracts the 116 payload bits of a received normal burst
pub fn extract_normal_payload<T: Copy>(burst: &[T], payload: &mut [T]) {
    let first = TAIL_BITS;
    let mid = first + NB_PAYLOAD_BITS / 2;
    payload[..NB_PAYLOAD_BITS / 2].copy_from_slice(&burst[first..mid]);
    payload[NB_PAYLOAD_BITS / 2..NB_PAYLOAD_BITS]
        .copy_from_slice(&burst[mid + TSC_LEN..mid + TSC_LEN + NB_PAYLOAD_BITS / 2]);
}
