//! Four burst control channels: BCCH, CCCH, SDCCH, SACCH, CBCH and PTCCH downlink

use gsm_core::{GSM_BURST_LEN, GSM_TSC, ModType, NB_PAYLOAD_BITS};
use gsm_saps::ph::PhDataInd;
use gsm_saps::trx::TrxBurstInd;

use crate::codec::burst_map::{build_normal_burst, extract_normal_payload};
use crate::codec::xcch::{xcch_decode, xcch_encode};
use crate::codec::{BLOCK4_BITS, GSM_MACBLOCK_LEN, GSM_MACBLOCK_PADDING};

use super::chan_desc::ChanType;
use super::chan_state::ChanState;
use super::{RxCtx, SchedErr, TxBurst, TxCtx, UpInd};

/// LAPDm UI frame without information, sent when L2 has nothing queued
pub fn fill_frame() -> [u8; GSM_MACBLOCK_LEN] {
    let mut f = [GSM_MACBLOCK_PADDING; GSM_MACBLOCK_LEN];
    f[0] = 0x01;
    f[1] = 0x03;
    f[2] = 0x01;
    f
}

/// Cuts burst `bid` out of a four burst block buffer
pub(super) fn tx_block4_burst(ctx: &mut TxCtx, bid: u8) -> Option<TxBurst> {
    let bits = {
        let buf = ctx.cs.dl_buf()?;
        let off = bid as usize * NB_PAYLOAD_BITS;
        build_normal_burst(&buf[off..off + NB_PAYLOAD_BITS], &GSM_TSC[ctx.tsc as usize])
    };
    if bid == 3 {
        ctx.cs.dl_invalidate();
    }
    Some(TxBurst::gmsk(bits))
}

pub fn tx_data(ctx: &mut TxCtx, chan: ChanType, bid: u8) -> Result<Option<TxBurst>, SchedErr> {
    if bid == 0 {
        ctx.cs.apply_pending();
        let desc = chan.desc();
        let chan_nr = desc.chan_nr | ctx.tn;

        let l2 = match ctx.queue.dequeue(ctx.fn_, chan_nr, desc.link_id) {
            Some(prim) if prim.data().len() == GSM_MACBLOCK_LEN => prim.data().to_vec(),
            Some(prim) => {
                tracing::error!(frame = %ctx.fn_, tn = ctx.tn, chan = desc.name, "tx_data: prim has {} bytes, expected {}", prim.data().len(), GSM_MACBLOCK_LEN);
                ctx.cs.dl_invalidate();
                return Ok(None);
            }
            None if chan.is_pdch() => {
                ctx.cs.dl_invalidate();
                return Ok(None);
            }
            None => {
                tracing::trace!(frame = %ctx.fn_, tn = ctx.tn, chan = desc.name, "tx_data: no prim, sending fill frame");
                fill_frame().to_vec()
            }
        };

        let buf = ctx.cs.dl_buf_alloc(BLOCK4_BITS)?;
        if let Err(e) = xcch_encode(&l2, buf) {
            tracing::error!(frame = %ctx.fn_, tn = ctx.tn, chan = desc.name, "tx_data: encoding failed: {}", e);
            ctx.cs.dl_invalidate();
            return Ok(None);
        }
    }
    Ok(tx_block4_burst(ctx, bid))
}

/// Stores one burst of a four burst uplink block.
/// Returns true on the last burst when the block should be decoded.
pub(super) fn rx_block4_burst(cs: &mut ChanState, chan: ChanType, tn: u8, bid: u8, bi: &TrxBurstInd) -> Result<bool, SchedErr> {
    if bid == 0 {
        cs.apply_pending();
        cs.ul_block_start(bi.fn_, BLOCK4_BITS)?;
    }
    if !cs.ul_block_open {
        if bid == 3 {
            // Joined in the middle of a block
            cs.lost_frames = cs.lost_frames.saturating_add(1);
        }
        return Ok(false);
    }

    if !bi.is_nope() {
        if bi.mod_type == ModType::Gmsk && bi.burst.len() >= GSM_BURST_LEN {
            let buf = cs.ul_buf_alloc(BLOCK4_BITS)?;
            let off = bid as usize * NB_PAYLOAD_BITS;
            extract_normal_payload(&bi.burst, &mut buf[off..off + NB_PAYLOAD_BITS]);
            cs.ul_mask |= 1 << bid;
            cs.meas.add(bi);
        } else {
            tracing::debug!(frame = %bi.fn_, tn, chan = chan.desc().name, "rx_block4: ignoring {:?} burst of {} bits", bi.mod_type, bi.burst.len());
            cs.lost_tdma_fs += 1;
        }
    }

    if bid != 3 {
        return Ok(false);
    }

    cs.ul_block_open = false;
    if cs.ul_mask == 0 {
        tracing::debug!(frame = %bi.fn_, tn, chan = chan.desc().name, "rx_block4: no burst of the block received");
        cs.lost_frames = cs.lost_frames.saturating_add(1);
        return Ok(false);
    }
    if cs.ul_mask & 0xf != 0xf {
        tracing::warn!(frame = %bi.fn_, tn, chan = chan.desc().name, "rx_block4: incomplete block, mask 0x{:x}, decoding anyway", cs.ul_mask);
    }
    Ok(true)
}

pub fn rx_data(ctx: &mut RxCtx, chan: ChanType, bid: u8, bi: &TrxBurstInd) -> Result<(), SchedErr> {
    if !rx_block4_burst(ctx.cs, chan, ctx.tn, bid, bi)? {
        return Ok(());
    }

    let cs = &mut *ctx.cs;
    let Some(buf) = cs.ul_buf() else {
        return Ok(());
    };
    let desc = chan.desc();
    match xcch_decode(buf) {
        Ok((l2, errors)) => {
            cs.lost_frames = 0;
            let meas = cs.meas.average(errors);
            tracing::debug!(frame = %cs.ul_first_fn, tn = ctx.tn, chan = desc.name, "rx_data: {:02x?} ber10k={}", l2, meas.ber10k);
            ctx.ups.push(UpInd::Data(PhDataInd {
                fn_: cs.ul_first_fn,
                chan_nr: desc.chan_nr | ctx.tn,
                link_id: desc.link_id,
                data: l2.to_vec(),
                meas,
            }));
        }
        Err(e) => {
            cs.lost_frames = cs.lost_frames.saturating_add(1);
            tracing::debug!(frame = %cs.ul_first_fn, tn = ctx.tn, chan = desc.name, "rx_data: bad block: {}", e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use gsm_core::FrameNumber;
    use gsm_core::bits::hard_to_soft_buf;
    use gsm_saps::ph::PhDataReq;

    use crate::sched::dl_queue::{DlPrim, DlQueue};

    use super::*;

    fn tx_block(cs: &mut ChanState, queue: &mut DlQueue, chan: ChanType, first_fn: u32) -> Vec<Option<TxBurst>> {
        let mut ups = Vec::new();
        (0..4u8)
            .map(|bid| {
                let mut ctx = TxCtx {
                    fn_: FrameNumber::new(first_fn + bid as u32),
                    tn: 1,
                    bsic: 0,
                    tsc: 3,
                    bfi_injection: false,
                    cs: &mut *cs,
                    queue: &mut *queue,
                    ups: &mut ups,
                };
                tx_data(&mut ctx, chan, bid).unwrap()
            })
            .collect()
    }

    fn to_ind(burst: &TxBurst, fn_: u32) -> TrxBurstInd {
        let mut soft = vec![0i8; burst.bits.len()];
        hard_to_soft_buf(&burst.bits, &mut soft);
        TrxBurstInd { rssi: -70, toa256: 64, burst: soft, ..TrxBurstInd::nope(FrameNumber::new(fn_), 1) }
    }

    #[test]
    fn test_fill_frame() {
        let f = fill_frame();
        assert_eq!(&f[..4], &[0x01, 0x03, 0x01, 0x2b]);
        assert!(f[3..].iter().all(|b| *b == 0x2b));
    }

    #[test]
    fn test_block_tx_then_rx() {
        let chan = ChanType::Sdcch8_3;
        let chan_nr = chan.desc().chan_nr | 1;
        let l2: Vec<u8> = (0..23).map(|i| (i * 11) as u8).collect();

        let mut queue = DlQueue::default();
        queue.push(DlPrim::Data(PhDataReq { fn_: FrameNumber::new(12), chan_nr, link_id: 0, data: l2.clone() }));
        let mut tx_cs = ChanState::default();
        tx_cs.activate();
        let bursts = tx_block(&mut tx_cs, &mut queue, chan, 12);
        assert!(queue.is_empty());
        assert!(tx_cs.dl_buf().is_none());

        let mut rx_cs = ChanState::default();
        rx_cs.activate();
        let mut ups = Vec::new();
        for (bid, burst) in bursts.iter().enumerate() {
            let bi = to_ind(burst.as_ref().unwrap(), 12 + bid as u32);
            let mut ctx = RxCtx { tn: 1, bsic: 0, cs: &mut rx_cs, ups: &mut ups };
            rx_data(&mut ctx, chan, bid as u8, &bi).unwrap();
        }

        assert_eq!(ups.len(), 1);
        let UpInd::Data(ind) = &ups[0] else { panic!("expected data indication") };
        assert_eq!(ind.data, l2);
        assert_eq!(ind.fn_.value(), 12);
        assert_eq!(ind.chan_nr, chan_nr);
        assert_eq!(ind.meas.rssi, -70);
        assert_eq!(ind.meas.toa256, 64);
        assert_eq!(ind.meas.ber10k, 0);
    }

    #[test]
    fn test_empty_queue() {
        // Dedicated channels send the fill frame
        let mut queue = DlQueue::default();
        let mut cs = ChanState::default();
        cs.activate();
        let bursts = tx_block(&mut cs, &mut queue, ChanType::Sacch8_0, 0);
        assert!(bursts.iter().all(|b| b.is_some()));

        // PTCCH sends nothing
        let mut cs = ChanState::default();
        cs.activate();
        let bursts = tx_block(&mut cs, &mut queue, ChanType::Ptcch, 0);
        assert!(bursts.iter().all(|b| b.is_none()));
    }

    #[test]
    fn test_wrong_length_dropped() {
        let chan = ChanType::Bcch;
        let mut queue = DlQueue::default();
        queue.push(DlPrim::Data(PhDataReq { fn_: FrameNumber::new(2), chan_nr: 0x81, link_id: 0, data: vec![0; 22] }));
        let mut cs = ChanState::default();
        let bursts = tx_block(&mut cs, &mut queue, chan, 2);
        assert!(bursts.iter().all(|b| b.is_none()));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_missing_first_burst_not_decoded() {
        let chan = ChanType::Sdcch8_0;
        let mut cs = ChanState::default();
        cs.activate();
        let mut ups = Vec::new();
        for bid in 1..4u8 {
            let bi = TrxBurstInd { burst: vec![100; GSM_BURST_LEN], ..TrxBurstInd::nope(FrameNumber::new(bid as u32), 1) };
            let mut ctx = RxCtx { tn: 1, bsic: 0, cs: &mut cs, ups: &mut ups };
            rx_data(&mut ctx, chan, bid, &bi).unwrap();
        }
        assert!(ups.is_empty());
        assert_eq!(cs.lost_frames, 1);
    }
}
