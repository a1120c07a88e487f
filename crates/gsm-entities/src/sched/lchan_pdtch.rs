use gsm_saps::ph::PhDataInd;
use gsm_saps::trx::TrxBurstInd;

use crate::codec::BLOCK4_BITS;
use crate::codec::pdtch::{pdtch_decode, pdtch_encode};

use super::chan_desc::ChanType;
use super::lchan_xcch::{rx_block4_burst, tx_block4_burst};
use super::{RxCtx, SchedErr, TxBurst, TxCtx, UpInd};

pub fn tx_pdtch(ctx: &mut TxCtx, chan: ChanType, bid: u8) -> Result<Option<TxBurst>, SchedErr> {
    if bid == 0 {
        ctx.cs.apply_pending();
        let desc = chan.desc();
        let Some(prim) = ctx.queue.dequeue(ctx.fn_, desc.chan_nr | ctx.tn, desc.link_id) else {
            tracing::info!(frame = %ctx.fn_, tn = ctx.tn, "tx_pdtch: No prim for transmit");
            ctx.cs.dl_invalidate();
            return Ok(None);
        };

        let buf = ctx.cs.dl_buf_alloc(BLOCK4_BITS)?;
        match pdtch_encode(prim.data(), buf) {
            Ok(cs) => tracing::debug!(frame = %ctx.fn_, tn = ctx.tn, "tx_pdtch: {:?} usf={}", cs, prim.data()[0] & 0x7),
            Err(e) => {
                tracing::error!(frame = %ctx.fn_, tn = ctx.tn, "tx_pdtch: cannot encode {} byte block: {}", prim.data().len(), e);
                ctx.cs.dl_invalidate();
                return Ok(None);
            }
        }
    }
    Ok(tx_block4_burst(ctx, bid))
}

pub fn rx_pdtch(ctx: &mut RxCtx, chan: ChanType, bid: u8, bi: &TrxBurstInd) -> Result<(), SchedErr> {
    if !rx_block4_burst(ctx.cs, chan, ctx.tn, bid, bi)? {
        return Ok(());
    }

    let cs = &mut *ctx.cs;
    let Some(buf) = cs.ul_buf() else {
        return Ok(());
    };
    let desc = chan.desc();
    match pdtch_decode(buf) {
        Ok(block) => {
            cs.lost_frames = 0;
            let meas = cs.meas.average(block.errors);
            tracing::debug!(frame = %cs.ul_first_fn, tn = ctx.tn, "rx_pdtch: {:?} {} bytes ber10k={}", block.cs, block.data.len(), meas.ber10k);
            ctx.ups.push(UpInd::Data(PhDataInd {
                fn_: cs.ul_first_fn,
                chan_nr: desc.chan_nr | ctx.tn,
                link_id: desc.link_id,
                data: block.data,
                meas,
            }));
        }
        Err(e) => {
            cs.lost_frames = cs.lost_frames.saturating_add(1);
            tracing::debug!(frame = %cs.ul_first_fn, tn = ctx.tn, "rx_pdtch: bad block: {}", e);
        }
    }
    Ok(())
}
