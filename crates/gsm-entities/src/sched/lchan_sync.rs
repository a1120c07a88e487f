use gsm_core::{DUMMY_BURST, GSM_BURST_LEN};

use crate::codec::sch::{build_sync_burst, sch_encode, sch_info};

use super::{TxBurst, TxCtx};

/// Dummy burst on frames without a logical channel
pub fn tx_idle(_ctx: &mut TxCtx) -> Option<TxBurst> {
    Some(TxBurst::gmsk(DUMMY_BURST.to_vec()))
}

/// Frequency correction burst: all zeros, a pure sine after GMSK modulation
pub fn tx_fcch(_ctx: &mut TxCtx) -> Option<TxBurst> {
    Some(TxBurst::gmsk(vec![0; GSM_BURST_LEN]))
}

/// Synchronisation burst carrying BSIC and the reduced frame number
pub fn tx_sch(ctx: &mut TxCtx) -> Option<TxBurst> {
    let info = sch_info(ctx.bsic, ctx.fn_);
    tracing::trace!(frame = %ctx.fn_, "tx_sch: info {:02x?}", info);
    Some(TxBurst::gmsk(build_sync_burst(&sch_encode(&info))))
}
