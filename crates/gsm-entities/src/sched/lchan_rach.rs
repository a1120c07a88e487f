use gsm_saps::ph::PhRachInd;
use gsm_saps::trx::TrxBurstInd;

use crate::codec::rach::{RACH_CODED_BITS, RACH_DATA_OFFSET, rach_decode};

use super::chan_desc::ChanType;
use super::chan_state::MeasAcc;
use super::{RxCtx, SchedErr, UpInd};

/// Decodes one access burst. Used for RACH and for the access bursts on PTCCH.
pub fn rx_rach(ctx: &mut RxCtx, chan: ChanType, bi: &TrxBurstInd) -> Result<(), SchedErr> {
    if bi.is_nope() {
        return Ok(());
    }
    if bi.burst.len() < RACH_DATA_OFFSET + RACH_CODED_BITS {
        tracing::warn!(frame = %bi.fn_, "rx_rach: access burst too short ({} bits)", bi.burst.len());
        return Ok(());
    }

    let coded = &bi.burst[RACH_DATA_OFFSET..RACH_DATA_OFFSET + RACH_CODED_BITS];
    let (ra, errors) = match rach_decode(coded, ctx.bsic) {
        Ok(res) => res,
        Err(e) => {
            tracing::trace!(frame = %bi.fn_, tn = ctx.tn, chan = chan.desc().name, "rx_rach: {}", e);
            return Ok(());
        }
    };

    let acc_delay = (bi.toa256.max(0) / 256).min(u8::MAX as i16) as u8;
    let mut acc = MeasAcc::default();
    acc.add(bi);
    let meas = acc.average(errors);

    tracing::debug!(frame = %bi.fn_, tn = ctx.tn, chan = chan.desc().name, "rx_rach: ra=0x{:02x} acc_delay={} rssi={}", ra, acc_delay, bi.rssi);
    ctx.ups.push(UpInd::Rach(PhRachInd {
        fn_: bi.fn_,
        chan_nr: chan.desc().chan_nr | ctx.tn,
        ra,
        acc_delay,
        meas,
    }));
    Ok(())
}
