//! TCH/F with FACCH/F: eight burst diagonal interleaving.
//!
//! Both directions keep an eight burst window. At the start of each block the
//! newer half moves down to positions 0..3 and the block is written over the
//! whole window, so every burst carries halves of two consecutive blocks.

use gsm_core::{GSM_BURST_LEN, GSM_TSC, LID_DEDIC, ModType, NB_PAYLOAD_BITS};
use gsm_saps::mph::MphErrorInd;
use gsm_saps::mph::enums::{RslCmode, TchMode};
use gsm_saps::ph::{PhDataInd, PhTchInd, UlMeas};
use gsm_saps::trx::TrxBurstInd;

use crate::codec::burst_map::{build_normal_burst, extract_normal_payload};
use crate::codec::tch_afs::{tch_afs_decode, tch_afs_encode};
use crate::codec::tch_fr::{EFR_MAGIC, FR_MAGIC, tch_fr_decode, tch_fr_encode};
use crate::codec::{BLOCK8_BITS, BitErrors, CodecErr, GSM_EFR_BYTES, GSM_FR_BYTES, GSM_MACBLOCK_LEN, TchBlock};

use super::amr::{amr_compose_payload, amr_decompose_payload, dl_amr_is_cmr, ul_amr_is_cmr};
use super::chan_desc::ChanType;
use super::chan_state::ChanState;
use super::dl_queue::DlPrim;
use super::lchan_xcch::fill_frame;
use super::{RxCtx, SchedErr, TxBurst, TxCtx, UpInd};

const HALF: usize = 4 * NB_PAYLOAD_BITS;

/// Uplink blocks without a decoded frame before bad-frame indications are injected
const BFI_THRESHOLD: u8 = 5;

fn speech_mode(cs: &ChanState) -> bool {
    cs.rsl_cmode == RslCmode::Speech && cs.tch_mode != TchMode::Signalling
}

/// Checks a downlink speech frame against the channel mode and returns the
/// bytes to hand to the encoder. AMR frames have their header stripped and
/// update the downlink frame type and mode request.
fn check_speech(cs: &mut ChanState, data: &[u8]) -> Option<Vec<u8>> {
    match cs.tch_mode {
        TchMode::Signalling => {
            tracing::error!("check_speech: speech frame on a channel in signalling mode, dropped");
            None
        }
        TchMode::SpeechV1 => {
            if data.len() != GSM_FR_BYTES || data[0] >> 4 != FR_MAGIC {
                tracing::error!("check_speech: invalid FR frame, len {}", data.len());
                return None;
            }
            Some(data.to_vec())
        }
        TchMode::SpeechEfr => {
            if data.len() != GSM_EFR_BYTES || data[0] >> 4 != EFR_MAGIC {
                tracing::error!("check_speech: invalid EFR frame, len {}", data.len());
                return None;
            }
            Some(data.to_vec())
        }
        TchMode::SpeechAmr => {
            let Some((cmr_codec, ft_codec, _bfi, speech)) = amr_decompose_payload(data) else {
                tracing::error!("check_speech: AMR frame too short, len {}", data.len());
                return None;
            };
            let Some(ft) = cs.amr.codecs.iter().position(|c| *c == ft_codec) else {
                tracing::error!("check_speech: AMR frame type {} not in codec set {:?}", ft_codec, cs.amr.codecs);
                return None;
            };
            cs.amr.dl_ft = ft as u8;
            match cs.amr.codecs.iter().position(|c| *c == cmr_codec) {
                Some(cmr) => cs.amr.dl_cmr = cmr as u8,
                None => tracing::warn!("check_speech: AMR mode request {} not in codec set {:?}", cmr_codec, cs.amr.codecs),
            }
            Some(speech.to_vec())
        }
    }
}

/// Takes the FACCH and speech primitives of the block starting now.
/// FACCH wins over speech.
fn dequeue_block(ctx: &mut TxCtx, chan: ChanType) -> Option<Vec<u8>> {
    let chan_nr = chan.desc().chan_nr | ctx.tn;
    let mut facch: Option<Vec<u8>> = None;
    let mut tch: Option<Vec<u8>> = None;

    for _ in 0..2 {
        match ctx.queue.dequeue(ctx.fn_, chan_nr, LID_DEDIC) {
            Some(DlPrim::Data(p)) => {
                if facch.is_some() {
                    tracing::warn!(frame = %ctx.fn_, tn = ctx.tn, "dequeue_block: more than one FACCH prim, dropping");
                } else if p.data.len() != GSM_MACBLOCK_LEN {
                    tracing::error!(frame = %ctx.fn_, tn = ctx.tn, "dequeue_block: FACCH prim has {} bytes, expected {}", p.data.len(), GSM_MACBLOCK_LEN);
                } else {
                    facch = Some(p.data);
                }
            }
            Some(DlPrim::Tch(p)) => {
                if tch.is_some() {
                    tracing::warn!(frame = %ctx.fn_, tn = ctx.tn, "dequeue_block: more than one TCH prim, dropping");
                } else {
                    tch = Some(p.data);
                }
            }
            None => break,
        }
    }

    let speech = tch.and_then(|data| check_speech(ctx.cs, &data));
    if facch.is_some() {
        if speech.is_some() {
            tracing::debug!(frame = %ctx.fn_, tn = ctx.tn, "dequeue_block: FACCH steals the speech frame");
        }
        return facch;
    }
    speech
}

/// Counts downlink blocks without an uplink frame and injects a bad-frame
/// indication once the uplink has been silent for too long
fn inject_bfi(ctx: &mut TxCtx, chan: ChanType) {
    let cs = &mut *ctx.cs;
    cs.lost_frames = cs.lost_frames.saturating_add(1);
    if cs.lost_frames <= BFI_THRESHOLD {
        return;
    }

    let data = match cs.tch_mode {
        TchMode::SpeechAmr => {
            let codec = |id: u8| cs.amr.codecs.get(id as usize).copied().unwrap_or(0);
            amr_compose_payload(codec(cs.amr.ul_cmr), codec(cs.amr.ul_ft), true).to_vec()
        }
        _ => Vec::new(),
    };
    tracing::debug!(frame = %ctx.fn_, tn = ctx.tn, "inject_bfi: {} blocks without uplink speech", cs.lost_frames);
    ctx.ups.push(UpInd::Tch(PhTchInd {
        fn_: ctx.fn_,
        chan_nr: chan.desc().chan_nr | ctx.tn,
        data,
        meas: UlMeas::default(),
    }));
}

pub fn tx_tchf(ctx: &mut TxCtx, chan: ChanType, bid: u8) -> Result<Option<TxBurst>, SchedErr> {
    if bid == 0 {
        ctx.cs.apply_pending();

        if ctx.bfi_injection && speech_mode(ctx.cs) {
            inject_bfi(ctx, chan);
        }

        let payload = dequeue_block(ctx, chan);

        if let Some(buf) = ctx.cs.dl_buf_raw_mut() {
            buf.copy_within(HALF..BLOCK8_BITS, 0);
            buf[HALF..].fill(0);
        }

        match payload {
            None => {
                if !ctx.cs.has_dl_buf() {
                    return Ok(None);
                }
                tracing::info!(frame = %ctx.fn_, tn = ctx.tn, "tx_tchf: No prim for transmit");
                ctx.cs.dl_buf_alloc(BLOCK8_BITS)?;
            }
            Some(payload) => {
                let amr = (ctx.cs.tch_mode == TchMode::SpeechAmr).then(|| ctx.cs.amr.clone());
                let cmr_phase = dl_amr_is_cmr(ctx.fn_);
                let buf = ctx.cs.dl_buf_alloc(BLOCK8_BITS)?;
                let res = match amr {
                    Some(amr) => tch_afs_encode(&payload, buf, cmr_phase, &amr.codecs, amr.dl_ft, amr.dl_cmr),
                    None => tch_fr_encode(&payload, buf),
                };
                if let Err(e) = res {
                    // Keep the window consistent: the half is sent as an idle FACCH block
                    tracing::error!(frame = %ctx.fn_, tn = ctx.tn, "tx_tchf: cannot encode {} byte frame: {}, sending fill", payload.len(), e);
                    tch_fr_encode(&fill_frame(), buf).map_err(|_| SchedErr::InvalidFrame)?;
                    ctx.ups.push(UpInd::Error(MphErrorInd {
                        fn_: ctx.fn_,
                        chan_nr: chan.desc().chan_nr | ctx.tn,
                        cause: e.to_string(),
                    }));
                }
            }
        }
    }

    let Some(buf) = ctx.cs.dl_buf() else {
        return Ok(None);
    };
    let off = bid as usize * NB_PAYLOAD_BITS;
    let bits = build_normal_burst(&buf[off..off + NB_PAYLOAD_BITS], &GSM_TSC[ctx.tsc as usize]);
    Ok(Some(TxBurst::gmsk(bits)))
}

fn decode_window(cs: &mut ChanState) -> Result<(TchBlock, BitErrors), CodecErr> {
    let Some(buf) = cs.ul_buf() else {
        return Err(CodecErr::InvalidLength { len: 0 });
    };
    match cs.tch_mode {
        TchMode::Signalling | TchMode::SpeechV1 => tch_fr_decode(buf, false),
        TchMode::SpeechEfr => tch_fr_decode(buf, true),
        TchMode::SpeechAmr => {
            let cmr_phase = ul_amr_is_cmr(cs.ul_prev_first_fn);
            let (mut ft, mut cmr) = (cs.amr.ul_ft, cs.amr.ul_cmr);
            let res = tch_afs_decode(buf, cmr_phase, &cs.amr.codecs, &mut ft, &mut cmr);
            cs.amr.ul_ft = ft;
            cs.amr.ul_cmr = cmr;
            res
        }
    }
}

pub fn rx_tchf(ctx: &mut RxCtx, chan: ChanType, bid: u8, bi: &TrxBurstInd) -> Result<(), SchedErr> {
    let cs = &mut *ctx.cs;
    if bid == 0 {
        cs.apply_pending();
        let buf = cs.ul_buf_alloc(BLOCK8_BITS)?;
        buf.copy_within(HALF..BLOCK8_BITS, 0);
        buf[HALF..].fill(0);
        cs.ul_mask <<= 4;
        cs.ul_prev_first_fn = cs.ul_first_fn;
        cs.ul_first_fn = bi.fn_;
        cs.meas.reset();
        cs.ul_block_open = true;
    }
    if !cs.ul_block_open {
        return Ok(());
    }

    if !bi.is_nope() {
        if bi.mod_type == ModType::Gmsk && bi.burst.len() >= GSM_BURST_LEN {
            let buf = cs.ul_buf_alloc(BLOCK8_BITS)?;
            let off = HALF + bid as usize * NB_PAYLOAD_BITS;
            extract_normal_payload(&bi.burst, &mut buf[off..off + NB_PAYLOAD_BITS]);
            cs.ul_mask |= 1 << bid;
            cs.meas.add(bi);
        } else {
            tracing::debug!(frame = %bi.fn_, tn = ctx.tn, "rx_tchf: ignoring {:?} burst of {} bits", bi.mod_type, bi.burst.len());
            cs.lost_tdma_fs += 1;
        }
    }

    if bid != 3 {
        return Ok(());
    }
    cs.ul_block_open = false;

    // Nothing in one of the two halves, e.g. right after activation
    if cs.ul_mask & 0x0f == 0 || cs.ul_mask & 0xf0 == 0 {
        tracing::debug!(frame = %bi.fn_, tn = ctx.tn, "rx_tchf: no burst in half of the window, mask 0x{:02x}", cs.ul_mask);
        return Ok(());
    }
    if cs.ul_mask != 0xff {
        tracing::warn!(frame = %bi.fn_, tn = ctx.tn, "rx_tchf: incomplete block, mask 0x{:02x}, decoding anyway", cs.ul_mask);
    }

    let desc = chan.desc();
    let chan_nr = desc.chan_nr | ctx.tn;
    let fn_ = cs.ul_prev_first_fn;
    match decode_window(cs) {
        Ok((TchBlock::Facch(l2), errors)) => {
            cs.lost_frames = 0;
            let meas = cs.meas.average(errors);
            tracing::debug!(frame = %fn_, tn = ctx.tn, "rx_tchf: FACCH {:02x?}", l2);
            ctx.ups.push(UpInd::Data(PhDataInd { fn_, chan_nr, link_id: LID_DEDIC, data: l2.to_vec(), meas }));
        }
        Ok((TchBlock::Speech(frame), errors)) => {
            if !speech_mode(cs) {
                tracing::debug!(frame = %fn_, tn = ctx.tn, "rx_tchf: speech frame in signalling mode, dropped");
                return Ok(());
            }
            cs.lost_frames = 0;
            let meas = cs.meas.average(errors);
            let data = if cs.tch_mode == TchMode::SpeechAmr {
                let codec = |id: u8| cs.amr.codecs.get(id as usize).copied().unwrap_or(0);
                let mut data = amr_compose_payload(codec(cs.amr.ul_cmr), codec(cs.amr.ul_ft), false).to_vec();
                data.extend_from_slice(&frame);
                data
            } else {
                frame
            };
            tracing::trace!(frame = %fn_, tn = ctx.tn, "rx_tchf: speech {} bytes ber10k={}", data.len(), meas.ber10k);
            ctx.ups.push(UpInd::Tch(PhTchInd { fn_, chan_nr, data, meas }));
        }
        Err(CodecErr::AmrIdOutOfRange { id }) => {
            tracing::warn!(frame = %fn_, tn = ctx.tn, "rx_tchf: AMR id {} outside codec set {:?}", id, cs.amr.codecs);
            cs.lost_tdma_fs += 4;
        }
        Err(e) => {
            tracing::debug!(frame = %fn_, tn = ctx.tn, "rx_tchf: bad frame: {}", e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use gsm_core::FrameNumber;
    use gsm_core::bits::hard_to_soft_buf;
    use gsm_saps::ph::{PhDataReq, PhTchReq};

    use crate::sched::chan_state::ModeCfg;
    use crate::sched::dl_queue::DlQueue;

    use super::*;

    const TN: u8 = 2;
    const CHAN_NR: u8 = 0x08 | TN;

    /// TCH/F block start frames in the first 26-multiframe
    const STARTS: [u32; 6] = [0, 4, 8, 13, 17, 21];

    fn frame_of(block: usize, bid: u8) -> u32 {
        STARTS[block % 6] + 26 * (block / 6) as u32 + bid as u32
    }

    fn fr_frame(seed: u8) -> Vec<u8> {
        let mut f: Vec<u8> = (0..GSM_FR_BYTES as u8).map(|i| i.wrapping_mul(seed)).collect();
        f[0] = (FR_MAGIC << 4) | (f[0] & 0xf);
        f
    }

    struct Link {
        tx_cs: ChanState,
        rx_cs: ChanState,
        queue: DlQueue,
        ups: Vec<UpInd>,
        bfi_injection: bool,
    }

    impl Link {
        fn new(mode: ModeCfg) -> Self {
            let mut tx_cs = ChanState::default();
            let mut rx_cs = ChanState::default();
            tx_cs.set_mode(mode.clone());
            rx_cs.set_mode(mode);
            tx_cs.active = true;
            rx_cs.active = true;
            Self { tx_cs, rx_cs, queue: DlQueue::default(), ups: Vec::new(), bfi_injection: false }
        }

        /// Sends one block and feeds its bursts straight back as uplink
        fn run_block(&mut self, block: usize) {
            for bid in 0..4u8 {
                let fn_ = FrameNumber::new(frame_of(block, bid));
                let mut tx = TxCtx {
                    fn_,
                    tn: TN,
                    bsic: 0,
                    tsc: 0,
                    bfi_injection: self.bfi_injection,
                    cs: &mut self.tx_cs,
                    queue: &mut self.queue,
                    ups: &mut self.ups,
                };
                let burst = tx_tchf(&mut tx, ChanType::TchF, bid).unwrap();

                let mut bi = TrxBurstInd::nope(fn_, TN);
                if let Some(burst) = burst {
                    bi.burst = vec![0; burst.bits.len()];
                    hard_to_soft_buf(&burst.bits, &mut bi.burst);
                }
                let mut rx = RxCtx { tn: TN, bsic: 0, cs: &mut self.rx_cs, ups: &mut self.ups };
                rx_tchf(&mut rx, ChanType::TchF, bid, &bi).unwrap();
            }
        }

        fn queue_tch(&mut self, block: usize, data: Vec<u8>) {
            let fn_ = FrameNumber::new(frame_of(block, 0));
            self.queue.push(DlPrim::Tch(PhTchReq { fn_, chan_nr: CHAN_NR, data }));
        }

        fn queue_facch(&mut self, block: usize, data: Vec<u8>) {
            let fn_ = FrameNumber::new(frame_of(block, 0));
            self.queue.push(DlPrim::Data(PhDataReq { fn_, chan_nr: CHAN_NR, link_id: LID_DEDIC, data }));
        }
    }

    fn fr_mode() -> ModeCfg {
        ModeCfg { rsl_cmode: RslCmode::Speech, tch_mode: TchMode::SpeechV1, ..Default::default() }
    }

    #[test]
    fn test_fr_speech_loop() {
        let mut link = Link::new(fr_mode());
        for block in 0..4 {
            link.queue_tch(block, fr_frame(block as u8 + 3));
        }
        for block in 0..5 {
            link.run_block(block);
        }

        // Each frame is complete once the following block has been received
        let frames: Vec<(u32, Vec<u8>)> = link.ups.iter().filter_map(|u| match u {
            UpInd::Tch(ind) => Some((ind.fn_.value(), ind.data.clone())),
            _ => None,
        }).collect();
        assert_eq!(frames.len(), 4);
        for (block, (fn_, data)) in frames.iter().enumerate() {
            assert_eq!(*fn_, frame_of(block, 0));
            assert_eq!(*data, fr_frame(block as u8 + 3));
        }
    }

    #[test]
    fn test_facch_steals_speech() {
        let mut link = Link::new(fr_mode());
        let l2: Vec<u8> = (0..23).collect();
        link.queue_tch(0, fr_frame(7));
        link.queue_facch(0, l2.clone());
        link.run_block(0);
        link.run_block(1);

        assert!(link.queue.is_empty());
        assert_eq!(link.ups.len(), 1);
        let UpInd::Data(ind) = &link.ups[0] else { panic!("expected FACCH indication") };
        assert_eq!(ind.data, l2);
        assert_eq!(ind.chan_nr, CHAN_NR);
        assert_eq!(ind.link_id, LID_DEDIC);
    }

    #[test]
    fn test_invalid_speech_dropped() {
        let mut link = Link::new(fr_mode());
        let mut bad = fr_frame(5);
        bad[0] = (EFR_MAGIC << 4) | 1;
        link.queue_tch(0, bad);
        link.run_block(0);
        link.run_block(1);
        assert!(link.ups.is_empty());
        assert!(link.queue.is_empty());

        // Speech on a signalling channel is dropped as well
        let mut link = Link::new(ModeCfg::default());
        link.queue_tch(0, fr_frame(5));
        link.run_block(0);
        assert!(link.queue.is_empty());
        assert!(!link.tx_cs.has_dl_buf());
    }

    #[test]
    fn test_amr_speech_loop() {
        // 4.75, 5.90, 7.40, 12.2
        let codecs = vec![0, 2, 4, 7];
        let mode = ModeCfg { rsl_cmode: RslCmode::Speech, tch_mode: TchMode::SpeechAmr, codecs, initial_id: 2 };
        let mut link = Link::new(mode);

        let speech_len = crate::codec::tables::AMR_MODES[4].bytes;
        let frame = |seed: u8| {
            let mut f = amr_compose_payload(4, 4, false).to_vec();
            f.extend((0..speech_len as u8).map(|i| i.wrapping_mul(seed)));
            // Unused bits of the last byte are not carried
            let bits = crate::codec::tables::AMR_MODES[4].bits;
            if bits % 8 != 0 {
                let last = f.len() - 1;
                f[last] &= 0xffu8 << (8 - bits % 8);
            }
            f
        };
        for block in 0..3 {
            link.queue_tch(block, frame(block as u8 + 1));
        }
        for block in 0..4 {
            link.run_block(block);
        }

        let frames: Vec<&PhTchInd> = link.ups.iter().filter_map(|u| match u {
            UpInd::Tch(ind) => Some(ind),
            _ => None,
        }).collect();
        assert_eq!(frames.len(), 3);
        for (block, ind) in frames.iter().enumerate() {
            assert_eq!(ind.data, frame(block as u8 + 1));
        }
    }

    #[test]
    fn test_bfi_injection() {
        let mut link = Link::new(fr_mode());
        link.bfi_injection = true;
        for block in 0..7 {
            link.run_block(block);
        }
        // Nothing was ever sent, so nothing came back: blocks 5 and 6 inject
        let bfis: Vec<&PhTchInd> = link.ups.iter().filter_map(|u| match u {
            UpInd::Tch(ind) => Some(ind),
            _ => None,
        }).collect();
        assert_eq!(bfis.len(), 2);
        assert!(bfis.iter().all(|ind| ind.data.is_empty() && ind.chan_nr == CHAN_NR));
    }

    #[test]
    fn test_unencodable_frame_replaced_by_fill() {
        let codecs = vec![0, 2, 4, 7];
        let mode = ModeCfg { rsl_cmode: RslCmode::Speech, tch_mode: TchMode::SpeechAmr, codecs, initial_id: 2 };
        let mut link = Link::new(mode);
        // Mode request id outside the codec set; the frames below request codec 5, which is
        // not in the set either, so the id is never corrected
        link.tx_cs.amr.dl_cmr = 6;

        let speech_len = crate::codec::tables::AMR_MODES[4].bytes;
        let frame = || {
            let mut f = amr_compose_payload(5, 4, false).to_vec();
            f.extend(std::iter::repeat_n(0u8, speech_len));
            f
        };
        // Block 0 carries the mode request, block 1 the mode indication
        link.queue_tch(0, frame());
        link.queue_tch(1, frame());
        for block in 0..3 {
            link.run_block(block);
        }

        let errors: Vec<&MphErrorInd> = link.ups.iter().filter_map(|u| match u {
            UpInd::Error(ind) => Some(ind),
            _ => None,
        }).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].fn_.value(), frame_of(0, 0));
        assert_eq!(errors[0].chan_nr, CHAN_NR);
        assert_eq!(errors[0].cause, CodecErr::AmrIdOutOfRange { id: 6 }.to_string());

        // The failed block went out as a decodable fill frame, the next one as speech
        let facch: Vec<&PhDataInd> = link.ups.iter().filter_map(|u| match u {
            UpInd::Data(ind) => Some(ind),
            _ => None,
        }).collect();
        assert_eq!(facch.len(), 1);
        assert_eq!(facch[0].data, fill_frame().to_vec());
        assert_eq!(facch[0].fn_.value(), frame_of(0, 0));
        let speech = link.ups.iter().filter(|u| matches!(u, UpInd::Tch(_))).count();
        assert_eq!(speech, 1);
    }
}
