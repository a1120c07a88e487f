use gsm_config::StackConfig;
use gsm_core::{ChanNr, CHAN_NR_TYPE_MASK, FrameNumber, LinkId, NUM_TIMESLOTS, Pchan, Timeslot, chan_nr_tn};
use gsm_saps::mph::enums::{CipherAlgo, RslCmode, TchMode};
use gsm_saps::ph::{PhDataReq, PhRtsInd, PhTchReq, RtsKind};
use gsm_saps::trx::{TrxBurstInd, TrxBurstReq};

use crate::codec::a5::{a5_1, a5_count, cipher_burst, decipher_burst};

use super::chan_desc::{ChanType, NUM_CHAN_TYPES, RxHandler, TxHandler};
use super::chan_state::{ChanState, ModeCfg};
use super::dl_queue::{DlPrim, DlQueue};
use super::multiframe::{Multiframe, find_mframe};
use super::{RxCtx, SchedErr, TxCtx, UpInd, lchan_pdtch, lchan_rach, lchan_sync, lchan_tchf, lchan_xcch};

/// Maximum number of codecs in an AMR active codec set
const AMR_MAX_CODECS: usize = 4;

/// State of one timeslot: its layout, the channels it carries and their downlink queue
struct TsState {
    pchan: Pchan,
    mf: &'static Multiframe,
    chans: Vec<ChanState>,
    dl_queue: DlQueue,
}

impl TsState {
    fn new(mf: &'static Multiframe) -> Self {
        Self {
            pchan: mf.pchan,
            mf,
            chans: (0..NUM_CHAN_TYPES).map(|_| ChanState::default()).collect(),
            dl_queue: DlQueue::default(),
        }
    }

    /// Channels of this layout addressed by a channel number, optionally narrowed to one link
    fn matching(&self, chan_nr: ChanNr, link_id: Option<LinkId>) -> impl Iterator<Item = ChanType> + '_ {
        let type_bits = chan_nr & CHAN_NR_TYPE_MASK;
        ChanType::ALL.into_iter().filter(move |chan| {
            let desc = chan.desc();
            desc.chan_nr == type_bits
                && link_id.is_none_or(|l| desc.link_id == l)
                && !chan.is_auto_active()
                && self.mf.contains(*chan)
        })
    }

    fn is_active(&self, chan: ChanType) -> bool {
        chan == ChanType::Idle || chan.is_auto_active() || self.chans[chan.idx()].active
    }
}

/// Scheduler of one transceiver: eight timeslots, each following its multiframe layout
pub struct TrxScheduler {
    bsic: u8,
    tsc: u8,
    bfi_injection: bool,
    ts: Vec<TsState>,
    /// Indications produced since the last `take_indications`
    ups: Vec<UpInd>,
}

impl TrxScheduler {
    pub fn new(bsic: u8, tsc: u8, bfi_injection: bool) -> Self {
        let idle = &super::multiframe::MULTIFRAMES[0];
        Self {
            bsic,
            tsc,
            bfi_injection,
            ts: (0..NUM_TIMESLOTS).map(|_| TsState::new(idle)).collect(),
            ups: Vec::new(),
        }
    }

    /// Builds the scheduler with the cell parameters and timeslot configuration
    pub fn from_config(cfg: &StackConfig) -> Result<Self, SchedErr> {
        let mut sched = Self::new(cfg.cell.bsic, cfg.cell.tsc, cfg.sched.tch_bfi_injection);
        for (tn, pchan) in cfg.cell.timeslots.iter().enumerate() {
            sched.set_pchan(tn as Timeslot, *pchan)?;
        }
        Ok(sched)
    }

    fn ts_mut(&mut self, tn: Timeslot) -> Result<&mut TsState, SchedErr> {
        self.ts.get_mut(tn as usize).ok_or(SchedErr::InvalidTimeslot)
    }

    pub fn pchan(&self, tn: Timeslot) -> Option<Pchan> {
        self.ts.get(tn as usize).map(|ts| ts.pchan)
    }

    /// Read access to a channel state, mainly for inspection and tests
    pub fn chan_state(&self, tn: Timeslot, chan: ChanType) -> Option<&ChanState> {
        self.ts.get(tn as usize).map(|ts| &ts.chans[chan.idx()])
    }

    /// Switches a timeslot to another physical channel configuration.
    /// All its channels are deactivated and pending downlink data is dropped.
    pub fn set_pchan(&mut self, tn: Timeslot, pchan: Pchan) -> Result<(), SchedErr> {
        if tn as usize >= NUM_TIMESLOTS {
            return Err(SchedErr::InvalidTimeslot);
        }
        let mf = find_mframe(pchan, tn).ok_or(SchedErr::UnsupportedMapping { pchan, tn })?;
        tracing::info!("set_pchan: tn {} {:?} using multiframe {} (period {})", tn, pchan, mf.name, mf.period);

        let ts = self.ts_mut(tn)?;
        for cs in ts.chans.iter_mut() {
            cs.deactivate();
        }
        ts.dl_queue.clear();
        ts.pchan = pchan;
        ts.mf = mf;
        Ok(())
    }

    /// Activates or deactivates the logical channels matching `chan_nr` and `link_id`
    pub fn set_lchan(&mut self, chan_nr: ChanNr, link_id: LinkId, active: bool) -> Result<(), SchedErr> {
        let tn = chan_nr_tn(chan_nr);
        let ts = self.ts_mut(tn)?;
        let chans: Vec<ChanType> = ts.matching(chan_nr, Some(link_id)).collect();
        if chans.is_empty() {
            tracing::warn!("set_lchan: chan_nr 0x{:02x} link 0x{:02x} not part of {} on tn {}", chan_nr, link_id, ts.mf.name, tn);
            return Err(SchedErr::NoMatchingChannel);
        }

        for chan in chans {
            let cs = &mut ts.chans[chan.idx()];
            tracing::info!("set_lchan: {} {} on tn {}", if active { "activating" } else { "deactivating" }, chan.desc().name, tn);
            if active {
                if cs.active {
                    tracing::warn!("set_lchan: {} on tn {} already active, restarting", chan.desc().name, tn);
                }
                cs.activate();
            } else {
                cs.deactivate();
                ts.dl_queue.flush_chan(chan.desc().chan_nr | tn, chan.desc().link_id);
            }
        }
        Ok(())
    }

    /// Sets the channel mode of the main channel and its SACCH
    pub fn set_mode(&mut self, chan_nr: ChanNr, rsl_cmode: RslCmode, tch_mode: TchMode, codecs: &[u8], initial_id: u8) -> Result<(), SchedErr> {
        if codecs.len() > AMR_MAX_CODECS || codecs.iter().any(|c| *c > 7) {
            return Err(SchedErr::InvalidCodecSet);
        }
        if tch_mode == TchMode::SpeechAmr && (initial_id as usize) >= codecs.len() {
            return Err(SchedErr::InvalidCodecSet);
        }

        let tn = chan_nr_tn(chan_nr);
        let ts = self.ts_mut(tn)?;
        let chans: Vec<ChanType> = ts.matching(chan_nr, None).collect();
        if chans.is_empty() {
            return Err(SchedErr::NoMatchingChannel);
        }
        for chan in chans {
            tracing::info!("set_mode: {} on tn {} {:?} {:?} codecs={:?}", chan.desc().name, tn, rsl_cmode, tch_mode, codecs);
            ts.chans[chan.idx()].set_mode(ModeCfg { rsl_cmode, tch_mode, codecs: codecs.to_vec(), initial_id });
        }
        Ok(())
    }

    /// Sets the cipher of one direction of the main channel and its SACCH
    pub fn set_cipher(&mut self, chan_nr: ChanNr, downlink: bool, algo: CipherAlgo, key: &[u8]) -> Result<(), SchedErr> {
        let key = match algo {
            CipherAlgo::None => None,
            CipherAlgo::A5_1 => {
                let key: [u8; 8] = key.try_into().map_err(|_| SchedErr::InvalidKey { len: key.len() })?;
                Some(key)
            }
            CipherAlgo::A5_2 | CipherAlgo::A5_3 => {
                tracing::warn!("set_cipher: {:?} not supported", algo);
                return Err(SchedErr::UnsupportedCipher);
            }
        };

        let tn = chan_nr_tn(chan_nr);
        let ts = self.ts_mut(tn)?;
        let chans: Vec<ChanType> = ts.matching(chan_nr, None).collect();
        if chans.is_empty() {
            return Err(SchedErr::NoMatchingChannel);
        }
        for chan in chans {
            tracing::info!("set_cipher: {} on tn {} {} {:?}", chan.desc().name, tn, if downlink { "dl" } else { "ul" }, algo);
            ts.chans[chan.idx()].set_cipher(downlink, key);
        }
        Ok(())
    }

    /// Queues a signalling or packet block for transmission
    pub fn ph_data_req(&mut self, req: PhDataReq) {
        let tn = chan_nr_tn(req.chan_nr) as usize;
        tracing::trace!(frame = %req.fn_, "ph_data_req: chan_nr 0x{:02x} link 0x{:02x} {} bytes", req.chan_nr, req.link_id, req.data.len());
        self.ts[tn].dl_queue.push(DlPrim::Data(req));
    }

    /// Queues a speech frame for transmission
    pub fn ph_tch_req(&mut self, req: PhTchReq) {
        let tn = chan_nr_tn(req.chan_nr) as usize;
        tracing::trace!(frame = %req.fn_, "ph_tch_req: chan_nr 0x{:02x} {} bytes", req.chan_nr, req.data.len());
        self.ts[tn].dl_queue.push(DlPrim::Tch(req));
    }

    /// Ready-to-send indications for the blocks starting at `fn_`, one per timeslot at most
    pub fn rts(&self, fn_: FrameNumber) -> Vec<(ChanType, PhRtsInd)> {
        let mut out = Vec::new();
        for (tn, ts) in self.ts.iter().enumerate() {
            let f = ts.mf.frame(fn_);
            let chan = f.dl_chan;
            if f.dl_bid != 0 || !ts.is_active(chan) {
                continue;
            }
            let kind = match chan.desc().tx {
                TxHandler::Data | TxHandler::Pdtch => RtsKind::Data,
                TxHandler::TchF => RtsKind::Tch,
                TxHandler::None | TxHandler::Idle | TxHandler::Fcch | TxHandler::Sch => continue,
            };
            let desc = chan.desc();
            out.push((
                chan,
                PhRtsInd { fn_, tn: tn as Timeslot, chan_nr: desc.chan_nr | tn as u8, link_id: desc.link_id, kind },
            ));
        }
        out
    }

    /// Builds the downlink burst of timeslot `tn` in frame `fn_`.
    /// Returns None when nothing is to be sent.
    pub fn dl_burst(&mut self, tn: Timeslot, fn_: FrameNumber) -> Result<Option<TrxBurstReq>, SchedErr> {
        let (bsic, tsc, bfi_injection) = (self.bsic, self.tsc, self.bfi_injection);
        let ts = self.ts.get_mut(tn as usize).ok_or(SchedErr::InvalidTimeslot)?;
        let f = *ts.mf.frame(fn_);
        let chan = f.dl_chan;

        let res = if ts.is_active(chan) {
            let mut ctx = TxCtx {
                fn_,
                tn,
                bsic,
                tsc,
                bfi_injection,
                cs: &mut ts.chans[chan.idx()],
                queue: &mut ts.dl_queue,
                ups: &mut self.ups,
            };
            match chan.desc().tx {
                TxHandler::None => Ok(None),
                TxHandler::Idle => Ok(lchan_sync::tx_idle(&mut ctx)),
                TxHandler::Fcch => Ok(lchan_sync::tx_fcch(&mut ctx)),
                TxHandler::Sch => Ok(lchan_sync::tx_sch(&mut ctx)),
                TxHandler::Data => lchan_xcch::tx_data(&mut ctx, chan, f.dl_bid),
                TxHandler::Pdtch => lchan_pdtch::tx_pdtch(&mut ctx, chan, f.dl_bid),
                TxHandler::TchF => lchan_tchf::tx_tchf(&mut ctx, chan, f.dl_bid),
            }
        } else {
            Ok(None)
        };
        ts.dl_queue.expire(fn_);

        let Some(mut burst) = res? else {
            return Ok(None);
        };
        if let Some(key) = ts.chans[chan.idx()].dl_cipher {
            let (dl_ks, _) = a5_1(&key, a5_count(fn_));
            cipher_burst(&mut burst.bits, &dl_ks);
        }
        tracing::trace!(frame = %fn_, tn, chan = chan.desc().name, "dl_burst: bid {}", f.dl_bid);
        Ok(Some(TrxBurstReq { fn_, tn, att: 0, mod_type: burst.mod_type, burst: burst.bits }))
    }

    /// Hands one received burst to the channel it belongs to.
    /// Decoded blocks are collected and returned by `take_indications`.
    pub fn ul_burst(&mut self, mut bi: TrxBurstInd) -> Result<(), SchedErr> {
        let bsic = self.bsic;
        let tn = bi.tn;
        let ts = self.ts.get_mut(tn as usize).ok_or(SchedErr::InvalidTimeslot)?;
        let mf = ts.mf;
        let f = *mf.frame(bi.fn_);
        let chan = f.ul_chan;
        if chan.desc().rx == RxHandler::None || !ts.is_active(chan) {
            return Ok(());
        }

        let cs = &mut ts.chans[chan.idx()];

        // Feed the frames of this channel that never arrived, so blocks still complete
        if let Some(last) = cs.last_tdma_fn {
            let gap = bi.fn_.diff(last);
            if gap > 1 && gap as u32 <= mf.period {
                for i in 1..gap {
                    let lost_fn = last.add(i);
                    let lf = mf.frame(lost_fn);
                    if lf.ul_chan != chan {
                        continue;
                    }
                    tracing::debug!(frame = %lost_fn, tn, chan = chan.desc().name, "ul_burst: bid {} missing", lf.ul_bid);
                    cs.lost_tdma_fs += 1;
                    let nope = TrxBurstInd::nope(lost_fn, tn);
                    let mut ctx = RxCtx { tn, bsic, cs: &mut *cs, ups: &mut self.ups };
                    dispatch_rx(&mut ctx, chan, lf.ul_bid, &nope)?;
                }
            }
        }
        cs.last_tdma_fn = Some(bi.fn_);
        cs.proc_tdma_fs += 1;

        if f.ul_bid == 0 {
            cs.apply_pending();
        }
        if let Some(key) = cs.ul_cipher {
            if chan.desc().rx != RxHandler::Rach && !bi.is_nope() {
                let (_, ul_ks) = a5_1(&key, a5_count(bi.fn_));
                decipher_burst(&mut bi.burst, &ul_ks);
            }
        }

        let mut ctx = RxCtx { tn, bsic, cs, ups: &mut self.ups };
        dispatch_rx(&mut ctx, chan, f.ul_bid, &bi)
    }

    /// Drains the indications produced by the uplink and downlink paths
    pub fn take_indications(&mut self) -> Vec<UpInd> {
        std::mem::take(&mut self.ups)
    }

    /// True if frame `fn_` on timeslot `tn` carries a SACCH burst in the given direction
    pub fn is_sacch_fn(&self, tn: Timeslot, fn_: FrameNumber, uplink: bool) -> bool {
        self.ts.get(tn as usize).is_some_and(|ts| ts.mf.is_sacch(fn_, uplink))
    }

    pub fn clock_started(&mut self, fn_: FrameNumber) {
        tracing::info!(frame = %fn_, "clock_started");
    }

    /// Clock loss: in-flight blocks and queued data are meaningless afterwards
    pub fn clock_stopped(&mut self) {
        tracing::warn!("clock_stopped: dropping queued data and partial blocks");
        for ts in self.ts.iter_mut() {
            ts.dl_queue.clear();
            for cs in ts.chans.iter_mut() {
                cs.release_buffers();
                cs.last_tdma_fn = None;
            }
        }
        self.ups.clear();
    }
}

fn dispatch_rx(ctx: &mut RxCtx, chan: ChanType, bid: u8, bi: &TrxBurstInd) -> Result<(), SchedErr> {
    match chan.desc().rx {
        RxHandler::None => Ok(()),
        RxHandler::Rach => lchan_rach::rx_rach(ctx, chan, bi),
        RxHandler::Data => lchan_xcch::rx_data(ctx, chan, bid, bi),
        RxHandler::Pdtch => lchan_pdtch::rx_pdtch(ctx, chan, bid, bi),
        RxHandler::TchF => lchan_tchf::rx_tchf(ctx, chan, bid, bi),
    }
}
