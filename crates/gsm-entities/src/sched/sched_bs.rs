use gsm_config::SharedConfig;
use gsm_core::gsm_entities::GsmEntity;
use gsm_core::{CHAN_NR_TYPE_MASK, ChanNr, DUMMY_BURST, FrameNumber, ModType, NUM_TIMESLOTS, Sap, Timeslot, unimplemented_log};
use gsm_saps::mph::{MphConf, MphOp};
use gsm_saps::ph::PhDataReq;
use gsm_saps::trx::TrxBurstReq;
use gsm_saps::{SapMsg, SapMsgInner};

use crate::cbch::Cbch;
use crate::{GsmEntityTrait, MessageQueue};

use super::chan_desc::{ChanType, RSL_CHAN_OSMO_PDCH};
use super::{SchedErr, TrxScheduler, UpInd};

/// Scheduler entity: owns the transceiver scheduler and the CBCH, exchanges
/// bursts with the PHY and blocks with the upper layers
pub struct SchedBs {
    config: SharedConfig,
    self_component: GsmEntity,
    sched: TrxScheduler,
    cbch: Cbch,

    /// Frames between the RTS indication and the transmission of the block
    rts_advance: u32,
    /// Timeslot 0 is the beacon and has to transmit in every frame
    c0_beacon: bool,
    dltime: FrameNumber,
}

impl SchedBs {
    pub fn new(config: SharedConfig) -> Result<Self, SchedErr> {
        let (sched, rts_advance, c0_beacon) = {
            let c = config.config();
            tracing::info!(
                "SchedBs: bsic {} arfcn {} tsc {} timeslots {:?}",
                c.cell.bsic,
                c.cell.arfcn,
                c.cell.tsc,
                c.cell.timeslots
            );
            (TrxScheduler::from_config(&c)?, c.sched.rts_advance, c.cell.timeslots[0].has_ccch())
        };

        Ok(Self {
            config,
            self_component: GsmEntity::Sched,
            sched,
            cbch: Cbch::new(),
            rts_advance,
            c0_beacon,
            dltime: FrameNumber::default(),
        })
    }

    pub fn scheduler(&self) -> &TrxScheduler {
        &self.sched
    }

    pub fn scheduler_mut(&mut self) -> &mut TrxScheduler {
        &mut self.sched
    }

    pub fn clock_started(&mut self, fn_: FrameNumber) {
        self.sched.clock_started(fn_);
    }

    pub fn clock_stopped(&mut self) {
        self.sched.clock_stopped();
    }

    fn send(&self, queue: &mut MessageQueue, sap: Sap, dest: GsmEntity, msg: SapMsgInner) {
        queue.push_back(SapMsg::new(sap, self.self_component, dest, self.dltime, msg));
    }

    fn send_conf(&self, queue: &mut MessageQueue, dest: GsmEntity, op: MphOp, chan_nr: ChanNr, res: Result<(), SchedErr>) {
        let cause = match res {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("rx_mph: {:?} chan_nr 0x{:02x} rejected: {}", op, chan_nr, e);
                Some(e.to_string())
            }
        };
        self.send(queue, Sap::MphSap, dest, SapMsgInner::MphConf(MphConf { op, chan_nr, cause }));
    }

    /// Passes the indications produced by the scheduler to the upper layers
    fn forward_indications(&mut self, queue: &mut MessageQueue) {
        for up in self.sched.take_indications() {
            let (sap, dest, msg) = match up {
                UpInd::Data(ind) => {
                    let dest = if ind.chan_nr & CHAN_NR_TYPE_MASK == RSL_CHAN_OSMO_PDCH { GsmEntity::Pcu } else { GsmEntity::L2 };
                    (Sap::PhSap, dest, SapMsgInner::PhDataInd(ind))
                }
                UpInd::Tch(ind) => (Sap::PhSap, GsmEntity::L2, SapMsgInner::PhTchInd(ind)),
                UpInd::Rach(ind) => {
                    // Access bursts on PTCCH/U carry timing advance for the PCU
                    let dest = if ind.chan_nr & CHAN_NR_TYPE_MASK == RSL_CHAN_OSMO_PDCH { GsmEntity::Pcu } else { GsmEntity::Rsl };
                    (Sap::PhSap, dest, SapMsgInner::PhRachInd(ind))
                }
                UpInd::Error(ind) => (Sap::MphSap, GsmEntity::Rsl, SapMsgInner::MphErrorInd(ind)),
            };
            self.send(queue, sap, dest, msg);
        }
    }

    fn rx_trx_prim(&mut self, queue: &mut MessageQueue, message: SapMsg) {
        match message.msg {
            SapMsgInner::TrxBurstInd(bi) => {
                let (fn_, tn) = (bi.fn_, bi.tn);
                if let Err(e) = self.sched.ul_burst(bi) {
                    tracing::warn!(frame = %fn_, tn, "rx_trx_prim: burst dropped: {}", e);
                }
                self.forward_indications(queue);
            }
            _ => unimplemented_log!("rx_trx_prim: {}", message.msg),
        }
    }

    fn rx_ph_prim(&mut self, message: SapMsg) {
        match message.msg {
            SapMsgInner::PhDataReq(req) => self.sched.ph_data_req(req),
            SapMsgInner::PhTchReq(req) => self.sched.ph_tch_req(req),
            _ => unimplemented_log!("rx_ph_prim: {}", message.msg),
        }
    }

    fn rx_mph_prim(&mut self, queue: &mut MessageQueue, message: SapMsg) {
        let src = message.src;
        match message.msg {
            SapMsgInner::MphActivateReq(req) => {
                let op = if req.active { MphOp::Activate } else { MphOp::Deactivate };
                let res = self.sched.set_lchan(req.chan_nr, req.link_id, req.active);
                self.send_conf(queue, src, op, req.chan_nr, res);
            }
            SapMsgInner::MphModeReq(req) => {
                let res = self.sched.set_mode(req.chan_nr, req.rsl_cmode, req.tch_mode, &req.codecs, req.initial_id);
                self.send_conf(queue, src, MphOp::Mode, req.chan_nr, res);
            }
            SapMsgInner::MphCipherReq(req) => {
                let res = self.sched.set_cipher(req.chan_nr, req.downlink, req.algo, &req.key);
                self.send_conf(queue, src, MphOp::Cipher, req.chan_nr, res);
            }
            SapMsgInner::MphSetPchanReq(req) => {
                let res = self.sched.set_pchan(req.tn, req.pchan);
                if res.is_ok() && req.tn == 0 {
                    self.c0_beacon = req.pchan.has_ccch();
                }
                self.send_conf(queue, src, MphOp::SetPchan, req.tn, res);
            }
            _ => unimplemented_log!("rx_mph_prim: {}", message.msg),
        }
    }

    fn rx_cb_prim(&mut self, message: SapMsg) {
        match message.msg {
            SapMsgInner::CbSmsCmd(cmd) => {
                if let Err(e) = self.cbch.cmd(&cmd) {
                    tracing::warn!("rx_cb_prim: SMS-CB command dropped: {}", e);
                }
            }
            _ => unimplemented_log!("rx_cb_prim: {}", message.msg),
        }
    }

    /// Asks the upper layers for the blocks starting `rts_advance` frames ahead.
    /// CBCH blocks are served locally.
    fn send_rts(&mut self, queue: &mut MessageQueue) {
        let rts_fn = self.dltime.add(self.rts_advance as i32);
        for (chan, rts) in self.sched.rts(rts_fn) {
            if chan == ChanType::Cbch {
                let data = self.cbch.next_block(rts_fn).to_vec();
                self.sched.ph_data_req(PhDataReq { fn_: rts.fn_, chan_nr: rts.chan_nr, link_id: rts.link_id, data });
                continue;
            }
            let dest = if chan.is_pdch() { GsmEntity::Pcu } else { GsmEntity::L2 };
            tracing::trace!(frame = %rts_fn, tn = rts.tn, chan = chan.desc().name, "send_rts: to {:?}", dest);
            self.send(queue, Sap::PhSap, dest, SapMsgInner::PhRtsInd(rts));
        }
    }

    /// Builds the bursts of the current frame, returns how many were sent
    fn send_bursts(&mut self, queue: &mut MessageQueue) -> usize {
        let fn_ = self.dltime;
        let mut sent = 0;
        for tn in 0..NUM_TIMESLOTS as Timeslot {
            let req = match self.sched.dl_burst(tn, fn_) {
                Ok(req) => req,
                Err(e) => {
                    tracing::error!(frame = %fn_, tn, "send_bursts: skipped: {}", e);
                    None
                }
            };
            let req = match req {
                Some(req) => req,
                None if tn == 0 && self.c0_beacon => TrxBurstReq { fn_, tn, att: 0, mod_type: ModType::Gmsk, burst: DUMMY_BURST.to_vec() },
                None => continue,
            };
            self.send(queue, Sap::TrxSap, GsmEntity::Phy, SapMsgInner::TrxBurstReq(req));
            sent += 1;
        }
        sent
    }
}

impl GsmEntityTrait for SchedBs {
    fn entity(&self) -> GsmEntity {
        self.self_component
    }

    fn set_config(&mut self, config: SharedConfig) {
        self.config = config;
    }

    fn rx_prim(&mut self, queue: &mut MessageQueue, message: SapMsg) {
        tracing::trace!("rx_prim: {}", message.msg);

        match message.sap {
            Sap::TrxSap => self.rx_trx_prim(queue, message),
            Sap::PhSap => self.rx_ph_prim(message),
            Sap::MphSap => self.rx_mph_prim(queue, message),
            Sap::CbSap => self.rx_cb_prim(message),
        }
    }

    fn tick_start(&mut self, queue: &mut MessageQueue, fn_: FrameNumber) {
        self.dltime = fn_;
        self.send_rts(queue);
    }

    fn tick_end(&mut self, queue: &mut MessageQueue, fn_: FrameNumber) -> bool {
        self.dltime = fn_;
        let sent = self.send_bursts(queue);
        // Bad-frame indications generated on the downlink path
        self.forward_indications(queue);
        sent > 0
    }
}
