use crossbeam_channel::{Receiver, Sender, TryRecvError};

use gsm_config::{PhyBackend, SharedConfig};
use gsm_core::bits::hard_to_soft_buf;
use gsm_core::gsm_entities::GsmEntity;
use gsm_core::{FrameNumber, NUM_TIMESLOTS, Pchan, Sap, assert_warn, unimplemented_log};
use gsm_saps::trx::{TrxBurstInd, TrxBurstReq};
use gsm_saps::{SapMsg, SapMsgInner};

use crate::{GsmEntityTrait, MessageQueue};

/// Reported level of looped back bursts
const LOOP_RSSI: i8 = -60;
/// Reported C/I of looped back bursts, in centiBels
const LOOP_CI_CB: i16 = 100;

/// Transceiver without a radio.
///
/// With the `Virtual` backend, downlink bursts on traffic and packet timeslots
/// come back as uplink bursts of the same frame, as if a phone echoed them.
/// Bursts can also be injected from and observed by another thread.
pub struct VirtPhy {
    config: SharedConfig,
    dltime: FrameNumber,
    tsc: u8,

    /// Bit n set when timeslot n loops downlink back to uplink.
    /// Taken from the configured timeslots at startup.
    loop_mask: u8,
    /// Bursts requested for the current frame
    tx_bursts: Vec<TrxBurstReq>,

    /// Uplink bursts to deliver in addition to the looped back ones
    ul_inject: Option<Receiver<TrxBurstInd>>,
    /// Receives a copy of every transmitted burst
    dl_observer: Option<Sender<TrxBurstReq>>,

    tx_count: u64,
}

impl VirtPhy {
    pub fn new(config: SharedConfig) -> Self {
        let (loop_mask, tsc) = {
            let c = config.config();
            let mut mask = 0u8;
            if c.phy_io.backend == PhyBackend::Virtual {
                for (tn, pchan) in c.cell.timeslots.iter().enumerate() {
                    if matches!(pchan, Pchan::TchF | Pchan::Pdch) {
                        mask |= 1 << tn;
                    }
                }
            }
            tracing::info!("VirtPhy: backend {:?}, loopback mask 0x{:02x}", c.phy_io.backend, mask);
            (mask, c.cell.tsc)
        };

        Self {
            config,
            dltime: FrameNumber::default(),
            tsc,
            loop_mask,
            tx_bursts: Vec::with_capacity(NUM_TIMESLOTS),
            ul_inject: None,
            dl_observer: None,
            tx_count: 0,
        }
    }

    pub fn with_ul_inject(mut self, rx: Receiver<TrxBurstInd>) -> Self {
        self.ul_inject = Some(rx);
        self
    }

    pub fn with_dl_observer(mut self, tx: Sender<TrxBurstReq>) -> Self {
        self.dl_observer = Some(tx);
        self
    }

    pub fn tx_count(&self) -> u64 {
        self.tx_count
    }

    fn send_to_sched(&self, queue: &mut MessageQueue, bi: TrxBurstInd) {
        queue.push_back(SapMsg::new(Sap::TrxSap, GsmEntity::Phy, GsmEntity::Sched, self.dltime, SapMsgInner::TrxBurstInd(bi)));
    }

    fn loopback(&self, req: &TrxBurstReq) -> TrxBurstInd {
        let mut soft = vec![0; req.burst.len()];
        hard_to_soft_buf(&req.burst, &mut soft);
        TrxBurstInd {
            fn_: req.fn_,
            tn: req.tn,
            toa256: 0,
            rssi: LOOP_RSSI,
            ci_cb: Some(LOOP_CI_CB),
            tsc: Some(self.tsc),
            mod_type: req.mod_type,
            burst: soft,
        }
    }
}

impl GsmEntityTrait for VirtPhy {
    fn entity(&self) -> GsmEntity {
        GsmEntity::Phy
    }

    fn set_config(&mut self, config: SharedConfig) {
        self.config = config;
    }

    fn rx_prim(&mut self, _queue: &mut MessageQueue, message: SapMsg) {
        match message.msg {
            SapMsgInner::TrxBurstReq(req) => {
                assert_warn!(req.fn_ == self.dltime, "burst for {:?} on tn {} handed over at {:?}", req.fn_, req.tn, self.dltime);
                self.tx_bursts.push(req);
            }
            _ => unimplemented_log!("VirtPhy rx_prim: {}", message.msg),
        }
    }

    fn tick_start(&mut self, _queue: &mut MessageQueue, fn_: FrameNumber) {
        self.dltime = fn_;
    }

    /// Transmits the bursts of the frame and delivers the uplink bursts
    fn tick_end(&mut self, queue: &mut MessageQueue, _fn: FrameNumber) -> bool {
        let bursts = std::mem::take(&mut self.tx_bursts);
        let mut active = !bursts.is_empty();

        for req in bursts {
            self.tx_count += 1;
            if self.loop_mask & (1 << req.tn) != 0 {
                let bi = self.loopback(&req);
                self.send_to_sched(queue, bi);
            }
            if let Some(observer) = &self.dl_observer {
                if observer.send(req).is_err() {
                    tracing::debug!("VirtPhy: downlink observer gone");
                    self.dl_observer = None;
                }
            }
        }

        if let Some(rx) = &self.ul_inject {
            loop {
                match rx.try_recv() {
                    Ok(bi) => {
                        active = true;
                        self.send_to_sched(queue, bi);
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        tracing::debug!("VirtPhy: uplink injector gone");
                        self.ul_inject = None;
                        break;
                    }
                }
            }
        }
        active
    }
}
