use gsm_core::gsm_entities::GsmEntity;
use gsm_core::unimplemented_log;
use gsm_entities::{GsmEntityTrait, MessageQueue};
use gsm_saps::{SapMsg, SapMsgInner};

/// Stands in for an upper layer (L2, RSL or PCU) that is not part of this binary.
/// Never answers a ready-to-send, so the scheduler falls back to fill frames.
/// Everything received is logged and counted.
pub struct UpperStub {
    entity: GsmEntity,
    rx_blocks: u64,
    rx_rach: u64,
}

impl UpperStub {
    pub fn new(entity: GsmEntity) -> Self {
        Self { entity, rx_blocks: 0, rx_rach: 0 }
    }
}

impl GsmEntityTrait for UpperStub {
    fn entity(&self) -> GsmEntity {
        self.entity
    }

    fn rx_prim(&mut self, _queue: &mut MessageQueue, message: SapMsg) {
        match &message.msg {
            SapMsgInner::PhRtsInd(rts) => {
                tracing::trace!(frame = %rts.fn_, "{:?}: rts tn {} chan_nr 0x{:02x}", self.entity, rts.tn, rts.chan_nr);
            }
            SapMsgInner::PhDataInd(ind) => {
                self.rx_blocks += 1;
                tracing::debug!(frame = %ind.fn_, "{:?}: data chan_nr 0x{:02x} link 0x{:02x} {:02x?}", self.entity, ind.chan_nr, ind.link_id, ind.data);
            }
            SapMsgInner::PhTchInd(ind) => {
                self.rx_blocks += 1;
                tracing::debug!(frame = %ind.fn_, "{:?}: tch chan_nr 0x{:02x} {} bytes", self.entity, ind.chan_nr, ind.data.len());
            }
            SapMsgInner::PhRachInd(ind) => {
                self.rx_rach += 1;
                tracing::info!(frame = %ind.fn_, "{:?}: access burst ra 0x{:02x} acc_delay {} ({} so far)", self.entity, ind.ra, ind.acc_delay, self.rx_rach);
            }
            SapMsgInner::MphConf(conf) => match &conf.cause {
                None => tracing::info!("{:?}: {:?} chan_nr 0x{:02x} confirmed", self.entity, conf.op, conf.chan_nr),
                Some(cause) => tracing::warn!("{:?}: {:?} chan_nr 0x{:02x} rejected: {}", self.entity, conf.op, conf.chan_nr, cause),
            },
            SapMsgInner::MphErrorInd(ind) => {
                tracing::warn!(frame = %ind.fn_, "{:?}: chan_nr 0x{:02x} error: {}", self.entity, ind.chan_nr, ind.cause);
            }
            _ => unimplemented_log!("{:?} rx_prim: {}", self.entity, message.msg),
        }
    }
}

impl Drop for UpperStub {
    fn drop(&mut self) {
        tracing::info!("{:?}: received {} blocks, {} access bursts", self.entity, self.rx_blocks, self.rx_rach);
    }
}
