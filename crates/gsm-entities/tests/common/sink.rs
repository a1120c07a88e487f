use gsm_core::gsm_entities::GsmEntity;
use gsm_entities::{GsmEntityTrait, MessageQueue};
use gsm_saps::SapMsg;

/// A GSM component sink for testing purposes
/// Collects all received SapMsg messages for later inspection
pub struct Sink {
    component: GsmEntity,
    msgqueue: Vec<SapMsg>,
}

impl Sink {
    pub fn new(component: GsmEntity) -> Self {
        Self {
            component,
            msgqueue: vec![],
        }
    }

    pub fn take_msgqueue(&mut self) -> Vec<SapMsg> {
        std::mem::take(&mut self.msgqueue)
    }
}

impl GsmEntityTrait for Sink {
    fn entity(&self) -> GsmEntity {
        self.component
    }

    fn rx_prim(&mut self, _queue: &mut MessageQueue, message: SapMsg) {
        tracing::trace!(frame = %message.dltime, "rx_prim: {}", message.msg);
        self.msgqueue.push(message);
    }
}
