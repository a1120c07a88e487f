use as_any::AsAny;
use gsm_config::SharedConfig;
use gsm_core::{FrameNumber, gsm_entities::GsmEntity};
use gsm_saps::SapMsg;

use crate::MessageQueue;

/// Trait for the entities of the BTS stack
/// Used by MessageRouter for passing messages between entities
pub trait GsmEntityTrait: Send + AsAny {
    /// Returns the entity type identifier
    fn entity(&self) -> GsmEntity;

    /// Handle incoming SAP primitive
    fn rx_prim(&mut self, queue: &mut MessageQueue, message: SapMsg);

    /// Update configuration (optional)
    #[allow(dead_code)]
    fn set_config(&mut self, _config: SharedConfig) {}

    /// Called at the start of each TDMA frame
    fn tick_start(&mut self, _queue: &mut MessageQueue, _fn: FrameNumber) {}

    /// Called at the end of each TDMA frame
    fn tick_end(&mut self, _queue: &mut MessageQueue, _fn: FrameNumber) -> bool {
        false
    }
}
