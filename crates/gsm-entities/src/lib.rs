pub mod cbch;
pub mod clock;
pub mod codec;
pub mod entity_trait;
pub mod messagerouter;
pub mod phy;
pub mod sched;

// Re-export commonly used items from router
pub use entity_trait::GsmEntityTrait;
pub use messagerouter::{MessagePrio, MessageQueue, MessageRouter};
