use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gsm_config::SharedConfig;
use gsm_core::{FrameNumber, gsm_entities::GsmEntity};
use gsm_saps::SapMsg;

use crate::GsmEntityTrait;

#[derive(Default)]
pub enum MessagePrio {
    Immediate,
    #[default]
    Normal,
}

pub struct MessageQueue {
    messages: VecDeque<SapMsg>,
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageQueue {
    pub fn new() -> Self {
        Self {
            messages: VecDeque::new(),
        }
    }

    pub fn push_back(&mut self, message: SapMsg) {
        self.messages.push_back(message);
    }

    pub fn push_prio(&mut self, message: SapMsg, prio: MessagePrio) {
        match prio {
            MessagePrio::Immediate => {
                // Insert at the front for immediate processing
                self.messages.push_front(message);
            }
            MessagePrio::Normal => {
                self.messages.push_back(message);
            }
        }
    }

    pub fn pop_front(&mut self) -> Option<SapMsg> {
        self.messages.pop_front()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

pub struct MessageRouter {
    config: SharedConfig,
    entities: HashMap<GsmEntity, Box<dyn GsmEntityTrait>>,
    msg_queue: MessageQueue,

    /// The current downlink frame number.
    /// Passed to all entities on tick_start/tick_end and incremented after each frame.
    fn_: FrameNumber,
}

impl MessageRouter {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            entities: HashMap::new(),
            msg_queue: MessageQueue::new(),
            config,
            fn_: FrameNumber::default(),
        }
    }

    /// Sets the frame number of the next tick
    pub fn set_fn(&mut self, fn_: FrameNumber) {
        self.fn_ = fn_;
    }

    pub fn get_fn(&self) -> FrameNumber {
        self.fn_
    }

    pub fn register_entity(&mut self, entity: Box<dyn GsmEntityTrait>) {
        let comp_type = entity.entity();
        tracing::debug!("register_entity {:?}", comp_type);
        self.entities.insert(comp_type, entity);
    }

    /// Returns a mut ref to a component of the requested type
    pub fn get_entity(&mut self, comp: GsmEntity) -> Option<&mut dyn GsmEntityTrait> {
        self.entities.get_mut(&comp).map(|entity| entity.as_mut())
    }

    pub fn submit_message(&mut self, message: SapMsg) {
        tracing::debug!("submit_message {:?}: {:?} -> {:?}", message.get_sap(), message.get_source(), message.get_dest());
        self.msg_queue.push_back(message);
    }

    pub fn deliver_message(&mut self) {
        let Some(message) = self.msg_queue.pop_front() else {
            return;
        };

        tracing::trace!("deliver_message: got {:?}: {:?} -> {:?}", message.get_sap(), message.get_source(), message.get_dest());

        let dest = *message.get_dest();
        if let Some(entity) = self.entities.get_mut(&dest) {
            entity.rx_prim(&mut self.msg_queue, message);
        } else {
            tracing::warn!("deliver_message: entity {:?} not found for {:?}: {:?} -> {:?}", dest, message.get_sap(), message.get_source(), message.get_dest());
        }
    }

    pub fn deliver_all_messages(&mut self) {
        while !self.msg_queue.is_empty() {
            self.deliver_message();
        }
    }

    pub fn get_msgqueue_len(&self) -> usize {
        self.msg_queue.len()
    }

    pub fn tick_start(&mut self) {
        tracing::debug!(frame = %self.fn_, "--- tick ----------------------------");
        self.config.state_write().cur_fn = self.fn_;

        for entity in self.entities.values_mut() {
            entity.tick_start(&mut self.msg_queue, self.fn_);
        }
    }

    /// Executes all end-of-frame functions:
    /// - Sched builds the downlink bursts of this frame and sends them to Phy
    /// - Phy transmits them
    /// - All other entities follow
    pub fn tick_end(&mut self) {
        for target in [GsmEntity::Sched, GsmEntity::Phy] {
            if let Some(entity) = self.entities.get_mut(&target) {
                tracing::trace!("tick_end for entity {:?}", target);
                entity.tick_end(&mut self.msg_queue, self.fn_);
            }
            self.deliver_all_messages();
        }

        for entity in self.entities.values_mut() {
            let entity_id = entity.entity();
            if entity_id == GsmEntity::Sched || entity_id == GsmEntity::Phy {
                continue;
            }
            entity.tick_end(&mut self.msg_queue, self.fn_);
        }
        self.deliver_all_messages();

        self.fn_ = self.fn_.inc();
    }

    /// Processes one full TDMA frame
    pub fn run_frame(&mut self) {
        self.tick_start();
        self.deliver_all_messages();
        self.tick_end();
    }

    /// Runs the stack without pacing, either until `running` is cleared or for a number of frames.
    pub fn run_stack(&mut self, num_ticks: Option<usize>, running: Option<Arc<AtomicBool>>) {
        let mut ticks: usize = 0;
        loop {
            if let Some(running) = &running {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
            }

            self.run_frame();

            ticks += 1;
            if let Some(num_ticks) = num_ticks {
                if ticks >= num_ticks {
                    break;
                }
            }
        }
    }
}
