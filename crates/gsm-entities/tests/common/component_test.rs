use gsm_config::{PhyBackend, SharedConfig, StackConfig, StackState};
use gsm_core::gsm_entities::GsmEntity;
use gsm_core::{FrameNumber, Pchan, Sap};
use gsm_entities::phy::VirtPhy;
use gsm_entities::sched::SchedBs;
use gsm_entities::{GsmEntityTrait, MessageRouter};
use gsm_saps::{SapMsg, SapMsgInner};

use super::sink::Sink;

/// Creates a default config for testing. It can still be modified as needed
/// before passing it to the ComponentTest constructor
pub fn default_test_config(timeslots: [Pchan; 8]) -> StackConfig {
    let mut config = StackConfig::new(21, timeslots);
    config.cell.tsc = 2;

    // Downlink on traffic and packet timeslots comes straight back as uplink
    config.phy_io.backend = PhyBackend::Virtual;
    config
}

/// Infrastructure for testing GSM BTS components
/// Quick setup of the scheduler and PHY, with sinks standing in for the upper layers
pub struct ComponentTest {
    pub config: SharedConfig,
    pub router: MessageRouter,
    pub sinks: Vec<GsmEntity>,
}

impl ComponentTest {
    pub fn new(config: StackConfig, start_fn: Option<FrameNumber>) -> Self {
        let shared_config = SharedConfig::from_parts(config, StackState::default());
        let mut mr = MessageRouter::new(shared_config.clone());
        mr.set_fn(start_fn.unwrap_or_default());

        Self {
            config: shared_config,
            router: mr,
            sinks: vec![],
        }
    }

    pub fn populate_entities(&mut self, components: Vec<GsmEntity>, sinks: Vec<GsmEntity>) {
        for component in components.iter() {
            match component {
                GsmEntity::Sched => {
                    let sched = SchedBs::new(self.config.clone()).expect("scheduler config");
                    self.register_entity(sched);
                }
                GsmEntity::Phy => {
                    let phy = VirtPhy::new(self.config.clone());
                    self.register_entity(phy);
                }
                _ => {
                    panic!("Component not implemented: {:?}", component);
                }
            }
        }

        for sink in sinks.iter() {
            assert!(!self.sinks.contains(sink), "Sink already exists: {:?}", sink);
            assert!(self.router.get_entity(*sink).is_none(), "Sink already registered as entity: {:?}", sink);
            self.sinks.push(*sink);
            self.register_entity(Sink::new(*sink));
        }
    }

    pub fn register_entity<T: 'static + GsmEntityTrait>(&mut self, entity: T) {
        self.router.register_entity(Box::new(entity));
    }

    pub fn run_stack(&mut self, num_ticks: usize) {
        self.router.run_stack(Some(num_ticks), None);
    }

    pub fn submit_message(&mut self, message: SapMsg) {
        self.router.submit_message(message);
    }

    /// Submits a primitive stamped with the current frame number
    pub fn submit(&mut self, sap: Sap, src: GsmEntity, dest: GsmEntity, msg: SapMsgInner) {
        let fn_ = self.router.get_fn();
        self.router.submit_message(SapMsg::new(sap, src, dest, fn_, msg));
    }

    pub fn deliver_all_messages(&mut self) {
        self.router.deliver_all_messages();
    }

    pub fn sched(&mut self) -> &mut SchedBs {
        self.router
            .get_entity(GsmEntity::Sched)
            .and_then(|e| e.as_any_mut().downcast_mut::<SchedBs>())
            .expect("Sched entity registered")
    }

    pub fn dump_sinks(&mut self) -> Vec<SapMsg> {
        let mut msgs = vec![];
        for sink in self.sinks.iter() {
            if let Some(component) = self.router.get_entity(*sink) {
                if let Some(sink) = component.as_any_mut().downcast_mut::<Sink>() {
                    let mut sink_msgs = sink.take_msgqueue();
                    msgs.append(&mut sink_msgs);
                }
            }
        }
        msgs
    }
}
