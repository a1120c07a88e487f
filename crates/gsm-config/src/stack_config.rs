use serde::Deserialize;
use std::sync::{Arc, RwLock};
use gsm_core::frame_number::MAX_FN_AHEAD;
use gsm_core::{FrameNumber, NUM_TIMESLOTS, Pchan};

/// Largest accepted `rts_advance`. Requests sent this early must not look stale
/// to the downlink queue once the upper layer answers.
pub const MAX_RTS_ADVANCE: u32 = 26;
const _: () = assert!(MAX_RTS_ADVANCE < MAX_FN_AHEAD);

/// The PHY layer backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PhyBackend {
    Undefined,
    /// Bursts requested by the scheduler are discarded, nothing is received
    None,
    /// Downlink bursts are looped back as uplink bursts on channels that carry uplink traffic
    Virtual,
}

/// PHY layer I/O configuration
#[derive(Debug, Clone)]
pub struct CfgPhyIo {
    pub backend: PhyBackend,
}

impl Default for CfgPhyIo {
    fn default() -> Self {
        Self {
            backend: PhyBackend::Undefined,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CfgCellInfo {
    /// 6 bits, base station identity code, mixed into RACH coding and sent on SCH
    pub bsic: u8,
    /// Absolute radio frequency channel number of the transceiver
    pub arfcn: u16,
    /// Training sequence code of all timeslots, 0..7
    pub tsc: u8,
    /// Physical channel configuration per timeslot
    pub timeslots: [Pchan; NUM_TIMESLOTS],
}

impl Default for CfgCellInfo {
    fn default() -> Self {
        Self {
            bsic: 0,
            arfcn: default_arfcn(),
            tsc: 0,
            timeslots: [Pchan::None; NUM_TIMESLOTS],
        }
    }
}

#[inline]
fn default_arfcn() -> u16 {
    871
}

#[derive(Debug, Clone)]
pub struct CfgSched {
    /// Frames between the ready-to-send indication and the actual transmission
    pub rts_advance: u32,
    /// Send bad-frame indications upward when uplink speech stops arriving
    pub tch_bfi_injection: bool,
}

impl Default for CfgSched {
    fn default() -> Self {
        Self {
            rts_advance: 5,
            tch_bfi_injection: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StackConfig {
    pub debug_log: Option<String>,
    pub phy_io: CfgPhyIo,
    pub cell: CfgCellInfo,
    pub sched: CfgSched,
}

impl StackConfig {
    pub fn new(bsic: u8, timeslots: [Pchan; NUM_TIMESLOTS]) -> Self {
        StackConfig {
            debug_log: None,
            phy_io: CfgPhyIo { backend: PhyBackend::None },
            cell: CfgCellInfo { bsic, timeslots, ..Default::default() },
            sched: CfgSched::default(),
        }
    }

    /// Validate that all required configuration fields are properly set.
    pub fn validate(&self) -> Result<(), &str> {
        if self.phy_io.backend == PhyBackend::Undefined {
            return Err("phy_io backend must be defined");
        }
        if self.cell.bsic > 63 {
            return Err("bsic must fit in 6 bits");
        }
        if self.cell.tsc > 7 {
            return Err("tsc must be in range 0..7");
        }
        if self.cell.arfcn > 1023 {
            return Err("arfcn must be in range 0..1023");
        }

        // Broadcast channels are only defined on timeslot 0
        for (tn, pchan) in self.cell.timeslots.iter().enumerate() {
            if tn != 0 && pchan.has_ccch() {
                return Err("CCCH based channel combinations are only allowed on timeslot 0");
            }
        }
        let cbch_count = self.cell.timeslots.iter()
            .filter(|p| matches!(p, Pchan::CcchSdcch4Cbch | Pchan::Sdcch8Cbch))
            .count();
        if cbch_count > 1 {
            return Err("at most one timeslot may carry the CBCH");
        }

        if self.sched.rts_advance == 0 || self.sched.rts_advance > MAX_RTS_ADVANCE {
            return Err("rts_advance must be in range 1..26");
        }

        Ok(())
    }
}

/// Mutable, stack-editable state (lock-protected).
#[derive(Debug, Clone, Default)]
pub struct StackState {
    /// Last frame number that was scheduled
    pub cur_fn: FrameNumber,
    /// True while the frame clock is running
    pub clock_running: bool,
}

/// Global shared configuration: immutable config + mutable state.
#[derive(Clone)]
pub struct SharedConfig {
    /// Read-only configuration (immutable after construction).
    cfg: Arc<StackConfig>,
    /// Mutable state guarded with RwLock (write by the stack, read by others).
    state: Arc<RwLock<StackState>>,
}

impl SharedConfig {
    pub fn new(bsic: u8, timeslots: [Pchan; NUM_TIMESLOTS]) -> Self {
        Self::from_config(StackConfig::new(bsic, timeslots))
    }

    pub fn from_config(cfg: StackConfig) -> Self {
        Self::from_parts(cfg, StackState::default())
    }

    pub fn from_parts(cfg: StackConfig, state: StackState) -> Self {
        // Check config for validity before returning the SharedConfig object
        match cfg.validate() {
            Ok(_) => {}
            Err(e) => panic!("Invalid stack configuration: {}", e),
        }

        Self {
            cfg: Arc::new(cfg),
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Access immutable config.
    pub fn config(&self) -> Arc<StackConfig> {
        Arc::clone(&self.cfg)
    }

    /// Read guard for mutable state.
    pub fn state_read(&self) -> std::sync::RwLockReadGuard<'_, StackState> {
        self.state.read().expect("StackState RwLock blocked")
    }

    /// Write guard for mutable state.
    pub fn state_write(&self) -> std::sync::RwLockWriteGuard<'_, StackState> {
        self.state.write().expect("StackState RwLock blocked")
    }
}
