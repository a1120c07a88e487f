use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use gsm_core::{NUM_TIMESLOTS, Pchan};
use serde::Deserialize;
use toml::Value;

use super::stack_config::{CfgCellInfo, CfgPhyIo, CfgSched, PhyBackend, SharedConfig, StackConfig, StackState};

/// Build `SharedConfig` from a TOML configuration file
pub fn from_toml_str(toml_str: &str) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let root: TomlConfigRoot = toml::from_str(toml_str)?;

    // Various sanity checks
    let expected_config_version = "0.1";
    if !root.config_version.eq(expected_config_version) {
        return Err(format!(
            "Unrecognized config_version: {}, expect {}",
            root.config_version, expected_config_version
        )
        .into());
    }
    if !root.extra.is_empty() {
        return Err(format!("Unrecognized top-level fields: {:?}", sorted_keys(&root.extra)).into());
    }
    if let Some(ref phy) = root.phy_io {
        if !phy.extra.is_empty() {
            return Err(format!("Unrecognized fields: phy_io::{:?}", sorted_keys(&phy.extra)).into());
        }
    }
    if !root.cell.extra.is_empty() {
        return Err(format!("Unrecognized fields in cell: {:?}", sorted_keys(&root.cell.extra)).into());
    }
    if let Some(ref sched) = root.sched {
        if !sched.extra.is_empty() {
            return Err(format!("Unrecognized fields in sched: {:?}", sorted_keys(&sched.extra)).into());
        }
    }

    // Build config from required and optional values
    let mut cfg = StackConfig {
        debug_log: root.debug_log,
        phy_io: CfgPhyIo::default(),
        cell: CfgCellInfo::default(),
        sched: CfgSched::default(),
    };

    if let Some(phy) = root.phy_io {
        apply_phy_io_patch(&mut cfg.phy_io, phy);
    }
    apply_cell_patch(&mut cfg.cell, root.cell)?;
    if let Some(sched) = root.sched {
        apply_sched_patch(&mut cfg.sched, sched);
    }

    // Reject instead of letting SharedConfig panic on an invalid config
    cfg.validate().map_err(|e| e.to_string())?;

    Ok(SharedConfig::from_parts(cfg, StackState::default()))
}

/// Build `SharedConfig` from any reader.
pub fn from_reader<R: Read>(reader: R) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let mut contents = String::new();
    let mut reader = BufReader::new(reader);
    reader.read_to_string(&mut contents)?;
    from_toml_str(&contents)
}

/// Build `SharedConfig` from a file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let f = File::open(path)?;
    let r = BufReader::new(f);
    let cfg = from_reader(r)?;
    Ok(cfg)
}

fn apply_phy_io_patch(dst: &mut CfgPhyIo, src: PhyIoDto) {
    dst.backend = src.backend;
}

fn apply_cell_patch(dst: &mut CfgCellInfo, src: CellDto) -> Result<(), String> {
    dst.bsic = src.bsic;
    if let Some(v) = src.arfcn {
        dst.arfcn = v;
    }
    if let Some(v) = src.tsc {
        dst.tsc = v;
    }
    if src.timeslots.len() > NUM_TIMESLOTS {
        return Err(format!("cell.timeslots lists {} entries, at most {} allowed", src.timeslots.len(), NUM_TIMESLOTS));
    }
    // Missing trailing timeslots stay unused
    for (tn, pchan) in src.timeslots.into_iter().enumerate() {
        dst.timeslots[tn] = pchan;
    }
    Ok(())
}

fn apply_sched_patch(dst: &mut CfgSched, src: SchedDto) {
    if let Some(v) = src.rts_advance {
        dst.rts_advance = v;
    }
    if let Some(v) = src.tch_bfi_injection {
        dst.tch_bfi_injection = v;
    }
}

fn sorted_keys(map: &HashMap<String, Value>) -> Vec<&str> {
    let mut v: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
    v.sort_unstable();
    v
}

/// ----------------------- DTOs for input shape -----------------------

#[derive(Deserialize)]
struct TomlConfigRoot {
    config_version: String,
    debug_log: Option<String>,

    #[serde(default)]
    phy_io: Option<PhyIoDto>,

    cell: CellDto,

    #[serde(default)]
    sched: Option<SchedDto>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct PhyIoDto {
    pub backend: PhyBackend,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct CellDto {
    pub bsic: u8,
    pub arfcn: Option<u16>,
    pub tsc: Option<u8>,

    #[serde(default)]
    pub timeslots: Vec<Pchan>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct SchedDto {
    pub rts_advance: Option<u32>,
    pub tch_bfi_injection: Option<bool>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE_CONFIG: &str = r#"
config_version = "0.1"

[phy_io]
backend = "Virtual"

[cell]
bsic = 63
arfcn = 871
tsc = 7
timeslots = ["CcchSdcch4", "TchF", "TchF", "Sdcch8Cbch", "TchF", "Pdch", "Pdch", "Pdch"]

[sched]
tch_bfi_injection = true
"#;

    #[test]
    fn test_parse_example() {
        let shared = from_toml_str(EXAMPLE_CONFIG).expect("example config must parse");
        let cfg = shared.config();
        assert_eq!(cfg.phy_io.backend, PhyBackend::Virtual);
        assert_eq!(cfg.cell.bsic, 63);
        assert_eq!(cfg.cell.tsc, 7);
        assert_eq!(cfg.cell.timeslots[0], Pchan::CcchSdcch4);
        assert_eq!(cfg.cell.timeslots[3], Pchan::Sdcch8Cbch);
        assert_eq!(cfg.sched.rts_advance, 5);
        assert!(cfg.sched.tch_bfi_injection);
        assert!(cfg.debug_log.is_none());
    }

    #[test]
    fn test_missing_timeslots_stay_unused() {
        let toml = "config_version = \"0.1\"\n[phy_io]\nbackend = \"None\"\n[cell]\nbsic = 1\ntimeslots = [\"Ccch\"]\n";
        let cfg = from_toml_str(toml).unwrap().config();
        assert_eq!(cfg.cell.timeslots[0], Pchan::Ccch);
        assert!(cfg.cell.timeslots[1..].iter().all(|p| *p == Pchan::None));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let toml = EXAMPLE_CONFIG.replace("tsc = 7", "tsc = 7\ncolour = 3");
        let err = from_toml_str(&toml).err().expect("unknown field must be rejected");
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn test_rejects_wrong_version() {
        let toml = EXAMPLE_CONFIG.replace("\"0.1\"", "\"0.5\"");
        assert!(from_toml_str(&toml).is_err());
    }

    #[test]
    fn test_rejects_ccch_off_ts0() {
        let toml = EXAMPLE_CONFIG.replace("\"CcchSdcch4\", \"TchF\"", "\"TchF\", \"CcchSdcch4\"");
        assert!(from_toml_str(&toml).is_err());
    }

    #[test]
    fn test_rejects_bsic_overflow() {
        let toml = EXAMPLE_CONFIG.replace("bsic = 63", "bsic = 64");
        assert!(from_toml_str(&toml).is_err());
    }
}
