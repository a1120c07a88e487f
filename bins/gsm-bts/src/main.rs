use clap::Parser;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gsm_config::{PhyBackend, SharedConfig, toml_config};
use gsm_core::gsm_entities::GsmEntity;
use gsm_core::{FrameNumber, STACK_VERSION, debug};
use gsm_entities::MessageRouter;
use gsm_entities::clock::run_realtime;
use gsm_entities::phy::VirtPhy;
use gsm_entities::sched::SchedBs;

mod entities;
use entities::upper_stub::UpperStub;

/// Load configuration file
fn load_config_from_toml(cfg_path: &str) -> SharedConfig {
    match toml_config::from_file(cfg_path) {
        Ok(c) => c,
        Err(e) => {
            println!("Failed to load configuration from {}: {}", cfg_path, e);
            std::process::exit(1);
        }
    }
}

/// Start the BTS stack: PHY, scheduler and stand-ins for the upper layers
fn build_bts_stack(cfg: &SharedConfig, start_fn: FrameNumber) -> MessageRouter {
    let mut router = MessageRouter::new(cfg.clone());

    let backend = cfg.config().phy_io.backend;
    match backend {
        PhyBackend::None | PhyBackend::Virtual => {
            let phy = VirtPhy::new(cfg.clone());
            router.register_entity(Box::new(phy));
        }
        PhyBackend::Undefined => {
            eprintln!("Unsupported PhyIo type: {:?}", backend);
            std::process::exit(1);
        }
    }

    let sched = match SchedBs::new(cfg.clone()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid timeslot configuration: {}", e);
            std::process::exit(1);
        }
    };
    router.register_entity(Box::new(sched));

    for entity in [GsmEntity::L2, GsmEntity::Rsl, GsmEntity::Pcu] {
        router.register_entity(Box::new(UpperStub::new(entity)));
    }

    router.set_fn(start_fn);
    router
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "GSM BTS TDMA scheduler",
    long_about = "Runs the GSM BTS layer 1 scheduler and channel codec using the provided TOML configuration file"
)]
struct Args {
    /// Config file (required)
    #[arg(help = "TOML config with cell and timeslot parameters")]
    config: String,

    /// Frame number of the first tick
    #[arg(long, default_value_t = 0)]
    start_fn: u32,
}

fn main() {
    eprintln!("gsm-bts {}", STACK_VERSION);

    let args = Args::parse();
    let cfg = load_config_from_toml(&args.config);
    let _log_guard = debug::setup_logging_default(cfg.config().debug_log.clone());

    let mut router = build_bts_stack(&cfg, FrameNumber::new(args.start_fn));

    // Set up Ctrl+C handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("failed to set Ctrl+C handler");

    run_realtime(&mut router, &cfg, running);
}
