//! Main hexapod-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Telecommand processing and handling
//!         - Gait engine processing, which drives the limbs driver
//!         - Fault handling
//!         - Cycle management
//!
//! # Modules
//!
//! All modules (e.g. `gait_engine`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use hex_lib::{
    data_store::DataStore,
    faults::{FaultClass, FaultModule},
    gait_engine,
    limbs_driver::{self, MemoryStore},
    params::HexExecParams,
    servo_ctrl::SimServos,
};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use std::env;
use std::str::FromStr;
use std::thread;
use std::time::{Duration, Instant};
use color_eyre::{Report, eyre::{WrapErr, eyre}};

// Internal
use comms_if::tc::GaitId;
use util::{
    host,
    module::State,
    logger::{logger_init, LevelFilter},
    session::Session,
    script_interpreter::{ScriptInterpreter, PendingTcs},
    time::MonotonicClock,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Modules tracing every servo commit, kept quieter than the rest.
const QUIET_LOG_TARGETS: [&str; 1] = ["hex_lib::servo_ctrl::sim"];

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "hex_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Load the exec parameters first, they hold the log level
    let exec_params: HexExecParams = util::params::load(
        "hex_exec.toml"
    ).wrap_err("Could not load hex_exec params")?;

    let log_level = LevelFilter::from_str(&exec_params.log_level)
        .map_err(|_| eyre!("Invalid log level \"{}\"", exec_params.log_level))?;

    // Initialise logger
    logger_init(log_level, &QUIET_LOG_TARGETS, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Hexapod Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let engine_params: gait_engine::Params = util::params::load(
        "gait_engine.toml"
    ).wrap_err("Could not load gait_engine params")?;

    let mut limbs_params: limbs_driver::Params = util::params::load(
        "limbs_driver.toml"
    ).wrap_err("Could not load limbs_driver params")?;

    // Calibration from the configuration store takes precedence
    if let Some(ref image) = exec_params.config_store_image {
        let mut path = host::get_hexapod_sw_root()
            .wrap_err("Failed to get the software root")?;
        path.push(image);

        info!("Reading leg calibration from {:?}", path);

        let store = MemoryStore::from_file(&path)
            .wrap_err("Failed to load the configuration store image")?;
        limbs_params = limbs_driver::read_params(&store, limbs_params.step_delay_ms)
            .wrap_err("Failed to read the leg calibration from the configuration store")?;
    }

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    if args.len() != 2 {
        return Err(eyre!(
            "Expected a single argument (the TC script path), found {}", args.len() - 1)
        );
    }

    info!("Loading script from \"{}\"", &args[1]);

    let mut script = ScriptInterpreter::new(&args[1])
        .wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} TCs\n",
        script.get_duration(),
        script.get_num_tcs()
    );

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::new(SimServos::new());

    // ---- INITIALISE MODULES ----

    let init_res = ds.gait_engine_init(gait_engine::InitData {
        engine: engine_params,
        limbs: limbs_params,
    });
    if let Err(e) = init_res {
        session.save_json("faults.json", &ds.faults)
            .wrap_err("Failed to save the fault register")?;
        return Err(e).wrap_err("Failed to initialise GaitEngine");
    }
    info!("GaitEngine init complete");

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    let clock = MonotonicClock::new();
    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);
    let max_cycle_time = Duration::from_secs_f64(exec_params.max_cycle_time_s);
    let mut end_of_script = false;

    info!("Begining main loop\n");

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        ds.cycle_start(exec_params.cycle_frequency_hz(), clock.now_ms());

        // ---- TELECOMMAND PROCESSING ----

        if !end_of_script {
            match script.get_pending_tcs() {
                PendingTcs::None => (),
                PendingTcs::Some(tc_vec) => {
                    for tc in tc_vec.iter() {
                        tc_processor::exec(&mut ds, tc);
                    }
                }
                PendingTcs::EndOfScript => {
                    info!("End of TC script reached, waiting for the gait engine to stop");
                    end_of_script = true;
                }
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        if !ds.safe {
            ds.gait_engine_proc();
        }

        if ds.is_1_hz_cycle && ds.faults.any() {
            debug!("Fault status word: 0x{:08X}", ds.faults.status_word());
        }

        // Stop once the script is done and nothing is left to play
        if end_of_script
            && (ds.safe
                || (ds.gait_engine.is_idle() && ds.gait_engine.next_gait() == GaitId::None))
        {
            break;
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        if cycle_dur > max_cycle_time {
            ds.faults.raise(FaultModule::Exec, FaultClass::Sync);
        }

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    info!(
        "Executed {} cycles, {} servo commits",
        ds.num_cycles,
        ds.gait_engine.limbs().actuation().num_commits()
    );

    session.save_json("faults.json", &ds.faults)
        .wrap_err("Failed to save the fault register")?;
    session.save_json("gait_engine_status.json", &ds.gait_engine_status_rpt)
        .wrap_err("Failed to save the gait engine status")?;

    info!("End of execution");

    Ok(())
}
