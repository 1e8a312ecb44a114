//! # Telecommand processor module
//!
//! The telecommand processor handles various TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};

// Internal
use comms_if::tc::{GaitId, Tc};
use hex_lib::{
    data_store::{DataStore, SafeModeCause},
    gait_engine::{GaitEngineError, Posture},
    servo_ctrl::Actuation,
};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules. While safe only `MakeUnsafe`,
/// `ClearFaults` and `Heartbeat` are executed.
pub(crate) fn exec<A: Actuation>(ds: &mut DataStore<A>, tc: &Tc) {

    if ds.safe && !matches!(tc, Tc::MakeUnsafe | Tc::ClearFaults | Tc::Heartbeat) {
        warn!("Cannot execute {:?} while in safe mode", tc);
        return;
    }

    // Handle different Tcs
    match tc {
        Tc::Heartbeat => trace!("Recieved Heartbeat"),
        Tc::MakeSafe => {
            debug!("Recieved MakeSafe command");
            ds.make_safe(SafeModeCause::MakeSafeTc);
        },
        Tc::MakeUnsafe => {
            debug!("Recieved MakeUnsafe command");
            ds.make_unsafe(SafeModeCause::MakeSafeTc).ok();
        },
        Tc::ClearFaults => {
            info!("Clearing faults (status word was 0x{:08X})", ds.faults.status_word());
            ds.faults.clear();
            ds.make_unsafe(SafeModeCause::EmergencyFault).ok();
        },
        Tc::SelectGait(gait) => {
            if let Err(e) = ds.gait_engine.select_sequence(*gait) {
                warn!("Gait selection rejected: {}", e);
            }
        },
        Tc::SetHeight(height_mm) => {
            let res = ds.gait_engine.set_height(*height_mm);
            height_changed(ds, res);
        },
        Tc::IncreaseHeight => {
            let res = ds.gait_engine.increase_height();
            height_changed(ds, res);
        },
        Tc::DecreaseHeight => {
            let res = ds.gait_engine.decrease_height();
            height_changed(ds, res);
        }
    }

}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Move the body to its new height, if standing.
fn height_changed<A: Actuation>(ds: &mut DataStore<A>, res: Result<(), GaitEngineError>) {
    match res {
        Ok(()) => {
            if ds.gait_engine.posture() == Posture::Up {
                if let Err(e) = ds.gait_engine.select_sequence(GaitId::UpdateHeight) {
                    warn!("Cannot move to the new height: {}", e);
                }
            }
        },
        Err(e) => warn!("Height change rejected: {}", e)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
