//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{error, info, warn};
use serde::Serialize;

use crate::{
    faults::{FaultClass, FaultModule, FaultRegister},
    gait_engine::{self, GaitEngine, GaitEngineError},
    servo_ctrl::Actuation,
};
use util::module::State;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the hexapod has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize)]
pub enum SafeModeCause {
    MakeSafeTc,
    EmergencyFault,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
pub struct DataStore<A> {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Monotonic time of this cycle
    ///
    /// Units: milliseconds
    pub now_ms: u64,

    // Safe mode variables
    /// Determines if the hexapod is in safe mode.
    pub safe: bool,

    /// Gives the reason for the hexapod being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // Faults
    pub faults: FaultRegister,

    // GaitEngine
    pub gait_engine: GaitEngine<A>,
    pub gait_engine_output: gait_engine::OutputData,
    pub gait_engine_status_rpt: gait_engine::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl<A: Actuation> DataStore<A> {
    pub fn new(actuation: A) -> Self {
        Self {
            num_cycles: 0,
            is_1_hz_cycle: false,
            now_ms: 0,
            safe: false,
            safe_cause: None,
            faults: FaultRegister::new(),
            gait_engine: GaitEngine::new(actuation),
            gait_engine_output: Default::default(),
            gait_engine_status_rpt: Default::default(),
            num_consec_cycle_overruns: 0,
        }
    }

    /// Puts the hexapod into safe mode with the given cause.
    ///
    /// The legs hold their last committed angles while safe.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// Returns `Ok(())` if this cause was cleared and safe mode was disabled, or `Err(())`
    /// otherwise. To remove safe mode the provided cause must match the initial reason for safe
    /// mode being enabled, and no emergency fault may be latched.
    ///
    /// If safe mode was not enabled `Ok(())` is returned
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), ()> {
        if !self.safe {
            return Ok(());
        }

        if self.faults.is_emergency() {
            warn!("Make unsafe rejected, emergency faults are latched");
            return Err(());
        }

        match self.safe_cause {
            Some(root_cause) => {
                if cause == root_cause {
                    self.safe = false;
                    self.safe_cause = None;
                    info!("Make unsafe requested, root cause match, safe mode disabled");
                    Ok(())
                } else {
                    Err(())
                }
            }
            None => Ok(()),
        }
    }

    /// Initialise the gait engine.
    ///
    /// Rejected parameters raise a configuration fault against the module they belong to, which
    /// puts the hexapod into safe mode before the error is returned.
    pub fn gait_engine_init(
        &mut self,
        init_data: gait_engine::InitData
    ) -> Result<(), GaitEngineError> {
        if let Err(e) = self.gait_engine.init(init_data) {
            let module = match e {
                GaitEngineError::LimbsDriverError(_) => FaultModule::LimbsDriver,
                _ => FaultModule::GaitEngine,
            };
            error!("{:?} initialisation failed: {}", module, e);
            self.faults.raise(module, FaultClass::Config);
            self.make_safe(SafeModeCause::EmergencyFault);
            return Err(e);
        }

        Ok(())
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64, now_ms: u64) {
        let cycles_per_s = (cycle_frequency_hz as u128).max(1);
        self.is_1_hz_cycle = self.num_cycles % cycles_per_s == 0;

        self.now_ms = now_ms;
    }

    /// Run the gait engine for this cycle and fold its report into the fault register.
    ///
    /// Modules with an emergency fault latched are disabled. Any emergency puts the hexapod
    /// into safe mode.
    pub fn gait_engine_proc(&mut self) {
        let input = gait_engine::InputData {
            now_ms: self.now_ms,
            engine_disabled: self.faults.is_module_disabled(FaultModule::GaitEngine),
            limbs_disabled: self.faults.is_module_disabled(FaultModule::LimbsDriver),
        };

        match self.gait_engine.proc(&input) {
            Ok((o, r)) => {
                self.gait_engine_output = o;
                self.gait_engine_status_rpt = r;

                if r.limbs.leg_faults.iter().any(|f| f.is_some()) {
                    self.faults.raise(FaultModule::LimbsDriver, FaultClass::OutOfRange);
                }
                if r.selfdiag {
                    self.faults.raise(FaultModule::GaitEngine, FaultClass::Internal);
                }
            },
            Err(GaitEngineError::LimbsDriverError(e)) => {
                error!("Error during LimbsDriver processing: {}", e);
                self.faults.raise(FaultModule::LimbsDriver, FaultClass::Internal);
            },
            Err(e) => {
                error!("Error during GaitEngine processing: {}", e);
                self.faults.raise(FaultModule::GaitEngine, FaultClass::Internal);
            }
        }

        if self.faults.is_emergency() {
            self.make_safe(SafeModeCause::EmergencyFault);
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{limbs_driver::test_params, servo_ctrl::SimServos};
    use comms_if::tc::GaitId;

    fn engine_params() -> gait_engine::Params {
        gait_engine::Params {
            height_low_mm: 85.0,
            height_high_mm: 120.0,
            height_step_mm: 5.0,
        }
    }

    fn init_ds() -> DataStore<SimServos> {
        let mut ds = DataStore::new(SimServos::new());
        ds.gait_engine_init(gait_engine::InitData {
            engine: engine_params(),
            limbs: test_params(),
        })
        .unwrap();
        ds
    }

    fn run_cycles(ds: &mut DataStore<SimServos>, num_cycles: usize) {
        for _ in 0..num_cycles {
            ds.cycle_start(50.0, ds.now_ms + 20);
            ds.gait_engine_proc();
            ds.num_cycles += 1;
        }
    }

    #[test]
    fn test_invalid_calibration_is_config_fault() {
        let mut ds = DataStore::new(SimServos::new());
        let mut limbs = test_params();
        limbs.legs[3].calibration.tibia.length_mm = -1.0;

        let res = ds.gait_engine_init(gait_engine::InitData {
            engine: engine_params(),
            limbs,
        });

        assert!(matches!(res, Err(GaitEngineError::LimbsDriverError(_))));
        assert!(ds.faults.is_active(FaultModule::LimbsDriver, FaultClass::Config));
        assert!(ds.faults.is_module_disabled(FaultModule::LimbsDriver));
        assert!(!ds.faults.is_active(FaultModule::GaitEngine, FaultClass::Config));
        assert!(ds.safe);
        assert_eq!(ds.safe_cause, Some(SafeModeCause::EmergencyFault));
        assert!(ds.make_unsafe(SafeModeCause::EmergencyFault).is_err());
    }

    #[test]
    fn test_invalid_engine_params_is_config_fault() {
        let mut ds = DataStore::new(SimServos::new());
        let mut engine = engine_params();
        engine.height_low_mm = 130.0;

        let res = ds.gait_engine_init(gait_engine::InitData {
            engine,
            limbs: test_params(),
        });

        assert!(res.is_err());
        assert!(ds.faults.is_active(FaultModule::GaitEngine, FaultClass::Config));
        assert!(!ds.faults.is_active(FaultModule::LimbsDriver, FaultClass::Config));
        assert!(ds.safe);
        assert_eq!(ds.safe_cause, Some(SafeModeCause::EmergencyFault));
    }

    #[test]
    fn test_unreachable_point_is_leg_fault() {
        let mut ds = DataStore::new(SimServos::new());

        // The rest point is reachable but standing up needs more femur travel
        let mut limbs = test_params();
        for leg in limbs.legs.iter_mut() {
            leg.calibration.femur.max_angle_deg = 60.0;
        }
        ds.gait_engine_init(gait_engine::InitData {
            engine: engine_params(),
            limbs,
        })
        .unwrap();

        run_cycles(&mut ds, 50);
        assert!(!ds.faults.any());

        ds.gait_engine.select_sequence(GaitId::Up).unwrap();
        run_cycles(&mut ds, 200);

        assert!(ds.faults.is_active(FaultModule::LimbsDriver, FaultClass::OutOfRange));
        assert!(!ds.faults.is_module_disabled(FaultModule::LimbsDriver));
        assert!(!ds.faults.is_emergency());
        assert!(!ds.safe);
    }

    #[test]
    fn test_safe_mode_causes() {
        let mut ds = init_ds();

        ds.make_safe(SafeModeCause::MakeSafeTc);
        assert!(ds.safe);

        // A second cause does not replace the first
        ds.make_safe(SafeModeCause::EmergencyFault);
        assert_eq!(ds.safe_cause, Some(SafeModeCause::MakeSafeTc));

        assert!(ds.make_unsafe(SafeModeCause::EmergencyFault).is_err());
        assert!(ds.make_unsafe(SafeModeCause::MakeSafeTc).is_ok());
        assert!(!ds.safe);
    }

    #[test]
    fn test_uninitialised_engine_is_emergency() {
        let mut ds = DataStore::new(SimServos::new());

        ds.gait_engine_proc();

        assert!(ds.faults.is_active(FaultModule::GaitEngine, FaultClass::Internal));
        assert!(ds.safe);
        assert_eq!(ds.safe_cause, Some(SafeModeCause::EmergencyFault));

        // Latched emergencies keep the hexapod safe
        assert!(ds.make_unsafe(SafeModeCause::EmergencyFault).is_err());
        ds.faults.clear();
        assert!(ds.make_unsafe(SafeModeCause::EmergencyFault).is_ok());
    }

    #[test]
    fn test_nominal_proc() {
        let mut ds = init_ds();

        for i in 0..20 {
            ds.cycle_start(50.0, i * 20);
            ds.gait_engine_proc();
        }

        assert!(!ds.faults.any());
        assert!(!ds.safe);
        assert!(ds.gait_engine.is_idle());
        assert_eq!(ds.gait_engine_status_rpt.height_mm, 85.0);
    }

    #[test]
    fn test_one_hz_flag() {
        let mut ds = init_ds();

        ds.cycle_start(50.0, 0);
        assert!(ds.is_1_hz_cycle);

        ds.num_cycles = 49;
        ds.cycle_start(50.0, 980);
        assert!(!ds.is_1_hz_cycle);

        ds.num_cycles = 50;
        ds.cycle_start(50.0, 1000);
        assert!(ds.is_1_hz_cycle);
    }
}
