//! # Fault register
//!
//! Classified faults latched per module until explicitly cleared.
//!
//! `Config` and `Internal` faults are emergencies: they disable the module that
//! raised them and the executable drops into safe mode. `OutOfRange` and
//! `Sync` faults are recorded for telemetry only.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{error, warn};
use serde::Serialize;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of modules able to raise faults.
pub const NUM_FAULT_MODULES: usize = 3;

/// Status word bit set while an emergency fault is latched.
pub const EMERGENCY_BIT: u32 = 1 << 31;

/// Position of the first module bit in the status word.
const MODULE_BITS_OFFSET: u32 = 16;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Modules able to raise faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FaultModule {
    Exec,
    LimbsDriver,
    GaitEngine,
}

/// Classes of fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FaultClass {
    /// Invalid or missing configuration.
    Config,

    /// Self-diagnostic failure, an impossible state was reached.
    Internal,

    /// A leg target could not be reached.
    OutOfRange,

    /// The main loop overran its cycle time budget.
    Sync,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Latched faults of every module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FaultRegister {
    /// Bit mask of the latched `FaultClass`es, per module
    classes: [u8; NUM_FAULT_MODULES],

    emergency: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FaultModule {
    pub const ALL: [FaultModule; NUM_FAULT_MODULES] = [
        FaultModule::Exec,
        FaultModule::LimbsDriver,
        FaultModule::GaitEngine,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl FaultClass {
    /// True if this class of fault halts processing.
    pub fn is_emergency(self) -> bool {
        matches!(self, FaultClass::Config | FaultClass::Internal)
    }

    fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

impl FaultRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch a fault.
    ///
    /// Only the first occurrence of a fault is logged, repeats are silently
    /// latched again.
    pub fn raise(&mut self, module: FaultModule, class: FaultClass) {
        if self.is_active(module, class) {
            return;
        }

        self.classes[module.index()] |= class.mask();

        if class.is_emergency() {
            self.emergency = true;
            error!("{:?} fault raised by {:?}, module disabled", class, module);
        }
        else {
            warn!("{:?} fault raised by {:?}", class, module);
        }
    }

    pub fn is_active(&self, module: FaultModule, class: FaultClass) -> bool {
        self.classes[module.index()] & class.mask() != 0
    }

    /// True if the module has an emergency fault latched and must not process.
    pub fn is_module_disabled(&self, module: FaultModule) -> bool {
        let emergency_mask = FaultClass::Config.mask() | FaultClass::Internal.mask();
        self.classes[module.index()] & emergency_mask != 0
    }

    pub fn is_emergency(&self) -> bool {
        self.emergency
    }

    pub fn any(&self) -> bool {
        self.classes.iter().any(|c| *c != 0)
    }

    /// Clear every latched fault.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Pack the register into a status word.
    ///
    /// Layout: bit 31 emergency, bits 16.. the modules with a fault, bits 0..7
    /// the union of all latched fault classes.
    pub fn status_word(&self) -> u32 {
        let mut word = 0u32;

        if self.emergency {
            word |= EMERGENCY_BIT;
        }

        for module in FaultModule::ALL.iter() {
            let classes = self.classes[module.index()];
            if classes != 0 {
                word |= 1 << (MODULE_BITS_OFFSET + module.index() as u32);
                word |= classes as u32;
            }
        }

        word
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_emergency_gates_only_its_module() {
        let mut faults = FaultRegister::new();
        faults.raise(FaultModule::LimbsDriver, FaultClass::Config);

        assert!(faults.is_emergency());
        assert!(faults.is_module_disabled(FaultModule::LimbsDriver));
        assert!(!faults.is_module_disabled(FaultModule::GaitEngine));
    }

    #[test]
    fn test_non_emergency_faults_do_not_gate() {
        let mut faults = FaultRegister::new();
        faults.raise(FaultModule::LimbsDriver, FaultClass::OutOfRange);
        faults.raise(FaultModule::Exec, FaultClass::Sync);

        assert!(faults.any());
        assert!(!faults.is_emergency());
        assert!(!faults.is_module_disabled(FaultModule::LimbsDriver));
        assert!(!faults.is_module_disabled(FaultModule::Exec));
        assert!(faults.is_active(FaultModule::Exec, FaultClass::Sync));
    }

    #[test]
    fn test_status_word_and_clear() {
        let mut faults = FaultRegister::new();
        faults.raise(FaultModule::GaitEngine, FaultClass::Internal);
        faults.raise(FaultModule::LimbsDriver, FaultClass::OutOfRange);

        let word = faults.status_word();
        assert_ne!(word & EMERGENCY_BIT, 0);
        assert_eq!(word & (1 << 17), 1 << 17);
        assert_eq!(word & (1 << 18), 1 << 18);
        assert_eq!(word & (1 << 16), 0);
        assert_eq!(word & 0xFF, 0b0110);

        faults.clear();
        assert_eq!(faults.status_word(), 0);
        assert!(!faults.is_module_disabled(FaultModule::GaitEngine));
    }
}
