//! # Persistent configuration store
//!
//! Leg calibration as laid out in the robot's configuration memory. Each leg
//! owns a `LEG_CONFIG_SIZE` byte block, leg `n` starting at
//! `n * LEG_CONFIG_SIZE`. All fields are big-endian 16 bit words in tenths of
//! a unit:
//!
//! | Offset | Field                         | Type | Units  |
//! |--------|-------------------------------|------|--------|
//! | 0x00   | coxa, femur, tibia length     | u16  | 0.1 mm |
//! | 0x06   | coxa, femur, tibia zero angle | i16  | 0.1 deg|
//! | 0x0C   | coxa min, max angle           | i16  | 0.1 deg|
//! | 0x10   | femur min, max angle          | i16  | 0.1 deg|
//! | 0x14   | tibia min, max angle          | i16  | 0.1 deg|
//! | 0x18   | start position x, y, z        | i16  | 0.1 mm |
//!
//! Erased memory reads as all ones, so a field equal to `0xFFFF` has never
//! been written and is reported as missing. This takes one value out of each
//! range: lengths go from 0 to 6553.4 mm, and signed fields from -3276.8 to
//! 3276.7 but cannot hold -0.1, whose word is `0xFFFF`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use byteorder::{BigEndian, ByteOrder};
use std::path::Path;
use thiserror::Error;

use super::{LegParams, Params};
use crate::{
    geometry::{Joint, Leg, Point3, NUM_LEGS},
    kinematics::LinkCalibration,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Size of the configuration block of one leg.
pub const LEG_CONFIG_SIZE: usize = 32;

/// Size of the configuration of every leg.
pub const CONFIG_IMAGE_SIZE: usize = LEG_CONFIG_SIZE * NUM_LEGS;

/// Value of an erased word.
const ERASED_WORD: u16 = 0xFFFF;

/// Scale of stored values, which are in tenths of a unit.
const VALUE_SCALE: f64 = 10.0;

const LENGTH_OFFSET: usize = 0x00;
const ZERO_ROTATE_OFFSET: usize = 0x06;
const ANGLE_LIMITS_OFFSET: usize = 0x0C;
const START_POSITION_OFFSET: usize = 0x18;

/// Names of the link fields, in layout order for each joint.
const LINK_FIELDS: [[&str; 4]; 3] = [
    ["coxa length", "coxa zero rotation", "coxa min angle", "coxa max angle"],
    ["femur length", "femur zero rotation", "femur min angle", "femur max angle"],
    ["tibia length", "tibia zero rotation", "tibia min angle", "tibia max angle"],
];

const START_POSITION_FIELDS: [&str; 3] = ["start position x", "start position y", "start position z"];

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Read access to a byte-addressed configuration memory.
pub trait ConfigStore {
    /// Fill `buf` with the bytes starting at `address`.
    fn read(&self, address: usize, buf: &mut [u8]) -> Result<(), ConfigStoreError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A configuration memory image held in RAM.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryStore {
    bytes: Vec<u8>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors reading leg configuration from a store or building an image.
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("Cannot read {len} bytes at 0x{address:04X}, the store holds {size} bytes")]
    OutOfBounds { address: usize, len: usize, size: usize },

    #[error("The {field} of the {leg} leg has never been written")]
    MissingField { leg: Leg, field: &'static str },

    #[error("The {field} of the {leg} leg ({value}) cannot be stored")]
    UnrepresentableValue { leg: Leg, field: &'static str, value: f64 },

    #[error("Cannot load the configuration image: {0}")]
    ImageLoadError(std::io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MemoryStore {
    /// An erased store of the given size.
    pub fn erased(size: usize) -> Self {
        Self { bytes: vec![0xFF; size] }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Load a raw image file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigStoreError> {
        std::fs::read(path)
            .map(Self::from_bytes)
            .map_err(ConfigStoreError::ImageLoadError)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Build the image holding the given parameters.
    ///
    /// The step delay is not part of the image. Values which do not fit their
    /// word, or which would read back as erased, are rejected.
    pub fn from_params(params: &Params) -> Result<Self, ConfigStoreError> {
        let mut store = Self::erased(CONFIG_IMAGE_SIZE);

        for leg in Leg::ALL.iter() {
            let base = leg.index() * LEG_CONFIG_SIZE;
            let leg_params = &params.legs[leg.index()];
            let calib = &leg_params.calibration;

            let unsigned = |value: f64, field: &'static str| {
                to_unsigned_word(value).ok_or(ConfigStoreError::UnrepresentableValue {
                    leg: *leg,
                    field,
                    value,
                })
            };
            let signed = |value: f64, field: &'static str| {
                to_signed_word(value).ok_or(ConfigStoreError::UnrepresentableValue {
                    leg: *leg,
                    field,
                    value,
                })
            };

            for (i, joint) in Joint::ALL.iter().enumerate() {
                let link = calib.link(*joint);
                let names = &LINK_FIELDS[i];

                store.write_u16(base + LENGTH_OFFSET + 2 * i, unsigned(link.length_mm, names[0])?);
                store.write_i16(
                    base + ZERO_ROTATE_OFFSET + 2 * i,
                    signed(link.zero_rotate_deg, names[1])?
                );
                store.write_i16(
                    base + ANGLE_LIMITS_OFFSET + 4 * i,
                    signed(link.min_angle_deg, names[2])?
                );
                store.write_i16(
                    base + ANGLE_LIMITS_OFFSET + 4 * i + 2,
                    signed(link.max_angle_deg, names[3])?
                );
            }

            let p = leg_params.start_position_mm;
            for (i, value) in [p.x, p.y, p.z].iter().enumerate() {
                store.write_i16(
                    base + START_POSITION_OFFSET + 2 * i,
                    signed(*value, START_POSITION_FIELDS[i])?
                );
            }
        }

        Ok(store)
    }

    pub fn write_u16(&mut self, address: usize, value: u16) {
        if let Some(b) = self.bytes.get_mut(address..address + 2) {
            BigEndian::write_u16(b, value);
        }
    }

    pub fn write_i16(&mut self, address: usize, value: i16) {
        if let Some(b) = self.bytes.get_mut(address..address + 2) {
            BigEndian::write_i16(b, value);
        }
    }
}

impl ConfigStore for MemoryStore {
    fn read(&self, address: usize, buf: &mut [u8]) -> Result<(), ConfigStoreError> {
        match self.bytes.get(address..address + buf.len()) {
            Some(b) => {
                buf.copy_from_slice(b);
                Ok(())
            },
            None => Err(ConfigStoreError::OutOfBounds {
                address,
                len: buf.len(),
                size: self.bytes.len(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Read the limbs driver parameters from a configuration store.
pub fn read_params(store: &dyn ConfigStore, step_delay_ms: u64) -> Result<Params, ConfigStoreError> {
    let mut legs = [LegParams::default(); NUM_LEGS];

    for leg in Leg::ALL.iter() {
        legs[leg.index()] = read_leg_params(store, *leg)?;
    }

    Ok(Params { step_delay_ms, legs })
}

/// Read the parameters of one leg from a configuration store.
pub fn read_leg_params(store: &dyn ConfigStore, leg: Leg) -> Result<LegParams, ConfigStoreError> {
    let mut block = [0u8; LEG_CONFIG_SIZE];
    store.read(leg.index() * LEG_CONFIG_SIZE, &mut block)?;

    let word = |offset: usize, field: &'static str| -> Result<u16, ConfigStoreError> {
        match BigEndian::read_u16(&block[offset..offset + 2]) {
            ERASED_WORD => Err(ConfigStoreError::MissingField { leg, field }),
            w => Ok(w),
        }
    };
    let length = |offset: usize, field: &'static str| {
        word(offset, field).map(|w| w as f64 / VALUE_SCALE)
    };
    let signed = |offset: usize, field: &'static str| {
        word(offset, field).map(|w| w as i16 as f64 / VALUE_SCALE)
    };

    let mut links = [LinkCalibration::default(); 3];

    for (i, link) in links.iter_mut().enumerate() {
        let names = &LINK_FIELDS[i];
        *link = LinkCalibration {
            length_mm: length(LENGTH_OFFSET + 2 * i, names[0])?,
            zero_rotate_deg: signed(ZERO_ROTATE_OFFSET + 2 * i, names[1])?,
            min_angle_deg: signed(ANGLE_LIMITS_OFFSET + 4 * i, names[2])?,
            max_angle_deg: signed(ANGLE_LIMITS_OFFSET + 4 * i + 2, names[3])?,
        };
    }

    let start_position_mm = Point3::new(
        signed(START_POSITION_OFFSET, START_POSITION_FIELDS[0])?,
        signed(START_POSITION_OFFSET + 2, START_POSITION_FIELDS[1])?,
        signed(START_POSITION_OFFSET + 4, START_POSITION_FIELDS[2])?,
    );

    Ok(LegParams {
        calibration: crate::kinematics::LegCalibration {
            coxa: links[0],
            femur: links[1],
            tibia: links[2],
        },
        start_position_mm,
    })
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Stored word of an unsigned value, `None` if it cannot be stored.
fn to_unsigned_word(value: f64) -> Option<u16> {
    let w = (value * VALUE_SCALE).round();
    if w >= 0.0 && w < ERASED_WORD as f64 {
        Some(w as u16)
    }
    else {
        None
    }
}

/// Stored word of a signed value, `None` if it cannot be stored.
fn to_signed_word(value: f64) -> Option<i16> {
    let w = (value * VALUE_SCALE).round();
    if w >= i16::MIN as f64 && w <= i16::MAX as f64 && w as i16 != ERASED_WORD as i16 {
        Some(w as i16)
    }
    else {
        None
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
