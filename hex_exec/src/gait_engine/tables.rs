//! # Gait tables
//!
//! Definitions of every known gait. Targets tagged `Down` or `Up` are authored
//! with a zero height and only become usable once `update_y` has been called
//! with the body height, which the engine does at initialisation.
//!
//! Walking gaits move the legs as two tripods, `A` (left front, left rear and
//! right middle) and `B` (the others). In the main stage one tripod pushes
//! along the ground while the other swings through the air.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::HashMap;

use comms_if::tc::GaitId;

use super::{
    GaitDefinition, GaitEngineError, LimbRole, LimbTarget, SequenceIteration,
};
use crate::{
    geometry::{Leg, Point3, NUM_LEGS},
    path::PathShape,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Polar angle of the neutral direction of each leg.
///
/// Units: degrees
pub const NEUTRAL_ANGLE_DEG: [f64; NUM_LEGS] = [45.0, 90.0, 135.0, 45.0, 90.0, 135.0];

/// Distance of the feet from the coxa joint while standing.
///
/// Units: millimeters
pub const WALK_RADIUS_MM: f64 = 125.0;

/// Distance of the feet from the coxa joint with the body on the ground.
///
/// Units: millimeters
pub const REST_RADIUS_MM: f64 = 110.0;

/// Height of the feet with the body on the ground.
///
/// Units: millimeters
pub const REST_Y_MM: f64 = -20.0;

const TRIPOD_A: [Leg; 3] = [Leg::LeftFront, Leg::LeftRear, Leg::RightMiddle];
const TRIPOD_B: [Leg; 3] = [Leg::LeftMiddle, Leg::RightFront, Leg::RightRear];

/// Half stride of the straight walking gaits.
///
/// Units: millimeters
const STRIDE_MM: f64 = 15.0;
const SHORT_STRIDE_MM: f64 = 7.5;

/// Half turn of each step of the rotating gaits.
///
/// Units: degrees
const TURN_DEG: f64 = 10.0;
const SHORT_TURN_DEG: f64 = 5.0;

/// Offset of each foot in the dance.
///
/// Units: millimeters
const DANCE_OFFSET_MM: f64 = 15.0;

/// Attacking leg raised in front of the body.
const ATTACK_GUARD: Point3 = Point3::new(60.0, 20.0, 150.0);

/// Attacking leg fully extended.
const ATTACK_STRIKE: Point3 = Point3::new(70.0, 0.0, 170.0);

// Smoothness of the different kinds of moves
const LIFT_SMOOTHNESS: u32 = 8;
const STRIDE_SMOOTHNESS: u32 = 12;
const BODY_SMOOTHNESS: u32 = 20;
const REST_SMOOTHNESS: u32 = 30;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The definitions of every gait, owned by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct GaitTables {
    gaits: HashMap<GaitId, GaitDefinition>,
}

/// Builds a gait one iteration at a time.
///
/// Legs not given a new target in an iteration keep their previous one.
struct GaitBuilder {
    targets: [LimbTarget; NUM_LEGS],
    iterations: Vec<SequenceIteration>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GaitTables {
    /// Build the tables of every known gait.
    pub fn standard() -> Self {
        let mut gaits = HashMap::new();

        gaits.insert(GaitId::Down, down());
        gaits.insert(GaitId::Up, up());
        gaits.insert(GaitId::UpdateHeight, update_height());
        gaits.insert(GaitId::DirectMovement, straight(STRIDE_MM));
        gaits.insert(GaitId::DirectMovementShort, straight(SHORT_STRIDE_MM));
        gaits.insert(GaitId::ReverseMovement, straight(-STRIDE_MM));
        gaits.insert(GaitId::ReverseMovementShort, straight(-SHORT_STRIDE_MM));
        gaits.insert(GaitId::RotateLeft, rotate(TURN_DEG, true));
        gaits.insert(GaitId::RotateLeftShort, rotate(SHORT_TURN_DEG, true));
        gaits.insert(GaitId::RotateRight, rotate(TURN_DEG, false));
        gaits.insert(GaitId::RotateRightShort, rotate(SHORT_TURN_DEG, false));
        gaits.insert(GaitId::AttackLeft, attack(Leg::LeftFront));
        gaits.insert(GaitId::AttackRight, attack(Leg::RightFront));
        gaits.insert(GaitId::Dance, dance());

        Self { gaits }
    }

    pub fn get(&self, gait: GaitId) -> Option<&GaitDefinition> {
        self.gaits.get(&gait)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GaitId, &GaitDefinition)> {
        self.gaits.iter()
    }

    /// Rewrite the heights of every gait for a body height.
    pub fn update_y(&mut self, height_mm: f64) {
        for gait in self.gaits.values_mut() {
            gait.update_y(height_mm);
        }
    }

    pub fn validate(&self) -> Result<(), GaitEngineError> {
        for (id, gait) in self.gaits.iter() {
            gait.validate()
                .map_err(|e| GaitEngineError::InvalidTable(*id, e))?;
        }
        Ok(())
    }
}

impl GaitBuilder {
    fn new(targets: [LimbTarget; NUM_LEGS]) -> Self {
        Self {
            targets,
            iterations: Vec::new(),
        }
    }

    /// Set the targets of some legs for the next iteration.
    fn set<F>(mut self, legs: &[Leg], target: F) -> Self
    where
        F: Fn(Leg) -> LimbTarget
    {
        for leg in legs {
            self.targets[leg.index()] = target(*leg);
        }
        self
    }

    /// Close the iteration.
    fn push(mut self, smooth_point_count: u32) -> Self {
        self.iterations.push(SequenceIteration {
            limbs: self.targets,
            smooth_point_count,
        });
        self
    }

    fn build(self, main_sequence_begin: usize, finalize_sequence_begin: usize, is_looped: bool)
        -> GaitDefinition
    {
        GaitDefinition {
            iterations: self.iterations,
            main_sequence_begin,
            finalize_sequence_begin,
            is_looped,
        }
    }
}

// ---------------------------------------------------------------------------
// GAITS
// ---------------------------------------------------------------------------

/// Lower the body onto the ground.
fn down() -> GaitDefinition {
    GaitBuilder::new(standing(REST_RADIUS_MM))
        .set(&Leg::ALL, |l| LimbTarget::new(rest_point(l), PathShape::Linear, LimbRole::Custom))
        .push(REST_SMOOTHNESS)
        .build(1, 1, false)
}

/// Raise the body off the ground and spread the legs into the standing stance.
fn up() -> GaitDefinition {
    GaitBuilder::new(standing(REST_RADIUS_MM))
        .push(BODY_SMOOTHNESS)
        .set(&TRIPOD_A, |l| lifted(neutral(l, WALK_RADIUS_MM), PathShape::Linear))
        .push(LIFT_SMOOTHNESS)
        .set(&TRIPOD_A, |l| grounded(neutral(l, WALK_RADIUS_MM), PathShape::Linear))
        .push(LIFT_SMOOTHNESS)
        .set(&TRIPOD_B, |l| lifted(neutral(l, WALK_RADIUS_MM), PathShape::Linear))
        .push(LIFT_SMOOTHNESS)
        .set(&TRIPOD_B, |l| grounded(neutral(l, WALK_RADIUS_MM), PathShape::Linear))
        .push(LIFT_SMOOTHNESS)
        .build(5, 5, false)
}

/// Move the body to the current height.
fn update_height() -> GaitDefinition {
    GaitBuilder::new(standing(WALK_RADIUS_MM))
        .push(BODY_SMOOTHNESS)
        .build(1, 1, false)
}

/// Walk in a straight line, forwards for a positive half stride.
fn straight(stride_mm: f64) -> GaitDefinition {
    walking(
        move |leg, k| {
            let mut p = neutral(leg, WALK_RADIUS_MM);
            p.z += k * stride_mm;
            p
        },
        PathShape::Linear,
        PathShape::EllipticalYSinus,
    )
}

/// Turn on the spot.
fn rotate(turn_deg: f64, left: bool) -> GaitDefinition {
    walking(
        move |leg, k| {
            let side = if leg.is_left() == left { -1.0 } else { 1.0 };
            Point3::from_polar(
                WALK_RADIUS_MM,
                NEUTRAL_ANGLE_DEG[leg.index()] - k * side * turn_deg,
                0.0,
            )
        },
        PathShape::ArcYLinear,
        PathShape::ArcYSinus,
    )
}

/// Tripod walking gait.
///
/// `foot(leg, k)` gives the ground point of a leg at stride phase `k`, `0` being
/// the neutral stance and `1` and `-1` the ends of the stride.
fn walking<F>(foot: F, stance: PathShape, swing: PathShape) -> GaitDefinition
where
    F: Fn(Leg, f64) -> Point3
{
    GaitBuilder::new(standing(WALK_RADIUS_MM))
        // Prepare, place tripod A ahead and tripod B behind
        .set(&TRIPOD_A, |l| lifted(foot(l, 0.0), PathShape::Linear))
        .push(LIFT_SMOOTHNESS)
        .set(&TRIPOD_A, |l| grounded(foot(l, 1.0), PathShape::Linear))
        .push(LIFT_SMOOTHNESS)
        .set(&TRIPOD_B, |l| lifted(foot(l, 0.0), PathShape::Linear))
        .push(LIFT_SMOOTHNESS)
        .set(&TRIPOD_B, |l| grounded(foot(l, -1.0), PathShape::Linear))
        .push(LIFT_SMOOTHNESS)
        // Main, one stride of each tripod
        .set(&TRIPOD_A, |l| grounded(foot(l, -1.0), stance))
        .set(&TRIPOD_B, |l| grounded(foot(l, 1.0), swing))
        .push(STRIDE_SMOOTHNESS)
        .set(&TRIPOD_A, |l| grounded(foot(l, 1.0), swing))
        .set(&TRIPOD_B, |l| grounded(foot(l, -1.0), stance))
        .push(STRIDE_SMOOTHNESS)
        // Finalize, back to the neutral stance
        .set(&TRIPOD_A, |l| lifted(foot(l, 0.0), PathShape::Linear))
        .push(LIFT_SMOOTHNESS)
        .set(&TRIPOD_A, |l| grounded(foot(l, 0.0), PathShape::Linear))
        .push(LIFT_SMOOTHNESS)
        .set(&TRIPOD_B, |l| lifted(foot(l, 0.0), PathShape::Linear))
        .push(LIFT_SMOOTHNESS)
        .set(&TRIPOD_B, |l| grounded(foot(l, 0.0), PathShape::Linear))
        .push(LIFT_SMOOTHNESS)
        .build(4, 6, true)
}

/// Strike twice with a front leg.
fn attack(leg: Leg) -> GaitDefinition {
    let pose = |p: Point3| move |_: Leg| LimbTarget::new(p, PathShape::Linear, LimbRole::Custom);

    GaitBuilder::new(standing(WALK_RADIUS_MM))
        .set(&[leg], pose(ATTACK_GUARD))
        .push(15)
        .set(&[leg], pose(ATTACK_STRIKE))
        .push(5)
        .set(&[leg], pose(ATTACK_GUARD))
        .push(10)
        .set(&[leg], pose(ATTACK_STRIKE))
        .push(5)
        .set(&[leg], pose(ATTACK_GUARD))
        .push(10)
        .set(&[leg], |l| lifted(neutral(l, WALK_RADIUS_MM), PathShape::Linear))
        .push(LIFT_SMOOTHNESS)
        .set(&[leg], |l| grounded(neutral(l, WALK_RADIUS_MM), PathShape::Linear))
        .push(LIFT_SMOOTHNESS)
        .build(1, 7, false)
}

/// Sway the body forwards, backwards and sideways.
fn dance() -> GaitDefinition {
    let shifted = |dx_left: f64, dz: f64| {
        move |l: Leg| {
            let mut p = neutral(l, WALK_RADIUS_MM);
            p.x += if l.is_left() { dx_left } else { -dx_left };
            p.z += dz;
            grounded(p, PathShape::Linear)
        }
    };

    GaitBuilder::new(standing(WALK_RADIUS_MM))
        .push(STRIDE_SMOOTHNESS)
        .set(&Leg::ALL, shifted(0.0, -DANCE_OFFSET_MM))
        .push(STRIDE_SMOOTHNESS)
        .set(&Leg::ALL, shifted(0.0, DANCE_OFFSET_MM))
        .push(STRIDE_SMOOTHNESS)
        .set(&Leg::ALL, shifted(-DANCE_OFFSET_MM, 0.0))
        .push(STRIDE_SMOOTHNESS)
        .set(&Leg::ALL, shifted(DANCE_OFFSET_MM, 0.0))
        .push(STRIDE_SMOOTHNESS)
        .set(&Leg::ALL, shifted(0.0, 0.0))
        .push(STRIDE_SMOOTHNESS)
        .build(1, 5, true)
}

// ---------------------------------------------------------------------------
// HELPERS
// ---------------------------------------------------------------------------

/// Point on the neutral direction of a leg, at zero height.
fn neutral(leg: Leg, radius_mm: f64) -> Point3 {
    Point3::from_polar(radius_mm, NEUTRAL_ANGLE_DEG[leg.index()], 0.0)
}

/// Foot position with the body resting on the ground.
pub fn rest_point(leg: Leg) -> Point3 {
    Point3::from_polar(REST_RADIUS_MM, NEUTRAL_ANGLE_DEG[leg.index()], REST_Y_MM)
}

fn grounded(point: Point3, path: PathShape) -> LimbTarget {
    LimbTarget::new(point, path, LimbRole::Down)
}

fn lifted(point: Point3, path: PathShape) -> LimbTarget {
    LimbTarget::new(point, path, LimbRole::Up)
}

/// Every foot on the ground on its neutral direction.
fn standing(radius_mm: f64) -> [LimbTarget; NUM_LEGS] {
    let mut targets = [LimbTarget::default(); NUM_LEGS];
    for leg in Leg::ALL.iter() {
        targets[leg.index()] = grounded(neutral(*leg, radius_mm), PathShape::Linear);
    }
    targets
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
