//! Gait definition types

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use thiserror::Error;

use super::MAX_ITERATIONS;
use crate::{
    geometry::{Point3, LIMB_LIFT_HEIGHT_MM, NUM_LEGS},
    path::PathShape,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Target of one leg for one iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LimbTarget {
    pub point: Point3,
    pub path: PathShape,
    pub role: LimbRole,
}

/// One step of a gait: a target for every leg, reached in `smooth_point_count`
/// interpolation steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceIteration {
    pub limbs: [LimbTarget; NUM_LEGS],
    pub smooth_point_count: u32,
}

/// A gait.
///
/// Iterations `[0, main_sequence_begin)` are the prepare stage,
/// `[main_sequence_begin, finalize_sequence_begin)` the main stage and
/// `[finalize_sequence_begin, total)` the finalize stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaitDefinition {
    pub iterations: Vec<SequenceIteration>,
    pub main_sequence_begin: usize,
    pub finalize_sequence_begin: usize,

    /// If true the main stage repeats until another gait is requested.
    pub is_looped: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How the height of a target follows the body height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LimbRole {
    /// Foot on the ground, `y = -height`.
    Down,

    /// Foot lifted off the ground, `y = -(height - lift)`.
    Up,

    /// Height left as authored.
    Custom,
}

impl Default for LimbRole {
    fn default() -> Self {
        LimbRole::Custom
    }
}

/// Stages of a gait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SequenceStage {
    Prepare,
    Main,
    Finalize,
}

impl Default for SequenceStage {
    fn default() -> Self {
        SequenceStage::Prepare
    }
}

/// Structural errors in a gait definition.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SequenceError {
    #[error("The gait has no iterations")]
    Empty,

    #[error("The gait has {0} iterations, more than the maximum of {}", MAX_ITERATIONS)]
    TooLong(usize),

    #[error("Stages are out of order: main {main}, finalize {finalize}, total {total}")]
    StageOrder { main: usize, finalize: usize, total: usize },

    #[error("The gait is looped but its main stage is empty")]
    EmptyLoop,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LimbTarget {
    pub fn new(point: Point3, path: PathShape, role: LimbRole) -> Self {
        Self { point, path, role }
    }
}

impl SequenceIteration {
    pub fn points(&self) -> [Point3; NUM_LEGS] {
        let mut points = [Point3::default(); NUM_LEGS];
        for (p, limb) in points.iter_mut().zip(self.limbs.iter()) {
            *p = limb.point;
        }
        points
    }

    pub fn paths(&self) -> [PathShape; NUM_LEGS] {
        let mut paths = [PathShape::default(); NUM_LEGS];
        for (p, limb) in paths.iter_mut().zip(self.limbs.iter()) {
            *p = limb.path;
        }
        paths
    }
}

impl GaitDefinition {
    pub fn total_iteration_count(&self) -> usize {
        self.iterations.len()
    }

    pub fn validate(&self) -> Result<(), SequenceError> {
        let total = self.total_iteration_count();

        if total == 0 {
            return Err(SequenceError::Empty);
        }
        if total > MAX_ITERATIONS {
            return Err(SequenceError::TooLong(total));
        }
        if self.main_sequence_begin > self.finalize_sequence_begin
            || self.finalize_sequence_begin > total
        {
            return Err(SequenceError::StageOrder {
                main: self.main_sequence_begin,
                finalize: self.finalize_sequence_begin,
                total,
            });
        }
        if self.is_looped && self.main_sequence_begin == self.finalize_sequence_begin {
            return Err(SequenceError::EmptyLoop);
        }

        Ok(())
    }

    /// Rewrite the height of every `Down` and `Up` target for a body height.
    pub fn update_y(&mut self, height_mm: f64) {
        for iteration in self.iterations.iter_mut() {
            for limb in iteration.limbs.iter_mut() {
                match limb.role {
                    LimbRole::Down => limb.point.y = -height_mm,
                    LimbRole::Up => limb.point.y = -(height_mm - LIMB_LIFT_HEIGHT_MM),
                    LimbRole::Custom => (),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn iteration(role: LimbRole, y: f64) -> SequenceIteration {
        SequenceIteration {
            limbs: [LimbTarget::new(Point3::new(100.0, y, 0.0), PathShape::Linear, role); NUM_LEGS],
            smooth_point_count: 5,
        }
    }

    fn gait(num: usize, main: usize, finalize: usize, looped: bool) -> GaitDefinition {
        GaitDefinition {
            iterations: vec![iteration(LimbRole::Down, 0.0); num],
            main_sequence_begin: main,
            finalize_sequence_begin: finalize,
            is_looped: looped,
        }
    }

    #[test]
    fn test_validate() {
        assert!(gait(10, 4, 6, true).validate().is_ok());
        assert!(gait(5, 5, 5, false).validate().is_ok());
        assert_eq!(gait(0, 0, 0, false).validate(), Err(SequenceError::Empty));
        assert_eq!(gait(16, 1, 2, false).validate(), Err(SequenceError::TooLong(16)));
        assert!(matches!(
            gait(5, 4, 2, false).validate(),
            Err(SequenceError::StageOrder { .. })
        ));
        assert!(matches!(
            gait(5, 1, 6, false).validate(),
            Err(SequenceError::StageOrder { .. })
        ));
        assert_eq!(gait(5, 2, 2, true).validate(), Err(SequenceError::EmptyLoop));
    }

    #[test]
    fn test_update_y() {
        let mut g = GaitDefinition {
            iterations: vec![
                iteration(LimbRole::Down, 0.0),
                iteration(LimbRole::Up, 0.0),
                iteration(LimbRole::Custom, -20.0),
            ],
            main_sequence_begin: 3,
            finalize_sequence_begin: 3,
            is_looped: false,
        };

        g.update_y(100.0);

        assert_eq!(g.iterations[0].limbs[0].point.y, -100.0);
        assert_eq!(g.iterations[1].limbs[5].point.y, -(100.0 - LIMB_LIFT_HEIGHT_MM));
        assert_eq!(g.iterations[2].limbs[3].point.y, -20.0);

        // Horizontal coordinates are never touched
        assert_eq!(g.iterations[1].limbs[2].point.x, 100.0);
    }
}
