//! Implementations for the LimbsDriver state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use serde::Serialize;

// Internal
use super::{LimbsDriverError, Params, DEFAULT_SMOOTH_POINT_COUNT};
use crate::{
    geometry::{Joint, Leg, Point3, NUM_LEGS},
    kinematics::{self, IkError, JointAngles},
    path::{self, PathShape, T_MAX},
    servo_ctrl::Actuation,
};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Limbs driver module state
pub struct LimbsDriver<A> {
    params: Params,

    state: DriverState,

    legs: [LegRuntimeState; NUM_LEGS],

    /// Last successfully solved angles of each leg
    angles: [JointAngles; NUM_LEGS],

    /// Step count given to the legs by the next `start_move`
    smooth_point_count: u32,

    /// Time at which the last step was committed
    ///
    /// Units: milliseconds
    commit_time_ms: u64,

    actuation: A,

    report: StatusReport,
}

/// Live state of one leg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LegRuntimeState {
    /// Current position of the foot
    pub position_mm: Point3,

    /// Path being followed, if any
    pub path: Option<ActivePath>,

    /// Step count of the current path
    pub total_steps: u32,

    /// Steps of the current path still to be taken
    pub remaining_steps: u32,
}

/// A path followed by a foot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActivePath {
    pub shape: PathShape,
    pub start_mm: Point3,
    pub destination_mm: Point3,
}

/// Input data to the limbs driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Monotonic time of this cycle.
    ///
    /// Units: milliseconds
    pub now_ms: u64,

    /// If true the driver does not process this cycle.
    pub disabled: bool,
}

/// Output of the limbs driver, the current angles of each leg.
pub type OutputData = [JointAngles; NUM_LEGS];

/// Status report for limbs driver processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusReport {
    /// State the driver ended the cycle in
    pub state: DriverState,

    /// Legs whose angles could not be solved this cycle
    pub leg_faults: [Option<IkError>; NUM_LEGS],

    /// True if a step was committed to the servos this cycle
    pub step_committed: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// States of the limbs driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriverState {
    NoInit,
    Idle,
    Calculating,
    Loading,
    Waiting,
}

impl Default for DriverState {
    fn default() -> Self {
        DriverState::NoInit
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<A: Actuation> LimbsDriver<A> {
    /// Create a new uninitialised driver commanding the given servos.
    pub fn new(actuation: A) -> Self {
        Self {
            params: Params::default(),
            state: DriverState::NoInit,
            legs: [LegRuntimeState::default(); NUM_LEGS],
            angles: [JointAngles::default(); NUM_LEGS],
            smooth_point_count: DEFAULT_SMOOTH_POINT_COUNT,
            commit_time_ms: 0,
            actuation,
            report: StatusReport::default(),
        }
    }

    /// Set the number of interpolation steps used by the next `start_move`.
    ///
    /// A count of zero is raised to one step.
    pub fn set_smooth_config(&mut self, smooth_point_count: u32) {
        if smooth_point_count == 0 {
            warn!("Smooth point count of 0 requested, using 1");
        }
        self.smooth_point_count = smooth_point_count.max(1);
    }

    /// Start moving every foot towards its target.
    ///
    /// Legs already at their target are left alone. If no leg has to move the
    /// move is immediately complete.
    pub fn start_move(
        &mut self,
        points: &[Point3; NUM_LEGS],
        paths: &[PathShape; NUM_LEGS],
    ) -> Result<(), LimbsDriverError> {
        if self.state == DriverState::NoInit {
            return Err(LimbsDriverError::NotInitialised);
        }

        let mut num_moving = 0;

        for (i, leg) in self.legs.iter_mut().enumerate() {
            if points[i] == leg.position_mm {
                continue;
            }

            leg.path = Some(ActivePath {
                shape: paths[i],
                start_mm: leg.position_mm,
                destination_mm: points[i],
            });
            leg.total_steps = self.smooth_point_count;
            leg.remaining_steps = self.smooth_point_count;
            num_moving += 1;
        }

        debug!(
            "Move started for {} legs in {} steps",
            num_moving,
            self.smooth_point_count
        );

        if num_moving > 0 {
            self.state = DriverState::Calculating;
        }

        Ok(())
    }

    /// True when every leg has reached its target.
    pub fn is_move_complete(&self) -> bool {
        self.state == DriverState::Idle
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn leg(&self, leg: Leg) -> &LegRuntimeState {
        &self.legs[leg.index()]
    }

    pub fn positions(&self) -> [Point3; NUM_LEGS] {
        let mut positions = [Point3::default(); NUM_LEGS];
        for (p, leg) in positions.iter_mut().zip(self.legs.iter()) {
            *p = leg.position_mm;
        }
        positions
    }

    pub fn angles(&self) -> &[JointAngles; NUM_LEGS] {
        &self.angles
    }

    pub fn actuation(&self) -> &A {
        &self.actuation
    }

    pub fn actuation_mut(&mut self) -> &mut A {
        &mut self.actuation
    }

    /// Advance every moving leg by one step and solve its angles.
    fn calculate_step(&mut self) {
        for leg_id in Leg::ALL.iter() {
            let i = leg_id.index();
            let leg = &mut self.legs[i];

            let path = match leg.path {
                Some(p) if leg.remaining_steps > 0 => p,
                _ => continue,
            };

            leg.remaining_steps -= 1;

            // The last step lands exactly on the destination
            let point = if leg.remaining_steps == 0 {
                leg.path = None;
                path.destination_mm
            }
            else {
                let done = (leg.total_steps - leg.remaining_steps) as f64;
                let t = T_MAX * done / leg.total_steps as f64;
                path::interpolate(&path.start_mm, &path.destination_mm, path.shape, t)
            };

            // An unreachable point leaves the foot where the servos hold it
            match kinematics::solve(&point, &self.params.legs[i].calibration) {
                Ok(a) => {
                    self.angles[i] = a;
                    leg.position_mm = point;
                },
                Err(e) => {
                    warn!("{} leg cannot reach {}: {}", leg_id, point, e);
                    self.report.leg_faults[i] = Some(e);
                }
            }
        }

        trace!("Step calculated: {:?}", self.positions());
    }

    /// Hand the angles of every leg to the servos and commit them.
    fn load_angles(&mut self) {
        for leg in Leg::ALL.iter() {
            let angles = self.angles[leg.index()];
            for joint in Joint::ALL.iter() {
                self.actuation.set_joint_angle(*leg, *joint, angles.get(*joint));
            }
        }
        self.actuation.commit_angles();
        self.report.step_committed = true;
    }

    fn any_remaining_steps(&self) -> bool {
        self.legs.iter().any(|l| l.remaining_steps > 0)
    }
}

impl<A: Actuation> State for LimbsDriver<A> {
    type InitData = Params;
    type InitError = LimbsDriverError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = LimbsDriverError;

    /// Initialise the driver with its calibration.
    ///
    /// Every leg is placed at its start position, which must be reachable, and
    /// the matching angles are committed to the servos.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        if init_data.step_delay_ms == 0 {
            return Err(LimbsDriverError::InvalidStepDelay);
        }

        for leg in Leg::ALL.iter() {
            let leg_params = &init_data.legs[leg.index()];

            leg_params
                .calibration
                .validate()
                .map_err(|e| LimbsDriverError::InvalidCalibration(*leg, e))?;

            self.angles[leg.index()] =
                kinematics::solve(&leg_params.start_position_mm, &leg_params.calibration)
                    .map_err(|e| LimbsDriverError::UnreachableStart(*leg, e))?;

            self.legs[leg.index()] = LegRuntimeState {
                position_mm: leg_params.start_position_mm,
                ..Default::default()
            };
        }

        self.params = init_data;
        self.load_angles();
        self.state = DriverState::Idle;

        Ok(())
    }

    /// Perform cyclic processing of the limbs driver.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        match self.state {
            DriverState::NoInit => return Err(LimbsDriverError::NotInitialised),
            _ if input_data.disabled => (),
            DriverState::Idle => (),
            DriverState::Calculating => {
                self.calculate_step();
                self.state = DriverState::Loading;
            },
            DriverState::Loading => {
                self.load_angles();
                self.commit_time_ms = input_data.now_ms;
                self.state = DriverState::Waiting;
            },
            DriverState::Waiting => {
                let elapsed_ms = input_data.now_ms.saturating_sub(self.commit_time_ms);

                if elapsed_ms >= self.params.step_delay_ms
                    && self.actuation.is_commit_complete()
                {
                    self.state = if self.any_remaining_steps() {
                        DriverState::Calculating
                    }
                    else {
                        DriverState::Idle
                    };
                }
            },
        }

        self.report.state = self.state;

        Ok((self.angles, self.report))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
