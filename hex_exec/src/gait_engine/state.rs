//! Implementations for the GaitEngine state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;

// Internal
use super::{GaitEngineError, GaitTables, Params, SequenceStage};
use crate::{
    kinematics::JointAngles,
    geometry::NUM_LEGS,
    limbs_driver::{self, LimbsDriver},
    servo_ctrl::Actuation,
};
use comms_if::tc::GaitId;
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gait engine module state
pub struct GaitEngine<A> {
    params: Params,

    state: EngineState,

    tables: GaitTables,

    /// Gait being played, `None` while idle
    current: GaitId,

    /// Gait requested to be played after the current one
    next: GaitId,

    /// Index of the iteration being played in the current gait
    iteration: usize,

    stage: SequenceStage,

    posture: Posture,

    /// Units: millimeters
    height_mm: f64,

    limbs: LimbsDriver<A>,

    report: StatusReport,
}

/// Initialisation data of the engine and the limbs driver it owns.
#[derive(Debug, Clone)]
pub struct InitData {
    pub engine: Params,
    pub limbs: limbs_driver::Params,
}

/// Input data to the gait engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Monotonic time of this cycle.
    ///
    /// Units: milliseconds
    pub now_ms: u64,

    /// If true the engine does not advance this cycle.
    pub engine_disabled: bool,

    /// If true the limbs driver does not advance this cycle.
    pub limbs_disabled: bool,
}

/// Output of the gait engine, the current angles of each leg.
pub type OutputData = [JointAngles; NUM_LEGS];

/// Status report for gait engine processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusReport {
    pub state: EngineState,
    pub gait: GaitId,
    pub stage: SequenceStage,
    pub iteration: usize,
    pub posture: Posture,

    /// Units: millimeters
    pub height_mm: f64,

    /// True if the engine reached an impossible state this cycle
    pub selfdiag: bool,

    pub limbs: limbs_driver::StatusReport,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// States of the gait engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineState {
    NoInit,
    Idle,
    ChangeSequence,
    Move,
    Wait,
    NextIteration,
}

/// Resting posture of the hexapod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Posture {
    /// Body on the ground.
    Down,

    /// Body raised, standing on the legs.
    Up,
}

impl Default for EngineState {
    fn default() -> Self {
        EngineState::NoInit
    }
}

impl Default for Posture {
    fn default() -> Self {
        Posture::Down
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<A: Actuation> GaitEngine<A> {
    /// Create a new uninitialised engine driving the given actuation.
    pub fn new(actuation: A) -> Self {
        Self {
            params: Params::default(),
            state: EngineState::NoInit,
            tables: GaitTables::standard(),
            current: GaitId::None,
            next: GaitId::None,
            iteration: 0,
            stage: SequenceStage::Prepare,
            posture: Posture::Down,
            height_mm: 0.0,
            limbs: LimbsDriver::new(actuation),
            report: StatusReport::default(),
        }
    }

    /// Request a gait.
    ///
    /// If the engine is idle the gait starts on the next cycle, otherwise it
    /// starts once the current gait has played its finalize stage. `None` stops
    /// the current gait at that same boundary.
    pub fn select_sequence(&mut self, gait: GaitId) -> Result<(), GaitEngineError> {
        if self.state == EngineState::NoInit {
            return Err(GaitEngineError::NotInitialised);
        }

        if !gait.is_none() {
            if self.tables.get(gait).is_none() {
                return Err(GaitEngineError::UnknownGait(gait));
            }
            if !self.is_available(gait) {
                return Err(GaitEngineError::NotAvailable {
                    gait,
                    posture: self.posture,
                });
            }
        }

        if gait != self.next {
            info!("Gait {} requested (playing {})", gait, self.current);
        }
        self.next = gait;

        Ok(())
    }

    /// Set the body height, only allowed while idle.
    pub fn set_height(&mut self, height_mm: f64) -> Result<(), GaitEngineError> {
        match self.state {
            EngineState::NoInit => return Err(GaitEngineError::NotInitialised),
            EngineState::Idle => (),
            s => return Err(GaitEngineError::NotIdle(s)),
        }

        let low_mm = self.params.height_low_mm;
        let high_mm = self.params.height_high_mm;
        if !(height_mm >= low_mm && height_mm <= high_mm) {
            return Err(GaitEngineError::HeightOutOfEnvelope {
                height_mm,
                low_mm,
                high_mm,
            });
        }

        self.height_mm = height_mm;
        self.tables.update_y(height_mm);
        info!("Body height set to {} mm", height_mm);

        Ok(())
    }

    pub fn increase_height(&mut self) -> Result<(), GaitEngineError> {
        self.set_height(self.height_mm + self.params.height_step_mm)
    }

    pub fn decrease_height(&mut self) -> Result<(), GaitEngineError> {
        self.set_height(self.height_mm - self.params.height_step_mm)
    }

    /// True if no gait is being played.
    pub fn is_idle(&self) -> bool {
        self.state == EngineState::Idle
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn posture(&self) -> Posture {
        self.posture
    }

    /// Units: millimeters
    pub fn height_mm(&self) -> f64 {
        self.height_mm
    }

    pub fn current_gait(&self) -> GaitId {
        self.current
    }

    pub fn next_gait(&self) -> GaitId {
        self.next
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn stage(&self) -> SequenceStage {
        self.stage
    }

    pub fn tables(&self) -> &GaitTables {
        &self.tables
    }

    pub fn limbs(&self) -> &LimbsDriver<A> {
        &self.limbs
    }

    /// Gaits other than `Up` need the body raised, `Up` needs it lowered.
    fn is_available(&self, gait: GaitId) -> bool {
        match gait {
            GaitId::None => true,
            GaitId::Up => self.posture == Posture::Down,
            _ => self.posture == Posture::Up,
        }
    }

    /// Advance the state machine by one state.
    fn step(&mut self) {
        match self.state {
            EngineState::NoInit => (),
            EngineState::Idle => {
                if self.next != self.current {
                    self.state = EngineState::ChangeSequence;
                }
            },
            EngineState::ChangeSequence => self.change_sequence(),
            EngineState::Move => self.start_iteration(),
            EngineState::Wait => {
                if self.limbs.is_move_complete() {
                    self.state = EngineState::NextIteration;
                }
            },
            EngineState::NextIteration => self.next_iteration(),
        }
    }

    fn change_sequence(&mut self) {
        // The posture may have changed since the request was accepted
        if !self.is_available(self.next) {
            warn!(
                "Gait {} dropped, not available in the {:?} posture",
                self.next,
                self.posture
            );
            self.next = GaitId::None;
        }

        self.current = self.next;
        self.iteration = 0;
        self.stage = SequenceStage::Prepare;

        if self.current.is_none() {
            info!("Gait engine idle");
            self.state = EngineState::Idle;
            return;
        }

        if self.tables.get(self.current).is_none() {
            self.selfdiag("no table for the requested gait");
            return;
        }

        info!("Starting gait {}", self.current);
        self.state = EngineState::Move;
    }

    fn start_iteration(&mut self) {
        let (points, paths, smooth_point_count) = match self
            .tables
            .get(self.current)
            .and_then(|g| g.iterations.get(self.iteration))
        {
            Some(i) => (i.points(), i.paths(), i.smooth_point_count),
            None => {
                self.selfdiag("iteration outside the gait table");
                return;
            }
        };

        debug!(
            "{} iteration {} ({:?}), {} steps",
            self.current,
            self.iteration,
            self.stage,
            smooth_point_count
        );

        self.limbs.set_smooth_config(smooth_point_count);
        match self.limbs.start_move(&points, &paths) {
            Ok(()) => self.state = EngineState::Wait,
            Err(_) => self.selfdiag("limbs driver refused the move"),
        }
    }

    fn next_iteration(&mut self) {
        let (main_begin, finalize_begin, total, is_looped) = match self.tables.get(self.current) {
            Some(g) => (
                g.main_sequence_begin,
                g.finalize_sequence_begin,
                g.total_iteration_count(),
                g.is_looped,
            ),
            None => {
                self.selfdiag("no table for the current gait");
                return;
            }
        };

        self.iteration += 1;

        if self.stage == SequenceStage::Prepare && self.iteration >= main_begin {
            debug!("{} entering main stage", self.current);
            self.stage = SequenceStage::Main;
        }

        if self.stage == SequenceStage::Main && self.iteration >= finalize_begin {
            if self.next != self.current {
                debug!("{} finalizing before {}", self.current, self.next);
                self.stage = SequenceStage::Finalize;
                self.iteration = finalize_begin;
            }
            else if is_looped {
                self.iteration = main_begin;
            }
            else {
                self.finish_gait();
                return;
            }
        }

        if self.stage == SequenceStage::Finalize && self.iteration >= total {
            self.finish_gait();
            return;
        }

        if self.iteration >= total {
            self.selfdiag("iteration index past the end of the gait");
            return;
        }

        self.state = EngineState::Move;
    }

    /// The current gait has been played to its end.
    fn finish_gait(&mut self) {
        match self.current {
            GaitId::Up => self.posture = Posture::Up,
            GaitId::Down => self.posture = Posture::Down,
            _ => (),
        }

        info!("Gait {} complete, posture {:?}", self.current, self.posture);

        if self.next == self.current {
            self.next = GaitId::None;
        }
        self.state = EngineState::ChangeSequence;
    }

    /// Abandon the current gait after reaching an impossible state.
    fn selfdiag(&mut self, reason: &str) {
        warn!(
            "Gait engine selfdiag: {} ({} iteration {})",
            reason,
            self.current,
            self.iteration
        );
        self.report.selfdiag = true;
        self.current = GaitId::None;
        self.next = GaitId::None;
        self.state = EngineState::Idle;
    }
}

impl<A: Actuation> State for GaitEngine<A> {
    type InitData = InitData;
    type InitError = GaitEngineError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = GaitEngineError;

    /// Initialise the engine and its limbs driver.
    ///
    /// The body starts on the ground at the low height, with the `Down` gait
    /// requested so that the legs settle into the rest pose.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        init_data.engine.validate()?;
        self.tables.validate()?;

        self.limbs.init(init_data.limbs)?;

        self.params = init_data.engine;
        self.height_mm = self.params.height_low_mm;
        self.tables.update_y(self.height_mm);

        self.posture = Posture::Down;
        self.current = GaitId::None;
        self.next = GaitId::Down;
        self.iteration = 0;
        self.stage = SequenceStage::Prepare;
        self.state = EngineState::Idle;

        Ok(())
    }

    /// Perform cyclic processing of the gait engine and its limbs driver.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        if self.state == EngineState::NoInit {
            return Err(GaitEngineError::NotInitialised);
        }

        // Clear the status report
        self.report = StatusReport::default();

        if !input_data.engine_disabled {
            self.step();
        }

        let (angles, limbs_report) = self.limbs.proc(&limbs_driver::InputData {
            now_ms: input_data.now_ms,
            disabled: input_data.limbs_disabled,
        })?;

        // A lowered body always sits at the low height
        if self.posture == Posture::Down && self.height_mm != self.params.height_low_mm {
            debug!("Body down, height reset to {} mm", self.params.height_low_mm);
            self.height_mm = self.params.height_low_mm;
            self.tables.update_y(self.height_mm);
        }

        self.report.state = self.state;
        self.report.gait = self.current;
        self.report.stage = self.stage;
        self.report.iteration = self.iteration;
        self.report.posture = self.posture;
        self.report.height_mm = self.height_mm;
        self.report.limbs = limbs_report;

        Ok((angles, self.report))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        geometry::Leg,
        limbs_driver::test_params,
        servo_ctrl::SimServos,
        gait_engine::{rest_point, LimbRole},
    };

    const CYCLE_MS: u64 = 10;

    /// Engine with a deterministic clock advanced by each tick.
    struct Harness {
        engine: GaitEngine<SimServos>,
        now_ms: u64,
    }

    impl Harness {
        fn new() -> Self {
            let mut engine = GaitEngine::new(SimServos::new());
            engine.init(InitData {
                engine: engine_params(),
                limbs: test_params(),
            })
            .unwrap();

            Self { engine, now_ms: 0 }
        }

        fn tick(&mut self) -> StatusReport {
            self.now_ms += CYCLE_MS;
            let (_, report) = self.engine.proc(&InputData {
                now_ms: self.now_ms,
                ..Default::default()
            })
            .unwrap();
            report
        }

        /// Tick until the engine has nothing left to play.
        fn run_to_idle(&mut self) -> Vec<StatusReport> {
            let mut reports = Vec::new();
            for _ in 0..100_000 {
                let report = self.tick();
                reports.push(report);
                if self.engine.is_idle() && self.engine.next_gait() == self.engine.current_gait() {
                    return reports;
                }
            }
            panic!("Engine never became idle");
        }
    }

    fn engine_params() -> Params {
        Params {
            height_low_mm: 85.0,
            height_high_mm: 120.0,
            height_step_mm: 5.0,
        }
    }

    /// Iterations started during the given reports, seen as entries into
    /// the `Wait` state.
    fn started(reports: &[StatusReport]) -> Vec<(GaitId, usize, SequenceStage)> {
        let mut iterations = Vec::new();
        let mut prev_state = EngineState::NoInit;

        for r in reports.iter() {
            if r.state == EngineState::Wait && prev_state != EngineState::Wait {
                iterations.push((r.gait, r.iteration, r.stage));
            }
            prev_state = r.state;
        }

        iterations
    }

    fn stand_up(h: &mut Harness) {
        h.run_to_idle();
        h.engine.select_sequence(GaitId::Up).unwrap();
        h.run_to_idle();
        assert_eq!(h.engine.posture(), Posture::Up);
    }

    #[test]
    fn test_uninitialised() {
        let mut engine = GaitEngine::new(SimServos::new());

        assert!(matches!(
            engine.proc(&InputData::default()),
            Err(GaitEngineError::NotInitialised)
        ));
        assert!(matches!(
            engine.select_sequence(GaitId::Up),
            Err(GaitEngineError::NotInitialised)
        ));
        assert!(matches!(engine.set_height(100.0), Err(GaitEngineError::NotInitialised)));
    }

    #[test]
    fn test_invalid_params() {
        let mut engine = GaitEngine::new(SimServos::new());
        let mut params = engine_params();
        params.height_low_mm = 130.0;

        assert!(matches!(
            engine.init(InitData { engine: params, limbs: test_params() }),
            Err(GaitEngineError::InvalidParams(_))
        ));
        assert_eq!(engine.state(), EngineState::NoInit);
    }

    #[test]
    fn test_startup_plays_down() {
        let mut h = Harness::new();

        assert_eq!(h.engine.next_gait(), GaitId::Down);
        assert_eq!(h.engine.posture(), Posture::Down);
        assert_eq!(h.engine.height_mm(), 85.0);

        let reports = h.run_to_idle();

        assert_eq!(started(&reports), vec![(GaitId::Down, 0, SequenceStage::Prepare)]);
        assert_eq!(h.engine.current_gait(), GaitId::None);
        assert_eq!(h.engine.posture(), Posture::Down);

        for leg in Leg::ALL.iter() {
            assert_eq!(h.engine.limbs().leg(*leg).position_mm, rest_point(*leg));
        }
    }

    #[test]
    fn test_up_then_down() {
        let mut h = Harness::new();
        h.run_to_idle();

        h.engine.select_sequence(GaitId::Up).unwrap();
        let reports = h.run_to_idle();

        let iterations: Vec<usize> = started(&reports)
            .iter()
            .map(|(g, i, _)| {
                assert_eq!(*g, GaitId::Up);
                *i
            })
            .collect();
        assert_eq!(iterations, vec![0, 1, 2, 3, 4]);
        assert!(h.engine.is_idle());
        assert_eq!(h.engine.posture(), Posture::Up);

        // Feet end in the standing stance at the body height
        let last = &h.engine.tables().get(GaitId::Up).unwrap().iterations[4];
        assert_eq!(h.engine.limbs().positions(), last.points());
        for p in h.engine.limbs().positions().iter() {
            assert_eq!(p.y, -85.0);
        }

        // Down starts straight away from idle
        h.engine.select_sequence(GaitId::Down).unwrap();
        h.tick();
        assert_eq!(h.engine.state(), EngineState::ChangeSequence);
        h.tick();
        assert_eq!(h.engine.current_gait(), GaitId::Down);
        assert_eq!(h.engine.state(), EngineState::Move);

        let reports = h.run_to_idle();
        assert_eq!(started(&reports), vec![(GaitId::Down, 0, SequenceStage::Prepare)]);
        assert_eq!(h.engine.posture(), Posture::Down);
    }

    #[test]
    fn test_deferred_transition() {
        let mut h = Harness::new();
        stand_up(&mut h);

        h.engine.select_sequence(GaitId::DirectMovement).unwrap();

        // Play until the second main iteration starts
        let mut reports = Vec::new();
        loop {
            let r = h.tick();
            reports.push(r);
            if r.state == EngineState::Wait && r.gait == GaitId::DirectMovement && r.iteration == 5 {
                break;
            }
        }
        assert_eq!(
            started(&reports).iter().map(|s| s.1).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4, 5]
        );

        h.engine.select_sequence(GaitId::RotateLeft).unwrap();
        assert_eq!(h.engine.current_gait(), GaitId::DirectMovement);

        // Iteration 5 is still in flight and plays out before the finalize stage
        let mut reports = Vec::new();
        loop {
            let r = h.tick();
            reports.push(r);
            if r.state == EngineState::Wait && r.gait == GaitId::RotateLeft {
                break;
            }
        }

        assert_eq!(
            started(&reports),
            vec![
                (GaitId::DirectMovement, 5, SequenceStage::Main),
                (GaitId::DirectMovement, 6, SequenceStage::Finalize),
                (GaitId::DirectMovement, 7, SequenceStage::Finalize),
                (GaitId::DirectMovement, 8, SequenceStage::Finalize),
                (GaitId::DirectMovement, 9, SequenceStage::Finalize),
                (GaitId::RotateLeft, 0, SequenceStage::Prepare),
            ]
        );
    }

    #[test]
    fn test_looping_and_stop() {
        let mut h = Harness::new();
        stand_up(&mut h);

        h.engine.select_sequence(GaitId::Dance).unwrap();

        // Two full passes of the main stage
        let mut reports = Vec::new();
        while started(&reports).len() < 9 {
            reports.push(h.tick());
        }
        assert_eq!(
            started(&reports).iter().map(|s| s.1).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4, 1, 2, 3, 4]
        );

        h.engine.select_sequence(GaitId::None).unwrap();
        let reports = h.run_to_idle();

        assert_eq!(
            started(&reports).last(),
            Some(&(GaitId::Dance, 5, SequenceStage::Finalize))
        );
        assert_eq!(h.engine.current_gait(), GaitId::None);
        assert_eq!(h.engine.posture(), Posture::Up);
    }

    #[test]
    fn test_posture_gating() {
        let mut h = Harness::new();
        h.run_to_idle();

        assert!(matches!(
            h.engine.select_sequence(GaitId::DirectMovement),
            Err(GaitEngineError::NotAvailable { posture: Posture::Down, .. })
        ));
        assert!(matches!(
            h.engine.select_sequence(GaitId::Down),
            Err(GaitEngineError::NotAvailable { .. })
        ));
        assert!(h.engine.select_sequence(GaitId::None).is_ok());

        h.engine.select_sequence(GaitId::Up).unwrap();
        h.run_to_idle();

        assert!(matches!(
            h.engine.select_sequence(GaitId::Up),
            Err(GaitEngineError::NotAvailable { posture: Posture::Up, .. })
        ));
        assert!(h.engine.select_sequence(GaitId::AttackRight).is_ok());
    }

    #[test]
    fn test_height_changes() {
        let mut h = Harness::new();
        stand_up(&mut h);

        let before = h.engine.tables().clone();

        h.engine.increase_height().unwrap();
        assert_eq!(h.engine.height_mm(), 90.0);
        assert_ne!(h.engine.tables(), &before);

        h.engine.decrease_height().unwrap();
        assert_eq!(h.engine.tables(), &before);

        // Only Down and Up targets follow the height
        h.engine.set_height(120.0).unwrap();
        for (_, gait) in h.engine.tables().iter() {
            for iteration in gait.iterations.iter() {
                for limb in iteration.limbs.iter() {
                    match limb.role {
                        LimbRole::Down => assert_eq!(limb.point.y, -120.0),
                        LimbRole::Up => assert_eq!(limb.point.y, -90.0),
                        LimbRole::Custom => assert!(limb.point.y >= -20.0),
                    }
                }
            }
        }

        // Rejected changes leave everything untouched
        let at_high = h.engine.tables().clone();
        assert!(matches!(
            h.engine.increase_height(),
            Err(GaitEngineError::HeightOutOfEnvelope { .. })
        ));
        assert!(matches!(
            h.engine.set_height(84.0),
            Err(GaitEngineError::HeightOutOfEnvelope { .. })
        ));
        assert!(h.engine.set_height(std::f64::NAN).is_err());
        assert_eq!(h.engine.height_mm(), 120.0);
        assert_eq!(h.engine.tables(), &at_high);
    }

    #[test]
    fn test_height_only_when_idle() {
        let mut h = Harness::new();
        stand_up(&mut h);

        h.engine.select_sequence(GaitId::UpdateHeight).unwrap();
        h.tick();
        h.tick();

        assert!(matches!(
            h.engine.set_height(100.0),
            Err(GaitEngineError::NotIdle(EngineState::Move))
        ));

        h.run_to_idle();
        assert!(h.engine.set_height(100.0).is_ok());
    }

    #[test]
    fn test_update_height_moves_body() {
        let mut h = Harness::new();
        stand_up(&mut h);

        h.engine.set_height(110.0).unwrap();
        h.engine.select_sequence(GaitId::UpdateHeight).unwrap();
        h.run_to_idle();

        for p in h.engine.limbs().positions().iter() {
            assert_eq!(p.y, -110.0);
        }
        assert_eq!(h.engine.posture(), Posture::Up);
    }

    #[test]
    fn test_height_reset_while_down() {
        let mut h = Harness::new();
        h.run_to_idle();

        h.engine.set_height(100.0).unwrap();
        assert_eq!(h.engine.height_mm(), 100.0);

        let report = h.tick();
        assert_eq!(report.height_mm, 85.0);
        assert_eq!(h.engine.height_mm(), 85.0);

        let update = h.engine.tables().get(GaitId::UpdateHeight).unwrap();
        assert_eq!(update.iterations[0].limbs[0].point.y, -85.0);
    }

    #[test]
    fn test_engine_disabled() {
        let mut h = Harness::new();

        for _ in 0..10 {
            h.now_ms += CYCLE_MS;
            let (_, report) = h.engine.proc(&InputData {
                now_ms: h.now_ms,
                engine_disabled: true,
                limbs_disabled: false,
            })
            .unwrap();
            assert_eq!(report.state, EngineState::Idle);
        }

        assert_eq!(h.engine.next_gait(), GaitId::Down);
        assert_eq!(h.engine.current_gait(), GaitId::None);
    }
}
