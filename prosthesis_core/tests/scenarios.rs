//! End-to-end actuation against the simulated hand.

use std::sync::Arc;
use std::time::Duration;

use prosthesis_core::{
    Actuator, DriveIntent, FaultCause, Mode, MotorCommand, Phase, PositionTracker, SafetyEvent,
    SafetyReadings, TickReport, interpret,
};
use prosthesis_hardware::{SimulatedDriverPins, SimulatedHand, SimulatedPwm};
use prosthesis_traits::clock::test_clock::TestClock;
use rstest::rstest;

const TICK_MS: u64 = 10;

struct Rig {
    act: Actuator,
    hand: SimulatedHand,
    tracker: PositionTracker,
    pwm: Arc<SimulatedPwm>,
    clock: TestClock,
}

impl Rig {
    fn new() -> Self {
        let pwm = Arc::new(SimulatedPwm::new());
        let pins = SimulatedDriverPins::new();
        let clock = TestClock::new();
        let act = Actuator::builder()
            .with_pwm(pwm.clone())
            .with_pins(pins.clone())
            .with_clock(Arc::new(clock.clone()))
            .build()
            .expect("actuator build");
        let hand = SimulatedHand::new(pwm.clone(), pins.levels(), 4230, 4000.0);
        let tracker = act.tracker();
        Self {
            act,
            hand,
            tracker,
            pwm,
            clock,
        }
    }

    /// Tick once, then let the plant run for one tick period.
    fn step(&mut self) -> TickReport {
        let report = self.act.tick().expect("tick");
        self.clock.advance_ms(TICK_MS);
        let tracker = self.tracker.clone();
        self.hand
            .advance(Duration::from_millis(TICK_MS), |a, b| {
                tracker.on_edge(a, b);
            });
        report
    }

    /// Step until `done` holds for the latest report, at most `max_ticks`.
    fn step_until(&mut self, max_ticks: usize, done: impl Fn(&TickReport) -> bool) -> TickReport {
        for _ in 0..max_ticks {
            let r = self.step();
            if done(&r) {
                return r;
            }
        }
        panic!("condition not reached in {max_ticks} ticks");
    }

    /// Close in Normal mode against an object at `at`.
    fn grip_object_at(&mut self, at: u16) {
        self.hand.set_obstacle(Some(at));
        assert!(self.act.request_phase(Phase::Three));
        let tracker = self.tracker.clone();
        self.step_until(500, move |_| tracker.read_position() == at);
    }
}

#[test]
fn opening_from_mid_travel_stops_at_zero_from_the_edge_handler() {
    let mut rig = Rig::new();
    rig.grip_object_at(2000);
    assert_eq!(rig.tracker.read_position(), 2000);

    rig.hand.set_obstacle(None);
    assert!(rig.act.request_phase(Phase::Two));
    let r = rig.act.tick().expect("tick");
    assert_eq!(r.command, MotorCommand::Open);
    assert!(!r.arrived);
    assert_eq!(rig.pwm.duty(), 204);

    let tracker = rig.tracker.clone();
    let mut last = tracker.read_position();
    let edges = rig.hand.advance(Duration::from_secs(2), |a, b| {
        let p = tracker.on_edge(a, b);
        assert_eq!(p + 1, last);
        last = p;
    });
    assert_eq!(edges, 2000);
    assert_eq!(rig.tracker.read_position(), 0);
    let drive = rig.act.driver().drive_state();
    assert!(!drive.seeking);
    assert_eq!(drive.duty, 0);
    assert_eq!(rig.pwm.duty(), 0);

    let r = rig.act.tick().expect("tick");
    assert!(r.arrived);
    assert_eq!(r.position, 0);
}

#[test]
fn motor_calibration_terminal_phase_zeroes_and_returns_to_normal() {
    let mut rig = Rig::new();
    assert!(rig.act.request_mode(Mode::CalibrateMotors));
    let r = rig.step();
    assert_eq!(r.position, 2115);

    assert!(rig.act.request_phase(Phase::Three));
    let r = rig.step();
    assert_eq!(r.command, MotorCommand::Close);
    assert_eq!(r.duty, 127);
    assert_eq!(r.position, 2115);
    rig.step();
    assert_eq!(rig.act.tick().expect("tick").position, 2115);

    assert!(rig.act.request_phase(Phase::Four));
    let r = rig.act.tick().expect("tick");
    assert_eq!(r.position, 0);
    assert_eq!((r.mode, r.phase), (Mode::Normal, Phase::One));
    assert_eq!(r.duty, 0);
    assert_eq!(rig.act.last_report(), &r);
}

#[test]
fn held_grip_reports_pressure_once_per_window() {
    let mut rig = Rig::new();
    rig.grip_object_at(1500);

    let mut reports = Vec::new();
    let mut elapsed = 0u64;
    while elapsed < 6500 {
        let r = rig.step();
        assert_eq!(r.position, 1500);
        assert_eq!(r.command, MotorCommand::Close);
        if r.arrived {
            reports.push(elapsed);
        }
        elapsed += TICK_MS;
    }
    assert_eq!(reports.len(), 2, "reports at {reports:?}");
    let gap = reports[1] - reports[0];
    assert!((3000..=3000 + TICK_MS).contains(&gap), "gap {gap}");
}

#[test]
fn stall_outside_normal_mode_is_not_pressure() {
    let mut rig = Rig::new();
    rig.hand.set_obstacle(Some(100));
    assert!(rig.act.request_mode(Mode::CalibrateMotors));
    assert!(rig.act.request_phase(Phase::Three));
    for _ in 0..500 {
        assert!(!rig.step().arrived);
    }
}

#[test]
fn safety_open_ignores_upstream_close_requests() {
    assert_eq!(interpret(Mode::Safety, Phase::Two), DriveIntent::OPEN);

    let mut rig = Rig::new();
    rig.grip_object_at(1200);

    let pinch = SafetyReadings {
        force_n: 55.0,
        ..SafetyReadings::default()
    };
    assert_eq!(
        rig.act.supervise(&pinch),
        SafetyEvent::Entered(FaultCause::ExcessForce)
    );
    assert!(!rig.act.request_mode(Mode::Normal));
    assert!(!rig.act.request_phase(Phase::Three));

    let r = rig.step();
    assert_eq!((r.mode, r.phase), (Mode::Safety, Phase::Two));
    assert_eq!(r.command, MotorCommand::Open);
    assert_eq!(r.fault, FaultCause::ExcessForce);
    rig.step();
    assert!(rig.tracker.read_position() < 1200);

    assert_eq!(
        rig.act.supervise(&SafetyReadings::default()),
        SafetyEvent::Resolved(FaultCause::ExcessForce)
    );
    let r = rig.step();
    assert_eq!((r.mode, r.phase, r.command), (Mode::Normal, Phase::One, MotorCommand::Hold));
    assert!(rig.act.request_phase(Phase::Three));
}

#[rstest]
#[case(SafetyReadings { current_a: 4.0, ..SafetyReadings::default() }, FaultCause::OverCurrent)]
#[case(SafetyReadings { sensor_alive: false, ..SafetyReadings::default() }, FaultCause::SensorLoss)]
fn halting_faults_stop_the_motor_on_next_tick(
    #[case] readings: SafetyReadings,
    #[case] cause: FaultCause,
) {
    let mut rig = Rig::new();
    assert!(rig.act.request_phase(Phase::Three));
    rig.step();
    assert!(rig.pwm.duty() > 0);

    assert_eq!(rig.act.supervise(&readings), SafetyEvent::Entered(cause));
    let r = rig.step();
    assert_eq!((r.mode, r.phase), (Mode::Safety, Phase::One));
    assert_eq!(r.command, MotorCommand::Hold);
    assert_eq!(rig.pwm.duty(), 0);
}
