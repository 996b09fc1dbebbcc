use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Sender, unbounded};
use prosthesis_core::{FaultCause, Mode, MotorCommand, Phase, SafetyReadings};
use prosthesis_hardware::{SimulatedDriverPins, SimulatedPwm};
use prosthesis_runtime::requests::Request;
use prosthesis_runtime::runner::Runner;
use prosthesis_traits::clock::test_clock::TestClock;
use rstest::rstest;

fn config() -> prosthesis_config::Config {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../etc/prosthesis.toml");
    prosthesis_config::load_file(&path).expect("sample config loads")
}

type Harness = (Runner, Sender<Request>, Arc<SimulatedPwm>, Arc<AtomicBool>);

fn runner() -> Harness {
    runner_with(&config())
}

fn runner_with(cfg: &prosthesis_config::Config) -> Harness {
    let pwm = Arc::new(SimulatedPwm::new());
    let clock = Arc::new(TestClock::new());
    let actuator = prosthesis_core::build_actuator(
        cfg,
        pwm.clone(),
        SimulatedDriverPins::new(),
        clock.clone(),
    )
    .expect("build");
    let (tx, rx) = unbounded();
    let running = Arc::new(AtomicBool::new(true));
    let r = Runner::new(actuator, rx, clock, &cfg.runtime, running.clone());
    (r, tx, pwm, running)
}

#[test]
fn sample_config_maps_to_a_10ms_tick() {
    let (r, ..) = runner();
    assert_eq!(r.period(), Duration::from_millis(10));
}

#[test]
fn requests_are_applied_before_the_tick() {
    let (mut r, tx, pwm, _) = runner();
    tx.send(Request::Phase(Phase::Three)).unwrap();
    let report = r.step().expect("tick");
    assert_eq!(report.command, MotorCommand::Close);
    assert_eq!(pwm.duty(), 204);
}

#[rstest]
#[case(Request::Mode(Mode::Normal))]
#[case(Request::Phase(Phase::Three))]
fn requests_bounce_while_fault_latched(#[case] req: Request) {
    let (mut r, tx, pwm, _) = runner();
    let hot = SafetyReadings {
        temperature_c: 90.0,
        ..SafetyReadings::default()
    };
    tx.send(Request::Readings(hot)).unwrap();
    tx.send(req).unwrap();
    let report = r.step().expect("tick");
    assert_eq!(report.mode, Mode::Safety);
    assert_eq!(report.fault, FaultCause::OverTemperature);
    assert_eq!(report.command, MotorCommand::Hold);
    assert_eq!(pwm.duty(), 0);
}

#[test]
fn shutdown_request_ends_run_and_stops_motor() {
    let (mut r, tx, pwm, running) = runner();
    tx.send(Request::Phase(Phase::Three)).unwrap();
    tx.send(Request::Shutdown).unwrap();
    let ticks = r.run().expect("run");
    assert_eq!(ticks, 1);
    assert!(!running.load(Ordering::Relaxed));
    assert_eq!(pwm.duty(), 0);
    assert_eq!(r.actuator().last_report().command, MotorCommand::Close);
}

#[test]
fn sleep_request_parks_the_driver() {
    let (mut r, tx, pwm, _) = runner();
    tx.send(Request::Sleep(true)).unwrap();
    r.step().expect("tick");
    assert!(r.actuator().driver().drive_state().sleeping);

    tx.send(Request::Phase(Phase::Three)).unwrap();
    let report = r.step().expect("tick");
    assert_eq!(report.command, MotorCommand::Close);
    assert_eq!(report.duty, 0);
    assert_eq!(pwm.duty(), 0);
    assert!(!r.actuator().driver().drive_state().seeking);
}

#[test]
fn config_file_on_disk_drives_rate_and_speed() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(
        file,
        r#"
[pins]
encoder_a = 5
encoder_b = 6
motor_pwm = 12
motor_phase = 13
motor_sleep = 19

[motor]
speed_pct = 50

[runtime]
tick_hz = 50
"#
    )
    .expect("write config");
    let cfg = prosthesis_config::load_file(file.path()).expect("load temp config");

    let (mut r, tx, pwm, _) = runner_with(&cfg);
    assert_eq!(r.period(), Duration::from_millis(20));
    tx.send(Request::Phase(Phase::Three)).unwrap();
    r.step().expect("tick");
    assert_eq!(pwm.duty(), 127);
}
