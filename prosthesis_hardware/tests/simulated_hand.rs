use std::sync::Arc;
use std::time::Duration;

use prosthesis_hardware::{SimulatedDriverPins, SimulatedHand, SimulatedPwm};
use prosthesis_traits::{DriverPins, PwmChannel};
use rstest::rstest;

fn awake_hand(travel: u16) -> (SimulatedHand, Arc<SimulatedPwm>, SimulatedDriverPins) {
    let pwm = Arc::new(SimulatedPwm::new());
    let mut pins = SimulatedDriverPins::new();
    pins.set_sleep(false).unwrap();
    let hand = SimulatedHand::new(pwm.clone(), pins.levels(), travel, 1000.0);
    (hand, pwm, pins)
}

#[test]
fn edge_callback_cutting_duty_halts_the_plant() {
    let (mut hand, pwm, mut pins) = awake_hand(500);
    pins.set_phase(true).unwrap();
    pwm.set_duty(255).unwrap();
    let stop = pwm.clone();
    let mut edges = 0;
    hand.advance(Duration::from_millis(200), |_, _| {
        edges += 1;
        if edges == 12 {
            stop.set_duty(0).unwrap();
        }
    });
    assert_eq!(hand.physical_position(), 12);
}

#[test]
fn sleeping_driver_does_not_move() {
    let (mut hand, pwm, mut pins) = awake_hand(500);
    pins.set_phase(true).unwrap();
    pwm.set_duty(255).unwrap();
    pins.set_sleep(true).unwrap();
    assert_eq!(hand.advance(Duration::from_secs(1), |_, _| {}), 0);
}

#[rstest]
#[case(true, 100)]
#[case(false, 0)]
fn travel_is_bounded_by_the_mechanism(#[case] closing: bool, #[case] expected: u16) {
    let (mut hand, pwm, mut pins) = awake_hand(100);
    pins.set_phase(closing).unwrap();
    pwm.set_duty(255).unwrap();
    hand.advance(Duration::from_secs(1), |_, _| {});
    assert_eq!(hand.physical_position(), expected);
}
