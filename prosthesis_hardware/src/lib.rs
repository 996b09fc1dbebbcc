//! Hardware back-ends for the actuation core.
//!
//! The default build only contains simulated parts: a PWM channel and driver
//! pins that record what the core wrote, a quadrature signal generator, and
//! `SimulatedHand`, a small plant model that turns PWM drive into encoder
//! edges. The `hardware` feature adds Raspberry Pi GPIO implementations.

pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;

use prosthesis_traits::{DriverPins, HwResult, PwmChannel};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};
use std::time::Duration;

/// Simulated PWM channel; remembers the last duty written.
#[derive(Debug, Default)]
pub struct SimulatedPwm {
    duty: AtomicU8,
    writes: AtomicU32,
}

impl SimulatedPwm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last duty written by the core.
    pub fn duty(&self) -> u8 {
        self.duty.load(Ordering::Acquire)
    }

    /// Number of duty writes observed.
    pub fn writes(&self) -> u32 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl PwmChannel for SimulatedPwm {
    fn set_duty(&self, duty: u8) -> HwResult<()> {
        self.duty.store(duty, Ordering::Release);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Output levels captured by `SimulatedDriverPins`.
#[derive(Debug)]
pub struct PinLevels {
    phase: AtomicBool,
    asleep: AtomicBool,
}

impl PinLevels {
    /// Direction-phase level (`true` = closing).
    pub fn phase(&self) -> bool {
        self.phase.load(Ordering::Acquire)
    }

    pub fn asleep(&self) -> bool {
        self.asleep.load(Ordering::Acquire)
    }
}

/// Simulated driver pins. The driver boots asleep, like the real part before
/// its sleep line is released.
#[derive(Debug, Clone)]
pub struct SimulatedDriverPins {
    levels: Arc<PinLevels>,
}

impl Default for SimulatedDriverPins {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDriverPins {
    pub fn new() -> Self {
        Self {
            levels: Arc::new(PinLevels {
                phase: AtomicBool::new(false),
                asleep: AtomicBool::new(true),
            }),
        }
    }

    /// Shared view of the output levels, usable after the pins are boxed.
    pub fn levels(&self) -> Arc<PinLevels> {
        self.levels.clone()
    }
}

impl DriverPins for SimulatedDriverPins {
    fn set_phase(&mut self, high: bool) -> HwResult<()> {
        self.levels.phase.store(high, Ordering::Release);
        Ok(())
    }

    fn set_sleep(&mut self, asleep: bool) -> HwResult<()> {
        self.levels.asleep.store(asleep, Ordering::Release);
        Ok(())
    }
}

/// Generates quadrature channel levels, one edge of channel A per step.
///
/// A step "up" leaves both channels at the same level, a step "down" leaves
/// them at opposite levels, which is what the edge decoder counts.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuadratureSim {
    a: bool,
    b: bool,
}

impl QuadratureSim {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current `(a, b)` levels without producing an edge.
    pub fn levels(&self) -> (bool, bool) {
        (self.a, self.b)
    }

    /// Toggle channel A and return the new `(a, b)` levels.
    pub fn step(&mut self, up: bool) -> (bool, bool) {
        self.a = !self.a;
        self.b = if up { self.a } else { !self.a };
        (self.a, self.b)
    }
}

/// Plant model of the hand: moves while PWM duty is non-zero, in the
/// direction of the phase output, and emits one encoder edge per step.
///
/// The plant keeps its own physical position in `[0, travel]`; an optional
/// obstacle (an object in the grip) stops closing motion at that position.
pub struct SimulatedHand {
    pwm: Arc<SimulatedPwm>,
    pins: Arc<PinLevels>,
    quad: QuadratureSim,
    physical: u16,
    travel: u16,
    full_speed_steps_per_s: f32,
    carry: f32,
    obstacle: Option<u16>,
}

impl SimulatedHand {
    pub fn new(
        pwm: Arc<SimulatedPwm>,
        pins: Arc<PinLevels>,
        travel: u16,
        full_speed_steps_per_s: f32,
    ) -> Self {
        Self {
            pwm,
            pins,
            quad: QuadratureSim::new(),
            physical: 0,
            travel,
            full_speed_steps_per_s,
            carry: 0.0,
            obstacle: None,
        }
    }

    /// Place an object in the grip; closing stops at `at`.
    pub fn set_obstacle(&mut self, at: Option<u16>) {
        self.obstacle = at;
    }

    pub fn physical_position(&self) -> u16 {
        self.physical
    }

    /// Advance the plant by `dt`, calling `on_edge(a, b)` for every step.
    /// Returns the number of edges produced.
    pub fn advance(&mut self, dt: Duration, mut on_edge: impl FnMut(bool, bool)) -> u32 {
        let duty = self.pwm.duty();
        if duty == 0 || self.pins.asleep() {
            self.carry = 0.0;
            return 0;
        }
        let closing = self.pins.phase();
        let rate = self.full_speed_steps_per_s * f32::from(duty) / 255.0;
        self.carry += rate * dt.as_secs_f32();
        let mut edges = 0;
        while self.carry >= 1.0 {
            // The edge handler may have cut the duty mid-advance.
            if self.pwm.duty() == 0 {
                self.carry = 0.0;
                break;
            }
            self.carry -= 1.0;
            let blocked = if closing {
                let limit = self.obstacle.unwrap_or(self.travel).min(self.travel);
                self.physical >= limit
            } else {
                self.physical == 0
            };
            if blocked {
                self.carry = 0.0;
                tracing::trace!(physical = self.physical, closing, "simulated hand blocked");
                break;
            }
            if closing {
                self.physical += 1;
            } else {
                self.physical -= 1;
            }
            let (a, b) = self.quad.step(closing);
            on_edge(a, b);
            edges += 1;
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_pwm_records_duty() {
        let pwm = SimulatedPwm::new();
        pwm.set_duty(204).unwrap();
        pwm.set_duty(0).unwrap();
        assert_eq!(pwm.duty(), 0);
        assert_eq!(pwm.writes(), 2);
    }

    #[test]
    fn driver_pins_boot_asleep_and_report_levels() {
        let mut pins = SimulatedDriverPins::new();
        let levels = pins.levels();
        assert!(levels.asleep());
        pins.set_sleep(false).unwrap();
        pins.set_phase(true).unwrap();
        assert!(!levels.asleep());
        assert!(levels.phase());
    }

    #[test]
    fn quadrature_up_matches_and_down_differs() {
        let mut q = QuadratureSim::new();
        let (a, b) = q.step(true);
        assert_eq!(a, b);
        let (a2, b2) = q.step(false);
        assert_ne!(a2, a);
        assert_ne!(a2, b2);
    }

    #[test]
    fn hand_moves_only_with_duty_and_stops_at_obstacle() {
        let pwm = Arc::new(SimulatedPwm::new());
        let mut pins = SimulatedDriverPins::new();
        let mut hand = SimulatedHand::new(pwm.clone(), pins.levels(), 100, 40.0);
        pins.set_sleep(false).unwrap();

        assert_eq!(hand.advance(Duration::from_millis(50), |_, _| {}), 0);

        pins.set_phase(true).unwrap();
        pwm.set_duty(255).unwrap();
        hand.set_obstacle(Some(30));
        let mut seen = 0;
        hand.advance(Duration::from_secs(1), |_, _| seen += 1);
        assert_eq!(hand.physical_position(), 30);
        assert_eq!(seen, 30);

        pins.set_phase(false).unwrap();
        hand.advance(Duration::from_millis(250), |_, _| {});
        assert_eq!(hand.physical_position(), 20);
    }
}
