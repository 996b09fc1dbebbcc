//! Hardware selection: the simulated hand by default, Raspberry Pi GPIO with
//! the `hardware` feature.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread::JoinHandle;

use prosthesis_config::Config;
use prosthesis_core::Actuator;
use prosthesis_traits::Clock;

/// Whatever must stay alive for the encoder to keep feeding the tracker.
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub type KeepAlive = prosthesis_hardware::gpio::EncoderInterrupt;
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub type KeepAlive = ();

pub struct Wiring {
    pub actuator: Actuator,
    pub workers: Vec<JoinHandle<()>>,
    pub keep_alive: KeepAlive,
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub use sim::wire;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gpio::wire;

pub mod sim {
    use std::sync::atomic::Ordering;
    use std::thread;
    use std::time::Duration;

    use prosthesis_core::PositionTracker;
    use prosthesis_hardware::{SimulatedDriverPins, SimulatedHand, SimulatedPwm};
    use tracing::debug;

    use super::*;

    /// Full-duty speed of the simulated gearbox, in encoder steps per second.
    pub const FULL_SPEED_STEPS_PER_S: f32 = 4000.0;
    /// Plant integration step.
    pub const PLANT_STEP: Duration = Duration::from_millis(1);

    pub fn spawn_plant(
        mut hand: SimulatedHand,
        tracker: PositionTracker,
        clock: Arc<dyn Clock + Send + Sync>,
        running: Arc<AtomicBool>,
    ) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("sim-plant".into())
            .spawn(move || {
                while running.load(Ordering::Relaxed) {
                    hand.advance(PLANT_STEP, |a, b| {
                        tracker.on_edge(a, b);
                    });
                    clock.sleep(PLANT_STEP);
                }
                debug!(physical = hand.physical_position(), "simulated plant stopped");
            })
    }

    pub fn wire(
        cfg: &Config,
        clock: Arc<dyn Clock + Send + Sync>,
        running: Arc<AtomicBool>,
    ) -> eyre::Result<Wiring> {
        let pwm = Arc::new(SimulatedPwm::new());
        let pins = SimulatedDriverPins::new();
        let levels = pins.levels();
        let actuator = prosthesis_core::build_actuator(cfg, pwm.clone(), pins, clock.clone())?;
        let travel = cfg.motor.max_position - cfg.motor.min_position;
        let hand = SimulatedHand::new(pwm, levels, travel, FULL_SPEED_STEPS_PER_S);
        let plant = spawn_plant(hand, actuator.tracker(), clock, running)?;
        Ok(Wiring {
            actuator,
            workers: vec![plant],
            keep_alive: (),
        })
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio {
    use eyre::WrapErr;
    use prosthesis_hardware::gpio::{GpioDriverPins, GpioPwm, attach_encoder};
    use tracing::info;

    use super::*;

    pub fn wire(
        cfg: &Config,
        clock: Arc<dyn Clock + Send + Sync>,
        _running: Arc<AtomicBool>,
    ) -> eyre::Result<Wiring> {
        let pwm = GpioPwm::new(cfg.pins.motor_pwm, cfg.motor.pwm_frequency_hz)
            .wrap_err("open motor pwm pin")?;
        let pins = GpioDriverPins::new(cfg.pins.motor_phase, cfg.pins.motor_sleep)
            .wrap_err("open driver phase/sleep pins")?;
        let actuator = prosthesis_core::build_actuator(cfg, Arc::new(pwm), pins, clock)?;
        let tracker = actuator.tracker();
        let encoder = attach_encoder(cfg.pins.encoder_a, cfg.pins.encoder_b, move |a, b| {
            tracker.on_edge(a, b);
        })
        .wrap_err("attach encoder interrupt")?;
        info!(
            pwm = cfg.pins.motor_pwm,
            encoder_a = cfg.pins.encoder_a,
            encoder_b = cfg.pins.encoder_b,
            "gpio wired"
        );
        Ok(Wiring {
            actuator,
            workers: Vec::new(),
            keep_alive: encoder,
        })
    }
}
