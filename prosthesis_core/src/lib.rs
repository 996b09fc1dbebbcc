#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Prosthetic hand actuation core (hardware-agnostic).
//!
//! All hardware interaction goes through `prosthesis_traits::PwmChannel` and
//! `prosthesis_traits::DriverPins`; encoder levels are fed to
//! [`PositionTracker::on_edge`] from whatever interrupt source the target has.
//!
//! ## Architecture
//!
//! - **Tracking**: quadrature edge counting and interrupt-side seek stop (`tracker`)
//! - **Drive**: bounded open/close/stop with target seeking (`driver`)
//! - **Pressure**: stall-while-closing detection (`pressure`)
//! - **State**: mode/phase machine and its typed `Stage` view (`state`)
//! - **Interpreter**: `(mode, phase)` to motor intent (`interpreter`)
//! - **Safety**: breach priority, Safety entry and resolution (`safety`)
//! - **Orchestration**: the per-tick step (`actuator`), built via `builder`
//!
//! ## Contexts
//!
//! `on_edge` runs in interrupt context and `Actuator::tick` in the periodic
//! task. They share only the atomics in `DriveShared`; every
//! read-modify-write across the two runs inside `critical_section::with`.

pub mod actuator;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod driver;
pub mod error;
pub mod hw_error;
pub mod interpreter;
pub mod pressure;
pub mod safety;
pub mod state;
pub mod status;
pub mod tracker;
pub mod types;
pub mod util;

pub use actuator::Actuator;
pub use builder::{ActuatorBuilder, Missing, Set};
pub use config::{MotorCfg, PressureCfg, SafetyThresholds};
pub use driver::MotorDriver;
pub use error::{BuildError, ProsthesisError, Report, Result};
pub use interpreter::{DriveIntent, interpret};
pub use pressure::PressureDetector;
pub use safety::{SafetyEvent, SafetyReadings, SafetySupervisor, resolved, verify};
pub use state::{FaultCause, Mode, Phase, Stage, StateMachine};
pub use status::TickReport;
pub use tracker::{DriveShared, PositionTracker};
pub use types::{Direction, DriveState, MotorCommand, TravelLimits};

/// Build an `Actuator` from a loaded configuration and the two hardware
/// seams.
pub fn build_actuator(
    cfg: &prosthesis_config::Config,
    pwm: std::sync::Arc<dyn prosthesis_traits::PwmChannel>,
    pins: impl prosthesis_traits::DriverPins + 'static,
    clock: std::sync::Arc<dyn prosthesis_traits::Clock + Send + Sync>,
) -> Result<Actuator> {
    Actuator::builder()
        .with_pwm(pwm)
        .with_pins(pins)
        .with_motor(MotorCfg::from(&cfg.motor))
        .with_pressure(PressureCfg::from(&cfg.pressure))
        .with_safety(SafetyThresholds::from(&cfg.safety))
        .with_clock(clock)
        .build()
}
