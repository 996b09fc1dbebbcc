//! Type-state builder for `Actuator`.
//!
//! The builder enforces at compile time that a PWM channel and the driver pins
//! are provided before `build()` is available. `try_build()` is always
//! available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use prosthesis_traits::clock::{Clock, MonotonicClock};
use prosthesis_traits::{DriverPins, PwmChannel};

use crate::actuator::Actuator;
use crate::config::{MotorCfg, PressureCfg, SafetyThresholds};
use crate::driver::MotorDriver;
use crate::error::{BuildError, Result};
use crate::pressure::PressureDetector;
use crate::safety::SafetySupervisor;
use crate::state::StateMachine;
use crate::status::TickReport;
use crate::tracker::{DriveShared, PositionTracker};

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Actuator`. Configuration is validated on `build()`.
pub struct ActuatorBuilder<P, D> {
    pwm: Option<Arc<dyn PwmChannel>>,
    pins: Option<Box<dyn DriverPins>>,
    motor: Option<MotorCfg>,
    pressure: Option<PressureCfg>,
    safety: Option<SafetyThresholds>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    _p: PhantomData<P>,
    _d: PhantomData<D>,
}

impl Default for ActuatorBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            pwm: None,
            pins: None,
            motor: None,
            pressure: None,
            safety: None,
            clock: None,
            _p: PhantomData,
            _d: PhantomData,
        }
    }
}

impl Actuator {
    /// Start building an Actuator.
    pub fn builder() -> ActuatorBuilder<Missing, Missing> {
        ActuatorBuilder::default()
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

fn positive(x: f32) -> bool {
    x.is_finite() && x > 0.0
}

/// Validate configuration and construct the actuator with the driver awake
/// and stopped.
fn validate_and_build(
    pwm: Arc<dyn PwmChannel>,
    pins: Box<dyn DriverPins>,
    motor: MotorCfg,
    pressure: PressureCfg,
    safety: SafetyThresholds,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
) -> Result<Actuator> {
    if motor.limits.min >= motor.limits.max {
        return Err(invalid("motor.min_position must be < motor.max_position"));
    }
    if !(1..=100).contains(&motor.speed_pct) {
        return Err(invalid("motor.speed_pct must be in [1, 100]"));
    }
    if !(1..=100).contains(&motor.calibration_speed_pct) {
        return Err(invalid("motor.calibration_speed_pct must be in [1, 100]"));
    }
    if pressure.hold_ms == 0 {
        return Err(invalid("pressure.hold_ms must be >= 1"));
    }
    if !positive(safety.max_current_a)
        || !positive(safety.max_temperature_c)
        || !positive(safety.max_speed_steps_per_s)
        || !positive(safety.max_force_n)
    {
        return Err(invalid("safety thresholds must be positive and finite"));
    }

    let clock = clock.unwrap_or_else(|| Arc::new(MonotonicClock::new()) as Arc<dyn Clock + Send + Sync>);
    let shared = Arc::new(DriveShared::new(motor.limits));
    let tracker = PositionTracker::new(shared, pwm);
    let mut driver = MotorDriver::new(tracker, pins);
    driver.stop_rotation()?;
    driver.set_sleep(false)?;

    Ok(Actuator {
        driver,
        machine: StateMachine::new(),
        pressure: PressureDetector::new(pressure, clock),
        supervisor: SafetySupervisor::new(safety),
        motor,
        last: TickReport::default(),
    })
}

impl<P, D> ActuatorBuilder<P, D> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Actuator> {
        let pwm = self
            .pwm
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPwm))?;
        let pins = self
            .pins
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPins))?;
        validate_and_build(
            pwm,
            pins,
            self.motor.unwrap_or_default(),
            self.pressure.unwrap_or_default(),
            self.safety.unwrap_or_default(),
            self.clock,
        )
    }

    pub fn with_motor(mut self, motor: MotorCfg) -> Self {
        self.motor = Some(motor);
        self
    }

    pub fn with_pressure(mut self, pressure: PressureCfg) -> Self {
        self.pressure = Some(pressure);
        self
    }

    pub fn with_safety(mut self, safety: SafetyThresholds) -> Self {
        self.safety = Some(safety);
        self
    }

    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Setters that advance type-state
impl<D> ActuatorBuilder<Missing, D> {
    /// The PWM channel is shared with the encoder edge handler.
    pub fn with_pwm(self, pwm: Arc<dyn PwmChannel>) -> ActuatorBuilder<Set, D> {
        ActuatorBuilder {
            pwm: Some(pwm),
            pins: self.pins,
            motor: self.motor,
            pressure: self.pressure,
            safety: self.safety,
            clock: self.clock,
            _p: PhantomData,
            _d: PhantomData,
        }
    }
}

impl<P> ActuatorBuilder<P, Missing> {
    pub fn with_pins(self, pins: impl DriverPins + 'static) -> ActuatorBuilder<P, Set> {
        ActuatorBuilder {
            pwm: self.pwm,
            pins: Some(Box::new(pins)),
            motor: self.motor,
            pressure: self.pressure,
            safety: self.safety,
            clock: self.clock,
            _p: PhantomData,
            _d: PhantomData,
        }
    }
}

impl ActuatorBuilder<Set, Set> {
    pub fn build(self) -> Result<Actuator> {
        self.try_build()
    }
}
