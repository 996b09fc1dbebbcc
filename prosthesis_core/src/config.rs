//! Configuration types for the actuation core.
//!
//! These are the runtime configuration structs used by `Actuator`.
//! They are separate from the TOML-deserialized config in `prosthesis_config`.

use crate::types::TravelLimits;
use crate::util::duty_from_pct;

/// Motor travel and drive strength.
#[derive(Debug, Clone)]
pub struct MotorCfg {
    pub limits: TravelLimits,
    /// Drive strength outside calibration, percent of full PWM.
    pub speed_pct: u8,
    /// Reduced drive strength used in both calibration modes.
    pub calibration_speed_pct: u8,
}

impl MotorCfg {
    #[inline]
    pub fn nominal_duty(&self) -> u8 {
        duty_from_pct(self.speed_pct)
    }

    #[inline]
    pub fn calibration_duty(&self) -> u8 {
        duty_from_pct(self.calibration_speed_pct)
    }
}

impl Default for MotorCfg {
    fn default() -> Self {
        Self {
            limits: TravelLimits::default(),
            speed_pct: 80,
            calibration_speed_pct: 50,
        }
    }
}

/// Grip-pressure (stall while closing) detection.
#[derive(Debug, Clone)]
pub struct PressureCfg {
    /// Position change, in steps, still considered stationary.
    pub tolerance_steps: u16,
    /// Continuous stationary time that counts as pressure.
    pub hold_ms: u64,
}

impl Default for PressureCfg {
    fn default() -> Self {
        Self {
            tolerance_steps: 1,
            hold_ms: 3000,
        }
    }
}

/// Maximum allowed sensor values. Owned by configuration; the core only
/// reads them.
#[derive(Debug, Clone)]
pub struct SafetyThresholds {
    pub max_current_a: f32,
    pub max_temperature_c: f32,
    pub max_speed_steps_per_s: f32,
    pub max_force_n: f32,
}

impl Default for SafetyThresholds {
    fn default() -> Self {
        Self {
            max_current_a: 2.5,
            max_temperature_c: 60.0,
            max_speed_steps_per_s: 6000.0,
            max_force_n: 40.0,
        }
    }
}
