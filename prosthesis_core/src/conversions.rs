//! `From` implementations bridging `prosthesis_config` types to core types.

use crate::config::{MotorCfg, PressureCfg, SafetyThresholds};
use crate::types::TravelLimits;

// ── MotorCfg ─────────────────────────────────────────────────────────────────

impl From<&prosthesis_config::MotorCfg> for MotorCfg {
    fn from(c: &prosthesis_config::MotorCfg) -> Self {
        Self {
            limits: TravelLimits::new(c.min_position, c.max_position),
            speed_pct: c.speed_pct,
            calibration_speed_pct: c.calibration_speed_pct,
        }
    }
}

// ── PressureCfg ──────────────────────────────────────────────────────────────

impl From<&prosthesis_config::PressureCfg> for PressureCfg {
    fn from(c: &prosthesis_config::PressureCfg) -> Self {
        Self {
            tolerance_steps: c.tolerance_steps,
            hold_ms: c.hold_ms,
        }
    }
}

// ── SafetyThresholds ─────────────────────────────────────────────────────────

impl From<&prosthesis_config::SafetyCfg> for SafetyThresholds {
    fn from(c: &prosthesis_config::SafetyCfg) -> Self {
        Self {
            max_current_a: c.max_current_a,
            max_temperature_c: c.max_temperature_c,
            max_speed_steps_per_s: c.max_speed_steps_per_s,
            max_force_n: c.max_force_n,
        }
    }
}
