#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the prosthetic hand actuation stack.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Everything except `[pins]` has defaults matching the reference hardware
//!   (4230-step travel, 80 % nominal drive, 3 s grip-pressure window).
use eyre::WrapErr;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Pins {
    /// Encoder channel A; the edge interrupt is attached to this line.
    pub encoder_a: u8,
    pub encoder_b: u8,
    pub motor_pwm: u8,
    pub motor_phase: u8,
    pub motor_sleep: u8,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MotorCfg {
    /// Fully open position, in encoder steps.
    pub min_position: u16,
    /// Fully closed position, in encoder steps.
    pub max_position: u16,
    /// Nominal drive strength in percent of full PWM.
    pub speed_pct: u8,
    /// Reduced drive used in both calibration modes.
    pub calibration_speed_pct: u8,
    pub pwm_frequency_hz: u32,
}

impl Default for MotorCfg {
    fn default() -> Self {
        Self {
            min_position: 0,
            max_position: 4230,
            speed_pct: 80,
            calibration_speed_pct: 50,
            pwm_frequency_hz: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PressureCfg {
    /// Position change (steps) still considered "not moving".
    pub tolerance_steps: u16,
    /// How long the hand must stay within tolerance while closing.
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

/// Safety thresholds; a live reading strictly above its maximum is a fault.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SafetyCfg {
    pub max_current_a: f32,
    pub max_temperature_c: f32,
    pub max_speed_steps_per_s: f32,
    pub max_force_n: f32,
}

impl Default for SafetyCfg {
    fn default() -> Self {
        Self {
            max_current_a: 2.5,
            max_temperature_c: 60.0,
            max_speed_steps_per_s: 6000.0,
            max_force_n: 40.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RuntimeCfg {
    /// Orchestrator tick rate.
    pub tick_hz: u32,
}

impl Default for RuntimeCfg {
    fn default() -> Self {
        Self { tick_hz: 100 }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub motor: MotorCfg,
    #[serde(default)]
    pub pressure: PressureCfg,
    #[serde(default)]
    pub safety: SafetyCfg,
    #[serde(default)]
    pub runtime: RuntimeCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = load_toml(&text).wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

fn positive_finite(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        let p = &self.pins;
        let mut pins = [
            p.encoder_a,
            p.encoder_b,
            p.motor_pwm,
            p.motor_phase,
            p.motor_sleep,
        ];
        pins.sort_unstable();
        if pins.windows(2).any(|w| w[0] == w[1]) {
            eyre::bail!("pins must be distinct");
        }

        // Motor
        if self.motor.min_position >= self.motor.max_position {
            eyre::bail!("motor.min_position must be < motor.max_position");
        }
        if self.motor.speed_pct == 0 || self.motor.speed_pct > 100 {
            eyre::bail!("motor.speed_pct must be in [1, 100]");
        }
        if self.motor.calibration_speed_pct == 0 || self.motor.calibration_speed_pct > 100 {
            eyre::bail!("motor.calibration_speed_pct must be in [1, 100]");
        }
        if self.motor.pwm_frequency_hz == 0 {
            eyre::bail!("motor.pwm_frequency_hz must be > 0");
        }

        // Pressure
        if self.pressure.hold_ms == 0 {
            eyre::bail!("pressure.hold_ms must be >= 1");
        }
        if self.pressure.hold_ms > 60 * 1000 {
            eyre::bail!("pressure.hold_ms is unreasonably large (>60s)");
        }

        // Safety
        if !positive_finite(self.safety.max_current_a) {
            eyre::bail!("safety.max_current_a must be > 0");
        }
        if !positive_finite(self.safety.max_temperature_c) {
            eyre::bail!("safety.max_temperature_c must be > 0");
        }
        if !positive_finite(self.safety.max_speed_steps_per_s) {
            eyre::bail!("safety.max_speed_steps_per_s must be > 0");
        }
        if !positive_finite(self.safety.max_force_n) {
            eyre::bail!("safety.max_force_n must be > 0");
        }

        // Runtime
        if self.runtime.tick_hz == 0 || self.runtime.tick_hz > 1000 {
            eyre::bail!("runtime.tick_hz must be in [1, 1000]");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
