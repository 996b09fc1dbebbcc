//! Safety supervision: breach detection, entry into Safety mode, resolution.
//!
//! Breaches are checked in a fixed priority so simultaneous faults always
//! latch the same cause:
//! sensor loss, encoder fault, over-current, over-temperature, excess force,
//! excess speed.

use crate::config::SafetyThresholds;
use crate::state::{FaultCause, Mode, StateMachine};

/// Live sensor values supplied by the monitoring collaborator each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyReadings {
    pub current_a: f32,
    pub temperature_c: f32,
    pub speed_steps_per_s: f32,
    pub force_n: f32,
    pub sensor_alive: bool,
    pub encoder_alive: bool,
}

impl Default for SafetyReadings {
    fn default() -> Self {
        Self {
            current_a: 0.0,
            temperature_c: 25.0,
            speed_steps_per_s: 0.0,
            force_n: 0.0,
            sensor_alive: true,
            encoder_alive: true,
        }
    }
}

#[inline]
fn exceeds(value: f32, max: f32) -> bool {
    !value.is_finite() || value > max
}

fn breached(cause: FaultCause, r: &SafetyReadings, t: &SafetyThresholds) -> bool {
    match cause {
        FaultCause::None => false,
        FaultCause::SensorLoss => !r.sensor_alive,
        FaultCause::EncoderFault => !r.encoder_alive,
        FaultCause::OverCurrent => exceeds(r.current_a, t.max_current_a),
        FaultCause::OverTemperature => exceeds(r.temperature_c, t.max_temperature_c),
        FaultCause::ExcessForce => exceeds(r.force_n, t.max_force_n),
        FaultCause::ExcessSpeed => exceeds(r.speed_steps_per_s, t.max_speed_steps_per_s),
    }
}

const PRIORITY: [FaultCause; 6] = [
    FaultCause::SensorLoss,
    FaultCause::EncoderFault,
    FaultCause::OverCurrent,
    FaultCause::OverTemperature,
    FaultCause::ExcessForce,
    FaultCause::ExcessSpeed,
];

/// Highest-priority breach, or `FaultCause::None`.
pub fn verify(readings: &SafetyReadings, thresholds: &SafetyThresholds) -> FaultCause {
    PRIORITY
        .into_iter()
        .find(|&c| breached(c, readings, thresholds))
        .unwrap_or(FaultCause::None)
}

/// Whether the condition behind `cause` has cleared.
pub fn resolved(cause: FaultCause, readings: &SafetyReadings, thresholds: &SafetyThresholds) -> bool {
    !breached(cause, readings, thresholds)
}

/// Outcome of one supervision pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyEvent {
    Clear,
    Entered(FaultCause),
    Holding(FaultCause),
    Resolved(FaultCause),
}

#[derive(Debug, Clone, Default)]
pub struct SafetySupervisor {
    thresholds: SafetyThresholds,
}

impl SafetySupervisor {
    pub fn new(thresholds: SafetyThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &SafetyThresholds {
        &self.thresholds
    }

    pub fn supervise(&self, machine: &mut StateMachine, readings: &SafetyReadings) -> SafetyEvent {
        let latched = machine.fault();
        if !latched.is_active() {
            let cause = verify(readings, &self.thresholds);
            if !cause.is_active() {
                return SafetyEvent::Clear;
            }
            machine.enter_safety(cause);
            tracing::warn!(%cause, phase = %machine.phase(), "entering safety mode");
            return SafetyEvent::Entered(cause);
        }

        if resolved(latched, readings, &self.thresholds) {
            machine.clear_fault();
            machine.change_mode(Mode::Normal);
            tracing::info!(cause = %latched, "safety fault resolved");
            return SafetyEvent::Resolved(latched);
        }

        if machine.mode() != Mode::Safety {
            tracing::warn!(cause = %latched, mode = %machine.mode(), "fault latched outside safety; re-entering");
            machine.enter_safety(latched);
        }
        SafetyEvent::Holding(latched)
    }
}
