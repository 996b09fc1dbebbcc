//! Per-tick telemetry returned by `Actuator::tick`.

use crate::state::{FaultCause, Mode, Phase};
use crate::types::MotorCommand;

/// Snapshot published once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// The commanded motion has reached its target, limit or grip.
    pub arrived: bool,
    pub position: u16,
    pub mode: Mode,
    pub phase: Phase,
    pub fault: FaultCause,
    pub command: MotorCommand,
    /// Duty in effect after the tick.
    pub duty: u8,
}

impl Default for TickReport {
    fn default() -> Self {
        Self {
            arrived: false,
            position: 0,
            mode: Mode::Normal,
            phase: Phase::One,
            fault: FaultCause::None,
            command: MotorCommand::Hold,
            duty: 0,
        }
    }
}
