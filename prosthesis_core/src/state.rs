//! Operating mode / phase state machine.
//!
//! Collaborators (classifier, calibration routines, the safety supervisor)
//! exchange the raw `(Mode, Phase)` pair. Inside the core the pair is decoded
//! into a `Stage`, a typed view where only meaningful phases exist.

use core::fmt;

/// Top-level operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Normal,
    CalibrateMotors,
    CalibrateThresholds,
    Safety,
    Rest,
}

impl Mode {
    #[inline]
    pub const fn is_calibration(self) -> bool {
        matches!(self, Mode::CalibrateMotors | Mode::CalibrateThresholds)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Normal => "normal",
            Mode::CalibrateMotors => "calibrate_motors",
            Mode::CalibrateThresholds => "calibrate_thresholds",
            Mode::Safety => "safety",
            Mode::Rest => "rest",
        };
        f.write_str(s)
    }
}

/// Ordinal sub-step within a mode. Its meaning depends on the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    One,
    Two,
    Three,
    Four,
    Five,
}

impl Phase {
    pub const ALL: [Phase; 5] = [Phase::One, Phase::Two, Phase::Three, Phase::Four, Phase::Five];

    /// 1-based ordinal.
    #[inline]
    pub const fn index(self) -> u8 {
        match self {
            Phase::One => 1,
            Phase::Two => 2,
            Phase::Three => 3,
            Phase::Four => 4,
            Phase::Five => 5,
        }
    }

    pub const fn from_index(i: u8) -> Option<Self> {
        match i {
            1 => Some(Phase::One),
            2 => Some(Phase::Two),
            3 => Some(Phase::Three),
            4 => Some(Phase::Four),
            5 => Some(Phase::Five),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalPhase {
    Rest,
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCalPhase {
    Idle,
    JogOpen,
    JogClose,
    /// Terminal: the current physical position becomes zero.
    SetZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdCalPhase {
    Activation,
    AwaitRelease,
    Deactivation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyPhase {
    Halt,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestPhase {
    Halt,
    Open,
}

/// Typed `(mode, phase)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Normal(NormalPhase),
    CalibrateMotors(MotorCalPhase),
    CalibrateThresholds(ThresholdCalPhase),
    Safety(SafetyPhase),
    Rest(RestPhase),
}

impl Stage {
    /// Decode a raw pair. `None` for phases a mode does not define.
    pub const fn decode(mode: Mode, phase: Phase) -> Option<Stage> {
        use Phase::*;
        Some(match (mode, phase) {
            (Mode::Normal, One) => Stage::Normal(NormalPhase::Rest),
            (Mode::Normal, Two) => Stage::Normal(NormalPhase::Open),
            (Mode::Normal, Three) => Stage::Normal(NormalPhase::Close),
            (Mode::CalibrateMotors, One) => Stage::CalibrateMotors(MotorCalPhase::Idle),
            (Mode::CalibrateMotors, Two) => Stage::CalibrateMotors(MotorCalPhase::JogOpen),
            (Mode::CalibrateMotors, Three) => Stage::CalibrateMotors(MotorCalPhase::JogClose),
            (Mode::CalibrateMotors, Four) => Stage::CalibrateMotors(MotorCalPhase::SetZero),
            (Mode::CalibrateThresholds, One) => {
                Stage::CalibrateThresholds(ThresholdCalPhase::Activation)
            }
            (Mode::CalibrateThresholds, Two) => {
                Stage::CalibrateThresholds(ThresholdCalPhase::AwaitRelease)
            }
            (Mode::CalibrateThresholds, Three) => {
                Stage::CalibrateThresholds(ThresholdCalPhase::Deactivation)
            }
            (Mode::Safety, One) => Stage::Safety(SafetyPhase::Halt),
            (Mode::Safety, Two) => Stage::Safety(SafetyPhase::Open),
            (Mode::Rest, One) => Stage::Rest(RestPhase::Halt),
            (Mode::Rest, Two) => Stage::Rest(RestPhase::Open),
            _ => return None,
        })
    }

    pub const fn mode(self) -> Mode {
        match self {
            Stage::Normal(_) => Mode::Normal,
            Stage::CalibrateMotors(_) => Mode::CalibrateMotors,
            Stage::CalibrateThresholds(_) => Mode::CalibrateThresholds,
            Stage::Safety(_) => Mode::Safety,
            Stage::Rest(_) => Mode::Rest,
        }
    }

    pub const fn phase(self) -> Phase {
        match self {
            Stage::Normal(NormalPhase::Rest)
            | Stage::CalibrateMotors(MotorCalPhase::Idle)
            | Stage::CalibrateThresholds(ThresholdCalPhase::Activation)
            | Stage::Safety(SafetyPhase::Halt)
            | Stage::Rest(RestPhase::Halt) => Phase::One,
            Stage::Normal(NormalPhase::Open)
            | Stage::CalibrateMotors(MotorCalPhase::JogOpen)
            | Stage::CalibrateThresholds(ThresholdCalPhase::AwaitRelease)
            | Stage::Safety(SafetyPhase::Open)
            | Stage::Rest(RestPhase::Open) => Phase::Two,
            Stage::Normal(NormalPhase::Close)
            | Stage::CalibrateMotors(MotorCalPhase::JogClose)
            | Stage::CalibrateThresholds(ThresholdCalPhase::Deactivation) => Phase::Three,
            Stage::CalibrateMotors(MotorCalPhase::SetZero) => Phase::Four,
        }
    }
}

/// Reason the hand is in Safety mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FaultCause {
    #[default]
    None,
    OverCurrent,
    OverTemperature,
    ExcessSpeed,
    ExcessForce,
    SensorLoss,
    EncoderFault,
}

impl FaultCause {
    #[inline]
    pub const fn is_active(self) -> bool {
        !matches!(self, FaultCause::None)
    }
}

impl fmt::Display for FaultCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FaultCause::None => "none",
            FaultCause::OverCurrent => "over_current",
            FaultCause::OverTemperature => "over_temperature",
            FaultCause::ExcessSpeed => "excess_speed",
            FaultCause::ExcessForce => "excess_force",
            FaultCause::SensorLoss => "sensor_loss",
            FaultCause::EncoderFault => "encoder_fault",
        };
        f.write_str(s)
    }
}

/// Current `(mode, phase, fault)`. Boots in `Normal` / `Phase::One` with no
/// fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachine {
    mode: Mode,
    phase: Phase,
    fault: FaultCause,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub const fn new() -> Self {
        Self {
            mode: Mode::Normal,
            phase: Phase::One,
            fault: FaultCause::None,
        }
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn fault(&self) -> FaultCause {
        self.fault
    }

    pub fn stage(&self) -> Option<Stage> {
        Stage::decode(self.mode, self.phase)
    }

    /// Switch mode; the phase always restarts at `Phase::One`.
    pub fn change_mode(&mut self, mode: Mode) {
        if mode != self.mode || self.phase != Phase::One {
            tracing::debug!(from = %self.mode, to = %mode, "mode change");
        }
        self.mode = mode;
        self.phase = Phase::One;
    }

    pub fn change_phase(&mut self, phase: Phase) {
        if phase != self.phase {
            tracing::debug!(mode = %self.mode, from = %self.phase, to = %phase, "phase change");
        }
        self.phase = phase;
    }

    /// Set mode and phase together.
    pub fn enter(&mut self, stage: Stage) {
        self.change_mode(stage.mode());
        self.change_phase(stage.phase());
    }

    /// Latch `cause` and move into the Safety stage that handles it.
    /// Pinching forces open the hand; every other cause halts it.
    pub fn enter_safety(&mut self, cause: FaultCause) {
        let stage = match cause {
            FaultCause::ExcessForce => Stage::Safety(SafetyPhase::Open),
            _ => Stage::Safety(SafetyPhase::Halt),
        };
        self.enter(stage);
        self.fault = cause;
    }

    pub fn clear_fault(&mut self) {
        self.fault = FaultCause::None;
    }
}
