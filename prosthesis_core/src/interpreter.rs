//! Maps `(mode, phase)` to the motor intent for this tick.

use crate::state::{Mode, MotorCalPhase, NormalPhase, Phase, SafetyPhase, Stage};
use crate::types::MotorCommand;

/// Open/close request derived from the state machine. At most one flag is
/// ever set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriveIntent {
    pub open: bool,
    pub close: bool,
}

impl DriveIntent {
    pub const NONE: Self = Self {
        open: false,
        close: false,
    };
    pub const OPEN: Self = Self {
        open: true,
        close: false,
    };
    pub const CLOSE: Self = Self {
        open: false,
        close: true,
    };

    pub const fn command(self) -> MotorCommand {
        match (self.open, self.close) {
            (true, false) => MotorCommand::Open,
            (false, true) => MotorCommand::Close,
            _ => MotorCommand::Hold,
        }
    }
}

/// Total over every `(mode, phase)`. Pairs that do not decode to a `Stage`
/// yield no intent; if a table entry ever requested both directions, stop
/// wins.
pub fn interpret(mode: Mode, phase: Phase) -> DriveIntent {
    let raw = Stage::decode(mode, phase).map_or(DriveIntent::NONE, stage_intent);
    resolve(mode, phase, raw)
}

const fn stage_intent(stage: Stage) -> DriveIntent {
    match stage {
        Stage::Normal(NormalPhase::Open)
        | Stage::CalibrateMotors(MotorCalPhase::JogOpen)
        | Stage::Safety(SafetyPhase::Open) => DriveIntent::OPEN,
        Stage::Normal(NormalPhase::Close) | Stage::CalibrateMotors(MotorCalPhase::JogClose) => {
            DriveIntent::CLOSE
        }
        Stage::Normal(NormalPhase::Rest)
        | Stage::CalibrateMotors(MotorCalPhase::Idle | MotorCalPhase::SetZero)
        | Stage::CalibrateThresholds(_)
        | Stage::Safety(SafetyPhase::Halt)
        | Stage::Rest(_) => DriveIntent::NONE,
    }
}

fn resolve(mode: Mode, phase: Phase, raw: DriveIntent) -> DriveIntent {
    if raw.open && raw.close {
        tracing::warn!(%mode, %phase, "conflicting drive intent; holding");
        return DriveIntent::NONE;
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Mode::Normal, Phase::One, MotorCommand::Hold)]
    #[case(Mode::Normal, Phase::Two, MotorCommand::Open)]
    #[case(Mode::Normal, Phase::Three, MotorCommand::Close)]
    #[case(Mode::Normal, Phase::Five, MotorCommand::Hold)]
    #[case(Mode::CalibrateMotors, Phase::One, MotorCommand::Hold)]
    #[case(Mode::CalibrateMotors, Phase::Two, MotorCommand::Open)]
    #[case(Mode::CalibrateMotors, Phase::Three, MotorCommand::Close)]
    #[case(Mode::CalibrateMotors, Phase::Four, MotorCommand::Hold)]
    #[case(Mode::CalibrateThresholds, Phase::Two, MotorCommand::Hold)]
    #[case(Mode::CalibrateThresholds, Phase::Three, MotorCommand::Hold)]
    #[case(Mode::Safety, Phase::One, MotorCommand::Hold)]
    #[case(Mode::Safety, Phase::Two, MotorCommand::Open)]
    #[case(Mode::Safety, Phase::Three, MotorCommand::Hold)]
    #[case(Mode::Rest, Phase::One, MotorCommand::Hold)]
    #[case(Mode::Rest, Phase::Two, MotorCommand::Hold)]
    fn table(#[case] mode: Mode, #[case] phase: Phase, #[case] cmd: MotorCommand) {
        assert_eq!(interpret(mode, phase).command(), cmd);
    }

    #[test]
    fn undecodable_pairs_yield_no_intent() {
        for mode in [Mode::Normal, Mode::Safety, Mode::Rest, Mode::CalibrateThresholds] {
            for phase in [Phase::Four, Phase::Five] {
                assert_eq!(Stage::decode(mode, phase), None);
                assert_eq!(interpret(mode, phase), DriveIntent::NONE);
            }
        }
    }

    #[test]
    fn every_stage_maps_through_its_raw_pair() {
        for mode in [
            Mode::Normal,
            Mode::CalibrateMotors,
            Mode::CalibrateThresholds,
            Mode::Safety,
            Mode::Rest,
        ] {
            for phase in Phase::ALL {
                if let Some(stage) = Stage::decode(mode, phase) {
                    assert_eq!(interpret(mode, phase), stage_intent(stage));
                }
            }
        }
    }

    #[test]
    fn both_flags_resolve_to_stop() {
        let both = DriveIntent {
            open: true,
            close: true,
        };
        assert_eq!(resolve(Mode::Normal, Phase::Two, both), DriveIntent::NONE);
        assert_eq!(both.command(), MotorCommand::Hold);
    }
}
