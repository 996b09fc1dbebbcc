use std::sync::Arc;

use prosthesis_core::{
    DriveIntent, DriveShared, Mode, Phase, PositionTracker, TravelLimits, interpret,
};
use prosthesis_hardware::SimulatedPwm;
use proptest::prelude::*;

fn mode_strategy() -> impl Strategy<Value = Mode> {
    prop_oneof![
        Just(Mode::Normal),
        Just(Mode::CalibrateMotors),
        Just(Mode::CalibrateThresholds),
        Just(Mode::Safety),
        Just(Mode::Rest),
    ]
}

fn phase_strategy() -> impl Strategy<Value = Phase> {
    (1u8..=5).prop_map(|i| Phase::from_index(i).unwrap_or(Phase::One))
}

prop_compose! {
    fn limits_and_start()(min in 0u16..4000, span in 1u16..500)(
        min in Just(min),
        max in Just(min + span),
        start in min..=min + span,
    ) -> (TravelLimits, u16) {
        (TravelLimits::new(min, max), start)
    }
}

fn motion_pair(mode: Mode, phase: Phase) -> bool {
    matches!(
        (mode, phase),
        (Mode::Normal | Mode::CalibrateMotors, Phase::Two | Phase::Three)
            | (Mode::Safety, Phase::Two)
    )
}

proptest! {
    #[test]
    fn tracker_never_leaves_limits(
        (limits, start) in limits_and_start(),
        edges in proptest::collection::vec(any::<(bool, bool)>(), 1..400),
    ) {
        let shared = Arc::new(DriveShared::new(limits));
        let tracker = PositionTracker::new(shared, Arc::new(SimulatedPwm::new()));
        tracker.set_position(start);
        for (a, b) in edges {
            let before = tracker.read_position();
            let p = tracker.on_edge(a, b);
            prop_assert!(p >= limits.min && p <= limits.max);
            prop_assert!(p.abs_diff(before) <= 1);
        }
    }

    #[test]
    fn pairs_without_motion_yield_no_intent(mode in mode_strategy(), phase in phase_strategy()) {
        prop_assume!(!motion_pair(mode, phase));
        prop_assert_eq!(interpret(mode, phase), DriveIntent::NONE);
    }

    #[test]
    fn intent_never_drives_both_ways(mode in mode_strategy(), phase in phase_strategy()) {
        let i = interpret(mode, phase);
        prop_assert!(!(i.open && i.close));
    }
}
