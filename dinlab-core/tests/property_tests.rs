//! Property tests for staircase invariants.
//!
//! Uses proptest to verify:
//! 1. Monotonic clamping — the level never leaves [min_level, max_level]
//! 2. Direction rule — correct never raises the level, incorrect never lowers it
//! 3. Fixed-length termination — exactly N scored trials, any outcome pattern
//! 4. Entry equivalence — digit-by-digit and batch entry build identical logs
//! 5. Replay — any produced log replays to the same terminal state

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use dinlab_core::catalogue::InMemoryCatalogue;
use dinlab_core::domain::{Digits, StimulusId, TestConfig};
use dinlab_core::staircase::{next_level, RunState};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_outcomes() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(prop::bool::ANY, 24)
}

fn arb_config() -> impl Strategy<Value = TestConfig> {
    // Range endpoints chosen so min < start < max and the span is a whole
    // number of increments.
    (1i32..=4, 1i32..=5, 1i32..=5, 24u32..=40).prop_map(|(inc, below, above, total)| {
        TestConfig {
            min_level: -below * inc,
            max_level: above * inc,
            starting_level: 0,
            increment: inc,
            total_presentations: total,
            ..TestConfig::default()
        }
    })
}

fn catalogue_for(config: &TestConfig) -> InMemoryCatalogue {
    let mut cat = InMemoryCatalogue::new();
    for level in config.levels() {
        cat.insert(
            level,
            StimulusId::new(format!("snr{level:+03}/123")),
            Digits::parse("123").unwrap(),
        );
    }
    cat
}

fn drive(config: &TestConfig, outcomes: &[bool]) -> RunState {
    let cat = catalogue_for(config);
    let mut rng = StdRng::seed_from_u64(99);
    let mut state = RunState::new(config.clone()).unwrap();
    for &correct in outcomes.iter().take(config.total_presentations as usize) {
        state.present(&cat, &mut rng).unwrap();
        let response = if correct { "123" } else { "000" };
        state.record_triplet(Digits::parse(response).unwrap()).unwrap();
    }
    state
}

// ── 1. Monotonic clamping ────────────────────────────────────────────

proptest! {
    /// No outcome sequence can push the level outside the configured range.
    #[test]
    fn level_never_leaves_range(config in arb_config(), outcomes in arb_outcomes()) {
        let state = drive(&config, &outcomes);
        for trial in state.history() {
            prop_assert!(trial.level >= config.min_level);
            prop_assert!(trial.level <= config.max_level);
        }
        prop_assert!(state.current_level() >= config.min_level);
        prop_assert!(state.current_level() <= config.max_level);
    }

    /// Correct answers never raise the level; wrong answers never lower it.
    /// Equality only at the clamp boundaries.
    #[test]
    fn direction_rule_holds(config in arb_config(), outcomes in arb_outcomes()) {
        let state = drive(&config, &outcomes);
        for trial in state.history() {
            let next = next_level(&config, trial);
            if trial.is_fully_correct {
                prop_assert!(next <= trial.level);
                if next == trial.level {
                    prop_assert_eq!(trial.level, config.min_level);
                }
            } else {
                prop_assert!(next >= trial.level);
                if next == trial.level {
                    prop_assert_eq!(trial.level, config.max_level);
                }
            }
        }
    }
}

// ── 2. Termination and log shape ─────────────────────────────────────

proptest! {
    /// A run completes after exactly `total_presentations` scored trials
    /// and its log carries contiguous 1-based sequence indices.
    #[test]
    fn run_is_fixed_length(outcomes in arb_outcomes()) {
        let config = TestConfig::default();
        let state = drive(&config, &outcomes);
        prop_assert!(state.done());
        prop_assert_eq!(state.history().len(), 24);
        for (i, trial) in state.history().iter().enumerate() {
            prop_assert_eq!(trial.sequence_index, i as u32 + 1);
        }
    }

    /// Replaying a produced log lands on the same level and trial count.
    #[test]
    fn replay_round_trips(outcomes in arb_outcomes()) {
        let config = TestConfig::default();
        let state = drive(&config, &outcomes);
        let replayed = RunState::replay(config, state.history().to_vec()).unwrap();
        prop_assert_eq!(replayed.current_level(), state.current_level());
        prop_assert_eq!(replayed.presentations_done(), state.presentations_done());
    }
}

// ── 3. Entry-mode equivalence ────────────────────────────────────────

proptest! {
    /// Keypad entry and batch entry produce identical trial logs when fed
    /// the same responses against the same seeded selection stream.
    #[test]
    fn keypad_and_batch_entry_agree(responses in prop::collection::vec("[0-9]{3}", 24)) {
        let config = TestConfig::default();
        let cat = catalogue_for(&config);

        let mut rng = StdRng::seed_from_u64(17);
        let mut keypad = RunState::new(config.clone()).unwrap();
        for response in &responses {
            keypad.present(&cat, &mut rng).unwrap();
            for c in response.chars() {
                keypad.record_digit(c).unwrap();
            }
        }

        let mut rng = StdRng::seed_from_u64(17);
        let mut batch = RunState::new(config).unwrap();
        for response in &responses {
            batch.present(&cat, &mut rng).unwrap();
            batch.record_triplet(Digits::parse(response).unwrap()).unwrap();
        }

        prop_assert_eq!(keypad.history(), batch.history());
        prop_assert_eq!(keypad.current_level(), batch.current_level());
    }
}
