//! Simulated listeners — deterministic subjects for testing and batch runs.
//!
//! Three kinds:
//! - [`ScriptedListener`] answers a fixed correct/incorrect script
//!   (drives the all-correct, all-incorrect, and alternating scenarios)
//! - [`LogisticListener`] answers from a known psychometric function, so
//!   a fit over its sessions should recover the parameters it was built
//!   from
//! - [`simulate_sessions`] runs a batch of independent sessions in
//!   parallel; sessions share nothing mutable, so this is a plain
//!   par-map over session numbers

use crate::analysis::psychometric::FourParamLogistic;
use crate::analysis::CurveModel;
use crate::session::{run_session, Listener, SessionError, SessionReport};
use dinlab_core::catalogue::StimulusCatalogue;
use dinlab_core::domain::{Digits, TestConfig};
use dinlab_core::rng::SelectionSeeds;
use dinlab_core::staircase::PresentedStimulus;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Shift every digit by one, guaranteeing zero positionwise matches.
fn garble(target: &Digits) -> Digits {
    let shifted: String = target
        .as_str()
        .chars()
        .map(|c| {
            let d = c.to_digit(10).expect("labels are digits");
            char::from_digit((d + 1) % 10, 10).expect("mod 10")
        })
        .collect();
    Digits::parse(&shifted).expect("shifted digits are digits")
}

/// Answers a predetermined outcome sequence, cycling if the run is
/// longer than the script.
#[derive(Debug, Clone)]
pub struct ScriptedListener {
    script: Vec<bool>,
    position: usize,
}

impl ScriptedListener {
    pub fn new(script: Vec<bool>) -> Self {
        Self { script, position: 0 }
    }

    /// Alternating correct/incorrect, starting correct.
    pub fn alternating() -> Self {
        Self::new(vec![true, false])
    }
}

impl Listener for ScriptedListener {
    fn respond(&mut self, stimulus: &PresentedStimulus) -> Digits {
        let correct = self.script[self.position % self.script.len()];
        self.position += 1;
        if correct {
            stimulus.label.clone()
        } else {
            garble(&stimulus.label)
        }
    }
}

/// Answers correctly with the probability given by a 4-parameter
/// logistic at the presented level.
///
/// Incorrect answers garble all three digits, so triplet and digit
/// scoring agree trial-by-trial; the per-triplet fit is the one that
/// should recover `params`.
#[derive(Debug, Clone)]
pub struct LogisticListener {
    params: [f64; 4],
    rng: StdRng,
}

impl LogisticListener {
    pub fn new(params: [f64; 4], seed: u64) -> Self {
        Self { params, rng: StdRng::seed_from_u64(seed) }
    }

    /// Probability of a fully correct response at a level.
    pub fn p_correct(&self, level: i32) -> f64 {
        FourParamLogistic.value(f64::from(level), &self.params)
    }
}

impl Listener for LogisticListener {
    fn respond(&mut self, stimulus: &PresentedStimulus) -> Digits {
        // beta == 0 degenerates the logistic into a step; exactly at the
        // step the value is NaN, and the only sensible answer is a coin
        // flip.
        let p = match self.p_correct(stimulus.level) {
            p if p.is_nan() => 0.5,
            p => p,
        };
        if self.rng.gen_bool(p.clamp(0.0, 1.0)) {
            stimulus.label.clone()
        } else {
            garble(&stimulus.label)
        }
    }
}

/// Run `n_sessions` independent sessions in parallel.
///
/// `make_listener` receives the session number and must return a fresh
/// listener; determinism per session comes from the seed hierarchy, so
/// results are identical whatever the thread count.
pub fn simulate_sessions<L, F>(
    config: &TestConfig,
    catalogue: &dyn StimulusCatalogue,
    seeds: &SelectionSeeds,
    n_sessions: u64,
    make_listener: F,
) -> Result<Vec<SessionReport>, SessionError>
where
    L: Listener,
    F: Fn(u64) -> L + Sync,
{
    (0..n_sessions)
        .into_par_iter()
        .map(|session| {
            let mut listener = make_listener(session);
            run_session(config, catalogue, &mut listener, seeds, session)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dinlab_core::catalogue::InMemoryCatalogue;
    use dinlab_core::domain::StimulusId;

    fn catalogue(config: &TestConfig) -> InMemoryCatalogue {
        let mut cat = InMemoryCatalogue::new();
        for level in config.levels() {
            cat.insert(
                level,
                StimulusId::new(format!("snr{level:+03}/518.wav")),
                Digits::parse("518").unwrap(),
            );
        }
        cat
    }

    #[test]
    fn garble_never_matches_any_position() {
        for label in ["000", "123", "999", "905"] {
            let target = Digits::parse(label).unwrap();
            assert_eq!(target.matching_positions(&garble(&target)), 0);
        }
    }

    #[test]
    fn scripted_listener_follows_script() {
        let config = TestConfig::default();
        let cat = catalogue(&config);
        let seeds = SelectionSeeds::new(5);
        let mut listener = ScriptedListener::alternating();
        let report = run_session(&config, &cat, &mut listener, &seeds, 0).unwrap();
        for (i, trial) in report.trials.iter().enumerate() {
            assert_eq!(trial.is_fully_correct, i % 2 == 0);
        }
    }

    #[test]
    fn step_function_listener_flips_a_coin_at_its_threshold() {
        // beta == 0 with the stimulus exactly at alpha: p_correct is NaN
        // there, but responding must not panic and must still produce a
        // valid triplet.
        let mut listener = LogisticListener::new([0.0, 0.0, 0.0, 0.0], 1);
        assert!(listener.p_correct(0).is_nan());

        let config = TestConfig::default();
        let cat = catalogue(&config);
        let seeds = SelectionSeeds::new(5);
        let report = run_session(&config, &cat, &mut listener, &seeds, 0).unwrap();
        assert_eq!(report.trials.len(), 24);
    }

    #[test]
    fn logistic_listener_is_deterministic_per_seed() {
        let params = [-9.0, 1.2, 1.0 / 120.0, 0.01];
        let config = TestConfig::default();
        let cat = catalogue(&config);
        let seeds = SelectionSeeds::new(5);

        let a = run_session(&config, &cat, &mut LogisticListener::new(params, 1), &seeds, 0)
            .unwrap();
        let b = run_session(&config, &cat, &mut LogisticListener::new(params, 1), &seeds, 0)
            .unwrap();
        assert_eq!(a.trials, b.trials);
    }

    #[test]
    fn batch_simulation_is_order_independent() {
        let config = TestConfig::default();
        let cat = catalogue(&config);
        let seeds = SelectionSeeds::new(21);

        let batch = simulate_sessions(&config, &cat, &seeds, 4, |session| {
            LogisticListener::new([-9.0, 1.2, 1.0 / 120.0, 0.01], session)
        })
        .unwrap();

        // Session 2 run alone equals session 2 from the batch.
        let solo = run_session(
            &config,
            &cat,
            &mut LogisticListener::new([-9.0, 1.2, 1.0 / 120.0, 0.01], 2),
            &seeds,
            2,
        )
        .unwrap();
        assert_eq!(batch[2].trials, solo.trials);
        assert_eq!(batch[2].run_id, solo.run_id);
    }
}
