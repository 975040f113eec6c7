//! Session orchestration — drive one run to completion and analyze it.
//!
//! A session wires a [`RunState`] to a [`Listener`] (a human front-end or
//! a simulated subject), runs the fixed number of presentations, then
//! computes the SRT and both psychometric fits. The result is a
//! self-contained [`SessionReport`] suitable for persistence.

use crate::analysis::{
    compute_srt, fit_binned, AccuracyMode, BinnedAccuracy, BinnedProportions, Binning,
    EstimateError, PsychometricFit,
};
use chrono::{DateTime, Utc};
use dinlab_core::catalogue::StimulusCatalogue;
use dinlab_core::domain::{Digits, RunId, TestConfig, TrialRecord};
use dinlab_core::rng::SelectionSeeds;
use dinlab_core::staircase::{PresentedStimulus, RunState, StaircaseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Version stamp on every persisted report. Loads reject newer versions.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors from running a session end to end.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Staircase(#[from] StaircaseError),

    #[error(transparent)]
    Estimate(#[from] EstimateError),
}

/// A source of responses: the seam between the engine and whoever (or
/// whatever) is answering.
pub trait Listener {
    /// The triplet the listener enters after hearing `stimulus`.
    fn respond(&mut self, stimulus: &PresentedStimulus) -> Digits;
}

/// One accuracy mode's analysis output: the binned data always, the fit
/// only when the optimizer converged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub binned: BinnedProportions,
    pub fit: Option<PsychometricFit>,
    /// Human-readable optimizer failure, when `fit` is `None`.
    pub fit_error: Option<String>,
}

impl FitReport {
    /// Bin and fit one accuracy definition over a completed history.
    ///
    /// A non-converging fit is recorded, not propagated: the report keeps
    /// the raw binned proportions and a `None` threshold so downstream
    /// consumers see exactly what failed.
    pub fn build(history: &[TrialRecord], mode: AccuracyMode, binning: Binning) -> Self {
        let binned = BinnedAccuracy::accumulate(binning, history);
        let summary = binned.summary(mode);
        match fit_binned(&binned, mode) {
            Ok(fit) => FitReport { binned: summary, fit: Some(fit), fit_error: None },
            Err(err) => {
                warn!(?mode, %err, "psychometric fit failed");
                FitReport { binned: summary, fit: None, fit_error: Some(err.to_string()) }
            }
        }
    }

    pub fn threshold_50(&self) -> Option<f64> {
        self.fit.as_ref().and_then(|f| f.threshold_50)
    }
}

/// Complete, persistable record of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub schema_version: u32,
    /// Content hash of (config, master seed, session number).
    pub run_id: String,
    pub config: TestConfig,
    pub master_seed: u64,
    pub session: u64,
    pub completed_at: DateTime<Utc>,
    pub trials: Vec<TrialRecord>,
    /// Tail-average SRT in dB SNR.
    pub srt: f64,
    pub per_digit: FitReport,
    pub per_triplet: FitReport,
}

/// Run one session to completion and analyze it.
///
/// Stimulus selection draws from the deterministic sub-seed for
/// `(config, session)`, so a batch re-run with the same master seed
/// presents identical stimuli.
pub fn run_session<L: Listener>(
    config: &TestConfig,
    catalogue: &dyn StimulusCatalogue,
    listener: &mut L,
    seeds: &SelectionSeeds,
    session: u64,
) -> Result<SessionReport, SessionError> {
    let config_id = config.config_id();
    let run_id = RunId::new(config_id.clone(), seeds.master_seed(), session).hash();
    let mut rng = seeds.rng_for(&config_id, session);
    let mut state = RunState::new(config.clone())?;

    while !state.done() {
        let stimulus = state.present(catalogue, &mut rng)?.clone();
        let response = listener.respond(&stimulus);
        let record = state.record_triplet(response)?;
        debug!(
            sequence_index = record.sequence_index,
            level = record.level,
            correct = record.is_fully_correct,
            "trial scored"
        );
    }

    let report = analyze(config, state.history(), run_id, seeds.master_seed(), session)?;
    info!(
        run_id = %report.run_id,
        srt = report.srt,
        threshold_digit = ?report.per_digit.threshold_50(),
        threshold_triplet = ?report.per_triplet.threshold_50(),
        "session complete"
    );
    Ok(report)
}

/// Analyze an already-completed history (e.g. one replayed from storage).
pub fn analyze(
    config: &TestConfig,
    history: &[TrialRecord],
    run_id: String,
    master_seed: u64,
    session: u64,
) -> Result<SessionReport, SessionError> {
    let srt = compute_srt(config, history)?;
    let binning = Binning::default();
    Ok(SessionReport {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        master_seed,
        session,
        completed_at: Utc::now(),
        trials: history.to_vec(),
        srt,
        per_digit: FitReport::build(history, AccuracyMode::PerDigit, binning),
        per_triplet: FitReport::build(history, AccuracyMode::PerTriplet, binning),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::ScriptedListener;
    use dinlab_core::catalogue::InMemoryCatalogue;
    use dinlab_core::domain::StimulusId;

    fn catalogue(config: &TestConfig) -> InMemoryCatalogue {
        let mut cat = InMemoryCatalogue::new();
        for level in config.levels() {
            for label in ["123", "456", "789"] {
                cat.insert(
                    level,
                    StimulusId::new(format!("snr{level:+03}/{label}.wav")),
                    Digits::parse(label).unwrap(),
                );
            }
        }
        cat
    }

    #[test]
    fn session_produces_full_report() {
        let config = TestConfig::default();
        let cat = catalogue(&config);
        let seeds = SelectionSeeds::new(7);
        let mut listener = ScriptedListener::new(vec![true; 24]);

        let report = run_session(&config, &cat, &mut listener, &seeds, 0).unwrap();
        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert_eq!(report.trials.len(), 24);
        assert_eq!(report.srt, -18.0);
        assert!(report.trials.iter().all(|t| t.is_fully_correct));
    }

    #[test]
    fn sessions_reproduce_under_the_same_seed() {
        let config = TestConfig::default();
        let cat = catalogue(&config);
        let seeds = SelectionSeeds::new(7);

        let a = run_session(&config, &cat, &mut ScriptedListener::new(vec![true; 24]), &seeds, 3)
            .unwrap();
        let b = run_session(&config, &cat, &mut ScriptedListener::new(vec![true; 24]), &seeds, 3)
            .unwrap();
        assert_eq!(a.trials, b.trials);
        assert_eq!(a.run_id, b.run_id);

        let c = run_session(&config, &cat, &mut ScriptedListener::new(vec![true; 24]), &seeds, 4)
            .unwrap();
        assert_ne!(a.run_id, c.run_id);
    }

    #[test]
    fn report_serializes_round_trip() {
        let config = TestConfig::default();
        let cat = catalogue(&config);
        let seeds = SelectionSeeds::new(11);
        let mut listener = ScriptedListener::new((0..24).map(|i| i % 2 == 0).collect());

        let report = run_session(&config, &cat, &mut listener, &seeds, 0).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        let back: SessionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
