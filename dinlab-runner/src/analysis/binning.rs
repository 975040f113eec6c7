//! Accuracy binning — from a trial log to per-bin proportions correct.
//!
//! The staircase concentrates trials near threshold and leaves the
//! extremes sparse, so the fitter needs proportions over SNR bins with
//! the empty extremes filled in: chance performance below the lowest
//! populated bin, a plateau above the highest.

use dinlab_core::domain::TrialRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from constructing a [`Binning`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BinningError {
    #[error("bin width must be positive, got {0}")]
    NonPositiveWidth(i32),

    #[error("lower_bound {lower} must be below upper_bound {upper}")]
    EmptyRange { lower: i32, upper: i32 },

    #[error("range [{lower}, {upper}] is not a whole number of bins of width {width}")]
    MisalignedRange { lower: i32, upper: i32, width: i32 },
}

/// Which definition of "correct" feeds the psychometric fit.
///
/// The two modes have different chance floors: guessing one digit out of
/// ten is 1/10, guessing a whole triplet is ~1/120. Both fits are run per
/// session because digit scoring has a partial-credit floor that triplet
/// scoring lacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyMode {
    /// Numerator is the positionwise match count, denominator `trials * 3`.
    PerDigit,
    /// Numerator counts fully correct trials, denominator `trials`.
    PerTriplet,
}

impl AccuracyMode {
    /// Expected proportion correct when the listener hears nothing.
    pub fn chance_level(self) -> f64 {
        match self {
            AccuracyMode::PerDigit => 1.0 / 10.0,
            AccuracyMode::PerTriplet => 1.0 / 120.0,
        }
    }
}

/// Uniform SNR bins over the test's level range.
///
/// Bins are half-open with inclusive right edges: bin `i` covers
/// `(lower + i*width, lower + (i+1)*width]`. A level exactly on an
/// interior edge belongs to the bin ending there, and the lower bound
/// itself joins the first bin, so every level in `[lower, upper]` lands
/// in exactly one bin.
///
/// Construction goes through [`Binning::new`], so an instance always has
/// at least one bin and the index math cannot underflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binning {
    lower_bound: i32,
    upper_bound: i32,
    bin_width: i32,
}

impl Default for Binning {
    fn default() -> Self {
        Self { lower_bound: -20, upper_bound: 10, bin_width: 2 }
    }
}

impl Binning {
    /// Validated construction, mirroring `TestConfig::validate`.
    pub fn new(lower_bound: i32, upper_bound: i32, bin_width: i32) -> Result<Self, BinningError> {
        if bin_width <= 0 {
            return Err(BinningError::NonPositiveWidth(bin_width));
        }
        if lower_bound >= upper_bound {
            return Err(BinningError::EmptyRange { lower: lower_bound, upper: upper_bound });
        }
        if (upper_bound - lower_bound) % bin_width != 0 {
            return Err(BinningError::MisalignedRange {
                lower: lower_bound,
                upper: upper_bound,
                width: bin_width,
            });
        }
        Ok(Self { lower_bound, upper_bound, bin_width })
    }

    pub fn lower_bound(&self) -> i32 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> i32 {
        self.upper_bound
    }

    pub fn bin_width(&self) -> i32 {
        self.bin_width
    }

    pub fn bin_count(&self) -> usize {
        ((self.upper_bound - self.lower_bound) / self.bin_width) as usize
    }

    /// Bin index for a level. Levels outside the range clamp to the
    /// outermost bins.
    pub fn index_of(&self, level: i32) -> usize {
        let offset = level - self.lower_bound;
        if offset <= 0 {
            return 0;
        }
        let idx = (offset + self.bin_width - 1) / self.bin_width - 1;
        (idx as usize).min(self.bin_count() - 1)
    }

    /// Midpoint of a bin, the x-coordinate used by the fitter.
    pub fn center(&self, index: usize) -> f64 {
        self.lower_bound as f64 + (index as f64 + 0.5) * self.bin_width as f64
    }

    pub fn centers(&self) -> Vec<f64> {
        (0..self.bin_count()).map(|i| self.center(i)).collect()
    }
}

/// Raw per-bin tallies accumulated from a trial log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinnedAccuracy {
    pub binning: Binning,
    /// Presentations per bin.
    pub trials: Vec<u32>,
    /// Sum of positionwise match counts per bin (0..=3 per trial).
    pub digit_correct: Vec<u32>,
    /// Fully correct trials per bin.
    pub triplet_correct: Vec<u32>,
}

impl BinnedAccuracy {
    pub fn accumulate(binning: Binning, history: &[TrialRecord]) -> Self {
        let n = binning.bin_count();
        let mut trials = vec![0u32; n];
        let mut digit_correct = vec![0u32; n];
        let mut triplet_correct = vec![0u32; n];

        for trial in history {
            let i = binning.index_of(trial.level);
            trials[i] += 1;
            digit_correct[i] += u32::from(trial.correct_count);
            triplet_correct[i] += u32::from(trial.is_fully_correct);
        }

        Self { binning, trials, digit_correct, triplet_correct }
    }

    /// Empirical proportion correct per populated bin, `None` where no
    /// trials landed.
    pub fn proportions(&self, mode: AccuracyMode) -> Vec<Option<f64>> {
        (0..self.binning.bin_count())
            .map(|i| {
                if self.trials[i] == 0 {
                    return None;
                }
                Some(match mode {
                    AccuracyMode::PerDigit => {
                        f64::from(self.digit_correct[i]) / (f64::from(self.trials[i]) * 3.0)
                    }
                    AccuracyMode::PerTriplet => {
                        f64::from(self.triplet_correct[i]) / f64::from(self.trials[i])
                    }
                })
            })
            .collect()
    }

    /// Proportions with the sparse extremes filled in for fitting.
    ///
    /// Bins below the lowest populated one get
    /// `min(chance, p_at_lowest)` — performance cannot be better than at
    /// the lowest observed SNR, and at very poor SNR it approaches
    /// chance. Bins above the highest populated one repeat the value at
    /// the highest, a plateau at ceiling. The staircase moves one bin
    /// width at a time, so the populated bins form a contiguous band and
    /// no interior bin needs filling.
    pub fn filled_proportions(&self, mode: AccuracyMode) -> Vec<f64> {
        let raw = self.proportions(mode);
        let mut filled: Vec<f64> = raw.iter().map(|p| p.unwrap_or(0.0)).collect();

        let populated: Vec<usize> = raw
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|_| i))
            .collect();
        let (Some(&lowest), Some(&highest)) = (populated.first(), populated.last()) else {
            return filled;
        };

        let floor = mode.chance_level().min(filled[lowest]);
        for value in filled.iter_mut().take(lowest) {
            *value = floor;
        }
        let plateau = filled[highest];
        for value in filled.iter_mut().skip(highest + 1) {
            *value = plateau;
        }
        filled
    }

    /// Serializable summary for reports: centers, counts, and the filled
    /// proportions actually handed to the fitter.
    pub fn summary(&self, mode: AccuracyMode) -> BinnedProportions {
        BinnedProportions {
            mode,
            centers: self.binning.centers(),
            trials: self.trials.clone(),
            proportions: self.filled_proportions(mode),
        }
    }
}

/// Binned accuracy as persisted alongside fit results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinnedProportions {
    pub mode: AccuracyMode,
    pub centers: Vec<f64>,
    pub trials: Vec<u32>,
    pub proportions: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use dinlab_core::domain::Digits;

    fn digits(s: &str) -> Digits {
        Digits::parse(s).unwrap()
    }

    fn trial(level: i32, index: u32, response: &str) -> TrialRecord {
        TrialRecord::score(level, index, digits("123"), digits(response))
    }

    #[test]
    fn degenerate_binnings_are_rejected_at_construction() {
        // A zero-span range cannot reach index_of or accumulate.
        assert_eq!(
            Binning::new(0, 0, 2),
            Err(BinningError::EmptyRange { lower: 0, upper: 0 })
        );
        assert_eq!(
            Binning::new(10, -20, 2),
            Err(BinningError::EmptyRange { lower: 10, upper: -20 })
        );
        assert_eq!(Binning::new(-20, 10, 0), Err(BinningError::NonPositiveWidth(0)));
        assert_eq!(Binning::new(-20, 10, -2), Err(BinningError::NonPositiveWidth(-2)));
        assert_eq!(
            Binning::new(-20, 10, 4),
            Err(BinningError::MisalignedRange { lower: -20, upper: 10, width: 4 })
        );
    }

    #[test]
    fn constructed_binning_matches_default() {
        let binning = Binning::new(-20, 10, 2).unwrap();
        assert_eq!(binning, Binning::default());
        assert_eq!(binning.bin_count(), 15);
        // Smallest valid binning still has one bin for every level.
        let tiny = Binning::new(0, 2, 2).unwrap();
        assert_eq!(tiny.bin_count(), 1);
        assert_eq!(tiny.index_of(-5), 0);
        assert_eq!(tiny.index_of(5), 0);
    }

    #[test]
    fn default_binning_has_fifteen_bins() {
        let binning = Binning::default();
        assert_eq!(binning.bin_count(), 15);
        assert_eq!(binning.center(0), -19.0);
        assert_eq!(binning.center(14), 9.0);
    }

    #[test]
    fn edge_levels_land_in_exactly_one_bin() {
        let binning = Binning::default();
        // An interior edge belongs to the bin ending there.
        assert_eq!(binning.index_of(-18), 0);
        assert_eq!(binning.index_of(-17), 1);
        assert_eq!(binning.index_of(-16), 1);
        // The bounds themselves.
        assert_eq!(binning.index_of(-20), 0);
        assert_eq!(binning.index_of(10), 14);
        // Every even level maps somewhere, and counts add up to one per level.
        let mut counts = vec![0u32; binning.bin_count()];
        for level in (-20..=10).step_by(2) {
            counts[binning.index_of(level)] += 1;
        }
        assert_eq!(counts.iter().sum::<u32>(), 16);
    }

    #[test]
    fn accumulates_both_accuracy_modes() {
        let binning = Binning::default();
        let history = vec![
            trial(-4, 1, "123"), // 3 digits, fully correct
            trial(-4, 2, "124"), // 2 digits
            trial(-4, 3, "000"), // 0 digits
        ];
        let binned = BinnedAccuracy::accumulate(binning, &history);
        let i = binning.index_of(-4);
        assert_eq!(binned.trials[i], 3);
        assert_eq!(binned.digit_correct[i], 5);
        assert_eq!(binned.triplet_correct[i], 1);

        let per_digit = binned.proportions(AccuracyMode::PerDigit);
        assert_eq!(per_digit[i], Some(5.0 / 9.0));
        let per_triplet = binned.proportions(AccuracyMode::PerTriplet);
        assert_eq!(per_triplet[i], Some(1.0 / 3.0));
    }

    #[test]
    fn empty_bins_have_no_proportion() {
        let binned = BinnedAccuracy::accumulate(Binning::default(), &[trial(0, 1, "123")]);
        let raw = binned.proportions(AccuracyMode::PerTriplet);
        assert_eq!(raw.iter().filter(|p| p.is_some()).count(), 1);
    }

    #[test]
    fn fill_extends_chance_floor_and_ceiling_plateau() {
        let binning = Binning::default();
        // Populated band: levels -6 (half right) and -4 (all right).
        let history = vec![
            trial(-6, 1, "123"),
            trial(-6, 2, "000"),
            trial(-4, 3, "123"),
        ];
        let binned = BinnedAccuracy::accumulate(binning, &history);
        let filled = binned.filled_proportions(AccuracyMode::PerTriplet);

        let lo = binning.index_of(-6);
        let hi = binning.index_of(-4);
        // Below the band: chance (1/120 < 0.5 at the lowest populated bin).
        for &p in &filled[..lo] {
            assert!((p - 1.0 / 120.0).abs() < 1e-12);
        }
        assert_eq!(filled[lo], 0.5);
        assert_eq!(filled[hi], 1.0);
        // Above the band: plateau at the highest populated value.
        for &p in &filled[hi + 1..] {
            assert_eq!(p, 1.0);
        }
    }

    #[test]
    fn fill_floor_is_capped_by_lowest_observed_proportion() {
        let binning = Binning::default();
        // Lowest populated bin performs below digit chance: the floor
        // extends that observation, not chance.
        let history = vec![trial(-16, 1, "000"), trial(-4, 2, "123")];
        let binned = BinnedAccuracy::accumulate(binning, &history);
        let filled = binned.filled_proportions(AccuracyMode::PerDigit);
        assert_eq!(binning.index_of(-16), 1);
        assert_eq!(filled[0], 0.0);
    }
}
