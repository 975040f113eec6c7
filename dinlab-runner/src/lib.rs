//! DinLab Runner — everything that consumes a run's trial log.
//!
//! - SRT tail-average and psychometric curve fitting (`analysis`)
//! - Session orchestration against a [`session::Listener`] (`session`)
//! - Simulated listeners and batch simulation (`simulate`)
//! - JSON persistence and CSV export (`store`, `export`)
//! - Catalogue construction from an audio tree (`catalogue_fs`)
//!
//! The analysis side is pure: trial log in, estimates out. Orchestration
//! and persistence wrap it with I/O and are the only places that touch
//! the filesystem.

pub mod analysis;
pub mod catalogue_fs;
pub mod export;
pub mod session;
pub mod simulate;
pub mod store;

pub use analysis::{
    compute_srt, fit_psychometric, AccuracyMode, BinnedProportions, Binning, BinningError,
    EstimateError, FitError, PsychometricFit,
};
pub use session::{run_session, FitReport, Listener, SessionError, SessionReport, SCHEMA_VERSION};
