//! Report export — JSON with schema versioning, CSV trial logs.
//!
//! All persisted artifacts carry a `schema_version` field. Loads reject
//! versions newer than this build understands.

use anyhow::{bail, Context, Result};
use dinlab_core::domain::TrialRecord;

use crate::session::{SessionReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `SessionReport` to pretty JSON.
pub fn export_json(report: &SessionReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize SessionReport to JSON")
}

/// Deserialize a `SessionReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<SessionReport> {
    let report: SessionReport =
        serde_json::from_str(json).context("failed to deserialize SessionReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a trial log as CSV for external analysis tools.
///
/// Columns: sequence_index, level, target, response, correct_count,
/// fully_correct
pub fn export_trials_csv(trials: &[TrialRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "sequence_index",
        "level",
        "target",
        "response",
        "correct_count",
        "fully_correct",
    ])
    .context("failed to write CSV header")?;

    for trial in trials {
        wtr.write_record([
            trial.sequence_index.to_string(),
            trial.level.to_string(),
            trial.target.to_string(),
            trial.response.to_string(),
            trial.correct_count.to_string(),
            trial.is_fully_correct.to_string(),
        ])
        .context("failed to write CSV row")?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}
