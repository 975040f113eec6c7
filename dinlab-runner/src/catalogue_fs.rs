//! Catalogue construction from an audio tree.
//!
//! The on-disk layout is the reference deployment's:
//!
//! ```text
//! <root>/snr-04/123.wav
//! <root>/snr+02/907.wav
//! ```
//!
//! Level folders are `snr{level:+03}`; each wav's stem is its
//! ground-truth triplet. Files that don't fit the scheme are skipped
//! with a warning, so stray artwork or notes never poison the catalogue.

use anyhow::{Context, Result};
use dinlab_core::catalogue::InMemoryCatalogue;
use dinlab_core::domain::{Digits, StimulusId};
use std::path::Path;
use tracing::warn;

/// Parse a level folder name like `snr-04` or `snr+02`.
fn parse_level_dir(name: &str) -> Option<i32> {
    name.strip_prefix("snr")?.parse().ok()
}

/// Scan an audio tree into an in-memory catalogue.
///
/// Stimulus ids are paths relative to `root` (`snr-04/123.wav`), which
/// keeps them stable across machines sharing the same content bundle.
pub fn scan_catalogue(root: impl AsRef<Path>) -> Result<InMemoryCatalogue> {
    let root = root.as_ref();
    let mut catalogue = InMemoryCatalogue::new();

    for entry in std::fs::read_dir(root)
        .with_context(|| format!("failed to read audio root {}", root.display()))?
    {
        let dir = entry?.path();
        if !dir.is_dir() {
            continue;
        }
        let dir_name = dir.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let Some(level) = parse_level_dir(dir_name) else {
            warn!(dir = %dir.display(), "skipping non-level directory");
            continue;
        };

        for file in std::fs::read_dir(&dir)
            .with_context(|| format!("failed to read level directory {}", dir.display()))?
        {
            let path = file?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("wav") {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            let label = match Digits::parse(stem) {
                Ok(label) => label,
                Err(err) => {
                    warn!(file = %path.display(), %err, "skipping wav with non-triplet name");
                    continue;
                }
            };
            let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            catalogue.insert(
                level,
                StimulusId::new(format!("{dir_name}/{file_name}")),
                label,
            );
        }
    }

    Ok(catalogue)
}
