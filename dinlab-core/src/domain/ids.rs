use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for one stimulus recording in the catalogue.
///
/// Opaque to the engine; hosts typically use a relative file path or a
/// database key (e.g. `snr-04/127.wav`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StimulusId(pub String);

impl StimulusId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for StimulusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic configuration ID (content hash of the test parameters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigId(pub String);

impl ConfigId {
    pub fn from_hash(hash: &str) -> Self {
        Self(hash.to_string())
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic run ID (config + master seed + session number).
///
/// Two runs with the same config, seed, and session number present the
/// same stimuli in the same order, so the ID doubles as a reproducibility
/// handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId {
    pub config_id: ConfigId,
    pub master_seed: u64,
    pub session: u64,
}

impl RunId {
    pub fn new(config_id: ConfigId, master_seed: u64, session: u64) -> Self {
        Self { config_id, master_seed, session }
    }

    /// Generate a deterministic run hash.
    /// Uses BLAKE3 for stable, collision-resistant hashing across builds/platforms.
    pub fn hash(&self) -> String {
        use serde_json::json;

        // Canonical serialization (sorted keys)
        let canonical = json!({
            "config_id": &self.config_id.0,
            "master_seed": self.master_seed,
            "session": self.session,
        });

        let hash_bytes = blake3::hash(canonical.to_string().as_bytes());
        hash_bytes.to_hex().to_string()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.config_id, self.master_seed, self.session)
    }
}
