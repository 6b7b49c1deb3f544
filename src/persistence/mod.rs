//! Economy save/restore
//!
//! Only balance, score and net profit survive a session. Coin bodies are never saved;
//! a restored session starts from a fresh layout.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sim::EconomySnapshot;

/// Current envelope format version
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug)]
pub enum PersistenceError {
    Json(serde_json::Error),
    /// Written by a newer build
    UnsupportedVersion(u32),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Json(e) => write!(f, "malformed save: {}", e),
            PersistenceError::UnsupportedVersion(v) => {
                write!(f, "save version {} not supported (max {})", v, SAVE_VERSION)
            }
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Json(e) => Some(e),
            PersistenceError::UnsupportedVersion(_) => None,
        }
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        PersistenceError::Json(e)
    }
}

/// Versioned economy save
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaveEnvelope {
    pub version: u32,
    /// Host wall-clock time of the save (ms)
    pub saved_at_ms: f64,
    pub economy: EconomySnapshot,
}

impl SaveEnvelope {
    pub fn new(economy: EconomySnapshot, saved_at_ms: f64) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at_ms,
            economy,
        }
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and version-check a save
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let envelope: Self = serde_json::from_str(json)?;
        if envelope.version > SAVE_VERSION {
            return Err(PersistenceError::UnsupportedVersion(envelope.version));
        }
        Ok(envelope)
    }
}
