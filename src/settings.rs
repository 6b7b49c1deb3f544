//! Session configuration and debug flags
//!
//! Passed in at construction; nothing here is global or mutable at runtime. Persisted as
//! JSON next to the host's save data.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Render-only toggles, forwarded untouched in every snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderFlags {
    /// Hide the cabinet model around the playfield
    pub hide_cabinet: bool,
    /// Draw collider outlines
    pub show_colliders: bool,
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seeds tilt, rare rolls, bump impulses and autoplay positions
    pub seed: u64,

    // === Debug ===
    /// Skip the initial coin spawn on start/reset
    pub empty_pool: bool,
    /// Drop a coin at a random X every autoplay interval of simulation time
    pub autoplay: bool,
    /// Run the full substep budget every frame regardless of elapsed time
    pub max_speed: bool,
    /// Drops are never refused for lack of funds
    pub unlimited: bool,

    // === Render ===
    pub render: RenderFlags,

    /// Time budget for physics backend initialization (ms)
    pub init_budget_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x0C01_A5ED,
            empty_pool: false,
            autoplay: false,
            max_speed: false,
            unlimited: false,
            render: RenderFlags::default(),
            init_budget_ms: 2000,
        }
    }
}

impl SimConfig {
    /// Defaults with a specific seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from a JSON file, falling back to defaults when missing or malformed
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Ignoring malformed config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default config");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        log::info!("Config saved to {}", path.display());
        Ok(())
    }
}
