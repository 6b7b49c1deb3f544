//! Sound and telemetry event notifications
//!
//! The simulation only names what happened; hosts decide what it sounds like. Events are
//! collected during a frame and handed out with the frame report, so a slow sink can never
//! stall physics.

use serde::{Deserialize, Serialize};

/// Discrete game events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundEffect {
    /// A drop was accepted and a coin spawned
    CoinDrop,
    /// Standard coin fell off the collection edge
    CoinCollect,
    /// Rare coin fell off the collection edge
    RareCollect,
    /// Cabinet was bumped
    Bump,
    /// Streak threshold reached, bonus paid
    WinStreak,
    /// Drop refused for funds, or balance hit zero or below
    OutOfFunds,
}

impl SoundEffect {
    /// Wire name used by telemetry hosts
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundEffect::CoinDrop => "coin_drop",
            SoundEffect::CoinCollect => "coin_collect",
            SoundEffect::RareCollect => "rare_collect",
            SoundEffect::Bump => "bump",
            SoundEffect::WinStreak => "win_streak",
            SoundEffect::OutOfFunds => "out_of_funds",
        }
    }
}

/// Fire-and-forget receiver of game events
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);
}

/// Sink that logs every event. Used by the headless host.
#[derive(Debug)]
pub struct LogAudio {
    muted: bool,
    played: u64,
}

impl Default for LogAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl LogAudio {
    pub fn new() -> Self {
        Self {
            muted: false,
            played: 0,
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Events received so far, muted ones included
    pub fn played(&self) -> u64 {
        self.played
    }
}

impl AudioSink for LogAudio {
    fn play(&mut self, effect: SoundEffect) {
        self.played += 1;
        if self.muted {
            return;
        }
        log::debug!("sfx {}", effect.as_str());
    }
}
