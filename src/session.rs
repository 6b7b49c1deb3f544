//! Frame driver
//!
//! A [`Session`] owns the game state and turns host frames (wall-clock timestamps) into
//! fixed simulation steps. Hosts call [`Session::frame`] once per display frame and either
//! queue input for the next frame or call the direct methods between frames.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::audio::SoundEffect;
use crate::persistence::SaveEnvelope;
use crate::settings::SimConfig;
use crate::sim::{
    DropOutcome, DropRejection, EconomySnapshot, EngineError, GamePhase, GameState,
    RenderSnapshot, SessionStats, tick,
};

/// Host input, applied at the start of the next frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputCommand {
    /// Drop a coin at this X (clamped to the playfield)
    Drop(f32),
    Bump,
    /// Discards everything issued before it, including earlier queued commands' results
    Reset,
    TogglePause,
}

/// Everything a host needs after one frame
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub snapshot: RenderSnapshot,
    pub economy: EconomySnapshot,
    pub stats: SessionStats,
    pub phase: GamePhase,
    /// Events raised since the previous frame, in order
    pub events: Vec<SoundEffect>,
    /// Results of queued drops, in queue order
    pub drop_results: Vec<DropOutcome>,
    /// Fixed steps run this frame
    pub substeps: u32,
    /// Frames per second, reported once per wall-clock second
    pub fps: Option<u32>,
}

/// Counts frames over one-second wall-clock windows
#[derive(Debug, Default)]
struct FpsCounter {
    window_start_ms: Option<f64>,
    frames: u32,
}

impl FpsCounter {
    fn frame(&mut self, now_ms: f64) -> Option<u32> {
        let start = *self.window_start_ms.get_or_insert(now_ms);
        self.frames += 1;
        let elapsed = now_ms - start;
        if elapsed < 1000.0 {
            return None;
        }
        let fps = (self.frames as f64 * 1000.0 / elapsed).round() as u32;
        self.window_start_ms = Some(now_ms);
        self.frames = 0;
        Some(fps)
    }
}

pub struct Session {
    /// `None` once stopped
    state: Option<GameState>,
    last_frame_ms: Option<f64>,
    pending: VecDeque<InputCommand>,
    fps: FpsCounter,
}

impl Session {
    /// Create the physics world, build the cabinet and spawn the starting coins
    pub fn new(config: SimConfig) -> Result<Self, EngineError> {
        Ok(Self::from_state(GameState::new(config)?))
    }

    /// Like [`Session::new`], with balance/score/net profit taken from a save
    pub fn with_restored(config: SimConfig, envelope: &SaveEnvelope) -> Result<Self, EngineError> {
        log::info!(
            "Restoring economy: balance {}, score {}",
            envelope.economy.balance,
            envelope.economy.score
        );
        Ok(Self::from_state(GameState::with_economy(
            config,
            Some(envelope.economy),
        )?))
    }

    fn from_state(state: GameState) -> Self {
        Self {
            state: Some(state),
            last_frame_ms: None,
            pending: VecDeque::new(),
            fps: FpsCounter::default(),
        }
    }

    /// Advance by the wall-clock time since the previous frame.
    ///
    /// Queued input is applied first. Returns `None` once the session is stopped.
    pub fn frame(&mut self, now_ms: f64) -> Option<FrameReport> {
        let state = self.state.as_mut()?;

        let mut drop_results = Vec::new();
        while let Some(command) = self.pending.pop_front() {
            match command {
                InputCommand::Drop(x) => drop_results.push(state.drop_coin(x)),
                InputCommand::Bump => {
                    state.bump();
                }
                InputCommand::Reset => {
                    state.reset();
                    drop_results.clear();
                }
                InputCommand::TogglePause => {
                    state.toggle_pause();
                }
            }
        }

        let dt = match self.last_frame_ms {
            Some(last) => (now_ms - last) / 1000.0,
            None => 0.0,
        };
        self.last_frame_ms = Some(now_ms);

        let mut substeps = 0;
        if state.phase() == GamePhase::Running {
            if state.config.max_speed {
                while substeps < state.clock.max_substeps() {
                    tick(state);
                    state.clock.force_step();
                    substeps += 1;
                }
            } else {
                state.clock.accumulate(dt);
                while state.clock.should_step(substeps) {
                    tick(state);
                    state.clock.consume_step();
                    substeps += 1;
                }
                state.clock.drop_backlog();
            }
        }

        let fps = self.fps.frame(now_ms);
        if let Some(fps) = fps {
            log::debug!("fps {} ({} coins)", fps, state.live_coins());
        }

        Some(FrameReport {
            snapshot: state.snapshot(),
            economy: state.economy.snapshot(),
            stats: state.stats,
            phase: state.phase(),
            events: state.take_events(),
            drop_results,
            substeps,
            fps,
        })
    }

    /// Record input for the start of the next frame. Ignored once stopped.
    pub fn queue(&mut self, command: InputCommand) {
        if self.state.is_some() {
            self.pending.push_back(command);
        }
    }

    pub fn drop_coin(&mut self, x: f32) -> DropOutcome {
        match self.state.as_mut() {
            Some(state) => state.drop_coin(x),
            None => DropOutcome::Rejected(DropRejection::Stopped),
        }
    }

    /// Returns whether the bump happened
    pub fn bump(&mut self) -> bool {
        self.state.as_mut().is_some_and(GameState::bump)
    }

    /// Back to the starting layout and economy. Input queued before the reset is dropped
    /// and its events are discarded, the same as a queued [`InputCommand::Reset`].
    pub fn reset(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.reset();
            self.pending.clear();
        }
    }

    /// Returns the new paused state, `None` once stopped
    pub fn toggle_pause(&mut self) -> Option<bool> {
        self.state.as_mut().map(GameState::toggle_pause)
    }

    /// Release the world and every body. Returns `false` if already stopped.
    pub fn stop(&mut self) -> bool {
        match self.state.take() {
            Some(state) => {
                log::info!(
                    "Session stopped: balance {}, {} coins live",
                    state.economy.balance(),
                    state.live_coins()
                );
                self.pending.clear();
                true
            }
            None => false,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.state.is_none()
    }

    /// Read-only view of the running state. Mutation goes through the session.
    ///
    /// ```compile_fail
    /// use coin_pusher::sim::CoinKind;
    /// use coin_pusher::{Session, SimConfig};
    ///
    /// let session = Session::new(SimConfig::default()).unwrap();
    /// let state = session.state().unwrap();
    /// state.economy.collect(CoinKind::Rare, 0.0);
    /// ```
    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    pub fn economy_snapshot(&self) -> Option<EconomySnapshot> {
        self.state.as_ref().map(|s| s.economy.snapshot())
    }

    /// Envelope for the host to persist
    pub fn save_envelope(&self, now_ms: f64) -> Option<SaveEnvelope> {
        self.economy_snapshot()
            .map(|economy| SaveEnvelope::new(economy, now_ms))
    }
}
