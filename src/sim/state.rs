//! Game state and core simulation types
//!
//! Owns the physics world, both coin pools, the pusher, the economy and the clock. Only
//! the session mutates it, strictly between or inside frames, never concurrently.

use std::time::Duration;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::clock::SimulationClock;
use super::economy::{DropOutcome, DropRejection, EconomySnapshot, EconomyState};
use super::playfield::Playfield;
use super::pool::{CoinKind, CoinPool};
use super::pusher::PusherActuator;
use super::snapshot::RenderSnapshot;
use super::world::{EngineError, RigidBodyWorld};
use crate::audio::SoundEffect;
use crate::clamp_drop_x;
use crate::consts::*;
use crate::settings::SimConfig;

/// Current phase of the simulation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Running,
    /// No stepping, no exits, no drops or bumps; state is still reported
    Paused,
}

/// Running totals for the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub drops: u64,
    pub bumps: u64,
    pub collected: u64,
    pub rare_collected: u64,
    pub lost: u64,
    pub streak_bonuses: u64,
}

/// Complete simulation state
///
/// Read-only outside the crate: balance, score and pools change only through
/// [`GameState::drop_coin`], [`GameState::bump`], [`GameState::reset`] and the step.
pub struct GameState {
    pub(crate) config: SimConfig,
    pub(crate) world: RigidBodyWorld,
    pub(crate) playfield: Playfield,
    pub(crate) coins: CoinPool,
    pub(crate) rare_coins: CoinPool,
    pub(crate) pusher: PusherActuator,
    pub(crate) economy: EconomyState,
    pub(crate) clock: SimulationClock,
    pub(crate) stats: SessionStats,
    rng: Pcg32,
    /// Simulation time (ms) of the next autoplay drop
    next_autoplay_ms: f64,
    /// Events raised since the last drain
    events: Vec<SoundEffect>,
}

impl GameState {
    /// Build the world and cabinet, then lay out the starting coins
    pub fn new(config: SimConfig) -> Result<Self, EngineError> {
        Self::with_economy(config, None)
    }

    /// Like [`GameState::new`] but seeding balance/score/net profit from a save.
    /// Coins always start from a fresh layout.
    pub fn with_economy(
        config: SimConfig,
        saved: Option<EconomySnapshot>,
    ) -> Result<Self, EngineError> {
        let mut world = RigidBodyWorld::new(
            Vec3::new(0.0, GRAVITY, 0.0),
            SIM_DT,
            Duration::from_millis(config.init_budget_ms),
        )?;
        let pusher = PusherActuator::default();
        let playfield = Playfield::build(&mut world, pusher.target_at(0.0));
        let economy = match saved {
            Some(snapshot) => EconomyState::restored(snapshot, config.unlimited),
            None => EconomyState::new(config.unlimited),
        };

        let mut state = Self {
            rng: Pcg32::seed_from_u64(config.seed),
            config,
            world,
            playfield,
            coins: CoinPool::new(CoinKind::Standard),
            rare_coins: CoinPool::new(CoinKind::Rare),
            pusher,
            economy,
            clock: SimulationClock::default(),
            stats: SessionStats::default(),
            next_autoplay_ms: AUTOPLAY_INTERVAL_MS,
            events: Vec::new(),
        };

        if !state.config.empty_pool {
            state.spawn_initial_coins();
        }

        log::info!(
            "Session state ready: {} coins, balance {}",
            state.coins.len(),
            state.economy.balance()
        );
        Ok(state)
    }

    pub fn phase(&self) -> GamePhase {
        if self.economy.is_paused() {
            GamePhase::Paused
        } else {
            GamePhase::Running
        }
    }

    /// Lay coins on a jittered grid starting just in front of the pusher at rest, so the
    /// first rows sit inside its stroke
    fn spawn_initial_coins(&mut self) {
        const COLUMNS: usize = 10;
        let spacing_x = 2.0 * (FIELD_HALF_WIDTH - COIN_RADIUS) / (COLUMNS - 1) as f32;
        let spacing_z = 2.2 * COIN_RADIUS;
        let front_of_pusher = PUSHER_REST_Z + PUSHER_HALF_EXTENTS[2] + COIN_RADIUS + 0.05;

        for i in 0..INITIAL_COIN_COUNT {
            let col = i % COLUMNS;
            let row = i / COLUMNS;
            // Columns already touch, so only rows get jitter
            let jitter_z = self.rng.random_range(-0.03..=0.03);
            let position = Vec3::new(
                -FIELD_HALF_WIDTH + COIN_RADIUS + col as f32 * spacing_x,
                FLOOR_TOP_Y + COIN_HALF_THICKNESS + 0.1,
                front_of_pusher + row as f32 * spacing_z + jitter_z,
            );
            if self
                .coins
                .try_spawn(&mut self.world, &mut self.rng, position)
                .is_none()
            {
                break;
            }
        }
    }

    /// Clear both pools, the economy and pending events, then respawn the starting layout
    pub fn reset(&mut self) {
        self.coins.clear(&mut self.world);
        self.rare_coins.clear(&mut self.world);
        self.economy.reset();
        self.clock.reset();
        self.stats = SessionStats::default();
        self.next_autoplay_ms = AUTOPLAY_INTERVAL_MS;
        self.events.clear();
        // Back to rest before respawning, so the new layout never overlaps the pusher
        self.world
            .teleport(&self.playfield.pusher, self.pusher.target_at(0.0));
        if !self.config.empty_pool {
            self.spawn_initial_coins();
        }
        log::info!("Reset: {} coins, balance {}", self.coins.len(), self.economy.balance());
    }

    /// Drop a coin at `x`. Charged only when a coin actually spawns.
    pub fn drop_coin(&mut self, x: f32) -> DropOutcome {
        if let Err(rejection) = self.economy.can_drop() {
            if rejection == DropRejection::InsufficientFunds {
                self.events.push(SoundEffect::OutOfFunds);
            }
            log::warn!("Drop rejected: {:?}", rejection);
            return DropOutcome::Rejected(rejection);
        }

        let kind = CoinKind::roll(&mut self.rng);
        let pool = match kind {
            CoinKind::Standard => &mut self.coins,
            CoinKind::Rare => &mut self.rare_coins,
        };
        if pool.is_full() {
            log::debug!("{:?} pool full, drop skipped", kind);
            return DropOutcome::PoolFull { kind };
        }

        if let Err(rejection) = self.economy.drop_coin() {
            return DropOutcome::Rejected(rejection);
        }
        let position = Vec3::new(clamp_drop_x(x), DROP_HEIGHT, DROP_Z);
        pool.try_spawn(&mut self.world, &mut self.rng, position);

        self.stats.drops += 1;
        self.events.push(SoundEffect::CoinDrop);
        if self.economy.is_out_of_funds() {
            self.events.push(SoundEffect::OutOfFunds);
        }
        log::debug!("Dropped {:?} coin at x={:.2}", kind, position.x);
        DropOutcome::Accepted { kind }
    }

    /// Shake the cabinet. Charged even when it drives the balance negative.
    /// Returns `false` (and does nothing) while paused.
    pub fn bump(&mut self) -> bool {
        if self.economy.is_paused() {
            return false;
        }
        self.economy.bump();
        self.coins.bump(&mut self.world, &mut self.rng);
        self.rare_coins.bump(&mut self.world, &mut self.rng);

        self.stats.bumps += 1;
        self.events.push(SoundEffect::Bump);
        if self.economy.is_out_of_funds() {
            self.events.push(SoundEffect::OutOfFunds);
        }
        log::debug!(
            "Bump: {} bodies kicked, balance {}",
            self.coins.len() + self.rare_coins.len(),
            self.economy.balance()
        );
        true
    }

    /// Returns the new paused state
    pub fn toggle_pause(&mut self) -> bool {
        let paused = self.economy.toggle_pause();
        log::info!("{}", if paused { "Paused" } else { "Resumed" });
        paused
    }

    /// Fire an autoplay drop if one is due at `now_ms` of simulation time
    pub(crate) fn autoplay(&mut self, now_ms: f64) {
        if !self.config.autoplay || now_ms < self.next_autoplay_ms {
            return;
        }
        self.next_autoplay_ms += AUTOPLAY_INTERVAL_MS;
        let x = self.rng.random_range(-FIELD_HALF_WIDTH..=FIELD_HALF_WIDTH);
        self.drop_coin(x);
    }

    pub(crate) fn push_event(&mut self, effect: SoundEffect) {
        self.events.push(effect);
    }

    /// Hand over events raised since the last call
    pub fn take_events(&mut self) -> Vec<SoundEffect> {
        std::mem::take(&mut self.events)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn world(&self) -> &RigidBodyWorld {
        &self.world
    }

    pub fn playfield(&self) -> &Playfield {
        &self.playfield
    }

    /// Standard coin pool
    pub fn coins(&self) -> &CoinPool {
        &self.coins
    }

    pub fn rare_coins(&self) -> &CoinPool {
        &self.rare_coins
    }

    pub fn pusher(&self) -> &PusherActuator {
        &self.pusher
    }

    pub fn economy(&self) -> &EconomyState {
        &self.economy
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Current pusher center
    pub fn pusher_position(&self) -> Vec3 {
        self.world.pose(&self.playfield.pusher).position
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::capture(
            &self.world,
            &self.coins,
            &self.rare_coins,
            self.pusher_position(),
            self.config.render,
        )
    }

    /// Live coins across both pools
    pub fn live_coins(&self) -> usize {
        self.coins.len() + self.rare_coins.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(config: SimConfig) -> GameState {
        GameState::new(config).expect("state")
    }

    #[test]
    fn test_initial_layout() {
        let s = state(SimConfig::default());
        assert_eq!(s.coins.len(), INITIAL_COIN_COUNT);
        assert!(s.rare_coins.is_empty());
        assert_eq!(s.phase(), GamePhase::Running);
        assert_eq!(
            s.world.body_count(),
            s.playfield.body_count() + INITIAL_COIN_COUNT
        );
        // Every starting coin is clear of the pusher at rest and short of the edge
        let rest_face = PUSHER_REST_Z + PUSHER_HALF_EXTENTS[2];
        let reach = rest_face + PUSHER_AMPLITUDE;
        let mut nearest = f32::MAX;
        for coin in s.coins.iter() {
            let p = s.world.pose(coin.handle()).position;
            assert!(p.z - COIN_RADIUS > rest_face && p.z < COLLECTION_EDGE_Z, "z={}", p.z);
            assert!(p.x.abs() < FIELD_HALF_WIDTH);
            nearest = nearest.min(p.z);
        }
        // The first row is inside the stroke, so the pusher moves it on its first pass
        assert!(nearest < reach, "nearest row at z={nearest}");
    }

    #[test]
    fn test_reset_returns_pusher_to_rest() {
        let mut s = state(SimConfig::default());
        // Quarter period: pusher fully forward
        let quarter = (PUSHER_PERIOD as f64 / 4.0 / SIM_DT).round() as usize;
        for _ in 0..quarter {
            crate::sim::tick(&mut s);
            s.clock.force_step();
        }
        assert!(s.pusher_position().z > PUSHER_REST_Z + PUSHER_AMPLITUDE / 2.0);

        s.reset();
        assert!((s.pusher_position().z - PUSHER_REST_Z).abs() < 1e-4);
        let rest_face = PUSHER_REST_Z + PUSHER_HALF_EXTENTS[2];
        for coin in s.coins.iter() {
            assert!(s.world.pose(coin.handle()).position.z - COIN_RADIUS > rest_face);
        }
    }

    #[test]
    fn test_empty_pool_flag() {
        let s = state(SimConfig {
            empty_pool: true,
            ..SimConfig::default()
        });
        assert_eq!(s.live_coins(), 0);
        assert_eq!(s.world.body_count(), s.playfield.body_count());
    }

    #[test]
    fn test_drop_spawns_and_charges() {
        let mut s = state(SimConfig {
            empty_pool: true,
            ..SimConfig::default()
        });
        let out = s.drop_coin(0.5);
        assert!(matches!(out, DropOutcome::Accepted { .. }));
        assert_eq!(s.live_coins(), 1);
        assert_eq!(s.economy.balance(), INITIAL_BALANCE - DROP_COST);
        assert_eq!(s.take_events(), vec![SoundEffect::CoinDrop]);
        assert!(s.take_events().is_empty());
    }

    #[test]
    fn test_drop_x_is_clamped() {
        let mut s = state(SimConfig {
            empty_pool: true,
            ..SimConfig::default()
        });
        s.drop_coin(100.0);
        let coin = s.coins.iter().chain(s.rare_coins.iter()).next().expect("coin");
        assert!(s.world.pose(coin.handle()).position.x < FIELD_HALF_WIDTH);
    }

    #[test]
    fn test_paused_ignores_drop_and_bump() {
        let mut s = state(SimConfig::default());
        s.toggle_pause();
        assert_eq!(
            s.drop_coin(0.0),
            DropOutcome::Rejected(DropRejection::Paused)
        );
        assert!(!s.bump());
        assert_eq!(s.economy.balance(), INITIAL_BALANCE);
        assert_eq!(s.phase(), GamePhase::Paused);
    }

    #[test]
    fn test_reset_twice_matches_once() {
        let mut s = state(SimConfig::default());
        for _ in 0..5 {
            s.drop_coin(0.0);
        }
        s.bump();
        s.reset();
        let once = (s.economy.snapshot(), s.coins.len(), s.rare_coins.len(), s.world.body_count());
        s.reset();
        let twice = (s.economy.snapshot(), s.coins.len(), s.rare_coins.len(), s.world.body_count());
        assert_eq!(once, twice);
        assert_eq!(once.0, EconomySnapshot::default());
        assert_eq!(once.1, INITIAL_COIN_COUNT);
        assert_eq!(once.2, 0);
        assert_eq!(s.stats, SessionStats::default());
    }
}
