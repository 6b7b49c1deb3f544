//! Fixed timestep simulation tick
//!
//! One call advances the session by exactly one fixed step. The frame loop decides how
//! many steps a frame gets; this module only knows what a single step does.

use super::pool::{CoinKind, ExitEvent, ExitKind};
use super::state::GameState;
use crate::audio::SoundEffect;
use crate::consts::*;

/// What happened during one step
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Coins that left the playfield, standard pool first
    pub exits: Vec<ExitEvent>,
    /// Collections that completed a streak
    pub streak_bonuses: u32,
}

impl TickReport {
    pub fn collected(&self) -> usize {
        self.exits
            .iter()
            .filter(|e| e.exit == ExitKind::Collected)
            .count()
    }

    pub fn lost(&self) -> usize {
        self.exits.len() - self.collected()
    }
}

/// Advance the game state by one fixed timestep.
///
/// Does not touch the clock's accumulator; the caller consumes the step afterwards.
pub fn tick(state: &mut GameState) -> TickReport {
    // Time at the end of this step
    let end_seconds = state.clock.sim_seconds() + state.clock.fixed_step();
    let now_ms = end_seconds * 1000.0;

    state.autoplay(now_ms);

    // Pusher target is set before stepping so contacts see its velocity this step
    let target = state.pusher.target_at(end_seconds);
    state.world.set_kinematic_target(&state.playfield.pusher, target);

    state.world.step();

    let mut exits = state.coins.sweep_exits(&mut state.world, LOSS_PLANE_Y);
    exits.extend(state.rare_coins.sweep_exits(&mut state.world, LOSS_PLANE_Y));

    let mut report = TickReport::default();
    for exit in &exits {
        match exit.exit {
            ExitKind::Collected => {
                let outcome = state.economy.collect(exit.kind, now_ms);
                state.stats.collected += 1;
                let effect = match exit.kind {
                    CoinKind::Standard => SoundEffect::CoinCollect,
                    CoinKind::Rare => {
                        state.stats.rare_collected += 1;
                        SoundEffect::RareCollect
                    }
                };
                state.push_event(effect);
                if outcome.streak_bonus {
                    state.stats.streak_bonuses += 1;
                    report.streak_bonuses += 1;
                    state.push_event(SoundEffect::WinStreak);
                    log::info!("Streak bonus! balance {}", state.economy.balance());
                }
            }
            ExitKind::Lost => {
                state.stats.lost += 1;
            }
        }
    }

    report.exits = exits;
    report
}
