//! Token economy: balance, score, net profit and collection streaks
//!
//! Every mutation goes through one of the event methods below. Balance is allowed to go
//! negative (emergency bumps); the session reports that as "out of funds", never as an
//! error.

use serde::{Deserialize, Serialize};

use super::pool::CoinKind;
use crate::consts::*;

/// Why a drop was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropRejection {
    InsufficientFunds,
    Paused,
    /// Session already stopped
    Stopped,
}

/// Result of a drop request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropOutcome {
    /// Charged and spawned
    Accepted { kind: CoinKind },
    /// Target pool was full; nothing charged, nothing spawned
    PoolFull { kind: CoinKind },
    Rejected(DropRejection),
}

impl DropOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, DropOutcome::Rejected(_))
    }
}

/// Result of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOutcome {
    pub value: i64,
    /// The streak threshold was reached on this collection
    pub streak_bonus: bool,
}

/// The persisted part of the economy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomySnapshot {
    pub score: i64,
    pub balance: i64,
    pub net_profit: i64,
}

impl Default for EconomySnapshot {
    fn default() -> Self {
        Self {
            score: 0,
            balance: INITIAL_BALANCE,
            net_profit: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyState {
    score: i64,
    balance: i64,
    net_profit: i64,
    is_paused: bool,
    recent_collections: u32,
    /// Simulation time (ms) of the previous collection
    last_collection_ms: Option<f64>,
    /// Debug mode: drops are never refused for funds
    unlimited: bool,
}

impl Default for EconomyState {
    fn default() -> Self {
        Self::new(false)
    }
}

impl EconomyState {
    pub fn new(unlimited: bool) -> Self {
        Self {
            score: 0,
            balance: INITIAL_BALANCE,
            net_profit: 0,
            is_paused: false,
            recent_collections: 0,
            last_collection_ms: None,
            unlimited,
        }
    }

    /// Seed from a persisted snapshot (balance/score/net profit only)
    pub fn restored(snapshot: EconomySnapshot, unlimited: bool) -> Self {
        Self {
            score: snapshot.score,
            balance: snapshot.balance,
            net_profit: snapshot.net_profit,
            ..Self::new(unlimited)
        }
    }

    /// Whether a drop would currently be charged
    pub fn can_drop(&self) -> Result<(), DropRejection> {
        if self.is_paused {
            return Err(DropRejection::Paused);
        }
        if self.balance <= 0 && !self.unlimited {
            return Err(DropRejection::InsufficientFunds);
        }
        Ok(())
    }

    /// Charge one drop. No mutation when refused.
    pub fn drop_coin(&mut self) -> Result<(), DropRejection> {
        self.can_drop()?;
        self.balance -= DROP_COST;
        self.net_profit -= DROP_COST;
        Ok(())
    }

    /// Charge a bump. Allowed with any balance, so it may drive the balance negative.
    pub fn bump(&mut self) {
        self.balance -= BUMP_COST;
        self.net_profit -= BUMP_COST;
    }

    /// Credit a collected coin and advance the streak
    pub fn collect(&mut self, kind: CoinKind, now_ms: f64) -> CollectOutcome {
        let value = kind.value();
        self.score += value;
        self.balance += value;
        self.net_profit += value;

        if let Some(last) = self.last_collection_ms
            && now_ms - last > STREAK_WINDOW_MS
        {
            self.recent_collections = 0;
        }
        self.last_collection_ms = Some(now_ms);
        self.recent_collections += 1;

        let streak_bonus = self.recent_collections >= STREAK_THRESHOLD;
        if streak_bonus {
            self.balance += STREAK_BONUS;
            self.net_profit += STREAK_BONUS;
            self.recent_collections = 0;
        }

        CollectOutcome {
            value,
            streak_bonus,
        }
    }

    /// Back to a fresh session. Also unpauses.
    pub fn reset(&mut self) {
        *self = Self::new(self.unlimited);
    }

    /// Returns the new paused state
    pub fn toggle_pause(&mut self) -> bool {
        self.is_paused = !self.is_paused;
        self.is_paused
    }

    pub fn snapshot(&self) -> EconomySnapshot {
        EconomySnapshot {
            score: self.score,
            balance: self.balance,
            net_profit: self.net_profit,
        }
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn net_profit(&self) -> i64 {
        self.net_profit
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn recent_collections(&self) -> u32 {
        self.recent_collections
    }

    pub fn is_out_of_funds(&self) -> bool {
        self.balance <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_drop_charges_one() {
        let mut eco = EconomyState::default();
        assert!(eco.drop_coin().is_ok());
        assert_eq!(eco.balance(), INITIAL_BALANCE - 1);
        assert_eq!(eco.net_profit(), -1);
        assert_eq!(eco.score(), 0);
    }

    #[test]
    fn test_drop_rejected_when_broke() {
        let mut eco = EconomyState::restored(
            EconomySnapshot {
                score: 0,
                balance: 0,
                net_profit: -100,
            },
            false,
        );
        assert_eq!(eco.drop_coin(), Err(DropRejection::InsufficientFunds));
        assert_eq!(eco.balance(), 0);
        assert_eq!(eco.net_profit(), -100);
    }

    #[test]
    fn test_unlimited_allows_negative() {
        let mut eco = EconomyState::restored(
            EconomySnapshot {
                score: 0,
                balance: 0,
                net_profit: 0,
            },
            true,
        );
        assert!(eco.drop_coin().is_ok());
        assert_eq!(eco.balance(), -1);
    }

    #[test]
    fn test_bump_goes_negative() {
        let mut eco = EconomyState::restored(
            EconomySnapshot {
                score: 0,
                balance: 30,
                net_profit: 0,
            },
            false,
        );
        eco.bump();
        assert_eq!(eco.balance(), -20);
        assert_eq!(eco.net_profit(), -50);
        assert!(eco.is_out_of_funds());
    }

    #[test]
    fn test_paused_rejects_drop() {
        let mut eco = EconomyState::default();
        assert!(eco.toggle_pause());
        assert_eq!(eco.drop_coin(), Err(DropRejection::Paused));
        assert_eq!(eco.balance(), INITIAL_BALANCE);
        assert!(!eco.toggle_pause());
    }

    #[test]
    fn test_rare_collect_value() {
        let mut eco = EconomyState::default();
        let out = eco.collect(CoinKind::Rare, 0.0);
        assert_eq!(out.value, RARE_VALUE);
        assert_eq!(eco.score(), RARE_VALUE);
        assert_eq!(eco.balance(), INITIAL_BALANCE + RARE_VALUE);
    }

    #[test]
    fn test_streak_bonus_at_ten() {
        let mut eco = EconomyState::default();
        let mut bonuses = 0;
        for i in 0..10 {
            if eco.collect(CoinKind::Standard, i as f64 * 4000.0).streak_bonus {
                bonuses += 1;
            }
        }
        assert_eq!(bonuses, 1);
        assert_eq!(eco.recent_collections(), 0);
        assert_eq!(eco.balance(), INITIAL_BALANCE + 10 + STREAK_BONUS);
        assert_eq!(eco.net_profit(), 10 + STREAK_BONUS);
        assert_eq!(eco.score(), 10);

        // 11th starts a fresh count
        assert!(!eco.collect(CoinKind::Standard, 40_000.0).streak_bonus);
        assert_eq!(eco.recent_collections(), 1);
    }

    #[test]
    fn test_streak_resets_after_gap() {
        let mut eco = EconomyState::default();
        for i in 0..9 {
            eco.collect(CoinKind::Standard, i as f64 * 100.0);
        }
        assert_eq!(eco.recent_collections(), 9);
        // Gap longer than the window
        let out = eco.collect(CoinKind::Standard, 900.0 + STREAK_WINDOW_MS + 1.0);
        assert!(!out.streak_bonus);
        assert_eq!(eco.recent_collections(), 1);
    }

    #[test]
    fn test_gap_of_exactly_window_keeps_streak() {
        let mut eco = EconomyState::default();
        eco.collect(CoinKind::Standard, 0.0);
        eco.collect(CoinKind::Standard, STREAK_WINDOW_MS);
        assert_eq!(eco.recent_collections(), 2);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut eco = EconomyState::default();
        eco.drop_coin().ok();
        eco.collect(CoinKind::Rare, 10.0);
        eco.toggle_pause();
        eco.reset();
        let once = eco.snapshot();
        eco.reset();
        assert_eq!(once, eco.snapshot());
        assert_eq!(once, EconomySnapshot::default());
        assert!(!eco.is_paused());
        assert_eq!(eco.recent_collections(), 0);
    }

    #[derive(Debug, Clone)]
    enum Event {
        Drop,
        Bump,
        Collect(bool),
        Wait(f64),
    }

    fn event() -> impl Strategy<Value = Event> {
        prop_oneof![
            3 => Just(Event::Drop),
            1 => Just(Event::Bump),
            4 => any::<bool>().prop_map(Event::Collect),
            2 => (0.0f64..8000.0).prop_map(Event::Wait),
        ]
    }

    proptest! {
        #[test]
        fn prop_net_profit_is_sum_of_deltas(events in proptest::collection::vec(event(), 0..200)) {
            let mut eco = EconomyState::default();
            let mut now = 0.0;
            let mut collected = 0i64;
            let mut spent = 0i64;
            let mut bonuses = 0i64;

            for ev in events {
                match ev {
                    Event::Drop => {
                        if eco.drop_coin().is_ok() {
                            spent += DROP_COST;
                        }
                    }
                    Event::Bump => {
                        eco.bump();
                        spent += BUMP_COST;
                    }
                    Event::Collect(rare) => {
                        let kind = if rare { CoinKind::Rare } else { CoinKind::Standard };
                        let out = eco.collect(kind, now);
                        collected += out.value;
                        if out.streak_bonus {
                            bonuses += STREAK_BONUS;
                        }
                    }
                    Event::Wait(ms) => now += ms,
                }
                prop_assert_eq!(eco.net_profit(), collected + bonuses - spent);
                prop_assert_eq!(eco.balance(), INITIAL_BALANCE + eco.net_profit());
                prop_assert!(eco.recent_collections() < STREAK_THRESHOLD);
            }
        }
    }
}
