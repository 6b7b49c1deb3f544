//! Bounded coin pools
//!
//! One pool type serves both coin kinds; the kind supplies capacity, value, spawn chance
//! and collider dimensions. Each live coin occupies a render slot that stays fixed for its
//! lifetime and is handed out again only after the coin despawns.

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::world::{BodyHandle, ColliderShapeDef, DynamicBodyDesc, Pose, RigidBodyWorld};
use crate::consts::*;

/// Coin variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoinKind {
    Standard,
    /// Trashcoin: rare, heavier, worth more
    Rare,
}

impl CoinKind {
    pub fn capacity(self) -> usize {
        match self {
            CoinKind::Standard => COIN_CAPACITY,
            CoinKind::Rare => RARE_CAPACITY,
        }
    }

    pub fn value(self) -> i64 {
        match self {
            CoinKind::Standard => COIN_VALUE,
            CoinKind::Rare => RARE_VALUE,
        }
    }

    pub fn radius(self) -> f32 {
        match self {
            CoinKind::Standard => COIN_RADIUS,
            CoinKind::Rare => RARE_RADIUS,
        }
    }

    pub fn half_thickness(self) -> f32 {
        match self {
            CoinKind::Standard => COIN_HALF_THICKNESS,
            CoinKind::Rare => RARE_HALF_THICKNESS,
        }
    }

    fn density(self) -> f32 {
        match self {
            CoinKind::Standard => COIN_DENSITY,
            CoinKind::Rare => RARE_DENSITY,
        }
    }

    pub fn shape(self) -> ColliderShapeDef {
        ColliderShapeDef::CylinderY {
            radius: self.radius(),
            half_height: self.half_thickness(),
        }
    }

    fn body_desc(self) -> DynamicBodyDesc {
        DynamicBodyDesc {
            linear_damping: COIN_LINEAR_DAMPING,
            angular_damping: COIN_ANGULAR_DAMPING,
            restitution: COIN_RESTITUTION,
            density: self.density(),
            friction: COIN_FRICTION,
            friction_skin: COIN_CONTACT_SKIN,
        }
    }

    /// Decide the kind of one drop. Rolled once per drop, never re-rolled.
    pub fn roll(rng: &mut impl Rng) -> Self {
        if rng.random::<f32>() < RARE_SPAWN_PROBABILITY {
            CoinKind::Rare
        } else {
            CoinKind::Standard
        }
    }
}

/// A live coin. Owned by its pool; only the pool despawns it.
#[derive(Debug)]
pub struct Coin {
    handle: BodyHandle,
    kind: CoinKind,
    slot: usize,
    /// Spawn order within the pool
    spawn_seq: u64,
}

impl Coin {
    pub fn handle(&self) -> &BodyHandle {
        &self.handle
    }

    pub fn kind(&self) -> CoinKind {
        self.kind
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn spawn_seq(&self) -> u64 {
        self.spawn_seq
    }
}

/// Where a coin left the playfield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitKind {
    /// Fell off the collection edge
    Collected,
    /// Fell anywhere else
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitEvent {
    pub kind: CoinKind,
    pub exit: ExitKind,
    pub slot: usize,
    /// Last position before removal
    pub position: Vec3,
}

/// Fixed-capacity set of coin bodies of one kind
#[derive(Debug)]
pub struct CoinPool {
    kind: CoinKind,
    slots: Vec<Option<Coin>>,
    len: usize,
    next_seq: u64,
}

impl CoinPool {
    pub fn new(kind: CoinKind) -> Self {
        Self::with_capacity(kind, kind.capacity())
    }

    pub fn with_capacity(kind: CoinKind, capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            kind,
            slots,
            len: 0,
            next_seq: 0,
        }
    }

    /// Spawn a coin at `position` with a small random tilt.
    ///
    /// Returns the slot it landed in, or `None` when the pool is full (nothing is created).
    pub fn try_spawn(
        &mut self,
        world: &mut RigidBodyWorld,
        rng: &mut impl Rng,
        position: Vec3,
    ) -> Option<usize> {
        let slot = self.slots.iter().position(Option::is_none)?;

        let tilt_x = rng.random_range(-SPAWN_TILT..=SPAWN_TILT);
        let tilt_z = rng.random_range(-SPAWN_TILT..=SPAWN_TILT);
        let rotation = (Quat::from_rotation_x(tilt_x) * Quat::from_rotation_z(tilt_z)).normalize();

        let handle = world.create_dynamic(
            &self.kind.shape(),
            Pose { position, rotation },
            self.kind.body_desc(),
        );

        self.slots[slot] = Some(Coin {
            handle,
            kind: self.kind,
            slot,
            spawn_seq: self.next_seq,
        });
        self.next_seq += 1;
        self.len += 1;
        Some(slot)
    }

    /// Remove every coin below `loss_plane_y`, classifying each exit.
    ///
    /// All positions are read before any body is removed.
    pub fn sweep_exits(&mut self, world: &mut RigidBodyWorld, loss_plane_y: f32) -> Vec<ExitEvent> {
        let exits: Vec<ExitEvent> = self
            .slots
            .iter()
            .flatten()
            .filter_map(|coin| {
                let position = world.pose(&coin.handle).position;
                (position.y < loss_plane_y).then(|| ExitEvent {
                    kind: coin.kind,
                    exit: if position.z > COLLECTION_EDGE_Z {
                        ExitKind::Collected
                    } else {
                        ExitKind::Lost
                    },
                    slot: coin.slot,
                    position,
                })
            })
            .collect();

        for exit in &exits {
            if let Some(coin) = self.slots[exit.slot].take() {
                world.remove(coin.handle);
                self.len -= 1;
            }
            log::debug!(
                "{:?} coin {:?} at z={:.2} (slot {})",
                exit.kind,
                exit.exit,
                exit.position.z,
                exit.slot
            );
        }

        exits
    }

    /// Kick every live coin with a random upward/lateral impulse and a small spin.
    pub fn bump(&self, world: &mut RigidBodyWorld, rng: &mut impl Rng) {
        for coin in self.iter() {
            let impulse = Vec3::new(
                rng.random_range(-BUMP_LATERAL_IMPULSE..=BUMP_LATERAL_IMPULSE),
                rng.random_range(BUMP_UP_IMPULSE_MIN..=BUMP_UP_IMPULSE_MAX),
                rng.random_range(-BUMP_LATERAL_IMPULSE..=BUMP_LATERAL_IMPULSE),
            );
            let torque = Vec3::new(
                rng.random_range(-BUMP_TORQUE_IMPULSE..=BUMP_TORQUE_IMPULSE),
                rng.random_range(-BUMP_TORQUE_IMPULSE..=BUMP_TORQUE_IMPULSE),
                rng.random_range(-BUMP_TORQUE_IMPULSE..=BUMP_TORQUE_IMPULSE),
            );
            world.apply_impulse(&coin.handle, impulse, torque);
        }
    }

    /// Despawn everything
    pub fn clear(&mut self, world: &mut RigidBodyWorld) {
        for slot in self.slots.iter_mut() {
            if let Some(coin) = slot.take() {
                world.remove(coin.handle);
            }
        }
        self.len = 0;
    }

    /// Live coins in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.slots.iter().flatten()
    }

    /// Every slot, empty ones included, in slot order
    pub fn slots(&self) -> &[Option<Coin>] {
        &self.slots
    }

    pub fn kind(&self) -> CoinKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;

    fn world() -> RigidBodyWorld {
        RigidBodyWorld::new(Vec3::new(0.0, GRAVITY, 0.0), SIM_DT, Duration::from_secs(2))
            .expect("world")
    }

    #[test]
    fn test_capacity_exhaustion() {
        let mut w = world();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut pool = CoinPool::with_capacity(CoinKind::Standard, 200);

        for i in 0..200 {
            assert_eq!(pool.try_spawn(&mut w, &mut rng, Vec3::new(0.0, 1.0, 0.0)), Some(i));
        }
        assert!(pool.is_full());
        let bodies = w.body_count();

        assert_eq!(pool.try_spawn(&mut w, &mut rng, Vec3::new(0.0, 1.0, 0.0)), None);
        assert_eq!(pool.len(), 200);
        assert_eq!(w.body_count(), bodies);
    }

    #[test]
    fn test_spawn_tilt_is_small_unit_rotation() {
        let mut w = world();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut pool = CoinPool::new(CoinKind::Standard);
        for _ in 0..20 {
            pool.try_spawn(&mut w, &mut rng, Vec3::ZERO);
        }
        for coin in pool.iter() {
            let rot = w.pose(coin.handle()).rotation;
            assert!(rot.is_normalized());
            // Tilt of the coin axis away from +Y is bounded by both tilts combined
            let up = rot * Vec3::Y;
            assert!(up.angle_between(Vec3::Y) <= SPAWN_TILT * 2.0_f32.sqrt() + 1e-3);
        }
    }

    #[test]
    fn test_sweep_classifies_exits() {
        let mut w = world();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut pool = CoinPool::new(CoinKind::Standard);

        let collected = pool
            .try_spawn(&mut w, &mut rng, Vec3::new(0.0, LOSS_PLANE_Y - 1.0, COLLECTION_EDGE_Z + 0.5))
            .expect("slot");
        let lost = pool
            .try_spawn(&mut w, &mut rng, Vec3::new(0.0, LOSS_PLANE_Y - 1.0, 0.0))
            .expect("slot");
        let stays = pool
            .try_spawn(&mut w, &mut rng, Vec3::new(0.0, 1.0, 0.0))
            .expect("slot");

        let exits = pool.sweep_exits(&mut w, LOSS_PLANE_Y);
        assert_eq!(exits.len(), 2);
        let by_slot = |slot| exits.iter().find(|e| e.slot == slot).map(|e| e.exit);
        assert_eq!(by_slot(collected), Some(ExitKind::Collected));
        assert_eq!(by_slot(lost), Some(ExitKind::Lost));
        assert_eq!(by_slot(stays), None);

        assert_eq!(pool.len(), 1);
        assert_eq!(w.body_count(), 1);

        // Nothing left to sweep
        assert!(pool.sweep_exits(&mut w, LOSS_PLANE_Y).is_empty());
    }

    #[test]
    fn test_slots_reused_after_despawn() {
        let mut w = world();
        let mut rng = Pcg32::seed_from_u64(9);
        let mut pool = CoinPool::with_capacity(CoinKind::Rare, 3);

        pool.try_spawn(&mut w, &mut rng, Vec3::new(0.0, 1.0, 0.0));
        pool.try_spawn(&mut w, &mut rng, Vec3::new(0.0, LOSS_PLANE_Y - 1.0, 0.0));
        pool.try_spawn(&mut w, &mut rng, Vec3::new(1.0, 1.0, 0.0));
        pool.sweep_exits(&mut w, LOSS_PLANE_Y);

        // Slot 1 was freed; survivors keep their slots
        let live: Vec<usize> = pool.iter().map(Coin::slot).collect();
        assert_eq!(live, vec![0, 2]);
        assert_eq!(pool.try_spawn(&mut w, &mut rng, Vec3::ZERO), Some(1));
        assert!(pool.slots()[1].as_ref().is_some_and(|c| c.spawn_seq() == 3));
    }

    #[test]
    fn test_bump_moves_every_coin() {
        let mut w = world();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut pool = CoinPool::new(CoinKind::Standard);
        for i in 0..5 {
            pool.try_spawn(&mut w, &mut rng, Vec3::new(i as f32, 5.0, 0.0));
        }
        w.step();
        let before: Vec<f32> = pool.iter().map(|c| w.linvel(c.handle()).length()).collect();

        pool.bump(&mut w, &mut rng);
        w.step();

        for (coin, v0) in pool.iter().zip(before) {
            let v1 = w.linvel(coin.handle()).length();
            assert!(v1 > v0, "coin in slot {} did not speed up ({v0} -> {v1})", coin.slot());
        }
    }

    #[test]
    fn test_clear_releases_bodies() {
        let mut w = world();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut pool = CoinPool::new(CoinKind::Standard);
        for _ in 0..10 {
            pool.try_spawn(&mut w, &mut rng, Vec3::ZERO);
        }
        pool.clear(&mut w);
        assert!(pool.is_empty());
        assert_eq!(w.body_count(), 0);
    }

    #[test]
    fn test_roll_is_mostly_standard() {
        let mut rng = Pcg32::seed_from_u64(42);
        let rare = (0..10_000)
            .filter(|_| CoinKind::roll(&mut rng) == CoinKind::Rare)
            .count();
        // 5% nominal
        assert!((300..700).contains(&rare), "rare count {rare}");
    }

    /// 0: spawn in play, 1: spawn below the loss plane, 2: sweep, 3: clear
    fn ops() -> impl Strategy<Value = Vec<u8>> {
        proptest::collection::vec(0u8..4, 0..60)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_len_never_exceeds_capacity(ops in ops(), seed in any::<u64>()) {
            let mut w = world();
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut pool = CoinPool::with_capacity(CoinKind::Standard, 8);

            for op in ops {
                match op {
                    0 | 1 => {
                        let y = if op == 0 { 1.0 } else { LOSS_PLANE_Y - 1.0 };
                        let was_full = pool.is_full();
                        let slot = pool.try_spawn(&mut w, &mut rng, Vec3::new(0.0, y, 0.0));
                        prop_assert_eq!(slot.is_none(), was_full);
                    }
                    2 => {
                        pool.sweep_exits(&mut w, LOSS_PLANE_Y);
                    }
                    _ => pool.clear(&mut w),
                }
                prop_assert!(pool.len() <= pool.capacity());
                prop_assert_eq!(pool.len(), pool.slots().iter().filter(|s| s.is_some()).count());
                prop_assert_eq!(w.body_count(), pool.len());
            }
        }
    }
}
