//! Per-frame render snapshot
//!
//! Produced by value once per frame. Renderers keep fixed-size instance buffers, so every
//! pool slot is reported, with empty slots flagged hidden instead of omitted.

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::pool::CoinPool;
use super::world::RigidBodyWorld;
use crate::settings::RenderFlags;

/// Transform of one pool slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotTransform {
    pub slot: usize,
    pub position: Vec3,
    pub rotation: Quat,
    pub visible: bool,
}

impl SlotTransform {
    fn hidden(slot: usize) -> Self {
        Self {
            slot,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            visible: false,
        }
    }

    /// GPU instance for this slot (zero scale when hidden)
    pub fn instance(&self) -> CoinInstance {
        CoinInstance {
            position: self.position.to_array(),
            scale: if self.visible { 1.0 } else { 0.0 },
            rotation: self.rotation.to_array(),
        }
    }
}

/// Instance buffer entry
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct CoinInstance {
    pub position: [f32; 3],
    pub scale: f32,
    /// Quaternion as xyzw
    pub rotation: [f32; 4],
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub coins: Vec<SlotTransform>,
    pub rare_coins: Vec<SlotTransform>,
    pub pusher_position: Vec3,
    pub flags: RenderFlags,
}

impl RenderSnapshot {
    pub fn capture(
        world: &RigidBodyWorld,
        coins: &CoinPool,
        rare_coins: &CoinPool,
        pusher_position: Vec3,
        flags: RenderFlags,
    ) -> Self {
        Self {
            coins: pool_slots(world, coins),
            rare_coins: pool_slots(world, rare_coins),
            pusher_position,
            flags,
        }
    }

    /// Instance buffers for (standard, rare) coins, one entry per slot
    pub fn instances(&self) -> (Vec<CoinInstance>, Vec<CoinInstance>) {
        (
            self.coins.iter().map(SlotTransform::instance).collect(),
            self.rare_coins.iter().map(SlotTransform::instance).collect(),
        )
    }

    pub fn visible_count(&self) -> usize {
        self.coins
            .iter()
            .chain(&self.rare_coins)
            .filter(|s| s.visible)
            .count()
    }
}

fn pool_slots(world: &RigidBodyWorld, pool: &CoinPool) -> Vec<SlotTransform> {
    pool.slots()
        .iter()
        .enumerate()
        .map(|(slot, coin)| match coin {
            Some(coin) => {
                let pose = world.pose(coin.handle());
                SlotTransform {
                    slot,
                    position: pose.position,
                    rotation: pose.rotation,
                    visible: true,
                }
            }
            None => SlotTransform::hidden(slot),
        })
        .collect()
}
