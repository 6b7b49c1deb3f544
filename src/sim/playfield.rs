//! Static cabinet geometry: floor, side walls, back wall, scraper and the pusher body
//!
//! Layout (top view, +Z toward the player):
//!
//! ```text
//!   back wall
//!  | scraper  |   <- hangs just above the pusher top
//!  |  pusher  |
//!  |          |   <- side walls (low friction)
//!  |  floor   |
//!  +----------+  z = COLLECTION_EDGE_Z, coins falling here are collected
//! ```

use glam::Vec3;

use super::world::{BodyHandle, ColliderShapeDef, Pose, RigidBodyWorld};
use crate::consts::*;

/// Handles to the non-coin bodies of the cabinet.
#[derive(Debug)]
pub struct Playfield {
    pub floor: BodyHandle,
    pub walls: Vec<BodyHandle>,
    pub pusher: BodyHandle,
}

impl Playfield {
    /// Build the cabinet into `world`. Called once per session.
    pub fn build(world: &mut RigidBodyWorld, pusher_start: Vec3) -> Self {
        let floor_half_depth = (COLLECTION_EDGE_Z - FIELD_BACK_Z) / 2.0;
        let floor_center_z = (COLLECTION_EDGE_Z + FIELD_BACK_Z) / 2.0;

        // Floor friction matches the coins so sliding is consistent
        let floor = world.create_static(
            &ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(FIELD_HALF_WIDTH, FLOOR_HALF_THICKNESS, floor_half_depth),
            },
            Pose::from_position(Vec3::new(
                0.0,
                FLOOR_TOP_Y - FLOOR_HALF_THICKNESS,
                floor_center_z,
            )),
            COIN_FRICTION,
        );

        // Side walls run from behind the pusher's travel to the collection edge
        let wall_back_z = PUSHER_REST_Z - PUSHER_AMPLITUDE - PUSHER_HALF_EXTENTS[2];
        let wall_half_depth = (COLLECTION_EDGE_Z - wall_back_z) / 2.0;
        let wall_center_z = (COLLECTION_EDGE_Z + wall_back_z) / 2.0;
        let wall_y = FLOOR_TOP_Y + WALL_HALF_HEIGHT - FLOOR_HALF_THICKNESS;
        let side = ColliderShapeDef::Cuboid {
            half_extents: Vec3::new(WALL_HALF_THICKNESS, WALL_HALF_HEIGHT, wall_half_depth),
        };

        let mut walls = Vec::with_capacity(4);
        for sign in [-1.0_f32, 1.0] {
            walls.push(world.create_static(
                &side,
                Pose::from_position(Vec3::new(
                    sign * (FIELD_HALF_WIDTH + WALL_HALF_THICKNESS),
                    wall_y,
                    wall_center_z,
                )),
                WALL_FRICTION,
            ));
        }
        walls.push(world.create_static(
            &ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(
                    FIELD_HALF_WIDTH + 2.0 * WALL_HALF_THICKNESS,
                    WALL_HALF_HEIGHT,
                    WALL_HALF_THICKNESS,
                ),
            },
            Pose::from_position(Vec3::new(0.0, wall_y, wall_back_z - WALL_HALF_THICKNESS)),
            WALL_FRICTION,
        ));

        // Panel over the pusher's back half, open underneath by less than a coin's thickness
        let pusher_top = FLOOR_TOP_Y + 2.0 * PUSHER_HALF_EXTENTS[1];
        let scraper_bottom = pusher_top + SCRAPER_GAP;
        let scraper_top = wall_y + WALL_HALF_HEIGHT;
        walls.push(world.create_static(
            &ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(
                    FIELD_HALF_WIDTH,
                    (scraper_top - scraper_bottom) / 2.0,
                    (SCRAPER_FRONT_Z - wall_back_z) / 2.0,
                ),
            },
            Pose::from_position(Vec3::new(
                0.0,
                (scraper_top + scraper_bottom) / 2.0,
                (SCRAPER_FRONT_Z + wall_back_z) / 2.0,
            )),
            WALL_FRICTION,
        ));

        let pusher = world.create_kinematic(
            &ColliderShapeDef::Cuboid {
                half_extents: Vec3::from_array(PUSHER_HALF_EXTENTS),
            },
            Pose::from_position(pusher_start),
            PUSHER_FRICTION,
        );

        log::debug!(
            "Cabinet built: floor z=[{}, {}], walls from z={}",
            FIELD_BACK_Z,
            COLLECTION_EDGE_Z,
            wall_back_z
        );

        Self {
            floor,
            walls,
            pusher,
        }
    }

    /// Number of bodies the cabinet itself contributes to the world.
    pub fn body_count(&self) -> usize {
        2 + self.walls.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_build_counts_bodies() {
        let mut world =
            RigidBodyWorld::new(Vec3::new(0.0, GRAVITY, 0.0), SIM_DT, Duration::from_secs(2))
                .expect("world");
        let field = Playfield::build(&mut world, Vec3::new(0.0, 0.25, PUSHER_REST_Z));
        assert_eq!(field.walls.len(), 4);
        assert_eq!(world.body_count(), field.body_count());
    }

    #[test]
    fn test_scraper_sits_just_above_pusher() {
        let mut world =
            RigidBodyWorld::new(Vec3::new(0.0, GRAVITY, 0.0), SIM_DT, Duration::from_secs(2))
                .expect("world");
        let field = Playfield::build(&mut world, Vec3::new(0.0, 0.25, PUSHER_REST_Z));
        let scraper = world.pose(&field.walls[3]).position;
        let pusher_top = FLOOR_TOP_Y + 2.0 * PUSHER_HALF_EXTENTS[1];
        // Center above the pusher, behind the drop point
        assert!(scraper.y > pusher_top);
        assert!(scraper.z < SCRAPER_FRONT_Z && SCRAPER_FRONT_Z < DROP_Z - RARE_RADIUS);
        // Retracted pusher face is behind the scraper face, so scraped coins can fall
        assert!(PUSHER_REST_Z - PUSHER_AMPLITUDE + PUSHER_HALF_EXTENTS[2] < SCRAPER_FRONT_Z);
        assert!(SCRAPER_GAP < 2.0 * COIN_HALF_THICKNESS);
    }
}
