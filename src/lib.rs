//! Coin Pusher - A real-time coin pusher arcade simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (rigid bodies, pools, pusher, economy)
//! - `session`: Frame driver (fixed-timestep sub-stepping, input, fps)
//! - `audio`: Discrete event notifications for sound/telemetry hosts
//! - `persistence`: Economy save/restore envelope
//! - `settings`: Session configuration and debug flags

pub mod audio;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod sim;

pub use audio::{AudioSink, LogAudio, SoundEffect};
pub use persistence::{PersistenceError, SaveEnvelope};
pub use session::{FrameReport, InputCommand, Session};
pub use settings::{RenderFlags, SimConfig};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f64 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;
    /// Gravity along -Y (m/s²)
    pub const GRAVITY: f32 = -9.81;

    /// Playfield dimensions (meters)
    pub const FIELD_HALF_WIDTH: f32 = 3.0;
    /// Back edge of the floor (spawn/bump side)
    pub const FIELD_BACK_Z: f32 = -4.0;
    /// Far edge of the floor; falling past it counts as collected
    pub const COLLECTION_EDGE_Z: f32 = 4.0;
    pub const FLOOR_TOP_Y: f32 = 0.0;
    pub const FLOOR_HALF_THICKNESS: f32 = 0.1;
    /// Bodies below this Y are removed regardless of Z
    pub const LOSS_PLANE_Y: f32 = -2.0;
    pub const WALL_HALF_THICKNESS: f32 = 0.1;
    pub const WALL_HALF_HEIGHT: f32 = 1.5;
    /// Side walls stay slippery so coins can't climb them under bumps
    pub const WALL_FRICTION: f32 = 0.05;

    /// Where dropped coins appear. Inside the pusher's stroke, in front of the scraper.
    pub const DROP_HEIGHT: f32 = 2.5;
    pub const DROP_Z: f32 = -1.5;

    /// Front face of the panel hanging over the pusher. Coins riding the pusher top are
    /// stopped here on the back stroke and fall onto the floor in front of it.
    pub const SCRAPER_FRONT_Z: f32 = -2.4;
    /// Clearance between the pusher top and the scraper; thinner than any coin
    pub const SCRAPER_GAP: f32 = 0.02;

    /// Coin body defaults (shared by both kinds)
    pub const COIN_FRICTION: f32 = 0.35;
    pub const COIN_RESTITUTION: f32 = 0.1;
    pub const COIN_LINEAR_DAMPING: f32 = 0.1;
    pub const COIN_ANGULAR_DAMPING: f32 = 0.3;
    pub const COIN_CONTACT_SKIN: f32 = 0.002;
    /// Max spawn tilt on X and Z (radians)
    pub const SPAWN_TILT: f32 = 0.25;

    /// Standard coin
    pub const COIN_RADIUS: f32 = 0.30;
    pub const COIN_HALF_THICKNESS: f32 = 0.04;
    pub const COIN_DENSITY: f32 = 1.0;
    pub const COIN_CAPACITY: usize = 200;
    pub const COIN_VALUE: i64 = 1;

    /// Rare coin (trashcoin)
    pub const RARE_RADIUS: f32 = 0.36;
    pub const RARE_HALF_THICKNESS: f32 = 0.05;
    pub const RARE_DENSITY: f32 = 2.5;
    pub const RARE_CAPACITY: usize = 20;
    pub const RARE_VALUE: i64 = 10;
    pub const RARE_SPAWN_PROBABILITY: f32 = 0.05;

    /// Pusher platform
    pub const PUSHER_REST_Z: f32 = -2.6;
    pub const PUSHER_AMPLITUDE: f32 = 0.9;
    pub const PUSHER_PERIOD: f32 = 3.0;
    pub const PUSHER_HALF_EXTENTS: [f32; 3] = [FIELD_HALF_WIDTH, 0.25, 1.0];
    pub const PUSHER_FRICTION: f32 = 0.2;

    /// Economy
    pub const INITIAL_BALANCE: i64 = 100;
    pub const DROP_COST: i64 = 1;
    pub const BUMP_COST: i64 = 50;
    pub const STREAK_WINDOW_MS: f64 = 5000.0;
    pub const STREAK_THRESHOLD: u32 = 10;
    pub const STREAK_BONUS: i64 = 5;

    /// Coins laid out in front of the pusher on start/reset
    pub const INITIAL_COIN_COUNT: usize = 60;

    /// Bump impulse ranges (N·s), applied raw to every live body
    pub const BUMP_LATERAL_IMPULSE: f32 = 0.02;
    pub const BUMP_UP_IMPULSE_MIN: f32 = 0.05;
    pub const BUMP_UP_IMPULSE_MAX: f32 = 0.08;
    pub const BUMP_TORQUE_IMPULSE: f32 = 0.0004;

    /// Synthetic drop cadence when autoplay is on (simulation ms)
    pub const AUTOPLAY_INTERVAL_MS: f64 = 250.0;
}

/// Clamp a drop X coordinate to the playable width (keeps the coin off the walls)
#[inline]
pub fn clamp_drop_x(x: f32) -> f32 {
    let limit = consts::FIELD_HALF_WIDTH - consts::RARE_RADIUS;
    if x.is_finite() { x.clamp(-limit, limit) } else { 0.0 }
}
