//! Simulation module
//!
//! Physics, pools, economy and timing. Rules for everything in here:
//! - Fixed timestep only; time comes from the clock, never the wall
//! - Seeded RNG only
//! - Stable iteration order (pool slot order)
//! - No rendering or platform dependencies

pub mod clock;
pub mod economy;
pub mod playfield;
pub mod pool;
pub mod pusher;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod world;

pub use clock::SimulationClock;
pub use economy::{
    CollectOutcome, DropOutcome, DropRejection, EconomySnapshot, EconomyState,
};
pub use playfield::Playfield;
pub use pool::{Coin, CoinKind, CoinPool, ExitEvent, ExitKind};
pub use pusher::PusherActuator;
pub use snapshot::{CoinInstance, RenderSnapshot, SlotTransform};
pub use state::{GamePhase, GameState, SessionStats};
pub use tick::{TickReport, tick};
pub use world::{BodyHandle, ColliderShapeDef, DynamicBodyDesc, EngineError, Pose, RigidBodyWorld};
