//! Rigid-body world backed by Rapier
//!
//! Owns gravity, integration parameters and every body in the cabinet. Static and
//! kinematic bodies are created once at session start; dynamic coin bodies come and go
//! through the pools.

use std::fmt;
use std::time::{Duration, Instant};

use glam::{Quat, Vec3};
use rapier3d::na::{Translation3, UnitQuaternion};
use rapier3d::prelude::*;

/// Owned handle to a body in a [`RigidBodyWorld`].
///
/// Neither `Clone` nor `Copy`: [`RigidBodyWorld::remove`] consumes it, so a
/// body can be released at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct BodyHandle(RigidBodyHandle);

/// Collider shapes used by the cabinet and the coins.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vec3 },

    /// Y-aligned cylinder (meters). Coins lie flat with their axis on +Y.
    CylinderY { radius: f32, half_height: f32 },
}

impl ColliderShapeDef {
    fn builder(&self) -> ColliderBuilder {
        match self {
            ColliderShapeDef::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            ColliderShapeDef::CylinderY {
                radius,
                half_height,
            } => ColliderBuilder::cylinder(*half_height, *radius),
        }
    }
}

/// Material and damping for a dynamic body.
#[derive(Clone, Copy, Debug)]
pub struct DynamicBodyDesc {
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub restitution: f32,
    pub density: f32,
    pub friction: f32,
    /// Contact skin keeps thin coins from jittering when stacked.
    pub friction_skin: f32,
}

/// World-space pose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    fn to_isometry(self) -> Isometry<Real> {
        let r = self.rotation;
        let rotation = UnitQuaternion::from_quaternion(rapier3d::na::Quaternion::new(
            r.w, r.x, r.y, r.z,
        ));
        Isometry::from_parts(Translation3::from(to_vector(self.position)), rotation)
    }
}

/// Fatal physics backend failures. A session cannot start after one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// World parameters are unusable (non-finite gravity, non-positive step, ...)
    InvalidConfig(String),
    /// Backend setup exceeded its time budget
    InitTimeout { elapsed_ms: u64, budget_ms: u64 },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidConfig(msg) => write!(f, "invalid physics configuration: {msg}"),
            EngineError::InitTimeout {
                elapsed_ms,
                budget_ms,
            } => write!(
                f,
                "physics backend initialization took {elapsed_ms}ms (budget {budget_ms}ms)"
            ),
        }
    }
}

impl std::error::Error for EngineError {}

/// The physics world: every Rapier set plus the pipeline that steps them.
pub struct RigidBodyWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    steps: u64,
}

impl RigidBodyWorld {
    /// Create an empty world stepping at `fixed_step` seconds.
    ///
    /// Initialization is bounded by `init_budget`; exceeding it is fatal.
    pub fn new(gravity: Vec3, fixed_step: f64, init_budget: Duration) -> Result<Self, EngineError> {
        let started = Instant::now();

        if !gravity.is_finite() {
            return Err(EngineError::InvalidConfig(format!(
                "gravity must be finite, got {gravity}"
            )));
        }
        if !fixed_step.is_finite() || fixed_step <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "fixed step must be positive, got {fixed_step}"
            )));
        }

        let integration_parameters = IntegrationParameters {
            dt: fixed_step as Real,
            ..Default::default()
        };

        let world = Self {
            gravity: to_vector(gravity),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            steps: 0,
        };

        let elapsed = started.elapsed();
        if elapsed > init_budget {
            return Err(EngineError::InitTimeout {
                elapsed_ms: elapsed.as_millis() as u64,
                budget_ms: init_budget.as_millis() as u64,
            });
        }

        log::info!(
            "Physics world ready (dt={:.4}s, gravity={})",
            fixed_step,
            gravity
        );
        Ok(world)
    }

    /// Insert an immovable body (floor, walls).
    pub fn create_static(&mut self, shape: &ColliderShapeDef, pose: Pose, friction: f32) -> BodyHandle {
        let rb = RigidBodyBuilder::fixed().pose(pose.to_isometry()).build();
        let collider = shape.builder().friction(friction).build();
        self.insert(rb, collider)
    }

    /// Insert a position-driven body. Its pose is set, never integrated from forces.
    pub fn create_kinematic(&mut self, shape: &ColliderShapeDef, pose: Pose, friction: f32) -> BodyHandle {
        let rb = RigidBodyBuilder::kinematic_position_based()
            .pose(pose.to_isometry())
            .build();
        let collider = shape.builder().friction(friction).build();
        self.insert(rb, collider)
    }

    /// Insert a simulated body with CCD enabled (coins are thin relative to per-step travel).
    pub fn create_dynamic(&mut self, shape: &ColliderShapeDef, pose: Pose, desc: DynamicBodyDesc) -> BodyHandle {
        let rb = RigidBodyBuilder::dynamic()
            .pose(pose.to_isometry())
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .ccd_enabled(true)
            .build();
        let collider = shape
            .builder()
            .restitution(desc.restitution)
            .density(desc.density)
            .friction(desc.friction)
            .contact_skin(desc.friction_skin)
            .build();
        self.insert(rb, collider)
    }

    fn insert(&mut self, rb: RigidBody, collider: Collider) -> BodyHandle {
        let handle = self.bodies.insert(rb);
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        BodyHandle(handle)
    }

    /// Advance the world by exactly one fixed step.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
        self.steps += 1;
    }

    /// Destroy a body and its collider.
    pub fn remove(&mut self, handle: BodyHandle) {
        self.bodies.remove(
            handle.0,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Current pose of a body.
    pub fn pose(&self, handle: &BodyHandle) -> Pose {
        match self.bodies.get(handle.0) {
            Some(rb) => {
                let t = rb.translation();
                let q = rb.rotation().quaternion().coords;
                Pose {
                    position: Vec3::new(t.x, t.y, t.z),
                    rotation: Quat::from_xyzw(q.x, q.y, q.z, q.w),
                }
            }
            // Only reachable if a handle outlived its world, which ownership prevents.
            None => Pose::from_position(Vec3::ZERO),
        }
    }

    /// Linear velocity of a body.
    pub fn linvel(&self, handle: &BodyHandle) -> Vec3 {
        self.bodies
            .get(handle.0)
            .map(|rb| {
                let v = rb.linvel();
                Vec3::new(v.x, v.y, v.z)
            })
            .unwrap_or(Vec3::ZERO)
    }

    /// Wake a body and apply a raw linear and angular impulse (not mass-scaled).
    pub fn apply_impulse(&mut self, handle: &BodyHandle, impulse: Vec3, torque_impulse: Vec3) {
        if let Some(rb) = self.bodies.get_mut(handle.0) {
            rb.wake_up(true);
            rb.apply_impulse(to_vector(impulse), true);
            rb.apply_torque_impulse(to_vector(torque_impulse), true);
        }
    }

    /// Set where a kinematic body will be at the end of the next step.
    pub fn set_kinematic_target(&mut self, handle: &BodyHandle, position: Vec3) {
        if let Some(rb) = self.bodies.get_mut(handle.0) {
            rb.set_next_kinematic_translation(to_vector(position));
        }
    }

    /// Move a kinematic body instantly, without sweeping through what lies between.
    pub fn teleport(&mut self, handle: &BodyHandle, position: Vec3) {
        if let Some(rb) = self.bodies.get_mut(handle.0) {
            rb.set_translation(to_vector(position), true);
            rb.set_next_kinematic_translation(to_vector(position));
        }
    }

    /// Number of bodies of every kind currently in the world.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Steps taken since creation.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn gravity(&self) -> Vec3 {
        Vec3::new(self.gravity.x, self.gravity.y, self.gravity.z)
    }
}

impl Drop for RigidBodyWorld {
    fn drop(&mut self) {
        log::info!(
            "Releasing physics world ({} bodies, {} steps)",
            self.bodies.len(),
            self.steps
        );
    }
}

#[inline]
fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}
