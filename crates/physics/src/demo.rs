use crate::world::{BodyId, PhysicsSettings, PhysicsWorld};
use glam::Vec3;
use heavens_common::Transform;
use heavens_common::scene::{FLOOR_HALF_EXTENT, SPHERE_LAUNCH_VELOCITY, SPHERE_RADIUS, SPHERE_SPAWN};

const SPHERE_RESTITUTION: f32 = 0.8;
const FLOOR_HALF_HEIGHT: f32 = 1.0;

/// A static floor whose top face is y = 0 and a ball dropped onto it.
pub struct BouncingSphere {
    world: PhysicsWorld,
    floor: BodyId,
    sphere: BodyId,
}

impl Default for BouncingSphere {
    fn default() -> Self {
        Self::new(PhysicsSettings::default())
    }
}

impl BouncingSphere {
    pub fn new(settings: PhysicsSettings) -> Self {
        let mut world = PhysicsWorld::new(settings);
        let floor = world.add_static_box(
            Vec3::new(FLOOR_HALF_EXTENT, FLOOR_HALF_HEIGHT, FLOOR_HALF_EXTENT),
            Vec3::new(0.0, -FLOOR_HALF_HEIGHT, 0.0),
        );
        let sphere = world.add_dynamic_sphere(
            SPHERE_RADIUS,
            SPHERE_SPAWN,
            SPHERE_LAUNCH_VELOCITY,
            SPHERE_RESTITUTION,
        );
        tracing::info!(
            "physics demo ready: {} bodies, sphere at {}",
            world.body_count(),
            SPHERE_SPAWN
        );
        Self {
            world,
            floor,
            sphere,
        }
    }

    /// Advance by one frame's worth of time; returns fixed steps taken.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        self.world.advance(frame_dt)
    }

    /// Sphere transform, scaled so a unit-radius mesh matches the collider.
    pub fn sphere_transform(&self) -> Transform {
        self.world
            .body_transform(self.sphere)
            .unwrap_or_else(|| Transform::from_position(SPHERE_SPAWN))
            .with_scale(Vec3::splat(SPHERE_RADIUS))
    }

    pub fn sphere_velocity(&self) -> Vec3 {
        self.world.linear_velocity(self.sphere).unwrap_or(Vec3::ZERO)
    }

    /// Put the sphere back at its spawn point with its launch velocity.
    pub fn reset(&mut self) {
        self.world
            .set_body_state(self.sphere, SPHERE_SPAWN, SPHERE_LAUNCH_VELOCITY);
        tracing::info!("sphere reset to {SPHERE_SPAWN}");
    }

    pub fn floor(&self) -> BodyId {
        self.floor
    }

    pub fn sphere(&self) -> BodyId {
        self.sphere
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }
}
