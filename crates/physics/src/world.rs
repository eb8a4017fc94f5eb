use crate::layers::ObjectLayer;
use crate::listener::{ActivationChange, ActivationTracker, ContactListener, ContactStats};
use glam::{Quat, Vec3};
use heavens_common::Transform;
use rapier3d::prelude::*;

/// Handle to a body in a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(pub RigidBodyHandle);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsSettings {
    pub gravity: Vec3,
    /// Length of one fixed step, in seconds.
    pub timestep: f32,
    /// Upper bound on steps per [`PhysicsWorld::advance`] call.
    pub max_substeps: u32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            timestep: 1.0 / 60.0,
            max_substeps: 8,
        }
    }
}

/// Rapier world plus the bookkeeping to drive it from a variable frame rate.
pub struct PhysicsWorld {
    settings: PhysicsSettings,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    contacts: ContactListener,
    activation: ActivationTracker,
    last_activations: Vec<ActivationChange>,
    accumulator: f32,
    steps: u64,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsSettings::default())
    }
}

impl PhysicsWorld {
    pub fn new(settings: PhysicsSettings) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: settings.timestep,
            ..IntegrationParameters::default()
        };
        tracing::debug!(
            "physics world: gravity={:?} timestep={:.4}s",
            settings.gravity,
            settings.timestep
        );
        Self {
            settings,
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            contacts: ContactListener::default(),
            activation: ActivationTracker::default(),
            last_activations: Vec::new(),
            accumulator: 0.0,
            steps: 0,
        }
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    /// Add an immovable box on the [`ObjectLayer::NonMoving`] layer.
    pub fn add_static_box(&mut self, half_extents: Vec3, position: Vec3) -> BodyId {
        let body = RigidBodyBuilder::fixed()
            .translation(to_vector(position))
            .build();
        let handle = self.bodies.insert(body);
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .collision_groups(ObjectLayer::NonMoving.interaction_groups())
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        BodyId(handle)
    }

    /// Add a simulated sphere on the [`ObjectLayer::Moving`] layer.
    ///
    /// The sphere's restitution wins over whatever it hits, so a bouncy ball
    /// stays bouncy on a dead floor.
    pub fn add_dynamic_sphere(
        &mut self,
        radius: f32,
        position: Vec3,
        linear_velocity: Vec3,
        restitution: f32,
    ) -> BodyId {
        let body = RigidBodyBuilder::dynamic()
            .translation(to_vector(position))
            .linvel(to_vector(linear_velocity))
            .ccd_enabled(true)
            .build();
        let handle = self.bodies.insert(body);
        let collider = ColliderBuilder::ball(radius)
            .restitution(restitution)
            .restitution_combine_rule(CoefficientCombineRule::Max)
            .collision_groups(ObjectLayer::Moving.interaction_groups())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        BodyId(handle)
    }

    /// Run exactly one fixed step.
    pub fn step(&mut self) {
        let gravity = to_vector(self.settings.gravity);
        self.integration_parameters.dt = self.settings.timestep;
        self.pipeline.step(
            &gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.contacts,
        );
        self.last_activations = self.activation.update(&self.bodies);
        self.steps += 1;
    }

    /// Feed `frame_dt` seconds of wall time and run as many whole steps as
    /// fit, up to `max_substeps`. Time beyond the cap is discarded so a long
    /// stall does not turn into a burst of catch-up steps.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let timestep = self.settings.timestep;
        if frame_dt.is_infinite() && frame_dt > 0.0 {
            // Unbounded stall: run a full capped frame and start clean.
            tracing::debug!(
                "non-finite frame time, running {} steps",
                self.settings.max_substeps
            );
            for _ in 0..self.settings.max_substeps {
                self.step();
            }
            self.accumulator = 0.0;
            return self.settings.max_substeps;
        }
        self.accumulator += frame_dt.max(0.0);

        let mut taken = 0;
        while self.accumulator >= timestep && taken < self.settings.max_substeps {
            self.step();
            self.accumulator -= timestep;
            taken += 1;
        }

        if self.accumulator >= timestep {
            tracing::debug!(
                "physics fell behind, dropping {:.3}s",
                self.accumulator - self.accumulator % timestep
            );
            self.accumulator %= timestep;
        }
        taken
    }

    pub fn body_transform(&self, id: BodyId) -> Option<Transform> {
        self.bodies.get(id.0).map(|body| {
            let t = body.translation();
            let r = body.rotation();
            Transform {
                position: Vec3::new(t.x, t.y, t.z),
                rotation: Quat::from_xyzw(r.i, r.j, r.k, r.w),
                scale: Vec3::ONE,
            }
        })
    }

    pub fn linear_velocity(&self, id: BodyId) -> Option<Vec3> {
        self.bodies.get(id.0).map(|body| {
            let v = body.linvel();
            Vec3::new(v.x, v.y, v.z)
        })
    }

    pub fn is_sleeping(&self, id: BodyId) -> Option<bool> {
        self.bodies.get(id.0).map(|body| body.is_sleeping())
    }

    /// Teleport a body and give it a new velocity. Rotation and spin are
    /// cleared and the body is woken.
    pub fn set_body_state(&mut self, id: BodyId, position: Vec3, linear_velocity: Vec3) -> bool {
        let Some(body) = self.bodies.get_mut(id.0) else {
            return false;
        };
        body.set_translation(to_vector(position), true);
        body.set_rotation(Rotation::identity(), true);
        body.set_linvel(to_vector(linear_velocity), true);
        body.set_angvel(vector![0.0, 0.0, 0.0], true);
        true
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn contact_stats(&self) -> ContactStats {
        self.contacts.stats()
    }

    /// Wake/sleep transitions produced by the most recent step.
    pub fn last_activations(&self) -> &[ActivationChange] {
        &self.last_activations
    }

    /// Steps run since creation.
    pub fn step_count(&self) -> u64 {
        self.steps
    }
}

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::Activation;

    fn world_with_floor() -> PhysicsWorld {
        let mut world = PhysicsWorld::default();
        world.add_static_box(Vec3::new(10.0, 1.0, 10.0), Vec3::new(0.0, -1.0, 0.0));
        world
    }

    #[test]
    fn advance_runs_whole_steps() {
        let mut world = PhysicsWorld::default();
        let half = world.settings().timestep * 0.5;
        assert_eq!(world.advance(half), 0);
        assert_eq!(world.advance(half), 1);
        assert_eq!(world.step_count(), 1);
    }

    #[test]
    fn advance_caps_substeps() {
        let mut world = PhysicsWorld::default();
        assert_eq!(world.advance(1.0), 8);
        // The backlog was dropped, not carried over.
        assert_eq!(world.advance(0.0), 0);
    }

    #[test]
    fn infinite_dt_runs_capped_frame_and_recovers() {
        let mut world = PhysicsWorld::default();
        let dt = world.settings().timestep;
        assert_eq!(world.advance(f32::INFINITY), 8);
        assert_eq!(world.advance(dt), 1);
        assert_eq!(world.advance(1.0), 8);
        assert_eq!(world.advance(f32::NAN), 0);
        assert_eq!(world.advance(dt), 1);
        assert_eq!(world.step_count(), 18);
    }

    #[test]
    fn negative_dt_is_ignored() {
        let mut world = PhysicsWorld::default();
        assert_eq!(world.advance(-1.0), 0);
        assert_eq!(world.step_count(), 0);
    }

    #[test]
    fn sphere_falls_under_gravity() {
        let mut world = world_with_floor();
        let ball = world.add_dynamic_sphere(0.5, Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, 0.0);
        for _ in 0..30 {
            world.step();
        }
        let t = world.body_transform(ball).unwrap();
        assert!(t.position.y < 5.0);
        assert!(world.linear_velocity(ball).unwrap().y < 0.0);
    }

    #[test]
    fn static_boxes_do_not_interact() {
        let mut world = PhysicsWorld::default();
        world.add_static_box(Vec3::ONE, Vec3::ZERO);
        world.add_static_box(Vec3::ONE, Vec3::new(0.5, 0.0, 0.0));
        for _ in 0..10 {
            world.step();
        }
        assert_eq!(world.contact_stats(), ContactStats::default());
        assert_eq!(world.body_count(), 2);
    }

    #[test]
    fn resting_sphere_goes_to_sleep() {
        let mut world = world_with_floor();
        let ball = world.add_dynamic_sphere(0.5, Vec3::new(0.0, 0.5, 0.0), Vec3::ZERO, 0.0);

        world.step();
        assert!(
            world
                .last_activations()
                .iter()
                .any(|c| c.body == ball.0 && c.activation == Activation::Activated)
        );

        let mut slept = false;
        for _ in 0..60 * 20 {
            world.step();
            if world
                .last_activations()
                .iter()
                .any(|c| c.body == ball.0 && c.activation == Activation::Deactivated)
            {
                slept = true;
                break;
            }
        }
        assert!(slept);
        assert_eq!(world.is_sleeping(ball), Some(true));
    }

    #[test]
    fn set_body_state_teleports_and_wakes() {
        let mut world = world_with_floor();
        let ball = world.add_dynamic_sphere(0.5, Vec3::new(0.0, 3.0, 0.0), Vec3::ZERO, 0.0);
        world.step();

        assert!(world.set_body_state(ball, Vec3::new(1.0, 4.0, 2.0), Vec3::new(0.0, 2.0, 0.0)));
        let t = world.body_transform(ball).unwrap();
        assert_eq!(t.position, Vec3::new(1.0, 4.0, 2.0));
        assert_eq!(world.linear_velocity(ball), Some(Vec3::new(0.0, 2.0, 0.0)));
        assert_eq!(world.is_sleeping(ball), Some(false));
    }
}
