use rapier3d::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Totals of collision events seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactStats {
    pub started: u64,
    pub stopped: u64,
}

impl ContactStats {
    /// Pairs currently touching.
    pub fn touching(&self) -> u64 {
        self.started.saturating_sub(self.stopped)
    }
}

/// Receives collision events during a step. Counts and logs them.
#[derive(Debug, Default)]
pub(crate) struct ContactListener {
    started: AtomicU64,
    stopped: AtomicU64,
}

impl ContactListener {
    pub(crate) fn stats(&self) -> ContactStats {
        ContactStats {
            started: self.started.load(Ordering::Relaxed),
            stopped: self.stopped.load(Ordering::Relaxed),
        }
    }
}

impl EventHandler for ContactListener {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        match event {
            CollisionEvent::Started(a, b, _) => {
                self.started.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("contact added: {a:?} <-> {b:?}");
            }
            CollisionEvent::Stopped(a, b, _) => {
                self.stopped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("contact removed: {a:?} <-> {b:?}");
            }
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Activated,
    Deactivated,
}

/// A dynamic body that woke up or fell asleep during the last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationChange {
    pub body: RigidBodyHandle,
    pub activation: Activation,
}

/// Tracks sleep state of dynamic bodies between steps.
#[derive(Debug, Default)]
pub(crate) struct ActivationTracker {
    sleeping: HashMap<RigidBodyHandle, bool>,
}

impl ActivationTracker {
    /// Diff current sleep state against the previous call. A body seen for
    /// the first time while awake counts as activated.
    pub(crate) fn update(&mut self, bodies: &RigidBodySet) -> Vec<ActivationChange> {
        let mut changes = Vec::new();

        for (handle, body) in bodies.iter() {
            if !body.is_dynamic() {
                continue;
            }
            let sleeping = body.is_sleeping();
            let activation = match (self.sleeping.insert(handle, sleeping), sleeping) {
                (None | Some(true), false) => Some(Activation::Activated),
                (Some(false), true) => Some(Activation::Deactivated),
                _ => None,
            };
            if let Some(activation) = activation {
                tracing::debug!("body {handle:?} {activation:?}");
                changes.push(ActivationChange {
                    body: handle,
                    activation,
                });
            }
        }

        self.sleeping.retain(|handle, _| bodies.contains(*handle));
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_touching() {
        let stats = ContactStats {
            started: 3,
            stopped: 2,
        };
        assert_eq!(stats.touching(), 1);
        assert_eq!(ContactStats::default().touching(), 0);
    }

    #[test]
    fn tracker_reports_new_awake_body_once() {
        let mut bodies = RigidBodySet::new();
        let fixed = bodies.insert(RigidBodyBuilder::fixed().build());
        let dynamic = bodies.insert(RigidBodyBuilder::dynamic().build());

        let mut tracker = ActivationTracker::default();
        let first = tracker.update(&bodies);
        assert_eq!(
            first,
            vec![ActivationChange {
                body: dynamic,
                activation: Activation::Activated
            }]
        );
        assert!(first.iter().all(|c| c.body != fixed));
        assert!(tracker.update(&bodies).is_empty());
    }

    #[test]
    fn tracker_reports_sleep_and_wake() {
        let mut bodies = RigidBodySet::new();
        let handle = bodies.insert(RigidBodyBuilder::dynamic().build());
        let mut tracker = ActivationTracker::default();
        tracker.update(&bodies);

        bodies.get_mut(handle).unwrap().sleep();
        assert_eq!(
            tracker.update(&bodies)[0].activation,
            Activation::Deactivated
        );

        bodies.get_mut(handle).unwrap().wake_up(true);
        assert_eq!(tracker.update(&bodies)[0].activation, Activation::Activated);
    }
}
