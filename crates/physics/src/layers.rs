use rapier3d::prelude::{Group, InteractionGroups};

/// Coarse collision layer of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectLayer {
    /// Static geometry: floors, walls.
    NonMoving,
    /// Anything simulated.
    Moving,
}

impl ObjectLayer {
    pub const ALL: [ObjectLayer; 2] = [ObjectLayer::NonMoving, ObjectLayer::Moving];

    /// Whether bodies on `self` and `other` can touch.
    pub fn should_collide(self, other: ObjectLayer) -> bool {
        match self {
            ObjectLayer::NonMoving => other == ObjectLayer::Moving,
            ObjectLayer::Moving => true,
        }
    }

    fn group(self) -> Group {
        match self {
            ObjectLayer::NonMoving => Group::GROUP_1,
            ObjectLayer::Moving => Group::GROUP_2,
        }
    }

    /// Collision groups encoding [`should_collide`](Self::should_collide)
    /// for rapier's broad phase filter.
    pub fn interaction_groups(self) -> InteractionGroups {
        let filter = Self::ALL
            .into_iter()
            .filter(|other| self.should_collide(*other))
            .fold(Group::NONE, |acc, other| acc | other.group());
        InteractionGroups::new(self.group(), filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_table() {
        use ObjectLayer::*;
        assert!(!NonMoving.should_collide(NonMoving));
        assert!(NonMoving.should_collide(Moving));
        assert!(Moving.should_collide(NonMoving));
        assert!(Moving.should_collide(Moving));
    }

    #[test]
    fn groups_match_table() {
        for a in ObjectLayer::ALL {
            for b in ObjectLayer::ALL {
                assert_eq!(
                    a.interaction_groups().test(b.interaction_groups()),
                    a.should_collide(b),
                    "{a:?} vs {b:?}"
                );
            }
        }
    }
}
