//! Fixed layout of the demo scene.

use crate::Transform;
use glam::{Quat, Vec3};

/// Half-width of the floor in X and Z.
pub const FLOOR_HALF_EXTENT: f32 = 20.0;

pub const SPHERE_RADIUS: f32 = 0.5;

pub const SPHERE_SPAWN: Vec3 = Vec3::new(0.0, 6.0, 0.0);

/// Initial velocity given to the sphere when it spawns or resets.
pub const SPHERE_LAUNCH_VELOCITY: Vec3 = Vec3::new(0.0, -5.0, 0.0);

/// Where the camera starts: behind the sphere, looking down the -Z axis.
pub const CAMERA_START: Vec3 = Vec3::new(0.0, 2.5, 10.0);

/// Cube centres. All sit above the floor.
pub const CUBE_POSITIONS: [Vec3; 10] = [
    Vec3::new(0.0, 1.5, -4.0),
    Vec3::new(2.0, 5.0, -15.0),
    Vec3::new(-1.5, 2.2, -2.5),
    Vec3::new(-3.8, 2.0, -12.3),
    Vec3::new(2.4, 1.2, -3.5),
    Vec3::new(-1.7, 3.0, -7.5),
    Vec3::new(1.3, 3.4, -2.5),
    Vec3::new(1.5, 2.0, -2.5),
    Vec3::new(1.5, 1.1, -1.5),
    Vec3::new(-1.3, 1.0, -1.8),
];

const CUBE_TILT_AXIS: Vec3 = Vec3::new(1.0, 0.3, 0.5);

/// Transform of cube `index` at `time_secs` since startup.
///
/// Each cube is tilted by `20° * index`; every third cube also spins.
pub fn cube_transform(index: usize, time_secs: f32) -> Transform {
    let position = CUBE_POSITIONS[index % CUBE_POSITIONS.len()];
    let mut angle = (20.0 * index as f32).to_radians();
    if index % 3 == 0 {
        angle += time_secs * 50.0_f32.to_radians();
    }
    Transform::from_position(position)
        .with_rotation(Quat::from_axis_angle(CUBE_TILT_AXIS.normalize(), angle))
}

/// Every cube transform for the given time.
pub fn cube_transforms(time_secs: f32) -> Vec<Transform> {
    (0..CUBE_POSITIONS.len())
        .map(|i| cube_transform(i, time_secs))
        .collect()
}

/// The textured floor plane: a unit plane stretched to the floor extent.
pub fn floor_transform() -> Transform {
    Transform::default().with_scale(Vec3::new(FLOOR_HALF_EXTENT, 1.0, FLOOR_HALF_EXTENT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubes_sit_above_the_floor() {
        // Half-diagonal of a unit cube bounds how far a rotated cube reaches down.
        let reach = 3.0_f32.sqrt() * 0.5;
        for p in CUBE_POSITIONS {
            assert!(p.y - reach > 0.0, "cube at {p} pokes through the floor");
        }
    }

    #[test]
    fn only_every_third_cube_spins() {
        let a = cube_transform(1, 0.0);
        let b = cube_transform(1, 10.0);
        assert_eq!(a, b);

        let c = cube_transform(3, 0.0);
        let d = cube_transform(3, 1.0);
        assert_ne!(c.rotation, d.rotation);
        assert_eq!(c.position, d.position);
    }

    #[test]
    fn first_cube_is_untilted_at_start() {
        let t = cube_transform(0, 0.0);
        assert!(t.rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn floor_spans_the_extent() {
        let floor = floor_transform();
        let corner = floor.matrix().transform_point3(Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(corner, Vec3::new(FLOOR_HALF_EXTENT, 0.0, FLOOR_HALF_EXTENT));
    }

    #[test]
    fn sphere_spawns_inside_the_floor_bounds() {
        assert!(SPHERE_SPAWN.x.abs() < FLOOR_HALF_EXTENT);
        assert!(SPHERE_SPAWN.z.abs() < FLOOR_HALF_EXTENT);
        assert!(SPHERE_SPAWN.y > SPHERE_RADIUS);
    }
}
