use glam::{Mat3, Mat4, Vec3};

const MIN_FOV_DEGREES: f32 = 1.0;
const MAX_FOV_DEGREES: f32 = 75.0;
const PITCH_LIMIT_DEGREES: f32 = 89.0;

/// Free-fly camera with position, yaw, pitch, and projection parameters.
#[derive(Debug, Clone)]
pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view, radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Units per second at a movement multiplier of 1.
    pub speed: f32,
    /// Radians per pixel of mouse motion.
    pub sensitivity: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 8.0),
            yaw: -90.0_f32.to_radians(),
            pitch: 0.0,
            fov: 45.0_f32.to_radians(),
            aspect: 4.0 / 3.0,
            near: 0.1,
            far: 100.0,
            speed: 2.5,
            sensitivity: 0.002,
        }
    }
}

impl FlyCamera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    /// Move along the view: `axes.x` strafes, `axes.y` rises along world up,
    /// `axes.z` goes forward. `dt` should already include any sprint factor.
    pub fn fly(&mut self, axes: Vec3, dt: f32) {
        let step = self.speed * dt;
        self.position += self.forward() * axes.z * step;
        self.position += self.right() * axes.x * step;
        self.position.y += axes.y * step;
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self.pitch.clamp(
            -PITCH_LIMIT_DEGREES.to_radians(),
            PITCH_LIMIT_DEGREES.to_radians(),
        );
    }

    /// Narrow (positive delta) or widen the field of view, one degree per unit.
    pub fn zoom(&mut self, delta: f32) {
        let fov = self.fov.to_degrees() - delta;
        self.fov = fov.clamp(MIN_FOV_DEGREES, MAX_FOV_DEGREES).to_radians();
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// View-projection with the translation removed, so the skybox stays
    /// centred on the eye.
    pub fn skybox_view_projection(&self) -> Mat4 {
        let rotation_only = Mat4::from_mat3(Mat3::from_mat4(self.view_matrix()));
        self.projection_matrix() * rotation_only
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_looks_down_negative_z() {
        let cam = FlyCamera::default();
        assert!((cam.forward() - Vec3::NEG_Z).length() < 1e-5);
        assert!((cam.right() - Vec3::X).length() < 1e-5);
        let vp = cam.view_projection();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn fly_moves_along_axes() {
        let mut cam = FlyCamera::default();
        let start = cam.position;
        cam.fly(Vec3::Z, 1.0);
        assert!((cam.position - (start + Vec3::NEG_Z * cam.speed)).length() < 1e-5);

        let start = cam.position;
        cam.fly(Vec3::new(1.0, 1.0, 0.0), 2.0);
        let expected = start + Vec3::new(2.0 * cam.speed, 2.0 * cam.speed, 0.0);
        assert!((cam.position - expected).length() < 1e-4);
    }

    #[test]
    fn fly_with_no_input_stays_put() {
        let mut cam = FlyCamera::default();
        let start = cam.position;
        cam.fly(Vec3::ZERO, 10.0);
        assert_eq!(cam.position, start);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = FlyCamera::default();
        cam.rotate(0.0, -1.0e6);
        assert!(cam.pitch <= 89.0_f32.to_radians() + 1e-6);
        cam.rotate(0.0, 1.0e6);
        assert!(cam.pitch >= -89.0_f32.to_radians() - 1e-6);
        assert!(!cam.forward().is_nan());
    }

    #[test]
    fn zoom_is_clamped() {
        let mut cam = FlyCamera::default();
        cam.zoom(5.0);
        assert!((cam.fov.to_degrees() - 40.0).abs() < 1e-3);
        cam.zoom(1000.0);
        assert!((cam.fov.to_degrees() - 1.0).abs() < 1e-3);
        cam.zoom(-1000.0);
        assert!((cam.fov.to_degrees() - 75.0).abs() < 1e-3);
    }

    #[test]
    fn viewport_sets_aspect() {
        let mut cam = FlyCamera::default();
        cam.set_viewport(1920, 1080);
        assert!((cam.aspect - 16.0 / 9.0).abs() < 1e-6);
        cam.set_viewport(100, 0);
        assert_eq!(cam.aspect, 100.0);
    }

    #[test]
    fn skybox_ignores_camera_position() {
        let mut a = FlyCamera::default();
        let mut b = FlyCamera::default();
        a.position = Vec3::ZERO;
        b.position = Vec3::new(50.0, -3.0, 12.0);
        let dir = glam::Vec4::new(0.3, 0.2, -1.0, 1.0);
        let pa = a.skybox_view_projection() * dir;
        let pb = b.skybox_view_projection() * dir;
        assert!((pa - pb).length() < 1e-5);
    }
}
