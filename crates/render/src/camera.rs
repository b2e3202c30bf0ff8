use glam::{Mat4, Vec3};

/// Orbit camera: a spherical position around a target point, with damped
/// response so pointer input eases in over a few frames.
///
/// Projection matrices are recomputed from the current fields on every call;
/// nothing is cached, so an aspect write takes effect on the next frame.
pub struct OrbitCamera {
    pub target: Vec3,
    /// Vertical field of view, radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub sensitivity: f32,
    /// Response rate of the damped motion, per second.
    pub damping: f32,
    yaw: f32,
    pitch: f32,
    distance: f32,
    yaw_goal: f32,
    pitch_goal: f32,
    distance_goal: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        let yaw = std::f32::consts::FRAC_PI_4;
        let pitch = 0.45;
        let distance = 6.0;
        Self {
            target: Vec3::new(0.0, 1.0, 0.0),
            fov: 75.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
            sensitivity: 0.005,
            damping: 8.0,
            yaw,
            pitch,
            distance,
            yaw_goal: yaw,
            pitch_goal: pitch,
            distance_goal: distance,
        }
    }
}

impl OrbitCamera {
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Apply a pointer drag. Only moves the goals; `update` eases toward them.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw_goal += dx * self.sensitivity;
        self.pitch_goal = (self.pitch_goal + dy * self.sensitivity)
            .clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }

    /// Apply a scroll step toward or away from the target.
    pub fn dolly(&mut self, delta: f32) {
        self.distance_goal = (self.distance_goal - delta).clamp(0.5, 50.0);
    }

    /// Advance the damped state by one frame.
    pub fn update(&mut self, dt: f32) {
        let t = 1.0 - (-self.damping * dt.max(0.0)).exp();
        self.yaw += (self.yaw_goal - self.yaw) * t;
        self.pitch += (self.pitch_goal - self.pitch) * t;
        self.distance += (self.distance_goal - self.distance) * t;
    }

    pub fn position(&self) -> Vec3 {
        let offset = Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        ) * self.distance;
        self.target + offset
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_is_valid() {
        let cam = OrbitCamera::default();
        let vp = cam.view_projection();
        assert!(!vp.col(0).x.is_nan());
        assert!(cam.position().length() > 0.0);
    }

    #[test]
    fn aspect_write_changes_projection() {
        let mut cam = OrbitCamera::default();
        let before = cam.projection_matrix();
        cam.set_aspect(800.0 / 600.0);
        assert_ne!(cam.projection_matrix(), before);
        assert_eq!(cam.aspect, 800.0 / 600.0);
    }

    #[test]
    fn update_converges_to_orbit_goal() {
        let mut cam = OrbitCamera::default();
        let start = cam.position();
        cam.orbit(200.0, 0.0);
        // Damped: one small step moves partway, many steps converge.
        cam.update(1.0 / 60.0);
        let one_step = cam.position();
        assert_ne!(one_step, start);
        for _ in 0..600 {
            cam.update(1.0 / 60.0);
        }
        let settled = cam.position();
        cam.update(1.0 / 60.0);
        assert!((cam.position() - settled).length() < 1e-3);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = OrbitCamera::default();
        cam.orbit(0.0, 1.0e6);
        for _ in 0..600 {
            cam.update(1.0 / 60.0);
        }
        // Never flips over the pole.
        assert!(cam.position().y <= cam.target.y + cam.far);
        assert!(cam.view_matrix().is_finite());
    }

    #[test]
    fn zero_dt_is_a_no_op() {
        let mut cam = OrbitCamera::default();
        cam.orbit(100.0, 50.0);
        let before = cam.position();
        cam.update(0.0);
        assert_eq!(cam.position(), before);
    }

    #[test]
    fn dolly_clamps_distance() {
        let mut cam = OrbitCamera::default();
        cam.dolly(1.0e4);
        for _ in 0..600 {
            cam.update(1.0 / 60.0);
        }
        assert!((cam.position() - cam.target).length() >= 0.5 - 1e-3);
    }
}
