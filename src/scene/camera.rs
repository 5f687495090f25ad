//! Free-fly camera

use glam::{Mat4, Vec3};

/// Default yaw in degrees; looks down -Z
pub const DEFAULT_YAW: f32 = -90.0;
/// Default pitch in degrees
pub const DEFAULT_PITCH: f32 = 0.0;
/// Translation speed in world units per second
pub const DEFAULT_SPEED: f32 = 2.5;
/// Degrees of rotation per pixel of mouse travel
pub const DEFAULT_SENSITIVITY: f32 = 0.1;
/// Default vertical field of view in degrees
pub const DEFAULT_ZOOM: f32 = 45.0;

const MIN_ZOOM: f32 = 1.0;
const MAX_ZOOM: f32 = 45.0;
const PITCH_LIMIT: f32 = 89.0;

/// Directional impulse applied by the movement keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
}

/// First-person camera driven by keyboard impulses, mouse look and scroll zoom
#[derive(Debug, Clone)]
pub struct FlyCamera {
    pub position: Vec3,
    /// Facing vector. Persisted as-is, so it is not renormalized on load.
    pub front: Vec3,
    pub up: Vec3,
    pub right: Vec3,
    pub world_up: Vec3,
    /// Degrees
    pub yaw: f32,
    /// Degrees, kept within +-89 by mouse look
    pub pitch: f32,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    /// Vertical field of view in degrees
    pub zoom: f32,
}

impl FlyCamera {
    /// Creates a camera at `position` looking down -Z
    pub fn new(position: Vec3) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: Vec3::Y,
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
            movement_speed: DEFAULT_SPEED,
            mouse_sensitivity: DEFAULT_SENSITIVITY,
            zoom: DEFAULT_ZOOM,
        };
        camera.update_vectors();
        camera
    }

    /// Right-handed look-at matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Perspective projection with the zoom as vertical field of view
    pub fn projection_matrix(&self, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::perspective_rh(self.zoom.to_radians(), aspect, near, far)
    }

    /// Moves the camera along its basis, scaled by the frame delta
    pub fn process_keyboard(&mut self, movement: Movement, delta_time: f32) {
        let velocity = self.movement_speed * delta_time;
        match movement {
            Movement::Forward => self.position += self.front * velocity,
            Movement::Backward => self.position -= self.front * velocity,
            Movement::Left => self.position -= self.right * velocity,
            Movement::Right => self.position += self.right * velocity,
        }
    }

    /// Accumulates yaw and pitch from a mouse delta (Y already points up)
    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32, constrain_pitch: bool) {
        self.yaw += x_offset * self.mouse_sensitivity;
        self.pitch += y_offset * self.mouse_sensitivity;

        if constrain_pitch {
            self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }

        self.update_vectors();
    }

    /// Narrows or widens the field of view
    pub fn process_mouse_scroll(&mut self, y_offset: f32) {
        self.zoom = (self.zoom - y_offset).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Replaces the facing vector and re-derives yaw, pitch and the basis from it
    pub fn set_front(&mut self, front: Vec3) {
        self.front = front;

        let Some(direction) = front.try_normalize() else {
            return;
        };

        self.yaw = direction.z.atan2(direction.x).to_degrees();
        self.pitch = direction.y.clamp(-1.0, 1.0).asin().to_degrees();
        self.update_basis(direction);
    }

    /// Recomputes front, right and up from yaw and pitch
    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());
        self.front = front.normalize();
        self.update_basis(self.front);
    }

    fn update_basis(&mut self, direction: Vec3) {
        self.right = direction.cross(self.world_up).normalize_or_zero();
        self.up = self.right.cross(direction).normalize_or_zero();
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_default_camera_faces_negative_z() {
        let camera = FlyCamera::default();
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 3.0));
        assert!(camera.front.abs_diff_eq(Vec3::NEG_Z, EPSILON));
        assert!(camera.right.abs_diff_eq(Vec3::X, EPSILON));
        assert!(camera.up.abs_diff_eq(Vec3::Y, EPSILON));
        assert_eq!(camera.zoom, 45.0);
    }

    #[test]
    fn test_keyboard_movement_scales_with_delta() {
        let mut camera = FlyCamera::default();
        camera.process_keyboard(Movement::Forward, 0.5);
        assert!(camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, 1.75), EPSILON));

        camera.process_keyboard(Movement::Right, 1.0);
        assert!(camera.position.abs_diff_eq(Vec3::new(2.5, 0.0, 1.75), EPSILON));

        camera.process_keyboard(Movement::Left, 1.0);
        camera.process_keyboard(Movement::Backward, 0.5);
        assert!(camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, 3.0), EPSILON));
    }

    #[test]
    fn test_pitch_is_constrained() {
        let mut camera = FlyCamera::default();
        camera.process_mouse_movement(0.0, 10_000.0, true);
        assert_eq!(camera.pitch, 89.0);

        camera.process_mouse_movement(0.0, -20_000.0, true);
        assert_eq!(camera.pitch, -89.0);
    }

    #[test]
    fn test_yaw_turns_towards_positive_x() {
        let mut camera = FlyCamera::default();
        // 900 px * 0.1 = 90 degrees of yaw
        camera.process_mouse_movement(900.0, 0.0, true);
        assert!((camera.yaw - 0.0).abs() < EPSILON);
        assert!(camera.front.abs_diff_eq(Vec3::X, 1e-4));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = FlyCamera::default();
        camera.process_mouse_scroll(-5.0);
        assert_eq!(camera.zoom, 45.0);

        camera.process_mouse_scroll(50.0);
        assert_eq!(camera.zoom, 1.0);

        camera.process_mouse_scroll(-3.0);
        assert_eq!(camera.zoom, 4.0);
    }

    #[test]
    fn test_set_front_derives_angles() {
        let mut camera = FlyCamera::default();
        camera.set_front(Vec3::new(1.0, 0.0, 0.0));
        assert!(camera.yaw.abs() < EPSILON);
        assert!(camera.pitch.abs() < EPSILON);

        // The next mouse sample continues from the loaded orientation
        camera.process_mouse_movement(0.0, 0.0, true);
        assert!(camera.front.abs_diff_eq(Vec3::X, 1e-4));
    }

    #[test]
    fn test_set_front_keeps_degenerate_vector() {
        let mut camera = FlyCamera::default();
        camera.set_front(Vec3::ZERO);
        assert_eq!(camera.front, Vec3::ZERO);
        assert_eq!(camera.yaw, DEFAULT_YAW);
    }
}
