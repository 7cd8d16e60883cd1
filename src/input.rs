use blockshade_render::{Camera, InputState};
use glam::Vec3;
use winit::keyboard::KeyCode;

use crate::config::ViewerConfig;

/// Viewer actions that are not camera movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleMode,
    ToggleCursor,
}

/// Free-flying camera driven by WASD, Space/Shift and mouse look.
#[derive(Debug, Clone)]
pub struct CameraController {
    pub move_speed: f32,
    pub mouse_sensitivity: f32,
}

impl CameraController {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            move_speed: config.move_speed,
            mouse_sensitivity: config.mouse_sensitivity,
        }
    }

    /// Actions triggered by keys pressed this frame.
    pub fn actions(input: &InputState) -> Vec<Action> {
        let mut actions = Vec::new();
        if input.was_key_just_pressed(KeyCode::Escape) {
            actions.push(Action::Quit);
        }
        if input.was_key_just_pressed(KeyCode::F1) {
            actions.push(Action::ToggleMode);
        }
        if input.was_key_just_pressed(KeyCode::Tab) {
            actions.push(Action::ToggleCursor);
        }
        actions
    }

    /// Apply one frame of input to `camera`.
    pub fn update_camera(&self, camera: &mut Camera, input: &InputState, dt: f32) {
        let (dx, dy) = input.mouse_delta;
        if dx != 0.0 || dy != 0.0 {
            camera.rotate(
                dx as f32 * self.mouse_sensitivity,
                -(dy as f32) * self.mouse_sensitivity,
            );
        }

        // Walk on the horizontal plane regardless of pitch.
        let forward = Vec3::new(camera.yaw.sin(), 0.0, camera.yaw.cos());
        let right = Vec3::Y.cross(forward);

        let mut movement = Vec3::ZERO;
        if input.is_key_pressed(KeyCode::KeyW) {
            movement += forward;
        }
        if input.is_key_pressed(KeyCode::KeyS) {
            movement -= forward;
        }
        if input.is_key_pressed(KeyCode::KeyD) {
            movement += right;
        }
        if input.is_key_pressed(KeyCode::KeyA) {
            movement -= right;
        }
        if input.is_key_pressed(KeyCode::Space) {
            movement += Vec3::Y;
        }
        if input.is_key_pressed(KeyCode::ShiftLeft) {
            movement -= Vec3::Y;
        }

        if movement != Vec3::ZERO {
            camera.translate(movement.normalize() * self.move_speed * dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::event::ElementState;

    fn controller() -> CameraController {
        CameraController {
            move_speed: 2.0,
            mouse_sensitivity: 0.01,
        }
    }

    #[test]
    fn forward_follows_yaw() {
        let mut camera = Camera::new(1.0);
        let mut input = InputState::new();
        input.handle_key(KeyCode::KeyW, ElementState::Pressed);

        controller().update_camera(&mut camera, &input, 0.5);
        assert!(camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-5));

        camera.position = Vec3::ZERO;
        camera.yaw = std::f32::consts::FRAC_PI_2;
        controller().update_camera(&mut camera, &input, 0.5);
        assert!(camera.position.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn diagonal_movement_is_not_faster() {
        let mut camera = Camera::new(1.0);
        let mut input = InputState::new();
        input.handle_key(KeyCode::KeyW, ElementState::Pressed);
        input.handle_key(KeyCode::KeyD, ElementState::Pressed);

        controller().update_camera(&mut camera, &input, 1.0);
        assert!((camera.position.length() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn pitch_does_not_lift_walking() {
        let mut camera = Camera::new(1.0);
        camera.pitch = 1.0;
        let mut input = InputState::new();
        input.handle_key(KeyCode::KeyW, ElementState::Pressed);

        controller().update_camera(&mut camera, &input, 1.0);
        assert_eq!(camera.position.y, 0.0);
    }

    #[test]
    fn mouse_moves_view() {
        let mut camera = Camera::new(1.0);
        let mut input = InputState::new();
        input.mouse_delta = (10.0, 5.0);

        controller().update_camera(&mut camera, &input, 0.016);
        assert!((camera.yaw - 0.1).abs() < 1e-6);
        assert!((camera.pitch + 0.05).abs() < 1e-6);
    }

    #[test]
    fn escape_and_f1_map_to_actions() {
        let mut input = InputState::new();
        input.handle_key(KeyCode::Escape, ElementState::Pressed);
        input.handle_key(KeyCode::F1, ElementState::Pressed);

        assert_eq!(
            CameraController::actions(&input),
            [Action::Quit, Action::ToggleMode]
        );
    }
}
