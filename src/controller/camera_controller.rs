use glam::{Vec2, Vec3};

use crate::config::CameraConfig;
use crate::controller::input::{InputState, KeyBindings};
use crate::model::Camera;

/// Per-axis movement intent, each component -1, 0 or +1.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveAxes {
    pub horizontal: f32,
    pub vertical: f32,
    pub depth: f32,
}

impl MoveAxes {
    pub fn active(&self) -> f32 {
        self.horizontal.abs() + self.vertical.abs() + self.depth.abs()
    }
}

/// Handles camera movement and orientation
#[derive(Debug, Clone)]
pub struct CameraController {
    pub base_speed: f32,
    pub mouse_sensitivity: f32,
    pub bindings: KeyBindings,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

impl CameraController {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            base_speed: config.base_speed,
            mouse_sensitivity: config.sensitivity,
            bindings: KeyBindings::default(),
        }
    }

    /// Apply a cursor offset (pixels from the reference point) as yaw/pitch.
    pub fn apply_look(&self, camera: &mut Camera, delta: Vec2) {
        // Screen y grows downwards, so moving the mouse up pitches up
        camera.rotate(delta.x * self.mouse_sensitivity, -delta.y * self.mouse_sensitivity);
    }

    pub fn movement_axes(&self, input: &InputState) -> MoveAxes {
        MoveAxes {
            horizontal: self.bindings.horizontal(input),
            vertical: self.bindings.vertical(input),
            depth: self.bindings.depth(input),
        }
    }

    /// How far the camera moves this frame. Diagonals are scaled by
    /// 1/sqrt(active axes) so they are no faster than a single axis.
    pub fn displacement(&self, camera: &Camera, axes: MoveAxes, dt: f32) -> Vec3 {
        let active = axes.active();
        if active == 0.0 {
            return Vec3::ZERO;
        }

        let direction = camera.right() * axes.horizontal
            + camera.up() * axes.vertical
            + camera.forward() * axes.depth;
        let norm = if active > 1.0 { active.sqrt() } else { 1.0 };
        let speed = self.base_speed * dt;

        direction / norm * speed
    }

    /// Update camera position based on held keys
    pub fn update_movement(&self, camera: &mut Camera, input: &InputState, dt: f32) {
        let axes = self.movement_axes(input);
        camera.eye += self.displacement(camera, axes, dt);
    }
}
