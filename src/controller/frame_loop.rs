use std::time::Instant;

use glam::{Mat4, Vec4};

/// Longest step a single frame may advance the simulation by.
pub const MAX_FRAME_DELTA: f32 = 0.1;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new(view_proj: Mat4) -> Self {
        Self { view_proj: view_proj.to_cols_array_2d() }
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub colour: [f32; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, colour: Vec4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            colour: colour.to_array(),
        }
    }
}

/// Frame timing: delta per tick and an FPS figure once a second.
#[derive(Debug)]
pub struct FrameClock {
    last_tick: Instant,
    delta: f32,
    frame_count: u32,
    fps_timer: f32,
    fps: f32,
    fps_ready: bool,
}

impl FrameClock {
    pub fn new(now: Instant) -> Self {
        Self {
            last_tick: now,
            delta: 0.0,
            frame_count: 0,
            fps_timer: 0.0,
            fps: 0.0,
            fps_ready: false,
        }
    }

    pub fn tick(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        self.delta = elapsed.as_secs_f32().clamp(0.0, MAX_FRAME_DELTA);

        self.frame_count += 1;
        // Unclamped, so a stall still counts towards the one-second window
        self.fps_timer += elapsed.as_secs_f32();
        if self.fps_timer >= 1.0 {
            self.fps = self.frame_count as f32 / self.fps_timer;
            self.frame_count = 0;
            self.fps_timer = 0.0;
            self.fps_ready = true;
        }
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Some(fps) once per elapsed second, None in between.
    pub fn take_fps_sample(&mut self) -> Option<f32> {
        if std::mem::take(&mut self.fps_ready) {
            Some(self.fps)
        } else {
            None
        }
    }
}
