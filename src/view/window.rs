use std::sync::Arc;
use std::time::Duration;

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::config::WindowConfig;
use crate::controller::input::{InputEvent, InputState};
use crate::error::InitError;

/// The windowing collaborator: owns the window and turns its events into input.
pub trait Platform {
    /// Dispatch pending window events into `input`, waiting up to `timeout` for one.
    fn poll_events(&mut self, input: &mut InputState, timeout: Duration);

    fn should_close(&self) -> bool;

    /// Current focus. Windows that open in the background report no event for it.
    fn has_focus(&self) -> bool;

    fn viewport_size(&self) -> (u32, u32);

    fn set_title(&mut self, title: &str);

    /// Hide the cursor and keep it inside the window.
    fn capture_cursor(&mut self);

    fn warp_cursor(&mut self, position: Vec2);

    /// Give the cursor back and take the window down.
    fn close(&mut self);
}

/// Translate one window event; `None` for events input does not track.
pub fn translate_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::KeyboardInput {
            event: KeyEvent { physical_key: PhysicalKey::Code(code), state, .. },
            ..
        } => Some(match state {
            ElementState::Pressed => InputEvent::KeyDown(*code),
            ElementState::Released => InputEvent::KeyUp(*code),
        }),
        WindowEvent::MouseInput { state, button, .. } => Some(match state {
            ElementState::Pressed => InputEvent::MouseDown(*button),
            ElementState::Released => InputEvent::MouseUp(*button),
        }),
        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::CursorMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),
        WindowEvent::Focused(focused) => Some(InputEvent::FocusChanged { focused: *focused }),
        _ => None,
    }
}

/// Collects one pump's worth of events.
struct EventPump<'a> {
    input: &'a mut InputState,
    close_requested: &'a mut bool,
}

impl ApplicationHandler for EventPump<'_> {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if let Some(input_event) = translate_event(&event) {
            self.input.process_event(&input_event);
        }
        if matches!(event, WindowEvent::CloseRequested | WindowEvent::Destroyed) {
            *self.close_requested = true;
        }
    }
}

/// winit window driven by explicit polling rather than `run_app`.
pub struct WinitPlatform {
    event_loop: EventLoop<()>,
    window: Arc<Window>,
    close_requested: bool,
    warp_failed: bool,
}

impl WinitPlatform {
    pub fn new(config: &WindowConfig) -> Result<Self, InitError> {
        let event_loop = EventLoop::new()?;
        let window_attributes = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .with_resizable(false);
        #[allow(deprecated)]
        let window = event_loop.create_window(window_attributes)?;
        tracing::info!("created {}x{} window \"{}\"", config.width, config.height, config.title);

        Ok(Self {
            event_loop,
            window: Arc::new(window),
            close_requested: false,
            warp_failed: false,
        })
    }

    pub fn window(&self) -> Arc<Window> {
        self.window.clone()
    }
}

impl Platform for WinitPlatform {
    fn poll_events(&mut self, input: &mut InputState, timeout: Duration) {
        let mut pump = EventPump {
            input,
            close_requested: &mut self.close_requested,
        };
        if let PumpStatus::Exit(code) = self.event_loop.pump_app_events(Some(timeout), &mut pump) {
            tracing::debug!("event loop exited with code {code}");
            self.close_requested = true;
        }
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }

    fn has_focus(&self) -> bool {
        self.window.has_focus()
    }

    fn viewport_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    fn capture_cursor(&mut self) {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Confined)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Locked));
        if let Err(e) = grabbed {
            tracing::warn!("could not grab cursor: {e}");
        }
        self.window.set_cursor_visible(false);
    }

    fn warp_cursor(&mut self, position: Vec2) {
        let target = PhysicalPosition::new(position.x as f64, position.y as f64);
        if let Err(e) = self.window.set_cursor_position(target) {
            // Wayland refuses; say so once rather than every frame
            if !self.warp_failed {
                tracing::warn!("cursor cannot be re-centred, mouse look may drift: {e}");
                self.warp_failed = true;
            }
        }
    }

    fn close(&mut self) {
        let _ = self.window.set_cursor_grab(CursorGrabMode::None);
        self.window.set_cursor_visible(true);
        self.window.set_visible(false);
        self.close_requested = true;
        tracing::debug!("window closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_events_are_translated() {
        assert_eq!(
            translate_event(&WindowEvent::Focused(false)),
            Some(InputEvent::FocusChanged { focused: false })
        );
    }

    #[test]
    fn untracked_events_are_dropped() {
        assert_eq!(translate_event(&WindowEvent::CloseRequested), None);
        assert_eq!(translate_event(&WindowEvent::Resized(PhysicalSize::new(10, 10))), None);
    }
}
