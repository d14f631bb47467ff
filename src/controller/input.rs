//! Platform-agnostic input handling system
use std::collections::HashSet;
use std::hash::Hash;

use glam::Vec2;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

/// Input events, already translated out of the windowing layer.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    MouseDown(MouseButton),
    MouseUp(MouseButton),
    CursorMoved { x: f32, y: f32 },
    FocusChanged { focused: bool },
}

/// Edge and level state of one key or button for the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    /// Went down this frame
    pub pressed: bool,
    /// Currently down
    pub held: bool,
    /// Came up this frame
    pub released: bool,
}

#[derive(Debug)]
struct Edges<T> {
    held: HashSet<T>,
    pressed: HashSet<T>,
    released: HashSet<T>,
}

impl<T> Default for Edges<T> {
    fn default() -> Self {
        Self { held: HashSet::new(), pressed: HashSet::new(), released: HashSet::new() }
    }
}

impl<T: Copy + Eq + Hash> Edges<T> {
    fn down(&mut self, item: T) {
        // OS key repeat sends extra downs; only the first counts as a press
        if self.held.insert(item) {
            self.pressed.insert(item);
        }
    }

    fn up(&mut self, item: T) {
        if self.held.remove(&item) {
            self.released.insert(item);
        }
    }

    fn state(&self, item: T) -> KeyState {
        KeyState {
            pressed: self.pressed.contains(&item),
            held: self.held.contains(&item),
            released: self.released.contains(&item),
        }
    }

    fn end_frame(&mut self) {
        self.pressed.clear();
        self.released.clear();
    }

    fn clear(&mut self) {
        self.held.clear();
        self.pressed.clear();
    }
}

/// Keyboard, mouse and focus state, fed by events during polling.
#[derive(Debug)]
pub struct InputState {
    keys: Edges<KeyCode>,
    buttons: Edges<MouseButton>,
    cursor: Option<Vec2>,
    focused: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        Self {
            keys: Edges::default(),
            buttons: Edges::default(),
            cursor: None,
            focused: true,
        }
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyDown(key) => self.keys.down(key),
            InputEvent::KeyUp(key) => self.keys.up(key),
            InputEvent::MouseDown(button) => self.buttons.down(button),
            InputEvent::MouseUp(button) => self.buttons.up(button),
            InputEvent::CursorMoved { x, y } => self.cursor = Some(Vec2::new(x, y)),
            InputEvent::FocusChanged { focused } => {
                self.focused = focused;
                if !focused {
                    // Keys released while unfocused never reach us
                    self.keys.clear();
                    self.buttons.clear();
                    self.cursor = None;
                }
            }
        }
    }

    pub fn key(&self, key: KeyCode) -> KeyState {
        self.keys.state(key)
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys.held.contains(&key)
    }

    pub fn mouse_button(&self, button: MouseButton) -> KeyState {
        self.buttons.state(button)
    }

    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    /// Record where the cursor was warped to, without waiting for an event.
    pub fn set_cursor(&mut self, position: Vec2) {
        self.cursor = Some(position);
    }

    pub fn focused(&self) -> bool {
        self.focused
    }

    /// Forget this frame's pressed/released edges. Held keys carry over.
    pub fn end_frame(&mut self) {
        self.keys.end_frame();
        self.buttons.end_frame();
    }
}

/// Key mapping configuration. Movement directions accept any of several keys.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub forward: &'static [KeyCode],
    pub backward: &'static [KeyCode],
    pub left: &'static [KeyCode],
    pub right: &'static [KeyCode],
    pub up: &'static [KeyCode],
    pub down: &'static [KeyCode],
    pub quit: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: &[KeyCode::KeyW],
            backward: &[KeyCode::KeyS],
            left: &[KeyCode::KeyA],
            right: &[KeyCode::KeyD],
            up: &[KeyCode::Space],
            down: &[KeyCode::ShiftLeft, KeyCode::ShiftRight],
            quit: KeyCode::Escape,
        }
    }
}

impl KeyBindings {
    /// -1, 0 or +1 depending on which side of the pair is held. Both held cancel out.
    pub fn axis(input: &InputState, negative: &[KeyCode], positive: &[KeyCode]) -> f32 {
        let held = |keys: &[KeyCode]| keys.iter().any(|key| input.is_key_held(*key));
        let mut value = 0.0;
        if held(positive) {
            value += 1.0;
        }
        if held(negative) {
            value -= 1.0;
        }
        value
    }

    pub fn horizontal(&self, input: &InputState) -> f32 {
        Self::axis(input, self.left, self.right)
    }

    pub fn vertical(&self, input: &InputState) -> f32 {
        Self::axis(input, self.down, self.up)
    }

    pub fn depth(&self, input: &InputState) -> f32 {
        Self::axis(input, self.backward, self.forward)
    }
}
