// CONTROLLER: input, camera movement and the frame lifecycle
pub mod input;
pub mod camera_controller;
pub mod frame_loop;
pub mod manager;

pub use input::{InputEvent, InputState, KeyBindings, KeyState};
pub use camera_controller::{CameraController, MoveAxes};
pub use frame_loop::{CameraUniform, FrameClock, ObjectUniform};
pub use manager::{Manager, ProgramState};
