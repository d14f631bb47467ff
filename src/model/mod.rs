// MODEL: camera and scene data
pub mod camera;
pub mod scene;

pub use camera::{Camera, PITCH_LIMIT};
pub use scene::{GameObject, MeshRenderer, Scene, Transform};
