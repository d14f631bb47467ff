// VIEW: windowing, shaders and rendering
pub mod gpu_init;
pub mod render;
pub mod shader;
pub mod window;

pub use gpu_init::GpuContext;
pub use render::{Graphics, ObjectBuffers, WgpuGraphics};
pub use shader::{ShaderHandle, ShaderProgram, ShaderStage};
pub use window::{Platform, WinitPlatform};
