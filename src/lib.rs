pub mod config;
pub mod error;
pub mod logging;
pub mod utils;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

pub use config::Config;
pub use controller::{Manager, ProgramState};
pub use error::{ConfigError, InitError};
