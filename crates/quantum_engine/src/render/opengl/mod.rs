//! OpenGL 4.1 back-end

pub mod device;

pub use device::{GlDevice, WindowError, WindowResult};
