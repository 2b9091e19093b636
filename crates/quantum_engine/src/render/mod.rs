//! # Rendering
//!
//! GPU access for the engine. All driver calls go through the
//! [`GraphicsDevice`] trait and run on the thread that owns the window; other
//! threads submit work through the [`Dispatcher`].
//!
//! - **device**: driver surface and texture parameters
//! - **dispatcher**: bounded main-thread work queue
//! - **opengl**: GLFW window and OpenGL implementation of the device
//! - **resources**: shader program and texture caches

pub mod device;
pub mod dispatcher;
pub mod opengl;
pub mod resources;

pub use device::{BufferTarget, GpuId, GraphicsDevice, ShaderStage, TextureParams};
pub use dispatcher::{main_thread_channel, DispatchError, Dispatcher, LoopExit, MainThread};
pub use opengl::{GlDevice, WindowError};
pub use resources::{ShaderCache, ShaderProgram, TextureCache};
