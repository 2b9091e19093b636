//! Resource management
//!
//! Deduplicating caches for GPU resources. Both caches map a logical name to
//! a driver handle and perform at most one upload per name.

pub mod shader_cache;
pub mod texture_cache;

pub use shader_cache::{
    ProgramAttributes, ProgramUniforms, ShaderCache, ShaderError, ShaderProgram, VertexArray,
};
pub use texture_cache::{Texture, TextureCache, TextureError};
