//! GPU driver surface
//!
//! Everything the engine asks of the graphics API goes through
//! [`GraphicsDevice`]. Implementations are tied to the thread that owns the
//! GL context, so the trait is not `Send`; other threads reach it through the
//! main-thread [`Dispatcher`](super::Dispatcher).

use crate::ecs::components::DrawInfo;
use crate::foundation::math::Mat4;

/// Driver object name (shader, program, buffer, vertex array or texture)
pub type GpuId = u32;

/// Uniform location inside a linked program
pub type UniformLocation = i32;

/// Vertex attribute slot inside a linked program
pub type AttributeLocation = u32;

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment shader
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Buffer binding point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    /// Vertex data
    Array,
    /// Index data
    ElementArray,
}

/// Texture filtering modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Nearest neighbor filtering
    Nearest,
    /// Linear filtering
    Linear,
}

/// Texture wrapping modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    /// Repeat the texture
    Repeat,
    /// Mirror the texture
    MirroredRepeat,
    /// Clamp to edge
    ClampToEdge,
}

/// Texture creation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureParams {
    /// Texture filtering mode
    pub filter_mode: FilterMode,
    /// Texture wrapping mode
    pub wrap_mode: WrapMode,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            filter_mode: FilterMode::Linear,
            wrap_mode: WrapMode::ClampToEdge,
        }
    }
}

/// Driver calls used by the engine
pub trait GraphicsDevice {
    /// Compile one stage; `source` must end with a NUL byte
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<GpuId, String>;

    /// Link two compiled stages, binding `color_output` to attachment 0 first
    fn link_program(
        &mut self,
        vertex: GpuId,
        fragment: GpuId,
        color_output: &str,
    ) -> Result<GpuId, String>;

    /// Release a shader object
    fn delete_shader(&mut self, shader: GpuId);

    /// Look up a uniform; `None` if the program does not use it
    fn uniform_location(&mut self, program: GpuId, name: &str) -> Option<UniformLocation>;

    /// Look up a vertex attribute; `None` if the program does not use it
    fn attribute_location(&mut self, program: GpuId, name: &str) -> Option<AttributeLocation>;

    /// Upload tightly packed RGBA8 pixels as a 2D texture
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[u8],
        params: &TextureParams,
    ) -> GpuId;

    /// Allocate and bind a vertex array
    fn create_vertex_array(&mut self) -> GpuId;

    /// Bind a vertex array, or unbind with `None`
    fn bind_vertex_array(&mut self, vao: Option<GpuId>);

    /// Release a vertex array
    fn delete_vertex_array(&mut self, vao: GpuId);

    /// Allocate a buffer and bind it to `target`
    fn create_buffer(&mut self, target: BufferTarget) -> GpuId;

    /// Release a buffer
    fn delete_buffer(&mut self, buffer: GpuId);

    /// Fill the bound array buffer
    fn upload_vertices(&mut self, data: &[f32]);

    /// Fill the bound element buffer
    fn upload_indices(&mut self, data: &[u32]);

    /// Enable and describe a float attribute of the bound array buffer
    fn vertex_attribute(
        &mut self,
        location: AttributeLocation,
        size: i32,
        normalized: bool,
        stride: i32,
        offset: usize,
    );

    /// Clear color and depth
    fn clear(&mut self);

    /// Make a program current
    fn use_program(&mut self, program: GpuId);

    /// Set a `mat4` uniform of the current program
    fn uniform_mat4(&mut self, location: UniformLocation, value: &Mat4);

    /// Set an `int` uniform of the current program
    fn uniform_i32(&mut self, location: UniformLocation, value: i32);

    /// Activate a texture unit and bind a texture to it, or unbind with `None`
    fn bind_texture(&mut self, unit: u32, texture: Option<GpuId>);

    /// Draw the bound vertex array
    fn draw(&mut self, info: DrawInfo);

    /// Swap buffers and poll window events
    fn present(&mut self);

    /// Poll window events without presenting
    fn poll_events(&mut self);

    /// Whether the window has been asked to close
    fn should_close(&self) -> bool;

    /// Ask the window to close
    fn request_close(&mut self);

    /// Framebuffer size in pixels
    fn framebuffer_size(&self) -> (u32, u32);
}
