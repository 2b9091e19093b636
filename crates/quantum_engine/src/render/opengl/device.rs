//! GLFW window with an OpenGL 4.1 core context
//!
//! The window, its context and every GL call live on the thread that created
//! them. Raw GL entry points are unsafe; each block below only passes
//! pointers to live, correctly sized buffers.

#![allow(unsafe_code)]

use std::ffi::{c_void, CStr, CString};
use std::ptr;

use gl::types::{GLboolean, GLchar, GLenum, GLint, GLsizei, GLsizeiptr, GLuint};
use glfw::{Action, Context, Key, WindowEvent};
use thiserror::Error;

use crate::ecs::components::{DrawInfo, DrawMode};
use crate::foundation::math::Mat4;
use crate::render::device::{
    AttributeLocation, BufferTarget, FilterMode, GpuId, GraphicsDevice, ShaderStage,
    TextureParams, UniformLocation, WrapMode,
};

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialized
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// Window or context creation failed
    #[error("Window creation failed")]
    CreationFailed,
}

/// Result alias for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// GLFW window plus the GL context it owns
pub struct GlDevice {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, WindowEvent)>,
}

impl GlDevice {
    /// Create the window, make its context current and load GL entry points
    pub fn new(title: &str, width: u32, height: u32) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| WindowError::InitializationFailed(format!("{e:?}")))?;

        glfw.window_hint(glfw::WindowHint::Resizable(false));
        glfw.window_hint(glfw::WindowHint::ContextVersion(4, 1));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.make_current();
        window.set_key_polling(true);
        window.set_close_polling(true);

        gl::load_with(|symbol| window.get_proc_address(symbol) as *const c_void);

        unsafe {
            log::info!("OpenGL version {}", gl_string(gl::VERSION));
            log::info!("OpenGL shading version {}", gl_string(gl::SHADING_LANGUAGE_VERSION));
            log::info!("OpenGL renderer {}", gl_string(gl::RENDERER));

            gl::Enable(gl::DEPTH_TEST);
            gl::DepthFunc(gl::LESS);
            gl::ClearColor(0.5, 0.5, 0.5, 1.0);
        }

        Ok(Self { glfw, window, events })
    }

    fn handle_events(&mut self) {
        for (_, event) in glfw::flush_messages(&self.events) {
            match event {
                WindowEvent::Key(Key::Escape, _, Action::Press, _) | WindowEvent::Close => {
                    self.window.set_should_close(true);
                }
                _ => {}
            }
        }
    }
}

unsafe fn gl_string(name: GLenum) -> String {
    let raw = gl::GetString(name);
    if raw.is_null() {
        String::from("unknown")
    } else {
        CStr::from_ptr(raw.cast()).to_string_lossy().into_owned()
    }
}

fn info_log(len: GLint, fetch: impl FnOnce(GLsizei, *mut GLchar)) -> String {
    let len = usize::try_from(len).unwrap_or(0).max(1);
    let mut buffer = vec![0u8; len];
    fetch(GLsizei::try_from(len).unwrap_or(GLsizei::MAX), buffer.as_mut_ptr().cast());
    String::from_utf8_lossy(&buffer)
        .trim_end_matches('\0')
        .trim_end()
        .to_string()
}

#[allow(clippy::cast_possible_wrap)]
const RGBA_INTERNAL_FORMAT: GLint = gl::RGBA as GLint;

fn to_gl_bool(value: bool) -> GLboolean {
    if value {
        gl::TRUE
    } else {
        gl::FALSE
    }
}

#[allow(clippy::cast_possible_wrap)]
fn filter(mode: FilterMode) -> GLint {
    (match mode {
        FilterMode::Nearest => gl::NEAREST,
        FilterMode::Linear => gl::LINEAR,
    }) as GLint
}

#[allow(clippy::cast_possible_wrap)]
fn wrap(mode: WrapMode) -> GLint {
    (match mode {
        WrapMode::Repeat => gl::REPEAT,
        WrapMode::MirroredRepeat => gl::MIRRORED_REPEAT,
        WrapMode::ClampToEdge => gl::CLAMP_TO_EDGE,
    }) as GLint
}

fn buffer_target(target: BufferTarget) -> GLenum {
    match target {
        BufferTarget::Array => gl::ARRAY_BUFFER,
        BufferTarget::ElementArray => gl::ELEMENT_ARRAY_BUFFER,
    }
}

fn byte_len<T>(data: &[T]) -> GLsizeiptr {
    GLsizeiptr::try_from(std::mem::size_of_val(data)).unwrap_or(GLsizeiptr::MAX)
}

impl GraphicsDevice for GlDevice {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<GpuId, String> {
        let source = CStr::from_bytes_with_nul(source.as_bytes())
            .map_err(|e| format!("shader source is not NUL terminated: {e}"))?;
        let kind = match stage {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        };

        unsafe {
            let shader = gl::CreateShader(kind);
            let source_ptr = source.as_ptr();
            gl::ShaderSource(shader, 1, &source_ptr, ptr::null());
            gl::CompileShader(shader);

            let mut status = GLint::from(gl::FALSE);
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);
            if status == GLint::from(gl::FALSE) {
                let mut len = 0;
                gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
                let log = info_log(len, |size, buffer| {
                    gl::GetShaderInfoLog(shader, size, ptr::null_mut(), buffer);
                });
                gl::DeleteShader(shader);
                return Err(log);
            }
            Ok(shader)
        }
    }

    fn link_program(
        &mut self,
        vertex: GpuId,
        fragment: GpuId,
        color_output: &str,
    ) -> Result<GpuId, String> {
        let output = CString::new(color_output).map_err(|e| e.to_string())?;

        unsafe {
            let program = gl::CreateProgram();
            gl::AttachShader(program, vertex);
            gl::AttachShader(program, fragment);
            gl::BindFragDataLocation(program, 0, output.as_ptr());
            gl::LinkProgram(program);

            let mut status = GLint::from(gl::FALSE);
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);
            if status == GLint::from(gl::FALSE) {
                let mut len = 0;
                gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
                let log = info_log(len, |size, buffer| {
                    gl::GetProgramInfoLog(program, size, ptr::null_mut(), buffer);
                });
                gl::DeleteProgram(program);
                return Err(log);
            }
            Ok(program)
        }
    }

    fn delete_shader(&mut self, shader: GpuId) {
        unsafe { gl::DeleteShader(shader) }
    }

    fn uniform_location(&mut self, program: GpuId, name: &str) -> Option<UniformLocation> {
        let name = CString::new(name).ok()?;
        let location = unsafe { gl::GetUniformLocation(program, name.as_ptr()) };
        (location >= 0).then_some(location)
    }

    fn attribute_location(&mut self, program: GpuId, name: &str) -> Option<AttributeLocation> {
        let name = CString::new(name).ok()?;
        let location = unsafe { gl::GetAttribLocation(program, name.as_ptr()) };
        AttributeLocation::try_from(location).ok()
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[u8],
        params: &TextureParams,
    ) -> GpuId {
        let width = GLsizei::try_from(width).unwrap_or(GLsizei::MAX);
        let height = GLsizei::try_from(height).unwrap_or(GLsizei::MAX);
        let mut texture: GLuint = 0;

        unsafe {
            gl::GenTextures(1, &mut texture);
            gl::BindTexture(gl::TEXTURE_2D, texture);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, filter(params.filter_mode));
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, filter(params.filter_mode));
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, wrap(params.wrap_mode));
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, wrap(params.wrap_mode));
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                RGBA_INTERNAL_FORMAT,
                width,
                height,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                pixels.as_ptr().cast(),
            );
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
        texture
    }

    fn create_vertex_array(&mut self) -> GpuId {
        let mut vao: GLuint = 0;
        unsafe {
            gl::GenVertexArrays(1, &mut vao);
            gl::BindVertexArray(vao);
        }
        vao
    }

    fn bind_vertex_array(&mut self, vao: Option<GpuId>) {
        unsafe { gl::BindVertexArray(vao.unwrap_or(0)) }
    }

    fn delete_vertex_array(&mut self, vao: GpuId) {
        unsafe { gl::DeleteVertexArrays(1, &vao) }
    }

    fn create_buffer(&mut self, target: BufferTarget) -> GpuId {
        let mut buffer: GLuint = 0;
        unsafe {
            gl::GenBuffers(1, &mut buffer);
            gl::BindBuffer(buffer_target(target), buffer);
        }
        buffer
    }

    fn delete_buffer(&mut self, buffer: GpuId) {
        unsafe { gl::DeleteBuffers(1, &buffer) }
    }

    fn upload_vertices(&mut self, data: &[f32]) {
        unsafe {
            gl::BufferData(gl::ARRAY_BUFFER, byte_len(data), data.as_ptr().cast(), gl::STATIC_DRAW);
        }
    }

    fn upload_indices(&mut self, data: &[u32]) {
        unsafe {
            gl::BufferData(
                gl::ELEMENT_ARRAY_BUFFER,
                byte_len(data),
                data.as_ptr().cast(),
                gl::STATIC_DRAW,
            );
        }
    }

    fn vertex_attribute(
        &mut self,
        location: AttributeLocation,
        size: i32,
        normalized: bool,
        stride: i32,
        offset: usize,
    ) {
        unsafe {
            gl::EnableVertexAttribArray(location);
            gl::VertexAttribPointer(
                location,
                size,
                gl::FLOAT,
                to_gl_bool(normalized),
                stride,
                offset as *const c_void,
            );
        }
    }

    fn clear(&mut self) {
        unsafe { gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT) }
    }

    fn use_program(&mut self, program: GpuId) {
        unsafe { gl::UseProgram(program) }
    }

    fn uniform_mat4(&mut self, location: UniformLocation, value: &Mat4) {
        // nalgebra storage is column-major, as GL expects
        unsafe { gl::UniformMatrix4fv(location, 1, gl::FALSE, value.as_ptr()) }
    }

    fn uniform_i32(&mut self, location: UniformLocation, value: i32) {
        unsafe { gl::Uniform1i(location, value) }
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<GpuId>) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + unit);
            gl::BindTexture(gl::TEXTURE_2D, texture.unwrap_or(0));
        }
    }

    fn draw(&mut self, info: DrawInfo) {
        unsafe {
            match info.mode {
                DrawMode::IndexedFan => {
                    gl::DrawElements(gl::TRIANGLE_FAN, info.count, gl::UNSIGNED_INT, ptr::null());
                }
                DrawMode::Triangles => gl::DrawArrays(gl::TRIANGLES, 0, info.count),
            }
        }
    }

    fn present(&mut self) {
        self.window.swap_buffers();
        self.poll_events();
    }

    fn poll_events(&mut self) {
        self.glfw.poll_events();
        self.handle_events();
    }

    fn should_close(&self) -> bool {
        self.window.should_close()
    }

    fn request_close(&mut self) {
        self.window.set_should_close(true);
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (
            u32::try_from(width).unwrap_or(0),
            u32::try_from(height).unwrap_or(0),
        )
    }
}
