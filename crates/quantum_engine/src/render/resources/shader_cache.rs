//! Shader program cache
//!
//! Programs are keyed by name; programs built from files use
//! `"<vertex file>:<fragment file>"`. Each name is compiled and linked at most
//! once. All loads take the device, so they run on the main thread.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::ecs::components::MeshData;
use crate::render::device::{
    AttributeLocation, BufferTarget, GpuId, GraphicsDevice, ShaderStage, UniformLocation,
};

/// Default location of shader sources
pub const DEFAULT_SHADER_DIR: &str = "assets/shaders/";

/// Fragment shader output bound to color attachment 0
pub const COLOR_OUTPUT: &str = "outputColor";

/// Projection matrix uniform
pub const PROJECTION_UNIFORM: &str = "projection";
/// View matrix uniform
pub const CAMERA_UNIFORM: &str = "camera";
/// Model matrix uniform
pub const MODEL_UNIFORM: &str = "model";
/// Texture sampler uniform
pub const TEXTURE_UNIFORM: &str = "tex";
/// Vertex position attribute
pub const VERTEX_ATTRIBUTE: &str = "vert";
/// Texture coordinate attribute
pub const TEX_COORD_ATTRIBUTE: &str = "vertTexCoord";

/// Shader loading errors
#[derive(Error, Debug)]
pub enum ShaderError {
    /// A stage failed to compile
    #[error("failed to compile {stage} shader: {log}")]
    Compile {
        /// Failing stage
        stage: ShaderStage,
        /// Driver info log
        log: String,
    },

    /// The stages compiled but did not link
    #[error("failed to link program: {0}")]
    Link(String),

    /// A source file could not be read
    #[error("failed to read shader source {path}: {source}")]
    File {
        /// Resolved path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

/// Uniform locations the renderer sets each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgramUniforms {
    /// `projection`
    pub projection: Option<UniformLocation>,
    /// `camera`
    pub camera: Option<UniformLocation>,
    /// `model`
    pub model: Option<UniformLocation>,
    /// `tex`
    pub tex: Option<UniformLocation>,
}

/// Vertex attribute slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramAttributes {
    /// `vert`, position
    pub vert: AttributeLocation,
    /// `vertTexCoord`, texture coordinates
    pub vert_tex_coord: AttributeLocation,
}

/// A linked program and its interrogated interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    name: String,
    id: GpuId,
    uniforms: ProgramUniforms,
    attributes: ProgramAttributes,
}

/// Vertex array plus the buffers it references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexArray {
    /// Vertex array object
    pub vao: GpuId,
    /// Vertex and, when indexed, element buffers
    pub buffers: Vec<GpuId>,
}

impl VertexArray {
    /// Release the vertex array and its buffers
    pub fn release(&self, device: &mut dyn GraphicsDevice) {
        device.delete_vertex_array(self.vao);
        for buffer in &self.buffers {
            device.delete_buffer(*buffer);
        }
    }
}

impl ShaderProgram {
    fn interrogate(device: &mut dyn GraphicsDevice, name: String, id: GpuId) -> Self {
        let uniforms = ProgramUniforms {
            projection: device.uniform_location(id, PROJECTION_UNIFORM),
            camera: device.uniform_location(id, CAMERA_UNIFORM),
            model: device.uniform_location(id, MODEL_UNIFORM),
            tex: device.uniform_location(id, TEXTURE_UNIFORM),
        };
        // unused attributes are optimized out; keep the conventional slots
        let attributes = ProgramAttributes {
            vert: device.attribute_location(id, VERTEX_ATTRIBUTE).unwrap_or(0),
            vert_tex_coord: device.attribute_location(id, TEX_COORD_ATTRIBUTE).unwrap_or(1),
        };
        Self { name, id, uniforms, attributes }
    }

    /// Cache name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Driver program id
    pub fn id(&self) -> GpuId {
        self.id
    }

    /// Uniform locations
    pub fn uniforms(&self) -> ProgramUniforms {
        self.uniforms
    }

    /// Attribute slots
    pub fn attributes(&self) -> ProgramAttributes {
        self.attributes
    }

    /// Upload mesh data into a new vertex array laid out for this program
    ///
    /// Positions are 3 floats at offset 0 and texture coordinates 2 floats at
    /// offset 12, both with a stride of `vert_size` floats.
    pub fn create_vertex_array(&self, device: &mut dyn GraphicsDevice, mesh: &MeshData) -> VertexArray {
        let stride = mesh.vert_size.saturating_mul(4);

        let vao = device.create_vertex_array();
        let vbo = device.create_buffer(BufferTarget::Array);
        device.upload_vertices(&mesh.verts);
        device.vertex_attribute(self.attributes.vert, 3, false, stride, 0);
        device.vertex_attribute(self.attributes.vert_tex_coord, 2, true, stride, 3 * 4);

        let mut buffers = vec![vbo];
        if mesh.indexed {
            let ebo = device.create_buffer(BufferTarget::ElementArray);
            device.upload_indices(&mesh.indices);
            buffers.push(ebo);
        }

        device.bind_vertex_array(None);
        VertexArray { vao, buffers }
    }
}

#[derive(Default)]
struct ShaderStore {
    programs: HashMap<String, Arc<ShaderProgram>>,
    default: Option<String>,
}

/// Thread-safe cache of linked shader programs
pub struct ShaderCache {
    source_dir: PathBuf,
    store: RwLock<ShaderStore>,
}

impl Default for ShaderCache {
    fn default() -> Self {
        Self::new(DEFAULT_SHADER_DIR)
    }
}

impl ShaderCache {
    /// Create an empty cache reading sources from `source_dir`
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            store: RwLock::new(ShaderStore::default()),
        }
    }

    /// Directory source files are resolved against
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Load a program from two source files, reusing a cached one
    pub fn load_from_files(
        &self,
        device: &mut dyn GraphicsDevice,
        vert_file: &str,
        frag_file: &str,
        mark_default: bool,
    ) -> Result<Arc<ShaderProgram>, ShaderError> {
        let name = format!("{vert_file}:{frag_file}");
        if let Some(program) = self.cached(&name, mark_default) {
            return Ok(program);
        }

        let vert_src = self.read_source(vert_file)?;
        let frag_src = self.read_source(frag_file)?;
        self.load_from_src(device, &vert_src, &frag_src, &name, mark_default)
    }

    /// Compile and link a program from source text, reusing a cached one
    pub fn load_from_src(
        &self,
        device: &mut dyn GraphicsDevice,
        vert_src: &str,
        frag_src: &str,
        name: &str,
        mark_default: bool,
    ) -> Result<Arc<ShaderProgram>, ShaderError> {
        if let Some(program) = self.cached(name, mark_default) {
            return Ok(program);
        }

        let id = compile_program(device, &nul_terminated(vert_src), &nul_terminated(frag_src))?;
        let program = Arc::new(ShaderProgram::interrogate(device, name.to_string(), id));
        log::info!("Loaded shader program '{}' (id {})", name, id);

        let mut store = self.store.write();
        let program = Arc::clone(store.programs.entry(name.to_string()).or_insert(program));
        if mark_default || store.default.is_none() {
            store.default = Some(name.to_string());
        }
        Ok(program)
    }

    /// Look up a program by name
    pub fn get(&self, name: &str) -> Option<Arc<ShaderProgram>> {
        self.store.read().programs.get(name).cloned()
    }

    /// Look up a program by driver id
    pub fn get_by_id(&self, id: GpuId) -> Option<Arc<ShaderProgram>> {
        self.store
            .read()
            .programs
            .values()
            .find(|program| program.id == id)
            .cloned()
    }

    /// The default program: the first loaded, or the latest marked default
    pub fn default_program(&self) -> Option<Arc<ShaderProgram>> {
        let store = self.store.read();
        store.default.as_ref().and_then(|name| store.programs.get(name)).cloned()
    }

    /// Number of cached programs
    pub fn len(&self) -> usize {
        self.store.read().programs.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, name: &str, mark_default: bool) -> Option<Arc<ShaderProgram>> {
        let program = self.get(name)?;
        if mark_default {
            self.store.write().default = Some(name.to_string());
        }
        Some(program)
    }

    fn read_source(&self, file: &str) -> Result<String, ShaderError> {
        let path = self.source_dir.join(file);
        std::fs::read_to_string(&path).map_err(|source| ShaderError::File { path, source })
    }
}

fn nul_terminated(src: &str) -> String {
    if src.ends_with('\0') {
        src.to_string()
    } else {
        format!("{src}\0")
    }
}

fn compile_program(
    device: &mut dyn GraphicsDevice,
    vert_src: &str,
    frag_src: &str,
) -> Result<GpuId, ShaderError> {
    let vertex = device
        .compile_shader(ShaderStage::Vertex, vert_src)
        .map_err(|log| ShaderError::Compile { stage: ShaderStage::Vertex, log })?;

    let fragment = match device.compile_shader(ShaderStage::Fragment, frag_src) {
        Ok(id) => id,
        Err(log) => {
            device.delete_shader(vertex);
            return Err(ShaderError::Compile { stage: ShaderStage::Fragment, log });
        }
    };

    let linked = device.link_program(vertex, fragment, COLOR_OUTPUT);
    device.delete_shader(vertex);
    device.delete_shader(fragment);
    linked.map_err(ShaderError::Link)
}
