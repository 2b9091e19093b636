//! # Render System
//!
//! Keeps one [`Renderable`] per entity that has a transform and a mesh, and
//! draws all of them every tick. GPU work runs on the main thread through the
//! dispatcher; the ticker only gathers matrices and handles.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use thiserror::Error;

use crate::ecs::component::ComponentType;
use crate::ecs::components::{
    Camera, DrawInfo, Mesh, ShaderBinding, Transform, MAX_VERT_SIZE, MIN_VERT_SIZE,
};
use crate::ecs::entity::{Entity, EntityError};
use crate::ecs::system::{EntityProcessor, SystemError, SystemRuntime};
use crate::foundation::math::Mat4;
use crate::render::device::{GpuId, GraphicsDevice};
use crate::render::dispatcher::{DispatchError, Dispatcher};
use crate::render::resources::{
    ShaderCache, ShaderError, ShaderProgram, Texture, TextureCache, TextureError, VertexArray,
};

/// Default time between frames
pub const RENDER_INTERVAL: Duration = Duration::from_millis(15);

const REQUIREMENTS: [ComponentType; 2] = [ComponentType::Transform, ComponentType::Mesh];

/// Why an entity could not be prepared for drawing
#[derive(Error, Debug)]
pub enum RenderError {
    /// A required component is missing
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// The mesh's program failed to build
    #[error(transparent)]
    Shader(#[from] ShaderError),

    /// The mesh's texture failed to load
    #[error(transparent)]
    Texture(#[from] TextureError),

    /// The main thread is gone
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The mesh data has a vertex stride the renderer cannot bind
    #[error("mesh vertSize {0} is outside {min}..={max}", min = MIN_VERT_SIZE, max = MAX_VERT_SIZE)]
    VertexSize(i32),
}

/// GPU state for one entity
#[derive(Debug, Clone)]
pub struct Renderable {
    /// Mesh component
    pub mesh: Arc<Mesh>,
    /// Transform component
    pub transform: Arc<Transform>,
    /// Uploaded vertex data
    pub vertex_array: Arc<VertexArray>,
    /// Program used for drawing
    pub program: Arc<ShaderProgram>,
    /// Bound to unit 0 when present
    pub texture: Option<Arc<Texture>>,
}

/// Everything one draw needs, captured on the ticker thread
struct DrawItem {
    program: Arc<ShaderProgram>,
    vao: GpuId,
    texture: Option<GpuId>,
    model: Mat4,
    draw: DrawInfo,
}

/// Render processor
pub struct Renderer {
    dispatcher: Dispatcher,
    shaders: Arc<ShaderCache>,
    textures: Arc<TextureCache>,
    camera: RwLock<Arc<Camera>>,
}

impl Renderer {
    /// Create a renderer drawing through `dispatcher`
    pub fn new(dispatcher: Dispatcher, shaders: Arc<ShaderCache>, textures: Arc<TextureCache>) -> Self {
        Self {
            dispatcher,
            shaders,
            textures,
            camera: RwLock::new(Arc::new(Camera::new())),
        }
    }

    /// Active camera
    pub fn camera(&self) -> Arc<Camera> {
        Arc::clone(&self.camera.read())
    }

    /// Replace the active camera
    pub fn set_camera(&self, camera: Arc<Camera>) {
        *self.camera.write() = camera;
    }
}

impl EntityProcessor for Renderer {
    type Record = Renderable;
    type Error = RenderError;

    fn name(&self) -> &'static str {
        "render"
    }

    fn requirements(&self) -> &[ComponentType] {
        &REQUIREMENTS
    }

    fn admit(&self, entity: &Entity) -> Result<Renderable, RenderError> {
        let mesh = entity.require::<Mesh>()?;
        let transform = entity.require::<Transform>()?;
        let bound = entity.get::<ShaderBinding>().map(|binding| binding.program());

        let data = mesh.data();
        if !data.has_valid_vert_size() {
            return Err(RenderError::VertexSize(data.vert_size));
        }
        let shaders = Arc::clone(&self.shaders);
        let textures = Arc::clone(&self.textures);

        let (program, vertex_array, texture) = self.dispatcher.run_on_main(
            move |device| -> Result<_, RenderError> {
                let program = match bound {
                    Some(program) => program,
                    None => shaders.load_from_files(
                        device,
                        &data.vert_shader_file,
                        &data.frag_shader_file,
                        false,
                    )?,
                };

                let vertex_array = program.create_vertex_array(device, &data);

                let texture = if data.texture_file.is_empty() {
                    None
                } else {
                    match textures.load(device, &data.texture_file, &data.texture_file) {
                        Ok(texture) => Some(texture),
                        Err(err) => {
                            vertex_array.release(device);
                            return Err(err.into());
                        }
                    }
                };

                Ok((program, vertex_array, texture))
            },
        )??;

        Ok(Renderable {
            mesh,
            transform,
            vertex_array: Arc::new(vertex_array),
            program,
            texture,
        })
    }

    fn release(&self, record: Renderable) {
        let vertex_array = record.vertex_array;
        if let Err(err) = self.dispatcher.run_on_main(move |device| vertex_array.release(device)) {
            log::debug!("Vertex array not released: {}", err);
        }
    }

    fn process(&self, _elapsed: f32, records: &[(String, Renderable)]) {
        let (projection, view) = self.camera().matrices();
        let items: Vec<DrawItem> = records
            .iter()
            .map(|(_, renderable)| DrawItem {
                program: Arc::clone(&renderable.program),
                vao: renderable.vertex_array.vao,
                texture: renderable.texture.as_ref().map(|texture| texture.id()),
                model: renderable.transform.data(),
                draw: renderable.mesh.data().draw_info(),
            })
            .collect();

        let frame = self
            .dispatcher
            .run_on_main(move |device| draw_frame(device, &projection, &view, &items));
        if let Err(err) = frame {
            log::debug!("Frame skipped: {}", err);
        }
    }
}

fn draw_frame(device: &mut dyn GraphicsDevice, projection: &Mat4, view: &Mat4, items: &[DrawItem]) {
    device.clear();

    for item in items {
        let uniforms = item.program.uniforms();
        device.use_program(item.program.id());
        device.bind_vertex_array(Some(item.vao));

        if let Some(location) = uniforms.projection {
            device.uniform_mat4(location, projection);
        }
        if let Some(location) = uniforms.camera {
            device.uniform_mat4(location, view);
        }
        if let Some(location) = uniforms.model {
            device.uniform_mat4(location, &item.model);
        }

        if let Some(texture) = item.texture {
            device.bind_texture(0, Some(texture));
        }
        if let Some(location) = uniforms.tex {
            device.uniform_i32(location, 0);
        }

        device.draw(item.draw);
    }

    device.bind_vertex_array(None);
    device.present();
}

/// Threaded render system
pub type RenderSystem = SystemRuntime<Renderer>;

impl SystemRuntime<Renderer> {
    /// Render system ticking every `interval`
    pub fn render(
        dispatcher: Dispatcher,
        shaders: Arc<ShaderCache>,
        textures: Arc<TextureCache>,
        interval: Duration,
    ) -> Result<Self, SystemError> {
        Self::new(Renderer::new(dispatcher, shaders, textures), interval)
    }

    /// Active camera
    pub fn camera(&self) -> Arc<Camera> {
        self.processor().camera()
    }

    /// Replace the active camera
    pub fn set_camera(&self, camera: Arc<Camera>) {
        self.processor().set_camera(camera);
    }
}
