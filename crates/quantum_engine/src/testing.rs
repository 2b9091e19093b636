//! Test doubles shared by the unit tests

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tempfile::TempDir;

use crate::ecs::components::DrawInfo;
use crate::engine::AssetPaths;
use crate::foundation::math::Mat4;
use crate::render::device::{
    AttributeLocation, BufferTarget, GpuId, GraphicsDevice, ShaderStage, TextureParams,
    UniformLocation,
};
use crate::render::dispatcher::{main_thread_channel, Dispatcher};

/// One recorded driver call
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CompileShader { stage: ShaderStage, source: String },
    LinkProgram { vertex: GpuId, fragment: GpuId, color_output: String },
    DeleteShader(GpuId),
    CreateTexture { width: u32, height: u32, params: TextureParams },
    CreateVertexArray(GpuId),
    BindVertexArray(Option<GpuId>),
    DeleteVertexArray(GpuId),
    CreateBuffer { target: BufferTarget, id: GpuId },
    DeleteBuffer(GpuId),
    UploadVertices(usize),
    UploadIndices(usize),
    VertexAttribute { location: AttributeLocation, size: i32, normalized: bool, stride: i32, offset: usize },
    Clear,
    UseProgram(GpuId),
    UniformMat4 { location: UniformLocation, value: Mat4 },
    UniformI32 { location: UniformLocation, value: i32 },
    BindTexture { unit: u32, texture: Option<GpuId> },
    Draw(DrawInfo),
    Present,
}

/// Shared view of the calls a [`RecordingDevice`] has seen
#[derive(Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().push(call);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.0.lock().clone()
    }

    pub(crate) fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().iter().filter(|call| predicate(call)).count()
    }

    pub(crate) fn presents(&self) -> usize {
        self.count(|call| matches!(call, Call::Present))
    }
}

/// Device that records calls instead of talking to a driver
pub(crate) struct RecordingDevice {
    log: CallLog,
    next_id: GpuId,
    compile_failures: HashMap<ShaderStage, String>,
    link_failure: Option<String>,
    close_after_presents: Option<usize>,
    presents: usize,
    closed: bool,
}

impl RecordingDevice {
    pub(crate) fn new() -> Self {
        Self {
            log: CallLog::default(),
            next_id: 1,
            compile_failures: HashMap::new(),
            link_failure: None,
            close_after_presents: None,
            presents: 0,
            closed: false,
        }
    }

    /// Close the window once `presents` frames have been presented
    pub(crate) fn closing_after(presents: usize) -> Self {
        let mut device = Self::new();
        device.close_after_presents = Some(presents);
        device
    }

    pub(crate) fn log(&self) -> CallLog {
        self.log.clone()
    }

    pub(crate) fn fail_compile(&mut self, stage: ShaderStage, message: &str) {
        self.compile_failures.insert(stage, message.to_string());
    }

    pub(crate) fn fail_link(&mut self, message: &str) {
        self.link_failure = Some(message.to_string());
    }

    fn allocate(&mut self) -> GpuId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl GraphicsDevice for RecordingDevice {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<GpuId, String> {
        self.log.push(Call::CompileShader { stage, source: source.to_string() });
        if let Some(message) = self.compile_failures.get(&stage) {
            return Err(message.clone());
        }
        Ok(self.allocate())
    }

    fn link_program(&mut self, vertex: GpuId, fragment: GpuId, color_output: &str) -> Result<GpuId, String> {
        self.log.push(Call::LinkProgram { vertex, fragment, color_output: color_output.to_string() });
        if let Some(message) = &self.link_failure {
            return Err(message.clone());
        }
        Ok(self.allocate())
    }

    fn delete_shader(&mut self, shader: GpuId) {
        self.log.push(Call::DeleteShader(shader));
    }

    fn uniform_location(&mut self, _program: GpuId, name: &str) -> Option<UniformLocation> {
        ["projection", "camera", "model", "tex"]
            .iter()
            .position(|known| *known == name)
            .and_then(|index| UniformLocation::try_from(index).ok())
    }

    fn attribute_location(&mut self, _program: GpuId, name: &str) -> Option<AttributeLocation> {
        match name {
            "vert" => Some(0),
            "vertTexCoord" => Some(1),
            _ => None,
        }
    }

    fn create_texture(&mut self, width: u32, height: u32, _pixels: &[u8], params: &TextureParams) -> GpuId {
        self.log.push(Call::CreateTexture { width, height, params: *params });
        self.allocate()
    }

    fn create_vertex_array(&mut self) -> GpuId {
        let id = self.allocate();
        self.log.push(Call::CreateVertexArray(id));
        id
    }

    fn bind_vertex_array(&mut self, vao: Option<GpuId>) {
        self.log.push(Call::BindVertexArray(vao));
    }

    fn delete_vertex_array(&mut self, vao: GpuId) {
        self.log.push(Call::DeleteVertexArray(vao));
    }

    fn create_buffer(&mut self, target: BufferTarget) -> GpuId {
        let id = self.allocate();
        self.log.push(Call::CreateBuffer { target, id });
        id
    }

    fn delete_buffer(&mut self, buffer: GpuId) {
        self.log.push(Call::DeleteBuffer(buffer));
    }

    fn upload_vertices(&mut self, data: &[f32]) {
        self.log.push(Call::UploadVertices(data.len()));
    }

    fn upload_indices(&mut self, data: &[u32]) {
        self.log.push(Call::UploadIndices(data.len()));
    }

    fn vertex_attribute(&mut self, location: AttributeLocation, size: i32, normalized: bool, stride: i32, offset: usize) {
        self.log.push(Call::VertexAttribute { location, size, normalized, stride, offset });
    }

    fn clear(&mut self) {
        self.log.push(Call::Clear);
    }

    fn use_program(&mut self, program: GpuId) {
        self.log.push(Call::UseProgram(program));
    }

    fn uniform_mat4(&mut self, location: UniformLocation, value: &Mat4) {
        self.log.push(Call::UniformMat4 { location, value: *value });
    }

    fn uniform_i32(&mut self, location: UniformLocation, value: i32) {
        self.log.push(Call::UniformI32 { location, value });
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<GpuId>) {
        self.log.push(Call::BindTexture { unit, texture });
    }

    fn draw(&mut self, info: DrawInfo) {
        self.log.push(Call::Draw(info));
    }

    fn present(&mut self) {
        self.log.push(Call::Present);
        self.presents += 1;
        if self.close_after_presents.is_some_and(|limit| self.presents >= limit) {
            self.closed = true;
        }
    }

    fn poll_events(&mut self) {}

    fn should_close(&self) -> bool {
        self.closed
    }

    fn request_close(&mut self) {
        self.closed = true;
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        (800, 600)
    }
}

/// Main-thread loop running a [`RecordingDevice`] on a background thread
pub(crate) struct MainLoop {
    pub(crate) dispatcher: Dispatcher,
    pub(crate) log: CallLog,
    handle: JoinHandle<()>,
}

impl MainLoop {
    pub(crate) fn shutdown(self) {
        self.dispatcher.stop();
        self.handle.join().unwrap();
    }
}

pub(crate) fn spawn_main_loop(mut device: RecordingDevice) -> MainLoop {
    let (dispatcher, mut main_thread) = main_thread_channel();
    let log = device.log();
    let handle = thread::spawn(move || {
        main_thread.run(&mut device);
    });
    MainLoop { dispatcher, log, handle }
}

/// Poll `condition` until it holds or `timeout` passes
pub(crate) fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

pub(crate) const VERT_SRC: &str = "#version 410\nuniform mat4 projection;\nuniform mat4 camera;\nuniform mat4 model;\nin vec3 vert;\nin vec2 vertTexCoord;\nout vec2 fragTexCoord;\nvoid main() {\n    fragTexCoord = vertTexCoord;\n    gl_Position = projection * camera * model * vec4(vert, 1);\n}\n";

pub(crate) const FRAG_SRC: &str = "#version 410\nuniform sampler2D tex;\nin vec2 fragTexCoord;\nout vec4 outputColor;\nvoid main() {\n    outputColor = texture(tex, fragTexCoord);\n}\n";

/// Asset directory tree on disk with the standard layout
pub(crate) struct AssetFixture {
    _dir: TempDir,
    pub(crate) paths: AssetPaths,
}

impl AssetFixture {
    /// Tree with `basic.vert`/`basic.frag` shaders already written
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let paths = AssetPaths {
            scenes: root.join("scenes"),
            models: root.join("models"),
            shaders: root.join("shaders"),
            textures: root.join("textures"),
        };
        for sub in [&paths.scenes, &paths.models, &paths.shaders, &paths.textures] {
            std::fs::create_dir_all(sub).unwrap();
        }
        std::fs::write(paths.shaders.join("basic.vert"), VERT_SRC).unwrap();
        std::fs::write(paths.shaders.join("basic.frag"), FRAG_SRC).unwrap();
        Self { _dir: dir, paths }
    }

    pub(crate) fn write(dir: &Path, file: &str, contents: &str) {
        std::fs::write(dir.join(file), contents).unwrap();
    }

    pub(crate) fn write_model(&self, file: &str, contents: &str) {
        Self::write(&self.paths.models, file, contents);
    }

    pub(crate) fn write_scene(&self, file: &str, contents: &str) {
        Self::write(&self.paths.scenes, file, contents);
    }

    pub(crate) fn write_texture(&self, file: &str) {
        image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 255, 255, 255]))
            .save(self.paths.textures.join(file))
            .unwrap();
    }

    /// Indexed unit quad drawn with the basic shaders
    pub(crate) fn quad_model(texture: &str) -> String {
        format!(
            r#"{{
                "indexed": true,
                "verts": [-1,-1,0, 0,0,  1,-1,0, 1,0,  1,1,0, 1,1,  -1,1,0, 0,1],
                "indices": [0, 1, 2, 3],
                "vertSize": 5,
                "textureFile": "{texture}",
                "fragShaderFile": "basic.frag",
                "vertShaderFile": "basic.vert"
            }}"#
        )
    }
}
