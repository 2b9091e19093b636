//! Core engine implementation
//!
//! The engine owns the window, the main-thread queue, the shared resource
//! caches and every loaded scene. Only one scene runs at a time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::ecs::components::mesh::DEFAULT_MESH_DIR;
use crate::ecs::systems::{MOVEMENT_HZ, RENDER_INTERVAL};
use crate::render::device::GraphicsDevice;
use crate::render::dispatcher::{main_thread_channel, MainThread};
use crate::render::opengl::{GlDevice, WindowError};
use crate::render::resources::shader_cache::DEFAULT_SHADER_DIR;
use crate::render::resources::texture_cache::DEFAULT_TEXTURE_DIR;
use crate::render::resources::{ShaderCache, TextureCache};
use crate::scene::{self, Scene, SceneContext, SceneError};

/// Default directory for scene files
pub const DEFAULT_SCENE_DIR: &str = "assets/scenes/";

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// A call that needs the window came before `init`
    #[error("engine is not initialized")]
    NotInitialized,

    /// `init` was called twice
    #[error("engine is already initialized")]
    AlreadyInitialized,

    /// Window or context creation failed
    #[error(transparent)]
    Window(#[from] WindowError),

    /// No scene with this id has been loaded
    #[error("unknown scene '{0}'")]
    UnknownScene(String),

    /// Scene loading or lifecycle failure
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// Configuration file failure
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The shutdown thread panicked
    #[error("scene shutdown panicked")]
    Shutdown,
}

/// Window configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width
    pub width: u32,
    /// Window height
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Quantum Engine".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// Where each kind of asset is read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    /// Scene JSON files
    pub scenes: PathBuf,
    /// Mesh JSON files
    pub models: PathBuf,
    /// GLSL sources
    pub shaders: PathBuf,
    /// PNG textures
    pub textures: PathBuf,
}

impl AssetPaths {
    /// Standard layout below `root`
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            scenes: root.join("scenes"),
            models: root.join("models"),
            shaders: root.join("shaders"),
            textures: root.join("textures"),
        }
    }
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            scenes: DEFAULT_SCENE_DIR.into(),
            models: DEFAULT_MESH_DIR.into(),
            shaders: DEFAULT_SHADER_DIR.into(),
            textures: DEFAULT_TEXTURE_DIR.into(),
        }
    }
}

/// Tick rates of the scene systems
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemTimings {
    /// Movement ticks per second
    pub movement_hz: u32,
    /// Milliseconds between rendered frames
    pub render_interval_ms: u64,
}

impl Default for SystemTimings {
    fn default() -> Self {
        Self {
            movement_hz: MOVEMENT_HZ,
            render_interval_ms: u64::try_from(RENDER_INTERVAL.as_millis()).unwrap_or(15),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window configuration
    pub window: WindowConfig,
    /// Asset directories
    pub assets: AssetPaths,
    /// System tick rates
    pub systems: SystemTimings,
}

impl Config for EngineConfig {}

struct Runtime {
    device: Box<dyn GraphicsDevice>,
    main: MainThread,
    context: SceneContext,
}

/// Main engine struct
///
/// Call order: [`Engine::init`], [`Engine::load_scene_file`],
/// [`Engine::load_scene`], [`Engine::run`]. `init` and `run` must happen on
/// the thread that should own the window.
pub struct Engine {
    config: EngineConfig,
    runtime: Option<Runtime>,
    scenes: HashMap<String, Scene>,
    retired: Vec<Scene>,
    current: Option<String>,
}

impl Engine {
    /// Create an engine; nothing is opened until `init`
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            runtime: None,
            scenes: HashMap::new(),
            retired: Vec::new(),
            current: None,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Open the window and create the GL context on the calling thread
    pub fn init(&mut self, width: u32, height: u32, title: &str) -> Result<(), EngineError> {
        if self.runtime.is_some() {
            return Err(EngineError::AlreadyInitialized);
        }
        let device = GlDevice::new(title, width, height)?;
        self.init_with_device(Box::new(device))
    }

    /// Like [`Engine::init`] with the window settings from the configuration
    pub fn init_from_config(&mut self) -> Result<(), EngineError> {
        let window = self.config.window.clone();
        self.init(window.width, window.height, &window.title)
    }

    /// Initialize with an already created device
    pub fn init_with_device(&mut self, device: Box<dyn GraphicsDevice>) -> Result<(), EngineError> {
        if self.runtime.is_some() {
            return Err(EngineError::AlreadyInitialized);
        }

        let (dispatcher, main) = main_thread_channel();
        let assets = &self.config.assets;
        let context = SceneContext {
            dispatcher,
            shaders: Arc::new(ShaderCache::new(&assets.shaders)),
            textures: Arc::new(TextureCache::new(&assets.textures)),
            scene_dir: assets.scenes.clone(),
            model_dir: assets.models.clone(),
            movement_hz: self.config.systems.movement_hz,
            render_interval: Duration::from_millis(self.config.systems.render_interval_ms),
            window_size: device.framebuffer_size(),
        };

        log::info!(
            "Engine initialized ({}x{})",
            context.window_size.0,
            context.window_size.1
        );
        self.runtime = Some(Runtime { device, main, context });
        Ok(())
    }

    /// Whether `init` has succeeded
    pub fn is_initialized(&self) -> bool {
        self.runtime.is_some()
    }

    /// Load a scene file and register it; returns the scene id
    pub fn load_scene_file(&mut self, path: impl AsRef<Path>) -> Result<String, EngineError> {
        let runtime = self.runtime.as_ref().ok_or(EngineError::NotInitialized)?;
        let scene = scene::load_scene_file(path, &runtime.context)?;
        let id = scene.id().to_string();
        self.add_scene(scene);
        Ok(id)
    }

    /// Empty scene built with this engine's shared resources
    pub fn create_scene(&self, id: impl Into<String>) -> Result<Scene, EngineError> {
        let runtime = self.runtime.as_ref().ok_or(EngineError::NotInitialized)?;
        Ok(Scene::new(id, &runtime.context)?)
    }

    /// Register a scene under its id
    ///
    /// A scene already registered under the same id is replaced and shut
    /// down with the others when the engine stops.
    pub fn add_scene(&mut self, scene: Scene) {
        let id = scene.id().to_string();
        if let Some(old) = self.scenes.insert(id.clone(), scene) {
            log::warn!("Scene '{}' replaced", id);
            self.retired.push(old);
        }
    }

    /// Make a loaded scene the one `run` starts
    pub fn load_scene(&mut self, id: &str) -> Result<(), EngineError> {
        if !self.scenes.contains_key(id) {
            return Err(EngineError::UnknownScene(id.to_string()));
        }
        log::info!("Current scene: '{}'", id);
        self.current = Some(id.to_string());
        Ok(())
    }

    /// Currently selected scene
    pub fn current_scene(&self) -> Option<&Scene> {
        self.current.as_ref().and_then(|id| self.scenes.get(id))
    }

    /// Look up a scene by id
    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }

    /// Ids of all registered scenes, sorted
    pub fn scene_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.scenes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Start the current scene and serve the main thread until the window
    /// closes, then shut every scene down
    pub fn run(&mut self) -> Result<(), EngineError> {
        let runtime = self.runtime.as_mut().ok_or(EngineError::NotInitialized)?;

        match self.current.as_ref().and_then(|id| self.scenes.get_mut(id)) {
            Some(scene) => scene.start()?,
            None => log::warn!("No scene selected; running an empty window"),
        }

        let exit = runtime
            .main
            .run_until(runtime.device.as_mut(), |device| device.should_close());
        log::info!("Main loop exited: {:?}", exit);

        self.shutdown()
    }

    /// Terminate every scene while the main thread keeps serving their
    /// GPU releases
    fn shutdown(&mut self) -> Result<(), EngineError> {
        let Some(runtime) = self.runtime.as_mut() else {
            return Ok(());
        };
        self.current = None;

        let scenes: Vec<Scene> = self
            .scenes
            .drain()
            .map(|(_, scene)| scene)
            .chain(self.retired.drain(..))
            .collect();
        let dispatcher = runtime.context.dispatcher.clone();

        let result = thread::scope(|s| {
            let terminator = s.spawn(move || {
                let mut result = Ok(());
                for mut scene in scenes {
                    if let Err(e) = scene.terminate() {
                        log::error!("Failed to terminate scene '{}': {}", scene.id(), e);
                        if result.is_ok() {
                            result = Err(EngineError::from(e));
                        }
                    }
                }
                dispatcher.stop();
                result
            });
            runtime.main.run(runtime.device.as_mut());
            terminator.join().unwrap_or(Err(EngineError::Shutdown))
        });

        log::info!("Engine shutdown complete");
        result
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.scenes.is_empty() && self.retired.is_empty() {
            return;
        }
        if let Err(e) = self.shutdown() {
            log::error!("Engine shutdown failed: {}", e);
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("initialized", &self.is_initialized())
            .field("scenes", &self.scene_ids())
            .field("current", &self.current)
            .finish()
    }
}
