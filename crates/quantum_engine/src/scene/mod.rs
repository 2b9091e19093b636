//! Scene management
//!
//! A scene is one render system and one movement system sharing a set of
//! entities. Scenes are built from JSON files by [`loader`] or assembled by
//! hand with [`Scene::new`] and [`Scene::add_entity`].

pub mod description;
pub mod loader;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::ecs::components::{Camera, CameraError};
use crate::ecs::entity::Entity;
use crate::ecs::system::{System, SystemError};
use crate::ecs::systems::{MovementSystem, RenderSystem};
use crate::render::dispatcher::Dispatcher;
use crate::render::resources::{ShaderCache, TextureCache};

pub use description::{CameraDescription, ModelDescription, SceneDescription};
pub use loader::load_scene_file;

/// Scene errors
#[derive(Error, Debug)]
pub enum SceneError {
    /// Scene file could not be read
    #[error("failed to read scene '{path}': {source}")]
    File {
        /// Path that was opened
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Scene file is not a valid scene document
    #[error("failed to parse scene '{path}': {source}")]
    Parse {
        /// Path that was parsed
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The default camera cannot produce a projection
    #[error("invalid camera in scene '{path}': {source}")]
    InvalidCamera {
        /// Scene file
        path: PathBuf,
        /// Rejected parameters
        #[source]
        source: CameraError,
    },

    /// A scene system refused a request
    #[error(transparent)]
    System(#[from] SystemError),
}

/// Shared resources a scene's systems are built from
#[derive(Clone)]
pub struct SceneContext {
    /// Route to the window thread
    pub dispatcher: Dispatcher,
    /// Shader programs shared by all scenes
    pub shaders: Arc<ShaderCache>,
    /// Textures shared by all scenes
    pub textures: Arc<TextureCache>,
    /// Directory scene files are read from
    pub scene_dir: PathBuf,
    /// Directory mesh files are read from
    pub model_dir: PathBuf,
    /// Movement tick rate
    pub movement_hz: u32,
    /// Render tick interval
    pub render_interval: Duration,
    /// Framebuffer size used for the camera aspect ratio
    pub window_size: (u32, u32),
}

/// Render and movement systems over one set of entities
pub struct Scene {
    id: String,
    render: RenderSystem,
    movement: MovementSystem,
}

impl Scene {
    /// Empty scene with a default camera
    pub fn new(id: impl Into<String>, context: &SceneContext) -> Result<Self, SceneError> {
        let render = RenderSystem::render(
            context.dispatcher.clone(),
            Arc::clone(&context.shaders),
            Arc::clone(&context.textures),
            context.render_interval,
        )?;
        let movement = MovementSystem::movement(context.movement_hz)?;

        Ok(Self {
            id: id.into(),
            render,
            movement,
        })
    }

    /// Scene identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Register an entity with both systems
    ///
    /// Each system admits the entity only if it has the components it needs.
    pub fn add_entity(&self, entity: Arc<Entity>) -> Result<(), SceneError> {
        self.render.add_entity(Arc::clone(&entity))?;
        self.movement.add_entity(entity)?;
        Ok(())
    }

    /// Unregister an entity from both systems
    pub fn remove_entity(&self, id: &str) -> Result<(), SceneError> {
        self.render.remove_entity(id)?;
        self.movement.remove_entity(id)?;
        Ok(())
    }

    /// Wait until both systems have applied every queued add/remove
    pub fn flush(&self) -> Result<(), SceneError> {
        self.render.flush()?;
        self.movement.flush()?;
        Ok(())
    }

    /// Start both systems
    pub fn start(&mut self) -> Result<(), SceneError> {
        log::info!("Starting scene '{}'", self.id);
        self.render.start()?;
        self.movement.start()?;
        Ok(())
    }

    /// Stop both systems
    pub fn stop(&mut self) -> Result<(), SceneError> {
        log::info!("Stopping scene '{}'", self.id);
        self.render.stop()?;
        self.movement.stop()?;
        Ok(())
    }

    /// Shut down both systems and release their entities
    pub fn terminate(&mut self) -> Result<(), SceneError> {
        log::info!("Terminating scene '{}'", self.id);
        self.render.terminate()?;
        self.movement.terminate()?;
        Ok(())
    }

    /// Whether either system is ticking
    pub fn is_running(&self) -> bool {
        self.render.is_running() || self.movement.is_running()
    }

    /// Advance movement by `elapsed` seconds on the calling thread
    pub fn update(&self, elapsed: f32) {
        self.movement.tick(elapsed);
    }

    /// Camera used by the render system
    pub fn camera(&self) -> Arc<Camera> {
        self.render.camera()
    }

    /// Replace the render camera
    pub fn set_camera(&self, camera: Arc<Camera>) {
        self.render.set_camera(camera);
    }

    /// Render system of this scene
    pub fn render_system(&self) -> &RenderSystem {
        &self.render
    }

    /// Movement system of this scene
    pub fn movement_system(&self) -> &MovementSystem {
        &self.movement
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("renderables", &self.render.entity_count())
            .field("movables", &self.movement.entity_count())
            .finish()
    }
}
