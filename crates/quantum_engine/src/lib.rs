//! # Quantum Engine
//!
//! A small 3D engine built on an Entity-Component-System core with an
//! OpenGL 4.1 back-end.
//!
//! ## Features
//!
//! - **ECS Architecture**: named entities holding shared, lock-protected components
//! - **Threaded Systems**: movement and render systems tick on their own threads
//! - **Main-Thread Dispatch**: every GL call is funneled to the window thread
//! - **Resource Caches**: shader programs and textures are uploaded once per name
//! - **JSON Scenes**: camera and models loaded from scene files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quantum_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(EngineConfig::default());
//!     engine.init(800, 600, "Viewer")?;
//!     let id = engine.load_scene_file("scene1.json")?;
//!     engine.load_scene(&id)?;
//!     engine.run()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod ecs;
pub mod foundation;
pub mod render;
pub mod scene;

mod engine;

#[cfg(test)]
mod testing;

pub use engine::{
    AssetPaths, Engine, EngineConfig, EngineError, SystemTimings, WindowConfig, DEFAULT_SCENE_DIR,
};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::Config,
        ecs::{
            components::{Acceleration, Camera, Mesh, ShaderBinding, Transform, Velocity},
            Component, ComponentType, Entity, System,
        },
        foundation::{
            math::{Mat4, Mat4Ext, Vec3},
            time::Timer,
        },
        render::{Dispatcher, GraphicsDevice, ShaderCache, TextureCache},
        scene::Scene,
        AssetPaths, Engine, EngineConfig, EngineError,
    };
}
