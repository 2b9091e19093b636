//! Shader binding component
//!
//! Pins an entity to an already resolved program. The render system uses it
//! instead of the shaders named by the entity's mesh.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::ecs::component::{impl_component, ComponentKind, ComponentType};
use crate::render::resources::ShaderProgram;

/// ECS shader component
#[derive(Debug)]
pub struct ShaderBinding {
    program: RwLock<Arc<ShaderProgram>>,
}

impl ComponentKind for ShaderBinding {
    const TYPE: ComponentType = ComponentType::Shader;
}

impl_component!(ShaderBinding);

impl ShaderBinding {
    /// Bind a program
    pub fn new(program: Arc<ShaderProgram>) -> Self {
        Self {
            program: RwLock::new(program),
        }
    }

    /// Bound program
    pub fn program(&self) -> Arc<ShaderProgram> {
        Arc::clone(&self.program.read())
    }

    /// Rebind to another program
    pub fn set(&self, program: Arc<ShaderProgram>) {
        *self.program.write() = program;
    }
}
