//! ECS Systems module

pub mod movement;
pub mod render;

pub use movement::{Movable, Movement, MovementSystem, MOVEMENT_HZ};
pub use render::{RenderError, RenderSystem, Renderable, Renderer, RENDER_INTERVAL};
