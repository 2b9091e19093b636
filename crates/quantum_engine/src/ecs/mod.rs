//! Entity-Component-System implementation
//!
//! Entities are named bags of shared, internally synchronized components.
//! Systems run on their own threads and pick up the entities whose components
//! match their requirements.

pub mod component;
pub mod components;
pub mod entity;
pub mod system;
pub mod systems;

#[cfg(test)]
mod tests;

pub use component::{Component, ComponentKind, ComponentType};
pub use entity::{Entity, EntityError};
pub use system::{EntityProcessor, System, SystemError, SystemRuntime, SystemState};
