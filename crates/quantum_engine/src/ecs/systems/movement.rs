//! # Movement System
//!
//! Integrates acceleration into velocity and velocity into the transform
//! accumulators once per tick.

use std::sync::Arc;
use std::time::Duration;

use crate::ecs::component::ComponentType;
use crate::ecs::components::{Acceleration, Transform, Velocity};
use crate::ecs::entity::{Entity, EntityError};
use crate::ecs::system::{EntityProcessor, SystemError, SystemRuntime};

/// Default tick rate
pub const MOVEMENT_HZ: u32 = 144;

const REQUIREMENTS: [ComponentType; 3] = [
    ComponentType::Transform,
    ComponentType::Velocity,
    ComponentType::Acceleration,
];

/// Components the movement system reads and writes for one entity
#[derive(Debug, Clone)]
pub struct Movable {
    /// Position and orientation
    pub transform: Arc<Transform>,
    /// Current rates
    pub velocity: Arc<Velocity>,
    /// Rate of change of the rates
    pub acceleration: Arc<Acceleration>,
}

impl Movable {
    /// Advance by `dt` seconds
    ///
    /// Velocity is updated first and the new velocity moves the transform
    /// (semi-implicit Euler).
    pub fn integrate(&self, dt: f32) {
        let acceleration = self.acceleration.data();
        let velocity = self.velocity.data();

        let rotational = velocity.rotational + acceleration.rotational * dt;
        let translational = velocity.translational + acceleration.translational * dt;
        self.velocity.set(rotational, translational);

        self.transform.update(translational * dt, rotational * dt);
    }
}

/// Movement processor
#[derive(Debug, Default)]
pub struct Movement;

impl EntityProcessor for Movement {
    type Record = Movable;
    type Error = EntityError;

    fn name(&self) -> &'static str {
        "movement"
    }

    fn requirements(&self) -> &[ComponentType] {
        &REQUIREMENTS
    }

    fn admit(&self, entity: &Entity) -> Result<Movable, EntityError> {
        Ok(Movable {
            transform: entity.require::<Transform>()?,
            velocity: entity.require::<Velocity>()?,
            acceleration: entity.require::<Acceleration>()?,
        })
    }

    fn release(&self, _record: Movable) {}

    fn process(&self, elapsed: f32, records: &[(String, Movable)]) {
        for (_, movable) in records {
            movable.integrate(elapsed);
        }
    }
}

/// Threaded movement system
pub type MovementSystem = SystemRuntime<Movement>;

impl SystemRuntime<Movement> {
    /// Movement system ticking at `hz`
    pub fn movement(hz: u32) -> Result<Self, SystemError> {
        Self::new(Movement, Duration::from_secs(1) / hz.max(1))
    }
}
