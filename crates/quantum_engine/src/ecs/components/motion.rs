//! Velocity and acceleration components
//!
//! Both carry a rotational part (radians per second, or per second squared)
//! and a translational part (units per second, or per second squared).

use parking_lot::RwLock;

use crate::ecs::component::{impl_component, ComponentKind, ComponentType};
use crate::foundation::math::Vec3;

/// Rotational and translational pair read atomically
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Motion {
    /// Euler angle rate
    pub rotational: Vec3,
    /// Linear rate
    pub translational: Vec3,
}

impl Motion {
    /// Create a pair
    pub fn new(rotational: Vec3, translational: Vec3) -> Self {
        Self { rotational, translational }
    }
}

/// Component for entities that move
#[derive(Debug, Default)]
pub struct Velocity {
    motion: RwLock<Motion>,
}

impl ComponentKind for Velocity {
    const TYPE: ComponentType = ComponentType::Velocity;
}

impl_component!(Velocity);

impl Velocity {
    /// Create a velocity
    pub fn new(rotational: Vec3, translational: Vec3) -> Self {
        Self {
            motion: RwLock::new(Motion::new(rotational, translational)),
        }
    }

    /// Both parts, read under one lock
    pub fn data(&self) -> Motion {
        *self.motion.read()
    }

    /// Rotational part
    pub fn rotational(&self) -> Vec3 {
        self.motion.read().rotational
    }

    /// Translational part
    pub fn translational(&self) -> Vec3 {
        self.motion.read().translational
    }

    /// Replace both parts at once
    pub fn set(&self, rotational: Vec3, translational: Vec3) {
        *self.motion.write() = Motion::new(rotational, translational);
    }
}

/// Component for entities whose velocity changes over time
#[derive(Debug, Default)]
pub struct Acceleration {
    motion: RwLock<Motion>,
}

impl ComponentKind for Acceleration {
    const TYPE: ComponentType = ComponentType::Acceleration;
}

impl_component!(Acceleration);

impl Acceleration {
    /// Create an acceleration
    pub fn new(rotational: Vec3, translational: Vec3) -> Self {
        Self {
            motion: RwLock::new(Motion::new(rotational, translational)),
        }
    }

    /// Both parts, read under one lock
    pub fn data(&self) -> Motion {
        *self.motion.read()
    }

    /// Rotational part
    pub fn rotational(&self) -> Vec3 {
        self.motion.read().rotational
    }

    /// Translational part
    pub fn translational(&self) -> Vec3 {
        self.motion.read().translational
    }

    /// Replace both parts at once
    pub fn set(&self, rotational: Vec3, translational: Vec3) {
        *self.motion.write() = Motion::new(rotational, translational);
    }
}
