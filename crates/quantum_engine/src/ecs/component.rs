//! Component trait and type tags

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Tag identifying the kind of a component
///
/// An entity holds at most one component per tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentType {
    /// Model matrix and its accumulators
    Transform,
    /// Rotational and translational velocity
    Velocity,
    /// Rotational and translational acceleration
    Acceleration,
    /// Vertex data and asset references
    Mesh,
    /// View and projection
    Camera,
    /// Pre-resolved shader program
    Shader,
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Upcast helper so shared components can be downcast to their concrete type
pub trait AsAnyArc {
    /// Convert into an `Arc<dyn Any>`
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A typed state cell attached to an entity
///
/// Components are shared between systems through `Arc`, so every mutable
/// component synchronizes its own state.
pub trait Component: AsAnyArc + Send + Sync + fmt::Debug {
    /// Tag of this component
    fn component_type(&self) -> ComponentType;
}

/// Static tag for concrete component types, used by typed lookups
pub trait ComponentKind: Component + Sized {
    /// Tag shared by every value of this type
    const TYPE: ComponentType;
}

/// Implement [`Component`] for a type that already implements [`ComponentKind`]
macro_rules! impl_component {
    ($ty:ty) => {
        impl $crate::ecs::component::Component for $ty {
            fn component_type(&self) -> $crate::ecs::component::ComponentType {
                <$ty as $crate::ecs::component::ComponentKind>::TYPE
            }
        }
    };
}

pub(crate) use impl_component;
