//! Entity implementation

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use super::component::{AsAnyArc, Component, ComponentKind, ComponentType};

/// Entity registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntityError {
    /// The entity already holds a component with this tag
    #[error("entity '{entity}' already has a {component} component")]
    DuplicateType {
        /// Entity name
        entity: String,
        /// Conflicting tag
        component: ComponentType,
    },

    /// The entity holds no component with this tag
    #[error("entity '{entity}' has no {component} component")]
    MissingType {
        /// Entity name
        entity: String,
        /// Missing tag
        component: ComponentType,
    },
}

/// Named container of at most one component per type
#[derive(Debug)]
pub struct Entity {
    id: String,
    components: RwLock<HashMap<ComponentType, Arc<dyn Component>>>,
}

impl Entity {
    /// Create an empty entity
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            components: RwLock::new(HashMap::new()),
        }
    }

    /// Get the entity ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Attach a component; fails if one of the same type is present
    pub fn add(&self, component: Arc<dyn Component>) -> Result<(), EntityError> {
        let kind = component.component_type();
        let mut components = self.components.write();
        if components.contains_key(&kind) {
            return Err(EntityError::DuplicateType {
                entity: self.id.clone(),
                component: kind,
            });
        }
        components.insert(kind, component);
        Ok(())
    }

    /// Swap an existing component for a new one of the same type
    pub fn replace(&self, component: Arc<dyn Component>) -> Result<Arc<dyn Component>, EntityError> {
        let kind = component.component_type();
        let mut components = self.components.write();
        match components.get_mut(&kind) {
            Some(slot) => Ok(std::mem::replace(slot, component)),
            None => Err(self.missing(kind)),
        }
    }

    /// Detach the component of the given type
    pub fn remove(&self, kind: ComponentType) -> Result<Arc<dyn Component>, EntityError> {
        self.components
            .write()
            .remove(&kind)
            .ok_or_else(|| self.missing(kind))
    }

    /// Look up a component by tag
    pub fn component(&self, kind: ComponentType) -> Option<Arc<dyn Component>> {
        self.components.read().get(&kind).cloned()
    }

    /// Look up a component by concrete type
    pub fn get<T: ComponentKind + 'static>(&self) -> Option<Arc<T>> {
        self.component(T::TYPE)?.into_any_arc().downcast::<T>().ok()
    }

    /// Like [`Entity::get`], but a missing component is an error
    pub fn require<T: ComponentKind + 'static>(&self) -> Result<Arc<T>, EntityError> {
        self.get::<T>().ok_or_else(|| self.missing(T::TYPE))
    }

    /// Whether a component with this tag is attached
    pub fn has(&self, kind: ComponentType) -> bool {
        self.components.read().contains_key(&kind)
    }

    /// Whether every listed tag is attached
    pub fn satisfies(&self, requirements: &[ComponentType]) -> bool {
        let components = self.components.read();
        requirements.iter().all(|kind| components.contains_key(kind))
    }

    /// Tags of all attached components, sorted
    pub fn types(&self) -> Vec<ComponentType> {
        let mut types: Vec<_> = self.components.read().keys().copied().collect();
        types.sort();
        types
    }

    fn missing(&self, kind: ComponentType) -> EntityError {
        EntityError::MissingType {
            entity: self.id.clone(),
            component: kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Transform, Velocity};
    use crate::foundation::math::{Mat4, Vec3};

    #[test]
    fn test_duplicate_add_keeps_original() {
        let entity = Entity::new("ship");
        let first = Arc::new(Transform::new());
        first.translate(Vec3::new(1.0, 0.0, 0.0));
        entity.add(first.clone()).unwrap();

        let err = entity.add(Arc::new(Transform::new())).unwrap_err();
        assert_eq!(
            err,
            EntityError::DuplicateType { entity: "ship".into(), component: ComponentType::Transform }
        );
        assert!(Arc::ptr_eq(&entity.get::<Transform>().unwrap(), &first));
    }

    #[test]
    fn test_replace_requires_existing() {
        let entity = Entity::new("ship");
        let err = entity.replace(Arc::new(Velocity::default())).unwrap_err();
        assert!(matches!(err, EntityError::MissingType { component: ComponentType::Velocity, .. }));

        entity.add(Arc::new(Velocity::default())).unwrap();
        let newer = Arc::new(Velocity::new(Vec3::x(), Vec3::y()));
        entity.replace(newer.clone()).unwrap();
        assert!(Arc::ptr_eq(&entity.get::<Velocity>().unwrap(), &newer));
    }

    #[test]
    fn test_remove_then_lookup_is_none() {
        let entity = Entity::new("ship");
        entity.add(Arc::new(Transform::new())).unwrap();
        entity.remove(ComponentType::Transform).unwrap();

        assert!(entity.component(ComponentType::Transform).is_none());
        assert!(matches!(
            entity.remove(ComponentType::Transform),
            Err(EntityError::MissingType { .. })
        ));
    }

    #[test]
    fn test_types_and_requirements() {
        let entity = Entity::new("ship");
        entity.add(Arc::new(Velocity::default())).unwrap();
        entity.add(Arc::new(Transform::from_matrix(Mat4::identity()))).unwrap();

        assert_eq!(entity.types(), vec![ComponentType::Transform, ComponentType::Velocity]);
        assert!(entity.satisfies(&[ComponentType::Transform]));
        assert!(!entity.satisfies(&[ComponentType::Transform, ComponentType::Mesh]));
        assert!(entity.get::<crate::ecs::components::Mesh>().is_none());
    }
}
