//! Transform component for the ECS system
//!
//! Holds the model matrix together with the translation and Euler rotation
//! it was built from. After any accumulator mutation the matrix is
//! `T(translation) * Rz * Ry * Rx`.

use parking_lot::RwLock;

use crate::ecs::component::{impl_component, ComponentKind, ComponentType};
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

#[derive(Debug, Clone, PartialEq)]
struct TransformState {
    matrix: Mat4,
    translation: Vec3,
    rotation: Vec3,
}

impl TransformState {
    fn rebuild(&mut self) {
        self.matrix = Mat4::translation_euler(&self.translation, &self.rotation);
    }
}

/// ECS Transform component
///
/// Every read and write takes the component's lock, so a reader never sees a
/// half-updated matrix.
#[derive(Debug)]
pub struct Transform {
    state: RwLock<TransformState>,
}

impl ComponentKind for Transform {
    const TYPE: ComponentType = ComponentType::Transform;
}

impl_component!(Transform);

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    /// Identity transform with zeroed accumulators
    pub fn new() -> Self {
        Self {
            state: RwLock::new(TransformState {
                matrix: Mat4::identity(),
                translation: Vec3::zeros(),
                rotation: Vec3::zeros(),
            }),
        }
    }

    /// Transform with an explicit matrix and zeroed accumulators
    pub fn from_matrix(matrix: Mat4) -> Self {
        let transform = Self::new();
        transform.set(matrix);
        transform
    }

    /// Overwrite the model matrix
    ///
    /// The accumulators are left untouched, so the next `translate` or
    /// `rotate` rebuilds the matrix from them and discards this value.
    pub fn set(&self, matrix: Mat4) {
        self.state.write().matrix = matrix;
    }

    /// Current model matrix
    pub fn data(&self) -> Mat4 {
        self.state.read().matrix
    }

    /// Accumulated translation
    pub fn translation(&self) -> Vec3 {
        self.state.read().translation
    }

    /// Accumulated Euler rotation in radians
    pub fn rotation(&self) -> Vec3 {
        self.state.read().rotation
    }

    /// Add to the translation and rebuild the matrix
    pub fn translate(&self, delta: Vec3) {
        let mut state = self.state.write();
        state.translation += delta;
        state.rebuild();
    }

    /// Add to the rotation and rebuild the matrix
    pub fn rotate(&self, delta: Vec3) {
        let mut state = self.state.write();
        state.rotation += delta;
        state.rebuild();
    }

    /// Translate then rotate under a single lock hold
    pub fn update(&self, delta_translation: Vec3, delta_rotation: Vec3) {
        let mut state = self.state.write();
        state.translation += delta_translation;
        state.rotation += delta_rotation;
        state.rebuild();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    #[test]
    fn test_set_then_data() {
        let transform = Transform::new();
        let m = Mat4::new_scaling(2.5);
        transform.set(m);
        assert_eq!(transform.data(), m);
    }

    #[test]
    fn test_matrix_tracks_accumulators() {
        let transform = Transform::new();
        transform.translate(Vec3::new(1.0, -2.0, 3.0));
        transform.rotate(Vec3::new(0.1, 0.2, 0.3));
        transform.update(Vec3::new(0.5, 0.5, 0.0), Vec3::new(0.0, 0.0, 0.1));

        let translation = Vec3::new(1.5, -1.5, 3.0);
        let rotation = Vec3::new(0.1, 0.2, 0.4);
        assert_relative_eq!(transform.translation(), translation, epsilon = 1e-6);
        assert_relative_eq!(transform.rotation(), rotation, epsilon = 1e-6);
        assert_relative_eq!(
            transform.data(),
            Mat4::translation_euler(&translation, &rotation),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_set_is_overridden_by_next_mutation() {
        let transform = Transform::new();
        transform.set(Mat4::new_scaling(3.0));
        transform.translate(Vec3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(
            transform.data(),
            Mat4::new_translation(&Vec3::new(0.0, 1.0, 0.0)),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_concurrent_updates_stay_consistent() {
        let transform = Arc::new(Transform::new());
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let transform = Arc::clone(&transform);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        transform.update(Vec3::new(0.001, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.001));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let expected = Mat4::translation_euler(&transform.translation(), &transform.rotation());
        assert_relative_eq!(transform.data(), expected, epsilon = 1e-5);
        assert_relative_eq!(transform.translation().x, 1.0, epsilon = 1e-3);
    }
}
