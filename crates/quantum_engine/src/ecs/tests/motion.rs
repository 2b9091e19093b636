//! Integration and transform scenarios

use std::sync::Arc;

use approx::assert_relative_eq;

use crate::ecs::components::{Acceleration, Transform, Velocity};
use crate::ecs::systems::{MovementSystem, MOVEMENT_HZ};
use crate::ecs::{Entity, System};
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

#[test]
fn test_empty_scene_tick() {
    let mut system = MovementSystem::movement(MOVEMENT_HZ).unwrap();
    system.tick(0.016);
    assert_eq!(system.entity_count(), 0);
    system.terminate().unwrap();
}

#[test]
fn test_integrator_half_second_step() {
    let system = MovementSystem::movement(MOVEMENT_HZ).unwrap();
    let entity = Entity::new("marker");
    let transform = Arc::new(Transform::new());
    let velocity = Arc::new(Velocity::default());
    entity.add(transform.clone()).unwrap();
    entity.add(velocity.clone()).unwrap();
    entity
        .add(Arc::new(Acceleration::new(Vec3::zeros(), Vec3::new(2.0, 2.0, 0.0))))
        .unwrap();

    system.add_entity(Arc::new(entity)).unwrap();
    system.flush().unwrap();
    system.tick(0.5);

    assert_relative_eq!(velocity.translational(), Vec3::new(1.0, 1.0, 0.0));
    assert_relative_eq!(transform.translation(), Vec3::new(0.5, 0.5, 0.0));
}

#[test]
fn test_matrix_tracks_accumulators() {
    let transform = Transform::new();
    transform.translate(Vec3::new(1.0, -2.0, 0.5));
    transform.rotate(Vec3::new(0.2, 0.4, -0.6));
    transform.update(Vec3::new(0.1, 0.1, 0.1), Vec3::new(0.05, 0.0, 0.3));

    let expected = Mat4::translation_euler(&transform.translation(), &transform.rotation());
    assert_relative_eq!(transform.data(), expected, epsilon = 1e-6);
}

#[test]
fn test_set_is_overwritten_by_next_update() {
    let transform = Transform::new();
    let scale = Mat4::new_scaling(3.0);
    transform.set(scale);
    assert_eq!(transform.data(), scale);

    transform.translate(Vec3::x());
    assert_relative_eq!(transform.data(), Mat4::new_translation(&Vec3::x()));
}

#[test]
fn test_shared_component_seen_by_both_entities() {
    let system = MovementSystem::movement(MOVEMENT_HZ).unwrap();
    let velocity = Arc::new(Velocity::new(Vec3::zeros(), Vec3::y()));

    let mut transforms = Vec::new();
    for id in ["left", "right"] {
        let entity = Entity::new(id);
        let transform = Arc::new(Transform::new());
        entity.add(transform.clone()).unwrap();
        entity.add(velocity.clone()).unwrap();
        entity.add(Arc::new(Acceleration::default())).unwrap();
        system.add_entity(Arc::new(entity)).unwrap();
        transforms.push(transform);
    }
    system.flush().unwrap();
    system.tick(1.0);

    for transform in transforms {
        assert_relative_eq!(transform.translation(), Vec3::y());
    }
}
