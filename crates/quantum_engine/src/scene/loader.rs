//! Scene file loading
//!
//! Models whose mesh file cannot be loaded are logged and skipped; the rest
//! of the scene still loads.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::description::{CameraDescription, ModelDescription, SceneDescription};
use super::{Scene, SceneContext, SceneError};
use crate::ecs::components::{Acceleration, Camera, CameraError, Mesh, Transform, Velocity};
use crate::ecs::entity::{Entity, EntityError};

/// Read and parse a scene document
///
/// Relative paths are resolved against `scene_dir` unless they already
/// start with it.
pub fn read_description(scene_dir: &Path, file: impl AsRef<Path>) -> Result<SceneDescription, SceneError> {
    let path = resolve(scene_dir, file.as_ref());
    let text = std::fs::read_to_string(&path).map_err(|source| SceneError::File {
        path: path.clone(),
        source,
    })?;
    let description: SceneDescription = serde_json::from_str(&text).map_err(|source| SceneError::Parse {
        path: path.clone(),
        source,
    })?;
    description
        .camera
        .validate()
        .map_err(|source| SceneError::InvalidCamera { path, source })?;
    Ok(description)
}

/// Load a scene file and build its systems and entities
///
/// The scene id is the file name as given.
pub fn load_scene_file(file: impl AsRef<Path>, context: &SceneContext) -> Result<Scene, SceneError> {
    let file = file.as_ref();
    let description = read_description(&context.scene_dir, file)?;
    build_scene(file.to_string_lossy(), &description, context)
}

/// Build a scene from an already parsed document
pub fn build_scene(
    id: impl Into<String>,
    description: &SceneDescription,
    context: &SceneContext,
) -> Result<Scene, SceneError> {
    let id = id.into();
    let camera = build_camera(&description.camera, context.window_size).map_err(|source| {
        SceneError::InvalidCamera {
            path: PathBuf::from(&id),
            source,
        }
    })?;
    let scene = Scene::new(id, context)?;
    scene.set_camera(Arc::new(camera));

    let mut loaded = 0;
    for model in &description.models {
        match build_entity(model, &context.model_dir) {
            Ok(entity) => {
                scene.add_entity(Arc::new(entity))?;
                loaded += 1;
            }
            Err(e) => log::warn!("Skipping model '{}': {}", model.name, e),
        }
    }

    log::info!(
        "Loaded scene '{}' ({}/{} models)",
        scene.id(),
        loaded,
        description.models.len()
    );
    Ok(scene)
}

fn build_camera(description: &CameraDescription, (width, height): (u32, u32)) -> Result<Camera, CameraError> {
    let camera = Camera::new();
    camera.set_view(description.position, description.look_at, description.up);
    camera.set_projection(
        description.fovy,
        description.near_plane,
        description.far_plane,
        width,
        height,
    )?;
    Ok(camera)
}

#[derive(Debug, thiserror::Error)]
enum ModelError {
    #[error(transparent)]
    Mesh(#[from] crate::ecs::components::MeshError),
    #[error(transparent)]
    Entity(#[from] EntityError),
}

fn build_entity(model: &ModelDescription, model_dir: &Path) -> Result<Entity, ModelError> {
    let mesh = Mesh::with_source_dir(model_dir);
    mesh.load(&model.file_name)?;

    let transform = Transform::new();
    transform.translate(model.position);

    let entity = Entity::new(model.name.clone());
    entity.add(Arc::new(mesh))?;
    entity.add(Arc::new(transform))?;
    entity.add(Arc::new(Velocity::new(
        model.rotational_velocity,
        model.translational_velocity,
    )))?;
    entity.add(Arc::new(Acceleration::new(
        model.rotational_acceleration,
        model.translational_acceleration,
    )))?;
    Ok(entity)
}

fn resolve(dir: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() || file.starts_with(dir) {
        file.to_path_buf()
    } else {
        dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
    use crate::scene::tests::context;
    use crate::render::device::ShaderStage;
    use crate::testing::{spawn_main_loop, AssetFixture, Call, RecordingDevice};
    use approx::assert_relative_eq;

    const CAMERA: &str = r#""defaultCamera": {
        "position": [0, 0, 5], "lookat": [0, 0, 0], "up": [0, 1, 0],
        "fovy": 45, "nearPlane": 0.1, "farPlane": 100
    }"#;

    #[test]
    fn test_missing_file_is_an_error() {
        let fixture = AssetFixture::new();
        let err = read_description(&fixture.paths.scenes, "absent.json").unwrap_err();
        assert!(matches!(err, SceneError::File { .. }));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let fixture = AssetFixture::new();
        fixture.write_scene("bad.json", "{ not json");
        let err = read_description(&fixture.paths.scenes, "bad.json").unwrap_err();
        assert!(matches!(err, SceneError::Parse { .. }));
    }

    #[test]
    fn test_degenerate_camera_is_an_error() {
        let fixture = AssetFixture::new();
        fixture.write_scene(
            "flat.json",
            r#"{ "defaultCamera": {
                "position": [0, 0, 5], "lookat": [0, 0, 0], "up": [0, 1, 0],
                "fovy": 45, "nearPlane": 1, "farPlane": 1
            }, "models": [] }"#,
        );
        let err = read_description(&fixture.paths.scenes, "flat.json").unwrap_err();
        assert!(matches!(
            err,
            SceneError::InvalidCamera { source: CameraError::ClipPlanes { .. }, .. }
        ));

        let main = spawn_main_loop(RecordingDevice::new());
        let result = load_scene_file("flat.json", &context(&fixture, main.dispatcher.clone()));
        assert!(matches!(result, Err(SceneError::InvalidCamera { .. })));
        main.shutdown();
    }

    #[test]
    fn test_camera_without_field_of_view_is_an_error() {
        let mut description: SceneDescription =
            serde_json::from_str(&format!("{{ {CAMERA} }}")).unwrap();
        description.camera.fovy = 0.0;
        assert!(matches!(
            build_camera(&description.camera, (800, 600)),
            Err(CameraError::FieldOfView(_))
        ));
    }

    #[test]
    fn test_path_inside_scene_dir_is_not_joined_twice() {
        let fixture = AssetFixture::new();
        fixture.write_scene("empty.json", &format!("{{ {CAMERA}, \"models\": [] }}"));
        let full = fixture.paths.scenes.join("empty.json");
        assert!(read_description(&fixture.paths.scenes, &full).unwrap().models.is_empty());
    }

    #[test]
    fn test_camera_uses_window_aspect() {
        let description: SceneDescription =
            serde_json::from_str(&format!("{{ {CAMERA} }}")).unwrap();
        let camera = build_camera(&description.camera, (800, 600)).unwrap();

        let expected = Mat4::perspective_gl(45.0, 800.0 / 600.0, 0.1, 100.0);
        assert_relative_eq!(camera.projection(), expected);
        assert_eq!(camera.view_params().eye, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_bad_model_is_skipped() {
        let fixture = AssetFixture::new();
        fixture.write_texture("white.png");
        fixture.write_model("quad.json", &AssetFixture::quad_model("white.png"));
        fixture.write_scene(
            "partial.json",
            &format!(
                r#"{{ {CAMERA}, "models": [
                    {{ "name": "good", "fileName": "quad.json", "position": [1, 2, 3],
                       "translationalVelocity": [1, 0, 0] }},
                    {{ "name": "broken", "fileName": "missing.json" }}
                ] }}"#
            ),
        );

        let main = spawn_main_loop(RecordingDevice::new());
        let mut scene = load_scene_file("partial.json", &context(&fixture, main.dispatcher.clone())).unwrap();
        scene.flush().unwrap();

        assert_eq!(scene.id(), "partial.json");
        assert_eq!(scene.render_system().entity_count(), 1);
        assert_eq!(scene.movement_system().entity_count(), 1);
        assert!(scene.render_system().contains("good"));
        assert!(!scene.movement_system().contains("broken"));

        scene.terminate().unwrap();
        main.shutdown();
    }

    #[test]
    fn test_shader_failure_leaves_entity_moving() {
        let fixture = AssetFixture::new();
        fixture.write_texture("white.png");
        fixture.write_model("quad.json", &AssetFixture::quad_model("white.png"));
        fixture.write_scene(
            "unshaded.json",
            &format!(
                r#"{{ {CAMERA}, "models": [
                    {{ "name": "quad", "fileName": "quad.json", "rotationalVelocity": [0, 1, 0] }}
                ] }}"#
            ),
        );

        let mut device = RecordingDevice::new();
        device.fail_compile(ShaderStage::Fragment, "0:3: undeclared identifier");
        let main = spawn_main_loop(device);
        let context = context(&fixture, main.dispatcher.clone());
        let mut scene = load_scene_file("unshaded.json", &context).unwrap();
        scene.flush().unwrap();

        assert_eq!(scene.render_system().entity_count(), 0);
        assert_eq!(scene.movement_system().entity_count(), 1);
        assert!(scene.movement_system().contains("quad"));
        assert!(context.shaders.is_empty());
        assert_eq!(main.log.count(|call| matches!(call, Call::CreateVertexArray(_))), 0);

        scene.terminate().unwrap();
        main.shutdown();
    }

    #[test]
    fn test_entity_starts_at_model_position() {
        let fixture = AssetFixture::new();
        fixture.write_model("quad.json", &AssetFixture::quad_model(""));
        let model = ModelDescription {
            name: "quad".into(),
            file_name: "quad.json".into(),
            position: Vec3::new(1.0, 2.0, 3.0),
            rotational_acceleration: Vec3::zeros(),
            translational_acceleration: Vec3::zeros(),
            rotational_velocity: Vec3::y(),
            translational_velocity: Vec3::zeros(),
        };

        let entity = build_entity(&model, &fixture.paths.models).unwrap();
        let transform = entity.get::<Transform>().unwrap();
        assert_eq!(transform.translation(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(entity.get::<Velocity>().unwrap().rotational(), Vec3::y());
        assert!(entity.get::<Mesh>().unwrap().is_loaded());
    }
}
