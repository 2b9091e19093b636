//! ECS Components module
//!
//! Every component owns its own lock so it can be shared between systems
//! running on different threads.

pub mod camera;
pub mod mesh;
pub mod motion;
pub mod shader_binding;
pub mod transform;

pub use camera::{Camera, CameraError, ProjectionParams, ViewParams};
pub use mesh::{DrawInfo, DrawMode, Mesh, MeshData, MeshError, MAX_VERT_SIZE, MIN_VERT_SIZE};
pub use motion::{Acceleration, Motion, Velocity};
pub use shader_binding::ShaderBinding;
pub use transform::Transform;
