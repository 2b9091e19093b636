//! Scene file format
//!
//! ```json
//! { "defaultCamera": { "position": [0,0,5], "lookat": [0,0,0], "up": [0,1,0],
//!                      "fovy": 45, "nearPlane": 0.1, "farPlane": 100 },
//!   "models": [ { "name": "cube", "fileName": "cube.json", "position": [0,0,0],
//!                 "rotationalVelocity": [0,1,0] } ] }
//! ```
//!
//! Model vectors other than `name` and `fileName` default to zero.

use serde::{Deserialize, Serialize};

use crate::ecs::components::{CameraError, ProjectionParams};
use crate::foundation::math::Vec3;

/// Top-level scene document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Camera installed on the render system
    #[serde(rename = "defaultCamera")]
    pub camera: CameraDescription,
    /// Models to instantiate
    #[serde(default)]
    pub models: Vec<ModelDescription>,
}

/// Camera placement and lens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraDescription {
    /// Eye position
    pub position: Vec3,
    /// Point looked at
    #[serde(rename = "lookat")]
    pub look_at: Vec3,
    /// Up direction
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fovy: f32,
    /// Near clip distance
    pub near_plane: f32,
    /// Far clip distance
    pub far_plane: f32,
}

impl CameraDescription {
    /// Check the lens values before any matrix is built from them
    pub fn validate(&self) -> Result<(), CameraError> {
        ProjectionParams {
            fov_y: self.fovy,
            near: self.near_plane,
            far: self.far_plane,
            ..ProjectionParams::default()
        }
        .validate()
    }
}

/// One entity built from a mesh file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescription {
    /// Entity id
    pub name: String,
    /// Mesh file, relative to the models directory
    pub file_name: String,
    /// Initial translation
    #[serde(default = "Vec3::zeros")]
    pub position: Vec3,
    /// Initial rotational acceleration
    #[serde(default = "Vec3::zeros")]
    pub rotational_acceleration: Vec3,
    /// Initial translational acceleration
    #[serde(default = "Vec3::zeros")]
    pub translational_acceleration: Vec3,
    /// Initial rotational velocity
    #[serde(default = "Vec3::zeros")]
    pub rotational_velocity: Vec3,
    /// Initial translational velocity
    #[serde(default = "Vec3::zeros")]
    pub translational_velocity: Vec3,
}
