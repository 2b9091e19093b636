//! Camera component
//!
//! Keeps the view and projection matrices along with the inputs they were
//! built from.

use parking_lot::RwLock;
use thiserror::Error;

use crate::ecs::component::{impl_component, ComponentKind, ComponentType};
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Rejected projection parameters
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CameraError {
    /// Field of view outside (0, 180) degrees
    #[error("field of view must be between 0 and 180 degrees, got {0}")]
    FieldOfView(f32),

    /// Near or far plane not positive, not finite, or not ordered
    #[error("clip planes must satisfy 0 < near < far, got near {near} far {far}")]
    ClipPlanes {
        /// Near clip distance
        near: f32,
        /// Far clip distance
        far: f32,
    },
}

/// Inputs of the view matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewParams {
    /// Camera position
    pub eye: Vec3,
    /// Point looked at
    pub look_at: Vec3,
    /// Up direction
    pub up: Vec3,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            eye: Vec3::zeros(),
            look_at: -Vec3::z(),
            up: Vec3::y(),
        }
    }
}

/// Inputs of the projection matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionParams {
    /// Vertical field of view in degrees
    pub fov_y: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
}

impl ProjectionParams {
    /// Width over height
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

impl ProjectionParams {
    /// Check that a projection matrix can be built from these inputs
    pub fn validate(&self) -> Result<(), CameraError> {
        if !self.fov_y.is_finite() || self.fov_y <= 0.0 || self.fov_y >= 180.0 {
            return Err(CameraError::FieldOfView(self.fov_y));
        }
        let ordered = self.near.is_finite() && self.far.is_finite() && self.near > 0.0 && self.far > self.near;
        if !ordered {
            return Err(CameraError::ClipPlanes { near: self.near, far: self.far });
        }
        Ok(())
    }
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            fov_y: 45.0,
            near: 0.1,
            far: 100.0,
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Clone)]
struct CameraState {
    view: Mat4,
    projection: Mat4,
    view_params: ViewParams,
    projection_params: ProjectionParams,
}

/// ECS camera component
#[derive(Debug)]
pub struct Camera {
    state: RwLock<CameraState>,
}

impl ComponentKind for Camera {
    const TYPE: ComponentType = ComponentType::Camera;
}

impl_component!(Camera);

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Camera at the origin looking down -Z with a 45 degree, 800x600 projection
    pub fn new() -> Self {
        let view_params = ViewParams::default();
        let projection_params = ProjectionParams::default();
        Self {
            state: RwLock::new(CameraState {
                view: view_matrix(&view_params),
                projection: projection_matrix(&projection_params),
                view_params,
                projection_params,
            }),
        }
    }

    /// Rebuild the view matrix
    pub fn set_view(&self, eye: Vec3, look_at: Vec3, up: Vec3) {
        let params = ViewParams { eye, look_at, up };
        let mut state = self.state.write();
        state.view = view_matrix(&params);
        state.view_params = params;
    }

    /// Rebuild the projection matrix
    ///
    /// Invalid parameters leave the current projection in place.
    pub fn set_projection(
        &self,
        fov_y: f32,
        near: f32,
        far: f32,
        width: u32,
        height: u32,
    ) -> Result<(), CameraError> {
        let params = ProjectionParams { fov_y, near, far, width, height };
        params.validate()?;
        let mut state = self.state.write();
        state.projection = projection_matrix(&params);
        state.projection_params = params;
        Ok(())
    }

    /// View matrix
    pub fn view(&self) -> Mat4 {
        self.state.read().view
    }

    /// Projection matrix
    pub fn projection(&self) -> Mat4 {
        self.state.read().projection
    }

    /// Projection and view read together
    pub fn matrices(&self) -> (Mat4, Mat4) {
        let state = self.state.read();
        (state.projection, state.view)
    }

    /// Inputs of the current view matrix
    pub fn view_params(&self) -> ViewParams {
        self.state.read().view_params
    }

    /// Inputs of the current projection matrix
    pub fn projection_params(&self) -> ProjectionParams {
        self.state.read().projection_params
    }
}

fn view_matrix(params: &ViewParams) -> Mat4 {
    Mat4::look_at(&params.eye, &params.look_at, &params.up)
}

fn projection_matrix(params: &ProjectionParams) -> Mat4 {
    Mat4::perspective_gl(params.fov_y, params.aspect(), params.near, params.far)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_set_view_stores_inputs() {
        let camera = Camera::new();
        let eye = Vec3::new(3.0, 3.0, 3.0);
        camera.set_view(eye, Vec3::zeros(), Vec3::y());

        assert_eq!(camera.view_params().eye, eye);
        assert_relative_eq!(
            camera.view(),
            Mat4::look_at(&eye, &Vec3::zeros(), &Vec3::y()),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_set_projection_uses_window_aspect() {
        let camera = Camera::new();
        camera.set_projection(60.0, 0.5, 50.0, 1280, 720).unwrap();

        let params = camera.projection_params();
        assert_relative_eq!(params.aspect(), 1280.0 / 720.0);
        assert_relative_eq!(
            camera.projection(),
            Mat4::perspective_gl(60.0, 1280.0 / 720.0, 0.5, 50.0),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_zero_height_does_not_divide_by_zero() {
        let params = ProjectionParams { height: 0, ..ProjectionParams::default() };
        assert_relative_eq!(params.aspect(), 1.0);
        let params = ProjectionParams { width: 0, ..ProjectionParams::default() };
        assert_relative_eq!(params.aspect(), 1.0);
    }

    #[test]
    fn test_invalid_projection_keeps_previous() {
        let camera = Camera::new();
        let before = camera.projection();

        assert_eq!(
            camera.set_projection(45.0, 1.0, 1.0, 800, 600),
            Err(CameraError::ClipPlanes { near: 1.0, far: 1.0 })
        );
        assert!(matches!(
            camera.set_projection(45.0, 0.0, 10.0, 800, 600),
            Err(CameraError::ClipPlanes { .. })
        ));
        assert!(matches!(
            camera.set_projection(45.0, 0.1, f32::INFINITY, 800, 600),
            Err(CameraError::ClipPlanes { .. })
        ));
        assert_eq!(
            camera.set_projection(0.0, 0.1, 10.0, 800, 600),
            Err(CameraError::FieldOfView(0.0))
        );
        assert!(matches!(
            camera.set_projection(f32::NAN, 0.1, 10.0, 800, 600),
            Err(CameraError::FieldOfView(_))
        ));

        assert_eq!(camera.projection(), before);
        assert_eq!(camera.projection_params(), ProjectionParams::default());
    }
}
