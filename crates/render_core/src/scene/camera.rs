//! # Cameras
//!
//! A camera owns its projection and its own local transform. It is not a node
//! of the scene arena, but may name a scene node as parent; the frame
//! controller composes the parent's world matrix with the camera's local
//! matrix before rendering.
//!
//! ## Coordinate System
//! Right-handed, Y-up. The camera looks down its local -Z axis, and
//! `Mat4::new_perspective` produces OpenGL-style clip space, so visible
//! points have negative view-space z and NDC depth in `[-1, 1]`.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::math::{utils, Mat4, Mat4Ext, Quat, Transform, Vec3};
use crate::scene::{Frustum, Layers, NodeId};

static NEXT_CAMERA_ID: AtomicU64 = AtomicU64::new(1);

/// Unique camera identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(pub u64);

/// Projection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection
    Perspective {
        /// Vertical field of view in radians
        fov_y: f32,
        /// Width / height
        aspect: f32,
        /// Near plane distance
        near: f32,
        /// Far plane distance
        far: f32,
    },
    /// Orthographic projection
    Orthographic {
        /// Left plane
        left: f32,
        /// Right plane
        right: f32,
        /// Top plane
        top: f32,
        /// Bottom plane
        bottom: f32,
        /// Near plane distance
        near: f32,
        /// Far plane distance
        far: f32,
    },
}

impl Projection {
    /// Projection matrix for these parameters
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Self::Perspective { fov_y, aspect, near, far } => {
                Mat4::new_perspective(aspect, fov_y, near, far)
            }
            Self::Orthographic { left, right, top, bottom, near, far } => {
                Mat4::new_orthographic(left, right, bottom, top, near, far)
            }
        }
    }
}

/// Camera with cached world, view and projection matrices
#[derive(Debug, Clone)]
pub struct Camera {
    id: CameraId,
    /// Projection parameters; call [`Camera::update_projection_matrix`] after edits
    pub projection: Projection,
    /// Local transform
    pub transform: Transform,
    /// Scene node this camera is attached to
    pub parent: Option<NodeId>,
    /// Layer mask; nodes outside it are not drawn
    pub layers: Layers,
    projection_matrix: Mat4,
    matrix_world: Mat4,
    matrix_world_inverse: Mat4,
}

impl Camera {
    /// Create a camera from projection parameters
    pub fn new(projection: Projection) -> Self {
        Self {
            id: CameraId(NEXT_CAMERA_ID.fetch_add(1, Ordering::Relaxed)),
            projection,
            transform: Transform::default(),
            parent: None,
            layers: Layers::default(),
            projection_matrix: projection.matrix(),
            matrix_world: Mat4::identity(),
            matrix_world_inverse: Mat4::identity(),
        }
    }

    /// Perspective camera; `fov_degrees` is the vertical field of view
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::new(Projection::Perspective {
            fov_y: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        })
    }

    /// Orthographic camera
    pub fn orthographic(left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32) -> Self {
        Self::new(Projection::Orthographic { left, right, top, bottom, near, far })
    }

    /// Camera identifier
    pub fn id(&self) -> CameraId {
        self.id
    }

    /// Move the camera
    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Orient the camera so its -Z axis points at `target`
    ///
    /// Position and target are taken in the camera's parent space.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let dir = self.transform.position - target;
        if dir.magnitude_squared() > 0.0 {
            self.transform.rotation = Quat::face_towards(&dir, &up);
        }
    }

    /// Update the aspect ratio of a perspective camera
    pub fn set_aspect_ratio(&mut self, new_aspect: f32) {
        if let Projection::Perspective { aspect, .. } = &mut self.projection {
            *aspect = new_aspect;
        }
        self.update_projection_matrix();
    }

    /// Recompute the projection matrix from [`Camera::projection`]
    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = self.projection.matrix();
    }

    /// Recompute world and view matrices; `parent_world` is the parent node's world matrix
    pub fn update_matrix_world(&mut self, parent_world: Option<&Mat4>) {
        let local = self.transform.to_matrix();
        self.matrix_world = match parent_world {
            Some(parent) => parent * local,
            None => local,
        };
        self.matrix_world_inverse = self.matrix_world.try_inverse().unwrap_or_else(Mat4::identity);
    }

    /// Projection matrix
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// World matrix
    pub fn matrix_world(&self) -> &Mat4 {
        &self.matrix_world
    }

    /// View matrix (inverse of the world matrix)
    pub fn matrix_world_inverse(&self) -> &Mat4 {
        &self.matrix_world_inverse
    }

    /// Projection × view
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix * self.matrix_world_inverse
    }

    /// Frustum of the current view-projection
    pub fn frustum(&self) -> Frustum {
        Frustum::from_matrix(&self.view_projection())
    }

    /// World-space position
    pub fn world_position(&self) -> Vec3 {
        self.matrix_world.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_view_matrix_inverts_position() {
        let mut camera = Camera::perspective(60.0, 1.0, 0.1, 100.0);
        camera.set_position(Vec3::new(0.0, 0.0, 5.0));
        camera.update_matrix_world(None);
        let origin_in_view = camera.matrix_world_inverse().transform_point(&Vec3::zeros().into());
        assert_relative_eq!(origin_in_view.coords, Vec3::new(0.0, 0.0, -5.0), epsilon = 1e-5);
    }

    #[test]
    fn test_look_at_points_negative_z_at_target() {
        let mut camera = Camera::perspective(60.0, 1.0, 0.1, 100.0);
        camera.set_position(Vec3::new(5.0, 0.0, 0.0));
        camera.look_at(Vec3::zeros(), Vec3::y());
        camera.update_matrix_world(None);
        let target_in_view = camera.matrix_world_inverse().transform_point(&Vec3::zeros().into());
        assert_relative_eq!(target_in_view.coords, Vec3::new(0.0, 0.0, -5.0), epsilon = 1e-5);
    }

    #[test]
    fn test_parent_world_composes() {
        let mut camera = Camera::perspective(60.0, 1.0, 0.1, 100.0);
        camera.set_position(Vec3::new(0.0, 0.0, 1.0));
        let parent = Mat4::new_translation(&Vec3::new(0.0, 2.0, 0.0));
        camera.update_matrix_world(Some(&parent));
        assert_relative_eq!(camera.world_position(), Vec3::new(0.0, 2.0, 1.0));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Camera::perspective(60.0, 1.0, 0.1, 100.0);
        let b = a.clone();
        let c = Camera::perspective(60.0, 1.0, 0.1, 100.0);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
    }
}
