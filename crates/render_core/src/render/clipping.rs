//! Clipping planes
//!
//! Global planes apply to every draw; material planes are added on top when
//! local clipping is enabled. Planes are uploaded in view space as packed
//! `(a, b, c, d)` quadruples. While shadow maps render, no planes apply.

use crate::foundation::math::Mat4;
use crate::material::Material;
use crate::scene::{Camera, Plane};

/// Per-frame clipping state
#[derive(Debug, Clone, Default)]
pub struct Clipping {
    global_view: Vec<Plane>,
    local_enabled: bool,
    rendering_shadows: bool,
    view: Mat4,
}

impl Clipping {
    /// Empty state
    pub fn new() -> Self {
        Self {
            view: Mat4::identity(),
            ..Self::default()
        }
    }

    /// Prepare the frame; returns whether any clipping can happen
    pub fn init(&mut self, global: &[Plane], local_enabled: bool, camera: &Camera) -> bool {
        self.view = *camera.matrix_world_inverse();
        self.global_view = global.iter().map(|p| p.transformed(&self.view)).collect();
        self.local_enabled = local_enabled;
        self.rendering_shadows = false;
        !global.is_empty() || local_enabled
    }

    /// Suspend clipping for the shadow pass
    pub fn begin_shadows(&mut self) {
        self.rendering_shadows = true;
    }

    /// Resume clipping after the shadow pass
    pub fn end_shadows(&mut self) {
        self.rendering_shadows = false;
    }

    /// Whether the shadow pass is running
    pub fn rendering_shadows(&self) -> bool {
        self.rendering_shadows
    }

    /// View-space planes that apply to `material`
    pub fn planes_for(&self, material: &Material) -> Vec<Plane> {
        if self.rendering_shadows {
            return Vec::new();
        }
        let mut planes = self.global_view.clone();
        if self.local_enabled {
            planes.extend(material.clipping_planes.iter().map(|p| p.transformed(&self.view)));
        }
        planes
    }

    /// Pack planes for the `clippingPlanes` uniform
    pub fn pack(planes: &[Plane]) -> Vec<f32> {
        planes
            .iter()
            .flat_map(|p| {
                let v = p.to_vec4();
                [v.x, v.y, v.z, v.w]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Color, Vec3};
    use approx::assert_relative_eq;

    fn camera_back_five() -> Camera {
        let mut camera = Camera::perspective(60.0, 1.0, 0.1, 100.0);
        camera.set_position(Vec3::new(0.0, 0.0, 5.0));
        camera.update_matrix_world(None);
        camera
    }

    #[test]
    fn test_disabled_without_planes() {
        let mut clipping = Clipping::new();
        assert!(!clipping.init(&[], false, &camera_back_five()));
        assert!(clipping.planes_for(&Material::basic(Color::WHITE)).is_empty());
    }

    #[test]
    fn test_global_planes_move_to_view_space() {
        let mut clipping = Clipping::new();
        let plane = Plane::new(Vec3::new(0.0, 0.0, -1.0), 0.0);
        assert!(clipping.init(&[plane], false, &camera_back_five()));
        let planes = clipping.planes_for(&Material::basic(Color::WHITE));
        assert_eq!(planes.len(), 1);
        // world z = 0 is view z = -5
        assert_relative_eq!(planes[0].distance_to_point(Vec3::new(0.0, 0.0, -5.0)), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_local_planes_need_local_clipping() {
        let mut material = Material::basic(Color::WHITE);
        material.clipping_planes.push(Plane::new(Vec3::x(), 1.0));
        let mut clipping = Clipping::new();
        clipping.init(&[], false, &camera_back_five());
        assert!(clipping.planes_for(&material).is_empty());
        clipping.init(&[], true, &camera_back_five());
        assert_eq!(clipping.planes_for(&material).len(), 1);
    }

    #[test]
    fn test_shadow_pass_suspends_planes() {
        let mut clipping = Clipping::new();
        clipping.init(&[Plane::new(Vec3::y(), 0.0)], false, &camera_back_five());
        clipping.begin_shadows();
        assert!(clipping.planes_for(&Material::depth()).is_empty());
        clipping.end_shadows();
        assert_eq!(clipping.planes_for(&Material::depth()).len(), 1);
        assert_eq!(Clipping::pack(&clipping.planes_for(&Material::depth())).len(), 4);
    }
}
