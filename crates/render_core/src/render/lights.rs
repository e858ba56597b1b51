//! Light aggregation
//!
//! Once per frame the collected light nodes are folded into view-space
//! uniform structs, grouped by kind. The per-kind counts (plus the number of
//! shadow casters) form a [`LightsHash`]; programs are keyed on it, so a
//! material re-links only when the light layout changes, not when a light
//! merely moves.

use crate::error::UniformError;
use crate::foundation::math::{Color, Mat3, Mat4, Mat4Ext, Vec2, Vec3};
use crate::material::TextureRef;
use crate::scene::{Camera, LightKind, NodeId, Scene};
use crate::uniforms::{
    DirectionalLightUniform, HemisphereLightUniform, PointLightUniform, RectAreaLightUniform,
    SpotLightUniform, UniformName as N, UniformSet, UniformValue as V,
};

/// Light layout a program is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LightsHash {
    /// Directional lights
    pub directional: usize,
    /// Point lights
    pub point: usize,
    /// Spot lights
    pub spot: usize,
    /// Hemisphere lights
    pub hemisphere: usize,
    /// Rect area lights
    pub rect_area: usize,
    /// Lights rendering a shadow map
    pub shadows: usize,
}

/// Aggregated light uniforms of the current frame
#[derive(Debug, Clone, Default)]
pub struct LightState {
    /// Sum of ambient lights
    pub ambient: Color,
    /// Directional lights
    pub directional: Vec<DirectionalLightUniform>,
    /// Shadow map per directional light
    pub directional_shadow_map: Vec<Option<TextureRef>>,
    /// Shadow matrix per directional light
    pub directional_shadow_matrix: Vec<Mat4>,
    /// Point lights
    pub point: Vec<PointLightUniform>,
    /// Shadow map per point light
    pub point_shadow_map: Vec<Option<TextureRef>>,
    /// Shadow matrix per point light
    pub point_shadow_matrix: Vec<Mat4>,
    /// Spot lights
    pub spot: Vec<SpotLightUniform>,
    /// Shadow map per spot light
    pub spot_shadow_map: Vec<Option<TextureRef>>,
    /// Shadow matrix per spot light
    pub spot_shadow_matrix: Vec<Mat4>,
    /// Hemisphere lights
    pub hemisphere: Vec<HemisphereLightUniform>,
    /// Rect area lights
    pub rect_area: Vec<RectAreaLightUniform>,
    /// Layout summary
    pub hash: LightsHash,
}

impl LightState {
    /// Rebuild the state from light nodes, in view space of `camera`
    pub fn setup(&mut self, lights: &[NodeId], scene: &Scene, camera: &Camera) {
        *self = Self::default();
        self.ambient = Color::BLACK;
        let view = camera.matrix_world_inverse();
        let view_rotation: Mat3 = view.fixed_view::<3, 3>(0, 0).into_owned();

        for &id in lights {
            let Some(node) = scene.get(id) else { continue };
            let Some(light) = node.as_light() else { continue };
            let world = node.matrix_world();
            let world_position = world.position();
            let view_position = view.transform_point(&world_position.into()).coords;
            let color = light.radiance();
            let shadow = &light.shadow;
            let casts = node.cast_shadow && light.supports_shadow();
            let map_size = Vec2::new(shadow.map_size.0 as f32, shadow.map_size.1 as f32);
            let shadow_map = if casts { shadow.map().map(|t| t.texture.clone()) } else { None };

            match light.kind {
                LightKind::Ambient => self.ambient = self.ambient + color,
                LightKind::Directional { target } => {
                    self.directional.push(DirectionalLightUniform {
                        direction: (view_rotation * (world_position - target)).normalize(),
                        color,
                        shadow: casts,
                        shadow_bias: shadow.bias,
                        shadow_radius: shadow.radius,
                        shadow_map_size: map_size,
                    });
                    self.directional_shadow_map.push(shadow_map);
                    self.directional_shadow_matrix.push(*shadow.matrix());
                }
                LightKind::Spot { target, distance, angle, penumbra, decay } => {
                    self.spot.push(SpotLightUniform {
                        position: view_position,
                        direction: (view_rotation * (world_position - target)).normalize(),
                        color,
                        distance,
                        decay,
                        cone_cos: angle.cos(),
                        penumbra_cos: (angle * (1.0 - penumbra)).cos(),
                        shadow: casts,
                        shadow_bias: shadow.bias,
                        shadow_radius: shadow.radius,
                        shadow_map_size: map_size,
                    });
                    self.spot_shadow_map.push(shadow_map);
                    self.spot_shadow_matrix.push(*shadow.matrix());
                }
                LightKind::Point { distance, decay } => {
                    self.point.push(PointLightUniform {
                        position: view_position,
                        color,
                        distance,
                        decay,
                        shadow: casts,
                        shadow_bias: shadow.bias,
                        shadow_radius: shadow.radius,
                        shadow_map_size: map_size,
                        shadow_camera_near: shadow.camera_near,
                        shadow_camera_far: shadow.camera_far,
                    });
                    self.point_shadow_map.push(shadow_map);
                    self.point_shadow_matrix.push(*shadow.matrix());
                }
                LightKind::Hemisphere { ground_color } => {
                    let up = world_position.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::y);
                    self.hemisphere.push(HemisphereLightUniform {
                        direction: (view_rotation * up).normalize(),
                        sky_color: color,
                        ground_color: ground_color.scaled(light.intensity),
                    });
                }
                LightKind::RectArea { width, height } => {
                    let rotation: Mat3 = (view * world).fixed_view::<3, 3>(0, 0).into_owned();
                    self.rect_area.push(RectAreaLightUniform {
                        position: view_position,
                        half_width: rotation * Vec3::new(width * 0.5, 0.0, 0.0),
                        half_height: rotation * Vec3::new(0.0, height * 0.5, 0.0),
                        color,
                    });
                }
            }
            if casts {
                self.hash.shadows += 1;
            }
        }

        self.hash.directional = self.directional.len();
        self.hash.point = self.point.len();
        self.hash.spot = self.spot.len();
        self.hash.hemisphere = self.hemisphere.len();
        self.hash.rect_area = self.rect_area.len();
    }

    /// Write the light uniforms into a lit material's uniform set
    pub fn refresh_uniforms(&self, uniforms: &mut UniformSet) -> Result<(), UniformError> {
        uniforms.set_if_present(N::AmbientLightColor, V::Color(self.ambient))?;
        uniforms.set_if_present(N::DirectionalLights, V::DirectionalLights(self.directional.clone()))?;
        uniforms.set_if_present(N::DirectionalShadowMap, V::TextureArray(self.directional_shadow_map.clone()))?;
        uniforms.set_if_present(N::DirectionalShadowMatrix, V::Mat4Array(self.directional_shadow_matrix.clone()))?;
        uniforms.set_if_present(N::SpotLights, V::SpotLights(self.spot.clone()))?;
        uniforms.set_if_present(N::SpotShadowMap, V::TextureArray(self.spot_shadow_map.clone()))?;
        uniforms.set_if_present(N::SpotShadowMatrix, V::Mat4Array(self.spot_shadow_matrix.clone()))?;
        uniforms.set_if_present(N::PointLights, V::PointLights(self.point.clone()))?;
        uniforms.set_if_present(N::PointShadowMap, V::TextureArray(self.point_shadow_map.clone()))?;
        uniforms.set_if_present(N::PointShadowMatrix, V::Mat4Array(self.point_shadow_matrix.clone()))?;
        uniforms.set_if_present(N::HemisphereLights, V::HemisphereLights(self.hemisphere.clone()))?;
        uniforms.set_if_present(N::RectAreaLights, V::RectAreaLights(self.rect_area.clone()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Light, Node};
    use crate::uniforms::{library, UniformsId};
    use approx::assert_relative_eq;

    fn camera_at_origin() -> Camera {
        let mut camera = Camera::perspective(60.0, 1.0, 0.1, 100.0);
        camera.update_matrix_world(None);
        camera
    }

    #[test]
    fn test_setup_groups_by_kind() {
        let mut scene = Scene::new();
        let ids = vec![
            scene.add(Node::light(Light::ambient(Color::new(0.1, 0.1, 0.1), 1.0))),
            scene.add(Node::light(Light::ambient(Color::new(0.2, 0.2, 0.2), 1.0))),
            scene.add(Node::light(Light::directional(Color::WHITE, 2.0)).with_position(Vec3::new(0.0, 10.0, 0.0))),
            scene.add(Node::light(Light::point(Color::WHITE, 1.0, 0.0, 1.0))),
        ];
        scene.update_matrix_world(false);

        let mut state = LightState::default();
        state.setup(&ids, &scene, &camera_at_origin());

        assert_relative_eq!(state.ambient.r, 0.3, epsilon = 1e-6);
        assert_eq!(state.hash, LightsHash { directional: 1, point: 1, ..LightsHash::default() });
        assert_relative_eq!(state.directional[0].direction, Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
        assert_eq!(state.directional[0].color, Color::new(2.0, 2.0, 2.0));
        assert!(!state.directional[0].shadow);
    }

    #[test]
    fn test_point_position_in_view_space() {
        let mut scene = Scene::new();
        let id = scene.add(Node::light(Light::point(Color::WHITE, 1.0, 10.0, 2.0)).with_position(Vec3::new(1.0, 0.0, 0.0)));
        scene.update_matrix_world(false);
        let mut camera = Camera::perspective(60.0, 1.0, 0.1, 100.0);
        camera.set_position(Vec3::new(0.0, 0.0, 5.0));
        camera.update_matrix_world(None);

        let mut state = LightState::default();
        state.setup(&[id], &scene, &camera);
        assert_relative_eq!(state.point[0].position, Vec3::new(1.0, 0.0, -5.0), epsilon = 1e-5);
        assert_relative_eq!(state.point[0].decay, 2.0);
    }

    #[test]
    fn test_setup_resets_previous_frame() {
        let mut scene = Scene::new();
        let id = scene.add(Node::light(Light::hemisphere(Color::WHITE, Color::BLACK, 1.0)));
        scene.update_matrix_world(false);
        let camera = camera_at_origin();
        let mut state = LightState::default();
        state.setup(&[id], &scene, &camera);
        assert_eq!(state.hash.hemisphere, 1);
        state.setup(&[], &scene, &camera);
        assert_eq!(state.hash, LightsHash::default());
    }

    #[test]
    fn test_refresh_marks_light_uniforms_dirty() {
        let mut scene = Scene::new();
        let id = scene.add(Node::light(Light::spot(Color::WHITE, 1.0, 0.0, 0.5, 0.2)).with_position(Vec3::new(0.0, 3.0, 0.0)));
        scene.update_matrix_world(false);
        let mut state = LightState::default();
        state.setup(&[id], &scene, &camera_at_origin());

        let mut uniforms = library::get(UniformsId::Lights);
        state.refresh_uniforms(&mut uniforms).unwrap();
        let dirty = uniforms.dirty_names();
        assert!(dirty.contains(&N::SpotLights));
        assert!(dirty.contains(&N::SpotShadowMap));
        assert!(!dirty.contains(&N::PointLights));
    }
}
