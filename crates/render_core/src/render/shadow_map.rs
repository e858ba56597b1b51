//! Shadow map pass
//!
//! Renders scene depth from every shadow-casting light into the light's own
//! depth target, before the main pass. Directional lights use an
//! orthographic camera, spot lights a perspective camera matching their cone,
//! point lights six 90° cameras laid out as a 4x2 atlas in one target.

use crate::error::RenderResult;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::material::{Blending, Material};
use crate::render::{
    Clipping, ClearFlags, DirectRenderer, FrameContext, GlBackend, LightState, RenderTarget, Viewport,
};
use crate::scene::{Camera, Frustum, LightKind, LightShadow, MaterialSlot, Mesh, NodeId, NodeRole, Scene};

/// Look direction, up vector and atlas cell of each cube face
const CUBE_FACES: [([f32; 3], [f32; 3], (f32, f32)); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], (2.0, 1.0)),
    ([-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], (0.0, 1.0)),
    ([0.0, 0.0, 1.0], [0.0, 1.0, 0.0], (3.0, 1.0)),
    ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], (1.0, 1.0)),
    ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], (3.0, 0.0)),
    ([0.0, -1.0, 0.0], [0.0, 0.0, -1.0], (1.0, 0.0)),
];

/// Maps clip space `[-1, 1]` to texture space `[0, 1]`
#[rustfmt::skip]
fn bias_matrix() -> Mat4 {
    Mat4::new(
        0.5, 0.0, 0.0, 0.5,
        0.0, 0.5, 0.0, 0.5,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}

fn up_for(direction: Vec3) -> Vec3 {
    if direction.normalize().y.abs() > 0.99 {
        Vec3::z()
    } else {
        Vec3::y()
    }
}

/// Shadow cameras of one light with the viewport each renders to
struct ShadowView {
    cameras: Vec<(Camera, Viewport)>,
    matrix: Mat4,
    size: (u32, u32),
}

fn shadow_view(kind: &LightKind, position: Vec3, shadow: &LightShadow) -> Option<ShadowView> {
    let (width, height) = shadow.map_size;
    let (near, far) = (shadow.camera_near, shadow.camera_far);
    let full = Viewport::new(0.0, 0.0, width as f32, height as f32);

    let aimed = |mut camera: Camera, target: Vec3| {
        camera.set_position(position);
        camera.look_at(target, up_for(target - position));
        camera.update_matrix_world(None);
        camera
    };

    let view = match *kind {
        LightKind::Directional { target } => {
            let e = shadow.camera_extent;
            let camera = aimed(Camera::orthographic(-e, e, e, -e, near, far), target);
            let matrix = bias_matrix() * camera.view_projection();
            ShadowView { cameras: vec![(camera, full)], matrix, size: (width, height) }
        }
        LightKind::Spot { target, angle, .. } => {
            let aspect = width as f32 / height.max(1) as f32;
            let camera = aimed(Camera::perspective((angle * 2.0).to_degrees(), aspect, near, far), target);
            let matrix = bias_matrix() * camera.view_projection();
            ShadowView { cameras: vec![(camera, full)], matrix, size: (width, height) }
        }
        LightKind::Point { .. } => {
            let cameras = CUBE_FACES
                .iter()
                .map(|&(direction, up, (cell_x, cell_y))| {
                    let mut camera = Camera::perspective(90.0, 1.0, near, far);
                    camera.set_position(position);
                    camera.look_at(position + Vec3::from(direction), Vec3::from(up));
                    camera.update_matrix_world(None);
                    let viewport = Viewport::new(cell_x * width as f32, cell_y * height as f32, width as f32, height as f32);
                    (camera, viewport)
                })
                .collect();
            ShadowView {
                cameras,
                matrix: Mat4::new_translation(&-position),
                size: (width * 4, height * 2),
            }
        }
        _ => return None,
    };
    Some(view)
}

/// Shadow pass state and depth materials
pub struct ShadowMap {
    /// Render shadow maps at all
    pub enabled: bool,
    /// Re-render every frame
    pub auto_update: bool,
    /// Re-render on the next frame even without `auto_update`
    pub needs_update: bool,
    /// Indexed by `morph_targets | skinning << 1`
    depth_materials: [Material; 4],
}

impl ShadowMap {
    /// Shadow pass with the given switches
    pub fn new(enabled: bool, auto_update: bool) -> Self {
        let variant = |morph_targets: bool, skinning: bool| {
            let mut material = Material::depth();
            material.name = "shadow depth".into();
            material.morph_targets = morph_targets;
            material.skinning = skinning;
            material
        };
        Self {
            enabled,
            auto_update,
            needs_update: false,
            depth_materials: [variant(false, false), variant(true, false), variant(false, true), variant(true, true)],
        }
    }

    fn depth_material(&self, source: &Material) -> &Material {
        let index = usize::from(source.morph_targets) | (usize::from(source.skinning) << 1);
        &self.depth_materials[index]
    }

    /// Render the depth map of every light in `shadows`
    pub fn render<B: GlBackend>(
        &mut self,
        direct: &mut DirectRenderer<B>,
        scene: &mut Scene,
        shadows: &[NodeId],
        clipping: &mut Clipping,
        lights: &LightState,
    ) -> RenderResult<()> {
        if !self.enabled || shadows.is_empty() || !(self.auto_update || self.needs_update) {
            return Ok(());
        }
        log::trace!("Shadow pass for {} lights", shadows.len());

        clipping.begin_shadows();
        direct.state.set_blending(&mut direct.backend, Blending::None, direct.premultiplied_alpha);
        direct.state.set_depth_test(&mut direct.backend, true);
        direct.state.set_depth_mask(&mut direct.backend, true);
        direct.state.set_color_mask(&mut direct.backend, true);
        direct.backend.set_clear_color([1.0, 1.0, 1.0, 1.0]);

        let result = self.render_lights(direct, scene, shadows, clipping, lights);
        clipping.end_shadows();
        self.needs_update = false;
        result
    }

    fn render_lights<B: GlBackend>(
        &self,
        direct: &mut DirectRenderer<B>,
        scene: &mut Scene,
        shadows: &[NodeId],
        clipping: &Clipping,
        lights: &LightState,
    ) -> RenderResult<()> {
        for &id in shadows {
            let Some(node) = scene.get_mut(id) else { continue };
            let position = node.matrix_world().position();
            let Some(light) = node.as_light_mut() else { continue };
            let Some(view) = shadow_view(&light.kind, position, &light.shadow) else {
                continue;
            };

            let stale = light
                .shadow
                .map
                .as_ref()
                .map_or(true, |map| (map.width, map.height) != view.size);
            if stale {
                let target = RenderTarget::depth(view.size.0, view.size.1);
                direct.backend.create_render_target(&target)?;
                if let Some(old) = light.shadow.map.replace(target) {
                    direct.backend.delete_render_target(old.id());
                }
            }
            light.shadow.matrix = view.matrix;
            let Some(target) = light.shadow.map.as_ref().map(RenderTarget::id) else {
                continue;
            };

            direct.backend.bind_framebuffer(Some(target));
            direct.backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH);

            for (camera, viewport) in &view.cameras {
                direct.state.set_viewport(&mut direct.backend, *viewport);
                let frame = FrameContext { camera, lights, fog: None, clipping };
                self.render_casters(direct, scene, &frame, &camera.frustum())?;
            }
        }
        Ok(())
    }

    /// Depth-render every visible shadow caster inside `frustum`
    fn render_casters<B: GlBackend>(
        &self,
        direct: &mut DirectRenderer<B>,
        scene: &Scene,
        frame: &FrameContext<'_>,
        frustum: &Frustum,
    ) -> RenderResult<()> {
        let mut stack = vec![scene.root()];
        while let Some(id) = stack.pop() {
            let Some(node) = scene.get(id) else { continue };
            if !node.visible {
                continue;
            }
            stack.extend(node.children().iter().rev());

            let NodeRole::Mesh(Mesh { geometry, material, .. }) = &node.role else {
                continue;
            };
            if !node.cast_shadow || !node.layers.test(frame.camera.layers) {
                continue;
            }
            let geometry = geometry.borrow();
            if geometry.is_empty() {
                continue;
            }
            if node.frustum_culled && !frustum.intersects_object(&geometry.bounding_sphere(), node.matrix_world()) {
                continue;
            }
            direct.geometries.update(&geometry, &mut direct.backend);

            match material {
                MaterialSlot::Single(material) => {
                    let material = material.borrow();
                    if material.visible {
                        let depth = self.depth_material(&material);
                        direct.render_buffer_direct(frame, node, &geometry, depth, None)?;
                    }
                }
                MaterialSlot::Multi(materials) => {
                    for group in geometry.groups() {
                        let Some(material) = materials.get(group.material_index) else {
                            continue;
                        };
                        let material = material.borrow();
                        if material.visible {
                            let depth = self.depth_material(&material);
                            direct.render_buffer_direct(frame, node, &geometry, depth, Some(group))?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
