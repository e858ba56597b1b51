//! Direct buffer rendering
//!
//! Turns one draw record into GPU calls: program and uniform binding, vertex
//! attribute setup, draw range resolution and the draw itself. Bindings are
//! diffed against the previous draw so consecutive records that share a
//! geometry and program only pay for their per-object uniforms.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::RenderResult;
use crate::foundation::math::Mat3;
use crate::geometry::{DrawRange, Geometry, GeometryGroup, GeometryId};
use crate::material::{Material, MaterialId};
use crate::render::{
    morph, Clipping, DrawMode, Extension, GeometryRegistry, GlBackend, GlState, LightState,
    MaterialProperties, ProgramCache, ProgramDescriptor, ProgramHandle, RenderInfo, TextureUnits,
};
use crate::scene::{Camera, CameraId, Fog, ImmediateObject, LineMode, Mesh, Node, NodeRole, TriangleDrawMode};
use crate::uniforms::{UniformName as N, UniformValue as V};

/// Scene-wide inputs of the draws of one pass
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Camera of the pass
    pub camera: &'a Camera,
    /// Aggregated lights
    pub lights: &'a LightState,
    /// Scene fog
    pub fog: Option<&'a Fog>,
    /// Clipping state
    pub clipping: &'a Clipping,
}

/// Element range of a draw after clamping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    /// First element
    pub start: u32,
    /// Number of elements
    pub count: u32,
}

/// Intersect the geometry draw range, the group range and the data size.
///
/// `factor` scales ranges expressed in triangles' elements to the buffer
/// actually drawn (2 for the wireframe line index).
pub fn compute_draw_range(range: DrawRange, group: Option<&GeometryGroup>, data_count: u32, factor: u32) -> ResolvedRange {
    let factor = u64::from(factor);
    let range_start = u64::from(range.start) * factor;
    let range_end = range
        .count
        .map_or(u64::MAX, |count| range_start + u64::from(count) * factor);
    let (group_start, group_end) = group.map_or((0, u64::MAX), |g| {
        let start = u64::from(g.start) * factor;
        (start, start + u64::from(g.count) * factor)
    });

    let start = range_start.max(group_start);
    let end = u64::from(data_count).min(range_end).min(group_end);
    let count = end.saturating_sub(start);
    ResolvedRange {
        start: u32::try_from(start).unwrap_or(u32::MAX),
        count: u32::try_from(count).unwrap_or(0),
    }
}

/// Primitive mode and line width of a node's draw
fn draw_mode(role: &NodeRole, material: &Material, wireframe: bool, pixel_ratio: f32) -> (DrawMode, Option<f32>) {
    match role {
        NodeRole::Mesh(_) if wireframe => (DrawMode::Lines, Some(material.wireframe_linewidth * pixel_ratio)),
        NodeRole::Mesh(mesh) => {
            let mode = match mesh.draw_mode {
                TriangleDrawMode::Triangles => DrawMode::Triangles,
                TriangleDrawMode::TriangleStrip => DrawMode::TriangleStrip,
                TriangleDrawMode::TriangleFan => DrawMode::TriangleFan,
            };
            (mode, None)
        }
        NodeRole::Line(line) => {
            let mode = match line.mode {
                LineMode::Segments => DrawMode::Lines,
                LineMode::Loop => DrawMode::LineLoop,
                LineMode::Strip => DrawMode::LineStrip,
            };
            (mode, Some(material.linewidth.unwrap_or(1.0) * pixel_ratio))
        }
        NodeRole::Points(_) => (DrawMode::Points, None),
        _ => (DrawMode::Triangles, None),
    }
}

/// GPU-facing half of the renderer: backend, caches and statistics
pub struct DirectRenderer<B: GlBackend> {
    pub(crate) backend: B,
    pub(crate) state: GlState,
    pub(crate) programs: ProgramCache,
    pub(crate) geometries: GeometryRegistry,
    pub(crate) textures: TextureUnits,
    pub(crate) info: RenderInfo,
    pub(crate) pixel_ratio: f32,
    pub(crate) premultiplied_alpha: bool,
    pub(crate) shadow_map_enabled: bool,
    pub(crate) max_morph_targets: usize,
    pub(crate) max_morph_normals: usize,
    properties: HashMap<MaterialId, MaterialProperties>,
    program_owner: HashMap<ProgramHandle, MaterialId>,
    current_program: Option<ProgramHandle>,
    current_material: Option<MaterialId>,
    current_camera: Option<CameraId>,
    current_signature: Option<(GeometryId, ProgramHandle, bool)>,
}

impl<B: GlBackend> DirectRenderer<B> {
    /// Renderer drawing through `backend`
    pub fn new(backend: B) -> Self {
        let textures = TextureUnits::new(backend.capabilities().max_textures);
        Self {
            backend,
            state: GlState::new(),
            programs: ProgramCache::new(),
            geometries: GeometryRegistry::new(),
            textures,
            info: RenderInfo::default(),
            pixel_ratio: 1.0,
            premultiplied_alpha: true,
            shadow_map_enabled: false,
            max_morph_targets: 8,
            max_morph_normals: 4,
            properties: HashMap::new(),
            program_owner: HashMap::new(),
            current_program: None,
            current_material: None,
            current_camera: None,
            current_signature: None,
        }
    }

    /// Backend in use
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Backend in use, mutable
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Forget the bindings of the previous frame
    pub fn begin_frame(&mut self) {
        self.current_program = None;
        self.current_material = None;
        self.current_camera = None;
        self.current_signature = None;
        self.geometries.begin_frame();
    }

    /// Drop every GPU-side cache (the context was restored)
    pub fn reset(&mut self) {
        self.state.reset();
        self.programs.clear();
        self.geometries.reset();
        self.properties.clear();
        self.program_owner.clear();
        self.begin_frame();
        self.info.memory = Default::default();
    }

    /// Release the GPU buffers of a geometry
    pub fn dispose_geometry(&mut self, geometry: GeometryId) {
        self.geometries.dispose(geometry, &mut self.backend);
        self.current_signature = None;
    }

    /// Release the program binding of a material
    pub fn dispose_material(&mut self, material: MaterialId) {
        if let Some(properties) = self.properties.remove(&material) {
            self.programs.release(properties.program, &mut self.backend);
            self.info.memory.programs = self.programs.len();
            self.program_owner.retain(|_, owner| *owner != material);
            if self.current_material == Some(material) {
                self.current_material = None;
            }
        }
    }

    /// Uniforms currently bound for `material`
    pub fn material_properties(&self, material: MaterialId) -> Option<&MaterialProperties> {
        self.properties.get(&material)
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: N, value: &V) {
        if let Some(location) = self.backend.uniform_location(program, name) {
            self.backend.set_uniform(location, value);
        }
    }

    /// Bind the program of `material` and bring its uniforms up to date
    pub fn set_program(&mut self, frame: &FrameContext<'_>, material: &Material, node: &Node) -> RenderResult<ProgramHandle> {
        self.textures.reset();

        let planes = frame.clipping.planes_for(material);
        let descriptor = ProgramDescriptor::for_material(
            material,
            &frame.lights.hash,
            frame.fog,
            planes.len(),
            self.shadow_map_enabled,
            self.backend.capabilities(),
        );

        let id = material.id();
        let properties = match self.properties.entry(id) {
            Entry::Occupied(entry) if entry.get().is_current(&descriptor, material.version()) => entry.into_mut(),
            entry => {
                let program = self.programs.acquire(&descriptor, &mut self.backend)?;
                let fresh = MaterialProperties::new(program, descriptor, material);
                self.program_owner.remove(&program);
                self.info.memory.programs = self.programs.len();
                match entry {
                    Entry::Occupied(mut entry) => {
                        let stale = entry.insert(fresh);
                        self.programs.release(stale.program, &mut self.backend);
                        self.info.memory.programs = self.programs.len();
                        entry.into_mut()
                    }
                    Entry::Vacant(entry) => entry.insert(fresh),
                }
            }
        };
        let program = properties.program;

        let mut refresh_program = false;
        let mut refresh_material = false;
        if self.current_program != Some(program) {
            self.backend.use_program(program);
            self.current_program = Some(program);
            refresh_program = true;
            refresh_material = true;
        }
        if self.current_material != Some(id) {
            self.current_material = Some(id);
            refresh_material = true;
        }
        let full_upload = self.program_owner.get(&program) != Some(&id);

        if refresh_material || full_upload {
            let uniforms = &mut properties.uniforms;
            if material.lights {
                frame.lights.refresh_uniforms(uniforms)?;
            }
            if material.fog {
                if let Some(fog) = frame.fog {
                    fog.refresh_uniforms(uniforms)?;
                }
            }
            material.refresh_uniforms(uniforms)?;
            if !planes.is_empty() {
                uniforms.set_if_present(N::ClippingPlanes, V::FloatArray(Clipping::pack(&planes)))?;
            }

            for uniform in uniforms.iter_mut() {
                if !(full_upload || uniform.needs_update() || uniform.value().is_sampler()) {
                    continue;
                }
                if let Some(location) = self.backend.uniform_location(program, uniform.name()) {
                    uniform.apply(location, &mut self.backend, &mut self.textures)?;
                }
            }
            self.program_owner.insert(program, id);
        }

        let camera = frame.camera;
        if refresh_program || self.current_camera != Some(camera.id()) {
            self.set_uniform(program, N::ProjectionMatrix, &V::Mat4(*camera.projection_matrix()));
            self.set_uniform(program, N::ViewMatrix, &V::Mat4(*camera.matrix_world_inverse()));
            self.set_uniform(program, N::CameraPosition, &V::Vec3(camera.world_position()));
            self.current_camera = Some(camera.id());
        }

        let world = node.matrix_world();
        let model_view = camera.matrix_world_inverse() * world;
        let normal_matrix = model_view
            .fixed_view::<3, 3>(0, 0)
            .into_owned()
            .try_inverse()
            .map_or_else(Mat3::identity, |inverse| inverse.transpose());
        self.set_uniform(program, N::ModelViewMatrix, &V::Mat4(model_view));
        self.set_uniform(program, N::NormalMatrix, &V::Mat3(normal_matrix));
        self.set_uniform(program, N::ModelMatrix, &V::Mat4(*world));

        if material.skinning {
            if let NodeRole::Mesh(Mesh { skeleton: Some(skeleton), .. }) = &node.role {
                self.set_uniform(program, N::BoneMatrices, &V::Mat4Array(skeleton.bone_matrices.clone()));
            }
        }

        Ok(program)
    }

    /// Draw `geometry` of `node` with `material`, limited to `group` if given
    pub fn render_buffer_direct(
        &mut self,
        frame: &FrameContext<'_>,
        node: &Node,
        geometry: &Geometry,
        material: &Material,
        group: Option<&GeometryGroup>,
    ) -> RenderResult<()> {
        self.state.set_material(&mut self.backend, material, self.premultiplied_alpha);
        let program = self.set_program(frame, material, node)?;

        let wireframe = material.wireframe;
        let influences = node.morph_target_influences();
        let signature = (geometry.id(), program, wireframe);
        let update_buffers = !influences.is_empty() || self.current_signature != Some(signature);
        self.current_signature = Some(signature);

        if material.morph_targets && !influences.is_empty() {
            let slots = morph::slot_count(material.morph_normals, self.max_morph_targets, self.max_morph_normals);
            let weights = morph::bind_morph_targets(&mut self.backend, geometry, influences, material.morph_normals, slots);
            self.set_uniform(program, N::MorphTargetInfluences, &V::FloatArray(weights));
        }

        let (index, data_count, factor) = if wireframe {
            let lines = self.geometries.wireframe_attribute(geometry, &mut self.backend);
            (Some(lines.id()), lines.count(), 2)
        } else if let Some(index) = geometry.index() {
            (Some(index.id()), index.count(), 1)
        } else {
            (None, geometry.attribute("position").map_or(0, |p| p.count()), 1)
        };

        if update_buffers {
            for (name, attribute) in geometry.attributes() {
                self.backend
                    .bind_vertex_attribute(name, attribute.id(), attribute.item_size, attribute.normalized);
            }
            if let Some(index) = index {
                self.backend.bind_index_buffer(index);
            }
        }

        let range = compute_draw_range(geometry.draw_range, group, data_count, factor);
        if range.count == 0 {
            return Ok(());
        }

        let (mode, line_width) = draw_mode(&node.role, material, wireframe, self.pixel_ratio);
        if let Some(width) = line_width {
            self.state.set_line_width(&mut self.backend, width);
        }

        match geometry.instance_count {
            Some(0) => {}
            Some(instances) => {
                if !self.backend.capabilities().has(Extension::AngleInstancedArrays) {
                    log::error!("Instanced draw of geometry {:?} needs instanced arrays support", geometry.id());
                    return Ok(());
                }
                if index.is_some() {
                    self.backend.draw_elements_instanced(mode, range.start, range.count, instances);
                } else {
                    self.backend.draw_arrays_instanced(mode, range.start, range.count, instances);
                }
                self.info.record_draw(mode, range.count, instances);
            }
            None => {
                if index.is_some() {
                    self.backend.draw_elements(mode, range.start, range.count);
                } else {
                    self.backend.draw_arrays(mode, range.start, range.count);
                }
                self.info.record_draw(mode, range.count, 1);
            }
        }
        Ok(())
    }

    /// Draw an immediate object from its own arrays
    pub fn render_buffer_immediate(
        &mut self,
        frame: &FrameContext<'_>,
        node: &Node,
        object: &ImmediateObject,
        material: &Material,
    ) -> RenderResult<()> {
        self.state.set_material(&mut self.backend, material, self.premultiplied_alpha);
        self.set_program(frame, material, node)?;
        self.current_signature = None;

        self.backend.upload_immediate_attribute("position", &object.positions, 3);
        if let Some(normals) = &object.normals {
            self.backend.upload_immediate_attribute("normal", normals, 3);
        }
        if let Some(uvs) = &object.uvs {
            self.backend.upload_immediate_attribute("uv", uvs, 2);
        }
        if let Some(colors) = &object.colors {
            self.backend.upload_immediate_attribute("color", colors, 3);
        }

        let count = object.count();
        self.backend.draw_arrays(DrawMode::Triangles, 0, count);
        self.info.record_draw(DrawMode::Triangles, count, 1);
        Ok(())
    }

    /// Drawing statistics
    pub fn info(&self) -> &RenderInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Color, Vec3};
    use crate::geometry::BufferAttribute;
    use crate::render::{GlCommand, RecordingBackend, UniformLocation};
    use crate::scene::Scene;

    struct Fixture {
        camera: Camera,
        lights: LightState,
        clipping: Clipping,
    }

    impl Fixture {
        fn new() -> Self {
            let mut camera = Camera::perspective(60.0, 1.0, 0.1, 100.0);
            camera.set_position(Vec3::new(0.0, 0.0, 5.0));
            camera.update_matrix_world(None);
            let mut clipping = Clipping::new();
            clipping.init(&[], false, &camera);
            Self { camera, lights: LightState::default(), clipping }
        }

        fn frame(&self) -> FrameContext<'_> {
            FrameContext { camera: &self.camera, lights: &self.lights, fog: None, clipping: &self.clipping }
        }
    }

    fn node_for(scene: &mut Scene, node: Node) -> Node {
        let id = scene.add(node);
        scene.update_matrix_world(false);
        scene.get(id).cloned().unwrap()
    }

    fn triangles(count: usize) -> Geometry {
        let mut geometry = Geometry::new();
        geometry.set_attribute("position", BufferAttribute::from_f32(vec![0.0; count * 9], 3));
        geometry
    }

    #[test]
    fn test_draw_range_intersects_group() {
        let range = DrawRange { start: 0, count: Some(6) };
        let group = GeometryGroup { start: 3, count: 6, material_index: 0 };
        assert_eq!(compute_draw_range(range, Some(&group), 9, 1), ResolvedRange { start: 3, count: 3 });
    }

    #[test]
    fn test_draw_range_unbounded_uses_data_count() {
        let range = DrawRange::default();
        assert_eq!(compute_draw_range(range, None, 36, 1), ResolvedRange { start: 0, count: 36 });
        assert_eq!(compute_draw_range(range, None, 72, 2), ResolvedRange { start: 0, count: 72 });
    }

    #[test]
    fn test_draw_range_wireframe_factor() {
        let range = DrawRange { start: 1, count: Some(2) };
        assert_eq!(compute_draw_range(range, None, 100, 2), ResolvedRange { start: 2, count: 4 });
    }

    #[test]
    fn test_draw_range_disjoint_is_empty() {
        let range = DrawRange { start: 10, count: None };
        let group = GeometryGroup { start: 0, count: 6, material_index: 0 };
        assert_eq!(compute_draw_range(range, Some(&group), 36, 1).count, 0);
    }

    #[test]
    fn test_mesh_draw_uploads_and_counts() {
        let fixture = Fixture::new();
        let mut scene = Scene::new();
        let geometry = triangles(2);
        let material = Material::basic(Color::WHITE);
        let node = node_for(&mut scene, Node::mesh(geometry.clone(), material.clone()));

        let mut direct = DirectRenderer::new(RecordingBackend::new());
        direct.render_buffer_direct(&fixture.frame(), &node, &geometry, &material, None).unwrap();

        assert_eq!(
            direct.backend().draw_calls(),
            vec![&GlCommand::DrawArrays { mode: DrawMode::Triangles, start: 0, count: 6 }]
        );
        assert_eq!(direct.info().render.calls, 1);
        assert_eq!(direct.info().render.faces, 2);
        assert_eq!(direct.info().memory.programs, 1);
    }

    #[test]
    fn test_zero_range_issues_no_draw() {
        let fixture = Fixture::new();
        let mut scene = Scene::new();
        let mut geometry = triangles(1);
        geometry.set_draw_range(0, Some(0));
        let material = Material::basic(Color::WHITE);
        let node = node_for(&mut scene, Node::mesh(geometry.clone(), material.clone()));

        let mut direct = DirectRenderer::new(RecordingBackend::new());
        direct.render_buffer_direct(&fixture.frame(), &node, &geometry, &material, None).unwrap();
        assert!(direct.backend().draw_calls().is_empty());
        assert_eq!(direct.info().render.calls, 0);
    }

    #[test]
    fn test_same_signature_skips_attribute_setup() {
        let fixture = Fixture::new();
        let mut scene = Scene::new();
        let geometry = triangles(1);
        let material = Material::basic(Color::WHITE);
        let node = node_for(&mut scene, Node::mesh(geometry.clone(), material.clone()));

        let mut direct = DirectRenderer::new(RecordingBackend::new());
        direct.render_buffer_direct(&fixture.frame(), &node, &geometry, &material, None).unwrap();
        direct.render_buffer_direct(&fixture.frame(), &node, &geometry, &material, None).unwrap();

        let binds = direct
            .backend()
            .commands()
            .iter()
            .filter(|c| matches!(c, GlCommand::VertexAttribute { .. }))
            .count();
        assert_eq!(binds, 1);
        assert_eq!(direct.backend().draw_calls().len(), 2);
    }

    #[test]
    fn test_wireframe_draws_lines() {
        let fixture = Fixture::new();
        let mut scene = Scene::new();
        let geometry = Geometry::cube(1.0);
        let mut material = Material::basic(Color::WHITE).with_wireframe(true);
        material.wireframe_linewidth = 2.0;
        let node = node_for(&mut scene, Node::mesh(geometry.clone(), material.clone()));

        let mut direct = DirectRenderer::new(RecordingBackend::new());
        direct.pixel_ratio = 2.0;
        direct.render_buffer_direct(&fixture.frame(), &node, &geometry, &material, None).unwrap();

        let commands = direct.backend().commands();
        assert!(commands.contains(&GlCommand::LineWidth(4.0)));
        assert_eq!(
            direct.backend().draw_calls(),
            vec![&GlCommand::DrawElements { mode: DrawMode::Lines, start: 0, count: 72 }]
        );
    }

    #[test]
    fn test_wireframe_index_applies_to_points() {
        let fixture = Fixture::new();
        let mut scene = Scene::new();
        let geometry = triangles(1);
        let material = Material::points(Color::WHITE, 1.0).with_wireframe(true);
        let node = node_for(&mut scene, Node::points(geometry.clone(), material.clone()));

        let mut direct = DirectRenderer::new(RecordingBackend::new());
        direct.render_buffer_direct(&fixture.frame(), &node, &geometry, &material, None).unwrap();
        assert_eq!(
            direct.backend().draw_calls(),
            vec![&GlCommand::DrawElements { mode: DrawMode::Points, start: 0, count: 6 }]
        );
    }

    #[test]
    fn test_morph_influences_rebind_attributes_every_draw() {
        let fixture = Fixture::new();
        let mut scene = Scene::new();
        let geometry = triangles(1);
        let material = Material::basic(Color::WHITE);
        assert!(!material.morph_targets);
        let mut mesh = Node::mesh(geometry.clone(), material.clone());
        if let NodeRole::Mesh(inner) = &mut mesh.role {
            inner.morph_target_influences = vec![0.5];
        }
        let node = node_for(&mut scene, mesh);

        let mut direct = DirectRenderer::new(RecordingBackend::new());
        direct.render_buffer_direct(&fixture.frame(), &node, &geometry, &material, None).unwrap();
        direct.render_buffer_direct(&fixture.frame(), &node, &geometry, &material, None).unwrap();

        let position_binds = direct
            .backend()
            .commands()
            .iter()
            .filter(|c| matches!(c, GlCommand::VertexAttribute { name, .. } if name == "position"))
            .count();
        assert_eq!(position_binds, 2);
        assert!(!direct
            .backend()
            .commands()
            .iter()
            .any(|c| matches!(c, GlCommand::SetUniform(location, _) if *location == UniformLocation(N::MorphTargetInfluences as u32))));
    }

    #[test]
    fn test_line_modes_and_default_width() {
        let fixture = Fixture::new();
        let mut scene = Scene::new();
        let geometry = triangles(1);
        let material = Material::line_basic(Color::WHITE);
        let node = node_for(&mut scene, Node::line(geometry.clone(), material.clone(), LineMode::Loop));

        let mut direct = DirectRenderer::new(RecordingBackend::new());
        direct.render_buffer_direct(&fixture.frame(), &node, &geometry, &material, None).unwrap();
        assert!(direct.backend().commands().contains(&GlCommand::LineWidth(1.0)));
        assert_eq!(
            direct.backend().draw_calls(),
            vec![&GlCommand::DrawArrays { mode: DrawMode::LineLoop, start: 0, count: 3 }]
        );
    }

    #[test]
    fn test_instanced_draws() {
        let fixture = Fixture::new();
        let mut scene = Scene::new();
        let mut geometry = triangles(1);
        geometry.instance_count = Some(4);
        let material = Material::basic(Color::WHITE);
        let node = node_for(&mut scene, Node::mesh(geometry.clone(), material.clone()));

        let mut direct = DirectRenderer::new(RecordingBackend::new());
        direct.render_buffer_direct(&fixture.frame(), &node, &geometry, &material, None).unwrap();
        assert_eq!(
            direct.backend().draw_calls(),
            vec![&GlCommand::DrawArraysInstanced { mode: DrawMode::Triangles, start: 0, count: 3, instances: 4 }]
        );
        assert_eq!(direct.info().render.vertices, 12);

        geometry.instance_count = Some(0);
        direct.backend_mut().clear_commands();
        direct.render_buffer_direct(&fixture.frame(), &node, &geometry, &material, None).unwrap();
        assert!(direct.backend().draw_calls().is_empty());
    }

    #[test]
    fn test_shared_program_full_upload_on_owner_change() {
        let fixture = Fixture::new();
        let mut scene = Scene::new();
        let geometry = triangles(1);
        let red = Material::basic(Color::new(1.0, 0.0, 0.0));
        let blue = Material::basic(Color::new(0.0, 0.0, 1.0));
        let node = node_for(&mut scene, Node::mesh(geometry.clone(), red.clone()));

        let mut direct = DirectRenderer::new(RecordingBackend::new());
        let frame = fixture.frame();
        direct.render_buffer_direct(&frame, &node, &geometry, &red, None).unwrap();
        direct.render_buffer_direct(&frame, &node, &geometry, &blue, None).unwrap();
        direct.backend_mut().clear_commands();
        direct.render_buffer_direct(&frame, &node, &geometry, &red, None).unwrap();

        let diffuse = UniformLocation(N::Diffuse as u32);
        assert!(direct
            .backend()
            .commands()
            .contains(&GlCommand::SetUniform(diffuse, V::Color(Color::new(1.0, 0.0, 0.0)))));
        assert_eq!(direct.info().memory.programs, 1);
    }

    #[test]
    fn test_version_bump_relinks_material() {
        let fixture = Fixture::new();
        let mut scene = Scene::new();
        let geometry = triangles(1);
        let mut material = Material::basic(Color::WHITE);
        let node = node_for(&mut scene, Node::mesh(geometry.clone(), material.clone()));

        let mut direct = DirectRenderer::new(RecordingBackend::new());
        direct.render_buffer_direct(&fixture.frame(), &node, &geometry, &material, None).unwrap();
        let first = direct.material_properties(material.id()).map(|p| p.version);
        material.needs_update();
        direct.render_buffer_direct(&fixture.frame(), &node, &geometry, &material, None).unwrap();

        assert_eq!(first, Some(0));
        assert_eq!(direct.material_properties(material.id()).map(|p| p.version), Some(1));
        assert_eq!(direct.info().memory.programs, 1);
    }

    #[test]
    fn test_immediate_object_draws_arrays() {
        let fixture = Fixture::new();
        let mut scene = Scene::new();
        let object = ImmediateObject {
            material: Material::basic(Color::WHITE).into(),
            positions: vec![0.0; 18],
            normals: Some(vec![0.0; 18]),
            uvs: None,
            colors: None,
        };
        let material = object.material.borrow().clone();
        let node = node_for(&mut scene, Node::new(NodeRole::ImmediateRenderObject(object.clone())));

        let mut direct = DirectRenderer::new(RecordingBackend::new());
        direct.render_buffer_immediate(&fixture.frame(), &node, &object, &material).unwrap();
        let commands = direct.backend().commands();
        assert!(commands.contains(&GlCommand::ImmediateAttribute { name: "normal".into(), count: 6 }));
        assert_eq!(
            direct.backend().draw_calls(),
            vec![&GlCommand::DrawArrays { mode: DrawMode::Triangles, start: 0, count: 6 }]
        );
    }

    #[test]
    fn test_texture_units_exhaustion_is_an_error() {
        let fixture = Fixture::new();
        let mut scene = Scene::new();
        let geometry = triangles(1);
        let material = Material::lambert(Color::WHITE);
        let node = node_for(&mut scene, Node::mesh(geometry.clone(), material.clone()));

        let caps = crate::render::Capabilities { max_textures: 1, ..Default::default() };
        let mut direct = DirectRenderer::new(RecordingBackend::with_capabilities(caps));
        let result = direct.render_buffer_direct(&fixture.frame(), &node, &geometry, &material, None);
        assert!(matches!(result, Err(crate::error::RenderError::TextureUnitsExceeded { .. })));
    }
}
