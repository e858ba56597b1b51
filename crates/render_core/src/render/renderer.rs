//! Frame controller
//!
//! [`Renderer`] owns every per-context cache and drives one frame: matrix
//! updates, projection into a render list, sorting, the shadow pass, light
//! setup and the opaque and transparent dispatch, followed by any registered
//! extension passes.

use std::collections::HashSet;

use crate::config::RendererConfig;
use crate::error::RenderResult;
use crate::geometry::GeometryId;
use crate::material::{Material, MaterialId, SharedMaterial};
use crate::render::{
    project_scene, ClearFlags, Clipping, DirectRenderer, DrawRecord, FrameContext, GlBackend, LightState,
    RenderInfo, RenderList, RenderLists, RenderTarget, RenderTargetId, ShadowMap, Viewport,
};
use crate::scene::{Camera, Node, NodeId, NodeRole, Plane, Scene};

/// What an extension pass gets to see of the frame
#[derive(Debug, Clone, Copy)]
pub struct ExtensionFrame<'a> {
    /// Scene being rendered
    pub scene: &'a Scene,
    /// Camera of the frame
    pub camera: &'a Camera,
    /// Sprites that survived culling
    pub sprites: &'a [NodeId],
    /// Lens flares in the scene
    pub flares: &'a [NodeId],
    /// Viewport of the bound framebuffer
    pub viewport: Viewport,
}

/// Pass run after the transparent objects, e.g. sprites or lens flares
pub trait ExtensionPass {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Draw into the currently bound framebuffer
    fn render(&mut self, frame: &ExtensionFrame<'_>, backend: &mut dyn GlBackend) -> RenderResult<()>;
}

/// Scene renderer bound to one GPU backend
pub struct Renderer<B: GlBackend> {
    direct: DirectRenderer<B>,
    config: RendererConfig,
    render_lists: RenderLists,
    shadow_map: ShadowMap,
    light_state: LightState,
    clipping: Clipping,
    clipping_planes: Vec<Plane>,
    clipping_enabled: bool,
    extension_passes: Vec<Box<dyn ExtensionPass>>,
    viewport: Viewport,
    scissor: Viewport,
    scissor_test: bool,
    current_framebuffer: Option<Option<RenderTargetId>>,
    created_targets: HashSet<RenderTargetId>,
}

impl<B: GlBackend> Renderer<B> {
    /// Create a renderer drawing through `backend`
    pub fn new(backend: B, config: RendererConfig) -> Self {
        let capabilities = backend.capabilities();
        log::info!(
            "Creating renderer: {} texture units, {:?} precision, shadows {}",
            capabilities.max_textures,
            capabilities.precision,
            if config.shadow_map.enabled { "on" } else { "off" }
        );

        let mut direct = DirectRenderer::new(backend);
        direct.pixel_ratio = config.pixel_ratio;
        direct.premultiplied_alpha = config.premultiplied_alpha;
        direct.shadow_map_enabled = config.shadow_map.enabled;
        direct.max_morph_targets = config.max_morph_targets;
        direct.max_morph_normals = config.max_morph_normals;

        let empty = Viewport::new(0.0, 0.0, 0.0, 0.0);
        Self {
            direct,
            shadow_map: ShadowMap::new(config.shadow_map.enabled, config.shadow_map.auto_update),
            config,
            render_lists: RenderLists::new(),
            light_state: LightState::default(),
            clipping: Clipping::new(),
            clipping_planes: Vec::new(),
            clipping_enabled: false,
            extension_passes: Vec::new(),
            viewport: empty,
            scissor: empty,
            scissor_test: false,
            current_framebuffer: None,
            created_targets: HashSet::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Backend in use
    pub fn backend(&self) -> &B {
        self.direct.backend()
    }

    /// Backend in use, mutable
    pub fn backend_mut(&mut self) -> &mut B {
        self.direct.backend_mut()
    }

    /// Frame and memory statistics
    pub fn info(&self) -> &RenderInfo {
        self.direct.info()
    }

    /// Lights aggregated by the last frame
    pub fn light_state(&self) -> &LightState {
        &self.light_state
    }

    /// Render list the last frame of `scene` seen by `camera` produced
    pub fn render_list(&self, scene: &Scene, camera: &Camera) -> Option<&RenderList> {
        self.render_lists.peek(scene.id(), camera.id())
    }

    /// Shadow pass switches
    pub fn shadow_map_mut(&mut self) -> &mut ShadowMap {
        &mut self.shadow_map
    }

    /// Toggle depth sorting
    pub fn set_sort_objects(&mut self, sort: bool) {
        self.config.sort_objects = sort;
    }

    /// Color used by clears
    pub fn set_clear_color(&mut self, rgba: [f32; 4]) {
        self.config.clear_color = rgba;
    }

    /// Planes clipping every draw, in world space
    pub fn set_clipping_planes(&mut self, planes: Vec<Plane>) {
        self.clipping_planes = planes;
    }

    /// Whether the last frame had any clipping active
    pub fn clipping_enabled(&self) -> bool {
        self.clipping_enabled
    }

    /// Device pixel ratio, applied to the default framebuffer and line widths
    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        self.config.pixel_ratio = ratio;
        self.direct.pixel_ratio = ratio;
    }

    /// Resize the default framebuffer's viewport and scissor
    pub fn set_size(&mut self, width: u32, height: u32) {
        let full = Viewport::new(0.0, 0.0, width as f32, height as f32);
        self.viewport = full;
        self.scissor = full;
    }

    /// Viewport of the default framebuffer, in CSS pixels
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Scissor rectangle of the default framebuffer, in CSS pixels
    pub fn set_scissor(&mut self, scissor: Viewport) {
        self.scissor = scissor;
    }

    /// Enable the scissor test on the default framebuffer
    pub fn set_scissor_test(&mut self, enabled: bool) {
        self.scissor_test = enabled;
    }

    /// Register a pass to run after the transparent objects
    pub fn add_extension_pass(&mut self, pass: Box<dyn ExtensionPass>) {
        log::debug!("Registered extension pass '{}'", pass.name());
        self.extension_passes.push(pass);
    }

    /// Next free texture unit for the program being bound
    pub fn alloc_texture_unit(&mut self) -> RenderResult<u32> {
        self.direct.textures.allocate()
    }

    /// Clear the selected buffers of the bound framebuffer
    pub fn clear(&mut self, color: bool, depth: bool, stencil: bool) {
        let flags = ClearFlags::from_selection(color, depth, stencil);
        if flags.is_empty() {
            return;
        }
        self.direct.backend.set_clear_color(self.config.clear_color);
        self.direct.backend.clear(flags);
    }

    /// Bind `target`, or the default framebuffer for `None`
    pub fn set_render_target(&mut self, target: Option<&RenderTarget>) -> RenderResult<()> {
        let id = target.map(RenderTarget::id);
        if let Some(target) = target {
            if self.created_targets.insert(target.id()) {
                self.direct.backend.create_render_target(target)?;
            }
        }
        if self.current_framebuffer != Some(id) {
            self.direct.backend.bind_framebuffer(id);
            self.current_framebuffer = Some(id);
        }

        let (viewport, scissor, scissor_test) = match target {
            Some(target) => (target.viewport, target.scissor, target.scissor_test),
            None => {
                let ratio = self.direct.pixel_ratio;
                (self.viewport.scaled(ratio), self.scissor.scaled(ratio), self.scissor_test)
            }
        };
        let direct = &mut self.direct;
        direct.state.set_viewport(&mut direct.backend, viewport);
        direct.state.set_scissor(&mut direct.backend, scissor);
        direct.state.set_scissor_test(&mut direct.backend, scissor_test);
        Ok(())
    }

    /// The backend lost its context; frames are skipped until it is restored
    pub fn on_context_lost(&mut self) {
        log::warn!("GPU context lost");
    }

    /// Forget every GPU object so the next frame recreates them
    pub fn on_context_restored(&mut self) {
        log::info!("GPU context restored, dropping cached GPU objects");
        self.direct.reset();
        self.render_lists.dispose();
        self.created_targets.clear();
        self.current_framebuffer = None;
        self.shadow_map.needs_update = true;
    }

    /// Release the GPU buffers of a geometry
    pub fn dispose_geometry(&mut self, geometry: GeometryId) {
        self.direct.dispose_geometry(geometry);
        self.direct.info.memory.geometries = self.direct.geometries.geometry_count();
    }

    /// Release the program binding of a material
    pub fn dispose_material(&mut self, material: MaterialId) {
        self.direct.dispose_material(material);
    }

    /// Render one frame of `scene` seen through `camera`.
    ///
    /// Draws into `target`, or the default framebuffer when `None`. Clears
    /// first when `auto_clear` is configured or `force_clear` is set. Running
    /// out of texture units aborts the frame with an error.
    pub fn render(
        &mut self,
        scene: &mut Scene,
        camera: &mut Camera,
        target: Option<&RenderTarget>,
        force_clear: bool,
    ) -> RenderResult<()> {
        if self.direct.backend.is_context_lost() {
            log::debug!("Skipping frame: GPU context is lost");
            return Ok(());
        }

        self.direct.begin_frame();

        if scene.auto_update {
            scene.update_matrix_world(false);
        }
        let parent_world = camera.parent.and_then(|parent| scene.world_matrix(parent));
        camera.update_matrix_world(parent_world.as_ref());

        // The list is moved out of the cache for the frame so `self` stays free.
        let mut list = std::mem::take(self.render_lists.get(scene.id(), camera.id()));
        let result = self.render_list_frame(scene, camera, &mut list, target, force_clear);
        *self.render_lists.get(scene.id(), camera.id()) = list;
        result
    }

    fn render_list_frame(
        &mut self,
        scene: &mut Scene,
        camera: &Camera,
        list: &mut RenderList,
        target: Option<&RenderTarget>,
        force_clear: bool,
    ) -> RenderResult<()> {
        list.init();
        self.clipping_enabled = self.clipping.init(&self.clipping_planes, self.config.local_clipping_enabled, camera);

        project_scene(scene, camera, list, &mut self.direct.geometries, &mut self.direct.backend);
        self.direct.info.memory.geometries = self.direct.geometries.geometry_count();

        if let Some(material) = &scene.override_material {
            list.repartition(material.borrow().transparent);
        }
        if self.config.sort_objects {
            list.sort();
        }

        if !list.shadows.is_empty() {
            self.shadow_map.render(&mut self.direct, scene, &list.shadows, &mut self.clipping, &self.light_state)?;
            self.current_framebuffer = None;
        }
        self.light_state.setup(&list.lights, scene, camera);

        self.direct.info.begin_frame();
        log::trace!(
            "Frame {}: {} opaque, {} transparent",
            self.direct.info.render.frame,
            list.opaque.len(),
            list.transparent.len()
        );

        self.set_render_target(target)?;
        if self.config.auto_clear || force_clear {
            self.clear(self.config.auto_clear_color, self.config.auto_clear_depth, self.config.auto_clear_stencil);
        }

        let scene: &Scene = scene;
        let frame = FrameContext {
            camera,
            lights: &self.light_state,
            fog: scene.fog.as_ref(),
            clipping: &self.clipping,
        };
        let override_material = scene.override_material.as_ref();
        render_objects(&mut self.direct, &frame, scene, &list.opaque, override_material)?;
        render_objects(&mut self.direct, &frame, scene, &list.transparent, override_material)?;

        if !self.extension_passes.is_empty() {
            let extension = ExtensionFrame {
                scene,
                camera,
                sprites: &list.sprites,
                flares: &list.flares,
                viewport: target.map_or_else(|| self.viewport.scaled(self.direct.pixel_ratio), |t| t.viewport),
            };
            for pass in &mut self.extension_passes {
                pass.render(&extension, &mut self.direct.backend)?;
            }
            // Passes talk to the backend directly.
            self.direct.state.reset();
        }

        if let Some(target) = target.filter(|t| t.generates_mipmaps()) {
            self.direct.backend.generate_mipmaps(target.id());
        }

        let direct = &mut self.direct;
        direct.state.set_depth_test(&mut direct.backend, true);
        direct.state.set_depth_mask(&mut direct.backend, true);
        direct.state.set_color_mask(&mut direct.backend, true);
        Ok(())
    }
}

/// Dispatch `records` in order, with `override_material` replacing each record's material
fn render_objects<B: GlBackend>(
    direct: &mut DirectRenderer<B>,
    frame: &FrameContext<'_>,
    scene: &Scene,
    records: &[DrawRecord],
    override_material: Option<&SharedMaterial>,
) -> RenderResult<()> {
    for record in records {
        let Some(node) = scene.get(record.node) else { continue };
        let material = override_material.unwrap_or(&record.material).borrow();
        render_object(direct, frame, node, record, &material)?;
    }
    Ok(())
}

fn render_object<B: GlBackend>(
    direct: &mut DirectRenderer<B>,
    frame: &FrameContext<'_>,
    node: &Node,
    record: &DrawRecord,
    material: &Material,
) -> RenderResult<()> {
    match (&record.geometry, &node.role) {
        (Some(geometry), _) => {
            direct.render_buffer_direct(frame, node, &geometry.borrow(), material, record.group.as_ref())
        }
        (None, NodeRole::ImmediateRenderObject(object)) => direct.render_buffer_immediate(frame, node, object, material),
        (None, _) => Ok(()),
    }
}
