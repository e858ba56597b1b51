//! Scene nodes
//!
//! A [`Node`] is a transformable element of the scene tree. What it contributes
//! to a frame is decided by its [`NodeRole`]: plain groups only carry a
//! transform, drawable roles carry geometry and materials, lights feed the
//! light setup, and sprites and lens flares are handed to extension passes.

use crate::foundation::math::{Color, Mat4, Transform};
use crate::geometry::SharedGeometry;
use crate::material::{Material, SharedMaterial, TextureRef};
use crate::scene::{Layers, Light};

slotmap::new_key_type! {
    /// Key of a node in the scene arena
    pub struct NodeId;
}

/// Primitive assembly of a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriangleDrawMode {
    /// Independent triangles
    #[default]
    Triangles,
    /// Triangle strip
    TriangleStrip,
    /// Triangle fan
    TriangleFan,
}

/// Primitive assembly of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineMode {
    /// Connected polyline
    #[default]
    Strip,
    /// Closed polyline
    Loop,
    /// Independent segments
    Segments,
}

/// One material, or one per geometry group
#[derive(Debug, Clone)]
pub enum MaterialSlot {
    /// Used for the whole geometry
    Single(SharedMaterial),
    /// Indexed by each geometry group's `material_index`
    Multi(Vec<SharedMaterial>),
}

impl From<SharedMaterial> for MaterialSlot {
    fn from(material: SharedMaterial) -> Self {
        Self::Single(material)
    }
}

impl From<Material> for MaterialSlot {
    fn from(material: Material) -> Self {
        Self::Single(material.into())
    }
}

impl From<Vec<SharedMaterial>> for MaterialSlot {
    fn from(materials: Vec<SharedMaterial>) -> Self {
        Self::Multi(materials)
    }
}

/// Bones of a skinned mesh
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    /// Bone nodes
    pub bones: Vec<NodeId>,
    /// Inverse bind matrix of each bone
    pub bone_inverses: Vec<Mat4>,
    /// Bone world × bone inverse, refreshed once per frame
    pub bone_matrices: Vec<Mat4>,
}

impl Skeleton {
    /// Skeleton with one inverse bind matrix per bone
    pub fn new(bones: Vec<NodeId>, bone_inverses: Vec<Mat4>) -> Self {
        let bone_matrices = vec![Mat4::identity(); bones.len()];
        Self { bones, bone_inverses, bone_matrices }
    }

    /// Recompute bone matrices from the bones' world matrices
    pub fn update(&mut self, bone_worlds: &[Mat4]) {
        self.bone_matrices = bone_worlds
            .iter()
            .zip(&self.bone_inverses)
            .map(|(world, inverse)| world * inverse)
            .collect();
    }
}

/// Triangle geometry
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Shared geometry
    pub geometry: SharedGeometry,
    /// Material or material array
    pub material: MaterialSlot,
    /// Primitive assembly
    pub draw_mode: TriangleDrawMode,
    /// Bones, for skinned meshes
    pub skeleton: Option<Skeleton>,
    /// Weights of the geometry's morph targets
    pub morph_target_influences: Vec<f32>,
}

/// Line geometry
#[derive(Debug, Clone)]
pub struct Line {
    /// Shared geometry
    pub geometry: SharedGeometry,
    /// Material or material array
    pub material: MaterialSlot,
    /// Primitive assembly
    pub mode: LineMode,
}

/// Point cloud
#[derive(Debug, Clone)]
pub struct Points {
    /// Shared geometry
    pub geometry: SharedGeometry,
    /// Material or material array
    pub material: MaterialSlot,
}

/// Camera-facing quad
#[derive(Debug, Clone)]
pub struct Sprite {
    /// Sprite material
    pub material: SharedMaterial,
}

/// One element of a lens flare
#[derive(Debug, Clone)]
pub struct FlareElement {
    /// Flare texture
    pub texture: Option<TextureRef>,
    /// Size in pixels
    pub size: f32,
    /// Position along the flare line, 0 at the source and 1 at the screen center
    pub distance: f32,
    /// Tint
    pub color: Color,
}

/// Lens flare anchored at the node position
#[derive(Debug, Clone, Default)]
pub struct LensFlare {
    /// Flare elements
    pub elements: Vec<FlareElement>,
}

/// Geometry supplied as plain arrays each frame
#[derive(Debug, Clone)]
pub struct ImmediateObject {
    /// Material
    pub material: SharedMaterial,
    /// xyz triples
    pub positions: Vec<f32>,
    /// xyz triples
    pub normals: Option<Vec<f32>>,
    /// uv pairs
    pub uvs: Option<Vec<f32>>,
    /// rgb triples
    pub colors: Option<Vec<f32>>,
}

impl ImmediateObject {
    /// Number of vertices
    pub fn count(&self) -> u32 {
        u32::try_from(self.positions.len() / 3).unwrap_or(u32::MAX)
    }
}

/// What a node contributes to a frame
#[derive(Debug, Clone)]
pub enum NodeRole {
    /// Transform only
    Group,
    /// Triangle geometry
    Mesh(Mesh),
    /// Line geometry
    Line(Line),
    /// Point cloud
    Points(Points),
    /// Camera-facing quad
    Sprite(Sprite),
    /// Light source
    Light(Light),
    /// Geometry supplied as plain arrays
    ImmediateRenderObject(ImmediateObject),
    /// Lens flare
    LensFlare(LensFlare),
}

/// Element of the scene tree
#[derive(Debug, Clone)]
pub struct Node {
    /// Debug name
    pub name: String,
    /// Local transform
    pub transform: Transform,
    /// Invisible nodes hide their whole subtree
    pub visible: bool,
    /// Test against the camera frustum before drawing
    pub frustum_culled: bool,
    /// Layer mask
    pub layers: Layers,
    /// Rendered into shadow maps
    pub cast_shadow: bool,
    /// Samples shadow maps
    pub receive_shadow: bool,
    /// Rebuild the local matrix from `transform` on every world update
    pub matrix_auto_update: bool,
    /// Role payload
    pub role: NodeRole,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    matrix: Mat4,
    matrix_world: Mat4,
    matrix_world_needs_update: bool,
}

impl Node {
    /// Node with the given role and an identity transform
    pub fn new(role: NodeRole) -> Self {
        Self {
            name: String::new(),
            transform: Transform::default(),
            visible: true,
            frustum_culled: true,
            layers: Layers::default(),
            cast_shadow: false,
            receive_shadow: false,
            matrix_auto_update: true,
            role,
            parent: None,
            children: Vec::new(),
            matrix: Mat4::identity(),
            matrix_world: Mat4::identity(),
            matrix_world_needs_update: false,
        }
    }

    /// Transform-only node
    pub fn group() -> Self {
        Self::new(NodeRole::Group)
    }

    /// Mesh node
    pub fn mesh(geometry: impl Into<SharedGeometry>, material: impl Into<MaterialSlot>) -> Self {
        Self::new(NodeRole::Mesh(Mesh {
            geometry: geometry.into(),
            material: material.into(),
            draw_mode: TriangleDrawMode::Triangles,
            skeleton: None,
            morph_target_influences: Vec::new(),
        }))
    }

    /// Line node
    pub fn line(
        geometry: impl Into<SharedGeometry>,
        material: impl Into<MaterialSlot>,
        mode: LineMode,
    ) -> Self {
        Self::new(NodeRole::Line(Line {
            geometry: geometry.into(),
            material: material.into(),
            mode,
        }))
    }

    /// Point cloud node
    pub fn points(geometry: impl Into<SharedGeometry>, material: impl Into<MaterialSlot>) -> Self {
        Self::new(NodeRole::Points(Points {
            geometry: geometry.into(),
            material: material.into(),
        }))
    }

    /// Sprite node
    pub fn sprite(material: impl Into<SharedMaterial>) -> Self {
        Self::new(NodeRole::Sprite(Sprite { material: material.into() }))
    }

    /// Light node
    pub fn light(light: Light) -> Self {
        Self::new(NodeRole::Light(light))
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the local position
    pub fn with_position(mut self, position: crate::foundation::math::Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Set the visibility flag
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set the shadow casting flag
    pub fn with_cast_shadow(mut self, cast_shadow: bool) -> Self {
        self.cast_shadow = cast_shadow;
        self
    }

    /// Parent node, `None` for the scene root and detached nodes
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Local matrix
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// World matrix as of the last world update
    pub fn matrix_world(&self) -> &Mat4 {
        &self.matrix_world
    }

    /// Rebuild the local matrix from the transform
    pub fn update_matrix(&mut self) {
        self.matrix = self.transform.to_matrix();
        self.matrix_world_needs_update = true;
    }

    /// Set the local matrix directly (for nodes with `matrix_auto_update` off)
    pub fn set_matrix(&mut self, matrix: Mat4) {
        self.matrix = matrix;
        self.matrix_world_needs_update = true;
    }

    pub(crate) fn world_needs_update(&self) -> bool {
        self.matrix_world_needs_update
    }

    pub(crate) fn set_matrix_world(&mut self, world: Mat4) {
        self.matrix_world = world;
        self.matrix_world_needs_update = false;
    }

    /// Material of roles with a single material
    pub fn material(&self) -> Option<&SharedMaterial> {
        match &self.role {
            NodeRole::Mesh(Mesh { material: MaterialSlot::Single(m), .. })
            | NodeRole::Line(Line { material: MaterialSlot::Single(m), .. })
            | NodeRole::Points(Points { material: MaterialSlot::Single(m), .. })
            | NodeRole::Sprite(Sprite { material: m })
            | NodeRole::ImmediateRenderObject(ImmediateObject { material: m, .. }) => Some(m),
            _ => None,
        }
    }

    /// Geometry of drawable roles
    pub fn geometry(&self) -> Option<&SharedGeometry> {
        match &self.role {
            NodeRole::Mesh(Mesh { geometry, .. })
            | NodeRole::Line(Line { geometry, .. })
            | NodeRole::Points(Points { geometry, .. }) => Some(geometry),
            _ => None,
        }
    }

    /// Morph weights, empty for roles without morph targets
    pub fn morph_target_influences(&self) -> &[f32] {
        match &self.role {
            NodeRole::Mesh(mesh) => &mesh.morph_target_influences,
            _ => &[],
        }
    }

    /// Light payload
    pub fn as_light(&self) -> Option<&Light> {
        match &self.role {
            NodeRole::Light(light) => Some(light),
            _ => None,
        }
    }

    /// Light payload, mutable
    pub fn as_light_mut(&mut self) -> Option<&mut Light> {
        match &mut self.role {
            NodeRole::Light(light) => Some(light),
            _ => None,
        }
    }
}
