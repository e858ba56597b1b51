//! Material system for rendering
//!
//! A material carries the render-state flags the dispatcher needs
//! (visibility, transparency, wireframe, widths, depth/blend settings) and a
//! uniform template. Materials are shared between any number of nodes through
//! [`SharedMaterial`] and may be edited by the application between frames.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::texture::TextureRef;
use crate::error::UniformError;
use crate::foundation::math::Color;
use crate::scene::Plane;
use crate::uniforms::{library, UniformName as N, UniformSet, UniformValue as V, UniformsId};

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

/// Unique material identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u64);

/// Which faces are rasterized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Front faces only
    Front,
    /// Back faces only
    Back,
    /// Both faces
    Double,
}

/// Blend equation preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Blending {
    /// Blending disabled
    None,
    /// Standard alpha blending
    Normal,
    /// Additive blending
    Additive,
    /// Subtractive blending
    Subtractive,
    /// Multiplicative blending
    Multiply,
}

/// End cap style for line materials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineCap {
    /// Flat end at the vertex
    Butt,
    /// Rounded end
    Round,
    /// Square end extending past the vertex
    Square,
}

/// Join style for line materials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineJoin {
    /// Rounded join
    Round,
    /// Bevelled join
    Bevel,
    /// Mitred join
    Miter,
}

/// Shading model of a material, with the parameters specific to it
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialKind {
    /// Unlit color
    Basic,
    /// Per-vertex diffuse lighting
    Lambert,
    /// Blinn-Phong lighting
    Phong {
        /// Specular color
        specular: Color,
        /// Specular exponent
        shininess: f32,
    },
    /// Physically based metal/roughness
    Standard {
        /// Surface roughness
        roughness: f32,
        /// Surface metalness
        metalness: f32,
    },
    /// Depth only, used by the shadow pass
    Depth,
    /// Solid lines
    LineBasic {
        /// End caps
        linecap: LineCap,
        /// Joins
        linejoin: LineJoin,
    },
    /// Dashed lines
    LineDashed {
        /// Dash pattern scale
        scale: f32,
        /// Dash length
        dash_size: f32,
        /// Gap length
        gap_size: f32,
    },
    /// Point sprites
    Points {
        /// Point size in pixels
        size: f32,
        /// Shrink points with distance
        size_attenuation: bool,
    },
    /// Camera-facing sprite
    Sprite {
        /// Rotation in radians
        rotation: f32,
    },
    /// User supplied program; uniforms come entirely from the template
    Shader {
        /// Program name used as cache key
        name: String,
    },
}

impl MaterialKind {
    /// Short name used in program keys and logs
    pub fn program_name(&self) -> &str {
        match self {
            Self::Basic => "basic",
            Self::Lambert => "lambert",
            Self::Phong { .. } => "phong",
            Self::Standard { .. } => "standard",
            Self::Depth => "depth",
            Self::LineBasic { .. } => "basic",
            Self::LineDashed { .. } => "dashed",
            Self::Points { .. } => "points",
            Self::Sprite { .. } => "sprite",
            Self::Shader { name } => name,
        }
    }

    /// Default uniform set of the shader this kind selects
    pub fn uniform_template(&self) -> UniformSet {
        use UniformsId::*;
        match self {
            Self::Basic | Self::LineBasic { .. } => {
                library::merged(&[Common, Specularmap, Envmap, Aomap, Lightmap, Fog])
            }
            Self::Lambert => library::merged_with(
                &[Common, Specularmap, Envmap, Aomap, Lightmap, Emissivemap, Fog, Lights],
                [(N::Emissive, V::Color(Color::BLACK))],
            ),
            Self::Phong { .. } => library::merged_with(
                &[
                    Common, Specularmap, Envmap, Aomap, Lightmap, Emissivemap, Bumpmap,
                    Normalmap, Displacementmap, Gradientmap, Fog, Lights,
                ],
                [
                    (N::Emissive, V::Color(Color::BLACK)),
                    (N::Specular, V::Color(Color::from_hex(0x111111))),
                    (N::Shininess, V::Float(30.0)),
                ],
            ),
            Self::Standard { .. } => library::merged_with(
                &[
                    Common, Envmap, Aomap, Lightmap, Emissivemap, Bumpmap, Normalmap,
                    Displacementmap, Roughnessmap, Metalnessmap, Fog, Lights,
                ],
                [
                    (N::Emissive, V::Color(Color::BLACK)),
                    (N::Roughness, V::Float(0.5)),
                    (N::Metalness, V::Float(0.5)),
                    (N::EnvMapIntensity, V::Float(1.0)),
                ],
            ),
            Self::Depth => library::merged(&[Common, Displacementmap]),
            Self::LineDashed { .. } => library::merged_with(
                &[Common, Fog],
                [
                    (N::Scale, V::Float(1.0)),
                    (N::DashSize, V::Float(1.0)),
                    (N::TotalSize, V::Float(2.0)),
                ],
            ),
            Self::Points { .. } => library::merged(&[Points, Fog]),
            Self::Sprite { .. } => library::merged(&[Common, Fog]),
            Self::Shader { .. } => UniformSet::new(),
        }
    }
}

/// Render state and shader inputs of a surface
#[derive(Debug, Clone)]
pub struct Material {
    id: MaterialId,
    /// Debug name
    pub name: String,
    /// Shading model
    pub kind: MaterialKind,
    /// Base color
    pub color: Color,
    /// Emissive color
    pub emissive: Color,
    /// Opacity in `[0, 1]`
    pub opacity: f32,
    /// Rendered in the transparent pass
    pub transparent: bool,
    /// Draws using this material are skipped when false
    pub visible: bool,
    /// Draw triangle edges as lines
    pub wireframe: bool,
    /// Line width used in wireframe mode
    pub wireframe_linewidth: f32,
    /// Line width for line materials; `None` for non-line materials
    pub linewidth: Option<f32>,
    /// Enable depth testing
    pub depth_test: bool,
    /// Write to the depth buffer
    pub depth_write: bool,
    /// Write to the color buffer
    pub color_write: bool,
    /// Blend preset
    pub blending: Blending,
    /// Rasterized faces
    pub side: Side,
    /// Affected by scene fog
    pub fog: bool,
    /// Affected by scene lights
    pub lights: bool,
    /// Vertex skinning enabled
    pub skinning: bool,
    /// Morph target positions enabled
    pub morph_targets: bool,
    /// Morph target normals enabled
    pub morph_normals: bool,
    /// Per-material clipping planes (world space)
    pub clipping_planes: Vec<Plane>,
    /// Color map
    pub map: Option<TextureRef>,
    /// Uniform template cloned into each program binding of this material
    pub uniforms: UniformSet,
    version: u32,
}

impl Material {
    /// Create a material of the given kind with default state
    pub fn new(kind: MaterialKind) -> Self {
        let uniforms = kind.uniform_template();
        let lights = uniforms.contains(N::AmbientLightColor);
        let fog = uniforms.contains(N::FogColor);
        let linewidth = match kind {
            MaterialKind::LineBasic { .. } | MaterialKind::LineDashed { .. } => Some(1.0),
            _ => None,
        };
        Self {
            id: MaterialId(NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed)),
            name: String::new(),
            kind,
            color: Color::WHITE,
            emissive: Color::BLACK,
            opacity: 1.0,
            transparent: false,
            visible: true,
            wireframe: false,
            wireframe_linewidth: 1.0,
            linewidth,
            depth_test: true,
            depth_write: true,
            color_write: true,
            blending: Blending::Normal,
            side: Side::Front,
            fog,
            lights,
            skinning: false,
            morph_targets: false,
            morph_normals: false,
            clipping_planes: Vec::new(),
            map: None,
            uniforms,
            version: 0,
        }
    }

    /// Unlit material
    pub fn basic(color: Color) -> Self {
        Self::new(MaterialKind::Basic).with_color(color)
    }

    /// Lambert material
    pub fn lambert(color: Color) -> Self {
        Self::new(MaterialKind::Lambert).with_color(color)
    }

    /// Phong material with default specular settings
    pub fn phong(color: Color) -> Self {
        Self::new(MaterialKind::Phong {
            specular: Color::from_hex(0x111111),
            shininess: 30.0,
        })
        .with_color(color)
    }

    /// Standard PBR material
    pub fn standard(color: Color, roughness: f32, metalness: f32) -> Self {
        Self::new(MaterialKind::Standard { roughness, metalness }).with_color(color)
    }

    /// Solid line material (width 1, round caps and joins, unlit)
    pub fn line_basic(color: Color) -> Self {
        Self::new(MaterialKind::LineBasic {
            linecap: LineCap::Round,
            linejoin: LineJoin::Round,
        })
        .with_color(color)
    }

    /// Dashed line material (scale 1, dash 3, gap 1)
    pub fn line_dashed(color: Color) -> Self {
        Self::new(MaterialKind::LineDashed {
            scale: 1.0,
            dash_size: 3.0,
            gap_size: 1.0,
        })
        .with_color(color)
    }

    /// Point material
    pub fn points(color: Color, size: f32) -> Self {
        Self::new(MaterialKind::Points {
            size,
            size_attenuation: true,
        })
        .with_color(color)
    }

    /// Sprite material; sprites never skin or morph
    pub fn sprite(color: Color) -> Self {
        Self::new(MaterialKind::Sprite { rotation: 0.0 }).with_color(color)
    }

    /// Depth material used for shadow maps
    pub fn depth() -> Self {
        Self::new(MaterialKind::Depth)
    }

    /// Custom program with its own uniforms
    pub fn shader(name: impl Into<String>, uniforms: UniformSet) -> Self {
        let mut material = Self::new(MaterialKind::Shader { name: name.into() });
        material.uniforms = uniforms;
        material
    }

    /// Material identifier
    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// Incremented by [`Material::needs_update`]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Request a program re-link on next use (after changing defines-level state)
    pub fn needs_update(&mut self) {
        self.version += 1;
    }

    /// Set the base color
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set the opacity and transparency flag together
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.transparent = self.opacity < 1.0;
        self
    }

    /// Set the transparency flag
    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    /// Enable wireframe rendering
    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    /// Set the visibility flag
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set the line width of a line material
    pub fn with_linewidth(mut self, width: f32) -> Self {
        self.linewidth = Some(width);
        self
    }

    /// Copy the material's parameters into an instance uniform set.
    ///
    /// Uniforms the set does not contain are skipped.
    pub fn refresh_uniforms(&self, uniforms: &mut UniformSet) -> Result<(), UniformError> {
        uniforms.set_if_present(N::Diffuse, V::Color(self.color))?;
        uniforms.set_if_present(N::Opacity, V::Float(self.opacity))?;
        uniforms.set_if_present(N::Emissive, V::Color(self.emissive))?;
        if self.map.is_some() {
            uniforms.set_if_present(N::Map, V::Texture(self.map.clone()))?;
        }
        match &self.kind {
            MaterialKind::Phong { specular, shininess } => {
                uniforms.set_if_present(N::Specular, V::Color(*specular))?;
                uniforms.set_if_present(N::Shininess, V::Float(shininess.max(1e-4)))?;
            }
            MaterialKind::Standard { roughness, metalness } => {
                uniforms.set_if_present(N::Roughness, V::Float(*roughness))?;
                uniforms.set_if_present(N::Metalness, V::Float(*metalness))?;
            }
            MaterialKind::LineDashed { scale, dash_size, gap_size } => {
                uniforms.set_if_present(N::Scale, V::Float(*scale))?;
                uniforms.set_if_present(N::DashSize, V::Float(*dash_size))?;
                uniforms.set_if_present(N::TotalSize, V::Float(dash_size + gap_size))?;
            }
            MaterialKind::Points { size, .. } => {
                uniforms.set_if_present(N::Size, V::Float(*size))?;
            }
            _ => {}
        }
        Ok(())
    }
}

/// Material shared between nodes; lifetime is that of the longest holder
#[derive(Clone)]
pub struct SharedMaterial {
    id: MaterialId,
    inner: Rc<RefCell<Material>>,
}

impl SharedMaterial {
    /// Wrap a material for sharing
    pub fn new(material: Material) -> Self {
        Self {
            id: material.id(),
            inner: Rc::new(RefCell::new(material)),
        }
    }

    /// Material identifier
    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// Borrow the material
    pub fn borrow(&self) -> Ref<'_, Material> {
        self.inner.borrow()
    }

    /// Borrow the material for editing between frames
    pub fn borrow_mut(&self) -> RefMut<'_, Material> {
        self.inner.borrow_mut()
    }

    /// Both handles refer to the same material
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<Material> for SharedMaterial {
    fn from(material: Material) -> Self {
        Self::new(material)
    }
}

impl fmt::Debug for SharedMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.inner.try_borrow().map(|m| m.name.clone()).unwrap_or_default();
        f.debug_struct("SharedMaterial")
            .field("id", &self.id)
            .field("name", &name)
            .finish()
    }
}
