//! Indexed buffer geometry
//!
//! A geometry is an optional index plus named attributes, a draw range that
//! limits which elements are drawn, and groups that split the elements
//! between the entries of a material array. Instanced geometry carries an
//! instance count; a count of zero draws nothing.

use std::cell::{OnceCell, Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::attribute::BufferAttribute;
use crate::foundation::math::Vec3;
use crate::scene::{Sphere, AABB};

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// Unique geometry identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub u64);

/// Element range to draw; `count: None` means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawRange {
    /// First element
    pub start: u32,
    /// Number of elements, unbounded when `None`
    pub count: Option<u32>,
}

/// Sub-range of elements drawn with one entry of a material array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryGroup {
    /// First element
    pub start: u32,
    /// Number of elements
    pub count: u32,
    /// Index into the node's material array
    pub material_index: usize,
}

/// Geometry data shared by drawable nodes
#[derive(Debug, Clone)]
pub struct Geometry {
    id: GeometryId,
    /// Debug name
    pub name: String,
    index: Option<BufferAttribute>,
    attributes: BTreeMap<String, BufferAttribute>,
    morph_attributes: BTreeMap<String, Vec<BufferAttribute>>,
    groups: Vec<GeometryGroup>,
    /// Element range limit
    pub draw_range: DrawRange,
    /// Instance count; `None` for non-instanced geometry
    pub instance_count: Option<u32>,
    bounding_sphere: OnceCell<Sphere>,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new()
    }
}

impl Geometry {
    /// Empty geometry with a fresh id
    pub fn new() -> Self {
        Self {
            id: GeometryId(NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed)),
            name: String::new(),
            index: None,
            attributes: BTreeMap::new(),
            morph_attributes: BTreeMap::new(),
            groups: Vec::new(),
            draw_range: DrawRange::default(),
            instance_count: None,
            bounding_sphere: OnceCell::new(),
        }
    }

    /// Geometry identifier
    pub fn id(&self) -> GeometryId {
        self.id
    }

    /// Index buffer, if any
    pub fn index(&self) -> Option<&BufferAttribute> {
        self.index.as_ref()
    }

    /// Replace the index buffer
    pub fn set_index(&mut self, index: Option<BufferAttribute>) {
        self.index = index;
    }

    /// Named attribute
    pub fn attribute(&self, name: &str) -> Option<&BufferAttribute> {
        self.attributes.get(name)
    }

    /// Named attribute for in-place edits; bounds are recomputed on next use
    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut BufferAttribute> {
        if name == "position" {
            self.bounding_sphere = OnceCell::new();
        }
        self.attributes.get_mut(name)
    }

    /// Add or replace a named attribute
    pub fn set_attribute(&mut self, name: impl Into<String>, attribute: BufferAttribute) {
        let name = name.into();
        if name == "position" {
            self.bounding_sphere = OnceCell::new();
        }
        self.attributes.insert(name, attribute);
    }

    /// All attributes in name order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &BufferAttribute)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Geometry has no attributes at all
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Morph target attributes for `name` (`"position"` or `"normal"`)
    pub fn morph_attribute(&self, name: &str) -> &[BufferAttribute] {
        self.morph_attributes.get(name).map_or(&[], Vec::as_slice)
    }

    /// Set morph targets for an attribute
    pub fn set_morph_attribute(&mut self, name: impl Into<String>, targets: Vec<BufferAttribute>) {
        self.morph_attributes.insert(name.into(), targets);
    }

    /// Material groups
    pub fn groups(&self) -> &[GeometryGroup] {
        &self.groups
    }

    /// Append a material group
    pub fn add_group(&mut self, start: u32, count: u32, material_index: usize) {
        self.groups.push(GeometryGroup { start, count, material_index });
    }

    /// Remove every group
    pub fn clear_groups(&mut self) {
        self.groups.clear();
    }

    /// Limit drawing to `count` elements starting at `start`
    pub fn set_draw_range(&mut self, start: u32, count: Option<u32>) {
        self.draw_range = DrawRange { start, count };
    }

    /// Element count used to clamp draws: index count, else position count
    pub fn element_count(&self) -> u32 {
        match (&self.index, self.attributes.get("position")) {
            (Some(index), _) => index.count(),
            (None, Some(position)) => position.count(),
            (None, None) => 0,
        }
    }

    /// Axis-aligned bounds of the position attribute
    pub fn bounding_box(&self) -> Option<AABB> {
        let position = self.attributes.get("position")?;
        let mut points = (0..position.count() as usize).filter_map(|i| position.vec3(i));
        let first = Vec3::from(points.next()?);
        let (min, max) = points.fold((first, first), |(min, max), p| {
            let p = Vec3::from(p);
            (min.inf(&p), max.sup(&p))
        });
        Some(AABB::new(min, max))
    }

    /// Bounding sphere of the position attribute, computed once and cached
    pub fn bounding_sphere(&self) -> Sphere {
        *self.bounding_sphere.get_or_init(|| {
            let Some(bounds) = self.bounding_box() else {
                return Sphere::new(Vec3::zeros(), 0.0);
            };
            let center = bounds.center();
            let radius = self.attributes.get("position").map_or(0.0, |position| {
                (0..position.count() as usize)
                    .filter_map(|i| position.vec3(i))
                    .map(|p| (Vec3::from(p) - center).magnitude_squared())
                    .fold(0.0_f32, f32::max)
                    .sqrt()
            });
            Sphere::new(center, radius)
        })
    }

    /// Line-list indices outlining every triangle (6 indices per triangle)
    pub fn wireframe_indices(&self) -> Vec<u32> {
        let triangles: Vec<[u32; 3]> = match &self.index {
            Some(index) => (0..index.data.len() / 3)
                .filter_map(|t| {
                    Some([
                        index.data.get_u32(t * 3)?,
                        index.data.get_u32(t * 3 + 1)?,
                        index.data.get_u32(t * 3 + 2)?,
                    ])
                })
                .collect(),
            None => {
                let count = self.attributes.get("position").map_or(0, BufferAttribute::count);
                (0..count / 3).map(|t| [t * 3, t * 3 + 1, t * 3 + 2]).collect()
            }
        };
        triangles
            .iter()
            .flat_map(|&[a, b, c]| [a, b, b, c, c, a])
            .collect()
    }

    /// Axis-aligned cube centered at the origin, one group per face
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        // (normal, u axis, v axis) per face, in +x -x +y -y +z -z order
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];
        let mut positions = Vec::with_capacity(72);
        let mut normals = Vec::with_capacity(72);
        let mut uvs = Vec::with_capacity(48);
        let mut indices = Vec::with_capacity(36);
        let mut geometry = Self::new();
        for (face, (n, u, v)) in faces.iter().enumerate() {
            let base = (face * 4) as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                for k in 0..3 {
                    positions.push((n[k] + u[k] * su + v[k] * sv) * h);
                }
                normals.extend_from_slice(n);
                uvs.extend_from_slice(&[(su + 1.0) * 0.5, (sv + 1.0) * 0.5]);
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
            geometry.add_group((face * 6) as u32, 6, face);
        }
        geometry.set_index(Some(BufferAttribute::index(indices)));
        geometry.set_attribute("position", BufferAttribute::from_f32(positions, 3));
        geometry.set_attribute("normal", BufferAttribute::from_f32(normals, 3));
        geometry.set_attribute("uv", BufferAttribute::from_f32(uvs, 2));
        geometry
    }

    /// UV sphere centered at the origin
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let ws = width_segments.max(3);
        let hs = height_segments.max(2);
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();
        for y in 0..=hs {
            let v = y as f32 / hs as f32;
            let theta = v * std::f32::consts::PI;
            for x in 0..=ws {
                let u = x as f32 / ws as f32;
                let phi = u * std::f32::consts::TAU;
                let n = [-phi.cos() * theta.sin(), theta.cos(), phi.sin() * theta.sin()];
                positions.extend(n.iter().map(|c| c * radius));
                normals.extend_from_slice(&n);
                uvs.extend_from_slice(&[u, 1.0 - v]);
            }
        }
        let row = ws + 1;
        let mut indices = Vec::new();
        for y in 0..hs {
            for x in 0..ws {
                let a = y * row + x + 1;
                let b = y * row + x;
                let c = (y + 1) * row + x;
                let d = (y + 1) * row + x + 1;
                if y != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if y != hs - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }
        let mut geometry = Self::new();
        geometry.set_index(Some(BufferAttribute::index(indices)));
        geometry.set_attribute("position", BufferAttribute::from_f32(positions, 3));
        geometry.set_attribute("normal", BufferAttribute::from_f32(normals, 3));
        geometry.set_attribute("uv", BufferAttribute::from_f32(uvs, 2));
        geometry
    }
}

/// Geometry shared between nodes
#[derive(Clone)]
pub struct SharedGeometry {
    id: GeometryId,
    inner: Rc<RefCell<Geometry>>,
}

impl SharedGeometry {
    /// Wrap a geometry for sharing
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: geometry.id(),
            inner: Rc::new(RefCell::new(geometry)),
        }
    }

    /// Geometry identifier
    pub fn id(&self) -> GeometryId {
        self.id
    }

    /// Borrow the geometry
    pub fn borrow(&self) -> Ref<'_, Geometry> {
        self.inner.borrow()
    }

    /// Borrow the geometry for editing between frames
    pub fn borrow_mut(&self) -> RefMut<'_, Geometry> {
        self.inner.borrow_mut()
    }
}

impl From<Geometry> for SharedGeometry {
    fn from(geometry: Geometry) -> Self {
        Self::new(geometry)
    }
}

impl fmt::Debug for SharedGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedGeometry").field("id", &self.id).finish()
    }
}
