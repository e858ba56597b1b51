//! Render lists
//!
//! One frame's worth of draw records for a (scene, camera) pair, split into
//! the opaque and transparent passes, plus the lights, shadow casters,
//! sprites and flares found during projection.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::geometry::{GeometryGroup, SharedGeometry};
use crate::material::{MaterialId, SharedMaterial};
use crate::scene::{CameraId, NodeId, SceneId};

/// One draw of one node with one material
#[derive(Debug, Clone)]
pub struct DrawRecord {
    /// Emission order within the frame
    pub id: u64,
    /// Node being drawn
    pub node: NodeId,
    /// Geometry; `None` for immediate objects
    pub geometry: Option<SharedGeometry>,
    /// Material to draw with
    pub material: SharedMaterial,
    /// Id of `material`, cached for sorting
    pub material_id: MaterialId,
    /// Normalized device depth of the node origin
    pub z: f32,
    /// Geometry group drawn, for material arrays
    pub group: Option<GeometryGroup>,
}

/// Front-to-back; ties by material then emission order
pub fn opaque_order(a: &DrawRecord, b: &DrawRecord) -> Ordering {
    a.z.total_cmp(&b.z)
        .then_with(|| a.material_id.cmp(&b.material_id))
        .then_with(|| a.id.cmp(&b.id))
}

/// Exact reverse of [`opaque_order`]
pub fn transparent_order(a: &DrawRecord, b: &DrawRecord) -> Ordering {
    opaque_order(b, a)
}

/// Draw records and collections of one frame
#[derive(Debug, Default)]
pub struct RenderList {
    /// Opaque pass
    pub opaque: Vec<DrawRecord>,
    /// Transparent pass
    pub transparent: Vec<DrawRecord>,
    /// Lights
    pub lights: Vec<NodeId>,
    /// Lights casting shadows
    pub shadows: Vec<NodeId>,
    /// Sprites
    pub sprites: Vec<NodeId>,
    /// Lens flares
    pub flares: Vec<NodeId>,
    next_id: u64,
}

impl RenderList {
    /// Empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything for a new frame
    pub fn init(&mut self) {
        self.opaque.clear();
        self.transparent.clear();
        self.lights.clear();
        self.shadows.clear();
        self.sprites.clear();
        self.flares.clear();
        self.next_id = 0;
    }

    /// Append a record to the pass its material belongs to
    pub fn push(
        &mut self,
        node: NodeId,
        geometry: Option<SharedGeometry>,
        material: SharedMaterial,
        z: f32,
        group: Option<GeometryGroup>,
    ) {
        let transparent = material.borrow().transparent;
        let record = DrawRecord {
            id: self.next_id,
            node,
            geometry,
            material_id: material.id(),
            material,
            z,
            group,
        };
        self.next_id += 1;
        if transparent {
            self.transparent.push(record);
        } else {
            self.opaque.push(record);
        }
    }

    /// Move every record into one pass, in emission order.
    ///
    /// Used when a scene-wide override material draws everything, so the
    /// override's own transparency decides the pass.
    pub fn repartition(&mut self, transparent: bool) {
        let (into, from) = if transparent {
            (&mut self.transparent, &mut self.opaque)
        } else {
            (&mut self.opaque, &mut self.transparent)
        };
        if from.is_empty() {
            return;
        }
        into.append(from);
        into.sort_by_key(|record| record.id);
    }

    /// Sort both passes
    pub fn sort(&mut self) {
        self.opaque.sort_by(opaque_order);
        self.transparent.sort_by(transparent_order);
    }

    /// Records in both passes
    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    /// No record in either pass
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.transparent.is_empty()
    }
}

/// Render lists reused across frames, one per (scene, camera)
#[derive(Debug, Default)]
pub struct RenderLists {
    lists: HashMap<(SceneId, CameraId), RenderList>,
}

impl RenderLists {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// List of the pair, created on first use
    pub fn get(&mut self, scene: SceneId, camera: CameraId) -> &mut RenderList {
        self.lists.entry((scene, camera)).or_default()
    }

    /// Cached list of the pair, if any frame built one
    pub fn peek(&self, scene: SceneId, camera: CameraId) -> Option<&RenderList> {
        self.lists.get(&(scene, camera))
    }

    /// Drop every cached list
    pub fn dispose(&mut self) {
        self.lists.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Color;
    use crate::material::Material;
    use crate::scene::{Node, Scene};

    fn fixture() -> (Scene, Vec<NodeId>) {
        let mut scene = Scene::new();
        let ids = (0..4).map(|_| scene.add(Node::group())).collect();
        (scene, ids)
    }

    #[test]
    fn test_push_partitions_by_transparency() {
        let (_, ids) = fixture();
        let mut list = RenderList::new();
        list.push(ids[0], None, Material::basic(Color::WHITE).into(), 0.5, None);
        list.push(ids[1], None, Material::basic(Color::WHITE).with_opacity(0.5).into(), 0.5, None);
        assert_eq!(list.opaque.len(), 1);
        assert_eq!(list.transparent.len(), 1);
        assert_eq!(list.transparent[0].id, 1);
    }

    #[test]
    fn test_repartition_keeps_emission_order() {
        let (_, ids) = fixture();
        let mut list = RenderList::new();
        list.push(ids[0], None, Material::basic(Color::WHITE).with_opacity(0.5).into(), 0.1, None);
        list.push(ids[1], None, Material::basic(Color::WHITE).into(), 0.2, None);
        list.push(ids[2], None, Material::basic(Color::WHITE).with_opacity(0.5).into(), 0.3, None);

        list.repartition(false);
        assert!(list.transparent.is_empty());
        let order: Vec<u64> = list.opaque.iter().map(|r| r.id).collect();
        assert_eq!(order, vec![0, 1, 2]);

        list.repartition(true);
        assert!(list.opaque.is_empty());
        assert_eq!(list.transparent.len(), 3);
    }

    #[test]
    fn test_opaque_sorted_front_to_back() {
        let (_, ids) = fixture();
        let mut list = RenderList::new();
        let material: SharedMaterial = Material::basic(Color::WHITE).into();
        for (node, z) in ids.iter().zip([0.9, 0.1, 0.5, 0.3]) {
            list.push(*node, None, material.clone(), z, None);
        }
        list.sort();
        let zs: Vec<f32> = list.opaque.iter().map(|r| r.z).collect();
        assert_eq!(zs, vec![0.1, 0.3, 0.5, 0.9]);
    }

    #[test]
    fn test_opaque_ties_break_on_material_then_emission() {
        let (_, ids) = fixture();
        let mut list = RenderList::new();
        let first: SharedMaterial = Material::basic(Color::WHITE).into();
        let second: SharedMaterial = Material::basic(Color::WHITE).into();
        list.push(ids[0], None, second.clone(), 0.5, None);
        list.push(ids[1], None, first.clone(), 0.5, None);
        list.push(ids[2], None, second, 0.5, None);
        list.sort();
        let order: Vec<u64> = list.opaque.iter().map(|r| r.id).collect();
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn test_transparent_is_reverse_of_opaque() {
        let (_, ids) = fixture();
        let mut list = RenderList::new();
        let materials: Vec<SharedMaterial> = (0..2)
            .map(|_| Material::basic(Color::WHITE).with_transparent(true).into())
            .collect();
        list.push(ids[0], None, materials[0].clone(), 0.2, None);
        list.push(ids[1], None, materials[1].clone(), 0.8, None);
        list.push(ids[2], None, materials[0].clone(), 0.8, None);
        list.push(ids[3], None, materials[1].clone(), 0.2, None);

        let mut reversed = list.transparent.clone();
        reversed.sort_by(opaque_order);
        reversed.reverse();
        list.sort();

        let sorted: Vec<u64> = list.transparent.iter().map(|r| r.id).collect();
        let expected: Vec<u64> = reversed.iter().map(|r| r.id).collect();
        assert_eq!(sorted, expected);
        assert!(list.transparent.windows(2).all(|w| w[0].z >= w[1].z));
    }

    #[test]
    fn test_init_clears_everything() {
        let (_, ids) = fixture();
        let mut list = RenderList::new();
        list.push(ids[0], None, Material::basic(Color::WHITE).into(), 0.0, None);
        list.lights.push(ids[1]);
        list.init();
        assert!(list.is_empty());
        assert!(list.lights.is_empty());
        list.push(ids[0], None, Material::basic(Color::WHITE).into(), 0.0, None);
        assert_eq!(list.opaque[0].id, 0);
    }

    #[test]
    fn test_lists_cached_per_scene_and_camera() {
        let scene = Scene::new();
        let a = crate::scene::Camera::perspective(60.0, 1.0, 0.1, 10.0);
        let b = crate::scene::Camera::perspective(60.0, 1.0, 0.1, 10.0);
        let mut lists = RenderLists::new();
        lists.get(scene.id(), a.id()).lights.push(scene.root());
        assert_eq!(lists.get(scene.id(), a.id()).lights.len(), 1);
        assert!(lists.get(scene.id(), b.id()).lights.is_empty());
        assert!(lists.peek(scene.id(), a.id()).is_some());
    }
}
