//! Scene arena
//!
//! The scene owns every node in a slot map. Parents own their children: removing
//! a node removes its whole subtree. The root is a plain group created with the
//! scene and cannot be removed.

use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::SlotMap;

use crate::error::{RenderError, RenderResult};
use crate::foundation::math::Mat4;
use crate::material::SharedMaterial;
use crate::scene::{Fog, Node, NodeId};

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique scene identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(pub u64);

/// Tree of nodes plus scene-wide render settings
#[derive(Debug)]
pub struct Scene {
    id: SceneId,
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
    /// Update world matrices at the start of every frame
    pub auto_update: bool,
    /// Replaces every draw's material when set
    pub override_material: Option<SharedMaterial>,
    /// Scene fog
    pub fog: Option<Fog>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Empty scene with a root group
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::group().with_name("root"));
        Self {
            id: SceneId(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed)),
            nodes,
            root,
            auto_update: true,
            override_material: None,
            fog: None,
        }
    }

    /// Scene identifier
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Root node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Add a node under the root
    pub fn add(&mut self, node: Node) -> NodeId {
        let root = self.root;
        self.attach(root, node)
    }

    /// Add a node under `parent`
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> RenderResult<NodeId> {
        if !self.nodes.contains_key(parent) {
            return Err(RenderError::UnknownNode(parent));
        }
        Ok(self.attach(parent, node))
    }

    fn attach(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        node.parent = Some(parent);
        node.children.clear();
        let id = self.nodes.insert(node);
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(id);
        }
        id
    }

    /// Remove a node and its subtree, returning the removed node.
    ///
    /// The root is never removed.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        if id == self.root {
            return None;
        }
        let parent = self.nodes.get(id)?.parent;
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|child| *child != id);
        }
        let mut removed = self.nodes.remove(id)?;
        let mut pending = std::mem::take(&mut removed.children);
        while let Some(child) = pending.pop() {
            if let Some(node) = self.nodes.remove(child) {
                pending.extend(node.children);
            }
        }
        removed.parent = None;
        Some(removed)
    }

    /// Look up a node
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up a node for editing
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Look up a node, failing with [`RenderError::UnknownNode`]
    pub fn node(&self, id: NodeId) -> RenderResult<&Node> {
        self.nodes.get(id).ok_or(RenderError::UnknownNode(id))
    }

    /// Whether `id` is part of the scene
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Only the root is present
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Every node in arena order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    /// World matrix of a node
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        self.nodes.get(id).map(|node| *node.matrix_world())
    }

    /// Recompute world matrices.
    ///
    /// A node's world matrix is rebuilt when its local matrix changed, when an
    /// ancestor's was rebuilt, or when `force` is set.
    pub fn update_matrix_world(&mut self, force: bool) {
        let mut stack = vec![(self.root, Mat4::identity(), force)];
        while let Some((id, parent_world, force)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            if node.matrix_auto_update {
                node.update_matrix();
            }
            let force = force || node.world_needs_update();
            if force {
                let world = parent_world * node.matrix();
                node.set_matrix_world(world);
            }
            let world = *node.matrix_world();
            stack.extend(node.children.iter().rev().map(|child| (*child, world, force)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4Ext, Vec3};
    use approx::assert_relative_eq;

    #[test]
    fn test_world_matrix_composes_parent() {
        let mut scene = Scene::new();
        let parent = scene.add(Node::group().with_position(Vec3::new(1.0, 0.0, 0.0)));
        let child = scene
            .add_child(parent, Node::group().with_position(Vec3::new(0.0, 2.0, 0.0)))
            .unwrap();
        scene.update_matrix_world(false);
        assert_relative_eq!(scene.world_matrix(child).unwrap().position(), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_manual_matrix_propagates_to_children() {
        let mut scene = Scene::new();
        let mut parent_node = Node::group();
        parent_node.matrix_auto_update = false;
        let parent = scene.add(parent_node);
        let child = scene.add_child(parent, Node::group()).unwrap();
        scene.update_matrix_world(false);

        scene
            .get_mut(parent)
            .unwrap()
            .set_matrix(Mat4::new_translation(&Vec3::new(0.0, 0.0, 4.0)));
        scene.update_matrix_world(false);
        assert_relative_eq!(scene.world_matrix(child).unwrap().position(), Vec3::new(0.0, 0.0, 4.0));
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut scene = Scene::new();
        let a = scene.add(Node::group());
        let b = scene.add_child(a, Node::group()).unwrap();
        let c = scene.add_child(b, Node::group()).unwrap();
        let other = scene.add(Node::group());
        assert_eq!(scene.len(), 5);

        let removed = scene.remove(a).unwrap();
        assert!(removed.parent().is_none());
        assert!(!scene.contains(b));
        assert!(!scene.contains(c));
        assert!(scene.contains(other));
        assert_eq!(scene.get(scene.root()).unwrap().children(), &[other]);
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let mut scene = Scene::new();
        let root = scene.root();
        assert!(scene.remove(root).is_none());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_add_child_unknown_parent() {
        let mut scene = Scene::new();
        let stale = scene.add(Node::group());
        scene.remove(stale);
        assert!(matches!(
            scene.add_child(stale, Node::group()),
            Err(RenderError::UnknownNode(id)) if id == stale
        ));
    }
}
