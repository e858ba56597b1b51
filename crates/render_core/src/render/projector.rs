//! Scene projection
//!
//! Walks the scene depth-first and fills a [`RenderList`]. An invisible node
//! hides its whole subtree; a node outside the camera's layers is skipped
//! but its children are still visited. Drawables that pass culling get their
//! geometry synchronized and one record per visible material.

use crate::foundation::math::{Mat4, Mat4Ext};
use crate::render::{GeometryRegistry, GlBackend, RenderList};
use crate::scene::{Camera, Frustum, Line, MaterialSlot, Mesh, Node, NodeId, NodeRole, Points, Scene};

/// Per-frame inputs of a projection
struct Projection {
    frustum: Frustum,
    view_projection: Mat4,
}

/// Fill `list` with what `camera` sees of `scene`
pub fn project_scene(
    scene: &mut Scene,
    camera: &Camera,
    list: &mut RenderList,
    geometries: &mut GeometryRegistry,
    backend: &mut dyn GlBackend,
) {
    let view_projection = camera.view_projection();
    let projection = Projection {
        frustum: Frustum::from_matrix(&view_projection),
        view_projection,
    };

    let mut stack = vec![scene.root()];
    while let Some(id) = stack.pop() {
        let Some(node) = scene.get(id) else { continue };
        if !node.visible {
            continue;
        }
        stack.extend(node.children().iter().rev());

        if !node.layers.test(camera.layers) {
            continue;
        }
        update_skeleton(scene, id);
        if let Some(node) = scene.get(id) {
            project_node(&projection, id, node, list, geometries, backend);
        }
    }

    log::trace!(
        "Projected scene: {} opaque, {} transparent, {} lights, {} sprites",
        list.opaque.len(),
        list.transparent.len(),
        list.lights.len(),
        list.sprites.len()
    );
}

/// Refresh bone matrices of a skinned mesh from the bones' world matrices
fn update_skeleton(scene: &mut Scene, id: NodeId) {
    let bone_worlds: Vec<Mat4> = match scene.get(id).map(|n| &n.role) {
        Some(NodeRole::Mesh(Mesh { skeleton: Some(skeleton), .. })) => skeleton
            .bones
            .iter()
            .map(|bone| scene.world_matrix(*bone).unwrap_or_else(Mat4::identity))
            .collect(),
        _ => return,
    };
    if let Some(NodeRole::Mesh(Mesh { skeleton: Some(skeleton), .. })) = scene.get_mut(id).map(|n| &mut n.role) {
        skeleton.update(&bone_worlds);
    }
}

fn depth_of(projection: &Projection, node: &Node) -> f32 {
    projection
        .view_projection
        .project_point(&node.matrix_world().position())
        .z
}

fn project_node(
    projection: &Projection,
    id: NodeId,
    node: &Node,
    list: &mut RenderList,
    geometries: &mut GeometryRegistry,
    backend: &mut dyn GlBackend,
) {
    match &node.role {
        NodeRole::Group => {}
        NodeRole::Light(_) => {
            list.lights.push(id);
            if node.cast_shadow {
                list.shadows.push(id);
            }
        }
        NodeRole::Sprite(_) => {
            if !node.frustum_culled || projection.frustum.intersects_sprite(node.matrix_world()) {
                list.sprites.push(id);
            }
        }
        NodeRole::LensFlare(_) => list.flares.push(id),
        NodeRole::ImmediateRenderObject(object) => {
            let z = depth_of(projection, node);
            list.push(id, None, object.material.clone(), z, None);
        }
        NodeRole::Mesh(Mesh { geometry, material, .. })
        | NodeRole::Line(Line { geometry, material, .. })
        | NodeRole::Points(Points { geometry, material }) => {
            let data = geometry.borrow();
            if node.frustum_culled
                && !projection.frustum.intersects_object(&data.bounding_sphere(), node.matrix_world())
            {
                return;
            }
            if data.is_empty() {
                return;
            }
            let z = depth_of(projection, node);
            geometries.update(&data, backend);

            match material {
                MaterialSlot::Single(material) => {
                    if material.borrow().visible {
                        list.push(id, Some(geometry.clone()), material.clone(), z, None);
                    }
                }
                MaterialSlot::Multi(materials) => {
                    for group in data.groups() {
                        let Some(material) = materials.get(group.material_index) else {
                            continue;
                        };
                        if material.borrow().visible {
                            list.push(id, Some(geometry.clone()), material.clone(), z, Some(*group));
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Color, Vec3};
    use crate::geometry::{Geometry, SharedGeometry};
    use crate::material::{Material, SharedMaterial};
    use crate::render::RecordingBackend;
    use crate::scene::Light;

    fn camera() -> Camera {
        let mut camera = Camera::perspective(60.0, 1.0, 0.1, 100.0);
        camera.set_position(Vec3::new(0.0, 0.0, 10.0));
        camera.update_matrix_world(None);
        camera
    }

    fn project(scene: &mut Scene) -> RenderList {
        scene.update_matrix_world(false);
        let mut list = RenderList::new();
        let mut registry = GeometryRegistry::new();
        let mut backend = RecordingBackend::new();
        registry.begin_frame();
        project_scene(scene, &camera(), &mut list, &mut registry, &mut backend);
        list
    }

    fn cube_mesh() -> Node {
        Node::mesh(Geometry::cube(1.0), Material::basic(Color::WHITE))
    }

    #[test]
    fn test_invisible_subtree_is_pruned() {
        let mut scene = Scene::new();
        let hidden = scene.add(Node::group().with_visible(false));
        scene.add_child(hidden, cube_mesh()).unwrap();
        scene.add_child(hidden, Node::light(Light::ambient(Color::WHITE, 1.0))).unwrap();
        scene.add(cube_mesh());

        let list = project(&mut scene);
        assert_eq!(list.opaque.len(), 1);
        assert!(list.lights.is_empty());
    }

    #[test]
    fn test_layer_mismatch_skips_node_but_not_children() {
        let mut scene = Scene::new();
        let mut parent = cube_mesh();
        parent.layers.set(3);
        let parent = scene.add(parent);
        scene.add_child(parent, cube_mesh()).unwrap();

        let list = project(&mut scene);
        assert_eq!(list.opaque.len(), 1);
        assert_ne!(list.opaque[0].node, parent);
    }

    #[test]
    fn test_frustum_culling_can_be_disabled() {
        let mut scene = Scene::new();
        scene.add(cube_mesh().with_position(Vec3::new(0.0, 0.0, 50.0)));
        let mut behind = cube_mesh().with_position(Vec3::new(0.0, 0.0, 50.0));
        behind.frustum_culled = false;
        let kept = scene.add(behind);

        let list = project(&mut scene);
        assert_eq!(list.opaque.len(), 1);
        assert_eq!(list.opaque[0].node, kept);
    }

    #[test]
    fn test_invisible_material_emits_nothing() {
        let mut scene = Scene::new();
        scene.add(Node::mesh(Geometry::cube(1.0), Material::basic(Color::WHITE).with_visible(false)));
        assert!(project(&mut scene).is_empty());
    }

    #[test]
    fn test_material_array_emits_per_visible_group() {
        let mut scene = Scene::new();
        let mut materials: Vec<SharedMaterial> = (0..6).map(|_| Material::basic(Color::WHITE).into()).collect();
        materials[2] = Material::basic(Color::WHITE).with_visible(false).into();
        materials.truncate(5);
        scene.add(Node::mesh(Geometry::cube(1.0), materials));

        let list = project(&mut scene);
        // group 2 is invisible, group 5 points past the array
        assert_eq!(list.opaque.len(), 4);
        let indices: Vec<usize> = list.opaque.iter().filter_map(|r| r.group.map(|g| g.material_index)).collect();
        assert_eq!(indices, vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_material_array_without_groups_draws_nothing() {
        let mut scene = Scene::new();
        let mut geometry = Geometry::cube(1.0);
        geometry.clear_groups();
        let materials: Vec<SharedMaterial> = vec![Material::basic(Color::WHITE).into()];
        scene.add(Node::mesh(geometry, materials));
        assert!(project(&mut scene).is_empty());
    }

    #[test]
    fn test_empty_geometry_is_skipped() {
        let mut scene = Scene::new();
        let mut empty = Node::mesh(Geometry::new(), Material::basic(Color::WHITE));
        empty.frustum_culled = false;
        scene.add(empty);
        assert!(project(&mut scene).is_empty());
    }

    #[test]
    fn test_shared_geometry_uploaded_once() {
        let mut scene = Scene::new();
        let geometry = SharedGeometry::new(Geometry::cube(1.0));
        scene.add(Node::mesh(geometry.clone(), Material::basic(Color::WHITE)));
        scene.add(Node::mesh(geometry, Material::basic(Color::WHITE)));
        scene.update_matrix_world(false);

        let mut list = RenderList::new();
        let mut registry = GeometryRegistry::new();
        let mut backend = RecordingBackend::new();
        registry.begin_frame();
        project_scene(&mut scene, &camera(), &mut list, &mut registry, &mut backend);
        assert_eq!(list.opaque.len(), 2);
        assert_eq!(backend.commands().len(), 4);
    }

    #[test]
    fn test_lights_and_shadow_casters_collected() {
        let mut scene = Scene::new();
        scene.add(Node::light(Light::directional(Color::WHITE, 1.0)).with_cast_shadow(true));
        scene.add(Node::light(Light::ambient(Color::WHITE, 0.2)));
        let list = project(&mut scene);
        assert_eq!(list.lights.len(), 2);
        assert_eq!(list.shadows.len(), 1);
    }
}
