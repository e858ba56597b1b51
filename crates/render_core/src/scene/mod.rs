//! Scene graph
//!
//! Nodes in an arena-backed tree, cameras, lights, fog and the bounding
//! volumes used for frustum culling.

mod camera;
mod fog;
mod frustum;
mod layers;
mod light;
mod node;
#[allow(clippy::module_inception)]
mod scene;

pub use camera::{Camera, CameraId, Projection};
pub use fog::Fog;
pub use frustum::{Frustum, Plane, Sphere, AABB};
pub use layers::Layers;
pub use light::{Light, LightKind, LightShadow};
pub use node::{
    FlareElement, ImmediateObject, LensFlare, Line, LineMode, MaterialSlot, Mesh, Node, NodeId,
    NodeRole, Points, Skeleton, Sprite, TriangleDrawMode,
};
pub use scene::{Scene, SceneId};
