//! Bounding volumes and frustum culling
//!
//! Planes are stored as `normal · p + distance = 0` with the normal pointing
//! into the kept half-space, so a positive signed distance means "inside".

use crate::foundation::math::{Mat3, Mat4, Mat4Ext, Vec3, Vec4};

/// Axis-aligned box, used for geometry bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Lowest corner
    pub min: Vec3,
    /// Highest corner
    pub max: Vec3,
}

impl AABB {
    /// Box spanning `min` to `max`
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Midpoint of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Center point
    pub center: Vec3,
    /// Radius
    pub radius: f32,
}

impl Sphere {
    /// Create a sphere
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere transformed by an affine matrix; the radius grows with the largest axis scale
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            center: matrix.transform_point(&self.center.into()).coords,
            radius: self.radius * matrix.max_scale_on_axis(),
        }
    }
}

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal
    pub normal: Vec3,
    /// Signed distance term
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal: normal.normalize(), distance }
    }

    /// Plane from raw `(a, b, c, d)` coefficients, normalized
    pub fn from_coefficients(v: Vec4) -> Self {
        let normal = Vec3::new(v.x, v.y, v.z);
        let len = normal.magnitude();
        if len == 0.0 {
            return Self { normal, distance: v.w };
        }
        Self { normal: normal / len, distance: v.w / len }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }

    /// Plane transformed by an affine matrix
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let upper: Mat3 = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = upper
            .try_inverse()
            .map_or(upper, |inverse| inverse.transpose());
        let coplanar = self.normal * -self.distance;
        let point = matrix.transform_point(&coplanar.into()).coords;
        let normal = (normal_matrix * self.normal).normalize();
        Self { normal, distance: -point.dot(&normal) }
    }

    /// `(a, b, c, d)` coefficients for upload
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.normal.x, self.normal.y, self.normal.z, self.distance)
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone)]
pub struct Frustum {
    /// Six planes (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl Default for Frustum {
    fn default() -> Self {
        Self::from_matrix(&Mat4::identity())
    }
}

impl Frustum {
    /// Frustum of a view-projection matrix
    ///
    /// Gribb-Hartmann: each plane is the sum or difference of the fourth row
    /// and one of the first three rows of the clip matrix.
    pub fn from_matrix(m: &Mat4) -> Self {
        let row = |i: usize| Vec4::new(m[(i, 0)], m[(i, 1)], m[(i, 2)], m[(i, 3)]);
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));
        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r3 + r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// Point is on the inner side of all six planes
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.distance_to_point(point) >= 0.0)
    }

    /// Sphere is inside or touches the frustum
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(sphere.center) >= -sphere.radius)
    }

    /// Box is inside or straddles the frustum.
    ///
    /// Only the corner furthest along each plane normal is tested, so boxes
    /// near a frustum corner may pass conservatively.
    pub fn intersects_box(&self, bounds: &AABB) -> bool {
        self.planes.iter().all(|plane| {
            let n = plane.normal;
            let corner = Vec3::new(
                if n.x >= 0.0 { bounds.max.x } else { bounds.min.x },
                if n.y >= 0.0 { bounds.max.y } else { bounds.min.y },
                if n.z >= 0.0 { bounds.max.z } else { bounds.min.z },
            );
            plane.distance_to_point(corner) >= 0.0
        })
    }

    /// Local-space bounding sphere placed by `world` intersects the frustum
    pub fn intersects_object(&self, bounds: &Sphere, world: &Mat4) -> bool {
        self.intersects_sphere(&bounds.transformed(world))
    }

    /// Unit sprite quad placed by `world` intersects the frustum
    pub fn intersects_sprite(&self, world: &Mat4) -> bool {
        let sphere = Sphere::new(Vec3::zeros(), std::f32::consts::FRAC_1_SQRT_2);
        self.intersects_object(&sphere, world)
    }
}
