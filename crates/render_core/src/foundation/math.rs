//! Math utilities and types
//!
//! Thin aliases over `nalgebra` plus the few helpers the scene graph needs:
//! a TRS transform, an RGB color and matrix extension methods.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

use serde::{Deserialize, Serialize};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position relative to the parent
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Convert to a transformation matrix (translation * rotation * scale)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Linear RGB color with components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
}

impl Color {
    /// White
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    /// Black
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a color from components
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create a color from a packed `0xRRGGBB` value
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// Multiply every component by a scalar
    pub fn scaled(self, s: f32) -> Self {
        Self::new(self.r * s, self.g * s, self.b * s)
    }

    /// Components as an array
    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl std::ops::Add for Color {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.r + other.r, self.g + other.g, self.b + other.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Math utility functions
pub mod utils {
    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * DEG_TO_RAD
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Translation part of an affine matrix
    fn position(&self) -> Vec3;

    /// Largest scale factor along the three basis axes
    fn max_scale_on_axis(&self) -> f32;

    /// Project a point through the matrix, dividing by w
    fn project_point(&self, point: &Vec3) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn position(&self) -> Vec3 {
        Vec3::new(self.m14, self.m24, self.m34)
    }

    fn max_scale_on_axis(&self) -> f32 {
        let sx = Vec3::new(self.m11, self.m21, self.m31).magnitude_squared();
        let sy = Vec3::new(self.m12, self.m22, self.m32).magnitude_squared();
        let sz = Vec3::new(self.m13, self.m23, self.m33).magnitude_squared();
        sx.max(sy).max(sz).sqrt()
    }

    fn project_point(&self, point: &Vec3) -> Vec3 {
        let h = self * Vec4::new(point.x, point.y, point.z, 1.0);
        let w = if h.w == 0.0 { 1.0 } else { h.w };
        Vec3::new(h.x / w, h.y / w, h.z / w)
    }
}
