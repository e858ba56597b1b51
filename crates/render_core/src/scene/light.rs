//! Light sources
//!
//! Lights are scene nodes with a [`Light`] payload. Their world position comes
//! from the node; directional and spot lights additionally aim at a
//! world-space target point.

use crate::foundation::math::{Color, Mat4, Vec3};
use crate::render::RenderTarget;

/// Kind-specific light parameters
#[derive(Debug, Clone, PartialEq)]
pub enum LightKind {
    /// Uniform light from every direction
    Ambient,
    /// Parallel rays from the node position towards `target`
    Directional {
        /// World-space aim point
        target: Vec3,
    },
    /// Omnidirectional light with attenuation
    Point {
        /// Cutoff distance, 0 for infinite
        distance: f32,
        /// Attenuation exponent
        decay: f32,
    },
    /// Cone light aimed at `target`
    Spot {
        /// World-space aim point
        target: Vec3,
        /// Cutoff distance, 0 for infinite
        distance: f32,
        /// Cone half-angle in radians
        angle: f32,
        /// Fraction of the cone that fades out, in `[0, 1]`
        penumbra: f32,
        /// Attenuation exponent
        decay: f32,
    },
    /// Sky/ground gradient ambient light
    Hemisphere {
        /// Color from below
        ground_color: Color,
    },
    /// Rectangular area emitter facing its local -Z
    RectArea {
        /// Width of the rectangle
        width: f32,
        /// Height of the rectangle
        height: f32,
    },
}

/// Shadow parameters and per-frame shadow state of a light
#[derive(Debug, Clone)]
pub struct LightShadow {
    /// Depth bias applied when sampling the map
    pub bias: f32,
    /// PCF radius
    pub radius: f32,
    /// Map resolution; point lights lay six faces out in a 4x2 atlas of this size each
    pub map_size: (u32, u32),
    /// Shadow camera near plane
    pub camera_near: f32,
    /// Shadow camera far plane
    pub camera_far: f32,
    /// Half extent of the orthographic shadow camera of directional lights
    pub camera_extent: f32,
    pub(crate) map: Option<RenderTarget>,
    pub(crate) matrix: Mat4,
}

impl Default for LightShadow {
    fn default() -> Self {
        Self {
            bias: 0.0,
            radius: 1.0,
            map_size: (512, 512),
            camera_near: 0.5,
            camera_far: 500.0,
            camera_extent: 5.0,
            map: None,
            matrix: Mat4::identity(),
        }
    }
}

impl LightShadow {
    /// Depth target rendered by the last shadow pass
    pub fn map(&self) -> Option<&RenderTarget> {
        self.map.as_ref()
    }

    /// World to shadow-map texture space
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }
}

/// Light payload of a scene node
#[derive(Debug, Clone)]
pub struct Light {
    /// Kind and kind-specific parameters
    pub kind: LightKind,
    /// Light color (sky color for hemisphere lights)
    pub color: Color,
    /// Scalar intensity
    pub intensity: f32,
    /// Shadow settings, used when the node casts shadows
    pub shadow: LightShadow,
}

impl Light {
    fn with_kind(kind: LightKind, color: Color, intensity: f32) -> Self {
        Self {
            kind,
            color,
            intensity,
            shadow: LightShadow::default(),
        }
    }

    /// Ambient light
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self::with_kind(LightKind::Ambient, color, intensity)
    }

    /// Directional light aimed at the origin
    pub fn directional(color: Color, intensity: f32) -> Self {
        Self::with_kind(LightKind::Directional { target: Vec3::zeros() }, color, intensity)
    }

    /// Point light
    pub fn point(color: Color, intensity: f32, distance: f32, decay: f32) -> Self {
        Self::with_kind(LightKind::Point { distance, decay }, color, intensity)
    }

    /// Spot light aimed at the origin
    pub fn spot(color: Color, intensity: f32, distance: f32, angle: f32, penumbra: f32) -> Self {
        Self::with_kind(
            LightKind::Spot {
                target: Vec3::zeros(),
                distance,
                angle,
                penumbra,
                decay: 1.0,
            },
            color,
            intensity,
        )
    }

    /// Hemisphere light
    pub fn hemisphere(sky: Color, ground: Color, intensity: f32) -> Self {
        Self::with_kind(LightKind::Hemisphere { ground_color: ground }, sky, intensity)
    }

    /// Rectangular area light
    pub fn rect_area(color: Color, intensity: f32, width: f32, height: f32) -> Self {
        Self::with_kind(LightKind::RectArea { width, height }, color, intensity)
    }

    /// Color scaled by intensity
    pub fn radiance(&self) -> Color {
        self.color.scaled(self.intensity)
    }

    /// Kinds that can render a shadow map
    pub fn supports_shadow(&self) -> bool {
        matches!(
            self.kind,
            LightKind::Directional { .. } | LightKind::Point { .. } | LightKind::Spot { .. }
        )
    }

    /// Aim point, for kinds that have one
    pub fn target(&self) -> Option<Vec3> {
        match self.kind {
            LightKind::Directional { target } | LightKind::Spot { target, .. } => Some(target),
            _ => None,
        }
    }
}
