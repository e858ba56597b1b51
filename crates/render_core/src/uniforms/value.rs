//! Typed uniform values
//!
//! A [`Uniform`] is a named box holding one [`UniformValue`] and a dirty flag.
//! Cloning a uniform copies the value and starts the copy clean, which is
//! what material instances rely on when they take their own copy of a
//! shader's template set.

use std::mem;

use crate::error::{RenderResult, UniformError};
use crate::foundation::math::{Color, Mat3, Mat4, Vec2, Vec3, Vec4};
use crate::material::TextureRef;
use crate::render::{GlBackend, TextureUnits, UniformLocation};

/// Semantic names of every shader input the pipeline knows about
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UniformName {
    Cube,
    Equirect,
    Flip,
    Opacity,
    Diffuse,
    Emissive,
    Specular,
    Shininess,
    ProjectionMatrix,
    ViewMatrix,
    ModelViewMatrix,
    NormalMatrix,
    ModelMatrix,
    LogDepthBufFc,
    BoneMatrices,
    BindMatrix,
    BindMatrixInverse,
    ToneMappingExposure,
    ToneMappingWhitePoint,
    CameraPosition,
    Map,
    UvTransform,
    AlphaMap,
    SpecularMap,
    EnvMap,
    FlipEnvMap,
    Reflectivity,
    RefractionRatio,
    AoMap,
    AoMapIntensity,
    LightMap,
    LightMapIntensity,
    EmissiveMap,
    BumpMap,
    BumpScale,
    NormalMap,
    NormalScale,
    DisplacementMap,
    DisplacementScale,
    DisplacementBias,
    RoughnessMap,
    MetalnessMap,
    GradientMap,
    Roughness,
    Metalness,
    EnvMapIntensity,
    FogDensity,
    FogNear,
    FogFar,
    FogColor,
    AmbientLightColor,
    Direction,
    Color,
    Shadow,
    ShadowBias,
    ShadowRadius,
    ShadowMapSize,
    Size,
    Scale,
    DashSize,
    TotalSize,
    ReferencePosition,
    NearDistance,
    FarDistance,
    ClippingPlanes,
    DirectionalLights,
    SpotLights,
    RectAreaLights,
    PointLights,
    HemisphereLights,
    DirectionalShadowMap,
    DirectionalShadowMatrix,
    SpotShadowMap,
    SpotShadowMatrix,
    PointShadowMap,
    PointShadowMatrix,
    MorphTargetInfluences,
}

impl UniformName {
    /// Identifier used in shader source
    pub fn glsl_name(self) -> &'static str {
        match self {
            Self::Cube => "tCube",
            Self::Equirect => "tEquirect",
            Self::Flip => "tFlip",
            Self::Opacity => "opacity",
            Self::Diffuse => "diffuse",
            Self::Emissive => "emissive",
            Self::Specular => "specular",
            Self::Shininess => "shininess",
            Self::ProjectionMatrix => "projectionMatrix",
            Self::ViewMatrix => "viewMatrix",
            Self::ModelViewMatrix => "modelViewMatrix",
            Self::NormalMatrix => "normalMatrix",
            Self::ModelMatrix => "modelMatrix",
            Self::LogDepthBufFc => "logDepthBufFC",
            Self::BoneMatrices => "boneMatrices",
            Self::BindMatrix => "bindMatrix",
            Self::BindMatrixInverse => "bindMatrixInverse",
            Self::ToneMappingExposure => "toneMappingExposure",
            Self::ToneMappingWhitePoint => "toneMappingWhitePoint",
            Self::CameraPosition => "cameraPosition",
            Self::Map => "map",
            Self::UvTransform => "uvTransform",
            Self::AlphaMap => "alphaMap",
            Self::SpecularMap => "specularMap",
            Self::EnvMap => "envMap",
            Self::FlipEnvMap => "flipEnvMap",
            Self::Reflectivity => "reflectivity",
            Self::RefractionRatio => "refractionRatio",
            Self::AoMap => "aoMap",
            Self::AoMapIntensity => "aoMapIntensity",
            Self::LightMap => "lightMap",
            Self::LightMapIntensity => "lightMapIntensity",
            Self::EmissiveMap => "emissiveMap",
            Self::BumpMap => "bumpMap",
            Self::BumpScale => "bumpScale",
            Self::NormalMap => "normalMap",
            Self::NormalScale => "normalScale",
            Self::DisplacementMap => "displacementMap",
            Self::DisplacementScale => "displacementScale",
            Self::DisplacementBias => "displacementBias",
            Self::RoughnessMap => "roughnessMap",
            Self::MetalnessMap => "metalnessMap",
            Self::GradientMap => "gradientMap",
            Self::Roughness => "roughness",
            Self::Metalness => "metalness",
            Self::EnvMapIntensity => "envMapIntensity",
            Self::FogDensity => "fogDensity",
            Self::FogNear => "fogNear",
            Self::FogFar => "fogFar",
            Self::FogColor => "fogColor",
            Self::AmbientLightColor => "ambientLightColor",
            Self::Direction => "direction",
            Self::Color => "color",
            Self::Shadow => "shadow",
            Self::ShadowBias => "shadowBias",
            Self::ShadowRadius => "shadowRadius",
            Self::ShadowMapSize => "shadowMapSize",
            Self::Size => "size",
            Self::Scale => "scale",
            Self::DashSize => "dashSize",
            Self::TotalSize => "totalSize",
            Self::ReferencePosition => "referencePosition",
            Self::NearDistance => "nearDistance",
            Self::FarDistance => "farDistance",
            Self::ClippingPlanes => "clippingPlanes",
            Self::DirectionalLights => "directionalLights",
            Self::SpotLights => "spotLights",
            Self::RectAreaLights => "rectAreaLights",
            Self::PointLights => "pointLights",
            Self::HemisphereLights => "hemisphereLights",
            Self::DirectionalShadowMap => "directionalShadowMap",
            Self::DirectionalShadowMatrix => "directionalShadowMatrix",
            Self::SpotShadowMap => "spotShadowMap",
            Self::SpotShadowMatrix => "spotShadowMatrix",
            Self::PointShadowMap => "pointShadowMap",
            Self::PointShadowMatrix => "pointShadowMatrix",
            Self::MorphTargetInfluences => "morphTargetInfluences",
        }
    }
}

/// Per-light data uploaded for a directional light
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLightUniform {
    /// Direction towards the light, in view space
    pub direction: Vec3,
    /// Color premultiplied by intensity
    pub color: Color,
    /// Light casts shadows
    pub shadow: bool,
    /// Depth bias applied when sampling the shadow map
    pub shadow_bias: f32,
    /// PCF radius
    pub shadow_radius: f32,
    /// Shadow map resolution
    pub shadow_map_size: Vec2,
}

/// Per-light data uploaded for a point light
#[derive(Debug, Clone, PartialEq)]
pub struct PointLightUniform {
    /// Position in view space
    pub position: Vec3,
    /// Color premultiplied by intensity
    pub color: Color,
    /// Cutoff distance, 0 for infinite
    pub distance: f32,
    /// Attenuation exponent
    pub decay: f32,
    /// Light casts shadows
    pub shadow: bool,
    /// Depth bias applied when sampling the shadow map
    pub shadow_bias: f32,
    /// PCF radius
    pub shadow_radius: f32,
    /// Shadow map resolution
    pub shadow_map_size: Vec2,
    /// Shadow camera near plane
    pub shadow_camera_near: f32,
    /// Shadow camera far plane
    pub shadow_camera_far: f32,
}

/// Per-light data uploaded for a spot light
#[derive(Debug, Clone, PartialEq)]
pub struct SpotLightUniform {
    /// Position in view space
    pub position: Vec3,
    /// Direction towards the light, in view space
    pub direction: Vec3,
    /// Color premultiplied by intensity
    pub color: Color,
    /// Cutoff distance, 0 for infinite
    pub distance: f32,
    /// Attenuation exponent
    pub decay: f32,
    /// Cosine of the cone angle
    pub cone_cos: f32,
    /// Cosine of the penumbra start angle
    pub penumbra_cos: f32,
    /// Light casts shadows
    pub shadow: bool,
    /// Depth bias applied when sampling the shadow map
    pub shadow_bias: f32,
    /// PCF radius
    pub shadow_radius: f32,
    /// Shadow map resolution
    pub shadow_map_size: Vec2,
}

/// Per-light data uploaded for a hemisphere light
#[derive(Debug, Clone, PartialEq)]
pub struct HemisphereLightUniform {
    /// Up direction in view space
    pub direction: Vec3,
    /// Sky color premultiplied by intensity
    pub sky_color: Color,
    /// Ground color premultiplied by intensity
    pub ground_color: Color,
}

/// Per-light data uploaded for a rectangular area light
#[derive(Debug, Clone, PartialEq)]
pub struct RectAreaLightUniform {
    /// Center in view space
    pub position: Vec3,
    /// Half of the width vector, in view space
    pub half_width: Vec3,
    /// Half of the height vector, in view space
    pub half_height: Vec3,
    /// Color premultiplied by intensity
    pub color: Color,
}

/// The value kinds a uniform can hold
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Single float
    Float(f32),
    /// Single integer
    Int(i32),
    /// RGB color
    Color(Color),
    /// 2-component vector
    Vec2(Vec2),
    /// 3-component vector
    Vec3(Vec3),
    /// 4-component vector
    Vec4(Vec4),
    /// 3x3 matrix
    Mat3(Mat3),
    /// 4x4 matrix
    Mat4(Mat4),
    /// 2D texture sampler, unset when `None`
    Texture(Option<TextureRef>),
    /// Cube texture sampler, unset when `None`
    CubeTexture(Option<TextureRef>),
    /// Float array
    FloatArray(Vec<f32>),
    /// Integer array (sampler unit arrays after binding)
    IntArray(Vec<i32>),
    /// Sampler array
    TextureArray(Vec<Option<TextureRef>>),
    /// Matrix array
    Mat4Array(Vec<Mat4>),
    /// Directional light structs
    DirectionalLights(Vec<DirectionalLightUniform>),
    /// Point light structs
    PointLights(Vec<PointLightUniform>),
    /// Spot light structs
    SpotLights(Vec<SpotLightUniform>),
    /// Hemisphere light structs
    HemisphereLights(Vec<HemisphereLightUniform>),
    /// Rect area light structs
    RectAreaLights(Vec<RectAreaLightUniform>),
}

impl UniformValue {
    /// Name of the value kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Int(_) => "int",
            Self::Color(_) => "color",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Mat3(_) => "mat3",
            Self::Mat4(_) => "mat4",
            Self::Texture(_) => "texture",
            Self::CubeTexture(_) => "cube texture",
            Self::FloatArray(_) => "float[]",
            Self::IntArray(_) => "int[]",
            Self::TextureArray(_) => "texture[]",
            Self::Mat4Array(_) => "mat4[]",
            Self::DirectionalLights(_) => "directional light[]",
            Self::PointLights(_) => "point light[]",
            Self::SpotLights(_) => "spot light[]",
            Self::HemisphereLights(_) => "hemisphere light[]",
            Self::RectAreaLights(_) => "rect area light[]",
        }
    }

    /// Whether applying this value consumes texture units
    pub fn is_sampler(&self) -> bool {
        matches!(self, Self::Texture(_) | Self::CubeTexture(_) | Self::TextureArray(_))
    }

    fn same_kind(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

/// A named, typed shader input with change tracking
#[derive(Debug, PartialEq)]
pub struct Uniform {
    name: UniformName,
    value: UniformValue,
    needs_update: bool,
}

impl Uniform {
    /// Create a clean uniform
    pub fn new(name: UniformName, value: UniformValue) -> Self {
        Self {
            name,
            value,
            needs_update: false,
        }
    }

    /// Semantic name
    pub fn name(&self) -> UniformName {
        self.name
    }

    /// Current value
    pub fn value(&self) -> &UniformValue {
        &self.value
    }

    /// Value changed since it was last applied
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Assign a new value of the same kind and mark the uniform dirty.
    ///
    /// Assigning an equal value leaves the dirty flag untouched.
    pub fn set(&mut self, value: UniformValue) -> Result<(), UniformError> {
        if !self.value.same_kind(&value) {
            return Err(UniformError::TypeMismatch {
                name: self.name,
                expected: self.value.kind(),
                found: value.kind(),
            });
        }
        if self.value != value {
            self.value = value;
            self.needs_update = true;
        }
        Ok(())
    }

    /// Push the value to `location` of the currently bound program.
    ///
    /// Samplers allocate texture units from `units`; running out is fatal.
    pub fn apply(
        &mut self,
        location: UniformLocation,
        backend: &mut dyn GlBackend,
        units: &mut TextureUnits,
    ) -> RenderResult<()> {
        match &self.value {
            UniformValue::Texture(texture) | UniformValue::CubeTexture(texture) => {
                let unit = units.allocate()?;
                backend.bind_texture(unit, texture.as_deref());
                backend.set_uniform(location, &UniformValue::Int(unit as i32));
            }
            UniformValue::TextureArray(textures) => {
                let mut slots = Vec::with_capacity(textures.len());
                for texture in textures {
                    let unit = units.allocate()?;
                    backend.bind_texture(unit, texture.as_deref());
                    slots.push(unit as i32);
                }
                backend.set_uniform(location, &UniformValue::IntArray(slots));
            }
            value => backend.set_uniform(location, value),
        }
        self.needs_update = false;
        Ok(())
    }
}

impl Clone for Uniform {
    /// Deep copy with a clean dirty flag
    fn clone(&self) -> Self {
        Self::new(self.name, self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Texture;
    use crate::render::{GlCommand, RecordingBackend};
    use std::rc::Rc;

    #[test]
    fn test_set_marks_dirty() {
        let mut u = Uniform::new(UniformName::Opacity, UniformValue::Float(1.0));
        assert!(!u.needs_update());
        u.set(UniformValue::Float(0.5)).unwrap();
        assert!(u.needs_update());
        assert_eq!(u.value(), &UniformValue::Float(0.5));
    }

    #[test]
    fn test_set_same_value_stays_clean() {
        let mut u = Uniform::new(UniformName::Opacity, UniformValue::Float(1.0));
        u.set(UniformValue::Float(1.0)).unwrap();
        assert!(!u.needs_update());
    }

    #[test]
    fn test_set_wrong_kind_is_rejected() {
        let mut u = Uniform::new(UniformName::Diffuse, UniformValue::Color(Color::WHITE));
        let err = u.set(UniformValue::Float(1.0)).unwrap_err();
        assert_eq!(
            err,
            UniformError::TypeMismatch {
                name: UniformName::Diffuse,
                expected: "color",
                found: "float",
            }
        );
        assert_eq!(u.value(), &UniformValue::Color(Color::WHITE));
    }

    #[test]
    fn test_clone_is_independent_and_clean() {
        let mut source = Uniform::new(UniformName::FogFar, UniformValue::Float(2000.0));
        source.set(UniformValue::Float(100.0)).unwrap();
        let copy = source.clone();

        assert_eq!(copy.value(), source.value());
        assert!(!copy.needs_update());
        assert!(source.needs_update());

        source.set(UniformValue::Float(5.0)).unwrap();
        assert_eq!(copy.value(), &UniformValue::Float(100.0));
    }

    #[test]
    fn test_apply_clears_dirty_and_uploads() {
        let mut backend = RecordingBackend::new();
        let mut units = TextureUnits::new(4);
        let mut u = Uniform::new(UniformName::Opacity, UniformValue::Float(1.0));
        u.set(UniformValue::Float(0.25)).unwrap();
        u.apply(UniformLocation(3), &mut backend, &mut units).unwrap();

        assert!(!u.needs_update());
        assert_eq!(
            backend.commands(),
            &[GlCommand::SetUniform(UniformLocation(3), UniformValue::Float(0.25))]
        );
    }

    #[test]
    fn test_apply_texture_allocates_unit() {
        let mut backend = RecordingBackend::new();
        let mut units = TextureUnits::new(2);
        let texture = Rc::new(Texture::new("albedo", 64, 64));
        let mut u = Uniform::new(UniformName::Map, UniformValue::Texture(Some(texture.clone())));
        u.apply(UniformLocation(0), &mut backend, &mut units).unwrap();

        assert_eq!(units.used(), 1);
        assert_eq!(
            backend.commands(),
            &[
                GlCommand::BindTexture(0, Some(texture.id())),
                GlCommand::SetUniform(UniformLocation(0), UniformValue::Int(0)),
            ]
        );
    }

    #[test]
    fn test_apply_texture_array_exhausts_units() {
        let mut backend = RecordingBackend::new();
        let mut units = TextureUnits::new(1);
        let mut u = Uniform::new(
            UniformName::DirectionalShadowMap,
            UniformValue::TextureArray(vec![None, None]),
        );
        let result = u.apply(UniformLocation(0), &mut backend, &mut units);
        assert!(matches!(
            result,
            Err(crate::error::RenderError::TextureUnitsExceeded { requested: 1, max: 1 })
        ));
    }
}
