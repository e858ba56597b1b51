//! Uniform library
//!
//! Named fragments of default uniform values that shader templates are built
//! from. `merged(&[UniformsId::Common, UniformsId::Fog])` yields a fresh set
//! holding the inputs of both fragments.

use super::set::UniformSet;
use super::value::{UniformName as N, UniformValue as V};
use crate::foundation::math::{Color, Mat3, Vec2};

/// Identifiers of the library fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformsId {
    /// Diffuse color, opacity, color map, alpha map
    Common,
    /// Environment map and reflection parameters
    Envmap,
    /// Ambient occlusion map
    Aomap,
    /// Light map
    Lightmap,
    /// Specular map
    Specularmap,
    /// Emissive map
    Emissivemap,
    /// Bump map
    Bumpmap,
    /// Normal map
    Normalmap,
    /// Displacement map
    Displacementmap,
    /// Roughness map
    Roughnessmap,
    /// Metalness map
    Metalnessmap,
    /// Toon gradient map
    Gradientmap,
    /// Fog parameters
    Fog,
    /// Light arrays and shadow maps
    Lights,
    /// Point sprite parameters
    Points,
}

/// Fresh copy of one library fragment
pub fn get(id: UniformsId) -> UniformSet {
    let values: Vec<(N, V)> = match id {
        UniformsId::Common => vec![
            (N::Diffuse, V::Color(Color::from_hex(0xeeeeee))),
            (N::Opacity, V::Float(1.0)),
            (N::Map, V::Texture(None)),
            (N::UvTransform, V::Mat3(Mat3::identity())),
            (N::AlphaMap, V::Texture(None)),
        ],
        UniformsId::Specularmap => vec![(N::SpecularMap, V::Texture(None))],
        UniformsId::Envmap => vec![
            (N::EnvMap, V::CubeTexture(None)),
            (N::FlipEnvMap, V::Float(-1.0)),
            (N::Reflectivity, V::Float(1.0)),
            (N::RefractionRatio, V::Float(0.98)),
        ],
        UniformsId::Aomap => vec![
            (N::AoMap, V::Texture(None)),
            (N::AoMapIntensity, V::Float(1.0)),
        ],
        UniformsId::Lightmap => vec![
            (N::LightMap, V::Texture(None)),
            (N::LightMapIntensity, V::Float(1.0)),
        ],
        UniformsId::Emissivemap => vec![(N::EmissiveMap, V::Texture(None))],
        UniformsId::Bumpmap => vec![
            (N::BumpMap, V::Texture(None)),
            (N::BumpScale, V::Float(1.0)),
        ],
        UniformsId::Normalmap => vec![
            (N::NormalMap, V::Texture(None)),
            (N::NormalScale, V::Vec2(Vec2::new(1.0, 1.0))),
        ],
        UniformsId::Displacementmap => vec![
            (N::DisplacementMap, V::Texture(None)),
            (N::DisplacementScale, V::Float(1.0)),
            (N::DisplacementBias, V::Float(0.0)),
        ],
        UniformsId::Roughnessmap => vec![(N::RoughnessMap, V::Texture(None))],
        UniformsId::Metalnessmap => vec![(N::MetalnessMap, V::Texture(None))],
        UniformsId::Gradientmap => vec![(N::GradientMap, V::Texture(None))],
        UniformsId::Fog => vec![
            (N::FogDensity, V::Float(0.000_25)),
            (N::FogNear, V::Float(1.0)),
            (N::FogFar, V::Float(2000.0)),
            (N::FogColor, V::Color(Color::WHITE)),
        ],
        UniformsId::Lights => vec![
            (N::AmbientLightColor, V::Color(Color::BLACK)),
            (N::DirectionalLights, V::DirectionalLights(Vec::new())),
            (N::DirectionalShadowMap, V::TextureArray(Vec::new())),
            (N::DirectionalShadowMatrix, V::Mat4Array(Vec::new())),
            (N::SpotLights, V::SpotLights(Vec::new())),
            (N::SpotShadowMap, V::TextureArray(Vec::new())),
            (N::SpotShadowMatrix, V::Mat4Array(Vec::new())),
            (N::PointLights, V::PointLights(Vec::new())),
            (N::PointShadowMap, V::TextureArray(Vec::new())),
            (N::PointShadowMatrix, V::Mat4Array(Vec::new())),
            (N::HemisphereLights, V::HemisphereLights(Vec::new())),
            (N::RectAreaLights, V::RectAreaLights(Vec::new())),
        ],
        UniformsId::Points => vec![
            (N::Diffuse, V::Color(Color::from_hex(0xeeeeee))),
            (N::Opacity, V::Float(1.0)),
            (N::Size, V::Float(1.0)),
            (N::Scale, V::Float(1.0)),
            (N::Map, V::Texture(None)),
            (N::UvTransform, V::Mat3(Mat3::identity())),
        ],
    };
    UniformSet::from_values(values)
}

/// Merge several fragments in order into a new set
pub fn merged(ids: &[UniformsId]) -> UniformSet {
    let fragments: Vec<UniformSet> = ids.iter().map(|id| get(*id)).collect();
    UniformSet::merged(&fragments)
}

/// Merge several fragments, then add (or override) extra values
pub fn merged_with<I>(ids: &[UniformsId], extra: I) -> UniformSet
where
    I: IntoIterator<Item = (N, V)>,
{
    let mut set = merged(ids);
    set.merge(&UniformSet::from_values(extra));
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_fragment_defaults() {
        let common = get(UniformsId::Common);
        assert_eq!(common.len(), 5);
        assert_eq!(common.get(N::Opacity).unwrap().value(), &V::Float(1.0));
    }

    #[test]
    fn test_points_overrides_common_on_merge() {
        let set = merged(&[UniformsId::Common, UniformsId::Points]);
        assert!(set.contains(N::Size));
        assert!(set.contains(N::AlphaMap));
        assert_eq!(set.len(), 7);
    }

    #[test]
    fn test_merged_with_extra_values() {
        let set = merged_with(
            &[UniformsId::Common, UniformsId::Fog],
            [(N::Opacity, V::Float(0.5)), (N::Emissive, V::Color(Color::BLACK))],
        );
        assert_eq!(set.get(N::Opacity).unwrap().value(), &V::Float(0.5));
        assert!(set.contains(N::Emissive));
        assert!(set.contains(N::FogColor));
    }

    #[test]
    fn test_each_call_returns_fresh_copy() {
        let mut a = get(UniformsId::Fog);
        a.set(N::FogNear, V::Float(10.0)).unwrap();
        let b = get(UniformsId::Fog);
        assert_eq!(b.get(N::FogNear).unwrap().value(), &V::Float(1.0));
    }
}
