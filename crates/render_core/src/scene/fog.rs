//! Scene fog

use crate::error::UniformError;
use crate::foundation::math::Color;
use crate::uniforms::{UniformName, UniformSet, UniformValue};

/// Fog applied to materials that opt in
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fog {
    /// Linear falloff between `near` and `far`
    Linear {
        /// Fog color
        color: Color,
        /// Distance where fog starts
        near: f32,
        /// Distance of full fog
        far: f32,
    },
    /// Exponential squared falloff
    Exp2 {
        /// Fog color
        color: Color,
        /// Density factor
        density: f32,
    },
}

impl Fog {
    /// Linear fog
    pub fn linear(color: Color, near: f32, far: f32) -> Self {
        Self::Linear { color, near, far }
    }

    /// Exponential squared fog
    pub fn exp2(color: Color, density: f32) -> Self {
        Self::Exp2 { color, density }
    }

    /// Fog color
    pub fn color(&self) -> Color {
        match self {
            Self::Linear { color, .. } | Self::Exp2 { color, .. } => *color,
        }
    }

    /// Write the fog parameters into the fog uniforms of `uniforms`
    pub fn refresh_uniforms(&self, uniforms: &mut UniformSet) -> Result<(), UniformError> {
        uniforms.set_if_present(UniformName::FogColor, UniformValue::Color(self.color()))?;
        match *self {
            Self::Linear { near, far, .. } => {
                uniforms.set_if_present(UniformName::FogNear, UniformValue::Float(near))?;
                uniforms.set_if_present(UniformName::FogFar, UniformValue::Float(far))?;
            }
            Self::Exp2 { density, .. } => {
                uniforms.set_if_present(UniformName::FogDensity, UniformValue::Float(density))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::{library, UniformsId};

    #[test]
    fn test_linear_fog_uniforms() {
        let mut uniforms = library::get(UniformsId::Fog);
        Fog::linear(Color::BLACK, 10.0, 50.0).refresh_uniforms(&mut uniforms).unwrap();
        assert_eq!(uniforms.get(UniformName::FogNear).unwrap().value(), &UniformValue::Float(10.0));
        assert_eq!(uniforms.get(UniformName::FogFar).unwrap().value(), &UniformValue::Float(50.0));
        assert_eq!(
            uniforms.get(UniformName::FogColor).unwrap().value(),
            &UniformValue::Color(Color::BLACK)
        );
    }

    #[test]
    fn test_exp2_fog_leaves_range_untouched() {
        let mut uniforms = library::get(UniformsId::Fog);
        Fog::exp2(Color::WHITE, 0.1).refresh_uniforms(&mut uniforms).unwrap();
        assert_eq!(uniforms.get(UniformName::FogDensity).unwrap().value(), &UniformValue::Float(0.1));
        assert!(!uniforms.get(UniformName::FogNear).unwrap().needs_update());
    }

    #[test]
    fn test_fog_on_set_without_fog_uniforms() {
        let mut uniforms = UniformSet::new();
        assert!(Fog::exp2(Color::WHITE, 0.1).refresh_uniforms(&mut uniforms).is_ok());
        assert!(uniforms.is_empty());
    }
}
