//! Keyed uniform collections
//!
//! A [`UniformSet`] holds the inputs one shader needs, ordered by name.
//! Sets are assembled by merging library fragments; on a key collision the
//! later fragment wins.

use std::collections::BTreeMap;

use super::value::{Uniform, UniformName, UniformValue};
use crate::error::UniformError;

/// Ordered, keyed collection of uniforms
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSet {
    values: BTreeMap<UniformName, Uniform>,
}

impl UniformSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from `(name, value)` pairs; later duplicates win
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (UniformName, UniformValue)>,
    {
        let mut set = Self::new();
        for (name, value) in values {
            set.insert(Uniform::new(name, value));
        }
        set
    }

    /// Insert a uniform, replacing any existing entry of the same name
    pub fn insert(&mut self, uniform: Uniform) {
        self.values.insert(uniform.name(), uniform);
    }

    /// Insert a value under `name`, replacing any existing entry
    pub fn insert_value(&mut self, name: UniformName, value: UniformValue) {
        self.insert(Uniform::new(name, value));
    }

    /// Merge a copy of every uniform of `other` into this set.
    ///
    /// Entries of `other` override entries already present.
    pub fn merge(&mut self, other: &UniformSet) {
        for uniform in other.values.values() {
            self.insert(uniform.clone());
        }
    }

    /// Merge a list of sets in order into a new set
    pub fn merged<'a, I>(sets: I) -> Self
    where
        I: IntoIterator<Item = &'a UniformSet>,
    {
        let mut result = Self::new();
        for set in sets {
            result.merge(set);
        }
        result
    }

    /// Look up a uniform
    pub fn get(&self, name: UniformName) -> Option<&Uniform> {
        self.values.get(&name)
    }

    /// Look up a uniform for mutation
    pub fn get_mut(&mut self, name: UniformName) -> Option<&mut Uniform> {
        self.values.get_mut(&name)
    }

    /// Assign a value to an existing uniform
    pub fn set(&mut self, name: UniformName, value: UniformValue) -> Result<(), UniformError> {
        self.values
            .get_mut(&name)
            .ok_or(UniformError::Missing(name))?
            .set(value)
    }

    /// Assign a value if the set has the uniform, ignore it otherwise
    pub fn set_if_present(&mut self, name: UniformName, value: UniformValue) -> Result<(), UniformError> {
        match self.values.get_mut(&name) {
            Some(uniform) => uniform.set(value),
            None => Ok(()),
        }
    }

    /// Whether the set has an entry for `name`
    pub fn contains(&self, name: UniformName) -> bool {
        self.values.contains_key(&name)
    }

    /// Number of uniforms
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Uniforms in name order
    pub fn iter(&self) -> impl Iterator<Item = &Uniform> {
        self.values.values()
    }

    /// Uniforms in name order, mutable
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Uniform> {
        self.values.values_mut()
    }

    /// Names of uniforms changed since they were last applied
    pub fn dirty_names(&self) -> Vec<UniformName> {
        self.values
            .values()
            .filter(|u| u.needs_update())
            .map(Uniform::name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Color;

    fn fog() -> UniformSet {
        UniformSet::from_values([
            (UniformName::FogNear, UniformValue::Float(1.0)),
            (UniformName::FogFar, UniformValue::Float(2000.0)),
        ])
    }

    #[test]
    fn test_merge_later_wins_and_keeps_all_keys() {
        let base = fog();
        let over = UniformSet::from_values([
            (UniformName::FogFar, UniformValue::Float(50.0)),
            (UniformName::Diffuse, UniformValue::Color(Color::BLACK)),
        ]);

        let merged = UniformSet::merged([&base, &over]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get(UniformName::FogFar).unwrap().value(), &UniformValue::Float(50.0));
        assert_eq!(merged.get(UniformName::FogNear).unwrap().value(), &UniformValue::Float(1.0));
        assert!(merged.contains(UniformName::Diffuse));
    }

    #[test]
    fn test_merged_copy_is_independent() {
        let mut base = fog();
        let merged = UniformSet::merged([&base]);
        base.set(UniformName::FogNear, UniformValue::Float(9.0)).unwrap();
        assert_eq!(merged.get(UniformName::FogNear).unwrap().value(), &UniformValue::Float(1.0));
    }

    #[test]
    fn test_clone_resets_dirty_flags() {
        let mut base = fog();
        base.set(UniformName::FogNear, UniformValue::Float(3.0)).unwrap();
        assert_eq!(base.dirty_names(), vec![UniformName::FogNear]);

        let copy = base.clone();
        assert!(copy.dirty_names().is_empty());
        assert_eq!(copy.get(UniformName::FogNear).unwrap().value(), &UniformValue::Float(3.0));
    }

    #[test]
    fn test_set_missing_uniform() {
        let mut set = fog();
        assert_eq!(
            set.set(UniformName::Opacity, UniformValue::Float(1.0)),
            Err(UniformError::Missing(UniformName::Opacity))
        );
        assert!(set.set_if_present(UniformName::Opacity, UniformValue::Float(1.0)).is_ok());
    }

    #[test]
    fn test_iteration_is_name_ordered() {
        let set = UniformSet::from_values([
            (UniformName::FogFar, UniformValue::Float(1.0)),
            (UniformName::Opacity, UniformValue::Float(1.0)),
            (UniformName::Diffuse, UniformValue::Color(Color::WHITE)),
        ]);
        let names: Vec<_> = set.iter().map(Uniform::name).collect();
        assert_eq!(names, vec![UniformName::Opacity, UniformName::Diffuse, UniformName::FogFar]);
    }
}
