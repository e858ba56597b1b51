//! Program binding
//!
//! A linked program is identified by everything that would change its
//! compiled source: the material kind, which uniforms it declares, the light
//! layout, fog mode, clipping plane count, skinning and morphing switches.
//! Materials with equal descriptors share one program; each material still
//! keeps its own copy of the uniform values.

use std::collections::HashMap;

use crate::error::RenderResult;
use crate::material::Material;
use crate::render::{Capabilities, GlBackend, LightsHash, Precision, ProgramHandle};
use crate::scene::Fog;
use crate::uniforms::{UniformName, UniformSet, UniformValue};

/// Everything a program is compiled from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramDescriptor {
    /// Shader name
    pub name: String,
    /// Uniforms declared by the material template
    pub uniforms: Vec<UniformName>,
    /// Light layout; zeroed for unlit materials
    pub lights: LightsHash,
    /// Fog applied
    pub fog: bool,
    /// Exponential squared fog instead of linear
    pub fog_exp2: bool,
    /// Clipping planes evaluated
    pub num_clipping_planes: usize,
    /// Vertex skinning
    pub skinning: bool,
    /// Bone matrix array size
    pub max_bones: u32,
    /// Morph target positions
    pub morph_targets: bool,
    /// Morph target normals
    pub morph_normals: bool,
    /// Color map sampled
    pub map: bool,
    /// Shadow maps sampled
    pub shadow_map_enabled: bool,
    /// Float precision
    pub precision: Precision,
}

impl ProgramDescriptor {
    /// Descriptor of the program `material` needs in the current frame
    pub fn for_material(
        material: &Material,
        lights: &LightsHash,
        fog: Option<&Fog>,
        num_clipping_planes: usize,
        shadow_map_enabled: bool,
        capabilities: &Capabilities,
    ) -> Self {
        let fog = if material.fog { fog } else { None };
        Self {
            name: material.kind.program_name().to_owned(),
            uniforms: material.uniforms.iter().map(|u| u.name()).collect(),
            lights: if material.lights { *lights } else { LightsHash::default() },
            fog: fog.is_some(),
            fog_exp2: matches!(fog, Some(Fog::Exp2 { .. })),
            num_clipping_planes,
            skinning: material.skinning,
            max_bones: if material.skinning { capabilities.max_bones() } else { 0 },
            morph_targets: material.morph_targets,
            morph_normals: material.morph_normals,
            map: material.map.is_some(),
            shadow_map_enabled: shadow_map_enabled && material.lights,
            precision: capabilities.precision,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedProgram {
    handle: ProgramHandle,
    used_times: usize,
}

/// Linked programs, reference counted by the materials using them
#[derive(Debug, Default)]
pub struct ProgramCache {
    programs: HashMap<ProgramDescriptor, CachedProgram>,
    descriptors: HashMap<ProgramHandle, ProgramDescriptor>,
}

impl ProgramCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Program for `descriptor`, linking it on first request
    pub fn acquire(&mut self, descriptor: &ProgramDescriptor, backend: &mut dyn GlBackend) -> RenderResult<ProgramHandle> {
        if let Some(cached) = self.programs.get_mut(descriptor) {
            cached.used_times += 1;
            return Ok(cached.handle);
        }
        let handle = backend.create_program(descriptor)?;
        log::debug!(
            "Linked program {:?} '{}' ({} uniforms, {} clipping planes)",
            handle,
            descriptor.name,
            descriptor.uniforms.len(),
            descriptor.num_clipping_planes
        );
        self.programs.insert(descriptor.clone(), CachedProgram { handle, used_times: 1 });
        self.descriptors.insert(handle, descriptor.clone());
        Ok(handle)
    }

    /// Drop one use of `handle`; the program is deleted when unused
    pub fn release(&mut self, handle: ProgramHandle, backend: &mut dyn GlBackend) {
        let Some(descriptor) = self.descriptors.get(&handle) else {
            return;
        };
        let Some(cached) = self.programs.get_mut(descriptor) else {
            return;
        };
        cached.used_times = cached.used_times.saturating_sub(1);
        if cached.used_times == 0 {
            self.programs.remove(descriptor);
            self.descriptors.remove(&handle);
            backend.delete_program(handle);
        }
    }

    /// Linked programs
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// No program linked
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Forget every program without deleting it (the context is gone)
    pub fn clear(&mut self) {
        self.programs.clear();
        self.descriptors.clear();
    }
}

/// Per-material binding state
#[derive(Debug, Clone)]
pub struct MaterialProperties {
    /// Program the material is linked to
    pub program: ProgramHandle,
    /// Descriptor the program was linked from
    pub descriptor: ProgramDescriptor,
    /// The material's own uniform values
    pub uniforms: UniformSet,
    /// Material version at link time
    pub version: u32,
}

impl MaterialProperties {
    /// Fresh binding; uniforms are cloned from the material template
    pub fn new(program: ProgramHandle, descriptor: ProgramDescriptor, material: &Material) -> Self {
        let mut uniforms = material.uniforms.clone();
        if descriptor.num_clipping_planes > 0 {
            uniforms.insert_value(
                UniformName::ClippingPlanes,
                UniformValue::FloatArray(vec![0.0; descriptor.num_clipping_planes * 4]),
            );
        }
        Self {
            program,
            descriptor,
            uniforms,
            version: material.version(),
        }
    }

    /// Still valid for the given descriptor and material version
    pub fn is_current(&self, descriptor: &ProgramDescriptor, version: u32) -> bool {
        self.version == version && &self.descriptor == descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Color;
    use crate::render::{GlCommand, RecordingBackend};

    fn descriptor(material: &Material) -> ProgramDescriptor {
        ProgramDescriptor::for_material(material, &LightsHash::default(), None, 0, false, &Capabilities::default())
    }

    #[test]
    fn test_equal_descriptors_share_program() {
        let mut backend = RecordingBackend::new();
        let mut cache = ProgramCache::new();
        let a = descriptor(&Material::basic(Color::WHITE));
        let b = descriptor(&Material::basic(Color::BLACK));
        assert_eq!(a, b);

        let first = cache.acquire(&a, &mut backend).unwrap();
        let second = cache.acquire(&b, &mut backend).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_release_deletes_when_unused() {
        let mut backend = RecordingBackend::new();
        let mut cache = ProgramCache::new();
        let d = descriptor(&Material::lambert(Color::WHITE));
        let handle = cache.acquire(&d, &mut backend).unwrap();
        cache.acquire(&d, &mut backend).unwrap();

        cache.release(handle, &mut backend);
        assert_eq!(cache.len(), 1);
        cache.release(handle, &mut backend);
        assert!(cache.is_empty());
        assert!(backend.commands().contains(&GlCommand::DeleteProgram(handle)));
    }

    #[test]
    fn test_light_layout_only_keys_lit_materials() {
        let lights = LightsHash { point: 2, ..LightsHash::default() };
        let caps = Capabilities::default();
        let lit = Material::lambert(Color::WHITE);
        let unlit = Material::basic(Color::WHITE);

        let lit_a = ProgramDescriptor::for_material(&lit, &LightsHash::default(), None, 0, false, &caps);
        let lit_b = ProgramDescriptor::for_material(&lit, &lights, None, 0, false, &caps);
        assert_ne!(lit_a, lit_b);

        let unlit_a = ProgramDescriptor::for_material(&unlit, &LightsHash::default(), None, 0, false, &caps);
        let unlit_b = ProgramDescriptor::for_material(&unlit, &lights, None, 0, false, &caps);
        assert_eq!(unlit_a, unlit_b);
    }

    #[test]
    fn test_fog_mode_in_descriptor() {
        let caps = Capabilities::default();
        let material = Material::basic(Color::WHITE);
        let fog = Fog::exp2(Color::BLACK, 0.1);
        let d = ProgramDescriptor::for_material(&material, &LightsHash::default(), Some(&fog), 0, false, &caps);
        assert!(d.fog && d.fog_exp2);
    }

    #[test]
    fn test_properties_track_version_and_clipping() {
        let mut material = Material::basic(Color::WHITE);
        let d = ProgramDescriptor::for_material(&material, &LightsHash::default(), None, 2, false, &Capabilities::default());
        let props = MaterialProperties::new(ProgramHandle(1), d.clone(), &material);
        assert_eq!(
            props.uniforms.get(UniformName::ClippingPlanes).map(|u| u.value().clone()),
            Some(UniformValue::FloatArray(vec![0.0; 8]))
        );
        assert!(props.is_current(&d, material.version()));

        material.needs_update();
        assert!(!props.is_current(&d, material.version()));
    }
}
