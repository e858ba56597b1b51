//! Geometry registry
//!
//! Tracks which attribute versions the GPU holds. A geometry is synchronized
//! at most once per frame no matter how many nodes share it, and the derived
//! wireframe index buffer is cached until its source changes.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::geometry::{AttributeId, BufferAttribute, Geometry, GeometryId};
use crate::render::{BufferTarget, GlBackend};

#[derive(Debug, Clone)]
struct WireframeEntry {
    source: (Option<AttributeId>, u32, u32),
    attribute: BufferAttribute,
}

/// GPU-side bookkeeping of geometries
#[derive(Debug, Default)]
pub struct GeometryRegistry {
    frame: u64,
    updated: HashMap<GeometryId, u64>,
    uploaded: HashMap<AttributeId, u32>,
    owned: HashMap<GeometryId, Vec<AttributeId>>,
    wireframes: HashMap<GeometryId, WireframeEntry>,
}

fn upload_if_changed(
    uploaded: &mut HashMap<AttributeId, u32>,
    attribute: &BufferAttribute,
    target: BufferTarget,
    backend: &mut dyn GlBackend,
) {
    if uploaded.get(&attribute.id()) != Some(&attribute.version()) {
        backend.upload_buffer(attribute.id(), target, attribute.data.as_bytes(), attribute.dynamic);
        uploaded.insert(attribute.id(), attribute.version());
    }
}

fn build_wireframe(
    geometry: &Geometry,
    source: (Option<AttributeId>, u32, u32),
    uploaded: &mut HashMap<AttributeId, u32>,
    backend: &mut dyn GlBackend,
) -> WireframeEntry {
    let attribute = BufferAttribute::index(geometry.wireframe_indices());
    upload_if_changed(uploaded, &attribute, BufferTarget::ElementArray, backend);
    log::debug!("Built wireframe index for geometry {:?} ({} indices)", geometry.id(), attribute.count());
    WireframeEntry { source, attribute }
}

impl GeometryRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new frame; every geometry may synchronize once more
    pub fn begin_frame(&mut self) {
        self.frame += 1;
    }

    /// Number of geometries seen
    pub fn geometry_count(&self) -> usize {
        self.updated.len()
    }

    /// Upload changed attributes of `geometry`, once per frame
    pub fn update(&mut self, geometry: &Geometry, backend: &mut dyn GlBackend) {
        if self.updated.get(&geometry.id()) == Some(&self.frame) {
            return;
        }
        self.updated.insert(geometry.id(), self.frame);

        let mut ids = Vec::new();
        if let Some(index) = geometry.index() {
            self.sync(index, BufferTarget::ElementArray, backend);
            ids.push(index.id());
        }
        for (_, attribute) in geometry.attributes() {
            self.sync(attribute, BufferTarget::Array, backend);
            ids.push(attribute.id());
        }
        for name in ["position", "normal"] {
            for attribute in geometry.morph_attribute(name) {
                self.sync(attribute, BufferTarget::Array, backend);
                ids.push(attribute.id());
            }
        }
        self.owned.insert(geometry.id(), ids);
    }

    fn sync(&mut self, attribute: &BufferAttribute, target: BufferTarget, backend: &mut dyn GlBackend) {
        upload_if_changed(&mut self.uploaded, attribute, target, backend);
    }

    /// Line-list index buffer outlining the triangles of `geometry`.
    ///
    /// Regenerated when the index (or, for non-indexed geometry, the
    /// position attribute) is replaced or bumps its version.
    pub fn wireframe_attribute(&mut self, geometry: &Geometry, backend: &mut dyn GlBackend) -> &BufferAttribute {
        let source = match (geometry.index(), geometry.attribute("position")) {
            (Some(index), _) => (Some(index.id()), index.version(), index.count()),
            (None, Some(position)) => (Some(position.id()), position.version(), position.count()),
            (None, None) => (None, 0, 0),
        };
        let uploaded = &mut self.uploaded;
        let entry = match self.wireframes.entry(geometry.id()) {
            Entry::Occupied(entry) if entry.get().source == source => entry.into_mut(),
            Entry::Occupied(mut entry) => {
                let stale = entry.get().attribute.id();
                backend.delete_buffer(stale);
                uploaded.remove(&stale);
                entry.insert(build_wireframe(geometry, source, uploaded, backend));
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(build_wireframe(geometry, source, uploaded, backend)),
        };
        &entry.attribute
    }

    /// Release every GPU buffer of a geometry
    pub fn dispose(&mut self, geometry: GeometryId, backend: &mut dyn GlBackend) {
        for id in self.owned.remove(&geometry).unwrap_or_default() {
            if self.uploaded.remove(&id).is_some() {
                backend.delete_buffer(id);
            }
        }
        if let Some(entry) = self.wireframes.remove(&geometry) {
            self.uploaded.remove(&entry.attribute.id());
            backend.delete_buffer(entry.attribute.id());
        }
        self.updated.remove(&geometry);
    }

    /// Forget everything the GPU held (after a context loss)
    pub fn reset(&mut self) {
        self.updated.clear();
        self.uploaded.clear();
        self.owned.clear();
        self.wireframes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{GlCommand, RecordingBackend};

    fn uploads(backend: &RecordingBackend) -> usize {
        backend
            .commands()
            .iter()
            .filter(|c| matches!(c, GlCommand::UploadBuffer { .. }))
            .count()
    }

    #[test]
    fn test_update_once_per_frame() {
        let mut registry = GeometryRegistry::new();
        let mut backend = RecordingBackend::new();
        let mut cube = Geometry::cube(1.0);
        registry.begin_frame();
        registry.update(&cube, &mut backend);
        assert_eq!(uploads(&backend), 4);

        cube.attribute_mut("position").unwrap().needs_update();
        registry.update(&cube, &mut backend);
        assert_eq!(uploads(&backend), 4);

        registry.begin_frame();
        registry.update(&cube, &mut backend);
        assert_eq!(uploads(&backend), 5);
        assert_eq!(registry.geometry_count(), 1);
    }

    #[test]
    fn test_wireframe_cached_until_index_changes() {
        let mut registry = GeometryRegistry::new();
        let mut backend = RecordingBackend::new();
        let mut geometry = Geometry::new();
        geometry.set_index(Some(BufferAttribute::index(vec![0, 1, 2])));

        let first = registry.wireframe_attribute(&geometry, &mut backend).id();
        assert_eq!(registry.wireframe_attribute(&geometry, &mut backend).id(), first);
        assert_eq!(registry.wireframe_attribute(&geometry, &mut backend).count(), 6);

        geometry.set_index(Some(BufferAttribute::index(vec![0, 1, 2, 2, 1, 3])));
        let second = registry.wireframe_attribute(&geometry, &mut backend);
        assert_ne!(second.id(), first);
        assert_eq!(second.count(), 12);
        assert!(backend.commands().contains(&GlCommand::DeleteBuffer(first)));
    }

    #[test]
    fn test_dispose_deletes_buffers() {
        let mut registry = GeometryRegistry::new();
        let mut backend = RecordingBackend::new();
        let cube = Geometry::cube(1.0);
        registry.begin_frame();
        registry.update(&cube, &mut backend);
        registry.dispose(cube.id(), &mut backend);
        let deletes = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, GlCommand::DeleteBuffer(_)))
            .count();
        assert_eq!(deletes, 4);
        assert_eq!(registry.geometry_count(), 0);
    }
}
