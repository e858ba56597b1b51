//! Morph target binding
//!
//! A program has a fixed number of morph slots. Each draw picks the strongest
//! non-zero influences of the object, binds the matching target attributes to
//! `morphTarget{slot}` / `morphNormal{slot}` and uploads the weights.

use std::cmp::Ordering;

use crate::geometry::Geometry;
use crate::render::GlBackend;

/// Slots available to a program
pub fn slot_count(morph_normals: bool, max_targets: usize, max_normals: usize) -> usize {
    if morph_normals {
        max_normals
    } else {
        max_targets
    }
}

/// Non-zero influences ordered by magnitude, strongest first, at most `limit`.
///
/// Equal magnitudes keep their target order.
pub fn select_influences(influences: &[f32], limit: usize) -> Vec<(usize, f32)> {
    let mut selected: Vec<(usize, f32)> = influences
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, weight)| *weight != 0.0)
        .collect();
    selected.sort_by(|a, b| b.1.abs().partial_cmp(&a.1.abs()).unwrap_or(Ordering::Equal));
    selected.truncate(limit);
    selected
}

/// Bind the selected targets and return the weight per slot (0 for unused slots)
pub fn bind_morph_targets(
    backend: &mut dyn GlBackend,
    geometry: &Geometry,
    influences: &[f32],
    morph_normals: bool,
    slots: usize,
) -> Vec<f32> {
    let positions = geometry.morph_attribute("position");
    let normals = geometry.morph_attribute("normal");
    let mut weights = vec![0.0; slots];

    for (slot, (target, weight)) in select_influences(influences, slots).into_iter().enumerate() {
        if let Some(attribute) = positions.get(target) {
            let name = format!("morphTarget{slot}");
            backend.bind_vertex_attribute(&name, attribute.id(), attribute.item_size, attribute.normalized);
        }
        if morph_normals {
            if let Some(attribute) = normals.get(target) {
                let name = format!("morphNormal{slot}");
                backend.bind_vertex_attribute(&name, attribute.id(), attribute.item_size, attribute.normalized);
            }
        }
        weights[slot] = weight;
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BufferAttribute;
    use crate::render::{GlCommand, RecordingBackend};

    #[test]
    fn test_select_strongest_first() {
        let picked = select_influences(&[0.1, -0.9, 0.0, 0.5], 8);
        assert_eq!(picked, vec![(1, -0.9), (3, 0.5), (0, 0.1)]);
    }

    #[test]
    fn test_select_respects_limit() {
        let influences = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let picked = select_influences(&influences, 4);
        assert_eq!(picked.len(), 4);
        assert_eq!(picked[0], (5, 0.6));
        assert_eq!(slot_count(true, 8, 4), 4);
        assert_eq!(slot_count(false, 8, 4), 8);
    }

    #[test]
    fn test_bind_targets_into_slots() {
        let mut geometry = Geometry::new();
        let targets = vec![
            BufferAttribute::from_f32(vec![0.0; 9], 3),
            BufferAttribute::from_f32(vec![1.0; 9], 3),
        ];
        let second = targets[1].id();
        geometry.set_morph_attribute("position", targets);

        let mut backend = RecordingBackend::new();
        let weights = bind_morph_targets(&mut backend, &geometry, &[0.0, 0.75], false, 4);
        assert_eq!(weights, vec![0.75, 0.0, 0.0, 0.0]);
        assert_eq!(
            backend.commands(),
            &[GlCommand::VertexAttribute { name: "morphTarget0".into(), buffer: second }]
        );
    }
}
