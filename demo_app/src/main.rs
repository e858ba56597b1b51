//! Headless scene demo
//!
//! Builds a small scene (a field of randomly placed cubes, a transparent
//! sphere, a line loop, a point cloud and a few lights), then renders a
//! handful of frames through the recording backend and logs what the
//! pipeline did.

use std::path::Path;

use rand::prelude::*;
use render_core::foundation::logging;
use render_core::foundation::math::Quat;
use render_core::geometry::BufferAttribute;
use render_core::prelude::*;
use render_core::render::{DrawMode, GlCommand};
use render_core::scene::LineMode;

const CONFIG_PATH: &str = "demo_app/renderer.toml";
const CUBE_COUNT: usize = 24;
const FRAMES: u32 = 5;

fn load_config() -> RendererConfig {
    if !Path::new(CONFIG_PATH).exists() {
        log::info!("No {} found, using default renderer settings", CONFIG_PATH);
        return RendererConfig::default();
    }
    match RendererConfig::load_from_file(CONFIG_PATH) {
        Ok(config) => {
            log::info!("Loaded renderer settings from {}", CONFIG_PATH);
            config
        }
        Err(e) => {
            log::warn!("Failed to load {}: {}; using defaults", CONFIG_PATH, e);
            RendererConfig::default()
        }
    }
}

fn ring(radius: f32, segments: usize) -> Geometry {
    let positions = (0..segments)
        .flat_map(|i| {
            let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
            [angle.cos() * radius, 0.0, angle.sin() * radius]
        })
        .collect();
    let mut geometry = Geometry::new();
    geometry.set_attribute("position", BufferAttribute::from_f32(positions, 3));
    geometry
}

fn star_field(rng: &mut StdRng, count: usize) -> Geometry {
    let positions = (0..count * 3).map(|_| rng.gen_range(-30.0..30.0)).collect();
    let mut geometry = Geometry::new();
    geometry.set_attribute("position", BufferAttribute::from_f32(positions, 3));
    geometry
}

/// Populate the scene; returns the ids of the cubes to animate
fn build_scene(scene: &mut Scene, rng: &mut StdRng) -> Vec<NodeId> {
    scene.fog = Some(Fog::linear(Color::from_hex(0x10_10_20), 10.0, 60.0));

    let mut floor = Node::mesh(Geometry::cube(1.0), Material::lambert(Color::from_hex(0x44_44_44)));
    floor.transform.position = Vec3::new(0.0, -1.0, 0.0);
    floor.transform.scale = Vec3::new(40.0, 0.1, 40.0);
    scene.add(floor);

    let shared_cube = SharedGeometry::new(Geometry::cube(1.0));
    let cubes = (0..CUBE_COUNT)
        .map(|_| {
            let color = Color::new(rng.gen(), rng.gen(), rng.gen());
            let material = if rng.gen_bool(0.25) {
                Material::phong(color).with_wireframe(true)
            } else {
                Material::phong(color)
            };
            let position = Vec3::new(rng.gen_range(-8.0..8.0), 0.0, rng.gen_range(-8.0..8.0));
            scene.add(
                Node::mesh(shared_cube.clone(), material)
                    .with_position(position)
                    .with_cast_shadow(true),
            )
        })
        .collect();

    scene.add(
        Node::mesh(
            Geometry::sphere(1.5, 24, 16),
            Material::standard(Color::from_hex(0x33_88_ff), 0.3, 0.1).with_opacity(0.4),
        )
        .with_position(Vec3::new(0.0, 1.5, 0.0)),
    );
    scene.add(Node::line(ring(10.0, 64), Material::line_basic(Color::WHITE).with_linewidth(2.0), LineMode::Loop));
    scene.add(Node::points(star_field(rng, 200), Material::points(Color::WHITE, 0.2)));

    scene.add(Node::light(Light::ambient(Color::WHITE, 0.2)));
    scene.add(
        Node::light(Light::directional(Color::WHITE, 0.8))
            .with_position(Vec3::new(5.0, 10.0, 5.0))
            .with_cast_shadow(true),
    );
    scene.add(
        Node::light(Light::point(Color::from_hex(0xff_aa_66), 1.0, 20.0, 2.0))
            .with_position(Vec3::new(-3.0, 4.0, 2.0))
            .with_cast_shadow(true),
    );

    cubes
}

fn spin(scene: &mut Scene, cubes: &[NodeId], angle: f32) {
    let rotation = Quat::from_axis_angle(&Vec3::y_axis(), angle);
    for &id in cubes {
        if let Some(node) = scene.get_mut(id) {
            node.transform.rotation = rotation;
        }
    }
}

fn log_frame(renderer: &Renderer<RecordingBackend>) {
    let info = renderer.info();
    log::info!(
        "frame {}: {} calls, {} vertices, {} faces, {} lines, {} points ({} programs, {} geometries)",
        info.render.frame,
        info.render.calls,
        info.render.vertices,
        info.render.faces,
        info.render.lines,
        info.render.points,
        info.memory.programs,
        info.memory.geometries
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = load_config();
    let mut renderer = Renderer::new(RecordingBackend::new(), config);
    renderer.set_size(1280, 720);

    let mut rng = StdRng::seed_from_u64(7);
    let mut scene = Scene::new();
    let cubes = build_scene(&mut scene, &mut rng);

    let mut camera = Camera::perspective(60.0, 1280.0 / 720.0, 0.1, 100.0);
    camera.set_position(Vec3::new(0.0, 8.0, 18.0));
    camera.look_at(Vec3::zeros(), Vec3::y());

    for frame in 0..FRAMES {
        spin(&mut scene, &cubes, frame as f32 * 0.1);
        renderer.render(&mut scene, &mut camera, None, false)?;
        log_frame(&renderer);
    }

    // One more frame into an offscreen target, as a post-processing chain would.
    let target = RenderTarget::new(512, 512);
    renderer.render(&mut scene, &mut camera, Some(&target), true)?;
    log_frame(&renderer);

    let commands = renderer.backend_mut().take_commands();
    let wireframe_draws = commands
        .iter()
        .filter(|c| matches!(c, GlCommand::DrawElements { mode: DrawMode::Lines, .. }))
        .count();
    log::info!(
        "Recorded {} backend commands, {} wireframe draws",
        commands.len(),
        wireframe_draws
    );
    Ok(())
}
