//! Simple path tracer example.
//!
//! Renders a small box scene with a mirror panel and saves a PPM image.

use anyhow::Result;
use glint_core::{BrdfId, Light, Material, MeshData};
use glint_renderer::{
    render_parallel, Camera, Color, KdTree, PathTracer, SahParams, SceneBuilder, TracerParams,
    Vec3,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::atomic::AtomicBool;

const XRES: u32 = 320;
const YRES: u32 = 240;

fn main() -> Result<()> {
    println!("glint path tracer - simple example");

    let start = std::time::Instant::now();
    let (scene, tree) = build_scene()?;
    println!(
        "scene committed and kd-tree built in {:?} ({} triangles)",
        start.elapsed(),
        scene.triangles().len()
    );

    let camera = Camera::pinhole(
        Vec3::new(0.0, 2.5, 7.0),
        Vec3::new(0.0, 1.5, 0.0),
        Vec3::Y,
        1.0,
    );

    let params = TracerParams {
        multisample: 16,
        russian: 0.75,
        sky_color: Color::new(0.5, 0.6, 0.8),
        sky_brightness: 1.0,
        ..TracerParams::default()
    };
    let tracer = PathTracer::new(&scene, &tree, &camera, XRES, YRES, params);

    println!("rendering {XRES}x{YRES} @ 16 spp...");
    let start = std::time::Instant::now();
    let cancel = AtomicBool::new(false);
    let (film, stats) = render_parallel(&tracer, XRES, YRES, 32, 7, &cancel);
    println!(
        "rendered in {:?}, {} rays cast",
        start.elapsed(),
        stats.rays
    );

    save_ppm(&film, "output.ppm")?;
    println!("saved to output.ppm");
    Ok(())
}

fn build_scene() -> Result<(glint_renderer::Scene, KdTree)> {
    let mut builder = SceneBuilder::new();

    let white = builder.load_material(Material::new("white", Color::new(0.85, 0.85, 0.85)))?;
    let red = builder.load_material(Material::new("red", Color::new(0.8, 0.2, 0.2)))?;
    let green = builder.load_material(Material::new("green", Color::new(0.2, 0.8, 0.2)))?;
    let mirror = builder.load_material(
        Material::new("mirror", Color::new(0.1, 0.1, 0.1))
            .with_brdf(BrdfId::Phong)
            .with_reflectivity(0.9),
    )?;

    // Floor, back wall, side walls.
    builder.add_mesh(&quad(
        white,
        [
            Vec3::new(-4.0, 0.0, 4.0),
            Vec3::new(4.0, 0.0, 4.0),
            Vec3::new(4.0, 0.0, -4.0),
            Vec3::new(-4.0, 0.0, -4.0),
        ],
        Vec3::Y,
    ))?;
    builder.add_mesh(&quad(
        white,
        [
            Vec3::new(-4.0, 0.0, -4.0),
            Vec3::new(4.0, 0.0, -4.0),
            Vec3::new(4.0, 5.0, -4.0),
            Vec3::new(-4.0, 5.0, -4.0),
        ],
        Vec3::Z,
    ))?;
    builder.add_mesh(&quad(
        red,
        [
            Vec3::new(-4.0, 0.0, 4.0),
            Vec3::new(-4.0, 0.0, -4.0),
            Vec3::new(-4.0, 5.0, -4.0),
            Vec3::new(-4.0, 5.0, 4.0),
        ],
        Vec3::X,
    ))?;
    builder.add_mesh(&quad(
        green,
        [
            Vec3::new(4.0, 0.0, -4.0),
            Vec3::new(4.0, 0.0, 4.0),
            Vec3::new(4.0, 5.0, 4.0),
            Vec3::new(4.0, 5.0, -4.0),
        ],
        -Vec3::X,
    ))?;

    // A tilted mirror panel in the middle of the room.
    let mirror_n = Vec3::new(-0.5, 0.0, 1.0).normalize();
    builder.add_mesh(&quad(
        mirror,
        [
            Vec3::new(0.5, 0.0, -1.5),
            Vec3::new(2.5, 0.0, -0.5),
            Vec3::new(2.5, 3.0, -0.5),
            Vec3::new(0.5, 3.0, -1.5),
        ],
        mirror_n,
    ))?;

    let mut scene = builder.commit()?;
    scene.add_point_lights(vec![Light::new(
        Vec3::new(0.0, 4.5, 1.0),
        Color::ONE,
        30.0,
        0.2,
    )]);

    let tree = KdTree::build(&scene, &SahParams::default());
    Ok((scene, tree))
}

fn quad(material: usize, corners: [Vec3; 4], normal: Vec3) -> MeshData {
    MeshData::new(
        corners.to_vec(),
        vec![normal; 4],
        vec![0, 1, 2, 0, 2, 3],
        material,
    )
}

fn save_ppm(film: &glint_renderer::Film, filename: &str) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", film.width, film.height)?;
    writeln!(writer, "255")?;

    for y in 0..film.height {
        for x in 0..film.width {
            let rgba = glint_renderer::radiance_to_rgba(film.get(x, y));
            writeln!(writer, "{} {} {}", rgba[0], rgba[1], rgba[2])?;
        }
    }

    Ok(())
}
