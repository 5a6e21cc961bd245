use std::f32::consts::{FRAC_PI_4, FRAC_PI_6};

use glam::{Vec2, Vec3};
use volmarch::prelude::*;
use volmarch_examples::{init_tracing, output_path, write_png};

/// Every primitive and combinator side by side.
fn main() -> anyhow::Result<()> {
    init_tracing();

    let sphere = Geometry::sphere(1.0, Vec3::new(-4.5, 0.0, 0.0))?;
    let frame = Geometry::box_frame(
        Vec3::new(-3.0, -1.0, -1.0),
        Vec3::new(-1.0, 1.0, 1.0),
        0.1,
    )?;
    let cone = Geometry::cone(
        Vec2::new(FRAC_PI_6.sin(), FRAC_PI_6.cos()),
        1.5,
        Vec3::new(0.5, 0.75, 0.0),
    )?;
    let cylinder = Geometry::cylinder(0.6, 1.0, Vec3::new(2.5, 0.0, 0.0))?;
    let arrow = Geometry::arrow(0.8, Vec3::new(4.5, -0.8, 0.0))?;

    let carved = &Geometry::sphere(1.2, Vec3::ZERO)?
        - &Geometry::cylinder(0.5, 2.0, Vec3::ZERO)?.rotate(FRAC_PI_4, Vec3::X);
    let lens = &Geometry::sphere(1.0, Vec3::new(-0.5, 0.0, 0.0))?
        & &Geometry::sphere(1.0, Vec3::new(0.5, 0.0, 0.0))?;

    let row = &(&(&(&sphere + &frame) + &cone) + &cylinder) + &arrow;
    let booleans = &carved.translate(Vec3::new(-1.5, -3.0, 0.0))
        + &lens.translate(Vec3::new(1.5, -3.0, 0.0));
    let scene = &row + &booleans;

    let camera = Camera::new([0.0, 1.5, -14.0], [0.0, -1.0, 0.0], [0.0, 1.0, 0.0])
        .with_resolution(300, 480)
        .with_max_depth(40.0)
        .with_background([0.05, 0.05, 0.08]);

    let mut cache = KernelCache::new();
    let buffer = render_geometry_cached(
        &scene,
        &camera,
        Some(&Colormap::solid([0.9, 0.7, 0.3], 1.0)),
        &mut cache,
        None,
    )?;
    write_png(&buffer.composited_image(), output_path("geometry-shapes"))?;
    Ok(())
}
