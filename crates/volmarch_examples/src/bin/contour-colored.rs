use volmarch::prelude::*;
use volmarch_examples::{init_tracing, output_path, write_png};

const N: usize = 96;

/// Gyroid isosurface colored by height, rendered once opaque and once translucent.
fn main() -> anyhow::Result<()> {
    init_tracing();

    let scale = std::f32::consts::TAU * 2.0 / N as f32;
    let gyroid = Array3::from_fn([N, N, N], |i, j, k| {
        let (x, y, z) = (i as f32 * scale, j as f32 * scale, k as f32 * scale);
        x.sin() * y.cos() + y.sin() * z.cos() + z.sin() * x.cos()
    })?;
    let height = Array3::from_fn([N, N, N], |_, j, _| j as f32)?;

    let volume = Volume::new(gyroid, [0.5, 0.5, 0.5], [-24.0, -24.0, -24.0])?;
    let color_field = Volume::new(height, [0.5, 0.5, 0.5], [-24.0, -24.0, -24.0])?;

    let camera = Camera::new([60.0, 45.0, -70.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0])
        .with_resolution(320, 320)
        .with_max_depth(250.0)
        .with_background([1.0, 1.0, 1.0]);

    let opaque = ContourOptions::new(0.0)
        .with_color_field(&color_field)
        .with_gradient(GradientMode::Interpolated);
    let buffer = render_contour(&volume, &camera, &opaque, None)?;
    write_png(&buffer.composited_image(), output_path("contour-colored"))?;

    let translucent = ContourOptions::new(0.0)
        .with_color_field(&color_field)
        .with_colormap(Colormap::jet(0.0, N as f32)?.with_opacity(0.35));
    let buffer = render_contour(&volume, &camera, &translucent, None)?;
    write_png(
        &buffer.composited_image(),
        output_path("contour-colored-translucent"),
    )?;

    Ok(())
}
