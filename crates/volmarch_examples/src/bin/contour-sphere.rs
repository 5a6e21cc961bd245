use glam::Vec3;
use volmarch::prelude::*;
use volmarch_examples::{init_tracing, output_path, write_png};

const N: usize = 64;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let c = N as f32 / 2.0;
    let field = Array3::from_fn([N, N, N], |i, j, k| {
        let p = Vec3::new(i as f32, j as f32, k as f32) - Vec3::splat(c);
        if p.length() <= 16.0 {
            1.0
        } else {
            0.0
        }
    })?;
    let volume = Volume::new(field, [1.0, 1.0, 1.0], [0.0, 0.0, 0.0])?;

    let camera = Camera::new([c, c, c - 100.0], [c, c, c], [0.0, 1.0, 0.0])
        .with_resolution(256, 256)
        .with_max_depth(400.0)
        .with_background([0.1, 0.1, 0.15]);

    let buffer = render_contour(&volume, &camera, &ContourOptions::new(0.5), None)?;
    write_png(&buffer.composited_image(), output_path("contour-sphere"))?;
    Ok(())
}
