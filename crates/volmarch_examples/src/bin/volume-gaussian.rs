use glam::Vec3;
use volmarch::prelude::*;
use volmarch_examples::{init_tracing, output_path, write_png};

const N: usize = 80;

/// Two overlapping Gaussian blobs, rendered as a translucent volume with the jet map.
fn main() -> anyhow::Result<()> {
    init_tracing();

    let centers = [Vec3::new(30.0, 40.0, 40.0), Vec3::new(52.0, 38.0, 44.0)];
    let field = Array3::from_fn([N, N, N], |i, j, k| {
        let p = Vec3::new(i as f32, j as f32, k as f32);
        centers
            .iter()
            .map(|c| (-(p - *c).length_squared() / 120.0).exp())
            .sum()
    })?;
    let volume = Volume::from_array(field);

    let camera = Camera::new([40.0, 40.0, -90.0], [40.0, 40.0, 40.0], [0.0, 1.0, 0.0])
        .with_resolution(256, 256)
        .with_max_depth(300.0);

    let colormap = Colormap::jet(0.0, 1.0)?.with_opacity(0.02);
    let options = VolumeOptions::new().with_colormap(colormap);
    let buffer = render_volume(&volume, &camera, &options, None)?;
    write_png(&buffer.composited_image(), output_path("volume-gaussian"))?;

    // Same field with the default colormap and a coarser step.
    let buffer = render_volume(
        &volume,
        &camera,
        &VolumeOptions::new().with_step_size(2.0),
        None,
    )?;
    write_png(&buffer.composited_image(), output_path("volume-gaussian-default"))?;
    Ok(())
}
