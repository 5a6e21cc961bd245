use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use volmarch::prelude::*;
use volmarch_examples::{init_tracing, output_path, write_png};

const N: usize = 48;

/// Opaque spheres, a translucent shell and a fog volume in one ordered draw list.
fn main() -> anyhow::Result<()> {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(7);

    let mut marbles = Geometry::sphere(0.5, Vec3::ZERO)?;
    for _ in 0..24 {
        let center = Vec3::new(
            rng.random::<f32>() * 8.0 - 4.0,
            rng.random::<f32>() * 8.0 - 4.0,
            rng.random::<f32>() * 8.0 - 4.0,
        );
        let radius = 0.2 + rng.random::<f32>() * 0.4;
        marbles = &marbles + &Geometry::sphere(radius, center)?;
    }
    let shell = Geometry::sphere(5.0, Vec3::ZERO)?;

    let c = N as f32 / 2.0;
    let fog_field = Array3::from_fn([N, N, N], |i, j, k| {
        let p = Vec3::new(i as f32, j as f32, k as f32) - Vec3::splat(c);
        (1.0 - p.length() / c).max(0.0)
    })?;
    let spacing = 14.0 / N as f32;
    let fog = Volume::new(fog_field, [spacing; 3], [-7.0, -7.0, -7.0])?;

    let camera = Camera::new([9.0, 6.0, -16.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0])
        .with_resolution(300, 300)
        .with_max_depth(60.0)
        .with_background([0.02, 0.02, 0.05]);

    let list = DrawList::new()
        .geometry(&marbles, Some(Colormap::solid([0.9, 0.3, 0.2], 1.0)))
        .geometry(&shell, Some(Colormap::solid([0.3, 0.6, 1.0], 0.25)))
        .volume(
            &fog,
            VolumeOptions::new().with_colormap(Colormap::gray(0.0, 1.0)?.with_opacity(0.03)),
        );

    let mut cache = KernelCache::new();
    let mut sink = FnSink::new(|event| {
        if let RenderEvent::DrawFinished {
            index,
            kind,
            elapsed,
        } = event
        {
            info!("Draw {} ({}) took {:?}.", index, kind, elapsed);
        }
    });
    let mut buffer = ScreenBuffer::from_camera(&camera)?;
    list.render_into_with_events(&camera, &mut buffer, Some(&mut cache), &mut sink)?;
    write_png(&buffer.composited_image(), output_path("mixed-scene"))?;
    Ok(())
}
