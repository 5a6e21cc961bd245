use volmarch::prelude::*;
use volmarch_examples::{init_tracing, output_path, write_png};

const N: usize = 64;

/// Builds a `u16` volume as raw little-endian bytes, the layout of most `.raw` scan dumps,
/// and renders it through the byte adapter.
fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut bytes = Vec::with_capacity(N * N * N * 2);
    for i in 0..N {
        for j in 0..N {
            for k in 0..N {
                let d = [i, j, k].map(|v| v as f32 - 32.0);
                let radius = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
                let value = (4000.0 * (-(radius - 20.0).powi(2) / 8.0).exp()) as u16;
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
    }

    let array = Array3::from_le_bytes(&bytes, "u16", [N, N, N])?;
    let volume = Volume::new(array, [1.0, 1.0, 1.5], [0.0, 0.0, 0.0])?;

    let camera = Camera::new([32.0, 80.0, -60.0], [32.0, 32.0, 48.0], [0.0, 1.0, 0.0])
        .with_resolution(256, 256)
        .with_max_depth(300.0);

    let buffer = render_contour(&volume, &camera, &ContourOptions::new(2000.0), None)?;
    write_png(&buffer.composited_image(), output_path("volume-raw-bytes"))?;
    Ok(())
}
