use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;
use volmarch::screen::Image;

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// `<crate>/output/<name>.png`.
pub fn output_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("output")
        .join(format!("{name}.png"))
}

/// Writes `image` as an 8-bit RGBA PNG, creating parent directories as needed.
pub fn write_png(image: &Image, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let width = u32::try_from(image.width)?;
    let height = u32::try_from(image.height)?;
    let rgba = image::RgbaImage::from_raw(width, height, image.to_rgba8())
        .ok_or_else(|| anyhow!("image buffer does not match {}x{}", width, height))?;
    rgba.save(path)
        .with_context(|| format!("writing {}", path.display()))?;

    info!("Wrote {}.", path.display());
    Ok(())
}
