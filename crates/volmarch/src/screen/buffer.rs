//! Screen buffer storage.
use glam::Vec3;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::render::camera::Camera;
use crate::screen::pixel::PixelMut;

/// Fragment storage for a fixed `(height, width)` image.
///
/// Every buffer is row-major with the internal row `y` first: the element for pixel `(x, y)`
/// lives at `y * width + x`. Depth starts at `+inf` and revealage at `1.0`; all colors start at
/// zero.
#[derive(Clone, Debug)]
pub struct ScreenBuffer {
    height: usize,
    width: usize,
    pub(crate) opaque_color: Vec<Vec3>,
    pub(crate) depth: Vec<f32>,
    pub(crate) normal: Vec<Vec3>,
    pub(crate) transparent_accum: Vec<Vec3>,
    pub(crate) revealage: Vec<f32>,
    pub(crate) background: Vec<Vec3>,
}

impl ScreenBuffer {
    /// Allocates a buffer with every field at its initial value.
    ///
    /// Fails with [`Error::InvalidConfig`] when either dimension is zero or the pixel count
    /// overflows.
    pub fn new(height: usize, width: usize) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(Error::InvalidConfig(format!(
                "screen buffer must be non-empty, got {height}x{width}"
            )));
        }

        let len = height.checked_mul(width).ok_or_else(|| {
            Error::InvalidConfig(format!("screen buffer {height}x{width} is too large"))
        })?;
        Ok(Self {
            height,
            width,
            opaque_color: vec![Vec3::ZERO; len],
            depth: vec![f32::INFINITY; len],
            normal: vec![Vec3::ZERO; len],
            transparent_accum: vec![Vec3::ZERO; len],
            revealage: vec![1.0; len],
            background: vec![Vec3::ZERO; len],
        })
    }

    /// Creates a buffer sized to the camera image and filled with its background color.
    pub fn from_camera(camera: &Camera) -> Result<Self> {
        let mut buffer = Self::new(camera.height, camera.width)?;
        buffer.set_background(camera.background);
        Ok(buffer)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Resets every buffer, background included, to its initial value without reallocating.
    pub fn clear(&mut self) {
        self.opaque_color.fill(Vec3::ZERO);
        self.depth.fill(f32::INFINITY);
        self.normal.fill(Vec3::ZERO);
        self.transparent_accum.fill(Vec3::ZERO);
        self.revealage.fill(1.0);
        self.background.fill(Vec3::ZERO);
    }

    /// Broadcast-fills the background with a constant color.
    pub fn set_background(&mut self, rgb: impl Into<mint::Vector3<f32>>) {
        let rgb = Vec3::from(rgb.into());
        self.background.fill(rgb);
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} buffer",
            self.width,
            self.height
        );
        y * self.width + x
    }

    pub fn opaque_color(&self, x: usize, y: usize) -> Vec3 {
        self.opaque_color[self.index(x, y)]
    }

    pub fn depth(&self, x: usize, y: usize) -> f32 {
        self.depth[self.index(x, y)]
    }

    pub fn normal(&self, x: usize, y: usize) -> Vec3 {
        self.normal[self.index(x, y)]
    }

    pub fn transparent_accum(&self, x: usize, y: usize) -> Vec3 {
        self.transparent_accum[self.index(x, y)]
    }

    pub fn revealage(&self, x: usize, y: usize) -> f32 {
        self.revealage[self.index(x, y)]
    }

    pub fn background(&self, x: usize, y: usize) -> Vec3 {
        self.background[self.index(x, y)]
    }

    /// Raw depth buffer in internal row order.
    pub fn depth_buffer(&self) -> &[f32] {
        &self.depth
    }

    /// Raw revealage buffer in internal row order.
    pub fn revealage_buffer(&self) -> &[f32] {
        &self.revealage
    }

    /// Mutable view of a single pixel's stateful slice.
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> PixelMut<'_> {
        let i = self.index(x, y);
        PixelMut {
            opaque_color: &mut self.opaque_color[i],
            depth: &mut self.depth[i],
            normal: &mut self.normal[i],
            transparent_accum: &mut self.transparent_accum[i],
            revealage: &mut self.revealage[i],
        }
    }

    /// Runs `f` once per pixel in parallel. Each invocation only sees its own pixel's slice.
    pub(crate) fn for_each_pixel_mut<F>(&mut self, f: F)
    where
        F: Fn(usize, usize, PixelMut<'_>) + Send + Sync,
    {
        let width = self.width;
        self.opaque_color
            .par_chunks_mut(width)
            .zip(self.depth.par_chunks_mut(width))
            .zip(self.normal.par_chunks_mut(width))
            .zip(self.transparent_accum.par_chunks_mut(width))
            .zip(self.revealage.par_chunks_mut(width))
            .enumerate()
            .for_each(|(y, ((((opaque, depth), normal), accum), revealage))| {
                let row = opaque
                    .iter_mut()
                    .zip(depth.iter_mut())
                    .zip(normal.iter_mut())
                    .zip(accum.iter_mut())
                    .zip(revealage.iter_mut());
                for (x, ((((opaque_color, depth), normal), transparent_accum), revealage)) in
                    row.enumerate()
                {
                    f(
                        x,
                        y,
                        PixelMut {
                            opaque_color,
                            depth,
                            normal,
                            transparent_accum,
                            revealage,
                        },
                    );
                }
            });
    }
}
