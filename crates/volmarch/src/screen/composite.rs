//! Compositing of the opaque and transparent layers into a final RGBA image.
use glam::Vec3;
use rayon::prelude::*;

use crate::screen::ScreenBuffer;

/// Composited RGBA image with the top row first.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub data: Vec<[f32; 4]>,
}

impl Image {
    /// RGBA value at column `x` of output row `row` (row 0 is the top of the image).
    pub fn pixel(&self, x: usize, row: usize) -> [f32; 4] {
        self.data[row * self.width + x]
    }

    /// Quantizes to 8-bit RGBA, clamping each channel to `[0, 1]` first. NaN maps to 0.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.data
            .iter()
            .flat_map(|px| px.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect()
    }
}

impl ScreenBuffer {
    /// Merges the opaque and transparent layers into one RGBA image.
    ///
    /// The base color is the opaque color where a depth was written and the background
    /// elsewhere; with `alpha = 1 - revealage` the result is
    /// `base * (1 - alpha) + transparent_accum * alpha`, alpha channel always `1.0`. The output
    /// is flipped vertically: output row 0 is the last internal row. The buffers are only read.
    pub fn composited_image(&self) -> Image {
        let (width, height) = (self.width(), self.height());
        let mut data = vec![[0.0f32; 4]; width * height];

        data.par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, out)| {
                let y = height - row - 1;
                let start = y * width;
                for (x, px) in out.iter_mut().enumerate() {
                    let i = start + x;
                    let base = if self.depth[i] != f32::INFINITY {
                        self.opaque_color[i]
                    } else {
                        self.background[i]
                    };
                    let alpha = 1.0 - self.revealage[i];
                    let color: Vec3 = base * (1.0 - alpha) + self.transparent_accum[i] * alpha;
                    *px = [color.x, color.y, color.z, 1.0];
                }
            });

        Image {
            width,
            height,
            data,
        }
    }
}
