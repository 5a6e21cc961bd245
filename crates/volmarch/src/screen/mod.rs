//! Per-pixel accumulation state shared by all kernel launches, and the final compositing step.
//!
//! A [`ScreenBuffer`] owns the opaque layer (color, depth, normal), the weighted blended
//! transparency layer (accumulated color, revealage) and a constant background. Kernels mutate
//! one pixel at a time through [`PixelMut`]; [`ScreenBuffer::composited_image`] merges the layers
//! into an [`Image`] without touching the buffers.
pub mod buffer;
pub mod composite;
pub mod pixel;

pub use buffer::ScreenBuffer;
pub use composite::Image;
pub use pixel::{wboit_weight, PixelMut};
