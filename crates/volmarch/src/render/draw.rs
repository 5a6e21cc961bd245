//! Ordered draw lists against one screen buffer.
//!
//! Draws run strictly in list order. Opaque results do not depend on that order, since every
//! draw depth-tests against the buffer; transparent accumulation across draws follows it.
//! The first failing draw stops the list; the draws before it stay in the buffer.
use std::time::Instant;

use tracing::{info, warn};

use crate::error::Result;
use crate::geometry::{Geometry, KernelCache};
use crate::render::camera::Camera;
use crate::render::color::Colormap;
use crate::render::contour::{render_contour_into, ContourOptions};
use crate::render::events::{EventSink, RenderEvent, RenderEventKind};
use crate::render::geometry::{render_geometry_cached_into, render_geometry_into};
use crate::render::{check_buffer, prepare_buffer};
use crate::render::volume::{render_volume_into, VolumeOptions};
use crate::sampling::Volume;
use crate::screen::ScreenBuffer;

/// One kernel launch of a [`DrawList`].
#[derive(Clone, Debug)]
pub enum Draw<'a> {
    Volume {
        volume: &'a Volume,
        options: VolumeOptions,
    },
    Contour {
        volume: &'a Volume,
        options: ContourOptions<'a>,
    },
    Geometry {
        geometry: &'a Geometry,
        color: Option<Colormap>,
    },
}

impl Draw<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Draw::Volume { .. } => "volume",
            Draw::Contour { .. } => "contour",
            Draw::Geometry { .. } => "geometry",
        }
    }

    /// Whether the draw writes the opaque layer.
    pub fn is_opaque(&self) -> Result<bool> {
        Ok(match self {
            Draw::Volume { .. } => false,
            Draw::Contour { options, .. } => options.resolve_colormap()?.opaque,
            Draw::Geometry { color, .. } => color.as_ref().is_none_or(|c| c.opaque),
        })
    }
}

/// Explicit, ordered sequence of draws sharing one buffer.
#[derive(Clone, Debug, Default)]
pub struct DrawList<'a> {
    draws: Vec<Draw<'a>>,
}

impl<'a> DrawList<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, draw: Draw<'a>) -> &mut Self {
        self.draws.push(draw);
        self
    }

    pub fn volume(mut self, volume: &'a Volume, options: VolumeOptions) -> Self {
        self.draws.push(Draw::Volume { volume, options });
        self
    }

    pub fn contour(mut self, volume: &'a Volume, options: ContourOptions<'a>) -> Self {
        self.draws.push(Draw::Contour { volume, options });
        self
    }

    pub fn geometry(mut self, geometry: &'a Geometry, color: Option<Colormap>) -> Self {
        self.draws.push(Draw::Geometry { geometry, color });
        self
    }

    pub fn draws(&self) -> &[Draw<'a>] {
        &self.draws
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Runs every draw in order and returns the buffer.
    pub fn render(&self, camera: &Camera, buffer: Option<ScreenBuffer>) -> Result<ScreenBuffer> {
        self.render_with_events(camera, buffer, None, &mut ())
    }

    /// Runs every draw in order on a borrowed buffer.
    ///
    /// On error the buffer holds the draws that completed before the failing one.
    pub fn render_into(&self, camera: &Camera, buffer: &mut ScreenBuffer) -> Result<()> {
        self.render_into_with_events(camera, buffer, None, &mut ())
    }

    /// Runs every draw in order, compiling geometry through `cache` when given and reporting
    /// progress to `sink`.
    pub fn render_with_events(
        &self,
        camera: &Camera,
        buffer: Option<ScreenBuffer>,
        cache: Option<&mut KernelCache>,
        sink: &mut dyn EventSink,
    ) -> Result<ScreenBuffer> {
        let mut buffer = prepare_buffer(camera, buffer)?;
        self.render_into_with_events(camera, &mut buffer, cache, sink)?;
        Ok(buffer)
    }

    /// Borrowed-buffer form of [`DrawList::render_with_events`].
    pub fn render_into_with_events(
        &self,
        camera: &Camera,
        buffer: &mut ScreenBuffer,
        mut cache: Option<&mut KernelCache>,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        check_buffer(camera, buffer)?;

        if self.draws.is_empty() {
            warn!("Draw list has no draws.");
            if sink.wants(RenderEventKind::Warning) {
                sink.send(RenderEvent::Warning {
                    context: "draw_list".into(),
                    message: "Draw list has no draws".into(),
                });
            }
            return Ok(());
        }

        for (index, draw) in self.draws.iter().enumerate() {
            let kind = draw.kind();
            let opaque = draw.is_opaque()?;
            info!("Draw {}: {} | opaque: {}.", index, kind, opaque);

            if let Some(message) = scalar_range_warning(draw) {
                warn!("Draw {}: {}.", index, message);
                if sink.wants(RenderEventKind::Warning) {
                    sink.send(RenderEvent::Warning {
                        context: format!("draw:{}", index),
                        message,
                    });
                }
            }

            if sink.wants(RenderEventKind::DrawStarted) {
                sink.send(RenderEvent::DrawStarted {
                    index,
                    kind,
                    opaque,
                });
            }
            let started = Instant::now();

            let outcome = match draw {
                Draw::Volume { volume, options } => {
                    render_volume_into(volume, camera, options, buffer)
                }
                Draw::Contour { volume, options } => {
                    render_contour_into(volume, camera, options, buffer)
                }
                Draw::Geometry { geometry, color } => match cache.as_deref_mut() {
                    Some(cache) => {
                        render_geometry_cached_into(geometry, camera, color.as_ref(), cache, buffer)
                    }
                    None => render_geometry_into(geometry, camera, color.as_ref(), buffer),
                },
            };
            if let Err(err) = outcome {
                warn!("Draw {}: {} failed: {}.", index, kind, err);
                return Err(err);
            }

            if sink.wants(RenderEventKind::DrawFinished) {
                sink.send(RenderEvent::DrawFinished {
                    index,
                    kind,
                    elapsed: started.elapsed(),
                });
            }
        }

        Ok(())
    }
}

/// Message for scalar draws whose default colormap would have an empty range.
fn scalar_range_warning(draw: &Draw<'_>) -> Option<String> {
    let field = match draw {
        Draw::Volume { volume, options } if options.colormap.is_none() => *volume,
        Draw::Contour { options, .. } if options.colormap.is_none() => options.color_field?,
        _ => return None,
    };
    match field.min_max() {
        Some((lo, hi)) if lo < hi => None,
        Some((lo, _)) => Some(format!("scalar field is constant ({lo})")),
        None => Some("scalar field has no finite samples".into()),
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::render::events::VecSink;
    use crate::sampling::Array3;

    fn camera() -> Camera {
        Camera::new([0.0, 0.0, -10.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0])
            .with_resolution(16, 16)
            .with_max_depth(40.0)
    }

    #[test]
    fn empty_list_warns_and_returns_fresh_buffer() {
        let mut sink = VecSink::new();
        let buffer = DrawList::new()
            .render_with_events(&camera(), None, None, &mut sink)
            .unwrap();
        assert_eq!(buffer.depth(8, 8), f32::INFINITY);
        assert!(matches!(sink.as_slice(), [RenderEvent::Warning { .. }]));
    }

    #[test]
    fn draws_run_in_order_and_report_events() {
        let sphere = Geometry::sphere(2.0, Vec3::ZERO).unwrap();
        let fog = Volume::new(
            Array3::from_fn([4, 4, 4], |_, _, _| 1.0).unwrap(),
            [1.0, 1.0, 1.0],
            [-2.0, -2.0, -6.0],
        )
        .unwrap();
        let list = DrawList::new()
            .geometry(&sphere, None)
            .volume(
                &fog,
                VolumeOptions::new().with_colormap(Colormap::solid([1.0, 0.0, 0.0], 0.1)),
            );

        let mut sink = VecSink::new();
        let mut cache = KernelCache::new();
        let buffer = list
            .render_with_events(&camera(), None, Some(&mut cache), &mut sink)
            .unwrap();

        assert!((buffer.depth(8, 8) - 8.0).abs() < 0.05);
        assert!(buffer.revealage(8, 8) < 1.0);
        assert_eq!(cache.len(), 1);

        let kinds: Vec<_> = sink
            .as_slice()
            .iter()
            .filter_map(|e| match e {
                RenderEvent::DrawStarted { kind, opaque, .. } => Some((*kind, *opaque)),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![("geometry", true), ("volume", false)]);
        assert_eq!(sink.len(), 4);
    }

    #[test]
    fn opaque_result_is_independent_of_order() {
        let a = Geometry::sphere(1.0, Vec3::new(0.5, 0.0, -2.0)).unwrap();
        let b = Geometry::sphere(2.0, Vec3::ZERO).unwrap();
        let red = Colormap::solid([1.0, 0.0, 0.0], 1.0);
        let blue = Colormap::solid([0.0, 0.0, 1.0], 1.0);

        let ab = DrawList::new()
            .geometry(&a, Some(red.clone()))
            .geometry(&b, Some(blue.clone()))
            .render(&camera(), None)
            .unwrap();
        let ba = DrawList::new()
            .geometry(&b, Some(blue))
            .geometry(&a, Some(red))
            .render(&camera(), None)
            .unwrap();

        for (da, db) in ab.depth_buffer().iter().zip(ba.depth_buffer()) {
            assert!(da == db || (da - db).abs() < 0.05);
        }
    }

    #[test]
    fn constant_field_without_colormap_warns() {
        let flat = Volume::from_array(Array3::from_fn([2, 2, 2], |_, _, _| 3.0).unwrap());
        let list = DrawList::new().volume(&flat, VolumeOptions::new());
        let mut sink = VecSink::new();
        list.render_with_events(&camera(), None, None, &mut sink)
            .unwrap();
        assert!(sink
            .as_slice()
            .iter()
            .any(|e| matches!(e, RenderEvent::Warning { context, .. } if context == "draw:0")));
    }

    #[test]
    fn failing_draw_keeps_earlier_draws() {
        let sphere = Geometry::sphere(2.0, Vec3::ZERO).unwrap();
        let ball = Volume::from_array(Array3::from_fn([4, 4, 4], |i, _, _| i as f32).unwrap());
        let near = Geometry::sphere(1.0, Vec3::new(0.0, 0.0, -5.0)).unwrap();
        let list = DrawList::new()
            .geometry(&sphere, None)
            .contour(&ball, ContourOptions::new(f32::NAN))
            .geometry(&near, None);

        let mut buffer = ScreenBuffer::from_camera(&camera()).unwrap();
        let mut sink = VecSink::new();
        let result = list.render_into_with_events(&camera(), &mut buffer, None, &mut sink);

        assert!(matches!(result, Err(crate::error::Error::InvalidConfig(_))));
        // The first sphere is kept and the third draw never ran.
        assert!((buffer.depth(8, 8) - 8.0).abs() < 0.05);
        let finished = sink
            .as_slice()
            .iter()
            .filter(|e| matches!(e, RenderEvent::DrawFinished { .. }))
            .count();
        assert_eq!(finished, 1);
    }

    #[test]
    fn render_into_rejects_mismatched_buffer_untouched() {
        let sphere = Geometry::sphere(2.0, Vec3::ZERO).unwrap();
        let mut buffer = ScreenBuffer::new(4, 4).unwrap();
        let list = DrawList::new().geometry(&sphere, None);
        assert!(list.render_into(&camera(), &mut buffer).is_err());
        assert!(buffer.depth_buffer().iter().all(|d| d.is_infinite()));
    }
}
