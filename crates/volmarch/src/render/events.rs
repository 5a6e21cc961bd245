//! Event types and sinks for observing draw list execution.
//!
//! [`DrawList::render_with_events`](crate::render::DrawList::render_with_events) reports
//! progress through an [`EventSink`]. Sinks may skip event kinds they do not care about via
//! [`EventSink::wants`].
use std::time::Duration;

/// Describes events emitted while executing a draw list.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    /// Emitted before a draw launches its kernel.
    DrawStarted {
        /// Position of the draw in the list.
        index: usize,
        /// Kernel kind, one of `"volume"`, `"contour"` or `"geometry"`.
        kind: &'static str,
        /// Whether the draw takes the opaque path.
        opaque: bool,
    },

    /// Emitted after a draw has finished writing into the buffer.
    DrawFinished {
        index: usize,
        kind: &'static str,
        elapsed: Duration,
    },

    /// Non-fatal warning raised while preparing a draw.
    Warning {
        /// Context string (e.g. `draw:2`).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Discriminant of a [`RenderEvent`], used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderEventKind {
    DrawStarted,
    DrawFinished,
    Warning,
}

impl RenderEvent {
    pub fn kind(&self) -> RenderEventKind {
        match self {
            RenderEvent::DrawStarted { .. } => RenderEventKind::DrawStarted,
            RenderEvent::DrawFinished { .. } => RenderEventKind::DrawFinished,
            RenderEvent::Warning { .. } => RenderEventKind::Warning,
        }
    }
}

/// A generic event sink that accepts [`RenderEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: RenderEvent);

    /// Whether events of `kind` should be built and sent at all.
    #[inline]
    fn wants(&self, _kind: RenderEventKind) -> bool {
        true
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: RenderEvent) {}

    #[inline]
    fn wants(&self, _kind: RenderEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(RenderEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(RenderEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(RenderEvent),
{
    #[inline]
    fn send(&mut self, event: RenderEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects all events in a `Vec`.
#[derive(Default)]
pub struct VecSink {
    events: Vec<RenderEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn into_inner(self) -> Vec<RenderEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[RenderEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: RenderEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(context: &str) -> RenderEvent {
        RenderEvent::Warning {
            context: context.into(),
            message: "m".into(),
        }
    }

    #[test]
    fn vec_sink_collects_events() {
        let mut sink = VecSink::new();
        assert!(sink.is_empty());
        sink.send(warning("a"));
        sink.send(warning("b"));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.as_slice()[1], warning("b"));
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn fn_sink_invokes_callback() {
        let mut count = 0;
        let mut sink = FnSink::new(|_event| {
            count += 1;
        });
        sink.send(warning("ctx"));
        assert!(sink.wants(RenderEventKind::Warning));
        drop(sink);
        assert_eq!(count, 1);
    }

    #[test]
    fn unit_sink_wants_nothing() {
        assert!(!EventSink::wants(&(), RenderEventKind::DrawStarted));
        assert_eq!(warning("x").kind(), RenderEventKind::Warning);
    }
}
