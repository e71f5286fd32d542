//! Touchpad gesture conversion.
//!
//! Only zoom-related platform gestures have engine counterparts: begin/end
//! bracket a pinch, zoom steps become pinch updates and smart zoom becomes a
//! double tap. Everything else is dropped.

use std::time::Instant;

use crate::canonical::{GestureEvent, GestureKind, GestureSource};
use crate::logging::targets;
use crate::native::{NativeButtons, NativeGestureEvent, NativeGestureKind};

use super::EventMapper;

impl EventMapper {
    /// Convert a platform gesture, or `None` if the engine has no equivalent.
    pub fn map_gesture(&self, event: &NativeGestureEvent, timestamp: Instant) -> Option<GestureEvent> {
        let kind = match event.kind {
            NativeGestureKind::Begin | NativeGestureKind::End | NativeGestureKind::Zoom(_)
                if !self.config.pinch_to_zoom() =>
            {
                tracing::debug!(target: targets::POINTER, kind = ?event.kind, "pinch zoom disabled");
                return None;
            }
            NativeGestureKind::Begin => GestureKind::PinchBegin,
            NativeGestureKind::End => GestureKind::PinchEnd,
            NativeGestureKind::Zoom(value) => GestureKind::PinchUpdate { scale: 1.0 + value },
            NativeGestureKind::SmartZoom => GestureKind::DoubleTap,
            other => {
                tracing::info!(target: targets::POINTER, kind = ?other, "unsupported gesture dropped");
                return None;
            }
        };
        Some(GestureEvent {
            kind,
            source: GestureSource::Touchpad,
            position: event.position,
            global_position: event.global_position,
            modifiers: self.modifiers(event.modifiers, NativeButtons::empty()),
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InputConfig;
    use crate::geometry::Point;

    fn gesture(kind: NativeGestureKind) -> NativeGestureEvent {
        NativeGestureEvent::new(kind, Point::new(5.0, 5.0))
    }

    #[test]
    fn test_zoom_becomes_pinch_update() {
        let m = EventMapper::default();
        let out = m.map_gesture(&gesture(NativeGestureKind::Zoom(0.25)), Instant::now()).unwrap();
        assert_eq!(out.kind, GestureKind::PinchUpdate { scale: 1.25 });
        assert_eq!(out.source, GestureSource::Touchpad);
    }

    #[test]
    fn test_begin_end_and_smart_zoom() {
        let m = EventMapper::default();
        let now = Instant::now();
        assert_eq!(
            m.map_gesture(&gesture(NativeGestureKind::Begin), now).unwrap().kind,
            GestureKind::PinchBegin
        );
        assert_eq!(
            m.map_gesture(&gesture(NativeGestureKind::End), now).unwrap().kind,
            GestureKind::PinchEnd
        );
        assert_eq!(
            m.map_gesture(&gesture(NativeGestureKind::SmartZoom), now).unwrap().kind,
            GestureKind::DoubleTap
        );
    }

    #[test]
    fn test_unsupported_gestures_dropped() {
        let m = EventMapper::default();
        let now = Instant::now();
        assert!(m.map_gesture(&gesture(NativeGestureKind::Rotate(15.0)), now).is_none());
        assert!(m.map_gesture(&gesture(NativeGestureKind::Swipe), now).is_none());
        assert!(m.map_gesture(&gesture(NativeGestureKind::Pan), now).is_none());
    }

    #[test]
    fn test_pinch_disabled() {
        let m = EventMapper::new(InputConfig::new().with_pinch_to_zoom(false));
        let now = Instant::now();
        assert!(m.map_gesture(&gesture(NativeGestureKind::Zoom(0.1)), now).is_none());
        assert!(m.map_gesture(&gesture(NativeGestureKind::SmartZoom), now).is_some());
    }
}
