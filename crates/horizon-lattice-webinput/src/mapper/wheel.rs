//! Wheel conversion.
//!
//! Angle deltas are turned into ticks with the configured per-step constant
//! (120 units per notch by default) and ticks into pixels with the
//! configured lines-per-step and pixels-per-line. Devices that report exact
//! pixel deltas are marked precise; precise and tick-based events are never
//! coalesced together.

use std::time::Instant;

use crate::canonical::{EventId, WheelEvent, WheelPhase};
use crate::native::{NativeWheelEvent, ScrollPhase};

use super::EventMapper;

/// Split a native phase into canonical phase and momentum phase.
pub fn wheel_phases(phase: ScrollPhase) -> (WheelPhase, WheelPhase) {
    match phase {
        ScrollPhase::NoPhase => (WheelPhase::None, WheelPhase::None),
        ScrollPhase::Begin => (WheelPhase::Began, WheelPhase::None),
        ScrollPhase::Update => (WheelPhase::Changed, WheelPhase::None),
        ScrollPhase::End => (WheelPhase::Ended, WheelPhase::None),
        ScrollPhase::Momentum => (WheelPhase::None, WheelPhase::Changed),
    }
}

impl EventMapper {
    /// Convert a wheel event. Each call allocates a fresh event id.
    pub fn map_wheel(&self, event: &NativeWheelEvent, timestamp: Instant) -> WheelEvent {
        let per_step = self.config.wheel_deltas_per_step();
        let wheel_ticks_x = event.angle_delta.x / per_step;
        let wheel_ticks_y = event.angle_delta.y / per_step;

        let precise = event
            .pixel_delta
            .filter(|delta| delta.x != 0.0 || delta.y != 0.0);
        let (delta_x, delta_y) = match precise {
            Some(pixels) => (pixels.x, pixels.y),
            None => {
                let pixels_per_tick =
                    self.config.wheel_scroll_lines() as f32 * self.config.scroll_step_pixels();
                (wheel_ticks_x * pixels_per_tick, wheel_ticks_y * pixels_per_tick)
            }
        };
        let (phase, momentum_phase) = wheel_phases(event.phase);

        WheelEvent {
            delta_x,
            delta_y,
            wheel_ticks_x,
            wheel_ticks_y,
            phase,
            momentum_phase,
            has_precise_scrolling_deltas: precise.is_some(),
            position: event.position,
            global_position: event.global_position,
            modifiers: self.modifiers(event.modifiers, event.buttons),
            event_id: EventId::next(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InputConfig, Platform};
    use crate::geometry::Point;

    #[test]
    fn test_one_notch_scrolls_three_lines() {
        let m = EventMapper::new(InputConfig::new().with_platform(Platform::Linux));
        let event = NativeWheelEvent::new(Point::new(0.0, -120.0), Point::ZERO);
        let wheel = m.map_wheel(&event, Instant::now());
        assert_eq!(wheel.wheel_ticks_y, -1.0);
        assert_eq!(wheel.delta_y, -60.0);
        assert_eq!(wheel.delta_x, 0.0);
        assert!(!wheel.has_precise_scrolling_deltas);
    }

    #[test]
    fn test_configured_lines() {
        let m = EventMapper::new(InputConfig::new().with_wheel_scroll_lines(5));
        let event = NativeWheelEvent::new(Point::new(60.0, 0.0), Point::ZERO);
        let wheel = m.map_wheel(&event, Instant::now());
        assert_eq!(wheel.wheel_ticks_x, 0.5);
        assert_eq!(wheel.delta_x, 50.0);
    }

    #[test]
    fn test_pixel_deltas_are_precise() {
        let m = EventMapper::default();
        let event = NativeWheelEvent::new(Point::new(0.0, 24.0), Point::ZERO)
            .with_pixel_delta(Point::new(0.0, 7.0))
            .with_phase(ScrollPhase::Update);
        let wheel = m.map_wheel(&event, Instant::now());
        assert!(wheel.has_precise_scrolling_deltas);
        assert_eq!(wheel.delta_y, 7.0);
        assert_eq!(wheel.phase, WheelPhase::Changed);
    }

    #[test]
    fn test_momentum_phase() {
        assert_eq!(
            wheel_phases(ScrollPhase::Momentum),
            (WheelPhase::None, WheelPhase::Changed)
        );
        assert_eq!(wheel_phases(ScrollPhase::End), (WheelPhase::Ended, WheelPhase::None));
    }

    #[test]
    fn test_ids_increase() {
        let m = EventMapper::default();
        let event = NativeWheelEvent::new(Point::new(0.0, 120.0), Point::ZERO);
        let a = m.map_wheel(&event, Instant::now());
        let b = m.map_wheel(&event, Instant::now());
        assert!(a.event_id < b.event_id);
    }
}
