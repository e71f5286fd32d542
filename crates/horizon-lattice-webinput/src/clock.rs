//! Conversion of toolkit timestamps to monotonic instants.
//!
//! Toolkits stamp events with milliseconds since an unspecified epoch. The
//! engine wants `Instant`s on its own clock. The first stamped event fixes
//! the offset between the two; later events keep their relative spacing.

use std::time::{Duration, Instant};

/// Maps toolkit millisecond timestamps onto [`Instant`].
#[derive(Debug, Clone, Default)]
pub struct EventClock {
    anchor: Option<(u64, Instant)>,
}

impl EventClock {
    /// Create a clock with no anchor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a toolkit timestamp.
    ///
    /// A zero timestamp means the toolkit did not stamp the event and maps to
    /// the current instant. Stamps earlier than the anchor clamp to it.
    pub fn to_instant(&mut self, timestamp_ms: u64) -> Instant {
        if timestamp_ms == 0 {
            return Instant::now();
        }
        let (first_ms, first_instant) = *self
            .anchor
            .get_or_insert_with(|| (timestamp_ms, Instant::now()));
        first_instant + Duration::from_millis(timestamp_ms.saturating_sub(first_ms))
    }

    /// Forget the anchor so the next stamped event re-anchors.
    pub fn reset(&mut self) {
        self.anchor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_spacing_preserved() {
        let mut clock = EventClock::new();
        let first = clock.to_instant(1_000);
        let later = clock.to_instant(1_250);
        assert_eq!(later - first, Duration::from_millis(250));
    }

    #[test]
    fn test_earlier_stamp_clamps_to_anchor() {
        let mut clock = EventClock::new();
        let first = clock.to_instant(5_000);
        assert_eq!(clock.to_instant(4_000), first);
    }

    #[test]
    fn test_reset_reanchors() {
        let mut clock = EventClock::new();
        let first = clock.to_instant(100);
        clock.reset();
        let second = clock.to_instant(10_000);
        assert!(second >= first);
        assert!(second - first < Duration::from_secs(5));
    }
}
