//! Stable touch-point identities.
//!
//! Toolkits hand out arbitrary (often large or reused) ids for touch points.
//! The engine's velocity tracker indexes pointers by a small integer, so each
//! raw id is bound to the lowest free slot of a 16-slot bitset for as long as
//! the finger is down.

use static_assertions::const_assert;

use crate::error::{InputError, InputResult};
use crate::logging::targets;
use crate::native::{TouchPoint, TouchPointState};

/// Maximum number of concurrently live touch points.
pub const MAX_TOUCH_POINTS: usize = 16;

const_assert!(MAX_TOUCH_POINTS <= u16::BITS as usize);

/// Small integer identity of a live touch point, in `0..MAX_TOUCH_POINTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StableTouchId(u8);

impl StableTouchId {
    /// The slot index.
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Allocator binding raw toolkit ids to [`StableTouchId`]s.
///
/// # Invariants
///
/// - A raw id maps to the same stable id on every call until it is released.
/// - At most [`MAX_TOUCH_POINTS`] ids are live at once.
/// - Allocation always picks the lowest free slot.
#[derive(Debug, Default, Clone)]
pub struct TouchIdMapper {
    used: u16,
    bindings: Vec<(i64, StableTouchId)>,
}

impl TouchIdMapper {
    /// Create an empty mapper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live ids.
    pub fn live_count(&self) -> usize {
        self.bindings.len()
    }

    /// Look up the id bound to `raw_id` without allocating.
    pub fn get(&self, raw_id: i64) -> Option<StableTouchId> {
        self.bindings
            .iter()
            .find(|(raw, _)| *raw == raw_id)
            .map(|(_, id)| *id)
    }

    /// Return the id bound to `raw_id`, allocating the lowest free slot if unseen.
    ///
    /// Fails with [`InputError::TouchIdsExhausted`] when every slot is taken.
    pub fn map(&mut self, raw_id: i64) -> InputResult<StableTouchId> {
        if let Some(id) = self.get(raw_id) {
            return Ok(id);
        }
        let slot = self.used.trailing_ones() as usize;
        if slot >= MAX_TOUCH_POINTS {
            tracing::error!(
                target: targets::TOUCH,
                raw_id,
                live = self.bindings.len(),
                "touch id limit exceeded"
            );
            return Err(InputError::TouchIdsExhausted {
                live: self.bindings.len(),
            });
        }
        self.used |= 1 << slot;
        let id = StableTouchId(slot as u8);
        self.bindings.push((raw_id, id));
        tracing::trace!(target: targets::TOUCH, raw_id, id = slot, "allocated touch id");
        Ok(id)
    }

    /// Free the slot bound to `raw_id`. Unknown ids are ignored.
    pub fn release(&mut self, raw_id: i64) {
        if let Some(pos) = self.bindings.iter().position(|(raw, _)| *raw == raw_id) {
            let (_, id) = self.bindings.swap_remove(pos);
            self.used &= !(1 << id.0);
            tracing::trace!(target: targets::TOUCH, raw_id, id = id.0, "released touch id");
        }
    }

    /// Map every point of a batch, then release the points that lifted.
    ///
    /// Released points still carry their id in the returned list. If the
    /// batch cannot be mapped, ids allocated by this call are released again
    /// before the error is returned.
    pub fn map_batch(
        &mut self,
        points: &[TouchPoint],
    ) -> InputResult<Vec<(StableTouchId, TouchPoint)>> {
        let mut mapped = Vec::with_capacity(points.len());
        let mut fresh = Vec::new();
        for point in points {
            let known = self.get(point.raw_id).is_some();
            match self.map(point.raw_id) {
                Ok(id) => {
                    if !known {
                        fresh.push(point.raw_id);
                    }
                    mapped.push((id, *point));
                }
                Err(err) => {
                    for raw_id in fresh {
                        self.release(raw_id);
                    }
                    return Err(err);
                }
            }
        }
        for point in points {
            if point.state == TouchPointState::Released {
                self.release(point.raw_id);
            }
        }
        Ok(mapped)
    }

    /// Release every live id.
    pub fn clear(&mut self) {
        self.used = 0;
        self.bindings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn test_lowest_free_slot() {
        let mut mapper = TouchIdMapper::new();
        assert_eq!(mapper.map(100).unwrap().get(), 0);
        assert_eq!(mapper.map(200).unwrap().get(), 1);
        assert_eq!(mapper.map(300).unwrap().get(), 2);
        mapper.release(200);
        assert_eq!(mapper.map(400).unwrap().get(), 1);
    }

    #[test]
    fn test_id_stable_until_release() {
        let mut mapper = TouchIdMapper::new();
        let first = mapper.map(7).unwrap();
        mapper.map(8).unwrap();
        for _ in 0..5 {
            assert_eq!(mapper.map(7).unwrap(), first);
        }
        mapper.release(7);
        assert_eq!(mapper.get(7), None);
    }

    #[test]
    fn test_exhaustion_is_error() {
        let mut mapper = TouchIdMapper::new();
        for raw in 0..MAX_TOUCH_POINTS as i64 {
            mapper.map(raw).unwrap();
        }
        let err = mapper.map(99).unwrap_err();
        assert!(matches!(err, InputError::TouchIdsExhausted { live: 16 }));
        // Existing points still resolve.
        assert_eq!(mapper.map(3).unwrap().get(), 3);
    }

    #[test]
    fn test_release_unknown_is_noop() {
        let mut mapper = TouchIdMapper::new();
        mapper.map(1).unwrap();
        mapper.release(42);
        assert_eq!(mapper.live_count(), 1);
    }

    #[test]
    fn test_map_batch_releases_lifted_points() {
        let mut mapper = TouchIdMapper::new();
        let points = [
            TouchPoint::new(10, TouchPointState::Pressed, Point::ZERO),
            TouchPoint::new(11, TouchPointState::Released, Point::ZERO),
        ];
        let mapped = mapper.map_batch(&points).unwrap();
        assert_eq!(mapped[0].0.get(), 0);
        assert_eq!(mapped[1].0.get(), 1);
        assert_eq!(mapper.live_count(), 1);
        assert_eq!(mapper.get(11), None);
    }

    #[test]
    fn test_map_batch_rolls_back_on_exhaustion() {
        let mut mapper = TouchIdMapper::new();
        for raw in 0..15 {
            mapper.map(raw).unwrap();
        }
        let points = [
            TouchPoint::new(100, TouchPointState::Pressed, Point::ZERO),
            TouchPoint::new(101, TouchPointState::Pressed, Point::ZERO),
        ];
        assert!(mapper.map_batch(&points).is_err());
        assert_eq!(mapper.live_count(), 15);
        assert_eq!(mapper.get(100), None);
    }
}
