//! Per-target wheel event flow control.
//!
//! At most one non-final wheel event is in flight per render target. While
//! the engine has not acknowledged it, new wheel input is queued and merged
//! into the queue tail when the two events are compatible.

use std::collections::VecDeque;

use slotmap::SecondaryMap;

use crate::canonical::{CanonicalEvent, EventId, WheelEvent};
use crate::collaborators::{InputRouter, TargetHandle};
use crate::logging::targets;

#[derive(Debug, Default)]
struct WheelQueue {
    /// Event awaiting acknowledgement. `None` means idle.
    in_flight: Option<EventId>,
    /// Last final event forwarded; its acknowledgement is expected but
    /// changes nothing.
    last_ended: Option<EventId>,
    pending: VecDeque<WheelEvent>,
}

impl WheelQueue {
    fn forward(&mut self, target: TargetHandle, event: WheelEvent, router: &mut dyn InputRouter) {
        if event.is_ended() {
            self.last_ended = Some(event.event_id);
        } else {
            self.in_flight = Some(event.event_id);
        }
        tracing::trace!(
            target: targets::WHEEL,
            id = event.event_id.get(),
            dx = event.delta_x,
            dy = event.delta_y,
            ack_pending = self.in_flight.is_some(),
            "wheel forwarded"
        );
        router.route_canonical_event(target, CanonicalEvent::Wheel(event));
    }

    fn drain(&mut self, target: TargetHandle, router: &mut dyn InputRouter) {
        while self.in_flight.is_none() {
            let Some(next) = self.pending.pop_front() else {
                break;
            };
            self.forward(target, next, router);
        }
    }
}

/// Whether `next` may be merged into `queued`.
pub fn can_coalesce(queued: &WheelEvent, next: &WheelEvent) -> bool {
    queued.phase == next.phase
        && queued.momentum_phase == next.momentum_phase
        && queued.modifiers == next.modifiers
        && queued.has_precise_scrolling_deltas == next.has_precise_scrolling_deltas
}

/// Merge `next` into `queued`. Deltas and ticks add up; position and time
/// come from the newer event; the queued event keeps its id.
pub fn coalesce(queued: &mut WheelEvent, next: &WheelEvent) {
    queued.delta_x += next.delta_x;
    queued.delta_y += next.delta_y;
    queued.wheel_ticks_x += next.wheel_ticks_x;
    queued.wheel_ticks_y += next.wheel_ticks_y;
    queued.position = next.position;
    queued.global_position = next.global_position;
    queued.timestamp = next.timestamp;
}

/// Wheel queues keyed by render target.
#[derive(Debug, Default)]
pub struct WheelCoalescer {
    queues: SecondaryMap<TargetHandle, WheelQueue>,
}

impl WheelCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward `event` now, or queue it behind the event in flight.
    pub fn handle_wheel(
        &mut self,
        target: TargetHandle,
        event: WheelEvent,
        router: &mut dyn InputRouter,
    ) {
        // No entry for a handle whose slot was reused by a newer target.
        let Some(entry) = self.queues.entry(target) else {
            tracing::warn!(target: targets::WHEEL, "wheel event for stale target routed without flow control");
            router.route_canonical_event(target, CanonicalEvent::Wheel(event));
            return;
        };
        let queue = entry.or_default();

        if queue.in_flight.is_none() {
            queue.forward(target, event, router);
            return;
        }

        match queue.pending.back_mut() {
            Some(tail) if can_coalesce(tail, &event) => {
                coalesce(tail, &event);
                tracing::trace!(
                    target: targets::WHEEL,
                    id = tail.event_id.get(),
                    dy = tail.delta_y,
                    "wheel coalesced"
                );
            }
            _ => {
                tracing::trace!(
                    target: targets::WHEEL,
                    id = event.event_id.get(),
                    queued = queue.pending.len() + 1,
                    "wheel queued"
                );
                queue.pending.push_back(event);
            }
        }
    }

    /// Process an acknowledgement. Returns `false` if `event_id` is not a
    /// wheel event this coalescer forwarded.
    pub fn on_ack(&mut self, event_id: EventId, router: &mut dyn InputRouter) -> bool {
        for (target, queue) in self.queues.iter_mut() {
            if queue.last_ended == Some(event_id) {
                queue.last_ended = None;
                return true;
            }
            if queue.in_flight != Some(event_id) {
                continue;
            }
            queue.in_flight = None;
            tracing::debug!(
                target: targets::WHEEL,
                id = event_id.get(),
                pending = queue.pending.len(),
                "wheel acknowledged"
            );
            queue.drain(target, router);
            return true;
        }
        false
    }

    pub fn is_ack_pending(&self, target: TargetHandle) -> bool {
        self.queues
            .get(target)
            .is_some_and(|queue| queue.in_flight.is_some())
    }

    pub fn pending_count(&self, target: TargetHandle) -> usize {
        self.queues.get(target).map_or(0, |queue| queue.pending.len())
    }

    /// Drop everything queued for a target that went away.
    pub fn remove_target(&mut self, target: TargetHandle) {
        self.queues.remove(target);
    }

    pub fn reset(&mut self) {
        self.queues.clear();
    }
}
