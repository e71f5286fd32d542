//! Conversion of touch batches into ordered motion actions.

use std::collections::VecDeque;
use std::time::Instant;

use crate::canonical::{EventId, EventModifiers, MotionAction, MotionEvent, MotionPointer};
use crate::error::InputResult;
use crate::logging::targets;
use crate::native::{TouchBatch, TouchBatchKind, TouchPoint, TouchPointState};

use super::id_mapper::{StableTouchId, TouchIdMapper};

type MappedPoint = (StableTouchId, TouchPoint);

/// Motion events remembered while waiting for the engine to acknowledge them.
const MAX_UNACKED_MOTION: usize = 128;

/// Result of sequencing one touch batch.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceOutcome {
    /// Nothing to deliver (e.g. a cancel with no touch in progress).
    Ignored,
    /// The selection controller claimed the batch.
    Consumed,
    /// Motion events to route, in order.
    Motion(Vec<MotionEvent>),
}

/// Turns native touch batches into canonical motion events.
///
/// Within one batch, points are delivered pressed first, then moved, then
/// released, so every `PointerDown` precedes any `Move` or `PointerUp` that
/// references its point. Two points pressed in the same batch go down in
/// arrival order.
///
/// The sequencer remembers the last batch's points so a cancel that arrives
/// without points can still name what it cancels.
#[derive(Debug, Default)]
pub struct MotionSequencer {
    ids: TouchIdMapper,
    previous: Vec<MappedPoint>,
    motion_started: bool,
    unacked: VecDeque<EventId>,
}

impl MotionSequencer {
    /// Create a sequencer with no touch in progress.
    pub fn new() -> Self {
        Self::default()
    }

    /// The id allocator backing this sequencer.
    pub fn ids(&self) -> &TouchIdMapper {
        &self.ids
    }

    /// Whether a Begin or Update has been delivered since the last End/Cancel.
    pub fn motion_started(&self) -> bool {
        self.motion_started
    }

    /// Sequence one batch.
    ///
    /// `will_handle` is offered a probe event carrying the batch's first
    /// action and all of its points; returning `true` consumes the batch.
    pub fn sequence<F>(
        &mut self,
        batch: &TouchBatch,
        timestamp: Instant,
        modifiers: EventModifiers,
        will_handle: F,
    ) -> InputResult<SequenceOutcome>
    where
        F: FnOnce(&MotionEvent) -> bool,
    {
        let mut points = self.ids.map_batch(&batch.points)?;
        points.sort_by_key(|(_, point)| point.state);

        let outcome = self.emit(batch.kind, &mut points, timestamp, modifiers, will_handle);
        if let SequenceOutcome::Motion(events) = &outcome {
            self.track_unacked(events);
        }

        match batch.kind {
            TouchBatchKind::Cancel => {
                for (_, point) in &points {
                    self.ids.release(point.raw_id);
                }
                self.previous.clear();
                self.motion_started = false;
            }
            TouchBatchKind::End => {
                self.previous.clear();
                self.motion_started = false;
            }
            TouchBatchKind::Begin | TouchBatchKind::Update => {
                self.previous = points;
            }
        }

        Ok(outcome)
    }

    /// Record the engine's acknowledgement of a motion event.
    ///
    /// Acknowledgements arrive in delivery order, so older events still
    /// outstanding are settled too. Returns `false` for ids this sequencer
    /// is not waiting on.
    pub fn acknowledge(&mut self, event_id: EventId) -> bool {
        let Some(position) = self.unacked.iter().position(|id| *id == event_id) else {
            return false;
        };
        self.unacked.drain(..=position);
        true
    }

    /// Number of delivered motion events not yet acknowledged.
    pub fn unacked_count(&self) -> usize {
        self.unacked.len()
    }

    /// Forget any touch in progress and free all ids.
    pub fn reset(&mut self) {
        self.ids.clear();
        self.previous.clear();
        self.motion_started = false;
        self.unacked.clear();
    }

    fn track_unacked(&mut self, events: &[MotionEvent]) {
        self.unacked.extend(events.iter().map(|event| event.event_id));
        if self.unacked.len() > MAX_UNACKED_MOTION {
            let dropped = self.unacked.len() - MAX_UNACKED_MOTION;
            tracing::warn!(target: targets::TOUCH, dropped, "engine is not acknowledging motion events");
            self.unacked.drain(..dropped);
        }
    }

    fn emit<F>(
        &mut self,
        kind: TouchBatchKind,
        points: &mut Vec<MappedPoint>,
        timestamp: Instant,
        modifiers: EventModifiers,
        will_handle: F,
    ) -> SequenceOutcome
    where
        F: FnOnce(&MotionEvent) -> bool,
    {
        let probe_action = match points.first() {
            Some((_, first)) => match first.state {
                TouchPointState::Pressed => MotionAction::Down,
                TouchPointState::Updated => MotionAction::Move,
                TouchPointState::Released => MotionAction::Up,
                TouchPointState::Stationary => MotionAction::None,
            },
            None => {
                if kind != TouchBatchKind::Cancel {
                    tracing::debug!(target: targets::TOUCH, ?kind, "touch batch without points");
                    return SequenceOutcome::Ignored;
                }
                if self.previous.is_empty() {
                    return SequenceOutcome::Ignored;
                }
                *points = self.previous.clone();
                MotionAction::Cancel
            }
        };

        let probe = motion_event(probe_action, None, points, timestamp, modifiers);
        if will_handle(&probe) {
            tracing::trace!(target: targets::TOUCH, ?kind, "touch batch consumed by selection controller");
            return SequenceOutcome::Consumed;
        }

        match kind {
            TouchBatchKind::Begin | TouchBatchKind::Update => self.motion_started = true,
            TouchBatchKind::Cancel => {
                if !self.motion_started {
                    return SequenceOutcome::Ignored;
                }
                let cancel = motion_event(MotionAction::Cancel, None, points, timestamp, modifiers);
                trace_motion(&cancel);
                return SequenceOutcome::Motion(vec![cancel]);
            }
            TouchBatchKind::End => {}
        }

        let mut events = Vec::new();

        if kind != TouchBatchKind::End {
            let pressed = points
                .iter()
                .take_while(|(_, point)| point.state == TouchPointState::Pressed)
                .count();
            for i in 0..pressed {
                let mut pointers: Vec<MappedPoint> = points[..=i].to_vec();
                pointers.extend_from_slice(&points[pressed..]);
                let (action, index) = if kind == TouchBatchKind::Begin && i == 0 {
                    (MotionAction::Down, None)
                } else {
                    (MotionAction::PointerDown, Some(i))
                };
                events.push(motion_event(action, index, &pointers, timestamp, modifiers));
            }

            if points
                .iter()
                .any(|(_, point)| point.state == TouchPointState::Updated)
            {
                events.push(motion_event(MotionAction::Move, None, points, timestamp, modifiers));
            }
        }

        let mut remaining = points.clone();
        while remaining
            .last()
            .is_some_and(|(_, point)| point.state == TouchPointState::Released)
        {
            let (action, index) = if remaining.len() > 1 {
                (MotionAction::PointerUp, Some(remaining.len() - 1))
            } else {
                (MotionAction::Up, None)
            };
            events.push(motion_event(action, index, &remaining, timestamp, modifiers));
            remaining.pop();
        }

        events.iter().for_each(trace_motion);
        SequenceOutcome::Motion(events)
    }
}

fn motion_event(
    action: MotionAction,
    action_index: Option<usize>,
    points: &[MappedPoint],
    timestamp: Instant,
    modifiers: EventModifiers,
) -> MotionEvent {
    MotionEvent {
        action,
        action_index,
        pointers: points.iter().map(|(id, point)| motion_pointer(*id, point)).collect(),
        event_id: EventId::next(),
        modifiers,
        timestamp,
    }
}

fn motion_pointer(id: StableTouchId, point: &TouchPoint) -> MotionPointer {
    let (a, b) = point.ellipse_diameters;
    MotionPointer {
        id,
        position: point.position,
        global_position: point.global_position,
        pressure: point.pressure,
        touch_major: a.max(b),
        touch_minor: a.min(b),
    }
}

fn trace_motion(event: &MotionEvent) {
    tracing::trace!(
        target: targets::TOUCH,
        action = ?event.action,
        index = ?event.action_index,
        pointers = event.pointers.len(),
        id = event.event_id.get(),
        "motion event"
    );
}
