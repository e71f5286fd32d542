//! Canonical engine input events.
//!
//! This is the platform-independent event model the browser engine accepts.
//! Every native event that survives translation becomes exactly one of the
//! [`CanonicalEvent`] variants (or, for touch batches and text keys, an
//! ordered run of them).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use bitflags::bitflags;

use crate::edit_command::EditCommand;
use crate::geometry::Point;
use crate::native::NamedKey;
use crate::touch::StableTouchId;

static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide identifier correlating an event with its acknowledgement.
///
/// Ids are strictly increasing in allocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u64);

impl EventId {
    /// Allocate the next id.
    pub fn next() -> Self {
        Self(NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

bitflags! {
    /// Modifier and state flags carried by every canonical event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventModifiers: u32 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
        const IS_KEYPAD = 1 << 4;
        const IS_AUTO_REPEAT = 1 << 5;
        const LEFT_BUTTON_DOWN = 1 << 6;
        const MIDDLE_BUTTON_DOWN = 1 << 7;
        const RIGHT_BUTTON_DOWN = 1 << 8;
        const BACK_BUTTON_DOWN = 1 << 9;
        const FORWARD_BUTTON_DOWN = 1 << 10;
        const IS_LEFT = 1 << 11;
        const IS_RIGHT = 1 << 12;
        const ALT_GR = 1 << 13;
    }
}

/// Mouse button as the engine models it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseButton {
    #[default]
    None,
    Left,
    Right,
    Middle,
    Back,
    Forward,
}

/// Kind of a canonical mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Down,
    Up,
    Move,
    Enter,
    Leave,
}

/// Device behind a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerType {
    #[default]
    Mouse,
    Pen,
    Eraser,
    Touch,
}

/// A canonical mouse (or tablet) event.
#[derive(Debug, Clone, PartialEq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub button: MouseButton,
    pub click_count: u32,
    pub position: Point,
    pub global_position: Point,
    pub movement_x: f32,
    pub movement_y: f32,
    /// Movement is reported relative to a locked pointer.
    pub is_raw_movement_event: bool,
    pub pointer_type: PointerType,
    pub force: f32,
    pub tilt_x: i32,
    pub tilt_y: i32,
    pub twist: f32,
    pub tangential_pressure: f32,
    pub modifiers: EventModifiers,
    pub timestamp: Instant,
}

/// Kind of a canonical keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardEventKind {
    /// Key went down; no text is inserted by this event.
    RawKeyDown,
    /// Key went down and may insert text.
    KeyDown,
    /// Text insertion.
    Char,
    KeyUp,
}

/// DOM-level key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomKey {
    Character(char),
    Named(NamedKey),
    Unidentified,
}

/// A canonical keyboard event.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardEvent {
    pub kind: KeyboardEventKind,
    pub windows_key_code: u16,
    pub native_key_code: u32,
    pub dom_key: DomKey,
    /// Physical key name such as `"KeyA"` or `"Numpad1"`; empty when unknown.
    pub dom_code: &'static str,
    pub text: String,
    pub unmodified_text: String,
    /// Deliver to the renderer only, not to browser-side shortcut handling.
    pub skip_in_browser: bool,
    /// Editor command attached by an accepted shortcut override.
    pub edit_command: Option<EditCommand>,
    pub modifiers: EventModifiers,
    pub timestamp: Instant,
}

/// Scroll phase of a canonical wheel event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WheelPhase {
    #[default]
    None,
    Began,
    Changed,
    Ended,
}

/// A canonical wheel event.
#[derive(Debug, Clone, PartialEq)]
pub struct WheelEvent {
    pub delta_x: f32,
    pub delta_y: f32,
    pub wheel_ticks_x: f32,
    pub wheel_ticks_y: f32,
    pub phase: WheelPhase,
    pub momentum_phase: WheelPhase,
    /// Deltas come from a pixel-precise device rather than notches.
    pub has_precise_scrolling_deltas: bool,
    pub position: Point,
    pub global_position: Point,
    pub modifiers: EventModifiers,
    pub event_id: EventId,
    pub timestamp: Instant,
}

impl WheelEvent {
    /// Whether this event terminates a scroll sequence.
    pub fn is_ended(&self) -> bool {
        self.phase == WheelPhase::Ended || self.momentum_phase == WheelPhase::Ended
    }
}

/// Kind of a canonical gesture event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureKind {
    PinchBegin,
    /// `scale` is the multiplicative zoom factor for this step.
    PinchUpdate { scale: f32 },
    PinchEnd,
    DoubleTap,
    /// Touchscreen gestures recognized by the engine from motion events and
    /// handed back to the host before being applied.
    TapDown,
    Tap { tap_count: u32 },
    LongPress,
    LongTap,
    ScrollBegin,
    ScrollUpdate { delta_x: f32, delta_y: f32 },
    ScrollEnd,
    FlingStart { velocity_x: f32, velocity_y: f32 },
    FlingCancel,
}

impl GestureKind {
    /// Whether the gesture is part of a pinch.
    pub fn is_pinch(self) -> bool {
        matches!(
            self,
            GestureKind::PinchBegin | GestureKind::PinchUpdate { .. } | GestureKind::PinchEnd
        )
    }
}

/// Device that produced a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureSource {
    Touchpad,
    Touchscreen,
}

/// A canonical gesture event.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureEvent {
    pub kind: GestureKind,
    pub source: GestureSource,
    pub position: Point,
    pub global_position: Point,
    pub modifiers: EventModifiers,
    pub timestamp: Instant,
}

/// Action of a canonical motion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionAction {
    Down,
    PointerDown,
    Move,
    PointerUp,
    Up,
    Cancel,
    None,
}

/// One touch point of a motion event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPointer {
    pub id: StableTouchId,
    pub position: Point,
    pub global_position: Point,
    pub pressure: f32,
    pub touch_major: f32,
    pub touch_minor: f32,
}

/// A canonical touch motion event.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionEvent {
    pub action: MotionAction,
    /// Index into `pointers` of the point that went down or up.
    pub action_index: Option<usize>,
    pub pointers: Vec<MotionPointer>,
    pub event_id: EventId,
    pub modifiers: EventModifiers,
    pub timestamp: Instant,
}

impl MotionEvent {
    /// The pointer the action applies to, for `PointerDown` and `PointerUp`.
    pub fn action_pointer(&self) -> Option<&MotionPointer> {
        self.action_index.and_then(|i| self.pointers.get(i))
    }
}

/// Any event routed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalEvent {
    Mouse(MouseEvent),
    Keyboard(KeyboardEvent),
    Wheel(WheelEvent),
    Gesture(GestureEvent),
    Motion(MotionEvent),
}

impl CanonicalEvent {
    /// Acknowledgement id, for event kinds the engine acknowledges.
    pub fn event_id(&self) -> Option<EventId> {
        match self {
            CanonicalEvent::Wheel(e) => Some(e.event_id),
            CanonicalEvent::Motion(e) => Some(e.event_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ids_strictly_increase() {
        let a = EventId::next();
        let b = EventId::next();
        let c = EventId::next();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_event_id_counter_is_64_bit() {
        assert_eq!(std::mem::size_of::<EventId>(), std::mem::size_of::<u64>());
        let id: u64 = EventId::next().get();
        assert!(id > 0);
    }

    #[test]
    fn test_wheel_is_ended() {
        let mut event = WheelEvent {
            delta_x: 0.0,
            delta_y: 0.0,
            wheel_ticks_x: 0.0,
            wheel_ticks_y: 0.0,
            phase: WheelPhase::Changed,
            momentum_phase: WheelPhase::None,
            has_precise_scrolling_deltas: true,
            position: Point::ZERO,
            global_position: Point::ZERO,
            modifiers: EventModifiers::empty(),
            event_id: EventId::next(),
            timestamp: Instant::now(),
        };
        assert!(!event.is_ended());
        event.momentum_phase = WheelPhase::Ended;
        assert!(event.is_ended());
    }
}
