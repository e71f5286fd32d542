//! Conversion from winit events to native input events.
//!
//! winit reports touch one finger at a time, wheel deltas in lines or pixels
//! and IME preedit cursors as byte offsets. The functions here bring those
//! into the [`native`](crate::native) model the dispatcher consumes.
//!
//! # Usage
//!
//! ```ignore
//! use horizon_lattice_webinput::winit_adapter::{TouchBatchBuilder, from_winit_modifiers};
//!
//! let mut touches = TouchBatchBuilder::new();
//!
//! match event {
//!     WindowEvent::ModifiersChanged(m) => {
//!         modifiers = from_winit_modifiers(m.state(), Platform::current());
//!     }
//!     WindowEvent::Touch(touch) => {
//!         touches.push(&touch);
//!         for batch in touches.finish(now_ms()) {
//!             dispatcher.handle_touch(&mut ctx, &batch)?;
//!         }
//!     }
//!     WindowEvent::Ime(ime) => {
//!         if let Some(event) = InputMethodEvent::from_winit(&ime) {
//!             dispatcher.handle_input_method(&mut ctx, &event);
//!         }
//!     }
//!     _ => {}
//! }
//! ```

use winit::event::{Ime, MouseButton as WinitMouseButton, MouseScrollDelta, Touch, TouchPhase};
use winit::keyboard::{
    Key as WinitKey, KeyLocation as WinitKeyLocation, ModifiersState, NamedKey as WinitNamedKey,
};

use crate::config::Platform;
use crate::geometry::Point;
use crate::logging::targets;
use crate::mapper::keyboard::swap_control_meta_key;
use crate::native::{
    InputMethodAttribute, InputMethodEvent, KeyLocation, NamedKey, NativeButton, NativeKey,
    NativeModifiers, NativeWheelEvent, ScrollPhase, TouchBatch, TouchBatchKind, TouchPoint,
    TouchPointState,
};

/// Angle units winit's line deltas are scaled by, one notch per line.
pub const ANGLE_UNITS_PER_LINE: f32 = 120.0;

/// Converts a winit mouse button.
pub fn from_winit_mouse_button(button: WinitMouseButton) -> NativeButton {
    match button {
        WinitMouseButton::Left => NativeButton::Left,
        WinitMouseButton::Right => NativeButton::Right,
        WinitMouseButton::Middle => NativeButton::Middle,
        WinitMouseButton::Back => NativeButton::Back,
        WinitMouseButton::Forward => NativeButton::Forward,
        WinitMouseButton::Other(code) => NativeButton::Other(code),
    }
}

/// Converts winit modifier state.
///
/// winit reports Command as Super. On platforms where the toolkit reports
/// Command as Control, the bits are exchanged to match.
pub fn from_winit_modifiers(state: ModifiersState, platform: Platform) -> NativeModifiers {
    let mut modifiers = NativeModifiers::empty();
    modifiers.set(NativeModifiers::SHIFT, state.shift_key());
    modifiers.set(NativeModifiers::CONTROL, state.control_key());
    modifiers.set(NativeModifiers::ALT, state.alt_key());
    modifiers.set(NativeModifiers::META, state.super_key());
    if platform.swaps_control_and_meta() {
        modifiers = modifiers.swap_control_meta();
    }
    modifiers
}

/// Converts a winit logical key, following the same Command convention as
/// [`from_winit_modifiers`].
///
/// Dead keys and multi-character keys have no single key value and map to
/// [`NativeKey::NONE`]; their text still arrives with the key event.
pub fn from_winit_key(key: &WinitKey, platform: Platform) -> NativeKey {
    let native = logical_key(key);
    if platform.swaps_control_and_meta() {
        swap_control_meta_key(native)
    } else {
        native
    }
}

fn logical_key(key: &WinitKey) -> NativeKey {
    match key {
        WinitKey::Named(named) => NativeKey::Named(from_winit_named_key(named)),
        WinitKey::Character(text) => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => NativeKey::Character(c),
                _ => NativeKey::NONE,
            }
        }
        WinitKey::Unidentified(_) | WinitKey::Dead(_) => NativeKey::NONE,
    }
}

fn from_winit_named_key(key: &WinitNamedKey) -> NamedKey {
    match key {
        // Navigation
        WinitNamedKey::ArrowUp => NamedKey::ArrowUp,
        WinitNamedKey::ArrowDown => NamedKey::ArrowDown,
        WinitNamedKey::ArrowLeft => NamedKey::ArrowLeft,
        WinitNamedKey::ArrowRight => NamedKey::ArrowRight,
        WinitNamedKey::Home => NamedKey::Home,
        WinitNamedKey::End => NamedKey::End,
        WinitNamedKey::PageUp => NamedKey::PageUp,
        WinitNamedKey::PageDown => NamedKey::PageDown,

        // Editing
        WinitNamedKey::Backspace => NamedKey::Backspace,
        WinitNamedKey::Delete => NamedKey::Delete,
        WinitNamedKey::Insert => NamedKey::Insert,
        WinitNamedKey::Enter => NamedKey::Enter,
        WinitNamedKey::Tab => NamedKey::Tab,
        WinitNamedKey::Space => NamedKey::Space,
        WinitNamedKey::Escape => NamedKey::Escape,
        WinitNamedKey::Clear => NamedKey::Clear,

        // Modifiers
        WinitNamedKey::Shift => NamedKey::Shift,
        WinitNamedKey::Control => NamedKey::Control,
        WinitNamedKey::Alt => NamedKey::Alt,
        WinitNamedKey::Super | WinitNamedKey::Meta => NamedKey::Meta,
        WinitNamedKey::AltGraph => NamedKey::AltGraph,
        WinitNamedKey::CapsLock => NamedKey::CapsLock,
        WinitNamedKey::NumLock => NamedKey::NumLock,
        WinitNamedKey::ScrollLock => NamedKey::ScrollLock,

        // System
        WinitNamedKey::Pause => NamedKey::Pause,
        WinitNamedKey::PrintScreen => NamedKey::PrintScreen,
        WinitNamedKey::Help => NamedKey::Help,
        WinitNamedKey::ContextMenu => NamedKey::ContextMenu,

        // Function keys
        WinitNamedKey::F1 => NamedKey::F(1),
        WinitNamedKey::F2 => NamedKey::F(2),
        WinitNamedKey::F3 => NamedKey::F(3),
        WinitNamedKey::F4 => NamedKey::F(4),
        WinitNamedKey::F5 => NamedKey::F(5),
        WinitNamedKey::F6 => NamedKey::F(6),
        WinitNamedKey::F7 => NamedKey::F(7),
        WinitNamedKey::F8 => NamedKey::F(8),
        WinitNamedKey::F9 => NamedKey::F(9),
        WinitNamedKey::F10 => NamedKey::F(10),
        WinitNamedKey::F11 => NamedKey::F(11),
        WinitNamedKey::F12 => NamedKey::F(12),
        WinitNamedKey::F13 => NamedKey::F(13),
        WinitNamedKey::F14 => NamedKey::F(14),
        WinitNamedKey::F15 => NamedKey::F(15),
        WinitNamedKey::F16 => NamedKey::F(16),
        WinitNamedKey::F17 => NamedKey::F(17),
        WinitNamedKey::F18 => NamedKey::F(18),
        WinitNamedKey::F19 => NamedKey::F(19),
        WinitNamedKey::F20 => NamedKey::F(20),
        WinitNamedKey::F21 => NamedKey::F(21),
        WinitNamedKey::F22 => NamedKey::F(22),
        WinitNamedKey::F23 => NamedKey::F(23),
        WinitNamedKey::F24 => NamedKey::F(24),

        _ => NamedKey::Unidentified,
    }
}

/// Converts a winit key location.
pub fn from_winit_key_location(location: WinitKeyLocation) -> KeyLocation {
    match location {
        WinitKeyLocation::Standard => KeyLocation::Standard,
        WinitKeyLocation::Left => KeyLocation::Left,
        WinitKeyLocation::Right => KeyLocation::Right,
        WinitKeyLocation::Numpad => KeyLocation::Numpad,
    }
}

/// Converts a winit touch phase to the lifecycle state of one point.
pub fn from_winit_touch_phase(phase: TouchPhase) -> TouchPointState {
    match phase {
        TouchPhase::Started => TouchPointState::Pressed,
        TouchPhase::Moved => TouchPointState::Updated,
        TouchPhase::Ended | TouchPhase::Cancelled => TouchPointState::Released,
    }
}

/// Converts a winit wheel delta.
///
/// Line deltas become angle deltas at [`ANGLE_UNITS_PER_LINE`]. Pixel
/// deltas come from touchpads, which winit tags with a touch phase.
pub fn from_winit_mouse_wheel(
    delta: MouseScrollDelta,
    phase: TouchPhase,
    position: Point,
) -> NativeWheelEvent {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => NativeWheelEvent::new(
            Point::new(x * ANGLE_UNITS_PER_LINE, y * ANGLE_UNITS_PER_LINE),
            position,
        ),
        MouseScrollDelta::PixelDelta(pixels) => {
            let pixels = Point::new(pixels.x as f32, pixels.y as f32);
            let phase = match phase {
                TouchPhase::Started => ScrollPhase::Begin,
                TouchPhase::Moved => ScrollPhase::Update,
                TouchPhase::Ended | TouchPhase::Cancelled => ScrollPhase::End,
            };
            NativeWheelEvent::new(pixels, position)
                .with_pixel_delta(pixels)
                .with_phase(phase)
        }
    }
}

impl InputMethodEvent {
    /// Converts a winit IME event.
    ///
    /// `Enabled` has no counterpart and returns `None`. `Disabled` becomes an
    /// empty event, which ends any composition in progress.
    pub fn from_winit(ime: &Ime) -> Option<Self> {
        match ime {
            Ime::Enabled => None,
            Ime::Preedit(text, cursor) => Some(preedit_from_winit(text, *cursor)),
            Ime::Commit(text) => Some(InputMethodEvent::commit(text.clone())),
            Ime::Disabled => Some(InputMethodEvent::default()),
        }
    }
}

fn preedit_from_winit(text: &str, cursor: Option<(usize, usize)>) -> InputMethodEvent {
    let mut event = InputMethodEvent::preedit(text);
    if text.is_empty() {
        return event;
    }

    let len = char_offset(text, text.len());
    event = event.with_attribute(InputMethodAttribute::TextFormat {
        start: 0,
        length: len,
        underline_color: None,
        thick: false,
    });

    // winit hides the caret with `None`; the caret then sits after the text.
    let Some((start, end)) = cursor else {
        return event.with_attribute(InputMethodAttribute::Cursor { position: len });
    };
    let (start, end) = (char_offset(text, start), char_offset(text, end));
    if end > start {
        event = event.with_attribute(InputMethodAttribute::TextFormat {
            start,
            length: end - start,
            underline_color: None,
            thick: true,
        });
    }
    event.with_attribute(InputMethodAttribute::Cursor { position: end })
}

/// Character offset of a byte offset, clamped to the text.
fn char_offset(text: &str, byte: usize) -> i32 {
    let prefix = text.get(..byte.min(text.len())).unwrap_or(text);
    i32::try_from(prefix.chars().count()).unwrap_or(i32::MAX)
}

/// Groups winit's per-finger touch events into batches.
///
/// Fingers that did not report since the last batch are carried along as
/// stationary, so every batch lists all live touch points. A finger that
/// goes down and up before the batch is finished closes the batch at its
/// release, so the press is delivered before the release.
#[derive(Debug, Default)]
pub struct TouchBatchBuilder {
    live: Vec<TouchPoint>,
    closed: Vec<PendingBatch>,
    pending: PendingBatch,
}

#[derive(Debug, Default)]
struct PendingBatch {
    points: Vec<TouchPoint>,
    cancelled: bool,
}

impl TouchBatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fingers currently down.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Add a winit touch event to the batch being built.
    pub fn push(&mut self, touch: &Touch) {
        let position = Point::new(touch.location.x as f32, touch.location.y as f32);
        let pressure = touch.force.map(|force| force.normalized() as f32);
        // winit ids are opaque; reinterpreting the bits keeps them distinct.
        self.push_point(touch.id as i64, touch.phase, position, pressure);
    }

    /// Add one finger's update to the batch being built.
    pub fn push_point(&mut self, raw_id: i64, phase: TouchPhase, position: Point, pressure: Option<f32>) {
        let mut point = TouchPoint::new(raw_id, from_winit_touch_phase(phase), position);
        if let Some(pressure) = pressure {
            point = point.with_pressure(pressure);
        }

        let pressed_here = self
            .pending
            .points
            .iter()
            .any(|p| p.raw_id == raw_id && p.state == TouchPointState::Pressed);
        if pressed_here && point.state == TouchPointState::Released {
            tracing::trace!(target: targets::TOUCH, raw_id, "tap inside one batch, splitting");
            let pressed = std::mem::take(&mut self.pending);
            self.closed.push(pressed);
        }

        if phase == TouchPhase::Cancelled {
            self.pending.cancelled = true;
        }
        match self.pending.points.iter_mut().find(|p| p.raw_id == raw_id) {
            Some(existing) => {
                // A press followed by a move in one batch is still a press.
                if existing.state == TouchPointState::Pressed && point.state == TouchPointState::Updated {
                    point.state = TouchPointState::Pressed;
                }
                *existing = point;
            }
            None => self.pending.points.push(point),
        }
    }

    /// Close the batch.
    ///
    /// Usually yields one batch; a finger that was pressed and released
    /// since the last call yields its press and its release separately.
    /// Batches that only release fingers never seen going down are dropped.
    pub fn finish(&mut self, timestamp_ms: u64) -> Vec<TouchBatch> {
        let mut groups = std::mem::take(&mut self.closed);
        groups.push(std::mem::take(&mut self.pending));
        groups
            .into_iter()
            .filter_map(|group| self.close(group, timestamp_ms))
            .collect()
    }

    fn close(&mut self, group: PendingBatch, timestamp_ms: u64) -> Option<TouchBatch> {
        let PendingBatch { mut points, cancelled } = group;
        if points.is_empty() {
            return None;
        }

        let had_live = !self.live.is_empty();
        if !had_live && !cancelled && !points.iter().any(|p| p.state == TouchPointState::Pressed) {
            tracing::debug!(target: targets::TOUCH, "touch update without a press dropped");
            return None;
        }

        for live in &self.live {
            if !points.iter().any(|p| p.raw_id == live.raw_id) {
                points.push(TouchPoint {
                    state: TouchPointState::Stationary,
                    ..*live
                });
            }
        }

        let kind = if cancelled {
            TouchBatchKind::Cancel
        } else if !had_live {
            TouchBatchKind::Begin
        } else if points.iter().all(|p| p.state == TouchPointState::Released) {
            TouchBatchKind::End
        } else {
            TouchBatchKind::Update
        };

        self.live = match kind {
            TouchBatchKind::Cancel => Vec::new(),
            _ => points
                .iter()
                .filter(|p| p.state != TouchPointState::Released)
                .copied()
                .collect(),
        };

        Some(TouchBatch::new(kind, points).with_timestamp(timestamp_ms))
    }

    /// Forget all fingers, e.g. after the window lost focus.
    pub fn reset(&mut self) {
        self.live.clear();
        self.closed.clear();
        self.pending = PendingBatch::default();
    }
}

#[cfg(test)]
mod tests {
    use winit::dpi::PhysicalPosition;

    use super::*;

    #[test]
    fn test_mouse_buttons() {
        assert_eq!(from_winit_mouse_button(WinitMouseButton::Left), NativeButton::Left);
        assert_eq!(from_winit_mouse_button(WinitMouseButton::Forward), NativeButton::Forward);
        assert_eq!(from_winit_mouse_button(WinitMouseButton::Other(9)), NativeButton::Other(9));
    }

    #[test]
    fn test_modifiers() {
        let state = ModifiersState::SHIFT | ModifiersState::SUPER;
        assert_eq!(
            from_winit_modifiers(state, Platform::Linux),
            NativeModifiers::SHIFT | NativeModifiers::META
        );
        assert!(from_winit_modifiers(ModifiersState::empty(), Platform::Windows).is_empty());
    }

    #[test]
    fn test_command_reported_as_control_on_mac() {
        assert_eq!(
            from_winit_modifiers(ModifiersState::SUPER, Platform::MacOs),
            NativeModifiers::CONTROL
        );
        assert_eq!(
            from_winit_modifiers(ModifiersState::CONTROL, Platform::MacOs),
            NativeModifiers::META
        );
        assert_eq!(
            from_winit_key(&WinitKey::Named(WinitNamedKey::Super), Platform::MacOs),
            NativeKey::Named(NamedKey::Control)
        );
    }

    #[test]
    fn test_keys() {
        let key = |k: WinitKey| from_winit_key(&k, Platform::Linux);
        assert_eq!(key(WinitKey::Character("a".into())), NativeKey::Character('a'));
        assert_eq!(key(WinitKey::Character("ab".into())), NativeKey::NONE);
        assert_eq!(key(WinitKey::Named(WinitNamedKey::Enter)), NativeKey::Named(NamedKey::Enter));
        assert_eq!(key(WinitKey::Named(WinitNamedKey::F12)), NativeKey::Named(NamedKey::F(12)));
        assert_eq!(key(WinitKey::Dead(Some('`'))), NativeKey::NONE);
    }

    #[test]
    fn test_line_wheel_scales_to_angle_units() {
        let event = from_winit_mouse_wheel(
            MouseScrollDelta::LineDelta(0.0, -1.0),
            TouchPhase::Moved,
            Point::new(5.0, 5.0),
        );
        assert_eq!(event.angle_delta, Point::new(0.0, -120.0));
        assert_eq!(event.pixel_delta, None);
        assert_eq!(event.phase, ScrollPhase::NoPhase);
    }

    #[test]
    fn test_pixel_wheel_keeps_phase() {
        let event = from_winit_mouse_wheel(
            MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 12.5)),
            TouchPhase::Started,
            Point::ZERO,
        );
        assert_eq!(event.pixel_delta, Some(Point::new(0.0, 12.5)));
        assert_eq!(event.phase, ScrollPhase::Begin);
    }

    #[test]
    fn test_ime_commit_and_disable() {
        assert_eq!(InputMethodEvent::from_winit(&Ime::Enabled), None);
        let commit = InputMethodEvent::from_winit(&Ime::Commit("日本".into()));
        assert_eq!(commit, Some(InputMethodEvent::commit("日本")));
        let disabled = InputMethodEvent::from_winit(&Ime::Disabled);
        assert!(disabled.is_some_and(|e| e.is_empty()));
    }

    #[test]
    fn test_ime_preedit_cursor_in_characters() {
        // "にほ" is six bytes; the cursor range covers the second character.
        let event = InputMethodEvent::from_winit(&Ime::Preedit("にほ".into(), Some((3, 6))));
        let Some(event) = event else {
            panic!("preedit should convert");
        };
        assert_eq!(event.preedit_string, "にほ");
        assert!(event.attributes.contains(&InputMethodAttribute::Cursor { position: 2 }));
        assert!(event.attributes.contains(&InputMethodAttribute::TextFormat {
            start: 1,
            length: 1,
            underline_color: None,
            thick: true,
        }));
    }

    #[test]
    fn test_empty_preedit_clears() {
        let event = InputMethodEvent::from_winit(&Ime::Preedit(String::new(), None));
        assert!(event.is_some_and(|e| e.is_empty()));
    }

    #[test]
    fn test_batches_begin_update_end() {
        let mut builder = TouchBatchBuilder::new();
        builder.push_point(7, TouchPhase::Started, Point::new(1.0, 1.0), None);
        let begin = builder.finish(10).remove(0);
        assert_eq!(begin.kind, TouchBatchKind::Begin);
        assert_eq!(builder.live_count(), 1);

        builder.push_point(8, TouchPhase::Started, Point::new(2.0, 2.0), Some(0.5));
        let second = builder.finish(20).remove(0);
        assert_eq!(second.kind, TouchBatchKind::Update);
        assert_eq!(second.points.len(), 2);
        let stationary = second.points.iter().find(|p| p.raw_id == 7).unwrap();
        assert_eq!(stationary.state, TouchPointState::Stationary);

        builder.push_point(7, TouchPhase::Ended, Point::new(1.0, 1.0), None);
        assert_eq!(builder.finish(30)[0].kind, TouchBatchKind::Update);
        builder.push_point(8, TouchPhase::Ended, Point::new(2.0, 2.0), None);
        assert_eq!(builder.finish(40)[0].kind, TouchBatchKind::End);
        assert_eq!(builder.live_count(), 0);
    }

    #[test]
    fn test_cancel_clears_live_fingers() {
        let mut builder = TouchBatchBuilder::new();
        builder.push_point(1, TouchPhase::Started, Point::ZERO, None);
        builder.push_point(2, TouchPhase::Started, Point::ZERO, None);
        builder.finish(1);
        builder.push_point(1, TouchPhase::Cancelled, Point::ZERO, None);
        let cancel = builder.finish(2).remove(0);
        assert_eq!(cancel.kind, TouchBatchKind::Cancel);
        assert_eq!(cancel.points.len(), 2);
        assert_eq!(builder.live_count(), 0);
    }

    #[test]
    fn test_release_without_press_is_dropped() {
        let mut builder = TouchBatchBuilder::new();
        builder.push_point(3, TouchPhase::Ended, Point::ZERO, None);
        assert!(builder.finish(1).is_empty());
        assert!(builder.finish(2).is_empty());
    }

    #[test]
    fn test_press_then_move_stays_pressed() {
        let mut builder = TouchBatchBuilder::new();
        builder.push_point(4, TouchPhase::Started, Point::ZERO, None);
        builder.push_point(4, TouchPhase::Moved, Point::new(3.0, 0.0), None);
        let batch = builder.finish(1).remove(0);
        assert_eq!(batch.points.len(), 1);
        assert_eq!(batch.points[0].state, TouchPointState::Pressed);
        assert_eq!(batch.points[0].position, Point::new(3.0, 0.0));
    }

    #[test]
    fn test_quick_tap_splits_press_and_release() {
        let mut builder = TouchBatchBuilder::new();
        builder.push_point(5, TouchPhase::Started, Point::ZERO, None);
        builder.push_point(5, TouchPhase::Ended, Point::ZERO, None);
        let batches = builder.finish(1);

        let kinds: Vec<_> = batches.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![TouchBatchKind::Begin, TouchBatchKind::End]);
        assert_eq!(batches[0].points[0].state, TouchPointState::Pressed);
        assert_eq!(batches[1].points[0].state, TouchPointState::Released);
        assert_eq!(builder.live_count(), 0);
    }

    #[test]
    fn test_second_finger_tap_goes_down_before_up() {
        use std::time::Instant;

        use crate::canonical::{EventModifiers, MotionAction};
        use crate::touch::{MotionSequencer, SequenceOutcome};

        let mut builder = TouchBatchBuilder::new();
        let mut sequencer = MotionSequencer::new();
        let mut actions = Vec::new();
        let mut deliver = |batches: Vec<TouchBatch>, actions: &mut Vec<MotionAction>| {
            for batch in batches {
                let outcome = sequencer
                    .sequence(&batch, Instant::now(), EventModifiers::empty(), |_| false)
                    .unwrap();
                if let SequenceOutcome::Motion(events) = outcome {
                    actions.extend(events.iter().map(|e| e.action));
                }
            }
        };

        builder.push_point(1, TouchPhase::Started, Point::ZERO, None);
        deliver(builder.finish(1), &mut actions);

        builder.push_point(2, TouchPhase::Started, Point::new(5.0, 5.0), None);
        builder.push_point(2, TouchPhase::Ended, Point::new(5.0, 5.0), None);
        let batches = builder.finish(2);
        assert_eq!(batches.len(), 2);
        let held = batches[1].points.iter().find(|p| p.raw_id == 1).unwrap();
        assert_eq!(held.state, TouchPointState::Stationary);
        deliver(batches, &mut actions);

        assert_eq!(
            actions,
            vec![MotionAction::Down, MotionAction::PointerDown, MotionAction::PointerUp]
        );
        assert_eq!(builder.live_count(), 1);
    }
}
