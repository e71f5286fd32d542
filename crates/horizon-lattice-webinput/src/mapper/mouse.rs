//! Pointer, tablet, hover and leave conversion.
//!
//! The engine counts clicks itself only when told the streak length, so
//! streaks are tracked here: a press continues the streak when it uses the
//! same button, lands within the drag distance of the previous press, comes
//! within the double-click interval, and the streak has not reached three.
//! Releases carry the count of the press they end.

use std::time::Instant;

use crate::canonical::{EventModifiers, MouseButton, MouseEvent, MouseEventKind, PointerType};
use crate::geometry::Point;
use crate::logging::targets;
use crate::native::{
    HoverEvent, HoverKind, NativeButton, NativeButtons, NativePointerEvent, PointerEventKind,
    TabletPointerType,
};

use super::EventMapper;

/// Longest click streak reported before a new streak starts.
pub const MAX_CLICK_COUNT: u32 = 3;

/// Canonical button for an event.
///
/// An explicit button wins. Without one the held buttons are consulted in
/// the order Left, Right, Middle, Back, Forward, so drags carry a button.
pub fn button_for_event(button: NativeButton, buttons: NativeButtons) -> MouseButton {
    match button {
        NativeButton::Left => return MouseButton::Left,
        NativeButton::Right => return MouseButton::Right,
        NativeButton::Middle => return MouseButton::Middle,
        NativeButton::Back => return MouseButton::Back,
        NativeButton::Forward => return MouseButton::Forward,
        NativeButton::NoButton | NativeButton::Other(_) => {}
    }
    held_button(buttons)
}

fn held_button(buttons: NativeButtons) -> MouseButton {
    [
        (NativeButtons::LEFT, MouseButton::Left),
        (NativeButtons::RIGHT, MouseButton::Right),
        (NativeButtons::MIDDLE, MouseButton::Middle),
        (NativeButtons::BACK, MouseButton::Back),
        (NativeButtons::FORWARD, MouseButton::Forward),
    ]
    .into_iter()
    .find(|(flag, _)| buttons.contains(*flag))
    .map_or(MouseButton::None, |(_, button)| button)
}

#[derive(Debug, Clone, Copy)]
struct LastPress {
    button: NativeButton,
    position: Point,
    timestamp_ms: u64,
}

/// Click streak tracker.
#[derive(Debug, Clone, Default)]
pub struct ClickCounter {
    last_press: Option<LastPress>,
    count: u32,
}

impl ClickCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a press and return its click count.
    pub fn press(
        &mut self,
        button: NativeButton,
        position: Point,
        timestamp_ms: u64,
        interval_ms: u64,
        max_distance: f32,
    ) -> u32 {
        let continues = self.last_press.is_some_and(|last| {
            last.button == button
                && timestamp_ms.saturating_sub(last.timestamp_ms) <= interval_ms
                && position.manhattan_distance(last.position) <= max_distance
        }) && self.count < MAX_CLICK_COUNT;
        if !continues {
            self.count = 0;
        }
        self.count += 1;
        self.last_press = Some(LastPress {
            button,
            position: position.rounded(),
            timestamp_ms,
        });
        self.count
    }

    /// Count of the current streak, reported on release.
    pub fn current(&self) -> u32 {
        self.count
    }

    pub fn reset(&mut self) {
        self.last_press = None;
        self.count = 0;
    }
}

/// A converted pointer event plus host-side cursor work.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerTranslation {
    pub event: MouseEvent,
    /// The pointer is locked: move the host cursor back here.
    pub reset_cursor_to: Option<Point>,
}

impl EventMapper {
    /// Convert a mouse or tablet event.
    ///
    /// Presses and releases of buttons the engine cannot represent return
    /// `None`.
    pub fn map_pointer(
        &mut self,
        event: &NativePointerEvent,
        timestamp: Instant,
        mouse_locked: bool,
    ) -> Option<PointerTranslation> {
        let kind = match event.kind {
            PointerEventKind::Press | PointerEventKind::DoubleClick => MouseEventKind::Down,
            PointerEventKind::Release => MouseEventKind::Up,
            PointerEventKind::Move => MouseEventKind::Move,
        };
        let button = match kind {
            MouseEventKind::Down | MouseEventKind::Up => match event.button {
                NativeButton::NoButton | NativeButton::Other(_) => MouseButton::None,
                explicit => button_for_event(explicit, event.buttons),
            },
            _ => button_for_event(event.button, event.buttons),
        };
        self.held_buttons = event.buttons;

        if matches!(kind, MouseEventKind::Down | MouseEventKind::Up) && button == MouseButton::None {
            tracing::info!(target: targets::POINTER, button = ?event.button, "unhandled mouse button");
            return None;
        }

        let click_count = match kind {
            MouseEventKind::Down => self.clicks.press(
                event.button,
                event.position,
                event.timestamp_ms,
                self.config.double_click_interval().as_millis() as u64,
                self.config.start_drag_distance(),
            ),
            MouseEventKind::Up => self.clicks.current(),
            _ => 0,
        };

        let (movement_x, movement_y) = event.global_position.delta_from(self.previous_global_position);
        let reset_cursor_to = if mouse_locked {
            Some(self.previous_global_position)
        } else {
            self.previous_global_position = event.global_position;
            None
        };

        let mut mouse = MouseEvent {
            kind,
            button,
            click_count,
            position: event.position,
            global_position: event.global_position,
            movement_x,
            movement_y,
            is_raw_movement_event: true,
            pointer_type: PointerType::Mouse,
            force: 0.0,
            tilt_x: 0,
            tilt_y: 0,
            twist: 0.0,
            tangential_pressure: 0.0,
            modifiers: self.modifiers(event.modifiers, event.buttons),
            timestamp,
        };
        if let Some(tablet) = event.tablet {
            mouse.pointer_type = match tablet.pointer_type {
                TabletPointerType::Pen => PointerType::Pen,
                TabletPointerType::Eraser => PointerType::Eraser,
            };
            mouse.force = tablet.pressure;
            mouse.tilt_x = tablet.tilt_x;
            mouse.tilt_y = tablet.tilt_y;
            mouse.twist = tablet.rotation;
            mouse.tangential_pressure = tablet.tangential_pressure;
        }

        tracing::trace!(
            target: targets::POINTER,
            kind = ?mouse.kind,
            button = ?mouse.button,
            clicks = mouse.click_count,
            "pointer event"
        );
        Some(PointerTranslation {
            event: mouse,
            reset_cursor_to,
        })
    }

    /// Convert a hover event. Hover enter has no canonical counterpart.
    pub fn map_hover(&self, event: &HoverEvent, timestamp: Instant) -> Option<MouseEvent> {
        let kind = match event.kind {
            HoverKind::Enter => return None,
            HoverKind::Move => MouseEventKind::Move,
            HoverKind::Leave => MouseEventKind::Leave,
        };
        Some(self.plain_mouse_event(
            kind,
            event.position,
            event.global_position,
            self.modifiers(event.modifiers, NativeButtons::empty()),
            timestamp,
        ))
    }

    /// The pointer left the view.
    pub fn leave_event(&self, timestamp: Instant) -> MouseEvent {
        self.plain_mouse_event(
            MouseEventKind::Leave,
            Point::ZERO,
            self.previous_global_position,
            self.modifiers(Default::default(), self.held_buttons),
            timestamp,
        )
    }

    /// Buttons held according to the last pointer event.
    pub fn held_buttons(&self) -> NativeButtons {
        self.held_buttons
    }

    fn plain_mouse_event(
        &self,
        kind: MouseEventKind,
        position: Point,
        global_position: Point,
        modifiers: EventModifiers,
        timestamp: Instant,
    ) -> MouseEvent {
        MouseEvent {
            kind,
            button: MouseButton::None,
            click_count: 0,
            position,
            global_position,
            movement_x: 0.0,
            movement_y: 0.0,
            is_raw_movement_event: false,
            pointer_type: PointerType::Mouse,
            force: 0.0,
            tilt_x: 0,
            tilt_y: 0,
            twist: 0.0,
            tangential_pressure: 0.0,
            modifiers,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InputConfig, Platform};
    use crate::native::{NativeModifiers, TabletProperties};

    fn mapper() -> EventMapper {
        EventMapper::new(InputConfig::new().with_platform(Platform::Linux))
    }

    fn press(button: NativeButton, x: f32, ts: u64) -> NativePointerEvent {
        NativePointerEvent::new(PointerEventKind::Press, button, Point::new(x, 10.0))
            .with_timestamp(ts)
    }

    fn release(button: NativeButton, x: f32, ts: u64) -> NativePointerEvent {
        NativePointerEvent::new(PointerEventKind::Release, button, Point::new(x, 10.0))
            .with_timestamp(ts)
    }

    #[test]
    fn test_button_priority_for_moves() {
        assert_eq!(
            button_for_event(NativeButton::NoButton, NativeButtons::RIGHT | NativeButtons::MIDDLE),
            MouseButton::Right
        );
        assert_eq!(
            button_for_event(NativeButton::NoButton, NativeButtons::LEFT | NativeButtons::FORWARD),
            MouseButton::Left
        );
        assert_eq!(
            button_for_event(NativeButton::Middle, NativeButtons::LEFT),
            MouseButton::Middle
        );
        assert_eq!(
            button_for_event(NativeButton::NoButton, NativeButtons::empty()),
            MouseButton::None
        );
    }

    #[test]
    fn test_double_and_triple_click() {
        let mut m = mapper();
        let now = Instant::now();
        let counts: Vec<u32> = [100, 300, 500, 700]
            .into_iter()
            .map(|ts| {
                m.map_pointer(&press(NativeButton::Left, 10.0, ts), now, false)
                    .unwrap()
                    .event
                    .click_count
            })
            .collect();
        assert_eq!(counts, vec![1, 2, 3, 1]);
    }

    #[test]
    fn test_release_inherits_count() {
        let mut m = mapper();
        let now = Instant::now();
        m.map_pointer(&press(NativeButton::Left, 10.0, 100), now, false);
        m.map_pointer(&release(NativeButton::Left, 10.0, 150), now, false);
        m.map_pointer(&press(NativeButton::Left, 10.0, 200), now, false);
        let up = m
            .map_pointer(&release(NativeButton::Left, 10.0, 250), now, false)
            .unwrap();
        assert_eq!(up.event.kind, MouseEventKind::Up);
        assert_eq!(up.event.click_count, 2);
    }

    #[test]
    fn test_streak_breaks_on_distance_button_or_time() {
        let mut m = mapper();
        let now = Instant::now();
        m.map_pointer(&press(NativeButton::Left, 10.0, 100), now, false);
        let far = m.map_pointer(&press(NativeButton::Left, 30.0, 150), now, false).unwrap();
        assert_eq!(far.event.click_count, 1);
        let other = m.map_pointer(&press(NativeButton::Right, 30.0, 200), now, false).unwrap();
        assert_eq!(other.event.click_count, 1);
        let late = m.map_pointer(&press(NativeButton::Right, 30.0, 900), now, false).unwrap();
        assert_eq!(late.event.click_count, 1);
    }

    #[test]
    fn test_press_without_button_dropped() {
        let mut m = mapper();
        let event = press(NativeButton::Other(9), 0.0, 0);
        assert!(m.map_pointer(&event, Instant::now(), false).is_none());
        let event = release(NativeButton::NoButton, 0.0, 0);
        assert!(m.map_pointer(&event, Instant::now(), false).is_none());
    }

    #[test]
    fn test_movement_and_lock() {
        let mut m = mapper();
        let now = Instant::now();
        let at = |x: f32| {
            NativePointerEvent::new(PointerEventKind::Move, NativeButton::NoButton, Point::new(x, 0.0))
        };
        m.map_pointer(&at(10.0), now, false);
        let moved = m.map_pointer(&at(15.0), now, false).unwrap();
        assert_eq!(moved.event.movement_x, 5.0);
        assert!(moved.reset_cursor_to.is_none());

        let locked = m.map_pointer(&at(25.0), now, true).unwrap();
        assert_eq!(locked.event.movement_x, 10.0);
        assert_eq!(locked.reset_cursor_to, Some(Point::new(15.0, 0.0)));
        // The anchor did not move while locked.
        let again = m.map_pointer(&at(20.0), now, true).unwrap();
        assert_eq!(again.event.movement_x, 5.0);
    }

    #[test]
    fn test_tablet_properties() {
        let mut m = mapper();
        let event = press(NativeButton::Left, 0.0, 0).with_tablet(TabletProperties {
            pressure: 0.75,
            tilt_x: 10,
            tilt_y: -5,
            rotation: 45.0,
            tangential_pressure: 0.1,
            pointer_type: TabletPointerType::Eraser,
        });
        let out = m.map_pointer(&event, Instant::now(), false).unwrap().event;
        assert_eq!(out.pointer_type, PointerType::Eraser);
        assert_eq!(out.force, 0.75);
        assert_eq!(out.tilt_y, -5);
    }

    #[test]
    fn test_modifiers_and_buttons_down() {
        let mut m = mapper();
        let event = press(NativeButton::Left, 0.0, 0).with_modifiers(NativeModifiers::SHIFT);
        let out = m.map_pointer(&event, Instant::now(), false).unwrap().event;
        assert!(out.modifiers.contains(EventModifiers::SHIFT));
        assert!(out
            .modifiers
            .contains(EventModifiers::LEFT_BUTTON_DOWN));
    }

    #[test]
    fn test_hover_mapping() {
        let m = mapper();
        let now = Instant::now();
        assert!(m.map_hover(&HoverEvent::new(HoverKind::Enter, Point::ZERO), now).is_none());
        let moved = m.map_hover(&HoverEvent::new(HoverKind::Move, Point::new(3.0, 4.0)), now);
        assert_eq!(moved.unwrap().kind, MouseEventKind::Move);
        let left = m.map_hover(&HoverEvent::new(HoverKind::Leave, Point::ZERO), now);
        assert_eq!(left.unwrap().kind, MouseEventKind::Leave);
    }
}
