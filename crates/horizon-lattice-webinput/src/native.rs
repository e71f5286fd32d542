//! Native input events as delivered by the host windowing toolkit.
//!
//! These types describe input in toolkit terms: button and modifier sets,
//! angle-delta wheels, touch batches with per-point lifecycle states, and
//! input-method events with attribute lists. They are the input side of the
//! translation layer; [`canonical`](crate::canonical) is the output side.
//!
//! Hosts usually build them through [`winit_adapter`](crate::winit_adapter),
//! but every field is public so any toolkit can be bridged.

use bitflags::bitflags;

use crate::geometry::Point;

bitflags! {
    /// Keyboard modifiers held during a native event.
    ///
    /// Bits follow toolkit convention: on macOS the Command key is reported
    /// as `CONTROL` and the Control key as `META`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NativeModifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        /// Meta, Super, or the Control key on macOS.
        const META = 1 << 3;
        /// The key originated on the numeric keypad.
        const KEYPAD = 1 << 4;
        /// Mode switch (AltGr on some layouts).
        const GROUP_SWITCH = 1 << 5;
    }
}

impl NativeModifiers {
    /// Exchange the Control and Meta bits.
    ///
    /// Applying the swap twice yields the original set.
    #[must_use]
    pub fn swap_control_meta(self) -> Self {
        let mut swapped = self - (Self::CONTROL | Self::META);
        if self.contains(Self::CONTROL) {
            swapped |= Self::META;
        }
        if self.contains(Self::META) {
            swapped |= Self::CONTROL;
        }
        swapped
    }
}

/// A single mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeButton {
    /// No button is associated with the event (pure movement).
    NoButton,
    Left,
    Right,
    Middle,
    Back,
    Forward,
    /// A device-specific button the engine does not model.
    Other(u16),
}

bitflags! {
    /// The set of mouse buttons currently held.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NativeButtons: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const MIDDLE = 1 << 2;
        const BACK = 1 << 3;
        const FORWARD = 1 << 4;
    }
}

impl NativeButton {
    /// The flag for this button in a [`NativeButtons`] set.
    pub fn as_flag(self) -> NativeButtons {
        match self {
            NativeButton::Left => NativeButtons::LEFT,
            NativeButton::Right => NativeButtons::RIGHT,
            NativeButton::Middle => NativeButtons::MIDDLE,
            NativeButton::Back => NativeButtons::BACK,
            NativeButton::Forward => NativeButtons::FORWARD,
            NativeButton::NoButton | NativeButton::Other(_) => NativeButtons::empty(),
        }
    }
}

/// Kind of a native pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    Press,
    Release,
    Move,
    /// A press the toolkit already recognized as a double click.
    ///
    /// Click streaks are counted locally, so this is handled as a press.
    DoubleClick,
}

/// Tool at the tip of a tablet stylus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabletPointerType {
    Pen,
    Eraser,
}

/// Stylus properties of a tablet pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabletProperties {
    /// Normalized pressure in `0.0..=1.0`.
    pub pressure: f32,
    /// Tilt in degrees, `-60..=60`.
    pub tilt_x: i32,
    pub tilt_y: i32,
    /// Barrel rotation in degrees.
    pub rotation: f32,
    /// Tangential (airbrush wheel) pressure.
    pub tangential_pressure: f32,
    pub pointer_type: TabletPointerType,
}

/// A mouse or tablet pointer event.
#[derive(Debug, Clone, PartialEq)]
pub struct NativePointerEvent {
    pub kind: PointerEventKind,
    /// The button that changed state; `NoButton` for moves.
    pub button: NativeButton,
    /// Buttons held after the event.
    pub buttons: NativeButtons,
    pub position: Point,
    pub global_position: Point,
    pub modifiers: NativeModifiers,
    pub timestamp_ms: u64,
    /// Present when the event comes from a tablet stylus.
    pub tablet: Option<TabletProperties>,
}

impl NativePointerEvent {
    /// A plain mouse event with no modifiers.
    pub fn new(kind: PointerEventKind, button: NativeButton, position: Point) -> Self {
        let buttons = match kind {
            PointerEventKind::Press | PointerEventKind::DoubleClick => button.as_flag(),
            _ => NativeButtons::empty(),
        };
        Self {
            kind,
            button,
            buttons,
            position,
            global_position: position,
            modifiers: NativeModifiers::empty(),
            timestamp_ms: 0,
            tablet: None,
        }
    }

    pub fn with_global_position(mut self, global_position: Point) -> Self {
        self.global_position = global_position;
        self
    }

    pub fn with_buttons(mut self, buttons: NativeButtons) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_modifiers(mut self, modifiers: NativeModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn with_tablet(mut self, tablet: TabletProperties) -> Self {
        self.tablet = Some(tablet);
        self
    }
}

/// Keys without a printable character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Backspace,
    Tab,
    /// Shift+Tab as reported by some toolkits.
    Backtab,
    Clear,
    Enter,
    Shift,
    Control,
    Alt,
    /// Meta, Command or Super.
    Meta,
    AltGraph,
    Pause,
    CapsLock,
    Escape,
    Space,
    PageUp,
    PageDown,
    End,
    Home,
    ArrowLeft,
    ArrowUp,
    ArrowRight,
    ArrowDown,
    PrintScreen,
    Insert,
    Delete,
    Help,
    ContextMenu,
    NumLock,
    ScrollLock,
    /// Function keys F1 to F24.
    F(u8),
    Unidentified,
}

/// Logical key of a native key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKey {
    Named(NamedKey),
    Character(char),
}

impl NativeKey {
    /// No key value; used by toolkits for composed input with text only.
    pub const NONE: NativeKey = NativeKey::Named(NamedKey::Unidentified);

    /// Whether the toolkit supplied a real key value.
    pub fn is_some(&self) -> bool {
        *self != Self::NONE
    }
}

/// Where on the keyboard a key sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyLocation {
    #[default]
    Standard,
    Left,
    Right,
    Numpad,
}

/// Kind of a native key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    Press,
    Release,
}

/// A keyboard event.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeKeyEvent {
    pub kind: KeyEventKind,
    pub key: NativeKey,
    pub location: KeyLocation,
    /// Text the key produces with the current modifiers.
    pub text: String,
    pub modifiers: NativeModifiers,
    pub native_scan_code: u32,
    pub native_virtual_key: u32,
    pub auto_repeat: bool,
    pub timestamp_ms: u64,
}

impl NativeKeyEvent {
    /// A key event with no text, modifiers or native codes.
    pub fn new(kind: KeyEventKind, key: NativeKey) -> Self {
        Self {
            kind,
            key,
            location: KeyLocation::Standard,
            text: String::new(),
            modifiers: NativeModifiers::empty(),
            native_scan_code: 0,
            native_virtual_key: 0,
            auto_repeat: false,
            timestamp_ms: 0,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_modifiers(mut self, modifiers: NativeModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_location(mut self, location: KeyLocation) -> Self {
        self.location = location;
        self
    }

    pub fn with_auto_repeat(mut self, auto_repeat: bool) -> Self {
        self.auto_repeat = auto_repeat;
        self
    }

    pub fn with_native_codes(mut self, scan_code: u32, virtual_key: u32) -> Self {
        self.native_scan_code = scan_code;
        self.native_virtual_key = virtual_key;
        self
    }

    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }
}

/// Scroll phase of a wheel event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScrollPhase {
    /// Discrete wheel without phase information.
    #[default]
    NoPhase,
    Begin,
    Update,
    End,
    /// Inertial scrolling after the fingers lifted.
    Momentum,
}

/// A wheel or touchpad scroll event.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeWheelEvent {
    /// Rotation in eighths of a degree; 120 units per notch on most mice.
    pub angle_delta: Point,
    /// Exact pixel deltas from high-resolution devices.
    pub pixel_delta: Option<Point>,
    pub phase: ScrollPhase,
    pub position: Point,
    pub global_position: Point,
    pub modifiers: NativeModifiers,
    pub buttons: NativeButtons,
    pub timestamp_ms: u64,
}

impl NativeWheelEvent {
    /// A phaseless vertical/horizontal wheel event.
    pub fn new(angle_delta: Point, position: Point) -> Self {
        Self {
            angle_delta,
            pixel_delta: None,
            phase: ScrollPhase::NoPhase,
            position,
            global_position: position,
            modifiers: NativeModifiers::empty(),
            buttons: NativeButtons::empty(),
            timestamp_ms: 0,
        }
    }

    pub fn with_pixel_delta(mut self, pixel_delta: Point) -> Self {
        self.pixel_delta = Some(pixel_delta);
        self
    }

    pub fn with_phase(mut self, phase: ScrollPhase) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_modifiers(mut self, modifiers: NativeModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }
}

/// Toolkit-level kind of a touch batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchBatchKind {
    Begin,
    Update,
    End,
    Cancel,
}

/// Lifecycle state of one touch point within a batch.
///
/// The declaration order is the delivery order used when sequencing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TouchPointState {
    Pressed,
    Updated,
    Stationary,
    Released,
}

/// One touch point of a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    /// Toolkit-assigned id, stable for the press-to-release lifetime.
    pub raw_id: i64,
    pub position: Point,
    pub global_position: Point,
    pub pressure: f32,
    /// Contact ellipse axes.
    pub ellipse_diameters: (f32, f32),
    pub state: TouchPointState,
}

impl TouchPoint {
    pub fn new(raw_id: i64, state: TouchPointState, position: Point) -> Self {
        Self {
            raw_id,
            position,
            global_position: position,
            pressure: 1.0,
            ellipse_diameters: (0.0, 0.0),
            state,
        }
    }

    pub fn with_global_position(mut self, global_position: Point) -> Self {
        self.global_position = global_position;
        self
    }

    pub fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = pressure;
        self
    }

    pub fn with_ellipse_diameters(mut self, major: f32, minor: f32) -> Self {
        self.ellipse_diameters = (major, minor);
        self
    }
}

/// A batch of touch points delivered in one toolkit event.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchBatch {
    pub kind: TouchBatchKind,
    pub points: Vec<TouchPoint>,
    pub modifiers: NativeModifiers,
    pub timestamp_ms: u64,
    /// Generated by the windowing system rather than synthesized.
    pub spontaneous: bool,
}

impl TouchBatch {
    pub fn new(kind: TouchBatchKind, points: Vec<TouchPoint>) -> Self {
        Self {
            kind,
            points,
            modifiers: NativeModifiers::empty(),
            timestamp_ms: 0,
            spontaneous: true,
        }
    }

    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn with_modifiers(mut self, modifiers: NativeModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_spontaneous(mut self, spontaneous: bool) -> Self {
        self.spontaneous = spontaneous;
        self
    }
}

/// Platform gesture subtypes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeGestureKind {
    Begin,
    End,
    /// Incremental zoom factor change (0.0 means no change).
    Zoom(f32),
    /// Two-finger double tap.
    SmartZoom,
    Rotate(f32),
    Pan,
    Swipe,
}

/// A touchpad gesture recognized by the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeGestureEvent {
    pub kind: NativeGestureKind,
    pub position: Point,
    pub global_position: Point,
    pub modifiers: NativeModifiers,
    pub timestamp_ms: u64,
}

impl NativeGestureEvent {
    pub fn new(kind: NativeGestureKind, position: Point) -> Self {
        Self {
            kind,
            position,
            global_position: position,
            modifiers: NativeModifiers::empty(),
            timestamp_ms: 0,
        }
    }
}

/// Kind of a hover event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverKind {
    Enter,
    Move,
    Leave,
}

/// Pointer movement without buttons, reported while the view has hover tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverEvent {
    pub kind: HoverKind,
    pub position: Point,
    pub global_position: Point,
    pub modifiers: NativeModifiers,
    pub timestamp_ms: u64,
}

impl HoverEvent {
    pub fn new(kind: HoverKind, position: Point) -> Self {
        Self {
            kind,
            position,
            global_position: position,
            modifiers: NativeModifiers::empty(),
            timestamp_ms: 0,
        }
    }
}

/// Why focus moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusReason {
    Tab,
    Backtab,
    /// A popup opened; the view keeps logical focus.
    Popup,
    Mouse,
    Other,
}

/// Focus gained or lost by the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusEvent {
    pub gained: bool,
    pub reason: FocusReason,
}

impl FocusEvent {
    pub fn gained(reason: FocusReason) -> Self {
        Self {
            gained: true,
            reason,
        }
    }

    pub fn lost(reason: FocusReason) -> Self {
        Self {
            gained: false,
            reason,
        }
    }
}

/// Attribute attached to an input method event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMethodAttribute {
    /// Underline a span of the preedit text.
    TextFormat {
        start: i32,
        length: i32,
        /// RGBA underline color; `None` for the default.
        underline_color: Option<u32>,
        /// Thick underline for the segment being converted.
        thick: bool,
    },
    /// Caret position inside the preedit text.
    Cursor { position: i32 },
    /// Explicit selection inside the editor.
    Selection { start: i32, length: i32 },
}

/// An input method (IME) event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputMethodEvent {
    pub commit_string: String,
    pub preedit_string: String,
    pub attributes: Vec<InputMethodAttribute>,
    /// Start of the text to replace, relative to the cursor.
    pub replacement_start: i32,
    pub replacement_length: i32,
}

impl InputMethodEvent {
    /// An event that updates the preedit text.
    pub fn preedit(text: impl Into<String>) -> Self {
        Self {
            preedit_string: text.into(),
            ..Self::default()
        }
    }

    /// An event that commits text.
    pub fn commit(text: impl Into<String>) -> Self {
        Self {
            commit_string: text.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, attribute: InputMethodAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_replacement(mut self, start: i32, length: i32) -> Self {
        self.replacement_start = start;
        self.replacement_length = length;
        self
    }

    /// No commit, preedit or replacement.
    pub fn is_empty(&self) -> bool {
        self.commit_string.is_empty()
            && self.preedit_string.is_empty()
            && self.replacement_length == 0
    }

    /// Whether an explicit selection attribute is present.
    pub fn has_selection_attribute(&self) -> bool {
        self.attributes
            .iter()
            .any(|a| matches!(a, InputMethodAttribute::Selection { .. }))
    }
}

/// Properties the input method may ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputMethodQuery {
    Enabled,
    CursorRectangle,
    CursorPosition,
    AnchorPosition,
    SurroundingText,
    CurrentSelection,
    MaximumTextLength,
    Hints,
}

/// Any native event the host can deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    Pointer(NativePointerEvent),
    Key(NativeKeyEvent),
    /// A key press offered for shortcut override before delivery.
    ShortcutOverride(NativeKeyEvent),
    Wheel(NativeWheelEvent),
    Touch(TouchBatch),
    Gesture(NativeGestureEvent),
    Hover(HoverEvent),
    Focus(FocusEvent),
    InputMethod(InputMethodEvent),
    /// The pointer left the view.
    Leave,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_control_meta_is_involution() {
        let all = [
            NativeModifiers::empty(),
            NativeModifiers::CONTROL,
            NativeModifiers::META,
            NativeModifiers::CONTROL | NativeModifiers::META,
            NativeModifiers::SHIFT | NativeModifiers::CONTROL | NativeModifiers::KEYPAD,
            NativeModifiers::all(),
        ];
        for modifiers in all {
            assert_eq!(modifiers.swap_control_meta().swap_control_meta(), modifiers);
        }
    }

    #[test]
    fn test_swap_control_meta_exchanges_bits() {
        let swapped = (NativeModifiers::CONTROL | NativeModifiers::SHIFT).swap_control_meta();
        assert_eq!(swapped, NativeModifiers::META | NativeModifiers::SHIFT);
    }

    #[test]
    fn test_touch_state_ordering() {
        assert!(TouchPointState::Pressed < TouchPointState::Updated);
        assert!(TouchPointState::Updated < TouchPointState::Stationary);
        assert!(TouchPointState::Stationary < TouchPointState::Released);
    }

    #[test]
    fn test_input_method_event_emptiness() {
        assert!(InputMethodEvent::default().is_empty());
        assert!(!InputMethodEvent::preedit("a").is_empty());
        assert!(!InputMethodEvent::default().with_replacement(-1, 1).is_empty());
        let with_selection = InputMethodEvent::default()
            .with_attribute(InputMethodAttribute::Selection { start: 0, length: 0 });
        assert!(with_selection.is_empty());
        assert!(with_selection.has_selection_attribute());
    }

    #[test]
    fn test_press_sets_button_flag() {
        let event = NativePointerEvent::new(PointerEventKind::Press, NativeButton::Right, Point::ZERO);
        assert_eq!(event.buttons, NativeButtons::RIGHT);
        let event = NativePointerEvent::new(PointerEventKind::Move, NativeButton::NoButton, Point::ZERO);
        assert!(event.buttons.is_empty());
    }
}
