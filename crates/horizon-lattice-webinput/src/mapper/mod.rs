//! Native to canonical event conversion.
//!
//! [`EventMapper`] holds the little state translation needs (the click
//! streak and the last pointer position) together with the platform
//! settings from [`InputConfig`]. Each submodule adds the conversions for
//! one native event kind:
//!
//! - [`mouse`]: pointer and tablet events, hover, leave
//! - [`keyboard`]: key events, dom key/code and Windows key codes
//! - [`wheel`]: wheel ticks and pixel deltas
//! - [`gesture`]: touchpad pinch and smart zoom
//!
//! Events the engine cannot represent are dropped and logged rather than
//! reported as errors; converters return `Option`.

pub mod gesture;
pub mod keyboard;
pub mod mouse;
pub mod wheel;

use crate::canonical::EventModifiers;
use crate::config::InputConfig;
use crate::geometry::Point;
use crate::native::{NativeButtons, NativeModifiers};

pub use mouse::{ClickCounter, PointerTranslation};

/// Stateful converter from native to canonical events.
#[derive(Debug, Clone)]
pub struct EventMapper {
    config: InputConfig,
    clicks: ClickCounter,
    previous_global_position: Point,
    held_buttons: NativeButtons,
}

impl EventMapper {
    /// Create a mapper for the given configuration.
    pub fn new(config: InputConfig) -> Self {
        Self {
            config,
            clicks: ClickCounter::new(),
            previous_global_position: Point::ZERO,
            held_buttons: NativeButtons::empty(),
        }
    }

    /// The configuration in effect.
    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// Canonical modifiers for a native modifier and button set.
    pub fn modifiers(&self, native: NativeModifiers, buttons: NativeButtons) -> EventModifiers {
        let native = if self.config.swap_control_meta() {
            native.swap_control_meta()
        } else {
            native
        };
        event_modifiers(native, buttons)
    }

    /// Forget click streak and pointer position.
    pub fn reset(&mut self) {
        self.clicks.reset();
        self.previous_global_position = Point::ZERO;
        self.held_buttons = NativeButtons::empty();
    }
}

impl Default for EventMapper {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

/// Convert modifier and held-button sets without any platform swap.
pub fn event_modifiers(native: NativeModifiers, buttons: NativeButtons) -> EventModifiers {
    let mut result = EventModifiers::empty();
    let pairs = [
        (NativeModifiers::SHIFT, EventModifiers::SHIFT),
        (NativeModifiers::CONTROL, EventModifiers::CONTROL),
        (NativeModifiers::ALT, EventModifiers::ALT),
        (NativeModifiers::META, EventModifiers::META),
        (NativeModifiers::KEYPAD, EventModifiers::IS_KEYPAD),
        (NativeModifiers::GROUP_SWITCH, EventModifiers::ALT_GR),
    ];
    for (native_flag, flag) in pairs {
        if native.contains(native_flag) {
            result |= flag;
        }
    }
    let buttons_down = [
        (NativeButtons::LEFT, EventModifiers::LEFT_BUTTON_DOWN),
        (NativeButtons::RIGHT, EventModifiers::RIGHT_BUTTON_DOWN),
        (NativeButtons::MIDDLE, EventModifiers::MIDDLE_BUTTON_DOWN),
        (NativeButtons::BACK, EventModifiers::BACK_BUTTON_DOWN),
        (NativeButtons::FORWARD, EventModifiers::FORWARD_BUTTON_DOWN),
    ];
    for (button, flag) in buttons_down {
        if buttons.contains(button) {
            result |= flag;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Platform;

    #[test]
    fn test_event_modifiers_flags() {
        let m = event_modifiers(
            NativeModifiers::SHIFT | NativeModifiers::KEYPAD,
            NativeButtons::LEFT | NativeButtons::BACK,
        );
        assert_eq!(
            m,
            EventModifiers::SHIFT
                | EventModifiers::IS_KEYPAD
                | EventModifiers::LEFT_BUTTON_DOWN
                | EventModifiers::BACK_BUTTON_DOWN
        );
    }

    #[test]
    fn test_mapper_swaps_on_macos() {
        let mac = EventMapper::new(InputConfig::new().with_platform(Platform::MacOs));
        assert_eq!(
            mac.modifiers(NativeModifiers::CONTROL, NativeButtons::empty()),
            EventModifiers::META
        );
        let linux = EventMapper::new(InputConfig::new().with_platform(Platform::Linux));
        assert_eq!(
            linux.modifiers(NativeModifiers::CONTROL, NativeButtons::empty()),
            EventModifiers::CONTROL
        );
    }
}
