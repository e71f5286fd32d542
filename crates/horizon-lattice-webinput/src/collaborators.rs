//! Narrow interfaces to the objects surrounding the translation layer.
//!
//! The layer never owns the render target, the engine or the toolkit input
//! method. Each capability it needs is a small trait here, and the host
//! bundles mutable references to its implementations into an
//! [`InputContext`] for the duration of one dispatcher call.
//!
//! # Usage
//!
//! ```ignore
//! let mut ctx = InputContext {
//!     target: &mut view,
//!     router: &mut engine,
//!     text_input: &engine_text_state,
//!     ime: &mut engine,
//!     input_method: &mut toolkit_im,
//!     selection: &mut selection_controller,
//!     menu: &mut menu_host,
//!     editor: &mut frame_editor,
//! };
//! dispatcher.handle_pointer(&mut ctx, &event);
//! ```

use std::ops::Range;

use slotmap::new_key_type;

use crate::canonical::{CanonicalEvent, MotionEvent};
use crate::geometry::{Point, Rect, Size};
use crate::native::InputMethodEvent;
use crate::selection::{HandleImages, HandleOrientation, MenuSourceType};

new_key_type! {
    /// Identifies one engine render target (a frame widget accepting input).
    pub struct TargetHandle;
}

/// The view that owns window geometry and focus.
pub trait RenderTarget {
    /// The target currently receiving input.
    fn focused_input_target(&self) -> TargetHandle;

    /// Ask the host toolkit to give the view keyboard focus.
    fn focus(&mut self);

    fn got_focus(&mut self);

    fn lost_focus(&mut self);

    fn set_active(&mut self, active: bool);

    /// Move focus to the first (or, when `reverse`, last) focusable element.
    fn set_initial_focus(&mut self, reverse: bool);

    fn handle_pending_mouse_lock_permission(&mut self);

    fn is_mouse_locked(&self) -> bool;

    fn unlock_mouse(&mut self);

    /// Warp the host cursor to a global position.
    fn set_cursor_position(&mut self, global_position: Point);

    /// Whether a widget inside the page currently holds focus.
    fn has_focused_widget(&self) -> bool;

    /// Whether the view is being moved to another host window.
    fn is_being_adopted(&self) -> bool {
        false
    }
}

/// The engine's input entry point.
pub trait InputRouter {
    /// Deliver a canonical event. Results arrive later as acknowledgements.
    fn route_canonical_event(&mut self, target: TargetHandle, event: CanonicalEvent);
}

/// Kind of the focused text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextInputType {
    #[default]
    None,
    Text,
    Password,
    Search,
    Email,
    Number,
    Telephone,
    Url,
    TextArea,
    ContentEditable,
}

impl TextInputType {
    /// Any field that accepts text.
    pub fn is_editable(self) -> bool {
        self != TextInputType::None
    }

    /// Fields whose contents may be read back (copied, cut).
    pub fn is_readable(self) -> bool {
        self != TextInputType::Password
    }
}

/// Snapshot of the focused text field.
///
/// Offsets are character offsets into `value`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextInputState {
    pub input_type: TextInputType,
    pub value: String,
    pub composition_range: Option<Range<usize>>,
    pub selection_range: Range<usize>,
}

/// The engine's current text selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextSelection {
    /// Selected range in document offsets.
    pub range: Range<usize>,
    /// Document offset of the first character of `text`.
    pub offset: usize,
    pub text: String,
}

/// Which side of the selection a bound sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionBoundType {
    Left,
    Right,
    Center,
    #[default]
    Empty,
}

/// One end of the visible selection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SelectionBound {
    pub bound_type: SelectionBoundType,
    pub edge_start: Point,
    pub edge_end: Point,
}

impl SelectionBound {
    pub fn height(&self) -> f32 {
        (self.edge_end.y - self.edge_start.y).abs()
    }
}

/// Anchor and focus bounds of the visible selection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SelectionRegion {
    pub anchor: SelectionBound,
    pub focus: SelectionBound,
}

impl SelectionRegion {
    /// The rectangle spanning both bounds.
    pub fn rect_between_bounds(&self) -> Rect {
        let points = [
            self.anchor.edge_start,
            self.anchor.edge_end,
            self.focus.edge_start,
            self.focus.edge_end,
        ];
        let min_x = points.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let min_y = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_x = points.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        let max_y = points.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        Rect::from_corners(Point::new(min_x, min_y), Point::new(max_x, max_y))
    }
}

/// Read access to the engine's text input bookkeeping.
pub trait TextInputSource {
    fn text_input_state(&self) -> Option<TextInputState>;

    fn text_selection(&self) -> Option<TextSelection>;

    fn selection_region(&self) -> Option<SelectionRegion>;

    /// Text of the current selection, empty when nothing is selected.
    fn selected_text(&self) -> String {
        self.text_selection().map(|s| s.text).unwrap_or_default()
    }

    /// Kind of the focused field, `None` when nothing editable is focused.
    fn text_input_type(&self) -> TextInputType {
        self.text_input_state()
            .map(|s| s.input_type)
            .unwrap_or_default()
    }
}

/// Underline styling for part of the composition text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImeTextSpan {
    pub start: usize,
    pub end: usize,
    /// RGBA color; `None` draws the default (transparent) underline.
    pub underline_color: Option<u32>,
    pub thick: bool,
}

/// The engine's IME entry points.
pub trait ImeHost {
    fn set_composition(
        &mut self,
        text: &str,
        spans: &[ImeTextSpan],
        replacement: Option<Range<usize>>,
        selection_start: usize,
        selection_end: usize,
    );

    fn commit_text(
        &mut self,
        text: &str,
        spans: &[ImeTextSpan],
        replacement: Option<Range<usize>>,
        relative_cursor: i32,
    );

    fn cancel_composition(&mut self);

    fn set_editable_selection_offsets(&mut self, start: usize, end: usize);
}

/// The host toolkit's input method and the signals the host exposes.
pub trait InputMethodHost {
    /// Commit whatever the input method is composing.
    fn commit(&mut self);

    /// Drop whatever the input method is composing.
    fn reset(&mut self);

    /// Post an event back to the focused object for delivery on the next
    /// event loop turn.
    fn repost(&mut self, event: InputMethodEvent);

    fn state_changed(&mut self, editor_visible: bool, password_field: bool);

    fn selection_changed(&mut self);
}

/// The engine's touch selection controller.
pub trait SelectionController {
    /// Offer a motion event to the controller first. Returns `true` if it
    /// was consumed and must not reach the page.
    fn will_handle_touch_event(&mut self, event: &MotionEvent) -> bool;

    fn handle_long_press(&mut self, at: Point);

    fn handle_tap(&mut self, at: Point, tap_count: u32);

    fn set_temporarily_hidden(&mut self, hidden: bool);

    fn hide_and_disallow_showing_automatically(&mut self);

    fn rect_between_bounds(&self) -> Rect;

    fn start_handle_rect(&self) -> Rect;

    fn end_handle_rect(&self) -> Rect;
}

/// Host side of the touch selection menu.
pub trait MenuHost {
    fn show_touch_selection_menu(&mut self, anchor: Rect, handle_size: Size);

    fn hide_touch_selection_menu(&mut self);

    fn clipboard_has_text(&self) -> bool;
}

/// Editing operations on the focused frame.
pub trait FrameEditor {
    fn cut(&mut self);

    fn copy(&mut self);

    fn paste(&mut self);

    fn show_context_menu_at(&mut self, at: Point, source: MenuSourceType);

    fn move_caret(&mut self, to: Point);

    fn move_range_selection_extent(&mut self, extent: Point);

    fn select_range(&mut self, base: Point, extent: Point);
}

/// Host-drawn selection handle.
pub trait HostTouchHandle {
    fn set_bounds(&mut self, bounds: Rect);

    fn set_visible(&mut self, visible: bool);

    fn set_opacity(&mut self, opacity: f32);

    fn set_image(&mut self, orientation: HandleOrientation);
}

/// Creates host handle visuals.
pub trait HandleDrawableFactory {
    /// `None` when the host cannot draw handles; the resulting drawable then
    /// tracks state without showing anything.
    fn create_touch_handle(&mut self, images: &HandleImages) -> Option<Box<dyn HostTouchHandle>>;
}

/// Collaborators available to one dispatcher call.
pub struct InputContext<'a> {
    pub target: &'a mut dyn RenderTarget,
    pub router: &'a mut dyn InputRouter,
    pub text_input: &'a dyn TextInputSource,
    pub ime: &'a mut dyn ImeHost,
    pub input_method: &'a mut dyn InputMethodHost,
    pub selection: &'a mut dyn SelectionController,
    pub menu: &'a mut dyn MenuHost,
    pub editor: &'a mut dyn FrameEditor,
}

impl InputContext<'_> {
    /// Route an event to the focused target.
    pub fn route(&mut self, event: CanonicalEvent) {
        let target = self.target.focused_input_target();
        self.router.route_canonical_event(target, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedText(Option<TextInputState>);

    impl TextInputSource for FixedText {
        fn text_input_state(&self) -> Option<TextInputState> {
            self.0.clone()
        }

        fn text_selection(&self) -> Option<TextSelection> {
            None
        }

        fn selection_region(&self) -> Option<SelectionRegion> {
            None
        }
    }

    #[test]
    fn test_input_type_rules() {
        assert!(!TextInputType::None.is_editable());
        assert!(TextInputType::Password.is_editable());
        assert!(!TextInputType::Password.is_readable());
        assert!(TextInputType::TextArea.is_readable());
    }

    #[test]
    fn test_default_text_input_queries() {
        let empty = FixedText(None);
        assert_eq!(empty.text_input_type(), TextInputType::None);
        assert_eq!(empty.selected_text(), "");

        let field = FixedText(Some(TextInputState {
            input_type: TextInputType::Email,
            ..TextInputState::default()
        }));
        assert_eq!(field.text_input_type(), TextInputType::Email);
    }

    #[test]
    fn test_rect_between_bounds() {
        let region = SelectionRegion {
            anchor: SelectionBound {
                bound_type: SelectionBoundType::Left,
                edge_start: Point::new(10.0, 20.0),
                edge_end: Point::new(10.0, 36.0),
            },
            focus: SelectionBound {
                bound_type: SelectionBoundType::Right,
                edge_start: Point::new(80.0, 20.0),
                edge_end: Point::new(80.0, 36.0),
            },
        };
        assert_eq!(region.rect_between_bounds(), Rect::new(10.0, 20.0, 70.0, 16.0));
        assert_eq!(region.focus.height(), 16.0);
    }
}
