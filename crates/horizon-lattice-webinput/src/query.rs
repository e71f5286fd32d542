//! Input method queries and selection change tracking.
//!
//! The toolkit input method asks the view about the text around the caret.
//! Answers come from a cache that is refreshed from the engine's text input
//! notifications. Those notifications arrive as three separate calls per
//! user-visible change (text input state, text selection, selection bounds),
//! so the host's `selection_changed` signal is only raised once all the
//! relevant ones have been seen.

use bitflags::bitflags;

use crate::collaborators::{
    InputMethodHost, SelectionBoundType, TextInputSource, TextInputType,
};
use crate::geometry::Rect;
use crate::logging::targets;
use crate::native::InputMethodQuery;

bitflags! {
    /// Engine notifications seen since the last reset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ImStateFlags: u8 {
        const TEXT_INPUT_STATE_UPDATED = 1 << 0;
        const TEXT_SELECTION_UPDATED = 1 << 1;
        const TEXT_SELECTION_BOUNDS_UPDATED = 1 << 2;

        const TEXT_SELECTION_FLAGS =
            Self::TEXT_SELECTION_UPDATED.bits() | Self::TEXT_SELECTION_BOUNDS_UPDATED.bits();
        const ALL_FLAGS = Self::TEXT_INPUT_STATE_UPDATED.bits() | Self::TEXT_SELECTION_FLAGS.bits();
    }
}

bitflags! {
    /// Hints describing the focused field to the input method.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InputMethodHints: u32 {
        const HIDDEN_TEXT = 1 << 0;
        const SENSITIVE_DATA = 1 << 1;
        const NO_AUTO_UPPERCASE = 1 << 2;
        const PREFER_LOWERCASE = 1 << 3;
        const NO_PREDICTIVE_TEXT = 1 << 4;
        const MULTI_LINE = 1 << 5;
        const NO_EDIT_MENU = 1 << 6;
        const NO_TEXT_HANDLES = 1 << 7;
        const FORMATTED_NUMBERS_ONLY = 1 << 8;
        const DIALABLE_CHARACTERS_ONLY = 1 << 9;
        const EMAIL_CHARACTERS_ONLY = 1 << 10;
        const URL_CHARACTERS_ONLY = 1 << 11;
    }
}

impl InputMethodHints {
    /// Hints for a field type, plus the ones the view always sets.
    pub fn for_input_type(input_type: TextInputType) -> Self {
        let base = match input_type {
            TextInputType::Password => {
                Self::HIDDEN_TEXT
                    | Self::SENSITIVE_DATA
                    | Self::NO_AUTO_UPPERCASE
                    | Self::PREFER_LOWERCASE
            }
            TextInputType::Number => Self::FORMATTED_NUMBERS_ONLY,
            TextInputType::Telephone => Self::DIALABLE_CHARACTERS_ONLY,
            TextInputType::Email => Self::EMAIL_CHARACTERS_ONLY,
            TextInputType::Url => Self::URL_CHARACTERS_ONLY,
            TextInputType::TextArea | TextInputType::ContentEditable => Self::MULTI_LINE,
            TextInputType::None | TextInputType::Text | TextInputType::Search => Self::empty(),
        };
        base | Self::NO_PREDICTIVE_TEXT | Self::NO_TEXT_HANDLES | Self::NO_EDIT_MENU
    }
}

/// Answer to an input method query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// The property is not supported or not available.
    None,
    Bool(bool),
    Int(i64),
    Text(String),
    Rect(Rect),
    Hints(InputMethodHints),
}

/// Cached editor state for answering input method queries.
#[derive(Debug)]
pub struct InputMethodQueryState {
    flags: ImStateFlags,
    surrounding_text: String,
    cursor_position: usize,
    anchor_within_selection: Option<usize>,
    cursor_within_selection: Option<usize>,
    empty_previous_selection: bool,
}

impl Default for InputMethodQueryState {
    fn default() -> Self {
        Self {
            flags: ImStateFlags::empty(),
            surrounding_text: String::new(),
            cursor_position: 0,
            anchor_within_selection: None,
            cursor_within_selection: None,
            empty_previous_selection: true,
        }
    }
}

impl InputMethodQueryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(&self) -> ImStateFlags {
        self.flags
    }

    /// Forget which notifications were seen.
    pub fn reset_flags(&mut self) {
        self.flags = ImStateFlags::empty();
    }

    pub fn surrounding_text(&self) -> &str {
        &self.surrounding_text
    }

    /// Length of the surrounding text in characters.
    pub fn surrounding_len(&self) -> usize {
        self.surrounding_text.chars().count()
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    pub fn is_previous_selection_empty(&self) -> bool {
        self.empty_previous_selection
    }

    /// The engine's text input state changed.
    pub fn on_text_input_state_updated(
        &mut self,
        text: &dyn TextInputSource,
        host: &mut dyn InputMethodHost,
    ) {
        let Some(state) = text.text_input_state() else {
            host.state_changed(false, false);
            return;
        };
        let input_type = state.input_type;

        self.surrounding_text = match &state.composition_range {
            Some(range) => state
                .value
                .chars()
                .enumerate()
                .filter(|(i, _)| !range.contains(i))
                .map(|(_, c)| c)
                .collect(),
            None => state.value.clone(),
        };

        // With a selection the cursor is updated from the selection instead.
        if text.selected_text().is_empty() {
            self.cursor_position = state.selection_range.start;
            host.state_changed(input_type.is_editable(), input_type == TextInputType::Password);
        }

        if self.flags.contains(ImStateFlags::TEXT_INPUT_STATE_UPDATED) {
            self.flags = ImStateFlags::TEXT_INPUT_STATE_UPDATED;
            return;
        }

        // Composition changes the selection too; only a cleared real
        // selection is worth reporting.
        if state.composition_range.is_some() && self.empty_previous_selection {
            self.flags = ImStateFlags::empty();
            return;
        }

        self.flags |= ImStateFlags::TEXT_INPUT_STATE_UPDATED;
        if self.flags == ImStateFlags::ALL_FLAGS {
            self.selection_changed(text, host);
        }
    }

    /// The visible selection bounds moved.
    pub fn on_selection_bounds_changed(
        &mut self,
        text: &dyn TextInputSource,
        host: &mut dyn InputMethodHost,
    ) {
        self.flags |= ImStateFlags::TEXT_SELECTION_BOUNDS_UPDATED;
        self.maybe_selection_changed(text, host);
    }

    /// The selected text changed.
    pub fn on_text_selection_changed(
        &mut self,
        text: &dyn TextInputSource,
        host: &mut dyn InputMethodHost,
    ) {
        if text.text_selection().is_none() {
            return;
        }
        self.flags |= ImStateFlags::TEXT_SELECTION_UPDATED;
        self.maybe_selection_changed(text, host);
    }

    fn maybe_selection_changed(&mut self, text: &dyn TextInputSource, host: &mut dyn InputMethodHost) {
        let outside_field = self.flags == ImStateFlags::TEXT_SELECTION_FLAGS
            && text.text_input_type() == TextInputType::None;
        if self.flags == ImStateFlags::ALL_FLAGS || outside_field {
            self.selection_changed(text, host);
        }
    }

    /// Recompute cursor and anchor from the engine's selection and raise
    /// the host signal if they changed.
    fn selection_changed(&mut self, text: &dyn TextInputSource, host: &mut dyn InputMethodHost) {
        self.reset_flags();
        let input_type = text.text_input_type();
        let password = input_type == TextInputType::Password;
        let selected_empty = text.selected_text().is_empty();

        if input_type == TextInputType::None {
            if selected_empty && self.empty_previous_selection {
                return;
            }
            self.anchor_within_selection = None;
            self.cursor_within_selection = None;
            self.empty_previous_selection = selected_empty;
            tracing::debug!(target: targets::IME, "selection changed outside editable field");
            host.selection_changed();
            return;
        }

        if selected_empty {
            if let Some(state) = text.text_input_state() {
                self.cursor_position = state.selection_range.start;
            }
            host.state_changed(true, password);
            self.anchor_within_selection = Some(self.cursor_position);
            self.cursor_within_selection = Some(self.cursor_position);
            if !self.empty_previous_selection {
                self.empty_previous_selection = true;
                tracing::debug!(target: targets::IME, "selection cleared");
                host.selection_changed();
            }
            return;
        }

        let Some(selection) = text.text_selection() else {
            return;
        };
        let (min, max) = (
            selection.range.start.min(selection.range.end),
            selection.range.start.max(selection.range.end),
        );
        let min = min.saturating_sub(selection.offset);
        let max = max.saturating_sub(selection.offset);
        let anchor_on_right = text
            .selection_region()
            .is_some_and(|region| region.anchor.bound_type == SelectionBoundType::Right);
        let (anchor, cursor) = if anchor_on_right { (max, min) } else { (min, max) };

        if self.anchor_within_selection == Some(anchor) && self.cursor_within_selection == Some(cursor) {
            return;
        }
        self.anchor_within_selection = Some(anchor);
        self.cursor_within_selection = Some(cursor);
        if !selection.text.is_empty() {
            self.cursor_position = cursor;
        }
        self.empty_previous_selection = selection.text.is_empty();
        tracing::debug!(target: targets::IME, anchor, cursor, "selection changed");
        host.state_changed(true, password);
        host.selection_changed();
    }

    /// Answer one input method query.
    pub fn query(&self, query: InputMethodQuery, text: &dyn TextInputSource) -> QueryValue {
        match query {
            InputMethodQuery::Enabled => QueryValue::Bool(text.text_input_type().is_editable()),
            InputMethodQuery::CursorRectangle => match text.selection_region() {
                Some(region) if region.focus.height() > 0.0 => {
                    let mut caret = region.rect_between_bounds();
                    // Input methods expect a caret with some width.
                    if caret.size.width == 0.0 {
                        caret.size.width = 1.0;
                    }
                    QueryValue::Rect(caret)
                }
                _ => QueryValue::None,
            },
            InputMethodQuery::CursorPosition => QueryValue::Int(self.cursor_position as i64),
            InputMethodQuery::AnchorPosition => {
                let anchor = if text.selected_text().is_empty() {
                    Some(self.cursor_position)
                } else {
                    self.anchor_within_selection
                };
                QueryValue::Int(anchor.map_or(-1, |a| a as i64))
            }
            InputMethodQuery::SurroundingText => QueryValue::Text(self.surrounding_text.clone()),
            InputMethodQuery::CurrentSelection => QueryValue::Text(text.selected_text()),
            InputMethodQuery::MaximumTextLength => QueryValue::None,
            InputMethodQuery::Hints => {
                QueryValue::Hints(InputMethodHints::for_input_type(text.text_input_type()))
            }
        }
    }

    /// Whether the input method should be treated as enabled for shortcut
    /// purposes: an editable field or a hidden-text field is focused.
    pub fn accepts_text(&self, text: &dyn TextInputSource) -> bool {
        let input_type = text.text_input_type();
        input_type.is_editable()
            || InputMethodHints::for_input_type(input_type).contains(InputMethodHints::HIDDEN_TEXT)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
