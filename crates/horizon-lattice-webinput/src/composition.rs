//! IME composition tracking.
//!
//! Input method events are turned into the engine's set-composition,
//! commit-text and cancel-composition calls. The one subtle case is an
//! event with no commit, no preedit and no replacement arriving mid
//! composition: it either means backspace erased the last preedit
//! character, or (with some IMEs) that the composed character is about to
//! arrive as a plain key event. The machine parks in
//! [`CompositionPhase::AwaitingDisambiguation`], reposts the event once, and
//! lets whichever comes first decide.
//!
//! # Usage
//!
//! ```ignore
//! let mut composition = CompositionStateMachine::new();
//! composition.handle_event(&InputMethodEvent::preedit("k"), &query, &mut engine, &mut im);
//! composition.handle_event(&InputMethodEvent::commit("한"), &query, &mut engine, &mut im);
//! assert!(!composition.is_active());
//! ```

use std::ops::Range;

use crate::collaborators::{ImeHost, ImeTextSpan, InputMethodHost};
use crate::config::Platform;
use crate::logging::targets;
use crate::native::{InputMethodAttribute, InputMethodEvent, KeyEventKind, NativeKeyEvent};
use crate::query::InputMethodQueryState;

/// Composition lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompositionPhase {
    #[default]
    Inactive,
    Composing,
    /// An empty event arrived while composing and was reposted.
    AwaitingDisambiguation,
}

/// What the key handler should do after the composition machine saw a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Deliver the key event normally.
    Continue,
    /// The key event finished a composition and must not be delivered.
    Consumed,
}

/// Attributes of one input method event, resolved against the preedit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAttributes {
    pub spans: Vec<ImeTextSpan>,
    /// Caret inside the preedit, if the event placed one.
    pub cursor: Option<usize>,
    /// Explicit selection, if the event carried one.
    pub selection: Option<Range<usize>>,
}

/// Resolve attributes. Offsets are clamped to `[0, text_len]`.
pub fn parse_attributes(event: &InputMethodEvent, text_len: usize) -> ParsedAttributes {
    let clamp = |v: i32| (v.max(0) as usize).min(text_len);
    let mut parsed = ParsedAttributes {
        spans: Vec::new(),
        cursor: None,
        selection: None,
    };

    for attribute in &event.attributes {
        match *attribute {
            InputMethodAttribute::TextFormat {
                start,
                length,
                underline_color,
                thick,
            } => {
                if event.preedit_string.is_empty() {
                    continue;
                }
                let (lo, hi) = ordered(start, length);
                parsed.spans.push(ImeTextSpan {
                    start: clamp(lo),
                    end: clamp(hi),
                    underline_color,
                    thick,
                });
            }
            InputMethodAttribute::Cursor { position } => {
                parsed.cursor = Some(clamp(position));
            }
            InputMethodAttribute::Selection { start, length } => {
                // An empty selection at zero without preedit cancels.
                if event.preedit_string.is_empty() && start.saturating_add(length) == 0 {
                    parsed.selection = Some(0..0);
                    continue;
                }
                let (lo, hi) = ordered(start, length);
                parsed.selection = Some(clamp(lo)..clamp(hi));
            }
        }
    }
    parsed
}

fn ordered(start: i32, length: i32) -> (i32, i32) {
    let end = start.saturating_add(length);
    (start.min(end), start.max(end))
}

/// Tracks in-progress IME composition and talks to the engine.
#[derive(Debug, Default)]
pub struct CompositionStateMachine {
    phase: CompositionPhase,
    preedit: String,
    cursor_in_preedit: usize,
    selection: Range<usize>,
    spans: Vec<ImeTextSpan>,
}

impl CompositionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CompositionPhase {
        self.phase
    }

    /// Whether a composition is in progress, including while awaiting
    /// disambiguation.
    pub fn is_active(&self) -> bool {
        self.phase != CompositionPhase::Inactive
    }

    pub fn preedit(&self) -> &str {
        &self.preedit
    }

    pub fn cursor_in_preedit(&self) -> usize {
        self.cursor_in_preedit
    }

    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    pub fn spans(&self) -> &[ImeTextSpan] {
        &self.spans
    }

    #[tracing::instrument(skip_all, target = "horizon_lattice_webinput::ime", level = "trace")]
    pub fn handle_event(
        &mut self,
        event: &InputMethodEvent,
        editor: &InputMethodQueryState,
        ime: &mut dyn ImeHost,
        input_method: &mut dyn InputMethodHost,
    ) {
        let preedit_len = event.preedit_string.chars().count();
        let surrounding_len = editor.surrounding_len();
        let limit = if preedit_len > 0 { preedit_len } else { surrounding_len };
        let attributes = parse_attributes(event, limit);
        let has_selection = attributes.selection.is_some();

        let selection = attributes.selection.clone().unwrap_or_else(|| {
            let cursor = attributes.cursor.unwrap_or(preedit_len);
            cursor..cursor
        });

        if let Some(explicit) = &attributes.selection {
            ime.set_editable_selection_offsets(explicit.start, explicit.end);
        }

        let replacement = replacement_range(event, editor.cursor_position(), surrounding_len);

        if event.is_empty() {
            if self.phase == CompositionPhase::Composing && !has_selection {
                self.set_phase(CompositionPhase::AwaitingDisambiguation);
                input_method.repost(event.clone());
            } else {
                if self.is_active() {
                    ime.cancel_composition();
                }
                self.finish();
            }
            return;
        }

        if self.phase == CompositionPhase::AwaitingDisambiguation {
            self.set_phase(CompositionPhase::Composing);
        }

        if !event.commit_string.is_empty() || event.replacement_length > 0 {
            ime.commit_text(&event.commit_string, &attributes.spans, replacement.clone(), 0);
            self.finish();
        }

        // A commit and a preedit in one event start a new composition.
        if !event.preedit_string.is_empty() {
            ime.set_composition(
                &event.preedit_string,
                &attributes.spans,
                replacement,
                selection.start,
                selection.end,
            );
            self.preedit = event.preedit_string.clone();
            self.cursor_in_preedit = attributes.cursor.unwrap_or(preedit_len);
            self.selection = selection;
            self.spans = attributes.spans;
            self.set_phase(CompositionPhase::Composing);
        }
    }

    /// Let a key event resolve a pending disambiguation.
    ///
    /// A key with an identity means the composition was abandoned. A key
    /// without one carries the composed text, which is committed on release.
    pub fn on_key_event(&mut self, event: &NativeKeyEvent, ime: &mut dyn ImeHost) -> KeyDisposition {
        if self.phase != CompositionPhase::AwaitingDisambiguation {
            return KeyDisposition::Continue;
        }

        if event.key.is_some() {
            ime.cancel_composition();
            self.finish();
            return KeyDisposition::Continue;
        }

        if event.kind == KeyEventKind::Release {
            ime.commit_text(&event.text, &[], None, 0);
            self.finish();
        }
        KeyDisposition::Consumed
    }

    /// A pointer press or touch landed while composing: ask the toolkit
    /// input method to finish the composition.
    pub fn commit_for_pointer(&mut self, platform: Platform, input_method: &mut dyn InputMethodHost) {
        if !self.is_active() {
            return;
        }
        self.finish();
        match platform {
            // Windows input methods implement commit through reset.
            Platform::Windows => input_method.reset(),
            Platform::Linux | Platform::MacOs => input_method.commit(),
        }
    }

    /// Focus left the view: drop the composition.
    pub fn cancel(&mut self, ime: &mut dyn ImeHost) {
        if self.is_active() {
            ime.cancel_composition();
        }
        self.finish();
    }

    fn finish(&mut self) {
        self.preedit.clear();
        self.cursor_in_preedit = 0;
        self.selection = 0..0;
        self.spans.clear();
        self.set_phase(CompositionPhase::Inactive);
    }

    fn set_phase(&mut self, phase: CompositionPhase) {
        if self.phase != phase {
            tracing::debug!(target: targets::IME, from = ?self.phase, to = ?phase, "composition phase");
            self.phase = phase;
        }
    }
}

/// Text range an event replaces, if it names a valid one.
fn replacement_range(
    event: &InputMethodEvent,
    cursor_position: usize,
    text_len: usize,
) -> Option<Range<usize>> {
    if event.replacement_length <= 0 {
        return None;
    }
    let start = if event.replacement_start < 0 {
        cursor_position as i64 + event.replacement_start as i64
    } else {
        event.replacement_start as i64
    };
    if start < 0 || start as usize >= text_len {
        return None;
    }
    let start = start as usize;
    Some(start..start + event.replacement_length as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::NativeKey;

    #[derive(Debug, PartialEq)]
    enum Call {
        Compose(String, usize, usize),
        Commit(String, Option<Range<usize>>),
        Cancel,
        Offsets(usize, usize),
    }

    #[derive(Default)]
    struct Engine {
        calls: Vec<Call>,
    }

    impl ImeHost for Engine {
        fn set_composition(
            &mut self,
            text: &str,
            _spans: &[ImeTextSpan],
            _replacement: Option<Range<usize>>,
            selection_start: usize,
            selection_end: usize,
        ) {
            self.calls
                .push(Call::Compose(text.into(), selection_start, selection_end));
        }
        fn commit_text(
            &mut self,
            text: &str,
            _spans: &[ImeTextSpan],
            replacement: Option<Range<usize>>,
            _relative_cursor: i32,
        ) {
            self.calls.push(Call::Commit(text.into(), replacement));
        }
        fn cancel_composition(&mut self) {
            self.calls.push(Call::Cancel);
        }
        fn set_editable_selection_offsets(&mut self, start: usize, end: usize) {
            self.calls.push(Call::Offsets(start, end));
        }
    }

    #[derive(Default)]
    struct Im {
        reposted: Vec<InputMethodEvent>,
        commits: u32,
        resets: u32,
    }

    impl InputMethodHost for Im {
        fn commit(&mut self) {
            self.commits += 1;
        }
        fn reset(&mut self) {
            self.resets += 1;
        }
        fn repost(&mut self, event: InputMethodEvent) {
            self.reposted.push(event);
        }
        fn state_changed(&mut self, _editor_visible: bool, _password_field: bool) {}
        fn selection_changed(&mut self) {}
    }

    fn setup() -> (CompositionStateMachine, InputMethodQueryState, Engine, Im) {
        (
            CompositionStateMachine::new(),
            InputMethodQueryState::new(),
            Engine::default(),
            Im::default(),
        )
    }

    #[test]
    fn test_preedit_then_commit() {
        let (mut c, q, mut engine, mut im) = setup();
        c.handle_event(&InputMethodEvent::preedit("x"), &q, &mut engine, &mut im);
        assert_eq!(c.phase(), CompositionPhase::Composing);
        assert_eq!(c.preedit(), "x");

        c.handle_event(&InputMethodEvent::commit("y"), &q, &mut engine, &mut im);
        assert_eq!(c.phase(), CompositionPhase::Inactive);
        assert_eq!(c.preedit(), "");
        assert_eq!(
            engine.calls,
            vec![Call::Compose("x".into(), 1, 1), Call::Commit("y".into(), None)]
        );
    }

    #[test]
    fn test_cursor_attribute_positions_selection() {
        let (mut c, q, mut engine, mut im) = setup();
        let event = InputMethodEvent::preedit("abcd")
            .with_attribute(InputMethodAttribute::Cursor { position: 2 })
            .with_attribute(InputMethodAttribute::TextFormat {
                start: 4,
                length: -4,
                underline_color: Some(0xff0000ff),
                thick: true,
            });
        c.handle_event(&event, &q, &mut engine, &mut im);
        assert_eq!(engine.calls, vec![Call::Compose("abcd".into(), 2, 2)]);
        assert_eq!(c.cursor_in_preedit(), 2);
        assert_eq!(c.spans()[0].start, 0);
        assert_eq!(c.spans()[0].end, 4);
    }

    #[test]
    fn test_commit_and_preedit_together() {
        let (mut c, q, mut engine, mut im) = setup();
        let mut event = InputMethodEvent::preedit("b");
        event.commit_string = "a".into();
        c.handle_event(&event, &q, &mut engine, &mut im);
        assert_eq!(
            engine.calls,
            vec![Call::Commit("a".into(), None), Call::Compose("b".into(), 1, 1)]
        );
        assert!(c.is_active());
    }

    #[test]
    fn test_empty_event_defers_then_cancels() {
        let (mut c, q, mut engine, mut im) = setup();
        c.handle_event(&InputMethodEvent::preedit("k"), &q, &mut engine, &mut im);
        c.handle_event(&InputMethodEvent::default(), &q, &mut engine, &mut im);
        assert_eq!(c.phase(), CompositionPhase::AwaitingDisambiguation);
        assert_eq!(im.reposted.len(), 1);

        // Nothing else came in between: the reposted event cancels.
        let reposted = im.reposted.remove(0);
        c.handle_event(&reposted, &q, &mut engine, &mut im);
        assert_eq!(c.phase(), CompositionPhase::Inactive);
        assert_eq!(engine.calls.last(), Some(&Call::Cancel));
        assert!(im.reposted.is_empty());
    }

    #[test]
    fn test_key_with_identity_cancels() {
        let (mut c, q, mut engine, mut im) = setup();
        c.handle_event(&InputMethodEvent::preedit("k"), &q, &mut engine, &mut im);
        c.handle_event(&InputMethodEvent::default(), &q, &mut engine, &mut im);

        let key = NativeKeyEvent::new(KeyEventKind::Press, NativeKey::Character('a'));
        assert_eq!(c.on_key_event(&key, &mut engine), KeyDisposition::Continue);
        assert_eq!(c.phase(), CompositionPhase::Inactive);
        assert_eq!(engine.calls.last(), Some(&Call::Cancel));

        // The reposted event then finds nothing to cancel.
        let calls = engine.calls.len();
        let reposted = im.reposted.remove(0);
        c.handle_event(&reposted, &q, &mut engine, &mut im);
        assert_eq!(engine.calls.len(), calls);
    }

    #[test]
    fn test_key_without_identity_commits_on_release() {
        let (mut c, q, mut engine, mut im) = setup();
        c.handle_event(&InputMethodEvent::preedit("ㅎ"), &q, &mut engine, &mut im);
        c.handle_event(&InputMethodEvent::default(), &q, &mut engine, &mut im);

        let press = NativeKeyEvent::new(KeyEventKind::Press, NativeKey::NONE).with_text("한");
        assert_eq!(c.on_key_event(&press, &mut engine), KeyDisposition::Consumed);
        assert_eq!(c.phase(), CompositionPhase::AwaitingDisambiguation);

        let release = NativeKeyEvent::new(KeyEventKind::Release, NativeKey::NONE).with_text("한");
        assert_eq!(c.on_key_event(&release, &mut engine), KeyDisposition::Consumed);
        assert_eq!(c.phase(), CompositionPhase::Inactive);
        assert_eq!(engine.calls.last(), Some(&Call::Commit("한".into(), None)));
    }

    #[test]
    fn test_empty_event_with_selection_cancels_immediately() {
        let (mut c, q, mut engine, mut im) = setup();
        c.handle_event(&InputMethodEvent::preedit("k"), &q, &mut engine, &mut im);
        let cancel = InputMethodEvent::default()
            .with_attribute(InputMethodAttribute::Selection { start: 0, length: 0 });
        c.handle_event(&cancel, &q, &mut engine, &mut im);
        assert_eq!(c.phase(), CompositionPhase::Inactive);
        assert!(im.reposted.is_empty());
        assert_eq!(
            engine.calls[1..],
            [Call::Offsets(0, 0), Call::Cancel]
        );
    }

    #[test]
    fn test_selection_offsets_clamped() {
        let parsed = parse_attributes(
            &InputMethodEvent::preedit("abc")
                .with_attribute(InputMethodAttribute::Selection { start: -2, length: 10 }),
            3,
        );
        assert_eq!(parsed.selection, Some(0..3));
    }

    #[test]
    fn test_extreme_selection_offsets_clamped() {
        let without_preedit = parse_attributes(
            &InputMethodEvent::default()
                .with_attribute(InputMethodAttribute::Selection { start: i32::MAX, length: 1 }),
            3,
        );
        assert_eq!(without_preedit.selection, Some(3..3));

        let with_preedit = parse_attributes(
            &InputMethodEvent::preedit("abc")
                .with_attribute(InputMethodAttribute::Selection { start: i32::MIN, length: -1 }),
            3,
        );
        assert_eq!(with_preedit.selection, Some(0..0));
    }

    #[test]
    fn test_keys_pass_when_not_waiting() {
        let (mut c, _, mut engine, _) = setup();
        let key = NativeKeyEvent::new(KeyEventKind::Press, NativeKey::NONE);
        assert_eq!(c.on_key_event(&key, &mut engine), KeyDisposition::Continue);
        assert!(engine.calls.is_empty());
    }

    #[test]
    fn test_pointer_commit_per_platform() {
        let (mut c, q, mut engine, mut im) = setup();
        c.commit_for_pointer(Platform::Linux, &mut im);
        assert_eq!(im.commits, 0);

        c.handle_event(&InputMethodEvent::preedit("k"), &q, &mut engine, &mut im);
        c.commit_for_pointer(Platform::Windows, &mut im);
        assert_eq!((im.commits, im.resets), (0, 1));
        assert!(!c.is_active());

        c.handle_event(&InputMethodEvent::preedit("k"), &q, &mut engine, &mut im);
        c.commit_for_pointer(Platform::MacOs, &mut im);
        assert_eq!((im.commits, im.resets), (1, 1));
    }

    #[test]
    fn test_replacement_range() {
        let event = InputMethodEvent::commit("x").with_replacement(-2, 2);
        assert_eq!(replacement_range(&event, 5, 10), Some(3..5));
        assert_eq!(replacement_range(&event, 1, 10), None);
        let event = InputMethodEvent::commit("x").with_replacement(10, 1);
        assert_eq!(replacement_range(&event, 0, 10), None);
    }

    #[test]
    fn test_cancel_on_focus_loss() {
        let (mut c, q, mut engine, mut im) = setup();
        c.cancel(&mut engine);
        assert!(engine.calls.is_empty());
        c.handle_event(&InputMethodEvent::preedit("k"), &q, &mut engine, &mut im);
        c.cancel(&mut engine);
        assert_eq!(engine.calls.last(), Some(&Call::Cancel));
        assert!(!c.is_active());
    }
}
