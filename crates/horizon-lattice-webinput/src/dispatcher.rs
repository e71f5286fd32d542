//! Host-facing entry points.
//!
//! [`InputDispatcher`] owns every stateful component of the layer and
//! exposes one method per native event kind plus the notifications the
//! engine sends back (acknowledgements, gestures, selection and text input
//! updates). Collaborators are passed in per call through
//! [`InputContext`]; the dispatcher keeps no references between calls.
//!
//! # Usage
//!
//! ```ignore
//! let mut dispatcher = InputDispatcher::from_config_file("input.toml")?;
//!
//! // For each native event from the toolkit:
//! let accepted = dispatcher.handle_event(&mut ctx, &native_event)?;
//!
//! // When the engine acknowledges an event:
//! dispatcher.on_input_ack(&mut ctx, event_id, InputAckState::Consumed);
//! ```

use std::path::Path;

use crate::canonical::{CanonicalEvent, EventId, GestureEvent, GestureKind};
use crate::clock::EventClock;
use crate::collaborators::{HandleDrawableFactory, InputContext};
use crate::composition::{CompositionStateMachine, KeyDisposition};
use crate::config::{InputConfig, Platform};
use crate::edit_command::{self, EditCommand};
use crate::error::InputResult;
use crate::logging::{span_names, targets};
use crate::mapper::EventMapper;
use crate::native::{
    FocusEvent, FocusReason, HoverEvent, HoverKind, InputMethodEvent, InputMethodQuery,
    KeyEventKind, NamedKey, NativeButtons, NativeEvent, NativeGestureEvent, NativeKey,
    NativeKeyEvent, NativePointerEvent, NativeWheelEvent, PointerEventKind, TouchBatch,
    TouchBatchKind,
};
use crate::query::{InputMethodQueryState, QueryValue};
use crate::selection::{
    ContextMenuParams, HandleImages, MenuCommand, SelectionEventType, TouchHandleDrawable,
    TouchSelectionCoordinator, is_command_enabled,
};
use crate::touch::{MotionSequencer, SequenceOutcome};
use crate::wheel_coalescer::WheelCoalescer;

/// How the engine disposed of an acknowledged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAckState {
    Consumed,
    NotConsumed,
    NoConsumerExists,
    Ignored,
}

/// Translates native events and coordinates touch, IME and selection state
/// for one view.
#[derive(Debug)]
pub struct InputDispatcher {
    mapper: EventMapper,
    clock: EventClock,
    sequencer: MotionSequencer,
    wheel: WheelCoalescer,
    composition: CompositionStateMachine,
    query: InputMethodQueryState,
    selection: TouchSelectionCoordinator,
    pending_edit_command: Option<EditCommand>,
}

impl InputDispatcher {
    pub fn new(config: InputConfig) -> Self {
        Self {
            mapper: EventMapper::new(config),
            clock: EventClock::new(),
            sequencer: MotionSequencer::new(),
            wheel: WheelCoalescer::new(),
            composition: CompositionStateMachine::new(),
            query: InputMethodQueryState::new(),
            selection: TouchSelectionCoordinator::new(),
            pending_edit_command: None,
        }
    }

    /// Like [`new`](Self::new), but rejects an out-of-range configuration.
    pub fn try_new(config: InputConfig) -> InputResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Build a dispatcher from a TOML configuration file.
    pub fn from_config_file(path: impl AsRef<Path>) -> InputResult<Self> {
        Ok(Self::new(InputConfig::load(path)?))
    }

    pub fn config(&self) -> &InputConfig {
        self.mapper.config()
    }

    pub fn mapper(&self) -> &EventMapper {
        &self.mapper
    }

    pub fn sequencer(&self) -> &MotionSequencer {
        &self.sequencer
    }

    pub fn wheel_coalescer(&self) -> &WheelCoalescer {
        &self.wheel
    }

    pub fn composition(&self) -> &CompositionStateMachine {
        &self.composition
    }

    pub fn query_state(&self) -> &InputMethodQueryState {
        &self.query
    }

    pub fn selection(&self) -> &TouchSelectionCoordinator {
        &self.selection
    }

    pub fn pending_edit_command(&self) -> Option<EditCommand> {
        self.pending_edit_command
    }

    fn platform(&self) -> Platform {
        self.mapper.config().platform()
    }

    /// Dispatch any native event.
    ///
    /// Returns whether the event was accepted. Only a shortcut override can
    /// be declined; everything else is accepted even when translation drops
    /// it.
    pub fn handle_event(&mut self, ctx: &mut InputContext<'_>, event: &NativeEvent) -> InputResult<bool> {
        match event {
            NativeEvent::Pointer(pointer) => self.handle_pointer(ctx, pointer),
            NativeEvent::Key(key) => self.handle_key(ctx, key),
            NativeEvent::ShortcutOverride(key) => return Ok(self.handle_shortcut_override(ctx, key)),
            NativeEvent::Wheel(wheel) => self.handle_wheel(ctx, wheel),
            NativeEvent::Touch(batch) => self.handle_touch(ctx, batch)?,
            NativeEvent::Gesture(gesture) => self.handle_gesture(ctx, gesture),
            NativeEvent::Hover(hover) => self.handle_hover(ctx, hover),
            NativeEvent::Focus(focus) => self.handle_focus(ctx, focus),
            NativeEvent::InputMethod(im) => self.handle_input_method(ctx, im),
            NativeEvent::Leave => self.handle_leave(ctx),
        }
        Ok(true)
    }

    fn route(ctx: &mut InputContext<'_>, event: CanonicalEvent) {
        tracing::trace!(target: targets::DISPATCH, id = ?event.event_id(), "route canonical event");
        ctx.route(event);
    }

    /// Mouse and tablet input.
    #[tracing::instrument(skip_all, target = "horizon_lattice_webinput::pointer", level = "trace")]
    pub fn handle_pointer(&mut self, ctx: &mut InputContext<'_>, event: &NativePointerEvent) {
        if ctx.target.is_being_adopted() {
            tracing::debug!(target: targets::POINTER, "pointer event during view adoption dropped");
            return;
        }
        let press = matches!(event.kind, PointerEventKind::Press | PointerEventKind::DoubleClick);
        if press {
            ctx.target.focus();
        }

        let timestamp = self.clock.to_instant(event.timestamp_ms);
        let locked = ctx.target.is_mouse_locked();
        let Some(translation) = self.mapper.map_pointer(event, timestamp, locked) else {
            return;
        };
        if let Some(position) = translation.reset_cursor_to {
            ctx.target.set_cursor_position(position);
        }
        if press {
            let platform = self.platform();
            self.composition.commit_for_pointer(platform, ctx.input_method);
        }
        Self::route(ctx, CanonicalEvent::Mouse(translation.event));
    }

    /// Hover move and leave. Hover enter has no engine counterpart.
    pub fn handle_hover(&mut self, ctx: &mut InputContext<'_>, event: &HoverEvent) {
        if event.kind == HoverKind::Leave && self.ignores_leave() {
            return;
        }
        let timestamp = self.clock.to_instant(event.timestamp_ms);
        if let Some(mouse) = self.mapper.map_hover(event, timestamp) {
            Self::route(ctx, CanonicalEvent::Mouse(mouse));
        }
    }

    /// The pointer left the view.
    pub fn handle_leave(&mut self, ctx: &mut InputContext<'_>) {
        if self.ignores_leave() {
            return;
        }
        let timestamp = self.clock.to_instant(0);
        let leave = self.mapper.leave_event(timestamp);
        Self::route(ctx, CanonicalEvent::Mouse(leave));
    }

    /// Windows reports a leave when a drag crosses into a child window.
    fn ignores_leave(&self) -> bool {
        let ignored = self.platform() == Platform::Windows && self.mapper.held_buttons() != NativeButtons::empty();
        if ignored {
            tracing::trace!(target: targets::POINTER, "leave with held button ignored");
        }
        ignored
    }

    /// Key press and release.
    #[tracing::instrument(skip_all, target = "horizon_lattice_webinput::keyboard", level = "trace")]
    pub fn handle_key(&mut self, ctx: &mut InputContext<'_>, event: &NativeKeyEvent) {
        if event.kind == KeyEventKind::Release
            && event.key == NativeKey::Named(NamedKey::Escape)
            && ctx.target.is_mouse_locked()
        {
            ctx.target.unlock_mouse();
        }

        if self.composition.on_key_event(event, ctx.ime) == KeyDisposition::Consumed {
            return;
        }

        // Repeats produce key-downs only and one final key-up.
        if event.kind == KeyEventKind::Release && event.auto_repeat {
            return;
        }

        if !ctx.target.has_focused_widget() {
            tracing::debug!(target: targets::KEYBOARD, "no focused widget, key event dropped");
            return;
        }

        let command = match event.kind {
            KeyEventKind::Press => self.pending_edit_command.take(),
            KeyEventKind::Release => None,
        };
        let timestamp = self.clock.to_instant(event.timestamp_ms);
        for key in self.mapper.keyboard_events(event, timestamp, command) {
            Self::route(ctx, CanonicalEvent::Keyboard(key));
        }
    }

    /// Decide whether a key press should bypass the host's shortcuts.
    ///
    /// Accepted presses that map to an editor command remember it for the
    /// raw key-down that follows.
    pub fn handle_shortcut_override(&mut self, ctx: &mut InputContext<'_>, event: &NativeKeyEvent) -> bool {
        let platform = self.platform();
        let modifiers = self.mapper.modifiers(event.modifiers, NativeButtons::empty());
        let command = edit_command::for_key(platform, event.key, modifiers);

        // macOS lets clipboard shortcuts through outside editable fields so
        // the page can act on its selection.
        let out_of_field = platform == Platform::MacOs
            && command.is_some_and(EditCommand::is_clipboard_or_select_all);
        if !self.query.accepts_text(ctx.text_input) && !out_of_field {
            return false;
        }

        match command {
            Some(command) => {
                tracing::debug!(target: targets::KEYBOARD, command = command.name(), "shortcut overridden");
                self.pending_edit_command = Some(command);
                true
            }
            None => false,
        }
    }

    pub fn handle_wheel(&mut self, ctx: &mut InputContext<'_>, event: &NativeWheelEvent) {
        let timestamp = self.clock.to_instant(event.timestamp_ms);
        let wheel = self.mapper.map_wheel(event, timestamp);
        let target = ctx.target.focused_input_target();
        self.wheel.handle_wheel(target, wheel, ctx.router);
    }

    /// One touch batch.
    ///
    /// Fails only when the batch would exceed the touch point limit.
    pub fn handle_touch(&mut self, ctx: &mut InputContext<'_>, batch: &TouchBatch) -> InputResult<()> {
        let _span = tracing::trace_span!(
            target: targets::TOUCH,
            span_names::TOUCH_BATCH,
            kind = ?batch.kind,
            points = batch.points.len()
        )
        .entered();

        // macOS delivers trackpad contact as touch; native gestures cover it.
        if self.platform() == Platform::MacOs && batch.spontaneous {
            tracing::trace!(target: targets::TOUCH, "spontaneous touch ignored");
            return Ok(());
        }

        if batch.kind == TouchBatchKind::Begin {
            ctx.target.focus();
            let platform = self.platform();
            self.composition.commit_for_pointer(platform, ctx.input_method);
        }

        let timestamp = self.clock.to_instant(batch.timestamp_ms);
        let modifiers = self.mapper.modifiers(batch.modifiers, NativeButtons::empty());
        let selection = &mut *ctx.selection;
        let outcome = self
            .sequencer
            .sequence(batch, timestamp, modifiers, |probe| selection.will_handle_touch_event(probe))?;

        let SequenceOutcome::Motion(events) = outcome else {
            return Ok(());
        };
        match batch.kind {
            TouchBatchKind::Begin => self.selection.on_touch_down(ctx.selection, ctx.menu),
            TouchBatchKind::End | TouchBatchKind::Cancel => {
                self.selection.on_touch_up(ctx.selection, ctx.menu)
            }
            TouchBatchKind::Update => {}
        }
        for event in events {
            Self::route(ctx, CanonicalEvent::Motion(event));
        }
        Ok(())
    }

    /// Touchpad gestures from the host toolkit.
    pub fn handle_gesture(&mut self, ctx: &mut InputContext<'_>, event: &NativeGestureEvent) {
        let timestamp = self.clock.to_instant(event.timestamp_ms);
        if let Some(gesture) = self.mapper.map_gesture(event, timestamp) {
            Self::route(ctx, CanonicalEvent::Gesture(gesture));
        }
    }

    pub fn handle_focus(&mut self, ctx: &mut InputContext<'_>, event: &FocusEvent) {
        // Popups opening or closing must not disturb page focus.
        if event.reason == FocusReason::Popup {
            return;
        }

        if event.gained {
            ctx.target.got_focus();
            ctx.target.set_active(true);
            match event.reason {
                FocusReason::Tab => ctx.target.set_initial_focus(false),
                FocusReason::Backtab => ctx.target.set_initial_focus(true),
                _ => {}
            }
            ctx.target.handle_pending_mouse_lock_permission();
        } else {
            self.composition.cancel(ctx.ime);
            ctx.target.set_active(false);
            ctx.target.lost_focus();
        }
        tracing::debug!(target: targets::DISPATCH, gained = event.gained, reason = ?event.reason, "focus changed");
    }

    /// IME composition update.
    pub fn handle_input_method(&mut self, ctx: &mut InputContext<'_>, event: &InputMethodEvent) {
        let _span = tracing::trace_span!(target: targets::IME, span_names::INPUT_METHOD).entered();
        self.query.reset_flags();
        self.composition
            .handle_event(event, &self.query, ctx.ime, ctx.input_method);
    }

    /// Answer an input method query.
    pub fn input_method_query(&self, ctx: &InputContext<'_>, query: InputMethodQuery) -> QueryValue {
        self.query.query(query, ctx.text_input)
    }

    /// The engine's text input state changed.
    pub fn on_text_input_state_updated(&mut self, ctx: &mut InputContext<'_>) {
        self.query
            .on_text_input_state_updated(ctx.text_input, ctx.input_method);
    }

    pub fn on_selection_bounds_changed(&mut self, ctx: &mut InputContext<'_>) {
        self.query
            .on_selection_bounds_changed(ctx.text_input, ctx.input_method);
    }

    pub fn on_text_selection_changed(&mut self, ctx: &mut InputContext<'_>) {
        self.query
            .on_text_selection_changed(ctx.text_input, ctx.input_method);
    }

    /// The engine acknowledged a routed event.
    pub fn on_input_ack(&mut self, ctx: &mut InputContext<'_>, event_id: EventId, state: InputAckState) {
        if self.wheel.on_ack(event_id, ctx.router) {
            tracing::trace!(target: targets::DISPATCH, id = event_id.get(), ?state, "wheel ack");
            return;
        }
        if self.sequencer.acknowledge(event_id) {
            tracing::trace!(target: targets::DISPATCH, id = event_id.get(), ?state, "motion ack");
            return;
        }
        tracing::warn!(target: targets::DISPATCH, id = event_id.get(), ?state, "ack for unknown event");
    }

    /// A gesture the engine recognized from touch input, before it is
    /// applied to the page.
    pub fn on_engine_gesture(&mut self, ctx: &mut InputContext<'_>, gesture: GestureEvent) {
        if gesture.kind.is_pinch() && !self.mapper.config().pinch_to_zoom() {
            return;
        }

        match gesture.kind {
            GestureKind::LongPress => ctx.selection.handle_long_press(gesture.position),
            GestureKind::Tap { tap_count } => ctx.selection.handle_tap(gesture.position, tap_count),
            GestureKind::ScrollBegin => self.selection.on_scroll_begin(ctx.selection, ctx.menu),
            GestureKind::ScrollEnd => self.selection.on_scroll_end(ctx.selection, ctx.menu),
            _ => {}
        }
        Self::route(ctx, CanonicalEvent::Gesture(gesture));
    }

    /// A fling the engine was running came to rest.
    pub fn did_stop_flinging(&mut self, ctx: &mut InputContext<'_>) {
        self.selection.did_stop_flinging(ctx.selection, ctx.menu);
    }

    pub fn on_selection_event(&mut self, ctx: &mut InputContext<'_>, event: SelectionEventType) {
        self.selection.on_selection_event(event, ctx.selection, ctx.menu);
    }

    /// Returns `true` if the touch menu took over the context menu request.
    pub fn handle_context_menu(&mut self, ctx: &mut InputContext<'_>, params: &ContextMenuParams) -> bool {
        self.selection.handle_context_menu(params, ctx.selection, ctx.menu)
    }

    pub fn is_menu_command_enabled(&self, ctx: &InputContext<'_>, command: MenuCommand) -> bool {
        is_command_enabled(
            command,
            ctx.text_input.text_input_type(),
            !ctx.text_input.selected_text().is_empty(),
            ctx.menu.clipboard_has_text(),
        )
    }

    pub fn execute_menu_command(&mut self, ctx: &mut InputContext<'_>, command: MenuCommand) {
        self.selection.execute_command(command, ctx.selection, ctx.editor);
    }

    pub fn run_context_menu(&mut self, ctx: &mut InputContext<'_>) {
        self.selection.run_context_menu(ctx.selection, ctx.editor);
    }

    /// Create a selection handle visual for the engine.
    pub fn create_touch_handle(
        &self,
        factory: &mut dyn HandleDrawableFactory,
        images: HandleImages,
    ) -> TouchHandleDrawable {
        self.selection.create_drawable(factory, images)
    }

    /// Forget all per-view state, e.g. when the view is reattached.
    pub fn reset(&mut self) {
        self.mapper.reset();
        self.clock.reset();
        self.sequencer.reset();
        self.wheel.reset();
        self.composition = CompositionStateMachine::new();
        self.query.reset();
        self.selection.reset();
        self.pending_edit_command = None;
    }
}

impl Default for InputDispatcher {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

static_assertions::assert_impl_all!(InputDispatcher: Send, Sync);
