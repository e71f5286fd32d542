//! Touch selection menu coordination.
//!
//! The engine's touch selection controller owns the selection handles; this
//! module decides when the host's quick menu (cut/copy/paste) may be shown
//! next to them. The menu is suppressed while a finger is down, while the
//! page scrolls and while a handle is being dragged, and reappears once all
//! three have ended if the engine still wants it.
//!
//! # Usage
//!
//! ```ignore
//! let mut coordinator = TouchSelectionCoordinator::new();
//!
//! coordinator.on_selection_event(SelectionEventType::SelectionHandlesShown, &controller, &mut menu);
//! coordinator.on_touch_down(&controller, &mut menu);   // menu hidden
//! coordinator.on_touch_up(&controller, &mut menu);     // menu shown again
//! ```

use crate::collaborators::{
    FrameEditor, HandleDrawableFactory, HostTouchHandle, MenuHost, SelectionController,
    TextInputType,
};
use crate::geometry::{Point, Rect, Size};
use crate::logging::targets;

/// Flags the menu decision depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchSelectionState {
    pub menu_requested: bool,
    pub touch_down: bool,
    pub scroll_in_progress: bool,
    pub handle_drag_in_progress: bool,
    /// Whether the host currently shows the menu. Not an input to
    /// [`should_show_menu`].
    pub menu_showing: bool,
}

/// Whether the quick menu should be visible for the given state.
pub fn should_show_menu(state: &TouchSelectionState) -> bool {
    state.menu_requested
        && !state.touch_down
        && !state.scroll_in_progress
        && !state.handle_drag_in_progress
}

/// Selection lifecycle notifications from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionEventType {
    SelectionHandlesShown,
    SelectionHandlesMoved,
    SelectionHandlesCleared,
    SelectionHandleDragStarted,
    SelectionHandleDragStopped,
    InsertionHandleShown,
    InsertionHandleMoved,
    InsertionHandleTapped,
    InsertionHandleCleared,
    InsertionHandleDragStarted,
    InsertionHandleDragStopped,
}

/// What triggered a context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuSourceType {
    Mouse,
    Keyboard,
    LongPress,
    LongTap,
    Touch,
    TouchEditMenu,
    Other,
}

impl MenuSourceType {
    pub fn is_long_press(self) -> bool {
        matches!(self, MenuSourceType::LongPress | MenuSourceType::LongTap)
    }

    pub fn is_touch(self) -> bool {
        self.is_long_press() || self == MenuSourceType::Touch
    }
}

/// The part of a context menu request the coordinator looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMenuParams {
    pub source: MenuSourceType,
    pub is_editable: bool,
    pub selection_text: String,
}

/// Commands offered by the quick menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuCommand {
    Cut,
    Copy,
    Paste,
}

/// Whether a quick menu command applies to the focused field.
pub fn is_command_enabled(
    command: MenuCommand,
    input_type: TextInputType,
    has_selection: bool,
    clipboard_has_text: bool,
) -> bool {
    let editable = input_type.is_editable();
    let readable = input_type.is_readable();
    match command {
        MenuCommand::Cut => editable && readable && has_selection,
        MenuCommand::Copy => readable && has_selection,
        MenuCommand::Paste => editable && clipboard_has_text,
    }
}

/// Decides visibility of the touch selection menu.
#[derive(Debug, Default)]
pub struct TouchSelectionCoordinator {
    state: TouchSelectionState,
}

impl TouchSelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TouchSelectionState {
        &self.state
    }

    pub fn is_menu_showing(&self) -> bool {
        self.state.menu_showing
    }

    /// Arbitrate a context menu request.
    ///
    /// Returns `true` if the request was taken over by the touch menu and
    /// the regular context menu must not open.
    pub fn handle_context_menu(
        &mut self,
        params: &ContextMenuParams,
        controller: &mut dyn SelectionController,
        menu: &mut dyn MenuHost,
    ) -> bool {
        if params.source.is_long_press() && params.is_editable && params.selection_text.is_empty() {
            self.state.menu_requested = true;
            self.update_menu(controller, menu);
            return true;
        }

        if params.source.is_touch() && !params.selection_text.is_empty() {
            return true;
        }

        controller.hide_and_disallow_showing_automatically();
        false
    }

    pub fn on_touch_down(&mut self, controller: &dyn SelectionController, menu: &mut dyn MenuHost) {
        self.state.touch_down = true;
        self.update_menu(controller, menu);
    }

    pub fn on_touch_up(&mut self, controller: &dyn SelectionController, menu: &mut dyn MenuHost) {
        self.state.touch_down = false;
        self.update_menu(controller, menu);
    }

    pub fn on_scroll_begin(
        &mut self,
        controller: &mut dyn SelectionController,
        menu: &mut dyn MenuHost,
    ) {
        self.state.scroll_in_progress = true;
        controller.set_temporarily_hidden(true);
        self.update_menu(controller, menu);
    }

    pub fn on_scroll_end(
        &mut self,
        controller: &mut dyn SelectionController,
        menu: &mut dyn MenuHost,
    ) {
        self.state.scroll_in_progress = false;
        controller.set_temporarily_hidden(false);
        self.update_menu(controller, menu);
    }

    /// A fling finished; the scroll it continued is over.
    pub fn did_stop_flinging(
        &mut self,
        controller: &mut dyn SelectionController,
        menu: &mut dyn MenuHost,
    ) {
        self.on_scroll_end(controller, menu);
    }

    pub fn on_selection_event(
        &mut self,
        event: SelectionEventType,
        controller: &dyn SelectionController,
        menu: &mut dyn MenuHost,
    ) {
        use SelectionEventType::*;
        match event {
            SelectionHandlesShown => self.state.menu_requested = true,
            SelectionHandlesCleared | InsertionHandleCleared => self.state.menu_requested = false,
            SelectionHandleDragStarted | InsertionHandleDragStarted => {
                self.state.handle_drag_in_progress = true
            }
            SelectionHandleDragStopped | InsertionHandleDragStopped => {
                self.state.handle_drag_in_progress = false
            }
            InsertionHandleTapped => self.state.menu_requested = !self.state.menu_requested,
            InsertionHandleShown | SelectionHandlesMoved | InsertionHandleMoved => {}
        }
        tracing::trace!(target: targets::SELECTION, ?event, state = ?self.state, "selection event");
        self.update_menu(controller, menu);
    }

    /// Bring the host menu in line with [`should_show_menu`].
    ///
    /// Showing an already shown menu or hiding a hidden one does nothing.
    pub fn update_menu(&mut self, controller: &dyn SelectionController, menu: &mut dyn MenuHost) {
        let show = should_show_menu(&self.state);
        if show == self.state.menu_showing {
            return;
        }

        if show {
            let anchor = controller.rect_between_bounds().enclosing();
            let handle_size = controller
                .start_handle_rect()
                .size
                .max(controller.end_handle_rect().size);
            let handle_size = Size::new(handle_size.width.round(), handle_size.height.round());
            menu.show_touch_selection_menu(anchor, handle_size);
            tracing::debug!(target: targets::SELECTION, ?anchor, "touch selection menu shown");
        } else {
            menu.hide_touch_selection_menu();
            tracing::debug!(target: targets::SELECTION, "touch selection menu hidden");
        }
        self.state.menu_showing = show;
    }

    /// Run a quick menu command. Handles are hidden first.
    pub fn execute_command(
        &mut self,
        command: MenuCommand,
        controller: &mut dyn SelectionController,
        editor: &mut dyn FrameEditor,
    ) {
        controller.hide_and_disallow_showing_automatically();
        match command {
            MenuCommand::Cut => editor.cut(),
            MenuCommand::Copy => editor.copy(),
            MenuCommand::Paste => editor.paste(),
        }
    }

    /// Open the full context menu from the quick menu.
    pub fn run_context_menu(
        &mut self,
        controller: &mut dyn SelectionController,
        editor: &mut dyn FrameEditor,
    ) {
        let bounds = controller.rect_between_bounds();
        let anchor = Point::new(bounds.center().x, bounds.top()).rounded();
        editor.show_context_menu_at(anchor, MenuSourceType::TouchEditMenu);
        // The bounds are empty once handles are hidden.
        controller.hide_and_disallow_showing_automatically();
    }

    pub fn move_caret(&self, to: Point, editor: &mut dyn FrameEditor) {
        editor.move_caret(to.rounded());
    }

    pub fn move_range_selection_extent(&self, extent: Point, editor: &mut dyn FrameEditor) {
        editor.move_range_selection_extent(extent.rounded());
    }

    pub fn select_between_coordinates(
        &self,
        base: Point,
        extent: Point,
        editor: &mut dyn FrameEditor,
    ) {
        editor.select_range(base.rounded(), extent.rounded());
    }

    /// Create a handle visual for the engine's controller.
    pub fn create_drawable(
        &self,
        factory: &mut dyn HandleDrawableFactory,
        images: HandleImages,
    ) -> TouchHandleDrawable {
        let host = factory.create_touch_handle(&images);
        if host.is_none() {
            tracing::debug!(target: targets::SELECTION, "host cannot draw touch handles");
        }
        TouchHandleDrawable::new(host, images)
    }

    /// Forget all state. The host menu is assumed hidden.
    pub fn reset(&mut self) {
        self.state = TouchSelectionState::default();
    }
}

/// Which handle image is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HandleOrientation {
    Left,
    Center,
    Right,
    #[default]
    Undefined,
}

/// Sizes of the host's handle images per orientation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandleImages {
    pub left: Size,
    pub center: Size,
    pub right: Size,
}

impl HandleImages {
    pub fn size_for(&self, orientation: HandleOrientation) -> Size {
        match orientation {
            HandleOrientation::Left => self.left,
            HandleOrientation::Center => self.center,
            HandleOrientation::Right => self.right,
            HandleOrientation::Undefined => Size::ZERO,
        }
    }
}

/// Handle images hang this far below the selection bound.
const HANDLE_VERTICAL_OFFSET: f32 = 2.0;
const HANDLE_PADDING: f32 = 0.0;
const ALPHA_EPSILON: f32 = 1e-8;

/// State of one selection handle, mirrored onto a host drawable.
///
/// Without a host drawable every setter is a no-op.
pub struct TouchHandleDrawable {
    host: Option<Box<dyn HostTouchHandle>>,
    images: HandleImages,
    enabled: bool,
    alpha: f32,
    orientation: HandleOrientation,
    origin: Point,
    relative_bounds: Rect,
}

impl std::fmt::Debug for TouchHandleDrawable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TouchHandleDrawable")
            .field("has_host", &self.host.is_some())
            .field("enabled", &self.enabled)
            .field("alpha", &self.alpha)
            .field("orientation", &self.orientation)
            .field("origin", &self.origin)
            .finish()
    }
}

impl TouchHandleDrawable {
    pub fn new(host: Option<Box<dyn HostTouchHandle>>, images: HandleImages) -> Self {
        Self {
            host,
            images,
            enabled: false,
            alpha: 0.0,
            orientation: HandleOrientation::Undefined,
            origin: Point::ZERO,
            relative_bounds: Rect::ZERO,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        let Some(host) = self.host.as_mut() else {
            return;
        };
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        host.set_visible(enabled);
    }

    pub fn set_orientation(&mut self, orientation: HandleOrientation) {
        let Some(host) = self.host.as_mut() else {
            return;
        };
        if orientation == self.orientation {
            return;
        }
        self.orientation = orientation;
        host.set_image(orientation);

        let image = self.images.size_for(orientation);
        self.relative_bounds = Rect::new(
            -HANDLE_PADDING,
            HANDLE_VERTICAL_OFFSET - HANDLE_PADDING,
            image.width + 2.0 * HANDLE_PADDING,
            image.height + 2.0 * HANDLE_PADDING,
        );
        self.update_bounds();
    }

    pub fn set_origin(&mut self, origin: Point) {
        if self.host.is_none() {
            return;
        }
        self.origin = origin;
        self.update_bounds();
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        if self.host.is_none() || alpha == self.alpha {
            return;
        }
        self.alpha = alpha;
        let visible = self.is_visible();
        if let Some(host) = self.host.as_mut() {
            host.set_opacity(alpha);
            host.set_visible(visible);
        }
    }

    pub fn is_visible(&self) -> bool {
        self.enabled && self.alpha.abs() >= ALPHA_EPSILON
    }

    pub fn orientation(&self) -> HandleOrientation {
        self.orientation
    }

    /// Bounds of the visible handle image in view coordinates.
    pub fn visible_bounds(&self) -> Rect {
        self.relative_bounds
            .offset(self.origin.x, self.origin.y)
            .inset(
                HANDLE_PADDING,
                HANDLE_PADDING + HANDLE_VERTICAL_OFFSET,
                HANDLE_PADDING,
                HANDLE_PADDING,
            )
    }

    pub fn drawable_horizontal_padding_ratio(&self) -> f32 {
        0.0
    }

    fn update_bounds(&mut self) {
        let bounds = self
            .relative_bounds
            .offset(self.origin.x, self.origin.y)
            .enclosing();
        if let Some(host) = self.host.as_mut() {
            host.set_bounds(bounds);
        }
    }
}
