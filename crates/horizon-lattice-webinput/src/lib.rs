//! Input event translation and touch/IME coordination for embedded web views.
//!
//! This crate sits between a host windowing toolkit and a web engine's render
//! target. It turns the toolkit's native input into the engine's canonical
//! events and keeps the stateful parts of that translation consistent:
//!
//! - **Touch**: stable touch ids and ordered multi-touch motion sequences
//! - **Pointer, keyboard, wheel and gestures**: stateless conversion with
//!   click counting, editor command lookup and wheel unit scaling
//! - **Wheel flow control**: one wheel event in flight per target, with
//!   compatible events coalesced while waiting
//! - **IME composition**: preedit, commit and the ambiguous empty event
//!   some input methods send before a key event
//! - **Touch selection**: when the quick menu shows, and its commands
//!
//! [`InputDispatcher`] ties the pieces together. The engine and host side
//! are reached through the traits in [`collaborators`].
//!
//! # Example
//!
//! ```ignore
//! use horizon_lattice_webinput::{InputConfig, InputContext, InputDispatcher, Platform};
//!
//! let config = InputConfig::new().with_platform(Platform::current());
//! let mut dispatcher = InputDispatcher::new(config);
//!
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
//! dispatcher.handle_event(&mut ctx, &native_event)?;
//! ```

pub mod canonical;
pub mod clock;
pub mod collaborators;
pub mod composition;
pub mod config;
pub mod dispatcher;
pub mod edit_command;
mod error;
pub mod geometry;
pub mod logging;
pub mod mapper;
pub mod native;
pub mod query;
pub mod selection;
pub mod touch;
pub mod wheel_coalescer;
pub mod winit_adapter;

pub use canonical::{
    CanonicalEvent, EventId, EventModifiers, GestureEvent, GestureKind, MotionAction, MotionEvent,
};
pub use collaborators::{
    FrameEditor, HandleDrawableFactory, HostTouchHandle, ImeHost, InputContext, InputMethodHost,
    InputRouter, MenuHost, RenderTarget, SelectionController, TargetHandle, TextInputSource,
    TextInputState, TextInputType,
};
pub use composition::{CompositionPhase, CompositionStateMachine};
pub use config::{InputConfig, Platform};
pub use dispatcher::{InputAckState, InputDispatcher};
pub use edit_command::EditCommand;
pub use error::{ConfigError, InputError, InputResult};
pub use mapper::EventMapper;
pub use native::NativeEvent;
pub use query::{InputMethodQueryState, QueryValue};
pub use selection::{MenuCommand, TouchSelectionCoordinator};
pub use touch::{MotionSequencer, StableTouchId, TouchIdMapper};
pub use wheel_coalescer::WheelCoalescer;

static_assertions::assert_impl_all!(InputConfig: Send, Sync);
static_assertions::assert_impl_all!(EventMapper: Send, Sync);
