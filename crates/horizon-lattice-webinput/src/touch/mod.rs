//! Touch input sequencing.
//!
//! Native touch batches arrive with toolkit point ids and per-point states.
//! [`TouchIdMapper`] binds each point to a small stable id and
//! [`MotionSequencer`] turns each batch into the ordered run of motion
//! actions the engine's gesture detector expects.
//!
//! # Usage
//!
//! ```ignore
//! use horizon_lattice_webinput::touch::{MotionSequencer, SequenceOutcome};
//!
//! let mut sequencer = MotionSequencer::new();
//! match sequencer.sequence(&batch, timestamp, modifiers, |probe| selection.will_handle_touch_event(probe))? {
//!     SequenceOutcome::Motion(events) => {
//!         for event in events {
//!             router.route(CanonicalEvent::Motion(event));
//!         }
//!     }
//!     SequenceOutcome::Consumed | SequenceOutcome::Ignored => {}
//! }
//! ```

mod id_mapper;
mod sequencer;

pub use id_mapper::{MAX_TOUCH_POINTS, StableTouchId, TouchIdMapper};
pub use sequencer::{MotionSequencer, SequenceOutcome};
