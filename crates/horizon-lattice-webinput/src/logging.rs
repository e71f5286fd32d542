//! Logging facilities for the web input layer.
//!
//! The crate logs through `tracing` and never installs a subscriber. To see
//! the output, install one in the host application and filter on the
//! targets below:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_lattice_webinput::touch=trace")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Crate-wide target.
    pub const WEBINPUT: &str = "horizon_lattice_webinput";
    /// Touch id allocation and motion sequencing.
    pub const TOUCH: &str = "horizon_lattice_webinput::touch";
    /// Pointer, tablet and hover translation.
    pub const POINTER: &str = "horizon_lattice_webinput::pointer";
    /// Keyboard translation and shortcut overrides.
    pub const KEYBOARD: &str = "horizon_lattice_webinput::keyboard";
    /// Wheel translation and coalescing.
    pub const WHEEL: &str = "horizon_lattice_webinput::wheel";
    /// IME composition and input-method queries.
    pub const IME: &str = "horizon_lattice_webinput::ime";
    /// Touch selection handles and menus.
    pub const SELECTION: &str = "horizon_lattice_webinput::selection";
    /// Routing of canonical events to the engine.
    pub const DISPATCH: &str = "horizon_lattice_webinput::dispatch";
}

/// Span names used by instrumented entry points.
pub mod span_names {
    /// Touch batch handling span.
    pub const TOUCH_BATCH: &str = "horizon_lattice_webinput::touch_batch";
    /// Input method event handling span.
    pub const INPUT_METHOD: &str = "horizon_lattice_webinput::input_method";
}

#[cfg(test)]
mod tests {
    use super::targets;

    #[test]
    fn test_targets_are_namespaced() {
        for target in [
            targets::TOUCH,
            targets::POINTER,
            targets::KEYBOARD,
            targets::WHEEL,
            targets::IME,
            targets::SELECTION,
            targets::DISPATCH,
        ] {
            assert!(target.starts_with(targets::WEBINPUT));
        }
    }
}
