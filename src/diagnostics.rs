//! Diagnostics collaborator.
//!
//! The source stashes `yylineno` in a global and prints warnings straight to
//! `stderr` from deep inside the predicate extractor and the FSM constructor.
//! Here, warnings are routed through the `log` facade instead: callers that
//! care can install any `log` backend (`env_logger` in tests), and the core
//! itself never touches a file descriptor directly.
//!
//! `Diagnostics` is a zero-sized collaborator passed by reference so call
//! sites read like `diag.warn(...)` rather than a bare free function, which
//! keeps the door open for a future host that wants to intercept warnings
//! without reconfiguring global logging state.

/// Emits the semantic warnings described in the error-handling design
/// (empty init, empty invariant, empty fairness, deadlock found, totality
/// failure, unsupported symbol type, ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct Diagnostics;

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics
    }

    /// Record a non-fatal semantic warning.
    pub fn warn(&self, message: impl AsRef<str>) {
        log::warn!(target: "symbolic_verify_core", "{}", message.as_ref());
    }

    /// Record progress information for a long-running fixpoint computation.
    pub fn progress(&self, message: impl AsRef<str>) {
        log::debug!(target: "symbolic_verify_core::progress", "{}", message.as_ref());
    }

    pub fn trace(&self, message: impl AsRef<str>) {
        log::trace!(target: "symbolic_verify_core::trace", "{}", message.as_ref());
    }
}
