//! Crate-wide error taxonomy.
//!
//! Only the *recoverable* half of the error taxonomy in the design (SAT backend
//! exhaustion, malformed construction arguments caught before they would otherwise
//! reach an internal contract-violation panic) is represented as a value. Contract
//! violations and invariant breaches remain `panic!`s, matching the source's
//! fail-fast policy: they indicate a caller bug, not a condition to recover from.

use thiserror::Error;

/// Recoverable errors surfaced at the boundary of the core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The SAT backend ran out of budget (timeout, memory) mid-solve.
    #[error("SAT backend exhausted: {0}")]
    Backend(String),

    /// A capability (e.g. conflict extraction, interpolation) was requested
    /// from a backend that does not implement it, but the caller checked the
    /// capability in advance and wants an `Err` rather than a panic.
    #[error("backend does not support: {0}")]
    UnsupportedCapability(&'static str),

    /// Construction-time argument was malformed in a way that is cheaper to
    /// reject with a message than to panic on (e.g. an empty justice list
    /// where the caller expected validation).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
