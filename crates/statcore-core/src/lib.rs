//! Shared primitives for the statcore workspace: the error taxonomy (§7 of the
//! design spec), the telemetry boundary the host process implements, and a
//! `Clock` trait so time-dependent code can be tested deterministically.

pub mod clock;
pub mod environment;
pub mod error;
pub mod telemetry;

pub use clock::{Clock, SystemClock};
pub use environment::Environment;
pub use error::CoreError;
pub use telemetry::{ErrorReporter, NoopReporter, TracingReporter};
