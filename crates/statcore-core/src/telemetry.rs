//! Telemetry boundary (§6, §7).
//!
//! This core never ships events anywhere itself — it only defines
//! [`ErrorReporter`], the trait the host process implements to forward
//! `Internal`/`InvalidInput`/`InvalidApiKey` errors to whatever collector it
//! likes (Sentry, a log aggregator, a metrics sink). The crate ships two
//! reference implementations: [`TracingReporter`] for real deployments and
//! [`NoopReporter`] for tests that don't care.

use crate::error::CoreError;
use std::sync::Arc;

/// A single `(key, value)` attribute attached to a reported error, e.g.
/// `("uuid", "1234...")` or `("interval_days", "14")`.
pub type Attribute = (&'static str, String);

/// Implemented by the host process to receive errors this core decides are
/// worth reporting (see [`CoreError::should_report`]).
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &CoreError, attributes: &[Attribute]);
}

pub type BoxedReporter = Arc<dyn ErrorReporter>;

/// Reports nothing. Useful in unit tests where telemetry plumbing would only
/// be noise.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ErrorReporter for NoopReporter {
    fn report(&self, _error: &CoreError, _attributes: &[Attribute]) {}
}

/// Logs reported errors via the `tracing` crate at `error!` level, with
/// attributes attached as structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &CoreError, attributes: &[Attribute]) {
        #[cfg(feature = "tracing")]
        {
            let attrs: Vec<String> = attributes
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            tracing::error!(error = %error, attributes = %attrs.join(", "), "statcore error reported");
        }
        #[cfg(not(feature = "tracing"))]
        {
            let _ = (error, attributes);
        }
    }
}

/// Reports `error` if its kind is report-worthy, a no-op otherwise. Call this
/// at every boundary where a `CoreError` is about to propagate out of a
/// public operation.
pub fn report_if_warranted(
    reporter: &dyn ErrorReporter,
    error: &CoreError,
    attributes: &[Attribute],
) {
    if error.should_report() {
        reporter.report(error, attributes);
    }
}
