//! Error classification and reporting
//!
//! [`ErrorReporter`] is the single funnel every internal failure passes
//! through before propagating past the service boundary.

mod reporter;

pub use reporter::{ErrorReporter, ErrorStats};

pub(crate) use reporter::failure_is_retryable;
