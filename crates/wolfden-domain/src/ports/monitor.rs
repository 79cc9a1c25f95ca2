//! Monitoring sink port
//!
//! Every reported error is forwarded to this sink when forwarding is
//! enabled. Forwarding is fire-and-forget: failures are logged by the
//! reporter and never propagate, so error reporting can never itself
//! become a source of failure.

use crate::error::{AppError, BackendError};
use async_trait::async_trait;

/// External error monitoring service
#[async_trait]
pub trait MonitorSink: Send + Sync {
    /// Deliver one error to the monitoring service
    async fn report(&self, error: &AppError) -> Result<(), BackendError>;
}
