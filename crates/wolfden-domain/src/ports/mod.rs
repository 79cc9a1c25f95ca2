//! Domain port interfaces
//!
//! Boundary contracts between the service layer and the layers around
//! it, following the dependency inversion rule: the domain defines the
//! interfaces, infrastructure and the backend adapter implement them.
//!
//! - [`BackendClient`] - the remote relational + identity backend
//! - [`CacheStore`] - cache backends (in-memory, null)
//! - [`MonitorSink`] - external error monitoring

/// Backend collaborator port
pub mod backend;
/// Cache store port
pub mod cache;
/// Monitoring sink port
pub mod monitor;

pub use backend::BackendClient;
pub use cache::{CacheStats, CacheStore};
pub use monitor::MonitorSink;
