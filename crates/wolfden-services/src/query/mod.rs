//! Cached, retried query execution
//!
//! [`QueryExecutor`] is the generic execution engine (cache check,
//! single-flight coalescing, timeout race, retry with exponential
//! backoff); [`DomainQueries`] are the thin domain wrappers with fixed
//! cache-key templates and volatility-tuned TTLs.

mod executor;
mod wrappers;

pub use executor::QueryExecutor;
pub use wrappers::DomainQueries;
