//! Authentication lifecycle and permission checks

mod manager;

pub use manager::SessionManager;
