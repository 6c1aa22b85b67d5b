//! Worker event tools.
//!
//! This module dispatches the worker's lifecycle, fetch and sync events.

pub mod fetch;
pub mod lifecycle;
pub mod sync;

pub use fetch::{SwFetchParams, fetch_impl};
pub use lifecycle::{activate_impl, install_impl, status_impl};
pub use sync::{SwSyncParams, sync_impl};
