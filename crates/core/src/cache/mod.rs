//! SQLite-backed cache stores and the deferred submission queue.
//!
//! This module provides persistent storage using SQLite with async access
//! via tokio-rusqlite. It supports:
//!
//! - Named, version-tagged cache stores with cascading deletion
//! - Request-keyed response entries (SHA-256 of method and URL)
//! - An insertion-ordered queue of form submissions awaiting replay
//! - Automatic schema migrations

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod queue;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{CachedEntry, CachedResponse, EntrySummary};
pub use queue::{NewSubmission, Submission};
pub use stores::StoreInfo;
