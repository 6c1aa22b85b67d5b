//! Core types and shared functionality for hearth.
//!
//! This crate provides:
//! - Version-tagged response cache and form submission queue on SQLite
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CachedEntry, CachedResponse, EntrySummary, NewSubmission, StoreInfo, Submission};
pub use config::{AppConfig, ConfigError, InstallPolicy};
pub use error::Error;
