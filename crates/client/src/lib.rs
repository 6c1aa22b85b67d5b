//! Offline cache worker for the hearth site.
//!
//! This crate provides the worker event loop (install, activate, fetch,
//! sync), request routing and the network seam shared by the server.

pub mod fetch;
pub mod http;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, Fetcher};
pub use http::{Request, Response, UNAVAILABLE_BODY};
pub use worker::{
    ActivationReport, BypassReason, FetchOutcome, InstallReport, Passthrough, RequestClass, ResponseSource,
    SyncOutcome, SyncReport, Worker, WorkerConfig, WorkerState, WorkerStatus,
};
