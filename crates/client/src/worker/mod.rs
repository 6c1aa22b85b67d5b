//! The offline cache worker.
//!
//! ### Lifecycle
//! `Idle -> Installing -> Installed -> Activating -> Active`, with
//! `Redundant` when an install fails. Skip-waiting is always requested,
//! so an installed worker can be activated right away.
//!
//! ### Events
//! One dispatch function per event: [`Worker::install`], [`Worker::activate`],
//! [`Worker::fetch`], [`Worker::sync`]. Each runs to completion; the only
//! suspension points are network, cache and queue I/O.
//!
//! ### Fetch handling
//! - Admin, non-GET and cross-origin requests pass through untouched.
//! - Static assets: cache-first. Everything else: network-first.
//! - Both end in a concrete response: cache hit, network response, the
//!   offline page for navigations, or a synthetic 503.

pub mod config;
mod lifecycle;
pub mod router;
mod strategy;
mod sync;

#[cfg(test)]
pub(crate) mod fake;

pub use config::WorkerConfig;
pub use lifecycle::{ActivationReport, InstallReport, SkippedAsset};
pub use router::{BypassReason, RequestClass, Route, Router, Strategy};
pub use sync::{FailedReplay, SyncOutcome, SyncReport};

use std::fmt;

use hearth_core::{CacheDb, Error, NewSubmission, StoreInfo, Submission};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::fetch::Fetcher;
use crate::http::{Request, Response};

/// Lifecycle state of the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Fresh worker, not installed yet.
    #[default]
    Idle,
    Installing,
    /// Installed and waiting to activate.
    Installed,
    Activating,
    /// Controlling pages and intercepting fetches.
    Active,
    /// Install failed; a new install attempt is allowed.
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Idle => "idle",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Active => "active",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// Where a fetch response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
    OfflinePage,
    Unavailable,
}

/// Result of dispatching a fetch event.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The worker did not intercept; the host performs the default fetch.
    Passthrough(Passthrough),
    /// The worker produced the response.
    Responded { response: Response, source: ResponseSource, class: RequestClass },
}

/// Why a fetch was not intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Passthrough {
    /// The worker is not active and controls no page.
    NotControlling,
    Bypassed(BypassReason),
}

/// Snapshot of the worker for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WorkerStatus {
    pub state: WorkerState,
    pub cache_version: String,
    pub skip_waiting: bool,
    pub clients_claimed: bool,
    pub stores: Vec<StoreInfo>,
    pub pending_submissions: u64,
}

#[derive(Debug, Default)]
struct Lifecycle {
    state: WorkerState,
    skip_waiting: bool,
    clients_claimed: bool,
}

/// Cache worker bound to one cache version.
pub struct Worker<F> {
    config: WorkerConfig,
    db: CacheDb,
    fetcher: F,
    router: Router,
    lifecycle: RwLock<Lifecycle>,
    /// Held for a whole queue flush so overlapping sync events never replay twice.
    flush: Mutex<()>,
}

impl<F: Fetcher> Worker<F> {
    pub fn new(config: WorkerConfig, db: CacheDb, fetcher: F) -> Self {
        let router = Router::new(&config);
        Self { config, db, fetcher, router, lifecycle: RwLock::new(Lifecycle::default()), flush: Mutex::new(()) }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub async fn state(&self) -> WorkerState {
        self.lifecycle.read().await.state
    }

    /// Install and activate in one go, as skip-waiting allows.
    pub async fn start(&self) -> Result<(InstallReport, ActivationReport), Error> {
        let installed = self.install().await?;
        let activated = self.activate().await?;
        Ok((installed, activated))
    }

    /// Dispatch a fetch event.
    ///
    /// Never fails: every intercepted request ends in a concrete response.
    pub async fn fetch(&self, request: &Request) -> FetchOutcome {
        let state = self.state().await;
        if state != WorkerState::Active {
            tracing::debug!(url = %request.url, %state, "worker not controlling; passing through");
            return FetchOutcome::Passthrough(Passthrough::NotControlling);
        }

        match self.router.route(request) {
            Route::Bypass(reason) => {
                tracing::debug!(url = %request.url, ?reason, "bypassing worker");
                FetchOutcome::Passthrough(Passthrough::Bypassed(reason))
            }
            Route::Intercept(class) => {
                let (response, source) = match class.strategy() {
                    Strategy::CacheFirst => self.cache_first(request).await,
                    Strategy::NetworkFirst => self.network_first(request).await,
                };
                FetchOutcome::Responded { response, source, class }
            }
        }
    }

    /// Persist a form submission for replay on the next sync.
    ///
    /// Relative URLs are resolved against the site origin.
    pub async fn enqueue(&self, mut submission: NewSubmission) -> Result<Submission, Error> {
        let url = self.config.resolve(&submission.url)?;
        reqwest::Method::from_bytes(submission.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {:?}: {e}", submission.method)))?;
        submission.url = url.to_string();

        let queued = self.db.enqueue_submission(&submission).await?;
        tracing::info!(id = %queued.id, url = %queued.url, "queued form submission for background sync");
        Ok(queued)
    }

    pub async fn status(&self) -> Result<WorkerStatus, Error> {
        let (state, skip_waiting, clients_claimed) = {
            let lifecycle = self.lifecycle.read().await;
            (lifecycle.state, lifecycle.skip_waiting, lifecycle.clients_claimed)
        };

        Ok(WorkerStatus {
            state,
            cache_version: self.config.cache_version.clone(),
            skip_waiting,
            clients_claimed,
            stores: self.db.list_store_info().await?,
            pending_submissions: self.db.submission_count().await?,
        })
    }

    /// One network attempt, bounded by the configured timeout.
    pub(crate) async fn fetch_network(&self, request: &Request) -> Result<Response, Error> {
        match tokio::time::timeout(self.config.network_timeout, self.fetcher.fetch(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::FetchTimeout(format!(
                "{} {} exceeded {}ms",
                request.method,
                request.url,
                self.config.network_timeout.as_millis()
            ))),
        }
    }

    /// Move to `next` if the current state is one of `allowed`.
    async fn transition(&self, allowed: &[WorkerState], next: WorkerState, event: &str) -> Result<(), Error> {
        let mut lifecycle = self.lifecycle.write().await;
        if !allowed.contains(&lifecycle.state) {
            return Err(Error::InvalidState(format!("cannot {event} while {}", lifecycle.state)));
        }
        tracing::debug!(from = %lifecycle.state, to = %next, "worker state change");
        lifecycle.state = next;
        Ok(())
    }

    async fn require_state(&self, required: WorkerState, event: &str) -> Result<(), Error> {
        let state = self.state().await;
        if state != required {
            return Err(Error::InvalidState(format!("cannot {event} while {state}")));
        }
        Ok(())
    }
}
