//! Install and activate events.

use hearth_core::{Error, InstallPolicy};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{Worker, WorkerState};
use crate::fetch::Fetcher;
use crate::http::{Request, Response};

/// Precache asset that was skipped under the lenient policy.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SkippedAsset {
    pub path: String,
    pub error: String,
}

/// Outcome of a successful install event.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub version: String,
    /// Precached URLs, in manifest order.
    pub cached: Vec<String>,
    pub skipped: Vec<SkippedAsset>,
    /// Runtime pages warmed after the precache.
    pub warmed: Vec<String>,
}

/// Outcome of an activate event.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivationReport {
    pub version: String,
    /// Stale stores removed.
    pub deleted: Vec<String>,
    /// Stale stores that could not be removed; retried on the next activation.
    pub failed: Vec<String>,
    pub clients_claimed: bool,
}

impl<F: Fetcher> Worker<F> {
    /// Dispatch the install event: populate the current store from the
    /// precache manifest, then warm the runtime pages.
    ///
    /// Under [`InstallPolicy::Strict`] any failed asset aborts the install,
    /// nothing is stored and the worker becomes `Redundant`.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.transition(&[WorkerState::Idle, WorkerState::Redundant], WorkerState::Installing, "install")
            .await?;

        let version = self.config.cache_version.clone();
        tracing::info!(%version, assets = self.config.precache.len(), "installing worker");

        let (cached, skipped) = match self.precache().await {
            Ok(result) => result,
            Err(err) => {
                self.lifecycle.write().await.state = WorkerState::Redundant;
                tracing::error!(%version, error = %err, "install failed; worker is redundant");
                return Err(err);
            }
        };

        {
            let mut lifecycle = self.lifecycle.write().await;
            lifecycle.state = WorkerState::Installed;
            lifecycle.skip_waiting = true;
        }
        tracing::info!(%version, cached = cached.len(), skipped = skipped.len(), "installed; skipping wait");

        let warmed = self.warm_runtime_cache().await;

        Ok(InstallReport { version, cached, skipped, warmed })
    }

    /// Dispatch the activate event: drop every store but the current one,
    /// then claim open pages.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        self.transition(&[WorkerState::Installed], WorkerState::Activating, "activate")
            .await?;

        let version = self.config.cache_version.clone();
        let stores = match self.db.list_stores().await {
            Ok(stores) => stores,
            Err(err) => {
                tracing::warn!(error = %err, "could not enumerate cache stores; skipping cleanup");
                Vec::new()
            }
        };

        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        for name in stores.into_iter().filter(|name| *name != version) {
            match self.db.delete_store(&name).await {
                Ok(true) => {
                    tracing::info!(store = %name, "deleted stale cache store");
                    deleted.push(name);
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(store = %name, error = %err, "failed to delete stale cache store");
                    failed.push(name);
                }
            }
        }

        {
            let mut lifecycle = self.lifecycle.write().await;
            lifecycle.clients_claimed = true;
            lifecycle.state = WorkerState::Active;
        }
        tracing::info!(%version, deleted = deleted.len(), "worker active; clients claimed");

        Ok(ActivationReport { version, deleted, failed, clients_claimed: true })
    }

    async fn precache(&self) -> Result<(Vec<String>, Vec<SkippedAsset>), Error> {
        let mut fetched = Vec::with_capacity(self.config.precache.len());
        let mut skipped = Vec::new();

        for path in &self.config.precache {
            match self.fetch_asset(path).await {
                Ok((url, response)) => fetched.push((url.to_string(), response.to_cached())),
                Err(err) => match self.config.install_policy {
                    InstallPolicy::Strict => return Err(Error::InstallFailed(format!("{path}: {err}"))),
                    InstallPolicy::Lenient => {
                        tracing::warn!(%path, error = %err, "skipping precache asset");
                        skipped.push(SkippedAsset { path: path.clone(), error: err.to_string() });
                    }
                },
            }
        }

        let cached: Vec<String> = fetched.iter().map(|(url, _)| url.clone()).collect();
        let version = &self.config.cache_version;

        self.db
            .open_store(version)
            .await
            .map_err(|e| Error::InstallFailed(format!("opening {version}: {e}")))?;
        self.db
            .put_entries(version, fetched)
            .await
            .map_err(|e| Error::InstallFailed(format!("storing precache: {e}")))?;

        Ok((cached, skipped))
    }

    async fn warm_runtime_cache(&self) -> Vec<String> {
        let mut warmed = Vec::new();
        for path in &self.config.runtime_cache {
            let (url, response) = match self.fetch_asset(path).await {
                Ok(fetched) => fetched,
                Err(err) => {
                    tracing::debug!(%path, error = %err, "runtime cache warm-up skipped");
                    continue;
                }
            };
            match self
                .db
                .put_entry(&self.config.cache_version, "GET", url.as_str(), &response.to_cached())
                .await
            {
                Ok(()) => warmed.push(url.to_string()),
                Err(err) => tracing::warn!(%url, error = %err, "failed to store warmed page"),
            }
        }
        warmed
    }

    /// GET a manifest path; anything but a 2xx is an error.
    async fn fetch_asset(&self, path: &str) -> Result<(Url, Response), Error> {
        let url = self.config.resolve(path)?;
        let response = self.fetch_network(&Request::get(url.clone())).await?;
        if !response.is_success() {
            return Err(Error::HttpError(format!("status {}", response.status.as_u16())));
        }
        Ok((url, response))
    }
}
