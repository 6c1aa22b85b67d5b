//! Policy passed into the worker at construction.

use std::time::Duration;

use hearth_core::{AppConfig, Error, InstallPolicy};
use url::Url;

use crate::fetch::{canonicalize, resolve};

/// Everything the worker needs to decide how to treat a request.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name of the current cache store.
    pub cache_version: String,
    /// Site origin; manifest paths resolve against it.
    pub origin: Url,
    pub precache: Vec<String>,
    pub runtime_cache: Vec<String>,
    pub admin_prefix: String,
    pub static_extensions: Vec<String>,
    pub offline_page: String,
    pub install_policy: InstallPolicy,
    pub sync_tag: String,
    /// Upper bound on each network attempt.
    pub network_timeout: Duration,
}

impl WorkerConfig {
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = canonicalize(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;

        Ok(Self {
            cache_version: config.cache_version.clone(),
            origin,
            precache: config.precache.clone(),
            runtime_cache: config.runtime_cache.clone(),
            admin_prefix: config.admin_prefix.clone(),
            static_extensions: config.static_extensions.clone(),
            offline_page: config.offline_page.clone(),
            install_policy: config.install_policy,
            sync_tag: config.sync_tag.clone(),
            network_timeout: config.timeout(),
        })
    }

    /// Resolve a manifest path against the origin.
    pub fn resolve(&self, path: &str) -> Result<Url, Error> {
        resolve(&self.origin, path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
    }

    /// Absolute URL of the offline fallback page.
    pub fn offline_url(&self) -> Result<Url, Error> {
        self.resolve(&self.offline_page)
    }
}
