//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an http(s) origin
    /// - `cache_version`, `user_agent` or `sync_tag` is empty
    /// - `admin_prefix` or `offline_page` does not start with `/`
    /// - `static_extensions` is empty or an entry is empty or dotted
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_bytes` is 0 or exceeds 50MB
    ///
    /// Returns `ConfigError::Missing` if `precache` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.origin.starts_with("http://") || self.origin.starts_with("https://")) {
            return Err(invalid("origin", "must be an http:// or https:// origin"));
        }

        if self.cache_version.trim().is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }

        if self.precache.is_empty() {
            return Err(ConfigError::Missing {
                field: "precache".into(),
                hint: "list at least the root document and the offline page".into(),
            });
        }

        if !self.admin_prefix.starts_with('/') {
            return Err(invalid("admin_prefix", "must start with '/'"));
        }

        if !self.offline_page.starts_with('/') {
            return Err(invalid("offline_page", "must start with '/'"));
        }

        if self.static_extensions.is_empty() {
            return Err(invalid("static_extensions", "must not be empty"));
        }
        if self
            .static_extensions
            .iter()
            .any(|ext| ext.is_empty() || ext.contains('.'))
        {
            return Err(invalid("static_extensions", "entries must be non-empty and given without a dot"));
        }

        if self.sync_tag.is_empty() {
            return Err(invalid("sync_tag", "must not be empty"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if !self.precache.iter().any(|path| path == &self.offline_page) {
            tracing::warn!(
                offline_page = %self.offline_page,
                "offline page is not precached; navigations will get the 503 fallback when offline"
            );
        }

        Ok(())
    }
}
