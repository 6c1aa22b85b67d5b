//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (HEARTH_*)
//! 2. TOML config file (if HEARTH_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// What to do when a precache asset cannot be fetched during install.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InstallPolicy {
    /// Any failure aborts the install and nothing is cached.
    #[default]
    Strict,
    /// Failures are logged and skipped; the install still completes.
    Lenient,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (HEARTH_*)
/// 2. TOML config file (if HEARTH_CONFIG_FILE set)
/// 3. Built-in defaults
///
/// List-valued fields take figment's array syntax in the environment,
/// e.g. `HEARTH_RUNTIME_CACHE='["/about","/blog"]'`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database holding cache stores and the submission queue.
    ///
    /// Set via HEARTH_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin of the site the worker serves; manifest paths resolve against it.
    ///
    /// Set via HEARTH_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Version tag naming the current cache store. Bump on deploy.
    ///
    /// Set via HEARTH_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Assets fetched and stored on install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Pages warmed best-effort after a successful install.
    #[serde(default = "default_runtime_cache")]
    pub runtime_cache: Vec<String>,

    /// Requests whose path contains this prefix are never intercepted.
    ///
    /// Set via HEARTH_ADMIN_PREFIX environment variable.
    #[serde(default = "default_admin_prefix")]
    pub admin_prefix: String,

    /// File extensions (without the dot) served cache-first.
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,

    /// Page served to navigations when both network and cache fail.
    ///
    /// Set via HEARTH_OFFLINE_PAGE environment variable.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Precache failure handling.
    ///
    /// Set via HEARTH_INSTALL_POLICY environment variable (`strict` or `lenient`).
    #[serde(default)]
    pub install_policy: InstallPolicy,

    /// Background sync tag that triggers submission replay.
    ///
    /// Set via HEARTH_SYNC_TAG environment variable.
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,

    /// User-Agent string for network requests.
    ///
    /// Set via HEARTH_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Bound on every network attempt, in milliseconds.
    ///
    /// Set via HEARTH_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum response body size in bytes.
    ///
    /// Set via HEARTH_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./hearth-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_cache_version() -> String {
    "hearth-v1".into()
}

fn default_precache() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/manifest.json",
        "/favicon.ico",
        "/logo192.png",
        "/logo512.png",
        "/static/js/bundle.js",
        "/static/css/main.css",
        "/offline.html",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_runtime_cache() -> Vec<String> {
    ["/about", "/portfolio", "/testimonials", "/blog", "/contact"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_admin_prefix() -> String {
    "/admin".into()
}

fn default_static_extensions() -> Vec<String> {
    ["js", "css", "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "woff", "woff2", "ttf", "eot"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_sync_tag() -> String {
    "form-submission".into()
}

fn default_user_agent() -> String {
    "hearth-sw/0.1".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_version: default_cache_version(),
            precache: default_precache(),
            runtime_cache: default_runtime_cache(),
            admin_prefix: default_admin_prefix(),
            static_extensions: default_static_extensions(),
            offline_page: default_offline_page(),
            install_policy: InstallPolicy::Strict,
            sync_tag: default_sync_tag(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `HEARTH_`
    /// 2. TOML file from `HEARTH_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("HEARTH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("HEARTH_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
