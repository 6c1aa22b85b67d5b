//! Request classification.
//!
//! Routing is a pure function of request metadata: method, origin and path.
//! The static/dynamic split is a plain suffix match on the path; content
//! types are never inspected.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::Url;

use super::config::WorkerConfig;
use crate::http::Request;

/// Why a request was left to default network handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BypassReason {
    /// Path contains the admin prefix.
    AdminArea,
    /// Only GET requests are cached.
    NonGetMethod,
    /// Request targets another origin.
    CrossOrigin,
}

/// Class of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    StaticAsset,
    Dynamic,
}

/// Fetch strategy applied to an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
}

impl RequestClass {
    pub fn strategy(self) -> Strategy {
        match self {
            RequestClass::StaticAsset => Strategy::CacheFirst,
            RequestClass::Dynamic => Strategy::NetworkFirst,
        }
    }
}

/// Routing decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Bypass(BypassReason),
    Intercept(RequestClass),
}

#[derive(Debug, Clone)]
pub struct Router {
    origin: Url,
    admin_prefix: String,
    suffixes: Vec<String>,
}

impl Router {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            origin: config.origin.clone(),
            admin_prefix: config.admin_prefix.clone(),
            suffixes: config.static_extensions.iter().map(|ext| format!(".{ext}")).collect(),
        }
    }

    pub fn route(&self, request: &Request) -> Route {
        if request.url.path().contains(&self.admin_prefix) {
            return Route::Bypass(BypassReason::AdminArea);
        }
        if request.method != Method::GET {
            return Route::Bypass(BypassReason::NonGetMethod);
        }
        if request.url.origin() != self.origin.origin() {
            return Route::Bypass(BypassReason::CrossOrigin);
        }
        Route::Intercept(self.classify(&request.url))
    }

    pub fn classify(&self, url: &Url) -> RequestClass {
        let path = url.path();
        if self.suffixes.iter().any(|suffix| path.ends_with(suffix.as_str())) {
            RequestClass::StaticAsset
        } else {
            RequestClass::Dynamic
        }
    }
}
