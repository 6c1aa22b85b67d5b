//! Cache-first and network-first fetch strategies.
//!
//! Cache reads and writes never fail a request: a read error counts as a
//! miss and a write error only loses the copy.

use super::{ResponseSource, Worker};
use crate::fetch::Fetcher;
use crate::http::{Request, Response};

impl<F: Fetcher> Worker<F> {
    /// Serve from the current store; go to the network only on a miss.
    pub(crate) async fn cache_first(&self, request: &Request) -> (Response, ResponseSource) {
        if let Some(cached) = self.lookup(request).await {
            tracing::debug!(url = %request.url, "cache hit");
            return (cached, ResponseSource::Cache);
        }

        match self.fetch_network(request).await {
            Ok(response) => {
                self.store(request, &response).await;
                (response, ResponseSource::Network)
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "cache miss and network failed");
                self.fallback(request).await
            }
        }
    }

    /// Try the network; fall back to the store only when the network fails.
    pub(crate) async fn network_first(&self, request: &Request) -> (Response, ResponseSource) {
        match self.fetch_network(request).await {
            Ok(response) => {
                self.store(request, &response).await;
                (response, ResponseSource::Network)
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "network failed; trying cache");
                match self.lookup(request).await {
                    Some(cached) => (cached, ResponseSource::Cache),
                    None => self.fallback(request).await,
                }
            }
        }
    }

    /// Offline page for navigations, synthetic 503 for everything else.
    pub(crate) async fn fallback(&self, request: &Request) -> (Response, ResponseSource) {
        if request.accepts_html() {
            match self.config.offline_url() {
                Ok(url) => {
                    if let Some(page) = self.lookup(&Request::get(url)).await {
                        tracing::info!(url = %request.url, "serving offline page");
                        return (page, ResponseSource::OfflinePage);
                    }
                    tracing::warn!(offline_page = %self.config.offline_page, "offline page is not cached");
                }
                Err(err) => tracing::warn!(error = %err, "offline page url is invalid"),
            }
        }

        tracing::info!(url = %request.url, "network and cache exhausted; serving 503");
        (Response::unavailable(), ResponseSource::Unavailable)
    }

    async fn lookup(&self, request: &Request) -> Option<Response> {
        let entry = match self
            .db
            .match_entry(&self.config.cache_version, request.method.as_str(), request.url.as_str())
            .await
        {
            Ok(entry) => entry?,
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "cache lookup failed; treating as miss");
                return None;
            }
        };

        match Response::from_cached(entry.response) {
            Ok(response) => Some(response),
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "unreadable cache entry; treating as miss");
                None
            }
        }
    }

    /// Store a copy of a successful response. Failures are never cached.
    async fn store(&self, request: &Request, response: &Response) {
        if !response.is_success() {
            tracing::debug!(url = %request.url, status = response.status.as_u16(), "not caching unsuccessful response");
            return;
        }

        let copy = response.to_cached();
        if let Err(err) = self
            .db
            .put_entry(&self.config.cache_version, request.method.as_str(), request.url.as_str(), &copy)
            .await
        {
            tracing::warn!(url = %request.url, error = %err, "failed to cache response");
        }
    }
}
