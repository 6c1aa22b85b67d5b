//! cache_purge tool implementation.
//!
//! Deletes a named cache store together with its entries.

use hearth_core::{CacheDb, Error};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Name of the store to delete.
    pub store: String,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    pub store: String,
    /// Whether a store was deleted.
    pub deleted: bool,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(cache: &CacheDb, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let store = params.store.trim().to_string();
    if store.is_empty() {
        return Err(Error::InvalidInput("store name must not be empty".to_string()).into());
    }

    let deleted = cache.delete_store(&store).await?;
    if deleted {
        tracing::info!(%store, "purged cache store");
    }

    json_result(&CachePurgeOutput { store, deleted })
}
