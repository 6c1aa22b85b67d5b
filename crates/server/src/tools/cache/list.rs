//! cache_list tool implementation.
//!
//! Lists cache stores, or the entries of one store.

use hearth_core::{CacheDb, EntrySummary, Error, StoreInfo};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// Store to list entries of. Omit to list all stores.
    #[serde(default)]
    pub store: Option<String>,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CacheListOutput {
    Entries { store: String, entries: Vec<EntrySummary> },
    Stores { stores: Vec<StoreInfo> },
}

/// Implementation of the cache_list tool.
pub async fn list_impl(cache: &CacheDb, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let output = match params.store {
        Some(store) => {
            if !cache.has_store(&store).await? {
                return Err(Error::CacheMiss(format!("no cache store named {store}")).into());
            }
            let entries = cache.list_entries(&store).await?;
            CacheListOutput::Entries { store, entries }
        }
        None => CacheListOutput::Stores { stores: cache.list_store_info().await? },
    };
    json_result(&output)
}
