//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker.
use std::sync::Arc;

use crate::tools::{
    cache::{CacheListParams, CachePurgeParams, list_impl, purge_impl},
    queue::{QueueSubmitParams, list_pending_impl, submit_impl},
    worker::{SwFetchParams, SwSyncParams, activate_impl, fetch_impl, install_impl, status_impl, sync_impl},
};

use hearth_client::{FetchClient, Worker};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The MCP server handler for hearth-sw.
#[derive(Clone)]
pub struct HearthServer {
    worker: Arc<Worker<FetchClient>>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl HearthServer {
    pub fn new(worker: Arc<Worker<FetchClient>>) -> Self {
        Self { worker, tool_router: Self::tool_router() }
    }

    #[tool(description = "Run the install event: precache the site shell into the current cache version.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    #[tool(description = "Run the activate event: delete every cache store except the current version and claim pages.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    /// Dispatch a fetch event.
    ///
    /// Requests the worker does not intercept (admin, non-GET, cross-origin,
    /// or before activation) go straight to the network.
    #[tool(
        description = "Dispatch a fetch event through the worker. Reports whether the response came from cache, network, the offline page or a synthetic 503."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a background sync event. The form-submission tag replays queued submissions in order.")]
    async fn sw_sync(&self, params: Parameters<SwSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "Show worker state, cache version, cache stores and submission queue depth.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker).await
    }

    #[tool(description = "Persist a form submission for replay on the next background sync.")]
    async fn queue_submit(&self, params: Parameters<QueueSubmitParams>) -> Result<CallToolResult, McpError> {
        submit_impl(&self.worker, params.0).await
    }

    #[tool(description = "List queued form submissions in capture order.")]
    async fn queue_list(&self) -> Result<CallToolResult, McpError> {
        list_pending_impl(&self.worker).await
    }

    #[tool(description = "List cache stores, or the entries of one store.")]
    async fn cache_list(&self, params: Parameters<CacheListParams>) -> Result<CallToolResult, McpError> {
        list_impl(self.worker.db(), params.0).await
    }

    #[tool(description = "Delete a named cache store and all of its entries.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(self.worker.db(), params.0).await
    }
}

impl ServerHandler for HearthServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "hearth-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
