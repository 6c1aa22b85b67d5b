//! MCP tool implementations.
//!
//! This module contains all tools exposed by the hearth-sw server. Each tool
//! is a free function over the worker or the cache database so it can be
//! tested without a transport.

pub mod cache;
pub mod queue;
pub mod worker;

use hearth_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Pretty-printed JSON tool result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
