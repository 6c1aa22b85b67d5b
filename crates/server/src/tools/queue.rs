//! queue_submit and queue_list tool implementations.
//!
//! The page-side half of background sync: a form submission made while
//! offline is persisted here and replayed by sw_sync.

use std::collections::BTreeMap;

use hearth_client::{Fetcher, Worker};
use hearth_core::{NewSubmission, Submission};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the queue_submit tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueueSubmitParams {
    /// Target URL. Paths resolve against the site origin.
    pub url: String,

    /// HTTP method (default: POST).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request headers to replay.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Form body, sent as UTF-8.
    #[serde(default)]
    pub body: String,

    /// Caller-chosen ID; derived from the request when omitted.
    #[serde(default)]
    pub id: Option<String>,
}

fn default_method() -> String {
    "POST".into()
}

/// A queued submission as reported to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueuedSubmission {
    pub id: String,
    pub url: String,
    pub method: String,
    pub captured_at: String,
    /// Failed replay attempts so far.
    pub attempts: u32,
    pub last_error: Option<String>,
    /// Body size in bytes.
    pub size: usize,
}

impl From<Submission> for QueuedSubmission {
    fn from(submission: Submission) -> Self {
        Self {
            size: submission.body.len(),
            id: submission.id,
            url: submission.url,
            method: submission.method,
            captured_at: submission.captured_at,
            attempts: submission.attempts,
            last_error: submission.last_error,
        }
    }
}

/// Output from the queue_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueueListOutput {
    /// Pending submissions in replay order.
    pub pending: Vec<QueuedSubmission>,
}

/// Implementation of the queue_submit tool.
pub async fn submit_impl<F: Fetcher>(worker: &Worker<F>, params: QueueSubmitParams) -> Result<CallToolResult, McpError> {
    let submission = NewSubmission {
        id: params.id,
        url: params.url,
        method: params.method,
        headers: params.headers.into_iter().collect(),
        body: params.body.into_bytes(),
    };

    let queued = worker.enqueue(submission).await?;
    json_result(&QueuedSubmission::from(queued))
}

/// Implementation of the queue_list tool.
pub async fn list_pending_impl<F: Fetcher>(worker: &Worker<F>) -> Result<CallToolResult, McpError> {
    let pending = worker.db().pending_submissions().await?;
    let output = QueueListOutput { pending: pending.into_iter().map(QueuedSubmission::from).collect() };
    json_result(&output)
}
