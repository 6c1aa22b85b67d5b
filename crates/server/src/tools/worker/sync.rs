//! sw_sync tool implementation.

use hearth_client::{Fetcher, Worker};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the sw_sync tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncParams {
    /// Sync tag to deliver (default: the configured form-submission tag).
    #[serde(default)]
    pub tag: Option<String>,
}

/// Implementation of the sw_sync tool.
pub async fn sync_impl<F: Fetcher>(worker: &Worker<F>, params: SwSyncParams) -> Result<CallToolResult, McpError> {
    let tag = params.tag.unwrap_or_else(|| worker.config().sync_tag.clone());
    let outcome = worker.sync(&tag).await?;
    json_result(&outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{output, site_worker};
    use hearth_client::SyncOutcome;
    use hearth_core::NewSubmission;

    #[tokio::test]
    async fn test_sync_default_tag_flushes_queue() {
        let worker = site_worker().await;
        worker.start().await.unwrap();
        worker.fetcher().page("https://reno.example/api/contact", "ok");
        worker
            .enqueue(NewSubmission {
                url: "/api/contact".into(),
                method: "POST".into(),
                body: b"name=ada".to_vec(),
                ..Default::default()
            })
            .await
            .unwrap();

        let outcome: SyncOutcome = output(&sync_impl(&worker, SwSyncParams::default()).await.unwrap());
        let SyncOutcome::Flushed(report) = outcome else {
            panic!("expected a flush, got {outcome:?}");
        };
        assert_eq!(report.attempted, 1);
        assert_eq!(report.replayed.len(), 1);
        assert_eq!(worker.db().submission_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sync_other_tag_is_ignored() {
        let worker = site_worker().await;
        worker.start().await.unwrap();

        let params = SwSyncParams { tag: Some("periodic-refresh".into()) };
        let outcome: SyncOutcome = output(&sync_impl(&worker, params).await.unwrap());
        assert!(matches!(outcome, SyncOutcome::Ignored { .. }));
    }

    #[tokio::test]
    async fn test_sync_before_activation_is_error() {
        let worker = site_worker().await;
        let err = sync_impl(&worker, SwSyncParams::default()).await.unwrap_err();
        assert_eq!(err.code.0, -32010);
    }
}
