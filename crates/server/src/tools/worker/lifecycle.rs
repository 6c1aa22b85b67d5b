//! sw_install, sw_activate and sw_status tool implementations.

use hearth_client::{Fetcher, Worker};
use rmcp::{ErrorData as McpError, model::CallToolResult};

use crate::tools::json_result;

/// Implementation of the sw_install tool.
pub async fn install_impl<F: Fetcher>(worker: &Worker<F>) -> Result<CallToolResult, McpError> {
    let report = worker.install().await?;
    json_result(&report)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl<F: Fetcher>(worker: &Worker<F>) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;
    json_result(&report)
}

/// Implementation of the sw_status tool.
pub async fn status_impl<F: Fetcher>(worker: &Worker<F>) -> Result<CallToolResult, McpError> {
    let status = worker.status().await?;
    json_result(&status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{output, site_worker};
    use hearth_client::{ActivationReport, InstallReport, WorkerState, WorkerStatus};

    #[tokio::test]
    async fn test_install_then_activate() {
        let worker = site_worker().await;

        let installed: InstallReport = output(&install_impl(&worker).await.unwrap());
        assert_eq!(installed.version, "hearth-tools-v1");
        assert_eq!(installed.cached.len(), 2);

        let activated: ActivationReport = output(&activate_impl(&worker).await.unwrap());
        assert!(activated.clients_claimed);
        assert!(activated.deleted.is_empty());

        let status: WorkerStatus = output(&status_impl(&worker).await.unwrap());
        assert_eq!(status.state, WorkerState::Active);
        assert_eq!(status.stores.len(), 1);
        assert_eq!(status.stores[0].entries, 2);
        assert_eq!(status.pending_submissions, 0);
    }

    #[tokio::test]
    async fn test_activate_before_install_is_error() {
        let worker = site_worker().await;
        let err = activate_impl(&worker).await.unwrap_err();
        assert_eq!(err.code.0, -32010);
    }

    #[tokio::test]
    async fn test_failed_install_reports_install_error() {
        let worker = site_worker().await;
        worker.fetcher().unplug();

        let err = install_impl(&worker).await.unwrap_err();
        assert_eq!(err.code.0, -32009);

        let status: WorkerStatus = output(&status_impl(&worker).await.unwrap());
        assert_eq!(status.state, WorkerState::Redundant);
        assert!(status.stores.is_empty());
    }
}
