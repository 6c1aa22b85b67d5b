//! Background sync: replay of deferred form submissions.

use hearth_core::{Error, Submission};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{Worker, WorkerState};
use crate::fetch::Fetcher;
use crate::http::Request;

/// Submission that could not be replayed and stays queued.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct FailedReplay {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SyncReport {
    pub attempted: usize,
    /// IDs replayed and removed from the queue, in queue order.
    pub replayed: Vec<String>,
    pub failed: Vec<FailedReplay>,
}

/// Result of dispatching a sync event.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The tag is not ours; nothing was done.
    Ignored { tag: String },
    Flushed(SyncReport),
}

impl<F: Fetcher> Worker<F> {
    /// Dispatch a sync event.
    ///
    /// Pending submissions are replayed one at a time in capture order. A
    /// submission leaves the queue only after the server accepts it with a
    /// 2xx; a failure is recorded and the rest of the queue is still tried.
    /// Overlapping sync events flush one after the other.
    pub async fn sync(&self, tag: &str) -> Result<SyncOutcome, Error> {
        self.require_state(WorkerState::Active, "sync").await?;

        if tag != self.config.sync_tag {
            tracing::debug!(%tag, "ignoring unknown sync tag");
            return Ok(SyncOutcome::Ignored { tag: tag.to_string() });
        }

        // A second sync waits here and then sees only what the first left behind.
        let _flush = self.flush.lock().await;

        let pending = self.db.pending_submissions().await?;
        let mut report = SyncReport { attempted: pending.len(), ..Default::default() };
        tracing::info!(%tag, pending = pending.len(), "flushing submission queue");

        for submission in pending {
            let outcome = match self.replay(&submission).await {
                Ok(()) => self.db.remove_submission(&submission.id).await.map(|_| ()),
                Err(err) => Err(err),
            };

            match outcome {
                Ok(()) => {
                    tracing::info!(id = %submission.id, url = %submission.url, "replayed submission");
                    report.replayed.push(submission.id);
                }
                Err(err) => {
                    tracing::warn!(id = %submission.id, url = %submission.url, error = %err, "replay failed; keeping submission");
                    if let Err(record_err) = self.db.record_submission_failure(&submission.id, &err.to_string()).await {
                        tracing::warn!(id = %submission.id, error = %record_err, "could not record replay failure");
                    }
                    report.failed.push(FailedReplay { id: submission.id, error: err.to_string() });
                }
            }
        }

        Ok(SyncOutcome::Flushed(report))
    }

    async fn replay(&self, submission: &Submission) -> Result<(), Error> {
        let method = Method::from_bytes(submission.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {:?}: {e}", submission.method)))?;
        let url = self.config.resolve(&submission.url)?;

        let request = Request::new(method, url)
            .with_header_pairs(&submission.headers)?
            .with_body(submission.body.clone());

        let response = self.fetch_network(&request).await?;
        if !response.is_success() {
            return Err(Error::HttpError(format!("status {}", response.status.as_u16())));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fake::{FakeFetcher, site_worker};
    use super::*;
    use hearth_core::NewSubmission;
    use std::time::Duration;

    fn contact(id: &str, body: &str) -> NewSubmission {
        NewSubmission {
            id: Some(id.to_string()),
            url: "/api/contact".into(),
            method: "POST".into(),
            headers: vec![("content-type".into(), "application/x-www-form-urlencoded".into())],
            body: body.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn test_sync_replays_in_order_and_keeps_failures() {
        let fetcher = FakeFetcher::site();
        fetcher.respond("https://reno.example/api/contact", 200, "thanks");
        fetcher.respond("https://reno.example/api/quote", 500, "down");
        let worker = site_worker(fetcher).await;
        worker.start().await.unwrap();

        worker.enqueue(contact("a", "name=ada")).await.unwrap();
        worker
            .enqueue(NewSubmission { url: "/api/quote".into(), ..contact("b", "name=bob") })
            .await
            .unwrap();
        worker.enqueue(contact("c", "name=cyd")).await.unwrap();
        let calls_before = worker.fetcher().calls().len();

        let outcome = worker.sync("form-submission").await.unwrap();
        let SyncOutcome::Flushed(report) = outcome else {
            panic!("expected a flush, got {outcome:?}");
        };
        assert_eq!(report.attempted, 3);
        assert_eq!(report.replayed, vec!["a", "c"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, "b");

        let calls = worker.fetcher().calls()[calls_before..].to_vec();
        assert_eq!(
            calls,
            vec![
                "POST https://reno.example/api/contact",
                "POST https://reno.example/api/quote",
                "POST https://reno.example/api/contact",
            ]
        );
        let bodies = worker.fetcher().bodies()[calls_before..].to_vec();
        assert_eq!(bodies, vec![b"name=ada".to_vec(), b"name=bob".to_vec(), b"name=cyd".to_vec()]);
        let form = Some("application/x-www-form-urlencoded".to_string());
        let content_types = worker.fetcher().header_values("content-type")[calls_before..].to_vec();
        assert_eq!(content_types, vec![form.clone(), form.clone(), form]);

        let remaining = worker.db().pending_submissions().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "b");
        assert_eq!(remaining[0].attempts, 1);
        assert!(remaining[0].last_error.as_deref().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn test_failed_submission_retried_on_next_sync() {
        let fetcher = FakeFetcher::site();
        let worker = site_worker(fetcher).await;
        worker.start().await.unwrap();
        worker.enqueue(contact("a", "name=ada")).await.unwrap();

        let SyncOutcome::Flushed(first) = worker.sync("form-submission").await.unwrap() else {
            panic!("expected a flush");
        };
        assert_eq!(first.failed.len(), 1);
        assert_eq!(worker.db().submission_count().await.unwrap(), 1);

        worker.fetcher().respond("https://reno.example/api/contact", 201, "created");
        let SyncOutcome::Flushed(second) = worker.sync("form-submission").await.unwrap() else {
            panic!("expected a flush");
        };
        assert_eq!(second.replayed, vec!["a"]);
        assert_eq!(worker.db().submission_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sync_empty_queue() {
        let worker = site_worker(FakeFetcher::site()).await;
        worker.start().await.unwrap();

        let SyncOutcome::Flushed(report) = worker.sync("form-submission").await.unwrap() else {
            panic!("expected a flush");
        };
        assert_eq!(report.attempted, 0);
        assert!(report.replayed.is_empty());
    }

    #[tokio::test]
    async fn test_sync_ignores_other_tags() {
        let fetcher = FakeFetcher::site();
        fetcher.respond("https://reno.example/api/contact", 200, "thanks");
        let worker = site_worker(fetcher).await;
        worker.start().await.unwrap();
        worker.enqueue(contact("a", "name=ada")).await.unwrap();

        let outcome = worker.sync("newsletter").await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Ignored { ref tag } if tag == "newsletter"));
        assert_eq!(worker.db().submission_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sync_requires_active_worker() {
        let worker = site_worker(FakeFetcher::site()).await;
        let result = worker.sync("form-submission").await;
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_replay_sends_every_stored_header() {
        let fetcher = FakeFetcher::site();
        fetcher.respond("https://reno.example/api/contact", 200, "thanks");
        let worker = site_worker(fetcher).await;
        worker.start().await.unwrap();

        let mut submission = contact("a", "name=ada");
        submission.headers.push(("x-requested-with".into(), "hearth".into()));
        let queued = worker.enqueue(submission).await.unwrap();
        let calls_before = worker.fetcher().calls().len();

        worker.replay(&queued).await.unwrap();

        assert_eq!(
            worker.fetcher().header_values("content-type")[calls_before..],
            [Some("application/x-www-form-urlencoded".to_string())]
        );
        assert_eq!(
            worker.fetcher().header_values("x-requested-with")[calls_before..],
            [Some("hearth".to_string())]
        );
    }

    #[tokio::test]
    async fn test_overlapping_syncs_replay_once() {
        let fetcher = FakeFetcher::site();
        fetcher.respond_slowly("https://reno.example/api/contact", Duration::from_millis(50), 200, "thanks");
        let worker = site_worker(fetcher).await;
        worker.start().await.unwrap();
        worker.enqueue(contact("a", "name=ada")).await.unwrap();

        let (first, second) = tokio::join!(worker.sync("form-submission"), worker.sync("form-submission"));
        let reports: Vec<SyncReport> = [first.unwrap(), second.unwrap()]
            .into_iter()
            .map(|outcome| match outcome {
                SyncOutcome::Flushed(report) => report,
                other => panic!("expected a flush, got {other:?}"),
            })
            .collect();

        assert_eq!(worker.fetcher().call_count("https://reno.example/api/contact"), 1);
        let replayed: Vec<&String> = reports.iter().flat_map(|r| r.replayed.iter()).collect();
        assert_eq!(replayed, vec!["a"]);
        assert!(reports.iter().all(|r| r.failed.is_empty()));
        assert_eq!(worker.db().submission_count().await.unwrap(), 0);
    }
}
