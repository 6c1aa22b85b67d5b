//! Deferred form submission queue.
//!
//! Submissions captured while offline are persisted here and replayed on
//! background sync. An entry leaves the queue only when its replay gets a
//! successful response; failures bump `attempts` and keep it in place.

use super::connection::CacheDb;
use super::hash::compute_submission_id;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// A form submission to persist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSubmission {
    /// Caller-chosen identifier. Derived from the request when absent.
    pub id: Option<String>,
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// A queued form submission awaiting replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub captured_at: String,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl CacheDb {
    /// Persist a submission at the back of the queue.
    pub async fn enqueue_submission(&self, new: &NewSubmission) -> Result<Submission, Error> {
        if new.url.is_empty() {
            return Err(Error::InvalidInput("submission url cannot be empty".into()));
        }
        if new.method.is_empty() {
            return Err(Error::InvalidInput("submission method cannot be empty".into()));
        }

        let captured_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Nanos, true);
        let method = new.method.to_ascii_uppercase();
        let id = match &new.id {
            Some(id) if !id.is_empty() => id.clone(),
            Some(_) => return Err(Error::InvalidInput("submission id cannot be empty".into())),
            None => compute_submission_id(&method, &new.url, &new.body, &captured_at),
        };

        let submission = Submission {
            id,
            url: new.url.clone(),
            method,
            headers: new.headers.clone(),
            body: new.body.clone(),
            captured_at,
            attempts: 0,
            last_error: None,
        };
        let headers_json = serde_json::to_string(&submission.headers)?;

        let row = submission.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM submissions WHERE id = ?1)",
                    params![&row.id],
                    |r| r.get(0),
                )?;
                if exists {
                    return Err(Error::InvalidInput(format!("submission {} is already queued", row.id)));
                }

                conn.execute(
                    "INSERT INTO submissions (id, url, method, headers_json, body, captured_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![&row.id, &row.url, &row.method, headers_json, &row.body, &row.captured_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(submission)
    }

    /// All pending submissions in capture order.
    pub async fn pending_submissions(&self) -> Result<Vec<Submission>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<Submission>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, url, method, headers_json, body, captured_at, attempts, last_error
                     FROM submissions ORDER BY seq ASC",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, Vec<u8>>(4)?,
                            row.get::<_, String>(5)?,
                            row.get::<_, i64>(6)?,
                            row.get::<_, Option<String>>(7)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(id, url, method, headers_json, body, captured_at, attempts, last_error)| -> Result<Submission, Error> {
                        Ok(Submission {
                            id,
                            url,
                            method,
                            headers: serde_json::from_str(&headers_json)?,
                            body,
                            captured_at,
                            attempts: attempts.max(0) as u32,
                            last_error,
                        })
                    })
                    .collect()
            })
            .await
            .map_err(Error::from)
    }

    /// Remove a submission after a successful replay.
    ///
    /// Returns false if it was not queued.
    pub async fn remove_submission(&self, id: &str) -> Result<bool, Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM submissions WHERE id = ?1", params![id])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Record a failed replay attempt, keeping the submission queued.
    pub async fn record_submission_failure(&self, id: &str, error: &str) -> Result<(), Error> {
        let id = id.to_string();
        let error = error.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "UPDATE submissions SET attempts = attempts + 1, last_error = ?2 WHERE id = ?1",
                    params![id, error],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Number of queued submissions.
    pub async fn submission_count(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM submissions", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
