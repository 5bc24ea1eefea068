use crate::error::{Error, Result};
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Clears the problems flag across the users table.
///
/// Count and update are one atomic statement: the UPDATE's affected-row
/// count is the returned value, so it always equals the set of rows this
/// call transitioned from flagged to clear, no matter what concurrent
/// writers do between invocations.
#[derive(Clone)]
pub struct ProblemService {
    pool: PgPool,
    max_retries: u32,
    retry_backoff: Duration,
}

impl ProblemService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    /// Reset `has_problems` on every flagged row and return how many rows
    /// were flipped. Serialization conflicts retry the whole statement with
    /// exponential backoff; exhausting the retries surfaces the conflict.
    pub async fn reset_problems(&self) -> Result<i64> {
        let mut attempt: u32 = 0;
        loop {
            match self.try_reset().await {
                Ok(count) => {
                    info!(count, "reset problems flag");
                    return Ok(count);
                }
                Err(err) if is_conflict(&err) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        return Err(Error::Conflict {
                            attempts: attempt,
                            source: err,
                        });
                    }
                    let backoff = self.retry_backoff * 2u32.saturating_pow(attempt - 1);
                    warn!(attempt, backoff_ms = backoff.as_millis() as u64, "conflict while resetting problems flag, retrying");
                    sleep(backoff).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn try_reset(&self) -> std::result::Result<i64, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET has_problems = FALSE WHERE has_problems = TRUE")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as i64)
    }
}

fn is_conflict(err: &sqlx::Error) -> bool {
    match err {
        // serialization_failure and deadlock_detected
        sqlx::Error::Database(db) => matches!(db.code().as_deref(), Some("40001") | Some("40P01")),
        _ => false,
    }
}
