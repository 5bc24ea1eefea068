use crate::error::{Error, Result};
use crate::services::generator::{NewUser, UserGenerator};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::{Duration, Instant};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Row count seeded when the caller does not ask for a specific total.
pub const DEFAULT_SEED_TOTAL: i64 = 1_000_000;

const DEFAULT_BATCH_SIZE: usize = 1_000;
const DEFAULT_WORKERS: usize = 4;

/// Outcome of a seed run. `inserted` counts only rows the store actually
/// committed, including runs that were cancelled partway through.
#[derive(Debug, Clone)]
pub struct SeedReport {
    pub requested: i64,
    pub inserted: i64,
    pub batches: u32,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl SeedReport {
    pub fn rows_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.inserted as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Populates the users table with synthetic records.
///
/// Rows are generated sequentially (so the index-derived fields are stable)
/// and written as multi-row INSERT statements by a bounded pool of workers.
/// Each batch commits independently; committed batches are never rolled back
/// when a later batch fails or the run is cancelled.
#[derive(Clone)]
pub struct SeedService {
    pool: PgPool,
    batch_size: usize,
    workers: usize,
    timeout: Option<Duration>,
}

impl SeedService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
            workers: DEFAULT_WORKERS,
            timeout: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Seed `total` users, cancelling the run if the configured timeout
    /// elapses first.
    pub async fn run(&self, total: i64, generator: UserGenerator) -> Result<SeedReport> {
        let cancel = CancellationToken::new();
        let watchdog = self.timeout.map(|after| {
            let token = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                warn!(timeout_secs = after.as_secs(), "seed run timed out, cancelling");
                token.cancel();
            })
        });

        let outcome = self.run_with_cancel(total, generator, &cancel).await;
        if let Some(handle) = watchdog {
            handle.abort();
        }
        outcome
    }

    /// Seed `total` users, stopping early when `cancel` fires.
    ///
    /// A negative `total` is rejected before any store work. On a batch
    /// failure, dispatch of unissued batches stops, in-flight batches are
    /// drained, and the returned `Error::BatchWrite` carries the committed
    /// row count. Cancellation is not an error: the report comes back with
    /// `cancelled = true` and the exact committed count.
    pub async fn run_with_cancel(
        &self,
        total: i64,
        mut generator: UserGenerator,
        cancel: &CancellationToken,
    ) -> Result<SeedReport> {
        if total < 0 {
            return Err(Error::BadRequest(format!(
                "total must be non-negative, got {}",
                total
            )));
        }

        info!(
            total,
            batch_size = self.batch_size,
            workers = self.workers,
            "seeding users"
        );

        let started = Instant::now();
        let mut tasks: JoinSet<Result<u64>> = JoinSet::new();
        let mut dispatched: i64 = 0;
        let mut inserted: i64 = 0;
        let mut batches: u32 = 0;
        let mut failure: Option<Error> = None;
        let mut cancelled = false;

        while dispatched < total && failure.is_none() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if tasks.len() >= self.workers {
                if let Some(joined) = tasks.join_next().await {
                    note_batch(joined, &mut inserted, &mut batches, &mut failure);
                }
                continue;
            }

            let size = (total - dispatched).min(self.batch_size as i64) as usize;
            let rows = generator.next_batch(size);
            dispatched += size as i64;
            let pool = self.pool.clone();
            tasks.spawn(async move { insert_users(&pool, &rows).await });
        }

        // Drain in-flight batches; each one either commits whole or fails
        // whole, so the tally below is exact.
        while let Some(joined) = tasks.join_next().await {
            note_batch(joined, &mut inserted, &mut batches, &mut failure);
        }

        let elapsed = started.elapsed();
        if let Some(source) = failure {
            warn!(inserted, requested = total, "seed run aborted by batch failure");
            return Err(Error::BatchWrite {
                inserted,
                source: Box::new(source),
            });
        }

        let report = SeedReport {
            requested: total,
            inserted,
            batches,
            cancelled,
            elapsed,
        };
        if cancelled {
            info!(inserted, requested = total, "seed run cancelled");
        } else {
            info!(
                inserted,
                batches,
                elapsed_ms = elapsed.as_millis() as u64,
                "seed run complete ({:.0} rows/sec)",
                report.rows_per_second()
            );
        }
        Ok(report)
    }
}

fn note_batch(
    joined: std::result::Result<Result<u64>, JoinError>,
    inserted: &mut i64,
    batches: &mut u32,
    failure: &mut Option<Error>,
) {
    match joined {
        Ok(Ok(count)) => {
            *inserted += count as i64;
            *batches += 1;
            debug!(rows = count, "batch committed");
        }
        Ok(Err(err)) => {
            if failure.is_none() {
                *failure = Some(err);
            }
        }
        Err(join_err) => {
            if failure.is_none() {
                *failure = Some(Error::Internal(format!(
                    "seed worker panicked: {}",
                    join_err
                )));
            }
        }
    }
}

/// Write one batch as a single multi-row INSERT round trip.
async fn insert_users(pool: &PgPool, rows: &[NewUser]) -> Result<u64> {
    if rows.is_empty() {
        return Ok(0);
    }

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO users (first_name, last_name, age, gender, has_problems) ");
    builder.push_values(rows, |mut b, user| {
        b.push_bind(&user.first_name)
            .push_bind(&user.last_name)
            .push_bind(user.age)
            .push_bind(user.gender)
            .push_bind(user.has_problems);
    });

    let result = builder.build().execute(pool).await?;
    Ok(result.rows_affected())
}
