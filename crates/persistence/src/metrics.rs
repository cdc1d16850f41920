//! Database metrics.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::future::Future;
use std::time::Instant;

/// Publishes connection pool gauges. Called periodically by a background job.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("database_connections_total").set(size as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_active").set(size.saturating_sub(idle) as f64);
}

/// Times one store operation.
///
/// ```ignore
/// let timer = QueryTimer::new("take_pending");
/// let result = do_work().await;
/// timer.finish(&result);
/// ```
pub struct QueryTimer {
    operation: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    /// Records duration and outcome.
    pub fn finish<T, E>(self, result: &Result<T, E>) {
        let outcome = if result.is_ok() { "ok" } else { "error" };
        histogram!(
            "database_query_duration_seconds",
            "query" => self.operation,
            "outcome" => outcome
        )
        .record(self.start.elapsed().as_secs_f64());

        if result.is_err() {
            counter!("database_query_errors_total", "query" => self.operation).increment(1);
        }
    }
}

/// Awaits `operation` under a [`QueryTimer`].
pub async fn timed<T, E, F>(name: &'static str, operation: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    let timer = QueryTimer::new(name);
    let result = operation.await;
    timer.finish(&result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_keeps_operation_name() {
        let timer = QueryTimer::new("find_device_by_mac");
        assert_eq!(timer.operation, "find_device_by_mac");
    }

    #[test]
    fn test_finish_without_recorder_is_harmless() {
        let ok: Result<(), ()> = Ok(());
        QueryTimer::new("ping").finish(&ok);
        let err: Result<(), ()> = Err(());
        QueryTimer::new("ping").finish(&err);
    }

    #[tokio::test]
    async fn test_timed_passes_result_through() {
        let value = timed("count", async { Ok::<_, String>(7) }).await;
        assert_eq!(value, Ok(7));
    }
}
