//! Retry helper for writes that hit `SQLITE_BUSY`.

use rand::random;
use std::borrow::Cow;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::{Error, Result};

const SQLITE_BUSY_MAX_RETRIES: u32 = 8;
const SQLITE_BUSY_BASE_DELAY_MS: u64 = 10;
const SQLITE_BUSY_MAX_DELAY_MS: u64 = 1000;

/// Whether the error is SQLite reporting a locked/busy database (codes 5 and 6).
pub(crate) fn is_sqlite_busy_error(err: &Error) -> bool {
    let Error::DatabaseSqlx(sqlx_err) = err else {
        return false;
    };

    let looks_busy = |msg: &str| {
        let msg = msg.to_ascii_lowercase();
        msg.contains("database is locked") || msg.contains("database is busy")
    };

    match sqlx_err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(Cow::into_owned);
            matches!(code.as_deref(), Some("5") | Some("6")) || looks_busy(db_err.message())
        }
        other => looks_busy(&other.to_string()),
    }
}

/// Backoff before retry number `attempt` (0-based): exponential, capped, with jitter.
fn busy_backoff(attempt: u32) -> Duration {
    let exp_ms = SQLITE_BUSY_BASE_DELAY_MS.saturating_mul(1u64 << attempt.min(16));
    let capped_ms = exp_ms.min(SQLITE_BUSY_MAX_DELAY_MS);
    let jitter_ms = random::<u64>() % (capped_ms / 4 + 1);
    Duration::from_millis((capped_ms + jitter_ms).min(SQLITE_BUSY_MAX_DELAY_MS))
}

/// Run `op`, retrying while it fails with a busy/locked database.
///
/// Any other error is returned immediately.
pub async fn retry_on_sqlite_busy<T, F, Fut>(op_name: &'static str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if is_sqlite_busy_error(&err) && attempt < SQLITE_BUSY_MAX_RETRIES => {
                let delay = busy_backoff(attempt);
                debug!(
                    "SQLite busy during {}, retrying in {:?} (attempt {}/{})",
                    op_name,
                    delay,
                    attempt + 1,
                    SQLITE_BUSY_MAX_RETRIES
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_non_database_error_is_not_busy() {
        assert!(!is_sqlite_busy_error(&Error::validation("nope")));
        assert!(!is_sqlite_busy_error(&Error::DatabaseSqlx(
            sqlx::Error::RowNotFound
        )));
    }

    #[test]
    fn test_backoff_is_capped() {
        for attempt in 0..20 {
            assert!(busy_backoff(attempt) <= Duration::from_millis(SQLITE_BUSY_MAX_DELAY_MS));
        }
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_on_sqlite_busy("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::validation("bad")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let value = retry_on_sqlite_busy("test", || async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }
}
