use std::future::Future;
use tokio::time::{sleep_until, Instant};

use crate::utils::TranslationError;

/// Race `operation` against a wall-clock deadline
///
/// Whichever side finishes first wins; the other future is dropped, which
/// cancels an in-flight request instead of leaving it running.
pub async fn race_deadline<T, F>(deadline: Instant, operation: F) -> Result<T, TranslationError>
where
    F: Future<Output = Result<T, TranslationError>>,
{
    let started = Instant::now();
    tokio::select! {
        result = operation => result,
        _ = sleep_until(deadline) => {
            Err(TranslationError::Timeout(deadline.saturating_duration_since(started)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fast_operation_wins() {
        let deadline = Instant::now() + Duration::from_secs(5);
        let result = race_deadline(deadline, async { Ok::<_, TranslationError>("done") }).await;
        assert_eq!(result.unwrap(), "done");
    }

    #[tokio::test]
    async fn test_slow_operation_times_out_and_is_dropped() {
        struct SetOnDrop(Arc<AtomicBool>);
        impl Drop for SetOnDrop {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let dropped = Arc::new(AtomicBool::new(false));
        let guard = SetOnDrop(dropped.clone());
        let deadline = Instant::now() + Duration::from_millis(30);

        let result = race_deadline(deadline, async move {
            let _guard = guard;
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, TranslationError>(())
        })
        .await;

        assert!(matches!(result, Err(TranslationError::Timeout(_))));
        assert!(dropped.load(Ordering::SeqCst), "losing operation must be cancelled");
    }

    #[tokio::test]
    async fn test_operation_error_passes_through() {
        let deadline = Instant::now() + Duration::from_secs(5);
        let result: Result<(), _> =
            race_deadline(deadline, async { Err(TranslationError::NoTranslationFound) }).await;
        assert_eq!(result.unwrap_err(), TranslationError::NoTranslationFound);
    }
}
