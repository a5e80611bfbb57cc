//! Shared async utilities.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};

/// Poll interval for [`wait_until`].
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Wait until `predicate` yields `Some`, polling with a bounded deadline.
///
/// Replaces ad hoc DOM mutation observers: the timeout is explicit and the
/// caller decides what "ready" means. Returns `None` when the deadline
/// passes first.
pub async fn wait_until<F, Fut, T>(timeout: Duration, mut predicate: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = predicate().await {
            return Some(value);
        }
        if Instant::now() >= deadline {
            return None;
        }
        sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_returns_once_predicate_holds() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);

        let result = wait_until(Duration::from_secs(5), move || {
            let calls = Arc::clone(&calls2);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) >= 2 {
                    Some("ready")
                } else {
                    None
                }
            }
        })
        .await;

        assert_eq!(result, Some("ready"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_when_predicate_never_holds() {
        let result: Option<()> =
            wait_until(Duration::from_millis(200), || async { None }).await;
        assert!(result.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_skips_waiting() {
        let result = wait_until(Duration::ZERO, || async { Some(1) }).await;
        assert_eq!(result, Some(1));
    }
}
