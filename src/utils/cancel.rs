use crate::utils::error::{ReportError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// 取消權杖：新的載入會取消前一個仍在進行中的請求
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `cancel` has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // sender 由 self 持有，不會被 drop
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Runs `fut` unless the token fires first, in which case the future is
    /// dropped and `Cancelled` is returned.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(ReportError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(ReportError::Cancelled),
            result = fut => result,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_waiters() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should finish")
            .expect("task should not panic");
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_already_cancelled_resolves_immediately() {
        let token = CancelToken::new();
        token.cancel();
        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("should resolve immediately");
    }

    #[tokio::test]
    async fn test_run_drops_future_on_cancel() {
        let token = CancelToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result: Result<()> = token
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ReportError::Cancelled)));
    }

    #[tokio::test]
    async fn test_run_passes_result_through() {
        let token = CancelToken::new();
        assert_eq!(token.run(async { Ok(7) }).await.unwrap(), 7);
    }

    #[test]
    fn test_fresh_token_is_not_cancelled() {
        assert!(!CancelToken::default().is_cancelled());
    }
}
