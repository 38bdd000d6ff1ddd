//! Bounded-concurrency queue for blocking extraction work
//!
//! Callers wait for one of a fixed number of slots, then run their closure
//! on tokio's blocking pool. The whole wait-plus-work is bounded by a
//! wall-clock timeout; on expiry the caller gets `Timeout` and its slot is
//! handed back immediately. The abandoned closure may still finish in the
//! background but its result is discarded.

use std::sync::Arc;
use std::time::Duration;

use cbxpdf_core::{AppError, AppResult};
use tokio::sync::Semaphore;

#[derive(Clone)]
pub struct ExtractionQueue {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    timeout: Duration,
}

impl ExtractionQueue {
    pub fn new(max_concurrent: usize, timeout: Duration) -> Self {
        let max_concurrent = max_concurrent.max(1);
        tracing::info!(
            max_concurrent,
            timeout_secs = timeout.as_secs(),
            "Extraction queue initialized"
        );
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            timeout,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Slots not currently taken
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    #[tracing::instrument(skip(self, work))]
    pub async fn run<F, T>(&self, label: &str, work: F) -> AppResult<T>
    where
        F: FnOnce() -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let semaphore = self.semaphore.clone();
        let job = async move {
            // The permit lives in this future, not in the blocking closure: a
            // timeout frees the slot while the abandoned closure may still be
            // decoding, so after timeouts real decode work can briefly exceed
            // `max_concurrent`.
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| AppError::Internal("Extraction queue closed".to_string()))?;
            tokio::task::spawn_blocking(work)
                .await
                .map_err(|e| AppError::Internal(format!("Extraction task failed: {}", e)))?
        };

        match tokio::time::timeout(self.timeout, job).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Extraction timed out"
                );
                Err(AppError::Timeout(format!(
                    "{} did not finish within {} seconds",
                    label,
                    self.timeout.as_secs()
                )))
            }
        }
    }
}
