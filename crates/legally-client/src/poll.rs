//! Task status polling
//!
//! [`Poller`] asks a [`StatusSource`] for a task's status on a fixed
//! interval until the task finishes or the token is cancelled. The first
//! request goes out immediately.

use crate::cancel::{cancellable, CancellationToken};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::types::{TaskState, TaskStatus};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Reason reported when a failed task carries no error text
const UNKNOWN_FAILURE: &str = "task failed";

/// Shortest interval a [`Poller`] will run with
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Anything that can report a task's status
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the current status
    async fn status(&self, task_id: &str) -> ClientResult<TaskStatus>;
}

/// How a poll loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Task completed; carries the final status
    Completed(TaskStatus),
    /// Task failed with a reason
    Failed(String),
    /// Token fired before the task finished
    Cancelled,
}

/// Fixed-interval poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    interval: Duration,
}

impl Default for Poller {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

impl Poller {
    /// Create poller with an interval; anything below [`MIN_INTERVAL`] is raised to it
    #[inline]
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// Create poller using the configured interval
    #[inline]
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.poll_interval())
    }

    /// Interval between requests
    #[inline]
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll until the task finishes or `token` fires
    ///
    /// `on_update` sees every status received while the token is live. A
    /// response that arrives after cancellation is dropped without reaching
    /// `on_update`. Source errors end the loop.
    pub async fn poll<S, F>(
        &self,
        source: &S,
        task_id: &str,
        token: &CancellationToken,
        mut on_update: F,
    ) -> ClientResult<PollOutcome>
    where
        S: StatusSource + ?Sized,
        F: FnMut(&TaskStatus) + Send,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks: u64 = 0;

        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => return Ok(PollOutcome::Cancelled),
                _ = ticker.tick() => {}
            }

            let status = match cancellable(token, source.status(task_id)).await {
                Ok(status) => status,
                Err(ClientError::Cancelled) => return Ok(PollOutcome::Cancelled),
                Err(e) => {
                    tracing::debug!(task_id, ticks, error = %e, "poll aborted");
                    return Err(e);
                }
            };
            if token.is_cancelled() {
                return Ok(PollOutcome::Cancelled);
            }

            ticks += 1;
            tracing::debug!(task_id, ticks, status = ?status.status, progress = ?status.progress, "poll tick");
            on_update(&status);

            match status.status {
                TaskState::Completed => return Ok(PollOutcome::Completed(status)),
                TaskState::Failed => {
                    let reason = status
                        .error
                        .unwrap_or_else(|| UNKNOWN_FAILURE.to_string());
                    return Ok(PollOutcome::Failed(reason));
                }
                TaskState::Pending | TaskState::Processing | TaskState::Unknown => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    struct Scripted {
        replies: Mutex<VecDeque<ClientResult<TaskStatus>>>,
        calls: Mutex<Vec<tokio::time::Instant>>,
    }

    impl Scripted {
        fn new(replies: Vec<ClientResult<TaskStatus>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl StatusSource for Scripted {
        async fn status(&self, _task_id: &str) -> ClientResult<TaskStatus> {
            self.calls.lock().push(tokio::time::Instant::now());
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(TaskStatus::new(TaskState::Processing)))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_completed() {
        let source = Scripted::new(vec![
            Ok(TaskStatus::new(TaskState::Pending)),
            Ok(TaskStatus::new(TaskState::Processing).with_progress(50.0)),
            Ok(TaskStatus::new(TaskState::Completed).with_progress(100.0)),
        ]);
        let token = CancellationToken::new();
        let mut seen = Vec::new();

        let outcome = Poller::new(Duration::from_secs(2))
            .poll(&source, "t-1", &token, |s| seen.push(s.status))
            .await
            .unwrap();

        assert!(matches!(outcome, PollOutcome::Completed(ref s) if s.progress == Some(100.0)));
        assert_eq!(
            seen,
            vec![TaskState::Pending, TaskState::Processing, TaskState::Completed]
        );

        let calls = source.calls.lock();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1] - calls[0], Duration::from_secs(2));
        assert_eq!(calls[2] - calls[1], Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_clamped() {
        let poller = Poller::new(Duration::ZERO);
        assert_eq!(poller.interval(), MIN_INTERVAL);

        let source = Scripted::new(vec![
            Ok(TaskStatus::new(TaskState::Processing)),
            Ok(TaskStatus::new(TaskState::Completed)),
        ]);
        let outcome = poller
            .poll(&source, "t-0", &CancellationToken::new(), |_| {})
            .await
            .unwrap();
        assert!(matches!(outcome, PollOutcome::Completed(_)));
    }

    /// Cancels the token while its request is in flight, then answers anyway
    struct CancelsMidRequest {
        token: CancellationToken,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl StatusSource for CancelsMidRequest {
        async fn status(&self, _task_id: &str) -> ClientResult<TaskStatus> {
            *self.calls.lock() += 1;
            tokio::time::sleep(Duration::from_millis(300)).await;
            self.token.cancel();
            Ok(TaskStatus::new(TaskState::Completed).with_progress(100.0))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_is_not_applied() {
        let token = CancellationToken::new();
        let source = CancelsMidRequest {
            token: token.clone(),
            calls: Mutex::new(0),
        };
        let mut applied = 0;

        let outcome = Poller::new(Duration::from_secs(1))
            .poll(&source, "t-5", &token, |_| applied += 1)
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Cancelled);
        assert_eq!(applied, 0);
        assert_eq!(*source.calls.lock(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_task() {
        let source = Scripted::new(vec![Ok(TaskStatus::new(TaskState::Failed).with_error("OCR failed"))]);
        let outcome = Poller::new(Duration::from_secs(1))
            .poll(&source, "t-2", &CancellationToken::new(), |_| {})
            .await
            .unwrap();
        assert_eq!(outcome, PollOutcome::Failed("OCR failed".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_error_aborts() {
        let source = Scripted::new(vec![
            Ok(TaskStatus::new(TaskState::Processing)),
            Err(ClientError::backend(500, "boom")),
            Ok(TaskStatus::new(TaskState::Completed)),
        ]);
        let result = Poller::new(Duration::from_secs(1))
            .poll(&source, "t-3", &CancellationToken::new(), |_| {})
            .await;
        assert!(matches!(result, Err(ClientError::Backend { status: 500, .. })));
        assert_eq!(source.calls.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_future_ticks() {
        let source = std::sync::Arc::new(Scripted::new(Vec::new()));
        let token = CancellationToken::new();

        let task = {
            let source = source.clone();
            let token = token.clone();
            tokio::spawn(async move {
                Poller::new(Duration::from_secs(1))
                    .poll(source.as_ref(), "t-4", &token, |_| {})
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(2500)).await;
        token.cancel();
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome, PollOutcome::Cancelled);

        let before = source.calls.lock().len();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls.lock().len(), before);
        assert_eq!(before, 3);
    }
}
