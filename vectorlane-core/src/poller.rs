//! Waiting for long-running tasks to settle.
//!
//! Every long-running operation has the same shape: a start RPC that returns a
//! [`TaskHandle`] and a poll RPC that reports the task's [`TaskStatus`]. The
//! [`Poller`] turns that pair into a single call:
//!
//! 1. Record `deadline = now + timeout` (no deadline when the timeout is unbounded).
//! 2. Poll. A failing poll RPC aborts the wait with that error.
//! 3. `Completed` returns the status; `Failed` returns `OperationFailed`.
//! 4. `Pending`/`InProgress` at or past the deadline returns `OperationTimedOut`.
//! 5. Otherwise sleep for the interval and poll again.
//!
//! Polls for one handle are strictly sequential. The poller keeps no state
//! between calls, so independent handles can be waited on concurrently.
//! Time is read through a [`Clock`] so the loop can be driven in tests without
//! real sleeps.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::task::{TaskHandle, TaskOutcome, TaskState, TaskStatus, WaitMode};

/// Interval used when a request does not set one.
pub const DEFAULT_WAITING_INTERVAL: Duration = Duration::from_millis(500);

/// Interval and deadline for waiting on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    interval: Duration,
    timeout: Option<Duration>,
}

impl WaitPolicy {
    /// Creates a policy.
    ///
    /// `interval` must be positive. A `timeout` of `None` or zero means the
    /// wait never gives up.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use vectorlane_core::WaitPolicy;
    ///
    /// let policy = WaitPolicy::new(Duration::from_secs(1), Some(Duration::from_secs(30))).unwrap();
    /// assert_eq!(policy.timeout(), Some(Duration::from_secs(30)));
    ///
    /// assert!(WaitPolicy::new(Duration::ZERO, None).is_err());
    /// ```
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::validation("waiting_interval", "must be positive"));
        }
        Ok(Self {
            interval,
            timeout: timeout.filter(|t| !t.is_zero()),
        })
    }

    /// Time slept between two polls.
    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Maximum time to wait, `None` for unbounded.
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_WAITING_INTERVAL,
            timeout: None,
        }
    }
}

/// Source of time for the poll loop.
pub trait Clock: Send + Sync {
    /// Current monotonic instant.
    fn now(&self) -> Instant;

    /// Suspends the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Wall-clock time and real thread sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual clock that only moves when slept on or advanced.
///
/// Sleeps return immediately and are recorded, which makes poll loops
/// deterministic in tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Moves time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    /// Virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }

    /// Every duration passed to [`Clock::sleep`], in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        self.advance(duration);
    }
}

/// Drives the poll loop for a task.
#[derive(Debug, Clone, Default)]
pub struct Poller<C = SystemClock> {
    clock: C,
}

impl<C: Clock> Poller<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Polls `handle` until it reaches a terminal state or `policy` times out.
    ///
    /// `poll` is the task's state RPC. It is called once per iteration and
    /// never concurrently. Returns the final status on `Completed`; the
    /// status of a task that completes on the first poll is returned without
    /// sleeping.
    pub fn wait_for_completion<P>(
        &self,
        handle: &TaskHandle,
        policy: &WaitPolicy,
        mut poll: P,
    ) -> Result<TaskStatus>
    where
        P: FnMut(&TaskHandle) -> Result<TaskStatus>,
    {
        let started = self.clock.now();
        let deadline = policy.timeout().map(|timeout| started + timeout);
        let mut polls = 0u32;

        loop {
            let status = poll(handle)?;
            polls += 1;
            trace!(task = handle.id(), polls, state = ?status.state, progress = ?status.progress, "polled task");

            match status.state {
                TaskState::Completed => {
                    info!(task = handle.id(), kind = ?handle.kind(), polls, "task completed");
                    return Ok(status);
                }
                TaskState::Failed => {
                    let reason = status
                        .reason
                        .unwrap_or_else(|| "no reason reported".to_string());
                    warn!(task = handle.id(), kind = ?handle.kind(), %reason, "task failed");
                    return Err(Error::OperationFailed {
                        task: handle.clone(),
                        reason,
                    });
                }
                TaskState::Pending | TaskState::InProgress => {
                    let now = self.clock.now();
                    if deadline.is_some_and(|deadline| now >= deadline) {
                        let elapsed = now.duration_since(started);
                        warn!(task = handle.id(), polls, ?elapsed, "gave up waiting for task");
                        return Err(Error::OperationTimedOut {
                            task: handle.clone(),
                            elapsed,
                            last_state: status.state,
                        });
                    }
                    debug!(task = handle.id(), state = ?status.state, interval = ?policy.interval(), "task not settled, sleeping");
                    self.clock.sleep(policy.interval());
                }
            }
        }
    }

    /// Starts a task and, in synchronous mode, waits for it.
    ///
    /// In [`WaitMode::Asynchronous`] the handle is returned right after
    /// `start` succeeds and `poll` is never called.
    pub fn submit<S, P>(
        &self,
        mode: WaitMode,
        policy: &WaitPolicy,
        start: S,
        poll: P,
    ) -> Result<TaskOutcome>
    where
        S: FnOnce() -> Result<TaskHandle>,
        P: FnMut(&TaskHandle) -> Result<TaskStatus>,
    {
        let handle = start()?;
        info!(task = handle.id(), kind = ?handle.kind(), collection = handle.collection_name(), ?mode, "task submitted");

        match mode {
            WaitMode::Asynchronous => Ok(TaskOutcome::Running(handle)),
            WaitMode::Synchronous => self
                .wait_for_completion(&handle, policy, poll)
                .map(TaskOutcome::Completed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskKind;
    use crate::transport::TransportError;
    use std::collections::VecDeque;

    fn handle() -> TaskHandle {
        TaskHandle::new(1, TaskKind::Load, "books")
    }

    fn policy(interval_secs: u64, timeout_secs: u64) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_secs(interval_secs),
            Some(Duration::from_secs(timeout_secs)),
        )
        .unwrap()
    }

    /// Poll function that replays `states` and counts calls.
    fn scripted(
        states: Vec<Result<TaskStatus>>,
    ) -> (impl FnMut(&TaskHandle) -> Result<TaskStatus>, Arc<Mutex<u32>>) {
        let calls = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&calls);
        let mut queue: VecDeque<_> = states.into();
        let poll = move |_: &TaskHandle| {
            *counter.lock() += 1;
            queue
                .pop_front()
                .unwrap_or_else(|| Ok(TaskStatus::new(TaskState::InProgress)))
        };
        (poll, calls)
    }

    #[test]
    fn test_completes_after_pending_polls() {
        let clock = ManualClock::new();
        let poller = Poller::new(&clock);
        let (poll, calls) = scripted(vec![
            Ok(TaskStatus::new(TaskState::Pending)),
            Ok(TaskStatus::new(TaskState::Pending)),
            Ok(TaskStatus::new(TaskState::Completed)),
        ]);

        let status = poller
            .wait_for_completion(&handle(), &policy(1, 10), poll)
            .unwrap();

        assert_eq!(status.state, TaskState::Completed);
        assert_eq!(*calls.lock(), 3);
        // Two sleeps between three polls, none after the terminal one.
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(1); 2]);
    }

    #[test]
    fn test_immediate_completion_does_not_sleep() {
        let clock = ManualClock::new();
        let poller = Poller::new(&clock);
        let (poll, calls) = scripted(vec![Ok(TaskStatus::new(TaskState::Completed))]);

        poller
            .wait_for_completion(&handle(), &policy(1, 10), poll)
            .unwrap();

        assert_eq!(*calls.lock(), 1);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_times_out_at_deadline() {
        let clock = ManualClock::new();
        let poller = Poller::new(&clock);
        let (poll, calls) = scripted(vec![]);

        let err = poller
            .wait_for_completion(&handle(), &policy(1, 2), poll)
            .unwrap_err();

        match err {
            Error::OperationTimedOut {
                task,
                elapsed,
                last_state,
            } => {
                assert_eq!(task.id(), 1);
                assert_eq!(elapsed, Duration::from_secs(2));
                assert_eq!(last_state, TaskState::InProgress);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(*calls.lock() <= 3);
    }

    #[test]
    fn test_poll_error_aborts_immediately() {
        let clock = ManualClock::new();
        let poller = Poller::new(&clock);
        let (poll, calls) = scripted(vec![Err(Error::from(TransportError::Unreachable(
            "connection reset".into(),
        )))]);

        let err = poller
            .wait_for_completion(&handle(), &policy(1, 10), poll)
            .unwrap_err();

        assert_eq!(err.code(), crate::ErrorCode::TransportFailed);
        assert_eq!(*calls.lock(), 1);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_server_rejection_during_poll_is_propagated() {
        let poller = Poller::new(ManualClock::new());
        let (poll, calls) = scripted(vec![
            Ok(TaskStatus::new(TaskState::InProgress)),
            Err(Error::ServerRejected {
                code: 28,
                reason: "task not found: 1".into(),
            }),
        ]);

        let err = poller
            .wait_for_completion(&handle(), &policy(1, 10), poll)
            .unwrap_err();

        assert_eq!(err.code(), crate::ErrorCode::ServerRejected);
        assert_eq!(*calls.lock(), 2);
    }

    #[test]
    fn test_failed_task_reports_reason() {
        let poller = Poller::new(ManualClock::new());
        let (poll, _) = scripted(vec![
            Ok(TaskStatus::new(TaskState::InProgress)),
            Ok(TaskStatus::failed("unsupported file format: rows.csv")),
        ]);

        let err = poller
            .wait_for_completion(&handle(), &policy(1, 10), poll)
            .unwrap_err();

        match err {
            Error::OperationFailed { task, reason } => {
                assert_eq!(task.id(), 1);
                assert_eq!(reason, "unsupported file format: rows.csv");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_task_without_reason() {
        let poller = Poller::new(ManualClock::new());
        let (poll, _) = scripted(vec![Ok(TaskStatus::new(TaskState::Failed))]);

        let err = poller
            .wait_for_completion(&handle(), &policy(1, 10), poll)
            .unwrap_err();
        assert!(err.to_string().contains("no reason reported"));
    }

    #[test]
    fn test_unbounded_wait() {
        let clock = ManualClock::new();
        let poller = Poller::new(&clock);
        let mut states: Vec<Result<TaskStatus>> = (0..50)
            .map(|_| Ok(TaskStatus::new(TaskState::InProgress)))
            .collect();
        states.push(Ok(TaskStatus::new(TaskState::Completed)));
        let (poll, calls) = scripted(states);

        let unbounded = WaitPolicy::new(Duration::from_secs(60), None).unwrap();
        poller
            .wait_for_completion(&handle(), &unbounded, poll)
            .unwrap();

        assert_eq!(*calls.lock(), 51);
        assert_eq!(clock.elapsed(), Duration::from_secs(60 * 50));
    }

    #[test]
    fn test_resume_after_timeout() {
        let clock = ManualClock::new();
        let poller = Poller::new(&clock);
        let (mut poll, calls) = scripted(vec![
            Ok(TaskStatus::new(TaskState::InProgress)),
            Ok(TaskStatus::new(TaskState::InProgress)),
            Ok(TaskStatus::new(TaskState::InProgress)),
            Ok(TaskStatus::new(TaskState::Completed)),
        ]);

        let err = poller
            .wait_for_completion(&handle(), &policy(1, 1), &mut poll)
            .unwrap_err();
        let task = err.task().cloned().unwrap();

        let status = poller
            .wait_for_completion(&task, &policy(1, 10), &mut poll)
            .unwrap();
        assert_eq!(status.state, TaskState::Completed);
        assert_eq!(*calls.lock(), 4);
    }

    #[test]
    fn test_submit_async_never_polls() {
        let poller = Poller::new(ManualClock::new());
        let (poll, calls) = scripted(vec![Ok(TaskStatus::new(TaskState::Completed))]);

        let outcome = poller
            .submit(WaitMode::Asynchronous, &policy(1, 10), || Ok(handle()), poll)
            .unwrap();

        assert_eq!(outcome.handle().map(TaskHandle::id), Some(1));
        assert_eq!(*calls.lock(), 0);
    }

    #[test]
    fn test_submit_sync_waits() {
        let poller = Poller::new(ManualClock::new());
        let (poll, calls) = scripted(vec![
            Ok(TaskStatus::new(TaskState::Pending)),
            Ok(TaskStatus::new(TaskState::Completed).with_progress(100)),
        ]);

        let outcome = poller
            .submit(WaitMode::Synchronous, &policy(1, 10), || Ok(handle()), poll)
            .unwrap();

        assert_eq!(
            outcome,
            TaskOutcome::Completed(TaskStatus::new(TaskState::Completed).with_progress(100))
        );
        assert_eq!(*calls.lock(), 2);
    }

    #[test]
    fn test_submit_start_failure_skips_polling() {
        let poller = Poller::new(ManualClock::new());
        let (poll, calls) = scripted(vec![]);

        let err = poller
            .submit(
                WaitMode::Synchronous,
                &policy(1, 10),
                || {
                    Err(Error::ServerRejected {
                        code: 4,
                        reason: "collection not found: books".into(),
                    })
                },
                poll,
            )
            .unwrap_err();

        assert_eq!(err.code(), crate::ErrorCode::ServerRejected);
        assert_eq!(*calls.lock(), 0);
    }

    #[test]
    fn test_wait_policy_validation() {
        let err = WaitPolicy::new(Duration::ZERO, None).unwrap_err();
        assert_eq!(err.field(), Some("waiting_interval"));

        let policy = WaitPolicy::new(Duration::from_millis(10), Some(Duration::ZERO)).unwrap();
        assert_eq!(policy.timeout(), None);

        let default = WaitPolicy::default();
        assert_eq!(default.interval(), DEFAULT_WAITING_INTERVAL);
        assert_eq!(default.timeout(), None);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.advance(Duration::from_secs(3));
        clock.sleep(Duration::from_secs(2));
        assert_eq!(clock.now() - start, Duration::from_secs(5));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(2)]);
    }
}
