//! Request-scoped context and bounded fan-out execution.
//!
//! - `RequestContext` carries a correlation id and a cancellation token
//!   across every port call.
//! - `WorkerPool` runs one task per input with a concurrency cap and
//!   returns results in input order, regardless of completion order.
//!
//! Cancellation is best-effort: tasks waiting for a permit never start,
//! in-flight tasks are aborted when the caller observes cancellation.

use crate::{ErrorClass, ErrorCode, ErrorEnvelope, Result};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;

/// A correlation identifier used for logging/telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Parse a correlation identifier from user input.
    ///
    /// The value is trimmed; empty values are rejected.
    pub fn parse(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "correlationId must be non-empty",
            ));
        }
        Ok(Self(Arc::<str>::from(trimmed)))
    }

    /// Create a new request id, best-effort unique within this process.
    #[must_use]
    pub fn new_request_id() -> Self {
        let n = REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(Arc::<str>::from(format!("req_{n}")))
    }

    /// Borrow the identifier as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A clonable cancellation token that can be awaited.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationState>,
}

#[derive(Debug)]
struct CancellationState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    /// Create a new token in the non-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationState {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Cancel the token and wake all current waiters.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    /// Returns true if the token has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Wait until the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Request-scoped context passed across boundaries.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: CorrelationId,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Create a new request context with a fresh cancellation token.
    #[must_use]
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            cancellation: CancellationToken::new(),
        }
    }

    /// Create a context with an auto-generated `req_*` id.
    #[must_use]
    pub fn new_request() -> Self {
        Self::new(CorrelationId::new_request_id())
    }

    /// Create a context sharing an existing cancellation token.
    #[must_use]
    pub const fn with_cancellation(
        correlation_id: CorrelationId,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            correlation_id,
            cancellation,
        }
    }

    /// Return the correlation id.
    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Return a clone of the cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Returns true if the request was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Cancel this request.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Await cancellation.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }

    /// Return a cancellation error when cancelled, including operation metadata.
    pub fn ensure_not_cancelled(&self, operation: &'static str) -> Result<()> {
        if self.is_cancelled() {
            return Err(cancelled_error(operation));
        }
        Ok(())
    }
}

fn cancelled_error(operation: &'static str) -> ErrorEnvelope {
    ErrorEnvelope::cancelled("operation cancelled").with_metadata("operation", operation)
}

/// Options for the worker pool.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPoolOptions {
    /// Maximum number of tasks running at once.
    pub concurrency: usize,
}

/// Bounded, order-preserving fan-out executor.
///
/// Each input becomes its own tokio task so independent network calls run
/// in parallel; a semaphore caps how many run at once.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    ctx: RequestContext,
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    /// Create a new worker pool bound to the provided `RequestContext`.
    pub fn new(ctx: RequestContext, options: WorkerPoolOptions) -> Result<Self> {
        if options.concurrency == 0 {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "concurrency must be a positive number",
            ));
        }

        Ok(Self {
            ctx,
            permits: Arc::new(Semaphore::new(options.concurrency)),
        })
    }

    /// Apply an async function over inputs and wait for every task.
    ///
    /// Results are returned in input order. The first task error (by input
    /// order) is returned; callers that must tolerate per-item failures
    /// should use [`WorkerPool::map_settled`] instead.
    pub async fn map<TIn, TOut, Fut, F>(&self, inputs: Vec<TIn>, f: F) -> Result<Vec<TOut>>
    where
        TIn: Send + 'static,
        TOut: Send + 'static,
        Fut: Future<Output = Result<TOut>> + Send + 'static,
        F: Fn(TIn, usize) -> Fut + Send + Sync + 'static,
    {
        self.ctx.ensure_not_cancelled("worker_pool.map")?;

        let mut out = Vec::with_capacity(inputs.len());
        let mut pending = self.spawn_all(inputs, f).into_iter();
        while let Some(handle) = pending.next() {
            match self.join(handle, "worker_pool.map.await").await.and_then(|settled| settled) {
                Ok(value) => out.push(value),
                Err(error) => {
                    pending.by_ref().for_each(|rest| rest.abort());
                    return Err(error);
                },
            }
        }
        Ok(out)
    }

    /// Apply an async function over inputs and keep every task's result.
    ///
    /// Each slot holds its own task's result in input order; a task error or
    /// panic settles only that slot. Cancellation of the pool context still
    /// fails the whole call.
    pub async fn map_settled<TIn, TOut, Fut, F>(
        &self,
        inputs: Vec<TIn>,
        f: F,
    ) -> Result<Vec<Result<TOut>>>
    where
        TIn: Send + 'static,
        TOut: Send + 'static,
        Fut: Future<Output = Result<TOut>> + Send + 'static,
        F: Fn(TIn, usize) -> Fut + Send + Sync + 'static,
    {
        self.ctx.ensure_not_cancelled("worker_pool.map_settled")?;

        let mut out = Vec::with_capacity(inputs.len());
        let mut pending = self.spawn_all(inputs, f).into_iter();
        while let Some(handle) = pending.next() {
            match self.join(handle, "worker_pool.map_settled.await").await {
                Ok(settled) => out.push(settled),
                Err(error) => {
                    pending.by_ref().for_each(|rest| rest.abort());
                    return Err(error);
                },
            }
        }
        self.ctx.ensure_not_cancelled("worker_pool.map_settled")?;
        Ok(out)
    }

    fn spawn_all<TIn, TOut, Fut, F>(&self, inputs: Vec<TIn>, f: F) -> Vec<JoinHandle<Result<TOut>>>
    where
        TIn: Send + 'static,
        TOut: Send + 'static,
        Fut: Future<Output = Result<TOut>> + Send + 'static,
        F: Fn(TIn, usize) -> Fut + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        inputs
            .into_iter()
            .enumerate()
            .map(|(index, input)| {
                let ctx = self.ctx.clone();
                let permits = Arc::clone(&self.permits);
                let f = Arc::clone(&f);
                tokio::spawn(async move {
                    let _permit = tokio::select! {
                        () = ctx.cancelled() => return Err(cancelled_error("worker_pool.map.acquire")),
                        permit = permits.acquire_owned() => permit.map_err(|_| {
                            ErrorEnvelope::unexpected(
                                ErrorCode::internal(),
                                "worker pool semaphore closed",
                                ErrorClass::NonRetriable,
                            )
                        })?,
                    };
                    ctx.ensure_not_cancelled("worker_pool.map.task")?;
                    f(input, index).await
                })
            })
            .collect()
    }

    /// Wait for one task. The outer error is cancellation only; a panicked
    /// or aborted task settles as an internal error.
    async fn join<TOut>(
        &self,
        mut handle: JoinHandle<Result<TOut>>,
        operation: &'static str,
    ) -> Result<Result<TOut>> {
        let joined = tokio::select! {
            () = self.ctx.cancelled() => {
                handle.abort();
                return Err(cancelled_error(operation));
            }
            joined = &mut handle => joined,
        };
        Ok(joined.unwrap_or_else(|join_error| {
            Err(ErrorEnvelope::unexpected(
                ErrorCode::internal(),
                format!("worker_pool task failed: {join_error}"),
                ErrorClass::NonRetriable,
            ))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn map_preserves_input_order() -> Result<()> {
        let pool = WorkerPool::new(
            RequestContext::new_request(),
            WorkerPoolOptions { concurrency: 4 },
        )?;

        let out = pool
            .map(vec![1u64, 2, 3, 4], |value, index| async move {
                // Later inputs finish first.
                let delay = (4 - index as u64) * 10;
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(value * 10)
            })
            .await?;

        assert_eq!(out, vec![10, 20, 30, 40]);
        Ok(())
    }

    #[tokio::test]
    async fn map_never_exceeds_concurrency() -> Result<()> {
        let pool = WorkerPool::new(
            RequestContext::new_request(),
            WorkerPoolOptions { concurrency: 2 },
        )?;
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let running_in = Arc::clone(&running);
        let peak_in = Arc::clone(&peak);
        let out = pool
            .map((0..8).collect::<Vec<u32>>(), move |value, _| {
                let running = Arc::clone(&running_in);
                let peak = Arc::clone(&peak_in);
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(value)
                }
            })
            .await?;

        assert_eq!(out.len(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
        Ok(())
    }

    #[tokio::test]
    async fn map_surfaces_first_error_in_input_order() -> Result<()> {
        let pool = WorkerPool::new(
            RequestContext::new_request(),
            WorkerPoolOptions { concurrency: 3 },
        )?;

        let result = pool
            .map(vec![0u32, 1, 2], |value, _| async move {
                if value == 1 {
                    Err(ErrorEnvelope::expected(ErrorCode::invalid_input(), "one"))
                } else {
                    Ok(value)
                }
            })
            .await;

        assert!(matches!(result, Err(ref error) if error.message == "one"));
        Ok(())
    }

    #[tokio::test]
    #[allow(clippy::panic, reason = "exercises a panicking task")]
    async fn map_settled_keeps_failures_in_their_own_slot() -> Result<()> {
        let pool = WorkerPool::new(
            RequestContext::new_request(),
            WorkerPoolOptions { concurrency: 3 },
        )?;

        let out = pool
            .map_settled(vec![0u32, 1, 2], |value, _| async move {
                match value {
                    1 => panic!("task blew up"),
                    2 => Err(ErrorEnvelope::expected(ErrorCode::invalid_input(), "two")),
                    _ => Ok(value),
                }
            })
            .await?;

        assert_eq!(out.len(), 3);
        assert!(matches!(out[0], Ok(0)));
        assert!(matches!(out[1], Err(ref error) if error.code == ErrorCode::internal()));
        assert!(matches!(out[2], Err(ref error) if error.message == "two"));
        Ok(())
    }

    #[tokio::test]
    async fn map_settled_fails_when_cancelled() -> Result<()> {
        let ctx = RequestContext::new_request();
        let pool = WorkerPool::new(ctx.clone(), WorkerPoolOptions { concurrency: 1 })?;
        ctx.cancel();

        let result = pool
            .map_settled(vec![1u32], |value, _| async move { Ok(value) })
            .await;
        assert!(matches!(result, Err(ref error) if error.is_cancelled()));
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_context_rejects_work() -> Result<()> {
        let ctx = RequestContext::new_request();
        let pool = WorkerPool::new(ctx.clone(), WorkerPoolOptions { concurrency: 1 })?;
        ctx.cancel();

        let result = pool.map(vec![1u32], |value, _| async move { Ok(value) }).await;
        assert!(matches!(result, Err(ref error) if error.is_cancelled()));
        Ok(())
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let result = WorkerPool::new(
            RequestContext::new_request(),
            WorkerPoolOptions { concurrency: 0 },
        );
        assert!(result.is_err());
    }

    #[test]
    fn correlation_ids_are_trimmed_and_non_empty() -> Result<()> {
        let id = CorrelationId::parse("  abc-123 ")?;
        assert_eq!(id.as_str(), "abc-123");
        assert!(CorrelationId::parse("   ").is_err());
        assert!(CorrelationId::new_request_id().as_str().starts_with("req_"));
        Ok(())
    }
}
