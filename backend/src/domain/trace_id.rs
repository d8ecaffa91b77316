//! Request-scoped trace identifier shared by logs and error payloads.
//!
//! The identifier lives in tokio task-local storage. Task locals are not
//! inherited by spawned or blocking tasks, so work moved off the request task
//! must re-enter the scope explicitly with [`TraceId::scope`] or
//! [`TraceId::in_blocking`].

use std::future::Future;

use tokio::task::JoinError;
use tokio::task_local;
use uuid::Uuid;

task_local! {
    pub(crate) static TRACE_ID: TraceId;
}

/// Per-request trace identifier exposed via task-local storage.
///
/// # Examples
/// ```
/// use rental_ledger::TraceId;
///
/// async fn handler() {
///     if let Some(id) = TraceId::current() {
///         tracing::info!(trace_id = %id, "handling rental request");
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Generate a new random trace identifier.
    #[must_use]
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct a trace identifier from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the current trace identifier if one is in scope.
    #[must_use]
    pub fn current() -> Option<Self> {
        TRACE_ID.try_with(|id| *id).ok()
    }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Execute the provided future with the supplied trace identifier in scope.
    ///
    /// # Examples
    /// ```
    /// use rental_ledger::TraceId;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let trace_id: TraceId = "00000000-0000-0000-0000-000000000000"
    ///     .parse()
    ///     .expect("valid UUID");
    /// let observed = TraceId::scope(trace_id, async move { TraceId::current() }).await;
    /// assert_eq!(observed, Some(trace_id));
    /// # });
    /// ```
    pub async fn scope<Fut>(trace_id: TraceId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }

    /// Run CPU-bound work on the blocking pool, carrying the active trace
    /// identifier into the closure.
    pub async fn in_blocking<F, T>(work: F) -> Result<T, JoinError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        match Self::current() {
            Some(id) => {
                tokio::task::spawn_blocking(move || TRACE_ID.sync_scope(id, work)).await
            }
            None => tokio::task::spawn_blocking(work).await,
        }
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn current_reflects_scope() {
        let expected = TraceId::generate();
        let observed = TraceId::scope(expected, async move { TraceId::current() }).await;
        assert_eq!(observed, Some(expected));
    }

    #[tokio::test]
    async fn current_is_none_out_of_scope() {
        assert!(TraceId::current().is_none());
    }

    #[test]
    fn from_str_rejects_garbage() {
        assert!("not-a-uuid".parse::<TraceId>().is_err());
    }

    #[tokio::test]
    async fn blocking_work_sees_the_request_trace_id() {
        let expected = TraceId::from_uuid(Uuid::new_v4());
        let observed = TraceId::scope(expected, async {
            TraceId::in_blocking(TraceId::current).await
        })
        .await
        .expect("blocking task joins");
        assert_eq!(observed, Some(expected));
    }

    #[tokio::test]
    async fn blocking_work_without_scope_has_no_trace_id() {
        let observed = TraceId::in_blocking(TraceId::current)
            .await
            .expect("blocking task joins");
        assert_eq!(observed, None);
    }
}
