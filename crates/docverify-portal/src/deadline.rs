//! Overall time budget for one lookup.
//!
//! Every network step runs under the same [`Deadline`]. When it expires the
//! step's future is dropped, which aborts the in-flight request.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::PortalError;

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Option<Instant>,
    budget: Duration,
}

impl Deadline {
    /// A deadline that never expires.
    #[must_use]
    pub fn none() -> Self {
        Self {
            expires_at: None,
            budget: Duration::ZERO,
        }
    }

    /// Expires `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Some(Instant::now() + budget),
            budget,
        }
    }

    #[must_use]
    pub fn from_budget(budget: Option<Duration>) -> Self {
        budget.map_or_else(Self::none, Self::after)
    }

    /// Runs `step`, failing with [`PortalError::DeadlineExceeded`] if the
    /// deadline passes first.
    ///
    /// # Errors
    ///
    /// Returns the step's own error, or `DeadlineExceeded` on expiry.
    pub async fn run<T, F>(&self, step: F) -> Result<T, PortalError>
    where
        F: Future<Output = Result<T, PortalError>>,
    {
        let Some(at) = self.expires_at else {
            return step.await;
        };
        tokio::time::timeout_at(at, step)
            .await
            .map_err(|_| {
                tracing::warn!(budget_secs = self.budget.as_secs(), "lookup deadline exceeded");
                PortalError::DeadlineExceeded {
                    budget_secs: self.budget.as_secs(),
                }
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn none_never_expires() {
        let deadline = Deadline::none();
        assert!(deadline.expires_at.is_none());
        let value = deadline.run(async { Ok::<_, PortalError>(7) }).await;
        assert_eq!(value.expect("no deadline"), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_step_is_cancelled() {
        let deadline = Deadline::after(Duration::from_secs(2));
        let result = deadline
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, PortalError>(())
            })
            .await;
        assert!(
            matches!(result, Err(PortalError::DeadlineExceeded { budget_secs: 2 })),
            "expected DeadlineExceeded, got: {result:?}"
        );
        assert!(deadline.expires_at.is_some_and(|at| Instant::now() >= at));
    }

    #[tokio::test]
    async fn step_error_passes_through() {
        let deadline = Deadline::after(Duration::from_secs(30));
        let result: Result<(), _> = deadline.run(async { Err(PortalError::EmptyCode) }).await;
        assert!(matches!(result, Err(PortalError::EmptyCode)));
    }
}
