//! Cancellation and deadline handling for one consultation.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A cancellation token paired with an optional wall-clock deadline.
///
/// Cloning shares the token, so cancelling any clone interrupts every
/// specialist working on the same consultation.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Interrupt {
    /// Creates an interrupt from a token and an optional deadline.
    #[must_use]
    pub const fn new(token: CancellationToken, deadline: Option<Instant>) -> Self {
        Self { token, deadline }
    }

    /// Creates an interrupt that fires when `token` is cancelled or
    /// `timeout` elapses, whichever comes first.
    #[must_use]
    pub fn with_timeout(token: CancellationToken, timeout: Duration) -> Self {
        Self::new(token, Instant::now().checked_add(timeout))
    }

    /// The underlying cancellation token.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` once cancelled or past the deadline.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Completes when the interrupt fires.
    pub async fn triggered(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.token.cancelled() => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Drives `future` until it completes or the interrupt fires.
    ///
    /// Returns `None` if interrupted; the future is dropped at its
    /// current suspension point.
    pub async fn race<F: Future>(&self, future: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            () = self.triggered() => None,
            output = future => Some(output),
        }
    }
}
