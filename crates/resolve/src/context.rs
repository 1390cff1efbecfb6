use crate::error::ErrorKind;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation scope for one batch lookup.
///
/// Cancelling the token or passing the deadline stops every in-flight and
/// not-yet-started identifier; the batch then fails without a summary.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing token, typically a child of a process-wide one.
    pub fn with_token(self, token: CancellationToken) -> Self {
        Self { token, ..self }
    }

    pub fn with_deadline(self, deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..self
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Resolves once the batch must stop, with the reason.
    pub(crate) async fn interrupted(&self) -> ErrorKind {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                () = self.token.cancelled() => ErrorKind::Cancelled,
                () = tokio::time::sleep_until(deadline) => ErrorKind::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ErrorKind::Cancelled
            }
        }
    }
}
