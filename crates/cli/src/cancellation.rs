//! CLI cancellation utilities.
//!
//! Responsibilities:
//! - Provide a cloneable cancellation token fired by Ctrl+C.
//! - Define the `Cancelled` error used to signal user-initiated cancellation
//!   through `anyhow::Result`.
//!
//! Does NOT handle:
//! - Deciding *when* to check for cancellation; commands race their network
//!   work against [`CancellationToken::cancelled`].
//!
//! Invariants:
//! - Once cancelled, a token remains cancelled forever.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::Notify;

/// Cancellation token usable across async tasks.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token (idempotent).
    pub fn cancel(&self) {
        let was_cancelled = self.cancelled.swap(true, Ordering::SeqCst);
        if !was_cancelled {
            self.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Await cancellation.
    ///
    /// The `notified()` future is created before the flag is checked so a
    /// concurrent `cancel()` cannot be missed.
    pub async fn cancelled(&self) {
        let notified = self.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    /// Cancel this token on the first Ctrl+C.
    pub fn cancel_on_ctrl_c(&self) {
        let token = self.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("Failed to listen for Ctrl+C: {}", e);
                return;
            }
            token.cancel();
        });
    }
}

/// Marker error used to indicate user-driven cancellation.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("cancelled")]
pub struct Cancelled;

/// Returns true if this anyhow error represents a cancellation.
pub fn is_cancelled_error(err: &anyhow::Error) -> bool {
    err.is::<Cancelled>()
}

/// Print the standard cancellation message to stderr.
pub fn print_cancelled_message() {
    eprintln!("^C\nOperation cancelled by user");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_waiter() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_returns_immediately_once_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancel();
        token.cancelled().await;
    }

    #[test]
    fn test_is_cancelled_error() {
        assert!(is_cancelled_error(&anyhow::Error::new(Cancelled)));
        assert!(!is_cancelled_error(&anyhow::anyhow!("other")));
    }
}
