// Cancellation token for scheduled jobs

use tokio::sync::watch;

/// Cancellation signal handed to every execution of a periodic job
///
/// Jobs poll [`CancelToken::is_cancelled`] between units of work; the
/// scheduler loop awaits [`CancelToken::wait`].
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the cancellation signal
    ///
    /// Also returns when the sender is dropped.
    pub async fn wait(&mut self) {
        let _ = self.rx.changed().await;
    }

    /// A token that is never cancelled (manual runs, tests)
    ///
    /// Its sender is already gone, so `wait` returns immediately.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }
}

/// Cancellation sender
pub struct CancelSender {
    tx: watch::Sender<bool>,
}

impl CancelSender {
    /// Signal cancellation to every token of this channel
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a cancellation channel
pub fn cancel_channel() -> (CancelSender, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelSender { tx }, CancelToken { rx })
}
