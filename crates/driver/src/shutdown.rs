//! Cancellation signal shared between the drivers and the game player.

use tokio::sync::watch;

/// Creates a connected [ShutdownHandle] and [Shutdown] pair.
pub fn shutdown_channel() -> (ShutdownHandle, Shutdown) {
    let (sender, receiver) = watch::channel(false);
    (ShutdownHandle(sender), Shutdown(receiver))
}

/// Triggers every [Shutdown] created from the same channel.
#[derive(Debug)]
pub struct ShutdownHandle(watch::Sender<bool>);

impl ShutdownHandle {
    /// Signals shutdown.
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }
}

/// The receiving side of the shutdown signal.
#[derive(Debug, Clone)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    /// Returns `true` if shutdown has been signalled.
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once shutdown has been signalled. Never resolves if the [ShutdownHandle] is
    /// dropped without triggering.
    pub async fn cancelled(&self) {
        let mut receiver = self.0.clone();
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
