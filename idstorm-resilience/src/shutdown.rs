//! Run cancellation coordination
//!
//! A run is cancelled once (user interrupt, deadline). Cancellation is
//! level-triggered: listeners that subscribe after the trigger still observe
//! it, so the driver can check between rounds and also race it against the
//! in-flight work.

use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// Shutdown coordinator shared by the CLI signal handler and the driver
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to the cancellation signal
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            receiver: self.sender.subscribe(),
        }
    }

    /// Check if shutdown was requested
    pub fn is_shutting_down(&self) -> bool {
        *self.sender.borrow()
    }

    /// Request shutdown. Returns an error if it was already requested.
    pub fn shutdown(&self) -> Result<(), ShutdownError> {
        let changed = self.sender.send_if_modified(|requested| {
            if *requested {
                false
            } else {
                *requested = true;
                true
            }
        });

        if changed {
            info!("Shutdown requested, no further operations will be dispatched");
            Ok(())
        } else {
            Err(ShutdownError::AlreadyShuttingDown)
        }
    }

    /// Trigger shutdown on the first Ctrl-C.
    ///
    /// Must be called from within a tokio runtime.
    pub fn install_ctrl_c_handler(&self) -> tokio::task::JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    warn!("Interrupt received, cancelling run");
                    let _ = coordinator.shutdown();
                }
                Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
            }
        })
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of the cancellation signal
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    receiver: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// A listener that is never triggered
    pub fn never() -> Self {
        let (sender, receiver) = watch::channel(false);
        // Keep the value observable after the sender is gone
        drop(sender);
        Self { receiver }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once shutdown is requested; pends forever if it never is
    pub async fn cancelled(&mut self) {
        if self.receiver.wait_for(|requested| *requested).await.is_err() {
            // Sender dropped without a shutdown request
            std::future::pending::<()>().await;
        }
    }
}

/// Shutdown error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShutdownError {
    #[error("Shutdown already in progress")]
    AlreadyShuttingDown,
}
