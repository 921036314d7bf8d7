//! Graceful shutdown handling
//!
//! A termination signal (SIGTERM/SIGINT, or Ctrl+C off unix) flips a watch
//! channel; every server holds a `ShutdownSignal` clone and stops accepting
//! connections once it fires, draining in-flight requests.

use std::fmt;
use tokio::sync::watch;
use tracing::info;

/// Receiving side of the shutdown channel
///
/// Cheap to clone; every clone observes the same trigger.
#[derive(Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Wait until shutdown is triggered
    pub async fn wait(&mut self) {
        while !*self.receiver.borrow() {
            if self.receiver.changed().await.is_err() {
                // Sender dropped, treat as shutdown
                break;
            }
        }
    }

    /// Consume the signal, resolving on shutdown
    ///
    /// Shaped for `with_graceful_shutdown`.
    pub async fn recv(mut self) {
        self.wait().await
    }

    /// Check if shutdown was signaled (non-blocking)
    pub fn is_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Sending side of the shutdown channel
pub struct ShutdownController {
    sender: watch::Sender<bool>,
}

impl ShutdownController {
    /// Trigger shutdown for every signal clone
    pub fn shutdown(&self) {
        let _ = self.sender.send(true);
        info!("Shutdown signal sent");
    }
}

/// Create a new (controller, signal) pair
pub fn shutdown_channel() -> (ShutdownController, ShutdownSignal) {
    let (sender, receiver) = watch::channel(false);
    (ShutdownController { sender }, ShutdownSignal { receiver })
}

/// OS signal that ended the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Terminate,
    Interrupt,
    CtrlC,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerminationSignal::Terminate => "SIGTERM",
            TerminationSignal::Interrupt => "SIGINT",
            TerminationSignal::CtrlC => "CTRL_C",
        };
        f.write_str(name)
    }
}

/// Wait for SIGTERM or SIGINT
///
/// Fails only if the signal handlers cannot be registered.
#[cfg(unix)]
pub async fn wait_for_signal() -> std::io::Result<TerminationSignal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let received = tokio::select! {
        _ = sigterm.recv() => TerminationSignal::Terminate,
        _ = sigint.recv() => TerminationSignal::Interrupt,
    };
    info!(signal = %received, "Received termination signal");
    Ok(received)
}

/// Wait for Ctrl+C (non-unix)
#[cfg(not(unix))]
pub async fn wait_for_signal() -> std::io::Result<TerminationSignal> {
    tokio::signal::ctrl_c().await?;
    info!(signal = %TerminationSignal::CtrlC, "Received termination signal");
    Ok(TerminationSignal::CtrlC)
}

/// Trigger `controller` when a termination signal arrives
///
/// Spawned by each binary's `main`.
pub async fn shutdown_on_signal(controller: ShutdownController) {
    match wait_for_signal().await {
        Ok(_) => controller.shutdown(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to register signal handlers, shutting down");
            controller.shutdown();
        }
    }
}
