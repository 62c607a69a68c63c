//! Graceful shutdown coordination
//!
//! One coordinator per process. Long-running pieces (the interactive session,
//! the shield service) subscribe and wind down when the signal arrives.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, warn};

/// Shutdown signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Graceful,
}

/// Shutdown state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    ShuttingDown,
    Shutdown,
}

/// Graceful shutdown coordinator
pub struct ShutdownCoordinator {
    state: Arc<RwLock<ShutdownState>>,
    shutdown_tx: broadcast::Sender<ShutdownSignal>,
    grace_period: Duration,
}

impl ShutdownCoordinator {
    /// `grace_period` is how long [`shutdown`](Self::shutdown) waits for
    /// subscribers to finish before declaring the process stopped.
    pub fn new(grace_period: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);

        Self {
            state: Arc::new(RwLock::new(ShutdownState::Running)),
            shutdown_tx,
            grace_period,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownSignal> {
        self.shutdown_tx.subscribe()
    }

    /// Broadcast a graceful signal, then wait out the grace period
    pub async fn shutdown(&self) {
        {
            let mut state = self.state.write().await;
            if *state != ShutdownState::Running {
                warn!("Shutdown already in progress");
                return;
            }
            *state = ShutdownState::ShuttingDown;
        }
        info!("Initiating graceful shutdown");

        // No receivers just means nothing is running yet.
        if self.shutdown_tx.send(ShutdownSignal::Graceful).is_err() {
            info!("No components subscribed to shutdown");
        }

        tokio::time::sleep(self.grace_period).await;

        *self.state.write().await = ShutdownState::Shutdown;
        info!("Shutdown complete");
    }

    pub async fn is_shutting_down(&self) -> bool {
        *self.state.read().await != ShutdownState::Running
    }

    pub async fn state(&self) -> ShutdownState {
        *self.state.read().await
    }
}

/// Runs one component until it finishes or a shutdown signal arrives
pub struct ShutdownHandler {
    coordinator: Arc<ShutdownCoordinator>,
    component_name: String,
}

impl ShutdownHandler {
    pub fn new(coordinator: Arc<ShutdownCoordinator>, component_name: impl Into<String>) -> Self {
        Self {
            coordinator,
            component_name: component_name.into(),
        }
    }

    /// Drive `f` to completion unless shutdown is signalled first.
    ///
    /// Returns the component's output, or `None` if it was interrupted.
    pub async fn run<F, Fut, T>(&self, f: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        info!(component = %self.component_name, "Starting component");
        let mut shutdown_rx = self.coordinator.subscribe();

        let output = tokio::select! {
            output = f() => {
                info!(component = %self.component_name, "Component completed normally");
                Some(output)
            }
            signal = shutdown_rx.recv() => {
                match signal {
                    Ok(ShutdownSignal::Graceful) => {
                        info!(component = %self.component_name, "Graceful shutdown signal received");
                    }
                    Err(e) => {
                        error!(component = %self.component_name, error = %e, "Shutdown channel error");
                    }
                }
                None
            }
        };

        info!(component = %self.component_name, "Component stopped");
        output
    }
}

/// Trigger a graceful shutdown on SIGINT or SIGTERM
#[cfg(unix)]
pub fn install_signal_handlers(coordinator: Arc<ShutdownCoordinator>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
        }
        coordinator.shutdown().await;
    });
    Ok(())
}

/// Trigger a graceful shutdown on Ctrl+C
#[cfg(windows)]
pub fn install_signal_handlers(coordinator: Arc<ShutdownCoordinator>) -> std::io::Result<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C");
                coordinator.shutdown().await;
            }
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
        }
    });
    Ok(())
}
