//! Periodic expiration sweep.
//!
//! A failed sweep is not retried early; it runs again at the next tick.

use crate::engine::{CleanupReport, StorageEngine};
use crate::error::EngineResult;
use aqua_core::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Time between two sweeps.
    pub interval: Duration,
    /// Sweep once as soon as the service starts instead of waiting a full
    /// interval.
    pub run_on_startup: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15 * 60),
            run_on_startup: true,
        }
    }
}

impl From<&Config> for CleanupConfig {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.expiration_cycle(),
            run_on_startup: config.cleanup_on_startup,
        }
    }
}

pub struct CleanupService {
    engine: StorageEngine,
    config: CleanupConfig,
}

impl CleanupService {
    pub fn new(engine: StorageEngine, config: CleanupConfig) -> Self {
        Self { engine, config }
    }

    /// Run one sweep and log its outcome.
    pub async fn run_once(&self) -> EngineResult<CleanupReport> {
        tracing::info!("Starting scheduled cleanup of expired files");
        match self.engine.cleanup().await {
            Ok(report) => {
                if report.failed > 0 {
                    tracing::warn!(
                        deleted = report.deleted,
                        failed = report.failed,
                        "Cleanup finished with failures"
                    );
                }
                Ok(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "Cleanup task failed");
                Err(e)
            }
        }
    }

    /// Start the background sweep loop.
    ///
    /// The returned handle stops the loop; a sweep in progress is allowed to
    /// finish first.
    pub fn start(self: Arc<Self>) -> CleanupHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let join = tokio::spawn(async move {
            // tokio intervals reject a zero period.
            let period = self.config.interval.max(Duration::from_millis(1));
            let first_tick = if self.config.run_on_startup {
                Instant::now()
            } else {
                Instant::now() + period
            };
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::info!(
                interval_secs = period.as_secs(),
                run_on_startup = self.config.run_on_startup,
                "Cleanup service started"
            );

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Cleanup service shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let _ = self.run_once().await;
                    }
                }
            }
        });

        CleanupHandle { shutdown_tx, join }
    }
}

/// Handle to a running [`CleanupService`].
pub struct CleanupHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl CleanupHandle {
    /// Signal the loop to stop and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.join.await {
            tracing::error!(error = %e, "Cleanup task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
