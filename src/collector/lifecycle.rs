//! Shutdown coordination.

use std::sync::atomic::Ordering;

use crate::error::Result;
use crate::types::Event;

use super::WeatherCollector;

impl WeatherCollector {
    /// Gracefully shut down the collector
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new tasks
    /// 2. Waits for running tasks with a timeout (`task.shutdown_timeout`)
    /// 3. Emits [`Event::Shutdown`]
    ///
    /// Tasks still running after the timeout are left to the runtime; they
    /// are aborted when it drops.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.accepting_new.store(false, Ordering::SeqCst);
        self.tracker.close();
        tracing::info!(active = self.tracker.len(), "Stopped accepting new tasks");

        let shutdown_timeout = self.config.task.shutdown_timeout;
        match tokio::time::timeout(shutdown_timeout, self.tracker.wait()).await {
            Ok(()) => {
                tracing::info!("All weather tasks completed");
            }
            Err(_) => {
                tracing::warn!(
                    remaining = self.tracker.len(),
                    timeout_secs = shutdown_timeout.as_secs(),
                    "Timeout waiting for weather tasks, proceeding with shutdown"
                );
            }
        }

        self.emit_event(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Whether new tasks are accepted
    pub fn is_accepting(&self) -> bool {
        self.accepting_new.load(Ordering::SeqCst)
    }
}
