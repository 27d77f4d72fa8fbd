//! Maintenance scheduler
//!
//! Runs the retention sweep on a fixed interval in the background.

use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};

use crate::error::DbResult;
use crate::executors::TransactionExecutor;
use crate::statement::StatementOutcome;

use super::RetentionPolicy;

/// Maintenance scheduler
///
/// One instance is created at startup and runs for the lifetime of the
/// process. It holds no cross-tick state: every tick submits the same
/// self-contained sweep transaction.
pub struct MaintenanceScheduler {
    executor: TransactionExecutor,
    policy: RetentionPolicy,
    sweep_interval: Duration,
}

impl MaintenanceScheduler {
    /// Create a new maintenance scheduler
    pub fn new(
        executor: TransactionExecutor,
        policy: RetentionPolicy,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            executor,
            policy,
            sweep_interval,
        }
    }

    /// Run the sweep loop (background task)
    ///
    /// The first sweep fires immediately, then one per interval. A failed
    /// sweep is logged and never stops the loop; the next tick simply tries
    /// again. Should be spawned in `tokio::spawn`; cancelling the task at
    /// process shutdown is the only way the loop ends.
    pub async fn run(self) {
        info!(
            interval_secs = self.sweep_interval.as_secs(),
            verification_grace_days = self.policy.verification_grace_days,
            reset_grace_days = self.policy.reset_grace_days,
            "maintenance scheduler started"
        );

        let mut tick = interval(self.sweep_interval);

        loop {
            tick.tick().await;

            match self.sweep().await {
                Ok(outcomes) => {
                    let rows_affected: u64 = outcomes.iter().map(|o| o.rows_affected).sum();
                    info!(
                        statements = outcomes.len(),
                        rows_affected, "retention sweep completed"
                    );
                }
                Err(e) => {
                    error!(error = %e, "retention sweep failed");
                }
            }
        }
    }

    /// Run one sweep immediately (also used for manual triggering)
    pub async fn sweep(&self) -> DbResult<Vec<StatementOutcome>> {
        self.executor.run(self.policy.sweep_statements()).await
    }
}
