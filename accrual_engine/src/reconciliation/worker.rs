use std::time::Duration;

use accrual_common::Subunits;
use log::*;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::{
    accrual_client::{AccrualOutcome, AccrualSource},
    db_types::{Order, OrderStatusType},
    reconciliation::PassResult,
    traits::{OrderManagement, OrderStoreError, StatusUpdate},
};

/// Production cadence. Local testing typically runs with a much shorter one.
pub const DEFAULT_CADENCE: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy)]
pub struct WorkerOptions {
    /// Time between the start of consecutive passes.
    pub cadence: Duration,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self { cadence: DEFAULT_CADENCE }
    }
}

pub struct ReconciliationWorker<B, S> {
    store: B,
    source: S,
    options: WorkerOptions,
    shutdown: CancellationToken,
}

impl<B, S> ReconciliationWorker<B, S>
where
    B: OrderManagement,
    S: AccrualSource,
{
    pub fn new(store: B, source: S, options: WorkerOptions, shutdown: CancellationToken) -> Self {
        Self { store, source, options, shutdown }
    }

    /// Runs a pass on every tick until the shutdown token is cancelled. The first pass starts immediately.
    ///
    /// A pass that overruns the cadence delays the following ticks rather than bunching them up.
    pub async fn run(self) {
        let mut timer = tokio::time::interval(self.options.cadence);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("🔄️ Reconciliation worker started. Cadence: {:?}", self.options.cadence);
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = timer.tick() => {},
            }
            match self.run_pass().await {
                Ok(result) => info!("🔄️ Reconciliation pass finished. {result}"),
                Err(e) => error!("🔄️ Could not fetch pending orders. Skipping this tick. {e}"),
            }
        }
        info!("🔄️ Reconciliation worker stopped");
    }

    /// Reconciles every pending order once.
    ///
    /// Returns an error only if the list of pending orders could not be read, in which case nothing was written.
    pub async fn run_pass(&self) -> Result<PassResult, OrderStoreError> {
        let orders = self.store.fetch_unprocessed_orders().await?;
        debug!("🔄️ {} orders awaiting reconciliation", orders.len());
        let mut result = PassResult::default();
        for order in orders {
            let outcome = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => None,
                outcome = self.source.lookup(&order.number) => Some(outcome),
            };
            let Some(outcome) = outcome else {
                result.cancelled = true;
                break;
            };
            result.examined += 1;
            match outcome {
                AccrualOutcome::Unknown => {
                    trace!("🔄️ Order {} is not known to the accrual authority yet", order.number);
                    result.unknown += 1;
                },
                AccrualOutcome::TransportFailure(e) => {
                    error!("🔄️ Accrual lookup for order {} failed. {e}", order.number);
                    result.failures += 1;
                },
                AccrualOutcome::RateLimited { retry_after } => {
                    warn!("🔄️ Rate limited by the accrual authority. Pausing for {retry_after:?}");
                    result.rate_limited = true;
                    tokio::select! {
                        biased;
                        _ = self.shutdown.cancelled() => result.cancelled = true,
                        _ = tokio::time::sleep(retry_after) => {},
                    }
                    break;
                },
                AccrualOutcome::Found { status, accrual } => self.apply(&order, status, accrual, &mut result).await,
            }
        }
        Ok(result)
    }

    async fn apply(&self, order: &Order, status: OrderStatusType, accrual: Option<Subunits>, result: &mut PassResult) {
        if order.status == status {
            trace!("🔄️ Order {} is still {status}", order.number);
            result.unchanged += 1;
            return;
        }
        match self.store.update_order_accrual_status(order.id, status, accrual).await {
            Ok(StatusUpdate::Updated { order: updated, accrual }) => {
                debug!(
                    "🔄️ Order {} moved from {} to {}{}",
                    updated.number,
                    order.status,
                    updated.status,
                    accrual.map(|a| format!(" with an accrual of {}", a.amount)).unwrap_or_default()
                );
                result.updated += 1;
            },
            Ok(StatusUpdate::Unchanged(_)) => result.unchanged += 1,
            Err(e) => {
                error!("🔄️ Could not update order {}. It will be retried on the next tick. {e}", order.number);
                result.failures += 1;
            },
        }
    }
}
