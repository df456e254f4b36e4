use accrual_engine::{AccrualSource, OrderManagement, ReconciliationWorker, WorkerOptions};
use log::*;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Starts the reconciliation worker. It runs until `shutdown` is cancelled, and the returned JoinHandle resolves once
/// the worker has finished (or abandoned) the order it was working on.
pub fn start_reconciliation_worker<B, S>(
    store: B,
    source: S,
    options: WorkerOptions,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    B: OrderManagement + 'static,
    S: AccrualSource + 'static,
{
    info!("🕰️ Starting reconciliation worker. Polling every {}s", options.cadence.as_secs());
    let worker = ReconciliationWorker::new(store, source, options, shutdown);
    tokio::spawn(worker.run())
}
