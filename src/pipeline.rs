use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::{
    batch::partition,
    config::DispatchConfig,
    dispatch::{Dispatcher, RemoteCall},
    error::Result,
    model::{ItemResult, WorkItem}
};

/// Everything one run produced, results aligned with `items`.
#[derive(Debug)]
pub struct RunReport<T> {
    pub run_id: Uuid,
    pub items: Vec<WorkItem>,
    pub results: Vec<ItemResult<T>>,
    pub elapsed: Duration
}

impl<T> RunReport<T> {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.is_err()).count()
    }
}

/// Partitions `items` by `config.batch_size` and dispatches them to `remote`
/// under the configured strategy and failure policy.
pub async fn run<C: RemoteCall>(
    remote: C,
    config: &DispatchConfig,
    items: Vec<WorkItem>
) -> Result<RunReport<C::Output>> {
    config.validate()?;
    let run_id = Uuid::new_v4();
    let span = info_span!("run", %run_id, strategy = %config.strategy, policy = %config.failure_policy);
    execute(remote, config, items, run_id).instrument(span).await
}

async fn execute<C: RemoteCall>(
    remote: C,
    config: &DispatchConfig,
    items: Vec<WorkItem>,
    run_id: Uuid
) -> Result<RunReport<C::Output>> {
    let start = Instant::now();
    let batches = partition(items.clone(), config.batch_size)?;
    info!(
        "dispatching {} items in {} batches (batch_size {}, max_concurrency {})",
        items.len(), batches.len(), config.batch_size, config.max_concurrency
    );

    let dispatcher = Dispatcher::from_config(remote, config)?;
    let results = dispatcher.run(batches).await?;
    let report = RunReport {
        run_id,
        items,
        results,
        elapsed: start.elapsed()
    };
    info!("run finished with {} results, {} failed", report.results.len(), report.failures());
    Ok(report)
}
