use std::{future::Future, sync::Arc};

use tokio::{
    sync::Semaphore,
    task::JoinSet
};
use tracing::{debug, warn, Instrument};

use crate::{
    config::{DispatchConfig, FailurePolicy, Strategy},
    error::{Error, Result},
    model::{Batch, Failure, ItemResult}
};

/// The remote collaborator a batch is sent to.
///
/// Implementations return one output per item of the batch, in item order,
/// or fail for the batch as a whole.
pub trait RemoteCall: Send + Sync + 'static {
    type Output: Send + 'static;

    fn dispatch(&self, batch: &Batch) -> impl Future<Output = Result<Vec<Self::Output>>> + Send;
}

/// Runs batches against a [`RemoteCall`] with at most `max_concurrency`
/// calls in flight, returning per-item results in input order.
pub struct Dispatcher<C: RemoteCall> {
    remote: Arc<C>,
    max_concurrency: usize,
    strategy: Strategy,
    policy: FailurePolicy
}

struct BatchOutcome<T> {
    slot: usize,
    batch: usize,
    len: usize,
    result: Result<Vec<T>>
}

impl<C: RemoteCall> Dispatcher<C> {
    pub fn new(
        remote: C,
        max_concurrency: usize,
        strategy: Strategy,
        policy: FailurePolicy
    ) -> Result<Self> {
        Self::with_shared(Arc::new(remote), max_concurrency, strategy, policy)
    }

    pub fn from_config(remote: C, config: &DispatchConfig) -> Result<Self> {
        Self::new(remote, config.max_concurrency, config.strategy, config.failure_policy)
    }

    /// Builds a dispatcher around a collaborator the caller keeps a handle to.
    pub fn with_shared(
        remote: Arc<C>,
        max_concurrency: usize,
        strategy: Strategy,
        policy: FailurePolicy
    ) -> Result<Self> {
        if max_concurrency == 0 {
            return Err(Error::invalid_config("max_concurrency must be at least 1"));
        }
        Ok(Dispatcher {
            remote,
            max_concurrency,
            strategy,
            policy
        })
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub async fn run(&self, batches: Vec<Batch>) -> Result<Vec<ItemResult<C::Output>>> {
        let mut slots: Vec<Option<Vec<ItemResult<C::Output>>>> = Vec::with_capacity(batches.len());
        slots.resize_with(batches.len(), || None);

        match self.strategy {
            Strategy::Windowed => self.run_windowed(batches, &mut slots).await?,
            Strategy::Gated => self.run_gated(batches, &mut slots).await?
        }

        Ok(slots.into_iter().flatten().flatten().collect())
    }

    async fn run_windowed(
        &self,
        batches: Vec<Batch>,
        slots: &mut [Option<Vec<ItemResult<C::Output>>>]
    ) -> Result<()> {
        let mut pending = batches.into_iter().enumerate().peekable();
        while pending.peek().is_some() {
            let mut set = JoinSet::new();
            for (slot, batch) in pending.by_ref().take(self.max_concurrency) {
                let remote = Arc::clone(&self.remote);
                set.spawn(
                    async move { call_remote(remote.as_ref(), slot, batch).await }.in_current_span()
                );
            }
            // the whole window resolves before the next one starts.
            self.drain(&mut set, slots).await?;
        }
        Ok(())
    }

    async fn run_gated(
        &self,
        batches: Vec<Batch>,
        slots: &mut [Option<Vec<ItemResult<C::Output>>>]
    ) -> Result<()> {
        let gate = Arc::new(Semaphore::new(self.max_concurrency));
        let mut set = JoinSet::new();
        for (slot, batch) in batches.into_iter().enumerate() {
            let remote = Arc::clone(&self.remote);
            let gate = Arc::clone(&gate);
            set.spawn(async move {
                // held until the call resolves, released on every exit path.
                let _permit = match gate.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return BatchOutcome {
                        slot,
                        batch: batch.index,
                        len: batch.len(),
                        result: Err(Error::remote(format!("admission gate closed: {}", e)))
                    }
                };
                call_remote(remote.as_ref(), slot, batch).await
            }.in_current_span());
        }
        self.drain(&mut set, slots).await
    }

    async fn drain(
        &self,
        set: &mut JoinSet<BatchOutcome<C::Output>>,
        slots: &mut [Option<Vec<ItemResult<C::Output>>>]
    ) -> Result<()> {
        while let Some(joined) = set.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    set.shutdown().await;
                    return Err(Error::from(e));
                }
            };
            match outcome.result {
                Ok(values) => {
                    slots[outcome.slot] = Some(values.into_iter().map(Ok).collect());
                }
                // only remote failures are subject to the policy, anything else aborts.
                Err(e) => match self.policy {
                    FailurePolicy::BestEffort if e.is_remote_failure() => {
                        warn!("batch {} failed, recording {} failed items: {}", outcome.batch, outcome.len, e);
                        let failure = Failure::new(outcome.batch, &e.to_string());
                        slots[outcome.slot] = Some((0..outcome.len).map(|_| Err(failure.clone())).collect());
                    }
                    _ => {
                        warn!("batch {} failed, aborting {} outstanding: {}", outcome.batch, set.len(), e);
                        set.shutdown().await;
                        return Err(e);
                    }
                }
            }
        }
        Ok(())
    }
}

async fn call_remote<C: RemoteCall>(remote: &C, slot: usize, batch: Batch) -> BatchOutcome<C::Output> {
    let len = batch.len();
    debug!("batch {} started ({} items)", batch.index, len);
    let result = match remote.dispatch(&batch).await {
        Ok(values) if values.len() != len => Err(Error::remote(format!(
            "batch {} returned {} results for {} items", batch.index, values.len(), len
        ))),
        other => other
    };
    debug!("batch {} resolved (ok: {})", batch.index, result.is_ok());
    BatchOutcome {
        slot,
        batch: batch.index,
        len,
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WorkItem;

    struct Echo;

    impl RemoteCall for Echo {
        type Output = String;

        async fn dispatch(&self, batch: &Batch) -> Result<Vec<String>> {
            Ok(batch.items.iter().map(|i| i.text.to_uppercase()).collect())
        }
    }

    struct ShortChanged;

    impl RemoteCall for ShortChanged {
        type Output = String;

        async fn dispatch(&self, _batch: &Batch) -> Result<Vec<String>> {
            Ok(vec![String::from("only one")])
        }
    }

    fn batches(sizes: &[usize]) -> Vec<Batch> {
        let mut next = 0;
        sizes.iter()
            .enumerate()
            .map(|(b, &size)| {
                let items = (next..next + size)
                    .map(|i| WorkItem::new(i, "test.txt", format!("item{}", i)))
                    .collect();
                next += size;
                Batch::new(b, items)
            })
            .collect()
    }

    struct RejectAll;

    impl RemoteCall for RejectAll {
        type Output = String;

        async fn dispatch(&self, _batch: &Batch) -> Result<Vec<String>> {
            Err(Error::remote("rejected"))
        }
    }

    #[tokio::test]
    async fn test_failure_marker_names_batch_index() {
        // hand-built batches whose index differs from their position
        let batches = vec![
            Batch::new(7, vec![WorkItem::new(0, "test.txt", "a".to_string())]),
            Batch::new(3, vec![WorkItem::new(1, "test.txt", "b".to_string())])
        ];
        let dispatcher = Dispatcher::new(RejectAll, 2, Strategy::Gated, FailurePolicy::BestEffort).unwrap();
        let results = dispatcher.run(batches).await.unwrap();
        let marked = results.iter().map(|r| r.as_ref().unwrap_err().batch).collect::<Vec<_>>();
        assert_eq!(marked, vec![7, 3]);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = Dispatcher::new(Echo, 0, Strategy::Gated, FailurePolicy::FailFast);
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_empty_run() {
        let dispatcher = Dispatcher::new(Echo, 2, Strategy::Windowed, FailurePolicy::FailFast).unwrap();
        let results = dispatcher.run(Vec::new()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_results_flattened_in_order() {
        for strategy in [Strategy::Windowed, Strategy::Gated] {
            let dispatcher = Dispatcher::new(Echo, 2, strategy, FailurePolicy::FailFast).unwrap();
            let results = dispatcher.run(batches(&[2, 2, 1])).await.unwrap();
            let values = results.into_iter().map(|r| r.unwrap()).collect::<Vec<_>>();
            assert_eq!(values, vec!["ITEM0", "ITEM1", "ITEM2", "ITEM3", "ITEM4"]);
        }
    }

    #[tokio::test]
    async fn test_result_count_mismatch_is_remote_failure() {
        let dispatcher = Dispatcher::new(ShortChanged, 1, Strategy::Gated, FailurePolicy::FailFast).unwrap();
        let err = dispatcher.run(batches(&[3])).await.unwrap_err();
        assert!(err.is_remote_failure());

        let dispatcher = Dispatcher::new(ShortChanged, 1, Strategy::Gated, FailurePolicy::BestEffort).unwrap();
        let results = dispatcher.run(batches(&[3])).await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_err()));
    }
}
