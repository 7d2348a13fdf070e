use crate::rules::store::{Observation, RuleStore};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Non-blocking channel from agents to the rule store.
///
/// [`submit`](RuleFeedback::submit) spawns the observation onto its own task
/// and returns immediately, so a slow synthesis never delays an interview.
/// Learned rules only show up in prompt builds that happen afterwards.
/// [`flush`](RuleFeedback::flush) waits for everything submitted so far.
#[derive(Clone)]
pub struct RuleFeedback {
    store: Arc<dyn RuleStore>,
    pending: Arc<Mutex<JoinSet<()>>>,
}

impl RuleFeedback {
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self {
            store,
            pending: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    pub fn store(&self) -> &Arc<dyn RuleStore> {
        &self.store
    }

    pub fn submit(&self, observation: Observation) {
        let store = self.store.clone();
        self.pending.lock().spawn(async move {
            let agent = observation.agent_id.clone();
            if let Err(e) = store.record_observation(observation).await {
                tracing::warn!(agent = %agent, error = %e, "Failed to record observation");
            }
        });
    }

    /// Wait for every submitted observation to be processed. Returns the
    /// number of observations drained.
    pub async fn flush(&self) -> usize {
        let mut drained = 0;
        loop {
            let mut batch = std::mem::take(&mut *self.pending.lock());
            if batch.is_empty() {
                return drained;
            }
            while let Some(result) = batch.join_next().await {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Observation task panicked");
                }
                drained += 1;
            }
        }
    }
}
