use chrono::Local;

use ragbench_core::traits::TopicSource;
use ragbench_core::types::{Topic, TopicRef};

use crate::report::Run;
use crate::result::ExperimentResult;
use crate::strategy::{Strategy, StrategyContext, CATALOG};

/// Result of one (strategy, topic) invocation.
#[derive(Debug)]
pub enum StrategyOutcome {
    Completed(ExperimentResult),
    Failed { strategy: Strategy, error: String },
}

impl StrategyOutcome {
    pub fn strategy(&self) -> Strategy {
        match self {
            StrategyOutcome::Completed(record) => record.strategy(),
            StrategyOutcome::Failed { strategy, .. } => *strategy,
        }
    }

    fn into_record(self, topic: &TopicRef) -> ExperimentResult {
        match self {
            StrategyOutcome::Completed(record) => record,
            StrategyOutcome::Failed { strategy, error } => ExperimentResult::failed(strategy, topic, error),
        }
    }
}

/// Run `strategy` for `topic`, turning any error into [`StrategyOutcome::Failed`].
pub fn invoke(strategy: Strategy, topic: &Topic, ctx: &StrategyContext<'_>) -> StrategyOutcome {
    match strategy.run(topic, ctx) {
        Ok(record) => StrategyOutcome::Completed(record),
        Err(err) => StrategyOutcome::Failed { strategy, error: format!("{err:#}") },
    }
}

/// Progress callbacks. Implementations must not fail the run.
pub trait RunObserver {
    /// `path` is `None` when the topic could not be resolved.
    fn topic_started(&mut self, _topic: &TopicRef, _path: Option<&str>) {}
    fn strategy_finished(&mut self, _topic: &TopicRef, _outcome: &StrategyOutcome) {}
}

impl RunObserver for () {}

/// Drives every configured topic through every strategy, sequentially.
pub struct Harness<'a> {
    topics: &'a dyn TopicSource,
    ctx: StrategyContext<'a>,
}

impl<'a> Harness<'a> {
    pub fn new(topics: &'a dyn TopicSource, ctx: StrategyContext<'a>) -> Self {
        Self { topics, ctx }
    }

    /// One record per (strategy, topic), topics outer, strategies inner.
    ///
    /// Never fails: provider errors and unresolvable topics become failure
    /// records so the matrix is always complete.
    pub fn run(&self, topic_refs: &[TopicRef], observer: &mut dyn RunObserver) -> Run {
        let experiment_date = Local::now();
        let mut results = Vec::with_capacity(topic_refs.len() * CATALOG.len());

        for topic_ref in topic_refs {
            let resolved = self.topics.topic_path(topic_ref.id).map(|path| Topic {
                id: topic_ref.id,
                name: topic_ref.name.clone(),
                path,
            });
            observer.topic_started(topic_ref, resolved.as_ref().ok().map(|t| t.path.as_str()));

            let topic = match resolved {
                Ok(topic) => topic,
                Err(err) => {
                    let error = format!("{err:#}");
                    tracing::warn!(topic_id = topic_ref.id, %error, "topic could not be resolved");
                    for strategy in CATALOG {
                        let outcome = StrategyOutcome::Failed { strategy, error: error.clone() };
                        observer.strategy_finished(topic_ref, &outcome);
                        results.push(outcome.into_record(topic_ref));
                    }
                    continue;
                }
            };
            tracing::info!(topic_id = topic.id, topic = %topic.name, path = %topic.path, "running strategies");

            for strategy in CATALOG {
                let outcome = invoke(strategy, &topic, &self.ctx);
                match &outcome {
                    StrategyOutcome::Completed(record) => tracing::info!(
                        %strategy,
                        topic_id = topic.id,
                        chunks = record.chunks().len(),
                        avg_score = record.avg_score(),
                        "strategy completed"
                    ),
                    StrategyOutcome::Failed { error, .. } => {
                        tracing::warn!(%strategy, topic_id = topic.id, %error, "strategy failed")
                    }
                }
                observer.strategy_finished(topic_ref, &outcome);
                results.push(outcome.into_record(topic_ref));
            }
        }

        Run::new(experiment_date, topic_refs.to_vec(), results)
    }
}
