//! Retrieval-strategy comparison.
//!
//! A fixed catalog of [`Strategy`] values is run against every configured
//! topic by the [`Harness`]. Each (strategy, topic) pair yields exactly one
//! [`ExperimentResult`], failures included, and the whole [`Run`] is written
//! once as a JSON report.
//!
//! ```no_run
//! # use ragbench_experiment::{Harness, write_report};
//! # fn demo(harness: Harness<'_>, topics: &[ragbench_core::types::TopicRef]) -> anyhow::Result<()> {
//! let run = harness.run(topics, &mut ());
//! write_report(&run, std::path::Path::new("retrieval_experiment_results.json"))?;
//! # Ok(()) }
//! ```

pub mod console;
pub mod harness;
pub mod query;
pub mod report;
pub mod result;
pub mod strategy;

pub use console::ConsoleReporter;
pub use harness::{invoke, Harness, RunObserver, StrategyOutcome};
pub use query::{extract_keywords, generate_hypothetical_document, KeywordPrompt};
pub use report::{write_report, Run};
pub use result::{mean_score, preview, ExperimentResult, QueryUsed};
pub use strategy::{Strategy, StrategyContext, CATALOG};
