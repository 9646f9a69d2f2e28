//! Human-readable progress printed while a run executes.

use std::fmt::Write as _;

use ragbench_core::types::TopicRef;

use crate::harness::{RunObserver, StrategyOutcome};
use crate::report::Run;
use crate::result::preview;

const RULE_WIDTH: usize = 60;
const TOP_CHUNKS: usize = 3;
const CONSOLE_PREVIEW_CHARS: usize = 60;

#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self { Self }

    pub fn print_banner(&self) {
        println!("{}", "=".repeat(RULE_WIDTH));
        println!("Retrieval strategy comparison");
        println!("{}", "=".repeat(RULE_WIDTH));
    }

    pub fn print_summary(&self, run: &Run, report_path: &std::path::Path) {
        println!("\n{}", "=".repeat(RULE_WIDTH));
        println!(
            "Done: {} records ({} failed) written to {}",
            run.results().len(),
            run.failures(),
            report_path.display()
        );
        println!("{}", "=".repeat(RULE_WIDTH));
    }
}

/// Block printed for one strategy: aggregate, count and the leading chunks.
pub fn format_outcome(outcome: &StrategyOutcome) -> String {
    let mut out = format!("\n--- {} ---\n", outcome.strategy());
    match outcome {
        StrategyOutcome::Completed(record) => {
            let _ = writeln!(out, "Average score ({:?}): {:.4}", record.score_kind(), record.avg_score());
            let _ = writeln!(out, "Chunks retrieved: {}", record.chunks().len());
            for (i, chunk) in record.chunks().iter().take(TOP_CHUNKS).enumerate() {
                let _ = writeln!(out, "  [{}] ID:{}, score:{:.4}", i + 1, chunk.id, chunk.score);
                let _ = writeln!(out, "      {}...", preview(&chunk.content, CONSOLE_PREVIEW_CHARS).replace('\n', " "));
            }
        }
        StrategyOutcome::Failed { error, .. } => {
            let _ = writeln!(out, "  Error: {error}");
        }
    }
    out
}

impl RunObserver for ConsoleReporter {
    fn topic_started(&mut self, topic: &TopicRef, path: Option<&str>) {
        println!("\n\n{}", "#".repeat(RULE_WIDTH));
        println!("Topic: {} (id {})", topic.name, topic.id);
        println!("Path: {}", path.unwrap_or("<unresolved>"));
        println!("{}", "#".repeat(RULE_WIDTH));
    }

    fn strategy_finished(&mut self, _topic: &TopicRef, outcome: &StrategyOutcome) {
        print!("{}", format_outcome(outcome));
    }
}
