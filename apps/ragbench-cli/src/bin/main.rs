//! `ragbench`: ingest a corpus, run the retrieval comparison, or query a single provider.
//!
//! ```bash
//! ragbench ingest data/txt --limit 20
//! ragbench run --output results.json
//! ragbench search hybrid "tcp congestion window"
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use ragbench_core::config::{expand_path, Config, Settings};
use ragbench_core::data_processor::DataProcessor;
use ragbench_core::topics::{CategoryTree, UnavailableTopics};
use ragbench_core::traits::{DenseSearch, HybridSearch, LexicalSearch, TopicSource};
use ragbench_core::types::RetrievedChunk;
use ragbench_embed::get_default_embedder;
use ragbench_experiment::{write_report, ConsoleReporter, Harness, StrategyContext};
use ragbench_hybrid::HybridSearchEngine;
use ragbench_llm::ChatClient;
use ragbench_text::LexicalIndex;
use ragbench_vector::VectorStore;

#[derive(Parser, Debug)]
#[command(name = "ragbench")]
#[command(about = "Compare retrieval strategies for a RAG pipeline")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chunk, embed and index a directory of .txt files
    Ingest {
        /// Source directory (defaults to data.raw_txt_dir)
        dir: Option<PathBuf>,
        /// Only read the first N files
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Run every strategy against the configured topics and write the report
    Run {
        /// Report path (defaults to experiment.output_path)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Chunks retrieved per strategy
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Query one provider directly
    Search {
        #[arg(value_enum)]
        mode: SearchMode,
        query: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SearchMode {
    Lexical,
    Dense,
    Hybrid,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// The document store opened for querying.
struct Stores {
    lexical: Arc<LexicalIndex>,
    dense: Arc<VectorStore>,
}

impl Stores {
    fn open(settings: &Settings) -> Result<Self> {
        let lexical = LexicalIndex::open(&expand_path(&settings.data.tantivy_index_dir));
        let dense = VectorStore::open(&expand_path(&settings.data.lancedb_dir), &settings.data.table, settings.embedding.dimension)?;
        Ok(Self { lexical: Arc::new(lexical), dense: Arc::new(dense) })
    }

    fn hybrid(&self, settings: &Settings) -> HybridSearchEngine {
        HybridSearchEngine::new(self.lexical.clone(), self.dense.clone(), &settings.retrieval)
    }
}

fn ingest(settings: &Settings, dir: Option<PathBuf>, limit: Option<usize>) -> Result<()> {
    let data_dir = dir.unwrap_or_else(|| expand_path(&settings.data.raw_txt_dir));
    tracing::info!(dir = %data_dir.display(), "ingesting");

    let processor = DataProcessor::new();
    let chunks = match limit {
        Some(limit) => processor.process_directory_limited(&data_dir, limit)?,
        None => processor.process_directory(&data_dir)?,
    };
    if chunks.is_empty() {
        anyhow::bail!("no .txt files with content under {}", data_dir.display());
    }

    let embedder = get_default_embedder(&settings.embedding)?;
    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).context("embedding chunks")?;

    let store = VectorStore::create(&expand_path(&settings.data.lancedb_dir), &settings.data.table, embedder.dim())?;
    store.index(&chunks, &embeddings)?;

    let lexical = LexicalIndex::create(&expand_path(&settings.data.tantivy_index_dir))?;
    lexical.index(&chunks)?;

    tracing::info!(
        chunks = chunks.len(),
        rows = store.count_rows()?,
        table = store.table_name(),
        lexical_docs = lexical.num_docs()?,
        "ingest complete"
    );
    Ok(())
}

fn run(settings: &Settings, output: Option<PathBuf>) -> Result<()> {
    let categories_file = expand_path(&settings.data.categories_file);
    let topics: Box<dyn TopicSource> = match CategoryTree::load(&categories_file) {
        Ok(tree) => Box::new(tree),
        Err(err) => {
            tracing::warn!(path = %categories_file.display(), error = %err, "category catalog unavailable; topics will be recorded as failures");
            Box::new(UnavailableTopics::new(err.to_string()))
        }
    };
    let stores = Stores::open(settings)?;
    let hybrid = stores.hybrid(settings);
    let embedder = get_default_embedder(&settings.embedding)?;
    let llm = ChatClient::from_settings(&settings.llm)?;

    let ctx = StrategyContext {
        embedder: embedder.as_ref(),
        dense: stores.dense.as_ref(),
        lexical: stores.lexical.as_ref(),
        hybrid: &hybrid,
        llm: &llm,
        top_k: settings.retrieval.top_k,
        hyde_temperature: settings.llm.temperature,
        keyword_temperature: settings.llm.keyword_temperature,
    };

    let mut reporter = ConsoleReporter::new();
    reporter.print_banner();
    let run = Harness::new(topics.as_ref(), ctx).run(&settings.experiment.topics, &mut reporter);

    let path = output.unwrap_or_else(|| expand_path(&settings.experiment.output_path));
    write_report(&run, &path)?;
    tracing::info!(path = %path.display(), records = run.results().len(), failures = run.failures(), "run finished");
    reporter.print_summary(&run, &path);
    Ok(())
}

fn search(settings: &Settings, mode: SearchMode, query: &str, limit: usize) -> Result<()> {
    let stores = Stores::open(settings)?;
    let hits: Vec<RetrievedChunk> = match mode {
        SearchMode::Lexical => stores.lexical.search_text(query, limit)?,
        SearchMode::Dense => {
            let vector = get_default_embedder(&settings.embedding)?.embed(query)?;
            stores.dense.search_by_vector(&vector, limit)?
        }
        SearchMode::Hybrid => {
            let vector = get_default_embedder(&settings.embedding)?.embed(query)?;
            stores.hybrid(settings).search_hybrid(&vector, query, limit)?
        }
    };
    if hits.is_empty() {
        println!("No results for '{}'", query);
    }
    for (i, hit) in hits.iter().enumerate() {
        let snippet: String = hit.content.chars().take(160).collect();
        println!("{:>2}. [{:.4}] {}\n    {}", i + 1, hit.score, hit.id, snippet.replace('\n', " "));
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let mut settings = config.settings()?;

    match args.command {
        Command::Ingest { dir, limit } => ingest(&settings, dir, limit),
        Command::Run { output, top_k } => {
            if let Some(k) = top_k {
                settings.retrieval.top_k = k;
                settings.validate()?;
            }
            run(&settings, output)
        }
        Command::Search { mode, query, limit } => search(&settings, mode, &query, limit),
    }
}
