use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use std::sync::Mutex;

use ragbench_core::traits::{DenseSearch, Embedder, HybridSearch, LanguageModel, LexicalSearch, TopicSource};
use ragbench_core::types::{ChunkId, RetrievedChunk, ScoreKind, Topic, TopicId, TopicRef};
use ragbench_experiment::query::HYDE_SYSTEM_PROMPT;
use ragbench_experiment::{
    write_report, Harness, KeywordPrompt, QueryUsed, RunObserver, StrategyContext, StrategyOutcome, CATALOG,
};

const HYDE_PASSAGE: &str = "HTTP status codes are grouped into five classes: informational, success, redirection, client error and server error.";

fn chunk(id: &str, score: f32) -> RetrievedChunk {
    RetrievedChunk::new(id, format!("body of {id}"), score)
}

struct StubTopics(HashMap<TopicId, String>);

impl StubTopics {
    fn standard() -> Self {
        Self(HashMap::from([
            (42, "Network > Application Layer > HTTP".to_string()),
            (18, "Network > Data Link Layer > Ethernet".to_string()),
            (32, "Network > Transport Layer > TCP".to_string()),
        ]))
    }
}

impl TopicSource for StubTopics {
    fn topic(&self, id: TopicId) -> Result<Topic> {
        let path = self.topic_path(id)?;
        Ok(Topic { id, name: format!("topic {id}"), path })
    }
    fn topic_path(&self, id: TopicId) -> Result<String> {
        self.0.get(&id).cloned().ok_or_else(|| anyhow!("unknown topic {id}"))
    }
}

struct StubEmbedder;

impl Embedder for StubEmbedder {
    fn dim(&self) -> usize { 2 }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
    }
}

struct StubDense;

impl DenseSearch for StubDense {
    fn search_by_vector(&self, _vector: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        Ok(vec![chunk("d1", 0.75), chunk("d2", 0.25)].into_iter().take(k).collect())
    }
    fn search_within(&self, _vector: &[f32], candidates: &[ChunkId], k: usize) -> Result<Vec<RetrievedChunk>> {
        Ok(candidates.iter().take(k).map(|id| chunk(id, 0.5)).collect())
    }
}

/// Lexical stub that fails for one phrase.
struct StubLexical {
    fail_on: Option<&'static str>,
}

impl LexicalSearch for StubLexical {
    fn search_text(&self, phrase: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if self.fail_on == Some(phrase) {
            bail!("lexical index unavailable");
        }
        Ok(vec![chunk("l1", 2.0), chunk("l2", 1.0)].into_iter().take(k).collect())
    }
    fn matching_ids(&self, _phrase: &str) -> Result<Vec<ChunkId>> {
        Ok(vec!["l1".to_string(), "l2".to_string()])
    }
}

struct StubHybrid {
    phrases: Mutex<Vec<String>>,
}

impl HybridSearch for StubHybrid {
    fn search_hybrid(&self, _vector: &[f32], phrase: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        self.phrases.lock().unwrap().push(phrase.to_string());
        Ok(vec![chunk("h1", 0.5), chunk("h2", 0.25)].into_iter().take(k).collect())
    }
}

struct StubLlm {
    temperatures: Mutex<Vec<f32>>,
}

impl LanguageModel for StubLlm {
    fn complete(&self, system_prompt: &str, _user_message: &str, temperature: f32) -> Result<String> {
        self.temperatures.lock().unwrap().push(temperature);
        if system_prompt == HYDE_SYSTEM_PROMPT {
            Ok(HYDE_PASSAGE.to_string())
        } else if system_prompt == KeywordPrompt::Basic.system_prompt() {
            Ok("  HTTP status 1xx 2xx \n".to_string())
        } else if system_prompt == KeywordPrompt::Searchable.system_prompt() {
            Ok("HTTP response status redirect".to_string())
        } else {
            bail!("unexpected prompt")
        }
    }
}

struct Fixture {
    topics: StubTopics,
    lexical: StubLexical,
    hybrid: StubHybrid,
    llm: StubLlm,
}

impl Fixture {
    fn new(fail_on: Option<&'static str>) -> Self {
        Self {
            topics: StubTopics::standard(),
            lexical: StubLexical { fail_on },
            hybrid: StubHybrid { phrases: Mutex::new(vec![]) },
            llm: StubLlm { temperatures: Mutex::new(vec![]) },
        }
    }

    fn harness(&self) -> Harness<'_> {
        let ctx = StrategyContext {
            embedder: &StubEmbedder,
            dense: &StubDense,
            lexical: &self.lexical,
            hybrid: &self.hybrid,
            llm: &self.llm,
            top_k: 5,
            hyde_temperature: 0.5,
            keyword_temperature: 0.1,
        };
        Harness::new(&self.topics, ctx)
    }
}

#[derive(Default)]
struct Recorder {
    topics: Vec<(TopicId, Option<String>)>,
    outcomes: Vec<(TopicId, String, bool)>,
}

impl RunObserver for Recorder {
    fn topic_started(&mut self, topic: &TopicRef, path: Option<&str>) {
        self.topics.push((topic.id, path.map(str::to_string)));
    }
    fn strategy_finished(&mut self, topic: &TopicRef, outcome: &StrategyOutcome) {
        let failed = matches!(outcome, StrategyOutcome::Failed { .. });
        self.outcomes.push((topic.id, outcome.strategy().name().to_string(), failed));
    }
}

#[test]
fn http_status_topic_yields_seven_deterministic_records() {
    let fixture = Fixture::new(None);
    let topic = TopicRef::new(42, "http status code categories");
    let run = fixture.harness().run(std::slice::from_ref(&topic), &mut ());

    let results = run.results();
    assert_eq!(results.len(), 7);
    assert_eq!(run.failures(), 0);
    assert_eq!(run.test_categories(), &[topic.clone()]);

    let names: Vec<_> = results.iter().map(|r| r.strategy().name()).collect();
    assert_eq!(names, CATALOG.iter().map(|s| s.name()).collect::<Vec<_>>());
    assert!(results.iter().all(|r| r.topic_id() == 42 && r.topic_name() == "http status code categories"));

    let ids = |i: usize| results[i].chunks().iter().map(|c| c.id.as_str()).collect::<Vec<_>>();
    let means: Vec<f64> = results.iter().map(|r| r.avg_score()).collect();
    assert_eq!(means, vec![0.5, 0.5, 1.5, 0.375, 0.375, 0.375, 0.5]);
    assert_eq!(ids(0), vec!["d1", "d2"]);
    assert_eq!(ids(2), vec!["l1", "l2"]);
    assert_eq!(ids(3), vec!["h1", "h2"]);
    assert_eq!(ids(6), vec!["l1", "l2"]);

    assert_eq!(results[0].query_used(), &QueryUsed::Dense { passage: HYDE_PASSAGE.to_string() });
    assert_eq!(
        results[1].query_used(),
        &QueryUsed::Dense { passage: "http status code categories Network > Application Layer > HTTP".to_string() }
    );
    assert_eq!(results[2].query_used(), &QueryUsed::Lexical { keyword: "http status code categories".to_string() });
    assert_eq!(
        results[4].query_used(),
        &QueryUsed::Hybrid { passage: HYDE_PASSAGE.to_string(), keyword: "HTTP status 1xx 2xx".to_string() }
    );
    assert_eq!(
        results[6].query_used(),
        &QueryUsed::FilteredDense { filter: "http status code categories".to_string(), passage: HYDE_PASSAGE.to_string() }
    );

    assert_eq!(results[2].score_kind(), ScoreKind::LexicalRank);
    assert_eq!(results[5].score_kind(), ScoreKind::FusedRank);

    let phrases = fixture.hybrid.phrases.lock().unwrap().clone();
    assert_eq!(phrases, vec!["http status code categories", "HTTP status 1xx 2xx", "HTTP response status redirect"]);

    let temps = fixture.llm.temperatures.lock().unwrap().clone();
    assert_eq!(temps.iter().filter(|&&t| t == 0.1).count(), 2, "one keyword call per keyword strategy");
    assert_eq!(temps.iter().filter(|&&t| t == 0.5).count(), 5, "one passage per HyDE strategy");
}

#[test]
fn one_failing_cell_does_not_affect_the_rest() {
    let fixture = Fixture::new(Some("mac address"));
    let topics = vec![
        TopicRef::new(32, "congestion control"),
        TopicRef::new(18, "mac address"),
        TopicRef::new(42, "http status code categories"),
    ];
    let mut recorder = Recorder::default();
    let run = fixture.harness().run(&topics, &mut recorder);

    assert_eq!(run.results().len(), 21);
    assert_eq!(run.failures(), 1);
    let failed: Vec<_> = run.results().iter().filter(|r| r.error().is_some()).collect();
    assert_eq!(failed[0].topic_id(), 18);
    assert_eq!(failed[0].strategy().name(), "Keyword Only");
    assert!(failed[0].chunks().is_empty());
    assert_eq!(failed[0].avg_score(), 0.0);
    assert!(failed[0].error().unwrap().contains("lexical index unavailable"));

    // Same strategy on other topics and other strategies on the same topic still ran.
    let keyword_only: Vec<_> = run.results().iter().filter(|r| r.strategy().name() == "Keyword Only").collect();
    assert_eq!(keyword_only.iter().filter(|r| r.error().is_none()).count(), 2);
    assert_eq!(run.results().iter().filter(|r| r.topic_id() == 18 && r.error().is_none()).count(), 6);

    assert_eq!(recorder.outcomes.len(), 21);
    assert_eq!(recorder.outcomes.iter().filter(|o| o.2).count(), 1);
}

#[test]
fn records_follow_topic_then_strategy_order() {
    let fixture = Fixture::new(None);
    let topics = vec![TopicRef::new(42, "http status code categories"), TopicRef::new(32, "congestion control")];
    let run = fixture.harness().run(&topics, &mut ());

    let order: Vec<_> = run.results().iter().map(|r| (r.topic_id(), r.strategy())).collect();
    let expected: Vec<_> = topics.iter().flat_map(|t| CATALOG.iter().map(move |&s| (t.id, s))).collect();
    assert_eq!(order, expected);
}

#[test]
fn unresolved_topic_fills_its_row_with_failures() {
    let fixture = Fixture::new(None);
    let topics = vec![TopicRef::new(99, "no such topic"), TopicRef::new(42, "http status code categories")];
    let mut recorder = Recorder::default();
    let run = fixture.harness().run(&topics, &mut recorder);

    assert_eq!(run.results().len(), 14);
    assert_eq!(run.failures(), 7);
    assert!(run.results()[..7].iter().all(|r| r.topic_id() == 99 && r.error().unwrap().contains("unknown topic 99")));
    assert!(run.results()[7..].iter().all(|r| r.error().is_none()));
    assert_eq!(recorder.topics[0], (99, None));
    assert_eq!(recorder.topics[1].1.as_deref(), Some("Network > Application Layer > HTTP"));
}

#[test]
fn report_keeps_stable_field_names() {
    let fixture = Fixture::new(Some("mac address"));
    let topics = vec![TopicRef::new(18, "mac address")];
    let run = fixture.harness().run(&topics, &mut ());

    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("results.json");
    write_report(&run, &path).unwrap();

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(json["experiment_date"].as_str().is_some());
    assert_eq!(json["test_categories"], serde_json::json!([{"id": 18, "name": "mac address"}]));

    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 7);
    let first = &results[0];
    for key in ["method", "category_id", "category_name", "query_used", "score_kind", "chunks", "avg_similarity"] {
        assert!(first.get(key).is_some(), "missing {key}");
    }
    assert_eq!(first["query_used"]["passage"], HYDE_PASSAGE);
    assert_eq!(first["chunks"][0], serde_json::json!({"id": "d1", "similarity": 0.75, "preview": "body of d1"}));

    let failure = &results[2];
    assert_eq!(failure["method"], "Keyword Only");
    assert_eq!(failure["query_used"]["kind"], "failed");
    assert_eq!(failure["chunks"], serde_json::json!([]));
    assert_eq!(failure["avg_similarity"], 0.0);

    let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap()).unwrap().collect();
    assert_eq!(leftovers.len(), 1, "no temporary files left behind");
}

/// Every provider refuses; used to check the run still completes.
struct Down;

impl Embedder for Down {
    fn dim(&self) -> usize { 2 }
    fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        bail!("embedding service refused connection")
    }
}

impl DenseSearch for Down {
    fn search_by_vector(&self, _vector: &[f32], _k: usize) -> Result<Vec<RetrievedChunk>> {
        bail!("vector table missing")
    }
    fn search_within(&self, _vector: &[f32], _candidates: &[ChunkId], _k: usize) -> Result<Vec<RetrievedChunk>> {
        bail!("vector table missing")
    }
}

impl LexicalSearch for Down {
    fn search_text(&self, _phrase: &str, _k: usize) -> Result<Vec<RetrievedChunk>> {
        bail!("lexical index missing")
    }
    fn matching_ids(&self, _phrase: &str) -> Result<Vec<ChunkId>> {
        bail!("lexical index missing")
    }
}

impl HybridSearch for Down {
    fn search_hybrid(&self, _vector: &[f32], _phrase: &str, _k: usize) -> Result<Vec<RetrievedChunk>> {
        bail!("vector table missing")
    }
}

impl LanguageModel for Down {
    fn complete(&self, _system_prompt: &str, _user_message: &str, _temperature: f32) -> Result<String> {
        bail!("language model unreachable")
    }
}

#[test]
fn every_provider_down_still_writes_a_full_report() {
    let topics = StubTopics::standard();
    let ctx = StrategyContext {
        embedder: &Down,
        dense: &Down,
        lexical: &Down,
        hybrid: &Down,
        llm: &Down,
        top_k: 5,
        hyde_temperature: 0.5,
        keyword_temperature: 0.1,
    };
    let refs = vec![TopicRef::new(42, "http status code categories"), TopicRef::new(32, "congestion control")];
    let mut recorder = Recorder::default();
    let run = Harness::new(&topics, ctx).run(&refs, &mut recorder);

    assert_eq!(run.results().len(), refs.len() * CATALOG.len());
    assert_eq!(run.failures(), run.results().len());
    assert!(run.results().iter().all(|r| r.chunks().is_empty() && r.avg_score() == 0.0));
    assert!(recorder.outcomes.iter().all(|o| o.2));

    let errors: Vec<_> = run.results()[..7].iter().map(|r| r.error().unwrap()).collect();
    assert!(errors[0].contains("language model unreachable"));
    assert!(errors[1].contains("embedding service refused connection"));
    assert!(errors[2].contains("lexical index missing"));

    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("results.json");
    write_report(&run, &path).unwrap();
    assert!(path.exists());
    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 14);
    assert!(results.iter().all(|r| r["query_used"]["kind"] == "failed"));
}
