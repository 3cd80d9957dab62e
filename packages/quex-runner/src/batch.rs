use std::{
	collections::{BTreeMap, VecDeque},
	fs,
	path::PathBuf,
	sync::{Arc, Mutex},
};

use ahash::AHashMap;
use tokio::task::JoinSet;
use tracing::{info, warn};

use quex_core::{
	AdditiveSmoothing, DocId, RankedHit, Rm3, SearchEngine, StatsProvider, TermWeights,
};
use quex_judge::{Judgment, JudgmentCache, Scorer};

use crate::{
	Error, Result,
	qrels::Oracle,
	run_file::{RunNameParts, format_ranked_list, run_name},
	strategy::{FeedbackStrategy, RerankMethod, oracle_set, top_k_set},
	topics::{QueryMode, Topic},
};

/// Fixed knobs for every batch of one experiment run.
#[derive(Debug, Clone)]
pub struct RunSettings {
	pub field: String,
	pub docid_field: String,
	pub query_mode: QueryMode,
	pub mu: f64,
	/// Baseline retrieval depth; run files never exceed this many lines.
	pub search_depth: usize,
	pub rerank: RerankMethod,
	pub strategy: FeedbackStrategy,
	pub smoothing_model: String,
	pub smoothing_parameter: f64,
	pub run_dir: PathBuf,
	pub max_workers: usize,
	pub force_sequential: bool,
}

/// What one batch did: run names written this time and run names whose files
/// already existed.
#[derive(Debug, Default)]
pub struct BatchOutcome {
	pub written: Vec<String>,
	pub skipped: Vec<String>,
}

struct Inner<S> {
	engine: Arc<dyn SearchEngine>,
	topics: Vec<Topic>,
	oracle: Option<Oracle>,
	scorer: Option<Arc<S>>,
	cache: Option<Arc<JudgmentCache>>,
	settings: RunSettings,
}

/// One run file selected to be (re)written in this batch.
struct NeededRun {
	slot: usize,
	name: String,
	path: PathBuf,
	lambda: f64,
}

/// Processes one (depth, expansion-size) batch over a lambda grid: filters
/// out already-written run files, computes each topic's RM3 expansion once,
/// and reuses it for every remaining lambda.
pub struct BatchRunner<S> {
	inner: Arc<Inner<S>>,
}

impl<S: Scorer + 'static> BatchRunner<S> {
	pub fn new(
		engine: Arc<dyn SearchEngine>,
		topics: Vec<Topic>,
		oracle: Option<Oracle>,
		scorer: Option<Arc<S>>,
		cache: Option<Arc<JudgmentCache>>,
		settings: RunSettings,
	) -> Result<Self> {
		if settings.strategy.needs_oracle() && oracle.is_none() {
			return Err(Error::MissingOracle { strategy: settings.strategy.label().to_string() });
		}

		let scorer_backed =
			settings.strategy.needs_scorer() || settings.rerank == RerankMethod::CrossEncoder;

		if scorer_backed && (scorer.is_none() || cache.is_none()) {
			return Err(Error::MissingScorer { strategy: settings.strategy.label().to_string() });
		}

		Ok(Self { inner: Arc::new(Inner { engine, topics, oracle, scorer, cache, settings }) })
	}

	/// Run one (depth, expansion-size) tuple over `lambdas`. Existing run
	/// files are the resume marker: they are reported skipped and never
	/// touched. Selected files are truncated up front, then rewritten in
	/// original topic order once every topic has finished.
	pub async fn run_batch(
		&self,
		depth: usize,
		expansion_size: usize,
		lambdas: &[f64],
	) -> Result<BatchOutcome> {
		let settings = &self.inner.settings;
		let mut outcome = BatchOutcome::default();
		let mut needed = Vec::new();

		for &lambda in lambdas {
			let name = run_name(&RunNameParts {
				rerank: settings.rerank,
				mu: settings.mu,
				query_mode: settings.query_mode,
				strategy: settings.strategy,
				smoothing_model: &settings.smoothing_model,
				smoothing_parameter: settings.smoothing_parameter,
				depth,
				lambda,
				expansion_size,
			});

			// Baseline and cross-encoder names ignore lambda; one file each.
			if needed.iter().any(|run: &NeededRun| run.name == name)
				|| outcome.skipped.contains(&name)
			{
				continue;
			}

			let path = settings.run_dir.join(&name);

			if path.exists() {
				outcome.skipped.push(name);
			} else {
				needed.push(NeededRun { slot: needed.len(), name, path, lambda });
			}
		}

		if needed.is_empty() {
			info!(depth, expansion_size, "all run files exist, skipping batch");

			return Ok(outcome);
		}

		fs::create_dir_all(&settings.run_dir)
			.map_err(|err| Error::WriteRun { path: settings.run_dir.clone(), source: err })?;

		// Interrupted runs leave empty files, to be redone by deleting them.
		for run in &needed {
			fs::File::create(&run.path)
				.map_err(|err| Error::WriteRun { path: run.path.clone(), source: err })?;
		}

		let workers = self.worker_count();

		info!(
			depth,
			expansion_size,
			needed = needed.len(),
			total = lambdas.len(),
			workers,
			"processing batch"
		);

		let needed = Arc::new(needed);
		let queue =
			Arc::new(Mutex::new((0..self.inner.topics.len()).collect::<VecDeque<usize>>()));
		let mut tasks = JoinSet::new();

		for _ in 0..workers {
			let inner = self.inner.clone();
			let needed = needed.clone();
			let queue = queue.clone();

			tasks.spawn(async move {
				worker_loop(inner, needed, queue, depth, expansion_size).await
			});
		}

		// Lines keyed by topic index restore original topic order no matter
		// which worker finished first.
		let mut per_slot = vec![BTreeMap::<usize, String>::new(); needed.len()];

		while let Some(joined) = tasks.join_next().await {
			let lines = joined.unwrap_or_else(|err| {
				warn!(error = %err, "batch worker panicked");

				Vec::new()
			});

			for (topic_index, slot, text) in lines {
				per_slot[slot].insert(topic_index, text);
			}
		}

		for run in needed.iter() {
			let mut content = String::new();

			for text in per_slot[run.slot].values() {
				content.push_str(text);
			}

			fs::write(&run.path, content)
				.map_err(|err| Error::WriteRun { path: run.path.clone(), source: err })?;
			outcome.written.push(run.name.clone());
		}

		Ok(outcome)
	}

	/// One worker when forced, or when a scorer-backed run starts from an
	/// empty judgment cache or targets a test run directory; otherwise
	/// bounded by `max_workers` and the topic count.
	fn worker_count(&self) -> usize {
		let settings = &self.inner.settings;

		if settings.force_sequential {
			return 1;
		}

		let scorer_backed =
			settings.strategy.needs_scorer() || settings.rerank == RerankMethod::CrossEncoder;

		if scorer_backed {
			let cold_cache = self.inner.cache.as_ref().is_some_and(|cache| cache.is_empty());
			let test_run = settings.run_dir.to_string_lossy().contains("test");

			if cold_cache || test_run {
				return 1;
			}
		}

		settings.max_workers.min(self.inner.topics.len()).max(1)
	}
}

async fn worker_loop<S: Scorer>(
	inner: Arc<Inner<S>>,
	needed: Arc<Vec<NeededRun>>,
	queue: Arc<Mutex<VecDeque<usize>>>,
	depth: usize,
	expansion_size: usize,
) -> Vec<(usize, usize, String)> {
	// Each worker owns its statistics caches; topics it processes share them.
	let stats = Arc::new(StatsProvider::new(inner.engine.clone()));
	let rm3 = Rm3::new(AdditiveSmoothing::new(
		inner.settings.smoothing_parameter,
		inner.settings.field.clone(),
		stats,
	));
	let mut lines = Vec::new();

	loop {
		let topic_index = {
			let mut queue = queue.lock().expect("topic queue poisoned");

			match queue.pop_front() {
				Some(index) => index,
				None => break,
			}
		};
		let topic = &inner.topics[topic_index];

		match process_topic(&inner, &rm3, topic, &needed, depth, expansion_size).await {
			Ok(topic_lines) =>
				lines.extend(topic_lines.into_iter().map(|(slot, text)| (topic_index, slot, text))),
			Err(err) => warn!(topic = topic.number, error = %err, "topic failed, skipping"),
		}
	}

	lines
}

async fn process_topic<S: Scorer>(
	inner: &Inner<S>,
	rm3: &Rm3<AdditiveSmoothing>,
	topic: &Topic,
	needed: &[NeededRun],
	depth: usize,
	expansion_size: usize,
) -> Result<Vec<(usize, String)>> {
	let settings = &inner.settings;
	let query_text = topic.query_text(settings.query_mode);
	let original = TermWeights::from_terms(inner.engine.tokenize(&query_text));
	let hits = inner.engine.search(&original, settings.search_depth)?;
	let docnos = resolve_docnos(inner.engine.as_ref(), &hits, &settings.docid_field)?;
	let mut lines = Vec::new();

	match settings.rerank {
		RerankMethod::None =>
			for run in needed {
				lines.push((run.slot, format_ranked_list(topic.number, &hits, &docnos, &run.name)));
			},
		RerankMethod::CrossEncoder => {
			let reranked = rerank_by_score(inner, topic, &query_text, &hits, depth).await?;
			let reranked_docnos = docnos_for(&reranked, &hits, &docnos);

			for run in needed {
				lines.push((
					run.slot,
					format_ranked_list(topic.number, &reranked, &reranked_docnos, &run.name),
				));
			}
		},
		RerankMethod::Prf => {
			let relevance_set = relevance_set(inner, topic, &query_text, &hits, depth).await?;
			// One expansion per (depth, e); only lambda varies below.
			let expanded = rm3
				.term_weights(&relevance_set)
				.prune_to_size(expansion_size)
				.scale_to_l1_norm();
			let original = original.scale_to_l1_norm();

			for run in needed {
				let query = TermWeights::interpolate(&original, &expanded, run.lambda);
				let hits = inner.engine.search(&query, settings.search_depth)?;
				let docnos = resolve_docnos(inner.engine.as_ref(), &hits, &settings.docid_field)?;

				lines.push((run.slot, format_ranked_list(topic.number, &hits, &docnos, &run.name)));
			}
		},
	}

	Ok(lines)
}

fn resolve_docnos(
	engine: &dyn SearchEngine,
	hits: &[RankedHit],
	docid_field: &str,
) -> Result<Vec<String>> {
	hits.iter()
		.map(|hit| {
			Ok(engine
				.stored_field(hit.doc, docid_field)?
				.unwrap_or_else(|| hit.doc.to_string()))
		})
		.collect()
}

/// Reorder the external ids to follow a reranked hit list.
fn docnos_for(reranked: &[RankedHit], hits: &[RankedHit], docnos: &[String]) -> Vec<String> {
	let by_doc = hits
		.iter()
		.zip(docnos)
		.map(|(hit, docno)| (hit.doc, docno.clone()))
		.collect::<AHashMap<_, _>>();

	reranked
		.iter()
		.map(|hit| by_doc.get(&hit.doc).cloned().unwrap_or_else(|| hit.doc.to_string()))
		.collect()
}

async fn judged<S: Scorer>(
	inner: &Inner<S>,
	topic: &Topic,
	query_text: &str,
	doc: DocId,
) -> Result<Judgment> {
	let scorer = inner.scorer.as_ref().expect("scorer checked at construction");
	let cache = inner.cache.as_ref().expect("cache checked at construction");
	let document = inner
		.engine
		.stored_field(doc, &inner.settings.field)?
		.unwrap_or_default();
	let judgment = cache
		.get(
			topic.number,
			doc.0,
			query_text,
			topic.instructions(inner.settings.query_mode),
			&document,
			scorer.as_ref(),
		)
		.await?;

	Ok(judgment)
}

/// Rerank the top `depth` hits by cached scorer score. The unreranked tail
/// keeps its retrieval order behind sentinel scores so every reranked head
/// outranks it.
async fn rerank_by_score<S: Scorer>(
	inner: &Inner<S>,
	topic: &Topic,
	query_text: &str,
	hits: &[RankedHit],
	depth: usize,
) -> Result<Vec<RankedHit>> {
	let head_len = depth.min(hits.len());
	let mut head = Vec::with_capacity(head_len);

	for hit in hits.iter().take(head_len) {
		let judgment = judged(inner, topic, query_text, hit.doc).await?;

		head.push(RankedHit { doc: hit.doc, score: judgment.score as f32 });
	}

	head.sort_by(|a, b| b.score.total_cmp(&a.score));

	for (i, hit) in hits[head_len..].iter().enumerate() {
		head.push(RankedHit { doc: hit.doc, score: -1_000.0 - i as f32 });
	}

	Ok(head)
}

/// Pseudo-relevant documents for RM3, per the configured strategy. Scorer
/// strategies walk the top `depth` hits and keep judged-relevant ones.
async fn relevance_set<S: Scorer>(
	inner: &Inner<S>,
	topic: &Topic,
	query_text: &str,
	hits: &[RankedHit],
	depth: usize,
) -> Result<AHashMap<DocId, f64>> {
	let oracle = inner.oracle.as_ref();

	match inner.settings.strategy {
		FeedbackStrategy::TopK => Ok(top_k_set(hits, depth)),
		FeedbackStrategy::Oracle =>
			Ok(oracle_set(oracle.unwrap_or(&Oracle::new()), topic.number, hits, usize::MAX)),
		FeedbackStrategy::OracleK =>
			Ok(oracle_set(oracle.unwrap_or(&Oracle::new()), topic.number, hits, depth)),
		FeedbackStrategy::Judge | FeedbackStrategy::JudgeProb => {
			let mut selected = AHashMap::new();

			for hit in hits.iter().take(depth) {
				let judgment = judged(inner, topic, query_text, hit.doc).await?;

				if judgment.is_relevant {
					let weight = match inner.settings.strategy {
						FeedbackStrategy::JudgeProb => judgment.prob_true,
						_ => hit.score as f64,
					};

					selected.insert(hit.doc, weight);
				}
			}

			Ok(selected)
		},
	}
}
