//! Experiment driver: loads a configuration, builds the index snapshot and
//! judgment cache, and sweeps the (depth, expansion size, lambda) grid.

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use color_eyre::eyre::eyre;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quex_core::SearchEngine;
use quex_index::MemoryIndex;
use quex_judge::{CrossEncoderScorer, JudgmentCache, LlmJudgeScorer, Scorer, ScorerBackend};
use quex_runner::{
	BatchRunner, FeedbackStrategy, Oracle, QueryMode, RerankMethod, RunSettings, load_oracle,
	parse_topics,
};

#[derive(Debug, Parser)]
#[command(
	version = quex_cli::VERSION,
	rename_all = "kebab",
	styles = quex_cli::styles(),
)]
pub struct Args {
	/// Experiment configuration file.
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = quex_config::load(&args.config)?;
	let filter = EnvFilter::new(config.search.log_level.clone());
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let index = MemoryIndex::from_jsonl(
		&config.paths.corpus,
		config.search.field.clone(),
		config.search.docid_field.clone(),
		config.search.mu,
	)?;

	info!(documents = index.len(), corpus = %config.paths.corpus.display(), "indexed corpus");

	let engine: Arc<dyn SearchEngine> = Arc::new(index);
	let topics = parse_topics(&config.paths.topics)?;

	info!(topics = topics.len(), "parsed topics");

	let query_mode = QueryMode::parse(&config.search.query_mode)?;
	let strategy = FeedbackStrategy::parse(&config.feedback.strategy)?;
	let rerank = RerankMethod::parse(&config.rerank.method)?;
	let oracle = load_oracle_if_configured(&config, engine.as_ref())?;
	let (scorer, cache) = build_scorer(&config, strategy, rerank, query_mode)?;
	let settings = RunSettings {
		field: config.search.field.clone(),
		docid_field: config.search.docid_field.clone(),
		query_mode,
		mu: config.search.mu,
		search_depth: config.search.depth,
		rerank,
		strategy,
		smoothing_model: "Additive".to_string(),
		smoothing_parameter: config.feedback.smoothing_parameter,
		run_dir: config.paths.run_dir.clone(),
		max_workers: config.runner.max_workers,
		force_sequential: config.runner.force_sequential,
	};
	let runner = BatchRunner::new(engine, topics, oracle, scorer, cache.clone(), settings)?;
	let mut written = 0;
	let mut skipped = 0;

	match rerank {
		RerankMethod::Prf =>
			for &depth in &config.grid.depths {
				for &expansion_size in &config.grid.expansion_sizes {
					let outcome =
						runner.run_batch(depth, expansion_size, &config.grid.lambdas).await?;

					written += outcome.written.len();
					skipped += outcome.skipped.len();
				}
			},
		// Baseline and cross-encoder runs do not sweep the expansion grid.
		RerankMethod::None | RerankMethod::CrossEncoder => {
			let depth = config.grid.depths[0];
			let expansion_size = config.grid.expansion_sizes[0];
			let outcome = runner.run_batch(depth, expansion_size, &config.grid.lambdas).await?;

			written += outcome.written.len();
			skipped += outcome.skipped.len();
		},
	}

	if let Some(cache) = cache {
		cache.close()?;
		info!(judgments = cache.len(), "judgment cache closed");
	}

	info!(written, skipped, run_dir = %config.paths.run_dir.display(), "experiment complete");

	Ok(())
}

fn load_oracle_if_configured(
	config: &quex_config::Config,
	engine: &dyn SearchEngine,
) -> color_eyre::Result<Option<Oracle>> {
	let Some(qrels) = config.paths.qrels.as_deref() else {
		return Ok(None);
	};
	let oracle = load_oracle(qrels, engine)?;

	info!(topics = oracle.len(), qrels = %qrels.display(), "loaded qrels oracle");

	Ok(Some(oracle))
}

fn build_scorer(
	config: &quex_config::Config,
	strategy: FeedbackStrategy,
	rerank: RerankMethod,
	query_mode: QueryMode,
) -> color_eyre::Result<(Option<Arc<ScorerBackend>>, Option<Arc<JudgmentCache>>)> {
	let scorer_backed = strategy.needs_scorer() || rerank == RerankMethod::CrossEncoder;

	if !scorer_backed {
		return Ok((None, None));
	}

	let settings = config
		.scorer
		.as_ref()
		.ok_or_else(|| eyre!("scorer configuration is required for this strategy"))?;
	let backend = match settings.backend.as_str() {
		"cross-encoder" => ScorerBackend::CrossEncoder(CrossEncoderScorer::new(
			settings.endpoint.clone(),
			settings.timeout_ms,
		)?),
		_ => ScorerBackend::LlmJudge(LlmJudgeScorer::new(
			settings.endpoint.clone(),
			settings.timeout_ms,
		)?),
	};
	let cache_path = config
		.paths
		.cache_dir
		.join(backend.log_format().cache_file_name(query_mode.label()));
	let cache = JudgmentCache::open(&cache_path, backend.log_format())?;

	Ok((Some(Arc::new(backend)), Some(Arc::new(cache))))
}
