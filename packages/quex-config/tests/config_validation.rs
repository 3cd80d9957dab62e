use quex_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = r#"
[paths]
corpus    = "data/corpus.jsonl"
topics    = "data/topics.txt"
qrels     = "data/qrels.txt"
cache_dir = "cache"
run_dir   = "runs"

[search]
field      = "content"
query_mode = "title"
mu         = 2000.0
depth      = 1000

[rerank]
method = "prf"

[feedback]
strategy            = "top-k"
smoothing           = "additive"
smoothing_parameter = 0.1

[grid]
depths          = [10, 100]
expansion_sizes = [10, 20]
lambdas         = [0.0, 0.5, 1.0]

[scorer]
backend    = "llm-judge"
endpoint   = "http://localhost:8080/prob"
timeout_ms = 30000

[runner]
max_workers = 4
"#;

fn parse(raw: &str) -> Config {
	toml::from_str(raw).expect("Failed to parse sample config.")
}

fn with_replacement(from: &str, to: &str) -> Config {
	assert!(SAMPLE_CONFIG_TOML.contains(from), "sample config must contain {from:?}");
	parse(&SAMPLE_CONFIG_TOML.replace(from, to))
}

#[test]
fn accepts_sample_config() {
	quex_config::validate(&parse(SAMPLE_CONFIG_TOML)).expect("Sample config must validate.");
}

#[test]
fn rejects_unknown_rerank_method() {
	let cfg = with_replacement("method = \"prf\"", "method = \"bm25\"");
	let err = quex_config::validate(&cfg).expect_err("Unknown rerank method must be rejected.");

	assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn rejects_unknown_feedback_strategy() {
	let cfg = with_replacement("strategy            = \"top-k\"", "strategy = \"random\"");

	quex_config::validate(&cfg).expect_err("Unknown feedback strategy must be rejected.");
}

#[test]
fn rejects_zero_smoothing_parameter() {
	let cfg = with_replacement("smoothing_parameter = 0.1", "smoothing_parameter = 0.0");

	quex_config::validate(&cfg).expect_err("Zero smoothing parameter must be rejected.");
}

#[test]
fn rejects_lambda_outside_unit_interval() {
	let cfg = with_replacement("lambdas         = [0.0, 0.5, 1.0]", "lambdas = [0.0, 1.5]");

	quex_config::validate(&cfg).expect_err("Lambdas above 1.0 must be rejected.");
}

#[test]
fn rejects_empty_grid_depths() {
	let cfg = with_replacement("depths          = [10, 100]", "depths = []");

	quex_config::validate(&cfg).expect_err("Empty depth grid must be rejected.");
}

#[test]
fn rejects_zero_workers() {
	let cfg = with_replacement("max_workers = 4", "max_workers = 0");

	quex_config::validate(&cfg).expect_err("Zero workers must be rejected.");
}

#[test]
fn requires_scorer_for_judge_strategy() {
	let raw = SAMPLE_CONFIG_TOML
		.replace("strategy            = \"top-k\"", "strategy = \"judge\"")
		.replace("[scorer]", "[scorer_unused]");
	let cfg = parse(&raw);

	quex_config::validate(&cfg).expect_err("Judge strategy without a scorer must be rejected.");
}

#[test]
fn requires_qrels_for_oracle_strategy() {
	let raw = SAMPLE_CONFIG_TOML
		.replace("strategy            = \"top-k\"", "strategy = \"oracle\"")
		.replace("qrels     = \"data/qrels.txt\"\n", "");
	let cfg = parse(&raw);

	quex_config::validate(&cfg).expect_err("Oracle strategy without qrels must be rejected.");
}

#[test]
fn normalizes_empty_qrels_to_none() {
	let dir = tempfile::tempdir().expect("Failed to create temp dir.");
	let path = dir.path().join("quex.toml");
	let raw = SAMPLE_CONFIG_TOML.replace("qrels     = \"data/qrels.txt\"", "qrels = \"\"");

	std::fs::write(&path, raw).expect("Failed to write config.");

	let cfg = quex_config::load(&path).expect("Config with empty qrels must load.");

	assert!(cfg.paths.qrels.is_none());
}

#[test]
fn load_reports_missing_file() {
	let err = quex_config::load(std::path::Path::new("/nonexistent/quex.toml"))
		.expect_err("Missing config file must be reported.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}
