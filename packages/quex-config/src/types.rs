use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub paths: Paths,
	pub search: Search,
	pub rerank: Rerank,
	pub feedback: Feedback,
	pub grid: Grid,
	pub scorer: Option<Scorer>,
	pub runner: Runner,
}

#[derive(Debug, Deserialize)]
pub struct Paths {
	/// JSONL corpus: one `{"docno": .., "content": ..}` object per line.
	pub corpus: PathBuf,
	pub topics: PathBuf,
	pub qrels: Option<PathBuf>,
	pub cache_dir: PathBuf,
	pub run_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	#[serde(default = "default_field")]
	pub field: String,
	#[serde(default = "default_docid_field")]
	pub docid_field: String,
	#[serde(default = "default_query_mode")]
	pub query_mode: String,
	#[serde(default = "default_mu")]
	pub mu: f64,
	#[serde(default = "default_depth")]
	pub depth: usize,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Rerank {
	pub method: String,
}

#[derive(Debug, Deserialize)]
pub struct Feedback {
	pub strategy: String,
	#[serde(default = "default_smoothing")]
	pub smoothing: String,
	#[serde(default = "default_smoothing_parameter")]
	pub smoothing_parameter: f64,
}

#[derive(Debug, Deserialize)]
pub struct Grid {
	pub depths: Vec<usize>,
	pub expansion_sizes: Vec<usize>,
	pub lambdas: Vec<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Scorer {
	pub backend: String,
	pub endpoint: String,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Runner {
	#[serde(default = "default_max_workers")]
	pub max_workers: usize,
	#[serde(default)]
	pub force_sequential: bool,
}

fn default_field() -> String {
	"content".to_string()
}

fn default_docid_field() -> String {
	"docno".to_string()
}

fn default_query_mode() -> String {
	"title".to_string()
}

fn default_mu() -> f64 {
	2_000.0
}

fn default_depth() -> usize {
	1_000
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_smoothing() -> String {
	"additive".to_string()
}

fn default_smoothing_parameter() -> f64 {
	0.1
}

fn default_timeout_ms() -> u64 {
	30_000
}

fn default_max_workers() -> usize {
	8
}
