//! Experiment orchestration: TREC topics and qrels, feedback-set
//! strategies, run-file conventions, and the concurrent resumable batch
//! runner.

pub mod batch;
pub mod qrels;
pub mod run_file;
pub mod strategy;
pub mod topics;

pub use batch::{BatchOutcome, BatchRunner, RunSettings};
pub use qrels::{Oracle, load_oracle};
pub use run_file::{RunNameParts, format_ranked_list, run_name};
pub use strategy::{FeedbackStrategy, RerankMethod};
pub use topics::{QueryMode, Topic, parse_topics};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read topics at {path:?}.")]
	ReadTopics { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to read qrels at {path:?}.")]
	ReadQrels { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to write run file at {path:?}.")]
	WriteRun { path: std::path::PathBuf, source: std::io::Error },
	#[error("Unknown feedback strategy {name:?}.")]
	UnknownStrategy { name: String },
	#[error("Unknown rerank method {name:?}.")]
	UnknownRerankMethod { name: String },
	#[error("Unknown query mode {name:?}.")]
	UnknownQueryMode { name: String },
	#[error("Feedback strategy {strategy} requires qrels.")]
	MissingOracle { strategy: String },
	#[error("Feedback strategy {strategy} requires a configured scorer.")]
	MissingScorer { strategy: String },
	#[error(transparent)]
	Core(#[from] quex_core::Error),
	#[error(transparent)]
	Judge(#[from] quex_judge::Error),
}
