//! External relevance judgments: two interchangeable HTTP scorer backends
//! and a persistent, replayable cache over (query, document) pairs.

pub mod cache;
pub mod scorer;

pub use cache::JudgmentCache;
pub use scorer::{
	CrossEncoderScorer, JudgeRequest, Judgment, JudgmentRecord, LlmJudgeScorer, LogFormat,
	Scorer, ScorerBackend,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to open judgment cache at {path:?}.")]
	OpenCache { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to append to judgment cache at {path:?}.")]
	AppendCache { path: std::path::PathBuf, source: std::io::Error },
	#[error(transparent)]
	Http(#[from] reqwest::Error),
}
