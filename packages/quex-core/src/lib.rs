//! Query-expansion core: the narrow statistics interface over an index
//! snapshot, document language-model smoothing, and RM3 relevance feedback
//! over sparse term-weight vectors.

pub mod engine;
pub mod rm3;
pub mod smoothing;
pub mod stats;
pub mod weights;

pub use engine::{DocId, RankedHit, SearchEngine};
pub use rm3::Rm3;
pub use smoothing::{AdditiveSmoothing, Smoothing};
pub use stats::StatsProvider;
pub use weights::TermWeights;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Index engine error: {message}")]
	Engine { message: String },
}

impl Error {
	pub fn engine(message: impl Into<String>) -> Self {
		Self::Engine { message: message.into() }
	}
}
