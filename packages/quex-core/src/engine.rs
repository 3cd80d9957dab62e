use ahash::AHashMap;

use crate::{Result, weights::TermWeights};

/// Opaque per-snapshot document identifier. Only meaningful against the
/// engine instance that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocId(pub u32);

impl std::fmt::Display for DocId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.0.fmt(f)
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedHit {
	pub doc: DocId,
	pub score: f32,
}

/// The statistics/query surface the expansion core needs from a retrieval
/// engine. The engine itself (ingestion, tokenization internals, ranking
/// function) stays behind this trait.
pub trait SearchEngine: Send + Sync {
	/// Ranked retrieval for a weighted term query, best first, at most
	/// `limit` hits.
	fn search(&self, query: &TermWeights, limit: usize) -> Result<Vec<RankedHit>>;

	/// Stored field value for a document, `None` when absent.
	fn stored_field(&self, doc: DocId, field: &str) -> Result<Option<String>>;

	/// Full term-frequency vector of a document field, `None` when the
	/// document has no vector for that field.
	fn term_vector(&self, doc: DocId, field: &str) -> Result<Option<AHashMap<String, u64>>>;

	/// Count of distinct terms in a field across the whole collection.
	fn lexicon_size(&self, field: &str) -> Result<u64>;

	/// Resolve an external document identifier to the snapshot-local id.
	fn lookup(&self, external_id: &str) -> Result<Option<DocId>>;

	/// Analyze free text into the engine's normalized tokens.
	fn tokenize(&self, text: &str) -> Vec<String>;
}
