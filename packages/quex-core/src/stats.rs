use std::sync::{Arc, RwLock};

use ahash::AHashMap;
use tracing::warn;

use crate::engine::{DocId, SearchEngine};

/// Read-only statistics accessor over one index snapshot.
///
/// The first statistic asked about a (document, field) pulls the document's
/// whole term vector into memory; every later term-frequency or length query
/// for it is served from the cache. Lexicon sizes are cached per field for
/// the provider's lifetime.
///
/// Caches tolerate concurrent use, but a provider is meant to be owned by a
/// single worker; the runner creates one per worker instead of funneling all
/// workers through one instance's locks.
pub struct StatsProvider {
	engine: Arc<dyn SearchEngine>,
	vectors: RwLock<AHashMap<(DocId, String), Option<Arc<AHashMap<String, u64>>>>>,
	lexicon_sizes: RwLock<AHashMap<String, u64>>,
}

impl StatsProvider {
	pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
		Self {
			engine,
			vectors: RwLock::new(AHashMap::new()),
			lexicon_sizes: RwLock::new(AHashMap::new()),
		}
	}

	/// Frequency of `term` in the document's field; 0 for unseen terms and
	/// for documents without a stored vector.
	pub fn term_frequency(&self, term: &str, doc: DocId, field: &str) -> u64 {
		self.term_vector(doc, field)
			.map(|vector| vector.get(term).copied().unwrap_or(0))
			.unwrap_or(0)
	}

	/// Total token count of the document's field; 0 when the vector is
	/// absent.
	pub fn doc_token_count(&self, doc: DocId, field: &str) -> u64 {
		self.term_vector(doc, field)
			.map(|vector| vector.values().sum())
			.unwrap_or(0)
	}

	/// Distinct terms of a field across the collection, invariant for a
	/// static snapshot and cached after the first fetch.
	pub fn collection_lexicon_size(&self, field: &str) -> u64 {
		if let Some(size) = self
			.lexicon_sizes
			.read()
			.expect("lexicon cache poisoned")
			.get(field)
		{
			return *size;
		}

		let size = match self.engine.lexicon_size(field) {
			Ok(size) => size,
			Err(err) => {
				warn!(field, error = %err, "lexicon size unavailable");
				0
			},
		};

		self.lexicon_sizes
			.write()
			.expect("lexicon cache poisoned")
			.insert(field.to_string(), size);

		size
	}

	/// Cached full term vector, `None` when the document has no vector for
	/// the field. A racing recompute may fetch twice; both writers store the
	/// same value.
	pub fn term_vector(&self, doc: DocId, field: &str) -> Option<Arc<AHashMap<String, u64>>> {
		{
			let vectors = self.vectors.read().expect("vector cache poisoned");

			if let Some(cached) = vectors.get(&(doc, field.to_string())) {
				return cached.clone();
			}
		}

		let fetched = match self.engine.term_vector(doc, field) {
			Ok(vector) => vector.map(Arc::new),
			Err(err) => {
				warn!(doc = %doc, field, error = %err, "term vector unavailable");
				None
			},
		};

		self.vectors
			.write()
			.expect("vector cache poisoned")
			.insert((doc, field.to_string()), fetched.clone());

		fetched
	}
}
