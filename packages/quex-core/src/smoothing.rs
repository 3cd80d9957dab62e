use std::sync::{Arc, RwLock};

use ahash::{AHashMap, AHashSet};

use crate::{engine::DocId, stats::StatsProvider};

/// Document language-model estimator. Implementations must never return an
/// exactly-zero probability, so unseen terms stay rankable.
pub trait Smoothing: Send + Sync {
	/// Smoothed `P(term | document)`, in (0, 1], memoized per (term, doc).
	fn smoothed_prob(&self, term: &str, doc: DocId) -> f64;

	/// The document's vocabulary, memoized per doc; empty when the document
	/// has no term vector.
	fn doc_terms(&self, doc: DocId) -> Arc<AHashSet<String>>;

	/// Identifier used in run names.
	fn name(&self) -> String;
}

/// Additive (Lidstone) smoothing:
/// `(tf + alpha) / (doc_len + alpha * lexicon_size)`.
pub struct AdditiveSmoothing {
	alpha: f64,
	field: String,
	stats: Arc<StatsProvider>,
	probs: RwLock<AHashMap<(String, DocId), f64>>,
	terms: RwLock<AHashMap<DocId, Arc<AHashSet<String>>>>,
	doc_lens: RwLock<AHashMap<DocId, u64>>,
}

impl AdditiveSmoothing {
	pub fn new(alpha: f64, field: impl Into<String>, stats: Arc<StatsProvider>) -> Self {
		Self {
			alpha,
			field: field.into(),
			stats,
			probs: RwLock::new(AHashMap::new()),
			terms: RwLock::new(AHashMap::new()),
			doc_lens: RwLock::new(AHashMap::new()),
		}
	}

	fn doc_len(&self, doc: DocId) -> u64 {
		if let Some(len) = self.doc_lens.read().expect("length cache poisoned").get(&doc) {
			return *len;
		}

		let len = self.stats.doc_token_count(doc, &self.field);

		self.doc_lens.write().expect("length cache poisoned").insert(doc, len);

		len
	}

	fn compute(&self, term: &str, doc: DocId) -> f64 {
		let tf = self.stats.term_frequency(term, doc, &self.field) as f64;
		let doc_len = self.doc_len(doc) as f64;
		let lexicon_size = self.stats.collection_lexicon_size(&self.field) as f64;
		let denominator = doc_len + self.alpha * lexicon_size;

		// A degraded lexicon size of 0 together with a missing vector would
		// divide by zero; clamp so the estimate stays in (0, 1].
		if denominator <= 0.0 {
			return 1.0;
		}

		((tf + self.alpha) / denominator).min(1.0)
	}
}

impl Smoothing for AdditiveSmoothing {
	fn smoothed_prob(&self, term: &str, doc: DocId) -> f64 {
		let key = (term.to_string(), doc);

		if let Some(prob) = self.probs.read().expect("prob cache poisoned").get(&key) {
			return *prob;
		}

		let prob = self.compute(term, doc);

		self.probs.write().expect("prob cache poisoned").insert(key, prob);

		prob
	}

	fn doc_terms(&self, doc: DocId) -> Arc<AHashSet<String>> {
		if let Some(terms) = self.terms.read().expect("term cache poisoned").get(&doc) {
			return terms.clone();
		}

		let terms = match self.stats.term_vector(doc, &self.field) {
			Some(vector) => Arc::new(vector.keys().cloned().collect::<AHashSet<_>>()),
			None => Arc::new(AHashSet::new()),
		};

		self.terms.write().expect("term cache poisoned").insert(doc, terms.clone());

		terms
	}

	fn name(&self) -> String {
		format!("Additive-gamma-{:.2}", self.alpha)
	}
}
