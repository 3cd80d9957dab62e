use ahash::{AHashMap, AHashSet};

use crate::{engine::DocId, smoothing::Smoothing, weights::TermWeights};

/// RM3 relevance feedback: an expanded term distribution built as a
/// relevance-weighted mixture of the pseudo-relevant documents' language
/// models.
pub struct Rm3<S> {
	smoothing: S,
}

impl<S: Smoothing> Rm3<S> {
	pub fn new(smoothing: S) -> Self {
		Self { smoothing }
	}

	/// Expansion weights over the union vocabulary of the relevance set.
	///
	/// Each document weight is a log-query-likelihood-equivalent score, so a
	/// document's contribution to a term is `exp(ln P(t|d) + weight(d))`.
	/// An empty set yields an empty vector; documents without a term vector
	/// contribute an empty vocabulary.
	pub fn term_weights(&self, relevance_set: &AHashMap<DocId, f64>) -> TermWeights {
		let mut vocab = AHashSet::new();

		for doc in relevance_set.keys() {
			vocab.extend(self.smoothing.doc_terms(*doc).iter().cloned());
		}

		let mut weights = TermWeights::new();

		for term in &vocab {
			let mut weight = 0.0;

			for (doc, log_likelihood) in relevance_set {
				weight += self.term_doc_weight(term, *doc, *log_likelihood);
			}

			weights.add_weight(term, weight);
		}

		weights
	}

	fn term_doc_weight(&self, term: &str, doc: DocId, log_likelihood: f64) -> f64 {
		let prob = self.smoothing.smoothed_prob(term, doc);

		(prob.ln() + log_likelihood).exp()
	}

	pub fn name(&self) -> String {
		format!("RM3-docsmoothing-{}", self.smoothing.name())
	}
}
