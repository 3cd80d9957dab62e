use ahash::{AHashMap, AHashSet};

/// Sparse weighted-term vector. Keys are normalized tokens, weights are
/// unconstrained reals until `scale_to_l1_norm`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermWeights {
	weights: AHashMap<String, f64>,
}

impl TermWeights {
	pub fn new() -> Self {
		Self::default()
	}

	/// Uniform vector from a token sequence: 1.0 per occurrence, summed for
	/// repeats.
	pub fn from_terms<I, S>(terms: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut weights = Self::new();

		for term in terms {
			weights.add_weight(term.as_ref(), 1.0);
		}

		weights
	}

	/// Union-key mix: `original_weight * original(t) + (1 - original_weight)
	/// * expanded(t)`, absent terms contributing zero.
	pub fn interpolate(original: &Self, expanded: &Self, original_weight: f64) -> Self {
		let mut mixed_terms = AHashSet::new();

		mixed_terms.extend(original.weights.keys());
		mixed_terms.extend(expanded.weights.keys());

		let mut interpolated = Self::new();

		for term in mixed_terms {
			let weight = original.weight(term) * original_weight
				+ (1.0 - original_weight) * expanded.weight(term);

			interpolated.add_weight(term, weight);
		}

		interpolated
	}

	pub fn add_weight(&mut self, term: &str, weight: f64) {
		if let Some(existing) = self.weights.get_mut(term) {
			*existing += weight;
		} else {
			self.weights.insert(term.to_string(), weight);
		}
	}

	pub fn weight(&self, term: &str) -> f64 {
		self.weights.get(term).copied().unwrap_or(0.0)
	}

	/// Sum of the absolute values of the weights.
	pub fn l1_norm(&self) -> f64 {
		self.weights.values().map(|weight| weight.abs()).sum()
	}

	/// Divide every weight by the L1 norm. No-op on an empty or all-zero
	/// vector.
	pub fn scale_to_l1_norm(mut self) -> Self {
		let norm = self.l1_norm();

		if norm > 0.0 {
			for weight in self.weights.values_mut() {
				*weight /= norm;
			}
		}

		self
	}

	/// Keep the `size` largest weights, ties broken by term order so a prune
	/// is deterministic.
	pub fn prune_to_size(mut self, size: usize) -> Self {
		if self.weights.len() <= size {
			return self;
		}

		let mut entries = self.weights.into_iter().collect::<Vec<_>>();

		entries.sort_by(|(term_a, weight_a), (term_b, weight_b)| {
			weight_b.total_cmp(weight_a).then_with(|| term_a.cmp(term_b))
		});
		entries.truncate(size);

		self.weights = entries.into_iter().collect();
		self
	}

	pub fn len(&self) -> usize {
		self.weights.len()
	}

	pub fn is_empty(&self) -> bool {
		self.weights.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
		self.weights.iter().map(|(term, weight)| (term.as_str(), *weight))
	}
}
