//! End-to-end expansion over a fixed two-document collection, driving the
//! real StatsProvider and AdditiveSmoothing instead of stubs.

use std::sync::Arc;

use ahash::AHashMap;

use quex_core::{
	AdditiveSmoothing, DocId, RankedHit, Result, Rm3, SearchEngine, Smoothing, StatsProvider,
	TermWeights,
};

struct TwoDocEngine;

impl SearchEngine for TwoDocEngine {
	fn search(&self, _query: &TermWeights, _limit: usize) -> Result<Vec<RankedHit>> {
		Ok(Vec::new())
	}

	fn stored_field(&self, _doc: DocId, _field: &str) -> Result<Option<String>> {
		Ok(None)
	}

	fn term_vector(&self, doc: DocId, _field: &str) -> Result<Option<AHashMap<String, u64>>> {
		let entries: &[(&str, u64)] = match doc {
			// 10 tokens total, "river" and "bank" twice each.
			DocId(1) => &[("river", 2), ("bank", 2), ("water", 3), ("flow", 3)],
			// 5 tokens total, "bank" and "money" once each.
			DocId(2) => &[("bank", 1), ("money", 1), ("loan", 3)],
			_ => return Ok(None),
		};

		Ok(Some(entries.iter().map(|(term, tf)| (term.to_string(), *tf)).collect()))
	}

	fn lexicon_size(&self, _field: &str) -> Result<u64> {
		Ok(1_000)
	}

	fn lookup(&self, _external_id: &str) -> Result<Option<DocId>> {
		Ok(None)
	}

	fn tokenize(&self, text: &str) -> Vec<String> {
		text.split_whitespace().map(|token| token.to_lowercase()).collect()
	}
}

const ALPHA: f64 = 0.1;

fn smoothing() -> AdditiveSmoothing {
	let stats = Arc::new(StatsProvider::new(Arc::new(TwoDocEngine)));

	AdditiveSmoothing::new(ALPHA, "content", stats)
}

fn additive(tf: f64, doc_len: f64) -> f64 {
	(tf + ALPHA) / (doc_len + ALPHA * 1_000.0)
}

#[test]
fn smoothed_probability_is_positive_for_unseen_terms() {
	let smoothing = smoothing();

	let unseen = smoothing.smoothed_prob("glacier", DocId(1));
	let seen = smoothing.smoothed_prob("river", DocId(1));

	assert!(unseen > 0.0);
	assert!(seen > unseen);
	assert!(seen <= 1.0);
}

#[test]
fn smoothed_probability_is_positive_for_missing_documents() {
	let smoothing = smoothing();

	assert!(smoothing.smoothed_prob("river", DocId(99)) > 0.0);
}

#[test]
fn doc_terms_of_a_missing_document_are_empty() {
	let smoothing = smoothing();

	assert!(smoothing.doc_terms(DocId(99)).is_empty());
	assert_eq!(smoothing.doc_terms(DocId(2)).len(), 3);
}

#[test]
fn rm3_expansion_matches_the_closed_form() {
	let rm3 = Rm3::new(smoothing());
	let mut relevance_set = AHashMap::new();

	relevance_set.insert(DocId(1), 0.0);
	relevance_set.insert(DocId(2), -1.0);

	let weights = rm3.term_weights(&relevance_set);
	let discount = (-1.0f64).exp();

	let river = additive(2.0, 10.0) + additive(0.0, 5.0) * discount;
	let bank = additive(2.0, 10.0) + additive(1.0, 5.0) * discount;
	let money = additive(0.0, 10.0) + additive(1.0, 5.0) * discount;

	assert!((weights.weight("river") - river).abs() < 1e-12);
	assert!((weights.weight("bank") - bank).abs() < 1e-12);
	assert!((weights.weight("money") - money).abs() < 1e-12);
	assert!(weights.weight("bank") > weights.weight("river"));
}

/// Engine whose collection statistics are unavailable: every vector is
/// missing and the lexicon size fails outright.
struct BrokenStatsEngine;

impl SearchEngine for BrokenStatsEngine {
	fn search(&self, _query: &TermWeights, _limit: usize) -> Result<Vec<RankedHit>> {
		Ok(Vec::new())
	}

	fn stored_field(&self, _doc: DocId, _field: &str) -> Result<Option<String>> {
		Ok(None)
	}

	fn term_vector(&self, _doc: DocId, _field: &str) -> Result<Option<AHashMap<String, u64>>> {
		Ok(None)
	}

	fn lexicon_size(&self, _field: &str) -> Result<u64> {
		Err(quex_core::Error::engine("collection statistics unavailable"))
	}

	fn lookup(&self, _external_id: &str) -> Result<Option<DocId>> {
		Ok(None)
	}

	fn tokenize(&self, _text: &str) -> Vec<String> {
		Vec::new()
	}
}

#[test]
fn degraded_collection_statistics_keep_probabilities_in_the_unit_interval() {
	let stats = Arc::new(StatsProvider::new(Arc::new(BrokenStatsEngine)));
	let smoothing = AdditiveSmoothing::new(ALPHA, "content", stats);

	// Lexicon size degrades to 0 and the missing vector reads as length 0;
	// the estimate must stay finite and usable rather than dividing to
	// infinity.
	let prob = smoothing.smoothed_prob("river", DocId(1));

	assert!(prob.is_finite());
	assert!(prob > 0.0);
	assert!(prob <= 1.0);

	let rm3 = Rm3::new(smoothing);
	let mut relevance_set = AHashMap::new();

	relevance_set.insert(DocId(1), 0.0);

	let weights = rm3.term_weights(&relevance_set).scale_to_l1_norm();

	assert!(weights.iter().all(|(_, weight)| weight.is_finite()));
}

#[test]
fn pruned_and_normalized_expansion_keeps_the_heaviest_terms() {
	let rm3 = Rm3::new(smoothing());
	let mut relevance_set = AHashMap::new();

	relevance_set.insert(DocId(1), 0.0);
	relevance_set.insert(DocId(2), 0.0);

	let expanded = rm3.term_weights(&relevance_set).prune_to_size(3).scale_to_l1_norm();

	assert_eq!(expanded.len(), 3);
	assert!((expanded.l1_norm() - 1.0).abs() < 1e-9);
	// "loan" (tf 3 of 5 tokens) carries the single heaviest weight.
	assert!(expanded.weight("loan") > 0.0);
	assert!(expanded.weight("bank") > 0.0);
}
