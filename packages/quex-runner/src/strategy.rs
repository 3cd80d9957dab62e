use ahash::AHashMap;

use quex_core::{DocId, RankedHit};

use crate::{Error, Result, qrels::Oracle};

/// How the pseudo-relevant document set is derived from an initial ranked
/// list. A closed set, selected from configuration at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackStrategy {
	/// Top-k hits are assumed relevant, weighted by retrieval score.
	TopK,
	/// All oracle-judged relevant documents in the ranked list.
	Oracle,
	/// Oracle-judged relevant documents, capped at k.
	OracleK,
	/// Scorer-judged relevant documents, weighted by retrieval score.
	Judge,
	/// Scorer-judged relevant documents, weighted by judged probability.
	JudgeProb,
}

impl FeedbackStrategy {
	pub fn parse(name: &str) -> Result<Self> {
		match name {
			"top-k" => Ok(Self::TopK),
			"oracle" => Ok(Self::Oracle),
			"oracle-k" => Ok(Self::OracleK),
			"judge" => Ok(Self::Judge),
			"judge-prob" => Ok(Self::JudgeProb),
			_ => Err(Error::UnknownStrategy { name: name.to_string() }),
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			Self::TopK => "top-k",
			Self::Oracle => "oracle",
			Self::OracleK => "oracle-k",
			Self::Judge => "judge",
			Self::JudgeProb => "judge-prob",
		}
	}

	pub fn needs_oracle(&self) -> bool {
		matches!(self, Self::Oracle | Self::OracleK)
	}

	pub fn needs_scorer(&self) -> bool {
		matches!(self, Self::Judge | Self::JudgeProb)
	}
}

/// How run output is produced from the baseline ranked list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RerankMethod {
	None,
	CrossEncoder,
	Prf,
}

impl RerankMethod {
	pub fn parse(name: &str) -> Result<Self> {
		match name {
			"none" => Ok(Self::None),
			"cross-encoder" => Ok(Self::CrossEncoder),
			"prf" => Ok(Self::Prf),
			_ => Err(Error::UnknownRerankMethod { name: name.to_string() }),
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			Self::None => "none",
			Self::CrossEncoder => "cross-encoder",
			Self::Prf => "prf",
		}
	}
}

/// Top-k pseudo-relevance: the k best hits with their retrieval scores.
pub fn top_k_set(hits: &[RankedHit], k: usize) -> AHashMap<DocId, f64> {
	hits.iter().take(k).map(|hit| (hit.doc, hit.score as f64)).collect()
}

/// Oracle pseudo-relevance: walk the ranked list and keep judged-relevant
/// documents, at most `max_docs` of them, weighted by retrieval score.
pub fn oracle_set(
	oracle: &Oracle,
	topic: u32,
	hits: &[RankedHit],
	max_docs: usize,
) -> AHashMap<DocId, f64> {
	let mut selected = AHashMap::new();
	let Some(relevant) = oracle.get(&topic) else {
		return selected;
	};

	for hit in hits {
		if relevant.contains(&hit.doc) {
			selected.insert(hit.doc, hit.score as f64);

			if selected.len() >= max_docs {
				break;
			}
		}
	}

	selected
}
