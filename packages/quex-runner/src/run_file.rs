use std::fmt::Write;

use quex_core::RankedHit;

use crate::{FeedbackStrategy, RerankMethod, topics::QueryMode};

/// Everything a run name encodes about one configuration tuple.
#[derive(Debug, Clone, Copy)]
pub struct RunNameParts<'a> {
	pub rerank: RerankMethod,
	pub mu: f64,
	pub query_mode: QueryMode,
	pub strategy: FeedbackStrategy,
	pub smoothing_model: &'a str,
	pub smoothing_parameter: f64,
	pub depth: usize,
	pub lambda: f64,
	pub expansion_size: usize,
}

/// Descriptive run name, doubling as the output file name. The oracle
/// strategy takes every judged-relevant hit, so its name carries no `topK`
/// component.
pub fn run_name(parts: &RunNameParts) -> String {
	let base = format!("LMDirichlet-{:.0}_{}", parts.mu, parts.query_mode.label());

	match parts.rerank {
		RerankMethod::None => base,
		RerankMethod::CrossEncoder =>
			format!("{base}_rerank-cross-encoder_topK-{}", parts.depth),
		RerankMethod::Prf => {
			let top_k = if parts.strategy == FeedbackStrategy::Oracle {
				String::new()
			} else {
				format!("_topK-{}", parts.depth)
			};

			format!(
				"{base}_prf-true_rfStrategy-{}_rfModel-RM3_prfSmoothing-{}-{:.4}{top_k}_lambda-{:.2}_e-{}",
				parts.strategy.label(),
				parts.smoothing_model,
				parts.smoothing_parameter,
				parts.lambda,
				parts.expansion_size,
			)
		},
	}
}

/// Format one topic's ranked list as TREC run lines. The run tag appears on
/// rank 1 only, `--` elsewhere.
pub fn format_ranked_list(
	topic: u32,
	hits: &[RankedHit],
	docnos: &[String],
	run_name: &str,
) -> String {
	let mut lines = String::new();

	for (i, (hit, docno)) in hits.iter().zip(docnos).enumerate() {
		let tag = if i == 0 { run_name } else { "--" };
		let _ = writeln!(lines, "{topic} Q0 {docno} {} {:.6} {tag}", i + 1, hit.score);
	}

	lines
}

#[cfg(test)]
mod tests {
	use super::*;
	use quex_core::DocId;

	fn parts(rerank: RerankMethod, strategy: FeedbackStrategy) -> RunNameParts<'static> {
		RunNameParts {
			rerank,
			mu: 2000.0,
			query_mode: QueryMode::Title,
			strategy,
			smoothing_model: "Additive",
			smoothing_parameter: 0.1,
			depth: 10,
			lambda: 0.6,
			expansion_size: 20,
		}
	}

	#[test]
	fn baseline_name_carries_only_model_and_mode() {
		assert_eq!(
			run_name(&parts(RerankMethod::None, FeedbackStrategy::TopK)),
			"LMDirichlet-2000_title"
		);
	}

	#[test]
	fn cross_encoder_name_carries_the_rerank_depth() {
		assert_eq!(
			run_name(&parts(RerankMethod::CrossEncoder, FeedbackStrategy::TopK)),
			"LMDirichlet-2000_title_rerank-cross-encoder_topK-10"
		);
	}

	#[test]
	fn prf_name_encodes_the_full_tuple() {
		assert_eq!(
			run_name(&parts(RerankMethod::Prf, FeedbackStrategy::TopK)),
			"LMDirichlet-2000_title_prf-true_rfStrategy-top-k_rfModel-RM3_prfSmoothing-Additive-0.1000_topK-10_lambda-0.60_e-20"
		);
	}

	#[test]
	fn oracle_name_omits_the_depth() {
		let name = run_name(&parts(RerankMethod::Prf, FeedbackStrategy::Oracle));

		assert!(!name.contains("topK"));
		assert!(name.contains("rfStrategy-oracle_"));

		let capped = run_name(&parts(RerankMethod::Prf, FeedbackStrategy::OracleK));

		assert!(capped.contains("_topK-10_"));
	}

	#[test]
	fn run_lines_tag_only_the_first_rank() {
		let hits = vec![
			RankedHit { doc: DocId(0), score: 1.25 },
			RankedHit { doc: DocId(1), score: 0.5 },
		];
		let docnos = vec!["D7".to_string(), "D2".to_string()];
		let lines = format_ranked_list(401, &hits, &docnos, "run-a");

		assert_eq!(lines, "401 Q0 D7 1 1.250000 run-a\n401 Q0 D2 2 0.500000 --\n");
	}
}
