use std::{sync::OnceLock, time::Duration};

use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::Result;

/// The judgment the rest of the system consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Judgment {
	pub is_relevant: bool,
	pub prob_true: f64,
	pub score: f64,
}

/// The full backend record, persisted to the cache log. Backends that do not
/// expose logits carry negative infinity there, mirroring their wire
/// defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgmentRecord {
	pub is_relevant: bool,
	pub prediction: String,
	pub logit_true: f64,
	pub logit_false: f64,
	pub prob_true: f64,
	pub prob_false: f64,
	pub score: f64,
}

impl JudgmentRecord {
	/// Degraded record for a failed cross-encoder call.
	pub fn negative_cross_encoder() -> Self {
		Self {
			is_relevant: false,
			prediction: "false".to_string(),
			logit_true: f64::NEG_INFINITY,
			logit_false: f64::NEG_INFINITY,
			prob_true: 0.0,
			prob_false: 0.0,
			score: 0.0,
		}
	}

	/// Degraded record for a failed LLM-judge call.
	pub fn negative_llm_judge() -> Self {
		Self {
			is_relevant: false,
			prediction: "false".to_string(),
			logit_true: f64::NEG_INFINITY,
			logit_false: f64::NEG_INFINITY,
			prob_true: 0.0,
			prob_false: 1.0,
			score: 0.0,
		}
	}

	pub fn judgment(&self) -> Judgment {
		Judgment { is_relevant: self.is_relevant, prob_true: self.prob_true, score: self.score }
	}
}

#[derive(Debug, Clone, Copy)]
pub struct JudgeRequest<'a> {
	pub query: &'a str,
	/// Optional assessor instructions, e.g. a topic narrative.
	pub instructions: Option<&'a str>,
	pub document: &'a str,
}

/// Cache log layout. Column orders are fixed per backend; logs from one
/// backend are not readable as the other's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
	/// `query_id doc_id prediction logit_true logit_false prob_true
	/// prob_false score`
	CrossEncoder,
	/// `query_id doc_id is_relevant prob_true prob_false`
	LlmJudge,
}

impl LogFormat {
	pub fn cache_file_name(&self, query_mode: &str) -> String {
		match self {
			Self::CrossEncoder => "cross_encoder_cache.tsv".to_string(),
			Self::LlmJudge => format!("llm_judge_cache_{query_mode}.tsv"),
		}
	}

	pub fn format_line(&self, query_id: u32, doc_id: u32, record: &JudgmentRecord) -> String {
		match self {
			Self::CrossEncoder => format!(
				"{}\t{}\t{}\t{:.16}\t{:.16}\t{:.16}\t{:.16}\t{:.16}\n",
				query_id,
				doc_id,
				record.prediction,
				record.logit_true,
				record.logit_false,
				record.prob_true,
				record.prob_false,
				record.score,
			),
			Self::LlmJudge => format!(
				"{}\t{}\t{}\t{:.16}\t{:.16}\n",
				query_id, doc_id, record.is_relevant, record.prob_true, record.prob_false,
			),
		}
	}

	/// Parse one replayed log line. Short or malformed lines are dropped.
	pub fn parse_line(&self, line: &str) -> Option<(u32, u32, Judgment)> {
		let parts = line.split('\t').collect::<Vec<_>>();

		match self {
			Self::CrossEncoder => {
				if parts.len() < 8 {
					return None;
				}

				let query_id = parts[0].parse().ok()?;
				let doc_id = parts[1].parse().ok()?;
				let is_relevant = parts[2].eq_ignore_ascii_case("true");
				let prob_true = parts[5].parse().ok()?;
				let score = parts[7].parse().ok()?;

				Some((query_id, doc_id, Judgment { is_relevant, prob_true, score }))
			},
			Self::LlmJudge => {
				if parts.len() < 5 {
					return None;
				}

				let query_id = parts[0].parse().ok()?;
				let doc_id = parts[1].parse().ok()?;
				let is_relevant = parts[2].eq_ignore_ascii_case("true");
				let prob_true: f64 = parts[3].parse().ok()?;

				Some((query_id, doc_id, Judgment { is_relevant, prob_true, score: prob_true }))
			},
		}
	}
}

/// A relevance-judgment backend. Judging never fails: transport and parse
/// errors degrade to the backend's negative record so one bad call cannot
/// abort a batch.
pub trait Scorer: Send + Sync {
	fn judge(
		&self,
		request: JudgeRequest<'_>,
	) -> impl std::future::Future<Output = JudgmentRecord> + Send;

	fn log_format(&self) -> LogFormat;
}

/// Cross-encoder scoring service: POST `{"query", "document"}`, response
/// carries a prediction token, logits, probabilities, and a scalar score.
pub struct CrossEncoderScorer {
	client: Client,
	endpoint: String,
}

impl CrossEncoderScorer {
	pub fn new(endpoint: impl Into<String>, timeout_ms: u64) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?;

		Ok(Self { client, endpoint: endpoint.into() })
	}

	async fn call(&self, request: JudgeRequest<'_>) -> reqwest::Result<Value> {
		let body = serde_json::json!({
			"query": request.query,
			"document": request.document,
		});

		self.client
			.post(&self.endpoint)
			.json(&body)
			.send()
			.await?
			.error_for_status()?
			.json()
			.await
	}
}

impl Scorer for CrossEncoderScorer {
	async fn judge(&self, request: JudgeRequest<'_>) -> JudgmentRecord {
		match self.call(request).await {
			Ok(json) => parse_cross_encoder_response(&json),
			Err(err) => {
				warn!(error = %err, "cross-encoder call failed, recording negative judgment");
				JudgmentRecord::negative_cross_encoder()
			},
		}
	}

	fn log_format(&self) -> LogFormat {
		LogFormat::CrossEncoder
	}
}

fn json_f64(json: &Value, key: &str, default: f64) -> f64 {
	json.get(key).and_then(Value::as_f64).unwrap_or(default)
}

fn parse_cross_encoder_response(json: &Value) -> JudgmentRecord {
	let prediction =
		json.get("prediction").and_then(Value::as_str).unwrap_or("false").to_string();

	JudgmentRecord {
		is_relevant: prediction.eq_ignore_ascii_case("true"),
		logit_true: json_f64(json, "logit_true", f64::NEG_INFINITY),
		logit_false: json_f64(json, "logit_false", f64::NEG_INFINITY),
		prob_true: json_f64(json, "prob_true", f64::NEG_INFINITY),
		prob_false: json_f64(json, "prob_false", f64::NEG_INFINITY),
		score: json_f64(json, "score", f64::NEG_INFINITY),
		prediction,
	}
}

/// LLM judge service: POST `{"prompt"}` with a TREC-assessor prompt,
/// response `{"p_true", "p_false"}`; relevant iff `p_true > p_false`.
pub struct LlmJudgeScorer {
	client: Client,
	endpoint: String,
}

impl LlmJudgeScorer {
	pub fn new(endpoint: impl Into<String>, timeout_ms: u64) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?;

		Ok(Self { client, endpoint: endpoint.into() })
	}

	async fn call(&self, prompt: &str) -> reqwest::Result<Value> {
		let body = serde_json::json!({ "prompt": prompt });

		self.client
			.post(&self.endpoint)
			.json(&body)
			.send()
			.await?
			.error_for_status()?
			.json()
			.await
	}
}

impl Scorer for LlmJudgeScorer {
	async fn judge(&self, request: JudgeRequest<'_>) -> JudgmentRecord {
		let prompt = build_assessor_prompt(request);

		match self.call(&prompt).await {
			Ok(json) => parse_llm_judge_response(&json),
			Err(err) => {
				warn!(error = %err, "LLM judge call failed, recording negative judgment");
				JudgmentRecord::negative_llm_judge()
			},
		}
	}

	fn log_format(&self) -> LogFormat {
		LogFormat::LlmJudge
	}
}

fn parse_llm_judge_response(json: &Value) -> JudgmentRecord {
	let prob_true = json_f64(json, "p_true", 0.0);
	let prob_false = json_f64(json, "p_false", 0.0);
	let is_relevant = prob_true > prob_false;

	JudgmentRecord {
		is_relevant,
		prediction: is_relevant.to_string(),
		logit_true: f64::NEG_INFINITY,
		logit_false: f64::NEG_INFINITY,
		prob_true,
		prob_false,
		score: prob_true,
	}
}

fn clean_document(document: &str) -> String {
	static COLLAPSE: OnceLock<Regex> = OnceLock::new();
	static SEPARATORS: OnceLock<Regex> = OnceLock::new();

	let collapse = COLLAPSE.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
	let separators = SEPARATORS.get_or_init(|| Regex::new(r"[|\-]+").expect("static regex"));

	let collapsed = collapse.replace_all(document.trim(), " ");

	separators.replace_all(&collapsed, " ").into_owned()
}

fn build_assessor_prompt(request: JudgeRequest<'_>) -> String {
	let instructions = match request.instructions.filter(|text| !text.is_empty()) {
		Some(text) => format!("Assessor instructions:\n{text}\n\n"),
		None => String::new(),
	};

	format!(
		"You are an expert TREC assessor. Your task is to judge relevance.\n\n\
		 Instructions:\n\
		 \t1. Read the query carefully.\n\
		 \t2. Read the document.\n\
		 \t3. Decide if the document provides information that answers or helps address the query.\n\
		 \t4. Respond with 'true' if the document is relevant, or 'false' if it is not.\n\n\
		 Query: {}\n\n\
		 {}Document:\n{}\n",
		request.query.trim(),
		instructions,
		clean_document(request.document),
	)
}

/// Config-selected backend. The runner decides the variant at startup.
pub enum ScorerBackend {
	CrossEncoder(CrossEncoderScorer),
	LlmJudge(LlmJudgeScorer),
}

impl Scorer for ScorerBackend {
	async fn judge(&self, request: JudgeRequest<'_>) -> JudgmentRecord {
		match self {
			Self::CrossEncoder(scorer) => scorer.judge(request).await,
			Self::LlmJudge(scorer) => scorer.judge(request).await,
		}
	}

	fn log_format(&self) -> LogFormat {
		match self {
			Self::CrossEncoder(scorer) => scorer.log_format(),
			Self::LlmJudge(scorer) => scorer.log_format(),
		}
	}
}
