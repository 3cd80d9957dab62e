use std::{
	fs,
	sync::atomic::{AtomicUsize, Ordering},
};

use quex_judge::{JudgeRequest, JudgmentCache, JudgmentRecord, LogFormat, Scorer};

/// Deterministic in-process scorer counting how often it is invoked.
struct CountingScorer {
	calls: AtomicUsize,
	record: JudgmentRecord,
}

impl CountingScorer {
	fn relevant() -> Self {
		Self {
			calls: AtomicUsize::new(0),
			record: JudgmentRecord {
				is_relevant: true,
				prediction: "true".to_string(),
				logit_true: 1.0,
				logit_false: -1.0,
				prob_true: 0.75,
				prob_false: 0.25,
				score: 0.75,
			},
		}
	}

	fn failing() -> Self {
		Self { calls: AtomicUsize::new(0), record: JudgmentRecord::negative_llm_judge() }
	}

	fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl Scorer for CountingScorer {
	async fn judge(&self, _request: JudgeRequest<'_>) -> JudgmentRecord {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.record.clone()
	}

	fn log_format(&self) -> LogFormat {
		LogFormat::LlmJudge
	}
}

#[tokio::test]
async fn identical_keys_hit_the_cache_after_one_call() {
	let dir = tempfile::tempdir().expect("Failed to create temp dir.");
	let path = dir.path().join("cache.tsv");
	let cache = JudgmentCache::open(&path, LogFormat::LlmJudge).expect("Failed to open cache.");
	let scorer = CountingScorer::relevant();

	assert!(cache.is_empty());

	let first =
		cache.get(401, 7, "rivers", None, "river bank", &scorer).await.expect("first get");
	let second =
		cache.get(401, 7, "rivers", None, "river bank", &scorer).await.expect("second get");

	assert_eq!(first, second);
	assert_eq!(scorer.calls(), 1);
	assert_eq!(cache.len(), 1);
	assert!(!cache.is_empty());
}

#[tokio::test]
async fn judgments_survive_a_reopen() {
	let dir = tempfile::tempdir().expect("Failed to create temp dir.");
	let path = dir.path().join("cache.tsv");
	let scorer = CountingScorer::relevant();

	{
		let cache =
			JudgmentCache::open(&path, LogFormat::LlmJudge).expect("Failed to open cache.");

		cache.get(401, 7, "rivers", None, "river bank", &scorer).await.expect("get");
		cache.close().expect("close");
	}

	let reopened = JudgmentCache::open(&path, LogFormat::LlmJudge).expect("Failed to reopen.");
	let judgment =
		reopened.get(401, 7, "rivers", None, "river bank", &scorer).await.expect("get");

	assert_eq!(scorer.calls(), 1);
	assert!(judgment.is_relevant);
	assert!((judgment.prob_true - 0.75).abs() < 1e-12);
}

#[tokio::test]
async fn replay_keeps_the_last_value_for_duplicate_keys() {
	let dir = tempfile::tempdir().expect("Failed to create temp dir.");
	let path = dir.path().join("cache.tsv");

	fs::write(
		&path,
		concat!(
			"401\t7\tfalse\t0.1000000000000000\t0.9000000000000000\n",
			"401\t7\ttrue\t0.8000000000000000\t0.2000000000000000\n",
		),
	)
	.expect("Failed to seed cache file.");

	let cache = JudgmentCache::open(&path, LogFormat::LlmJudge).expect("Failed to open cache.");
	let scorer = CountingScorer::relevant();
	let judgment = cache.get(401, 7, "rivers", None, "doc", &scorer).await.expect("get");

	assert_eq!(cache.len(), 1);
	assert_eq!(scorer.calls(), 0);
	assert!(judgment.is_relevant);
	assert!((judgment.prob_true - 0.8).abs() < 1e-12);
}

#[tokio::test]
async fn malformed_lines_are_dropped_on_replay() {
	let dir = tempfile::tempdir().expect("Failed to create temp dir.");
	let path = dir.path().join("cache.tsv");

	fs::write(&path, "garbage line\n401\t7\ttrue\t0.5\t0.5\n").expect("Failed to seed cache.");

	let cache = JudgmentCache::open(&path, LogFormat::LlmJudge).expect("Failed to open cache.");

	assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn degraded_judgments_are_persisted_like_genuine_negatives() {
	let dir = tempfile::tempdir().expect("Failed to create temp dir.");
	let path = dir.path().join("cache.tsv");
	let cache = JudgmentCache::open(&path, LogFormat::LlmJudge).expect("Failed to open cache.");
	let scorer = CountingScorer::failing();
	let judgment = cache.get(402, 9, "rivers", None, "doc", &scorer).await.expect("get");

	assert!(!judgment.is_relevant);
	assert_eq!(judgment.prob_true, 0.0);

	let log = fs::read_to_string(&path).expect("Failed to read log.");

	// The degraded record is indistinguishable from a genuine negative.
	assert!(log.starts_with("402\t9\tfalse\t0.0000000000000000\t1.0000000000000000"));
}

#[tokio::test]
async fn cross_encoder_log_uses_the_eight_column_layout() {
	let dir = tempfile::tempdir().expect("Failed to create temp dir.");
	let path = dir.path().join("cache.tsv");
	let cache =
		JudgmentCache::open(&path, LogFormat::CrossEncoder).expect("Failed to open cache.");
	let scorer = CountingScorer::relevant();

	cache.get(403, 11, "rivers", None, "doc", &scorer).await.expect("get");

	let log = fs::read_to_string(&path).expect("Failed to read log.");
	let columns = log.trim_end().split('\t').count();

	assert_eq!(columns, 8);
}
