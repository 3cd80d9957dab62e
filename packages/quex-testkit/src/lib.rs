//! Shared test fixtures: a small river/money corpus, TREC topic and qrels
//! files over it, and a counting stub scorer.

use std::{
	fs,
	path::Path,
	sync::atomic::{AtomicUsize, Ordering},
	time::Duration,
};

use quex_index::MemoryIndex;
use quex_judge::{JudgeRequest, JudgmentRecord, LogFormat, Scorer};

pub const FIELD: &str = "content";
pub const DOCID_FIELD: &str = "docno";
pub const MU: f64 = 2_000.0;

/// Four documents split over two themes, so topic 401 (rivers) and topic 402
/// (money) each retrieve a distinct pair.
pub fn fixture_documents() -> Vec<(&'static str, &'static str)> {
	vec![
		("D1", "The river overflowed the north bank after heavy rain and the river rose fast."),
		("D2", "The bank raised fees for money transfers between accounts."),
		("D3", "Fishing on the river bank at dawn while the water was calm."),
		("D4", "Money markets rallied as banks reported strong earnings."),
	]
}

pub fn fixture_index() -> MemoryIndex {
	MemoryIndex::from_documents(fixture_documents(), FIELD, DOCID_FIELD, MU)
		.expect("Failed to build fixture index.")
}

const TOPICS: &str = "\
<top>
<num> Number: 401
<title> river flooding
<desc> Description: Documents about rivers overflowing their banks.
<narr> Narrative:
Relevant documents describe river water levels.
</top>
<top>
<num> Number: 402
<title> money markets
<desc> Description: Documents about banks and money.
<narr> Narrative:
Relevant documents discuss financial markets.
</top>
";

const QRELS: &str = "401 0 D1 1\n401 0 D3 1\n402 0 D2 1\n402 0 D4 2\n";

pub fn write_topics(path: &Path) {
	fs::write(path, TOPICS).expect("Failed to write topics fixture.");
}

pub fn write_qrels(path: &Path) {
	fs::write(path, QRELS).expect("Failed to write qrels fixture.");
}

/// Scorer stub: relevant iff the document text contains a marker word, with
/// a call counter to observe cache behavior and an in-flight high-water mark
/// to observe how many judgments run at once.
pub struct StubScorer {
	marker: String,
	format: LogFormat,
	calls: AtomicUsize,
	in_flight: AtomicUsize,
	max_in_flight: AtomicUsize,
}

impl StubScorer {
	pub fn new(marker: impl Into<String>, format: LogFormat) -> Self {
		Self {
			marker: marker.into(),
			format,
			calls: AtomicUsize::new(0),
			in_flight: AtomicUsize::new(0),
			max_in_flight: AtomicUsize::new(0),
		}
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	/// Largest number of judgments observed in flight simultaneously.
	pub fn max_in_flight(&self) -> usize {
		self.max_in_flight.load(Ordering::SeqCst)
	}
}

impl Scorer for StubScorer {
	async fn judge(&self, request: JudgeRequest<'_>) -> JudgmentRecord {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let entered = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;

		self.max_in_flight.fetch_max(entered, Ordering::SeqCst);
		// Yield so overlapping callers are observable as overlapping.
		tokio::time::sleep(Duration::from_millis(5)).await;
		self.in_flight.fetch_sub(1, Ordering::SeqCst);

		if request.document.contains(&self.marker) {
			JudgmentRecord {
				is_relevant: true,
				prediction: "true".to_string(),
				logit_true: 1.0,
				logit_false: -1.0,
				prob_true: 0.9,
				prob_false: 0.1,
				score: 0.9,
			}
		} else {
			match self.format {
				LogFormat::CrossEncoder => JudgmentRecord::negative_cross_encoder(),
				LogFormat::LlmJudge => JudgmentRecord::negative_llm_judge(),
			}
		}
	}

	fn log_format(&self) -> LogFormat {
		self.format
	}
}
