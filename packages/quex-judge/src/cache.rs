use std::{
	fs::{self, File, OpenOptions},
	io::{BufRead, BufReader, BufWriter, Write},
	path::{Path, PathBuf},
	sync::{Mutex, RwLock},
};

use ahash::AHashMap;
use tracing::{info, warn};

use crate::{
	Error, Result,
	scorer::{JudgeRequest, Judgment, LogFormat, Scorer},
};

/// Persistent cache of (query, document) relevance judgments.
///
/// The backing log is append-only TSV, replayed fully on open; duplicate
/// keys in the log keep the last value (a prior interrupted run may have
/// raced two appends for the same pair). Within a process the first writer
/// wins and a hit never recomputes.
pub struct JudgmentCache {
	path: PathBuf,
	format: LogFormat,
	entries: RwLock<AHashMap<(u32, u32), Judgment>>,
	writer: Mutex<Option<BufWriter<File>>>,
}

impl JudgmentCache {
	pub fn open(path: &Path, format: LogFormat) -> Result<Self> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.map_err(|err| Error::OpenCache { path: path.to_path_buf(), source: err })?;
		}

		let mut entries = AHashMap::new();

		if path.exists() {
			let file = File::open(path)
				.map_err(|err| Error::OpenCache { path: path.to_path_buf(), source: err })?;

			for line in BufReader::new(file).lines() {
				let line = line
					.map_err(|err| Error::OpenCache { path: path.to_path_buf(), source: err })?;

				match format.parse_line(&line) {
					Some((query_id, doc_id, judgment)) => {
						// Last write wins on replay.
						entries.insert((query_id, doc_id), judgment);
					},
					None if line.trim().is_empty() => {},
					None => warn!(path = %path.display(), line, "dropping malformed cache line"),
				}
			}
		}

		info!(path = %path.display(), entries = entries.len(), "loaded judgment cache");

		let file = OpenOptions::new()
			.create(true)
			.append(true)
			.open(path)
			.map_err(|err| Error::OpenCache { path: path.to_path_buf(), source: err })?;

		Ok(Self {
			path: path.to_path_buf(),
			format,
			entries: RwLock::new(entries),
			writer: Mutex::new(Some(BufWriter::new(file))),
		})
	}

	/// Cached judgment for the pair, or a fresh one from the scorer: the
	/// record is appended and flushed before this returns. Two racing
	/// misses for one key may both score and both append; the in-memory
	/// entry keeps the first.
	pub async fn get<S: Scorer>(
		&self,
		query_id: u32,
		doc_id: u32,
		query: &str,
		instructions: Option<&str>,
		document: &str,
		scorer: &S,
	) -> Result<Judgment> {
		let key = (query_id, doc_id);

		if let Some(judgment) = self.entries.read().expect("cache poisoned").get(&key) {
			return Ok(*judgment);
		}

		let record = scorer.judge(JudgeRequest { query, instructions, document }).await;
		let line = self.format.format_line(query_id, doc_id, &record);

		{
			let mut writer = self.writer.lock().expect("cache writer poisoned");

			if let Some(writer) = writer.as_mut() {
				writer
					.write_all(line.as_bytes())
					.and_then(|()| writer.flush())
					.map_err(|err| Error::AppendCache {
						path: self.path.clone(),
						source: err,
					})?;
			}
		}

		let mut entries = self.entries.write().expect("cache poisoned");

		Ok(*entries.entry(key).or_insert(record.judgment()))
	}

	/// True when the cache holds no judgments yet; the runner throttles to
	/// sequential processing in that case.
	pub fn is_empty(&self) -> bool {
		self.entries.read().expect("cache poisoned").is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.read().expect("cache poisoned").len()
	}

	/// Flush and drop the log handle. Later `get` misses still score but no
	/// longer persist.
	pub fn close(&self) -> Result<()> {
		let mut writer = self.writer.lock().expect("cache writer poisoned");

		if let Some(mut writer) = writer.take() {
			writer
				.flush()
				.map_err(|err| Error::AppendCache { path: self.path.clone(), source: err })?;
		}

		Ok(())
	}
}
