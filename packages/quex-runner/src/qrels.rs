use std::{fs, path::Path};

use ahash::{AHashMap, AHashSet};
use tracing::warn;

use quex_core::{DocId, SearchEngine};

use crate::{Error, Result};

/// Judged-relevant documents per topic, resolved to snapshot-local ids.
pub type Oracle = AHashMap<u32, AHashSet<DocId>>;

/// Load a TREC qrels file (`topic _ docno relevance`), keeping only
/// positive judgments. Docnos that resolve to no indexed document are
/// skipped with a warning.
pub fn load_oracle(path: &Path, engine: &dyn SearchEngine) -> Result<Oracle> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadQrels { path: path.to_path_buf(), source: err })?;
	let mut oracle = Oracle::new();

	for line in raw.lines() {
		let parts = line.split_whitespace().collect::<Vec<_>>();

		if parts.len() < 4 {
			continue;
		}

		let (Ok(topic), Ok(relevance)) = (parts[0].parse::<u32>(), parts[3].parse::<i64>())
		else {
			continue;
		};

		if relevance <= 0 {
			continue;
		}

		let docno = parts[2];

		match engine.lookup(docno)? {
			Some(doc) => {
				oracle.entry(topic).or_default().insert(doc);
			},
			None => warn!(topic, docno, "qrels docno not present in the index"),
		}
	}

	Ok(oracle)
}
