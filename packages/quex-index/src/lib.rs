//! In-memory inverted index behind the `SearchEngine` trait: a small
//! Dirichlet-smoothed query-likelihood engine for JSONL corpora, enough to
//! drive expansion experiments without an external index server.

mod tokenize;

pub use tokenize::tokenize;

use std::{fs, path::Path};

use ahash::AHashMap;
use serde::Deserialize;

use quex_core::{DocId, RankedHit, SearchEngine, TermWeights};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read corpus at {path:?}.")]
	ReadCorpus { path: std::path::PathBuf, source: std::io::Error },
	#[error("Malformed corpus record on line {line}: {message}")]
	MalformedRecord { line: usize, message: String },
	#[error("Duplicate docno {docno:?} on line {line}.")]
	DuplicateDocno { docno: String, line: usize },
}

#[derive(Debug, Deserialize)]
struct CorpusRecord {
	docno: String,
	content: String,
}

#[derive(Debug)]
struct DocEntry {
	docno: String,
	content: String,
	vector: AHashMap<String, u64>,
	token_count: u64,
}

/// A fixed snapshot over a small corpus. Immutable once built, safe to share
/// read-only across workers.
#[derive(Debug)]
pub struct MemoryIndex {
	field: String,
	docid_field: String,
	mu: f64,
	docs: Vec<DocEntry>,
	by_docno: AHashMap<String, u32>,
	postings: AHashMap<String, Vec<(u32, u64)>>,
	corpus_term_freqs: AHashMap<String, u64>,
	corpus_token_count: u64,
}

impl MemoryIndex {
	/// Index `(docno, content)` pairs. Later duplicates of a docno are
	/// rejected.
	pub fn from_documents<I, S, T>(
		documents: I,
		field: impl Into<String>,
		docid_field: impl Into<String>,
		mu: f64,
	) -> Result<Self>
	where
		I: IntoIterator<Item = (S, T)>,
		S: Into<String>,
		T: Into<String>,
	{
		let mut index = Self {
			field: field.into(),
			docid_field: docid_field.into(),
			mu,
			docs: Vec::new(),
			by_docno: AHashMap::new(),
			postings: AHashMap::new(),
			corpus_term_freqs: AHashMap::new(),
			corpus_token_count: 0,
		};

		for (line, (docno, content)) in documents.into_iter().enumerate() {
			index.push(docno.into(), content.into(), line + 1)?;
		}

		Ok(index)
	}

	/// Load a JSONL corpus: one `{"docno": .., "content": ..}` object per
	/// line, blank lines skipped.
	pub fn from_jsonl(
		path: &Path,
		field: impl Into<String>,
		docid_field: impl Into<String>,
		mu: f64,
	) -> Result<Self> {
		let raw = fs::read_to_string(path)
			.map_err(|err| Error::ReadCorpus { path: path.to_path_buf(), source: err })?;
		let records = raw
			.lines()
			.enumerate()
			.filter(|(_, line)| !line.trim().is_empty())
			.map(|(number, line)| {
				serde_json::from_str::<CorpusRecord>(line)
					.map(|record| (record.docno, record.content))
					.map_err(|err| Error::MalformedRecord {
						line: number + 1,
						message: err.to_string(),
					})
			})
			.collect::<Result<Vec<_>>>()?;

		Self::from_documents(records, field, docid_field, mu)
	}

	fn push(&mut self, docno: String, content: String, line: usize) -> Result<()> {
		if self.by_docno.contains_key(&docno) {
			return Err(Error::DuplicateDocno { docno, line });
		}

		let doc = self.docs.len() as u32;
		let tokens = tokenize(&content);
		let mut vector = AHashMap::new();

		for token in &tokens {
			*vector.entry(token.clone()).or_insert(0) += 1;
		}
		for (term, tf) in &vector {
			self.postings.entry(term.clone()).or_default().push((doc, *tf));
			*self.corpus_term_freqs.entry(term.clone()).or_insert(0) += tf;
		}

		self.corpus_token_count += tokens.len() as u64;
		self.by_docno.insert(docno.clone(), doc);
		self.docs.push(DocEntry { docno, content, vector, token_count: tokens.len() as u64 });

		Ok(())
	}

	pub fn len(&self) -> usize {
		self.docs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.docs.is_empty()
	}

	fn corpus_probability(&self, term: &str) -> f64 {
		if self.corpus_token_count == 0 {
			return 0.0;
		}

		self.corpus_term_freqs.get(term).copied().unwrap_or(0) as f64
			/ self.corpus_token_count as f64
	}
}

impl SearchEngine for MemoryIndex {
	/// Weighted Dirichlet query likelihood: candidates are documents
	/// matching at least one query term; each matched term contributes
	/// `weight * ln((tf + mu * P(t|C)) / (doc_len + mu))`. Ties break by
	/// doc id so rankings are deterministic.
	fn search(&self, query: &TermWeights, limit: usize) -> quex_core::Result<Vec<RankedHit>> {
		let mut candidates = ahash::AHashSet::new();

		for (term, _) in query.iter() {
			if let Some(postings) = self.postings.get(term) {
				candidates.extend(postings.iter().map(|(doc, _)| *doc));
			}
		}

		let mut hits = candidates
			.into_iter()
			.map(|doc| {
				let entry = &self.docs[doc as usize];
				let doc_len = entry.token_count as f64;
				let mut score = 0.0;

				for (term, weight) in query.iter() {
					let p_corpus = self.corpus_probability(term);

					if p_corpus <= 0.0 {
						continue;
					}

					let tf = entry.vector.get(term).copied().unwrap_or(0) as f64;
					let p_smoothed = (tf + self.mu * p_corpus) / (doc_len + self.mu);

					score += weight * p_smoothed.ln();
				}

				RankedHit { doc: DocId(doc), score: score as f32 }
			})
			.collect::<Vec<_>>();

		hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.doc.cmp(&b.doc)));
		hits.truncate(limit);

		Ok(hits)
	}

	fn stored_field(&self, doc: DocId, field: &str) -> quex_core::Result<Option<String>> {
		let Some(entry) = self.docs.get(doc.0 as usize) else {
			return Ok(None);
		};

		if field == self.field {
			Ok(Some(entry.content.clone()))
		} else if field == self.docid_field {
			Ok(Some(entry.docno.clone()))
		} else {
			Ok(None)
		}
	}

	fn term_vector(
		&self,
		doc: DocId,
		field: &str,
	) -> quex_core::Result<Option<AHashMap<String, u64>>> {
		if field != self.field {
			return Ok(None);
		}

		Ok(self.docs.get(doc.0 as usize).map(|entry| entry.vector.clone()))
	}

	fn lexicon_size(&self, field: &str) -> quex_core::Result<u64> {
		if field != self.field {
			return Ok(0);
		}

		Ok(self.postings.len() as u64)
	}

	fn lookup(&self, external_id: &str) -> quex_core::Result<Option<DocId>> {
		Ok(self.by_docno.get(external_id).map(|doc| DocId(*doc)))
	}

	fn tokenize(&self, text: &str) -> Vec<String> {
		tokenize(text)
	}
}
