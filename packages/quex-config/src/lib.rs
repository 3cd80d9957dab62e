mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Feedback, Grid, Paths, Rerank, Runner, Scorer, Search};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.search.field.trim().is_empty() {
		return Err(Error::Validation { message: "search.field must be non-empty.".to_string() });
	}
	if cfg.search.docid_field.trim().is_empty() {
		return Err(Error::Validation {
			message: "search.docid_field must be non-empty.".to_string(),
		});
	}
	if !matches!(
		cfg.search.query_mode.as_str(),
		"title" | "title-plus-description" | "title-plus-narrative"
	) {
		return Err(Error::Validation {
			message:
				"search.query_mode must be one of title, title-plus-description, or title-plus-narrative."
					.to_string(),
		});
	}
	if !(cfg.search.mu > 0.0) || !cfg.search.mu.is_finite() {
		return Err(Error::Validation {
			message: "search.mu must be a finite number greater than zero.".to_string(),
		});
	}
	if cfg.search.depth == 0 {
		return Err(Error::Validation {
			message: "search.depth must be greater than zero.".to_string(),
		});
	}
	if !matches!(cfg.rerank.method.as_str(), "none" | "cross-encoder" | "prf") {
		return Err(Error::Validation {
			message: "rerank.method must be one of none, cross-encoder, or prf.".to_string(),
		});
	}
	if !matches!(
		cfg.feedback.strategy.as_str(),
		"top-k" | "oracle" | "oracle-k" | "judge" | "judge-prob"
	) {
		return Err(Error::Validation {
			message:
				"feedback.strategy must be one of top-k, oracle, oracle-k, judge, or judge-prob."
					.to_string(),
		});
	}
	if cfg.feedback.smoothing.as_str() != "additive" {
		return Err(Error::Validation {
			message: "feedback.smoothing must be additive.".to_string(),
		});
	}
	if !(cfg.feedback.smoothing_parameter > 0.0) || !cfg.feedback.smoothing_parameter.is_finite() {
		return Err(Error::Validation {
			message: "feedback.smoothing_parameter must be a finite number greater than zero."
				.to_string(),
		});
	}
	if cfg.grid.depths.is_empty() {
		return Err(Error::Validation { message: "grid.depths must be non-empty.".to_string() });
	}
	if cfg.grid.expansion_sizes.is_empty() {
		return Err(Error::Validation {
			message: "grid.expansion_sizes must be non-empty.".to_string(),
		});
	}
	if cfg.grid.lambdas.is_empty() {
		return Err(Error::Validation { message: "grid.lambdas must be non-empty.".to_string() });
	}
	if cfg.grid.depths.contains(&0) {
		return Err(Error::Validation {
			message: "grid.depths entries must be greater than zero.".to_string(),
		});
	}
	if cfg.grid.expansion_sizes.contains(&0) {
		return Err(Error::Validation {
			message: "grid.expansion_sizes entries must be greater than zero.".to_string(),
		});
	}
	if cfg.grid.lambdas.iter().any(|lambda| !(0.0..=1.0).contains(lambda)) {
		return Err(Error::Validation {
			message: "grid.lambdas entries must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.runner.max_workers == 0 {
		return Err(Error::Validation {
			message: "runner.max_workers must be greater than zero.".to_string(),
		});
	}

	let needs_scorer = cfg.rerank.method == "cross-encoder"
		|| matches!(cfg.feedback.strategy.as_str(), "judge" | "judge-prob");

	if needs_scorer {
		let Some(scorer) = cfg.scorer.as_ref() else {
			return Err(Error::Validation {
				message: "scorer must be configured for judge strategies and cross-encoder reranking."
					.to_string(),
			});
		};

		if !matches!(scorer.backend.as_str(), "cross-encoder" | "llm-judge") {
			return Err(Error::Validation {
				message: "scorer.backend must be one of cross-encoder or llm-judge.".to_string(),
			});
		}
		if scorer.endpoint.trim().is_empty() {
			return Err(Error::Validation {
				message: "scorer.endpoint must be non-empty.".to_string(),
			});
		}
		if scorer.timeout_ms == 0 {
			return Err(Error::Validation {
				message: "scorer.timeout_ms must be greater than zero.".to_string(),
			});
		}
	}

	let needs_qrels = matches!(cfg.feedback.strategy.as_str(), "oracle" | "oracle-k");

	if needs_qrels && cfg.paths.qrels.is_none() {
		return Err(Error::Validation {
			message: "paths.qrels must be set for oracle strategies.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.paths.qrels.as_deref().map(|path| path.as_os_str().is_empty()).unwrap_or(false) {
		cfg.paths.qrels = None;
	}
	if cfg.search.log_level.trim().is_empty() {
		cfg.search.log_level = "info".to_string();
	}
}
