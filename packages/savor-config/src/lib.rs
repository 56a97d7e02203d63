mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Context, KnowledgeGraph, LlmProviderConfig, Postgres, Providers, Recommendation,
	SearchProviderConfig, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse_at(&raw, path)
}

/// Parses an in-memory TOML document with the same normalization and validation as [`load`].
pub fn parse(raw: &str) -> Result<Config> {
	parse_at(raw, Path::new("<inline>"))
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.knowledge_graph.behavior_retention_days == 0 {
		return Err(Error::Validation {
			message: "knowledge_graph.behavior_retention_days must be greater than zero."
				.to_string(),
		});
	}
	if cfg.knowledge_graph.cleanup_interval_seconds == 0 {
		return Err(Error::Validation {
			message: "knowledge_graph.cleanup_interval_seconds must be greater than zero."
				.to_string(),
		});
	}
	if cfg.recommendation.search_radius_km == 0 {
		return Err(Error::Validation {
			message: "recommendation.search_radius_km must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [
		("recommendation.dietary_results_per_query", cfg.recommendation.dietary_results_per_query),
		(
			"recommendation.preference_results_per_query",
			cfg.recommendation.preference_results_per_query,
		),
		("context.similar_users_limit", cfg.context.similar_users_limit),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if cfg.context.max_query_chars == 0 {
		return Err(Error::Validation {
			message: "context.max_query_chars must be greater than zero.".to_string(),
		});
	}
	if !cfg.providers.generation.temperature.is_finite() {
		return Err(Error::Validation {
			message: "providers.generation.temperature must be a finite number.".to_string(),
		});
	}
	if cfg.providers.generation.max_tokens == 0 {
		return Err(Error::Validation {
			message: "providers.generation.max_tokens must be greater than zero.".to_string(),
		});
	}

	for (label, key) in
		[("search", &cfg.providers.search.api_key), ("generation", &cfg.providers.generation.api_key)]
	{
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	Ok(())
}

fn parse_at(raw: &str, path: &Path) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

fn normalize(cfg: &mut Config) {
	if cfg
		.providers
		.generation
		.system_prompt
		.as_deref()
		.map(|prompt| prompt.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.providers.generation.system_prompt = None;
	}

	cfg.service.log_level = cfg.service.log_level.trim().to_string();
}
