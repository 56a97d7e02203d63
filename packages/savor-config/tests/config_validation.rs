use std::{env, fs};

use toml::Value;

use savor_config::Error;

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let mut table = root.as_table_mut().expect("Sample config must be a table.");

	for part in section.split('.') {
		table = table
			.get_mut(part)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Sample config must include [{section}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render sample config.")
}

fn validation_message(raw: &str) -> String {
	match savor_config::parse(raw) {
		Err(Error::Validation { message }) => message,
		Err(err) => panic!("Expected a validation error, got {err:?}."),
		Ok(_) => panic!("Expected a validation error."),
	}
}

#[test]
fn sample_config_is_valid() {
	let cfg = savor_config::parse(SAMPLE_CONFIG_TOML).expect("Sample config must be valid.");

	assert_eq!(cfg.knowledge_graph.behavior_retention_days, 90);
	assert_eq!(cfg.recommendation.search_radius_km, 10);
	assert_eq!(cfg.recommendation.dietary_results_per_query, 20);
	assert_eq!(cfg.recommendation.preference_results_per_query, 5);
	assert_eq!(cfg.context.similar_users_limit, 5);
	assert_eq!(cfg.providers.search.engine, "google_maps");
}

#[test]
fn optional_sections_fall_back_to_defaults() {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let table = root.as_table_mut().expect("Sample config must be a table.");

	table.remove("knowledge_graph");
	table.remove("recommendation");
	table.remove("context");

	let raw = toml::to_string(&root).expect("Failed to render sample config.");
	let cfg = savor_config::parse(&raw).expect("Config without optional sections must be valid.");

	assert_eq!(cfg.knowledge_graph.behavior_retention_days, 90);
	assert_eq!(cfg.knowledge_graph.cleanup_interval_seconds, 3_600);
	assert_eq!(cfg.recommendation.dietary_results_per_query, 20);
	assert_eq!(cfg.context.max_query_chars, 1_000);
}

#[test]
fn zero_retention_is_rejected() {
	let raw = sample_with("knowledge_graph", "behavior_retention_days", Value::Integer(0));

	assert_eq!(
		validation_message(&raw),
		"knowledge_graph.behavior_retention_days must be greater than zero."
	);
}

#[test]
fn zero_result_budget_is_rejected() {
	let raw = sample_with("recommendation", "preference_results_per_query", Value::Integer(0));

	assert_eq!(
		validation_message(&raw),
		"recommendation.preference_results_per_query must be greater than zero."
	);
}

#[test]
fn blank_api_key_is_rejected() {
	let raw = sample_with("providers.generation", "api_key", Value::String("  ".to_string()));

	assert_eq!(validation_message(&raw), "Provider generation api_key must be non-empty.");
}

#[test]
fn blank_system_prompt_normalizes_to_none() {
	let raw =
		sample_with("providers.generation", "system_prompt", Value::String("   ".to_string()));
	let cfg = savor_config::parse(&raw).expect("Config must be valid.");

	assert!(cfg.providers.generation.system_prompt.is_none());
}

#[test]
fn load_reports_missing_file() {
	let path = env::temp_dir().join("savor_config_missing_file_for_test.toml");
	let _ = fs::remove_file(&path);
	let err = savor_config::load(&path).expect_err("Expected a read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}

#[test]
fn load_reads_config_from_disk() {
	let path = env::temp_dir().join(format!("savor_config_{}.toml", std::process::id()));

	fs::write(&path, SAMPLE_CONFIG_TOML).expect("Failed to write config fixture.");

	let cfg = savor_config::load(&path).expect("Failed to load config.");

	assert_eq!(cfg.service.http_bind, "127.0.0.1:8080");

	let _ = fs::remove_file(&path);
}
