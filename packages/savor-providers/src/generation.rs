//! Chat-completion client for the response generator.

use std::time::Duration;

use reqwest::Client;
use serde_json::{Value, json};

use crate::{Error, Result};
use savor_config::LlmProviderConfig;

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful AI restaurant recommendation assistant.
You have access to user preferences, dietary restrictions, and real-time restaurant information.
Provide personalized, conversational responses that help users find the perfect dining experience.
Be concise but friendly, and always consider the user's specific context when making recommendations.";

pub async fn generate(cfg: &LlmProviderConfig, prompt: &str) -> color_eyre::Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = request_body(cfg, prompt);
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let content = parse_completion(&json)?;

	tracing::debug!(
		model = cfg.model.as_str(),
		prompt_chars = prompt.len(),
		response_chars = content.len(),
		"Generation finished."
	);

	Ok(content)
}

pub fn request_body(cfg: &LlmProviderConfig, prompt: &str) -> Value {
	let system = cfg.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT);

	json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": cfg.max_tokens,
		"messages": [
			{ "role": "system", "content": system },
			{ "role": "user", "content": prompt },
		],
	})
}

pub fn parse_completion(json: &Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(Value::as_array)
		.and_then(|choices| choices.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|message| message.get("content"))
		.and_then(Value::as_str)
		.map(str::trim)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Generation response is missing choices[0].message.content.".to_string(),
		})?;

	if content.is_empty() {
		return Err(Error::InvalidResponse {
			message: "Generation response content is empty.".to_string(),
		});
	}

	Ok(content.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_first_choice_content() {
		let json = json!({
			"choices": [
				{ "message": { "role": "assistant", "content": "  Try Zen Kitchen.  " } },
				{ "message": { "role": "assistant", "content": "ignored" } }
			]
		});

		assert_eq!(parse_completion(&json).expect("parse failed"), "Try Zen Kitchen.");
	}

	#[test]
	fn blank_or_missing_content_is_rejected() {
		assert!(parse_completion(&json!({ "choices": [] })).is_err());
		assert!(parse_completion(&json!({ "choices": [{ "message": { "content": " " } }] })).is_err());
	}
}
