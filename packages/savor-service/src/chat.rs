use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;

use crate::{
	Enrichment, EnrichmentState, Error, Result, SavorService,
	knowledge_graph::{self, BehaviorRequest},
	rag::RecommendationContext,
};
use savor_domain::BehaviorKind;

pub const CHAT_QUERY_ACTION: &str = "chat_query";
pub const INVALID_QUERY: &str = "Invalid query. Please provide a valid question.";

const CLOSING_INSTRUCTION: &str =
	"\nPlease provide a helpful, personalized response based on the user's profile and context.";
const CUISINE_KEYWORDS: [&str; 8] =
	["italian", "chinese", "mexican", "indian", "thai", "japanese", "american", "french"];
const DIETARY_KEYWORDS: [&str; 6] =
	["vegetarian", "vegan", "gluten-free", "dairy-free", "halal", "kosher"];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
	pub email: String,
	pub user_query: String,
	pub session_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHighlights {
	pub restaurants: Vec<String>,
	pub cuisines: Vec<String>,
	pub dietary: Vec<String>,
	pub action: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatResponse {
	pub response: String,
	pub session_id: String,
	pub context_used: usize,
	pub pattern_summary: EnrichmentState,
	pub recommendation_context: EnrichmentState,
	pub highlights: ChatHighlights,
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
}

impl SavorService {
	pub async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
		let email = knowledge_graph::require_email(&req.email)?;

		if !validate_content(&req.user_query, self.cfg.context.max_query_chars) {
			return Err(Error::InvalidRequest { message: INVALID_QUERY.to_string() });
		}

		let pattern_summary = Enrichment::from_result(
			"pattern_summary",
			self.pattern_summary_for(&email).await.map(Option::unwrap_or_default),
		);
		let recommendation_context = Enrichment::from_result(
			"recommendation_context",
			self.get_restaurant_recommendation_context(&email).await,
		);
		let context = recommendation_context.available().map(context_lines).unwrap_or_default();
		let profile = pattern_summary.available().map(String::as_str).unwrap_or_default();
		let prompt = build_prompt(&req.user_query, &context, profile);
		let response =
			self.providers.generation.generate(&self.cfg.providers.generation, &prompt).await?;
		let session_id = req
			.session_id
			.filter(|id| !id.trim().is_empty())
			.unwrap_or_else(|| format!("session_{}", unix_millis(OffsetDateTime::now_utc())));
		let interaction = BehaviorRequest {
			email: email.clone(),
			kind: BehaviorKind::Interaction,
			action: CHAT_QUERY_ACTION.to_string(),
			context: Some(req.user_query.clone()),
			metadata: Some(json!({
				"sessionId": session_id,
				"responseLength": response.chars().count(),
				"contextUsed": context.len(),
			})),
		};

		if let Err(err) = self.record_user_behavior(&interaction).await {
			tracing::warn!(email = email.as_str(), error = %err, "Chat interaction was not recorded.");
		}

		Ok(ChatResponse {
			highlights: extract_highlights(&response),
			response,
			session_id,
			context_used: context.len(),
			pattern_summary: pattern_summary.state(),
			recommendation_context: recommendation_context.state(),
			timestamp: OffsetDateTime::now_utc(),
		})
	}
}

/// Rejects blank queries and queries longer than `max_chars` characters.
pub fn validate_content(query: &str, max_chars: usize) -> bool {
	!query.trim().is_empty() && query.chars().count() <= max_chars
}

pub fn build_prompt(user_query: &str, context: &[String], profile: &str) -> String {
	let mut parts = Vec::new();

	if !profile.is_empty() {
		parts.push(format!("User Profile:\n{profile}\n"));
	}
	if !context.is_empty() {
		parts.push(format!("Relevant Context:\n{}\n", context.join("\n")));
	}

	parts.push(format!("User Query: {user_query}"));
	parts.push(CLOSING_INSTRUCTION.to_string());

	parts.join("\n")
}

/// Pulls quoted names, cuisine and dietary keywords, and a follow-up intent out of a reply.
pub fn extract_highlights(response: &str) -> ChatHighlights {
	let lowered = response.to_lowercase();
	let action = if response.contains("check") && response.contains("availability") {
		Some("check_availability")
	} else if response.contains("book") || response.contains("reserve") {
		Some("make_reservation")
	} else if response.contains("menu") {
		Some("show_menu")
	} else {
		None
	};

	ChatHighlights {
		restaurants: quoted_names(response),
		cuisines: keyword_hits(&lowered, &CUISINE_KEYWORDS),
		dietary: keyword_hits(&lowered, &DIETARY_KEYWORDS),
		action: action.map(str::to_string),
	}
}

fn keyword_hits(lowered: &str, keywords: &[&str]) -> Vec<String> {
	keywords.iter().filter(|keyword| lowered.contains(**keyword)).map(|k| k.to_string()).collect()
}

fn context_lines(ctx: &RecommendationContext) -> Vec<String> {
	let mut lines = Vec::new();

	if !ctx.must_have.is_empty() {
		lines.push(format!("Must have: {}", ctx.must_have.join(", ")));
	}
	if !ctx.must_avoid.is_empty() {
		lines.push(format!("Must avoid: {}", ctx.must_avoid.join(", ")));
	}
	if !ctx.preferences.is_empty() {
		let weighted = ctx
			.preferences
			.iter()
			.map(|pref| format!("{} ({})", pref.item, pref.weight))
			.collect::<Vec<_>>();

		lines.push(format!("Preferences: {}", weighted.join(", ")));
	}

	lines
}

// Text between matching single or double quotes. Apostrophes inside words are not delimiters.
fn quoted_names(text: &str) -> Vec<String> {
	let chars = text.chars().collect::<Vec<_>>();
	let mut names = Vec::new();
	let mut open: Option<(char, usize)> = None;

	for (index, &ch) in chars.iter().enumerate() {
		if ch != '\'' && ch != '"' {
			continue;
		}

		match open {
			Some((quote, start)) if quote == ch => {
				let name = chars[start + 1..index].iter().collect::<String>();

				if !name.trim().is_empty() {
					names.push(name);
				}

				open = None;
			},
			Some(_) => {},
			None => {
				let prev_is_word = index > 0 && chars[index - 1].is_alphanumeric();

				if ch == '"' || !prev_is_word {
					open = Some((ch, index));
				}
			},
		}
	}

	names
}

fn unix_millis(at: OffsetDateTime) -> i128 {
	at.unix_timestamp_nanos() / 1_000_000
}
