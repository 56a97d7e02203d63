//! Structured retrieval context for prompt assembly, plus the flattened views derived from it.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::{Result, SavorService, knowledge_graph};
use savor_domain::{BehaviorKind, PreferenceType, ingestion::HEALTH_GOAL_WEIGHT};
use savor_storage::models::{PreferenceNode, SimilarUser, UserProfile};

pub const MAX_RECENT_SEARCHES: usize = 10;
pub const MAX_VIEWED_RESTAURANTS: usize = 10;
pub const MAX_INTERACTIONS: usize = 10;
pub const MAX_ORDERS: usize = 5;
pub const MAX_COMMUNITY_TRENDS: usize = 5;
pub const RESTAURANT_VIEW_ACTION: &str = "restaurant_view";

const LIKED_MIN_WEIGHT: i32 = 3;
const DISLIKED_MAX_WEIGHT: i32 = 2;
const EMBEDDING_LIKED_MIN_WEIGHT: i32 = 4;
const EMBEDDING_VIEWED_LIMIT: usize = 5;
const SUMMARY_FAVORITES: usize = 5;
const SUMMARY_DISLIKES: usize = 3;
const SUMMARY_INTERESTS: usize = 3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RagContext {
	pub user_profile: UserContext,
	pub preferences: PreferenceContext,
	pub behavior_context: BehaviorContext,
	pub social_context: SocialContext,
	pub semantic_summary: String,
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
}
impl RagContext {
	/// Pure assembly from already-fetched graph reads.
	pub fn assemble(
		email: &str,
		profile: &UserProfile,
		similar_users: &[SimilarUser],
		semantic_summary: String,
		timestamp: OffsetDateTime,
	) -> Self {
		Self {
			user_profile: UserContext {
				email: email.to_string(),
				name: profile.user.name.clone(),
				age: profile.user.age.filter(|age| *age > 0),
				location: profile.user.location.clone(),
				demographics: Demographics {
					age_group: profile.age_groups.first().cloned(),
					location_details: Some(profile.locations.join(", "))
						.filter(|details| !details.is_empty()),
				},
			},
			preferences: PreferenceContext::from_profile(profile),
			behavior_context: BehaviorContext::from_profile(profile),
			social_context: SocialContext::from_similar_users(similar_users),
			semantic_summary,
			timestamp,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
	pub email: String,
	pub name: Option<String>,
	pub age: Option<i32>,
	pub location: Option<String>,
	pub demographics: Demographics,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
	pub age_group: Option<String>,
	pub location_details: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
	pub name: String,
	pub weight: i32,
	pub category: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceContext {
	pub dietary_restrictions: Vec<String>,
	pub diet_type: Option<String>,
	/// Strongest first.
	pub liked_foods: Vec<FoodItem>,
	/// Weakest first.
	pub disliked_foods: Vec<FoodItem>,
	pub health_goals: Vec<String>,
}
impl PreferenceContext {
	fn from_profile(profile: &UserProfile) -> Self {
		let is_food = |pref: &&PreferenceNode| {
			pref.r#type == PreferenceType::Food.as_str()
				|| pref.r#type == PreferenceType::Custom.as_str()
		};
		let values_of = |kind: PreferenceType| {
			profile
				.preferences
				.iter()
				.filter(|pref| pref.r#type == kind.as_str())
				.map(|pref| pref.value.clone())
				.collect::<Vec<_>>()
		};
		let mut liked_foods = profile
			.preferences
			.iter()
			.filter(is_food)
			.filter(|pref| pref.strength >= LIKED_MIN_WEIGHT)
			.map(FoodItem::from)
			.collect::<Vec<_>>();
		let mut disliked_foods = profile
			.preferences
			.iter()
			.filter(is_food)
			.filter(|pref| pref.strength <= DISLIKED_MAX_WEIGHT)
			.map(FoodItem::from)
			.collect::<Vec<_>>();

		liked_foods.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.name.cmp(&b.name)));
		disliked_foods.sort_by(|a, b| a.weight.cmp(&b.weight).then_with(|| a.name.cmp(&b.name)));

		Self {
			dietary_restrictions: values_of(PreferenceType::Dietary),
			diet_type: profile.diet_types.first().cloned(),
			liked_foods,
			disliked_foods,
			health_goals: values_of(PreferenceType::Health),
		}
	}
}

impl From<&PreferenceNode> for FoodItem {
	fn from(pref: &PreferenceNode) -> Self {
		Self { name: pref.value.clone(), weight: pref.strength, category: pref.category.clone() }
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
	pub restaurant_id: Option<String>,
	pub items: Vec<String>,
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorContext {
	pub recent_searches: Vec<String>,
	pub viewed_restaurants: Vec<String>,
	pub order_history: Vec<OrderSummary>,
	pub interaction_patterns: Vec<String>,
}
impl BehaviorContext {
	fn from_profile(profile: &UserProfile) -> Self {
		let of_kind = move |kind: BehaviorKind| {
			profile.recent_behaviors.iter().filter(move |behavior| behavior.r#type == kind.as_str())
		};

		Self {
			recent_searches: of_kind(BehaviorKind::Search)
				.map(|behavior| behavior.action.clone())
				.take(MAX_RECENT_SEARCHES)
				.collect(),
			viewed_restaurants: of_kind(BehaviorKind::View)
				.filter(|behavior| behavior.action == RESTAURANT_VIEW_ACTION)
				.filter_map(|behavior| behavior.context.clone())
				.take(MAX_VIEWED_RESTAURANTS)
				.collect(),
			order_history: of_kind(BehaviorKind::Order)
				.map(|behavior| OrderSummary {
					restaurant_id: behavior.context.clone(),
					items: order_items(behavior.metadata.as_ref()),
					timestamp: behavior.timestamp,
				})
				.take(MAX_ORDERS)
				.collect(),
			interaction_patterns: of_kind(BehaviorKind::Interaction)
				.map(|behavior| match behavior.context.as_deref() {
					Some(context) => format!("{}-{context}", behavior.action),
					None => behavior.action.clone(),
				})
				.take(MAX_INTERACTIONS)
				.collect(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarUserSummary {
	pub email: String,
	pub shared_preferences: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialContext {
	pub similar_users: Vec<SimilarUserSummary>,
	pub community_trends: Vec<String>,
}
impl SocialContext {
	/// Trends are the most frequent values across neighbors' full preference lists.
	pub fn from_similar_users(similar_users: &[SimilarUser]) -> Self {
		let mut counts = BTreeMap::<&str, usize>::new();

		for value in similar_users.iter().flat_map(|user| user.all_preferences.iter()) {
			*counts.entry(value.as_str()).or_default() += 1;
		}

		let mut ranked = counts.into_iter().collect::<Vec<_>>();

		ranked.sort_by(|a, b| b.1.cmp(&a.1));

		Self {
			similar_users: similar_users
				.iter()
				.map(|user| SimilarUserSummary {
					email: user.email.clone(),
					shared_preferences: user.shared_preferences,
				})
				.collect(),
			community_trends: ranked
				.into_iter()
				.take(MAX_COMMUNITY_TRENDS)
				.map(|(value, _)| value.to_string())
				.collect(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedItem {
	pub item: String,
	pub weight: i32,
}

/// Hard constraints and soft preferences for a restaurant filtering step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationContext {
	pub must_have: Vec<String>,
	pub must_avoid: Vec<String>,
	pub preferences: Vec<WeightedItem>,
	pub context_summary: String,
}

impl SavorService {
	/// `None` when the user has no graph profile.
	pub async fn generate_rag_context(&self, email: &str) -> Result<Option<RagContext>> {
		let email = knowledge_graph::require_email(email)?;
		let Some(profile) = self.get_user_profile(&email).await? else {
			tracing::debug!(email = email.as_str(), "No graph profile for RAG context.");

			return Ok(None);
		};
		let similar_users =
			self.graph.find_similar_users(&email, self.cfg.context.similar_users_limit).await?;
		let semantic_summary = self.summarize_profile(&profile).await?;

		Ok(Some(RagContext::assemble(
			&email,
			&profile,
			&similar_users,
			semantic_summary,
			OffsetDateTime::now_utc(),
		)))
	}

	/// Empty when the user has no graph profile.
	pub async fn generate_context_summary(&self, email: &str) -> Result<String> {
		Ok(self.generate_rag_context(email).await?.map(|ctx| context_summary(&ctx)).unwrap_or_default())
	}

	pub async fn get_contextual_embeddings(&self, email: &str) -> Result<Vec<String>> {
		Ok(self
			.generate_rag_context(email)
			.await?
			.map(|ctx| contextual_embeddings(&ctx))
			.unwrap_or_default())
	}

	/// All fields empty when the user has no graph profile.
	pub async fn get_restaurant_recommendation_context(
		&self,
		email: &str,
	) -> Result<RecommendationContext> {
		Ok(self
			.generate_rag_context(email)
			.await?
			.map(|ctx| recommendation_context(&ctx))
			.unwrap_or_default())
	}
}

/// Line-oriented prompt summary. Lines without data are left out.
pub fn context_summary(ctx: &RagContext) -> String {
	let profile = &ctx.user_profile;
	let prefs = &ctx.preferences;
	let mut lines = Vec::new();

	if profile.name.is_some() || profile.age.is_some() || profile.location.is_some() {
		let mut line = format!("User Profile: {}", profile.name.as_deref().unwrap_or("User"));

		if let Some(age) = profile.age {
			line.push_str(&format!(" (Age {age})"));
		}
		if let Some(location) = profile.location.as_deref() {
			line.push_str(&format!(" from {location}"));
		}

		lines.push(line);
	}
	if let Some(diet_type) = prefs.diet_type.as_deref() {
		lines.push(format!("Diet: {diet_type}"));
	}

	push_list(&mut lines, "Dietary Restrictions", prefs.dietary_restrictions.iter());
	push_list(&mut lines, "Health Goals", prefs.health_goals.iter());
	push_list(
		&mut lines,
		"Favorite Foods",
		prefs.liked_foods.iter().take(SUMMARY_FAVORITES).map(|food| &food.name),
	);
	push_list(
		&mut lines,
		"Dislikes",
		prefs.disliked_foods.iter().take(SUMMARY_DISLIKES).map(|food| &food.name),
	);
	push_list(
		&mut lines,
		"Recent Interests",
		ctx.behavior_context.recent_searches.iter().take(SUMMARY_INTERESTS),
	);

	if !ctx.social_context.similar_users.is_empty() {
		lines.push(format!(
			"Similar Users Found: {} users with shared preferences",
			ctx.social_context.similar_users.len()
		));
	}
	if !ctx.semantic_summary.is_empty() {
		lines.push(ctx.semantic_summary.clone());
	}

	lines.join("\n")
}

/// Deduplicated tag keys for an external semantic index, in a stable order.
pub fn contextual_embeddings(ctx: &RagContext) -> Vec<String> {
	let profile = &ctx.user_profile;
	let prefs = &ctx.preferences;
	let mut tags = Vec::new();

	if profile.age.is_some()
		&& let Some(age_group) = profile.demographics.age_group.as_deref()
	{
		tags.push(tag("age", &[age_group]));
	}
	if let Some(location) = profile.location.as_deref() {
		tags.push(tag("location", &[location]));
	}
	if let Some(diet_type) = prefs.diet_type.as_deref() {
		tags.push(tag("diet", &[diet_type]));
	}

	tags.extend(prefs.dietary_restrictions.iter().map(|value| tag("restriction", &[value])));
	tags.extend(prefs.health_goals.iter().map(|value| tag("goal", &[value])));
	tags.extend(
		prefs
			.liked_foods
			.iter()
			.filter(|food| food.weight >= EMBEDDING_LIKED_MIN_WEIGHT)
			.map(|food| tag("likes", &[&food.name, &food.category])),
	);
	tags.extend(
		prefs
			.disliked_foods
			.iter()
			.filter(|food| food.weight <= DISLIKED_MAX_WEIGHT)
			.map(|food| tag("dislikes", &[&food.name, &food.category])),
	);
	tags.extend(ctx.behavior_context.recent_searches.iter().map(|value| tag("search", &[value])));
	tags.extend(
		ctx.behavior_context
			.viewed_restaurants
			.iter()
			.take(EMBEDDING_VIEWED_LIMIT)
			.map(|value| tag("viewed", &[value])),
	);
	tags.extend(ctx.social_context.community_trends.iter().map(|value| tag("trend", &[value])));

	let mut seen = HashSet::new();

	tags.retain(|tag| !tag.ends_with('-') && seen.insert(tag.clone()));

	tags
}

pub fn recommendation_context(ctx: &RagContext) -> RecommendationContext {
	let prefs = &ctx.preferences;
	let mut must_have = prefs
		.dietary_restrictions
		.iter()
		.map(|value| format!("must-accommodate-{value}"))
		.collect::<Vec<_>>();

	if let Some(diet_type) = prefs.diet_type.as_deref() {
		must_have.push(format!("must-support-{diet_type}"));
	}

	let must_avoid = prefs
		.disliked_foods
		.iter()
		.filter(|food| food.weight <= DISLIKED_MAX_WEIGHT)
		.map(|food| food.name.clone())
		.collect();
	let preferences = prefs
		.liked_foods
		.iter()
		.map(|food| WeightedItem { item: food.name.clone(), weight: food.weight })
		.chain(
			prefs
				.health_goals
				.iter()
				.map(|goal| WeightedItem { item: goal.clone(), weight: HEALTH_GOAL_WEIGHT }),
		)
		.collect();

	RecommendationContext { must_have, must_avoid, preferences, context_summary: context_summary(ctx) }
}

fn push_list<'a>(lines: &mut Vec<String>, label: &str, values: impl Iterator<Item = &'a String>) {
	let values = values.map(String::as_str).collect::<Vec<_>>();

	if !values.is_empty() {
		lines.push(format!("{label}: {}", values.join(", ")));
	}
}

fn tag(prefix: &str, parts: &[&str]) -> String {
	let mut out = prefix.to_string();

	for part in parts {
		out.push('-');
		out.push_str(&slug(part));
	}

	out
}

fn slug(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for ch in raw.trim().chars().flat_map(char::to_lowercase) {
		if ch.is_alphanumeric() {
			out.push(ch);
		} else if !out.is_empty() && !out.ends_with('-') {
			out.push('-');
		}
	}

	out.trim_end_matches('-').to_string()
}

fn order_items(metadata: Option<&Value>) -> Vec<String> {
	metadata
		.and_then(|meta| meta.get("items"))
		.and_then(Value::as_array)
		.map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
		.unwrap_or_default()
}
