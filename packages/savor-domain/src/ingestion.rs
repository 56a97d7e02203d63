//! Flattens an onboarding record into canonical weighted preference tuples.

use serde::{Deserialize, Serialize};

use crate::{
	onboarding::{OnboardingRecord, non_blank},
	sentiment::{self, Sentiment},
	vocabulary::PreferenceType,
};

pub const SOURCE_ONBOARDING: &str = "onboarding";
pub const SOURCE_USER_INPUT: &str = "user_input";
pub const CATEGORY_LIKED_FOOD: &str = "liked_food";
pub const CATEGORY_DISLIKED_FOOD: &str = "disliked_food";
pub const CATEGORY_GOAL: &str = "goal";
pub const CATEGORY_ALLERGY: &str = "allergy";
pub const CATEGORY_RESTRICTION: &str = "restriction";
pub const LABEL_RESTRICTION: &str = "restriction";
pub const LABEL_GOAL: &str = "goal";
pub const RESTRICTION_WEIGHT: i32 = 5;
pub const HEALTH_GOAL_WEIGHT: i32 = 4;

/// One `(type, category, value)` preference with its weight for a single user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceTuple {
	#[serde(rename = "type")]
	pub kind: PreferenceType,
	pub category: String,
	pub value: String,
	pub weight: i32,
	pub preference: String,
	pub source: String,
}
impl PreferenceTuple {
	pub fn identity(&self) -> (PreferenceType, &str, &str) {
		(self.kind, self.category.as_str(), self.value.as_str())
	}
}

/// Output order carries no meaning; consumers key tuples by [`PreferenceTuple::identity`].
pub fn ingest(record: &OnboardingRecord) -> Vec<PreferenceTuple> {
	let user = &record.user;
	let mut out = Vec::new();

	for (food, rating) in &user.preferences.foods {
		let (Some(value), Some(category)) = (non_blank(Some(food)), non_blank(Some(&rating.category)))
		else {
			continue;
		};
		let weight = sentiment::clamp_weight(rating.weight);
		let preference = non_blank(Some(&rating.preference))
			.map(str::to_string)
			.or_else(|| Sentiment::from_weight(weight).map(|label| label.label().to_string()))
			.unwrap_or_default();

		out.push(PreferenceTuple {
			kind: PreferenceType::Food,
			category: category.to_string(),
			value: value.to_string(),
			weight,
			preference,
			source: SOURCE_ONBOARDING.to_string(),
		});
	}

	for (items, category, sentiment) in [
		(&user.preferences.custom_likes, CATEGORY_LIKED_FOOD, Sentiment::Love),
		(&user.preferences.custom_dislikes, CATEGORY_DISLIKED_FOOD, Sentiment::Hate),
	] {
		for item in items {
			let Some(value) = non_blank(Some(&item.food)) else {
				continue;
			};

			out.push(PreferenceTuple {
				kind: PreferenceType::Custom,
				category: category.to_string(),
				value: value.to_string(),
				weight: sentiment.weight(),
				preference: sentiment.label().to_string(),
				source: non_blank(item.source.as_deref()).unwrap_or(SOURCE_USER_INPUT).to_string(),
			});
		}
	}

	for restriction in &user.dietary.restrictions {
		let (Some(category), Some(value)) =
			(non_blank(Some(&restriction.kind)), non_blank(Some(&restriction.value)))
		else {
			continue;
		};

		out.push(PreferenceTuple {
			kind: PreferenceType::Dietary,
			category: category.to_string(),
			value: value.to_string(),
			weight: RESTRICTION_WEIGHT,
			preference: LABEL_RESTRICTION.to_string(),
			source: SOURCE_ONBOARDING.to_string(),
		});
	}

	for goal in &user.dietary.goals {
		let Some(value) = non_blank(Some(goal)) else {
			continue;
		};

		out.push(PreferenceTuple {
			kind: PreferenceType::Health,
			category: CATEGORY_GOAL.to_string(),
			value: value.to_string(),
			weight: HEALTH_GOAL_WEIGHT,
			preference: LABEL_GOAL.to_string(),
			source: SOURCE_ONBOARDING.to_string(),
		});
	}

	dedup_by_identity(out)
}

// Later tuples win so a repeated answer updates in place instead of duplicating.
fn dedup_by_identity(tuples: Vec<PreferenceTuple>) -> Vec<PreferenceTuple> {
	let mut out: Vec<PreferenceTuple> = Vec::with_capacity(tuples.len());

	for tuple in tuples {
		match out.iter_mut().find(|existing| existing.identity() == tuple.identity()) {
			Some(existing) => *existing = tuple,
			None => out.push(tuple),
		}
	}

	out
}
