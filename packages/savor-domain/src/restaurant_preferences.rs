//! Planner input derived from a user's onboarding answers.

use serde::{Deserialize, Serialize};

use crate::{
	ingestion::{
		self, CATEGORY_ALLERGY, CATEGORY_DISLIKED_FOOD, CATEGORY_LIKED_FOOD, CATEGORY_RESTRICTION,
		PreferenceTuple,
	},
	onboarding::OnboardingRecord,
	vocabulary::PreferenceType,
};

pub const LIKED_FOOD_MIN_WEIGHT: i32 = 4;
pub const DISLIKED_FOOD_MAX_WEIGHT: i32 = 2;
pub const CUSTOM_CATEGORY: &str = "custom";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodAffinity {
	pub food: String,
	pub weight: i32,
	pub category: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantPreferences {
	pub diet_type: Option<String>,
	pub allergies: Vec<String>,
	pub restrictions: Vec<String>,
	pub health_goals: Vec<String>,
	pub liked_foods: Vec<FoodAffinity>,
	pub disliked_foods: Vec<FoodAffinity>,
	pub name: Option<String>,
	pub age: Option<u32>,
	pub location: Option<String>,
}
impl RestaurantPreferences {
	pub fn from_onboarding(record: &OnboardingRecord) -> Self {
		let mut prefs = Self::from_tuples(&ingestion::ingest(record));

		prefs.diet_type = record.diet_type().map(str::to_string);
		prefs.name = record.name().map(str::to_string);
		prefs.age = record.age();
		prefs.location = record.location().map(str::to_string);

		prefs
	}

	/// Builds the preference lists only; profile fields stay empty.
	pub fn from_tuples(tuples: &[PreferenceTuple]) -> Self {
		let mut prefs = Self::default();

		for tuple in tuples {
			match (tuple.kind, tuple.category.as_str()) {
				(PreferenceType::Food, category) => {
					let affinity = FoodAffinity {
						food: tuple.value.clone(),
						weight: tuple.weight,
						category: category.to_string(),
					};

					if tuple.weight >= LIKED_FOOD_MIN_WEIGHT {
						prefs.liked_foods.push(affinity);
					} else if tuple.weight <= DISLIKED_FOOD_MAX_WEIGHT {
						prefs.disliked_foods.push(affinity);
					}
				},
				(PreferenceType::Custom, CATEGORY_LIKED_FOOD) => prefs.liked_foods.push(FoodAffinity {
					food: tuple.value.clone(),
					weight: tuple.weight,
					category: CUSTOM_CATEGORY.to_string(),
				}),
				(PreferenceType::Custom, CATEGORY_DISLIKED_FOOD) =>
					prefs.disliked_foods.push(FoodAffinity {
						food: tuple.value.clone(),
						weight: tuple.weight,
						category: CUSTOM_CATEGORY.to_string(),
					}),
				(PreferenceType::Dietary, CATEGORY_ALLERGY) => prefs.allergies.push(tuple.value.clone()),
				(PreferenceType::Dietary, CATEGORY_RESTRICTION) =>
					prefs.restrictions.push(tuple.value.clone()),
				(PreferenceType::Health, _) => prefs.health_goals.push(tuple.value.clone()),
				_ => {},
			}
		}

		prefs
	}
}
