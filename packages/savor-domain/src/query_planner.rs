//! Deterministic search-query planning from a user's dietary profile and liked foods.
//!
//! The planner never touches the graph. Dietary queries come from a fixed lookup on the diet
//! type; preference queries map the strongest liked foods through a keyword table.

use serde::{Deserialize, Serialize};

use crate::restaurant_preferences::{FoodAffinity, RestaurantPreferences};

pub const MAX_DIETARY_QUERIES: usize = 8;
pub const MAX_PREFERENCE_QUERIES: usize = 12;
pub const MAX_PLANNED_FOODS: usize = 10;
pub const PLANNED_FOOD_MIN_WEIGHT: i32 = 4;
pub const GLUTEN_FREE_QUERY: &str = "gluten free restaurants";

const KEYWORD_TABLE: &[(&[&str], &[&str])] = &[
	(&["pizza"], &["pizza restaurants", "italian restaurants"]),
	(&["burger"], &["burger restaurants", "american restaurants"]),
	(&["sushi"], &["sushi restaurants", "japanese restaurants"]),
	(&["taco", "mexican"], &["mexican restaurants", "taco restaurants"]),
	(&["chinese"], &["chinese restaurants", "asian restaurants"]),
	(&["indian"], &["indian restaurants", "curry restaurants"]),
	(&["thai"], &["thai restaurants", "asian restaurants"]),
	(&["coffee"], &["coffee shops", "cafes"]),
	(&["dessert", "ice cream"], &["dessert restaurants", "ice cream shops"]),
];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantQueries {
	pub dietary: Vec<String>,
	pub preference: Vec<String>,
}
impl RestaurantQueries {
	pub fn total(&self) -> usize {
		self.dietary.len() + self.preference.len()
	}
}

pub fn generate_restaurant_queries(prefs: &RestaurantPreferences) -> RestaurantQueries {
	RestaurantQueries {
		dietary: dietary_queries(prefs),
		preference: preference_queries(&prefs.liked_foods),
	}
}

pub fn dietary_queries(prefs: &RestaurantPreferences) -> Vec<String> {
	let diet = prefs.diet_type.as_deref().map(|diet| diet.trim().to_ascii_lowercase());
	let base: &[&str] = match diet.as_deref() {
		Some("vegetarian") => &["vegetarian restaurants", "plant based restaurants"],
		Some("vegan") => &["vegan restaurants", "plant based restaurants"],
		Some("pescatarian") => &["seafood restaurants", "fish restaurants"],
		Some("non-vegetarian") => &["restaurants", "steakhouse", "bbq restaurants"],
		_ => &["restaurants", "healthy restaurants"],
	};
	let mut queries = base.iter().map(|query| query.to_string()).collect::<Vec<_>>();

	// Added when gluten is NOT a declared allergy. Kept as-is until product confirms intent.
	if !prefs.allergies.iter().any(|allergy| allergy.trim().eq_ignore_ascii_case("gluten")) {
		queries.push(GLUTEN_FREE_QUERY.to_string());
	}

	dedup_capped(queries, MAX_DIETARY_QUERIES)
}

pub fn preference_queries(liked_foods: &[FoodAffinity]) -> Vec<String> {
	let mut strong = liked_foods
		.iter()
		.filter(|food| food.weight >= PLANNED_FOOD_MIN_WEIGHT)
		.collect::<Vec<_>>();

	strong.sort_by(|left, right| right.weight.cmp(&left.weight));
	strong.truncate(MAX_PLANNED_FOODS);

	let queries = strong.into_iter().flat_map(|food| queries_for_food(&food.food)).collect();

	dedup_capped(queries, MAX_PREFERENCE_QUERIES)
}

pub fn queries_for_food(food: &str) -> Vec<String> {
	let lowered = food.trim().to_lowercase();

	KEYWORD_TABLE
		.iter()
		.find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
		.map(|(_, queries)| queries.iter().map(|query| query.to_string()).collect())
		.unwrap_or_else(|| vec![format!("{lowered} restaurants")])
}

fn dedup_capped(queries: Vec<String>, cap: usize) -> Vec<String> {
	let mut out = Vec::with_capacity(cap);

	for query in queries {
		if out.len() == cap {
			break;
		}
		if !out.contains(&query) {
			out.push(query);
		}
	}

	out
}
