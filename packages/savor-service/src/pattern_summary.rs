//! Natural-language profile summary. Every clause is dropped when its data is missing.

use std::collections::BTreeMap;

use time::Weekday;

use savor_domain::{
	BehaviorKind, PreferenceType,
	ingestion::{CATEGORY_DISLIKED_FOOD, CATEGORY_LIKED_FOOD},
	restaurant_preferences::{DISLIKED_FOOD_MAX_WEIGHT, LIKED_FOOD_MIN_WEIGHT},
};
use savor_storage::models::{PreferenceNode, RestaurantNode, UserProfile};

pub const TOP_LIKED_FOODS: usize = 5;
pub const TOP_DISLIKES: usize = 3;
pub const TOP_RESTAURANTS: usize = 3;
pub const TOP_SEARCHES: usize = 3;
pub const USAGE_PATTERN_MIN_BEHAVIORS: usize = 6;

const TOP_USAGE_SLOTS: usize = 2;

pub fn summarize(profile: &UserProfile, restaurants: &[RestaurantNode]) -> String {
	let clauses = [
		identity_clause(profile),
		diet_clause(profile),
		liked_clause(profile),
		disliked_clause(profile),
		restriction_clause(profile),
		order_count_clause(profile),
		restaurant_clause(profile, restaurants),
		hour_clause(profile),
		weekday_clause(profile),
		search_clause(profile),
	];

	clauses.into_iter().flatten().collect::<Vec<_>>().join(" ")
}

/// Restaurant ids from order behaviors, most frequent first. Ties go to the smaller id.
pub fn top_ordered_restaurants(profile: &UserProfile) -> Vec<(String, usize)> {
	let mut counts = BTreeMap::<&str, usize>::new();

	for behavior in &profile.recent_behaviors {
		if behavior.r#type != BehaviorKind::Order.as_str() {
			continue;
		}

		let Some(restaurant_id) = behavior.context.as_deref().filter(|id| !id.trim().is_empty())
		else {
			continue;
		};

		*counts.entry(restaurant_id).or_default() += 1;
	}

	let mut ranked = counts.into_iter().map(|(id, count)| (id.to_string(), count)).collect::<Vec<_>>();

	ranked.sort_by(|a, b| b.1.cmp(&a.1));
	ranked.truncate(TOP_RESTAURANTS);

	ranked
}

/// Liked foods by descending strength. Equal strengths keep profile order.
pub fn liked_foods(profile: &UserProfile) -> Vec<&PreferenceNode> {
	let mut liked = profile
		.preferences
		.iter()
		.filter(|pref| {
			(pref.r#type == PreferenceType::Food.as_str() && pref.strength >= LIKED_FOOD_MIN_WEIGHT)
				|| (pref.r#type == PreferenceType::Custom.as_str()
					&& pref.category == CATEGORY_LIKED_FOOD)
		})
		.collect::<Vec<_>>();

	liked.sort_by(|a, b| b.strength.cmp(&a.strength));

	liked
}

pub fn disliked_foods(profile: &UserProfile) -> Vec<&PreferenceNode> {
	let mut disliked = profile
		.preferences
		.iter()
		.filter(|pref| {
			(pref.r#type == PreferenceType::Food.as_str()
				&& pref.strength <= DISLIKED_FOOD_MAX_WEIGHT)
				|| (pref.r#type == PreferenceType::Custom.as_str()
					&& pref.category == CATEGORY_DISLIKED_FOOD)
		})
		.collect::<Vec<_>>();

	disliked.sort_by(|a, b| a.strength.cmp(&b.strength));

	disliked
}

pub fn twelve_hour(hour: u8) -> String {
	let suffix = if hour < 12 { "AM" } else { "PM" };
	let display = match hour % 12 {
		0 => 12,
		other => other,
	};

	format!("{display} {suffix}")
}

fn identity_clause(profile: &UserProfile) -> Option<String> {
	let name = non_blank(profile.user.name.as_deref());
	let location = non_blank(profile.user.location.as_deref())
		.or_else(|| profile.locations.first().map(String::as_str));
	let mut facts = Vec::new();

	if let Some(age) = profile.user.age.filter(|age| *age > 0) {
		facts.push(format!("is {age} years old"));
	}
	if let Some(location) = location {
		facts.push(format!("lives in {location}"));
	}

	match (name, facts.is_empty()) {
		(Some(name), true) => Some(format!("The user's name is {name}.")),
		(Some(name), false) => Some(format!("{name} {}.", facts.join(" and "))),
		(None, false) => Some(format!("This user {}.", facts.join(" and "))),
		(None, true) => None,
	}
}

fn diet_clause(profile: &UserProfile) -> Option<String> {
	if profile.diet_types.is_empty() {
		return None;
	}

	Some(format!("Follows a {} diet.", profile.diet_types.join(", ")))
}

fn liked_clause(profile: &UserProfile) -> Option<String> {
	let names = liked_foods(profile)
		.into_iter()
		.take(TOP_LIKED_FOODS)
		.map(|pref| pref.value.as_str())
		.collect::<Vec<_>>();

	sentence("Particularly enjoys", &names)
}

fn disliked_clause(profile: &UserProfile) -> Option<String> {
	let names = disliked_foods(profile)
		.into_iter()
		.take(TOP_DISLIKES)
		.map(|pref| pref.value.as_str())
		.collect::<Vec<_>>();

	sentence("Dislikes", &names)
}

fn restriction_clause(profile: &UserProfile) -> Option<String> {
	let pairs = profile
		.preferences
		.iter()
		.filter(|pref| pref.r#type == PreferenceType::Dietary.as_str())
		.map(|pref| format!("{}: {}", pref.category, pref.value))
		.collect::<Vec<_>>();

	if pairs.is_empty() {
		return None;
	}

	Some(format!("Dietary restrictions: {}.", pairs.join(", ")))
}

fn order_count_clause(profile: &UserProfile) -> Option<String> {
	let orders = profile
		.recent_behaviors
		.iter()
		.filter(|behavior| behavior.r#type == BehaviorKind::Order.as_str())
		.count();

	match orders {
		0 => None,
		1 => Some("Placed 1 order in the last 30 days.".to_string()),
		count => Some(format!("Placed {count} orders in the last 30 days.")),
	}
}

fn restaurant_clause(profile: &UserProfile, restaurants: &[RestaurantNode]) -> Option<String> {
	let names = top_ordered_restaurants(profile)
		.into_iter()
		.map(|(id, _)| {
			let node = restaurants.iter().find(|node| node.restaurant_id == id);

			match node {
				Some(RestaurantNode { name, cuisine: Some(cuisine), .. }) =>
					format!("{name} ({cuisine})"),
				Some(node) => node.name.clone(),
				None => id,
			}
		})
		.collect::<Vec<_>>();

	if names.is_empty() {
		return None;
	}

	Some(format!("Most frequently orders from {}.", names.join(", ")))
}

fn hour_clause(profile: &UserProfile) -> Option<String> {
	if profile.recent_behaviors.len() < USAGE_PATTERN_MIN_BEHAVIORS {
		return None;
	}

	let mut counts = BTreeMap::<u8, usize>::new();

	for behavior in &profile.recent_behaviors {
		*counts.entry(behavior.timestamp.hour()).or_default() += 1;
	}

	let mut ranked = counts.into_iter().collect::<Vec<_>>();

	ranked.sort_by(|a, b| b.1.cmp(&a.1));

	let hours = ranked
		.into_iter()
		.take(TOP_USAGE_SLOTS)
		.map(|(hour, _)| twelve_hour(hour))
		.collect::<Vec<_>>();

	Some(format!("Usually active around {}.", hours.join(" and ")))
}

fn weekday_clause(profile: &UserProfile) -> Option<String> {
	if profile.recent_behaviors.len() < USAGE_PATTERN_MIN_BEHAVIORS {
		return None;
	}

	let mut counts = BTreeMap::<u8, (Weekday, usize)>::new();

	for behavior in &profile.recent_behaviors {
		let weekday = behavior.timestamp.weekday();

		counts.entry(weekday.number_days_from_monday()).or_insert((weekday, 0)).1 += 1;
	}

	let mut ranked = counts.into_values().collect::<Vec<_>>();

	ranked.sort_by(|a, b| b.1.cmp(&a.1));

	let days = ranked
		.into_iter()
		.take(TOP_USAGE_SLOTS)
		.map(|(weekday, _)| weekday.to_string())
		.collect::<Vec<_>>();

	Some(format!("Most active on {}.", days.join(" and ")))
}

fn search_clause(profile: &UserProfile) -> Option<String> {
	let mut searches: Vec<&str> = Vec::new();

	for behavior in &profile.recent_behaviors {
		if behavior.r#type != BehaviorKind::Search.as_str() || searches.len() == TOP_SEARCHES {
			continue;
		}
		if !searches.contains(&behavior.action.as_str()) {
			searches.push(behavior.action.as_str());
		}
	}

	sentence("Recently searched for", &searches)
}

fn sentence(lead: &str, items: &[&str]) -> Option<String> {
	if items.is_empty() {
		return None;
	}

	Some(format!("{lead} {}.", items.join(", ")))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty())
}
