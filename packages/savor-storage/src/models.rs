use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use savor_domain::BehaviorKind;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
	pub latitude: f64,
	pub longitude: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserNode {
	pub user_id: Uuid,
	pub email: String,
	pub name: Option<String>,
	pub age: Option<i32>,
	pub location: Option<String>,
	pub onboarding_completed: bool,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}

/// A shared preference row joined with the owning user's `HAS_PREFERENCE` edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PreferenceNode {
	pub preference_id: Uuid,
	#[serde(rename = "type")]
	pub r#type: String,
	pub category: String,
	pub value: String,
	/// Last weight written to the shared node by any user.
	pub weight: i32,
	/// This user's weight at assignment time.
	pub strength: i32,
	pub preference: String,
	pub source: String,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BehaviorNode {
	pub behavior_id: Uuid,
	#[serde(rename = "type")]
	pub r#type: String,
	pub action: String,
	pub context: Option<String>,
	pub metadata: Option<Value>,
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RestaurantNode {
	pub restaurant_id: String,
	pub name: String,
	pub cuisine: Option<String>,
	pub location: Option<String>,
	pub rating: Option<f64>,
	pub price_range: Option<String>,
	pub features: Vec<String>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
	pub user: UserNode,
	pub preferences: Vec<PreferenceNode>,
	pub diet_types: Vec<String>,
	pub age_groups: Vec<String>,
	pub locations: Vec<String>,
	/// Newest first.
	pub recent_behaviors: Vec<BehaviorNode>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SimilarUser {
	pub user_id: Uuid,
	pub email: String,
	pub name: Option<String>,
	pub shared_preferences: i64,
	pub common_preferences: Vec<String>,
	pub all_preferences: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserUpsert {
	pub email: String,
	pub name: Option<String>,
	pub age: Option<i32>,
	pub location: Option<String>,
	pub coordinates: Option<GeoPoint>,
	pub onboarding_completed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewBehavior {
	pub kind: BehaviorKind,
	pub action: String,
	pub context: Option<String>,
	pub metadata: Option<Value>,
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RestaurantUpsert {
	pub restaurant_id: String,
	pub name: String,
	pub cuisine: Option<String>,
	pub location: Option<String>,
	pub rating: Option<f64>,
	pub price_range: Option<String>,
	#[serde(default)]
	pub features: Vec<String>,
	pub coordinates: Option<GeoPoint>,
}
