use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, Result, SavorService, pattern_summary};
use savor_domain::{BehaviorKind, TaxonomyKind, demographics, ingestion};
use savor_storage::{
	db::SchemaReport,
	models::{
		BehaviorNode, GeoPoint, NewBehavior, RestaurantNode, RestaurantUpsert, SimilarUser,
		UserProfile, UserUpsert,
	},
};

pub const PROFILE_BEHAVIOR_WINDOW_DAYS: i64 = 30;
pub const MAX_SIMILAR_USERS: u32 = 100;
pub const NO_PROFILE_DATA: &str = "No profile data available for this user.";

/// Caller-supplied values that override the onboarding profile on sync.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UserSyncExtras {
	pub name: Option<String>,
	pub age: Option<i32>,
	pub location: Option<String>,
	pub coordinates: Option<GeoPoint>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserSyncReport {
	pub user_id: Uuid,
	pub email: String,
	pub preferences: usize,
	pub diet_type: Option<String>,
	pub age_group: Option<String>,
	pub location: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BehaviorRequest {
	pub email: String,
	#[serde(rename = "type")]
	pub kind: BehaviorKind,
	pub action: String,
	pub context: Option<String>,
	pub metadata: Option<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RestaurantRequest {
	pub id: String,
	pub name: String,
	pub cuisine: Option<String>,
	pub location: Option<String>,
	pub rating: Option<f64>,
	pub price_range: Option<String>,
	#[serde(default)]
	pub features: Vec<String>,
	pub coordinates: Option<GeoPoint>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CleanupReport {
	pub days_to_keep: u32,
	#[serde(with = "time::serde::rfc3339")]
	pub cutoff: OffsetDateTime,
	pub deleted: u64,
}

impl SavorService {
	pub async fn initialize_schema(&self) -> Result<SchemaReport> {
		Ok(self.graph.ensure_schema().await?)
	}

	/// Returns `None` when the user has not finished onboarding. That is not an error.
	pub async fn create_or_update_user(
		&self,
		email: &str,
		extras: Option<&UserSyncExtras>,
	) -> Result<Option<UserSyncReport>> {
		let email = require_email(email)?;
		let Some(record) = self.providers.onboarding.onboarding_record(&email).await? else {
			tracing::info!(email = email.as_str(), "No onboarding record found; user sync skipped.");

			return Ok(None);
		};
		let extras = extras.cloned().unwrap_or_default();
		let upsert = UserUpsert {
			email: email.clone(),
			name: extras.name.or_else(|| record.name().map(str::to_string)),
			age: extras.age.or_else(|| record.age().and_then(|age| i32::try_from(age).ok())),
			location: extras.location.or_else(|| record.location().map(str::to_string)),
			coordinates: extras.coordinates,
			onboarding_completed: true,
		};
		let user = self.graph.upsert_user(&upsert).await?;
		let tuples = ingestion::ingest(&record);
		let preferences = self.graph.upsert_preferences(user.user_id, &tuples).await?;
		let diet_type = record.diet_type().map(str::to_string);
		let age_group = user
			.age
			.and_then(|age| u32::try_from(age).ok())
			.filter(|age| *age > 0)
			.map(|age| demographics::age_group(age).to_string());
		let location =
			user.location.as_deref().map(str::trim).filter(|location| !location.is_empty());

		// One edge per kind. Age group and location follow the merged user node; the diet follows
		// the latest onboarding record.
		for (kind, name) in [
			(TaxonomyKind::DietType, diet_type.as_deref()),
			(TaxonomyKind::AgeGroup, age_group.as_deref()),
			(TaxonomyKind::Location, location),
		] {
			self.graph.set_user_taxonomy(user.user_id, kind, name).await?;
		}

		tracing::info!(
			email = email.as_str(),
			user_id = %user.user_id,
			preferences,
			"User node synced."
		);

		Ok(Some(UserSyncReport {
			user_id: user.user_id,
			email: user.email,
			preferences,
			diet_type,
			age_group,
			location: user.location,
		}))
	}

	/// Fails with `NotFound` when the user node does not exist yet.
	pub async fn record_user_behavior(&self, req: &BehaviorRequest) -> Result<BehaviorNode> {
		let email = require_email(&req.email)?;
		let action = req.action.trim();

		if action.is_empty() {
			return Err(Error::InvalidRequest { message: "action is required.".to_string() });
		}

		let behavior = NewBehavior {
			kind: req.kind,
			action: action.to_string(),
			context: req.context.clone(),
			metadata: req.metadata.clone(),
			timestamp: OffsetDateTime::now_utc(),
		};
		let node = self.graph.insert_behavior(&email, &behavior).await?;

		tracing::debug!(email = email.as_str(), kind = %req.kind, action, "Behavior recorded.");

		Ok(node)
	}

	pub async fn create_restaurant_node(&self, req: &RestaurantRequest) -> Result<RestaurantNode> {
		let restaurant_id = req.id.trim();
		let name = req.name.trim();

		if restaurant_id.is_empty() || name.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Restaurant id and name are required.".to_string(),
			});
		}

		let upsert = RestaurantUpsert {
			restaurant_id: restaurant_id.to_string(),
			name: name.to_string(),
			cuisine: req.cuisine.clone(),
			location: req.location.clone(),
			rating: req.rating,
			price_range: req.price_range.clone(),
			features: req.features.clone(),
			coordinates: req.coordinates,
		};

		Ok(self.graph.upsert_restaurant(&upsert).await?)
	}

	/// `None` when no user node exists for the email.
	pub async fn get_user_profile(&self, email: &str) -> Result<Option<UserProfile>> {
		let email = require_email(email)?;
		let since = OffsetDateTime::now_utc() - Duration::days(PROFILE_BEHAVIOR_WINDOW_DAYS);

		Ok(self.graph.fetch_profile(&email, since).await?)
	}

	pub async fn find_similar_users(&self, email: &str, limit: u32) -> Result<Vec<SimilarUser>> {
		let email = require_email(email)?;

		if limit == 0 || limit > MAX_SIMILAR_USERS {
			return Err(Error::InvalidRequest {
				message: format!("limit must be between 1 and {MAX_SIMILAR_USERS}."),
			});
		}

		Ok(self.graph.find_similar_users(&email, limit).await?)
	}

	/// Returns [`NO_PROFILE_DATA`] when the user has no profile.
	pub async fn get_user_pattern_summary(&self, email: &str) -> Result<String> {
		Ok(self.pattern_summary_for(email).await?.unwrap_or_else(|| NO_PROFILE_DATA.to_string()))
	}

	pub async fn get_semantic_context(&self, email: &str) -> Result<String> {
		self.get_user_pattern_summary(email).await
	}

	/// Deletes behaviors older than `days_to_keep` days. Zero purges everything recorded before now.
	pub async fn cleanup_old_behaviors(&self, days_to_keep: u32) -> Result<CleanupReport> {
		let cutoff = OffsetDateTime::now_utc() - Duration::days(i64::from(days_to_keep));
		let deleted = self.graph.purge_behaviors_before(cutoff).await?;

		tracing::info!(days_to_keep, deleted, "Old behaviors cleaned up.");

		Ok(CleanupReport { days_to_keep, cutoff, deleted })
	}

	/// `None` when the user has no profile. An empty string means a profile with nothing to say.
	pub(crate) async fn pattern_summary_for(&self, email: &str) -> Result<Option<String>> {
		match self.get_user_profile(email).await? {
			Some(profile) => Ok(Some(self.summarize_profile(&profile).await?)),
			None => Ok(None),
		}
	}

	pub(crate) async fn summarize_profile(&self, profile: &UserProfile) -> Result<String> {
		let ids = pattern_summary::top_ordered_restaurants(profile)
			.into_iter()
			.map(|(id, _)| id)
			.collect::<Vec<_>>();
		let restaurants =
			if ids.is_empty() { Vec::new() } else { self.graph.fetch_restaurants(&ids).await? };

		Ok(pattern_summary::summarize(profile, &restaurants))
	}
}

pub(crate) fn require_email(email: &str) -> Result<String> {
	let email = email.trim().to_lowercase();

	if email.is_empty() {
		return Err(Error::InvalidRequest { message: "email is required.".to_string() });
	}

	Ok(email)
}
