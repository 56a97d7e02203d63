use std::sync::Arc;

use serde_json::json;
use time::{Duration, OffsetDateTime};

use savor_domain::BehaviorKind;
use savor_service::{BehaviorRequest, Error, NO_PROFILE_DATA, RestaurantRequest};
use savor_storage::{GraphStore, models::NewBehavior};
use savor_testkit::MemoryGraphStore;

use super::{StubGeneration, StubOnboarding, StubSearch};

fn service_with(
	store: Arc<MemoryGraphStore>,
	onboarding: StubOnboarding,
) -> savor_service::SavorService {
	super::build_service(store, onboarding, StubSearch::default(), StubGeneration::replying("ok"))
}

#[tokio::test]
async fn syncing_the_same_onboarding_twice_creates_no_duplicates() {
	let store = Arc::new(MemoryGraphStore::new());
	let onboarding =
		StubOnboarding::default().with("ada@example.com", super::onboarding(Some("Ada"), "vegetarian"));
	let service = service_with(store.clone(), onboarding);
	let first = service
		.create_or_update_user("ada@example.com", None)
		.await
		.expect("First sync failed.")
		.expect("Onboarded user must sync.");
	let preferences_after_first = store.preference_count();
	let edges_after_first = store.edge_count();
	let second = service
		.create_or_update_user("Ada@Example.com ", None)
		.await
		.expect("Second sync failed.")
		.expect("Onboarded user must sync.");

	assert_eq!(first.user_id, second.user_id);
	assert_eq!(store.user_count(), 1);
	assert_eq!(store.preference_count(), preferences_after_first);
	assert_eq!(store.edge_count(), edges_after_first);
	assert_eq!(second.age_group.as_deref(), Some("25-34"));
	assert_eq!(second.diet_type.as_deref(), Some("vegetarian"));
}

#[tokio::test]
async fn resync_replaces_diet_age_group_and_location() {
	let store = Arc::new(MemoryGraphStore::new());
	let before =
		StubOnboarding::default().with("ada@example.com", super::onboarding(Some("Ada"), "vegetarian"));

	service_with(store.clone(), before)
		.create_or_update_user("ada@example.com", None)
		.await
		.expect("First sync failed.")
		.expect("Onboarded user must sync.");

	let mut changed = super::onboarding(Some("Ada"), "vegan");

	changed.user.profile.age = Some(41);
	changed.user.profile.location = Some("Denver".to_string());

	let service =
		service_with(store.clone(), StubOnboarding::default().with("ada@example.com", changed));
	let report = service
		.create_or_update_user("ada@example.com", None)
		.await
		.expect("Re-sync failed.")
		.expect("Onboarded user must sync.");

	assert_eq!(report.diet_type.as_deref(), Some("vegan"));
	assert_eq!(report.age_group.as_deref(), Some("35-44"));
	assert_eq!(report.location.as_deref(), Some("Denver"));

	let profile = service
		.get_user_profile("ada@example.com")
		.await
		.expect("Profile read failed.")
		.expect("Synced user must have a profile.");

	assert_eq!(profile.diet_types, ["vegan"]);
	assert_eq!(profile.age_groups, ["35-44"]);
	assert_eq!(profile.locations, ["Denver"]);

	let ctx = service
		.generate_rag_context("ada@example.com")
		.await
		.expect("Context build failed.")
		.expect("Synced user must have context.");

	assert_eq!(ctx.preferences.diet_type.as_deref(), Some("vegan"));
	assert_eq!(ctx.user_profile.demographics.age_group.as_deref(), Some("35-44"));
	assert_eq!(ctx.user_profile.demographics.location_details.as_deref(), Some("Denver"));

	let rec = service
		.get_restaurant_recommendation_context("ada@example.com")
		.await
		.expect("Recommendation context failed.");

	assert_eq!(rec.must_have, ["must-accommodate-peanuts", "must-support-vegan"]);

	let summary =
		service.get_user_pattern_summary("ada@example.com").await.expect("Summary failed.");

	assert!(summary.starts_with("Ada is 41 years old and lives in Denver. Follows a vegan diet."));
	assert!(!summary.contains("vegetarian"));
}

#[tokio::test]
async fn resync_without_a_diet_clears_the_old_one() {
	let store = Arc::new(MemoryGraphStore::new());
	let before =
		StubOnboarding::default().with("ada@example.com", super::onboarding(Some("Ada"), "vegetarian"));

	service_with(store.clone(), before)
		.create_or_update_user("ada@example.com", None)
		.await
		.expect("First sync failed.");

	let mut changed = super::onboarding(Some("Ada"), "vegetarian");

	changed.user.dietary.diet_type = None;

	let service =
		service_with(store.clone(), StubOnboarding::default().with("ada@example.com", changed));
	let report = service
		.create_or_update_user("ada@example.com", None)
		.await
		.expect("Re-sync failed.")
		.expect("Onboarded user must sync.");

	assert_eq!(report.diet_type, None);

	let profile = service
		.get_user_profile("ada@example.com")
		.await
		.expect("Profile read failed.")
		.expect("Synced user must have a profile.");

	assert!(profile.diet_types.is_empty());
	assert_eq!(profile.age_groups, ["25-34"]);

	let summary =
		service.get_user_pattern_summary("ada@example.com").await.expect("Summary failed.");

	assert!(!summary.contains("Follows a"));
}

#[tokio::test]
async fn users_without_onboarding_are_skipped_quietly() {
	let store = Arc::new(MemoryGraphStore::new());
	let service = service_with(store.clone(), StubOnboarding::default());
	let report =
		service.create_or_update_user("nobody@example.com", None).await.expect("Sync must not fail.");

	assert!(report.is_none());
	assert_eq!(store.user_count(), 0);
}

#[tokio::test]
async fn behavior_for_unknown_user_is_not_found() {
	let service = service_with(Arc::new(MemoryGraphStore::new()), StubOnboarding::default());
	let request = BehaviorRequest {
		email: "ghost@example.com".to_string(),
		kind: BehaviorKind::View,
		action: "restaurant_view".to_string(),
		context: Some("r-1".to_string()),
		metadata: None,
	};
	let err = service.record_user_behavior(&request).await.expect_err("Unknown user must fail.");

	assert!(matches!(err, Error::NotFound { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn similar_users_never_include_the_requester() {
	let store = Arc::new(MemoryGraphStore::new());
	let onboarding = StubOnboarding::default()
		.with("ada@example.com", super::onboarding(Some("Ada"), "vegetarian"))
		.with("bo@example.com", super::onboarding(Some("Bo"), "vegan"));
	let service = service_with(store, onboarding);

	for email in ["ada@example.com", "bo@example.com"] {
		service.create_or_update_user(email, None).await.expect("Sync failed.");
	}

	let similar = service.find_similar_users("ada@example.com", 10).await.expect("Query failed.");

	assert_eq!(similar.len(), 1);
	assert_eq!(similar[0].email, "bo@example.com");
	assert!(similar[0].shared_preferences > 0);

	let err = service.find_similar_users("ada@example.com", 0).await.expect_err("Zero limit.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
}

#[tokio::test]
async fn pattern_summary_uses_sentinel_without_profile() {
	let service = service_with(Arc::new(MemoryGraphStore::new()), StubOnboarding::default());
	let summary =
		service.get_user_pattern_summary("nobody@example.com").await.expect("Summary failed.");

	assert_eq!(summary, NO_PROFILE_DATA);
}

#[tokio::test]
async fn pattern_summary_reflects_orders_and_restaurants() {
	let store = Arc::new(MemoryGraphStore::new());
	let onboarding =
		StubOnboarding::default().with("ada@example.com", super::onboarding(Some("Ada"), "vegetarian"));
	let service = service_with(store, onboarding);

	service.create_or_update_user("ada@example.com", None).await.expect("Sync failed.");
	service
		.create_restaurant_node(&RestaurantRequest {
			id: "r-1".to_string(),
			name: "Green Leaf".to_string(),
			cuisine: Some("vegetarian".to_string()),
			location: Some("Austin".to_string()),
			rating: Some(4.6),
			price_range: Some("$$".to_string()),
			features: vec!["patio".to_string()],
			coordinates: None,
		})
		.await
		.expect("Restaurant upsert failed.");

	for _ in 0..2 {
		service
			.record_user_behavior(&BehaviorRequest {
				email: "ada@example.com".to_string(),
				kind: BehaviorKind::Order,
				action: "order_placed".to_string(),
				context: Some("r-1".to_string()),
				metadata: Some(json!({ "items": ["falafel wrap"] })),
			})
			.await
			.expect("Behavior failed.");
	}

	let summary = service.get_semantic_context("ada@example.com").await.expect("Summary failed.");

	assert!(summary.starts_with("Ada is 29 years old and lives in Austin."));
	assert!(summary.contains("Follows a vegetarian diet."));
	assert!(summary.contains("Particularly enjoys pho, pizza, sushi."));
	assert!(summary.contains("Dietary restrictions: allergy: peanuts."));
	assert!(summary.contains("Placed 2 orders in the last 30 days."));
	assert!(summary.contains("Most frequently orders from Green Leaf (vegetarian)."));
}

#[tokio::test]
async fn cleanup_removes_only_expired_behaviors() {
	let store = Arc::new(MemoryGraphStore::new());
	let onboarding =
		StubOnboarding::default().with("ada@example.com", super::onboarding(Some("Ada"), "vegan"));
	let service = service_with(store.clone(), onboarding);

	service.create_or_update_user("ada@example.com", None).await.expect("Sync failed.");

	let now = OffsetDateTime::now_utc();

	for age_days in [200, 91, 10] {
		let behavior = NewBehavior {
			kind: BehaviorKind::Search,
			action: format!("search {age_days}"),
			context: None,
			metadata: None,
			timestamp: now - Duration::days(age_days),
		};

		store.insert_behavior("ada@example.com", &behavior).await.expect("Insert failed.");
	}

	let report = service.cleanup_old_behaviors(90).await.expect("Cleanup failed.");

	assert_eq!(report.deleted, 2);
	assert_eq!(store.behavior_count(), 1);
	assert!(store.behavior_timestamps().iter().all(|ts| *ts >= report.cutoff));

	let again = service.cleanup_old_behaviors(90).await.expect("Second cleanup failed.");

	assert_eq!(again.deleted, 0);

	let everything = service.cleanup_old_behaviors(0).await.expect("Zero-day cleanup failed.");

	assert_eq!(everything.days_to_keep, 0);
	assert_eq!(everything.deleted, 1);
	assert_eq!(store.behavior_count(), 0);
}
