use std::sync::{Arc, Mutex};

use savor_service::{Error, SavorService, UserLocation, recommendation::ONBOARDING_REQUIRED};
use savor_testkit::MemoryGraphStore;

use super::{StubGeneration, StubOnboarding, StubSearch};

type Calls = Arc<Mutex<Vec<(String, usize, u32)>>>;

fn service_with(onboarding: StubOnboarding, fail_on: Option<&str>) -> (SavorService, Calls) {
	let calls = Calls::default();
	let search = StubSearch { fail_on: fail_on.map(str::to_string), calls: calls.clone() };
	let service = super::build_service(
		Arc::new(MemoryGraphStore::new()),
		onboarding,
		search,
		StubGeneration::replying("ok"),
	);

	(service, calls)
}

fn austin() -> UserLocation {
	UserLocation {
		latitude: 30.2672,
		longitude: -97.7431,
		address: "Congress Ave".to_string(),
		city: Some("Austin".to_string()),
		state: Some("TX".to_string()),
		country: Some("US".to_string()),
	}
}

#[tokio::test]
async fn readiness_reports_each_onboarding_state() {
	let onboarding = StubOnboarding::default()
		.with("ada@example.com", super::onboarding(Some("Ada"), "vegetarian"))
		.with("anon@example.com", super::onboarding(None, "vegetarian"));
	let (service, _) = service_with(onboarding, None);
	let missing = service.validate_user_readiness("nobody@example.com").await.expect("Readiness.");
	let nameless = service.validate_user_readiness("anon@example.com").await.expect("Readiness.");
	let ready = service.validate_user_readiness("ada@example.com").await.expect("Readiness.");

	assert!(!missing.ready);
	assert_eq!(missing.message, "User has not completed onboarding. Please complete onboarding first.");
	assert!(!nameless.ready);
	assert_eq!(nameless.message, "User profile incomplete. Missing name information.");
	assert!(ready.ready);
	assert_eq!(ready.message, "User is ready for restaurant recommendations.");
}

#[tokio::test]
async fn query_preview_follows_the_planner() {
	let onboarding = StubOnboarding::default()
		.with("ada@example.com", super::onboarding(Some("Ada"), "vegetarian"));
	let (service, calls) = service_with(onboarding, None);
	let queries = service
		.search_queries_preview("ada@example.com")
		.await
		.expect("Preview failed.")
		.expect("Onboarded user must have queries.");

	assert_eq!(
		queries.dietary,
		["vegetarian restaurants", "plant based restaurants", "gluten free restaurants"]
	);
	assert_eq!(
		queries.preference,
		[
			"pizza restaurants",
			"italian restaurants",
			"pho restaurants",
			"sushi restaurants",
			"japanese restaurants",
		]
	);
	assert!(calls.lock().expect("Lock poisoned.").is_empty());
	assert!(
		service.search_queries_preview("nobody@example.com").await.expect("Preview.").is_none()
	);
}

#[tokio::test]
async fn one_failed_query_does_not_sink_the_rest() {
	let onboarding = StubOnboarding::default()
		.with("ada@example.com", super::onboarding(Some("Ada"), "vegetarian"));
	let (service, _) = service_with(onboarding, Some("plant based restaurants"));
	let data = service
		.fetch_restaurant_recommendations("ada@example.com", austin())
		.await
		.expect("Fan-out must not fail as a whole.");
	let dietary = &data.restaurants.dietary_based;

	assert_eq!(dietary.len(), 3);
	assert_eq!(dietary[1].query, "plant based restaurants");
	assert!(dietary[1].restaurants.is_empty());
	assert!(dietary[1].error.as_deref().is_some_and(|err| err.contains("unavailable")));
	assert!(dietary[0].error.is_none());
	assert_eq!(dietary[0].restaurants.len(), 20);
	assert_eq!(dietary[2].restaurants.len(), 20);
	assert_eq!(data.search_metadata.failed_queries, 1);
	assert_eq!(data.search_metadata.total_restaurants_found, 2 * 20 + 5 * 5);
	assert_eq!(data.user_preferences.name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn searches_use_configured_budgets_and_keep_plan_order() {
	let onboarding = StubOnboarding::default()
		.with("ada@example.com", super::onboarding(Some("Ada"), "vegetarian"));
	let (service, calls) = service_with(onboarding, None);
	let data = service
		.fetch_restaurant_recommendations("ada@example.com", austin())
		.await
		.expect("Recommendations failed.");
	let calls = calls.lock().expect("Lock poisoned.").clone();

	assert_eq!(calls.len(), 8);
	assert!(calls.iter().all(|(_, _, radius)| *radius == 10));

	for (query, limit, _) in &calls {
		let expected =
			if data.search_metadata.search_queries.dietary.contains(query) { 20 } else { 5 };

		assert_eq!(*limit, expected, "Wrong budget for {query}.");
	}


	let preference_queries = data
		.restaurants
		.preference_based
		.iter()
		.map(|slot| slot.query.as_str())
		.collect::<Vec<_>>();

	assert_eq!(preference_queries, data.search_metadata.search_queries.preference);
	assert!(data.restaurants.preference_based.iter().all(|slot| slot.restaurants.len() == 5));
	assert_eq!(data.search_metadata.search_radius_km, 10);
	assert_eq!(data.search_metadata.results_per_query_dietary, 20);
	assert_eq!(data.search_metadata.results_per_query_preference, 5);
	assert_eq!(data.search_metadata.failed_queries, 0);
	assert_eq!(data.search_metadata.search_coordinates.latitude, 30.2672);
}

#[tokio::test]
async fn recommendations_require_onboarding() {
	let (service, calls) = service_with(StubOnboarding::default(), None);
	let err = service
		.fetch_restaurant_recommendations("nobody@example.com", austin())
		.await
		.expect_err("Missing onboarding must fail.");

	match err {
		Error::InvalidRequest { message } => assert_eq!(message, ONBOARDING_REQUIRED),
		other => panic!("Unexpected error: {other:?}"),
	}

	assert!(calls.lock().expect("Lock poisoned.").is_empty());
}

#[tokio::test]
async fn out_of_range_coordinates_are_rejected() {
	let onboarding = StubOnboarding::default()
		.with("ada@example.com", super::onboarding(Some("Ada"), "vegetarian"));
	let (service, calls) = service_with(onboarding, None);

	for (latitude, longitude) in [(91.0, 0.0), (0.0, -180.5), (f64::NAN, 0.0)] {
		let location = UserLocation { latitude, longitude, ..austin() };
		let err = service
			.fetch_restaurant_recommendations("ada@example.com", location)
			.await
			.expect_err("Bad coordinates must fail.");

		assert!(matches!(err, Error::InvalidRequest { .. }), "Unexpected error: {err:?}");
	}

	assert!(calls.lock().expect("Lock poisoned.").is_empty());
}
