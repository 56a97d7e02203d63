use std::sync::Arc;

use savor_service::{ChatRequest, EnrichmentState, Error, chat::INVALID_QUERY};
use savor_testkit::{FailingGraphStore, MemoryGraphStore};

use super::{StubGeneration, StubOnboarding, StubSearch};

fn request(query: &str, session_id: Option<&str>) -> ChatRequest {
	ChatRequest {
		email: "ada@example.com".to_string(),
		user_query: query.to_string(),
		session_id: session_id.map(str::to_string),
	}
}

#[tokio::test]
async fn chat_uses_profile_context_and_records_the_interaction() {
	let store = Arc::new(MemoryGraphStore::new());
	let generation = StubGeneration::replying("Try 'Green Leaf', a vegetarian spot with a great menu.");
	let prompts = generation.prompts.clone();
	let onboarding = StubOnboarding::default()
		.with("ada@example.com", super::onboarding(Some("Ada"), "vegetarian"));
	let service = super::build_service(store.clone(), onboarding, StubSearch::default(), generation);

	service.create_or_update_user("ada@example.com", None).await.expect("Sync failed.");

	let response = service
		.chat(request("Where should I eat tonight?", Some("session-1")))
		.await
		.expect("Chat failed.");
	let prompts = prompts.lock().expect("Lock poisoned.").clone();

	assert_eq!(response.session_id, "session-1");
	assert_eq!(response.context_used, 3);
	assert_eq!(response.pattern_summary, EnrichmentState::Available);
	assert_eq!(response.recommendation_context, EnrichmentState::Available);
	assert_eq!(response.highlights.restaurants, ["Green Leaf"]);
	assert_eq!(response.highlights.dietary, ["vegetarian"]);
	assert_eq!(response.highlights.action.as_deref(), Some("show_menu"));
	assert_eq!(prompts.len(), 1);
	assert!(prompts[0].starts_with("User Profile:\nAda is 29 years old and lives in Austin."));
	assert!(prompts[0].contains("Must avoid: cilantro, olives"));
	assert!(prompts[0].contains("User Query: Where should I eat tonight?"));
	assert_eq!(store.behavior_count(), 1);
}

#[tokio::test]
async fn chat_survives_an_unavailable_graph() {
	let onboarding = StubOnboarding::default();
	let service = super::build_service(
		Arc::new(FailingGraphStore),
		onboarding,
		StubSearch::default(),
		StubGeneration::replying("Happy to help."),
	);
	let response =
		service.chat(request("Any lunch ideas?", None)).await.expect("Chat must degrade, not fail.");

	assert_eq!(response.response, "Happy to help.");
	assert_eq!(response.context_used, 0);
	assert!(matches!(response.pattern_summary, EnrichmentState::Degraded { .. }));
	assert!(matches!(response.recommendation_context, EnrichmentState::Degraded { .. }));
	assert!(response.session_id.starts_with("session_"));
}

#[tokio::test]
async fn blank_or_oversized_queries_are_rejected() {
	let generation = StubGeneration::replying("unused");
	let prompts = generation.prompts.clone();
	let service = super::build_service(
		Arc::new(MemoryGraphStore::new()),
		StubOnboarding::default(),
		StubSearch::default(),
		generation,
	);

	for query in ["   ".to_string(), "a".repeat(1_001)] {
		let err = service.chat(request(&query, None)).await.expect_err("Query must be rejected.");

		match err {
			Error::InvalidRequest { message } => assert_eq!(message, INVALID_QUERY),
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	assert!(prompts.lock().expect("Lock poisoned.").is_empty());
}

#[tokio::test]
async fn generation_failures_surface_as_provider_errors() {
	let store = Arc::new(MemoryGraphStore::new());
	let onboarding = StubOnboarding::default()
		.with("ada@example.com", super::onboarding(Some("Ada"), "vegetarian"));
	let service = super::build_service(
		store.clone(),
		onboarding,
		StubSearch::default(),
		StubGeneration::failing("upstream timed out"),
	);

	service.create_or_update_user("ada@example.com", None).await.expect("Sync failed.");

	let err = service.chat(request("Dinner?", None)).await.expect_err("Generation must fail.");

	assert!(matches!(err, Error::Provider { .. }), "Unexpected error: {err:?}");
	assert_eq!(store.behavior_count(), 0);
}
