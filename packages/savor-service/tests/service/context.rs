use std::sync::Arc;

use savor_service::{RecommendationContext, SavorService};
use savor_testkit::MemoryGraphStore;

use super::{StubGeneration, StubOnboarding, StubSearch};

async fn synced(emails: &[(&str, &str)]) -> SavorService {
	let mut onboarding = StubOnboarding::default();

	for (email, diet_type) in emails {
		let name = email.split('@').next();

		onboarding = onboarding.with(email, super::onboarding(name, diet_type));
	}

	let service = super::build_service(
		Arc::new(MemoryGraphStore::new()),
		onboarding,
		StubSearch::default(),
		StubGeneration::replying("ok"),
	);

	for (email, _) in emails {
		service.create_or_update_user(email, None).await.expect("Sync failed.");
	}

	service
}

#[tokio::test]
async fn unknown_users_have_no_rag_context() {
	let service = synced(&[]).await;
	let ctx = service.generate_rag_context("nobody@example.com").await.expect("Context failed.");

	assert!(ctx.is_none());
	assert_eq!(
		service.generate_context_summary("nobody@example.com").await.expect("Summary failed."),
		""
	);
	assert!(
		service
			.get_contextual_embeddings("nobody@example.com")
			.await
			.expect("Embeddings failed.")
			.is_empty()
	);
}

#[tokio::test]
async fn rag_context_reflects_synced_preferences_and_neighbors() {
	let service = synced(&[("ada@example.com", "vegetarian"), ("bo@example.com", "vegan")]).await;
	let ctx = service
		.generate_rag_context("ada@example.com")
		.await
		.expect("Context failed.")
		.expect("Synced user must have context.");
	let liked = ctx.preferences.liked_foods.iter().map(|food| food.name.as_str()).collect::<Vec<_>>();
	let disliked =
		ctx.preferences.disliked_foods.iter().map(|food| food.name.as_str()).collect::<Vec<_>>();

	assert_eq!(ctx.user_profile.email, "ada@example.com");
	assert_eq!(ctx.user_profile.demographics.age_group.as_deref(), Some("25-34"));
	assert_eq!(ctx.preferences.diet_type.as_deref(), Some("vegetarian"));
	assert_eq!(liked, ["pho", "pizza", "sushi"]);
	assert_eq!(disliked, ["cilantro", "olives"]);
	assert_eq!(ctx.preferences.dietary_restrictions, ["peanuts"]);
	assert_eq!(ctx.preferences.health_goals, ["eat more protein"]);
	assert_eq!(ctx.social_context.similar_users.len(), 1);
	assert_eq!(ctx.social_context.similar_users[0].email, "bo@example.com");
	assert!(!ctx.social_context.community_trends.is_empty());
	assert!(ctx.semantic_summary.starts_with("ada is 29 years old and lives in Austin."));
}

#[tokio::test]
async fn context_summary_lists_profile_lines() {
	let service = synced(&[("ada@example.com", "vegetarian")]).await;
	let summary = service.generate_context_summary("ada@example.com").await.expect("Summary failed.");
	let lines = summary.lines().collect::<Vec<_>>();

	assert_eq!(lines[0], "User Profile: ada (Age 29) from Austin");
	assert!(lines.contains(&"Diet: vegetarian"));
	assert!(lines.contains(&"Favorite Foods: pho, pizza, sushi"));
	assert!(lines.contains(&"Dislikes: cilantro, olives"));
	assert!(!summary.contains("Similar Users Found"));
}

#[tokio::test]
async fn embeddings_are_slugged_and_unique() {
	let service = synced(&[("ada@example.com", "vegetarian")]).await;
	let tags = service.get_contextual_embeddings("ada@example.com").await.expect("Embeddings failed.");

	assert!(tags.contains(&"diet-vegetarian".to_string()));
	assert!(tags.contains(&"location-austin".to_string()));
	assert!(tags.contains(&"likes-pizza-fast-food".to_string()));
	assert!(tags.contains(&"goal-eat-more-protein".to_string()));

	let mut unique = tags.clone();

	unique.sort();
	unique.dedup();

	assert_eq!(unique.len(), tags.len());
}

#[tokio::test]
async fn recommendation_context_separates_constraints_from_preferences() {
	let service = synced(&[("ada@example.com", "vegetarian")]).await;
	let ctx = service
		.get_restaurant_recommendation_context("ada@example.com")
		.await
		.expect("Context failed.");

	assert_eq!(ctx.must_have, ["must-accommodate-peanuts", "must-support-vegetarian"]);
	assert_eq!(ctx.must_avoid, ["cilantro", "olives"]);
	assert!(ctx.preferences.iter().any(|pref| pref.item == "eat more protein" && pref.weight == 4));
	assert!(ctx.context_summary.contains("Diet: vegetarian"));

	let empty = service
		.get_restaurant_recommendation_context("nobody@example.com")
		.await
		.expect("Context failed.");

	assert_eq!(empty, RecommendationContext::default());
}
