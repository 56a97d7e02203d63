pub mod chat;
pub mod enrichment;
pub mod knowledge_graph;
pub mod pattern_summary;
pub mod rag;
pub mod recommendation;

mod error;

pub use chat::{ChatHighlights, ChatRequest, ChatResponse};
pub use enrichment::{Enrichment, EnrichmentState};
pub use error::{Error, Result};
pub use knowledge_graph::{
	BehaviorRequest, CleanupReport, NO_PROFILE_DATA, RestaurantRequest, UserSyncExtras,
	UserSyncReport,
};
pub use rag::{
	BehaviorContext, Demographics, FoodItem, OrderSummary, PreferenceContext, RagContext,
	RecommendationContext, SimilarUserSummary, SocialContext, UserContext, WeightedItem,
};
pub use recommendation::{
	QueryResults, Readiness, RecommendationData, RestaurantResults, SearchMetadata, UserLocation,
};
pub use savor_storage::BoxFuture;

use std::sync::Arc;

use savor_config::{Config, LlmProviderConfig, SearchProviderConfig};
use savor_domain::OnboardingRecord;
use savor_providers::{
	generation,
	search::{self, RestaurantHit, SearchRequest},
};
use savor_storage::{GraphStore, PgGraphStore};

/// Where onboarding answers come from. Absence is `Ok(None)`, never an error.
pub trait OnboardingSource
where
	Self: Send + Sync,
{
	fn onboarding_record<'a>(
		&'a self,
		email: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<OnboardingRecord>>>;
}

pub trait SearchProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a SearchProviderConfig,
		request: &'a SearchRequest<'a>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RestaurantHit>>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub onboarding: Arc<dyn OnboardingSource>,
	pub search: Arc<dyn SearchProvider>,
	pub generation: Arc<dyn GenerationProvider>,
}
impl Providers {
	pub fn new(
		onboarding: Arc<dyn OnboardingSource>,
		search: Arc<dyn SearchProvider>,
		generation: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { onboarding, search, generation }
	}

	/// HTTP search and generation clients over the given onboarding source.
	pub fn http(onboarding: Arc<dyn OnboardingSource>) -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { onboarding, search: provider.clone(), generation: provider }
	}
}

pub struct SavorService {
	pub cfg: Config,
	pub graph: Arc<dyn GraphStore>,
	pub providers: Providers,
}
impl SavorService {
	/// Postgres graph and onboarding records, HTTP providers.
	pub fn new(cfg: Config, store: PgGraphStore) -> Self {
		let store = Arc::new(store);

		Self { cfg, graph: store.clone(), providers: Providers::http(store) }
	}

	pub fn with_parts(cfg: Config, graph: Arc<dyn GraphStore>, providers: Providers) -> Self {
		Self { cfg, graph, providers }
	}
}

struct DefaultProviders;
impl SearchProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a SearchProviderConfig,
		request: &'a SearchRequest<'a>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RestaurantHit>>> {
		Box::pin(search::search(cfg, request))
	}
}
impl GenerationProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(generation::generate(cfg, prompt))
	}
}

impl OnboardingSource for PgGraphStore {
	fn onboarding_record<'a>(
		&'a self,
		email: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<OnboardingRecord>>> {
		Box::pin(async move { Ok(self.fetch_onboarding_record(email).await?) })
	}
}
