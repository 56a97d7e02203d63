//! Search fan-out over the planned restaurant queries.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::task::JoinSet;

use crate::{Error, Result, SavorService, SearchProvider, knowledge_graph};
use savor_config::SearchProviderConfig;
use savor_domain::{RestaurantPreferences, RestaurantQueries, generate_restaurant_queries};
use savor_providers::search::{Coordinates, RestaurantHit, SearchRequest};

pub const ONBOARDING_REQUIRED: &str =
	"User preferences not found. Please complete onboarding first.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readiness {
	pub ready: bool,
	pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
	pub latitude: f64,
	pub longitude: f64,
	pub address: String,
	pub city: Option<String>,
	pub state: Option<String>,
	pub country: Option<String>,
}

/// One planned query and what it returned. A failed query keeps its slot with `error` set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryResults {
	pub query: String,
	pub restaurants: Vec<RestaurantHit>,
	pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestaurantResults {
	pub dietary_based: Vec<QueryResults>,
	pub preference_based: Vec<QueryResults>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchMetadata {
	pub search_queries: RestaurantQueries,
	pub search_radius_km: u32,
	pub results_per_query_dietary: u32,
	pub results_per_query_preference: u32,
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
	pub total_restaurants_found: usize,
	pub failed_queries: usize,
	pub search_coordinates: Coordinates,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationData {
	pub user_location: UserLocation,
	pub user_preferences: RestaurantPreferences,
	pub restaurants: RestaurantResults,
	pub search_metadata: SearchMetadata,
}

impl SavorService {
	pub async fn validate_user_readiness(&self, email: &str) -> Result<Readiness> {
		let readiness = match self.restaurant_preferences(email).await? {
			None => Readiness {
				ready: false,
				message: "User has not completed onboarding. Please complete onboarding first."
					.to_string(),
			},
			Some(prefs) if prefs.name.is_none() => Readiness {
				ready: false,
				message: "User profile incomplete. Missing name information.".to_string(),
			},
			Some(_) => Readiness {
				ready: true,
				message: "User is ready for restaurant recommendations.".to_string(),
			},
		};

		Ok(readiness)
	}

	/// `None` when the user has not finished onboarding.
	pub async fn search_queries_preview(&self, email: &str) -> Result<Option<RestaurantQueries>> {
		Ok(self.restaurant_preferences(email).await?.map(|prefs| generate_restaurant_queries(&prefs)))
	}

	pub async fn fetch_restaurant_recommendations(
		&self,
		email: &str,
		location: UserLocation,
	) -> Result<RecommendationData> {
		if !valid_coordinates(location.latitude, location.longitude) {
			return Err(Error::InvalidRequest {
				message: "latitude must be within [-90, 90] and longitude within [-180, 180]."
					.to_string(),
			});
		}

		let Some(prefs) = self.restaurant_preferences(email).await? else {
			return Err(Error::InvalidRequest { message: ONBOARDING_REQUIRED.to_string() });
		};
		let queries = generate_restaurant_queries(&prefs);
		let budgets = &self.cfg.recommendation;
		let fan_out = |queries: &[String], limit: u32| FanOut {
			provider: self.providers.search.clone(),
			cfg: self.cfg.providers.search.clone(),
			latitude: location.latitude,
			longitude: location.longitude,
			radius_km: budgets.search_radius_km,
			limit: limit as usize,
			queries: queries.to_vec(),
		};
		let (dietary_based, preference_based) = tokio::join!(
			fan_out(&queries.dietary, budgets.dietary_results_per_query).run(),
			fan_out(&queries.preference, budgets.preference_results_per_query).run(),
		);
		let total_restaurants_found = dietary_based
			.iter()
			.chain(preference_based.iter())
			.map(|slot| slot.restaurants.len())
			.sum::<usize>();
		let failed_queries = dietary_based
			.iter()
			.chain(preference_based.iter())
			.filter(|slot| slot.error.is_some())
			.count();

		tracing::info!(
			dietary_queries = queries.dietary.len(),
			preference_queries = queries.preference.len(),
			total_restaurants_found,
			failed_queries,
			"Restaurant recommendation search finished."
		);

		Ok(RecommendationData {
			search_metadata: SearchMetadata {
				search_queries: queries,
				search_radius_km: budgets.search_radius_km,
				results_per_query_dietary: budgets.dietary_results_per_query,
				results_per_query_preference: budgets.preference_results_per_query,
				timestamp: OffsetDateTime::now_utc(),
				total_restaurants_found,
				failed_queries,
				search_coordinates: Coordinates {
					latitude: location.latitude,
					longitude: location.longitude,
				},
			},
			user_location: location,
			user_preferences: prefs,
			restaurants: RestaurantResults { dietary_based, preference_based },
		})
	}

	async fn restaurant_preferences(&self, email: &str) -> Result<Option<RestaurantPreferences>> {
		let email = knowledge_graph::require_email(email)?;
		let record = self.providers.onboarding.onboarding_record(&email).await?;

		Ok(record.as_ref().map(RestaurantPreferences::from_onboarding))
	}
}

struct FanOut {
	provider: Arc<dyn SearchProvider>,
	cfg: SearchProviderConfig,
	latitude: f64,
	longitude: f64,
	radius_km: u32,
	limit: usize,
	queries: Vec<String>,
}
impl FanOut {
	/// All-settled: every query gets a slot in plan order, whatever happens to the others.
	async fn run(self) -> Vec<QueryResults> {
		let mut slots = self
			.queries
			.iter()
			.map(|query| QueryResults {
				query: query.clone(),
				restaurants: Vec::new(),
				error: Some("Search did not complete.".to_string()),
			})
			.collect::<Vec<_>>();
		let cfg = Arc::new(self.cfg);
		let mut tasks = JoinSet::new();

		for (index, query) in self.queries.into_iter().enumerate() {
			let provider = self.provider.clone();
			let cfg = cfg.clone();
			let (latitude, longitude, radius_km, limit) =
				(self.latitude, self.longitude, self.radius_km, self.limit);

			tasks.spawn(async move {
				let request = SearchRequest { latitude, longitude, query: &query, radius_km, limit };
				let result = provider.search(&cfg, &request).await;

				(index, result)
			});
		}

		while let Some(joined) = tasks.join_next().await {
			match joined {
				Ok((index, Ok(hits))) => {
					slots[index].restaurants = hits;
					slots[index].error = None;
				},
				Ok((index, Err(err))) => {
					tracing::warn!(
						query = slots[index].query.as_str(),
						error = %err,
						"Restaurant search query failed."
					);

					slots[index].error = Some(err.to_string());
				},
				Err(err) => {
					tracing::error!(error = %err, "Restaurant search task failed to join.");
				},
			}
		}

		slots
	}
}

fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
	latitude.is_finite()
		&& longitude.is_finite()
		&& (-90.0..=90.0).contains(&latitude)
		&& (-180.0..=180.0).contains(&longitude)
}
