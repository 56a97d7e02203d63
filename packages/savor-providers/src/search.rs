//! Local restaurant search over a SerpApi-style Google Maps endpoint.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};
use savor_config::SearchProviderConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct SearchRequest<'a> {
	pub latitude: f64,
	pub longitude: f64,
	pub query: &'a str,
	pub radius_km: u32,
	pub limit: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
	pub latitude: f64,
	pub longitude: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestaurantHit {
	pub position: u32,
	pub title: String,
	pub place_id: Option<String>,
	pub data_id: Option<String>,
	pub rating: Option<f64>,
	pub reviews: Option<u64>,
	pub address: Option<String>,
	pub phone: Option<String>,
	pub website: Option<String>,
	pub open_state: Option<String>,
	pub price: Option<String>,
	pub types: Vec<String>,
	pub gps_coordinates: Option<Coordinates>,
	pub thumbnail: Option<String>,
	pub search_query: String,
}

#[derive(Deserialize)]
struct RawLocalResult {
	title: Option<String>,
	place_id: Option<String>,
	data_id: Option<String>,
	rating: Option<f64>,
	reviews: Option<u64>,
	address: Option<String>,
	phone: Option<String>,
	website: Option<String>,
	open_state: Option<String>,
	price: Option<String>,
	#[serde(rename = "type")]
	primary_type: Option<String>,
	#[serde(default)]
	types: Vec<String>,
	gps_coordinates: Option<Coordinates>,
	thumbnail: Option<String>,
}

impl RawLocalResult {
	fn into_hit(self) -> Option<RestaurantHit> {
		let title = self.title.filter(|title| !title.trim().is_empty())?;
		let mut types = self.types;

		if let Some(primary) = self.primary_type
			&& !types.contains(&primary)
		{
			types.insert(0, primary);
		}

		Some(RestaurantHit {
			position: 0,
			title,
			place_id: self.place_id,
			data_id: self.data_id,
			rating: self.rating,
			reviews: self.reviews,
			address: self.address,
			phone: self.phone,
			website: self.website,
			open_state: self.open_state,
			price: self.price,
			types,
			gps_coordinates: self.gps_coordinates,
			thumbnail: self.thumbnail,
			search_query: String::new(),
		})
	}
}

pub async fn search(
	cfg: &SearchProviderConfig,
	request: &SearchRequest<'_>,
) -> color_eyre::Result<Vec<RestaurantHit>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let ll = format!("@{},{},{}z", request.latitude, request.longitude, request.radius_km);
	let res = client
		.get(&url)
		.headers(crate::extra_headers(&cfg.default_headers)?)
		.query(&[
			("engine", cfg.engine.as_str()),
			("q", request.query),
			("ll", ll.as_str()),
			("type", "search"),
			("api_key", cfg.api_key.as_str()),
			("hl", cfg.language.as_str()),
			("gl", cfg.country.as_str()),
		])
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let hits = parse_local_results(json, request.query, request.limit)?;

	tracing::debug!(query = request.query, count = hits.len(), "Restaurant search finished.");

	Ok(hits)
}

/// A missing or empty `local_results` array is an empty result, not an error.
pub fn parse_local_results(json: Value, query: &str, limit: usize) -> Result<Vec<RestaurantHit>> {
	if let Some(message) = json.get("error").and_then(Value::as_str) {
		return Err(Error::InvalidResponse { message: format!("Search provider error: {message}") });
	}

	let Some(results) = json.get("local_results") else {
		return Ok(Vec::new());
	};
	let raw: Vec<RawLocalResult> = serde_json::from_value(results.clone())?;
	let hits = raw
		.into_iter()
		.filter_map(RawLocalResult::into_hit)
		.take(limit)
		.enumerate()
		.map(|(idx, mut hit)| {
			hit.position = idx as u32 + 1;
			hit.search_query = query.to_string();

			hit
		})
		.collect();

	Ok(hits)
}
