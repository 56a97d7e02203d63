use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub knowledge_graph: KnowledgeGraph,
	#[serde(default)]
	pub recommendation: Recommendation,
	#[serde(default)]
	pub context: Context,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	pub search: SearchProviderConfig,
	pub generation: LlmProviderConfig,
}

/// Local restaurant search endpoint. The request shape follows the SerpApi Google Maps engine.
#[derive(Clone, Debug, Deserialize)]
pub struct SearchProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	#[serde(default = "default_search_engine")]
	pub engine: String,
	#[serde(default = "default_search_language")]
	pub language: String,
	#[serde(default = "default_search_country")]
	pub country: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_tokens: u32,
	/// Optional. Falls back to the built-in restaurant assistant prompt.
	pub system_prompt: Option<String>,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct KnowledgeGraph {
	#[serde(default = "default_behavior_retention_days")]
	pub behavior_retention_days: u32,
	#[serde(default = "default_cleanup_interval_seconds")]
	pub cleanup_interval_seconds: u64,
}
impl Default for KnowledgeGraph {
	fn default() -> Self {
		Self {
			behavior_retention_days: default_behavior_retention_days(),
			cleanup_interval_seconds: default_cleanup_interval_seconds(),
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct Recommendation {
	#[serde(default = "default_search_radius_km")]
	pub search_radius_km: u32,
	#[serde(default = "default_dietary_results_per_query")]
	pub dietary_results_per_query: u32,
	#[serde(default = "default_preference_results_per_query")]
	pub preference_results_per_query: u32,
}
impl Default for Recommendation {
	fn default() -> Self {
		Self {
			search_radius_km: default_search_radius_km(),
			dietary_results_per_query: default_dietary_results_per_query(),
			preference_results_per_query: default_preference_results_per_query(),
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct Context {
	/// Similar users pulled into the social part of the RAG context.
	#[serde(default = "default_similar_users_limit")]
	pub similar_users_limit: u32,
	#[serde(default = "default_max_query_chars")]
	pub max_query_chars: usize,
}
impl Default for Context {
	fn default() -> Self {
		Self {
			similar_users_limit: default_similar_users_limit(),
			max_query_chars: default_max_query_chars(),
		}
	}
}

fn default_search_engine() -> String {
	"google_maps".to_string()
}

fn default_search_language() -> String {
	"en".to_string()
}

fn default_search_country() -> String {
	"us".to_string()
}

fn default_behavior_retention_days() -> u32 {
	90
}

fn default_cleanup_interval_seconds() -> u64 {
	3_600
}

fn default_search_radius_km() -> u32 {
	10
}

fn default_dietary_results_per_query() -> u32 {
	20
}

fn default_preference_results_per_query() -> u32 {
	5
}

fn default_similar_users_limit() -> u32 {
	5
}

fn default_max_query_chars() -> usize {
	1_000
}
