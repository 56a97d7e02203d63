use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use savor_domain::RestaurantQueries;
use savor_service::{
	BehaviorRequest, ChatRequest, ChatResponse, CleanupReport, Error, RagContext, Readiness,
	RecommendationContext, RecommendationData, RestaurantRequest, UserLocation, UserSyncExtras,
	UserSyncReport, recommendation::ONBOARDING_REQUIRED,
};
use savor_storage::{
	db::SchemaReport,
	models::{BehaviorNode, RestaurantNode, SimilarUser, UserProfile},
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/graph/initialize", post(initialize))
		.route("/v1/graph/users/sync", post(sync_user))
		.route("/v1/graph/behaviors", post(record_behavior))
		.route("/v1/graph/restaurants", post(upsert_restaurant))
		.route("/v1/graph/profile", post(profile))
		.route("/v1/graph/similar_users", post(similar_users))
		.route("/v1/graph/context", post(semantic_context))
		.route("/v1/graph/cleanup", post(cleanup))
		.route("/v1/context/rag", post(rag_context))
		.route("/v1/context/summary", post(context_summary))
		.route("/v1/context/embeddings", post(embeddings))
		.route("/v1/context/recommendation", post(recommendation_context))
		.route("/v1/recommendations/queries", post(search_queries))
		.route("/v1/recommendations/readiness", post(readiness))
		.route("/v1/recommendations/home", post(home_recommendations))
		.route("/v1/chat", post(chat))
		.with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
	pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SyncUserRequest {
	pub email: String,
	#[serde(flatten)]
	pub extras: UserSyncExtras,
}

#[derive(Debug, Serialize)]
pub struct SyncUserResponse {
	pub synced: bool,
	pub user: Option<UserSyncReport>,
}

#[derive(Debug, Deserialize)]
pub struct SimilarUsersRequest {
	pub email: String,
	pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SimilarUsersResponse {
	pub users: Vec<SimilarUser>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
	pub profile: Option<UserProfile>,
}

#[derive(Debug, Deserialize)]
pub struct CleanupRequest {
	pub days_to_keep: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
	pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct RagResponse {
	pub context: Option<RagContext>,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingsResponse {
	pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct HomeRequest {
	pub email: String,
	pub location: UserLocation,
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn initialize(State(state): State<AppState>) -> Result<Json<SchemaReport>, ApiError> {
	Ok(Json(state.service.initialize_schema().await?))
}

async fn sync_user(
	State(state): State<AppState>,
	Json(payload): Json<SyncUserRequest>,
) -> Result<Json<SyncUserResponse>, ApiError> {
	let user = state.service.create_or_update_user(&payload.email, Some(&payload.extras)).await?;

	Ok(Json(SyncUserResponse { synced: user.is_some(), user }))
}

async fn record_behavior(
	State(state): State<AppState>,
	Json(payload): Json<BehaviorRequest>,
) -> Result<Json<BehaviorNode>, ApiError> {
	Ok(Json(state.service.record_user_behavior(&payload).await?))
}

async fn upsert_restaurant(
	State(state): State<AppState>,
	Json(payload): Json<RestaurantRequest>,
) -> Result<Json<RestaurantNode>, ApiError> {
	Ok(Json(state.service.create_restaurant_node(&payload).await?))
}

async fn profile(
	State(state): State<AppState>,
	Json(payload): Json<EmailRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
	let profile = state.service.get_user_profile(&payload.email).await?;

	Ok(Json(ProfileResponse { profile }))
}

async fn similar_users(
	State(state): State<AppState>,
	Json(payload): Json<SimilarUsersRequest>,
) -> Result<Json<SimilarUsersResponse>, ApiError> {
	let limit = payload.limit.unwrap_or(state.service.cfg.context.similar_users_limit);
	let users = state.service.find_similar_users(&payload.email, limit).await?;

	Ok(Json(SimilarUsersResponse { users }))
}

async fn semantic_context(
	State(state): State<AppState>,
	Json(payload): Json<EmailRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
	let summary = state.service.get_semantic_context(&payload.email).await?;

	Ok(Json(SummaryResponse { summary }))
}

async fn cleanup(
	State(state): State<AppState>,
	payload: Option<Json<CleanupRequest>>,
) -> Result<Json<CleanupReport>, ApiError> {
	let days = payload
		.and_then(|Json(body)| body.days_to_keep)
		.unwrap_or(state.service.cfg.knowledge_graph.behavior_retention_days);

	Ok(Json(state.service.cleanup_old_behaviors(days).await?))
}

async fn rag_context(
	State(state): State<AppState>,
	Json(payload): Json<EmailRequest>,
) -> Result<Json<RagResponse>, ApiError> {
	let context = state.service.generate_rag_context(&payload.email).await?;

	Ok(Json(RagResponse { context }))
}

async fn context_summary(
	State(state): State<AppState>,
	Json(payload): Json<EmailRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
	let summary = state.service.generate_context_summary(&payload.email).await?;

	Ok(Json(SummaryResponse { summary }))
}

async fn embeddings(
	State(state): State<AppState>,
	Json(payload): Json<EmailRequest>,
) -> Result<Json<EmbeddingsResponse>, ApiError> {
	let tags = state.service.get_contextual_embeddings(&payload.email).await?;

	Ok(Json(EmbeddingsResponse { tags }))
}

async fn recommendation_context(
	State(state): State<AppState>,
	Json(payload): Json<EmailRequest>,
) -> Result<Json<RecommendationContext>, ApiError> {
	Ok(Json(state.service.get_restaurant_recommendation_context(&payload.email).await?))
}

async fn search_queries(
	State(state): State<AppState>,
	Json(payload): Json<EmailRequest>,
) -> Result<Json<RestaurantQueries>, ApiError> {
	match state.service.search_queries_preview(&payload.email).await? {
		Some(queries) => Ok(Json(queries)),
		None => Err(json_error(StatusCode::NOT_FOUND, "ONBOARDING_REQUIRED", ONBOARDING_REQUIRED)),
	}
}

async fn readiness(
	State(state): State<AppState>,
	Json(payload): Json<EmailRequest>,
) -> Result<Json<Readiness>, ApiError> {
	Ok(Json(state.service.validate_user_readiness(&payload.email).await?))
}

async fn home_recommendations(
	State(state): State<AppState>,
	Json(payload): Json<HomeRequest>,
) -> Result<Json<RecommendationData>, ApiError> {
	let data =
		state.service.fetch_restaurant_recommendations(&payload.email, payload.location).await?;

	Ok(Json(data))
}

async fn chat(
	State(state): State<AppState>,
	Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
	Ok(Json(state.service.chat(payload).await?))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError { status, error_code: code.to_string(), message: message.into() }
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			Error::NotFound { message } => json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			Error::Conflict { message } => json_error(StatusCode::CONFLICT, "CONFLICT", message),
			Error::Provider { message } => {
				tracing::warn!(error = message.as_str(), "Upstream provider failed.");

				json_error(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message)
			},
			Error::Storage { message } => {
				tracing::error!(error = message.as_str(), "Storage request failed.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", "Storage request failed.")
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
