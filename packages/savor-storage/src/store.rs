use std::{future::Future, pin::Pin};

use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	db::{Db, SchemaReport},
	graph,
	models::{
		BehaviorNode, NewBehavior, RestaurantNode, RestaurantUpsert, SimilarUser, UserNode,
		UserProfile, UserUpsert,
	},
	onboarding,
};
use savor_domain::{OnboardingRecord, PreferenceTuple, TaxonomyKind};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Repository seam over the preference graph. Every call is independent and may fail on its own.
pub trait GraphStore
where
	Self: Send + Sync,
{
	fn ensure_schema(&self) -> BoxFuture<'_, Result<SchemaReport>>;

	fn upsert_user<'a>(&'a self, user: &'a UserUpsert) -> BoxFuture<'a, Result<UserNode>>;

	/// Returns the number of tuples merged.
	fn upsert_preferences<'a>(
		&'a self,
		user_id: Uuid,
		preferences: &'a [PreferenceTuple],
	) -> BoxFuture<'a, Result<usize>>;

	/// Replaces the user's edge of `kind`. `None` removes it.
	fn set_user_taxonomy<'a>(
		&'a self,
		user_id: Uuid,
		kind: TaxonomyKind,
		name: Option<&'a str>,
	) -> BoxFuture<'a, Result<()>>;

	/// Fails with `NotFound` when no user has the email.
	fn insert_behavior<'a>(
		&'a self,
		email: &'a str,
		behavior: &'a NewBehavior,
	) -> BoxFuture<'a, Result<BehaviorNode>>;

	fn upsert_restaurant<'a>(
		&'a self,
		restaurant: &'a RestaurantUpsert,
	) -> BoxFuture<'a, Result<RestaurantNode>>;

	fn fetch_profile<'a>(
		&'a self,
		email: &'a str,
		behaviors_since: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<UserProfile>>>;

	fn fetch_restaurants<'a>(
		&'a self,
		restaurant_ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<RestaurantNode>>>;

	fn find_similar_users<'a>(
		&'a self,
		email: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<SimilarUser>>>;

	fn purge_behaviors_before(&self, cutoff: OffsetDateTime) -> BoxFuture<'_, Result<u64>>;
}

/// Postgres-backed store. Each call checks one connection out of the pool; the guard returns it
/// on every exit path.
#[derive(Clone)]
pub struct PgGraphStore {
	db: Db,
}
impl PgGraphStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}

	pub fn db(&self) -> &Db {
		&self.db
	}

	fn pool(&self) -> &PgPool {
		&self.db.pool
	}

	pub async fn fetch_onboarding_record(&self, email: &str) -> Result<Option<OnboardingRecord>> {
		let mut conn = self.pool().acquire().await?;

		onboarding::fetch_onboarding_record(&mut conn, email).await
	}

	pub async fn upsert_onboarding_record(
		&self,
		email: &str,
		record: &OnboardingRecord,
		completed_at: Option<OffsetDateTime>,
	) -> Result<()> {
		let mut conn = self.pool().acquire().await?;

		onboarding::upsert_onboarding_record(&mut conn, email, record, completed_at).await
	}
}
impl GraphStore for PgGraphStore {
	fn ensure_schema(&self) -> BoxFuture<'_, Result<SchemaReport>> {
		Box::pin(self.db.ensure_schema())
	}

	fn upsert_user<'a>(&'a self, user: &'a UserUpsert) -> BoxFuture<'a, Result<UserNode>> {
		Box::pin(async move {
			let mut conn = self.pool().acquire().await?;

			graph::upsert_user(&mut conn, user).await
		})
	}

	fn upsert_preferences<'a>(
		&'a self,
		user_id: Uuid,
		preferences: &'a [PreferenceTuple],
	) -> BoxFuture<'a, Result<usize>> {
		Box::pin(async move {
			let mut tx = self.pool().begin().await?;

			for tuple in preferences {
				graph::upsert_preference(&mut *tx, user_id, tuple).await?;
			}

			tx.commit().await?;

			Ok(preferences.len())
		})
	}

	fn set_user_taxonomy<'a>(
		&'a self,
		user_id: Uuid,
		kind: TaxonomyKind,
		name: Option<&'a str>,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut tx = self.pool().begin().await?;

			graph::set_user_taxonomy(&mut *tx, user_id, kind, name).await?;
			tx.commit().await?;

			Ok(())
		})
	}

	fn insert_behavior<'a>(
		&'a self,
		email: &'a str,
		behavior: &'a NewBehavior,
	) -> BoxFuture<'a, Result<BehaviorNode>> {
		Box::pin(async move {
			let mut conn = self.pool().acquire().await?;

			graph::insert_behavior(&mut conn, email, behavior).await
		})
	}

	fn upsert_restaurant<'a>(
		&'a self,
		restaurant: &'a RestaurantUpsert,
	) -> BoxFuture<'a, Result<RestaurantNode>> {
		Box::pin(async move {
			let mut tx = self.pool().begin().await?;
			let node = graph::upsert_restaurant(&mut *tx, restaurant).await?;

			tx.commit().await?;

			Ok(node)
		})
	}

	fn fetch_profile<'a>(
		&'a self,
		email: &'a str,
		behaviors_since: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<UserProfile>>> {
		Box::pin(async move {
			let mut conn = self.pool().acquire().await?;

			graph::fetch_profile(&mut conn, email, behaviors_since).await
		})
	}

	fn fetch_restaurants<'a>(
		&'a self,
		restaurant_ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<RestaurantNode>>> {
		Box::pin(async move {
			let mut conn = self.pool().acquire().await?;

			graph::fetch_restaurants(&mut conn, restaurant_ids).await
		})
	}

	fn find_similar_users<'a>(
		&'a self,
		email: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<SimilarUser>>> {
		Box::pin(async move {
			let mut conn = self.pool().acquire().await?;

			graph::find_similar_users(&mut conn, email, limit).await
		})
	}

	fn purge_behaviors_before(&self, cutoff: OffsetDateTime) -> BoxFuture<'_, Result<u64>> {
		Box::pin(async move {
			let mut conn = self.pool().acquire().await?;

			graph::purge_behaviors_before(&mut conn, cutoff).await
		})
	}
}
