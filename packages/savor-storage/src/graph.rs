//! Merge-by-identity writers and read queries over the preference graph tables.

use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{
		BehaviorNode, NewBehavior, PreferenceNode, RestaurantNode, RestaurantUpsert, SimilarUser,
		UserNode, UserProfile, UserUpsert,
	},
};
use savor_domain::{PreferenceTuple, TaxonomyKind, sentiment};

const USER_COLUMNS: &str = "\
	user_id,
	email,
	name,
	age,
	location,
	onboarding_completed,
	created_at,
	updated_at";
const RESTAURANT_COLUMNS: &str = "\
	restaurant_id,
	name,
	cuisine,
	location,
	rating,
	price_range,
	features,
	location_point[1] AS latitude,
	location_point[0] AS longitude,
	created_at,
	updated_at";

pub fn normalize_email(email: &str) -> Result<String> {
	let trimmed = email.trim();

	if trimmed.is_empty() {
		return Err(Error::InvalidArgument("email must not be empty".to_string()));
	}

	Ok(trimmed.to_lowercase())
}

/// `user_id` is assigned on first insert and never rewritten.
pub async fn upsert_user(executor: &mut PgConnection, user: &UserUpsert) -> Result<UserNode> {
	let email = normalize_email(&user.email)?;

	if user.age.is_some_and(|age| age < 0) {
		return Err(Error::InvalidArgument("age must not be negative".to_string()));
	}

	let now = OffsetDateTime::now_utc();
	let sql = format!(
		"\
INSERT INTO users (
	user_id,
	email,
	name,
	age,
	location,
	location_point,
	onboarding_completed,
	created_at,
	updated_at
)
VALUES (
	$1,
	$2,
	$3,
	$4,
	$5,
	CASE WHEN $6::float8 IS NULL OR $7::float8 IS NULL THEN NULL ELSE point($7, $6) END,
	$8,
	$9,
	$9
)
ON CONFLICT (email) DO UPDATE
SET
	name = COALESCE(EXCLUDED.name, users.name),
	age = COALESCE(EXCLUDED.age, users.age),
	location = COALESCE(EXCLUDED.location, users.location),
	location_point = COALESCE(EXCLUDED.location_point, users.location_point),
	onboarding_completed = EXCLUDED.onboarding_completed OR users.onboarding_completed,
	updated_at = EXCLUDED.updated_at
RETURNING
{USER_COLUMNS}"
	);
	let row = sqlx::query_as::<_, UserNode>(&sql)
		.bind(Uuid::new_v4())
		.bind(email.as_str())
		.bind(user.name.as_deref())
		.bind(user.age)
		.bind(user.location.as_deref())
		.bind(user.coordinates.map(|point| point.latitude))
		.bind(user.coordinates.map(|point| point.longitude))
		.bind(user.onboarding_completed)
		.bind(now)
		.fetch_one(&mut *executor)
		.await?;

	Ok(row)
}

pub async fn find_user_by_email(
	executor: &mut PgConnection,
	email: &str,
) -> Result<Option<UserNode>> {
	let email = normalize_email(email)?;
	let sql = format!("SELECT\n{USER_COLUMNS}\nFROM users\nWHERE email = $1");
	let row = sqlx::query_as::<_, UserNode>(&sql)
		.bind(email.as_str())
		.fetch_optional(&mut *executor)
		.await?;

	Ok(row)
}

/// Merges each shared preference row by `(type, category, value)` and the user's
/// `HAS_PREFERENCE` edge by `(user_id, preference_id)`.
pub async fn upsert_preference(
	executor: &mut PgConnection,
	user_id: Uuid,
	tuple: &PreferenceTuple,
) -> Result<()> {
	if tuple.category.trim().is_empty() || tuple.value.trim().is_empty() {
		return Err(Error::InvalidArgument(
			"preference category and value must not be empty".to_string(),
		));
	}

	let weight = sentiment::clamp_weight(tuple.weight);
	let now = OffsetDateTime::now_utc();

	sqlx::query(
		"\
WITH pref AS (
	INSERT INTO preferences (
		preference_id,
		type,
		category,
		value,
		weight,
		preference,
		source,
		created_at,
		updated_at
	)
	VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
	ON CONFLICT (type, category, value) DO UPDATE
	SET
		weight = EXCLUDED.weight,
		preference = EXCLUDED.preference,
		source = EXCLUDED.source,
		updated_at = EXCLUDED.updated_at
	RETURNING preference_id
)
INSERT INTO user_preferences (user_id, preference_id, strength, created_at, updated_at)
SELECT $9, preference_id, $5, $8, $8
FROM pref
ON CONFLICT (user_id, preference_id) DO UPDATE
SET
	strength = EXCLUDED.strength,
	updated_at = EXCLUDED.updated_at",
	)
	.bind(Uuid::new_v4())
	.bind(tuple.kind.as_str())
	.bind(tuple.category.as_str())
	.bind(tuple.value.as_str())
	.bind(weight)
	.bind(tuple.preference.as_str())
	.bind(tuple.source.as_str())
	.bind(now)
	.bind(user_id)
	.execute(&mut *executor)
	.await?;

	Ok(())
}

async fn merge_taxonomy_node(
	executor: &mut PgConnection,
	kind: TaxonomyKind,
	name: &str,
) -> Result<Uuid> {
	let name = name.trim();

	if name.is_empty() {
		return Err(Error::InvalidArgument(format!("{kind} name must not be empty")));
	}

	let node_id = sqlx::query_scalar::<_, Uuid>(
		"\
INSERT INTO taxonomy_nodes (node_id, kind, name, created_at)
VALUES ($1, $2, $3, now())
ON CONFLICT (kind, name) DO UPDATE
SET name = EXCLUDED.name
RETURNING node_id",
	)
	.bind(Uuid::new_v4())
	.bind(kind.as_str())
	.bind(name)
	.fetch_one(&mut *executor)
	.await?;

	Ok(node_id)
}

/// Users hold at most one edge per taxonomy kind. Any other edge of `kind` is dropped, and `None`
/// clears the kind. Callers run this inside a transaction.
pub async fn set_user_taxonomy(
	executor: &mut PgConnection,
	user_id: Uuid,
	kind: TaxonomyKind,
	name: Option<&str>,
) -> Result<()> {
	if kind == TaxonomyKind::Cuisine {
		return Err(Error::InvalidArgument("users do not link to cuisine nodes".to_string()));
	}

	let node_id = match name {
		Some(name) => Some(merge_taxonomy_node(executor, kind, name).await?),
		None => None,
	};

	sqlx::query(
		"\
DELETE FROM user_taxonomy_edges
WHERE user_id = $1 AND relation = $2 AND node_id IS DISTINCT FROM $3",
	)
	.bind(user_id)
	.bind(kind.relation())
	.bind(node_id)
	.execute(&mut *executor)
	.await?;

	let Some(node_id) = node_id else {
		return Ok(());
	};

	sqlx::query(
		"\
INSERT INTO user_taxonomy_edges (user_id, node_id, relation, created_at)
VALUES ($1, $2, $3, now())
ON CONFLICT (user_id, node_id) DO NOTHING",
	)
	.bind(user_id)
	.bind(node_id)
	.bind(kind.relation())
	.execute(&mut *executor)
	.await?;

	Ok(())
}

pub async fn insert_behavior(
	executor: &mut PgConnection,
	email: &str,
	behavior: &NewBehavior,
) -> Result<BehaviorNode> {
	let email = normalize_email(email)?;

	if behavior.action.trim().is_empty() {
		return Err(Error::InvalidArgument("behavior action must not be empty".to_string()));
	}

	let row = sqlx::query_as::<_, BehaviorNode>(
		"\
INSERT INTO behaviors (behavior_id, user_id, type, action, context, metadata, timestamp)
SELECT $1, user_id, $3, $4, $5, $6, $7
FROM users
WHERE email = $2
RETURNING behavior_id, type, action, context, metadata, timestamp",
	)
	.bind(Uuid::new_v4())
	.bind(email.as_str())
	.bind(behavior.kind.as_str())
	.bind(behavior.action.as_str())
	.bind(behavior.context.as_deref())
	.bind(behavior.metadata.as_ref())
	.bind(behavior.timestamp)
	.fetch_optional(&mut *executor)
	.await?;

	row.ok_or_else(|| Error::NotFound(format!("user not found; email={email}")))
}

pub async fn upsert_restaurant(
	executor: &mut PgConnection,
	restaurant: &RestaurantUpsert,
) -> Result<RestaurantNode> {
	let restaurant_id = restaurant.restaurant_id.trim();

	if restaurant_id.is_empty() {
		return Err(Error::InvalidArgument("restaurant id must not be empty".to_string()));
	}
	if restaurant.name.trim().is_empty() {
		return Err(Error::InvalidArgument("restaurant name must not be empty".to_string()));
	}

	let sql = format!(
		"\
INSERT INTO restaurants (
	restaurant_id,
	name,
	cuisine,
	location,
	rating,
	price_range,
	features,
	location_point,
	created_at,
	updated_at
)
VALUES (
	$1,
	$2,
	$3,
	$4,
	$5,
	$6,
	$7,
	CASE WHEN $8::float8 IS NULL OR $9::float8 IS NULL THEN NULL ELSE point($9, $8) END,
	now(),
	now()
)
ON CONFLICT (restaurant_id) DO UPDATE
SET
	name = EXCLUDED.name,
	cuisine = EXCLUDED.cuisine,
	location = EXCLUDED.location,
	rating = EXCLUDED.rating,
	price_range = EXCLUDED.price_range,
	features = EXCLUDED.features,
	location_point = COALESCE(EXCLUDED.location_point, restaurants.location_point),
	updated_at = now()
RETURNING
{RESTAURANT_COLUMNS}"
	);
	let row = sqlx::query_as::<_, RestaurantNode>(&sql)
		.bind(restaurant_id)
		.bind(restaurant.name.trim())
		.bind(restaurant.cuisine.as_deref())
		.bind(restaurant.location.as_deref())
		.bind(restaurant.rating)
		.bind(restaurant.price_range.as_deref())
		.bind(&restaurant.features)
		.bind(restaurant.coordinates.map(|point| point.latitude))
		.bind(restaurant.coordinates.map(|point| point.longitude))
		.fetch_one(&mut *executor)
		.await?;

	if let Some(cuisine) = restaurant.cuisine.as_deref().filter(|cuisine| !cuisine.trim().is_empty())
	{
		let node_id = merge_taxonomy_node(executor, TaxonomyKind::Cuisine, cuisine).await?;

		sqlx::query(
			"\
INSERT INTO restaurant_taxonomy_edges (restaurant_id, node_id, relation, created_at)
VALUES ($1, $2, $3, now())
ON CONFLICT (restaurant_id, node_id) DO NOTHING",
		)
		.bind(restaurant_id)
		.bind(node_id)
		.bind(TaxonomyKind::Cuisine.relation())
		.execute(&mut *executor)
		.await?;
	}

	Ok(row)
}

pub async fn fetch_restaurants(
	executor: &mut PgConnection,
	restaurant_ids: &[String],
) -> Result<Vec<RestaurantNode>> {
	if restaurant_ids.is_empty() {
		return Ok(Vec::new());
	}

	let sql = format!(
		"SELECT\n{RESTAURANT_COLUMNS}\nFROM restaurants\nWHERE restaurant_id = ANY($1::text[])\nORDER BY restaurant_id"
	);
	let rows = sqlx::query_as::<_, RestaurantNode>(&sql)
		.bind(restaurant_ids)
		.fetch_all(&mut *executor)
		.await?;

	Ok(rows)
}

/// `Ok(None)` when no user has the email.
pub async fn fetch_profile(
	executor: &mut PgConnection,
	email: &str,
	behaviors_since: OffsetDateTime,
) -> Result<Option<UserProfile>> {
	let Some(user) = find_user_by_email(executor, email).await? else {
		return Ok(None);
	};
	let preferences = sqlx::query_as::<_, PreferenceNode>(
		"\
SELECT
	p.preference_id,
	p.type,
	p.category,
	p.value,
	p.weight,
	up.strength,
	p.preference,
	p.source,
	p.created_at
FROM user_preferences up
JOIN preferences p ON p.preference_id = up.preference_id
WHERE up.user_id = $1
ORDER BY p.type, p.category, p.value",
	)
	.bind(user.user_id)
	.fetch_all(&mut *executor)
	.await?;
	let taxonomy: Vec<(String, String)> = sqlx::query_as(
		"\
SELECT n.kind, n.name
FROM user_taxonomy_edges e
JOIN taxonomy_nodes n ON n.node_id = e.node_id
WHERE e.user_id = $1
ORDER BY e.created_at, n.name",
	)
	.bind(user.user_id)
	.fetch_all(&mut *executor)
	.await?;
	let recent_behaviors = sqlx::query_as::<_, BehaviorNode>(
		"\
SELECT behavior_id, type, action, context, metadata, timestamp
FROM behaviors
WHERE user_id = $1
	AND timestamp >= $2
ORDER BY timestamp DESC, behavior_id",
	)
	.bind(user.user_id)
	.bind(behaviors_since)
	.fetch_all(&mut *executor)
	.await?;
	let names_of = |kind: TaxonomyKind| {
		taxonomy
			.iter()
			.filter(|(row_kind, _)| row_kind == kind.as_str())
			.map(|(_, name)| name.clone())
			.collect::<Vec<_>>()
	};

	Ok(Some(UserProfile {
		diet_types: names_of(TaxonomyKind::DietType),
		age_groups: names_of(TaxonomyKind::AgeGroup),
		locations: names_of(TaxonomyKind::Location),
		user,
		preferences,
		recent_behaviors,
	}))
}

/// Ranked by shared preference count, then email. The querying user is never returned.
pub async fn find_similar_users(
	executor: &mut PgConnection,
	email: &str,
	limit: u32,
) -> Result<Vec<SimilarUser>> {
	let email = normalize_email(email)?;

	if limit == 0 {
		return Ok(Vec::new());
	}

	let rows = sqlx::query_as::<_, SimilarUser>(
		"\
WITH target AS (
	SELECT user_id
	FROM users
	WHERE email = $1
),
shared AS (
	SELECT
		other.user_id,
		count(*) AS shared_preferences,
		array_agg(DISTINCT p.value ORDER BY p.value) AS common_preferences
	FROM user_preferences mine
	JOIN target ON target.user_id = mine.user_id
	JOIN user_preferences other
		ON other.preference_id = mine.preference_id
		AND other.user_id <> mine.user_id
	JOIN preferences p ON p.preference_id = mine.preference_id
	GROUP BY other.user_id
)
SELECT
	u.user_id,
	u.email,
	u.name,
	s.shared_preferences,
	s.common_preferences,
	ARRAY(
		SELECT DISTINCT p2.value
		FROM user_preferences up2
		JOIN preferences p2 ON p2.preference_id = up2.preference_id
		WHERE up2.user_id = u.user_id
		ORDER BY p2.value
	) AS all_preferences
FROM shared s
JOIN users u ON u.user_id = s.user_id
ORDER BY s.shared_preferences DESC, u.email ASC
LIMIT $2",
	)
	.bind(email.as_str())
	.bind(i64::from(limit))
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

/// Deletes behaviors strictly older than `cutoff`. The owning edge goes with the row.
pub async fn purge_behaviors_before(
	executor: &mut PgConnection,
	cutoff: OffsetDateTime,
) -> Result<u64> {
	let result = sqlx::query("DELETE FROM behaviors WHERE timestamp < $1")
		.bind(cutoff)
		.execute(&mut *executor)
		.await?;

	Ok(result.rows_affected())
}
