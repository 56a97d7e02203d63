use std::{
	collections::BTreeMap,
	sync::{Mutex, MutexGuard},
};

use time::OffsetDateTime;
use uuid::Uuid;

use savor_domain::{PreferenceTuple, TaxonomyKind, sentiment};
use savor_storage::{
	BoxFuture, Error, GraphStore, Result,
	db::SchemaReport,
	graph::normalize_email,
	models::{
		BehaviorNode, NewBehavior, PreferenceNode, RestaurantNode, RestaurantUpsert, SimilarUser,
		UserNode, UserProfile, UserUpsert,
	},
	schema,
};

/// In-process [`GraphStore`] with the same merge and ranking rules as the Postgres store.
#[derive(Default)]
pub struct MemoryGraphStore {
	state: Mutex<State>,
}

#[derive(Default)]
struct State {
	schema_ready: bool,
	users: Vec<UserNode>,
	preferences: Vec<SharedPreference>,
	// (user_id, preference_id) -> strength
	edges: BTreeMap<(Uuid, Uuid), i32>,
	behaviors: Vec<(Uuid, BehaviorNode)>,
	restaurants: BTreeMap<String, RestaurantNode>,
	taxonomy: Vec<(Uuid, TaxonomyKind, String)>,
	cuisines: Vec<(String, String)>,
}

struct SharedPreference {
	preference_id: Uuid,
	kind: String,
	category: String,
	value: String,
	weight: i32,
	preference: String,
	source: String,
	created_at: OffsetDateTime,
}

impl MemoryGraphStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn user_count(&self) -> usize {
		self.lock().users.len()
	}

	pub fn preference_count(&self) -> usize {
		self.lock().preferences.len()
	}

	pub fn edge_count(&self) -> usize {
		self.lock().edges.len()
	}

	pub fn behavior_count(&self) -> usize {
		self.lock().behaviors.len()
	}

	pub fn behavior_timestamps(&self) -> Vec<OffsetDateTime> {
		self.lock().behaviors.iter().map(|(_, behavior)| behavior.timestamp).collect()
	}

	pub fn cuisine_links(&self) -> Vec<(String, String)> {
		self.lock().cuisines.clone()
	}

	fn lock(&self) -> MutexGuard<'_, State> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}
}
impl State {
	fn user_by_email(&self, email: &str) -> Option<&UserNode> {
		self.users.iter().find(|user| user.email == email)
	}

	fn upsert_user(&mut self, input: &UserUpsert) -> Result<UserNode> {
		let email = normalize_email(&input.email)?;

		if input.age.is_some_and(|age| age < 0) {
			return Err(Error::InvalidArgument("age must not be negative".to_string()));
		}

		let now = OffsetDateTime::now_utc();

		if let Some(user) = self.users.iter_mut().find(|user| user.email == email) {
			if input.name.is_some() {
				user.name = input.name.clone();
			}
			if input.age.is_some() {
				user.age = input.age;
			}
			if input.location.is_some() {
				user.location = input.location.clone();
			}

			user.onboarding_completed |= input.onboarding_completed;
			user.updated_at = now;

			return Ok(user.clone());
		}

		let user = UserNode {
			user_id: Uuid::new_v4(),
			email,
			name: input.name.clone(),
			age: input.age,
			location: input.location.clone(),
			onboarding_completed: input.onboarding_completed,
			created_at: now,
			updated_at: now,
		};

		self.users.push(user.clone());

		Ok(user)
	}

	fn upsert_preference(&mut self, user_id: Uuid, tuple: &PreferenceTuple) -> Result<()> {
		if tuple.category.trim().is_empty() || tuple.value.trim().is_empty() {
			return Err(Error::InvalidArgument(
				"preference category and value must not be empty".to_string(),
			));
		}
		if !self.users.iter().any(|user| user.user_id == user_id) {
			return Err(Error::NotFound(format!("user not found; user_id={user_id}")));
		}

		let weight = sentiment::clamp_weight(tuple.weight);
		let existing = self.preferences.iter_mut().find(|pref| {
			pref.kind == tuple.kind.as_str()
				&& pref.category == tuple.category
				&& pref.value == tuple.value
		});
		let preference_id = match existing {
			Some(pref) => {
				pref.weight = weight;
				pref.preference = tuple.preference.clone();
				pref.source = tuple.source.clone();

				pref.preference_id
			},
			None => {
				let preference_id = Uuid::new_v4();

				self.preferences.push(SharedPreference {
					preference_id,
					kind: tuple.kind.as_str().to_string(),
					category: tuple.category.clone(),
					value: tuple.value.clone(),
					weight,
					preference: tuple.preference.clone(),
					source: tuple.source.clone(),
					created_at: OffsetDateTime::now_utc(),
				});

				preference_id
			},
		};

		self.edges.insert((user_id, preference_id), weight);

		Ok(())
	}

	fn set_taxonomy(&mut self, user_id: Uuid, kind: TaxonomyKind, name: Option<&str>) -> Result<()> {
		let name = name.map(str::trim);

		if kind == TaxonomyKind::Cuisine {
			return Err(Error::InvalidArgument("users do not link to cuisine nodes".to_string()));
		}
		if name.is_some_and(str::is_empty) {
			return Err(Error::InvalidArgument(format!("{kind} name must not be empty")));
		}

		self.taxonomy.retain(|(id, k, n)| *id != user_id || *k != kind || Some(n.as_str()) == name);

		let linked = self.taxonomy.iter().any(|(id, k, _)| *id == user_id && *k == kind);

		if let (Some(name), false) = (name, linked) {
			self.taxonomy.push((user_id, kind, name.to_string()));
		}

		Ok(())
	}

	fn preferences_of(&self, user_id: Uuid) -> Vec<PreferenceNode> {
		let mut out = self
			.edges
			.iter()
			.filter(|((owner, _), _)| *owner == user_id)
			.filter_map(|((_, preference_id), strength)| {
				self.preferences.iter().find(|pref| pref.preference_id == *preference_id).map(
					|pref| PreferenceNode {
						preference_id: pref.preference_id,
						r#type: pref.kind.clone(),
						category: pref.category.clone(),
						value: pref.value.clone(),
						weight: pref.weight,
						strength: *strength,
						preference: pref.preference.clone(),
						source: pref.source.clone(),
						created_at: pref.created_at,
					},
				)
			})
			.collect::<Vec<_>>();

		out.sort_by(|a, b| {
			(a.r#type.as_str(), a.category.as_str(), a.value.as_str()).cmp(&(
				b.r#type.as_str(),
				b.category.as_str(),
				b.value.as_str(),
			))
		});

		out
	}
}
impl GraphStore for MemoryGraphStore {
	fn ensure_schema(&self) -> BoxFuture<'_, Result<SchemaReport>> {
		Box::pin(async move {
			let mut state = self.lock();
			let names = schema::definitions().into_iter().map(|item| item.name.to_string());
			let report = if state.schema_ready {
				SchemaReport { created: Vec::new(), already_present: names.collect() }
			} else {
				SchemaReport { created: names.collect(), already_present: Vec::new() }
			};

			state.schema_ready = true;

			Ok(report)
		})
	}

	fn upsert_user<'a>(&'a self, user: &'a UserUpsert) -> BoxFuture<'a, Result<UserNode>> {
		Box::pin(async move { self.lock().upsert_user(user) })
	}

	fn upsert_preferences<'a>(
		&'a self,
		user_id: Uuid,
		preferences: &'a [PreferenceTuple],
	) -> BoxFuture<'a, Result<usize>> {
		Box::pin(async move {
			let mut state = self.lock();

			for tuple in preferences {
				state.upsert_preference(user_id, tuple)?;
			}

			Ok(preferences.len())
		})
	}

	fn set_user_taxonomy<'a>(
		&'a self,
		user_id: Uuid,
		kind: TaxonomyKind,
		name: Option<&'a str>,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { self.lock().set_taxonomy(user_id, kind, name) })
	}

	fn insert_behavior<'a>(
		&'a self,
		email: &'a str,
		behavior: &'a NewBehavior,
	) -> BoxFuture<'a, Result<BehaviorNode>> {
		Box::pin(async move {
			let email = normalize_email(email)?;

			if behavior.action.trim().is_empty() {
				return Err(Error::InvalidArgument("behavior action must not be empty".to_string()));
			}

			let mut state = self.lock();
			let Some(user_id) = state.user_by_email(&email).map(|user| user.user_id) else {
				return Err(Error::NotFound(format!("user not found; email={email}")));
			};
			let node = BehaviorNode {
				behavior_id: Uuid::new_v4(),
				r#type: behavior.kind.as_str().to_string(),
				action: behavior.action.clone(),
				context: behavior.context.clone(),
				metadata: behavior.metadata.clone(),
				timestamp: behavior.timestamp,
			};

			state.behaviors.push((user_id, node.clone()));

			Ok(node)
		})
	}

	fn upsert_restaurant<'a>(
		&'a self,
		restaurant: &'a RestaurantUpsert,
	) -> BoxFuture<'a, Result<RestaurantNode>> {
		Box::pin(async move {
			let restaurant_id = restaurant.restaurant_id.trim().to_string();

			if restaurant_id.is_empty() {
				return Err(Error::InvalidArgument("restaurant id must not be empty".to_string()));
			}
			if restaurant.name.trim().is_empty() {
				return Err(Error::InvalidArgument("restaurant name must not be empty".to_string()));
			}

			let mut state = self.lock();
			let now = OffsetDateTime::now_utc();
			let previous = state.restaurants.get(&restaurant_id);
			let created_at = previous.map(|node| node.created_at).unwrap_or(now);
			let (latitude, longitude) = match restaurant.coordinates {
				Some(point) => (Some(point.latitude), Some(point.longitude)),
				None => previous.map(|node| (node.latitude, node.longitude)).unwrap_or_default(),
			};
			let node = RestaurantNode {
				restaurant_id: restaurant_id.clone(),
				name: restaurant.name.trim().to_string(),
				cuisine: restaurant.cuisine.clone(),
				location: restaurant.location.clone(),
				rating: restaurant.rating,
				price_range: restaurant.price_range.clone(),
				features: restaurant.features.clone(),
				latitude,
				longitude,
				created_at,
				updated_at: now,
			};

			state.restaurants.insert(restaurant_id.clone(), node.clone());

			if let Some(cuisine) = restaurant.cuisine.as_deref().map(str::trim)
				&& !cuisine.is_empty()
				&& !state.cuisines.iter().any(|(id, name)| *id == restaurant_id && name == cuisine)
			{
				state.cuisines.push((restaurant_id, cuisine.to_string()));
			}

			Ok(node)
		})
	}

	fn fetch_profile<'a>(
		&'a self,
		email: &'a str,
		behaviors_since: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<UserProfile>>> {
		Box::pin(async move {
			let email = normalize_email(email)?;
			let state = self.lock();
			let Some(user) = state.user_by_email(&email).cloned() else {
				return Ok(None);
			};
			let names_of = |kind: TaxonomyKind| {
				state
					.taxonomy
					.iter()
					.filter(|(id, k, _)| *id == user.user_id && *k == kind)
					.map(|(_, _, name)| name.clone())
					.collect::<Vec<_>>()
			};
			let mut recent_behaviors = state
				.behaviors
				.iter()
				.filter(|(owner, behavior)| {
					*owner == user.user_id && behavior.timestamp >= behaviors_since
				})
				.map(|(_, behavior)| behavior.clone())
				.collect::<Vec<_>>();

			recent_behaviors.sort_by(|a, b| {
				b.timestamp.cmp(&a.timestamp).then_with(|| a.behavior_id.cmp(&b.behavior_id))
			});

			Ok(Some(UserProfile {
				preferences: state.preferences_of(user.user_id),
				diet_types: names_of(TaxonomyKind::DietType),
				age_groups: names_of(TaxonomyKind::AgeGroup),
				locations: names_of(TaxonomyKind::Location),
				recent_behaviors,
				user,
			}))
		})
	}

	fn fetch_restaurants<'a>(
		&'a self,
		restaurant_ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<RestaurantNode>>> {
		Box::pin(async move {
			let state = self.lock();

			Ok(state
				.restaurants
				.values()
				.filter(|node| restaurant_ids.contains(&node.restaurant_id))
				.cloned()
				.collect())
		})
	}

	fn find_similar_users<'a>(
		&'a self,
		email: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<SimilarUser>>> {
		Box::pin(async move {
			let email = normalize_email(email)?;
			let state = self.lock();
			let Some(target) = state.user_by_email(&email).map(|user| user.user_id) else {
				return Ok(Vec::new());
			};
			let mine = state.preferences_of(target);
			let mut out = state
				.users
				.iter()
				.filter(|user| user.user_id != target)
				.filter_map(|user| {
					let theirs = state.preferences_of(user.user_id);
					let mut common = mine
						.iter()
						.filter(|pref| {
							theirs.iter().any(|other| other.preference_id == pref.preference_id)
						})
						.map(|pref| pref.value.clone())
						.collect::<Vec<_>>();

					if common.is_empty() {
						return None;
					}

					let shared_preferences = common.len() as i64;
					let mut all = theirs.into_iter().map(|pref| pref.value).collect::<Vec<_>>();

					common.sort();
					common.dedup();
					all.sort();
					all.dedup();

					Some(SimilarUser {
						user_id: user.user_id,
						email: user.email.clone(),
						name: user.name.clone(),
						shared_preferences,
						common_preferences: common,
						all_preferences: all,
					})
				})
				.collect::<Vec<_>>();

			out.sort_by(|a, b| {
				b.shared_preferences.cmp(&a.shared_preferences).then_with(|| a.email.cmp(&b.email))
			});
			out.truncate(limit as usize);

			Ok(out)
		})
	}

	fn purge_behaviors_before(&self, cutoff: OffsetDateTime) -> BoxFuture<'_, Result<u64>> {
		Box::pin(async move {
			let mut state = self.lock();
			let before = state.behaviors.len();

			state.behaviors.retain(|(_, behavior)| behavior.timestamp >= cutoff);

			Ok((before - state.behaviors.len()) as u64)
		})
	}
}

/// A store whose every call fails like an unreachable database.
#[derive(Default)]
pub struct FailingGraphStore;
impl FailingGraphStore {
	fn unavailable<T>() -> Result<T> {
		Err(Error::Sqlx(sqlx::Error::PoolTimedOut))
	}
}
impl GraphStore for FailingGraphStore {
	fn ensure_schema(&self) -> BoxFuture<'_, Result<SchemaReport>> {
		Box::pin(async { Self::unavailable() })
	}

	fn upsert_user<'a>(&'a self, _: &'a UserUpsert) -> BoxFuture<'a, Result<UserNode>> {
		Box::pin(async { Self::unavailable() })
	}

	fn upsert_preferences<'a>(
		&'a self,
		_: Uuid,
		_: &'a [PreferenceTuple],
	) -> BoxFuture<'a, Result<usize>> {
		Box::pin(async { Self::unavailable() })
	}

	fn set_user_taxonomy<'a>(
		&'a self,
		_: Uuid,
		_: TaxonomyKind,
		_: Option<&'a str>,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async { Self::unavailable() })
	}

	fn insert_behavior<'a>(
		&'a self,
		_: &'a str,
		_: &'a NewBehavior,
	) -> BoxFuture<'a, Result<BehaviorNode>> {
		Box::pin(async { Self::unavailable() })
	}

	fn upsert_restaurant<'a>(
		&'a self,
		_: &'a RestaurantUpsert,
	) -> BoxFuture<'a, Result<RestaurantNode>> {
		Box::pin(async { Self::unavailable() })
	}

	fn fetch_profile<'a>(
		&'a self,
		_: &'a str,
		_: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<UserProfile>>> {
		Box::pin(async { Self::unavailable() })
	}

	fn fetch_restaurants<'a>(
		&'a self,
		_: &'a [String],
	) -> BoxFuture<'a, Result<Vec<RestaurantNode>>> {
		Box::pin(async { Self::unavailable() })
	}

	fn find_similar_users<'a>(
		&'a self,
		_: &'a str,
		_: u32,
	) -> BoxFuture<'a, Result<Vec<SimilarUser>>> {
		Box::pin(async { Self::unavailable() })
	}

	fn purge_behaviors_before(&self, _: OffsetDateTime) -> BoxFuture<'_, Result<u64>> {
		Box::pin(async { Self::unavailable() })
	}
}
