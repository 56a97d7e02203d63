//! Relational rendition of the preference graph.
//!
//! Tables are created with `IF NOT EXISTS`. Uniqueness constraints and indexes are issued one by
//! one without guards so that an "already exists" answer from Postgres can be told apart from a
//! real failure.

pub const TABLES: [&str; 9] = [
	include_str!("../../../sql/tables/001_users.sql"),
	include_str!("../../../sql/tables/002_preferences.sql"),
	include_str!("../../../sql/tables/003_user_preferences.sql"),
	include_str!("../../../sql/tables/004_behaviors.sql"),
	include_str!("../../../sql/tables/005_restaurants.sql"),
	include_str!("../../../sql/tables/006_taxonomy_nodes.sql"),
	include_str!("../../../sql/tables/007_user_taxonomy_edges.sql"),
	include_str!("../../../sql/tables/008_restaurant_taxonomy_edges.sql"),
	include_str!("../../../sql/tables/009_onboarding_records.sql"),
];

const CONSTRAINTS: &str = include_str!("../../../sql/constraints.sql");
const INDEXES: &str = include_str!("../../../sql/indexes.sql");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchemaItem {
	pub name: &'static str,
	pub sql: &'static str,
}

/// Constraints first: the graph writers rely on them for `ON CONFLICT` targets.
pub fn definitions() -> Vec<SchemaItem> {
	split_statements(CONSTRAINTS).chain(split_statements(INDEXES)).collect()
}

fn split_statements(sql: &'static str) -> impl Iterator<Item = SchemaItem> {
	sql.split(';')
		.map(str::trim)
		.filter(|statement| !statement.is_empty())
		.map(|statement| SchemaItem { name: item_name(statement), sql: statement })
}

fn item_name(statement: &'static str) -> &'static str {
	let mut tokens = statement.split_whitespace();

	while let Some(token) = tokens.next() {
		if token.eq_ignore_ascii_case("INDEX") || token.eq_ignore_ascii_case("CONSTRAINT") {
			return tokens.next().unwrap_or(statement);
		}
	}

	statement
}
