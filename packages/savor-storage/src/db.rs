use serde::Serialize;
use sqlx::{PgConnection, PgPool, postgres::PgPoolOptions};

use crate::{Result, schema};

const SCHEMA_LOCK_ID: i64 = 7_283_901;
// duplicate_table, duplicate_object, duplicate_schema
const ALREADY_EXISTS_CODES: [&str; 3] = ["42P07", "42710", "42P06"];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
	pub created: Vec<String>,
	pub already_present: Vec<String>,
}

#[derive(Clone)]
pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &savor_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn close(&self) {
		self.pool.close().await;
	}

	/// Safe to call repeatedly. Partial application is left in place and completed on retry.
	pub async fn ensure_schema(&self) -> Result<SchemaReport> {
		let mut conn = self.pool.acquire().await?;

		// Session-level lock, so it must be released explicitly on every path.
		sqlx::query("SELECT pg_advisory_lock($1)").bind(SCHEMA_LOCK_ID).execute(&mut *conn).await?;

		let applied = apply_schema(&mut conn).await;
		let unlocked =
			sqlx::query("SELECT pg_advisory_unlock($1)").bind(SCHEMA_LOCK_ID).execute(&mut *conn).await;

		if unlocked.is_err() {
			conn.close_on_drop();
		}

		let report = applied?;

		unlocked?;

		tracing::info!(
			created = report.created.len(),
			already_present = report.already_present.len(),
			"Schema bootstrap finished."
		);

		Ok(report)
	}
}

async fn apply_schema(conn: &mut PgConnection) -> Result<SchemaReport> {
	for table in schema::TABLES {
		sqlx::query(table).execute(&mut *conn).await?;
	}

	let mut report = SchemaReport::default();

	for item in schema::definitions() {
		match sqlx::query(item.sql).execute(&mut *conn).await {
			Ok(_) => report.created.push(item.name.to_string()),
			Err(err) if is_already_exists(&err) => {
				tracing::debug!(item = item.name, "Schema item already exists.");

				report.already_present.push(item.name.to_string());
			},
			Err(err) => return Err(err.into()),
		}
	}

	Ok(report)
}

pub fn is_already_exists(err: &sqlx::Error) -> bool {
	err.as_database_error()
		.and_then(|db_err| db_err.code())
		.is_some_and(|code| ALREADY_EXISTS_CODES.contains(&code.as_ref()))
}
