//! Onboarding answers stored as JSON by the account service, keyed by email.

use sqlx::PgConnection;
use time::OffsetDateTime;

use crate::{Result, graph};
use savor_domain::OnboardingRecord;

pub async fn fetch_onboarding_record(
	executor: &mut PgConnection,
	email: &str,
) -> Result<Option<OnboardingRecord>> {
	let email = graph::normalize_email(email)?;
	let raw: Option<serde_json::Value> =
		sqlx::query_scalar("SELECT record FROM onboarding_records WHERE email = $1")
			.bind(email.as_str())
			.fetch_optional(&mut *executor)
			.await?;

	match raw {
		Some(value) => Ok(Some(serde_json::from_value(value)?)),
		None => Ok(None),
	}
}

pub async fn upsert_onboarding_record(
	executor: &mut PgConnection,
	email: &str,
	record: &OnboardingRecord,
	completed_at: Option<OffsetDateTime>,
) -> Result<()> {
	let email = graph::normalize_email(email)?;
	let value = serde_json::to_value(record)?;

	sqlx::query(
		"\
INSERT INTO onboarding_records (email, record, completed_at, updated_at)
VALUES ($1, $2, $3, now())
ON CONFLICT (email) DO UPDATE
SET
	record = EXCLUDED.record,
	completed_at = EXCLUDED.completed_at,
	updated_at = now()",
	)
	.bind(email.as_str())
	.bind(value)
	.bind(completed_at)
	.execute(&mut *executor)
	.await?;

	Ok(())
}
