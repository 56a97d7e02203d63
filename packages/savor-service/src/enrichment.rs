//! Outcome of a non-critical read that feeds a user-facing flow.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq)]
pub enum Enrichment<T> {
	Available(T),
	Degraded { reason: String },
}
impl<T> Enrichment<T> {
	/// Logs and keeps the failure reason instead of propagating it.
	pub fn from_result<E>(source: &'static str, result: Result<T, E>) -> Self
	where
		E: Display,
	{
		match result {
			Ok(value) => Self::Available(value),
			Err(err) => {
				tracing::warn!(source, error = %err, "Enrichment degraded.");

				Self::Degraded { reason: err.to_string() }
			},
		}
	}

	pub fn available(&self) -> Option<&T> {
		match self {
			Self::Available(value) => Some(value),
			Self::Degraded { .. } => None,
		}
	}

	pub fn into_available(self) -> Option<T> {
		match self {
			Self::Available(value) => Some(value),
			Self::Degraded { .. } => None,
		}
	}

	pub fn is_degraded(&self) -> bool {
		matches!(self, Self::Degraded { .. })
	}

	pub fn state(&self) -> EnrichmentState {
		match self {
			Self::Available(_) => EnrichmentState::Available,
			Self::Degraded { reason } => EnrichmentState::Degraded { reason: reason.clone() },
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrichmentState {
	Available,
	Degraded { reason: String },
}
