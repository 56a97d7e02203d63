use std::{sync::Arc, time::Duration as StdDuration};

use tokio::time as tokio_time;

use crate::{Error, Result};
use savor_service::{CleanupReport, SavorService};

pub struct WorkerState {
	pub service: Arc<SavorService>,
	pub retention_days: u32,
	pub interval_seconds: u64,
}

/// Runs the retention sweep forever. A failed sweep is logged and retried on the next tick.
pub async fn run_worker(state: WorkerState) -> Result<()> {
	if state.interval_seconds == 0 {
		return Err(Error::Validation(
			"knowledge_graph.cleanup_interval_seconds must be greater than zero.".to_string(),
		));
	}

	let mut ticker = tokio_time::interval(StdDuration::from_secs(state.interval_seconds));

	ticker.set_missed_tick_behavior(tokio_time::MissedTickBehavior::Delay);

	tracing::info!(
		retention_days = state.retention_days,
		interval_seconds = state.interval_seconds,
		"Behavior retention worker started."
	);

	loop {
		ticker.tick().await;

		if let Err(err) = sweep_once(&state).await {
			tracing::error!(error = %err, "Behavior retention sweep failed.");
		}
	}
}

pub async fn sweep_once(state: &WorkerState) -> Result<CleanupReport> {
	let report = state.service.cleanup_old_behaviors(state.retention_days).await?;

	if report.deleted > 0 {
		tracing::info!(deleted = report.deleted, cutoff = %report.cutoff, "Expired behaviors purged.");
	} else {
		tracing::debug!(cutoff = %report.cutoff, "No expired behaviors.");
	}

	Ok(report)
}
