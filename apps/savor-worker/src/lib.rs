pub mod worker;

mod error;

pub use error::{Error, Result};

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use savor_service::SavorService;
use savor_storage::{PgGraphStore, db::Db};

#[derive(Debug, Parser)]
#[command(
	version = savor_cli::VERSION,
	rename_all = "kebab",
	styles = savor_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = savor_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let state = worker::WorkerState {
		retention_days: config.knowledge_graph.behavior_retention_days,
		interval_seconds: config.knowledge_graph.cleanup_interval_seconds,
		service: Arc::new(SavorService::new(config, PgGraphStore::new(db.clone()))),
	};
	let outcome = tokio::select! {
		outcome = worker::run_worker(state) => outcome,
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Shutdown signal received.");

			Ok(())
		},
	};

	db.close().await;

	Ok(outcome?)
}
