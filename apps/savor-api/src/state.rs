use std::sync::Arc;

use savor_service::SavorService;
use savor_storage::{PgGraphStore, db::Db};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SavorService>,
	db: Option<Db>,
}
impl AppState {
	pub async fn new(config: savor_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;
		let report = db.ensure_schema().await?;

		tracing::info!(
			created = report.created.len(),
			already_present = report.already_present.len(),
			"Graph schema ready."
		);

		let service = SavorService::new(config, PgGraphStore::new(db.clone()));

		Ok(Self { service: Arc::new(service), db: Some(db) })
	}

	/// Wraps an already assembled service. Nothing is closed on shutdown.
	pub fn from_service(service: SavorService) -> Self {
		Self { service: Arc::new(service), db: None }
	}

	pub async fn close(&self) {
		if let Some(db) = &self.db {
			db.close().await;
		}
	}
}
