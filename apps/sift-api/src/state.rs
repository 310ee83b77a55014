use std::sync::Arc;

use sift_service::SiftService;
use sift_storage::{PgExecutor, db::Db};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SiftService>,
}
impl AppState {
	pub async fn new(config: sift_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let executor = Arc::new(PgExecutor::new(db.pool));

		Ok(Self::from_service(SiftService::new(config, executor)))
	}

	pub fn from_service(service: SiftService) -> Self {
		Self { service: Arc::new(service) }
	}
}
