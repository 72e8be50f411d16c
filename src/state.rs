use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::error::AppError;
use crate::search::{NaverLocalSearch, SearchGateway};

/// Shared by every request handler. Built once at startup; tests assemble it
/// by hand around an in-memory database and a canned search gateway.
pub struct AppState {
    pub db: Database,
    pub search: Arc<dyn SearchGateway>,
    pub config: Config,
}

impl AppState {
    pub async fn new() -> Result<Arc<Self>, AppError> {
        let config = Config::from_env();

        let db = Database::new(&config.database_url).await?;

        let search: Arc<dyn SearchGateway> = Arc::new(NaverLocalSearch::new(
            config.search_api_url.clone(),
            config.search_client_id.clone().unwrap_or_default(),
            config.search_client_secret.clone().unwrap_or_default(),
        ));

        Ok(Arc::new(Self { db, search, config }))
    }
}
