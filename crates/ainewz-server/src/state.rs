use std::sync::Arc;

use ainewz_core::feed::Fetch;
use ainewz_core::store::PayloadStore;
use ainewz_core::AppConfig;

pub struct AppState {
    pub store: Arc<dyn PayloadStore>,
    pub fetcher: Arc<dyn Fetch>,
    pub config: Arc<AppConfig>,
}
