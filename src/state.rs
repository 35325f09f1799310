use crate::config::AppConfig;
use crate::services::notify::Notifier;
use crate::store::Stores;

pub struct AppState {
    pub stores: Stores,
    pub config: AppConfig,
    pub notifier: Box<dyn Notifier>,
}
