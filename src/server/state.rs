use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::mailing::{ConfigStore, MailDispatcher};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub config_store: Arc<ConfigStore>,
    pub dispatcher: Arc<MailDispatcher>,
    pub started_at: Instant,
}

impl AppState {
    /// Build state around an already set up (or deliberately empty) store
    pub fn new(settings: Settings, config_store: Arc<ConfigStore>) -> Self {
        let dispatcher = Arc::new(MailDispatcher::new(config_store.clone()));

        Self {
            settings: Arc::new(settings),
            config_store,
            dispatcher,
            started_at: Instant::now(),
        }
    }
}
