use std::sync::Arc;

use crate::config::Config;
use crate::qa::QaSystem;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub qa: Arc<QaSystem>,
}

impl AppState {
    /// Build the QA system from `config`. Does not initialize it.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let qa = QaSystem::from_config(&config)?;
        Ok(Self {
            config,
            qa: Arc::new(qa),
        })
    }
}
