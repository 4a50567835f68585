use std::sync::Arc;
use cardsort_core::{Config, RunSupervisor, SanitizedConfig};

use crate::api::WsBroadcaster;

/// Shared application state
pub struct AppState {
    config: Config,
    supervisor: Arc<RunSupervisor>,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(
        config: Config,
        supervisor: Arc<RunSupervisor>,
        ws_broadcaster: WsBroadcaster,
    ) -> Self {
        Self {
            config,
            supervisor,
            ws_broadcaster,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn supervisor(&self) -> &RunSupervisor {
        self.supervisor.as_ref()
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }
}
