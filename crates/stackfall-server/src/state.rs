use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use stackfall_core::SessionId;

use crate::config::ServerConfig;
use crate::registry::Registry;

/// Shared application state.
pub struct AppState {
    pub config: ServerConfig,
    pub registry: Registry,
    pub connection_count: AtomicU32,
    next_session_id: AtomicU64,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            registry: Registry::new(),
            connection_count: AtomicU32::new(0),
            next_session_id: AtomicU64::new(1),
        }
    }

    pub fn allocate_session_id(&self) -> SessionId {
        self.next_session_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn at_capacity(&self) -> bool {
        self.connection_count.load(Ordering::Relaxed) >= self.config.max_connections
    }
}
