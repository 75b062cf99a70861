//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::{Store, TimedStore};
use crate::services::token::TokenAuthority;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the store and the token authority.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: TimedStore,
    tokens: TokenAuthority,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `store` - Persistence backend; every call on it is bounded by
    ///   `config.store_timeout`
    #[must_use]
    pub fn new(config: ServerConfig, store: Arc<dyn Store>) -> Self {
        let store = TimedStore::new(store, config.store_timeout);
        let tokens = TokenAuthority::new(&config.token_secret, config.token_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                tokens,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get the (time-bounded) store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        &self.inner.store
    }

    /// Get the token authority.
    #[must_use]
    pub fn tokens(&self) -> &TokenAuthority {
        &self.inner.tokens
    }
}
