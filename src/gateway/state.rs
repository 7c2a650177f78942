use std::sync::Arc;
use std::time::Duration;

use crate::store::Store;
use crate::token::TokenMaker;
use crate::transfer::TransferEngine;

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub engine: TransferEngine,
    pub token_maker: Arc<TokenMaker>,
    /// Lifetime of tokens issued at login
    pub access_token_duration: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        token_maker: Arc<TokenMaker>,
        access_token_duration: Duration,
    ) -> Self {
        Self {
            engine: TransferEngine::new(store.clone()),
            store,
            token_maker,
            access_token_duration,
        }
    }

    /// Apply a default deadline to every transfer.
    pub fn with_transfer_timeout(mut self, timeout: Option<Duration>) -> Self {
        if let Some(timeout) = timeout {
            self.engine = self.engine.with_timeout(timeout);
        }
        self
    }
}
