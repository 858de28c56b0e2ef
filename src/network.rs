//! Network mode toggle forwarded to the document store.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::error::Result;
use crate::store::{bounded, DocumentStore};

/// Switches the store client between online and offline operation.
///
/// What offline means for reads and writes is up to the store; this type only
/// forwards the request.
pub struct NetworkModeSwitch<S: DocumentStore> {
    store: Arc<S>,
    timeout: Option<Duration>,
}

impl<S: DocumentStore> NetworkModeSwitch<S> {
    pub fn new(store: Arc<S>, timeout: Option<Duration>) -> Self {
        Self { store, timeout }
    }

    pub async fn enable_offline(&self) -> Result<()> {
        bounded(self.timeout, "set_network_mode", self.store.set_network_mode(false)).await?;
        info!("Network disabled, store serving local data");
        Ok(())
    }

    pub async fn enable_online(&self) -> Result<()> {
        bounded(self.timeout, "set_network_mode", self.store.set_network_mode(true)).await?;
        info!("Network enabled");
        Ok(())
    }
}
