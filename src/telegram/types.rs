//! Handler types and dependencies

use std::sync::Arc;

use crate::registry::Registry;
use crate::telegram::state::InteractionState;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub registry: Arc<Registry>,
    pub interaction: Arc<InteractionState>,
}

impl HandlerDeps {
    pub fn new(registry: Arc<Registry>, interaction: Arc<InteractionState>) -> Self {
        Self { registry, interaction }
    }
}
