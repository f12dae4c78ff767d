use std::sync::Arc;

use crate::config::Config;
use crate::dashboard::pipeline::{ActiveViews, Collaborators};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Session provider, user directory and valuation source, behind traits.
    pub collaborators: Collaborators,
    /// In-flight dashboard activations, one per session.
    pub views: Arc<ActiveViews>,
}

impl AppState {
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            views: Arc::new(ActiveViews::default()),
        }
    }
}
