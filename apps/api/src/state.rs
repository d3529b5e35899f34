use std::sync::Arc;

use crate::config::Config;
use crate::form::session::SessionStore;
use crate::submission::SubmissionSink;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub config: Config,
    /// Pluggable submission target. Default: LogSink.
    pub sink: Arc<dyn SubmissionSink>,
}

impl AppState {
    pub fn new(config: Config, sink: Arc<dyn SubmissionSink>) -> Self {
        Self {
            sessions: SessionStore::new(config.max_sessions, config.session_idle_timeout),
            config,
            sink,
        }
    }
}
