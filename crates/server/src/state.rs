//! Application State

use parking_lot::RwLock;
use std::sync::Arc;

use honeypot_agent::{AgentConfig, HoneypotAgent, TemplateReplyGenerator};
use honeypot_config::Settings;
use honeypot_core::EnrichmentOracle;

use crate::session::SessionManager;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<RwLock<Settings>>,
    /// Session manager
    pub sessions: Arc<SessionManager>,
    /// Turn pipeline
    pub agent: Arc<HoneypotAgent>,
}

impl AppState {
    /// Create application state without an enrichment oracle
    pub fn new(config: Settings) -> Self {
        Self::with_oracle(config, None)
    }

    pub fn with_oracle(config: Settings, oracle: Option<Arc<dyn EnrichmentOracle>>) -> Self {
        let replies = Arc::new(TemplateReplyGenerator::new(config.agent.max_template_turn));
        let mut agent = HoneypotAgent::new(AgentConfig::from_settings(&config), replies);
        if let Some(oracle) = oracle {
            tracing::info!(oracle = oracle.name(), "Enrichment oracle attached");
            agent = agent.with_oracle(oracle);
        }

        Self {
            sessions: Arc::new(SessionManager::from_settings(&config.session)),
            agent: Arc::new(agent),
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// Snapshot of the current configuration
    pub fn get_config(&self) -> Settings {
        self.config.read().clone()
    }
}
