//! Application state
//!
//! The composition root: gateways and the session store are built
//! here, once, and injected everywhere else. The store deliberately
//! has no global fallback, so tests can stand up isolated states.

use std::sync::Arc;

use siara_agentforce::{AgentforceClient, SessionStore};
use siara_bhashini::{BhashiniClient, SpeechPipeline};
use siara_config::Settings;

use crate::ServerError;

/// Shared state across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub bhashini: Arc<BhashiniClient>,
    pub pipeline: Arc<SpeechPipeline<BhashiniClient>>,
    pub agent: Arc<AgentforceClient>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Settings) -> Result<Self, ServerError> {
        let bhashini = Arc::new(BhashiniClient::new(config.bhashini.clone())?);
        let pipeline = Arc::new(SpeechPipeline::new(bhashini.clone()));
        let sessions = Arc::new(SessionStore::new());
        let agent = Arc::new(AgentforceClient::new(
            config.agentforce.clone(),
            sessions.clone(),
        )?);

        Ok(Self {
            config: Arc::new(config),
            bhashini,
            pipeline,
            agent,
            sessions,
        })
    }
}
