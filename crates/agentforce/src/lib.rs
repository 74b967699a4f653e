//! Salesforce Agentforce gateway
//!
//! Session lifecycle against the Agentforce Agent API:
//! OAuth client-credentials token acquisition, session creation,
//! streaming message exchange (Server-Sent-Events, buffered and
//! decoded whole), and best-effort teardown. Session state lives in
//! an injected [`SessionStore`] with a timer-driven expiry sweep;
//! nothing survives a process restart.

pub mod client;
pub mod session;
pub mod sse;

pub use client::{AgentforceClient, StartedSession};
pub use session::{AgentSession, SessionStore};
pub use sse::{decode, SseDecoded};

use thiserror::Error;

/// Reply used when the event stream carries no Inform message, so the
/// chat UI never hangs on an empty agent turn.
pub const FALLBACK_REPLY: &str =
    "I apologize, but I couldn't process your request. Please try again.";

/// Agentforce gateway errors
#[derive(Error, Debug)]
pub enum AgentforceError {
    #[error("Salesforce credentials not configured")]
    Configuration,

    #[error("Request timeout - Agentforce took too long to respond")]
    Timeout,

    #[error("Cannot connect to Agentforce: {0}")]
    Transport(String),

    #[error("Agentforce returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Unexpected response shape: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for AgentforceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AgentforceError::Timeout
        } else {
            AgentforceError::Transport(err.to_string())
        }
    }
}
