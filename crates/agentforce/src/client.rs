//! Agentforce HTTP client
//!
//! One conversation moves through Uninitialized -> Active -> Ended:
//! `start_session` acquires an OAuth client-credentials token and
//! creates the upstream session, `send_message` exchanges one turn
//! over the streaming endpoint, `end_session` tears down best-effort.
//! The store is consulted on every send; after sweep eviction the
//! caller gets a session-not-found and is expected to start over.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use siara_config::AgentforceConfig;

use crate::session::{external_session_key, SessionStore};
use crate::sse;
use crate::{AgentforceError, FALLBACK_REPLY};

const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);
const SESSION_CREATE_TIMEOUT: Duration = Duration::from_secs(30);
const MESSAGE_TIMEOUT: Duration = Duration::from_secs(60);
const SESSION_END_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionCreateResponse {
    session_id: String,
    #[serde(default)]
    messages: Vec<SessionMessage>,
}

#[derive(Debug, Deserialize)]
struct SessionMessage {
    #[serde(default)]
    message: Option<String>,
}

/// Result of starting a session
#[derive(Debug, Clone)]
pub struct StartedSession {
    pub session_id: String,
    /// Greeting embedded in the creation response, or empty
    pub greeting: String,
}

/// HTTP client for the Agentforce Agent API
pub struct AgentforceClient {
    config: AgentforceConfig,
    client: Client,
    sessions: Arc<SessionStore>,
}

impl AgentforceClient {
    pub fn new(
        config: AgentforceConfig,
        sessions: Arc<SessionStore>,
    ) -> Result<Self, AgentforceError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| AgentforceError::Transport(e.to_string()))?;
        Ok(Self {
            config,
            client,
            sessions,
        })
    }

    /// The injected session store (shared with the sweep task)
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, AgentforceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), %body, "Agentforce request failed");
        Err(AgentforceError::Upstream {
            status: status.as_u16(),
            body,
        })
    }

    /// OAuth client-credentials flow against the org's token endpoint
    async fn request_token(&self) -> Result<String, AgentforceError> {
        let url = format!("{}/services/oauth2/token", self.config.org_domain);
        let response = self
            .client
            .post(&url)
            .timeout(TOKEN_TIMEOUT)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        let token: TokenResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| AgentforceError::InvalidResponse(e.to_string()))?;
        Ok(token.access_token)
    }

    /// Uninitialized -> Active. The session is stored only on success.
    pub async fn start_session(&self) -> Result<StartedSession, AgentforceError> {
        if !self.config.is_configured() {
            return Err(AgentforceError::Configuration);
        }

        let access_token = self.request_token().await?;

        let url = format!(
            "{}/agents/{}/sessions",
            self.config.api_base, self.config.agent_id
        );
        let body = json!({
            "externalSessionKey": external_session_key(),
            "instanceConfig": {"endpoint": self.config.org_domain},
            "tz": self.config.timezone,
            "variables": [{
                "name": "$Context.EndUserLanguage",
                "type": "Text",
                "value": "en_US"
            }],
            "featureSupport": "Streaming",
            "streamingCapabilities": {"chunkTypes": ["Text"]},
            "bypassUser": true
        });

        let response = self
            .client
            .post(&url)
            .timeout(SESSION_CREATE_TIMEOUT)
            .bearer_auth(&access_token)
            .json(&body)
            .send()
            .await?;

        let created: SessionCreateResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| AgentforceError::InvalidResponse(e.to_string()))?;

        self.sessions.put(&created.session_id, &access_token);
        tracing::info!(session_id = %created.session_id, "Agentforce session started");

        let greeting = created
            .messages
            .into_iter()
            .find_map(|m| m.message)
            .unwrap_or_default();

        Ok(StartedSession {
            session_id: created.session_id,
            greeting,
        })
    }

    /// Exchange one message turn. Requires an Active session; the
    /// store lookup happens before any upstream call.
    pub async fn send_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<String, AgentforceError> {
        let session = self
            .sessions
            .get(session_id)
            .ok_or_else(|| AgentforceError::SessionNotFound(session_id.to_string()))?;

        let url = format!(
            "{}/sessions/{}/messages/stream",
            self.config.api_base, session.session_id
        );
        let body = json!({
            "message": {
                "sequenceId": chrono::Utc::now().timestamp_millis(),
                "type": "Text",
                "text": text
            }
        });

        let response = self
            .client
            .post(&url)
            .timeout(MESSAGE_TIMEOUT)
            .bearer_auth(&session.access_token)
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await?;

        let raw = Self::check(response).await?.text().await?;
        Ok(reply_from_stream(&raw))
    }

    /// Active -> Ended. Upstream delete is best-effort; the local
    /// entry always goes. Unknown ids are a no-op.
    pub async fn end_session(&self, session_id: &str) -> Result<(), AgentforceError> {
        let Some(session) = self.sessions.get(session_id) else {
            tracing::debug!(%session_id, "end_session on unknown session, nothing to do");
            return Ok(());
        };

        let url = format!("{}/sessions/{}", self.config.api_base, session.session_id);
        let result = self
            .client
            .delete(&url)
            .timeout(SESSION_END_TIMEOUT)
            .bearer_auth(&session.access_token)
            .header("x-session-end-reason", "UserRequest")
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::info!(%session_id, "Agentforce session ended");
            },
            Ok(response) => {
                tracing::warn!(
                    %session_id,
                    status = response.status().as_u16(),
                    "Upstream session delete failed, removing locally anyway"
                );
            },
            Err(e) => {
                tracing::warn!(%session_id, error = %e, "Upstream session delete failed, removing locally anyway");
            },
        }

        self.sessions.delete(session_id);
        Ok(())
    }
}

/// Decode an SSE body and pick the agent's reply: the first event
/// whose message has type "Inform" and non-empty text. A stream with
/// no such event yields the fixed fallback instead of an error.
fn reply_from_stream(raw: &str) -> String {
    let decoded = sse::decode(raw);
    if decoded.skipped > 0 {
        tracing::warn!(skipped = decoded.skipped, "Malformed events in agent stream");
    }
    extract_reply(&decoded.events).unwrap_or_else(|| FALLBACK_REPLY.to_string())
}

fn extract_reply(events: &[serde_json::Value]) -> Option<String> {
    events.iter().find_map(|event| {
        let message = event.get("message")?;
        if message.get("type")?.as_str()? != "Inform" {
            return None;
        }
        let text = message.get("message")?.as_str()?;
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_reply_inform() {
        let events = vec![
            json!({"message": {"type": "ProgressIndicator", "message": "thinking"}}),
            json!({"message": {"type": "Inform", "message": "Hello"}}),
            json!({"message": {"type": "Inform", "message": "later"}}),
        ];
        assert_eq!(extract_reply(&events).as_deref(), Some("Hello"));
    }

    #[test]
    fn test_extract_reply_skips_empty_inform() {
        let events = vec![
            json!({"message": {"type": "Inform", "message": ""}}),
            json!({"message": {"type": "Inform", "message": "Real"}}),
        ];
        assert_eq!(extract_reply(&events).as_deref(), Some("Real"));
    }

    #[test]
    fn test_reply_from_stream_inform() {
        let raw = "data: {\"message\":{\"type\":\"Inform\",\"message\":\"Hello\"}}\n\n";
        assert_eq!(reply_from_stream(raw), "Hello");
    }

    #[test]
    fn test_reply_from_stream_falls_back() {
        let raw = "data: {\"message\":{\"type\":\"ProgressIndicator\",\"message\":\"x\"}}\n\n";
        assert_eq!(reply_from_stream(raw), FALLBACK_REPLY);
        assert_eq!(reply_from_stream(""), FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_send_message_unknown_session_no_upstream_call() {
        // Default config has no credentials and no reachable endpoint;
        // the lookup must fail before any of that matters.
        let client = AgentforceClient::new(
            AgentforceConfig::default(),
            Arc::new(SessionStore::new()),
        )
        .unwrap();

        match client.send_message("ghost", "hi").await {
            Err(AgentforceError::SessionNotFound(id)) => assert_eq!(id, "ghost"),
            other => panic!("expected SessionNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_end_session_unknown_is_noop() {
        let client = AgentforceClient::new(
            AgentforceConfig::default(),
            Arc::new(SessionStore::new()),
        )
        .unwrap();
        assert!(client.end_session("ghost").await.is_ok());
    }
}
