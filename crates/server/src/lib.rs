//! Siara voice bridge server
//!
//! Thin HTTP relay in front of the Bhashini speech pipeline and the
//! Agentforce session gateway. All upstream failures arrive here
//! already classified; this crate only maps them onto status codes
//! and the `{success: false, error, ...}` response shape the browser
//! client expects.

pub mod http;
pub mod state;

pub use http::create_router;
pub use state::AppState;

use axum::http::StatusCode;
use thiserror::Error;

use siara_agentforce::AgentforceError;
use siara_bhashini::BhashiniError;

/// Request-level errors surfaced to the browser client
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Bhashini(#[from] BhashiniError),

    #[error(transparent)]
    Agentforce(#[from] AgentforceError),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Bhashini(e) => match e {
                BhashiniError::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
                BhashiniError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                BhashiniError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
                BhashiniError::Upstream { status, .. } => forwarded_status(*status),
                BhashiniError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            },
            ServerError::Agentforce(e) => match e {
                AgentforceError::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
                AgentforceError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                AgentforceError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
                AgentforceError::Upstream { status, .. } => forwarded_status(*status),
                AgentforceError::SessionNotFound(_) => StatusCode::NOT_FOUND,
                AgentforceError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }

    /// Upstream error body, forwarded for diagnosis
    pub fn details(&self) -> Option<&str> {
        match self {
            ServerError::Bhashini(BhashiniError::Upstream { body, .. })
            | ServerError::Agentforce(AgentforceError::Upstream { body, .. }) => Some(body),
            _ => None,
        }
    }
}

fn forwarded_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServerError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::from(BhashiniError::Timeout).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ServerError::from(BhashiniError::Transport("refused".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ServerError::from(BhashiniError::Configuration).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServerError::from(AgentforceError::SessionNotFound("s".into())).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_upstream_status_forwarded() {
        let err = ServerError::from(BhashiniError::Upstream {
            status: 429,
            body: "rate limited".into(),
        });
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.details(), Some("rate limited"));
    }

    #[test]
    fn test_invalid_upstream_status_maps_to_bad_gateway() {
        let err = ServerError::from(BhashiniError::Upstream {
            status: 99,
            body: String::new(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
