//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Bhashini upstream configuration
    #[serde(default)]
    pub bhashini: BhashiniConfig,

    /// Salesforce Agentforce upstream configuration
    #[serde(default)]
    pub agentforce: AgentforceConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Validate settings
    ///
    /// Only structural problems are errors. Absent secrets are
    /// reported as warnings here and as per-request configuration
    /// errors at the gateway boundary.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.bhashini.api_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "bhashini.api_url".to_string(),
                message: "Inference endpoint URL cannot be empty".to_string(),
            });
        }

        if self.bhashini.api_key.is_empty() {
            tracing::warn!("bhashini.api_key not configured, speech endpoints will fail");
        }
        if !self.agentforce.is_configured() {
            tracing::warn!("agentforce credentials not configured, agent endpoints will fail");
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen host
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins (empty = localhost dev defaults)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
        }
    }
}

/// Bhashini inference upstream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BhashiniConfig {
    /// Inference pipeline endpoint
    #[serde(default = "default_bhashini_url")]
    pub api_url: String,

    /// Static API key, sent raw in the Authorization header
    /// (upstream convention, not Bearer-prefixed)
    #[serde(default)]
    pub api_key: String,
}

fn default_bhashini_url() -> String {
    "https://dhruva-api.bhashini.gov.in/services/inference/pipeline".to_string()
}

impl Default for BhashiniConfig {
    fn default() -> Self {
        Self {
            api_url: default_bhashini_url(),
            api_key: String::new(),
        }
    }
}

/// Salesforce Agentforce upstream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentforceConfig {
    /// My Domain URL, e.g. "https://acme.my.salesforce.com"
    #[serde(default)]
    pub org_domain: String,

    /// Connected app client id
    #[serde(default)]
    pub client_id: String,

    /// Connected app client secret
    #[serde(default)]
    pub client_secret: String,

    /// Agent id the sessions are created against
    #[serde(default)]
    pub agent_id: String,

    /// Agent API base URL
    #[serde(default = "default_agent_api_base")]
    pub api_base: String,

    /// Timezone passed on session creation
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_agent_api_base() -> String {
    "https://api.salesforce.com/einstein/ai-agent/v1".to_string()
}
fn default_timezone() -> String {
    "Asia/Kolkata".to_string()
}

impl Default for AgentforceConfig {
    fn default() -> Self {
        Self {
            org_domain: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            agent_id: String::new(),
            api_base: default_agent_api_base(),
            timezone: default_timezone(),
        }
    }
}

impl AgentforceConfig {
    /// All credentials present
    pub fn is_configured(&self) -> bool {
        !self.org_domain.is_empty()
            && !self.client_id.is_empty()
            && !self.client_secret.is_empty()
            && !self.agent_id.is_empty()
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level filter (tracing EnvFilter syntax)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (SIARA__ prefix)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("SIARA")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
