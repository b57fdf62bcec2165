//! Configuration for the agent client and its deployment modes

use serde::{Deserialize, Serialize};
use log::{debug, error};

pub const DEFAULT_LOCAL_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_REGION: &str = "us-east-1";

/// How a streamed response body is split into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framing
{   /// One `data: ` line per chunk, newline terminated
    Lines
  , /// Blank-line delimited events holding `data: ` lines
    Events
}

/// Agent client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig
{   /// Talk to a local agent runtime directly, without auth
    pub local_dev: bool
  , /// Base URL of the local agent runtime
    pub local_base_url: String
  , /// Base URL of the authenticated API gateway
    pub gateway_url: Option<String>
  , /// Deployment region, informational only
    pub region: String
  , /// Request timeout in seconds
    pub timeout_secs: Option<u64>
  , /// Overrides the framing implied by the deployment mode
    pub stream_framing: Option<Framing>
}

impl Default for AgentConfig
{   fn default() -> Self
    {   AgentConfig
        {   local_dev: false
          , local_base_url: DEFAULT_LOCAL_BASE_URL.to_string()
          , gateway_url: None
          , region: DEFAULT_REGION.to_string()
          , timeout_secs: None
          , stream_framing: None
        }
    }
}

impl AgentConfig
{   /// Config for a local runtime at `base_url`
    pub fn local(base_url: impl Into<String>) -> Self
    {   AgentConfig
        {   local_dev: true
          , local_base_url: base_url.into()
          , ..AgentConfig::default()
        }
    }

    /// Config for the authenticated gateway at `gateway_url`
    pub fn gateway(gateway_url: impl Into<String>) -> Self
    {   AgentConfig
        {   local_dev: false
          , gateway_url: Some(gateway_url.into())
          , ..AgentConfig::default()
        }
    }

    /// Read configuration from `AGENT_*` environment variables,
    /// falling back to defaults for anything unset
    pub fn from_env() -> Self
    {   let mut config = AgentConfig::default();
        let var = |name: &str| std::env::var(name)
          .ok()
          .filter(|v| !v.trim().is_empty());

        if let Some(flag) = var("AGENT_LOCAL_DEV")
        {   config.local_dev = flag.trim() == "true";
        }
        if let Some(url) = var("AGENT_RUNTIME_URL")
        {   config.local_base_url = url;
        }
        config.gateway_url = var("AGENT_API_GATEWAY_URL");
        if let Some(region) = var("AGENT_REGION")
        {   config.region = region;
        }
        config.timeout_secs = var("AGENT_TIMEOUT_SECS")
          .and_then(|s| s.trim().parse().ok());

        debug!(
          "Loaded config from env: local_dev={} region={}"
        , config.local_dev
        , config.region
        );
        config
    }

    /// Read configuration from a JSON file
    pub fn from_json_file(
      path: impl AsRef<std::path::Path>
    ) -> Result<Self, crate::error::Error>
    {   let path = path.as_ref();
        debug!("Loading config from {}", path.display());
        let raw = std::fs::read_to_string(path)
          .map_err(|e| {
            error!("Failed to read {}: {}", path.display(), e);
            crate::error::Error::MissingConfiguration(
              format!("Cannot read {}: {}", path.display(), e)
            )
          })?;
        serde_json::from_str(&raw)
          .map_err(|e| {
            error!("Invalid config {}: {}", path.display(), e);
            crate::error::Error::MissingConfiguration(
              format!("Invalid config {}: {}", path.display(), e)
            )
          })
    }

    /// Framing used for streamed bodies in the configured mode
    pub fn framing(&self) -> Framing
    {   match self.stream_framing
        {   Some(framing) => framing
          , None if self.local_dev => Framing::Lines
          , None => Framing::Events
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn framing_follows_deployment_mode()
    {   assert_eq!(AgentConfig::local("http://x").framing(), Framing::Lines);
        assert_eq!(AgentConfig::gateway("http://y").framing(), Framing::Events);

        let mut config = AgentConfig::local("http://x");
        config.stream_framing = Some(Framing::Events);
        assert_eq!(config.framing(), Framing::Events);
    }

    #[test]
    fn json_file_fills_missing_fields_with_defaults()
    {   let path = std::env::temp_dir()
          .join(format!("agentcore-chat-config-{}.json", std::process::id()));
        std::fs::write(
          &path,
          r#"{"gateway_url": "https://gw.example.com/prod", "stream_framing": "lines"}"#
        ).unwrap();

        let config = AgentConfig::from_json_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert!(!config.local_dev);
        assert_eq!(config.gateway_url.as_deref(), Some("https://gw.example.com/prod"));
        assert_eq!(config.region, DEFAULT_REGION);
        assert_eq!(config.framing(), Framing::Lines);
    }

    #[test]
    fn unreadable_config_is_reported()
    {   let err = AgentConfig::from_json_file("/nonexistent/agent.json")
          .unwrap_err();
        assert!(matches!(err, crate::error::Error::MissingConfiguration(_)));
    }
}
