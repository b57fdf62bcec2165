//! Bearer token sources for gateway mode

use async_trait::async_trait;
use log::debug;

pub const ACCESS_TOKEN_ENV: &str = "AGENT_ACCESS_TOKEN";

/// Supplies the bearer token for gateway calls.
/// `None` means the user is not signed in.
#[async_trait]
pub trait TokenProvider: Send + Sync
{   async fn access_token(&self) -> Option<String>;
}

/// Fixed token, or none at all
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl StaticToken
{   pub fn new(token: impl Into<String>) -> Self
    {   StaticToken(Some(token.into()))
    }

    pub fn none() -> Self
    {   StaticToken(None)
    }
}

#[async_trait]
impl TokenProvider for StaticToken
{   async fn access_token(&self) -> Option<String>
    {   self.0.clone()
          .filter(|t| !t.is_empty())
    }
}

/// Reads `AGENT_ACCESS_TOKEN` on every call so a refreshed token
/// is picked up without rebuilding the client
#[derive(Debug, Clone, Default)]
pub struct EnvToken;

#[async_trait]
impl TokenProvider for EnvToken
{   async fn access_token(&self) -> Option<String>
    {   let token = std::env::var(ACCESS_TOKEN_ENV)
          .ok()
          .filter(|t| !t.trim().is_empty());
        if token.is_none()
        {   debug!("{} not set", ACCESS_TOKEN_ENV);
        }
        token
    }
}
