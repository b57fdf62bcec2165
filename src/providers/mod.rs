//! Deployment modes for reaching the agent runtime

pub mod local;
pub mod gateway;

// Re-export for convenience
pub use local::LocalProvider;
pub use gateway::GatewayProvider;

/// Trim a trailing slash so paths can be appended with `format!`
pub(crate) fn join_url(base: &str, path: &str) -> String
{   format!("{}{}", base.trim_end_matches('/'), path)
}
