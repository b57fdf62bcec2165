//! Wire bodies for both deployment modes

use serde::{Deserialize, Serialize};

/// Body posted to a local runtime's `/invocations`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalInvokeBody<'a>
{   pub prompt: &'a str
  , pub conversation_history: &'a [crate::ConversationMessage]
}

/// Body posted to the gateway's `/invoke`
#[derive(Debug, Clone, Serialize)]
pub struct GatewayInvokeBody<'a>
{   pub input: LocalInvokeBody<'a>
}

/// Buffered gateway reply
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayReply
{   #[serde(default)]
    pub response: Option<serde_json::Value>
}

impl GatewayReply
{   /// The answer text; empty when the field is absent or null
    pub fn into_text(self) -> String
    {   match self.response
        {   None | Some(serde_json::Value::Null) => String::new()
          , Some(serde_json::Value::String(s)) => s
          , Some(other) => other.to_string()
        }
    }
}
