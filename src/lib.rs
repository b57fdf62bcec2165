pub mod error;
pub mod config;
pub mod auth;
pub mod providers;
pub mod request;
pub mod stream;
pub mod parser;
pub mod suggestions;
pub mod session;
pub mod client;
use serde::{Deserialize, Serialize};

pub use client::{AgentBackend, AgentClient};
pub use config::{AgentConfig, Framing};
pub use error::{Error, HttpError};

/*

agentcore-chat is an async client for a conversational agent runtime
that answers over a streamed HTTP body. The same request can go to a
local runtime (no auth) or through an authenticated API gateway.

agentcore-chat/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports, shared types, backend channels
│   ├── error.rs        # Error enum and the HTTP transport error
│   ├── config.rs       # AgentConfig, env / JSON loading
│   ├── auth.rs         # Bearer token providers
│   ├── request.rs      # Wire bodies for both modes
│   ├── stream.rs       # Byte stream -> text chunks
│   ├── providers/      # Local and gateway deployment modes
│   ├── client.rs       # AgentClient and the AgentBackend task
│   ├── parser.rs       # Cleaning and JSON scraping of replies
│   ├── suggestions.rs  # Follow-up prompt suggestions
│   ├── session.rs      # Conversation state with rollback
│   └── bin/agent-chat.rs
└── tests/

*/

/// AGENT BACKEND INTERFACE:

// ===== SendPrompt =====

pub type SendPromptReply = Result<InvokeResponse, crate::error::Error>;
pub type SendPromptReplySender
  = tokio::sync::mpsc::UnboundedSender<SendPromptReply>;

pub struct SendPromptArgs
{   pub request: InvokeRequest
  , /// Receives each streamed chunk; `None` for a buffered call
    pub chunks: Option<tokio::sync::mpsc::UnboundedSender<String>>
  , pub reply: SendPromptReplySender
}

// ===== GenerateSuggestions =====

pub type GenerateSuggestionsReply = Vec<PromptSuggestion>;
pub type GenerateSuggestionsReplySender
  = tokio::sync::mpsc::UnboundedSender<GenerateSuggestionsReply>;

pub struct GenerateSuggestionsArgs
{   /// `None` asks for the greeting batch
    pub conversation: Option<Vec<ConversationMessage>>
  , pub reply: GenerateSuggestionsReplySender
}

// ===== KillProcess =====

pub type KillProcessReply = Result<(), crate::error::Error>;
pub type KillProcessReplySender
  = tokio::sync::mpsc::UnboundedSender<KillProcessReply>;

pub struct KillProcessArgs
{   pub reply: KillProcessReplySender
}

// ===== AgentHand (sender side) =====

pub struct AgentHand
{   pub send_prompt_tx
      : tokio::sync::mpsc::UnboundedSender<SendPromptArgs>
  , pub generate_suggestions_tx
      : tokio::sync::mpsc::UnboundedSender<GenerateSuggestionsArgs>
  , pub kill_process_tx
      : tokio::sync::mpsc::UnboundedSender<KillProcessArgs>
}

// ===== AgentFoot (receiver side) =====

pub struct AgentFoot
{   pub send_prompt_rx
      : tokio::sync::mpsc::UnboundedReceiver<SendPromptArgs>
  , pub generate_suggestions_rx
      : tokio::sync::mpsc::UnboundedReceiver<GenerateSuggestionsArgs>
  , pub kill_process_rx
      : tokio::sync::mpsc::UnboundedReceiver<KillProcessArgs>
}

/// AGENT STRUCTURES:

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role
{   User
  , Assistant
}

/// One prior turn sent along with a prompt
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConversationMessage
{   pub role: Role
  , pub content: String
}

impl ConversationMessage
{   pub fn user(content: impl Into<String>) -> Self
    {   ConversationMessage
        {   role: Role::User
          , content: content.into()
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self
    {   ConversationMessage
        {   role: Role::Assistant
          , content: content.into()
        }
    }
}

/// A single invocation of the agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeRequest
{   /// Must not be blank
    pub prompt: String
  , /// Oldest first
    pub conversation_history: Vec<ConversationMessage>
}

impl InvokeRequest
{   pub fn new(prompt: impl Into<String>) -> Self
    {   InvokeRequest
        {   prompt: prompt.into()
          , conversation_history: vec![]
        }
    }

    pub fn with_history(
      mut self
    , history: Vec<ConversationMessage>
    ) -> Self
    {   self.conversation_history = history;
        self
    }
}

/// Complete answer of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeResponse
{   /// Full answer text
    pub response: String
  , /// Backend correlation id, when the response carried one
    pub request_id: Option<String>
}

/// A follow-up prompt offered to the user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PromptSuggestion
{   /// Unique within its batch
    pub id: String
  , pub text: String
}
