//! Conversation state for a chat front end.
//!
//! A send optimistically appends the user turn and an empty assistant
//! placeholder that fills up as chunks stream in. If the invocation fails
//! the placeholder is rolled back and the error kept for display.

use std::fmt;
use chrono::{DateTime, Utc};
use log::{debug, error};

use crate::client::AgentClient;
use crate::error::Error;
use crate::parser::{clean_text, extract_next_steps};
use crate::stream::ChunkCallback;
use crate::{ConversationMessage, InvokeRequest, Role};

/// One displayed turn
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage
{   pub role: Role
  , pub content: String
  , pub timestamp: DateTime<Utc>
}

impl ChatMessage
{   pub fn new(role: Role, content: impl Into<String>) -> Self
    {   ChatMessage
        {   role
          , content: content.into()
          , timestamp: Utc::now()
        }
    }
}

impl From<&ChatMessage> for ConversationMessage
{   fn from(m: &ChatMessage) -> Self
    {   ConversationMessage
        {   role: m.role
          , content: m.content.clone()
        }
    }
}

/// Error details for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError
{   pub message: String
  , pub error_code: Option<String>
  , pub request_id: Option<String>
  , pub details: Option<serde_json::Value>
}

impl UiError
{   /// Details pretty-printed as JSON
    pub fn details_pretty(&self) -> Option<String>
    {   let details = self.details.as_ref()?;
        Some(
          serde_json::to_string_pretty(details)
            .unwrap_or_else(|_| details.to_string())
        )
    }
}

impl From<&Error> for UiError
{   fn from(e: &Error) -> Self
    {   match e
        {   Error::Http(http) => UiError
            {   message: http.message.clone()
              , error_code: http.error_code.clone()
              , request_id: http.request_id.clone()
              , details: http.details.clone()
            }
          , other => UiError
            {   message: other.to_string()
              , error_code: None
              , request_id: None
              , details: None
            }
        }
    }
}

impl fmt::Display for UiError
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   write!(f, "{}", self.message)?;
        if let Some(code) = &self.error_code
        {   write!(f, " (code: {})", code)?;
        }
        if let Some(id) = &self.request_id
        {   write!(f, " (request id: {})", id)?;
        }
        Ok(())
    }
}

/// Messages of one conversation plus the last error
#[derive(Debug, Clone, Default)]
pub struct ChatSession
{   messages: Vec<ChatMessage>
  , last_error: Option<UiError>
}

impl ChatSession
{   pub fn new() -> Self
    {   Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage]
    {   &self.messages
    }

    pub fn last_error(&self) -> Option<&UiError>
    {   self.last_error.as_ref()
    }

    pub fn clear_error(&mut self)
    {   self.last_error = None;
    }

    pub fn reset(&mut self)
    {   debug!("Resetting chat session");
        self.messages.clear();
        self.last_error = None;
    }

    /// The last `turns` messages as conversation history, oldest first
    pub fn history_window(&self, turns: usize) -> Vec<ConversationMessage>
    {   let skip = self.messages.len().saturating_sub(turns);
        self.messages[skip..]
          .iter()
          .map(ConversationMessage::from)
          .collect()
    }

    /// Next steps listed in the latest assistant reply
    pub fn next_steps(&self) -> Option<Vec<String>>
    {   self.messages.iter()
          .rev()
          .find(|m| m.role == Role::Assistant)
          .and_then(|m| extract_next_steps(&m.content))
    }

    /// Send `prompt` with all earlier turns as history.
    ///
    /// Returns the cleaned final answer. On failure the assistant
    /// placeholder is removed and `last_error` is set.
    pub async fn send(
      &mut self
    , client: &AgentClient
    , prompt: &str
    , on_chunk: ChunkCallback<'_>
    ) -> Result<String, Error>
    {   if prompt.trim().is_empty()
        {   let err = Error::EmptyPrompt;
            self.last_error = Some(UiError::from(&err));
            return Err(err);
        }

        let history = self.history_window(self.messages.len());
        let request = InvokeRequest::new(prompt).with_history(history);

        self.messages.push(ChatMessage::new(Role::User, prompt));
        self.messages.push(ChatMessage::new(Role::Assistant, ""));
        self.last_error = None;
        let slot = self.messages.len() - 1;

        let mut streamed = String::new();
        let result =
        {   let placeholder = &mut self.messages[slot];
            let mut forward = |chunk: &str| {
              streamed.push_str(chunk);
              placeholder.content.push_str(chunk);
              placeholder.timestamp = Utc::now();
              on_chunk(chunk);
            };
            client.invoke_streaming(&request, &mut forward).await
        };

        match result
        {   Ok(reply) => {
              let source = if reply.response.is_empty()
              {   &streamed
              } else
              {   &reply.response
              };
              let answer = clean_text(source);
              self.messages[slot] =
                ChatMessage::new(Role::Assistant, answer.clone());
              debug!("Assistant reply complete ({} chars)", answer.len());
              Ok(answer)
            }
          , Err(e) => {
              error!("Send failed, rolling back placeholder: {}", e);
              self.messages.truncate(slot);
              self.last_error = Some(UiError::from(&e));
              Err(e)
            }
        }
    }
}
