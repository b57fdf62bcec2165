use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use log::{debug, trace, error, info};

use crate::auth::TokenProvider;
use crate::config::AgentConfig;
use crate::error::Error;
use crate::providers::{GatewayProvider, LocalProvider};
use crate::stream::{ChunkCallback, StreamDecoder};
use crate::suggestions::SuggestionGenerator;
use crate::AgentFoot;

/// Deployment mode chosen from the config at construction
enum Mode
{   Local(LocalProvider)
  , Gateway(GatewayProvider)
}

/// Client for one agent runtime, in local or gateway mode
pub struct AgentClient
{   config: AgentConfig
  , mode: Mode
}

impl AgentClient
{   /// Build a client; `tokens` is only consulted in gateway mode
    pub fn new(
      config: AgentConfig
    , tokens: Arc<dyn TokenProvider>
    ) -> Result<Self, Error>
    {   debug!(
          "Creating AgentClient (local_dev={}, region={})"
        , config.local_dev
        , config.region
        );
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs
        {   builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let http_client = builder.build()
          .map_err(|e| {
            error!("Failed to build HTTP client: {}", e);
            Error::invocation(e)
          })?;

        let decoder = StreamDecoder::new(config.framing());
        let mode = if config.local_dev
        {   Mode::Local(LocalProvider::new(
              http_client
            , config.local_base_url.clone()
            , decoder
            ))
        } else
        {   Mode::Gateway(GatewayProvider::new(
              http_client
            , config.gateway_url.clone()
            , tokens
            , decoder
            ))
        };

        Ok(AgentClient
        {   config
          , mode
        })
    }

    pub fn config(&self) -> &AgentConfig
    {   &self.config
    }

    /// Buffered invocation
    pub async fn invoke(
      &self
    , request: &crate::InvokeRequest
    ) -> Result<crate::InvokeResponse, Error>
    {   self.dispatch(request, None).await
    }

    /// Streamed invocation; `on_chunk` sees every chunk in order
    pub async fn invoke_streaming(
      &self
    , request: &crate::InvokeRequest
    , on_chunk: ChunkCallback<'_>
    ) -> Result<crate::InvokeResponse, Error>
    {   self.dispatch(request, Some(on_chunk)).await
    }

    /// Invocation that gives up with `Error::Cancelled` as soon as
    /// `cancel` fires. The request and its body stream are dropped.
    pub async fn invoke_with_cancel(
      &self
    , request: &crate::InvokeRequest
    , on_chunk: Option<ChunkCallback<'_>>
    , cancel: &CancellationToken
    ) -> Result<crate::InvokeResponse, Error>
    {   tokio::select!
        {   biased;
            _ = cancel.cancelled() => {
              info!("Agent invocation cancelled");
              Err(Error::Cancelled)
            }
          , result = self.dispatch(request, on_chunk) => result
        }
    }

    async fn dispatch(
      &self
    , request: &crate::InvokeRequest
    , on_chunk: Option<ChunkCallback<'_>>
    ) -> Result<crate::InvokeResponse, Error>
    {   if request.prompt.trim().is_empty()
        {   error!("Refusing to invoke agent with an empty prompt");
            return Err(Error::EmptyPrompt);
        }
        trace!(
          "Invoking agent with {} history messages (streaming={})"
        , request.conversation_history.len()
        , on_chunk.is_some()
        );

        let result = match &self.mode
        {   Mode::Local(provider) => {
              provider.invoke(request, on_chunk).await
            }
          , Mode::Gateway(provider) => {
              provider.invoke(request, on_chunk).await
            }
        };

        if let Err(e) = &result
        {   error!("Agent invocation error: {}", e);
        }
        result
    }
}

/// Public API for the agent backend - owns the task
pub struct AgentBackend
{   hand: crate::AgentHand
  , _task_handle: tokio::task::JoinHandle<()>
}

impl AgentBackend
{   /// Spawn a backend task that owns `client`.
    /// Returns immediately.
    ///
    /// Commands run one at a time in arrival order, so invocations
    /// never overlap.
    pub fn new(client: AgentClient) -> Self
    {   debug!("Creating AgentBackend with task ownership");

        let (send_prompt_tx, send_prompt_rx)
          = mpsc::unbounded_channel();
        let (generate_suggestions_tx, generate_suggestions_rx)
          = mpsc::unbounded_channel();
        let (kill_process_tx, kill_process_rx)
          = mpsc::unbounded_channel();

        let hand = crate::AgentHand
        {   send_prompt_tx
          , generate_suggestions_tx
          , kill_process_tx
        };

        let foot = crate::AgentFoot
        {   send_prompt_rx
          , generate_suggestions_rx
          , kill_process_rx
        };

        let _task_handle = tokio::spawn(async move {
          run_backend_loop(foot, client).await
        });

        AgentBackend
        {   hand
          , _task_handle
        }
    }

    /// Queue a prompt - returns almost immediately.
    /// Streamed chunks go to `chunks` when given.
    pub async fn send_prompt(
      &self
    , request: crate::InvokeRequest
    , chunks: Option<mpsc::UnboundedSender<String>>
    ) -> Result<
        mpsc::UnboundedReceiver<crate::SendPromptReply>,
        Error
      >
    {   debug!("send_prompt queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::SendPromptArgs
        {   request
          , chunks
          , reply: reply_tx
        };

        self.hand.send_prompt_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            Error::from("Backend disconnected")
          })?;

        Ok(reply_rx)
    }

    /// Queue a suggestion batch - returns almost immediately.
    /// `None` requests the greeting batch.
    pub async fn generate_suggestions(
      &self
    , conversation: Option<Vec<crate::ConversationMessage>>
    ) -> Result<
        mpsc::UnboundedReceiver<crate::GenerateSuggestionsReply>,
        Error
      >
    {   debug!("generate_suggestions queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::GenerateSuggestionsArgs
        {   conversation
          , reply: reply_tx
        };

        self.hand.generate_suggestions_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            Error::from("Backend disconnected")
          })?;

        Ok(reply_rx)
    }

    /// Gracefully shutdown the backend
    pub async fn shutdown(self)
      -> Result<(), Error>
    {   debug!("Shutting down AgentBackend");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::KillProcessArgs
        {   reply: reply_tx
        };

        self.hand.kill_process_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel already closed");
            Error::from("Backend already shutdown")
          })?;

        match reply_rx.recv().await
        {   Some(result) => {
              debug!("Backend shutdown confirmed");
              result
            }
          , None => {
              error!("Backend exited without confirming shutdown");
              Err(Error::from("Backend already shutdown"))
            }
        }
    }
}

/// Main backend event loop
async fn run_backend_loop(
  foot: crate::AgentFoot
, client: AgentClient
)
{   debug!("Starting AgentBackend event loop");
    let AgentFoot
    {   mut send_prompt_rx
      , mut generate_suggestions_rx
      , mut kill_process_rx
    } = foot;

    loop
    { tokio::select!
      { Some(cmd) = send_prompt_rx.recv() => {
          debug!("Received SendPrompt");
          let result = match cmd.chunks
          {   Some(chunks) => {
                let mut forward = |chunk: &str| {
                  let _ = chunks.send(chunk.to_string());
                };
                client.invoke_streaming(&cmd.request, &mut forward).await
              }
            , None => client.invoke(&cmd.request).await
          };
          let _ = cmd.reply.send(result);
        }
      , Some(cmd) = generate_suggestions_rx.recv() => {
          debug!("Received GenerateSuggestions");
          let generator = SuggestionGenerator::new(&client);
          let batch = match cmd.conversation
          {   Some(conversation) => generator.follow_ups(&conversation).await
            , None => generator.initial().await
          };
          let _ = cmd.reply.send(batch);
        }
      , Some(cmd) = kill_process_rx.recv() => {
          debug!("Received KillProcess");
          let _ = cmd.reply.send(Ok(()));
          info!("AgentBackend shutting down");
          break;
        }
      , else => {
          debug!("All command channels closed");
          break;
        }
      }
    }
}
