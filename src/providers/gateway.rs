use std::sync::Arc;
use log::{debug, error, trace};

use crate::auth::TokenProvider;
use crate::error::{header_map, request_id_from_headers, Error, HttpError};
use crate::request::{GatewayInvokeBody, GatewayReply, LocalInvokeBody};
use crate::stream::{ChunkCallback, StreamDecoder};

const INVOKE_PATH: &str = "/invoke";

/// Authenticated calls through the API gateway
pub struct GatewayProvider
{   http_client: reqwest::Client
  , gateway_url: Option<String>
  , tokens: Arc<dyn TokenProvider>
  , decoder: StreamDecoder
}

impl GatewayProvider
{   pub fn new(
      http_client: reqwest::Client
    , gateway_url: Option<String>
    , tokens: Arc<dyn TokenProvider>
    , decoder: StreamDecoder
    ) -> Self
    {   GatewayProvider
        {   http_client
          , gateway_url
          , tokens
          , decoder
        }
    }

    /// POST `{ input: { prompt, conversationHistory } }` to `/invoke`.
    ///
    /// Fails before any network I/O when the gateway URL or the bearer
    /// token is missing. A buffered reply is a JSON envelope whose
    /// `response` field holds the answer.
    pub async fn invoke(
      &self
    , request: &crate::InvokeRequest
    , on_chunk: Option<ChunkCallback<'_>>
    ) -> Result<crate::InvokeResponse, Error>
    {   let gateway_url = self.gateway_url.as_deref()
          .map(str::trim)
          .filter(|u| !u.is_empty())
          .ok_or_else(|| {
            error!("No API gateway URL configured");
            Error::MissingConfiguration(
              "API Gateway URL must be configured. Check deployment outputs."
                .to_string()
            )
          })?;

        let token = self.tokens.access_token().await
          .filter(|t| !t.is_empty())
          .ok_or_else(|| {
            error!("No access token available for gateway call");
            Error::NotAuthenticated
          })?;

        let url = super::join_url(gateway_url, INVOKE_PATH);
        debug!("Invoking agent via API gateway: {}", url);

        let body = GatewayInvokeBody
        {   input: LocalInvokeBody
            {   prompt: &request.prompt
              , conversation_history: &request.conversation_history
            }
        };
        trace!("Gateway request: {:?}", body);

        let response = self.http_client
          .post(&url)
          .header("Content-Type", "application/json")
          .header("Authorization", format!("Bearer {}", token))
          .json(&body)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            Error::invocation(e)
          })?;

        let status = response.status();
        trace!("Gateway response status: {}", status);
        let request_id = request_id_from_headers(
          &header_map(response.headers())
        );

        if !status.is_success()
        {   return Err(HttpError::from_response(response).await.into());
        }

        if let Some(on_chunk) = on_chunk
        {   return self.decoder
              .decode(response.bytes_stream(), request_id, on_chunk)
              .await;
        }

        let text = response.text().await
          .map_err(|e| {
            error!("Failed to read response body: {}", e);
            Error::invocation(e)
          })?;
        let reply: GatewayReply = serde_json::from_str(&text)
          .map_err(|e| {
            error!("Gateway reply is not JSON: {}", e);
            Error::MalformedResponse
            {   message: e.to_string()
              , body: text.clone()
            }
          })?;

        Ok(crate::InvokeResponse
        {   response: reply.into_text()
          , request_id
        })
    }
}
