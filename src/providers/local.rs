use log::{debug, error, trace};

use crate::error::{header_map, request_id_from_headers, Error, HttpError};
use crate::request::LocalInvokeBody;
use crate::stream::{ChunkCallback, StreamDecoder};

const INVOCATIONS_PATH: &str = "/invocations";

/// Direct calls to a locally running agent runtime, no auth
pub struct LocalProvider
{   http_client: reqwest::Client
  , base_url: String
  , decoder: StreamDecoder
}

impl LocalProvider
{   pub fn new(
      http_client: reqwest::Client
    , base_url: impl Into<String>
    , decoder: StreamDecoder
    ) -> Self
    {   LocalProvider
        {   http_client
          , base_url: base_url.into()
          , decoder
        }
    }

    pub fn endpoint(&self) -> String
    {   super::join_url(&self.base_url, INVOCATIONS_PATH)
    }

    /// POST the prompt to `/invocations`.
    ///
    /// With a chunk callback the body is decoded as a stream; without one
    /// the whole body is the answer text, no JSON envelope.
    pub async fn invoke(
      &self
    , request: &crate::InvokeRequest
    , on_chunk: Option<ChunkCallback<'_>>
    ) -> Result<crate::InvokeResponse, Error>
    {   let url = self.endpoint();
        debug!("Local dev mode - using local agent: {}", url);

        let body = LocalInvokeBody
        {   prompt: &request.prompt
          , conversation_history: &request.conversation_history
        };
        trace!("Local request: {:?}", body);

        let response = self.http_client
          .post(&url)
          .header("Content-Type", "application/json")
          .json(&body)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            Error::invocation(e)
          })?;

        let status = response.status();
        trace!("Local response status: {}", status);
        let request_id = request_id_from_headers(
          &header_map(response.headers())
        );

        if !status.is_success()
        {   return Err(HttpError::from_response(response).await.into());
        }

        match on_chunk
        {   Some(on_chunk) => {
              self.decoder
                .decode(response.bytes_stream(), request_id, on_chunk)
                .await
            }
          , None => {
              let text = response.text().await
                .map_err(|e| {
                  error!("Failed to read response body: {}", e);
                  Error::invocation(e)
                })?;
              Ok(crate::InvokeResponse
              {   response: text
                , request_id
              })
            }
        }
    }
}
