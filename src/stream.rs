//! Incremental decoding of streamed agent responses.
//!
//! A response body arrives as arbitrary byte chunks. Bytes are decoded to
//! text keeping multi-byte characters intact across reads, then a
//! [`ChunkFramer`] splits the text into chunks. Whatever the framer has not
//! recognised as complete stays buffered for the next read; an unterminated
//! fragment left when the body ends is dropped.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use log::{debug, error, trace};

use crate::config::Framing;

const DATA_PREFIX: &str = "data: ";

/// Per-chunk callback, invoked in arrival order
pub type ChunkCallback<'a> = &'a mut (dyn FnMut(&str) + Send);

/// UTF-8 decoder that holds back an incomplete trailing sequence
#[derive(Debug, Default)]
pub struct Utf8Decoder
{   pending: Vec<u8>
}

impl Utf8Decoder
{   pub fn new() -> Self
    {   Self::default()
    }

    /// Decode as much of `pending + bytes` as possible.
    /// Invalid sequences become U+FFFD.
    pub fn decode(&mut self, bytes: &[u8]) -> String
    {   self.pending.extend_from_slice(bytes);
        let mut out = String::with_capacity(self.pending.len());
        loop
        {   match std::str::from_utf8(&self.pending)
            {   Ok(text) => {
                  out.push_str(text);
                  self.pending.clear();
                  break;
                }
              , Err(e) => {
                  let valid = e.valid_up_to();
                  out.push_str(
                    std::str::from_utf8(&self.pending[..valid])
                      .unwrap_or_default()
                  );
                  match e.error_len()
                  {   None => {
                        self.pending.drain(..valid);
                        break;
                      }
                    , Some(len) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        self.pending.drain(..valid + len);
                      }
                  }
                }
            }
        }
        out
    }

    pub fn has_pending(&self) -> bool
    {   !self.pending.is_empty()
    }
}

/// Splits decoded text into chunks
pub trait ChunkFramer: Send
{   /// Append `text` and return the chunks it completed, in order
    fn push(&mut self, text: &str) -> Vec<String>;

    /// Text buffered but not yet framed
    fn pending(&self) -> &str;
}

/// Newline-terminated `data: ` lines, one chunk per line
#[derive(Debug, Default)]
pub struct LineFramer
{   buffer: String
}

impl ChunkFramer for LineFramer
{   fn push(&mut self, text: &str) -> Vec<String>
    {   self.buffer.push_str(text);
        let mut chunks = Vec::new();
        let mut start = 0usize;
        while let Some(rel) = self.buffer[start..].find('\n')
        {   let line = &self.buffer[start..start + rel];
            if let Some(chunk) = data_payload(line)
            {   chunks.push(chunk);
            }
            start += rel + 1;
        }
        self.buffer.drain(..start);
        chunks
    }

    fn pending(&self) -> &str
    {   &self.buffer
    }
}

/// Blank-line delimited events, one chunk per `data: ` line inside
#[derive(Debug, Default)]
pub struct EventFramer
{   buffer: String
}

impl ChunkFramer for EventFramer
{   fn push(&mut self, text: &str) -> Vec<String>
    {   self.buffer.push_str(text);
        let mut chunks = Vec::new();
        let mut start = 0usize;
        while let Some(rel) = self.buffer[start..].find("\n\n")
        {   let event = &self.buffer[start..start + rel];
            if !event.trim().is_empty()
            {   chunks.extend(event.split('\n').filter_map(data_payload));
            }
            start += rel + 2;
        }
        self.buffer.drain(..start);
        chunks
    }

    fn pending(&self) -> &str
    {   &self.buffer
    }
}

/// Payload of a `data: ` line. A JSON string literal is unquoted,
/// anything else is taken verbatim.
fn data_payload(line: &str) -> Option<String>
{   let data = line.strip_prefix(DATA_PREFIX)?;
    Some(
      serde_json::from_str::<String>(data)
        .unwrap_or_else(|_| data.to_string())
    )
}

/// Consumes a response body, reporting each chunk and
/// accumulating the full text
#[derive(Debug, Clone, Copy)]
pub struct StreamDecoder
{   framing: Framing
}

impl StreamDecoder
{   pub fn new(framing: Framing) -> Self
    {   StreamDecoder { framing }
    }

    pub fn framing(&self) -> Framing
    {   self.framing
    }

    pub fn framer(&self) -> Box<dyn ChunkFramer>
    {   match self.framing
        {   Framing::Lines => Box::new(LineFramer::default())
          , Framing::Events => Box::new(EventFramer::default())
        }
    }

    /// Read `stream` to the end. The returned response text is exactly
    /// the concatenation of every chunk passed to `on_chunk`.
    pub async fn decode<S, E>(
      &self
    , stream: S
    , request_id: Option<String>
    , on_chunk: ChunkCallback<'_>
    ) -> Result<crate::InvokeResponse, crate::error::Error>
    where
      S: Stream<Item = Result<Bytes, E>>
    , E: std::fmt::Display
    {   debug!("Decoding stream with {:?} framing", self.framing);
        let mut stream = std::pin::pin!(stream);
        let mut utf8 = Utf8Decoder::new();
        let mut framer = self.framer();
        let mut response = String::new();
        let mut count = 0usize;

        while let Some(item) = stream.next().await
        {   let bytes = item.map_err(|e| {
              error!("Response stream failed: {}", e);
              crate::error::Error::invocation(e)
            })?;
            trace!("Read {} bytes", bytes.len());

            let text = utf8.decode(&bytes);
            for chunk in framer.push(&text)
            {   on_chunk(&chunk);
                response.push_str(&chunk);
                count += 1;
            }
        }

        if !framer.pending().is_empty() || utf8.has_pending()
        {   debug!(
              "Dropping {} unterminated bytes at end of stream"
            , framer.pending().len()
            );
        }
        debug!("Stream finished after {} chunks", count);

        Ok(crate::InvokeResponse
        {   response
          , request_id
        })
    }
}
