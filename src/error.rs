use std::collections::BTreeMap;
use std::fmt;
use log::{debug, error};

/// Response headers that may carry the backend correlation id,
/// checked in order
pub const REQUEST_ID_HEADERS: [&str; 3] =
  [ "x-amzn-requestid"
  , "x-request-id"
  , "x-amzn-request-id"
  ];

/// The remote endpoint rejected the call with a non-success status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError
{   pub message: String
  , pub status: u16
  , pub error_code: Option<String>
  , pub request_id: Option<String>
  , pub details: Option<serde_json::Value>
  , /// Header names are lowercase
    pub headers: BTreeMap<String, String>
}

impl HttpError
{   /// Build from an already-read failure response.
    ///
    /// `body` is parsed as JSON when possible; a body that is not JSON
    /// is treated as absent.
    pub fn from_parts(
      status: u16
    , status_text: Option<&str>
    , headers: BTreeMap<String, String>
    , body: &str
    ) -> Self
    {   let parsed: Option<serde_json::Value>
          = serde_json::from_str(body).ok();

        let field = |name: &str| -> Option<String>
        {   parsed.as_ref()
              .and_then(|v| v.get(name))
              .and_then(|v| v.as_str())
              .filter(|s| !s.is_empty())
              .map(str::to_string)
        };

        let message = field("message")
          .or_else(|| field("error"))
          .or_else(|| status_text
            .filter(|s| !s.is_empty())
            .map(str::to_string)
          )
          .unwrap_or_else(|| "Request failed".to_string());

        // Codes may be numeric, e.g. `{"code": 429}`
        let code_field = |name: &str| -> Option<String>
        {   let value = parsed.as_ref()?.get(name)?;
            match value
            {   serde_json::Value::Number(n) if is_truthy(value) => {
                  Some(n.to_string())
                }
              , _ => field(name)
            }
        };

        let error_code = code_field("errorCode")
          .or_else(|| code_field("code"));

        let details = match parsed
        {   Some(value) => match value.get("details")
            {   Some(d) if is_truthy(d) => Some(d.clone())
              , _ => Some(value)
            }
          , None => None
        };

        let request_id = request_id_from_headers(&headers);

        HttpError
        {   message
          , status
          , error_code
          , request_id
          , details
          , headers
        }
    }

    /// Consume a failed `reqwest` response and build the error from it
    pub async fn from_response(response: reqwest::Response) -> Self
    {   let status = response.status();
        let headers = header_map(response.headers());
        let body = response.text().await
          .unwrap_or_default();

        let err = HttpError::from_parts(
          status.as_u16()
        , status.canonical_reason()
        , headers
        , &body
        );
        error!(
          "Agent endpoint rejected request: {} {} (request id: {:?})"
        , err.status
        , err.message
        , err.request_id
        );
        err
    }
}

impl fmt::Display for HttpError
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   write!(f, "{} (status {})", self.message, self.status)?;
        if let Some(code) = &self.error_code
        {   write!(f, " [{}]", code)?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpError {}

// null, false, 0 and "" do not count as present
fn is_truthy(value: &serde_json::Value) -> bool
{   match value
    {   serde_json::Value::Null => false
      , serde_json::Value::Bool(b) => *b
      , serde_json::Value::String(s) => !s.is_empty()
      , serde_json::Value::Number(n) => n.as_f64() != Some(0.0)
      , _ => true
    }
}

/// Flatten a header map into lowercase name -> value pairs.
/// Repeated headers are joined with ", ".
pub fn header_map(
  headers: &reqwest::header::HeaderMap
) -> BTreeMap<String, String>
{   let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers.iter()
    {   let Ok(value) = value.to_str()
        else { continue };
        out.entry(name.as_str().to_ascii_lowercase())
          .and_modify(|existing| {
            existing.push_str(", ");
            existing.push_str(value);
          })
          .or_insert_with(|| value.to_string());
    }
    out
}

/// First non-empty correlation id among `REQUEST_ID_HEADERS`
pub fn request_id_from_headers(
  headers: &BTreeMap<String, String>
) -> Option<String>
{   for name in REQUEST_ID_HEADERS
    {   let found = headers.iter()
          .find(|(k, _)| k.eq_ignore_ascii_case(name))
          .map(|(_, v)| v)
          .filter(|v| !v.is_empty());
        if let Some(value) = found
        {   debug!("Correlation id from {}: {}", name, value);
            return Some(value.clone());
        }
    }
    None
}

/// Crate-wide error type.
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Remote endpoint rejected the call
    Http(HttpError)
  , /// Gateway mode without a bearer token
    NotAuthenticated
  , /// Required configuration value is missing
    MissingConfiguration(String)
  , /// Success status but the body had an unexpected shape
    MalformedResponse
    {   message: String
      , body: String
    }
  , /// Prompt was empty or whitespace
    EmptyPrompt
  , /// Invocation was cancelled by the caller
    Cancelled
  , /// Any other failure, message already prefixed
    Invocation(String)
}

impl Error
{   /// Wrap an unexpected failure, keeping its message
    pub fn invocation(cause: impl fmt::Display) -> Self
    {   Error::Invocation(
          format!("Failed to invoke agent: {}", cause)
        )
    }

    /// True when the remote endpoint itself rejected the call
    pub fn is_transport(&self) -> bool
    {   matches!(self, Error::Http(_))
    }

    pub fn status(&self) -> Option<u16>
    {   match self
        {   Error::Http(e) => Some(e.status)
          , _ => None
        }
    }

    pub fn request_id(&self) -> Option<&str>
    {   match self
        {   Error::Http(e) => e.request_id.as_deref()
          , _ => None
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::Http(e) => {
              write!(f, "{}", e)
            }
          , Error::NotAuthenticated => {
              write!(f,
                "Not authenticated - no access token available"
              )
            }
          , Error::MissingConfiguration(msg) => {
              write!(f, "{}", msg)
            }
          , Error::MalformedResponse { message, body } => {
              write!(f, "Malformed response: {} (body: {})",
                message,
                body
              )
            }
          , Error::EmptyPrompt => {
              write!(f, "Please enter a prompt")
            }
          , Error::Cancelled => {
              write!(f, "Invocation cancelled")
            }
          , Error::Invocation(msg) => {
              write!(f, "{}", msg)
            }
        }
    }
}

impl std::error::Error for Error
{   fn source(&self)
      -> Option<&(dyn std::error::Error + 'static)>
    {   match self
        {   Error::Http(e) => Some(e)
          , _ => None
        }
    }
}

impl From<HttpError> for Error
{   fn from(e: HttpError) -> Self
    {   Error::Http(e)
    }
}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Invocation(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Invocation(s.to_string())
    }
}
