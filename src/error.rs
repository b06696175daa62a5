//! Error types for the client.
//!
//! Everything the backend returns is wrapped in the `{data, statusCode, message}`
//! envelope; an envelope status outside 200/201 becomes [`Error::Api`]. Transport
//! and decode failures keep their sources so callers can inspect them.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
  /// Transport-level failure (connection, TLS, timeout).
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  /// The backend envelope carried a non-success status code.
  #[error("api error {status}: {message}")]
  Api { status: u16, message: String },

  /// A 401 was intercepted. `redirected` is true when the session was
  /// cleared and the client was routed to the login page (i.e. the path
  /// was not a login/otp endpoint).
  #[error("unauthorized")]
  Unauthorized { redirected: bool },

  /// Response body did not match the expected shape.
  #[error("failed to decode response: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("configuration error: {0}")]
  Config(String),

  /// Cache storage failure (serialization of a cached entity).
  #[error("cache error: {0}")]
  Cache(String),

  /// Firestore document read or decode failure.
  #[error("firestore error: {0}")]
  Firestore(String),
}

impl Error {
  /// Envelope status in the 4xx bucket.
  pub fn is_client_error(&self) -> bool {
    matches!(self, Error::Api { status, .. } if (400..500).contains(status))
  }

  /// Envelope status in the 5xx bucket.
  pub fn is_server_error(&self) -> bool {
    matches!(self, Error::Api { status, .. } if *status >= 500)
  }

  /// Human-readable message for the notification banner.
  ///
  /// Buckets follow the HTTP status classes: client errors surface the
  /// backend message, everything else collapses to a generic string.
  pub fn user_message(&self) -> String {
    match self {
      Error::Api { message, .. } if self.is_client_error() && !message.is_empty() => {
        message.clone()
      }
      Error::Api { .. } => "Something went wrong on our side. Please try again later.".to_string(),
      Error::Unauthorized { .. } => "Your session has expired. Please sign in again.".to_string(),
      Error::Http(_) => "Could not reach the server. Check your connection.".to_string(),
      Error::Decode(_) => "The server returned an unexpected response.".to_string(),
      Error::Config(msg) | Error::Cache(msg) | Error::Firestore(msg) => msg.clone(),
    }
  }
}
