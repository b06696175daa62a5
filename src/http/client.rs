//! The request wrapper around `reqwest`.
//!
//! Builds requests against the configured base URL, attaches the bearer
//! token when a session holds one, intercepts 401s, and unwraps the
//! response envelope.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::auth::AuthSession;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::Stores;

use super::envelope::ApiEnvelope;

#[derive(Clone)]
pub struct HttpClient {
  http: reqwest::Client,
  base_url: Url,
  session: AuthSession,
  stores: Arc<Stores>,
}

impl HttpClient {
  pub fn new(config: &Config, session: AuthSession, stores: Arc<Stores>) -> Result<Self> {
    let base_url = normalize_base_url(&config.api_base_url)?;

    let http = reqwest::Client::builder()
      .user_agent(concat!("agora-client/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      http,
      base_url,
      session,
      stores,
    })
  }

  /// The session this client attaches tokens from.
  pub fn session(&self) -> &AuthSession {
    &self.session
  }

  pub fn stores(&self) -> &Arc<Stores> {
    &self.stores
  }

  pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    self.request(Method::GET, path, None).await
  }

  pub async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
    self.request(Method::POST, path, Some(body)).await
  }

  pub async fn put<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
    self.request(Method::PUT, path, Some(body)).await
  }

  /// POST an operation whose envelope payload is irrelevant.
  pub async fn post_empty(&self, path: &str, body: Option<&Value>) -> Result<()> {
    let envelope: ApiEnvelope<Value> = self.execute(Method::POST, path, body).await?;
    envelope.into_empty()
  }

  /// Perform a request and unwrap the envelope payload.
  pub async fn request<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    body: Option<&Value>,
  ) -> Result<T> {
    let envelope: ApiEnvelope<T> = self.execute(method, path, body).await?;
    envelope.into_result()
  }

  async fn execute<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    body: Option<&Value>,
  ) -> Result<ApiEnvelope<T>> {
    let url = self.join(path)?;
    debug!(%method, path, "sending request");

    let mut request = self.http.request(method, url);
    if let Some(token) = self.session.token() {
      request = request.bearer_auth(token);
    }
    if let Some(body) = body {
      request = request.json(body);
    }

    let response = request.send().await?;
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
      let redirected = self.session.handle_unauthorized(path);
      if redirected {
        self.stores.redirect_to_login();
      }
      return Err(Error::Unauthorized { redirected });
    }

    // The backend wraps errors in the same envelope, so decode the body
    // even on transport-level error statuses.
    let bytes = response.bytes().await?;
    match serde_json::from_slice(&bytes) {
      Ok(envelope) => Ok(envelope),
      Err(e) if status.is_success() => Err(Error::Decode(e)),
      Err(_) => {
        warn!(path, %status, "non-envelope error response");
        Err(Error::Api {
          status: status.as_u16(),
          message: status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        })
      }
    }
  }

  fn join(&self, path: &str) -> Result<Url> {
    self
      .base_url
      .join(path.trim_start_matches('/'))
      .map_err(|e| Error::Config(format!("invalid request path {path}: {e}")))
  }
}

/// Parse the configured base URL, ensuring a trailing slash so that
/// joining request paths keeps the full base path.
fn normalize_base_url(raw: &str) -> Result<Url> {
  let with_slash = if raw.ends_with('/') {
    raw.to_string()
  } else {
    format!("{raw}/")
  };
  Url::parse(&with_slash).map_err(|e| Error::Config(format!("invalid api_base_url {raw}: {e}")))
}
