//! Typed API client with TTL caching for the Agora community platform.
//!
//! The crate is the data layer of the platform's front end: a request
//! wrapper over the REST backend, an auth-token interceptor, a
//! session-scoped TTL cache with explicit request de-duplication, and
//! observable stores for cross-component state.
//!
//! ```ignore
//! let config = Config::load(None)?;
//! let client = AgoraClient::new(config)?;
//!
//! client.api().verify_otp("user@example.dev", "123456").await?;
//! let events = client.api().list_meetups().await?;
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod firebase;
pub mod http;
pub mod query;
pub mod store;

use std::sync::Arc;

pub use api::{CachedPlatformClient, PlatformClient, ResourceKey};
pub use auth::{AuthSession, AuthState};
pub use config::Config;
pub use error::{Error, Result};
pub use firebase::FirestoreClient;
pub use query::{Query, QueryState};
pub use store::{Atom, ErrorNotice, Stores};

/// Top-level client: wires the session, stores, HTTP layer, cached API
/// client and (when configured) the Firestore reader together.
pub struct AgoraClient {
  api: CachedPlatformClient,
  firestore: Option<FirestoreClient>,
  session: AuthSession,
  stores: Arc<Stores>,
}

impl AgoraClient {
  pub fn new(config: Config) -> Result<Self> {
    let session = AuthSession::new();
    let stores = Arc::new(Stores::new());

    let http = http::HttpClient::new(&config, session.clone(), Arc::clone(&stores))?;
    let api = CachedPlatformClient::new(PlatformClient::new(http), Arc::clone(&stores));

    // Firestore is optional: only wired when a project is configured
    let firestore = match config.firebase.project_id {
      Some(_) => Some(FirestoreClient::new(&config)?),
      None => None,
    };

    Ok(Self {
      api,
      firestore,
      session,
      stores,
    })
  }

  /// The cached REST client.
  pub fn api(&self) -> &CachedPlatformClient {
    &self.api
  }

  /// The Firestore reader, if a firebase project is configured.
  pub fn firestore(&self) -> Option<&FirestoreClient> {
    self.firestore.as_ref()
  }

  pub fn session(&self) -> &AuthSession {
    &self.session
  }

  pub fn stores(&self) -> &Arc<Stores> {
    &self.stores
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn test_config() -> Config {
    Config {
      api_base_url: "http://localhost:8080".to_string(),
      google_client_id: None,
      firebase: Default::default(),
      environment: Default::default(),
    }
  }

  #[test]
  fn test_client_assembles_without_firebase() {
    let client = AgoraClient::new(test_config()).unwrap();
    assert!(client.firestore().is_none());
    assert_eq!(client.session().state(), AuthState::Unauthenticated);
  }

  #[test]
  fn test_client_assembles_with_firebase() {
    let mut config = test_config();
    config.firebase.project_id = Some("agora-test".to_string());
    let client = AgoraClient::new(config).unwrap();
    assert!(client.firestore().is_some());
  }
}
