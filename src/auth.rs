//! Session and token handling.
//!
//! The session is a two-state machine: `Authenticated` once a bearer token
//! has been stored after login, `Unauthenticated` otherwise. Any 401 on a
//! non-exempt path clears the token and flips the state; login and otp
//! endpoints are exempt because a 401 there means bad credentials, not an
//! expired session.

use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
  Authenticated,
  Unauthenticated,
}

/// Paths on which a 401 must NOT tear down the session.
pub fn is_auth_exempt(path: &str) -> bool {
  path.starts_with("/auth/google") || path.starts_with("/auth/otp")
}

/// Shared session handle. Cheap to clone; all clones observe the same
/// token and state.
#[derive(Debug, Clone)]
pub struct AuthSession {
  token: Arc<Mutex<Option<String>>>,
  state_tx: Arc<watch::Sender<AuthState>>,
}

impl AuthSession {
  pub fn new() -> Self {
    let (tx, _rx) = watch::channel(AuthState::Unauthenticated);
    Self {
      token: Arc::new(Mutex::new(None)),
      state_tx: Arc::new(tx),
    }
  }

  /// Store the bearer token acquired at login.
  pub fn set_token(&self, token: impl Into<String>) {
    let mut guard = self.token.lock().unwrap_or_else(|e| e.into_inner());
    *guard = Some(token.into());
    drop(guard);
    self.state_tx.send_replace(AuthState::Authenticated);
    info!("session authenticated");
  }

  /// Current bearer token, if any.
  pub fn token(&self) -> Option<String> {
    self.token.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }

  pub fn state(&self) -> AuthState {
    *self.state_tx.borrow()
  }

  /// Observe session state transitions.
  pub fn subscribe(&self) -> watch::Receiver<AuthState> {
    self.state_tx.subscribe()
  }

  /// Explicit logout: clear the token and transition to unauthenticated.
  pub fn clear(&self) {
    let mut guard = self.token.lock().unwrap_or_else(|e| e.into_inner());
    *guard = None;
    drop(guard);
    self.state_tx.send_replace(AuthState::Unauthenticated);
  }

  /// Handle a 401 response for `path`.
  ///
  /// Returns true when the session was torn down (the caller must then
  /// route to the login page). Login/otp paths are left untouched.
  pub fn handle_unauthorized(&self, path: &str) -> bool {
    if is_auth_exempt(path) {
      return false;
    }
    info!(path, "401 received, clearing session");
    self.clear();
    true
  }
}

impl Default for AuthSession {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_starts_unauthenticated() {
    let session = AuthSession::new();
    assert_eq!(session.state(), AuthState::Unauthenticated);
    assert!(session.token().is_none());
  }

  #[test]
  fn test_login_stores_token() {
    let session = AuthSession::new();
    session.set_token("bearer-abc");
    assert_eq!(session.state(), AuthState::Authenticated);
    assert_eq!(session.token().as_deref(), Some("bearer-abc"));
  }

  #[test]
  fn test_unauthorized_clears_session() {
    let session = AuthSession::new();
    session.set_token("bearer-abc");

    assert!(session.handle_unauthorized("/users/me"));
    assert_eq!(session.state(), AuthState::Unauthenticated);
    assert!(session.token().is_none());
  }

  #[test]
  fn test_login_and_otp_paths_are_exempt() {
    let session = AuthSession::new();
    session.set_token("bearer-abc");

    assert!(!session.handle_unauthorized("/auth/google/callback"));
    assert!(!session.handle_unauthorized("/auth/otp/verify"));
    // Session must survive a failed credential check
    assert_eq!(session.state(), AuthState::Authenticated);
    assert_eq!(session.token().as_deref(), Some("bearer-abc"));
  }

  #[test]
  fn test_clones_share_state() {
    let session = AuthSession::new();
    let other = session.clone();
    session.set_token("tok");
    assert_eq!(other.token().as_deref(), Some("tok"));
    other.clear();
    assert_eq!(session.state(), AuthState::Unauthenticated);
  }

  #[tokio::test]
  async fn test_state_transitions_are_observable() {
    let session = AuthSession::new();
    let mut rx = session.subscribe();

    session.set_token("tok");
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow(), AuthState::Authenticated);

    session.handle_unauthorized("/meetups");
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow(), AuthState::Unauthenticated);
  }
}
