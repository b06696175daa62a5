//! Observable global state shared across consumers.
//!
//! An [`Atom`] is a single unit of application state with one producer-side
//! setter and any number of watch subscribers. Fetched collections (events,
//! news) live in atoms so that every consumer sees the same snapshot, and
//! error notices flow through an atom to whatever banner/toast layer the
//! embedding application provides.

use serde_json::Value;
use tokio::sync::watch;

use crate::api::types::{Event, NewsArticle};
use crate::error::Error;

/// Route the embedding application should navigate to after a forced logout.
pub const LOGIN_ROUTE: &str = "/login";

/// A unit of shared, observable state.
///
/// Writers call [`Atom::set`]; readers either take a snapshot with
/// [`Atom::get`] or hold a [`watch::Receiver`] from [`Atom::subscribe`] and
/// react to changes.
pub struct Atom<T> {
  tx: watch::Sender<T>,
}

impl<T> std::fmt::Debug for Atom<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Atom").finish_non_exhaustive()
  }
}

impl<T: Clone> Atom<T> {
  pub fn new(initial: T) -> Self {
    let (tx, _rx) = watch::channel(initial);
    Self { tx }
  }

  /// Replace the current value and notify subscribers.
  pub fn set(&self, value: T) {
    // send_replace never fails: the sender keeps the channel alive
    self.tx.send_replace(value);
  }

  /// Snapshot of the current value.
  pub fn get(&self) -> T {
    self.tx.borrow().clone()
  }

  /// Apply a mutation to the current value in place.
  pub fn update<F: FnOnce(&mut T)>(&self, f: F) {
    self.tx.send_modify(f);
  }

  /// Subscribe to changes. The receiver observes the current value
  /// immediately and every replacement afterwards.
  pub fn subscribe(&self) -> watch::Receiver<T> {
    self.tx.subscribe()
  }
}

impl<T: Clone + Default> Default for Atom<T> {
  fn default() -> Self {
    Self::new(T::default())
  }
}

/// Payload for the global error banner.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorNotice {
  pub title: String,
  pub message: String,
  /// Serialized context of the failed operation, for diagnostics.
  pub record: Option<Value>,
}

/// The shared atoms of the application.
#[derive(Debug)]
pub struct Stores {
  /// Upcoming events, for cross-component consumption.
  pub events: Atom<Vec<Event>>,
  /// Last fetched news collection.
  pub news: Atom<Vec<NewsArticle>>,
  /// Pending error notice, if any. Consumers clear it after display.
  pub error: Atom<Option<ErrorNotice>>,
  /// Pending navigation request (e.g. `/login` after a 401).
  pub route: Atom<Option<String>>,
}

impl Stores {
  pub fn new() -> Self {
    Self {
      events: Atom::new(Vec::new()),
      news: Atom::new(Vec::new()),
      error: Atom::new(None),
      route: Atom::new(None),
    }
  }

  /// Publish an error notice for a failed operation that had no local
  /// handler. The notice message follows the status-bucket mapping.
  pub fn report_error(&self, title: &str, err: &Error, record: Option<Value>) {
    tracing::warn!(title, error = %err, "reporting error to global store");
    self.error.set(Some(ErrorNotice {
      title: title.to_string(),
      message: err.user_message(),
      record,
    }));
  }

  /// Request navigation to the login route.
  pub fn redirect_to_login(&self) {
    self.route.set(Some(LOGIN_ROUTE.to_string()));
  }

  /// Clear the pending error notice after it has been displayed.
  pub fn clear_error(&self) {
    self.error.set(None);
  }
}

impl Default for Stores {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_atom_set_and_get() {
    let atom = Atom::new(0u32);
    assert_eq!(atom.get(), 0);
    atom.set(7);
    assert_eq!(atom.get(), 7);
  }

  #[test]
  fn test_atom_update_in_place() {
    let atom = Atom::new(vec![1, 2]);
    atom.update(|v| v.push(3));
    assert_eq!(atom.get(), vec![1, 2, 3]);
  }

  #[tokio::test]
  async fn test_subscribers_observe_changes() {
    let atom = Atom::new("initial".to_string());
    let mut rx = atom.subscribe();
    assert_eq!(*rx.borrow(), "initial");

    atom.set("changed".to_string());
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow(), "changed");
  }

  #[test]
  fn test_report_error_populates_notice() {
    let stores = Stores::new();
    assert!(stores.error.get().is_none());

    let err = Error::Api {
      status: 500,
      message: "internal".into(),
    };
    stores.report_error("Registration failed", &err, None);

    let notice = stores.error.get().unwrap();
    assert_eq!(notice.title, "Registration failed");
    assert!(notice.message.contains("try again later"));
  }

  #[test]
  fn test_redirect_sets_login_route() {
    let stores = Stores::new();
    stores.redirect_to_login();
    assert_eq!(stores.route.get().as_deref(), Some("/login"));
  }
}
