//! Cached platform client that wraps [`PlatformClient`] with transparent
//! caching and global-store publication.
//!
//! Reads go through the TTL cache and publish their collections to the
//! shared atoms; failures with no local handler land in the error atom
//! before being rethrown. Writes bypass the cache and invalidate the
//! resource types they touch. Callers that want to handle errors locally
//! use [`inner`](CachedPlatformClient::inner) directly.

use serde_json::json;
use std::sync::Arc;

use crate::cache::{CacheLayer, Cacheable, MemoryStorage};
use crate::error::Result;
use crate::store::Stores;

use super::client::PlatformClient;
use super::keys::ResourceKey;
use super::types::{
  Event, JobForm, JobPosting, NewsArticle, NewsCategory, ProfileUpdate, Registration,
  RegistrationForm, UserProfile,
};

#[derive(Clone)]
pub struct CachedPlatformClient {
  inner: PlatformClient,
  cache: CacheLayer<MemoryStorage>,
  stores: Arc<Stores>,
}

impl CachedPlatformClient {
  pub fn new(inner: PlatformClient, stores: Arc<Stores>) -> Self {
    Self {
      inner,
      cache: CacheLayer::new(MemoryStorage::new()),
      stores,
    }
  }

  /// The uncached client, for callers that handle errors themselves.
  pub fn inner(&self) -> &PlatformClient {
    &self.inner
  }

  /// Publish the error to the global store, then rethrow.
  fn rethrow<T>(&self, title: &str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
      self.stores.report_error(title, err, None);
    }
    result
  }

  // ==========================================================================
  // Meetups
  // ==========================================================================

  /// List all meetups, publishing the collection to the events atom.
  pub async fn list_meetups(&self) -> Result<Vec<Event>> {
    let result = self
      .cache
      .fetch_list(&ResourceKey::Meetups, || {
        let inner = self.inner.clone();
        async move { inner.list_meetups().await }
      })
      .await;
    let result = self.rethrow("Failed to load events", result);

    let events = result?.data;
    self.stores.events.set(events.clone());
    Ok(events)
  }

  /// Get a single meetup by id.
  pub async fn get_meetup(&self, id: &str) -> Result<Event> {
    let key = ResourceKey::Meetup { id: id.to_string() };
    let result = self
      .cache
      .fetch_one(&key, || {
        let inner = self.inner.clone();
        let id = id.to_string();
        async move { inner.get_meetup(&id).await }
      })
      .await;

    Ok(self.rethrow("Failed to load event", result)?.data)
  }

  /// Register for a meetup (write: bypasses the cache, invalidates events).
  pub async fn register_for_meetup(
    &self,
    id: &str,
    form: &RegistrationForm,
  ) -> Result<Registration> {
    match self.inner.register_for_meetup(id, form).await {
      Ok(registration) => {
        // Registration counts changed
        self.cache.invalidate(Some(Event::entity_type()));
        Ok(registration)
      }
      Err(err) => {
        // Keep the failed request context for the banner
        self.stores.report_error(
          "Registration failed",
          &err,
          Some(json!({ "eventId": id, "email": form.email })),
        );
        Err(err)
      }
    }
  }

  // ==========================================================================
  // News
  // ==========================================================================

  /// List news, optionally filtered by category, publishing to the news atom.
  pub async fn list_news(&self, category: Option<NewsCategory>) -> Result<Vec<NewsArticle>> {
    let key = ResourceKey::News { category };
    let result = self
      .cache
      .fetch_list(&key, || {
        let inner = self.inner.clone();
        async move { inner.list_news(category).await }
      })
      .await;
    let result = self.rethrow("Failed to load news", result);

    let news = result?.data;
    self.stores.news.set(news.clone());
    Ok(news)
  }

  /// Get a single news article by id.
  pub async fn get_news(&self, id: &str) -> Result<NewsArticle> {
    let key = ResourceKey::NewsDetail { id: id.to_string() };
    let result = self
      .cache
      .fetch_one(&key, || {
        let inner = self.inner.clone();
        let id = id.to_string();
        async move { inner.get_news(&id).await }
      })
      .await;

    Ok(self.rethrow("Failed to load article", result)?.data)
  }

  // ==========================================================================
  // Jobs
  // ==========================================================================

  pub async fn list_jobs(&self) -> Result<Vec<JobPosting>> {
    let result = self
      .cache
      .fetch_list(&ResourceKey::Jobs, || {
        let inner = self.inner.clone();
        async move { inner.list_jobs().await }
      })
      .await;

    Ok(self.rethrow("Failed to load job postings", result)?.data)
  }

  pub async fn get_job(&self, id: &str) -> Result<JobPosting> {
    let key = ResourceKey::Job { id: id.to_string() };
    let result = self
      .cache
      .fetch_one(&key, || {
        let inner = self.inner.clone();
        let id = id.to_string();
        async move { inner.get_job(&id).await }
      })
      .await;

    Ok(self.rethrow("Failed to load job posting", result)?.data)
  }

  /// Submit a job posting (write: invalidates the jobs cache).
  pub async fn post_job(&self, form: &JobForm) -> Result<JobPosting> {
    let result = self.inner.post_job(form).await;
    let result = self.rethrow("Failed to submit job posting", result);

    if result.is_ok() {
      self.cache.invalidate(Some(JobPosting::entity_type()));
    }
    result
  }

  // ==========================================================================
  // Users
  // ==========================================================================

  pub async fn get_profile(&self) -> Result<UserProfile> {
    let result = self
      .cache
      .fetch_one(&ResourceKey::Profile, || {
        let inner = self.inner.clone();
        async move { inner.get_profile().await }
      })
      .await;

    Ok(self.rethrow("Failed to load profile", result)?.data)
  }

  /// Update the profile (write: invalidates the cached profile).
  pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
    let result = self.inner.update_profile(update).await;
    let result = self.rethrow("Failed to update profile", result);

    if result.is_ok() {
      self.cache.invalidate(Some(UserProfile::entity_type()));
    }
    result
  }

  // ==========================================================================
  // Auth (never cached)
  // ==========================================================================

  pub async fn google_login(&self, code: &str) -> Result<super::types::AuthTokens> {
    self.inner.google_login(code).await
  }

  pub async fn send_otp(&self, email: &str) -> Result<()> {
    self.inner.send_otp(email).await
  }

  pub async fn verify_otp(&self, email: &str, code: &str) -> Result<super::types::AuthTokens> {
    self.inner.verify_otp(email, code).await
  }

  /// Log out and drop the session-scoped cache.
  pub async fn logout(&self) -> Result<()> {
    let result = self.inner.logout().await;
    self.cache.invalidate(None);
    result
  }
}
