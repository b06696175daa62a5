//! REST API client, one typed method per endpoint.

use serde_json::json;
use tracing::info;

use crate::error::Result;
use crate::http::HttpClient;

use super::types::{
  AuthTokens, Event, JobForm, JobPosting, NewsArticle, NewsCategory, ProfileUpdate, Registration,
  RegistrationForm, UserProfile,
};

/// Platform API client wrapper
#[derive(Clone)]
pub struct PlatformClient {
  http: HttpClient,
}

impl PlatformClient {
  pub fn new(http: HttpClient) -> Self {
    Self { http }
  }

  pub fn http(&self) -> &HttpClient {
    &self.http
  }

  // ==========================================================================
  // Meetups
  // ==========================================================================

  /// List all meetups.
  pub async fn list_meetups(&self) -> Result<Vec<Event>> {
    self.http.get("/meetups").await
  }

  /// Get a single meetup by id.
  pub async fn get_meetup(&self, id: &str) -> Result<Event> {
    self.http.get(&format!("/meetups/{id}")).await
  }

  /// Register for a meetup.
  pub async fn register_for_meetup(
    &self,
    id: &str,
    form: &RegistrationForm,
  ) -> Result<Registration> {
    let body = serde_json::to_value(form)?;
    self
      .http
      .post(&format!("/meetups/{id}/registrations"), &body)
      .await
  }

  // ==========================================================================
  // News
  // ==========================================================================

  /// List news, optionally filtered by category.
  pub async fn list_news(&self, category: Option<NewsCategory>) -> Result<Vec<NewsArticle>> {
    let path = match category {
      Some(c) => format!("/public/news?category={}", c.as_param()),
      None => "/public/news".to_string(),
    };
    self.http.get(&path).await
  }

  /// Get a single news article by id.
  pub async fn get_news(&self, id: &str) -> Result<NewsArticle> {
    self.http.get(&format!("/public/news/{id}")).await
  }

  // ==========================================================================
  // Jobs
  // ==========================================================================

  /// List all job postings.
  pub async fn list_jobs(&self) -> Result<Vec<JobPosting>> {
    self.http.get("/jobs").await
  }

  /// Get a single job posting by id.
  pub async fn get_job(&self, id: &str) -> Result<JobPosting> {
    self.http.get(&format!("/jobs/{id}")).await
  }

  /// Submit a new job posting.
  pub async fn post_job(&self, form: &JobForm) -> Result<JobPosting> {
    let body = serde_json::to_value(form)?;
    self.http.post("/jobs", &body).await
  }

  // ==========================================================================
  // Users
  // ==========================================================================

  /// Get the signed-in user's profile.
  pub async fn get_profile(&self) -> Result<UserProfile> {
    self.http.get("/users/me").await
  }

  /// Update the signed-in user's profile.
  pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
    let body = serde_json::to_value(update)?;
    self.http.put("/users/me", &body).await
  }

  // ==========================================================================
  // Auth
  // ==========================================================================

  /// Exchange a Google OAuth authorization code for platform tokens and
  /// store the access token in the session.
  pub async fn google_login(&self, code: &str) -> Result<AuthTokens> {
    let tokens: AuthTokens = self
      .http
      .post("/auth/google/callback", &json!({ "code": code }))
      .await?;
    self.http.session().set_token(tokens.access_token.clone());
    Ok(tokens)
  }

  /// Request a one-time password for the given email.
  pub async fn send_otp(&self, email: &str) -> Result<()> {
    self
      .http
      .post_empty("/auth/otp/send", Some(&json!({ "email": email })))
      .await
  }

  /// Verify a one-time password and store the resulting access token.
  pub async fn verify_otp(&self, email: &str, code: &str) -> Result<AuthTokens> {
    let tokens: AuthTokens = self
      .http
      .post("/auth/otp/verify", &json!({ "email": email, "code": code }))
      .await?;
    self.http.session().set_token(tokens.access_token.clone());
    Ok(tokens)
  }

  /// Log out: tell the backend, then drop the local session either way.
  pub async fn logout(&self) -> Result<()> {
    let result = self.http.post_empty("/auth/logout", None).await;
    self.http.session().clear();
    info!("logged out");
    result
  }
}
