//! Domain types for the platform's resources.
//!
//! Field names follow the backend's camelCase JSON; the same types are
//! used for Firestore documents, whose field names match.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A community event (meetup).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub location: Option<String>,
  pub start_at: DateTime<Utc>,
  #[serde(default)]
  pub end_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub capacity: Option<u32>,
  #[serde(default)]
  pub registration_count: u32,
  #[serde(default)]
  pub status: EventStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
  #[default]
  Upcoming,
  Past,
  Cancelled,
}

/// A confirmed event registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
  pub id: String,
  pub event_id: String,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub registered_at: Option<DateTime<Utc>>,
}

/// Form submitted when registering for an event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
  pub name: String,
  pub email: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub affiliation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NewsCategory {
  Tech,
  Career,
  Community,
  Notice,
}

impl NewsCategory {
  /// Value used in the `category` query parameter.
  pub fn as_param(&self) -> &'static str {
    match self {
      NewsCategory::Tech => "TECH",
      NewsCategory::Career => "CAREER",
      NewsCategory::Community => "COMMUNITY",
      NewsCategory::Notice => "NOTICE",
    }
  }
}

/// A published news article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
  pub id: String,
  pub title: String,
  pub category: NewsCategory,
  #[serde(default)]
  pub summary: Option<String>,
  /// Full body; only present on the detail endpoint
  #[serde(default)]
  pub content: Option<String>,
  #[serde(default)]
  pub author: Option<String>,
  pub published_at: DateTime<Utc>,
  #[serde(default)]
  pub views: u64,
}

/// A job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
  pub id: String,
  pub company: String,
  pub title: String,
  #[serde(default)]
  pub position: Option<String>,
  #[serde(default)]
  pub experience: Option<String>,
  #[serde(default)]
  pub link: Option<String>,
  #[serde(default)]
  pub deadline: Option<DateTime<Utc>>,
}

/// Form for submitting a job posting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobForm {
  pub company: String,
  pub title: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub position: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub experience: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub link: Option<String>,
}

/// The signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub id: String,
  pub email: String,
  #[serde(default)]
  pub nickname: Option<String>,
  #[serde(default)]
  pub avatar_url: Option<String>,
  #[serde(default)]
  pub roles: Vec<String>,
}

/// Partial profile update.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub nickname: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avatar_url: Option<String>,
}

/// Tokens returned by the login endpoints. The access token is opaque.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
  pub access_token: String,
  #[serde(default)]
  pub refresh_token: Option<String>,
}

/// Platform usage statistics (the `stats/users` Firestore document).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
  pub total_users: u64,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_event_deserializes_backend_json() {
    let json = r#"{
      "id": "ev-12",
      "title": "August Meetup",
      "location": "Seoul",
      "startAt": "2026-08-20T10:00:00Z",
      "capacity": 80,
      "registrationCount": 35
    }"#;
    let event: Event = serde_json::from_str(json).unwrap();
    assert_eq!(event.id, "ev-12");
    assert_eq!(event.capacity, Some(80));
    assert_eq!(event.registration_count, 35);
    assert_eq!(event.status, EventStatus::Upcoming);
  }

  #[test]
  fn test_news_category_param_matches_wire_format() {
    assert_eq!(NewsCategory::Tech.as_param(), "TECH");
    let parsed: NewsCategory = serde_json::from_str("\"TECH\"").unwrap();
    assert_eq!(parsed, NewsCategory::Tech);
  }

  #[test]
  fn test_profile_update_skips_unset_fields() {
    let update = ProfileUpdate {
      nickname: Some("jay".into()),
      avatar_url: None,
    };
    let json = serde_json::to_string(&update).unwrap();
    assert_eq!(json, r#"{"nickname":"jay"}"#);
  }
}
