//! Cache keys and cacheability of the platform's resources.

use chrono::Duration;
use sha2::{Digest, Sha256};

use crate::cache::{Cacheable, QueryKey};

use super::types::{Event, JobPosting, NewsArticle, NewsCategory, Registration, UserProfile};

// ============================================================================
// Cacheable implementations
// ============================================================================

impl Cacheable for Event {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "event"
  }
}

impl Cacheable for NewsArticle {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "news"
  }
}

impl Cacheable for JobPosting {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "job"
  }
}

impl Cacheable for UserProfile {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "user"
  }
}

impl Cacheable for Registration {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "registration"
  }
}

// ============================================================================
// Query keys
// ============================================================================

/// Cache keys for the platform's read endpoints.
#[derive(Clone, Debug)]
pub enum ResourceKey {
  /// All meetups
  Meetups,
  /// A single meetup by id
  Meetup { id: String },
  /// News list, optionally filtered by category
  News { category: Option<NewsCategory> },
  /// A single news article by id
  NewsDetail { id: String },
  /// All job postings
  Jobs,
  /// A single job posting by id
  Job { id: String },
  /// The signed-in user's profile
  Profile,
}

impl QueryKey for ResourceKey {
  fn cache_hash(&self) -> String {
    let input = match self {
      Self::Meetups => "meetups".to_string(),
      Self::Meetup { id } => format!("meetup:{id}"),
      Self::News { category } => {
        format!(
          "news:{}",
          category.as_ref().map(|c| c.as_param()).unwrap_or_default()
        )
      }
      Self::NewsDetail { id } => format!("news_detail:{id}"),
      Self::Jobs => "jobs".to_string(),
      Self::Job { id } => format!("job:{id}"),
      Self::Profile => "profile".to_string(),
    };

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
  }

  fn description(&self) -> String {
    match self {
      Self::Meetups => "all meetups".to_string(),
      Self::Meetup { id } => format!("meetup {id}"),
      Self::News { category } => match category {
        Some(c) => format!("news in {}", c.as_param()),
        None => "all news".to_string(),
      },
      Self::NewsDetail { id } => format!("news article {id}"),
      Self::Jobs => "all job postings".to_string(),
      Self::Job { id } => format!("job posting {id}"),
      Self::Profile => "user profile".to_string(),
    }
  }

  fn ttl(&self) -> Duration {
    match self {
      // Lists change often
      Self::Meetups | Self::News { .. } | Self::Jobs => Duration::minutes(5),
      // Details are stable once published
      Self::Meetup { .. } | Self::NewsDetail { .. } | Self::Job { .. } => Duration::minutes(10),
      // Profile edits should show up quickly
      Self::Profile => Duration::minutes(1),
    }
  }
}
